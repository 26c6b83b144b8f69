use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PortfolioRiskError;
use crate::types::AssetId;
use crate::PortfolioRiskResult;

/// Maximum absolute deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Non-negative portfolio weights keyed by asset identifier.
///
/// Weights must sum to 1.0 within [`WEIGHT_SUM_TOLERANCE`]. Vectors that do
/// not are rejected, never renormalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<AssetId, f64>", into = "BTreeMap<AssetId, f64>")]
pub struct WeightVector {
    weights: BTreeMap<AssetId, f64>,
}

impl WeightVector {
    pub fn new<I, S>(entries: I) -> PortfolioRiskResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<AssetId>,
    {
        let mut weights = BTreeMap::new();
        for (asset, weight) in entries {
            let asset: AssetId = asset.into();
            if asset.trim().is_empty() {
                return Err(PortfolioRiskError::invalid("weights", "empty asset identifier"));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(PortfolioRiskError::invalid(
                    "weights",
                    format!("weight for {asset} must be a non-negative number, got {weight}"),
                ));
            }
            if weights.insert(asset.clone(), weight).is_some() {
                return Err(PortfolioRiskError::invalid(
                    "weights",
                    format!("duplicate weight for {asset}"),
                ));
            }
        }

        if weights.is_empty() {
            return Err(PortfolioRiskError::invalid(
                "weights",
                "at least one weight is required",
            ));
        }

        let total: f64 = weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PortfolioRiskError::invalid(
                "weights",
                format!("weights must sum to 1.0 (±{WEIGHT_SUM_TOLERANCE}), got {total:.4}"),
            ));
        }

        Ok(WeightVector { weights })
    }

    /// Build from percentages (60.0 = 60%), the form users usually type.
    pub fn from_percentages<I, S>(entries: I) -> PortfolioRiskResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<AssetId>,
    {
        WeightVector::new(entries.into_iter().map(|(a, pct)| (a, pct / 100.0)))
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.weights.get(asset).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.weights.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, f64)> {
        self.weights.iter().map(|(a, w)| (a, *w))
    }

    /// Weights reordered to match `assets`, matched by identifier.
    ///
    /// Fails if any asset is present on one side only.
    pub fn aligned_to(&self, assets: &[AssetId]) -> PortfolioRiskResult<Vec<f64>> {
        let missing: Vec<&str> = assets
            .iter()
            .filter(|a| !self.weights.contains_key(a.as_str()))
            .map(|a| a.as_str())
            .collect();
        let extra: Vec<&str> = self
            .weights
            .keys()
            .filter(|a| !assets.contains(*a))
            .map(|a| a.as_str())
            .collect();

        if !missing.is_empty() || !extra.is_empty() || assets.len() != self.weights.len() {
            return Err(PortfolioRiskError::DimensionMismatch {
                expected: format!("weights for [{}]", assets.join(", ")),
                found: format!(
                    "weights for [{}] (missing: [{}], unexpected: [{}])",
                    self.weights.keys().cloned().collect::<Vec<_>>().join(", "),
                    missing.join(", "),
                    extra.join(", ")
                ),
            });
        }

        Ok(assets.iter().map(|a| self.weights[a.as_str()]).collect())
    }
}

impl TryFrom<BTreeMap<AssetId, f64>> for WeightVector {
    type Error = PortfolioRiskError;

    fn try_from(map: BTreeMap<AssetId, f64>) -> Result<Self, Self::Error> {
        WeightVector::new(map)
    }
}

impl From<WeightVector> for BTreeMap<AssetId, f64> {
    fn from(w: WeightVector) -> Self {
        w.weights
    }
}
