use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ReturnMode;
use crate::error::PortfolioRiskError;
use crate::market::WeightVector;
use crate::types::DatedValue;
use crate::PortfolioRiskResult;

use super::builder::ReturnMatrix;

/// Weighted portfolio return per period, in date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturnSeries {
    mode: ReturnMode,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PortfolioReturnSeries {
    /// Wrap an already computed return series.
    pub fn new(
        mode: ReturnMode,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> PortfolioRiskResult<Self> {
        if dates.len() != values.len() {
            return Err(PortfolioRiskError::DimensionMismatch {
                expected: format!("{} returns (one per date)", dates.len()),
                found: format!("{} returns", values.len()),
            });
        }
        if values.iter().any(|r| !r.is_finite()) {
            return Err(PortfolioRiskError::invalid("returns", "returns must be finite"));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PortfolioRiskError::invalid(
                "dates",
                "dates must be strictly increasing",
            ));
        }
        Ok(PortfolioReturnSeries {
            mode,
            dates,
            values,
        })
    }

    pub fn mode(&self) -> ReturnMode {
        self.mode
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = DatedValue> + '_ {
        self.dates
            .iter()
            .zip(self.values.iter())
            .map(|(&date, &value)| DatedValue { date, value })
    }
}

/// Combine per-asset returns into one portfolio return per period.
///
/// `r_p(t) = Σ w[a] × r[a, t]`, with weights matched to columns by asset
/// identifier.
pub fn aggregate_portfolio(
    returns: &ReturnMatrix,
    weights: &WeightVector,
) -> PortfolioRiskResult<PortfolioReturnSeries> {
    let aligned = weights.aligned_to(returns.assets())?;

    let values: Vec<f64> = returns
        .rows()
        .iter()
        .map(|row| row.iter().zip(aligned.iter()).map(|(r, w)| r * w).sum())
        .collect();

    Ok(PortfolioReturnSeries {
        mode: returns.mode(),
        dates: returns.dates().to_vec(),
        values,
    })
}
