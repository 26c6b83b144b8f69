use serde::{Deserialize, Serialize};

use crate::error::PortfolioRiskError;
use crate::market::WeightVector;
use crate::returns::ReturnMatrix;
use crate::types::AssetId;
use crate::PortfolioRiskResult;

use super::stats::covariance;

/// Whether a [`RiskMatrix`] holds covariances or correlations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Covariance,
    /// Unit diagonal; every asset is treated as having volatility 1
    Correlation,
}

/// Square, symmetric dispersion matrix of per-asset returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub kind: MatrixKind,
    pub assets: Vec<AssetId>,
    pub values: Vec<Vec<f64>>,
}

impl RiskMatrix {
    pub fn new(kind: MatrixKind, assets: Vec<AssetId>, values: Vec<Vec<f64>>) -> PortfolioRiskResult<Self> {
        let n = assets.len();
        if n == 0 {
            return Err(PortfolioRiskError::invalid("assets", "matrix has no assets"));
        }
        if values.len() != n || values.iter().any(|row| row.len() != n) {
            return Err(PortfolioRiskError::DimensionMismatch {
                expected: format!("{n}x{n} matrix"),
                found: format!(
                    "{} rows with lengths [{}]",
                    values.len(),
                    values.iter().map(|r| r.len().to_string()).collect::<Vec<_>>().join(", ")
                ),
            });
        }
        if values.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PortfolioRiskError::invalid("matrix", "entries must be finite"));
        }
        if (0..n).any(|i| values[i][i] < 0.0) {
            return Err(PortfolioRiskError::invalid("matrix", "negative diagonal entry"));
        }
        Ok(RiskMatrix { kind, assets, values })
    }

    /// Sample covariance matrix (n-1) of the per-asset return columns.
    pub fn covariance(returns: &ReturnMatrix) -> PortfolioRiskResult<Self> {
        if returns.len() < 2 {
            return Err(PortfolioRiskError::InsufficientHistory {
                required: 2,
                available: returns.len(),
            });
        }
        let columns: Vec<Vec<f64>> = (0..returns.assets().len()).map(|i| returns.column(i)).collect();
        let values = columns
            .iter()
            .map(|ci| columns.iter().map(|cj| covariance(ci, cj)).collect())
            .collect();
        RiskMatrix::new(MatrixKind::Covariance, returns.assets().to_vec(), values)
    }

    /// Pearson correlation matrix of the per-asset return columns.
    pub fn correlation(returns: &ReturnMatrix) -> PortfolioRiskResult<Self> {
        RiskMatrix::covariance(returns)?.to_correlation()
    }

    /// Rescale a covariance matrix to correlations.
    pub fn to_correlation(&self) -> PortfolioRiskResult<Self> {
        if self.kind == MatrixKind::Correlation {
            return Ok(self.clone());
        }
        let vols = self.volatilities();
        if let Some(i) = vols.iter().position(|v| *v == 0.0) {
            return Err(PortfolioRiskError::degenerate(format!(
                "correlation: asset {} has zero variance",
                self.assets[i]
            )));
        }
        let values = self
            .values
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, c)| if i == j { 1.0 } else { c / (vols[i] * vols[j]) })
                    .collect()
            })
            .collect();
        RiskMatrix::new(MatrixKind::Correlation, self.assets.clone(), values)
    }

    /// Square roots of the diagonal.
    pub fn volatilities(&self) -> Vec<f64> {
        (0..self.assets.len()).map(|i| self.values[i][i].sqrt()).collect()
    }

    /// `sqrt(wᵗ Σ w)` with weights matched by asset identifier.
    pub fn portfolio_volatility(&self, weights: &WeightVector) -> PortfolioRiskResult<f64> {
        let w = weights.aligned_to(&self.assets)?;
        Ok(quadratic_form(&self.values, &w).max(0.0).sqrt())
    }
}

/// Diversification ratio of a weighted portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversificationScore {
    pub matrix_kind: MatrixKind,
    /// `Σ w[a] σ[a] / sqrt(wᵗ Σ w)`; 1.0 means no diversification benefit
    pub ratio: f64,
    /// `sqrt(number_of_assets)`
    pub max_ratio: f64,
    /// `ratio / max_ratio × 100`
    pub percentage_of_max: f64,
    pub weighted_volatility: f64,
    pub portfolio_volatility: f64,
    pub concentration: ConcentrationScore,
}

/// Concentration-adjusted alternative metric.
///
/// Not equivalent to the diversification ratio and reported only alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationScore {
    /// Herfindahl index `Σ w²`
    pub herfindahl: f64,
    /// `1 / Σ w²`
    pub effective_assets: f64,
    /// Pairwise correlation averaged with weights `w_i w_j`; None when no
    /// pair of assets has a defined correlation
    pub weighted_correlation: Option<f64>,
    /// `1 / (herfindahl × weighted_correlation)` when that product is positive
    pub score: Option<f64>,
}

/// Score diversification from weights and a covariance or correlation matrix.
pub fn score_diversification(
    weights: &WeightVector,
    matrix: &RiskMatrix,
) -> PortfolioRiskResult<DiversificationScore> {
    let w = weights.aligned_to(&matrix.assets)?;
    let vols = matrix.volatilities();

    let weighted_volatility: f64 = w.iter().zip(vols.iter()).map(|(wi, si)| wi * si).sum();
    let variance = quadratic_form(&matrix.values, &w);
    if variance <= 0.0 {
        return Err(PortfolioRiskError::degenerate(
            "diversification ratio: portfolio volatility is zero",
        ));
    }
    let portfolio_volatility = variance.sqrt();

    let ratio = weighted_volatility / portfolio_volatility;
    let max_ratio = (w.len() as f64).sqrt();

    Ok(DiversificationScore {
        matrix_kind: matrix.kind,
        ratio,
        max_ratio,
        percentage_of_max: ratio / max_ratio * 100.0,
        weighted_volatility,
        portfolio_volatility,
        concentration: concentration_score(&w, matrix),
    })
}

fn concentration_score(w: &[f64], matrix: &RiskMatrix) -> ConcentrationScore {
    let herfindahl: f64 = w.iter().map(|x| x * x).sum();
    let vols = matrix.volatilities();

    // Pairs involving a zero-volatility asset have no defined correlation
    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..w.len() {
        for j in 0..w.len() {
            if i != j && vols[i] > 0.0 && vols[j] > 0.0 {
                let rho = matrix.values[i][j] / (vols[i] * vols[j]);
                num += w[i] * w[j] * rho;
                den += w[i] * w[j];
            }
        }
    }
    let weighted_correlation = (den > 0.0).then(|| num / den);

    let score = weighted_correlation
        .map(|rho| herfindahl * rho)
        .filter(|product| *product > 0.0)
        .map(|product| 1.0 / product);

    ConcentrationScore {
        herfindahl,
        effective_assets: 1.0 / herfindahl,
        weighted_correlation,
        score,
    }
}

fn quadratic_form(m: &[Vec<f64>], w: &[f64]) -> f64 {
    m.iter()
        .zip(w.iter())
        .map(|(row, wi)| wi * row.iter().zip(w.iter()).map(|(c, wj)| c * wj).sum::<f64>())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_asset_ratio_is_one() {
        let m = RiskMatrix::new(MatrixKind::Covariance, ids(&["A"]), vec![vec![0.04]]).unwrap();
        let w = WeightVector::new([("A", 1.0)]).unwrap();
        let s = score_diversification(&w, &m).unwrap();
        assert!((s.ratio - 1.0).abs() < 1e-12);
        assert!((s.percentage_of_max - 100.0).abs() < 1e-9);
        assert!(s.concentration.weighted_correlation.is_none());
        assert_eq!(s.concentration.herfindahl, 1.0);
    }

    #[test]
    fn test_uncorrelated_equal_vol_reaches_sqrt_n() {
        // Two uncorrelated assets, equal vol, equal weights: ratio = sqrt(2)
        let m = RiskMatrix::new(
            MatrixKind::Covariance,
            ids(&["A", "B"]),
            vec![vec![0.04, 0.0], vec![0.0, 0.04]],
        )
        .unwrap();
        let w = WeightVector::new([("A", 0.5), ("B", 0.5)]).unwrap();
        let s = score_diversification(&w, &m).unwrap();
        assert!((s.ratio - 2f64.sqrt()).abs() < 1e-12);
        assert!((s.percentage_of_max - 100.0).abs() < 1e-9);
        assert_eq!(s.concentration.weighted_correlation, Some(0.0));
        assert!(s.concentration.score.is_none());
    }

    #[test]
    fn test_perfect_correlation_ratio_is_one() {
        let m = RiskMatrix::new(
            MatrixKind::Covariance,
            ids(&["A", "B"]),
            vec![vec![0.04, 0.06], vec![0.06, 0.09]],
        )
        .unwrap();
        let w = WeightVector::new([("A", 0.3), ("B", 0.7)]).unwrap();
        let s = score_diversification(&w, &m).unwrap();
        assert!((s.ratio - 1.0).abs() < 1e-12);
        let rho = s.concentration.weighted_correlation.unwrap();
        assert!((rho - 1.0).abs() < 1e-12);
        let expected = 1.0 / (0.3f64 * 0.3 + 0.7 * 0.7);
        assert!((s.concentration.score.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_input_treats_vols_as_unit() {
        let m = RiskMatrix::new(
            MatrixKind::Correlation,
            ids(&["A", "B"]),
            vec![vec![1.0, 0.5], vec![0.5, 1.0]],
        )
        .unwrap();
        let w = WeightVector::new([("A", 0.5), ("B", 0.5)]).unwrap();
        let s = score_diversification(&w, &m).unwrap();
        // 1 / sqrt(0.25 + 0.25 + 2 * 0.25 * 0.5)
        assert!((s.ratio - 1.0 / 0.75f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_portfolio_volatility_is_degenerate() {
        let m = RiskMatrix::new(
            MatrixKind::Covariance,
            ids(&["A", "B"]),
            vec![vec![0.0, 0.0], vec![0.0, 0.0]],
        )
        .unwrap();
        let w = WeightVector::new([("A", 0.5), ("B", 0.5)]).unwrap();
        let err = score_diversification(&w, &m).unwrap_err();
        assert!(matches!(err, PortfolioRiskError::DegenerateInput { .. }));
    }

    #[test]
    fn test_zero_variance_asset_keeps_ratio() {
        let m = RiskMatrix::new(
            MatrixKind::Covariance,
            ids(&["A", "B"]),
            vec![vec![0.04, 0.0], vec![0.0, 0.0]],
        )
        .unwrap();
        let w = WeightVector::new([("A", 0.5), ("B", 0.5)]).unwrap();
        let s = score_diversification(&w, &m).unwrap();
        // 0.5 * 0.2 / sqrt(0.25 * 0.04)
        assert!((s.ratio - 1.0).abs() < 1e-12);
        assert!(s.concentration.weighted_correlation.is_none());
        assert!(s.concentration.score.is_none());
        assert_eq!(s.concentration.herfindahl, 0.5);
    }

    #[test]
    fn test_weights_must_match_matrix() {
        let m = RiskMatrix::new(MatrixKind::Covariance, ids(&["A"]), vec![vec![0.04]]).unwrap();
        let w = WeightVector::new([("B", 1.0)]).unwrap();
        assert!(matches!(
            score_diversification(&w, &m).unwrap_err(),
            PortfolioRiskError::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn test_non_square_rejected() {
        assert!(RiskMatrix::new(MatrixKind::Covariance, ids(&["A", "B"]), vec![vec![1.0, 0.0]]).is_err());
    }
}
