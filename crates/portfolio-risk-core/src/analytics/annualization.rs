use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::config::ReturnMode;
use crate::error::PortfolioRiskError;
use crate::market::WeightVector;
use crate::returns::{PortfolioReturnSeries, ReturnMatrix};
use crate::types::{AssetId, Rate};
use crate::PortfolioRiskResult;

use super::stats::{mean, sample_std};

/// Annualised return and risk figures of a portfolio return series.
///
/// The geometric figure follows the series' return convention and never
/// mixes the two:
/// - log returns: `exp(mean(r) × P) - 1`
/// - arithmetic returns: `(1 + T)^(P / N) - 1` with `T = Π(1 + r) - 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualizedStats {
    pub return_mode: ReturnMode,
    pub periods_per_year: u32,
    pub observations: usize,
    /// Compounded return over the whole series
    pub total_return: Rate,
    /// Geometric annualised return
    pub annualized_return: Rate,
    /// `mean(r) × P`
    pub annualized_arithmetic_return: Rate,
    /// Sample standard deviation × sqrt(P)
    pub annualized_volatility: Rate,
    pub risk_free_rate: Rate,
    pub sharpe_ratio: f64,
    /// Total return annualised over the calendar span (days / 365)
    pub calendar_geometric_return: Option<Rate>,
    pub yearly_returns: Vec<YearlyReturn>,
    /// Mean of the calendar-year compounded returns
    pub expected_annual_return: Option<Rate>,
}

/// Compounded return of the observations falling in one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyReturn {
    pub year: i32,
    pub compounded_return: Rate,
    pub observations: usize,
}

/// Stand-alone annualised figures for each asset of the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBreakdown {
    pub assets: Vec<AssetStats>,
    /// `Σ w[a] × annualized_return[a]`
    pub weighted_average_return: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetStats {
    pub asset: AssetId,
    pub weight: f64,
    pub annualized_return: Rate,
    pub annualized_volatility: Rate,
}

/// Annualise a portfolio return series and compute its Sharpe ratio.
pub fn annualize(
    series: &PortfolioReturnSeries,
    periods_per_year: u32,
    risk_free_rate: Rate,
) -> PortfolioRiskResult<AnnualizedStats> {
    let n = series.len();
    if n < 2 {
        return Err(PortfolioRiskError::InsufficientHistory {
            required: 2,
            available: n,
        });
    }
    if periods_per_year == 0 {
        return Err(PortfolioRiskError::invalid(
            "periods_per_year",
            "must be at least 1",
        ));
    }

    let p = periods_per_year as f64;
    let values = series.values();
    let mode = series.mode();

    let (total_return, annualized_return) = geometric_return(values, mode, p)?;
    let annualized_arithmetic_return = mean(values) * p;
    let annualized_volatility = sample_std(values) * p.sqrt();
    let sharpe = sharpe_ratio(annualized_return, risk_free_rate, annualized_volatility)?;

    let calendar_geometric_return = match (series.dates().first(), series.dates().last()) {
        (Some(first), Some(last)) => {
            let years = (*last - *first).num_days() as f64 / 365.0;
            (years > 0.0).then(|| (1.0 + total_return).powf(1.0 / years) - 1.0)
        }
        _ => None,
    };

    let yearly_returns = calendar_year_returns(series);
    let expected_annual_return = if yearly_returns.is_empty() {
        None
    } else {
        let yearly: Vec<f64> = yearly_returns.iter().map(|y| y.compounded_return).collect();
        Some(mean(&yearly))
    };

    Ok(AnnualizedStats {
        return_mode: mode,
        periods_per_year,
        observations: n,
        total_return,
        annualized_return,
        annualized_arithmetic_return,
        annualized_volatility,
        risk_free_rate,
        sharpe_ratio: sharpe,
        calendar_geometric_return,
        yearly_returns,
        expected_annual_return,
    })
}

/// Excess annualised return per unit of annualised volatility.
///
/// Zero volatility is rejected instead of producing an infinite ratio.
pub fn sharpe_ratio(
    annualized_return: Rate,
    risk_free_rate: Rate,
    annualized_volatility: Rate,
) -> PortfolioRiskResult<f64> {
    if annualized_volatility == 0.0 {
        return Err(PortfolioRiskError::degenerate(
            "Sharpe ratio: annualised volatility is zero",
        ));
    }
    Ok((annualized_return - risk_free_rate) / annualized_volatility)
}

/// Compounded return per calendar year of the series' dates.
pub fn calendar_year_returns(series: &PortfolioReturnSeries) -> Vec<YearlyReturn> {
    let mode = series.mode();
    let mut out: Vec<YearlyReturn> = Vec::new();
    let mut growth = 1.0;

    for point in series.points() {
        let year = point.date.year();
        match out.last_mut() {
            Some(last) if last.year == year => {
                growth *= mode.growth_factor(point.value);
                last.compounded_return = growth - 1.0;
                last.observations += 1;
            }
            _ => {
                growth = mode.growth_factor(point.value);
                out.push(YearlyReturn {
                    year,
                    compounded_return: growth - 1.0,
                    observations: 1,
                });
            }
        }
    }
    out
}

/// Per-asset annualised return and volatility, plus the weight-averaged return.
pub fn asset_breakdown(
    returns: &ReturnMatrix,
    weights: &WeightVector,
    periods_per_year: u32,
) -> PortfolioRiskResult<AssetBreakdown> {
    if returns.is_empty() {
        return Err(PortfolioRiskError::InsufficientHistory {
            required: 1,
            available: 0,
        });
    }
    let aligned = weights.aligned_to(returns.assets())?;
    let p = periods_per_year as f64;

    let mut assets = Vec::with_capacity(aligned.len());
    let mut weighted_average_return = 0.0;

    for (idx, (asset, weight)) in returns.assets().iter().zip(aligned).enumerate() {
        let column = returns.column(idx);
        let (_, annualized_return) = geometric_return(&column, returns.mode(), p)?;
        weighted_average_return += weight * annualized_return;
        assets.push(AssetStats {
            asset: asset.clone(),
            weight,
            annualized_return,
            annualized_volatility: sample_std(&column) * p.sqrt(),
        });
    }

    Ok(AssetBreakdown {
        assets,
        weighted_average_return,
    })
}

/// Total compounded return and its geometric annualisation.
fn geometric_return(values: &[f64], mode: ReturnMode, p: f64) -> PortfolioRiskResult<(Rate, Rate)> {
    let n = values.len() as f64;
    match mode {
        ReturnMode::Log => {
            let total = values.iter().sum::<f64>().exp() - 1.0;
            let annualized = (mean(values) * p).exp() - 1.0;
            Ok((total, annualized))
        }
        ReturnMode::Arithmetic => {
            let wealth: f64 = values.iter().map(|r| 1.0 + r).product();
            if wealth < 0.0 {
                return Err(PortfolioRiskError::invalid(
                    "returns",
                    "compounded wealth is negative; arithmetic returns below -100%",
                ));
            }
            Ok((wealth - 1.0, wealth.powf(p / n) - 1.0))
        }
    }
}
