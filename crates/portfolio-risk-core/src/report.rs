use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::analytics::{
    analyze_drawdown, annualize, asset_breakdown, estimate_tail_risk, score_diversification,
    AnnualizedStats, AssetBreakdown, DiversificationScore, DrawdownAnalysis, RiskMatrix,
    RollingWindowSeries, TailRiskEstimate,
};
use crate::config::AnalysisConfig;
use crate::error::PortfolioRiskError;
use crate::market::{PriceMatrix, WeightVector};
use crate::returns::{aggregate_portfolio, build_returns, PortfolioReturnSeries};
use crate::types::*;
use crate::PortfolioRiskResult;

/// Everything the pipeline needs for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAnalysisInput {
    pub prices: PriceMatrix,
    pub weights: WeightVector,
    #[serde(default)]
    pub config: AnalysisConfig,
    /// Annual risk-free rate (e.g. a short-term bill yield)
    #[serde(default)]
    pub risk_free_rate: Rate,
    /// Portfolio value for dollar-denominated VaR/CVaR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notional: Option<Money>,
}

/// VaR and CVaR expressed in currency for a given notional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DollarExposure {
    pub notional: Money,
    pub var_amount: Money,
    pub cvar_amount: Money,
}

/// Immutable result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub config: AnalysisConfig,
    pub annualized_return: Rate,
    pub annualized_volatility: Rate,
    pub sharpe_ratio: f64,
    /// Zero or negative fraction
    pub max_drawdown: Rate,
    pub var: Rate,
    pub cvar: Rate,
    pub diversification_ratio: f64,
    pub diversification_percentage: f64,
    pub annualized: AnnualizedStats,
    pub drawdown: DrawdownAnalysis,
    pub tail_risk: TailRiskEstimate,
    pub diversification: DiversificationScore,
    pub asset_breakdown: AssetBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dollar_exposure: Option<DollarExposure>,
    pub portfolio_returns: PortfolioReturnSeries,
}

impl RiskReport {
    /// Rolling window sums behind the VaR/CVaR figures.
    pub fn rolling_returns(&self) -> &RollingWindowSeries {
        &self.tail_risk.rolling
    }
}

/// Run the full pipeline: prices, returns, portfolio series, then every
/// metric. The first failing stage aborts the run; no partial report exists.
pub fn run_pipeline(input: &PortfolioAnalysisInput) -> PortfolioRiskResult<RiskReport> {
    let config = input.config;
    config.validate()?;

    let returns = build_returns(&input.prices, config.return_mode)?;
    let series = aggregate_portfolio(&returns, &input.weights)?;
    tracing::debug!(
        periods = series.len(),
        dropped = returns.dropped_rows(),
        "built portfolio return series"
    );

    let annualized = annualize(&series, config.periods_per_year, input.risk_free_rate)?;
    let drawdown = analyze_drawdown(&series);
    let tail_risk = estimate_tail_risk(&series, config.rolling_window, config.confidence_level)?;
    tracing::debug!(var = tail_risk.var, cvar = tail_risk.cvar, "estimated tail risk");

    let covariance = RiskMatrix::covariance(&returns)?;
    let diversification = score_diversification(&input.weights, &covariance)?;
    let asset_breakdown = asset_breakdown(&returns, &input.weights, config.periods_per_year)?;

    let dollar_exposure = input
        .notional
        .map(|notional| dollar_exposure(notional, tail_risk.var, tail_risk.cvar))
        .transpose()?;

    Ok(RiskReport {
        config,
        annualized_return: annualized.annualized_return,
        annualized_volatility: annualized.annualized_volatility,
        sharpe_ratio: annualized.sharpe_ratio,
        max_drawdown: drawdown.max_drawdown,
        var: tail_risk.var,
        cvar: tail_risk.cvar,
        diversification_ratio: diversification.ratio,
        diversification_percentage: diversification.percentage_of_max,
        annualized,
        drawdown,
        tail_risk,
        diversification,
        asset_breakdown,
        dollar_exposure,
        portfolio_returns: series,
    })
}

/// Run the pipeline and wrap the report in the standard output envelope.
pub fn analyze_portfolio(
    input: &PortfolioAnalysisInput,
) -> PortfolioRiskResult<ComputationOutput<RiskReport>> {
    let start = Instant::now();
    let report = run_pipeline(input)?;

    let mut warnings: Vec<String> = Vec::new();
    let dropped = input.prices.len() - 1 - report.portfolio_returns.len();
    if dropped > 0 {
        warnings.push(format!(
            "{dropped} return rows dropped because of non-positive prices"
        ));
    }
    let weight_sum = input.weights.sum();
    if (weight_sum - 1.0).abs() > 1e-9 {
        warnings.push(format!(
            "Weights sum to {weight_sum:.4}; used as given, not renormalised"
        ));
    }
    for (asset, w) in input.weights.iter() {
        if w == 0.0 {
            warnings.push(format!("{asset} has zero weight"));
        }
    }
    let years = report.portfolio_returns.len() as f64 / input.config.periods_per_year as f64;
    if years < 1.0 {
        warnings.push(format!(
            "Only {years:.2} years of history; annualised figures are extrapolated"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio Risk Analytics (Geometric Return, Volatility, Sharpe, Max Drawdown, Historical VaR/CVaR, Diversification Ratio)",
        &serde_json::json!({
            "return_mode": input.config.return_mode,
            "periods_per_year": input.config.periods_per_year,
            "rolling_window": input.config.rolling_window,
            "confidence_level": input.config.confidence_level,
            "risk_free_rate": input.risk_free_rate,
            "assets": input.prices.assets(),
            "price_rows": input.prices.len(),
            "return_periods": report.portfolio_returns.len(),
            "rolling_windows": report.tail_risk.rolling.len(),
        }),
        warnings,
        elapsed,
        report,
    ))
}

fn dollar_exposure(notional: Money, var: Rate, cvar: Rate) -> PortfolioRiskResult<DollarExposure> {
    if notional <= Decimal::ZERO {
        return Err(PortfolioRiskError::invalid(
            "notional",
            "portfolio value must be positive",
        ));
    }
    let to_decimal = |field: &str, v: f64| {
        Decimal::try_from(v).map_err(|e| PortfolioRiskError::invalid(field, e.to_string()))
    };
    Ok(DollarExposure {
        notional,
        var_amount: (notional * to_decimal("var", var)?).round_dp(2),
        cvar_amount: (notional * to_decimal("cvar", cvar)?).round_dp(2),
    })
}
