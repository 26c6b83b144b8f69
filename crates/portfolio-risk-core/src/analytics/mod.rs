//! Risk and return analytics over a portfolio return series.

pub mod annualization;
#[cfg(feature = "bootstrap")]
pub mod bootstrap;
pub mod diversification;
pub mod drawdown;
pub mod stats;
pub mod tail_risk;

pub use annualization::{annualize, asset_breakdown, sharpe_ratio, AnnualizedStats, AssetBreakdown};
pub use diversification::{score_diversification, DiversificationScore, MatrixKind, RiskMatrix};
pub use drawdown::{analyze_drawdown, returns_from_wealth, wealth_index, DrawdownAnalysis};
pub use tail_risk::{estimate_tail_risk, rolling_sum, RollingWindowSeries, TailRiskEstimate};
