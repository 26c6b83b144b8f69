//! Risk and return analytics for a multi-asset portfolio.
//!
//! The pipeline runs strictly forward:
//! prices → returns → portfolio return series →
//! {annualised stats, drawdown, tail risk, diversification} → report.
//!
//! ```rust,no_run
//! use portfolio_risk_core::report::{run_pipeline, PortfolioAnalysisInput};
//!
//! let json = std::fs::read_to_string("portfolio.json").unwrap();
//! let input: PortfolioAnalysisInput = serde_json::from_str(&json).unwrap();
//! let report = run_pipeline(&input).unwrap();
//! println!("VaR {:.2}% / CVaR {:.2}%", report.var * 100.0, report.cvar * 100.0);
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod market;
pub mod report;
pub mod returns;
pub mod types;

pub use config::{AnalysisConfig, ReturnMode};
pub use error::PortfolioRiskError;
pub use market::{PriceMatrix, WeightVector};
pub use report::{analyze_portfolio, run_pipeline, PortfolioAnalysisInput, RiskReport};
pub use types::*;

/// Standard result type for all portfolio-risk operations
pub type PortfolioRiskResult<T> = Result<T, PortfolioRiskError>;
