//! Prices to per-asset returns to a single weighted portfolio series.

pub mod aggregator;
pub mod builder;

pub use aggregator::{aggregate_portfolio, PortfolioReturnSeries};
pub use builder::{build_returns, ReturnMatrix};
