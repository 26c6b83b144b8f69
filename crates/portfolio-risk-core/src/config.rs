use serde::{Deserialize, Serialize};

use crate::error::PortfolioRiskError;
use crate::PortfolioRiskResult;

/// Convention used to turn consecutive prices into period returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMode {
    /// `ln(p_t / p_{t-1})`
    #[default]
    Log,
    /// `p_t / p_{t-1} - 1`
    Arithmetic,
}

impl ReturnMode {
    /// Growth factor of one period's return under this convention.
    pub fn growth_factor(&self, r: f64) -> f64 {
        match self {
            ReturnMode::Log => r.exp(),
            ReturnMode::Arithmetic => 1.0 + r,
        }
    }

    /// Inverse of [`ReturnMode::growth_factor`].
    pub fn from_growth_factor(&self, g: f64) -> f64 {
        match self {
            ReturnMode::Log => g.ln(),
            ReturnMode::Arithmetic => g - 1.0,
        }
    }
}

/// Configuration recognised by the analytics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub return_mode: ReturnMode,
    /// 252 for the trading-day convention, 365 for calendar days
    pub periods_per_year: u32,
    /// Trailing window (in periods) for rolling VaR/CVaR
    pub rolling_window: usize,
    /// Confidence level for VaR/CVaR, strictly between 0 and 1
    pub confidence_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::trading_days()
    }
}

impl AnalysisConfig {
    pub const TRADING_DAYS: u32 = 252;
    pub const CALENDAR_DAYS: u32 = 365;

    /// Log returns, 252 periods per year, one-year rolling window.
    pub fn trading_days() -> Self {
        AnalysisConfig {
            return_mode: ReturnMode::Log,
            periods_per_year: Self::TRADING_DAYS,
            rolling_window: Self::TRADING_DAYS as usize,
            confidence_level: 0.95,
        }
    }

    /// Log returns, 365 periods per year, one-year rolling window.
    pub fn calendar_days() -> Self {
        AnalysisConfig {
            return_mode: ReturnMode::Log,
            periods_per_year: Self::CALENDAR_DAYS,
            rolling_window: Self::CALENDAR_DAYS as usize,
            confidence_level: 0.95,
        }
    }

    pub fn with_return_mode(mut self, mode: ReturnMode) -> Self {
        self.return_mode = mode;
        self
    }

    pub fn with_rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = window;
        self
    }

    pub fn with_confidence_level(mut self, confidence: f64) -> Self {
        self.confidence_level = confidence;
        self
    }

    pub fn validate(&self) -> PortfolioRiskResult<()> {
        if self.periods_per_year == 0 {
            return Err(PortfolioRiskError::invalid(
                "periods_per_year",
                "must be at least 1",
            ));
        }
        if self.rolling_window == 0 {
            return Err(PortfolioRiskError::invalid(
                "rolling_window",
                "must be at least 1 period",
            ));
        }
        validate_confidence(self.confidence_level)
    }
}

pub(crate) fn validate_confidence(confidence: f64) -> PortfolioRiskResult<()> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(PortfolioRiskError::invalid(
            "confidence_level",
            format!("must be between 0 and 1 (exclusive), got {confidence}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_trading_days() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.return_mode, ReturnMode::Log);
        assert_eq!(cfg.periods_per_year, 252);
        assert_eq!(cfg.rolling_window, 252);
        assert_eq!(cfg.confidence_level, 0.95);
    }

    #[test]
    fn test_calendar_preset() {
        let cfg = AnalysisConfig::calendar_days();
        assert_eq!(cfg.periods_per_year, 365);
        assert_eq!(cfg.rolling_window, 365);
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let cfg = AnalysisConfig::default().with_confidence_level(1.0);
        assert!(cfg.validate().is_err());
        let cfg = AnalysisConfig::default().with_confidence_level(f64::NAN);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let cfg = AnalysisConfig::default().with_rolling_window(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"return_mode":"arithmetic","rolling_window":20}"#).unwrap();
        assert_eq!(cfg.return_mode, ReturnMode::Arithmetic);
        assert_eq!(cfg.rolling_window, 20);
        assert_eq!(cfg.periods_per_year, 252);
    }

    #[test]
    fn test_growth_factor_inverse() {
        for mode in [ReturnMode::Log, ReturnMode::Arithmetic] {
            let r = -0.0173;
            let back = mode.from_growth_factor(mode.growth_factor(r));
            assert!((back - r).abs() < 1e-12);
        }
    }
}
