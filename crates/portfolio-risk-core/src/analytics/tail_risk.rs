use serde::{Deserialize, Serialize};

use crate::config::validate_confidence;
use crate::error::PortfolioRiskError;
use crate::returns::PortfolioReturnSeries;
use crate::types::{DatedValue, Rate};
use crate::PortfolioRiskResult;

use super::stats::{mean, percentile_sorted, sorted};

/// Sums of the portfolio return over trailing windows of `window` periods,
/// sliding by one period. Each point is dated at the window's last period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingWindowSeries {
    pub window: usize,
    pub points: Vec<DatedValue>,
}

impl RollingWindowSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Equal-width histogram of the window sums, for distribution charts.
    pub fn histogram(&self, bins: usize) -> PortfolioRiskResult<Histogram> {
        if bins == 0 {
            return Err(PortfolioRiskError::invalid("bins", "must be at least 1"));
        }
        let values = self.values();
        let (Some(&min), Some(&max)) = (
            values.iter().min_by(|a, b| a.total_cmp(b)),
            values.iter().max_by(|a, b| a.total_cmp(b)),
        ) else {
            return Err(PortfolioRiskError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        };

        let width = (max - min) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = if width > 0.0 {
                (((v - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        Ok(Histogram { edges, counts })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// `bins + 1` ascending bin boundaries
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Historical Value-at-Risk and Conditional VaR over a rolling horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailRiskEstimate {
    pub confidence_level: f64,
    pub window: usize,
    /// Loss threshold, positive for a loss: `-percentile((1 - c) × 100)`
    pub var: Rate,
    /// Mean loss of the windows at or beyond the VaR threshold
    pub cvar: Rate,
    /// Number of windows averaged into the CVaR
    pub tail_observations: usize,
    pub rolling: RollingWindowSeries,
}

/// Slide a `window`-period sum across the series (N - W + 1 values).
pub fn rolling_sum(
    series: &PortfolioReturnSeries,
    window: usize,
) -> PortfolioRiskResult<RollingWindowSeries> {
    if window == 0 {
        return Err(PortfolioRiskError::invalid(
            "rolling_window",
            "must be at least 1 period",
        ));
    }
    if series.len() < window {
        return Err(PortfolioRiskError::InsufficientHistory {
            required: window,
            available: series.len(),
        });
    }

    let points = series
        .values()
        .windows(window)
        .zip(series.dates()[window - 1..].iter())
        .map(|(w, &date)| DatedValue {
            date,
            value: w.iter().sum(),
        })
        .collect();

    Ok(RollingWindowSeries { window, points })
}

/// Empirical VaR/CVaR of the rolling window sums.
///
/// No distributional assumption is made: the VaR is the linearly
/// interpolated `(1 - c)` percentile of the observed window sums. Needs at
/// least `window + 1` periods of history.
pub fn estimate_tail_risk(
    series: &PortfolioReturnSeries,
    window: usize,
    confidence_level: f64,
) -> PortfolioRiskResult<TailRiskEstimate> {
    validate_confidence(confidence_level)?;
    if series.len() < window + 1 {
        return Err(PortfolioRiskError::InsufficientHistory {
            required: window + 1,
            available: series.len(),
        });
    }

    let rolling = rolling_sum(series, window)?;
    let sorted_sums = sorted(&rolling.values());
    let threshold = percentile_sorted(&sorted_sums, 1.0 - confidence_level).ok_or_else(|| {
        PortfolioRiskError::InsufficientHistory {
            required: 1,
            available: 0,
        }
    })?;
    let var = -threshold;

    let tail: Vec<f64> = sorted_sums
        .iter()
        .copied()
        .take_while(|&v| v <= threshold)
        .collect();
    let cvar = -mean(&tail);

    Ok(TailRiskEstimate {
        confidence_level,
        window,
        var,
        cvar,
        tail_observations: tail.len(),
        rolling,
    })
}
