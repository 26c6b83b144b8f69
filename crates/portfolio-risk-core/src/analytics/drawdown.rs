use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ReturnMode;
use crate::returns::PortfolioReturnSeries;
use crate::types::{DatedValue, Rate};

/// Peak-to-trough analysis of the cumulative wealth path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    /// Most negative `W_t / M_t - 1`; zero when wealth never falls
    pub max_drawdown: Rate,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
    /// Periods from the peak to the trough of the worst drawdown
    pub duration_periods: usize,
    /// First date after the trough at which the peak is regained
    pub recovery_date: Option<NaiveDate>,
    pub wealth_index: Vec<DatedValue>,
    pub drawdowns: Vec<DatedValue>,
}

/// Cumulative wealth `W_t` of one unit invested at the start of the series.
///
/// Each period multiplies wealth by the growth factor of its return under the
/// series' convention (`1 + r` or `exp(r)`).
pub fn wealth_index(series: &PortfolioReturnSeries) -> Vec<f64> {
    let mode = series.mode();
    let mut wealth = 1.0;
    series
        .values()
        .iter()
        .map(|&r| {
            wealth *= mode.growth_factor(r);
            wealth
        })
        .collect()
}

/// Recover period returns from consecutive wealth values (inverse of
/// [`wealth_index`], with an implicit starting wealth of 1).
pub fn returns_from_wealth(mode: ReturnMode, wealth: &[f64]) -> Vec<f64> {
    let mut prev = 1.0;
    wealth
        .iter()
        .map(|&w| {
            let r = mode.from_growth_factor(w / prev);
            prev = w;
            r
        })
        .collect()
}

/// Maximum drawdown with its timing, plus the wealth and drawdown paths.
pub fn analyze_drawdown(series: &PortfolioReturnSeries) -> DrawdownAnalysis {
    let wealth = wealth_index(series);
    let dates = series.dates();

    let mut drawdowns = Vec::with_capacity(wealth.len());
    let mut running_max = f64::NEG_INFINITY;
    let mut running_max_idx = 0;

    let mut max_drawdown = 0.0;
    let mut worst: Option<(usize, usize)> = None;

    for (t, &w) in wealth.iter().enumerate() {
        if w > running_max {
            running_max = w;
            running_max_idx = t;
        }
        let dd = w / running_max - 1.0;
        if dd < max_drawdown {
            max_drawdown = dd;
            worst = Some((running_max_idx, t));
        }
        drawdowns.push(DatedValue {
            date: dates[t],
            value: dd,
        });
    }

    let (peak_date, trough_date, duration_periods, recovery_date) = match worst {
        Some((peak, trough)) => {
            let recovery = wealth[trough..]
                .iter()
                .position(|&w| w >= wealth[peak])
                .map(|offset| dates[trough + offset]);
            (Some(dates[peak]), Some(dates[trough]), trough - peak, recovery)
        }
        None => (None, None, 0, None),
    };

    DrawdownAnalysis {
        max_drawdown,
        peak_date,
        trough_date,
        duration_periods,
        recovery_date,
        wealth_index: dates
            .iter()
            .zip(wealth.iter())
            .map(|(&date, &value)| DatedValue { date, value })
            .collect(),
        drawdowns,
    }
}
