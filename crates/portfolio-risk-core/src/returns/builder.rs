use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ReturnMode;
use crate::error::PortfolioRiskError;
use crate::market::PriceMatrix;
use crate::types::AssetId;
use crate::PortfolioRiskResult;

/// Per-asset period returns. One row per price date except the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMatrix {
    mode: ReturnMode,
    dates: Vec<NaiveDate>,
    assets: Vec<AssetId>,
    returns: Vec<Vec<f64>>,
    /// Rows discarded because a return was undefined
    dropped_rows: usize,
}

impl ReturnMatrix {
    pub fn mode(&self) -> ReturnMode {
        self.mode
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Return series of the asset at column `idx`.
    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.returns.iter().map(|row| row[idx]).collect()
    }
}

/// Convert a price matrix into period returns.
///
/// Each row `t` holds `ln(p_t / p_{t-1})` (log) or `p_t / p_{t-1} - 1`
/// (arithmetic). A row is dropped, not patched, when any of its returns is
/// undefined (a non-positive price on either side of the ratio).
pub fn build_returns(prices: &PriceMatrix, mode: ReturnMode) -> PortfolioRiskResult<ReturnMatrix> {
    if prices.len() < 2 {
        return Err(PortfolioRiskError::invalid(
            "prices",
            format!(
                "at least 2 dated rows are required to compute returns, got {}",
                prices.len()
            ),
        ));
    }

    let rows = prices.rows();
    let mut dates = Vec::with_capacity(rows.len() - 1);
    let mut returns = Vec::with_capacity(rows.len() - 1);
    let mut dropped_rows = 0;

    for (t, pair) in rows.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        let row: Option<Vec<f64>> = prev
            .iter()
            .zip(curr.iter())
            .map(|(&p0, &p1)| period_return(p0, p1, mode))
            .collect();

        match row {
            Some(row) => {
                dates.push(prices.dates()[t + 1]);
                returns.push(row);
            }
            None => dropped_rows += 1,
        }
    }

    if dropped_rows > 0 {
        tracing::debug!(dropped_rows, "dropped return rows with undefined values");
    }

    Ok(ReturnMatrix {
        mode,
        dates,
        assets: prices.assets().to_vec(),
        returns,
        dropped_rows,
    })
}

fn period_return(p0: f64, p1: f64, mode: ReturnMode) -> Option<f64> {
    if p0 <= 0.0 || p1 <= 0.0 {
        return None;
    }
    let r = match mode {
        ReturnMode::Log => (p1 / p0).ln(),
        ReturnMode::Arithmetic => p1 / p0 - 1.0,
    };
    r.is_finite().then_some(r)
}
