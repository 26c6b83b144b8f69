use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PortfolioRiskError;
use crate::types::AssetId;
use crate::PortfolioRiskResult;

/// Plain wire form of a [`PriceMatrix`]; validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceMatrixData {
    pub dates: Vec<NaiveDate>,
    pub assets: Vec<AssetId>,
    /// One row per date, one column per asset (adjusted close)
    pub prices: Vec<Vec<f64>>,
}

/// Adjusted closing prices: trading dates (strictly increasing) by assets.
///
/// Every retained date carries a finite price for every asset. Rows with a
/// missing asset are removed by [`PriceMatrix::from_observations`] before the
/// matrix is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceMatrixData", into = "PriceMatrixData")]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<AssetId>,
    prices: Vec<Vec<f64>>,
}

impl PriceMatrix {
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<AssetId>,
        prices: Vec<Vec<f64>>,
    ) -> PortfolioRiskResult<Self> {
        validate_assets(&assets)?;

        if dates.len() != prices.len() {
            return Err(PortfolioRiskError::DimensionMismatch {
                expected: format!("{} price rows (one per date)", dates.len()),
                found: format!("{} price rows", prices.len()),
            });
        }

        for (date, row) in dates.iter().zip(prices.iter()) {
            if row.len() != assets.len() {
                return Err(PortfolioRiskError::DimensionMismatch {
                    expected: format!("{} prices on {date}", assets.len()),
                    found: format!("{} prices", row.len()),
                });
            }
            if let Some(pos) = row.iter().position(|p| !p.is_finite()) {
                return Err(PortfolioRiskError::invalid(
                    "prices",
                    format!("non-finite price for {} on {date}", assets[pos]),
                ));
            }
        }

        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PortfolioRiskError::invalid(
                "dates",
                format!("dates must be strictly increasing ({} followed by {})", w[0], w[1]),
            ));
        }

        Ok(PriceMatrix {
            dates,
            assets,
            prices,
        })
    }

    /// Build a matrix from raw, possibly unordered and incomplete observations.
    ///
    /// Rows are sorted by date; any date lacking a finite price for one of the
    /// assets is dropped. Returns the matrix and the number of dropped rows.
    pub fn from_observations<I>(assets: Vec<AssetId>, rows: I) -> PortfolioRiskResult<(Self, usize)>
    where
        I: IntoIterator<Item = (NaiveDate, Vec<Option<f64>>)>,
    {
        validate_assets(&assets)?;

        let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = rows.into_iter().collect();
        rows.sort_by_key(|(date, _)| *date);

        if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(PortfolioRiskError::invalid(
                "dates",
                format!("duplicate observation date {}", w[0].0),
            ));
        }

        let total = rows.len();
        let mut dates = Vec::with_capacity(total);
        let mut prices = Vec::with_capacity(total);

        for (date, row) in rows {
            if row.len() != assets.len() {
                return Err(PortfolioRiskError::DimensionMismatch {
                    expected: format!("{} prices on {date}", assets.len()),
                    found: format!("{} prices", row.len()),
                });
            }
            let complete: Option<Vec<f64>> = row
                .into_iter()
                .map(|p| p.filter(|v| v.is_finite()))
                .collect();
            if let Some(complete) = complete {
                dates.push(date);
                prices.push(complete);
            }
        }

        let dropped = total - dates.len();
        if dropped > 0 {
            tracing::debug!(dropped, retained = dates.len(), "dropped incomplete price rows");
        }

        Ok((PriceMatrix::new(dates, assets, prices)?, dropped))
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.prices
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }
}

impl TryFrom<PriceMatrixData> for PriceMatrix {
    type Error = PortfolioRiskError;

    fn try_from(data: PriceMatrixData) -> Result<Self, Self::Error> {
        PriceMatrix::new(data.dates, data.assets, data.prices)
    }
}

impl From<PriceMatrix> for PriceMatrixData {
    fn from(m: PriceMatrix) -> Self {
        PriceMatrixData {
            dates: m.dates,
            assets: m.assets,
            prices: m.prices,
        }
    }
}

fn validate_assets(assets: &[AssetId]) -> PortfolioRiskResult<()> {
    if assets.is_empty() {
        return Err(PortfolioRiskError::invalid(
            "assets",
            "at least one asset column is required",
        ));
    }
    let mut seen = HashSet::with_capacity(assets.len());
    for asset in assets {
        if asset.trim().is_empty() {
            return Err(PortfolioRiskError::invalid("assets", "empty asset identifier"));
        }
        if !seen.insert(asset.as_str()) {
            return Err(PortfolioRiskError::invalid(
                "assets",
                format!("duplicate asset identifier '{asset}'"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn assets() -> Vec<AssetId> {
        vec!["AAA".into(), "BBB".into()]
    }

    #[test]
    fn test_valid_matrix() {
        let m = PriceMatrix::new(
            vec![d(2), d(3), d(4)],
            assets(),
            vec![vec![10.0, 20.0], vec![11.0, 19.0], vec![12.0, 21.0]],
        )
        .unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.asset_count(), 2);
        assert_eq!(m.rows()[1], vec![11.0, 19.0]);
    }

    #[test]
    fn test_non_increasing_dates_rejected() {
        let err = PriceMatrix::new(
            vec![d(3), d(3)],
            assets(),
            vec![vec![10.0, 20.0], vec![11.0, 19.0]],
        )
        .unwrap_err();
        assert!(matches!(err, PortfolioRiskError::InvalidInput { .. }));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = PriceMatrix::new(vec![d(2)], assets(), vec![vec![10.0]]).unwrap_err();
        assert!(matches!(err, PortfolioRiskError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(PriceMatrix::new(vec![d(2)], assets(), vec![vec![10.0, f64::NAN]]).is_err());
    }

    #[test]
    fn test_duplicate_asset_rejected() {
        let dup = vec!["AAA".to_string(), "AAA".to_string()];
        assert!(PriceMatrix::new(vec![d(2)], dup, vec![vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_from_observations_sorts_and_drops_incomplete() {
        let rows = vec![
            (d(4), vec![Some(12.0), Some(21.0)]),
            (d(2), vec![Some(10.0), Some(20.0)]),
            (d(3), vec![Some(11.0), None]),
        ];
        let (m, dropped) = PriceMatrix::from_observations(assets(), rows).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(m.dates(), &[d(2), d(4)]);
        assert_eq!(m.rows()[1], vec![12.0, 21.0]);
    }

    #[test]
    fn test_from_observations_duplicate_date() {
        let rows = vec![
            (d(2), vec![Some(10.0), Some(20.0)]),
            (d(2), vec![Some(11.0), Some(21.0)]),
        ];
        assert!(PriceMatrix::from_observations(assets(), rows).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"dates":["2024-01-03","2024-01-02"],"assets":["A"],"prices":[[1.0],[2.0]]}"#;
        assert!(serde_json::from_str::<PriceMatrix>(json).is_err());

        let json = r#"{"dates":["2024-01-02","2024-01-03"],"assets":["A"],"prices":[[1.0],[2.0]]}"#;
        let m: PriceMatrix = serde_json::from_str(json).unwrap();
        assert_eq!(m.len(), 2);
    }
}
