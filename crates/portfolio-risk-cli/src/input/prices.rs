use chrono::NaiveDate;
use std::io::Read;

use portfolio_risk_core::PriceMatrix;

use super::file::resolve_path;

/// Read a wide price CSV (`date,<asset>,<asset>,...`).
///
/// Empty cells are missing observations; dates missing any asset are dropped.
/// Returns the matrix and the number of dropped dates.
pub fn read_price_csv(path: &str) -> Result<(PriceMatrix, usize), Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_price_csv(file).map_err(|e| format!("'{}': {}", canonical.display(), e).into())
}

pub fn parse_price_csv<R: Read>(reader: R) -> Result<(PriceMatrix, usize), Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err("price CSV needs a date column followed by at least one asset column".into());
    }
    let assets: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| format!("row {}: bad date '{}': {}", line + 1, raw_date, e))?;

        let prices = record
            .iter()
            .skip(1)
            .map(|cell| {
                if cell.is_empty() {
                    Ok(None)
                } else {
                    cell.parse::<f64>()
                        .map(Some)
                        .map_err(|e| format!("row {}: bad price '{}': {}", line + 1, cell, e))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((date, prices));
    }

    Ok(PriceMatrix::from_observations(assets, rows)?)
}
