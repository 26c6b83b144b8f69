use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// A dated return series (`dates` + `values`) is written as `date,value`
/// rows; anything else as two-column `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    write_csv(&mut wtr, value);
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) {
    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            if let Some(series) = dated_series(body) {
                let _ = wtr.write_record(["date", "value"]);
                for (date, v) in series {
                    let _ = wtr.write_record([date, v]);
                }
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in body {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }
}

/// Find a `{dates: [...], values: [...]}` series among the object's fields.
fn dated_series(map: &Map<String, Value>) -> Option<Vec<(String, String)>> {
    let series = map.get("series")?;
    let dates = series.get("dates")?.as_array()?;
    let values = series.get("values")?.as_array()?;
    Some(
        dates
            .iter()
            .zip(values.iter())
            .map(|(d, v)| (format_csv_value(d), format_csv_value(v)))
            .collect(),
    )
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, value);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_series_written_as_rows() {
        let v = json!({
            "annualized_return": 0.1,
            "series": {"mode": "log", "dates": ["2024-01-02", "2024-01-03"], "values": [0.01, -0.02]}
        });
        assert_eq!(render(&v), "date,value\n2024-01-02,0.01\n2024-01-03,-0.02\n");
    }

    #[test]
    fn test_envelope_result_as_pairs() {
        let v = json!({"result": {"var": 0.1}, "warnings": []});
        assert_eq!(render(&v), "field,value\nvar,0.1\n");
    }
}
