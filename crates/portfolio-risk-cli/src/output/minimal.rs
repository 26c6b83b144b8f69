use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Headline figure of each command, most specific first
    let priority_keys = [
        "var",
        "probability_above_target",
        "ratio",
        "max_drawdown",
        "sharpe_ratio",
        "annualized_return",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_var_in_envelope() {
        let v = json!({"result": {"sharpe_ratio": 0.8, "var": 0.12}, "warnings": []});
        assert_eq!(minimal_line(&v), "0.12");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let v = json!({"periods": 10});
        assert_eq!(minimal_line(&v), "periods: 10");
    }
}
