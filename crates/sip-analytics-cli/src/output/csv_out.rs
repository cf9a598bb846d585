use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// The `records` array (when present) becomes the row set; a rolling result
/// emits one summary row per horizon; anything else degrades to field/value
/// pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(records)) = map.get("records") {
                write_array_csv(&mut wtr, records);
            } else if let Some(Value::Array(horizons)) = map.get("horizons") {
                write_horizons_csv(&mut wtr, horizons);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    if !matches!(val, Value::Array(_)) {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Column set from the first object, nested arrays/objects excluded
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Array(_) | Value::Object(_)))
            .map(|(k, _)| k.as_str())
            .collect();
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
    }
}

fn write_horizons_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, horizons: &[Value]) {
    let _ = wtr.write_record(["horizon_years", "windows", "mean", "min", "max"]);
    for series in horizons {
        let Value::Object(map) = series else { continue };
        let horizon = map
            .get("horizon_years")
            .map(format_csv_value)
            .unwrap_or_default();
        let windows = map
            .get("rates")
            .and_then(Value::as_array)
            .map(|rates| rates.iter().filter(|r| !r.is_null()).count())
            .unwrap_or(0);
        let summary = map.get("summary").and_then(Value::as_object);
        let stat = |key: &str| {
            summary
                .and_then(|s| s.get(key))
                .map(format_csv_value)
                .unwrap_or_default()
        };
        let _ = wtr.write_record([
            horizon,
            windows.to_string(),
            stat("mean"),
            stat("min"),
            stat("max"),
        ]);
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
