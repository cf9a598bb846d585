use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields render as a Field/Value table; the `records` and
/// `horizons` arrays get their own domain-specific tables.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            if !matches!(val, Value::Array(_)) {
                builder.push_record([key.as_str(), &format_value(val)]);
            }
        }
        println!("{}", Table::from(builder));

        if let Some(Value::Array(records)) = res_map.get("records") {
            if !records.is_empty() {
                println!("\nMonthly records:");
                print_records_table(records);
            }
        }
        if let Some(Value::Array(horizons)) = res_map.get("horizons") {
            if !horizons.is_empty() {
                println!("\nRolling summary:");
                print_horizons_table(horizons);
            }
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_records_table(records: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record([
        "Month End", "SIP Date", "Invested", "Units", "NAV", "Value", "XIRR",
    ]);
    for rec in records {
        let Value::Object(map) = rec else { continue };
        builder.push_record([
            field_str(map, "month_end"),
            field_str(map, "sip_date"),
            field_num(map, "cumulative_invested", 2),
            field_num(map, "cumulative_units", 6),
            field_num(map, "month_end_nav", 2),
            field_num(map, "portfolio_value", 2),
            field_pct(map, "xirr_to_date"),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_horizons_table(horizons: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(["Horizon", "Windows", "Average", "Minimum", "Maximum"]);
    for series in horizons {
        let Value::Object(map) = series else { continue };
        let horizon = map
            .get("horizon_years")
            .and_then(Value::as_u64)
            .map(|h| format!("{}Y", h))
            .unwrap_or_default();
        let windows = map
            .get("rates")
            .and_then(Value::as_array)
            .map(|rates| rates.iter().filter(|r| !r.is_null()).count())
            .unwrap_or(0);
        let summary = map.get("summary").and_then(Value::as_object);
        let pct = |key: &str| {
            summary
                .map(|s| field_pct(s, key))
                .unwrap_or_else(|| "NA".to_string())
        };
        builder.push_record([
            horizon,
            windows.to_string(),
            pct("mean"),
            pct("min"),
            pct("max"),
        ]);
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", value);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        return;
    }
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());
        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn field_str(map: &serde_json::Map<String, Value>, key: &str) -> String {
    map.get(key).map(format_value).unwrap_or_default()
}

fn field_num(map: &serde_json::Map<String, Value>, key: &str, decimals: usize) -> String {
    map.get(key)
        .and_then(Value::as_f64)
        .map(|n| format!("{:.*}", decimals, n))
        .unwrap_or_else(|| "NA".to_string())
}

fn field_pct(map: &serde_json::Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_f64)
        .map(|r| format!("{:.2}%", r * 100.0))
        .unwrap_or_else(|| "NA".to_string())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NA".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
