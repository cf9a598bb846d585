use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = ["xirr", "final_value", "valuation_date", "written"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal_value(val));
                    return;
                }
            }
        }

        if let Some((_, val)) = map.iter().next() {
            println!("{}", format_minimal_value(val));
            return;
        }
    }

    println!("{}", result_obj);
}

fn format_minimal_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Array(arr) => format!("{} items", arr.len()),
        other => other.to_string(),
    }
}
