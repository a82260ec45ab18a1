//! JSON structural diff

use crate::error::ParseError;
use crate::verdict::{DiffKind, Difference};
use serde_json::Value;

pub(crate) fn compare(left: &str, right: &str) -> Result<Vec<Difference>, ParseError> {
    let left: Value = serde_json::from_str(left)?;
    let right: Value = serde_json::from_str(right)?;

    if left == right {
        return Ok(Vec::new());
    }

    let mut differences = Vec::new();
    compare_json("$", &left, &right, &mut differences);
    Ok(differences)
}

fn compare_json(path: &str, left: &Value, right: &Value, differences: &mut Vec<Difference>) {
    match (left, right) {
        (Value::Object(left_obj), Value::Object(right_obj)) => {
            for (key, left_value) in left_obj {
                let member_path = format!("{}.{}", path, key);
                match right_obj.get(key) {
                    Some(right_value) => {
                        compare_json(&member_path, left_value, right_value, differences)
                    }
                    None => differences.push(Difference::new(
                        &member_path,
                        DiffKind::MissingInRight,
                        format!("Missing field in API 2: {}", member_path),
                    )),
                }
            }

            for key in right_obj.keys().filter(|k| !left_obj.contains_key(*k)) {
                let member_path = format!("{}.{}", path, key);
                differences.push(Difference::new(
                    &member_path,
                    DiffKind::MissingInLeft,
                    format!("Missing field in API 1: {}", member_path),
                ));
            }
        }
        (Value::Array(left_arr), Value::Array(right_arr)) => {
            for i in 0..left_arr.len().max(right_arr.len()) {
                let element_path = format!("{}[{}]", path, i);
                match (left_arr.get(i), right_arr.get(i)) {
                    (Some(l), Some(r)) => compare_json(&element_path, l, r, differences),
                    (Some(_), None) => differences.push(Difference::new(
                        &element_path,
                        DiffKind::MissingInRight,
                        format!("Missing element in API 2: {}", element_path),
                    )),
                    (None, Some(_)) => differences.push(Difference::new(
                        &element_path,
                        DiffKind::MissingInLeft,
                        format!("Missing element in API 1: {}", element_path),
                    )),
                    (None, None) => {}
                }
            }
        }
        _ => {
            if left != right {
                differences.push(Difference::new(
                    path,
                    DiffKind::ValueMismatch,
                    format!(
                        "Values differ at {}. API 1: {}, API 2: {}",
                        path,
                        text_of(left),
                        text_of(right)
                    ),
                ));
            }
        }
    }
}

/// Strings without quotes, everything else as compact JSON
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
