//! JSON payload rendering

use crate::error::TemplateResult;
use crate::matching_token;
use drift_core::{IterationAssignment, TokenValue};
use serde_json::Value;

pub(crate) fn render(template: &str, assignment: &IterationAssignment) -> TemplateResult<String> {
    let mut root: Value = serde_json::from_str(template)?;
    replace_tokens(&mut root, assignment);
    Ok(serde_json::to_string(&root)?)
}

fn replace_tokens(node: &mut Value, assignment: &IterationAssignment) {
    match node {
        Value::Object(members) => {
            for (name, child) in members.iter_mut() {
                if let Some(token) = matching_token(name, assignment) {
                    *child = replacement(child, token);
                }
                replace_tokens(child, assignment);
            }
        }
        Value::Array(items) => {
            for item in items {
                replace_tokens(item, assignment);
            }
        }
        _ => {}
    }
}

/// Numbers stay numbers only where the template already had one
fn replacement(current: &Value, token: &TokenValue) -> Value {
    if current.is_number() {
        if let Some(number) = token.as_json_number() {
            return number;
        }
    }
    Value::String(token.to_string())
}
