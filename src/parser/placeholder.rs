use serde_json::{Map, Value};

/// Strings models emit in place of facts they do not have.
/// Compared case-insensitively after trimming.
pub const PLACEHOLDER_TOKENS: &[&str] = &[
    "unknown",
    "n/a",
    "tbd",
    "not specified",
    "not available",
    "未知",
    "无",
    "暂无",
    "未指定",
];

/// Whether a string carries no information.
///
/// Heuristic: exact token match, plus `<...>` template slots copied back
/// from the prompt's shape hints. Rephrasings are not caught.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.len() > 2 && trimmed.starts_with('<') && trimmed.ends_with('>') {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    PLACEHOLDER_TOKENS.iter().any(|token| lowered == *token)
}

/// Remove placeholders recursively. Returns `None` when nothing real is left.
pub fn strip_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => (!is_placeholder(&s)).then_some(Value::String(s)),
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(strip_value).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::Object(map) => {
            let kept = strip_object(map);
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        other => Some(other),
    }
}

pub fn strip_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter_map(|(key, value)| strip_value(value).map(|v| (key, v)))
        .collect()
}
