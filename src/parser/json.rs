use serde_json::{Map, Value};

/// Outcome of pulling a JSON object out of free-form model text
#[derive(Debug)]
pub enum ObjectSlice<'a> {
    Found(&'a str),
    Missing,
}

/// Slice from the first `{` to the last `}`. Anything the model wrapped
/// around the object (prose, markdown fences) is discarded.
pub fn slice_object(raw: &str) -> ObjectSlice<'_> {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => ObjectSlice::Found(&raw[start..=end]),
        _ => ObjectSlice::Missing,
    }
}

/// Decode an object slice; a top-level value that is not an object is an error
pub fn decode_object(slice: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str::<Map<String, Value>>(slice)
}

/// Short, char-safe excerpt of a reply for diagnostics
pub fn preview(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
