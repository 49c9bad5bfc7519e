mod json;
mod placeholder;

pub use placeholder::is_placeholder;

use json::preview;
use placeholder::strip_object;

use crate::error::ExtractionError;
use crate::provider::Reply;
use json::ObjectSlice;
use serde_json::{Map, Value};

const PREVIEW_CHARS: usize = 200;

/// Parse a backend reply into a raw task result.
///
/// Takes the text between the first `{` and the last `}`, decodes it as a
/// JSON object and drops placeholder values.
pub fn parse_reply(role: &str, reply: &Reply) -> Result<Map<String, Value>, ExtractionError> {
    let text = match reply {
        Reply::Text(text) => text.as_str(),
        Reply::Empty => {
            return Err(ExtractionError::MissingObject {
                role: role.to_string(),
                preview: String::new(),
            })
        }
    };

    let slice = match json::slice_object(text) {
        ObjectSlice::Found(slice) => slice,
        ObjectSlice::Missing => {
            return Err(ExtractionError::MissingObject {
                role: role.to_string(),
                preview: preview(text, PREVIEW_CHARS),
            })
        }
    };

    let object = json::decode_object(slice).map_err(|e| ExtractionError::Decode {
        role: role.to_string(),
        source: e,
        preview: preview(slice, PREVIEW_CHARS),
    })?;

    Ok(strip_object(object))
}
