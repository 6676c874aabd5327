//! Markdown content documents to JSON.
//!
//! A document may start with a YAML front matter block delimited by `---`
//! lines. Its fields become the top-level fields of the JSON output and the
//! remaining markdown is stored, unrendered, under `body`.

use serde_json::{Map, Value};
use thiserror::Error;

pub const BODY_FIELD: &str = "body";
const FENCE: &str = "---";

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("Front matter is not closed by a `---` line")]
    Unterminated,

    #[error("Front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Front matter must be a mapping")]
    NotAMapping,

    #[error("Front matter may not define the reserved `body` field")]
    ReservedField,
}

/// Split a document into its front matter (if any) and body.
pub fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let front = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(front), body));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

/// Convert a markdown document to its JSON object.
pub fn to_json(text: &str) -> Result<Value, FrontMatterError> {
    let (front, body) = split_front_matter(text)?;

    let mut object = match front {
        Some(yaml) if !yaml.trim().is_empty() => match serde_yaml::from_str::<Value>(yaml)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(FrontMatterError::NotAMapping),
        },
        _ => Map::new(),
    };

    if object.contains_key(BODY_FIELD) {
        return Err(FrontMatterError::ReservedField);
    }
    object.insert(
        BODY_FIELD.to_string(),
        Value::String(body.trim_start_matches(['\r', '\n']).to_string()),
    );
    Ok(Value::Object(object))
}
