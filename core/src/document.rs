//! YAML document adapter.
//!
//! Turns file contents into a generic [`serde_yaml::Value`] tree. Nothing here
//! knows about the metafile schema.

use serde_yaml::Value;

use crate::error::{MetafileError, Result};

/// Reads and parses the document at `path`.
pub fn read_document(path: &str) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| MetafileError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_document(path, &text)
}

/// Parses `text` as a single YAML document. `path` is only used for error
/// context.
///
/// Blank and comment-only documents parse to [`Value::Null`].
pub fn parse_document(path: &str, text: &str) -> Result<Value> {
    if is_blank(text) {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|source| MetafileError::Syntax {
        path: path.to_string(),
        source,
    })
}

fn is_blank(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}
