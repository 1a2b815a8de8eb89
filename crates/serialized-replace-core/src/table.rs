//! Replacement tables in JSON form.
//!
//! A table is an array of `[old, new]` string pairs, listed in priority order
//! for ties:
//!
//! ```json
//! [["http://old.example", "https://new.example"], ["wp_", "site_"]]
//! ```
//!
//! Enable the `serde` feature to use this module.

use serde_json::Value as JsonValue;

use crate::batch::Replacement;
use crate::error::{ReplaceError, Result};

/// Parse a JSON replacement table.
///
/// Any shape other than an array of two-string arrays is rejected with
/// [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) naming
/// the offending entry.
///
/// # Example
///
/// ```rust
/// use serialized_replace_core::{batch_replace, table::replacements_from_json};
///
/// let pairs = replacements_from_json(r#"[["wp_", "new_"], ["wp", "w"]]"#).unwrap();
/// assert_eq!(batch_replace(b"wp_posts", &pairs).unwrap(), b"new_posts");
/// ```
pub fn replacements_from_json(json: &str) -> Result<Vec<Replacement<'static>>> {
    let value: JsonValue = serde_json::from_str(json)
        .map_err(|e| ReplaceError::invalid_argument(format!("malformed JSON: {}", e)))?;
    replacements_from_value(&value)
}

/// Like [`replacements_from_json`], for an already parsed value.
pub fn replacements_from_value(value: &JsonValue) -> Result<Vec<Replacement<'static>>> {
    let entries = value
        .as_array()
        .ok_or_else(|| ReplaceError::invalid_argument("replacement table must be an array"))?;

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| match entry.as_array().map(Vec::as_slice) {
            Some([JsonValue::String(old), JsonValue::String(new)]) => Ok(Replacement::from((
                old.clone().into_bytes(),
                new.clone().into_bytes(),
            ))),
            _ => Err(ReplaceError::invalid_argument(format!(
                "pair {} must be an array of two strings",
                idx
            ))
            .with_context("replacement table")),
        })
        .collect()
}

/// Render replacements back to the JSON table shape.
///
/// Non-UTF-8 bytes are replaced with U+FFFD.
pub fn replacements_to_json(pairs: &[Replacement<'_>]) -> JsonValue {
    JsonValue::Array(
        pairs
            .iter()
            .map(|pair| {
                JsonValue::Array(vec![
                    JsonValue::String(String::from_utf8_lossy(&pair.old).into_owned()),
                    JsonValue::String(String::from_utf8_lossy(&pair.new).into_owned()),
                ])
            })
            .collect(),
    )
}
