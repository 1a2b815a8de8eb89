//! Length-prefix aware replacement inside PHP serialized strings.
//!
//! PHP encodes a string value as `s:<byte length>:"<payload>";`. A plain
//! substring replacement breaks such data because the length prefix no longer
//! matches the payload. This module searches only inside recognized payloads
//! and rewrites the prefix to the new payload length.
//!
//! # Scanning rules
//!
//! - A marker is `s:` followed by one or more ASCII digits, `:` and `"`.
//!   Anything else is ordinary data and is copied through untouched.
//! - The payload is the next `<byte length>` bytes, clamped to the end of the
//!   input so truncated data never reads out of bounds.
//! - A closing `"` and then `;` are part of the element only if the input
//!   actually has them there. They are never fabricated.
//! - Scanning resumes after the element, so nothing inside a payload is ever
//!   interpreted as a marker.
//!
//! # Tracing Support
//!
//! Enable the `tracing` feature for per-element instrumentation:
//!
//! ```toml
//! serialized-replace-core = { version = "0.1", features = ["tracing"] }
//! ```

use std::ops::Range;

use memchr::{memchr, memmem};

#[cfg(feature = "tracing")]
use bstr::ByteSlice;
#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace, warn};

use crate::buffer::{copy_of, OutputBuffer};
use crate::error::Result;
use crate::search::CaseInsensitiveFinder;

/// Options for [`replace_in_serialized_with_options`].
#[derive(Debug, Clone)]
pub struct SerializedReplaceOptions {
    /// How many matches to replace inside one payload. `0` means all of them.
    pub max_replacements_per_element: usize,
    /// Whether `old` is matched ignoring ASCII case.
    pub case_insensitive: bool,
}

impl Default for SerializedReplaceOptions {
    fn default() -> Self {
        Self {
            max_replacements_per_element: 1,
            case_insensitive: true,
        }
    }
}

/// The header of a serialized string: `s:<declared_len>:"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Length written in the header.
    pub declared_len: usize,
    /// Offset of the first payload byte (just after the opening quote).
    pub payload_start: usize,
}

/// Try to read a marker starting exactly at `pos`.
///
/// Returns `None` for anything that is not a complete `s:<digits>:"` header,
/// including length fields that overflow `usize`.
///
/// # Example
///
/// ```rust
/// use serialized_replace_core::serialized::{parse_marker, Marker};
///
/// assert_eq!(
///     parse_marker(b"x;s:12:\"", 2),
///     Some(Marker { declared_len: 12, payload_start: 8 })
/// );
/// assert_eq!(parse_marker(b"s::\"", 0), None);
/// assert_eq!(parse_marker(b"s:3:x", 0), None);
/// ```
pub fn parse_marker(data: &[u8], pos: usize) -> Option<Marker> {
    if data.get(pos..pos.checked_add(2)?)? != b"s:" {
        return None;
    }

    let digits_start = pos + 2;
    let mut cursor = digits_start;
    let mut declared_len: usize = 0;
    while let Some(&byte) = data.get(cursor) {
        if !byte.is_ascii_digit() {
            break;
        }
        declared_len = declared_len
            .checked_mul(10)?
            .checked_add(usize::from(byte - b'0'))?;
        cursor += 1;
    }
    if cursor == digits_start {
        return None;
    }

    if data.get(cursor) != Some(&b':') || data.get(cursor + 1) != Some(&b'"') {
        return None;
    }

    Some(Marker {
        declared_len,
        payload_start: cursor + 2,
    })
}

/// A recognized serialized string inside a larger buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SerializedElement {
    /// Offset of the leading `s`.
    pub start: usize,
    /// Length written in the header.
    pub declared_len: usize,
    /// Payload bytes, clamped to the end of the buffer.
    pub payload: Range<usize>,
    /// One past the last byte of the element, closing delimiters included.
    pub end: usize,
}

impl SerializedElement {
    /// Whether the buffer ended before the declared payload length.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.declared_len
    }

    /// Range of the closing `"` / `";` actually present after the payload.
    #[inline]
    pub fn closing(&self) -> Range<usize> {
        self.payload.end..self.end
    }

    /// Whether the header agrees with the payload and both delimiters are present.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        !self.is_truncated() && self.closing().len() == 2
    }
}

/// Read a whole element (header, payload and closing delimiters) at `pos`.
fn element_at(data: &[u8], pos: usize) -> Option<SerializedElement> {
    let marker = parse_marker(data, pos)?;
    let payload_end = marker
        .payload_start
        .saturating_add(marker.declared_len)
        .min(data.len());

    let mut end = payload_end;
    if data.get(end) == Some(&b'"') {
        end += 1;
        if data.get(end) == Some(&b';') {
            end += 1;
        }
    }

    Some(SerializedElement {
        start: pos,
        declared_len: marker.declared_len,
        payload: marker.payload_start..payload_end,
        end,
    })
}

/// Iterator over the serialized strings of a buffer, left to right.
///
/// Uses the same scanning rules as [`replace_in_serialized`].
///
/// ```rust
/// use serialized_replace_core::serialized::ElementIter;
///
/// let data = br#"a:2:{s:3:"key";s:5:"value";}"#;
/// let payloads: Vec<&[u8]> = ElementIter::new(data)
///     .map(|e| &data[e.payload])
///     .collect();
/// assert_eq!(payloads, vec![&b"key"[..], &b"value"[..]]);
/// ```
#[derive(Debug, Clone)]
pub struct ElementIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ElementIter<'a> {
    /// Start scanning at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl Iterator for ElementIter<'_> {
    type Item = SerializedElement;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let candidate = self.pos + memchr(b's', &self.data[self.pos..])?;
            if let Some(element) = element_at(self.data, candidate) {
                self.pos = element.end;
                return Some(element);
            }
            self.pos = candidate + 1;
        }
        None
    }
}

/// Searches payloads for `old` with the configured case handling.
enum PayloadFinder<'n> {
    CaseInsensitive(CaseInsensitiveFinder<'n>),
    Exact(memmem::Finder<'n>),
}

impl<'n> PayloadFinder<'n> {
    fn new(needle: &'n [u8], case_insensitive: bool) -> Self {
        if case_insensitive {
            Self::CaseInsensitive(CaseInsensitiveFinder::new(needle))
        } else {
            Self::Exact(memmem::Finder::new(needle))
        }
    }

    #[inline]
    fn find(&self, haystack: &[u8]) -> Option<usize> {
        match self {
            Self::CaseInsensitive(finder) => finder.find(haystack),
            Self::Exact(finder) => finder.find(haystack),
        }
    }
}

/// Replace the first case-insensitive occurrence of `old` inside every
/// serialized string of `original`, fixing up the length prefixes.
///
/// Bytes outside serialized string payloads are copied unchanged. `new` is
/// inserted verbatim. Empty `old`, empty input and `old == new` all return an
/// unchanged copy.
///
/// # Example
///
/// ```rust
/// use serialized_replace_core::replace_in_serialized;
///
/// let out = replace_in_serialized(br#"a:1:{s:5:"hello";}"#, b"hello", b"hi").unwrap();
/// assert_eq!(out, br#"a:1:{s:2:"hi";}"#);
///
/// let out = replace_in_serialized(br#"s:15:"http://old.com/";"#, b"http://OLD.com", b"https://new.com").unwrap();
/// assert_eq!(out, br#"s:16:"https://new.com/";"#);
/// ```
pub fn replace_in_serialized(original: &[u8], old: &[u8], new: &[u8]) -> Result<Vec<u8>> {
    replace_in_serialized_with_options(original, old, new, &SerializedReplaceOptions::default())
}

/// [`replace_in_serialized`] with explicit options.
#[cfg_attr(
    feature = "tracing",
    instrument(
        skip_all,
        fields(data_len = original.len(), old = %old.as_bstr(), new = %new.as_bstr())
    )
)]
pub fn replace_in_serialized_with_options(
    original: &[u8],
    old: &[u8],
    new: &[u8],
    options: &SerializedReplaceOptions,
) -> Result<Vec<u8>> {
    if original.is_empty() || old.is_empty() || old == new {
        #[cfg(feature = "tracing")]
        debug!("Degenerate input, returning copy");
        return copy_of(original);
    }

    let finder = PayloadFinder::new(old, options.case_insensitive);
    let mut out = OutputBuffer::with_estimate(estimate_len(original.len(), old.len(), new.len()))?;
    let mut copied_up_to = 0;
    #[cfg(feature = "tracing")]
    let mut replaced_elements = 0usize;

    for element in ElementIter::new(original) {
        out.extend_from_slice(&original[copied_up_to..element.start])?;
        if write_element(&mut out, original, &element, &finder, old.len(), new, options)? {
            #[cfg(feature = "tracing")]
            {
                replaced_elements += 1;
            }
        }
        copied_up_to = element.end;
    }
    out.extend_from_slice(&original[copied_up_to..])?;

    #[cfg(feature = "tracing")]
    debug!(
        replaced_elements,
        output_len = out.len(),
        "Serialized replacement completed"
    );

    Ok(out.into_vec())
}

/// Output size guess: input plus worst-case growth, capped at doubling.
fn estimate_len(original_len: usize, old_len: usize, new_len: usize) -> usize {
    let growth_per_match = new_len.saturating_sub(old_len);
    let max_matches = original_len / old_len.max(1);
    original_len.saturating_add(growth_per_match.saturating_mul(max_matches).min(original_len))
}

/// Emit one element, rewritten if `old` occurs in its payload.
///
/// Returns whether anything was replaced.
fn write_element(
    out: &mut OutputBuffer,
    data: &[u8],
    element: &SerializedElement,
    finder: &PayloadFinder<'_>,
    old_len: usize,
    new: &[u8],
    options: &SerializedReplaceOptions,
) -> Result<bool> {
    let payload = &data[element.payload.clone()];

    let mut matches = Vec::new();
    let mut search_from = 0;
    while options.max_replacements_per_element == 0
        || matches.len() < options.max_replacements_per_element
    {
        match finder.find(&payload[search_from..]) {
            Some(offset) => {
                let at = search_from + offset;
                matches.push(at);
                search_from = at + old_len;
            }
            None => break,
        }
    }

    if matches.is_empty() {
        out.extend_from_slice(&data[element.start..element.end])?;
        return Ok(false);
    }

    #[cfg(feature = "tracing")]
    if element.is_truncated() {
        warn!(
            start = element.start,
            declared_len = element.declared_len,
            actual_len = element.payload.len(),
            "Serialized string payload truncated by end of input"
        );
    }

    // The header keeps describing the declared length, adjusted by the
    // replacements, even when the input was cut short.
    let removed = matches.len() * old_len;
    let added = matches.len() * new.len();
    let new_declared_len = element.declared_len.saturating_sub(removed).saturating_add(added);
    // Matches never overlap, so the subtraction cannot underflow.
    let new_payload_len = payload.len() - removed + added;

    #[cfg(feature = "tracing")]
    trace!(
        start = element.start,
        matches = matches.len(),
        old_payload_len = payload.len(),
        new_payload_len,
        new_declared_len,
        "Rewriting serialized string"
    );

    out.ensure_capacity(new_payload_len + 24)?;
    out.extend_from_slice(b"s:")?;
    out.write_decimal(new_declared_len)?;
    out.extend_from_slice(b":\"")?;

    let mut cursor = 0;
    for at in matches {
        out.extend_from_slice(&payload[cursor..at])?;
        out.extend_from_slice(new)?;
        cursor = at + old_len;
    }
    out.extend_from_slice(&payload[cursor..])?;
    out.extend_from_slice(&data[element.closing()])?;

    Ok(true)
}
