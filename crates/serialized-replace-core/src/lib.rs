//! Search and replace for PHP serialized data.
//!
//! PHP stores strings as `s:<byte length>:"<payload>";`. Replacing text in
//! such data with a plain substring replace corrupts it, because the length
//! prefix no longer matches. This crate provides two byte-oriented engines:
//!
//! - [`replace_in_serialized`] searches only inside serialized string payloads
//!   (ASCII case-insensitive) and rewrites the length prefix to match.
//! - [`batch_replace`] applies many `old -> new` pairs to raw bytes in a single
//!   pass, the longest pattern winning at each position.
//!
//! Both are binary-safe, never modify their input, and keep no state between
//! calls, so they can be used from any number of threads at once.
//!
//! # Quick Start
//!
//! ```rust
//! use serialized_replace_core::{batch_replace, replace_in_serialized, Replacement};
//!
//! let data = br#"a:1:{s:7:"siteurl";s:18:"http://example.com";}"#;
//! let moved = replace_in_serialized(data, b"http://example.com", b"https://example.org").unwrap();
//! assert_eq!(moved, br#"a:1:{s:7:"siteurl";s:19:"https://example.org";}"#);
//!
//! let pairs = [Replacement::from(("ab", "X")), Replacement::from(("a", "Y"))];
//! assert_eq!(batch_replace(b"abc", &pairs).unwrap(), b"Xc");
//! ```
//!
//! # Malformed input
//!
//! Broken markers (bad digits, missing quote, truncated payload) are not
//! errors. They are copied through as ordinary bytes, and payloads that run
//! past the end of the input are clamped.
//!
//! # Features
//!
//! - `serde` - JSON replacement tables ([`table`])
//! - `tracing` - instrumentation of both engines

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod batch;
pub mod buffer;
pub mod error;
pub mod search;
pub mod serialized;

#[cfg(feature = "serde")]
pub mod table;

pub use batch::{batch_replace, benchmark, Replacement};
pub use buffer::{into_utf8, OutputBuffer};
pub use error::{ErrorKind, ReplaceError, Result};
pub use search::{
    find_ascii_case_insensitive, find_ascii_case_insensitive_naive, CaseInsensitiveFinder,
};
pub use serialized::{
    replace_in_serialized, replace_in_serialized_with_options, ElementIter, SerializedElement,
    SerializedReplaceOptions,
};

#[cfg(feature = "serde")]
pub use table::{replacements_from_json, replacements_to_json};

/// Always `true`: neither engine keeps global or cached state.
pub const THREAD_SAFE: bool = true;
