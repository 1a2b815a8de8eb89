//! Single-pass multi-pattern replacement.
//!
//! Every position of the input is tried against all patterns at once. The
//! longest pattern that matches there wins; among patterns of equal length the
//! one listed first wins. Replaced text is never rescanned and the scan never
//! moves backwards.
//!
//! Matching is exact (case-sensitive) and knows nothing about serialization.

use std::borrow::Cow;
use std::cmp::Reverse;

use memchr::{memchr, memchr2, memchr3};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

use crate::buffer::{copy_of, OutputBuffer};
use crate::error::Result;

/// One `old -> new` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Replacement<'a> {
    /// Bytes to look for. An empty pattern never matches.
    pub old: Cow<'a, [u8]>,
    /// Bytes written in place of `old`.
    pub new: Cow<'a, [u8]>,
}

impl<'a> Replacement<'a> {
    /// Create a replacement from anything convertible to byte cows.
    pub fn new(old: impl Into<Cow<'a, [u8]>>, new: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Detach from borrowed input.
    pub fn into_owned(self) -> Replacement<'static> {
        Replacement {
            old: Cow::Owned(self.old.into_owned()),
            new: Cow::Owned(self.new.into_owned()),
        }
    }
}

impl<'a> From<(&'a [u8], &'a [u8])> for Replacement<'a> {
    fn from((old, new): (&'a [u8], &'a [u8])) -> Self {
        Self::new(old, new)
    }
}

impl<'a> From<(&'a str, &'a str)> for Replacement<'a> {
    fn from((old, new): (&'a str, &'a str)) -> Self {
        Self::new(old.as_bytes(), new.as_bytes())
    }
}

impl From<(Vec<u8>, Vec<u8>)> for Replacement<'static> {
    fn from((old, new): (Vec<u8>, Vec<u8>)) -> Self {
        Self::new(old, new)
    }
}

/// How to jump to the next byte that can start a pattern.
enum Prefilter {
    One(u8),
    Two(u8, u8),
    Three(u8, u8, u8),
    Table(Box<[bool; 256]>),
}

impl Prefilter {
    #[inline]
    fn next_candidate(&self, data: &[u8], from: usize) -> Option<usize> {
        let rest = &data[from..];
        let offset = match self {
            Self::One(a) => memchr(*a, rest),
            Self::Two(a, b) => memchr2(*a, *b, rest),
            Self::Three(a, b, c) => memchr3(*a, *b, *c, rest),
            Self::Table(table) => rest.iter().position(|&b| table[usize::from(b)]),
        }?;
        Some(from + offset)
    }
}

/// Call-scoped lookup structure over the non-empty patterns.
struct PatternIndex<'p> {
    pairs: Vec<(&'p [u8], &'p [u8])>,
    /// Pair indices bucketed by the first byte of `old`, longest first,
    /// listing order among equal lengths.
    buckets: Vec<Vec<usize>>,
    prefilter: Prefilter,
}

impl<'p> PatternIndex<'p> {
    /// Returns `None` when no pair has a non-empty `old`.
    fn build(replacements: &'p [Replacement<'_>]) -> Option<Self> {
        let pairs: Vec<(&[u8], &[u8])> = replacements
            .iter()
            .filter(|r| !r.old.is_empty())
            .map(|r| (&*r.old, &*r.new))
            .collect();
        if pairs.is_empty() {
            return None;
        }

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); 256];
        let mut first_bytes = Vec::new();
        for (idx, (old, _)) in pairs.iter().enumerate() {
            let bucket = &mut buckets[usize::from(old[0])];
            if bucket.is_empty() {
                first_bytes.push(old[0]);
            }
            bucket.push(idx);
        }
        for bucket in &mut buckets {
            // Stable sort keeps listing order for equal lengths.
            bucket.sort_by_key(|&idx| Reverse(pairs[idx].0.len()));
        }

        let prefilter = match first_bytes[..] {
            [a] => Prefilter::One(a),
            [a, b] => Prefilter::Two(a, b),
            [a, b, c] => Prefilter::Three(a, b, c),
            _ => {
                let mut table = Box::new([false; 256]);
                for &b in &first_bytes {
                    table[usize::from(b)] = true;
                }
                Prefilter::Table(table)
            }
        };

        Some(Self {
            pairs,
            buckets,
            prefilter,
        })
    }

    /// The winning pair for a match starting at `rest[0]`, if any.
    #[inline]
    fn longest_match(&self, rest: &[u8]) -> Option<(&'p [u8], &'p [u8])> {
        let first = *rest.first()?;
        self.buckets[usize::from(first)]
            .iter()
            .map(|&idx| self.pairs[idx])
            .find(|(old, _)| rest.starts_with(old))
    }

    fn estimate_len(&self, original_len: usize) -> usize {
        let growth = self
            .pairs
            .iter()
            .filter(|(old, new)| new.len() > old.len())
            .map(|(old, new)| (original_len / old.len()).saturating_mul(new.len() - old.len()))
            .fold(0usize, usize::saturating_add);
        original_len.saturating_add(growth.min(original_len))
    }
}

/// Apply all `pairs` to `original` in one left-to-right pass.
///
/// At each position the longest matching `old` wins, ties going to the pair
/// listed first. Pairs with an empty `old` are ignored. With no usable pairs
/// the result is a copy of the input.
///
/// # Example
///
/// ```rust
/// use serialized_replace_core::{batch_replace, Replacement};
///
/// let pairs = [Replacement::from(("wp_", "new_")), Replacement::from(("wp", "w"))];
/// assert_eq!(batch_replace(b"wp_posts", &pairs).unwrap(), b"new_posts");
/// ```
#[cfg_attr(
    feature = "tracing",
    instrument(skip_all, fields(data_len = original.len(), pairs = pairs.len()))
)]
pub fn batch_replace(original: &[u8], pairs: &[Replacement<'_>]) -> Result<Vec<u8>> {
    let Some(index) = PatternIndex::build(pairs) else {
        #[cfg(feature = "tracing")]
        debug!("No usable patterns, returning copy");
        return copy_of(original);
    };

    let mut out = OutputBuffer::with_estimate(index.estimate_len(original.len()))?;
    let mut pos = 0;
    let mut copied_up_to = 0;
    #[cfg(feature = "tracing")]
    let mut replacements = 0usize;

    while pos < original.len() {
        let Some(candidate) = index.prefilter.next_candidate(original, pos) else {
            break;
        };
        match index.longest_match(&original[candidate..]) {
            Some((old, new)) => {
                out.extend_from_slice(&original[copied_up_to..candidate])?;
                out.extend_from_slice(new)?;
                pos = candidate + old.len();
                copied_up_to = pos;
                #[cfg(feature = "tracing")]
                {
                    replacements += 1;
                }
            }
            None => pos = candidate + 1,
        }
    }
    out.extend_from_slice(&original[copied_up_to..])?;

    #[cfg(feature = "tracing")]
    debug!(replacements, output_len = out.len(), "Batch replacement completed");

    Ok(out.into_vec())
}

/// Run [`batch_replace`] `iterations` times and return the last result.
///
/// A timing harness only: the output is the same as a single call. Zero
/// iterations return a copy of the input.
pub fn benchmark(iterations: usize, original: &[u8], pairs: &[Replacement<'_>]) -> Result<Vec<u8>> {
    let mut result = None;
    for _ in 0..iterations {
        result = Some(batch_replace(original, pairs)?);
    }
    match result {
        Some(result) => Ok(result),
        None => copy_of(original),
    }
}
