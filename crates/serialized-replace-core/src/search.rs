//! Binary-safe ASCII case-insensitive substring search.
//!
//! Only `A-Z`/`a-z` are folded. Every other byte value, including NUL and
//! bytes with the high bit set, must match exactly. Lengths always come from
//! the slices, so embedded zero bytes are ordinary data.
//!
//! The optimized path is Boyer-Moore-Horspool with a skip table that lives
//! inside the [`CaseInsensitiveFinder`], so a finder built once per call can
//! be reused across many haystack windows. Single-byte needles go through
//! `memchr2` over both cases instead.

use memchr::memchr2;

/// Number of distinct byte values.
const ALPHABET: usize = 256;

/// A reusable case-insensitive searcher for one needle.
#[derive(Debug, Clone)]
pub struct CaseInsensitiveFinder<'n> {
    needle: &'n [u8],
    /// Horspool shift keyed on the haystack byte aligned with the needle's
    /// last position. Both case variants of each needle byte share a shift.
    skip: [usize; ALPHABET],
}

impl<'n> CaseInsensitiveFinder<'n> {
    /// Build the skip table for `needle`.
    pub fn new(needle: &'n [u8]) -> Self {
        let len = needle.len();
        let mut skip = [len.max(1); ALPHABET];
        if len > 1 {
            let last = len - 1;
            for (idx, &byte) in needle[..last].iter().enumerate() {
                let shift = last - idx;
                skip[usize::from(byte.to_ascii_lowercase())] = shift;
                skip[usize::from(byte.to_ascii_uppercase())] = shift;
            }
        }
        Self { needle, skip }
    }

    /// The needle this finder searches for.
    #[inline]
    pub fn needle(&self) -> &'n [u8] {
        self.needle
    }

    /// Offset of the first occurrence of the needle in `haystack`.
    ///
    /// An empty needle matches at offset 0.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        let needle = self.needle;
        let len = needle.len();
        if len == 0 {
            return Some(0);
        }
        if len > haystack.len() {
            return None;
        }
        if len == 1 {
            let byte = needle[0];
            return memchr2(
                byte.to_ascii_lowercase(),
                byte.to_ascii_uppercase(),
                haystack,
            );
        }

        let last = len - 1;
        let mut pos = 0;
        while pos + len <= haystack.len() {
            let tail = haystack[pos + last];
            if tail.eq_ignore_ascii_case(&needle[last])
                && haystack[pos..pos + last].eq_ignore_ascii_case(&needle[..last])
            {
                return Some(pos);
            }
            pos += self.skip[usize::from(tail)];
        }
        None
    }
}

/// Find `needle` in `haystack`, ignoring ASCII case.
///
/// # Example
///
/// ```rust
/// use serialized_replace_core::find_ascii_case_insensitive;
///
/// assert_eq!(find_ascii_case_insensitive(b"Hello\0WORLD", b"world"), Some(6));
/// assert_eq!(find_ascii_case_insensitive(b"abc", b""), Some(0));
/// assert_eq!(find_ascii_case_insensitive(b"ab", b"abc"), None);
/// ```
pub fn find_ascii_case_insensitive(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    CaseInsensitiveFinder::new(needle).find(haystack)
}

/// Non-optimized O(n*m) variant of [`find_ascii_case_insensitive`].
///
/// Same results, no skip table. Handy as a reference when checking the
/// optimized path.
pub fn find_ascii_case_insensitive_naive(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::QuickCheck;

    #[test]
    fn test_basic_case_folding() {
        assert_eq!(find_ascii_case_insensitive(b"Hello World", b"WORLD"), Some(6));
        assert_eq!(find_ascii_case_insensitive(b"Hello World", b"hello"), Some(0));
        assert_eq!(find_ascii_case_insensitive(b"Hello World", b"o w"), Some(4));
        assert_eq!(find_ascii_case_insensitive(b"Hello World", b"xyz"), None);
    }

    #[test]
    fn test_empty_needle_matches_at_start() {
        assert_eq!(find_ascii_case_insensitive(b"", b""), Some(0));
        assert_eq!(find_ascii_case_insensitive(b"abc", b""), Some(0));
    }

    #[test]
    fn test_needle_longer_than_haystack() {
        assert_eq!(find_ascii_case_insensitive(b"abc", b"abcd"), None);
        assert_eq!(find_ascii_case_insensitive(b"", b"a"), None);
    }

    #[test]
    fn test_embedded_nul_bytes() {
        let haystack = b"\0\0ab\0CD\0";
        assert_eq!(find_ascii_case_insensitive(haystack, b"\0cd"), Some(4));
        assert_eq!(find_ascii_case_insensitive(haystack, b"\0"), Some(0));
        assert_eq!(find_ascii_case_insensitive(haystack, b"b\0c"), Some(3));
    }

    #[test]
    fn test_high_bytes_compare_exactly() {
        // 0xC9 / 0xE9 are É / é in Latin-1 but must not be folded.
        assert_eq!(find_ascii_case_insensitive(b"caf\xC9", b"caf\xE9"), None);
        assert_eq!(find_ascii_case_insensitive(b"CAF\xE9", b"caf\xE9"), Some(0));
    }

    #[test]
    fn test_only_letters_fold() {
        // '@' (0x40) and '`' (0x60) differ by the case bit but are not letters.
        assert_eq!(find_ascii_case_insensitive(b"`", b"@"), None);
        assert_eq!(find_ascii_case_insensitive(b"[x]", b"{X}"), None);
    }

    #[test]
    fn test_single_byte_needle() {
        assert_eq!(find_ascii_case_insensitive(b"xyzQ", b"q"), Some(3));
        assert_eq!(find_ascii_case_insensitive(b"xyz", b"1"), None);
    }

    #[test]
    fn test_repeated_prefix_needle() {
        assert_eq!(find_ascii_case_insensitive(b"aaaaaaab", b"AAB"), Some(5));
        assert_eq!(find_ascii_case_insensitive(b"abababac", b"abac"), Some(4));
    }

    #[test]
    fn test_finder_reuse() {
        let finder = CaseInsensitiveFinder::new(b"http://OLD.com");
        assert_eq!(finder.find(b"see http://old.COM/path"), Some(4));
        assert_eq!(finder.find(b"nothing here"), None);
        assert_eq!(finder.needle(), b"http://OLD.com");
    }

    #[test]
    fn test_matches_naive_quickcheck() {
        fn prop(haystack: Vec<u8>, needle: Vec<u8>, start: usize) -> bool {
            // Plant the needle (with flipped case) into the haystack half the time.
            let mut haystack = haystack;
            if start % 2 == 0 && !haystack.is_empty() {
                let at = start % haystack.len();
                let flipped: Vec<u8> = needle
                    .iter()
                    .map(|b| {
                        if b.is_ascii_lowercase() {
                            b.to_ascii_uppercase()
                        } else {
                            b.to_ascii_lowercase()
                        }
                    })
                    .collect();
                haystack.splice(at..at, flipped);
            }
            find_ascii_case_insensitive(&haystack, &needle)
                == find_ascii_case_insensitive_naive(&haystack, &needle)
        }

        QuickCheck::new()
            .tests(2_000)
            .quickcheck(prop as fn(Vec<u8>, Vec<u8>, usize) -> bool);
    }
}
