//! Growable output buffer used by both replacers.

use crate::error::{reserve_error, ReplaceError, Result};

/// Slack added to every up-front estimate.
const ESTIMATE_SLACK: usize = 128;

/// An owned, append-only byte buffer whose growth is fallible.
///
/// Every write reserves first, so an inaccurate estimate only costs a
/// reallocation, never a lost or misplaced byte.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    /// Create a buffer with room for roughly `estimate` bytes.
    pub fn with_estimate(estimate: usize) -> Result<Self> {
        let mut buffer = Self::default();
        buffer.ensure_capacity(estimate.saturating_add(ESTIMATE_SLACK))?;
        Ok(buffer)
    }

    /// Make sure `additional` more bytes fit without another allocation.
    #[inline]
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        if self.bytes.capacity() - self.bytes.len() >= additional {
            return Ok(());
        }
        self.bytes
            .try_reserve(additional)
            .map_err(|e| reserve_error(additional, e))
    }

    /// Append one byte.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Append a run of bytes.
    #[inline]
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    /// Append the decimal form of `value` (used for length fields).
    pub fn write_decimal(&mut self, value: usize) -> Result<()> {
        // usize::MAX has 20 digits on 64-bit targets.
        let mut digits = [0u8; 20];
        let mut start = digits.len();
        let mut rest = value;
        loop {
            start -= 1;
            digits[start] = b'0' + (rest % 10) as u8;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        self.extend_from_slice(&digits[start..])
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// View of the bytes written so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the written bytes to the caller.
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

/// Copy `data` into a fresh `Vec`, reporting allocation failure as an error.
pub(crate) fn copy_of(data: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = OutputBuffer::default();
    buffer.extend_from_slice(data)?;
    Ok(buffer.into_vec())
}

/// Turn replacement output back into text.
///
/// Byte patterns can split a multi-byte sequence, so output produced from
/// text input is not guaranteed to be UTF-8. That is reported as
/// [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) rather
/// than patched with replacement characters.
pub fn into_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        ReplaceError::invalid_argument(format!(
            "result is not valid UTF-8 (invalid byte at offset {})",
            e.utf8_error().valid_up_to()
        ))
    })
}
