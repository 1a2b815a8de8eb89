//! Python bindings for serialized-replace-core.

use std::borrow::Cow;

use pyo3::exceptions::{PyMemoryError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyString};

use serialized_replace_core::{ErrorKind, ReplaceError, Replacement};

/// Convert a core error to the matching Python exception.
fn to_py_err(err: ReplaceError) -> PyErr {
    match err.kind {
        ErrorKind::InvalidArgument(_) => PyTypeError::new_err(err.to_string()),
        ErrorKind::AllocationFailure { .. } => PyMemoryError::new_err(err.to_string()),
    }
}

/// Borrow the bytes of a `bytes` or `str` argument.
fn byte_arg<'a>(value: &'a Bound<'_, PyAny>, name: &str) -> Result<Cow<'a, [u8]>, ReplaceError> {
    if let Ok(bytes) = value.downcast::<PyBytes>() {
        return Ok(Cow::Borrowed(bytes.as_bytes()));
    }
    if let Ok(string) = value.downcast::<PyString>() {
        let text = string
            .to_str()
            .map_err(|_| ReplaceError::invalid_argument(format!("{} is not valid UTF-8", name)))?;
        return Ok(Cow::Borrowed(text.as_bytes()));
    }
    let type_name = value
        .get_type()
        .name()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    Err(ReplaceError::invalid_argument(format!(
        "{} must be bytes or str, not {}",
        name, type_name
    )))
}

/// Read a sequence of `(old, new)` pairs.
fn pairs_arg(value: &Bound<'_, PyAny>) -> Result<Vec<Replacement<'static>>, ReplaceError> {
    let iter = value
        .iter()
        .map_err(|_| ReplaceError::invalid_argument("replacements must be a sequence of pairs"))?;

    let mut pairs = Vec::new();
    for (idx, item) in iter.enumerate() {
        let item = item.map_err(|e| ReplaceError::invalid_argument(e.to_string()))?;
        if item.is_instance_of::<PyBytes>() || item.is_instance_of::<PyString>() {
            return Err(ReplaceError::invalid_argument(format!(
                "pair {} must be a 2-element sequence",
                idx
            )));
        }
        let is_pair = item.len().map(|len| len == 2).unwrap_or(false);
        if !is_pair {
            return Err(ReplaceError::invalid_argument(format!(
                "pair {} must be a 2-element sequence",
                idx
            )));
        }
        let old = item
            .get_item(0)
            .map_err(|e| ReplaceError::invalid_argument(e.to_string()))?;
        let new = item
            .get_item(1)
            .map_err(|e| ReplaceError::invalid_argument(e.to_string()))?;
        let context = format!("pair {}", idx);
        let old = byte_arg(&old, "old").map_err(|e| e.with_context(context.clone()))?;
        let new = byte_arg(&new, "new").map_err(|e| e.with_context(context))?;
        pairs.push(Replacement::new(old, new).into_owned());
    }
    Ok(pairs)
}

/// Hand the result back as the same type the caller passed in.
///
/// A `str` result that is no longer valid UTF-8 raises `TypeError`.
fn output(py: Python<'_>, as_str: bool, bytes: Vec<u8>) -> PyResult<PyObject> {
    if as_str {
        let text = serialized_replace_core::into_utf8(bytes).map_err(to_py_err)?;
        Ok(PyString::new_bound(py, &text).into_any().unbind())
    } else {
        Ok(PyBytes::new_bound(py, &bytes).into_any().unbind())
    }
}

/// Replace `old` with `new` inside PHP serialized strings, fixing length prefixes.
///
/// Only the first case-insensitive match inside each `s:N:"...";` payload is
/// replaced. Bytes outside payloads are never touched.
///
/// Args:
///     original: bytes or str holding (partially) serialized data
///     old: text to look for
///     new: replacement text, inserted verbatim
///
/// Returns:
///     A new object of the same type as ``original``
///
/// Raises:
///     TypeError: If an argument is not bytes or str, or if ``original`` is
///         a str and the replacement leaves invalid UTF-8
///
/// Example:
///     >>> from serialized_replace import serialized_str_replace
///     >>> serialized_str_replace(b'a:1:{s:5:"hello";}', b"hello", b"hi")
///     b'a:1:{s:2:"hi";}'
#[pyfunction]
fn serialized_str_replace(
    py: Python<'_>,
    original: &Bound<'_, PyAny>,
    old: &Bound<'_, PyAny>,
    new: &Bound<'_, PyAny>,
) -> PyResult<PyObject> {
    let as_str = original.is_instance_of::<PyString>();
    let data = byte_arg(original, "original").map_err(to_py_err)?;
    let old = byte_arg(old, "old").map_err(to_py_err)?;
    let new = byte_arg(new, "new").map_err(to_py_err)?;

    let result = py
        .allow_threads(|| serialized_replace_core::replace_in_serialized(&data, &old, &new))
        .map_err(to_py_err)?;
    output(py, as_str, result)
}

/// Apply many ``(old, new)`` pairs in a single pass.
///
/// At each position the longest matching ``old`` wins; equal lengths go to
/// the pair listed first. Matching is case-sensitive.
///
/// Example:
///     >>> from serialized_replace import batch_replace
///     >>> batch_replace("wp_posts", [("wp_", "new_"), ("wp", "w")])
///     'new_posts'
#[pyfunction]
fn batch_replace(
    py: Python<'_>,
    original: &Bound<'_, PyAny>,
    replacements: &Bound<'_, PyAny>,
) -> PyResult<PyObject> {
    let as_str = original.is_instance_of::<PyString>();
    let data = byte_arg(original, "original").map_err(to_py_err)?;
    let pairs = pairs_arg(replacements).map_err(to_py_err)?;

    let result = py
        .allow_threads(|| serialized_replace_core::batch_replace(&data, &pairs))
        .map_err(to_py_err)?;
    output(py, as_str, result)
}

/// Run ``batch_replace`` ``iterations`` times and return the last result.
///
/// Intended for timing only; the result equals a single call.
#[pyfunction]
fn benchmark(
    py: Python<'_>,
    iterations: usize,
    original: &Bound<'_, PyAny>,
    replacements: &Bound<'_, PyAny>,
) -> PyResult<PyObject> {
    let as_str = original.is_instance_of::<PyString>();
    let data = byte_arg(original, "original").map_err(to_py_err)?;
    let pairs = pairs_arg(replacements).map_err(to_py_err)?;

    let result = py
        .allow_threads(|| serialized_replace_core::benchmark(iterations, &data, &pairs))
        .map_err(to_py_err)?;
    output(py, as_str, result)
}

/// Get the version of the library.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Serialized-aware string replacement for Python.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("THREAD_SAFE", serialized_replace_core::THREAD_SAFE)?;
    m.add_function(wrap_pyfunction!(serialized_str_replace, m)?)?;
    m.add_function(wrap_pyfunction!(batch_replace, m)?)?;
    m.add_function(wrap_pyfunction!(benchmark, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}
