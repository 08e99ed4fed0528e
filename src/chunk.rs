//! Sliding-window text chunker.
//!
//! Splits extracted body text into overlapping segments of at most
//! `size` characters, advancing `size - overlap` characters per window.
//! When a window does not reach the end of the text, the cut prefers the
//! last separator inside the window (default newline) so chunks end on a
//! line boundary where one exists; separator-free text falls back to a
//! hard cut. Separator cuts inside the overlap region are rejected, so
//! the window always advances by at least one character and chunking
//! terminates on any input.
//!
//! Lengths and offsets are counted in characters (Unicode scalar values),
//! not bytes, so multi-byte text never splits inside a code point.

use crate::error::PipelineError;

/// Split `text` into overlapping chunks of at most `size` characters.
///
/// Consecutive chunks share exactly `overlap` characters. The final
/// chunk may be shorter than `size`. Empty input yields an empty vector,
/// not an error.
///
/// # Errors
///
/// `PipelineError::Configuration` when `size == 0` or `overlap >= size`.
pub fn chunk_text(
    text: &str,
    size: usize,
    overlap: usize,
    separator: char,
) -> Result<Vec<String>, PipelineError> {
    if size == 0 {
        return Err(PipelineError::Configuration(
            "chunk size must be > 0".to_string(),
        ));
    }
    if overlap >= size {
        return Err(PipelineError::Configuration(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let end = (start + size).min(chars.len());

        if end == chars.len() {
            chunks.push(chars[start..end].iter().collect());
            break;
        }

        // Prefer cutting just after the last separator in the window.
        // A separator inside the overlap region is rejected: cutting
        // there would stall the window, so such windows hard-cut instead.
        let cut = chars[start + 1..end]
            .iter()
            .rposition(|&c| c == separator)
            .map(|pos| start + 1 + pos + 1)
            .filter(|&cut| cut > start + overlap)
            .unwrap_or(end);

        chunks.push(chars[start..cut].iter().collect());

        // The next window re-covers the last `overlap` characters.
        start = cut - overlap;
    }

    Ok(chunks)
}
