//! Small byte helpers shared by several stages.

use std::fmt::Write as _;

/// Render bytes as upper-case hex pairs, each followed by a space.
///
/// `[0x1b, 0x61]` becomes `"1B 61 "`.
pub fn hex_render(bytes: &[u8]) -> Vec<u8> {
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        // Writing to a String cannot fail.
        let _ = write!(out, "{:02X} ", b);
    }
    out.into_bytes()
}

/// Index of the last occurrence of `needle` in `haystack`.
#[inline]
pub fn last_index_of(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().rposition(|&b| b == needle)
}
