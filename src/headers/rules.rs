//! Comma separated rule lists (`1#rule` in the RFC 1945 notation).

use crate::grammar::lws;

/// Splits on `,`, left-trimming every element and right-trimming every
/// element but the last.
pub(crate) fn extract(s: &[u8]) -> Vec<&[u8]> {
    let parts: Vec<&[u8]> = s.split(|&b| b == b',').collect();
    let count = parts.len();

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            if i + 1 == count {
                lws::trim_left(part)
            } else {
                lws::trim(part)
            }
        })
        .collect()
}
