//! Header block splitting.
//!
//! A CRLF only terminates a field when the bytes after it do not open
//! an LWS sequence; a CRLF followed by SP/HT belongs to the running
//! field's value and is kept verbatim.

use memchr::memmem;

use crate::grammar::lws;

const CRLF: &[u8] = b"\r\n";

/// Splits a header block into fields, keeping folded continuations
/// inside their field. Empty trailing segments are discarded.
pub(crate) fn split(data: &[u8]) -> Vec<&[u8]> {
    let mut parts = Vec::new();
    let mut start = 0;

    let mut end = match memmem::find(data, CRLF) {
        Some(i) => i,
        None => {
            if !data.is_empty() {
                parts.push(data);
            }
            return parts;
        }
    };

    loop {
        let (is_lws, _) = lws::check(data, end);

        let next = if is_lws {
            end += CRLF.len();
            memmem::find(&data[end..], CRLF)
        } else {
            parts.push(&data[start..end]);
            start = end + CRLF.len();
            end = start;
            memmem::find(&data[start..], CRLF)
        };

        match next {
            Some(n) => end += n,
            None => break,
        }
    }

    let last = &data[start..];
    if !last.is_empty() {
        parts.push(last);
    }

    parts
}
