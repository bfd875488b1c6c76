//! The request read pipeline.
//!
//! One request per connection: the request line and header block are
//! read through a size-capped buffered reader under a single deadline,
//! then the declared body is read exactly and surface-decoded.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::body;
use crate::error::Error;
use crate::headers::RequestHeaders;
use crate::request::{Request, RequestLine};

const CRLF: &[u8] = b"\r\n";

/// Read caps and deadline for one request.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub read_timeout: u64,
    pub max_header_bytes: u64,
    pub max_body_bytes: u64,
}

/// Reads one request under the configured deadline.
///
/// The deadline covers the whole request; it is released once the body
/// is in memory.
pub(crate) async fn read_request<S>(stream: &mut S, limits: &Limits) -> Result<Request, Error>
where
    S: AsyncRead + Unpin,
{
    let deadline = Duration::from_millis(limits.read_timeout);

    match tokio::time::timeout(deadline, parse_request(stream, limits)).await {
        Ok(res) => res,
        Err(_) => Err(Error::server("read deadline exceeded")),
    }
}

async fn parse_request<S>(stream: &mut S, limits: &Limits) -> Result<Request, Error>
where
    S: AsyncRead + Unpin,
{
    // the cap covers the request line and header block only
    let mut reader = BufReader::new(stream).take(limits.max_header_bytes);

    let mut line_buf = Vec::new();
    reader.read_until(b'\n', &mut line_buf).await?;

    // EOF (or the header cap) before any LF is a failed read, not a
    // malformed line
    if !line_buf.ends_with(b"\n") {
        return Err(Error::server("unexpected EOF while reading the request line"));
    }

    if !line_buf.ends_with(CRLF) {
        return Err(Error::client("malformed header suffix"));
    }

    let line = RequestLine::parse(trim_crlf(&line_buf))?;

    let mut header_buf = Vec::new();
    loop {
        let mut field = Vec::new();
        let read = reader.read_until(b'\n', &mut field).await?;
        if read == 0 {
            return Err(Error::server("unexpected EOF while reading headers"));
        }
        if field == CRLF {
            break;
        }

        header_buf.extend_from_slice(&field);
    }

    let headers = RequestHeaders::parse(trim_crlf(&header_buf))?;
    if headers.content_length > limits.max_body_bytes {
        return Err(Error::client(format!(
            "Content-Length exceeds max allowed by server: {}",
            limits.max_body_bytes
        )));
    }

    let mut reader = reader.into_inner();

    let mut body_buf = vec![0u8; headers.content_length as usize];
    reader.read_exact(&mut body_buf).await.map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::client("Content-Length header exceeds body length")
        } else {
            Error::from(err)
        }
    })?;

    let decoded = body::decode(&body_buf, headers.content_encoding.as_ref())?;

    Ok(Request {
        line,
        headers,
        body: Bytes::from(decoded),
    })
}

/// Strips every leading and trailing CR/LF octet.
fn trim_crlf(mut data: &[u8]) -> &[u8] {
    while let [b'\r' | b'\n', rest @ ..] = data {
        data = rest;
    }
    while let [rest @ .., b'\r' | b'\n'] = data {
        data = rest;
    }
    data
}
