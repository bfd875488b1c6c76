use bytes::Bytes;
use memchr::memchr;

use super::{AbsoluteUri, RelativeUri, Uri};
use crate::error::Error;
use crate::grammar::{self, byte};

fn lossy(s: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(s)
}

/// Parses a request target, dispatching on a leading `scheme:`.
pub fn parse(data: &[u8]) -> Result<Uri, Error> {
    if starts_with_scheme(data) {
        Ok(Uri::Absolute(parse_absolute(data)?))
    } else {
        Ok(Uri::Relative(parse_relative(data)?))
    }
}

fn starts_with_scheme(data: &[u8]) -> bool {
    match memchr(b':', data) {
        Some(colon) => grammar::validate_scheme(&data[..colon]).is_ok(),
        None => false,
    }
}

/// Parses `scheme:path`, keeping the scheme verbatim and resolving
/// escapes in the opaque part.
pub fn parse_absolute(data: &[u8]) -> Result<AbsoluteUri, Error> {
    let Some(colon) = memchr(b':', data) else {
        return Err(Error::client("could not determine schema"));
    };
    grammar::validate_scheme(&data[..colon])?;

    let scheme = &data[..colon];
    let remaining = &data[colon + 1..];

    let mut path = Vec::new();
    let mut i = 0;

    while i < remaining.len() {
        let mut b = remaining[i];

        if byte::is_escape(b) {
            b = grammar::unescape(remaining, i)?;
            i += 3;
        } else {
            i += 1;
        }

        if !byte::is_reserved(b) && !byte::is_unreserved(b) {
            return Err(Error::client(format!(
                "queries contain invalid byte ({})",
                lossy(remaining)
            )));
        }

        path.push(b);
    }

    Ok(AbsoluteUri {
        scheme: Bytes::copy_from_slice(scheme),
        path: Bytes::from(path),
    })
}

/// Parses a schemeless target into its net_loc / path / params / query
/// components, resolving escapes before the class checks.
pub fn parse_relative(data: &[u8]) -> Result<RelativeUri, Error> {
    let mut uri = RelativeUri::default();
    let mut start = 0;

    if data.len() >= 2 && data[0] == b'/' && data[1] == b'/' {
        let mut i = 2;

        while i < data.len() && (byte::is_pchar(data[i]) || data[i] == b';' || data[i] == b'?') {
            i += 1;
        }

        uri.net_loc = Bytes::copy_from_slice(&data[2..i]);
        start = i;
    }

    if start == data.len() {
        return Ok(uri);
    }

    let (path, params, query) = if start > 0 || data[start] == b'/' {
        parse_abs_path(&data[start..])?
    } else {
        parse_rel_path(&data[start..])?
    };

    uri.path = Bytes::from(path);
    uri.params = params.into_iter().map(Bytes::from).collect();
    uri.query = Bytes::from(query);

    Ok(uri)
}

type PathParts = (Vec<u8>, Vec<Vec<u8>>, Vec<u8>);

fn parse_abs_path(data: &[u8]) -> Result<PathParts, Error> {
    if data.is_empty() || data[0] != b'/' {
        return Err(Error::client("abs_path must begin with /"));
    }

    let (path, params, query) = parse_rel_path(&data[1..])?;

    let mut abs = Vec::with_capacity(path.len() + 1);
    abs.push(b'/');
    abs.extend_from_slice(&path);

    Ok((abs, params, query))
}

fn parse_rel_path(data: &[u8]) -> Result<PathParts, Error> {
    let params_index = memchr(b';', data);
    let query_index = memchr(b'?', data);

    let (query_slice, query_index) = match query_index {
        Some(i) => (&data[i + 1..], i),
        None => (&data[data.len()..], data.len()),
    };

    let (params_slice, params_index) = match params_index {
        Some(i) if i < query_index => (&data[i + 1..query_index], i),
        _ => (&data[data.len()..], query_index),
    };

    let path = parse_path(&data[..params_index])
        .map_err(|err| Error::client(format!("Invalid request uri path: {err}")))?;

    let params = parse_params(params_slice)
        .map_err(|err| Error::client(format!("Invalid request uri param(s): {err}")))?;

    let query = parse_query(query_slice)
        .map_err(|err| Error::client(format!("Invalid request uri querie(s): {err}")))?;

    Ok((path, params, query))
}

fn parse_path(data: &[u8]) -> Result<Vec<u8>, Error> {
    let segments: Vec<&[u8]> = data.split(|&b| b == b'/').collect();

    // RFC 1945 §3.2.1: with more than one segment, the first cannot be
    // empty
    if segments.len() > 1 && segments[0].is_empty() {
        return Err(Error::client("first segment cannot be empty"));
    }

    let mut path: Vec<Vec<u8>> = Vec::with_capacity(segments.len());

    for p in segments {
        let mut j = 0;
        let mut part = Vec::new();

        while j < p.len() {
            let mut b = p[j];

            if byte::is_escape(b) {
                b = grammar::unescape(p, j)?;
                j += 3;
            } else {
                j += 1;
            }

            if !byte::is_pchar(b) {
                return Err(Error::client(format!(
                    "path contains invalid byte ({})",
                    lossy(p)
                )));
            }

            part.push(b);
        }

        path.push(part);
    }

    Ok(path.join(&b'/'))
}

fn parse_params(data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
    let mut params = Vec::new();
    if data.is_empty() {
        return Ok(params);
    }

    for p in data.split(|&b| b == b';') {
        let mut j = 0;
        let mut param = Vec::new();

        while j < p.len() {
            let mut b = p[j];

            if byte::is_escape(b) {
                b = grammar::unescape(p, j)?;
                j += 3;
            } else {
                j += 1;
            }

            if !byte::is_pchar(b) && b != b'/' {
                return Err(Error::client(format!(
                    "params contains invalid byte ({})",
                    lossy(p)
                )));
            }

            param.push(b);
        }

        params.push(param);
    }

    Ok(params)
}

fn parse_query(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut query = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let mut b = data[i];

        if byte::is_escape(b) {
            b = grammar::unescape(data, i)?;
            i += 3;
        } else {
            i += 1;
        }

        if !byte::is_reserved(b) && !byte::is_unreserved(b) {
            return Err(Error::client(format!(
                "queries contain invalid byte ({})",
                lossy(data)
            )));
        }

        query.push(b);
    }

    Ok(query)
}

/// Resolves escapes and rejects unsafe octets; `#` is permitted.
///
/// This is the looser shape the `Referer` header takes, where any of
/// the three relative forms and fragments may appear.
pub fn parse_safe(data: &[u8]) -> Result<Bytes, Error> {
    let mut uri = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let mut b = data[i];

        if byte::is_escape(b) {
            b = grammar::unescape(data, i)?;
            i += 3;
        } else {
            i += 1;
        }

        if byte::is_unsafe(b) && b != b'#' {
            return Err(Error::client(format!(
                "uri contains at least 1 unsafe character ({})",
                lossy(data)
            )));
        }

        uri.push(b);
    }

    Ok(Bytes::from(uri))
}
