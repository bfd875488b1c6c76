//! Request model and request line parsing.

use std::fmt;

use bytes::Bytes;

use crate::error::Error;
use crate::headers::RequestHeaders;
use crate::method::Method;
use crate::uri::{self, PathForm, RelativeUri};

fn lossy(s: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(s)
}

/// Protocol version of a request line, `HTTP/major.minor`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// Parses `HTTP/d.d`. The major version must be at least 1.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 8 {
            return Err(Error::client(format!(
                "incomplete version ({})",
                lossy(data)
            )));
        }

        let parts: Vec<&[u8]> = data.split(|&b| b == b'/').collect();
        if parts.len() != 2 || !parts[1].contains(&b'.') {
            return Err(Error::client(format!(
                "could not determine version number ({})",
                lossy(data)
            )));
        }

        if parts[0] != b"HTTP" {
            return Err(Error::client(format!(
                "wrong protocol ({})",
                lossy(parts[0])
            )));
        }

        let digits: Vec<&[u8]> = parts[1].split(|&b| b == b'.').collect();
        if digits.len() != 2 {
            return Err(Error::client(format!(
                "malformed version number ({})",
                lossy(parts[1])
            )));
        }

        let major: u32 = lossy(digits[0])
            .parse()
            .map_err(|_| Error::client(format!("contains invalid characters ({})", lossy(data))))?;
        let minor: u32 = lossy(digits[1])
            .parse()
            .map_err(|_| Error::client(format!("contains invalid characters ({})", lossy(data))))?;

        if major == 0 {
            return Err(Error::client(format!(
                "must be at least 1.0 ({})",
                lossy(data)
            )));
        }

        Ok(Version { major, minor })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The first line of a request: method, abs_path target and version.
#[derive(Clone, Debug)]
pub struct RequestLine {
    pub method: Method,
    pub uri: RelativeUri,
    pub version: Version,
}

impl RequestLine {
    /// Parses a request line, without its CRLF.
    ///
    /// Exactly three space separated components; the target must take
    /// the abs_path form.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let parts: Vec<&[u8]> = data.split(|&b| b == b' ').collect();
        if parts.len() != 3 {
            return Err(Error::client(format!(
                "Invalid request line: malformed request line ({})",
                lossy(data)
            )));
        }

        let Some(method) = Method::from_bytes(parts[0]) else {
            return Err(Error::client(
                "Invalid request line: issue with request method (invalid method)",
            ));
        };

        let uri = uri::parse_relative(parts[1])?;
        if uri.path_form() != PathForm::AbsPath {
            return Err(Error::client(
                "Invalid request line: issue with uri (uri must be in the form of an absolute path)",
            ));
        }

        let version = Version::parse(parts[2]).map_err(|_| {
            Error::client(format!(
                "Invalid request line: issue with version ({})",
                lossy(parts[2])
            ))
        })?;

        Ok(RequestLine {
            method,
            uri,
            version,
        })
    }
}

/// A fully parsed request: line, typed headers and decoded body.
#[derive(Clone, Debug)]
pub struct Request {
    pub line: RequestLine,
    pub headers: RequestHeaders,
    pub body: Bytes,
}

impl Request {
    /// Returns a header value exactly as it appeared on the wire.
    #[inline]
    pub fn raw_header(&self, name: &str) -> Option<&[u8]> {
        self.headers.raw(name)
    }
}

#[cfg(test)]
mod test {
    use super::{RequestLine, Version};
    use crate::method::Method;

    #[test]
    fn test_version() {
        assert_eq!(
            Version::parse(b"HTTP/1.0").unwrap(),
            Version { major: 1, minor: 0 }
        );
        assert_eq!(
            Version::parse(b"HTTP/12.34").unwrap(),
            Version { major: 12, minor: 34 }
        );
        assert_eq!(Version::parse(b"HTTP/1.0").unwrap().to_string(), "1.0");

        assert!(Version::parse(b"HTTP/1").is_err());
        assert!(Version::parse(b"HTTPS/1.0").is_err());
        assert!(Version::parse(b"HTTP/0.9").is_err());
        assert!(Version::parse(b"HTTP/a.b").is_err());
        assert!(Version::parse(b"HTTP/1.0.1").is_err());
        assert!(Version::parse(b"HTTP/-1.0").is_err());
    }

    #[test]
    fn test_request_line() {
        let line = RequestLine::parse(b"GET / HTTP/1.0").unwrap();
        assert_eq!(line.method, Method::Get);
        assert_eq!(&line.uri.path[..], b"/");
        assert_eq!(line.version, Version { major: 1, minor: 0 });

        let line = RequestLine::parse(b"POST /submit?q=1 HTTP/1.1").unwrap();
        assert_eq!(line.method, Method::Post);
        assert_eq!(&line.uri.query[..], b"q=1");

        // three components exactly
        assert!(RequestLine::parse(b"GET /").is_err());
        assert!(RequestLine::parse(b"GET  / HTTP/1.0").is_err());
        // method must come from the validated set
        assert!(RequestLine::parse(b"PUT / HTTP/1.0").is_err());
        assert!(RequestLine::parse(b"get / HTTP/1.0").is_err());
        // target must be an abs_path
        assert!(RequestLine::parse(b"GET docs/a HTTP/1.0").is_err());
        assert!(RequestLine::parse(b"GET //host/a HTTP/1.0").is_err());
        assert!(RequestLine::parse(b"GET /%zz HTTP/1.0").is_err());
    }
}
