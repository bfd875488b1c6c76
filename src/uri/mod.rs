//! URI model per [RFC 1945 §3.2][rfc].
//!
//! A request target is either an [`AbsoluteUri`] (`scheme:path`) or a
//! [`RelativeUri`] in one of three forms distinguished by its leading
//! bytes: `//net_loc`, `/abs/path` or `rel/path`. Escape sequences are
//! resolved while parsing, so the stored components hold decoded
//! octets and marshal back to their literal form.
//!
//! [rfc]: <https://datatracker.ietf.org/doc/html/rfc1945#section-3.2>

mod parse;


pub use parse::{parse, parse_absolute, parse_relative, parse_safe};

use bytes::Bytes;

/// A parsed request target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Uri {
    Absolute(AbsoluteUri),
    Relative(RelativeUri),
}

impl Uri {
    /// Returns the serialized target, the form a request line carries.
    #[inline]
    pub fn path(&self) -> Vec<u8> {
        self.marshal()
    }

    /// Serializes the target back to its wire form.
    pub fn marshal(&self) -> Vec<u8> {
        match self {
            Uri::Absolute(uri) => uri.marshal(),
            Uri::Relative(uri) => uri.marshal(),
        }
    }
}

/// A URI opening with a scheme, kept verbatim next to its decoded
/// opaque part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbsoluteUri {
    pub scheme: Bytes,
    pub path: Bytes,
}

impl AbsoluteUri {
    pub fn marshal(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(self.scheme.len() + 1 + self.path.len());
        res.extend_from_slice(&self.scheme);
        res.push(b':');
        res.extend_from_slice(&self.path);
        res
    }
}

/// The three relative forms of RFC 1945 §3.2.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathForm {
    NetPath,
    AbsPath,
    RelPath,
}

/// A schemeless URI: optional network location, decoded path, `;`
/// separated parameters and query.
///
/// Empty components are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelativeUri {
    pub net_loc: Bytes,
    pub path: Bytes,
    pub params: Vec<Bytes>,
    pub query: Bytes,
}

impl RelativeUri {
    /// Classifies the target by its leading bytes.
    pub fn path_form(&self) -> PathForm {
        if !self.net_loc.is_empty() {
            return PathForm::NetPath;
        }
        if self.path.is_empty() || self.path[0] != b'/' {
            return PathForm::RelPath;
        }
        PathForm::AbsPath
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut res = Vec::new();

        if !self.net_loc.is_empty() {
            res.extend_from_slice(b"//");
            res.extend_from_slice(&self.net_loc);
        }

        res.extend_from_slice(&self.path);

        for param in &self.params {
            res.push(b';');
            res.extend_from_slice(param);
        }

        if !self.query.is_empty() {
            res.push(b'?');
            res.extend_from_slice(&self.query);
        }

        res
    }
}
