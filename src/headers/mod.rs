//! Request header parsing.
//!
//! The header block is folded into fields, each field is split on the
//! first `:`, and the value is dispatched to the matching typed field
//! by name. Unknown names land in [`RequestHeaders::unrecognized`]
//! after `*TEXT` validation.

mod fields;
mod fold;
mod rules;


pub use fields::{
    Authorization, ContentEncoding, ContentType, Mailbox, Pragma, Product, UserAgent,
};

use std::collections::BTreeMap;

use bytes::Bytes;
use memchr::memchr;

use crate::error::Error;
use crate::grammar::{self, byte, date::MessageTime, lws};
use crate::uri;

fn lossy(s: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(s)
}

/// The typed request header fields of RFC 1945, plus the raw mapping
/// for introspection.
///
/// Absent headers hold their zero value.
#[derive(Clone, Debug, Default)]
pub struct RequestHeaders {
    pub date: MessageTime,
    pub pragma: Pragma,
    pub authorization: Option<Authorization>,
    pub from: Option<Mailbox>,
    pub if_modified_since: MessageTime,
    pub referer: Option<Bytes>,
    pub user_agent: Option<UserAgent>,
    pub allow: Vec<String>,
    pub content_encoding: Option<ContentEncoding>,
    pub content_length: u64,
    pub content_type: Option<ContentType>,
    pub expires: MessageTime,
    pub last_modified: MessageTime,
    pub unrecognized: BTreeMap<String, Bytes>,
    raw: BTreeMap<String, Bytes>,
}

impl RequestHeaders {
    /// Parses a folded header block.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut headers = RequestHeaders::default();

        for header in fold::split(data) {
            let Some(colon) = memchr(b':', header) else {
                return Err(Error::client(format!(
                    "Invalid header: cannot determine header name ({})",
                    lossy(header)
                )));
            };

            let name = lws::trim_right(&header[..colon]);
            grammar::validate_token(name)
                .map_err(|err| Error::client(format!("Invalid header: {}", err.message())))?;

            let value = lws::trim_left(&header[colon + 1..]);
            validate_value(value)
                .map_err(|err| Error::client(format!("Invalid header: ({})", err.message())))?;

            let name = lossy(name).into_owned();
            headers.set_header(&name, value)?;
            headers.raw.insert(name, Bytes::copy_from_slice(value));
        }

        Ok(headers)
    }

    /// Returns the raw value of a header as it appeared on the wire,
    /// folding included.
    pub fn raw(&self, name: &str) -> Option<&[u8]> {
        self.raw.get(name).map(|value| &value[..])
    }

    fn set_header(&mut self, name: &str, value: &[u8]) -> Result<(), Error> {
        match name {
            "Date" => self.set_date(value),
            "Pragma" => self.set_pragma(value),
            "Authorization" => self.set_authorization(value),
            "Referer" => self.set_referer(value),
            "From" => self.set_from(value),
            "If-Modified-Since" => self.set_if_modified_since(value),
            "User-Agent" => self.set_user_agent(value),
            "Allow" => self.set_allow(value),
            "Content-Encoding" => self.set_content_encoding(value),
            "Content-Length" => self.set_content_length(value),
            "Expires" => self.set_expires(value),
            "Last-Modified" => self.set_last_modified(value),
            "Content-Type" => self.set_content_type(value),
            _ => self.set_unrecognized(name, value),
        }
    }

    fn set_date(&mut self, value: &[u8]) -> Result<(), Error> {
        self.date = MessageTime::parse(value)
            .map_err(|err| Error::client(format!("Invalid date header: {}", err.message())))?;
        Ok(())
    }

    fn set_pragma(&mut self, value: &[u8]) -> Result<(), Error> {
        self.pragma = Pragma::parse(value)
            .map_err(|err| Error::client(format!("Invalid pragma header: {}", err.message())))?;
        Ok(())
    }

    fn set_authorization(&mut self, value: &[u8]) -> Result<(), Error> {
        let credentials = Authorization::parse(value).map_err(|err| {
            Error::client(format!("Invalid Authorization header: {}", err.message()))
        })?;
        self.authorization = Some(credentials);
        Ok(())
    }

    fn set_referer(&mut self, value: &[u8]) -> Result<(), Error> {
        let referer = uri::parse_safe(value)
            .map_err(|err| Error::client(format!("Invalid Referer header: {}", err.message())))?;
        self.referer = Some(referer);
        Ok(())
    }

    fn set_from(&mut self, value: &[u8]) -> Result<(), Error> {
        let mailbox = fields::parse_mailbox(value).map_err(|err| {
            Error::client(format!(
                "Invalid From header: {} ({})",
                err.message(),
                lossy(value)
            ))
        })?;
        self.from = Some(mailbox);
        Ok(())
    }

    fn set_if_modified_since(&mut self, value: &[u8]) -> Result<(), Error> {
        self.if_modified_since = MessageTime::parse(value).map_err(|err| {
            Error::client(format!(
                "Invalid If-Modified-Since header: {}",
                err.message()
            ))
        })?;
        Ok(())
    }

    fn set_user_agent(&mut self, value: &[u8]) -> Result<(), Error> {
        let user_agent = fields::parse_user_agent(value).map_err(|err| {
            Error::client(format!("Invalid User-Agent header: {}", err.message()))
        })?;
        self.user_agent = Some(user_agent);
        Ok(())
    }

    fn set_allow(&mut self, value: &[u8]) -> Result<(), Error> {
        let methods = rules::extract(value);
        if methods.is_empty() {
            return Err(Error::client(format!(
                "Invalid Allow header: must include at least one method ({})",
                lossy(value)
            )));
        }

        let mut allow = Vec::with_capacity(methods.len());
        for method in methods {
            if grammar::validate_token(method).is_err() {
                return Err(Error::client(format!(
                    "Invalid Allow header: includes unsupported methods ({})",
                    lossy(value)
                )));
            }
            allow.push(lossy(method).into_owned());
        }

        self.allow = allow;
        Ok(())
    }

    fn set_content_encoding(&mut self, value: &[u8]) -> Result<(), Error> {
        let encoding = ContentEncoding::parse(value).map_err(|_| {
            Error::client(format!(
                "Invalid Content-Encoding header: malformed value ({})",
                lossy(value)
            ))
        })?;
        self.content_encoding = Some(encoding);
        Ok(())
    }

    fn set_content_length(&mut self, value: &[u8]) -> Result<(), Error> {
        let invalid = || {
            Error::client(format!(
                "Invalid Content-Length header: must be a valid unsigned 64-bit integer ({})",
                lossy(value)
            ))
        };

        if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }

        self.content_length = lossy(value).parse().map_err(|_| invalid())?;
        Ok(())
    }

    fn set_content_type(&mut self, value: &[u8]) -> Result<(), Error> {
        let content_type = ContentType::parse(value).map_err(|err| {
            Error::client(format!("Invalid Content-Type header: {}", err.message()))
        })?;
        self.content_type = Some(content_type);
        Ok(())
    }

    fn set_expires(&mut self, value: &[u8]) -> Result<(), Error> {
        self.expires = MessageTime::parse(value)
            .map_err(|err| Error::client(format!("Invalid Expires header: {}", err.message())))?;
        Ok(())
    }

    fn set_last_modified(&mut self, value: &[u8]) -> Result<(), Error> {
        self.last_modified = MessageTime::parse(value).map_err(|err| {
            Error::client(format!("Invalid Last-Modified header: {}", err.message()))
        })?;
        Ok(())
    }

    fn set_unrecognized(&mut self, name: &str, value: &[u8]) -> Result<(), Error> {
        grammar::validate_text(value)
            .map_err(|err| Error::client(format!("Invalid {name} header: {}", err.message())))?;

        self.unrecognized
            .insert(name.to_owned(), Bytes::copy_from_slice(value));
        Ok(())
    }
}

/// A header value is LWS and non-control octets in any mix.
pub(crate) fn validate_value(value: &[u8]) -> Result<(), Error> {
    let mut i = 0;

    while i < value.len() {
        let (is_lws, next) = lws::check(value, i);
        if is_lws {
            i = next;
            continue;
        }

        if byte::is_ctl(value[i]) {
            return Err(Error::client(format!(
                "header value contains invalid control characters ({})",
                lossy(value)
            )));
        }

        i += 1;
    }

    Ok(())
}
