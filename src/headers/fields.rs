//! Typed header fields and their sub-grammars.

use std::collections::{BTreeMap, BTreeSet};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;

use super::rules;
use crate::error::Error;
use crate::grammar::{self, byte, lws};

fn lossy(s: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(s)
}

// ===== Pragma =====

/// `Pragma` directives: bare flags and `key=word` options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pragma {
    pub flags: BTreeSet<String>,
    pub options: BTreeMap<String, String>,
}

impl Pragma {
    /// Returns `true` when no directive is set.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.options.is_empty()
    }

    /// Returns `true` when the `no-cache` flag is set.
    pub fn no_cache(&self) -> bool {
        self.flags.contains("no-cache")
    }

    pub(crate) fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut directives = Pragma::default();

        let parts = rules::extract(data);
        if parts.is_empty() {
            return Err(Error::client(format!(
                "at least one pragma directive is required ({})",
                lossy(data)
            )));
        }

        for part in parts {
            let (key, value) = match memchr::memchr(b'=', part) {
                Some(eq) => (&part[..eq], Some(&part[eq + 1..])),
                None => (part, None),
            };

            if grammar::validate_token(key).is_err() {
                return Err(Error::client(format!(
                    "pragma directive must be prepended with token: {}",
                    lossy(part)
                )));
            }

            match value {
                Some(value) => {
                    if key == b"no-cache" {
                        return Err(Error::client(format!(
                            "pragma directive 'no-cache' value cannot have a value ({})",
                            lossy(part)
                        )));
                    }

                    let Ok(word) = grammar::parse_word(value) else {
                        return Err(Error::client(format!(
                            "pragma directive value must be a word: {}",
                            lossy(part)
                        )));
                    };

                    directives
                        .options
                        .insert(lossy(key).into_owned(), lossy(word).into_owned());
                }
                None => {
                    directives.flags.insert(lossy(part).into_owned());
                }
            }
        }

        Ok(directives)
    }
}

// ===== Authorization =====

/// `Authorization` credentials: a scheme and its parameters.
///
/// For the `Basic` scheme the parameters are `userid` and `password`,
/// recovered from the base64 cookie. Any other scheme carries a comma
/// separated `name=quoted-string` list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Authorization {
    pub scheme: String,
    pub parameters: BTreeMap<String, Bytes>,
}

impl Authorization {
    pub(crate) fn parse(data: &[u8]) -> Result<Self, Error> {
        let (head, rest) = split_credentials(data);

        let scheme = lws::trim_right(head);
        if grammar::validate_token(scheme).is_err() {
            return Err(Error::client(format!(
                "malformed Authorization scheme ({})",
                lossy(data)
            )));
        }

        let mut credentials = Authorization {
            scheme: lossy(scheme).into_owned(),
            parameters: BTreeMap::new(),
        };
        credentials.set_params(rest)?;

        Ok(credentials)
    }

    fn set_params(&mut self, data: &[u8]) -> Result<(), Error> {
        if self.scheme == "Basic" {
            return self.set_basic_params(data);
        }

        for (i, param) in rules::extract(data).into_iter().enumerate() {
            let invalid = || {
                Error::client(format!(
                    "invalid auth parameter (param {i} [{}])",
                    lossy(data)
                ))
            };

            let Some(eq) = memchr::memchr(b'=', param) else {
                return Err(invalid());
            };

            let key = &param[..eq];
            grammar::validate_token(key).map_err(|_| invalid())?;

            let value = grammar::parse_quoted_string(&param[eq + 1..]).map_err(|_| invalid())?;

            self.parameters
                .insert(lossy(key).into_owned(), Bytes::copy_from_slice(value));
        }

        Ok(())
    }

    fn set_basic_params(&mut self, data: &[u8]) -> Result<(), Error> {
        let invalid = || Error::client("invalid credentials");

        let decoded = BASE64.decode(data).map_err(|_| invalid())?;

        let Some(colon) = memchr::memchr(b':', &decoded) else {
            return Err(invalid());
        };

        let userid = &decoded[..colon];
        if grammar::validate_token(userid).is_err() && !userid.is_empty() {
            return Err(invalid());
        }

        let password = &decoded[colon + 1..];
        grammar::validate_text(password).map_err(|_| invalid())?;

        self.parameters
            .insert("userid".into(), Bytes::copy_from_slice(userid));
        self.parameters
            .insert("password".into(), Bytes::copy_from_slice(password));

        Ok(())
    }
}

/// Splits the scheme from the remainder at the first tspecial octet,
/// absorbing folded whitespace (CRLF + SP/HT) along the way.
fn split_credentials(data: &[u8]) -> (&[u8], &[u8]) {
    let mut i = 0;

    while i < data.len() && !byte::is_tspecial(data[i]) {
        let (is_new_line, next, _) = lws::new_line(data, i);
        if is_new_line {
            i = next;
        } else {
            i += 1;
        }
    }

    (&data[..i], &data[data.len().min(i + 1)..])
}

// ===== From =====

/// An RFC 822 mailbox: `display <addr>` or a bare `addr`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub address: String,
}

pub(crate) fn parse_mailbox(data: &[u8]) -> Result<Mailbox, Error> {
    let s = std::str::from_utf8(data).map_err(|err| Error::client(err.to_string()))?;

    let addresses = mailparse::addrparse(s).map_err(|err| Error::client(err.to_string()))?;

    match &addresses[..] {
        [mailparse::MailAddr::Single(info)] => Ok(Mailbox {
            name: info.display_name.clone(),
            address: info.addr.clone(),
        }),
        [] => Err(Error::client("no address")),
        _ => Err(Error::client("expected exactly one address")),
    }
}

// ===== User-Agent / Server =====

/// A `product[/version]` identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub version: Option<String>,
}

impl Product {
    pub(crate) fn parse(data: &[u8]) -> Result<Self, Error> {
        let parts: Vec<&[u8]> = data.split(|&b| b == b'/').collect();
        if parts.len() > 2 {
            return Err(Error::client(format!(
                "product token can only contain up to 1 forward slash ({})",
                lossy(data)
            )));
        }

        if grammar::validate_token(parts[0]).is_err() {
            return Err(Error::client(format!(
                "invalid product token ({})",
                lossy(data)
            )));
        }

        let mut product = Product {
            name: lossy(parts[0]).into_owned(),
            version: None,
        };

        if let Some(version) = parts.get(1) {
            if grammar::validate_token(version).is_err() {
                return Err(Error::client(format!(
                    "invalid product token ({})",
                    lossy(data)
                )));
            }
            product.version = Some(lossy(version).into_owned());
        }

        Ok(product)
    }

    pub(crate) fn marshal(&self) -> Vec<u8> {
        let mut res = self.name.clone().into_bytes();

        if let Some(version) = &self.version {
            res.push(b'/');
            res.extend_from_slice(version.as_bytes());
        }

        res
    }
}

/// `User-Agent` contents: product tokens and comments in field order
/// within their own lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserAgent {
    pub products: Vec<Product>,
    pub comments: Vec<Bytes>,
}

pub(crate) fn parse_user_agent(data: &[u8]) -> Result<UserAgent, Error> {
    let data = lws::trim_left(data);
    let mut i = 0;
    let mut user_agent = UserAgent::default();

    while i < data.len() {
        if data[i] == b'(' {
            let (comment, next) = extract_comment(data, i)
                .map_err(|err| Error::client(format!("bad comment - {}", err.message())))?;

            grammar::validate_comment(comment)
                .map_err(|err| Error::client(format!("bad comment - {}", err.message())))?;

            user_agent.comments.push(Bytes::copy_from_slice(comment));
            i = next;
        } else {
            let (token, next) = extract_product(data, i);
            let product = Product::parse(token)
                .map_err(|err| Error::client(format!("bad product token - {}", err.message())))?;

            user_agent.products.push(product);
            i = next;
        }
    }

    Ok(user_agent)
}

/// Extracts a balanced `(...)` group starting at `start`, then skips
/// trailing LWS.
fn extract_comment(data: &[u8], start: usize) -> Result<(&[u8], usize), Error> {
    if data[start] != b'(' {
        return Err(Error::client(format!(
            "comment must begin with open parenthesis ({})",
            lossy(data)
        )));
    }

    let mut score = 1;
    let mut i = start + 1;
    while i < data.len() && score > 0 {
        if data[i] == b'(' {
            score += 1;
        }
        if data[i] == b')' {
            score -= 1;
        }
        i += 1;
    }

    if score > 0 {
        return Err(Error::client(format!(
            "comment not properly closed ({})",
            lossy(data)
        )));
    }

    let comment = &data[start..i];

    let (mut is_lws, mut next) = lws::check(data, i);
    while is_lws {
        i = next;
        (is_lws, next) = lws::check(data, i);
    }

    Ok((comment, i))
}

/// Extracts a product token: everything up to the next LWS or `(`,
/// then skips trailing LWS.
fn extract_product(data: &[u8], start: usize) -> (&[u8], usize) {
    let mut i = start;
    let (mut is_lws, mut next) = lws::check(data, i);

    while i < data.len() && data[i] != b'(' && !is_lws {
        i += 1;
        (is_lws, next) = lws::check(data, i);
    }

    let product = &data[start..i];

    while is_lws {
        i = next;
        (is_lws, next) = lws::check(data, i);
    }

    (product, i)
}

// ===== Content-Encoding =====

/// `Content-Encoding` value.
///
/// The four registered tokens select a surface decoding; anything else
/// that is still a token rides along as an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    XGzip,
    Compress,
    XCompress,
    Extension(String),
}

impl ContentEncoding {
    /// Parses a request-side value: any token, with the `x-` aliases
    /// case-normalized.
    pub(crate) fn parse(data: &[u8]) -> Result<Self, Error> {
        grammar::validate_token(data)?;

        let lower = data.to_ascii_lowercase();
        Ok(match (&lower[..], data) {
            (b"x-gzip", _) => Self::XGzip,
            (b"x-compress", _) => Self::XCompress,
            (_, b"gzip") => Self::Gzip,
            (_, b"compress") => Self::Compress,
            _ => Self::Extension(lossy(data).into_owned()),
        })
    }

    /// Parses a response-side value, which must be one of the four
    /// registered tokens.
    pub(crate) fn parse_known(data: &[u8]) -> Result<Self, Error> {
        match data {
            b"gzip" => Ok(Self::Gzip),
            b"x-gzip" => Ok(Self::XGzip),
            b"compress" => Ok(Self::Compress),
            b"x-compress" => Ok(Self::XCompress),
            _ => Err(Error::client("unknown encoding")),
        }
    }

    /// Returns the token form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gzip => "gzip",
            Self::XGzip => "x-gzip",
            Self::Compress => "compress",
            Self::XCompress => "x-compress",
            Self::Extension(s) => s,
        }
    }
}

// ===== Content-Type =====

/// `Content-Type` media type with its parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentType {
    pub type_: String,
    pub subtype: String,
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Returns `true` when no media type is set.
    pub fn is_empty(&self) -> bool {
        self.type_.is_empty() && self.subtype.is_empty()
    }

    pub(crate) fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut content_type = ContentType::default();

        let (media, params) = match memchr::memchr(b';', data) {
            Some(i) => (&data[..i], Some(&data[i + 1..])),
            None => (data, None),
        };

        let media = lws::trim(media);
        let parts: Vec<&[u8]> = media.split(|&b| b == b'/').collect();
        if parts.len() != 2 {
            return Err(Error::client(format!(
                "malformed media type header ({})",
                lossy(data)
            )));
        }

        if grammar::validate_token(parts[0]).is_err() {
            return Err(Error::client(format!(
                "malformed media type ({})",
                lossy(data)
            )));
        }
        content_type.type_ = lossy(parts[0]).into_owned();

        if grammar::validate_token(parts[1]).is_err() {
            return Err(Error::client(format!(
                "malformed media subtype ({})",
                lossy(data)
            )));
        }
        content_type.subtype = lossy(parts[1]).into_owned();

        if let Some(params) = params {
            content_type.parameters = parse_parameters(params)?;
        }

        Ok(content_type)
    }
}

fn parse_parameters(data: &[u8]) -> Result<BTreeMap<String, String>, Error> {
    if data.is_empty() {
        return Err(Error::client(format!(
            "parameter cannot be empty ({})",
            lossy(data)
        )));
    }

    let mut parameters = BTreeMap::new();

    let mut i = 0;
    while i < data.len() {
        let (mut is_lws, mut next) = lws::check(data, i);
        while is_lws {
            i = next;
            (is_lws, next) = lws::check(data, i);
        }

        let attr_start = i;
        while i < data.len() && data[i] != b'=' {
            i += 1;
        }
        let attribute = &data[attr_start..i];

        if grammar::validate_token(attribute).is_err() {
            return Err(Error::client(format!(
                "parameter attribute must be a token ({})",
                lossy(data)
            )));
        }

        i += 1;
        if i >= data.len() {
            return Err(Error::client(format!(
                "parameter has no value ({})",
                lossy(data)
            )));
        }

        let value;
        if data[i] == b'"' {
            let value_start = i;
            i += 1;
            while i < data.len() && data[i] != b'"' {
                i += 1;
            }
            if i < data.len() {
                i += 1;
            }

            value = lossy(grammar::parse_quoted_string(&data[value_start..i])?).into_owned();

            (is_lws, next) = lws::check(data, i);
            while is_lws {
                i = next;
                (is_lws, next) = lws::check(data, i);
            }
        } else {
            let value_start = i;
            while i < data.len() && data[i] != b';' {
                i += 1;
            }

            let trimmed = lws::trim_right(&data[value_start..i]);
            grammar::validate_token(trimmed)?;
            value = lossy(trimmed).into_owned();
        }

        parameters.insert(lossy(attribute).into_owned(), value);
        i += 1;
    }

    Ok(parameters)
}
