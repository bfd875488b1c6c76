//! Response model and the capability-checked writer.

mod marshal;

#[cfg(test)]
mod test;

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::error::Error;
use crate::grammar::{self, date::MessageTime};
use crate::headers::{self, ContentEncoding, ContentType, Pragma, Product};
use crate::status::StatusCode;
use crate::uri::{self, AbsoluteUri};

/// `Server` identification: product tokens first, comments after.
#[derive(Clone, Debug, Default)]
pub(crate) struct ServerInfo {
    pub(crate) products: Vec<Product>,
    pub(crate) comments: Vec<String>,
}

/// A `WWW-Authenticate` challenge.
#[derive(Clone, Debug, Default)]
pub(crate) struct Challenge {
    pub(crate) scheme: String,
    pub(crate) realm: String,
    pub(crate) params: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ResponseHeaders {
    pub(crate) date: MessageTime,
    pub(crate) pragma: Pragma,
    pub(crate) location: Option<AbsoluteUri>,
    pub(crate) server: ServerInfo,
    pub(crate) www_authenticate: Challenge,
    pub(crate) allow: Vec<String>,
    pub(crate) content_encoding: Option<ContentEncoding>,
    pub(crate) content_length: u64,
    pub(crate) content_type: ContentType,
    pub(crate) expires: MessageTime,
    pub(crate) last_modified: MessageTime,
    pub(crate) unrecognized: BTreeMap<String, String>,
}

/// A response about to be serialized.
#[derive(Clone, Debug)]
pub(crate) struct Response {
    pub(crate) code: StatusCode,
    pub(crate) headers: ResponseHeaders,
    pub(crate) body: Vec<u8>,
}

impl Response {
    /// The implicit response every exchange starts from.
    pub(crate) fn new() -> Self {
        Response {
            code: StatusCode::OK,
            headers: ResponseHeaders {
                date: MessageTime::now(),
                content_type: ContentType {
                    type_: "application".into(),
                    subtype: "octet-stream".into(),
                    parameters: BTreeMap::new(),
                },
                ..ResponseHeaders::default()
            },
            body: Vec::new(),
        }
    }

    /// Maps a failed exchange to its wire form: 400 for client faults,
    /// 500 otherwise, with the error text as body.
    pub(crate) fn from_error(err: &Error) -> Self {
        let mut response = Response::new();

        response.code = if err.is_client() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        response.body = err.to_string().into_bytes();

        response
    }
}

/// Builder handed to the request handler.
///
/// Starts as `200 OK` with the current date and an
/// `application/octet-stream` content type. Every setter validates its
/// input against the grammar of the header it feeds.
#[derive(Debug)]
pub struct ResponseWriter {
    pub(crate) response: Response,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            response: Response::new(),
        }
    }
}

impl ResponseWriter {
    /// Sets the status code. The code must be registered.
    ///
    /// For redirects and challenges prefer [`redirect`],
    /// [`redirect_temporary`] and [`unauthorized`].
    ///
    /// [`redirect`]: ResponseWriter::redirect
    /// [`redirect_temporary`]: ResponseWriter::redirect_temporary
    /// [`unauthorized`]: ResponseWriter::unauthorized
    pub fn set_status(&mut self, code: u16) -> Result<(), Error> {
        let Some(code) = StatusCode::from_u16(code) else {
            return Err(Error::client("not a valid status code"));
        };

        self.response.code = code;
        Ok(())
    }

    /// Returns the current status code.
    pub fn status(&self) -> StatusCode {
        self.response.code
    }

    /// `301 Moved Permanently` with a `Location` and a stub body.
    pub fn redirect(&mut self, uri: &str) -> Result<(), Error> {
        self.response.code = StatusCode::MOVED_PERMANENTLY;
        self.redirect_to(uri)
    }

    /// `302 Moved Temporarily` with a `Location` and a stub body.
    pub fn redirect_temporary(&mut self, uri: &str) -> Result<(), Error> {
        self.response.code = StatusCode::MOVED_TEMPORARILY;
        self.redirect_to(uri)
    }

    fn redirect_to(&mut self, uri: &str) -> Result<(), Error> {
        self.set_location(uri)
            .map_err(|err| Error::client(format!("problem redirecting: {}", err.message())))?;

        self.set_body(format!("Resource moved to {uri}").into_bytes());
        Ok(())
    }

    /// `401 Unauthorized` carrying a `WWW-Authenticate` challenge.
    pub fn unauthorized(&mut self, scheme: &str, realm: &str) -> Result<(), Error> {
        self.response.code = StatusCode::UNAUTHORIZED;
        self.set_challenge(scheme, realm)
    }

    /// Sets the `Date` header.
    pub fn set_date_header(&mut self, date: SystemTime) {
        self.response.headers.date = date.into();
    }

    /// Toggles the `no-cache` Pragma flag.
    pub fn set_no_cache(&mut self, on: bool) {
        if on {
            self.response.headers.pragma.flags.insert("no-cache".into());
        } else {
            self.response.headers.pragma.flags.remove("no-cache");
        }
    }

    /// Adds a `name=value` Pragma option; the name must be a token and
    /// the value a word.
    pub fn add_pragma_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        grammar::validate_token(name.as_bytes())?;
        grammar::parse_word(value.as_bytes())?;

        self.response
            .headers
            .pragma
            .options
            .insert(name.into(), value.into());
        Ok(())
    }

    /// Sets `Location` to an absolute URI.
    pub fn set_location(&mut self, uri: &str) -> Result<(), Error> {
        self.response.headers.location = Some(uri::parse_absolute(uri.as_bytes())?);
        Ok(())
    }

    /// Appends a product token to the `Server` header.
    pub fn add_server_header(&mut self, product: &str) -> Result<(), Error> {
        let product = Product::parse(product.as_bytes())?;
        self.response.headers.server.products.push(product);
        Ok(())
    }

    /// Appends a comment to the `Server` header.
    pub fn add_server_header_comment(&mut self, comment: &str) -> Result<(), Error> {
        grammar::validate_comment(comment.as_bytes())?;
        self.response
            .headers
            .server
            .comments
            .push(comment.to_owned());
        Ok(())
    }

    /// Sets the challenge scheme and realm. The realm is quoted if it
    /// is not already a quoted string.
    pub fn set_challenge(&mut self, scheme: &str, realm: &str) -> Result<(), Error> {
        grammar::validate_token(scheme.as_bytes())?;
        let realm = grammar::parse_user_quoted_string(realm.as_bytes())?;

        self.response.headers.www_authenticate.scheme = scheme.to_owned();
        self.response.headers.www_authenticate.realm = realm;
        Ok(())
    }

    /// Adds an auth parameter to the challenge; the value is quoted if
    /// it is not already a quoted string.
    pub fn add_challenge_parameter(&mut self, name: &str, value: &str) -> Result<(), Error> {
        grammar::validate_token(name.as_bytes())?;
        let value = grammar::parse_user_quoted_string(value.as_bytes())?;

        self.response
            .headers
            .www_authenticate
            .params
            .insert(name.to_owned(), value);
        Ok(())
    }

    /// Appends a method token to the `Allow` header.
    pub fn add_allow_header(&mut self, method: &str) {
        self.response.headers.allow.push(method.to_owned());
    }

    /// Sets `Content-Encoding`; only the four registered tokens are
    /// accepted.
    pub fn set_content_encoding(&mut self, encoding: &str) -> Result<(), Error> {
        let encoding = ContentEncoding::parse_known(encoding.as_bytes())?;
        self.response.headers.content_encoding = Some(encoding);
        Ok(())
    }

    /// Sets the `Content-Type` media type.
    pub fn set_content_type_header(&mut self, type_: &str, subtype: &str) -> Result<(), Error> {
        grammar::validate_token(type_.as_bytes())?;
        grammar::validate_token(subtype.as_bytes())?;

        self.response.headers.content_type.type_ = type_.to_owned();
        self.response.headers.content_type.subtype = subtype.to_owned();
        Ok(())
    }

    /// Adds a `Content-Type` parameter; the value may be a token or a
    /// quoted string.
    pub fn add_content_type_header_parameter(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<(), Error> {
        grammar::validate_token(name.as_bytes())?;

        if grammar::validate_token(value.as_bytes()).is_ok() {
            self.response
                .headers
                .content_type
                .parameters
                .insert(name.to_owned(), value.to_owned());
            return Ok(());
        }

        if let Ok(quoted) = grammar::parse_user_quoted_string(value.as_bytes()) {
            self.response
                .headers
                .content_type
                .parameters
                .insert(name.to_owned(), quoted);
            return Ok(());
        }

        Err(Error::client("malformed parameter value"))
    }

    /// Sets the `Expires` header.
    pub fn set_expires_header(&mut self, date: SystemTime) {
        self.response.headers.expires = date.into();
    }

    /// Sets the `Last-Modified` header, which cannot lie in the
    /// future.
    pub fn set_last_modified_header(&mut self, date: SystemTime) -> Result<(), Error> {
        if date > SystemTime::now() {
            return Err(Error::client("last modified cannot be a future timestamp"));
        }

        self.response.headers.last_modified = date.into();
        Ok(())
    }

    /// Sets a header outside the reserved set.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        match name {
            "Date" | "Pragma" | "Location" | "Server" | "WWW-Authenticate" | "Allow"
            | "Content-Encoding" | "Content-Length" | "Content-Type" | "Expires"
            | "Last-Modified" => Err(Error::client(format!("please use API to set {name}"))),
            _ => {
                grammar::validate_token(name.as_bytes())?;
                headers::validate_value(value.as_bytes())?;

                self.response
                    .headers
                    .unrecognized
                    .insert(name.to_owned(), value.to_owned());
                Ok(())
            }
        }
    }

    /// Sets the body and records its length as `Content-Length`.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.response.body = body.into();
        self.response.headers.content_length = self.response.body.len() as u64;
    }
}
