//! Deterministic byte layout of a response.
//!
//! Headers render in a fixed canonical order, then unrecognized
//! headers in name order. A header whose marshaled value is empty is
//! omitted entirely; `Content-Length` is only emitted alongside a
//! body.

use super::{Challenge, Response, ResponseHeaders, ServerInfo};

const CRLF: &[u8] = b"\r\n";

impl Response {
    pub(crate) fn marshal(&self) -> Vec<u8> {
        let mut marshaled =
            format!("HTTP/1.0 {} {}\r\n", self.code.as_u16(), self.code.reason()).into_bytes();

        marshaled.extend_from_slice(&self.headers.marshal(!self.body.is_empty()));
        marshaled.extend_from_slice(&self.body);

        marshaled
    }
}

impl ResponseHeaders {
    fn marshal(&self, has_body: bool) -> Vec<u8> {
        let mut headers = Vec::new();

        push_header(&mut headers, "Date", &self.date.marshal());
        push_header(&mut headers, "Pragma", &marshal_pragma(&self.pragma));

        if let Some(location) = &self.location {
            push_header(&mut headers, "Location", &location.marshal());
        }

        push_header(&mut headers, "Server", &self.server.marshal());
        push_header(
            &mut headers,
            "WWW-Authenticate",
            &self.www_authenticate.marshal(),
        );
        push_header(&mut headers, "Allow", self.allow.join(", ").as_bytes());
        push_header(
            &mut headers,
            "Content-Encoding",
            self.content_encoding
                .as_ref()
                .map(|encoding| encoding.as_str())
                .unwrap_or_default()
                .as_bytes(),
        );

        if has_body {
            push_header(
                &mut headers,
                "Content-Length",
                self.content_length.to_string().as_bytes(),
            );
        }

        push_header(&mut headers, "Content-Type", &marshal_content_type(self));
        push_header(&mut headers, "Expires", &self.expires.marshal());
        push_header(&mut headers, "Last-Modified", &self.last_modified.marshal());

        for (name, value) in &self.unrecognized {
            headers.extend_from_slice(name.as_bytes());
            headers.extend_from_slice(b": ");
            headers.extend_from_slice(value.as_bytes());
            headers.extend_from_slice(CRLF);
        }

        headers.extend_from_slice(CRLF);
        headers
    }
}

/// Writes `name: value` followed by CRLF, or nothing when the value is
/// empty.
fn push_header(out: &mut Vec<u8>, name: &str, value: &[u8]) {
    if value.is_empty() {
        return;
    }

    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value);
    out.extend_from_slice(CRLF);
}

/// Flags in name order, then options as `key=value`, space separated.
fn marshal_pragma(pragma: &crate::headers::Pragma) -> Vec<u8> {
    let mut parts: Vec<String> = pragma.flags.iter().cloned().collect();
    parts.extend(
        pragma
            .options
            .iter()
            .map(|(name, value)| format!("{name}={value}")),
    );

    parts.join(" ").into_bytes()
}

impl ServerInfo {
    /// Products in insertion order, then comments, space separated.
    fn marshal(&self) -> Vec<u8> {
        let mut parts: Vec<Vec<u8>> = self.products.iter().map(|p| p.marshal()).collect();
        parts.extend(self.comments.iter().map(|c| c.clone().into_bytes()));

        parts.join(&b' ')
    }
}

impl Challenge {
    /// `scheme realm=...` then `,name=value` parameters in name order.
    fn marshal(&self) -> Vec<u8> {
        let mut res = Vec::new();

        if !self.scheme.is_empty() && !self.realm.is_empty() {
            res.extend_from_slice(self.scheme.as_bytes());
            res.extend_from_slice(b" realm=");
            res.extend_from_slice(self.realm.as_bytes());
        }

        for (name, value) in &self.params {
            res.push(b',');
            res.extend_from_slice(name.as_bytes());
            res.push(b'=');
            res.extend_from_slice(value.as_bytes());
        }

        res
    }
}

/// `type/subtype` then `;name=value` parameters in name order, no
/// spaces.
fn marshal_content_type(headers: &ResponseHeaders) -> Vec<u8> {
    let content_type = &headers.content_type;
    let mut res = Vec::new();

    if !content_type.type_.is_empty() && !content_type.subtype.is_empty() {
        res.extend_from_slice(content_type.type_.as_bytes());
        res.push(b'/');
        res.extend_from_slice(content_type.subtype.as_bytes());
    }

    for (name, value) in &content_type.parameters {
        res.push(b';');
        res.extend_from_slice(name.as_bytes());
        res.push(b'=');
        res.extend_from_slice(value.as_bytes());
    }

    res
}
