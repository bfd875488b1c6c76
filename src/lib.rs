//! HTTP/1.0 as specified by [RFC 1945][rfc]: a byte-exact message
//! pipeline for the server side.
//!
//! The crate parses request lines, folded headers and bodies into a
//! typed [`Request`], hands it to a user [`Handler`] next to a
//! [`ResponseWriter`] whose setters enforce the header grammars, and
//! serializes the result in a deterministic layout. Connections are
//! one-shot, one task each; there is no persistent-connection state.
//!
//! ```no_run
//! use h10::{Request, ResponseWriter, Server};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     Server::new(|_req: &Request, res: &mut ResponseWriter| {
//!         res.set_content_type_header("text", "html").unwrap();
//!         res.set_body(&b"<h1>It works</h1>"[..]);
//!     })
//!     .serve()
//!     .await
//! }
//! ```
//!
//! [rfc]: <https://datatracker.ietf.org/doc/html/rfc1945>
#![warn(missing_debug_implementations)]

mod body;
mod error;
mod log;
mod method;
mod proto;
mod request;
mod response;
mod server;
mod status;

pub mod grammar;
pub mod headers;
pub mod uri;

// ===== Reexports =====

pub use error::{Error, ErrorKind};
pub use grammar::date::MessageTime;
pub use headers::RequestHeaders;
pub use method::{Method, UnknownMethod};
pub use request::{Request, RequestLine, Version};
pub use response::ResponseWriter;
pub use server::{Handler, Server};
pub use status::StatusCode;
pub use uri::{AbsoluteUri, PathForm, RelativeUri, Uri};
