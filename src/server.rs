//! Server configuration and the per-connection exchange.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::body;
use crate::error::Error;
use crate::log::{error, info};
use crate::method::Method;
use crate::proto::{self, Limits};
use crate::request::Request;
use crate::response::{Response, ResponseWriter};
use crate::status::StatusCode;

/// A user supplied request handler.
///
/// The handler receives the parsed request and a writer primed with
/// the default response; whatever it leaves in the writer is
/// serialized back, after body preparation.
///
/// Closures of the matching shape implement it:
///
/// ```no_run
/// use h10::{Request, ResponseWriter, Server};
///
/// # async fn run() -> std::io::Result<()> {
/// let server = Server::new(|_req: &Request, res: &mut ResponseWriter| {
///     res.set_body(&b"Hello World!"[..]);
/// });
/// server.serve().await
/// # }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, response: &mut ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut ResponseWriter) + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, request: &Request, response: &mut ResponseWriter) {
        self(request, response)
    }
}

/// HTTP/1.0 server: a handler plus read caps and the listen port.
///
/// Connections are one-shot: one request in, one response out, close.
/// Failures are reported through the `log` facade; install whichever
/// logger sink the application prefers.
#[derive(Debug)]
pub struct Server<H> {
    handler: Arc<H>,
    port: u16,
    limits: Limits,
}

impl<H: Handler> Server<H> {
    /// Creates a server with the default configuration: port 8080, a
    /// 5000 ms read deadline, 4000 bytes of request line + headers and
    /// 64000 bytes of body.
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            port: 8080,
            limits: Limits {
                read_timeout: 5000,
                max_header_bytes: 4000,
                max_body_bytes: 64000,
            },
        }
    }

    /// Sets the TCP listen port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request read deadline, in milliseconds.
    pub fn read_timeout(mut self, millis: u64) -> Self {
        self.limits.read_timeout = millis;
        self
    }

    /// Caps the request line and header block, in bytes.
    pub fn max_header_bytes(mut self, bytes: u64) -> Self {
        self.limits.max_header_bytes = bytes;
        self
    }

    /// Caps the declared `Content-Length` of request bodies.
    pub fn max_body_bytes(mut self, bytes: u64) -> Self {
        self.limits.max_body_bytes = bytes;
        self
    }

    /// Binds the listener and serves connections, one task each, until
    /// the process ends.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        info!("listening for connections on port {}", self.port);

        let server = Arc::new(self);

        loop {
            let stream = match listener.accept().await {
                Ok((stream, _)) => stream,
                Err(err) => {
                    error!("could not accept connection: {err}");
                    continue;
                }
            };

            let server = Arc::clone(&server);
            tokio::spawn(async move { server.handle(stream).await });
        }
    }

    /// Runs one full exchange on `stream`: parse, dispatch, prepare,
    /// serialize, write, close.
    ///
    /// [`serve`] calls this for every accepted connection; it is also
    /// the entry point for driving the server over any other duplex
    /// stream.
    ///
    /// [`serve`]: Server::serve
    pub async fn handle<S>(&self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let response = match proto::read_request(&mut stream, &self.limits).await {
            Ok(request) => {
                let mut writer = ResponseWriter::default();
                self.handler.handle(&request, &mut writer);

                match prepare_body(&request, &mut writer) {
                    Ok(()) => writer.response,
                    Err(err) => {
                        error!("{err}");
                        Response::from_error(&err)
                    }
                }
            }
            Err(err) => {
                error!("{err}");
                Response::from_error(&err)
            }
        };

        send(stream, &response).await;
    }
}

/// Nulls the body for HEAD and 304 exchanges, otherwise encodes it per
/// the writer's `Content-Encoding`.
///
/// The recorded `Content-Length` is left untouched; the serializer's
/// body-presence rule decides whether it reaches the wire.
fn prepare_body(request: &Request, writer: &mut ResponseWriter) -> Result<(), Error> {
    let response = &mut writer.response;

    if request.line.method == Method::Head || response.code == StatusCode::NOT_MODIFIED {
        response.body = Vec::new();
        return Ok(());
    }

    response.body = body::encode(&response.body, response.headers.content_encoding.as_ref())?;
    Ok(())
}

/// Writes the response and closes the stream. Write failures are
/// logged and swallowed.
async fn send<S>(mut stream: S, response: &Response)
where
    S: AsyncWrite + Unpin,
{
    let marshaled = response.marshal();

    if let Err(err) = stream.write_all(&marshaled).await {
        error!("could not send data: {err}");
    }

    let _ = stream.shutdown().await;
}
