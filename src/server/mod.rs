//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests to a handler function.
//! Supports HTTP/1.1 persistent connections (keep-alive) out of the box.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a complete HTTP request we will buffer before rejecting it (8 MiB).
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

const INITIAL_BUF_SIZE: usize = 4096;

/// The HTTP/1.1 listener behind the front controller.
///
/// Binds to a TCP address and hands each parsed request, tagged with the
/// peer address, to a handler function.
///
/// # Examples
///
/// ```rust,no_run
/// use pathrouter::server::Server;
/// use pathrouter::http::{Request, Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:44777").await?;
///     server.run(|_req: Request| async {
///         Response::new(StatusCode::Ok).body("Hello!")
///     }).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until the process is terminated.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
    {
        self.run_with_shutdown(handler, std::future::pending()).await
    }

    /// Accepts connections and dispatches requests to `handler` until
    /// `shutdown` resolves.
    ///
    /// The handler is shared across all spawned Tokio tasks, so it must be
    /// `Send + Sync + 'static`. Connections already in flight when `shutdown`
    /// fires are left to finish on their own tasks.
    pub async fn run_with_shutdown<H, F, S>(self, handler: H, shutdown: S) -> Result<(), ServerError>
    where
        H: Fn(Request) -> F + Send + Sync + 'static,
        F: Future<Output = Response> + Send + 'static,
        S: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "pathrouter listening");

        tokio::pin!(shutdown);
        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => {
                    info!(address = %self.local_addr, "shutting down listener");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                        continue;
                    }
                },
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, handler).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Serves one TCP connection, one request per loop iteration, until the peer
/// closes it or asks for `Connection: close`.
async fn handle_connection<H, F>(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
) -> Result<(), std::io::Error>
where
    H: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Pipelined bytes left over from the previous request may already
        // hold a complete one.
        if !buf.is_empty() {
            match serve_buffered(&mut stream, &mut buf, peer_addr, handler.as_ref()).await? {
                Buffered::Served { keep_alive: true } => continue,
                Buffered::Served { keep_alive: false } | Buffered::Closed => break,
                Buffered::NeedMore => {}
            }
        }

        let bytes_read = stream.read_buf(&mut buf).await?;
        if bytes_read == 0 {
            debug!(peer = %peer_addr, "connection closed by peer");
            break;
        }

        match serve_buffered(&mut stream, &mut buf, peer_addr, handler.as_ref()).await? {
            Buffered::Served { keep_alive: true } | Buffered::NeedMore => {}
            Buffered::Served { keep_alive: false } | Buffered::Closed => break,
        }
    }

    Ok(())
}

enum Buffered {
    NeedMore,
    Served { keep_alive: bool },
    Closed,
}

async fn serve_buffered<H, F>(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    peer_addr: SocketAddr,
    handler: &H,
) -> Result<Buffered, std::io::Error>
where
    H: Fn(Request) -> F,
    F: Future<Output = Response>,
{
    if buf.len() > MAX_REQUEST_SIZE {
        warn!(peer = %peer_addr, "request too large, sending 413");
        let response = Response::new(StatusCode::PayloadTooLarge)
            .body("Request entity too large")
            .keep_alive(false);
        stream.write_all(&response.into_bytes()).await?;
        return Ok(Buffered::Closed);
    }

    let (mut request, body_offset) = match Request::parse(buf) {
        Ok(pair) => pair,
        Err(RequestError::Incomplete) => return Ok(Buffered::NeedMore),
        Err(e) => {
            warn!(peer = %peer_addr, error = %e, "bad request, sending 400");
            let response = Response::new(StatusCode::BadRequest)
                .body(format!("Bad Request: {e}"))
                .keep_alive(false);
            stream.write_all(&response.into_bytes()).await?;
            return Ok(Buffered::Closed);
        }
    };

    let content_length = request.content_length().unwrap_or(0);
    let total_needed = body_offset + content_length;
    if buf.len() < total_needed {
        return Ok(Buffered::NeedMore);
    }
    request.truncate_body(content_length);

    let keep_alive = request.is_keep_alive();
    debug!(
        peer = %peer_addr,
        method = %request.method(),
        path = %request.path(),
        "dispatching request"
    );

    let response = handler(request.with_remote_addr(peer_addr)).await;
    stream
        .write_all(&response.keep_alive(keep_alive).into_bytes())
        .await?;
    stream.flush().await?;

    let _ = buf.split_to(total_needed);

    if !keep_alive {
        debug!(peer = %peer_addr, "Connection: close, shutting down");
    }
    Ok(Buffered::Served { keep_alive })
}
