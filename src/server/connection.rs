// Connection handling module
// Serves one TCP connection over HTTP/1.1 and dispatches its requests

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;

use crate::config::Config;
use crate::http::client::client_ip;
use crate::http::{build_405_response, build_status_response, RequestSignal};
use crate::logger;
use crate::serve::{DirFs, FileServer, Pipeline, ReadOnlyFs};

/// Shared, read-only state of the demo server
pub struct AppState<F = DirFs> {
    pub files: FileServer<F>,
    pub access_log: bool,
    pub keep_alive: bool,
    pub request_timeout: Duration,
}

impl<F: ReadOnlyFs> AppState<F> {
    pub fn new(files: FileServer<F>, config: &Config) -> Self {
        Self {
            files,
            access_log: config.logging.access_log,
            keep_alive: config.server.keep_alive,
            request_timeout: Duration::from_secs(config.server.request_timeout),
        }
    }
}

impl AppState<DirFs> {
    /// Serve `server.root` from disk with the configured pipeline
    pub fn from_config(config: &Config) -> Self {
        let files = FileServer::new(
            DirFs::new(&config.server.root),
            Pipeline::new(config.serve.clone()),
        );
        Self::new(files, config)
    }
}

/// Serve an accepted connection on its own task
pub fn accept_connection<F>(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState<F>>,
) where
    F: ReadOnlyFs + 'static,
{
    let state = Arc::clone(state);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout = state.request_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handle_request(req, peer_addr, Arc::clone(&service_state))),
        );

        match tokio::time::timeout(timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) if is_peer_gone(&err) => logger::log_peer_gone(&peer_addr, &err),
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_connection_timeout(&peer_addr, timeout.as_secs()),
        }
    });
}

/// Dispatch one request
///
/// GET and HEAD go to the file server on the blocking pool, anything else
/// is answered with 405. The request body is never read.
pub async fn handle_request<B, F>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState<F>>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    F: ReadOnlyFs + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client = client_ip(req.headers(), Some(&peer_addr));

    let response = if method == Method::GET || method == Method::HEAD {
        let signal = RequestSignal::from_request(&req);
        drop(req);

        let blocking_state = Arc::clone(&state);
        let blocking_path = path.clone();
        let served =
            tokio::task::spawn_blocking(move || blocking_state.files.serve(&blocking_path, &signal))
                .await;

        match served {
            Ok(response) => response,
            Err(e) => {
                logger::log_error(&format!("File serving task failed for {path}: {e}"));
                build_status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    } else {
        build_405_response()
    };

    if state.access_log {
        logger::log_request(&method, &path, response.status().as_u16(), &client);
    }

    Ok(response)
}

/// The client went away; nothing left to answer
fn is_peer_gone(err: &hyper::Error) -> bool {
    err.is_closed() || err.is_incomplete_message() || err.is_canceled()
}
