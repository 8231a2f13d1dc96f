// Server module entry point
// Accept loop, per-connection HTTP/1.1 service and the listener

pub mod connection;
pub mod listener;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::logger;

pub use connection::{accept_connection, handle_request, AppState};
pub use listener::create_reusable_listener;

/// Accept connections until Ctrl-C
///
/// In-flight connections keep running on their own tasks after the loop
/// returns; the runtime shutdown decides how long they get.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_accept_failed(&e),
                }
            }
            result = &mut shutdown => {
                result?;
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}
