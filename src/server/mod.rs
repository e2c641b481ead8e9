//! Server module
//!
//! Listener construction and the accept loop.

pub mod connection;
pub mod listener;

pub use listener::create_listener;

use crate::config::AppState;
use crate::logger;
use connection::accept_connection;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Accept connections until the process exits.
///
/// Each accepted connection is served in its own spawned task; the loop
/// itself never blocks on a connection.
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                accept_connection(stream, peer_addr, &state, &active_connections);
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}
