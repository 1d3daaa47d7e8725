//! Listening socket setup and final teardown.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, info, warn};

use crate::error::ScreendError;
use crate::reactor::ClientConnection;
use crate::registry::ClientRegistry;

/// Port the daemon listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 42380;

/// Pending-connection backlog passed to `listen(2)`.
pub const DEFAULT_BACKLOG: u32 = 5;

/// Create a stream socket bound to `addr` and start listening.
///
/// Every failure here is fatal to startup.
pub fn start_listening(addr: SocketAddr, backlog: u32) -> Result<TcpListener, ScreendError> {
    let bind_err = |source| ScreendError::Bind { addr, source };

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(bind_err)?;
    debug!("socket created");

    socket.set_reuseaddr(true).map_err(bind_err)?;
    socket.bind(addr).map_err(bind_err)?;
    debug!("socket bound to {addr}");

    let listener = socket
        .listen(backlog)
        .map_err(|source| ScreendError::Listen { addr, source })?;
    match listener.local_addr() {
        Ok(local) => info!("listening on {local}"),
        Err(_) => info!("listening on {addr}"),
    }
    Ok(listener)
}

// ── Teardown ─────────────────────────────────────────────────────

/// Summary of a completed teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Client connections that were still open at shutdown.
    pub clients_closed: usize,
    /// How many of those reported an error while closing.
    pub close_failures: usize,
}

/// Close every remaining client, then the listening socket.
///
/// A failing close is logged and counted; the remaining sockets are
/// still closed.
pub async fn teardown(
    listener: TcpListener,
    mut clients: ClientRegistry<ClientConnection>,
) -> TeardownReport {
    info!("shutdown: closing {} client connection(s)", clients.len());

    let mut report = TeardownReport::default();
    for conn in clients.drain() {
        report.clients_closed += 1;
        let id = conn.id();
        if let Err(e) = conn.close().await {
            report.close_failures += 1;
            warn!(conn = id, "close failed: {e}");
        }
    }

    debug!("closing listening socket");
    drop(listener);

    info!(
        closed = report.clients_closed,
        failures = report.close_failures,
        "shutdown complete"
    );
    report
}
