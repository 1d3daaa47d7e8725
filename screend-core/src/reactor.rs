//! Single-threaded readiness reactor.
//!
//! ```text
//!            ┌────────────────────── Running ─────────────────────┐
//!            │                                                    │
//!            │  shutdown? ──yes──────────────────────────┐        │
//!            │     │ no                                  │        │
//!            │     ▼                                     │        │
//!            │  wait(token ∪ listener ∪ open clients)    │        │
//!            │     │ interrupted → re-loop               │        │
//!            │     ▼                                     │        │
//!            │  serve + close each ready client          │        │
//!            │  register accepted connection             │        │
//!            └───────────────────────────────────────────┼────────┘
//!                                                        ▼
//!                                   ShuttingDown ──teardown──► Stopped
//! ```
//!
//! One readiness wait per iteration covers the cancellation token, the
//! listening socket and every open client. Clients are served one after
//! another inside the iteration and closed after their single exchange.
//! Accept and wait failures are server-fatal; teardown still runs.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::task::Poll;

use futures::future::poll_fn;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::capture::ScreenCapture;
use crate::error::ScreendError;
use crate::listener::{TeardownReport, teardown};
use crate::protocol::{Exchange, ProtocolHandler};
use crate::registry::{ClientRegistry, SlotId};
use crate::shutdown::ShutdownToken;

// ── LoopState ────────────────────────────────────────────────────

/// Lifecycle of an [`EventLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Accepting and serving clients. Initial state.
    #[default]
    Running,
    /// Loop exited; teardown in progress.
    ShuttingDown,
    /// Teardown finished. Terminal state.
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

// ── ClientConnection ─────────────────────────────────────────────

/// An accepted client socket awaiting its request.
#[derive(Debug)]
pub struct ClientConnection {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
}

impl ClientConnection {
    pub fn new(id: u64, peer: SocketAddr, stream: TcpStream) -> Self {
        Self { id, peer, stream }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Shut down the write side and release the socket.
    ///
    /// Consumes the connection, so a socket is closed at most once.
    pub async fn close(mut self) -> io::Result<()> {
        let result = self.stream.shutdown().await;
        drop(self.stream);
        match result {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

// ── Readiness ────────────────────────────────────────────────────

/// Result of one readiness wait.
enum Wakeup {
    /// The shutdown token fired while waiting.
    Interrupted,
    Ready {
        clients: Vec<SlotId>,
        incoming: Option<io::Result<(TcpStream, SocketAddr)>>,
    },
    Failed(io::Error),
}

// ── EventLoop ────────────────────────────────────────────────────

/// Owns the listening socket and every open client connection.
pub struct EventLoop<C> {
    listener: TcpListener,
    clients: ClientRegistry<ClientConnection>,
    handler: ProtocolHandler<C>,
    shutdown: ShutdownToken,
    state: LoopState,
    next_id: u64,
}

impl<C: ScreenCapture> EventLoop<C> {
    pub fn new(listener: TcpListener, handler: ProtocolHandler<C>, shutdown: ShutdownToken) -> Self {
        Self {
            listener,
            clients: ClientRegistry::new(),
            handler,
            shutdown,
            state: LoopState::Running,
            next_id: 1,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve clients until shutdown, then tear down.
    ///
    /// Returns the teardown summary on a clean shutdown, or the
    /// server-fatal error that stopped the loop. Teardown runs in both
    /// cases.
    pub async fn run(mut self) -> Result<TeardownReport, ScreendError> {
        info!("event loop started");
        let outcome = self.serve().await;
        match &outcome {
            Ok(()) => info!("shutdown requested"),
            Err(e) => error!("event loop failed: {e}"),
        }

        self.state = LoopState::ShuttingDown;
        debug!("event loop {}", self.state);
        let report = teardown(self.listener, self.clients).await;
        self.state = LoopState::Stopped;
        debug!("event loop {}", self.state);

        outcome.map(|()| report)
    }

    async fn serve(&mut self) -> Result<(), ScreendError> {
        while !self.shutdown.is_triggered() {
            let (ready, incoming) = match self.wait().await {
                Wakeup::Interrupted => continue,
                Wakeup::Failed(e) => return Err(ScreendError::Wait(e)),
                Wakeup::Ready { clients, incoming } => (clients, incoming),
            };

            for slot in ready {
                self.serve_client(slot).await;
            }

            if let Some(accepted) = incoming {
                let (stream, peer) = accepted.map_err(ScreendError::Accept)?;
                self.register(stream, peer);
            }
        }
        Ok(())
    }

    /// Block until the token fires, a client becomes readable, or a
    /// connection is pending on the listener.
    async fn wait(&self) -> Wakeup {
        let cancelled = self.shutdown.cancelled();
        tokio::pin!(cancelled);

        poll_fn(|cx| {
            if cancelled.as_mut().poll(cx).is_ready() {
                return Poll::Ready(Wakeup::Interrupted);
            }

            let mut clients = Vec::new();
            for (slot, conn) in self.clients.iter() {
                match conn.stream.poll_read_ready(cx) {
                    Poll::Ready(Ok(())) => clients.push(slot),
                    Poll::Ready(Err(e)) => return Poll::Ready(Wakeup::Failed(e)),
                    Poll::Pending => {}
                }
            }

            let incoming = match self.listener.poll_accept(cx) {
                Poll::Ready(result) => Some(result),
                Poll::Pending => None,
            };

            if clients.is_empty() && incoming.is_none() {
                Poll::Pending
            } else {
                Poll::Ready(Wakeup::Ready { clients, incoming })
            }
        })
        .await
    }

    /// Run one exchange on `slot`, then close it whatever the outcome.
    async fn serve_client(&mut self, slot: SlotId) {
        let Some(mut conn) = self.clients.take(slot) else {
            return;
        };
        debug!(conn = conn.id, peer = %conn.peer, %slot, "client readable");

        match self.handler.handle(&mut conn.stream, &self.shutdown).await {
            Ok(Exchange::Served { header, body_len }) => info!(
                conn = conn.id,
                peer = %conn.peer,
                "sent {}x{}@{} screenshot ({body_len} bytes)",
                header.width,
                header.height,
                header.bits_per_pixel
            ),
            Ok(Exchange::Ignored) => debug!(conn = conn.id, "unknown request ignored"),
            Ok(Exchange::PeerClosed { received }) => {
                debug!(conn = conn.id, received, "peer closed before full request")
            }
            Ok(Exchange::Interrupted) => debug!(conn = conn.id, "request interrupted by shutdown"),
            Err(e) => warn!(conn = conn.id, peer = %conn.peer, "connection error: {e}"),
        }

        let id = conn.id;
        if let Err(e) = conn.close().await {
            warn!(conn = id, "close failed: {e}");
        }
    }

    fn register(&mut self, stream: TcpStream, peer: SocketAddr) {
        let id = self.next_id;
        self.next_id += 1;
        let slot = self.clients.add(ClientConnection::new(id, peer, stream));
        debug!(conn = id, %peer, %slot, open = self.clients.len(), "connection accepted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_state_display() {
        assert_eq!(LoopState::default(), LoopState::Running);
        assert_eq!(LoopState::ShuttingDown.to_string(), "ShuttingDown");
        assert_eq!(LoopState::Stopped.to_string(), "Stopped");
    }

    #[tokio::test]
    async fn new_loop_reports_bound_port() {
        let listener = crate::listener::start_listening("127.0.0.1:0".parse().unwrap(), 1).unwrap();
        let handler = ProtocolHandler::new(crate::capture::FramebufferCapture::default(), "/dev/fb0");
        let event_loop = EventLoop::new(listener, handler, ShutdownToken::new());
        assert_eq!(event_loop.state, LoopState::Running);
        assert_ne!(event_loop.local_addr().unwrap().port(), 0);
    }
}
