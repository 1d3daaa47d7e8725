//! # screend-core
//!
//! Core library of the screenshot daemon.
//!
//! This crate contains:
//! - **Reactor**: `EventLoop` — single-threaded readiness loop over one
//!   listening socket and every open client
//! - **Registry**: `ClientRegistry` — slot-based set of open connections
//! - **Protocol**: `ProtocolHandler` — the one-shot `SCREEN` exchange
//! - **I/O**: `receive_exact` / `send_exact` — exact-length stream I/O
//! - **Shutdown**: `ShutdownToken` — cooperative cancellation flag
//! - **Listener**: bind/listen setup and teardown
//! - **Capture**: `ScreenCapture` seam and the Linux frame-buffer capturer
//! - **Client**: `ScreenClient` — consumer side of the protocol
//! - **Error**: `ScreendError` — typed, `thiserror`-based error hierarchy

pub mod capture;
pub mod client;
pub mod error;
pub mod io;
pub mod listener;
pub mod protocol;
pub mod reactor;
pub mod registry;
pub mod shutdown;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capture::{CapturedImage, FramebufferCapture, ScreenCapture};
pub use client::ScreenClient;
pub use error::{CaptureError, ScreendError};
pub use io::{receive_exact, send_exact};
pub use listener::{DEFAULT_BACKLOG, DEFAULT_PORT, TeardownReport, start_listening, teardown};
pub use protocol::{Exchange, ProtocolHandler, ResponseHeader, SCREEN_COMMAND};
pub use reactor::{ClientConnection, EventLoop, LoopState};
pub use registry::{ClientRegistry, SlotId};
pub use shutdown::{ShutdownToken, listen_for_interrupt};
