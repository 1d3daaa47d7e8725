//! # screend — Screenshot Daemon
//!
//! Serves frame-buffer screenshots over TCP. A client connects, sends
//! `SCREEN`, and receives `"<width> <height> <bpp>\0"` followed by the raw
//! pixels; the connection is then closed.
//!
//! ## Modes
//!
//! - **Serve** (default): run the event loop until SIGINT/SIGTERM.
//! - **Fetch**: act as a client against a running daemon and dump the
//!   raw pixels to a file.
//! - **Gen-config**: print the default configuration.

pub mod config;
pub mod service;
