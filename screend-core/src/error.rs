//! Error types for the screenshot daemon.
//!
//! Every fallible operation in the core returns `Result<T, ScreendError>`.
//! Variants are grouped by blast radius: server-fatal errors stop the
//! event loop, connection-fatal errors end a single client exchange.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// The canonical error type for the screenshot daemon.
#[derive(Debug, Error)]
pub enum ScreendError {
    // ── Server-fatal ─────────────────────────────────────────────
    /// Creating or binding the listening socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Switching the bound socket into listening mode failed.
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a pending connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The readiness wait itself reported an error.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] std::io::Error),

    // ── Connection-fatal ─────────────────────────────────────────
    /// Reading the request from a client failed.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// Writing the response to a client failed.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// The capture collaborator could not produce an image.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    // ── Client-side ──────────────────────────────────────────────
    /// Connecting to a screenshot server failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The response header could not be parsed.
    #[error("malformed response header: {0}")]
    MalformedHeader(String),

    /// The server closed the connection before the full body arrived.
    #[error("short response body: expected {expected} bytes, got {actual}")]
    ShortBody { expected: usize, actual: usize },
}

impl ScreendError {
    /// Whether this error must stop the whole event loop rather than
    /// just the connection it occurred on.
    pub fn is_server_fatal(&self) -> bool {
        matches!(
            self,
            Self::Bind { .. } | Self::Listen { .. } | Self::Accept(_) | Self::Wait(_)
        )
    }
}

// ── CaptureError ─────────────────────────────────────────────────

/// Typed error for the screen capture collaborator.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Reading a device node or sysfs attribute failed.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sysfs attribute did not have the expected shape.
    #[error("invalid attribute {}: {value:?}", path.display())]
    InvalidAttribute { path: PathBuf, value: String },

    /// The device path has no file name to derive the sysfs entry from.
    #[error("cannot derive frame-buffer name from {}", .0.display())]
    UnknownDevice(PathBuf),

    /// Width, height or depth describe an image that cannot be represented.
    #[error("unsupported geometry {width}x{height} at {bits_per_pixel} bpp")]
    UnsupportedGeometry {
        width: u32,
        height: u32,
        bits_per_pixel: u32,
    },

    /// The pixel buffer does not match the declared geometry.
    #[error("pixel buffer is {actual} bytes, geometry requires {expected}")]
    BufferSize { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ScreendError::ShortBody {
            expected: 1000,
            actual: 500,
        };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));

        let e = CaptureError::UnsupportedGeometry {
            width: 10,
            height: 0,
            bits_per_pixel: 12,
        };
        assert_eq!(e.to_string(), "unsupported geometry 10x0 at 12 bpp");
    }

    #[test]
    fn classifies_server_fatal() {
        let io = || std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(ScreendError::Accept(io()).is_server_fatal());
        assert!(ScreendError::Wait(io()).is_server_fatal());
        assert!(!ScreendError::Receive(io()).is_server_fatal());
        assert!(!ScreendError::Send(io()).is_server_fatal());
    }

    #[test]
    fn from_capture() {
        let e: ScreendError = CaptureError::BufferSize {
            expected: 8,
            actual: 4,
        }
        .into();
        assert!(matches!(e, ScreendError::Capture(_)));
        assert!(!e.is_server_fatal());
    }
}
