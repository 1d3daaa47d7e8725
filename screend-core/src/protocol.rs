//! The `SCREEN` request/response protocol.
//!
//! # Wire Protocol
//!
//! ```text
//! Client ──[ "SCREEN" (6 bytes, no terminator) ]──────────► Server
//!
//! Server ──[ "<width> <height> <bpp>" \0 ]────────────────► Client
//! Server ──[ width * height * bpp / 8 raw pixel bytes ]───► Client
//! ```
//!
//! Anything other than the exact command gets no reply. Every connection
//! carries exactly one exchange and is closed afterwards.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::capture::{CapturedImage, ScreenCapture};
use crate::error::ScreendError;
use crate::io::{receive_exact, send_exact};
use crate::shutdown::ShutdownToken;

/// The only request the server understands.
pub const SCREEN_COMMAND: &[u8; 6] = b"SCREEN";

/// Upper bound on the encoded header, terminator included.
pub const MAX_HEADER_LEN: usize = 64;

// ── ResponseHeader ───────────────────────────────────────────────

/// Image geometry sent ahead of the pixel body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
}

impl ResponseHeader {
    pub fn for_image(image: &CapturedImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            bits_per_pixel: image.bits_per_pixel(),
        }
    }

    /// Decimal text plus the terminating NUL byte.
    pub fn encode(&self) -> Vec<u8> {
        let mut out =
            format!("{} {} {}", self.width, self.height, self.bits_per_pixel).into_bytes();
        out.push(0);
        out
    }

    /// Parse a header, with or without its trailing NUL.
    pub fn decode(bytes: &[u8]) -> Result<Self, ScreendError> {
        let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ScreendError::MalformedHeader("header is not ASCII".into()))?;

        let fields: Vec<&str> = text.split(' ').collect();
        let [width, height, bits_per_pixel] = fields[..] else {
            return Err(ScreendError::MalformedHeader(format!(
                "expected 3 fields in {text:?}"
            )));
        };
        let parse = |f: &str| {
            f.parse::<u32>()
                .map_err(|_| ScreendError::MalformedHeader(format!("bad field {f:?} in {text:?}")))
        };
        Ok(Self {
            width: parse(width)?,
            height: parse(height)?,
            bits_per_pixel: parse(bits_per_pixel)?,
        })
    }

    /// Body length announced by this header.
    pub fn body_len(&self) -> Result<usize, ScreendError> {
        Ok(CapturedImage::byte_len_for(
            self.width,
            self.height,
            self.bits_per_pixel,
        )?)
    }
}

// ── Exchange ─────────────────────────────────────────────────────

/// Non-error outcome of one request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// A screenshot was captured and sent in full.
    Served { header: ResponseHeader, body_len: usize },
    /// The request did not match [`SCREEN_COMMAND`]; nothing was sent.
    Ignored,
    /// The peer closed the stream after `received` bytes of the request.
    PeerClosed { received: usize },
    /// Shutdown was requested while waiting for the request.
    Interrupted,
}

// ── ProtocolHandler ──────────────────────────────────────────────

/// Serves a single `SCREEN` exchange on a ready client stream.
pub struct ProtocolHandler<C> {
    capture: C,
    device: PathBuf,
}

impl<C: ScreenCapture> ProtocolHandler<C> {
    pub fn new(capture: C, device: impl Into<PathBuf>) -> Self {
        Self {
            capture,
            device: device.into(),
        }
    }

    /// Device the handler captures from.
    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Read one request from `stream` and answer it.
    ///
    /// Errors are connection-fatal: the caller closes the stream either way.
    pub async fn handle<S>(
        &self,
        stream: &mut S,
        shutdown: &ShutdownToken,
    ) -> Result<Exchange, ScreendError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Buffered request bytes win over a pending shutdown; the token only
        // ends a read that is parked waiting for the peer.
        let mut request = [0u8; SCREEN_COMMAND.len()];
        let received = tokio::select! {
            biased;
            r = receive_exact(stream, &mut request) => r.map_err(ScreendError::Receive)?,
            _ = shutdown.cancelled() => return Ok(Exchange::Interrupted),
        };

        if received < request.len() {
            return Ok(Exchange::PeerClosed { received });
        }
        if &request != SCREEN_COMMAND {
            debug!(request = ?String::from_utf8_lossy(&request), "ignoring unknown request");
            return Ok(Exchange::Ignored);
        }

        debug!(device = %self.device.display(), "taking screenshot");
        let image = self.capture.capture(&self.device).await?;
        let header = ResponseHeader::for_image(&image);

        send_exact(stream, &header.encode())
            .await
            .map_err(ScreendError::Send)?;
        send_exact(stream, image.pixels())
            .await
            .map_err(ScreendError::Send)?;

        Ok(Exchange::Served {
            header,
            body_len: image.pixels().len(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
