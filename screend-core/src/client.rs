//! Client side of the `SCREEN` protocol.
//!
//! Connects, sends the command, reads the NUL-terminated header and then
//! exactly as many body bytes as the header announces.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::capture::CapturedImage;
use crate::error::ScreendError;
use crate::io::{receive_exact, send_exact};
use crate::protocol::{MAX_HEADER_LEN, ResponseHeader, SCREEN_COMMAND};

/// Fetches screenshots from a running daemon.
#[derive(Debug, Clone, Copy)]
pub struct ScreenClient {
    addr: SocketAddr,
}

impl ScreenClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Request one screenshot over a fresh connection.
    pub async fn fetch(&self) -> Result<CapturedImage, ScreendError> {
        let mut stream = TcpStream::connect(self.addr)
            .await
            .map_err(|source| ScreendError::Connect {
                addr: self.addr,
                source,
            })?;
        debug!("connected to {}", self.addr);
        request_screenshot(&mut stream).await
    }
}

/// Run one exchange over an already-connected stream.
pub async fn request_screenshot<S>(stream: &mut S) -> Result<CapturedImage, ScreendError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send_exact(stream, SCREEN_COMMAND)
        .await
        .map_err(ScreendError::Send)?;

    let header = read_header(stream).await?;
    let expected = header.body_len()?;

    let mut body = vec![0u8; expected];
    let actual = receive_exact(stream, &mut body)
        .await
        .map_err(ScreendError::Receive)?;
    if actual < expected {
        return Err(ScreendError::ShortBody { expected, actual });
    }

    Ok(CapturedImage::new(
        header.width,
        header.height,
        header.bits_per_pixel,
        body,
    )?)
}

/// Read header bytes up to and including the NUL terminator.
///
/// Reads one byte at a time so no body bytes are consumed.
async fn read_header<S>(stream: &mut S) -> Result<ResponseHeader, ScreendError>
where
    S: AsyncRead + Unpin,
{
    let mut raw = Vec::with_capacity(16);
    loop {
        let byte = match stream.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ScreendError::MalformedHeader(format!(
                    "connection closed after {} header bytes",
                    raw.len()
                )));
            }
            Err(e) => return Err(ScreendError::Receive(e)),
        };
        if byte == 0 {
            break;
        }
        raw.push(byte);
        if raw.len() >= MAX_HEADER_LEN {
            return Err(ScreendError::MalformedHeader(format!(
                "no terminator within {MAX_HEADER_LEN} bytes"
            )));
        }
    }
    ResponseHeader::decode(&raw)
}
