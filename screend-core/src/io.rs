//! Exact-length reads and writes over byte streams.
//!
//! Stream sockets deliver data in whatever pieces the kernel hands out.
//! These helpers loop the underlying primitive until the requested count
//! is reached, keeping "clean end of stream" (a short count) distinct
//! from "I/O error".

use std::io::{self, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Fill `buf` completely from `reader`.
///
/// Returns the number of bytes obtained, which is smaller than
/// `buf.len()` only if the peer closed the stream first. Interrupted
/// reads are retried.
pub async fn receive_exact<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Write all of `bytes` to `writer`, then flush.
///
/// Partial writes are transparent to the caller. A write that accepts
/// zero bytes is reported as [`ErrorKind::WriteZero`].
pub async fn send_exact<W>(writer: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut sent = 0;
    while sent < bytes.len() {
        match writer.write(&bytes[sent..]).await {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "peer stopped accepting data",
                ));
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    writer.flush().await
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn reassembles_fragmented_reads() {
        let mut mock = Builder::new().read(b"SC").read(b"R").read(b"EEN").build();
        let mut buf = [0u8; 6];
        let n = receive_exact(&mut mock, &mut buf).await.unwrap();
        assert_eq!(n, 6);
        assert_eq!(&buf, b"SCREEN");
    }

    #[tokio::test]
    async fn short_count_on_end_of_stream() {
        let mut mock = Builder::new().read(b"SCR").build();
        let mut buf = [0u8; 6];
        let n = receive_exact(&mut mock, &mut buf).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..n], b"SCR");
    }

    #[tokio::test]
    async fn zero_on_immediate_close() {
        let mut mock = Builder::new().build();
        let mut buf = [0u8; 6];
        assert_eq!(receive_exact(&mut mock, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn interrupted_read_is_retried() {
        let mut mock = Builder::new()
            .read(b"SCR")
            .read_error(io::Error::new(ErrorKind::Interrupted, "signal"))
            .read(b"EEN")
            .build();
        let mut buf = [0u8; 6];
        assert_eq!(receive_exact(&mut mock, &mut buf).await.unwrap(), 6);
        assert_eq!(&buf, b"SCREEN");
    }

    #[tokio::test]
    async fn read_error_propagates() {
        let mut mock = Builder::new()
            .read(b"S")
            .read_error(io::Error::new(ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut buf = [0u8; 6];
        let err = receive_exact(&mut mock, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionReset);
    }

    #[tokio::test]
    async fn partial_writes_are_completed() {
        let mut mock = Builder::new().write(b"640 ").write(b"480 16\0").build();
        send_exact(&mut mock, b"640 480 16\0").await.unwrap();
    }

    #[tokio::test]
    async fn interrupted_write_is_retried() {
        let mut mock = Builder::new()
            .write_error(io::Error::new(ErrorKind::Interrupted, "signal"))
            .write(b"pixels")
            .build();
        send_exact(&mut mock, b"pixels").await.unwrap();
    }

    #[tokio::test]
    async fn write_error_propagates() {
        let mut mock = Builder::new()
            .write(b"pix")
            .write_error(io::Error::new(ErrorKind::BrokenPipe, "gone"))
            .build();
        let err = send_exact(&mut mock, b"pixels").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn empty_send_only_flushes() {
        let mut mock = Builder::new().build();
        send_exact(&mut mock, b"").await.unwrap();
    }
}
