//! Cooperative shutdown.
//!
//! A [`ShutdownToken`] is handed to the event loop explicitly. The only
//! thing the process-boundary signal shim does is flip it; the loop
//! observes it at the top of each iteration and as a wake-up source of
//! the readiness wait.

use std::io;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cloneable, idempotent cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: CancellationToken,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `true` only for the call that flipped
    /// the flag; later calls have no effect.
    pub fn trigger(&self) -> bool {
        if self.inner.is_cancelled() {
            return false;
        }
        self.inner.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once shutdown has been requested.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }
}

/// Wait for SIGINT (or SIGTERM on Unix) and trigger `token`.
///
/// Meant to be spawned next to the event loop. A signal whose handler
/// cannot be installed is never treated as received.
pub async fn listen_for_interrupt(token: ShutdownToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            signal(SignalKind::terminate())?.recv().await;
            Ok::<(), io::Error>(())
        };
        tokio::select! {
            _ = signalled("interrupt", tokio::signal::ctrl_c()) => {}
            _ = signalled("terminate", terminate) => {}
        }
    }
    #[cfg(not(unix))]
    {
        signalled("interrupt", tokio::signal::ctrl_c()).await;
    }

    token.trigger();
}

/// Resolve once `signal` fires. Parks forever if its handler failed to
/// install.
async fn signalled<F>(name: &str, signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("{name} received, shutting down"),
        Err(e) => {
            warn!("cannot listen for {name}: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_untriggered() {
        assert!(!ShutdownToken::new().is_triggered());
    }

    #[test]
    fn trigger_is_idempotent() {
        let token = ShutdownToken::new();
        assert!(token.trigger());
        assert!(!token.trigger());
        assert!(token.is_triggered());
    }

    #[test]
    fn clones_share_state() {
        let token = ShutdownToken::new();
        let shim = token.clone();
        shim.trigger();
        assert!(token.is_triggered());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiter() {
        let token = ShutdownToken::new();
        let waiter = tokio::spawn({
            let token = token.clone();
            async move { token.cancelled().await }
        });
        tokio::task::yield_now().await;
        token.trigger();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("timeout")
            .unwrap();
    }

    #[tokio::test]
    async fn failed_handler_never_resolves() {
        let parked = signalled("interrupt", async {
            Err(io::Error::new(io::ErrorKind::Unsupported, "no signal support"))
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(50), parked)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn delivered_signal_resolves() {
        tokio::time::timeout(Duration::from_secs(5), signalled("interrupt", async { Ok(()) }))
            .await
            .expect("timeout");
    }
}
