//! Screenshot daemon lifecycle.
//!
//! Binds the listener, wires the frame-buffer capturer into the protocol
//! handler and runs the event loop until the shutdown token fires.

use tracing::info;

use screend_core::{
    EventLoop, FramebufferCapture, ProtocolHandler, ScreendError, ShutdownToken, TeardownReport,
    start_listening,
};

use crate::config::ServerConfig;

// ── ScreenshotService ────────────────────────────────────────────

/// The top-level screenshot service.
pub struct ScreenshotService {
    config: ServerConfig,
    shutdown: ShutdownToken,
}

impl ScreenshotService {
    /// Create a new service with the given config.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownToken::new(),
        }
    }

    /// Obtain a handle that stops the service when triggered.
    pub fn shutdown_handle(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the service until shutdown or a server-fatal error.
    ///
    /// 1. Binds the listening socket (fatal on failure).
    /// 2. Serves `SCREEN` requests from the configured device.
    /// 3. Closes every connection once the shutdown handle fires.
    pub async fn run(self) -> Result<TeardownReport, ScreendError> {
        let listener = start_listening(self.config.listen_addr(), self.config.backlog())?;

        let capture = FramebufferCapture::with_sysfs_root(&self.config.capture.sysfs_root);
        let handler = ProtocolHandler::new(capture, &self.config.capture.device);
        info!("capture device: {}", handler.device().display());

        let report = EventLoop::new(listener, handler, self.shutdown).run().await?;
        info!("screenshot service stopped");
        Ok(report)
    }
}

// ── Tests ────────────────────────────────────────────────────────
