//! Screen capture collaborator.
//!
//! The daemon only needs "give me the current screen of this device";
//! [`ScreenCapture`] is that seam. [`FramebufferCapture`] is the Linux
//! frame-buffer implementation used by the `screend` binary.

pub mod framebuffer;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

use crate::error::CaptureError;

pub use framebuffer::{FramebufferCapture, FramebufferGeometry};
pub use types::CapturedImage;

/// Produces a fresh [`CapturedImage`] for a capture device.
///
/// Called once per `SCREEN` request; implementations must not cache.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self, device: &Path) -> Result<CapturedImage, CaptureError>;
}
