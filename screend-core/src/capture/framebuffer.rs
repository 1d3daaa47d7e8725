//! Linux frame-buffer screen capture.
//!
//! Geometry comes from the sysfs entry that mirrors the device node
//! (`/dev/graphics/fb0` → `/sys/class/graphics/fb0`):
//!
//! | Attribute        | Example           | Used for                         |
//! |------------------|-------------------|----------------------------------|
//! | `modes`          | `U:1080x1920p-60` | visible resolution (preferred)   |
//! | `virtual_size`   | `1080,3840`       | resolution fallback              |
//! | `bits_per_pixel` | `32`              | depth                            |
//! | `stride`         | `4352`            | row pitch in bytes (optional)    |
//! | `pan`            | `0,1920`          | visible page offset (optional)   |
//!
//! Double-buffered devices expose a virtual area larger than the screen;
//! the visible page starts at the `pan` offset.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::capture::{CapturedImage, ScreenCapture};
use crate::error::CaptureError;

/// Default location of frame-buffer class entries.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/graphics";

// ── FramebufferGeometry ──────────────────────────────────────────

/// Layout of the visible page inside the frame-buffer device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Row pitch in bytes (may exceed `width * bits_per_pixel / 8`).
    pub stride: usize,
    pub x_offset: u32,
    pub y_offset: u32,
}

impl FramebufferGeometry {
    /// Packed bytes per visible row.
    pub fn row_len(&self) -> Result<usize, CaptureError> {
        CapturedImage::byte_len_for(self.width, 1, self.bits_per_pixel)
    }

    /// Byte offset of the first visible pixel in the device.
    pub fn start_offset(&self) -> u64 {
        self.y_offset as u64 * self.stride as u64
            + self.x_offset as u64 * (self.bits_per_pixel / 8) as u64
    }
}

// ── FramebufferCapture ───────────────────────────────────────────

/// Captures the visible page of a Linux frame-buffer device.
#[derive(Debug, Clone)]
pub struct FramebufferCapture {
    sysfs_root: PathBuf,
}

impl Default for FramebufferCapture {
    fn default() -> Self {
        Self::with_sysfs_root(DEFAULT_SYSFS_ROOT)
    }
}

impl FramebufferCapture {
    /// Look up geometry under `sysfs_root` instead of the system default.
    pub fn with_sysfs_root(sysfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
        }
    }

    /// Resolve the geometry of `device` from its sysfs entry.
    pub async fn geometry(&self, device: &Path) -> Result<FramebufferGeometry, CaptureError> {
        let name = device
            .file_name()
            .ok_or_else(|| CaptureError::UnknownDevice(device.to_path_buf()))?;
        let dir = self.sysfs_root.join(name);

        let virtual_path = dir.join("virtual_size");
        let virtual_size = read_attr(&virtual_path).await?;
        let (virtual_width, virtual_height) = parse_pair(&virtual_path, &virtual_size, ',')?;

        let (width, height) = match read_optional_attr(&dir.join("modes")).await? {
            Some(modes) => match parse_mode(&modes) {
                Some(res) => res,
                None => (virtual_width, virtual_height),
            },
            None => (virtual_width, virtual_height),
        };

        let bpp_path = dir.join("bits_per_pixel");
        let bpp_text = read_attr(&bpp_path).await?;
        let bits_per_pixel = parse_number(&bpp_path, &bpp_text)?;

        let packed = CapturedImage::byte_len_for(width, 1, bits_per_pixel)?;
        let stride_path = dir.join("stride");
        let stride = match read_optional_attr(&stride_path).await? {
            Some(text) => match parse_number(&stride_path, &text)? {
                0 => packed,
                n => n as usize,
            },
            None => packed,
        };
        if stride < packed {
            return Err(CaptureError::InvalidAttribute {
                path: stride_path,
                value: stride.to_string(),
            });
        }

        let pan_path = dir.join("pan");
        let (x_offset, y_offset) = match read_optional_attr(&pan_path).await? {
            Some(text) => parse_pair(&pan_path, &text, ',')?,
            None => (0, 0),
        };

        Ok(FramebufferGeometry {
            width,
            height,
            bits_per_pixel,
            stride,
            x_offset,
            y_offset,
        })
    }

    async fn read_page(
        &self,
        device: &Path,
        geometry: &FramebufferGeometry,
    ) -> Result<Vec<u8>, CaptureError> {
        let io_err = |source| CaptureError::Io {
            path: device.to_path_buf(),
            source,
        };

        let row_len = geometry.row_len()?;
        let total = CapturedImage::byte_len_for(
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel,
        )?;
        let padding = (geometry.stride - row_len) as i64;

        let mut file = tokio::fs::File::open(device).await.map_err(io_err)?;
        file.seek(SeekFrom::Start(geometry.start_offset()))
            .await
            .map_err(io_err)?;

        let mut pixels = vec![0u8; total];
        if row_len == 0 {
            return Ok(pixels);
        }
        let last = (geometry.height as usize).saturating_sub(1);
        for (y, row) in pixels.chunks_mut(row_len).enumerate() {
            file.read_exact(row).await.map_err(io_err)?;
            if padding > 0 && y < last {
                file.seek(SeekFrom::Current(padding))
                    .await
                    .map_err(io_err)?;
            }
        }
        Ok(pixels)
    }
}

#[async_trait]
impl ScreenCapture for FramebufferCapture {
    async fn capture(&self, device: &Path) -> Result<CapturedImage, CaptureError> {
        let geometry = self.geometry(device).await?;
        debug!(device = %device.display(), ?geometry, "reading frame buffer");
        let pixels = self.read_page(device, &geometry).await?;
        CapturedImage::new(
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel,
            pixels,
        )
    }
}

// ── sysfs helpers ────────────────────────────────────────────────

async fn read_attr(path: &Path) -> Result<String, CaptureError> {
    tokio::fs::read_to_string(path)
        .await
        .map(|s| s.trim().to_string())
        .map_err(|source| CaptureError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn read_optional_attr(path: &Path) -> Result<Option<String>, CaptureError> {
    match tokio::fs::read_to_string(path).await {
        Ok(s) if s.trim().is_empty() => Ok(None),
        Ok(s) => Ok(Some(s.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CaptureError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_number(path: &Path, text: &str) -> Result<u32, CaptureError> {
    text.trim()
        .parse()
        .map_err(|_| CaptureError::InvalidAttribute {
            path: path.to_path_buf(),
            value: text.to_string(),
        })
}

fn parse_pair(path: &Path, text: &str, sep: char) -> Result<(u32, u32), CaptureError> {
    let invalid = || CaptureError::InvalidAttribute {
        path: path.to_path_buf(),
        value: text.to_string(),
    };
    let (a, b) = text.split_once(sep).ok_or_else(invalid)?;
    let a = a.trim().parse().map_err(|_| invalid())?;
    let b = b.trim().parse().map_err(|_| invalid())?;
    Ok((a, b))
}

/// Parse the first entry of a `modes` attribute, e.g. `U:1080x1920p-60`.
fn parse_mode(modes: &str) -> Option<(u32, u32)> {
    let first = modes.lines().next()?.trim();
    let mode = first.split_once(':').map_or(first, |(_, rest)| rest);
    let (w, rest) = mode.split_once('x')?;
    let h: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((w.parse().ok()?, h.parse().ok()?))
}

// ── Tests ────────────────────────────────────────────────────────
