//! Captured image type handed from the capture collaborator to the
//! protocol handler.

use crate::error::CaptureError;

// ── CapturedImage ────────────────────────────────────────────────

/// A raw, uncompressed screen capture.
///
/// The pixel buffer always holds exactly `width * height * bits_per_pixel / 8`
/// bytes, rows packed without padding. Pixel layout is whatever the
/// device produced and is opaque to the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    pixels: Vec<u8>,
}

impl CapturedImage {
    /// Build an image, checking the buffer against the declared geometry.
    pub fn new(
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, CaptureError> {
        let expected = Self::byte_len_for(width, height, bits_per_pixel)?;
        if pixels.len() != expected {
            return Err(CaptureError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bits_per_pixel,
            pixels,
        })
    }

    /// Number of body bytes an image of this geometry occupies.
    ///
    /// Depth must be a non-zero multiple of 8 and the product must fit
    /// in memory.
    pub fn byte_len_for(
        width: u32,
        height: u32,
        bits_per_pixel: u32,
    ) -> Result<usize, CaptureError> {
        let unsupported = || CaptureError::UnsupportedGeometry {
            width,
            height,
            bits_per_pixel,
        };
        if bits_per_pixel == 0 || bits_per_pixel % 8 != 0 {
            return Err(unsupported());
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(bits_per_pixel as usize / 8))
            .ok_or_else(unsupported)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per pixel.
    pub fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_buffer() {
        let img = CapturedImage::new(4, 2, 16, vec![0; 16]).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 2);
        assert_eq!(img.bits_per_pixel(), 16);
        assert_eq!(img.pixels().len(), 16);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let err = CapturedImage::new(4, 2, 32, vec![0; 16]).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::BufferSize {
                expected: 32,
                actual: 16
            }
        ));
    }

    #[test]
    fn rejects_odd_depths() {
        assert!(CapturedImage::byte_len_for(4, 4, 0).is_err());
        assert!(CapturedImage::byte_len_for(4, 4, 12).is_err());
        assert_eq!(CapturedImage::byte_len_for(4, 4, 24).unwrap(), 48);
    }

    #[test]
    fn empty_image_is_valid() {
        let img = CapturedImage::new(0, 0, 32, Vec::new()).unwrap();
        assert!(img.pixels().is_empty());
    }
}
