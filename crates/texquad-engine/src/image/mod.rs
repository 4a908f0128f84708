//! CPU-side images.
//!
//! Decoding writes pixels into caller-provided memory (normally an arena
//! block), so an `Image` is a borrowed RGBA8 view. Mip levels are generated
//! into owned buffers.

mod decode;
mod error;
mod mipmap;

pub use decode::{decode_into, ImageContainer};
pub use error::ImageError;
pub use mipmap::{full_mip_chain_len, MipChain, MipLevel};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Copy, Clone)]
pub struct Image<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> Image<'a> {
    /// Wraps RGBA8 pixels. `pixels.len()` must equal `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self, ImageError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(ImageError::Malformed(format!(
                "{width}x{height} image needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Bytes per row of the base level.
    pub fn stride(&self) -> u32 {
        self.width * BYTES_PER_PIXEL as u32
    }
}
