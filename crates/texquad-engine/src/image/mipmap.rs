use ::image::imageops::{self, FilterType};
use ::image::{ImageBuffer, Rgba, RgbaImage};

use super::Image;

/// One generated mip level (RGBA8, tightly packed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Number of levels in a complete chain down to 1x1, base included.
pub fn full_mip_chain_len(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Downsampled levels below a base image.
///
/// The base level itself is not copied; `levels()[0]` is mip level 1.
#[derive(Debug, Clone)]
pub struct MipChain {
    levels: Vec<MipLevel>,
}

impl MipChain {
    /// Builds successive half-size levels with a triangle filter.
    ///
    /// `max_levels` caps the total level count (base included); it is clamped
    /// to `[1, full_mip_chain_len]`.
    pub fn generate(image: &Image<'_>, max_levels: u32) -> Self {
        let count = max_levels.clamp(1, full_mip_chain_len(image.width(), image.height()));
        let mut levels = Vec::with_capacity(count as usize - 1);

        let Some(base) = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(
            image.width(),
            image.height(),
            image.pixels(),
        ) else {
            log::warn!("mip generation skipped: base image does not match its dimensions");
            return Self { levels };
        };

        let mut prev: Option<RgbaImage> = None;
        for _ in 1..count {
            let (w, h) = match &prev {
                Some(p) => p.dimensions(),
                None => base.dimensions(),
            };
            let (nw, nh) = ((w / 2).max(1), (h / 2).max(1));

            let next = match &prev {
                Some(p) => imageops::resize(p, nw, nh, FilterType::Triangle),
                None => imageops::resize(&base, nw, nh, FilterType::Triangle),
            };

            levels.push(MipLevel {
                width: nw,
                height: nh,
                pixels: next.as_raw().clone(),
            });
            prev = Some(next);
        }

        Self { levels }
    }

    /// Total level count, base included.
    pub fn level_count(&self) -> u32 {
        1 + self.levels.len() as u32
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }
}
