use std::sync::atomic::{AtomicU64, Ordering};

use crate::image::{Image, MipChain};

use super::RenderCtx;

/// Process-unique texture identity, used to key cached bind groups.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Immutable sampled RGBA8 (sRGB) texture with a full or capped mip chain.
pub struct Texture {
    id: TextureId,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Texture {
    /// Uploads `image` as level 0 and `mips` as the levels below it.
    pub fn from_image(ctx: &RenderCtx<'_>, image: &Image<'_>, mips: &MipChain, label: &str) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let base = (image.width(), image.height(), image.stride());
        write_level(ctx, &texture, 0, base, image.pixels());
        for (i, level) in mips.levels().iter().enumerate() {
            let stride = level.width * crate::image::BYTES_PER_PIXEL as u32;
            write_level(ctx, &texture, i as u32 + 1, (level.width, level.height, stride), &level.pixels);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!(
            "texture {label}: {}x{}, {} mip levels",
            image.width(),
            image.height(),
            mips.level_count()
        );

        Self {
            id: TextureId::next(),
            texture,
            view,
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mip_level_count(&self) -> u32 {
        self.texture.mip_level_count()
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

fn write_level(
    ctx: &RenderCtx<'_>,
    texture: &wgpu::Texture,
    mip_level: u32,
    (width, height, bytes_per_row): (u32, u32, u32),
    pixels: &[u8],
) {
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}
