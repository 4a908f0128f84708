/// Texture coordinate wrapping outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TextureAddressing {
    #[default]
    Repeat,
    Mirror,
    Clamp,
}

/// Texture coordinate axis addressed by `Graphics::set_texture_addressing`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureDirection {
    U,
    V,
}

/// Texel filter for minification/magnification.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TextureFilter {
    #[default]
    Point,
    Linear,
}

/// Filter between mip levels. `None` samples the base level only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum MipmapFilter {
    #[default]
    None,
    Point,
    Linear,
}

/// Sampling parameters of one texture unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct SamplerState {
    pub address_u: TextureAddressing,
    pub address_v: TextureAddressing,
    pub minification: TextureFilter,
    pub magnification: TextureFilter,
    pub mipmap: MipmapFilter,
}

impl SamplerState {
    pub(crate) fn descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        let (mipmap_filter, lod_max_clamp) = match self.mipmap {
            MipmapFilter::None => (wgpu::MipmapFilterMode::Nearest, 0.0),
            MipmapFilter::Point => (wgpu::MipmapFilterMode::Nearest, 32.0),
            MipmapFilter::Linear => (wgpu::MipmapFilterMode::Linear, 32.0),
        };

        wgpu::SamplerDescriptor {
            label: Some("texquad sampler"),
            address_mode_u: address_mode(self.address_u),
            address_mode_v: address_mode(self.address_v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(self.magnification),
            min_filter: filter_mode(self.minification),
            mipmap_filter,
            lod_min_clamp: 0.0,
            lod_max_clamp,
            ..Default::default()
        }
    }
}

fn address_mode(a: TextureAddressing) -> wgpu::AddressMode {
    match a {
        TextureAddressing::Repeat => wgpu::AddressMode::Repeat,
        TextureAddressing::Mirror => wgpu::AddressMode::MirrorRepeat,
        TextureAddressing::Clamp => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(f: TextureFilter) -> wgpu::FilterMode {
    match f {
        TextureFilter::Point => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}
