use std::path::PathBuf;

/// Mip chain cap handed to texture creation. Total levels, base included.
pub const MIPMAP_LEVELS: u32 = 30;

const MIB: usize = 1024 * 1024;

/// Sample configuration.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Size of the process-lifetime scratch arena.
    pub arena_capacity: usize,
    /// Arena block reserved for one image load (file bytes + decoded pixels).
    pub image_staging_bytes: usize,
    pub mipmap_levels: u32,
    /// Uniform scale applied to the quad on X and Y.
    pub zoom: f32,
    pub clear_color: [f32; 4],

    pub asset_root: PathBuf,
    pub image_asset: String,
    pub vertex_shader_asset: String,
    pub fragment_shader_asset: String,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            arena_capacity: 10 * MIB,
            image_staging_bytes: 5 * MIB,
            mipmap_levels: MIPMAP_LEVELS,
            zoom: 0.8,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            asset_root: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")),
            image_asset: "icons.k".to_string(),
            vertex_shader_asset: "texture.vert".to_string(),
            fragment_shader_asset: "texture.frag".to_string(),
        }
    }
}

impl SampleConfig {
    /// Default config with the asset root replaced by the first CLI argument,
    /// when one is given.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = args.nth(1) {
            config.asset_root = PathBuf::from(root);
        }
        config
    }
}
