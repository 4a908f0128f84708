use anyhow::{Context, Result};

use texquad_engine::image::MipChain;
use texquad_engine::io::FileRoots;
use texquad_engine::memory::Arena;
use texquad_engine::render::{
    ConstantLocation, IndexBuffer, Pipeline, PipelineDesc, RenderCtx, Shader, ShaderStage,
    Texture, TextureUnit, Usage, VertexBuffer, VertexData, VertexStructure,
};

use crate::assets::{load_image, load_shader_source};
use crate::config::SampleConfig;

/// Interleaved `(x, y, u, v)` quad. V is flipped against Y so image row 0
/// lands at the top.
pub const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 1.0, //
    1.0, -1.0, 1.0, 1.0, //
    -1.0, 1.0, 0.0, 0.0, //
    1.0, 1.0, 1.0, 0.0,
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 2, 3];

pub const TEXTURE_UNIT_NAME: &str = "texsampler";
pub const TRANSFORM_NAME: &str = "mvp";

/// `pos` then `tex`, both float2.
pub fn quad_layout() -> VertexStructure {
    let mut structure = VertexStructure::new();
    structure.add("pos", VertexData::Float2);
    structure.add("tex", VertexData::Float2);
    structure
}

/// Every GPU object the frame loop draws with. Built once, read-only after.
pub struct Scene {
    pub texture: Texture,
    #[allow(dead_code)]
    pub vertex_shader: Shader,
    #[allow(dead_code)]
    pub fragment_shader: Shader,
    pub pipeline: Pipeline,
    pub vertices: VertexBuffer,
    pub indices: IndexBuffer,
    pub texture_unit: TextureUnit,
    pub transform: ConstantLocation,
}

impl Scene {
    /// Loads the assets and builds the scene.
    ///
    /// Steps run in dependency order; the first failure aborts setup.
    pub fn setup(
        ctx: &RenderCtx<'_>,
        arena: &mut Arena<'_>,
        roots: &FileRoots,
        config: &SampleConfig,
    ) -> Result<Self> {
        let image = load_image(arena, roots, &config.image_asset, config.image_staging_bytes)?;
        let mips = MipChain::generate(&image, config.mipmap_levels);
        let texture = Texture::from_image(ctx, &image, &mips, &config.image_asset);
        log::info!(
            "texture {}x{} with {} mip levels",
            texture.width(),
            texture.height(),
            texture.mip_level_count()
        );

        let source = load_shader_source(arena, roots, &config.vertex_shader_asset)?;
        let vertex_shader = Shader::new(ctx, source, ShaderStage::Vertex, &config.vertex_shader_asset)
            .with_context(|| format!("failed to compile {}", config.vertex_shader_asset))?;

        let source = load_shader_source(arena, roots, &config.fragment_shader_asset)?;
        let fragment_shader =
            Shader::new(ctx, source, ShaderStage::Fragment, &config.fragment_shader_asset)
                .with_context(|| format!("failed to compile {}", config.fragment_shader_asset))?;

        let structure = quad_layout();
        let pipeline = Pipeline::compile(
            ctx,
            &PipelineDesc {
                input_layout: &structure,
                vertex_shader: &vertex_shader,
                fragment_shader: &fragment_shader,
                label: "texquad pipeline",
            },
        )
        .context("failed to compile pipeline")?;
        log::info!("pipeline compiled");

        let texture_unit = pipeline.texture_unit(TEXTURE_UNIT_NAME)?;
        let transform = pipeline.constant_location(TRANSFORM_NAME)?;

        let mut vertices = VertexBuffer::new(ctx, 4, &structure, Usage::Static)?;
        let mut data = vertices.lock_all()?;
        data.copy_from_slice(&QUAD_VERTICES);
        data.unlock();

        let mut indices = IndexBuffer::new(ctx, QUAD_INDICES.len() as u32, Usage::Static)?;
        let mut data = indices.lock()?;
        data.copy_from_slice(&QUAD_INDICES);
        data.unlock();

        log::info!("scene ready (arena cursor {} of {})", arena.cursor(), arena.capacity());
        Ok(Self {
            texture,
            vertex_shader,
            fragment_shader,
            pipeline,
            vertices,
            indices,
            texture_unit,
            transform,
        })
    }
}
