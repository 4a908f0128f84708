use std::cell::RefCell;
use std::collections::HashMap;

use super::{
    BindingKind, GraphicsError, PipelineError, RenderCtx, SamplerState, Shader, ShaderReflection,
    ShaderStage, Texture, TextureId, VertexStructure,
};

/// Suffix naming the sampler paired with a texture unit (`texsampler` ->
/// `texsampler_sampler`).
const SAMPLER_SUFFIX: &str = "_sampler";

/// Texture + sampler binding pair resolved by name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureUnit {
    pub(crate) texture: u32,
    pub(crate) sampler: u32,
}

/// Uniform buffer binding resolved by name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ConstantLocation {
    pub(crate) binding: u32,
    pub(crate) size: u32,
}

impl ConstantLocation {
    /// Byte size of the constant (WGSL layout).
    pub fn size(&self) -> u32 {
        self.size
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct BindingEntry {
    name: String,
    binding: u32,
    kind: BindingKind,
    visibility: wgpu::ShaderStages,
}

/// Merged group-0 bindings of a vertex/fragment shader pair.
///
/// Pure data; all name lookups happen here.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    entries: Vec<BindingEntry>,
}

impl BindingTable {
    pub fn merge(vertex: &ShaderReflection, fragment: &ShaderReflection) -> Result<Self, PipelineError> {
        let mut entries: Vec<BindingEntry> = Vec::new();

        for reflection in [vertex, fragment] {
            let visibility = reflection.stage().visibility();
            for b in reflection.bindings() {
                if b.group != 0 {
                    return Err(PipelineError::UnsupportedGroup {
                        name: b.name.clone(),
                        group: b.group,
                    });
                }

                match entries.iter_mut().find(|e| e.binding == b.binding) {
                    Some(e) if e.name == b.name && e.kind == b.kind => e.visibility |= visibility,
                    Some(e) => {
                        return Err(PipelineError::ConflictingBinding {
                            binding: b.binding,
                            first: e.name.clone(),
                            second: b.name.clone(),
                        });
                    }
                    None => {
                        if let Some(e) = entries.iter().find(|e| e.name == b.name) {
                            return Err(PipelineError::ConflictingBinding {
                                binding: b.binding,
                                first: format!("{}@{}", e.name, e.binding),
                                second: format!("{}@{}", b.name, b.binding),
                            });
                        }
                        entries.push(BindingEntry {
                            name: b.name.clone(),
                            binding: b.binding,
                            kind: b.kind,
                            visibility,
                        });
                    }
                }
            }
        }

        entries.sort_by_key(|e| e.binding);
        Ok(Self { entries })
    }

    fn find(&self, name: &str) -> Option<&BindingEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Resolves the texture unit `name`: texture binding `name` plus sampler
    /// binding `name_sampler`.
    pub fn texture_unit(&self, name: &str) -> Result<TextureUnit, PipelineError> {
        let texture = self
            .find(name)
            .ok_or_else(|| PipelineError::UnknownTextureUnit(name.to_string()))?;
        if texture.kind != BindingKind::Texture {
            return Err(PipelineError::WrongKind {
                name: name.to_string(),
                expected: BindingKind::Texture.describe(),
                actual: texture.kind.describe(),
            });
        }

        let sampler_name = format!("{name}{SAMPLER_SUFFIX}");
        let sampler = self
            .find(&sampler_name)
            .filter(|e| e.kind == BindingKind::Sampler)
            .ok_or_else(|| PipelineError::MissingSampler {
                unit: name.to_string(),
                sampler: sampler_name.clone(),
            })?;

        Ok(TextureUnit {
            texture: texture.binding,
            sampler: sampler.binding,
        })
    }

    /// Resolves the uniform constant `name`.
    pub fn constant_location(&self, name: &str) -> Result<ConstantLocation, PipelineError> {
        let entry = self
            .find(name)
            .ok_or_else(|| PipelineError::UnknownConstant(name.to_string()))?;
        match entry.kind {
            BindingKind::Uniform { size } => Ok(ConstantLocation {
                binding: entry.binding,
                size,
            }),
            other => Err(PipelineError::WrongKind {
                name: name.to_string(),
                expected: "constant",
                actual: other.describe(),
            }),
        }
    }

    fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.entries
            .iter()
            .map(|e| wgpu::BindGroupLayoutEntry {
                binding: e.binding,
                visibility: e.visibility,
                ty: match e.kind {
                    BindingKind::Uniform { size } => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size as u64),
                    },
                    BindingKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    BindingKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect()
    }
}

/// Inputs to `Pipeline::compile`.
pub struct PipelineDesc<'a> {
    pub input_layout: &'a VertexStructure,
    pub vertex_shader: &'a Shader,
    pub fragment_shader: &'a Shader,
    pub label: &'a str,
}

/// Texture bound to a unit at draw time, with its sampling state.
pub(crate) struct BoundTexture<'s> {
    pub unit: TextureUnit,
    pub texture: &'s Texture,
    pub sampler: SamplerState,
}

type BindGroupKey = Vec<(TextureUnit, TextureId, SamplerState)>;

/// Compiled render pipeline with its constant buffers.
///
/// Immutable after compilation apart from constant contents and the sampler
/// and bind group caches.
pub struct Pipeline {
    raw: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    table: BindingTable,
    constants: Vec<(u32, wgpu::Buffer)>,

    samplers: RefCell<HashMap<SamplerState, wgpu::Sampler>>,
    bind_groups: RefCell<HashMap<BindGroupKey, wgpu::BindGroup>>,
}

impl Pipeline {
    pub fn compile(ctx: &RenderCtx<'_>, desc: &PipelineDesc<'_>) -> Result<Self, PipelineError> {
        for (shader, expected) in [
            (desc.vertex_shader, ShaderStage::Vertex),
            (desc.fragment_shader, ShaderStage::Fragment),
        ] {
            if shader.stage() != expected {
                return Err(PipelineError::StageMismatch {
                    expected,
                    actual: shader.stage(),
                });
            }
        }

        let vs = desc.vertex_shader.reflection();
        let fs = desc.fragment_shader.reflection();
        let table = BindingTable::merge(vs, fs)?;
        let attributes = desc.input_layout.attributes(vs)?;

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(desc.label),
                entries: &table.layout_entries(),
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let raw = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: desc.vertex_shader.module(),
                entry_point: Some(vs.entry_point()),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: desc.input_layout.stride(),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: desc.fragment_shader.module(),
                entry_point: Some(fs.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let constants = table
            .entries
            .iter()
            .filter_map(|e| match e.kind {
                BindingKind::Uniform { size } => Some((
                    e.binding,
                    ctx.device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&e.name),
                        size: size as u64,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                )),
                _ => None,
            })
            .collect();

        log::debug!(
            "pipeline {} compiled ({} bindings, stride {})",
            desc.label,
            table.entries.len(),
            desc.input_layout.stride()
        );

        Ok(Self {
            raw,
            bind_group_layout,
            table,
            constants,
            samplers: RefCell::new(HashMap::new()),
            bind_groups: RefCell::new(HashMap::new()),
        })
    }

    pub fn texture_unit(&self, name: &str) -> Result<TextureUnit, PipelineError> {
        self.table.texture_unit(name)
    }

    pub fn constant_location(&self, name: &str) -> Result<ConstantLocation, PipelineError> {
        self.table.constant_location(name)
    }

    pub(crate) fn raw(&self) -> &wgpu::RenderPipeline {
        &self.raw
    }

    pub(crate) fn write_constant(
        &self,
        queue: &wgpu::Queue,
        location: ConstantLocation,
        bytes: &[u8],
    ) -> Result<(), GraphicsError> {
        let Some((_, buffer)) = self.constants.iter().find(|(b, _)| *b == location.binding) else {
            return Err(GraphicsError::UnknownConstant(location.binding));
        };
        if bytes.len() != location.size as usize {
            return Err(GraphicsError::ConstantSize {
                binding: location.binding,
                expected: location.size,
                actual: bytes.len() as u32,
            });
        }
        queue.write_buffer(buffer, 0, bytes);
        Ok(())
    }

    /// Bind group for the current textures, created on first use per
    /// (unit, texture, sampler state) combination.
    pub(crate) fn bind_group(
        &self,
        device: &wgpu::Device,
        bound: &[BoundTexture<'_>],
    ) -> Result<wgpu::BindGroup, GraphicsError> {
        let mut key: BindGroupKey = bound
            .iter()
            .map(|b| (b.unit, b.texture.id(), b.sampler))
            .collect();
        key.sort_by_key(|(unit, _, _)| *unit);

        if let Some(group) = self.bind_groups.borrow().get(&key) {
            return Ok(group.clone());
        }

        let mut samplers = Vec::with_capacity(bound.len());
        for b in bound {
            let sampler = self
                .samplers
                .borrow_mut()
                .entry(b.sampler)
                .or_insert_with(|| device.create_sampler(&b.sampler.descriptor()))
                .clone();
            samplers.push(sampler);
        }

        let mut entries = Vec::with_capacity(self.table.entries.len());
        for e in &self.table.entries {
            let resource = match e.kind {
                BindingKind::Uniform { .. } => self
                    .constants
                    .iter()
                    .find(|(b, _)| *b == e.binding)
                    .map(|(_, buffer)| buffer.as_entire_binding())
                    .ok_or(GraphicsError::UnknownConstant(e.binding))?,
                BindingKind::Texture => bound
                    .iter()
                    .find(|b| b.unit.texture == e.binding)
                    .map(|b| wgpu::BindingResource::TextureView(b.texture.view()))
                    .ok_or(GraphicsError::UnboundTexture(e.binding))?,
                BindingKind::Sampler => bound
                    .iter()
                    .zip(&samplers)
                    .find(|(b, _)| b.unit.sampler == e.binding)
                    .map(|(_, s)| wgpu::BindingResource::Sampler(s))
                    .ok_or(GraphicsError::UnboundTexture(e.binding))?,
            };
            entries.push(wgpu::BindGroupEntry {
                binding: e.binding,
                resource,
            });
        }

        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texquad bind group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        });
        log::trace!("bind group created for {} texture units", bound.len());

        self.bind_groups.borrow_mut().insert(key, group.clone());
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::{FRAG, VERT};

    fn table() -> BindingTable {
        let vs = ShaderReflection::from_wgsl(VERT, ShaderStage::Vertex).unwrap();
        let fs = ShaderReflection::from_wgsl(FRAG, ShaderStage::Fragment).unwrap();
        BindingTable::merge(&vs, &fs).unwrap()
    }

    #[test]
    fn lookups_resolve_by_name() {
        let t = table();
        assert_eq!(
            t.texture_unit("texsampler").unwrap(),
            TextureUnit {
                texture: 1,
                sampler: 2,
            }
        );
        let mvp = t.constant_location("mvp").unwrap();
        assert_eq!(mvp.binding, 0);
        assert_eq!(mvp.size(), 48);
    }

    #[test]
    fn lookups_are_stable() {
        let t = table();
        let unit = t.texture_unit("texsampler").unwrap();
        let mvp = t.constant_location("mvp").unwrap();
        for _ in 0..10 {
            assert_eq!(t.texture_unit("texsampler").unwrap(), unit);
            assert_eq!(t.constant_location("mvp").unwrap(), mvp);
        }
    }

    #[test]
    fn absent_names_fail() {
        let t = table();
        assert_eq!(
            t.texture_unit("diffuse").unwrap_err(),
            PipelineError::UnknownTextureUnit("diffuse".into())
        );
        assert_eq!(
            t.constant_location("model").unwrap_err(),
            PipelineError::UnknownConstant("model".into())
        );
    }

    #[test]
    fn kinds_are_checked() {
        let t = table();
        assert!(matches!(
            t.texture_unit("mvp"),
            Err(PipelineError::WrongKind { .. })
        ));
        assert!(matches!(
            t.constant_location("texsampler"),
            Err(PipelineError::WrongKind { .. })
        ));
    }

    #[test]
    fn visibility_is_per_stage() {
        let t = table();
        let vis: Vec<_> = t.entries.iter().map(|e| (e.binding, e.visibility)).collect();
        assert_eq!(
            vis,
            [
                (0, wgpu::ShaderStages::VERTEX),
                (1, wgpu::ShaderStages::FRAGMENT),
                (2, wgpu::ShaderStages::FRAGMENT),
            ]
        );
    }

    #[test]
    fn shared_binding_merges_visibility() {
        let frag = r#"
@group(0) @binding(0) var<uniform> mvp: mat3x3<f32>;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(mvp[0], 1.0);
}
"#;
        let vs = ShaderReflection::from_wgsl(VERT, ShaderStage::Vertex).unwrap();
        let fs = ShaderReflection::from_wgsl(frag, ShaderStage::Fragment).unwrap();
        let t = BindingTable::merge(&vs, &fs).unwrap();
        assert_eq!(t.entries.len(), 1);
        assert_eq!(t.entries[0].visibility, wgpu::ShaderStages::VERTEX_FRAGMENT);
    }

    #[test]
    fn conflicting_bindings_fail() {
        let frag = r#"
@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var tex_sampler: sampler;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return textureSample(tex, tex_sampler, vec2<f32>(0.5));
}
"#;
        let vs = ShaderReflection::from_wgsl(VERT, ShaderStage::Vertex).unwrap();
        let fs = ShaderReflection::from_wgsl(frag, ShaderStage::Fragment).unwrap();
        assert!(matches!(
            BindingTable::merge(&vs, &fs),
            Err(PipelineError::ConflictingBinding { binding: 0, .. })
        ));
    }

    #[test]
    fn missing_sampler_fails() {
        let frag = r#"
@group(0) @binding(1) var texsampler: texture_2d<f32>;
@group(0) @binding(2) var smp: sampler;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return textureSample(texsampler, smp, vec2<f32>(0.5));
}
"#;
        let vs = ShaderReflection::from_wgsl(VERT, ShaderStage::Vertex).unwrap();
        let fs = ShaderReflection::from_wgsl(frag, ShaderStage::Fragment).unwrap();
        let t = BindingTable::merge(&vs, &fs).unwrap();
        assert!(matches!(
            t.texture_unit("texsampler"),
            Err(PipelineError::MissingSampler { .. })
        ));
    }

    #[test]
    fn only_group_zero() {
        let frag = r#"
@group(1) @binding(0) var<uniform> tint: vec4<f32>;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint;
}
"#;
        let vs = ShaderReflection::from_wgsl(VERT, ShaderStage::Vertex).unwrap();
        let fs = ShaderReflection::from_wgsl(frag, ShaderStage::Fragment).unwrap();
        assert!(matches!(
            BindingTable::merge(&vs, &fs),
            Err(PipelineError::UnsupportedGroup { group: 1, .. })
        ));
    }

    mod device {
        use super::*;
        use crate::image::{Image, MipChain};
        use crate::render::fixtures::Headless;
        use crate::render::{MipmapFilter, TextureFilter, VertexData};

        fn layout() -> VertexStructure {
            let mut layout = VertexStructure::new();
            layout.add("pos", VertexData::Float2);
            layout.add("tex", VertexData::Float2);
            layout
        }

        fn shaders(ctx: &RenderCtx<'_>) -> (Shader, Shader) {
            let vs = Shader::new(ctx, VERT.as_bytes(), ShaderStage::Vertex, "vs").unwrap();
            let fs = Shader::new(ctx, FRAG.as_bytes(), ShaderStage::Fragment, "fs").unwrap();
            (vs, fs)
        }

        fn compile(h: &Headless) -> Pipeline {
            let ctx = h.ctx();
            let (vs, fs) = shaders(&ctx);
            Pipeline::compile(
                &ctx,
                &PipelineDesc {
                    input_layout: &layout(),
                    vertex_shader: &vs,
                    fragment_shader: &fs,
                    label: "test",
                },
            )
            .unwrap()
        }

        fn texture(h: &Headless) -> Texture {
            let pixels = [0xffu8; 4 * 4 * 4];
            let image = Image::from_rgba8(4, 4, &pixels).unwrap();
            Texture::from_image(&h.ctx(), &image, &MipChain::generate(&image, 30), "test")
        }

        #[test]
        fn compiled_handles_match_table() {
            let h = Headless::new();
            let pipeline = compile(&h);
            assert_eq!(
                pipeline.texture_unit("texsampler").unwrap(),
                table().texture_unit("texsampler").unwrap()
            );
            assert_eq!(pipeline.constant_location("mvp").unwrap().size(), 48);
            assert_eq!(pipeline.constants.len(), 1);
        }

        #[test]
        fn swapped_stages_are_rejected() {
            let h = Headless::new();
            let ctx = h.ctx();
            let (vs, fs) = shaders(&ctx);
            let result = Pipeline::compile(
                &ctx,
                &PipelineDesc {
                    input_layout: &layout(),
                    vertex_shader: &fs,
                    fragment_shader: &vs,
                    label: "swapped",
                },
            );
            assert!(matches!(
                result,
                Err(PipelineError::StageMismatch {
                    expected: ShaderStage::Vertex,
                    actual: ShaderStage::Fragment,
                })
            ));
        }

        #[test]
        fn bind_groups_are_cached_per_state() {
            let h = Headless::new();
            let pipeline = compile(&h);
            let texture = texture(&h);
            let unit = pipeline.texture_unit("texsampler").unwrap();

            let linear = SamplerState {
                minification: TextureFilter::Linear,
                magnification: TextureFilter::Linear,
                mipmap: MipmapFilter::Linear,
                ..SamplerState::default()
            };
            let bound = |sampler| {
                [BoundTexture {
                    unit,
                    texture: &texture,
                    sampler,
                }]
            };

            for _ in 0..3 {
                pipeline.bind_group(&h.device, &bound(linear)).unwrap();
            }
            assert_eq!(pipeline.bind_groups.borrow().len(), 1);
            assert_eq!(pipeline.samplers.borrow().len(), 1);

            pipeline.bind_group(&h.device, &bound(SamplerState::default())).unwrap();
            assert_eq!(pipeline.bind_groups.borrow().len(), 2);
            assert_eq!(pipeline.samplers.borrow().len(), 2);
        }

        #[test]
        fn missing_texture_is_reported() {
            let h = Headless::new();
            let pipeline = compile(&h);
            assert!(matches!(
                pipeline.bind_group(&h.device, &[]),
                Err(GraphicsError::UnboundTexture(1))
            ));
            assert!(pipeline.bind_groups.borrow().is_empty());
        }

        #[test]
        fn constants_are_size_checked() {
            let h = Headless::new();
            let pipeline = compile(&h);
            let mvp = pipeline.constant_location("mvp").unwrap();

            assert_eq!(pipeline.write_constant(&h.queue, mvp, &[0u8; 48]), Ok(()));
            assert_eq!(
                pipeline.write_constant(&h.queue, mvp, &[0u8; 36]),
                Err(GraphicsError::ConstantSize {
                    binding: 0,
                    expected: 48,
                    actual: 36,
                })
            );
        }
    }
}
