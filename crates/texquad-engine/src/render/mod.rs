//! GPU resources and per-frame command recording.
//!
//! Resource constructors take a [`RenderCtx`]; drawing goes through
//! [`Graphics`], which records binding state and issues draws into the frame's
//! command encoder.
//!
//! Shader resources are matched by name: vertex attributes against the vertex
//! entry point's inputs, texture units and constant locations against the
//! module-scope bindings of both shaders.

mod buffer;
mod ctx;
mod error;
mod graphics;
mod pipeline;
mod sampler;
mod shader;
mod texture;
mod vertex;

pub use buffer::{BufferLock, IndexBuffer, Usage, VertexBuffer};
pub use ctx::{RenderCtx, RenderTarget};
pub use error::{BufferError, GraphicsError, PipelineError, ShaderError};
pub use graphics::Graphics;
pub use pipeline::{BindingTable, ConstantLocation, Pipeline, PipelineDesc, TextureUnit};
pub use sampler::{
    MipmapFilter, SamplerState, TextureAddressing, TextureDirection, TextureFilter,
};
pub use shader::{BindingKind, Shader, ShaderBinding, ShaderReflection, ShaderStage};
pub use texture::{Texture, TextureId};
pub use vertex::{VertexData, VertexElement, VertexStructure};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shader pair and a headless device shared by the render tests.

    use super::RenderCtx;

    /// Color target format for headless rendering.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Device and queue on wgpu's noop backend. Commands are validated but
    /// never executed.
    pub struct Headless {
        pub device: wgpu::Device,
        pub queue: wgpu::Queue,
    }

    impl Headless {
        pub fn new() -> Self {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::NOOP,
                backend_options: wgpu::BackendOptions {
                    noop: wgpu::NoopBackendOptions { enable: true },
                    ..Default::default()
                },
                ..Default::default()
            });
            let adapter =
                pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                    .unwrap();
            let (device, queue) =
                pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))
                    .unwrap();
            Self { device, queue }
        }

        pub fn ctx(&self) -> RenderCtx<'_> {
            RenderCtx::new(&self.device, &self.queue, FORMAT)
        }

        /// Offscreen color target of `FORMAT`.
        pub fn target(&self, width: u32, height: u32) -> wgpu::TextureView {
            self.device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("headless target"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        }

        pub fn encoder(&self) -> wgpu::CommandEncoder {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None })
        }

        pub fn submit(&self, encoder: wgpu::CommandEncoder) {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    pub const VERT: &str = r#"
@group(0) @binding(0) var<uniform> mvp: mat3x3<f32>;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) pos: vec2<f32>, @location(1) tex: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = vec4<f32>((mvp * vec3<f32>(pos, 1.0)).xy, 0.5, 1.0);
    out.uv = tex;
    return out;
}
"#;

    pub const FRAG: &str = r#"
@group(0) @binding(1) var texsampler: texture_2d<f32>;
@group(0) @binding(2) var texsampler_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(texsampler, texsampler_sampler, uv);
}
"#;
}
