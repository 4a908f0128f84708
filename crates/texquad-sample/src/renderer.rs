use glam::{Mat3, Vec2};

use texquad_engine::core::{App, AppControl, FrameCtx, FrameOutcome};
use texquad_engine::render::{
    ConstantLocation, Graphics, GraphicsError, MipmapFilter, SamplerState, TextureAddressing,
    TextureDirection, TextureFilter, TextureUnit,
};

use crate::config::SampleConfig;
use crate::scene::Scene;

/// Frame loop state. `Idle` until the first frame is drawn.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    Idle,
    Rendering { frames: u64 },
}

impl FrameState {
    /// State after one more drawn frame.
    pub fn advance(self) -> Self {
        match self {
            Self::Idle => Self::Rendering { frames: 1 },
            Self::Rendering { frames } => Self::Rendering { frames: frames + 1 },
        }
    }
}

/// Everything a frame draws with, apart from the scene's GPU objects.
///
/// Derived once from config and scene bindings; frames never change it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawParams {
    pub clear_color: [f32; 4],
    pub transform: Mat3,
    pub texture_unit: TextureUnit,
    pub transform_location: ConstantLocation,
    pub sampler: SamplerState,
    pub index_count: u32,
}

impl DrawParams {
    pub fn new(
        config: &SampleConfig,
        texture_unit: TextureUnit,
        transform_location: ConstantLocation,
        index_count: u32,
    ) -> Self {
        Self {
            clear_color: config.clear_color,
            transform: Mat3::from_scale(Vec2::splat(config.zoom)),
            texture_unit,
            transform_location,
            sampler: SamplerState {
                address_u: TextureAddressing::Clamp,
                address_v: TextureAddressing::Clamp,
                minification: TextureFilter::Linear,
                magnification: TextureFilter::Linear,
                mipmap: MipmapFilter::Linear,
            },
            index_count,
        }
    }
}

/// Records one frame of the scene.
pub fn draw_frame<'s>(
    g: &mut Graphics<'_, 's>,
    scene: &'s Scene,
    params: &DrawParams,
) -> Result<(), GraphicsError> {
    let unit = params.texture_unit;

    g.clear(params.clear_color);
    g.set_pipeline(&scene.pipeline);
    g.set_matrix3(params.transform_location, &params.transform)?;
    g.set_vertex_buffer(&scene.vertices);
    g.set_index_buffer(&scene.indices);

    g.set_texture(unit, &scene.texture);
    g.set_texture_addressing(unit, TextureDirection::U, params.sampler.address_u);
    g.set_texture_addressing(unit, TextureDirection::V, params.sampler.address_v);
    g.set_texture_minification_filter(unit, params.sampler.minification);
    g.set_texture_magnification_filter(unit, params.sampler.magnification);
    g.set_texture_mipmap_filter(unit, params.sampler.mipmap);

    g.draw_indexed_vertices()
}

/// Loop state and control after a frame with `outcome`.
///
/// Only a presented frame counts; a skipped one leaves the state as it was.
pub fn after_frame(state: FrameState, outcome: FrameOutcome) -> (FrameState, AppControl) {
    match outcome {
        FrameOutcome::Presented => (state.advance(), AppControl::Continue),
        FrameOutcome::Skipped => (state, AppControl::Continue),
        FrameOutcome::Fatal => (state, AppControl::Exit),
    }
}

pub struct FrameRenderer {
    scene: Scene,
    params: DrawParams,
    state: FrameState,
}

impl FrameRenderer {
    pub fn new(scene: Scene, config: &SampleConfig) -> Self {
        let params = DrawParams::new(
            config,
            scene.texture_unit,
            scene.transform,
            scene.indices.count(),
        );
        Self {
            scene,
            params,
            state: FrameState::Idle,
        }
    }
}

impl App for FrameRenderer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let scene = &self.scene;
        let params = &self.params;

        let outcome = match ctx.render(|g| draw_frame(g, scene, params)) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("frame {} failed: {e}", ctx.frame_index);
                return AppControl::Exit;
            }
        };

        let (state, control) = after_frame(self.state, outcome);
        if self.state == FrameState::Idle && state != FrameState::Idle {
            log::debug!("first frame drawn; rendering");
        }
        if outcome == FrameOutcome::Skipped {
            log::trace!("frame {} skipped", ctx.frame_index);
        }
        self.state = state;
        control
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texquad_engine::io::FileRoots;
    use texquad_engine::memory::Arena;
    use texquad_engine::render::{
        BindingTable, RenderCtx, RenderTarget, ShaderReflection, ShaderStage,
    };

    fn bindings() -> (TextureUnit, ConstantLocation) {
        let vs = ShaderReflection::from_wgsl(
            include_str!("../assets/texture.vert"),
            ShaderStage::Vertex,
        )
        .unwrap();
        let fs = ShaderReflection::from_wgsl(
            include_str!("../assets/texture.frag"),
            ShaderStage::Fragment,
        )
        .unwrap();
        let table = BindingTable::merge(&vs, &fs).unwrap();
        (
            table.texture_unit("texsampler").unwrap(),
            table.constant_location("mvp").unwrap(),
        )
    }

    #[test]
    fn params_match_frame_contract() {
        let (unit, mvp) = bindings();
        let p = DrawParams::new(&SampleConfig::default(), unit, mvp, 6);

        assert_eq!(p.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            p.transform.to_cols_array(),
            [0.8, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(p.sampler.address_u, TextureAddressing::Clamp);
        assert_eq!(p.sampler.address_v, TextureAddressing::Clamp);
        assert_eq!(p.sampler.minification, TextureFilter::Linear);
        assert_eq!(p.sampler.magnification, TextureFilter::Linear);
        assert_eq!(p.sampler.mipmap, MipmapFilter::Linear);
        assert_eq!(p.index_count, 6);
    }

    /// Noop-backend device; commands are validated, never executed.
    fn headless() -> (wgpu::Device, wgpu::Queue) {
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
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).unwrap()
    }

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    fn offscreen(device: &wgpu::Device) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen"),
                size: wgpu::Extent3d {
                    width: 128,
                    height: 72,
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

    #[test]
    fn repeated_frames_draw_identically() {
        let (device, queue) = headless();
        let ctx = RenderCtx::new(&device, &queue, FORMAT);
        let config = SampleConfig::default();
        let roots = FileRoots::new(&config.asset_root);
        let mut arena = Arena::with_capacity(config.arena_capacity);

        let scene = Scene::setup(&ctx, &mut arena, &roots, &config).unwrap();
        let staged = arena.cursor();
        assert!(scene.vertices.is_written());
        assert!(scene.indices.is_written());

        let params = DrawParams::new(&config, scene.texture_unit, scene.transform, scene.indices.count());
        let view = offscreen(&device);

        let mut state = FrameState::Idle;
        let mut samplers = Vec::new();
        for _ in 0..10 {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
            {
                let mut g = Graphics::new(&device, &queue, RenderTarget::new(&mut encoder, &view));
                draw_frame(&mut g, &scene, &params).unwrap();
                samplers.push(g.sampler_state(params.texture_unit));
                g.end();
            }
            queue.submit(std::iter::once(encoder.finish()));
            state = after_frame(state, FrameOutcome::Presented).0;
        }

        assert!(samplers.iter().all(|s| *s == params.sampler));
        assert_eq!(state, FrameState::Rendering { frames: 10 });
        assert_eq!(arena.cursor(), staged);
    }

    #[test]
    fn skipped_frames_do_not_count() {
        let (state, control) = after_frame(FrameState::Idle, FrameOutcome::Skipped);
        assert_eq!(state, FrameState::Idle);
        assert_eq!(control, AppControl::Continue);

        let (state, _) = after_frame(state, FrameOutcome::Presented);
        let (state, control) = after_frame(state, FrameOutcome::Skipped);
        assert_eq!(state, FrameState::Rendering { frames: 1 });
        assert_eq!(control, AppControl::Continue);
    }

    #[test]
    fn fatal_surface_exits() {
        let state = FrameState::Rendering { frames: 3 };
        assert_eq!(
            after_frame(state, FrameOutcome::Fatal),
            (state, AppControl::Exit)
        );
    }

    #[test]
    fn idle_leaves_once() {
        let mut state = FrameState::Idle;
        let mut transitions = 0;
        for _ in 0..10 {
            let next = state.advance();
            if state == FrameState::Idle && next != FrameState::Idle {
                transitions += 1;
            }
            state = next;
        }
        assert_eq!(transitions, 1);
        assert_eq!(state, FrameState::Rendering { frames: 10 });
    }
}
