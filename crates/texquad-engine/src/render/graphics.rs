use glam::Mat3;

use super::pipeline::BoundTexture;
use super::{
    ConstantLocation, GraphicsError, IndexBuffer, MipmapFilter, Pipeline, RenderTarget,
    SamplerState, Texture, TextureAddressing, TextureDirection, TextureFilter, TextureUnit,
    VertexBuffer,
};

struct UnitState<'s> {
    unit: TextureUnit,
    texture: Option<&'s Texture>,
    sampler: SamplerState,
}

/// Per-frame command recorder.
///
/// Binding calls only record state; `draw_indexed_vertices` turns the current
/// state into one render pass. A `clear` is folded into the next pass's load
/// op, or flushed on its own when the frame ends without a draw.
///
/// Lifetimes:
/// - `'f` borrows the frame (device, queue, encoder, surface view)
/// - `'s` borrows the scene resources bound for drawing
pub struct Graphics<'f, 's> {
    device: &'f wgpu::Device,
    queue: &'f wgpu::Queue,
    target: RenderTarget<'f>,

    pending_clear: Option<wgpu::Color>,
    pipeline: Option<&'s Pipeline>,
    vertex_buffer: Option<&'s VertexBuffer>,
    index_buffer: Option<&'s IndexBuffer>,
    units: Vec<UnitState<'s>>,
    draws: u32,
}

impl<'f, 's> Graphics<'f, 's> {
    /// Recorder drawing into `target`. `FrameCtx::render` builds one per
    /// surface frame; offscreen targets work the same way.
    pub fn new(
        device: &'f wgpu::Device,
        queue: &'f wgpu::Queue,
        target: RenderTarget<'f>,
    ) -> Self {
        Self {
            device,
            queue,
            target,
            pending_clear: None,
            pipeline: None,
            vertex_buffer: None,
            index_buffer: None,
            units: Vec::new(),
            draws: 0,
        }
    }

    /// Clears the color target to `color` (linear RGBA).
    pub fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color.map(f64::from);
        self.pending_clear = Some(wgpu::Color { r, g, b, a });
    }

    pub fn set_pipeline(&mut self, pipeline: &'s Pipeline) {
        self.pipeline = Some(pipeline);
    }

    /// Uploads a 3x3 matrix to the constant at `location` of the current
    /// pipeline.
    ///
    /// The constant buffer is written immediately, so the last value set in a
    /// frame is the one every draw of that frame sees.
    pub fn set_matrix3(&mut self, location: ConstantLocation, matrix: &Mat3) -> Result<(), GraphicsError> {
        let pipeline = self.pipeline.ok_or(GraphicsError::NoPipeline)?;
        let columns = mat3_columns(matrix);
        pipeline.write_constant(self.queue, location, bytemuck::bytes_of(&columns))
    }

    pub fn set_vertex_buffer(&mut self, buffer: &'s VertexBuffer) {
        self.vertex_buffer = Some(buffer);
    }

    pub fn set_index_buffer(&mut self, buffer: &'s IndexBuffer) {
        self.index_buffer = Some(buffer);
    }

    pub fn set_texture(&mut self, unit: TextureUnit, texture: &'s Texture) {
        self.unit_mut(unit).texture = Some(texture);
    }

    pub fn set_texture_addressing(
        &mut self,
        unit: TextureUnit,
        direction: TextureDirection,
        addressing: TextureAddressing,
    ) {
        let sampler = &mut self.unit_mut(unit).sampler;
        match direction {
            TextureDirection::U => sampler.address_u = addressing,
            TextureDirection::V => sampler.address_v = addressing,
        }
    }

    pub fn set_texture_minification_filter(&mut self, unit: TextureUnit, filter: TextureFilter) {
        self.unit_mut(unit).sampler.minification = filter;
    }

    pub fn set_texture_magnification_filter(&mut self, unit: TextureUnit, filter: TextureFilter) {
        self.unit_mut(unit).sampler.magnification = filter;
    }

    pub fn set_texture_mipmap_filter(&mut self, unit: TextureUnit, filter: MipmapFilter) {
        self.unit_mut(unit).sampler.mipmap = filter;
    }

    /// Sampler state currently recorded for `unit`.
    pub fn sampler_state(&self, unit: TextureUnit) -> SamplerState {
        self.units
            .iter()
            .find(|u| u.unit == unit)
            .map(|u| u.sampler)
            .unwrap_or_default()
    }

    /// Draws every index of the bound index buffer with the current state.
    pub fn draw_indexed_vertices(&mut self) -> Result<(), GraphicsError> {
        let pipeline = self.pipeline.ok_or(GraphicsError::NoPipeline)?;
        let vertex_buffer = self.vertex_buffer.ok_or(GraphicsError::NoVertexBuffer)?;
        let index_buffer = self.index_buffer.ok_or(GraphicsError::NoIndexBuffer)?;
        if !vertex_buffer.is_written() {
            return Err(GraphicsError::UnwrittenBuffer("vertex"));
        }
        if !index_buffer.is_written() {
            return Err(GraphicsError::UnwrittenBuffer("index"));
        }

        let bound: Vec<BoundTexture<'_>> = self
            .units
            .iter()
            .filter_map(|u| {
                u.texture.map(|texture| BoundTexture {
                    unit: u.unit,
                    texture,
                    sampler: u.sampler,
                })
            })
            .collect();
        let bind_group = pipeline.bind_group(self.device, &bound)?;

        let load = match self.pending_clear.take() {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = self.target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("texquad draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline.raw());
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, vertex_buffer.raw().slice(..));
        rpass.set_index_buffer(index_buffer.raw().slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..index_buffer.count(), 0, 0..1);

        self.draws += 1;
        log::trace!("draw {} ({} indices)", self.draws, index_buffer.count());
        Ok(())
    }

    /// Finishes recording. Flushes a clear that no draw consumed.
    pub fn end(mut self) {
        let Some(color) = self.pending_clear.take() else { return };

        let _rpass = self.target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("texquad clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn unit_mut(&mut self, unit: TextureUnit) -> &mut UnitState<'s> {
        let index = match self.units.iter().position(|u| u.unit == unit) {
            Some(i) => i,
            None => {
                self.units.push(UnitState {
                    unit,
                    texture: None,
                    sampler: SamplerState::default(),
                });
                self.units.len() - 1
            }
        };
        &mut self.units[index]
    }
}

/// WGSL `mat3x3<f32>` uniform layout: three columns, each padded to 16 bytes.
fn mat3_columns(m: &Mat3) -> [[f32; 4]; 3] {
    [m.x_axis, m.y_axis, m.z_axis].map(|c| [c.x, c.y, c.z, 0.0])
}
