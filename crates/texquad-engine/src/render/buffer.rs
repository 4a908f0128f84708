use std::ops::{Deref, DerefMut};

use bytemuck::Pod;

use super::{BufferError, RenderCtx, VertexStructure};

/// Update pattern of a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Usage {
    /// Written once, then only read by draws.
    Static,
    /// May be locked and rewritten any number of times.
    Dynamic,
}

/// Scoped write access to a buffer's contents.
///
/// Starts zeroed. The data is uploaded when the lock is released (`unlock` or
/// drop). While the lock exists the buffer is mutably borrowed, so it cannot be
/// bound for drawing.
pub struct BufferLock<'b, T: Pod> {
    buffer: &'b wgpu::Buffer,
    queue: &'b wgpu::Queue,
    written: &'b mut bool,
    staging: Vec<T>,
}

impl<'b, T: Pod> BufferLock<'b, T> {
    fn new(raw: &'b mut RawBuffer, len: usize) -> Result<Self, BufferError> {
        if raw.usage == Usage::Static && raw.written {
            return Err(BufferError::AlreadyWritten);
        }
        Ok(Self {
            buffer: &raw.buffer,
            queue: &raw.queue,
            written: &mut raw.written,
            staging: vec![T::zeroed(); len],
        })
    }

    /// Releases the lock, uploading the written data.
    pub fn unlock(self) {
        drop(self);
    }
}

impl<T: Pod> Deref for BufferLock<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.staging
    }
}

impl<T: Pod> DerefMut for BufferLock<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.staging
    }
}

impl<T: Pod> Drop for BufferLock<'_, T> {
    fn drop(&mut self) {
        self.queue
            .write_buffer(self.buffer, 0, bytemuck::cast_slice(&self.staging));
        *self.written = true;
    }
}

struct RawBuffer {
    buffer: wgpu::Buffer,
    queue: wgpu::Queue,
    usage: Usage,
    written: bool,
}

impl RawBuffer {
    fn new(
        ctx: &RenderCtx<'_>,
        label: &str,
        size: u64,
        usage: Usage,
        kind: wgpu::BufferUsages,
    ) -> Self {
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: kind | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            queue: ctx.queue.clone(),
            usage,
            written: false,
        }
    }
}

/// Vertex storage for `count` vertices of a `VertexStructure`.
pub struct VertexBuffer {
    raw: RawBuffer,
    count: u32,
    floats_per_vertex: usize,
}

impl VertexBuffer {
    pub fn new(
        ctx: &RenderCtx<'_>,
        count: u32,
        structure: &VertexStructure,
        usage: Usage,
    ) -> Result<Self, BufferError> {
        if count == 0 || structure.floats_per_vertex() == 0 {
            return Err(BufferError::Empty);
        }
        let stride = structure.stride();
        Ok(Self {
            raw: RawBuffer::new(
                ctx,
                "texquad vertex buffer",
                stride * count as u64,
                usage,
                wgpu::BufferUsages::VERTEX,
            ),
            count,
            floats_per_vertex: structure.floats_per_vertex(),
        })
    }

    /// Locks every vertex for writing, as `count * floats_per_vertex` floats.
    pub fn lock_all(&mut self) -> Result<BufferLock<'_, f32>, BufferError> {
        let len = self.count as usize * self.floats_per_vertex;
        BufferLock::new(&mut self.raw, len)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_written(&self) -> bool {
        self.raw.written
    }

    pub(crate) fn raw(&self) -> &wgpu::Buffer {
        &self.raw.buffer
    }
}

/// 32-bit index storage.
pub struct IndexBuffer {
    raw: RawBuffer,
    count: u32,
}

impl IndexBuffer {
    pub fn new(ctx: &RenderCtx<'_>, count: u32, usage: Usage) -> Result<Self, BufferError> {
        if count == 0 {
            return Err(BufferError::Empty);
        }
        Ok(Self {
            raw: RawBuffer::new(
                ctx,
                "texquad index buffer",
                count as u64 * std::mem::size_of::<u32>() as u64,
                usage,
                wgpu::BufferUsages::INDEX,
            ),
            count,
        })
    }

    pub fn lock(&mut self) -> Result<BufferLock<'_, u32>, BufferError> {
        BufferLock::new(&mut self.raw, self.count as usize)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_written(&self) -> bool {
        self.raw.written
    }

    pub(crate) fn raw(&self) -> &wgpu::Buffer {
        &self.raw.buffer
    }
}
