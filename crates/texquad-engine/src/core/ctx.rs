use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{Graphics, GraphicsError, RenderTarget};

/// What became of a frame handed to `FrameCtx::render`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// Recorded, submitted and presented.
    Presented,
    /// No surface texture this time (timeout, lost or outdated surface);
    /// nothing was drawn.
    Skipped,
    /// The surface is unusable; the app should exit.
    Fatal,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    /// Number of frames handed to the app before this one.
    pub frame_index: u64,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the next surface frame, records `draw` into it through a
    /// [`Graphics`] recorder, then submits and presents.
    ///
    /// Surface errors are handled here: a lost or outdated surface is
    /// reconfigured and the frame skipped, running out of memory is
    /// `FrameOutcome::Fatal`. A draw error drops the frame unpresented.
    pub fn render<'s, F>(&mut self, draw: F) -> Result<FrameOutcome, GraphicsError>
    where
        F: FnOnce(&mut Graphics<'_, 's>) -> Result<(), GraphicsError>,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    return Ok(FrameOutcome::Fatal);
                }
                return Ok(FrameOutcome::Skipped);
            }
        };

        // Graphics borrows frame.encoder; ended before submit() takes frame.
        {
            let target = RenderTarget::new(&mut frame.encoder, &frame.view);
            let mut graphics = Graphics::new(self.gpu.device(), self.gpu.queue(), target);
            draw(&mut graphics)?;
            graphics.end();
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        Ok(FrameOutcome::Presented)
    }
}
