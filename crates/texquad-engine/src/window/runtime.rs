use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::RenderCtx;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "TextureTest".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, initializes the GPU for it, builds the app with
    /// `setup`, then drives `App::on_frame` once per redraw until the window
    /// closes.
    ///
    /// If window creation, GPU initialization or `setup` fails, the loop exits
    /// before any frame is requested and the error is returned.
    pub fn run<A, S>(config: RuntimeConfig, gpu_init: GpuInit, setup: S) -> Result<()>
    where
        A: App + 'static,
        S: FnOnce(&RenderCtx<'_>) -> Result<A>,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, setup);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.finish()
    }
}

#[self_referencing]
struct WindowEntry {
    frame_index: u64,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A, S> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    setup: Option<S>,

    app: Option<A>,
    window: Option<(WindowId, WindowEntry)>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A, S> AppState<A, S>
where
    A: App + 'static,
    S: FnOnce(&RenderCtx<'_>) -> Result<A>,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, setup: S) -> Self {
        Self {
            config,
            gpu_init,
            setup: Some(setup),
            app: None,
            window: None,
            error: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<(WindowId, WindowEntry)> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            frame_index: 0,
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init))
                    .context("GPU initialization failed for window")
            },
        }
        .try_build()?;

        Ok((id, entry))
    }

    /// Window, GPU and app construction. Runs once, on the first `resumed`.
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (id, entry) = self.create_window_entry(event_loop)?;

        let setup = self.setup.take().context("app setup already ran")?;
        let app = entry
            .with_gpu(|gpu| setup(&gpu.render_ctx()))
            .context("app setup failed")?;

        log::info!("setup complete; entering frame loop");
        self.app = Some(app);
        self.window = Some((id, entry));
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<A, S> ApplicationHandler for AppState<A, S>
where
    A: App + 'static,
    S: FnOnce(&RenderCtx<'_>) -> Result<A>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("{e:#}");
            self.error = Some(e);
            self.request_exit(event_loop);
            return;
        }

        if let Some((_, entry)) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw, paced by the present mode.
        if let Some((_, entry)) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (Some(app), Some((id, entry))) = (&mut self.app, &mut self.window) else {
            return;
        };
        if *id != window_id {
            return;
        }

        if app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("window closed");
                self.window = None;
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                let control = entry.with_mut(|fields| {
                    let mut ctx = FrameCtx {
                        window: fields.window,
                        gpu: fields.gpu,
                        frame_index: *fields.frame_index,
                    };
                    let control = app.on_frame(&mut ctx);
                    *fields.frame_index += 1;
                    control
                });

                if control == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }
}
