mod assets;
mod config;
mod renderer;
mod scene;

use anyhow::Result;

use texquad_engine::device::GpuInit;
use texquad_engine::io::FileRoots;
use texquad_engine::logging::{init_logging, LoggingConfig};
use texquad_engine::memory::Arena;
use texquad_engine::window::{Runtime, RuntimeConfig};

use config::SampleConfig;
use renderer::FrameRenderer;
use scene::Scene;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = SampleConfig::from_args(std::env::args());
    log::info!("assets from {}", config.asset_root.display());

    let roots = FileRoots::new(&config.asset_root);
    let mut arena = Arena::with_capacity(config.arena_capacity);

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), move |ctx| {
        let scene = Scene::setup(ctx, &mut arena, &roots, &config)?;
        Ok(FrameRenderer::new(scene, &config))
    })
}
