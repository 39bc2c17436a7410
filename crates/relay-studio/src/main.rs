//! Spinning-quad demo: the event loop owns the window, a dedicated render
//! thread draws into it.
//!
//! Environment:
//! - `RUST_LOG` overrides the default log filter
//! - `RELAY_PRESENT_MODE` is one of `fifo` (default), `mailbox`, `immediate`, `novsync`
//! - `RELAY_SIZE` is the initial window size as `WIDTHxHEIGHT` in logical pixels

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use relay_engine::device::{GpuInit, GpuSurface};
use relay_engine::logging::{LoggingConfig, init_logging};
use relay_engine::render::{QuadRenderer, RenderCtx};
use relay_engine::window::{Runtime, RuntimeConfig};

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(e) = run() {
        log::error!("relay studio failed: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut config = RuntimeConfig {
        title: "relay studio".to_string(),
        ..RuntimeConfig::default()
    };
    if let Ok(size) = std::env::var("RELAY_SIZE") {
        config.initial_size = parse_size(&size)?;
    }

    let mut gpu_init = GpuInit::default();
    if let Ok(mode) = std::env::var("RELAY_PRESENT_MODE") {
        gpu_init.present_mode = parse_present_mode(&mode)?;
    }

    log::info!(
        "starting: {}x{} {:?}",
        config.initial_size.width,
        config.initial_size.height,
        gpu_init.present_mode
    );

    Runtime::run(config, gpu_init, |surface: &GpuSurface| {
        QuadRenderer::new(&RenderCtx::from_surface(surface), 1.0, 1.0)
    })
}

fn parse_present_mode(s: &str) -> Result<wgpu::PresentMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "fifo" | "vsync" => Ok(wgpu::PresentMode::Fifo),
        "mailbox" => Ok(wgpu::PresentMode::Mailbox),
        "immediate" => Ok(wgpu::PresentMode::Immediate),
        "novsync" => Ok(wgpu::PresentMode::AutoNoVsync),
        other => anyhow::bail!("unknown present mode {other:?}"),
    }
}

fn parse_size(s: &str) -> Result<LogicalSize<f64>> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("window size {s:?} is not WIDTHxHEIGHT"))?;
    let w: f64 = w.trim().parse().with_context(|| format!("bad width in {s:?}"))?;
    let h: f64 = h.trim().parse().with_context(|| format!("bad height in {s:?}"))?;
    anyhow::ensure!(w >= 1.0 && h >= 1.0, "window size {s:?} must be at least 1x1");
    Ok(LogicalSize::new(w, h))
}
