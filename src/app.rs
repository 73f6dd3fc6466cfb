//! Terminal session and frame loop.

use crate::audio::TrackPlayer;
use crate::cli::Args;
use crate::graphics::FrameBuffer;
use crate::input::InputAdapter;
use crate::terminal::Terminal;
use crate::time::FrameClock;
use crate::widget::{Flow, SceneConfig, SceneWidget};
use anyhow::{Context, Result};
use crossterm::event;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn run(args: Args) -> Result<()> {
    init_tracing(&args)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting turntable");

    let (cols, rows) = Terminal::size();
    let mut terminal = Terminal::enter()?;
    let mut frame = FrameBuffer::new(cols, rows);
    let mut input = InputAdapter::new(args.cells(), args.wheel_step);
    let mut scene = SceneWidget::new(
        SceneConfig {
            tuning: args.tuning(),
            cells: args.cells(),
            wheel_step: args.wheel_step,
            debug: args.debug,
        },
        Box::new(TrackPlayer::new(args.track.clone())),
        (cols, rows),
    );

    let frame_interval = args.frame_interval();
    let mut clock = FrameClock::new();
    loop {
        let deadline = Instant::now() + frame_interval;
        // Drain input until the next frame is due
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout).context("failed to poll terminal events")? {
                break;
            }
            let raw = event::read().context("failed to read terminal event")?;
            if let Some(event) = input.translate(&raw) {
                if scene.handle(event) == Flow::Quit {
                    info!(state = %scene.playback(), "quit requested");
                    return Ok(());
                }
            }
        }

        scene.tick(clock.tick());
        scene.paint(&mut frame);
        terminal.present(&frame)?;
    }
}

/// Logs go to `--log-file` when given; stdout belongs to the renderer.
fn init_tracing(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .with_context(|| format!("invalid log filter '{}'", args.log_level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer().with_writer(io::sink)).init(),
    }
    Ok(())
}
