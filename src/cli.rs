use crate::input::CellMetrics;
use crate::manipulation::ManipulationTuning;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal record player with an inspectable record sleeve
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Degrees of sleeve rotation per pixel of drag
    #[arg(long, default_value_t = 0.5, value_parser = positive_f64)]
    pub sensitivity: f64,

    /// Scale change per wheel unit
    #[arg(long, default_value_t = 0.002, value_parser = positive_f64)]
    pub zoom_step: f64,

    /// Wheel units reported per scroll notch or +/- key press
    #[arg(long, default_value_t = 100.0, value_parser = positive_f64)]
    pub wheel_step: f64,

    /// Delay before the sleeve's entrance animation starts
    #[arg(long, default_value_t = 100)]
    pub settle_delay_ms: u64,

    /// Target frames per second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Width of one terminal cell in pixels
    #[arg(long, default_value_t = 8.0, value_parser = positive_f64)]
    pub cell_width: f64,

    /// Height of one terminal cell in pixels
    #[arg(long, default_value_t = 16.0, value_parser = positive_f64)]
    pub cell_height: f64,

    /// Audio track to play; playback runs silently without one
    #[arg(long)]
    pub track: Option<PathBuf>,

    /// Write logs to this file (stdout is the drawing surface)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `turntable=debug`; RUST_LOG wins when set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Start with the debug overlay visible
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    pub fn tuning(&self) -> ManipulationTuning {
        ManipulationTuning {
            sensitivity: self.sensitivity,
            zoom_step: self.zoom_step,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            ..ManipulationTuning::default()
        }
    }

    pub fn cells(&self) -> CellMetrics {
        CellMetrics { width: self.cell_width, height: self.cell_height }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }
}

fn positive_f64(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("'{raw}' must be a positive number"))
    }
}
