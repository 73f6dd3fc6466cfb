use crate::graphics::{FrameBuffer, Rgb};
use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use tracing::warn;

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb { r: rgb.r, g: rgb.g, b: rgb.b }
    }
}

/// Raw-mode alternate screen with mouse capture; restored on drop
pub struct Terminal {
    out: Stdout,
}

impl Terminal {
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut out = io::stdout();
        if let Err(err) = execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableFocusChange,
            Hide
        ) {
            report_restore_failure(disable_raw_mode());
            return Err(err).context("failed to prepare the terminal screen");
        }
        Ok(Terminal { out })
    }

    /// Initial grid size, falling back to 80x24 when it cannot be queried
    pub fn size() -> (u16, u16) {
        termsize::get().map(|size| (size.cols, size.rows)).unwrap_or((80, 24))
    }

    pub fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        write_frame(&mut self.out, frame).context("failed to draw frame")
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let restored = execute!(
            self.out,
            ResetColor,
            Show,
            DisableFocusChange,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        report_restore_failure(restored.and_then(|_| disable_raw_mode()));
    }
}

/// Logs a failed terminal restore; returns whether one was logged
fn report_restore_failure(result: io::Result<()>) -> bool {
    match result {
        Ok(()) => false,
        Err(err) => {
            warn!(%err, "failed to restore terminal");
            true
        }
    }
}

/// Queues a full frame: each cell is an upper half block whose foreground is
/// the top pixel and background the bottom pixel, unless text covers it.
pub fn write_frame<W: Write>(out: &mut W, frame: &FrameBuffer) -> io::Result<()> {
    let mut current: Option<(Rgb, Rgb)> = None;
    for row in 0..frame.rows() {
        queue!(out, MoveTo(0, row))?;
        for col in 0..frame.cols() {
            let top = frame.pixel(col as usize, row as usize * 2);
            let bottom = frame.pixel(col as usize, row as usize * 2 + 1);
            let (fg, bg, ch) = match frame.glyph(col, row) {
                Some(glyph) => (glyph.fg, top.blend(bottom, 0.5), glyph.ch),
                None => (top, bottom, '▀'),
            };
            if current != Some((fg, bg)) {
                queue!(out, SetForegroundColor(fg.into()), SetBackgroundColor(bg.into()))?;
                current = Some((fg, bg));
            }
            queue!(out, Print(ch))?;
        }
    }
    queue!(out, ResetColor)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_half_blocks_and_text() {
        let mut frame = FrameBuffer::new(3, 1);
        frame.clear(Rgb::new(10, 20, 30));
        frame.put_text(2, 0, "x", Rgb::WHITE);
        let mut out = Vec::new();
        write_frame(&mut out, &frame).expect("write to memory");
        let text = String::from_utf8(out).expect("utf-8 output");
        assert_eq!(text.matches('▀').count(), 2);
        assert!(text.contains('x'));
        assert!(text.contains("38;2;10;20;30"));
    }

    #[test]
    fn restore_errors_are_reported_not_dropped() {
        assert!(!report_restore_failure(Ok(())));
        assert!(report_restore_failure(Err(io::Error::new(io::ErrorKind::Other, "tty gone"))));
    }
}
