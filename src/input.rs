use crate::manipulation::PointerPosition;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Size of one terminal cell in logical pixels.
///
/// Pointer positions are reported in pixels so drag sensitivity reads as
/// degrees per pixel no matter how coarse the terminal grid is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f64,
    pub height: f64,
}

impl Default for CellMetrics {
    fn default() -> Self {
        CellMetrics { width: 8.0, height: 16.0 }
    }
}

impl CellMetrics {
    /// Center of the cell at `(col, row)`
    pub fn pointer_at(&self, col: u16, row: u16) -> PointerPosition {
        PointerPosition::new(
            (col as f64 + 0.5) * self.width,
            (row as f64 + 0.5) * self.height,
        )
    }

    /// Pointer position in canvas pixels (two per cell vertically)
    pub fn canvas_point(&self, position: PointerPosition) -> [f64; 2] {
        [position.x / self.width, position.y / (self.height / 2.0)]
    }

    pub fn cell_of(&self, position: PointerPosition) -> (u16, u16) {
        let col = (position.x / self.width).floor().max(0.0) as u16;
        let row = (position.y / self.height).floor().max(0.0) as u16;
        (col, row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Pointer left the interactive region (terminal lost focus)
    Leave,
}

/// Keyboard intents; the scene resolves them against its current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Confirm,
    Cancel,
    Inspect,
    Play,
    TogglePlayback,
    ZoomIn,
    ZoomOut,
    ToggleDebug,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer { phase: PointerPhase, position: PointerPosition },
    Wheel { delta_y: f64 },
    Key(KeyCommand),
    Resize { cols: u16, rows: u16 },
}

/// Turns raw terminal events into [`InputEvent`]s
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputAdapter {
    pub cells: CellMetrics,
    /// Wheel units reported per scroll notch
    pub wheel_step: f64,
    last_pointer: PointerPosition,
}

impl InputAdapter {
    pub fn new(cells: CellMetrics, wheel_step: f64) -> Self {
        InputAdapter { cells, wheel_step, last_pointer: PointerPosition::default() }
    }

    pub fn translate(&mut self, event: &Event) -> Option<InputEvent> {
        match event {
            Event::Mouse(mouse) => self.translate_mouse(mouse),
            Event::Key(key) => translate_key(key).map(InputEvent::Key),
            Event::FocusLost => Some(InputEvent::Pointer {
                phase: PointerPhase::Leave,
                position: self.last_pointer,
            }),
            Event::Resize(cols, rows) => Some(InputEvent::Resize { cols: *cols, rows: *rows }),
            _ => None,
        }
    }

    fn translate_mouse(&mut self, mouse: &MouseEvent) -> Option<InputEvent> {
        let position = self.cells.pointer_at(mouse.column, mouse.row);
        let phase = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => PointerPhase::Down,
            MouseEventKind::Up(MouseButton::Left) => PointerPhase::Up,
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => PointerPhase::Move,
            MouseEventKind::ScrollUp => return Some(InputEvent::Wheel { delta_y: -self.wheel_step }),
            MouseEventKind::ScrollDown => return Some(InputEvent::Wheel { delta_y: self.wheel_step }),
            _ => return None,
        };
        self.last_pointer = position;
        Some(InputEvent::Pointer { phase, position })
    }
}

fn translate_key(key: &KeyEvent) -> Option<KeyCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(KeyCommand::Quit),
            _ => None,
        };
    }
    let command = match key.code {
        KeyCode::Enter => KeyCommand::Confirm,
        KeyCode::Esc => KeyCommand::Cancel,
        KeyCode::Char(' ') => KeyCommand::TogglePlayback,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'i' => KeyCommand::Inspect,
            'p' => KeyCommand::Play,
            '+' | '=' => KeyCommand::ZoomIn,
            '-' | '_' => KeyCommand::ZoomOut,
            'd' => KeyCommand::ToggleDebug,
            'q' => KeyCommand::Quit,
            _ => return None,
        },
        _ => return None,
    };
    Some(command)
}
