use crate::audio::AudioOutput;
use crate::graphics::{FrameBuffer, Rect, Rgb};
use crate::input::{CellMetrics, InputEvent, KeyCommand, PointerPhase};
use crate::manipulation::{
    InspectionEvent, ManipulationController, ManipulationTuning, PointerPosition, SleeveTransform,
    TransitionHint,
};
use crate::math::{lerp, CubicBezier};
use crate::sleeve::{self, SleeveView};
use crate::state::{Effect, PlaybackState, UserAction};
use crate::time::Tween;
use crate::visuals::{
    advance_disc_angle, derive_visuals, VisualDescriptor, ARM_REST_DEG, ARM_SWING, DISC_FADE,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const WALL_TOP: Rgb = Rgb::new(222, 214, 200);
const WALL_BOTTOM: Rgb = Rgb::new(196, 186, 170);
const TABLE: Rgb = Rgb::new(110, 78, 54);
const PLINTH: Rgb = Rgb::new(78, 56, 40);
const PLATTER: Rgb = Rgb::new(62, 62, 66);
const CRATE: Rgb = Rgb::new(150, 110, 70);
const ARM: Rgb = Rgb::new(205, 205, 210);
const TEXT: Rgb = Rgb::new(40, 34, 30);
const OVERLAY_TEXT: Rgb = Rgb::new(200, 200, 200);

pub struct SceneConfig {
    pub tuning: ManipulationTuning,
    pub cells: CellMetrics,
    /// Wheel units per +/- key press
    pub wheel_step: f64,
    pub debug: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            tuning: ManipulationTuning::default(),
            cells: CellMetrics::default(),
            wheel_step: 100.0,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Cell-addressed hit box for text buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    col: u16,
    row: u16,
    width: u16,
}

impl CellSpan {
    fn contains(&self, (col, row): (u16, u16)) -> bool {
        row == self.row && col >= self.col && col < self.col.saturating_add(self.width)
    }
}

/// Record player and crate positions, proportional to the canvas
#[derive(Debug, Clone, Copy)]
struct SceneLayout {
    table_top: f64,
    plinth: Rect,
    toggle_area: Rect,
    disc_center: [f64; 2],
    disc_radius: f64,
    arm_pivot: [f64; 2],
    arm_length: f64,
    cover: Rect,
    crate_box: Rect,
}

impl SceneLayout {
    fn new(width: f64, height: f64) -> Self {
        let disc_center = [width * 0.43, height * 0.505];
        let disc_radius = (width * 0.1575).min(height * 0.4);
        let arm_pivot = [width * 0.562, height * 0.23];
        let reach = ((disc_center[0] - arm_pivot[0]).powi(2)
            + (disc_center[1] - arm_pivot[1]).powi(2))
        .sqrt();
        let cover_side = (width * 0.216).min(height * 0.5);
        let cover = Rect::new(width * 0.714, height * 0.426, cover_side, cover_side);
        SceneLayout {
            table_top: height * 0.82,
            plinth: Rect::new(width * 0.24, height * 0.2, width * 0.38, height * 0.62),
            toggle_area: Rect::new(width * 0.25, height * 0.25, width * 0.35, height * 0.5),
            disc_center,
            disc_radius,
            arm_pivot,
            arm_length: reach * 0.9,
            crate_box: Rect::new(
                cover.x - 2.0,
                cover.y + cover_side * 0.35,
                cover_side + 4.0,
                cover_side * 0.65 + 3.0,
            ),
            cover,
        }
    }
}

/// Inspection overlay positions
#[derive(Debug, Clone, Copy)]
struct ModalLayout {
    sleeve: SleeveView,
    /// Pointer-down area that starts a drag: the untransformed sleeve box
    drag_area: Rect,
    close: CellSpan,
    play: CellSpan,
}

const CLOSE_LABEL: &str = "[X]";
const PLAY_LABEL: &str = " > PLAY RECORD ";
const MODAL_HINT: &str = "Drag to rotate - Scroll to zoom";

impl ModalLayout {
    fn new(cols: u16, rows: u16) -> Self {
        let width = cols as f64;
        let height = rows as f64 * 2.0;
        let side = (width * 0.45).min(height * 0.55);
        let center = [width / 2.0, height / 2.0];
        let play_width = PLAY_LABEL.chars().count() as u16;
        ModalLayout {
            sleeve: SleeveView::new(center, side),
            drag_area: Rect::new(center[0] - side / 2.0, center[1] - side / 2.0, side, side),
            close: CellSpan { col: cols.saturating_sub(5), row: 1, width: 3 },
            play: CellSpan {
                col: cols.saturating_sub(play_width) / 2,
                row: rows.saturating_sub(3),
                width: play_width,
            },
        }
    }
}

/// The transform actually drawn, chasing the controller according to its
/// transition hint. Manual changes run a linear transition from wherever the
/// drawn sleeve is, restarted whenever the target moves.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DisplayedSleeve {
    transform: SleeveTransform,
    from: SleeveTransform,
    target: SleeveTransform,
    elapsed: Duration,
}

impl DisplayedSleeve {
    fn settled(transform: SleeveTransform) -> Self {
        DisplayedSleeve {
            transform,
            from: transform,
            target: transform,
            elapsed: TransitionHint::Manual.duration(),
        }
    }

    fn follow(&mut self, target: SleeveTransform, dt: Duration) {
        match target.hint {
            // The controller already eases scripted motion
            TransitionHint::Scripted => *self = DisplayedSleeve::settled(target),
            TransitionHint::Manual => {
                if !same_pose(&target, &self.target) {
                    self.from = self.transform;
                    self.elapsed = Duration::ZERO;
                }
                self.target = target;

                let duration = target.hint.duration();
                self.elapsed = (self.elapsed + dt).min(duration);
                if self.elapsed >= duration {
                    self.transform = target;
                    return;
                }
                let t = self.elapsed.as_secs_f64() / duration.as_secs_f64();
                self.transform = SleeveTransform {
                    pitch: lerp(self.from.pitch, target.pitch, t),
                    yaw: lerp(self.from.yaw, target.yaw, t),
                    scale: lerp(self.from.scale, target.scale, t),
                    hint: target.hint,
                };
            }
        }
    }
}

fn same_pose(a: &SleeveTransform, b: &SleeveTransform) -> bool {
    a.pitch == b.pitch && a.yaw == b.yaw && a.scale == b.scale
}

/// Record player scene
pub struct SceneWidget {
    playback: PlaybackState,
    inspection: Option<ManipulationController>,
    audio: Box<dyn AudioOutput>,
    config: SceneConfig,
    size: (u16, u16),
    debug: bool,
    disc_angle: f64,
    disc_opacity: Tween,
    arm_angle: Tween,
    displayed: Option<DisplayedSleeve>,
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl SceneWidget {
    pub fn new(config: SceneConfig, audio: Box<dyn AudioOutput>, size: (u16, u16)) -> Self {
        SceneWidget {
            playback: PlaybackState::default(),
            inspection: None,
            audio,
            debug: config.debug,
            config,
            size,
            disc_angle: 0.0,
            disc_opacity: Tween::settled(0.0, DISC_FADE, CubicBezier::EASE_IN_OUT),
            arm_angle: Tween::settled(ARM_REST_DEG, ARM_SWING, CubicBezier::EASE_IN_OUT),
            displayed: None,
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn inspection(&self) -> Option<&ManipulationController> {
        self.inspection.as_ref()
    }

    pub fn disc_angle(&self) -> f64 {
        self.disc_angle
    }

    pub fn arm_angle(&self) -> f64 {
        self.arm_angle.value()
    }

    pub fn visuals(&self) -> VisualDescriptor {
        derive_visuals(self.playback, self.inspection.as_ref().map(|c| c.transform()))
    }

    /// Applies a user action through the playback state machine and runs
    /// its side effects.
    pub fn dispatch(&mut self, action: UserAction) {
        let Some(transition) = self.playback.transition(action) else {
            debug!(?action, state = %self.playback, "action ignored in current state");
            return;
        };
        debug!(?action, from = %transition.from, to = %transition.to, "playback transition");
        self.playback = transition.to;
        for effect in transition.effects {
            self.run_effect(*effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::MountInspection => {
                self.inspection = Some(ManipulationController::mount(self.config.tuning.clone()));
                self.displayed = None;
                info!("inspection view opened");
            }
            Effect::UnmountInspection => {
                // Dropping the controller also drops its pending entrance timer
                self.inspection = None;
                self.displayed = None;
                info!("inspection view closed");
            }
            Effect::StartAudio => {
                if let Err(err) = self.audio.start() {
                    warn!(error = %err, "audio playback failed to start");
                }
            }
            Effect::PauseAudio => self.audio.pause(),
            Effect::ResumeAudio => {
                if let Err(err) = self.audio.resume() {
                    warn!(error = %err, "audio playback failed to resume");
                }
            }
        }
    }

    fn inspect(&mut self, event: InspectionEvent) {
        if let Some(controller) = self.inspection.as_mut() {
            controller.apply(event);
        }
    }

    pub fn handle(&mut self, event: InputEvent) -> Flow {
        match event {
            InputEvent::Resize { cols, rows } => self.size = (cols, rows),
            InputEvent::Key(command) => return self.handle_key(command),
            InputEvent::Wheel { delta_y } => self.inspect(InspectionEvent::Wheel { delta_y }),
            InputEvent::Pointer { phase, position } => self.handle_pointer(phase, position),
        }
        Flow::Continue
    }

    fn handle_key(&mut self, command: KeyCommand) -> Flow {
        match command {
            KeyCommand::Quit => return Flow::Quit,
            KeyCommand::ToggleDebug => self.debug = !self.debug,
            KeyCommand::Inspect => self.dispatch(UserAction::OpenInspection),
            KeyCommand::Play => self.dispatch(UserAction::RequestPlay),
            KeyCommand::Cancel => self.dispatch(UserAction::CloseInspection),
            KeyCommand::TogglePlayback => self.dispatch(UserAction::TogglePlayPause),
            KeyCommand::Confirm => {
                let action = match self.playback {
                    PlaybackState::Idle => UserAction::OpenInspection,
                    PlaybackState::Inspecting => UserAction::RequestPlay,
                    PlaybackState::Playing | PlaybackState::Paused => UserAction::TogglePlayPause,
                };
                self.dispatch(action);
            }
            KeyCommand::ZoomIn => {
                self.inspect(InspectionEvent::Wheel { delta_y: -self.config.wheel_step })
            }
            KeyCommand::ZoomOut => {
                self.inspect(InspectionEvent::Wheel { delta_y: self.config.wheel_step })
            }
        }
        Flow::Continue
    }

    fn handle_pointer(&mut self, phase: PointerPhase, position: PointerPosition) {
        let canvas = self.config.cells.canvas_point(position);
        let (cols, rows) = self.size;
        match self.playback {
            PlaybackState::Inspecting => {
                let modal = ModalLayout::new(cols, rows);
                let cell = self.config.cells.cell_of(position);
                match phase {
                    PointerPhase::Down if modal.close.contains(cell) => {
                        self.dispatch(UserAction::CloseInspection)
                    }
                    PointerPhase::Down if modal.play.contains(cell) => {
                        self.dispatch(UserAction::RequestPlay)
                    }
                    PointerPhase::Down if modal.drag_area.contains(canvas) => {
                        self.inspect(InspectionEvent::PointerDown(position))
                    }
                    PointerPhase::Down => {}
                    PointerPhase::Move => self.inspect(InspectionEvent::PointerMove(position)),
                    PointerPhase::Up => self.inspect(InspectionEvent::PointerUp),
                    PointerPhase::Leave => self.inspect(InspectionEvent::PointerLeave),
                }
            }
            PlaybackState::Idle => {
                let layout = SceneLayout::new(cols as f64, rows as f64 * 2.0);
                if phase == PointerPhase::Down && layout.cover.contains(canvas) {
                    self.dispatch(UserAction::OpenInspection);
                }
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                let layout = SceneLayout::new(cols as f64, rows as f64 * 2.0);
                if phase == PointerPhase::Down && layout.toggle_area.contains(canvas) {
                    self.dispatch(UserAction::TogglePlayPause);
                }
            }
        }
    }

    /// Advances every time-driven part of the scene by `dt`
    pub fn tick(&mut self, dt: Duration) {
        self.audio.advance(dt);

        let visuals = self.visuals();
        if visuals.disc.spinning {
            self.disc_angle = advance_disc_angle(self.disc_angle, dt);
        }
        self.disc_opacity.retarget(visuals.disc_target_opacity());
        self.disc_opacity.advance(dt);
        self.arm_angle.retarget(visuals.arm_target_deg());
        self.arm_angle.advance(dt);

        self.inspect(InspectionEvent::Tick(dt));
        if let Some(controller) = &self.inspection {
            let target = controller.transform();
            match self.displayed.as_mut() {
                Some(displayed) => displayed.follow(target, dt),
                None => self.displayed = Some(DisplayedSleeve::settled(target)),
            }
        }
    }

    /// Paints the scene into `frame`, resizing it to the current terminal size
    pub fn paint(&mut self, frame: &mut FrameBuffer) {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let (cols, rows) = self.size;
        if frame.cols() != cols || frame.rows() != rows {
            frame.resize(cols, rows);
        }
        frame.clear(Rgb::BLACK);
        let visuals = self.visuals();

        self.paint_room(frame, &visuals);

        if let Some(transform) = visuals.inspection {
            let shown = self.displayed.map(|d| d.transform).unwrap_or(transform);
            paint_inspection(frame, &shown);
        } else {
            paint_status(frame, self.playback);
        }

        if self.debug {
            self.paint_debug(frame, &visuals);
        }
    }

    fn paint_room(&self, frame: &mut FrameBuffer, visuals: &VisualDescriptor) {
        let width = frame.width() as f64;
        let height = frame.height() as f64;
        let layout = SceneLayout::new(width, height);

        for y in 0..frame.height() {
            let color = if (y as f64) < layout.table_top {
                WALL_TOP.blend(WALL_BOTTOM, y as f64 / layout.table_top.max(1.0))
            } else {
                TABLE
            };
            for x in 0..frame.width() {
                frame.set_pixel(x as isize, y as isize, color);
            }
        }

        frame.fill_rect(layout.plinth, PLINTH);
        frame.fill_circle(layout.disc_center, layout.disc_radius * 1.04, PLATTER, 1.0);

        let opacity = self.disc_opacity.value();
        if opacity > 0.0 {
            let spin = self.disc_angle.to_radians();
            frame.shade_circle(layout.disc_center, layout.disc_radius, opacity, &|offset| {
                disc_art(offset, spin)
            });
        }

        paint_arm(frame, &layout, self.arm_angle.value());

        if visuals.cover_visible {
            frame.fill_rect(layout.crate_box, CRATE);
            let cover = layout.cover;
            for y in cover.y.round() as isize..(cover.y + cover.height).round() as isize {
                for x in cover.x.round() as isize..(cover.x + cover.width).round() as isize {
                    let uv = [
                        (x as f64 + 0.5 - cover.x) / cover.width,
                        (y as f64 + 0.5 - cover.y) / cover.height,
                    ];
                    frame.set_pixel(x, y, sleeve::front_art(uv));
                }
            }
        }

        if let Some(toggle) = visuals.toggle {
            let col = layout.toggle_area.x.round() as u16;
            let row = (layout.toggle_area.y / 2.0).round() as u16;
            frame.put_text(col, row, toggle.symbol(), Rgb::WHITE);
        }
        if self.playback == PlaybackState::Paused {
            let row = (layout.disc_center[1] / 2.0) as u16;
            let col = (layout.disc_center[0] as u16).saturating_sub(3);
            frame.put_text(col, row, "Paused", Rgb::WHITE);
        }
    }

    fn arm_status(&self) -> String {
        if self.arm_angle.is_settled() {
            format!("Arm: {:.1} deg", self.arm_angle.value())
        } else {
            format!("Arm: {:.1} -> {:.0} deg", self.arm_angle.value(), self.arm_angle.target())
        }
    }

    fn paint_debug(&self, frame: &mut FrameBuffer, visuals: &VisualDescriptor) {
        let mut lines = vec![
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!("State: {}", self.playback),
            format!("Disc: {:.1} deg  {}", self.disc_angle, self.arm_status()),
            format!("Track: {:.1}s", self.audio.position().as_secs_f64()),
        ];
        if let Some(transform) = visuals.inspection {
            lines.push(format!("Pitch: {:.2}, Yaw: {:.2}", transform.pitch, transform.yaw));
            lines.push(format!("Scale: {:.2} ({})", transform.scale, transform.hint.label()));
        }
        lines.push(format!("FPS: {:.2}", self.fps));

        let fg = if visuals.inspection.is_some() { Rgb::WHITE } else { TEXT };
        for (row, line) in lines.iter().enumerate() {
            frame.put_text(1, row as u16 + 2, line, fg);
        }
    }
}

fn paint_arm(frame: &mut FrameBuffer, layout: &SceneLayout, angle_deg: f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let [px, py] = layout.arm_pivot;
    // Clockwise from straight down in screen space
    let end = [px - sin * layout.arm_length, py + cos * layout.arm_length];
    frame.draw_line(px, py, end[0], end[1], ARM);
    frame.draw_line(px + 1.0, py, end[0] + 1.0, end[1], ARM);
    frame.fill_circle(end, 1.5, Rgb::new(90, 90, 95), 1.0);
    frame.fill_circle(layout.arm_pivot, 2.5, Rgb::new(120, 120, 125), 1.0);
}

/// Vinyl with grooves, a label, and a marker that shows rotation.
/// `offset` is relative to the disc center in radii.
fn disc_art(offset: [f64; 2], spin: f64) -> Rgb {
    let d = (offset[0] * offset[0] + offset[1] * offset[1]).sqrt();
    if d < 0.05 {
        return Rgb::new(200, 200, 200);
    }
    if d < 0.32 {
        let angle = offset[1].atan2(offset[0]);
        let diff = (angle - spin).rem_euclid(std::f64::consts::TAU);
        if d > 0.12 && (diff < 0.25 || diff > std::f64::consts::TAU - 0.25) {
            return Rgb::new(240, 230, 200);
        }
        return Rgb::new(178, 40, 36);
    }
    if ((d * 40.0) as u32) % 2 == 0 {
        Rgb::new(18, 18, 20)
    } else {
        Rgb::new(34, 34, 38)
    }
}

fn paint_inspection(frame: &mut FrameBuffer, transform: &SleeveTransform) {
    frame.dim(Rgb::BLACK, 0.8);
    let modal = ModalLayout::new(frame.cols(), frame.rows());
    sleeve::draw(frame, transform, &modal.sleeve);

    frame.put_text(2, 1, MODAL_HINT, OVERLAY_TEXT);
    frame.put_text(modal.close.col, modal.close.row, CLOSE_LABEL, Rgb::WHITE);
    frame.put_text(modal.play.col, modal.play.row, PLAY_LABEL, Rgb::WHITE);
}

fn paint_status(frame: &mut FrameBuffer, playback: PlaybackState) {
    let hint = match playback {
        PlaybackState::Idle => "[i] inspect record   [d] debug   [q] quit",
        PlaybackState::Playing => "[space] pause   [d] debug   [q] quit",
        PlaybackState::Paused => "[space] play   [d] debug   [q] quit",
        PlaybackState::Inspecting => "",
    };
    frame.put_text_centered(frame.rows().saturating_sub(1), hint, Rgb::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PlaybackStartFailure;
    use crate::manipulation::OrientationState;
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;
    use std::rc::Rc;

    const SIZE: (u16, u16) = (120, 40);

    #[derive(Default)]
    struct RecordingAudio {
        calls: Rc<RefCell<Vec<&'static str>>>,
        fail: bool,
    }

    impl RecordingAudio {
        fn failure(&self) -> Result<(), PlaybackStartFailure> {
            if self.fail {
                Err(PlaybackStartFailure::TrackUnavailable {
                    path: PathBuf::from("side-a.mp3"),
                    source: io::Error::new(io::ErrorKind::NotFound, "gone"),
                })
            } else {
                Ok(())
            }
        }
    }

    impl AudioOutput for RecordingAudio {
        fn start(&mut self) -> Result<(), PlaybackStartFailure> {
            self.calls.borrow_mut().push("start");
            self.failure()
        }

        fn pause(&mut self) {
            self.calls.borrow_mut().push("pause");
        }

        fn resume(&mut self) -> Result<(), PlaybackStartFailure> {
            self.calls.borrow_mut().push("resume");
            self.failure()
        }
    }

    fn scene_with(fail: bool) -> (SceneWidget, Rc<RefCell<Vec<&'static str>>>) {
        let audio = RecordingAudio { fail, ..RecordingAudio::default() };
        let calls = audio.calls.clone();
        (SceneWidget::new(SceneConfig::default(), Box::new(audio), SIZE), calls)
    }

    fn scene() -> SceneWidget {
        scene_with(false).0
    }

    /// Pointer position that lands on canvas pixel `point`
    fn pointer_on(point: [f64; 2]) -> PointerPosition {
        let cells = CellMetrics::default();
        PointerPosition::new(point[0] * cells.width, point[1] * cells.height / 2.0)
    }

    fn pointer_on_cell(col: u16, row: u16) -> PointerPosition {
        CellMetrics::default().pointer_at(col, row)
    }

    fn press(scene: &mut SceneWidget, position: PointerPosition) {
        scene.handle(InputEvent::Pointer { phase: PointerPhase::Down, position });
    }

    fn run_for(scene: &mut SceneWidget, total: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            scene.tick(Duration::from_millis(10));
            elapsed += Duration::from_millis(10);
        }
    }

    #[test]
    fn open_play_and_toggle_drive_audio() {
        let (mut scene, calls) = scene_with(false);
        scene.dispatch(UserAction::OpenInspection);
        assert_eq!(scene.playback(), PlaybackState::Inspecting);
        assert!(scene.inspection().is_some());

        scene.dispatch(UserAction::RequestPlay);
        assert_eq!(scene.playback(), PlaybackState::Playing);
        assert!(scene.inspection().is_none());

        scene.dispatch(UserAction::TogglePlayPause);
        scene.dispatch(UserAction::TogglePlayPause);
        assert_eq!(scene.playback(), PlaybackState::Playing);
        assert_eq!(*calls.borrow(), vec!["start", "pause", "resume"]);
    }

    #[test]
    fn audio_failure_keeps_visual_state() {
        let (mut scene, calls) = scene_with(true);
        scene.dispatch(UserAction::OpenInspection);
        scene.dispatch(UserAction::RequestPlay);
        assert_eq!(scene.playback(), PlaybackState::Playing);
        assert!(scene.visuals().disc.spinning);

        scene.dispatch(UserAction::TogglePlayPause);
        scene.dispatch(UserAction::TogglePlayPause);
        assert_eq!(scene.playback(), PlaybackState::Playing);
        assert_eq!(calls.borrow().len(), 3);
    }

    #[test]
    fn invalid_actions_are_ignored() {
        let (mut scene, calls) = scene_with(false);
        scene.dispatch(UserAction::RequestPlay);
        scene.dispatch(UserAction::TogglePlayPause);
        scene.dispatch(UserAction::CloseInspection);
        assert_eq!(scene.playback(), PlaybackState::Idle);
        assert!(calls.borrow().is_empty());

        scene.dispatch(UserAction::OpenInspection);
        scene.dispatch(UserAction::RequestPlay);
        scene.dispatch(UserAction::OpenInspection);
        assert_eq!(scene.playback(), PlaybackState::Playing);
        assert!(scene.inspection().is_none());
    }

    #[test]
    fn disc_spins_only_while_playing() {
        let mut scene = scene();
        run_for(&mut scene, Duration::from_millis(500));
        assert_eq!(scene.disc_angle(), 0.0);

        scene.dispatch(UserAction::OpenInspection);
        scene.dispatch(UserAction::RequestPlay);
        run_for(&mut scene, Duration::from_millis(500));
        let spun = scene.disc_angle();
        assert!(spun > 0.0);

        scene.dispatch(UserAction::TogglePlayPause);
        run_for(&mut scene, Duration::from_millis(500));
        assert_eq!(scene.disc_angle(), spun);

        scene.dispatch(UserAction::TogglePlayPause);
        run_for(&mut scene, Duration::from_millis(100));
        assert!(scene.disc_angle() > spun);
    }

    #[test]
    fn arm_swings_in_when_playing() {
        let mut scene = scene();
        scene.dispatch(UserAction::OpenInspection);
        scene.dispatch(UserAction::RequestPlay);
        run_for(&mut scene, Duration::from_millis(500));
        let midway = scene.arm_angle();
        assert!(midway > ARM_REST_DEG && midway < 22.0);
        run_for(&mut scene, Duration::from_millis(600));
        assert_eq!(scene.arm_angle(), 22.0);
    }

    #[test]
    fn clicking_cover_opens_inspection() {
        let mut scene = scene();
        let layout = SceneLayout::new(SIZE.0 as f64, SIZE.1 as f64 * 2.0);
        press(&mut scene, pointer_on(layout.plinth.center()));
        assert_eq!(scene.playback(), PlaybackState::Idle);

        press(&mut scene, pointer_on(layout.cover.center()));
        assert_eq!(scene.playback(), PlaybackState::Inspecting);
    }

    #[test]
    fn dragging_the_sleeve_rotates_it() {
        let mut scene = scene();
        scene.dispatch(UserAction::OpenInspection);
        let modal = ModalLayout::new(SIZE.0, SIZE.1);
        let start = pointer_on(modal.drag_area.center());
        press(&mut scene, start);
        scene.handle(InputEvent::Pointer {
            phase: PointerPhase::Move,
            position: PointerPosition::new(start.x + 50.0, start.y - 20.0),
        });
        scene.handle(InputEvent::Pointer { phase: PointerPhase::Up, position: start });
        run_for(&mut scene, Duration::from_millis(500));

        let controller = scene.inspection().expect("still inspecting");
        assert_eq!(controller.orientation(), OrientationState::new(10.0, 25.0));
        assert!(!controller.entrance_active());
    }

    #[test]
    fn pointer_down_outside_sleeve_does_not_start_drag() {
        let mut scene = scene();
        scene.dispatch(UserAction::OpenInspection);
        press(&mut scene, pointer_on([1.0, 1.0]));
        let controller = scene.inspection().expect("inspecting");
        assert!(!controller.drag().active);
        assert!(controller.entrance_active());
    }

    #[test]
    fn modal_buttons_close_and_play() {
        let modal = ModalLayout::new(SIZE.0, SIZE.1);

        let mut scene = scene();
        scene.dispatch(UserAction::OpenInspection);
        press(&mut scene, pointer_on_cell(modal.close.col + 1, modal.close.row));
        assert_eq!(scene.playback(), PlaybackState::Idle);
        assert!(scene.inspection().is_none());

        scene.dispatch(UserAction::OpenInspection);
        press(&mut scene, pointer_on_cell(modal.play.col + 2, modal.play.row));
        assert_eq!(scene.playback(), PlaybackState::Playing);

        let layout = SceneLayout::new(SIZE.0 as f64, SIZE.1 as f64 * 2.0);
        press(&mut scene, pointer_on(layout.toggle_area.center()));
        assert_eq!(scene.playback(), PlaybackState::Paused);
    }

    #[test]
    fn reopening_starts_from_a_fresh_controller() {
        let mut scene = scene();
        scene.dispatch(UserAction::OpenInspection);
        scene.handle(InputEvent::Wheel { delta_y: -300.0 });
        run_for(&mut scene, Duration::from_millis(2000));
        scene.handle(InputEvent::Key(KeyCommand::Cancel));
        assert!(scene.inspection().is_none());

        scene.handle(InputEvent::Key(KeyCommand::Inspect));
        let controller = scene.inspection().expect("reopened");
        assert_eq!(controller.orientation(), OrientationState::default());
        assert_eq!(controller.zoom().scale, 1.0);
        assert!(controller.entrance_active());
    }

    #[test]
    fn wheel_outside_inspection_is_ignored() {
        let mut scene = scene();
        scene.handle(InputEvent::Wheel { delta_y: 500.0 });
        scene.handle(InputEvent::Key(KeyCommand::ZoomIn));
        assert!(scene.inspection().is_none());
        assert_eq!(scene.playback(), PlaybackState::Idle);
    }

    #[test]
    fn zoom_keys_use_wheel_step() {
        let mut scene = scene();
        scene.handle(InputEvent::Key(KeyCommand::Confirm));
        scene.handle(InputEvent::Key(KeyCommand::ZoomIn));
        let scale = scene.inspection().expect("inspecting").zoom().scale;
        assert!((scale - 1.2).abs() < 1e-9);
        scene.handle(InputEvent::Key(KeyCommand::ZoomOut));
        scene.handle(InputEvent::Key(KeyCommand::ZoomOut));
        let scale = scene.inspection().expect("inspecting").zoom().scale;
        assert!((scale - 0.8).abs() < 1e-9);
    }

    #[test]
    fn confirm_walks_through_the_scene() {
        let mut scene = scene();
        for expected in [
            PlaybackState::Inspecting,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Playing,
        ] {
            assert_eq!(scene.handle(InputEvent::Key(KeyCommand::Confirm)), Flow::Continue);
            assert_eq!(scene.playback(), expected);
        }
        assert_eq!(scene.handle(InputEvent::Key(KeyCommand::Quit)), Flow::Quit);
    }

    fn manual(pitch: f64, yaw: f64, scale: f64) -> SleeveTransform {
        SleeveTransform { pitch, yaw, scale, hint: TransitionHint::Manual }
    }

    #[test]
    fn displayed_sleeve_lands_on_target_after_manual_duration() {
        let mut displayed = DisplayedSleeve::settled(manual(0.0, 0.0, 1.0));
        let target = manual(10.0, 100.0, 2.0);
        let frame = Duration::from_millis(16);

        displayed.follow(target, frame);
        assert!((displayed.transform.yaw - 32.0).abs() < 1e-9);
        displayed.follow(target, frame);
        displayed.follow(target, frame);
        assert!((displayed.transform.yaw - 96.0).abs() < 1e-9);
        displayed.follow(target, frame);
        assert_eq!(displayed.transform, target);
        displayed.follow(target, frame);
        assert_eq!(displayed.transform, target);
    }

    #[test]
    fn displayed_sleeve_restarts_from_current_pose_when_target_moves() {
        let mut displayed = DisplayedSleeve::settled(manual(0.0, 0.0, 1.0));
        displayed.follow(manual(0.0, 100.0, 1.0), Duration::from_millis(25));
        assert!((displayed.transform.yaw - 50.0).abs() < 1e-9);

        displayed.follow(manual(0.0, 150.0, 1.0), Duration::from_millis(25));
        assert!((displayed.transform.yaw - 100.0).abs() < 1e-9);
        displayed.follow(manual(0.0, 150.0, 1.0), Duration::from_millis(25));
        assert_eq!(displayed.transform.yaw, 150.0);
    }

    #[test]
    fn displayed_sleeve_follows_scripted_motion_exactly() {
        let mut displayed = DisplayedSleeve::settled(manual(0.0, 0.0, 1.0));
        let scripted = SleeveTransform { hint: TransitionHint::Scripted, ..manual(3.0, -5.0, 1.0) };
        displayed.follow(scripted, Duration::from_millis(1));
        assert_eq!(displayed.transform, scripted);

        // Handing over to manual at the same pose does not restart anything
        displayed.follow(manual(3.0, -5.0, 1.0), Duration::from_millis(1));
        assert_eq!(displayed.transform, manual(3.0, -5.0, 1.0));
    }

    #[test]
    fn modal_labels_fill_exactly_their_hit_boxes() {
        for label in [CLOSE_LABEL, PLAY_LABEL, MODAL_HINT] {
            assert!(label.is_ascii(), "{label:?} may render wider than one column per char");
        }

        let mut scene = scene();
        scene.dispatch(UserAction::OpenInspection);
        let mut frame = FrameBuffer::new(1, 1);
        scene.tick(Duration::from_millis(16));
        scene.paint(&mut frame);

        let modal = ModalLayout::new(SIZE.0, SIZE.1);
        for (span, label) in [(modal.play, PLAY_LABEL), (modal.close, CLOSE_LABEL)] {
            assert_eq!(span.width as usize, label.len());
            let drawn: String = (span.col..span.col + span.width)
                .filter_map(|col| frame.glyph(col, span.row).map(|g| g.ch))
                .collect();
            assert_eq!(drawn, label);
        }
    }

    #[test]
    fn paint_covers_every_state_and_tiny_terminals() {
        for size in [SIZE, (40, 12), (2, 1)] {
            let mut scene = SceneWidget::new(
                SceneConfig { debug: true, ..SceneConfig::default() },
                Box::new(RecordingAudio::default()),
                size,
            );
            let mut frame = FrameBuffer::new(1, 1);
            for action in [
                None,
                Some(UserAction::OpenInspection),
                Some(UserAction::RequestPlay),
                Some(UserAction::TogglePlayPause),
            ] {
                if let Some(action) = action {
                    scene.dispatch(action);
                }
                scene.tick(Duration::from_millis(16));
                scene.paint(&mut frame);
                assert_eq!((frame.cols(), frame.rows()), size);
            }
        }
    }

    #[test]
    fn resize_updates_hit_testing() {
        let mut scene = scene();
        scene.handle(InputEvent::Resize { cols: 60, rows: 20 });
        let layout = SceneLayout::new(60.0, 40.0);
        press(&mut scene, pointer_on(layout.cover.center()));
        assert_eq!(scene.playback(), PlaybackState::Inspecting);
    }
}
