//! Rotation and zoom of the record sleeve while the inspection view is open.
//!
//! A [`ManipulationController`] exists only while the view is mounted. It
//! turns pointer drags into pitch/yaw, wheel deltas into scale, and plays a
//! short scripted entrance that any drag interrupts in place.

use crate::math::{lerp, CubicBezier};
use crate::time::TimerHandle;
use std::time::Duration;
use tracing::{debug, trace};

/// Pitch is clamped to ±this many degrees so the sleeve never flips over.
pub const PITCH_LIMIT: f64 = 60.0;
pub const MIN_SCALE: f64 = 0.6;
pub const MAX_SCALE: f64 = 2.5;

/// Pointer location in logical pixels, independent of the event source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        PointerPosition { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationState {
    /// Degrees around the horizontal screen axis, within ±[`PITCH_LIMIT`]
    pub pitch: f64,
    /// Degrees around the vertical screen axis, unbounded
    pub yaw: f64,
}

impl OrientationState {
    pub const fn new(pitch: f64, yaw: f64) -> Self {
        OrientationState { pitch, yaw }
    }

    /// Applies a pointer delta. Right increases yaw, up increases pitch.
    pub fn dragged_by(self, dx: f64, dy: f64, sensitivity: f64) -> Self {
        OrientationState {
            pitch: (self.pitch - dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT),
            yaw: self.yaw + dx * sensitivity,
        }
    }

    pub fn interpolate(self, to: OrientationState, t: f64) -> Self {
        OrientationState { pitch: lerp(self.pitch, to.pitch, t), yaw: lerp(self.yaw, to.yaw, t) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub scale: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        ZoomState { scale: 1.0 }
    }
}

impl ZoomState {
    /// Positive wheel deltas (scrolling down) zoom out.
    pub fn zoomed_by(self, wheel_delta_y: f64, step: f64) -> Self {
        ZoomState { scale: (self.scale - wheel_delta_y * step).clamp(MIN_SCALE, MAX_SCALE) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragSession {
    pub active: bool,
    pub last_pointer: PointerPosition,
}

/// How the renderer should blend toward the current transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionHint {
    /// Entrance animation in progress: slow and eased
    Scripted,
    /// User in control: near-instant
    Manual,
}

impl TransitionHint {
    pub fn duration(self) -> Duration {
        match self {
            TransitionHint::Scripted => Duration::from_millis(1500),
            TransitionHint::Manual => Duration::from_millis(50),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransitionHint::Scripted => "scripted",
            TransitionHint::Manual => "manual",
        }
    }
}

/// Everything the renderer needs to place the sleeve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleeveTransform {
    pub pitch: f64,
    pub yaw: f64,
    pub scale: f64,
    pub hint: TransitionHint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationTuning {
    /// Degrees of rotation per pixel of drag
    pub sensitivity: f64,
    /// Scale change per wheel unit
    pub zoom_step: f64,
    /// Pause between mount and the start of the entrance animation
    pub settle_delay: Duration,
    pub showcase: OrientationState,
    pub entrance_duration: Duration,
    pub entrance_easing: CubicBezier,
}

impl Default for ManipulationTuning {
    fn default() -> Self {
        ManipulationTuning {
            sensitivity: 0.5,
            zoom_step: 0.002,
            settle_delay: Duration::from_millis(100),
            showcase: OrientationState::new(15.0, -25.0),
            entrance_duration: TransitionHint::Scripted.duration(),
            entrance_easing: CubicBezier::SHOWCASE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EntrancePhase {
    /// Reset but not yet scheduled
    Armed,
    Settling(TimerHandle),
    Easing { elapsed: Duration },
    Finished,
}

/// One-shot scripted rotation from the origin to the showcase angle.
#[derive(Debug, Clone, PartialEq)]
struct EntranceAnimation {
    phase: EntrancePhase,
}

impl EntranceAnimation {
    fn armed() -> Self {
        EntranceAnimation { phase: EntrancePhase::Armed }
    }

    fn is_running(&self) -> bool {
        self.phase != EntrancePhase::Finished
    }

    fn schedule(&mut self, delay: Duration) {
        if self.phase == EntrancePhase::Armed {
            self.phase = EntrancePhase::Settling(TimerHandle::schedule(delay));
        }
    }

    fn cancel(&mut self) {
        if let EntrancePhase::Settling(timer) = &mut self.phase {
            if timer.is_pending() {
                debug!("entrance cancelled before it started");
            }
            timer.cancel();
        }
        self.phase = EntrancePhase::Finished;
    }

    /// Steps the animation and returns the orientation it dictates, if any.
    fn advance(&mut self, dt: Duration, tuning: &ManipulationTuning) -> Option<OrientationState> {
        let elapsed = match &mut self.phase {
            EntrancePhase::Armed | EntrancePhase::Finished => return None,
            EntrancePhase::Settling(timer) => timer.advance(dt)?,
            EntrancePhase::Easing { elapsed } => *elapsed + dt,
        };

        let origin = OrientationState::default();
        if elapsed >= tuning.entrance_duration {
            self.phase = EntrancePhase::Finished;
            return Some(tuning.showcase);
        }
        self.phase = EntrancePhase::Easing { elapsed };
        let t = elapsed.as_secs_f64() / tuning.entrance_duration.as_secs_f64();
        Some(origin.interpolate(tuning.showcase, tuning.entrance_easing.at(t)))
    }
}

/// Input the controller reacts to, already normalized by the input adapter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InspectionEvent {
    PointerDown(PointerPosition),
    PointerMove(PointerPosition),
    PointerUp,
    PointerLeave,
    Wheel { delta_y: f64 },
    Tick(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationController {
    orientation: OrientationState,
    zoom: ZoomState,
    drag: DragSession,
    entrance: EntranceAnimation,
    tuning: ManipulationTuning,
}

impl ManipulationController {
    /// Creates a controller for a freshly opened inspection view and
    /// schedules its entrance animation.
    pub fn mount(tuning: ManipulationTuning) -> Self {
        let mut controller = ManipulationController {
            orientation: OrientationState::default(),
            zoom: ZoomState::default(),
            drag: DragSession::default(),
            entrance: EntranceAnimation::armed(),
            tuning,
        };
        controller.reset();
        controller.run_entrance_animation();
        controller
    }

    pub fn orientation(&self) -> OrientationState {
        self.orientation
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn drag(&self) -> DragSession {
        self.drag
    }

    pub fn tuning(&self) -> &ManipulationTuning {
        &self.tuning
    }

    /// True from mount until the entrance finishes or a drag interrupts it
    pub fn entrance_active(&self) -> bool {
        self.entrance.is_running()
    }

    pub fn transition_hint(&self) -> TransitionHint {
        if self.entrance_active() {
            TransitionHint::Scripted
        } else {
            TransitionHint::Manual
        }
    }

    pub fn transform(&self) -> SleeveTransform {
        SleeveTransform {
            pitch: self.orientation.pitch,
            yaw: self.orientation.yaw,
            scale: self.zoom.scale,
            hint: self.transition_hint(),
        }
    }

    pub fn apply(&mut self, event: InspectionEvent) {
        match event {
            InspectionEvent::PointerDown(position) => self.begin_drag(position),
            InspectionEvent::PointerMove(position) => self.continue_drag(position),
            InspectionEvent::PointerUp | InspectionEvent::PointerLeave => self.end_drag(),
            InspectionEvent::Wheel { delta_y } => self.apply_zoom_delta(delta_y),
            InspectionEvent::Tick(dt) => self.advance(dt),
        }
    }

    pub fn begin_drag(&mut self, position: PointerPosition) {
        if self.entrance_active() {
            debug!(
                pitch = self.orientation.pitch,
                yaw = self.orientation.yaw,
                "drag interrupted entrance animation"
            );
            self.entrance.cancel();
        }
        self.drag = DragSession { active: true, last_pointer: position };
    }

    pub fn continue_drag(&mut self, position: PointerPosition) {
        if !self.drag.active {
            return;
        }
        let dx = position.x - self.drag.last_pointer.x;
        let dy = position.y - self.drag.last_pointer.y;
        self.orientation = self.orientation.dragged_by(dx, dy, self.tuning.sensitivity);
        self.drag.last_pointer = position;
        trace!(pitch = self.orientation.pitch, yaw = self.orientation.yaw, "drag");
    }

    /// Ends the drag session; pointer release and pointer leave both land here.
    pub fn end_drag(&mut self) {
        self.drag.active = false;
    }

    pub fn apply_zoom_delta(&mut self, wheel_delta_y: f64) {
        self.zoom = self.zoom.zoomed_by(wheel_delta_y, self.tuning.zoom_step);
        trace!(scale = self.zoom.scale, "zoom");
    }

    /// Schedules the entrance animation. Only the first call after a reset
    /// has any effect.
    pub fn run_entrance_animation(&mut self) {
        self.entrance.schedule(self.tuning.settle_delay);
    }

    /// Advances scripted motion by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        if let Some(orientation) = self.entrance.advance(dt, &self.tuning) {
            self.orientation = orientation;
            if !self.entrance.is_running() {
                debug!("entrance animation finished");
            }
        }
    }

    pub fn reset(&mut self) {
        self.orientation = OrientationState::default();
        self.zoom = ZoomState::default();
        self.drag = DragSession::default();
        self.entrance = EntranceAnimation::armed();
    }
}
