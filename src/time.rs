use crate::math::{lerp, CubicBezier};
use std::time::{Duration, Instant};

/// Wall clock for the render loop
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        FrameClock { last: Instant::now() }
    }

    /// Time since the previous tick, or since construction
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last;
        self.last = now;
        delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Pending,
    Fired,
    Cancelled,
}

/// Handle to a one-shot deferred callback driven by explicit time steps.
///
/// The owner advances it every tick; it reports firing exactly once, and a
/// cancelled handle never fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHandle {
    remaining: Duration,
    state: TimerState,
}

impl TimerHandle {
    pub fn schedule(delay: Duration) -> Self {
        TimerHandle { remaining: delay, state: TimerState::Pending }
    }

    pub fn cancel(&mut self) {
        if self.state == TimerState::Pending {
            self.state = TimerState::Cancelled;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == TimerState::Pending
    }

    /// Advances the timer. Returns the time that elapsed past the deadline on
    /// the step where it fires, `None` on every other step.
    pub fn advance(&mut self, dt: Duration) -> Option<Duration> {
        if self.state != TimerState::Pending {
            return None;
        }
        if dt < self.remaining {
            self.remaining -= dt;
            return None;
        }
        let overshoot = dt - self.remaining;
        self.remaining = Duration::ZERO;
        self.state = TimerState::Fired;
        Some(overshoot)
    }
}

/// A scalar eased toward a target over a fixed duration, restartable
/// mid-flight from its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    elapsed: Duration,
    duration: Duration,
    easing: CubicBezier,
}

impl Tween {
    pub fn settled(value: f64, duration: Duration, easing: CubicBezier) -> Self {
        Tween { from: value, to: value, elapsed: duration, duration, easing }
    }

    pub fn value(&self) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        lerp(self.from, self.to, self.easing.at(t))
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn retarget(&mut self, to: f64) {
        if to == self.to {
            return;
        }
        self.from = self.value();
        self.to = to;
        self.elapsed = Duration::ZERO;
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
    }
}
