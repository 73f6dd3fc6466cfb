//! Pure mapping from scene state to what the renderer should show.

use crate::manipulation::SleeveTransform;
use crate::state::PlaybackState;
use std::time::Duration;

/// Arm angle resting beside the platter, degrees clockwise from vertical
pub const ARM_REST_DEG: f64 = -12.0;
/// Arm angle with the stylus on the record
pub const ARM_PLAYING_DEG: f64 = 22.0;
pub const ARM_SWING: Duration = Duration::from_millis(1000);
pub const DISC_FADE: Duration = Duration::from_millis(700);
/// One full disc revolution
pub const DISC_PERIOD: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscVisual {
    pub visible: bool,
    pub spinning: bool,
}

/// Glyph for the play/pause affordance over the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleGlyph {
    Pause,
    Play,
}

impl ToggleGlyph {
    pub fn symbol(self) -> &'static str {
        match self {
            ToggleGlyph::Pause => "||",
            ToggleGlyph::Play => ">",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualDescriptor {
    pub disc: DiscVisual,
    pub arm_raised: bool,
    pub cover_visible: bool,
    pub toggle: Option<ToggleGlyph>,
    pub inspection: Option<SleeveTransform>,
}

impl VisualDescriptor {
    pub fn arm_target_deg(&self) -> f64 {
        if self.arm_raised {
            ARM_PLAYING_DEG
        } else {
            ARM_REST_DEG
        }
    }

    pub fn disc_target_opacity(&self) -> f64 {
        if self.disc.visible {
            1.0
        } else {
            0.0
        }
    }
}

/// `inspection` is ignored unless the state is [`PlaybackState::Inspecting`].
pub fn derive_visuals(
    state: PlaybackState,
    inspection: Option<SleeveTransform>,
) -> VisualDescriptor {
    let loaded = state.has_record_loaded();
    VisualDescriptor {
        disc: DiscVisual { visible: loaded, spinning: state == PlaybackState::Playing },
        arm_raised: loaded,
        cover_visible: !state.is_inspecting(),
        toggle: match state {
            PlaybackState::Playing => Some(ToggleGlyph::Pause),
            PlaybackState::Paused => Some(ToggleGlyph::Play),
            _ => None,
        },
        inspection: inspection.filter(|_| state.is_inspecting()),
    }
}

/// Disc rotation after `dt`, in degrees within [0, 360)
pub fn advance_disc_angle(angle: f64, dt: Duration) -> f64 {
    let turns = dt.as_secs_f64() / DISC_PERIOD.as_secs_f64();
    (angle + turns * 360.0).rem_euclid(360.0)
}
