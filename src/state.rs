use std::fmt;

/// Where the scene is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Record player at rest, sleeve on the crate
    #[default]
    Idle,
    /// Inspection view open over the scene
    Inspecting,
    /// Disc spinning, arm down
    Playing,
    /// Disc frozen in place, arm still down
    Paused,
}

/// What the user asked for, independent of how they asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    OpenInspection,
    CloseInspection,
    RequestPlay,
    TogglePlayPause,
}

/// Work the owner of the state machine must carry out after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    MountInspection,
    UnmountInspection,
    StartAudio,
    PauseAudio,
    ResumeAudio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlaybackState,
    pub to: PlaybackState,
    pub effects: &'static [Effect],
}

impl PlaybackState {
    /// Resolves `action` against the current state.
    ///
    /// Returns `None` when the action has no meaning here; the caller keeps
    /// the current state.
    pub fn transition(self, action: UserAction) -> Option<Transition> {
        use PlaybackState::*;
        use UserAction::*;

        let (to, effects): (PlaybackState, &'static [Effect]) = match (self, action) {
            (Idle, OpenInspection) => (Inspecting, &[Effect::MountInspection]),
            (Inspecting, CloseInspection) => (Idle, &[Effect::UnmountInspection]),
            (Inspecting, RequestPlay) => {
                (Playing, &[Effect::UnmountInspection, Effect::StartAudio])
            }
            (Playing, TogglePlayPause) => (Paused, &[Effect::PauseAudio]),
            (Paused, TogglePlayPause) => (Playing, &[Effect::ResumeAudio]),
            _ => return None,
        };
        Some(Transition { from: self, to, effects })
    }

    pub fn is_inspecting(self) -> bool {
        self == PlaybackState::Inspecting
    }

    /// Playing or paused: the record is on the platter
    pub fn has_record_loaded(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Inspecting => "inspecting",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [PlaybackState; 4] = [
        PlaybackState::Idle,
        PlaybackState::Inspecting,
        PlaybackState::Playing,
        PlaybackState::Paused,
    ];

    const ALL_ACTIONS: [UserAction; 4] = [
        UserAction::OpenInspection,
        UserAction::CloseInspection,
        UserAction::RequestPlay,
        UserAction::TogglePlayPause,
    ];

    fn next(state: PlaybackState, action: UserAction) -> PlaybackState {
        state.transition(action).map(|t| t.to).unwrap_or(state)
    }

    #[test]
    fn starts_idle() {
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
    }

    #[test]
    fn open_then_play_then_toggle_twice() {
        let inspecting = next(PlaybackState::Idle, UserAction::OpenInspection);
        assert_eq!(inspecting, PlaybackState::Inspecting);

        let play = inspecting.transition(UserAction::RequestPlay).expect("play from inspection");
        assert_eq!(play.to, PlaybackState::Playing);
        assert_eq!(play.effects, &[Effect::UnmountInspection, Effect::StartAudio]);

        let pause = play.to.transition(UserAction::TogglePlayPause).expect("pause");
        assert_eq!(pause.to, PlaybackState::Paused);
        assert_eq!(pause.effects, &[Effect::PauseAudio]);

        let resume = pause.to.transition(UserAction::TogglePlayPause).expect("resume");
        assert_eq!(resume.to, PlaybackState::Playing);
        assert_eq!(resume.effects, &[Effect::ResumeAudio]);
    }

    #[test]
    fn close_returns_to_idle_and_unmounts() {
        let close = PlaybackState::Inspecting
            .transition(UserAction::CloseInspection)
            .expect("close");
        assert_eq!(close.to, PlaybackState::Idle);
        assert_eq!(close.effects, &[Effect::UnmountInspection]);
    }

    #[test]
    fn inspection_only_reachable_from_idle() {
        for state in ALL_STATES {
            let opened = state.transition(UserAction::OpenInspection);
            assert_eq!(opened.is_some(), state == PlaybackState::Idle, "from {state}");
        }
    }

    #[test]
    fn no_shortcut_from_idle_to_playback() {
        assert_eq!(next(PlaybackState::Idle, UserAction::RequestPlay), PlaybackState::Idle);
        assert_eq!(next(PlaybackState::Idle, UserAction::TogglePlayPause), PlaybackState::Idle);
    }

    #[test]
    fn every_transition_reports_its_origin_and_keeps_exclusivity() {
        for state in ALL_STATES {
            for action in ALL_ACTIONS {
                if let Some(transition) = state.transition(action) {
                    assert_eq!(transition.from, state);
                    assert_ne!(transition.to, state);
                    let mounts = transition.effects.contains(&Effect::MountInspection);
                    assert_eq!(mounts, transition.to.is_inspecting());
                }
            }
        }
    }
}
