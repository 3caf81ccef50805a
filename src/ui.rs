use crate::phase::StablePhase;
use bitflags::bitflags;
use serde::Deserialize;

bitflags! {
    /// Page elements whose visibility follows the viewer state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Affordance: u32 {
        const LOADING = 1 << 0;
        const LOAD_ERROR = 1 << 1;
        const CANVAS = 1 << 2;
        const DISCOVER_MORE = 1 << 3;
        const BUTTON_BAR = 1 << 4;
        const FREE_ROTATE = 1 << 5;
        const POI_REVERSED = 1 << 6;
        const POI_CLOSED = 1 << 7;
        const POI_EXPLODED = 1 << 8;
        const POI_UNFOLDED = 1 << 9;
        const POI_FOLDED = 1 << 10;

        const POINTS_OF_INTEREST = Self::POI_REVERSED.bits()
            | Self::POI_CLOSED.bits()
            | Self::POI_EXPLODED.bits()
            | Self::POI_UNFOLDED.bits()
            | Self::POI_FOLDED.bits();
    }
}

impl Affordance {
    pub fn point_of_interest(phase: StablePhase) -> Self {
        match phase {
            StablePhase::Reversed => Affordance::POI_REVERSED,
            StablePhase::Closed => Affordance::POI_CLOSED,
            StablePhase::Exploded => Affordance::POI_EXPLODED,
            StablePhase::Unfolded => Affordance::POI_UNFOLDED,
            StablePhase::Folded => Affordance::POI_FOLDED,
        }
    }
}

/// Which of its three faces a phase button in the bar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Phase lies behind the current one.
    Backward,
    Current,
    Forward,
}

/// Which optional controls a variant exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AffordanceConfig {
    #[serde(default = "AffordanceConfig::enabled")]
    pub discover_more: bool,
    #[serde(default = "AffordanceConfig::enabled")]
    pub free_rotation: bool,
    #[serde(default = "AffordanceConfig::enabled")]
    pub points_of_interest: bool,
}

impl AffordanceConfig {
    const fn enabled() -> bool {
        true
    }
}

impl Default for AffordanceConfig {
    fn default() -> Self {
        Self { discover_more: true, free_rotation: true, points_of_interest: true }
    }
}

/// Everything the page shows, recomputed from phase rather than toggled
/// element by element.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub visible: Affordance,
    pub buttons: [ButtonState; 5],
    /// Fill fraction of the phase progress label.
    pub progress: f32,
    pub load_progress: f32,
    pub error: Option<String>,
    enabled: AffordanceConfig,
}

impl UiState {
    pub fn loading(enabled: AffordanceConfig) -> Self {
        let mut state = Self {
            visible: Affordance::LOADING,
            buttons: [ButtonState::Forward; 5],
            progress: 0.0,
            load_progress: 0.0,
            error: None,
            enabled,
        };
        state.set_buttons(StablePhase::Closed);
        state
    }

    pub fn is_visible(&self, affordance: Affordance) -> bool {
        self.visible.contains(affordance)
    }

    pub fn button(&self, phase: StablePhase) -> ButtonState {
        self.buttons[phase.bar_index()]
    }

    pub fn set_load_progress(&mut self, loaded: u64, total: u64) {
        if total == 0 {
            return;
        }
        self.load_progress = (loaded as f64 / total as f64).clamp(0.0, 1.0) as f32;
    }

    pub fn show_ready(&mut self) {
        self.visible.remove(Affordance::LOADING);
        self.visible.insert(Affordance::CANVAS);
        self.load_progress = 1.0;
        if self.enabled.discover_more {
            self.visible.insert(Affordance::DISCOVER_MORE);
        } else {
            self.show_controls();
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.visible = Affordance::LOAD_ERROR;
        self.error = Some(message.into());
    }

    pub fn hide_discover(&mut self) {
        self.visible.remove(Affordance::DISCOVER_MORE);
    }

    pub fn show_controls(&mut self) {
        self.visible.insert(Affordance::BUTTON_BAR);
        if self.enabled.free_rotation {
            self.visible.insert(Affordance::FREE_ROTATE);
        }
    }

    pub fn set_bar_visible(&mut self, visible: bool) {
        self.visible.set(Affordance::BUTTON_BAR, visible);
    }

    /// Applied the moment a transition starts, before anything has moved.
    pub fn show_pending(&mut self, target: StablePhase) {
        self.visible.remove(Affordance::POINTS_OF_INTEREST);
        self.set_buttons(target);
    }

    /// Applied once the target phase has been reached.
    pub fn show_settled(&mut self, phase: StablePhase) {
        self.set_buttons(phase);
        self.visible.remove(Affordance::POINTS_OF_INTEREST);
        if self.enabled.points_of_interest {
            self.visible.insert(Affordance::point_of_interest(phase));
        }
    }

    fn set_buttons(&mut self, current: StablePhase) {
        let current_index = current.bar_index();
        for phase in StablePhase::ALL {
            let index = phase.bar_index();
            self.buttons[index] = if index < current_index {
                ButtonState::Backward
            } else if index == current_index {
                ButtonState::Current
            } else {
                ButtonState::Forward
            };
        }
        self.progress = (current_index as f32 + 0.5) / StablePhase::ALL.len() as f32;
    }
}
