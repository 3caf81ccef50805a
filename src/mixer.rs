use crate::clips::{ClipDescriptor, ClipTable};
use serde::Deserialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    #[default]
    Once,
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixerEvent {
    Looped { clip: Arc<str> },
    Finished { clip: Arc<str> },
}

impl MixerEvent {
    pub fn clip(&self) -> &Arc<str> {
        match self {
            MixerEvent::Looped { clip } | MixerEvent::Finished { clip } => clip,
        }
    }
}

pub type MixerEvents = SmallVec<[MixerEvent; 2]>;

/// The animation-mixing collaborator: one playable action per clip.
///
/// Implementations own sampling the skeletal track; the viewer only decides
/// which action plays, its loop mode and where its time cursor sits.
pub trait AnimationMixer {
    /// Registers an action for every clip in the table. Called once at load.
    fn register(&mut self, clips: &ClipTable);
    /// Restarts the action from time zero. Returns false for unknown clips.
    fn play(&mut self, clip: &str, mode: LoopMode) -> bool;
    fn stop(&mut self, clip: &str);
    /// Moves the time cursor and resumes playback from there.
    fn seek(&mut self, clip: &str, seconds: f32);
    fn is_playing(&self, clip: &str) -> bool;
    fn time(&self, clip: &str) -> Option<f32>;
    fn update(&mut self, dt: f32) -> MixerEvents;
}

#[derive(Debug, Clone)]
struct ActionState {
    duration: f32,
    time: f32,
    mode: LoopMode,
    playing: bool,
}

/// Headless mixer that only tracks action time cursors.
#[derive(Debug, Default)]
pub struct ClipPlayer {
    actions: HashMap<Arc<str>, ActionState>,
    order: Vec<Arc<str>>,
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clips(clips: &ClipTable) -> Self {
        let mut player = Self::new();
        player.register(clips);
        player
    }

    fn add_action(&mut self, clip: &ClipDescriptor) {
        if !self.actions.contains_key(&clip.name) {
            self.order.push(Arc::clone(&clip.name));
        }
        self.actions.insert(
            Arc::clone(&clip.name),
            ActionState { duration: clip.duration(), time: 0.0, mode: clip.looping, playing: false },
        );
    }

    pub fn playing(&self) -> Vec<Arc<str>> {
        self.order.iter().filter(|name| self.is_playing(name)).cloned().collect()
    }
}

impl AnimationMixer for ClipPlayer {
    fn register(&mut self, clips: &ClipTable) {
        for clip in clips.iter() {
            self.add_action(clip);
        }
    }

    fn play(&mut self, clip: &str, mode: LoopMode) -> bool {
        let Some(action) = self.actions.get_mut(clip) else {
            return false;
        };
        action.mode = mode;
        action.time = 0.0;
        action.playing = true;
        true
    }

    fn stop(&mut self, clip: &str) {
        if let Some(action) = self.actions.get_mut(clip) {
            action.playing = false;
            action.time = 0.0;
        }
    }

    fn seek(&mut self, clip: &str, seconds: f32) {
        if let Some(action) = self.actions.get_mut(clip) {
            action.time = seconds.clamp(0.0, action.duration.max(0.0));
            action.playing = true;
        }
    }

    fn is_playing(&self, clip: &str) -> bool {
        self.actions.get(clip).is_some_and(|action| action.playing)
    }

    fn time(&self, clip: &str) -> Option<f32> {
        self.actions.get(clip).map(|action| action.time)
    }

    fn update(&mut self, dt: f32) -> MixerEvents {
        let mut events = MixerEvents::new();
        if !(dt > 0.0) {
            return events;
        }
        for name in &self.order {
            let Some(action) = self.actions.get_mut(name) else {
                continue;
            };
            if !action.playing {
                continue;
            }
            if action.duration <= 0.0 {
                action.time = 0.0;
                continue;
            }
            let new_time = action.time + dt;
            match action.mode {
                LoopMode::Repeat => {
                    if new_time >= action.duration {
                        events.push(MixerEvent::Looped { clip: Arc::clone(name) });
                    }
                    action.time = new_time.rem_euclid(action.duration.max(f32::EPSILON));
                }
                LoopMode::Once => {
                    if new_time >= action.duration {
                        action.time = action.duration;
                        action.playing = false;
                        events.push(MixerEvent::Finished { clip: Arc::clone(name) });
                    } else {
                        action.time = new_time;
                    }
                }
            }
        }
        events
    }
}
