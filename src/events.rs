use crate::phase::{IgnoreReason, Phase, Request, StablePhase};
use crate::transform::Slot;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Loaded { track_frames: Option<u32> },
    LoadFailed { message: String },
    RequestIgnored { request: Request, reason: IgnoreReason },
    TransitionStarted { from: StablePhase, to: StablePhase, transient: Phase },
    StageStarted { to: StablePhase, stage: usize, clip: Option<Arc<str>> },
    TransitionCompleted { phase: StablePhase },
    ClipStarted { clip: Arc<str> },
    ClipStopped { clip: Arc<str> },
    ClipSettled { clip: Arc<str>, time: f32 },
    TweenSuperseded { slot: Slot },
    SweepStarted,
    SweepHalfTurn,
    SweepCompleted,
    Resized { width: u32, height: u32 },
    Disposed { timers: usize, tweens: usize },
}

impl fmt::Display for ViewerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerEvent::Loaded { track_frames: Some(frames) } => write!(f, "Loaded track_frames={frames}"),
            ViewerEvent::Loaded { track_frames: None } => write!(f, "Loaded"),
            ViewerEvent::LoadFailed { message } => write!(f, "LoadFailed {message}"),
            ViewerEvent::RequestIgnored { request, reason } => {
                write!(f, "RequestIgnored request={request} reason={reason}")
            }
            ViewerEvent::TransitionStarted { from, to, transient } => {
                write!(f, "TransitionStarted from={from} to={to} phase={transient}")
            }
            ViewerEvent::StageStarted { to, stage, clip } => match clip {
                Some(clip) => write!(f, "StageStarted to={to} stage={stage} clip={clip}"),
                None => write!(f, "StageStarted to={to} stage={stage}"),
            },
            ViewerEvent::TransitionCompleted { phase } => write!(f, "TransitionCompleted phase={phase}"),
            ViewerEvent::ClipStarted { clip } => write!(f, "ClipStarted clip={clip}"),
            ViewerEvent::ClipStopped { clip } => write!(f, "ClipStopped clip={clip}"),
            ViewerEvent::ClipSettled { clip, time } => write!(f, "ClipSettled clip={clip} time={time:.2}"),
            ViewerEvent::TweenSuperseded { slot } => {
                write!(f, "TweenSuperseded node={:?} channel={:?}", slot.node, slot.channel)
            }
            ViewerEvent::SweepStarted => write!(f, "SweepStarted"),
            ViewerEvent::SweepHalfTurn => write!(f, "SweepHalfTurn"),
            ViewerEvent::SweepCompleted => write!(f, "SweepCompleted"),
            ViewerEvent::Resized { width, height } => write!(f, "Resized {width}x{height}"),
            ViewerEvent::Disposed { timers, tweens } => write!(f, "Disposed timers={timers} tweens={tweens}"),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<ViewerEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: ViewerEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ViewerEvent> {
        self.events.drain(..).collect()
    }

    pub fn peek(&self) -> &[ViewerEvent] {
        &self.events
    }
}
