use crate::transform::{Channel, Node, SceneNodes, Slot};
use glam::Vec3;
use serde::Deserialize;
use smallvec::SmallVec;
use std::f32::consts::PI;

/// Identifies one started tween; stale handles never touch a newer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenHandle {
    pub slot: Slot,
    generation: u64,
}

#[derive(Debug, Clone)]
struct TweenJob {
    target: Vec3,
    remaining: u32,
    step: Vec3,
    generation: u64,
}

/// Fixed-tick linear interpolation of node channels, one job per slot.
#[derive(Debug, Default)]
pub struct TweenDriver {
    jobs: [Option<TweenJob>; 4],
    next_generation: u64,
}

impl TweenDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts moving `slot` from `current` to `target` over `steps` ticks.
    /// Any job already on the slot is superseded. `steps` of zero is treated
    /// as one.
    pub fn start(&mut self, slot: Slot, current: Vec3, target: Vec3, steps: u32) -> TweenHandle {
        let steps = steps.max(1);
        self.next_generation += 1;
        let generation = self.next_generation;
        let step = (target - current) / steps as f32;
        self.jobs[slot.index()] =
            Some(TweenJob { target, remaining: steps, step, generation });
        TweenHandle { slot, generation }
    }

    pub fn cancel(&mut self, handle: TweenHandle) -> bool {
        let entry = &mut self.jobs[handle.slot.index()];
        match entry {
            Some(job) if job.generation == handle.generation => {
                *entry = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let mut count = 0;
        for entry in &mut self.jobs {
            if entry.take().is_some() {
                count += 1;
            }
        }
        count
    }

    pub fn is_active(&self, slot: Slot) -> bool {
        self.jobs[slot.index()].is_some()
    }

    pub fn is_current(&self, handle: TweenHandle) -> bool {
        matches!(&self.jobs[handle.slot.index()], Some(job) if job.generation == handle.generation)
    }

    pub fn active_count(&self) -> usize {
        self.jobs.iter().filter(|job| job.is_some()).count()
    }

    /// Advances every live job by one tick and returns the ones that finished.
    pub fn tick(&mut self, nodes: &mut SceneNodes) -> SmallVec<[TweenHandle; 4]> {
        let mut finished = SmallVec::new();
        for slot in Slot::ALL {
            let entry = &mut self.jobs[slot.index()];
            let Some(job) = entry.as_mut() else {
                continue;
            };
            job.remaining = job.remaining.saturating_sub(1);
            let value = if job.remaining == 0 { job.target } else { nodes.read(slot) + job.step };
            nodes.write(slot, value);
            if job.remaining == 0 {
                finished.push(TweenHandle { slot, generation: job.generation });
                *entry = None;
            }
        }
        finished
    }
}

/// Where a tween ends up, resolved against the slot's value when it starts.
/// `set` components replace the current value, `add` is applied afterwards.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TweenGoal {
    #[serde(default)]
    pub set: [Option<f32>; 3],
    #[serde(default)]
    pub add: [f32; 3],
}

impl TweenGoal {
    pub fn absolute(value: [f32; 3]) -> Self {
        Self { set: [Some(value[0]), Some(value[1]), Some(value[2])], add: [0.0; 3] }
    }

    pub fn offset(delta: [f32; 3]) -> Self {
        Self { set: [None; 3], add: delta }
    }

    pub fn resolve(&self, current: Vec3) -> Vec3 {
        let mut out = current.to_array();
        for axis in 0..3 {
            if let Some(value) = self.set[axis] {
                out[axis] = value;
            }
            out[axis] += self.add[axis];
        }
        Vec3::from_array(out)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCount {
    Fixed(u32),
    /// `floor(|delta[axis]| / PI * ticks) - trim`, never below one.
    PerHalfTurn {
        ticks: f32,
        axis: usize,
        #[serde(default)]
        trim: u32,
    },
}

impl StepCount {
    pub fn resolve(&self, current: Vec3, target: Vec3) -> u32 {
        match *self {
            StepCount::Fixed(steps) => steps.max(1),
            StepCount::PerHalfTurn { ticks, axis, trim } => {
                let axis = axis.min(2);
                let distance = (target[axis] - current[axis]).abs();
                let raw = (distance / PI * ticks).floor();
                let steps = if raw.is_finite() && raw > 0.0 { raw as u32 } else { 0 };
                steps.saturating_sub(trim).max(1)
            }
        }
    }
}

/// A tween request as it appears in a transition stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TweenSpec {
    pub node: Node,
    pub channel: Channel,
    pub goal: TweenGoal,
    pub steps: StepCount,
}

impl TweenSpec {
    pub fn slot(&self) -> Slot {
        Slot { node: self.node, channel: self.channel }
    }

    /// Resolves goal and step count against the live transform.
    pub fn plan(&self, nodes: &SceneNodes) -> (Slot, Vec3, Vec3, u32) {
        let slot = self.slot();
        let current = nodes.read(slot);
        // Rotation targets stay unwrapped so the tween never takes the long way round.
        let target = self.goal.resolve(current);
        let steps = self.steps.resolve(current, target);
        (slot, current, target, steps)
    }
}
