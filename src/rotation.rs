use crate::transform::Transform;
use crate::wrap_angle;
use std::f32::consts::PI;

/// Slow yaw turn shown while the landing view waits for input.
#[derive(Debug, Clone)]
pub struct IdleSpin {
    step: f32,
    running: bool,
}

impl IdleSpin {
    pub fn new(step: f32) -> Self {
        Self { step, running: false }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances yaw by one step. `paused` is set while something else owns
    /// the rotation axis; the spin then skips the tick without stopping.
    pub fn tick(&self, transform: &mut Transform, paused: bool) -> bool {
        if !self.running || paused {
            return false;
        }
        transform.rotation.y = wrap_angle(transform.rotation.y + self.step);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepProgress {
    Turning,
    /// Pitch crossed PI and was parked at -PI.
    HalfTurn,
    /// Pitch came back to zero.
    FullTurn,
}

/// Manual pitch sweep: each trigger turns the model half a revolution.
#[derive(Debug, Clone)]
pub struct FreeSweep {
    step: f32,
    sweeping: bool,
    first_half: bool,
}

impl FreeSweep {
    pub fn new(step: f32) -> Self {
        Self { step, sweeping: false, first_half: true }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping
    }

    /// True between the two halves, while the model is parked upside down.
    pub fn is_half_turned(&self) -> bool {
        !self.first_half
    }

    /// Returns false, and changes nothing, while a sweep is already running.
    /// Which half to turn is read from the current pitch: only a model parked
    /// upside down at -PI finishes the revolution, anything else starts one.
    pub fn trigger(&mut self, transform: &Transform) -> bool {
        if self.sweeping {
            return false;
        }
        self.first_half = transform.rotation.x > -PI + self.step * 0.5;
        self.sweeping = true;
        true
    }

    pub fn cancel(&mut self) {
        self.sweeping = false;
    }

    pub fn tick(&mut self, transform: &mut Transform) -> Option<SweepProgress> {
        if !self.sweeping {
            return None;
        }
        let pitch = transform.rotation.x + self.step;
        if self.first_half && pitch >= PI {
            transform.rotation.x = -PI;
            self.sweeping = false;
            self.first_half = false;
            return Some(SweepProgress::HalfTurn);
        }
        if !self.first_half && pitch >= 0.0 && transform.rotation.x < 0.0 {
            transform.rotation.x = 0.0;
            self.sweeping = false;
            self.first_half = true;
            return Some(SweepProgress::FullTurn);
        }
        transform.rotation.x = wrap_angle(pitch);
        Some(SweepProgress::Turning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn idle_yaw_wraps_before_exceeding_pi() {
        let spin = {
            let mut spin = IdleSpin::new(PI / 180.0);
            spin.start();
            spin
        };
        let mut transform = Transform { position: Vec3::ZERO, rotation: Vec3::new(0.0, 3.0, 0.0) };
        let mut wrapped = false;
        for _ in 0..20 {
            let before = transform.rotation.y;
            assert!(spin.tick(&mut transform, false));
            assert!(transform.rotation.y < PI, "yaw {} escaped", transform.rotation.y);
            if transform.rotation.y < before {
                wrapped = true;
            }
        }
        assert!(wrapped, "9 steps of PI/180 from 3.0 must wrap");
    }

    #[test]
    fn paused_spin_leaves_rotation_alone() {
        let mut spin = IdleSpin::new(0.1);
        spin.start();
        let mut transform = Transform::default();
        assert!(!spin.tick(&mut transform, true));
        assert_eq!(transform.rotation, Vec3::ZERO);
        spin.stop();
        assert!(!spin.tick(&mut transform, false));
    }

    #[test]
    fn sweep_parks_at_half_turn_then_returns_to_zero() {
        let mut sweep = FreeSweep::new(PI / 120.0);
        let mut transform = Transform::default();
        assert!(sweep.trigger(&transform));
        assert!(!sweep.trigger(&transform), "re-entrant trigger ignored");

        let mut ticks = 0;
        loop {
            ticks += 1;
            match sweep.tick(&mut transform) {
                Some(SweepProgress::Turning) => continue,
                Some(SweepProgress::HalfTurn) => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!((119..=121).contains(&ticks), "half turn took {ticks} ticks");
        assert_eq!(transform.rotation.x, -PI);
        assert!(sweep.is_half_turned());
        assert!(sweep.tick(&mut transform).is_none(), "idle between halves");

        assert!(sweep.trigger(&transform));
        let mut last = None;
        while sweep.is_sweeping() {
            last = sweep.tick(&mut transform);
        }
        assert_eq!(last, Some(SweepProgress::FullTurn));
        assert_eq!(transform.rotation.x, 0.0);
        assert!(!sweep.is_half_turned());
    }

    #[test]
    fn sweep_restarts_from_level_pitch_after_half_turn() {
        let mut sweep = FreeSweep::new(PI / 120.0);
        let mut transform = Transform::default();
        sweep.trigger(&transform);
        while sweep.is_sweeping() {
            sweep.tick(&mut transform);
        }
        assert!(sweep.is_half_turned());

        // Something else turned the model back upright.
        transform.rotation.x = 0.0;
        assert!(sweep.trigger(&transform));
        assert!(!sweep.is_half_turned());
        let mut last = None;
        let mut ticks = 0;
        while sweep.is_sweeping() {
            last = sweep.tick(&mut transform);
            ticks += 1;
        }
        assert_eq!(last, Some(SweepProgress::HalfTurn));
        assert!(ticks <= 121, "took {ticks} ticks, more than half a turn");
        assert_eq!(transform.rotation.x, -PI);
    }
}
