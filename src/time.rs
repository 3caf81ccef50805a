use std::time::{Duration, Instant};

/// Interval at which tweens, idle motion and timeouts advance.
pub const DEFAULT_TICK_MS: u32 = 20;

/// Wall clock for hosts that do not supply their own frame delta.
pub struct Time {
    start: Instant,
    last: Instant,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::from_secs_f32(0.0) }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns variable frame deltas into a whole number of fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step_ms: u32,
    accumulator_ms: f64,
}

impl FixedStep {
    pub fn new(step_ms: u32) -> Self {
        Self { step_ms: step_ms.max(1), accumulator_ms: 0.0 }
    }

    pub fn step_ms(&self) -> u32 {
        self.step_ms
    }

    /// Adds `dt` seconds and returns how many ticks are now due.
    pub fn consume(&mut self, dt: f32) -> u32 {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator_ms += f64::from(dt) * 1000.0;
        }
        let step = f64::from(self.step_ms);
        // Tolerate float error so 0.02s reliably yields one 20ms tick.
        let count = ((self.accumulator_ms + 1e-6) / step).floor();
        if count < 1.0 {
            return 0;
        }
        self.accumulator_ms = (self.accumulator_ms - count * step).max(0.0);
        count as u32
    }

    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct PendingTimer<T> {
    id: TimerId,
    due_ms: u64,
    payload: T,
}

/// One-shot timeouts on a virtual millisecond clock. Every timer keeps its
/// id so it can be cleared on supersession or teardown.
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self { now_ms: 0, next_id: 1, pending: Vec::new() }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn after(&mut self, delay_ms: u32, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer { id, due_ms: self.now_ms + u64::from(delay_ms), payload });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|timer| timer.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Moves the clock forward and returns every timer now due, earliest
    /// first; timers due at the same instant fire in the order they were set.
    pub fn advance(&mut self, delta_ms: u32) -> Vec<(TimerId, T)> {
        self.now_ms += u64::from(delta_ms);
        let now = self.now_ms;
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due_ms <= now {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by_key(|timer| (timer.due_ms, timer.id));
        due.into_iter().map(|timer| (timer.id, timer.payload)).collect()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_accumulates_partial_frames() {
        let mut step = FixedStep::new(20);
        assert_eq!(step.consume(0.012), 0);
        assert_eq!(step.consume(0.012), 1);
        assert_eq!(step.consume(0.1), 5);
        assert_eq!(step.consume(0.02), 1);
    }

    #[test]
    fn fixed_step_ignores_negative_and_nan() {
        let mut step = FixedStep::new(20);
        assert_eq!(step.consume(-1.0), 0);
        assert_eq!(step.consume(f32::NAN), 0);
        assert_eq!(step.consume(0.04), 2);
    }

    #[test]
    fn scheduler_fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.after(40, "late");
        scheduler.after(20, "early");
        scheduler.after(20, "early-second");
        assert!(scheduler.advance(10).is_empty());
        let fired: Vec<_> = scheduler.advance(40).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["early", "early-second", "late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.after(20, 1);
        scheduler.after(20, 2);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id), "second cancel is a no-op");
        let fired: Vec<_> = scheduler.advance(20).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec![2]);
    }
}
