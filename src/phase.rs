use serde::Deserialize;
use std::fmt;

/// Phases the viewer can rest in. Bar order, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StablePhase {
    /// Model turned half a pitch revolution to show the dial side.
    Reversed,
    Closed,
    Exploded,
    Unfolded,
    Folded,
}

impl StablePhase {
    pub const ALL: [StablePhase; 5] = [
        StablePhase::Reversed,
        StablePhase::Closed,
        StablePhase::Exploded,
        StablePhase::Unfolded,
        StablePhase::Folded,
    ];

    /// The forward/backward cycle. `Reversed` sits outside it.
    pub const CYCLE: [StablePhase; 4] =
        [StablePhase::Closed, StablePhase::Exploded, StablePhase::Unfolded, StablePhase::Folded];

    pub fn bar_index(self) -> usize {
        match self {
            StablePhase::Reversed => 0,
            StablePhase::Closed => 1,
            StablePhase::Exploded => 2,
            StablePhase::Unfolded => 3,
            StablePhase::Folded => 4,
        }
    }

    fn cycle_index(self) -> Option<usize> {
        Self::CYCLE.iter().position(|phase| *phase == self)
    }

    pub fn next(self) -> StablePhase {
        match self.cycle_index() {
            Some(index) => Self::CYCLE[(index + 1) % Self::CYCLE.len()],
            None => StablePhase::Closed,
        }
    }

    pub fn previous(self) -> Option<StablePhase> {
        let index = self.cycle_index()?;
        Some(Self::CYCLE[(index + Self::CYCLE.len() - 1) % Self::CYCLE.len()])
    }

    pub fn label(self) -> &'static str {
        match self {
            StablePhase::Reversed => "reversed",
            StablePhase::Closed => "closed",
            StablePhase::Exploded => "exploded",
            StablePhase::Unfolded => "unfolded",
            StablePhase::Folded => "folded",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.label() == value)
    }

    /// Transient phase shown while travelling into `self`.
    pub fn entering(self) -> Phase {
        match self {
            StablePhase::Reversed => Phase::Turning,
            StablePhase::Closed => Phase::Closing,
            StablePhase::Exploded => Phase::Exploding,
            StablePhase::Unfolded => Phase::Unfolding,
            StablePhase::Folded => Phase::Folding,
        }
    }
}

impl fmt::Display for StablePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Closed,
    Exploding,
    Exploded,
    Unfolding,
    Unfolded,
    Folding,
    Folded,
    Closing,
    Reversed,
    Turning,
    Transitioning,
    FreeRotating,
}

impl Phase {
    pub fn stable(self) -> Option<StablePhase> {
        match self {
            Phase::Reversed => Some(StablePhase::Reversed),
            Phase::Closed => Some(StablePhase::Closed),
            Phase::Exploded => Some(StablePhase::Exploded),
            Phase::Unfolded => Some(StablePhase::Unfolded),
            Phase::Folded => Some(StablePhase::Folded),
            _ => None,
        }
    }

    pub fn is_transitioning(self) -> bool {
        self.stable().is_none()
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Exploding => "exploding",
            Phase::Exploded => "exploded",
            Phase::Unfolding => "unfolding",
            Phase::Unfolded => "unfolded",
            Phase::Folding => "folding",
            Phase::Folded => "folded",
            Phase::Closing => "closing",
            Phase::Reversed => "reversed",
            Phase::Turning => "turning",
            Phase::Transitioning => "transitioning",
            Phase::FreeRotating => "free_rotating",
        }
    }
}

impl From<StablePhase> for Phase {
    fn from(phase: StablePhase) -> Self {
        match phase {
            StablePhase::Reversed => Phase::Reversed,
            StablePhase::Closed => Phase::Closed,
            StablePhase::Exploded => Phase::Exploded,
            StablePhase::Unfolded => Phase::Unfolded,
            StablePhase::Folded => Phase::Folded,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Forward,
    Backward,
    Goto(StablePhase),
    /// The one-off "discover more" presentation out of the landing view.
    Discover,
    FreeRotate,
}

impl Request {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forward" | "f" => Some(Request::Forward),
            "backward" | "b" => Some(Request::Backward),
            "discover" | "discover_more" => Some(Request::Discover),
            "rotate" | "free_rotate" => Some(Request::FreeRotate),
            other => other.strip_prefix("goto:").and_then(StablePhase::from_label).map(Request::Goto),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Forward => f.write_str("forward"),
            Request::Backward => f.write_str("backward"),
            Request::Goto(phase) => write!(f, "goto:{phase}"),
            Request::Discover => f.write_str("discover"),
            Request::FreeRotate => f.write_str("free_rotate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotLoaded,
    Disposed,
    Transitioning,
    AlreadyThere,
    NoNeighbour,
    NoRoute,
    AlreadyDiscovered,
    Disabled,
    AxisBusy,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::NotLoaded => "model not loaded",
            IgnoreReason::Disposed => "viewer disposed",
            IgnoreReason::Transitioning => "transition in progress",
            IgnoreReason::AlreadyThere => "already in that phase",
            IgnoreReason::NoNeighbour => "no phase in that direction",
            IgnoreReason::NoRoute => "no transition configured",
            IgnoreReason::AlreadyDiscovered => "presentation already shown",
            IgnoreReason::Disabled => "affordance disabled",
            IgnoreReason::AxisBusy => "rotation axis busy",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub from: StablePhase,
    pub to: StablePhase,
}

/// Current phase plus the last phase the viewer rested in. Side effects
/// live in the controller; this only decides.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
    last_stable: StablePhase,
    pending: Option<Route>,
}

impl PhaseMachine {
    pub fn new(initial: StablePhase) -> Self {
        Self { phase: initial.into(), last_stable: initial, pending: None }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_stable(&self) -> StablePhase {
        self.last_stable
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase.is_transitioning()
    }

    /// Picks the route a phase request would take, if any.
    pub fn resolve(&self, request: Request) -> Result<Route, IgnoreReason> {
        let Some(from) = self.phase.stable() else {
            return Err(IgnoreReason::Transitioning);
        };
        let to = match request {
            Request::Forward => from.next(),
            Request::Backward => from.previous().ok_or(IgnoreReason::NoNeighbour)?,
            Request::Goto(target) => target,
            Request::Discover | Request::FreeRotate => return Err(IgnoreReason::NoRoute),
        };
        if to == from {
            return Err(IgnoreReason::AlreadyThere);
        }
        Ok(Route { from, to })
    }

    pub fn begin(&mut self, route: Route, transient: Phase) {
        self.last_stable = route.from;
        self.pending = Some(route);
        self.phase = if transient.is_transitioning() { transient } else { Phase::Transitioning };
    }

    pub fn complete(&mut self) -> Option<Route> {
        let route = self.pending.take()?;
        self.phase = route.to.into();
        self.last_stable = route.to;
        Some(route)
    }

    /// Enters free rotation from a resting phase.
    pub fn begin_free_rotation(&mut self) -> bool {
        if self.phase.is_transitioning() {
            return false;
        }
        self.phase = Phase::FreeRotating;
        true
    }

    pub fn end_free_rotation(&mut self) {
        if self.phase == Phase::FreeRotating {
            self.phase = self.last_stable.into();
        }
    }

    /// Drops any in-flight route and rests at the last stable phase.
    pub fn abandon(&mut self) {
        self.pending = None;
        self.phase = self.last_stable.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_cycle_wraps_back_to_closed() {
        let mut phase = StablePhase::Closed;
        let mut seen = Vec::new();
        for _ in 0..4 {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![StablePhase::Exploded, StablePhase::Unfolded, StablePhase::Folded, StablePhase::Closed]
        );
    }

    #[test]
    fn backward_from_closed_wraps_to_folded() {
        assert_eq!(StablePhase::Closed.previous(), Some(StablePhase::Folded));
        assert_eq!(StablePhase::Reversed.previous(), None);
        assert_eq!(StablePhase::Reversed.next(), StablePhase::Closed);
    }

    #[test]
    fn machine_rejects_requests_mid_transition() {
        let mut machine = PhaseMachine::new(StablePhase::Closed);
        let route = machine.resolve(Request::Forward).expect("route");
        machine.begin(route, route.to.entering());
        assert_eq!(machine.phase(), Phase::Exploding);
        assert_eq!(machine.resolve(Request::Forward), Err(IgnoreReason::Transitioning));
        assert_eq!(machine.resolve(Request::Goto(StablePhase::Folded)), Err(IgnoreReason::Transitioning));
        assert_eq!(machine.complete(), Some(route));
        assert_eq!(machine.phase(), Phase::Exploded);
        assert!(machine.complete().is_none());
    }

    #[test]
    fn stable_transient_is_coerced_to_transitioning() {
        let mut machine = PhaseMachine::new(StablePhase::Closed);
        let route = Route { from: StablePhase::Closed, to: StablePhase::Reversed };
        machine.begin(route, Phase::Closed);
        assert_eq!(machine.phase(), Phase::Transitioning);
    }

    #[test]
    fn goto_current_phase_is_ignored() {
        let machine = PhaseMachine::new(StablePhase::Unfolded);
        assert_eq!(machine.resolve(Request::Goto(StablePhase::Unfolded)), Err(IgnoreReason::AlreadyThere));
    }

    #[test]
    fn requests_parse_from_script_tokens() {
        assert_eq!(Request::parse("Forward"), Some(Request::Forward));
        assert_eq!(Request::parse("goto:unfolded"), Some(Request::Goto(StablePhase::Unfolded)));
        assert_eq!(Request::parse("goto:sideways"), None);
        let goto = Request::Goto(StablePhase::Reversed);
        assert_eq!(Request::parse(&goto.to_string()), Some(goto));
    }
}
