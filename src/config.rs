use crate::clips::{ClipSpec, ClipTable, FrameMarkers, SettleRewind, DEFAULT_SAMPLE_RATE};
use crate::mixer::LoopMode;
use crate::phase::{Phase, StablePhase};
use crate::time::DEFAULT_TICK_MS;
use crate::transform::{Channel, Node};
use crate::tween::{StepCount, TweenGoal, TweenSpec};
use crate::ui::AffordanceConfig;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_4, PI};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_tick_ms")]
    pub tick_ms: u32,
    #[serde(default = "TimingConfig::default_idle_spin")]
    pub idle_spin: bool,
    #[serde(default = "TimingConfig::default_idle_step")]
    pub idle_step_radians: f32,
    #[serde(default = "TimingConfig::default_sweep_step")]
    pub sweep_step_radians: f32,
}

impl TimingConfig {
    const fn default_tick_ms() -> u32 {
        DEFAULT_TICK_MS
    }

    const fn default_idle_spin() -> bool {
        true
    }

    fn default_idle_step() -> f32 {
        PI / 180.0
    }

    fn default_sweep_step() -> f32 {
        PI / 120.0
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
            idle_spin: Self::default_idle_spin(),
            idle_step_radians: Self::default_idle_step(),
            sweep_step_radians: Self::default_sweep_step(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClipConfig {
    #[serde(default = "ClipConfig::default_sample_rate")]
    pub sample_rate: f32,
    #[serde(default)]
    pub markers: FrameMarkers,
    /// Applied on top of the eight standard clips.
    #[serde(default = "ClipConfig::default_specs")]
    pub clips: Vec<ClipSpec>,
    /// Clip playing when the model first appears.
    #[serde(default = "ClipConfig::default_landing_clip")]
    pub landing_clip: String,
}

impl ClipConfig {
    fn default_sample_rate() -> f32 {
        DEFAULT_SAMPLE_RATE
    }

    fn default_landing_clip() -> String {
        "closed".to_string()
    }

    fn default_specs() -> Vec<ClipSpec> {
        vec![
            ClipSpec::options("closed", LoopMode::Repeat, None),
            ClipSpec::options("exploded", LoopMode::Repeat, None),
            ClipSpec::options("unfolded", LoopMode::Repeat, None),
            ClipSpec::options("folded", LoopMode::Repeat, None),
            ClipSpec::options("explosion", LoopMode::Once, Some(SettleRewind::FromEnd(9.0))),
            ClipSpec::options("unfolding", LoopMode::Once, Some(SettleRewind::FromEnd(10.0))),
            ClipSpec::options("folding", LoopMode::Once, Some(SettleRewind::FromEnd(6.0))),
            ClipSpec::options("closing", LoopMode::Once, Some(SettleRewind::FromEnd(3.0))),
            ClipSpec::bridge(
                "unfolding_from_closed",
                "explosion",
                "folding",
                Some(SettleRewind::FromEnd(10.0)),
            ),
            ClipSpec::bridge("folding_from_closed", "explosion", "closing", Some(SettleRewind::FromEnd(6.0))),
            ClipSpec::bridge("refolding", "unfolding", "closing", Some(SettleRewind::FromEnd(6.0))),
            ClipSpec::bridge(
                "closing_from_unfolded",
                "folding",
                "end",
                Some(SettleRewind::FromEnd(3.0)),
            ),
        ]
    }

    pub fn build_table(&self) -> Result<ClipTable> {
        if !(self.sample_rate > 0.0) {
            bail!("Clip sample rate must be positive (got {})", self.sample_rate);
        }
        ClipTable::from_specs(&self.markers, self.sample_rate, &self.clips)
    }
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            markers: FrameMarkers::default(),
            clips: Self::default_specs(),
            landing_clip: Self::default_landing_clip(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "SceneConfig::default_model_position")]
    pub model_position: [f32; 3],
    #[serde(default = "SceneConfig::default_model_rotation")]
    pub model_rotation: [f32; 3],
    #[serde(default = "SceneConfig::default_camera_position")]
    pub camera_position: [f32; 3],
    #[serde(default = "SceneConfig::default_fov_degrees")]
    pub fov_degrees: f32,
}

impl SceneConfig {
    const fn default_model_position() -> [f32; 3] {
        [-0.5, -0.3, 0.0]
    }

    fn default_model_rotation() -> [f32; 3] {
        [-FRAC_PI_4, 0.0, -PI]
    }

    const fn default_camera_position() -> [f32; 3] {
        [0.0, 1.5, 0.0]
    }

    const fn default_fov_degrees() -> f32 {
        60.0
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_position: Self::default_model_position(),
            model_rotation: Self::default_model_rotation(),
            camera_position: Self::default_camera_position(),
            fov_degrees: Self::default_fov_degrees(),
        }
    }
}

/// One step of a transition: start a clip and/or tweens, then wait.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub clip: Option<String>,
    #[serde(default)]
    pub tweens: Vec<TweenSpec>,
    /// Hand-calibrated wait before the next stage. Without it the stage lasts
    /// as long as its longest tween.
    #[serde(default)]
    pub hold_ms: Option<u32>,
}

impl StageConfig {
    pub fn play(clip: &str, hold_ms: u32) -> Self {
        Self { clip: Some(clip.to_string()), tweens: Vec::new(), hold_ms: Some(hold_ms) }
    }

    pub fn tweens(tweens: Vec<TweenSpec>, hold_ms: Option<u32>) -> Self {
        Self { clip: None, tweens, hold_ms }
    }

    pub fn with_tween(mut self, tween: TweenSpec) -> Self {
        self.tweens.push(tween);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransitionConfig {
    pub from: StablePhase,
    pub to: StablePhase,
    #[serde(default)]
    pub transient: Option<Phase>,
    pub stages: Vec<StageConfig>,
}

impl TransitionConfig {
    pub fn new(from: StablePhase, to: StablePhase, stages: Vec<StageConfig>) -> Self {
        Self { from, to, transient: None, stages }
    }

    pub fn transient_phase(&self) -> Phase {
        self.transient.unwrap_or_else(|| self.to.entering())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Waypoint {
    pub phase: StablePhase,
    pub position: [f32; 3],
}

/// Camera positions per phase; the camera tweens there alongside each
/// transition that targets the phase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraPathConfig {
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default = "CameraPathConfig::default_steps")]
    pub steps: u32,
}

impl CameraPathConfig {
    const fn default_steps() -> u32 {
        150
    }

    pub fn waypoint(&self, phase: StablePhase) -> Option<[f32; 3]> {
        self.waypoints.iter().find(|waypoint| waypoint.phase == phase).map(|waypoint| waypoint.position)
    }
}

impl Default for CameraPathConfig {
    fn default() -> Self {
        Self { waypoints: Vec::new(), steps: Self::default_steps() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "ViewerConfig::default_variant")]
    pub variant: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub clips: ClipConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default = "ViewerConfig::default_transitions")]
    pub transitions: Vec<TransitionConfig>,
    /// Stages of the "discover more" presentation, ending in the reversed view.
    #[serde(default = "ViewerConfig::default_intro")]
    pub intro: Vec<StageConfig>,
    #[serde(default)]
    pub camera_path: CameraPathConfig,
    #[serde(default)]
    pub affordances: AffordanceConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ViewerConfigOverrides {
    pub tick_ms: Option<u32>,
    pub idle_spin: Option<bool>,
    pub discover_more: Option<bool>,
}

fn flip() -> StageConfig {
    StageConfig::tweens(
        vec![TweenSpec {
            node: Node::Model,
            channel: Channel::Rotation,
            goal: TweenGoal::offset([PI, 0.0, 0.0]),
            steps: StepCount::Fixed(120),
        }],
        Some(2400),
    )
}

impl ViewerConfig {
    fn default_variant() -> String {
        "studio".to_string()
    }

    fn default_transitions() -> Vec<TransitionConfig> {
        use StablePhase::{Closed, Exploded, Folded, Reversed, Unfolded};
        let play = StageConfig::play;
        let route = TransitionConfig::new;
        let mut unfolded_to_exploded = route(Unfolded, Exploded, vec![play("folding", 3000)]);
        unfolded_to_exploded.transient = Some(Phase::Folding);
        let mut exploded_to_closed = route(Exploded, Closed, vec![play("closing", 4000)]);
        exploded_to_closed.transient = Some(Phase::Closing);
        vec![
            route(Reversed, Closed, vec![flip()]),
            route(Reversed, Exploded, vec![flip(), play("explosion", 4500)]),
            route(Reversed, Unfolded, vec![flip(), play("unfolding_from_closed", 18000)]),
            route(Reversed, Folded, vec![flip(), play("folding_from_closed", 21000)]),
            route(Closed, Reversed, vec![flip()]),
            route(Closed, Exploded, vec![play("explosion", 4500)]),
            route(Closed, Unfolded, vec![play("unfolding_from_closed", 18000)]),
            route(Closed, Folded, vec![play("folding_from_closed", 21000)]),
            route(Exploded, Reversed, vec![play("closing", 4000), flip()]),
            exploded_to_closed,
            route(Exploded, Unfolded, vec![play("unfolding", 5000)]),
            route(Exploded, Folded, vec![play("refolding", 8000)]),
            route(Unfolded, Reversed, vec![play("closing_from_unfolded", 15000), flip()]),
            route(Unfolded, Closed, vec![play("closing_from_unfolded", 15000)]),
            unfolded_to_exploded,
            route(Unfolded, Folded, vec![play("folding", 3000)]),
            route(Folded, Reversed, vec![play("closing", 4000), flip()]),
            route(Folded, Closed, vec![play("closing", 4000)]),
            route(Folded, Exploded, vec![play("exploded", 1000)]),
            route(Folded, Unfolded, vec![play("unfolding", 5000)]),
        ]
    }

    fn default_intro() -> Vec<StageConfig> {
        let turn_to_dial = TweenSpec {
            node: Node::Model,
            channel: Channel::Rotation,
            goal: TweenGoal { set: [None, Some(PI), None], add: [0.0; 3] },
            steps: StepCount::PerHalfTurn { ticks: 80.0, axis: 1, trim: 0 },
        };
        let centre_model = TweenSpec {
            node: Node::Model,
            channel: Channel::Position,
            goal: TweenGoal::absolute([0.0, -0.3, 0.0]),
            steps: StepCount::Fixed(60),
        };
        let level_model = TweenSpec {
            node: Node::Model,
            channel: Channel::Rotation,
            goal: TweenGoal { set: [Some(0.0), None, None], add: [0.0; 3] },
            steps: StepCount::Fixed(40),
        };
        let lift_model = TweenSpec {
            node: Node::Model,
            channel: Channel::Position,
            goal: TweenGoal::absolute([0.0, 0.0, 0.0]),
            steps: StepCount::Fixed(40),
        };
        vec![
            StageConfig::tweens(vec![turn_to_dial, centre_model], None),
            StageConfig::tweens(vec![level_model, lift_model], None),
        ]
    }

    /// The single-canvas page: landing spin, "discover more", full button bar.
    pub fn studio() -> Self {
        Self::default()
    }

    /// Guided variant: no landing presentation, the camera travels between
    /// phases and the explosion settles from a fixed offset.
    pub fn tour() -> Self {
        let mut config = Self::default();
        config.variant = "tour".to_string();
        config.affordances.discover_more = false;
        config.affordances.free_rotation = false;
        let explosion = ClipSpec::options("explosion", LoopMode::Repeat, Some(SettleRewind::FromStart(5.0)));
        config.clips.clips.push(explosion);
        config.camera_path = CameraPathConfig {
            waypoints: vec![
                Waypoint { phase: StablePhase::Reversed, position: [0.0, 1.5, 0.0] },
                Waypoint { phase: StablePhase::Closed, position: [0.0, 1.5, 0.0] },
                Waypoint { phase: StablePhase::Exploded, position: [0.0, 2.2, 0.4] },
                Waypoint { phase: StablePhase::Unfolded, position: [0.0, 3.0, 0.8] },
                Waypoint { phase: StablePhase::Folded, position: [0.0, 2.4, 0.2] },
            ],
            steps: CameraPathConfig::default_steps(),
        };
        let rest = config.scene.model_rotation;
        let settle_pose = TweenSpec {
            node: Node::Model,
            channel: Channel::Rotation,
            goal: TweenGoal { set: [Some(rest[0]), None, Some(rest[2])], add: [0.0; 3] },
            steps: StepCount::Fixed(100),
        };
        for transition in &mut config.transitions {
            if transition.to == StablePhase::Closed {
                if let Some(first) = transition.stages.first_mut() {
                    if first.clip.is_some() {
                        first.tweens.push(settle_pose.clone());
                    }
                }
            }
        }
        config
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "studio" => Some(Self::studio()),
            "tour" => Some(Self::tour()),
            _ => None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[config] {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ViewerConfigOverrides) {
        if let Some(tick_ms) = overrides.tick_ms {
            self.timing.tick_ms = tick_ms;
        }
        if let Some(idle_spin) = overrides.idle_spin {
            self.timing.idle_spin = idle_spin;
        }
        if let Some(discover_more) = overrides.discover_more {
            self.affordances.discover_more = discover_more;
        }
    }

    pub fn transition(&self, from: StablePhase, to: StablePhase) -> Option<&TransitionConfig> {
        self.transitions.iter().find(|transition| transition.from == from && transition.to == to)
    }

    /// Checks the config against the clip table it will drive. Every clip a
    /// stage names must exist, so runtime lookups cannot miss.
    pub fn validate(&self, clips: &ClipTable) -> Result<()> {
        if self.timing.tick_ms == 0 {
            bail!("timing.tick_ms must be at least 1");
        }
        check_step("timing.idle_step_radians", self.timing.idle_step_radians)?;
        check_step("timing.sweep_step_radians", self.timing.sweep_step_radians)?;
        check_finite("scene.model_position", &self.scene.model_position)?;
        check_finite("scene.model_rotation", &self.scene.model_rotation)?;
        check_finite("scene.camera_position", &self.scene.camera_position)?;
        if !(self.scene.fov_degrees > 0.0 && self.scene.fov_degrees < 180.0) {
            bail!("scene.fov_degrees must lie in (0, 180) (got {})", self.scene.fov_degrees);
        }
        for waypoint in &self.camera_path.waypoints {
            check_finite(&format!("camera_path waypoint {}", waypoint.phase), &waypoint.position)?;
        }
        if !clips.contains(&self.clips.landing_clip) {
            bail!("Landing clip '{}' is not in the clip table", self.clips.landing_clip);
        }
        let mut seen = HashSet::new();
        for transition in &self.transitions {
            let label = format!("{} -> {}", transition.from, transition.to);
            if transition.from == transition.to {
                bail!("Transition {label} goes nowhere");
            }
            if !seen.insert((transition.from, transition.to)) {
                bail!("Transition {label} is defined twice");
            }
            if transition.stages.is_empty() {
                bail!("Transition {label} has no stages");
            }
            validate_stages(&transition.stages, clips).with_context(|| format!("Transition {label}"))?;
        }
        validate_stages(&self.intro, clips).context("Intro")?;
        Ok(())
    }
}

/// Per-tick angles must move forward and stay below a half turn, or the
/// sweep never reaches its parking angle.
fn check_step(field: &str, radians: f32) -> Result<()> {
    if !(radians > 0.0 && radians < PI) {
        bail!("{field} must lie in (0, PI) (got {radians})");
    }
    Ok(())
}

fn check_finite(field: &str, values: &[f32]) -> Result<()> {
    if let Some(value) = values.iter().find(|value| !value.is_finite()) {
        bail!("{field} contains non-finite value {value}");
    }
    Ok(())
}

fn validate_tween(spec: &TweenSpec) -> Result<()> {
    let set: Vec<f32> = spec.goal.set.iter().flatten().copied().collect();
    check_finite("tween goal.set", &set)?;
    check_finite("tween goal.add", &spec.goal.add)?;
    if let StepCount::PerHalfTurn { ticks, .. } = spec.steps {
        if !(ticks.is_finite() && ticks > 0.0) {
            bail!("tween per_half_turn ticks must be positive (got {ticks})");
        }
    }
    Ok(())
}

fn validate_stages(stages: &[StageConfig], clips: &ClipTable) -> Result<()> {
    for (index, stage) in stages.iter().enumerate() {
        for tween in &stage.tweens {
            validate_tween(tween).with_context(|| format!("stage {index}"))?;
        }
        if let Some(clip) = &stage.clip {
            if !clips.contains(clip) {
                bail!("stage {index} plays unknown clip '{clip}'");
            }
        }
        if stage.clip.is_none() && stage.tweens.is_empty() && stage.hold_ms.is_none() {
            bail!("stage {index} does nothing");
        }
    }
    Ok(())
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            variant: Self::default_variant(),
            timing: TimingConfig::default(),
            clips: ClipConfig::default(),
            scene: SceneConfig::default(),
            transitions: Self::default_transitions(),
            intro: Self::default_intro(),
            camera_path: CameraPathConfig::default(),
            affordances: AffordanceConfig::default(),
        }
    }
}

impl ViewerConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.tick_ms.is_none() && self.idle_spin.is_none() && self.discover_more.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.tick_ms.is_some() {
            fields.push("tick_ms");
        }
        if self.idle_spin.is_some() {
            fields.push("idle_spin");
        }
        if self.discover_more.is_some() {
            fields.push("discover_more");
        }
        fields
    }
}
