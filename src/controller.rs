use crate::asset::ModelAsset;
use crate::clips::ClipTable;
use crate::config::{StageConfig, ViewerConfig};
use crate::events::{EventBus, ViewerEvent};
use crate::mixer::{AnimationMixer, ClipPlayer, MixerEvent};
use crate::phase::{IgnoreReason, Phase, PhaseMachine, Request, Route, StablePhase};
use crate::rotation::{FreeSweep, IdleSpin, SweepProgress};
use crate::time::{FixedStep, Scheduler, TimerId};
use crate::transform::{SceneNodes, Slot, Transform};
use crate::tween::{TweenDriver, TweenSpec};
use crate::ui::{Affordance, UiState};
use crate::viewport::{Camera, Viewport};
use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Started,
    Ignored(IgnoreReason),
}

impl RequestOutcome {
    pub fn is_started(self) -> bool {
        matches!(self, RequestOutcome::Started)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionKind {
    Route,
    Intro,
}

#[derive(Debug, Clone, Copy)]
enum Timeout {
    StageDone { transition: u64, stage: usize },
}

struct ActiveTransition {
    seq: u64,
    kind: TransitionKind,
    to: StablePhase,
    stages: Vec<StageConfig>,
    /// Timeout of the running stage; any other firing is stale.
    timer: Option<TimerId>,
}

/// Owns every piece of mutable view state: phase, scene transforms, tweens,
/// playback, timeouts and the derived UI. Hosts feed it frame deltas and
/// user requests and read back transforms and UI each frame.
pub struct ViewController<M: AnimationMixer = ClipPlayer> {
    config: ViewerConfig,
    clips: ClipTable,
    mixer: M,
    nodes: SceneNodes,
    tweens: TweenDriver,
    scheduler: Scheduler<Timeout>,
    step: FixedStep,
    machine: PhaseMachine,
    idle: IdleSpin,
    sweep: FreeSweep,
    ui: UiState,
    events: EventBus,
    viewport: Viewport,
    camera: Camera,
    load: LoadState,
    active_clip: Option<Arc<str>>,
    transition: Option<ActiveTransition>,
    transition_seq: u64,
    discovered: bool,
    disposed: bool,
}

impl ViewController<ClipPlayer> {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        Self::with_mixer(config, ClipPlayer::new())
    }
}

impl<M: AnimationMixer> ViewController<M> {
    pub fn with_mixer(config: ViewerConfig, mixer: M) -> Result<Self> {
        let clips = config.clips.build_table().context("Failed to build clip table")?;
        config.validate(&clips).context("Invalid viewer config")?;

        let scene = &config.scene;
        let model = Transform::new(Vec3::from(scene.model_position), Vec3::from(scene.model_rotation));
        let camera_node = Transform::new(Vec3::from(scene.camera_position), Vec3::ZERO);
        let nodes = SceneNodes::new(model, camera_node);
        let camera = Camera::new(scene.fov_degrees.to_radians(), 0.1, 2000.0);

        Ok(Self {
            step: FixedStep::new(config.timing.tick_ms),
            idle: IdleSpin::new(config.timing.idle_step_radians),
            sweep: FreeSweep::new(config.timing.sweep_step_radians),
            ui: UiState::loading(config.affordances),
            clips,
            mixer,
            nodes,
            tweens: TweenDriver::new(),
            scheduler: Scheduler::new(),
            machine: PhaseMachine::new(StablePhase::Closed),
            events: EventBus::default(),
            viewport: Viewport::default(),
            camera,
            load: LoadState::Loading,
            active_clip: None,
            transition: None,
            transition_seq: 0,
            discovered: false,
            disposed: false,
            config,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn clips(&self) -> &ClipTable {
        &self.clips
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn last_stable_phase(&self) -> StablePhase {
        self.machine.last_stable()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn nodes(&self) -> &SceneNodes {
        &self.nodes
    }

    /// Direct access for hosts that place the model themselves. Tweens in
    /// flight keep stepping from wherever the value is left.
    pub fn nodes_mut(&mut self) -> &mut SceneNodes {
        &mut self.nodes
    }

    pub fn model(&self) -> &Transform {
        &self.nodes.model
    }

    pub fn camera_transform(&self) -> &Transform {
        &self.nodes.camera
    }

    pub fn tweens(&self) -> &TweenDriver {
        &self.tweens
    }

    pub fn active_clip(&self) -> Option<&Arc<str>> {
        self.active_clip.as_ref()
    }

    pub fn is_idle_spinning(&self) -> bool {
        self.idle.is_running()
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweep.is_sweeping()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn pending_timeouts(&self) -> usize {
        self.scheduler.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn view_projection(&self) -> Mat4 {
        self.camera.view_projection(self.nodes.camera.position, &self.viewport)
    }

    pub fn events(&self) -> &[ViewerEvent] {
        self.events.peek()
    }

    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain()
    }

    pub fn on_load_progress(&mut self, loaded: u64, total: u64) {
        if self.load == LoadState::Loading {
            self.ui.set_load_progress(loaded, total);
        }
    }

    /// Model is in the scene: register actions, start the landing clip and
    /// the idle spin, reveal the canvas.
    pub fn on_loaded(&mut self, track_frames: Option<u32>) {
        if self.disposed || self.load != LoadState::Loading {
            return;
        }
        self.load = LoadState::Ready;
        self.mixer.register(&self.clips);
        let landing = self.config.clips.landing_clip.clone();
        self.activate_clip(&landing);
        if self.config.timing.idle_spin {
            self.idle.start();
        }
        self.ui.show_ready();
        self.events.push(ViewerEvent::Loaded { track_frames });
    }

    pub fn on_load_failed(&mut self, message: impl Into<String>) {
        if self.disposed || self.load != LoadState::Loading {
            return;
        }
        let message = message.into();
        eprintln!("[viewer] model failed to load: {message}");
        self.ui.show_error(message.clone());
        self.load = LoadState::Failed(message.clone());
        self.events.push(ViewerEvent::LoadFailed { message });
    }

    /// Reads the model's animation track and completes loading. A track
    /// shorter than the clip table is reported but not fatal.
    pub fn load_asset(&mut self, path: impl AsRef<Path>) -> Result<ModelAsset> {
        match ModelAsset::load(path) {
            Ok(asset) => {
                let sample_rate = self.config.clips.sample_rate;
                for issue in asset.validate(&self.clips, sample_rate) {
                    eprintln!("[viewer] {issue}");
                }
                self.on_loaded(Some(asset.frame_count(sample_rate)));
                Ok(asset)
            }
            Err(err) => {
                self.on_load_failed(format!("{err:#}"));
                Err(err)
            }
        }
    }

    pub fn forward(&mut self) -> RequestOutcome {
        self.request(Request::Forward)
    }

    pub fn backward(&mut self) -> RequestOutcome {
        self.request(Request::Backward)
    }

    pub fn goto(&mut self, phase: StablePhase) -> RequestOutcome {
        self.request(Request::Goto(phase))
    }

    pub fn discover_more(&mut self) -> RequestOutcome {
        self.request(Request::Discover)
    }

    pub fn free_rotate(&mut self) -> RequestOutcome {
        self.request(Request::FreeRotate)
    }

    /// Ignored requests leave every piece of state untouched apart from the
    /// `RequestIgnored` event.
    pub fn request(&mut self, request: Request) -> RequestOutcome {
        let started = if self.disposed {
            Err(IgnoreReason::Disposed)
        } else if self.load != LoadState::Ready {
            Err(IgnoreReason::NotLoaded)
        } else {
            match request {
                Request::Discover => self.start_intro(),
                Request::FreeRotate => self.start_sweep(),
                _ => self.machine.resolve(request).and_then(|route| self.start_route(route)),
            }
        };
        match started {
            Ok(()) => RequestOutcome::Started,
            Err(reason) => {
                self.events.push(ViewerEvent::RequestIgnored { request, reason });
                RequestOutcome::Ignored(reason)
            }
        }
    }

    /// Advances by `dt` seconds: fixed ticks first, then the mixer.
    pub fn update(&mut self, dt: f32) {
        if self.disposed || self.load != LoadState::Ready {
            return;
        }
        let ticks = self.step.consume(dt);
        for _ in 0..ticks {
            self.tick();
        }
        let mixer_events = self.mixer.update(dt.max(0.0));
        for event in mixer_events {
            self.settle(event);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let changed = self.viewport.resize(width, height);
        if changed {
            self.events.push(ViewerEvent::Resized {
                width: self.viewport.window.0,
                height: self.viewport.window.1,
            });
        }
        changed
    }

    /// Cancels every timeout and tween and stops playback. The controller
    /// ignores all input afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let timers = self.scheduler.cancel_all();
        let tweens = self.tweens.cancel_all();
        self.sweep.cancel();
        self.idle.stop();
        if let Some(clip) = self.active_clip.take() {
            self.mixer.stop(&clip);
        }
        self.transition = None;
        self.machine.abandon();
        self.step.reset();
        self.disposed = true;
        self.events.push(ViewerEvent::Disposed { timers, tweens });
    }

    fn tick(&mut self) {
        self.tweens.tick(&mut self.nodes);

        let axis_busy = self.tweens.is_active(Slot::MODEL_ROTATION) || self.sweep.is_sweeping();
        self.idle.tick(&mut self.nodes.model, axis_busy);

        match self.sweep.tick(&mut self.nodes.model) {
            Some(SweepProgress::HalfTurn) => {
                self.machine.end_free_rotation();
                self.events.push(ViewerEvent::SweepHalfTurn);
            }
            Some(SweepProgress::FullTurn) => {
                self.machine.end_free_rotation();
                self.ui.set_bar_visible(true);
                self.events.push(ViewerEvent::SweepCompleted);
            }
            Some(SweepProgress::Turning) | None => {}
        }

        for (id, timeout) in self.scheduler.advance(self.step.step_ms()) {
            match timeout {
                Timeout::StageDone { transition, stage } => self.on_stage_done(id, transition, stage),
            }
        }
    }

    fn start_route(&mut self, route: Route) -> Result<(), IgnoreReason> {
        let plan = self.config.transition(route.from, route.to).cloned().ok_or(IgnoreReason::NoRoute)?;
        let transient = plan.transient_phase();
        self.machine.begin(route, transient);
        self.ui.show_pending(route.to);
        self.events.push(ViewerEvent::TransitionStarted {
            from: route.from,
            to: route.to,
            transient: self.machine.phase(),
        });
        if let Some(position) = self.config.camera_path.waypoint(route.to) {
            let current = self.nodes.read(Slot::CAMERA_POSITION);
            let steps = self.config.camera_path.steps;
            self.start_tween(Slot::CAMERA_POSITION, current, Vec3::from(position), steps);
        }
        self.begin_stages(TransitionKind::Route, route.to, plan.stages);
        Ok(())
    }

    fn start_intro(&mut self) -> Result<(), IgnoreReason> {
        if !self.config.affordances.discover_more {
            return Err(IgnoreReason::Disabled);
        }
        if self.discovered {
            return Err(IgnoreReason::AlreadyDiscovered);
        }
        match self.machine.phase() {
            Phase::Closed => {}
            phase if phase.is_transitioning() => return Err(IgnoreReason::Transitioning),
            _ => return Err(IgnoreReason::NoRoute),
        }
        self.discovered = true;
        self.idle.stop();
        self.ui.hide_discover();
        let route = Route { from: StablePhase::Closed, to: StablePhase::Reversed };
        self.machine.begin(route, Phase::Transitioning);
        self.ui.show_pending(route.to);
        self.events.push(ViewerEvent::TransitionStarted {
            from: route.from,
            to: route.to,
            transient: self.machine.phase(),
        });
        let stages = self.config.intro.clone();
        self.begin_stages(TransitionKind::Intro, route.to, stages);
        Ok(())
    }

    fn start_sweep(&mut self) -> Result<(), IgnoreReason> {
        if !self.ui.is_visible(Affordance::FREE_ROTATE) {
            return Err(IgnoreReason::Disabled);
        }
        if self.machine.is_transitioning() {
            return Err(IgnoreReason::Transitioning);
        }
        if self.tweens.is_active(Slot::MODEL_ROTATION) {
            return Err(IgnoreReason::AxisBusy);
        }
        if !self.sweep.trigger(&self.nodes.model) {
            return Err(IgnoreReason::Transitioning);
        }
        self.machine.begin_free_rotation();
        self.ui.set_bar_visible(false);
        self.events.push(ViewerEvent::SweepStarted);
        Ok(())
    }

    fn begin_stages(&mut self, kind: TransitionKind, to: StablePhase, stages: Vec<StageConfig>) {
        self.transition_seq += 1;
        self.transition = Some(ActiveTransition { seq: self.transition_seq, kind, to, stages, timer: None });
        self.run_stage(0);
    }

    fn run_stage(&mut self, index: usize) {
        let Some((seq, to, stage)) =
            self.transition.as_ref().map(|active| (active.seq, active.to, active.stages.get(index).cloned()))
        else {
            return;
        };
        let Some(stage) = stage else {
            self.finish_transition();
            return;
        };

        let clip = stage.clip.as_deref().and_then(|name| self.activate_clip(name));
        let mut longest = 0;
        for spec in &stage.tweens {
            longest = longest.max(self.start_tween_spec(spec));
        }
        let hold_ms = stage.hold_ms.unwrap_or_else(|| longest.saturating_mul(self.step.step_ms()));
        self.events.push(ViewerEvent::StageStarted { to, stage: index, clip });

        let timer = self.scheduler.after(hold_ms, Timeout::StageDone { transition: seq, stage: index });
        if let Some(active) = self.transition.as_mut() {
            active.timer = Some(timer);
        }
    }

    fn on_stage_done(&mut self, id: TimerId, transition: u64, stage: usize) {
        match self.transition.as_mut() {
            Some(active) if active.seq == transition && active.timer == Some(id) => active.timer = None,
            _ => return,
        }
        self.run_stage(stage + 1);
    }

    fn finish_transition(&mut self) {
        let Some(active) = self.transition.take() else {
            return;
        };
        self.machine.complete();
        if active.kind == TransitionKind::Intro {
            self.ui.show_controls();
        } else if self.ui.is_visible(Affordance::FREE_ROTATE) {
            // A route out of a half-turned sweep brings the bar back.
            self.ui.set_bar_visible(true);
        }
        self.ui.show_settled(active.to);
        self.events.push(ViewerEvent::TransitionCompleted { phase: active.to });
    }

    /// Stops the playing action and starts `name` from its first frame.
    fn activate_clip(&mut self, name: &str) -> Option<Arc<str>> {
        let Some(clip) = self.clips.get(name) else {
            eprintln!("[viewer] clip '{name}' is not registered; stage plays no animation.");
            return None;
        };
        let (clip_name, looping) = (clip.name.clone(), clip.looping);
        if let Some(previous) = self.active_clip.take() {
            self.mixer.stop(&previous);
            self.events.push(ViewerEvent::ClipStopped { clip: previous });
        }
        if !self.mixer.play(&clip_name, looping) {
            eprintln!("[viewer] mixer refused clip '{clip_name}'.");
            return None;
        }
        self.active_clip = Some(clip_name.clone());
        self.events.push(ViewerEvent::ClipStarted { clip: clip_name.clone() });
        Some(clip_name)
    }

    /// Rewinds a clip with a settle offset each time it loops or finishes,
    /// so it keeps moving near its final pose.
    fn settle(&mut self, event: MixerEvent) {
        let Some(clip) = self.clips.get(event.clip()) else {
            return;
        };
        let Some(settle) = clip.settle else {
            return;
        };
        let time = settle.resolve(clip.duration());
        let name = clip.name.clone();
        self.mixer.seek(&name, time);
        self.events.push(ViewerEvent::ClipSettled { clip: name, time });
    }

    fn start_tween_spec(&mut self, spec: &TweenSpec) -> u32 {
        let (slot, current, target, steps) = spec.plan(&self.nodes);
        self.start_tween(slot, current, target, steps)
    }

    fn start_tween(&mut self, slot: Slot, current: Vec3, target: Vec3, steps: u32) -> u32 {
        if self.tweens.is_active(slot) {
            self.events.push(ViewerEvent::TweenSuperseded { slot });
        }
        let steps = steps.max(1);
        self.tweens.start(slot, current, target, steps);
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::ButtonState;
    use std::f32::consts::PI;

    const TICK: f32 = 0.02;

    fn loaded(config: ViewerConfig) -> ViewController {
        let mut controller = ViewController::new(config).expect("controller");
        controller.on_loaded(None);
        controller.drain_events();
        controller
    }

    fn run_ms(controller: &mut ViewController, ms: u32) {
        for _ in 0..ms / 20 {
            controller.update(TICK);
        }
    }

    #[test]
    fn requests_before_load_are_ignored() {
        let mut controller = ViewController::new(ViewerConfig::default()).unwrap();
        assert_eq!(controller.forward(), RequestOutcome::Ignored(IgnoreReason::NotLoaded));
        assert_eq!(controller.phase(), Phase::Closed);
    }

    #[test]
    fn load_starts_landing_clip_and_idle_spin() {
        let controller = loaded(ViewerConfig::default());
        assert_eq!(controller.active_clip().map(|c| c.as_ref()), Some("closed"));
        assert!(controller.mixer().is_playing("closed"));
        assert!(controller.is_idle_spinning());
        assert!(controller.ui().is_visible(Affordance::DISCOVER_MORE));
        assert!(!controller.ui().is_visible(Affordance::LOADING));
    }

    #[test]
    fn forward_explodes_after_hold() {
        let mut controller = loaded(ViewerConfig::default());
        assert!(controller.forward().is_started());
        assert_eq!(controller.phase(), Phase::Exploding);
        assert!(!controller.mixer().is_playing("closed"));
        assert!(controller.mixer().is_playing("explosion"));
        assert_eq!(controller.ui().button(StablePhase::Exploded), ButtonState::Current);

        run_ms(&mut controller, 4480);
        assert_eq!(controller.phase(), Phase::Exploding);
        run_ms(&mut controller, 20);
        assert_eq!(controller.phase(), Phase::Exploded);
        assert!(controller.ui().is_visible(Affordance::POI_EXPLODED));
    }

    #[test]
    fn requests_mid_transition_change_nothing() {
        let mut controller = loaded(ViewerConfig::default());
        controller.forward();
        let ui_before = controller.ui().clone();
        assert_eq!(controller.forward(), RequestOutcome::Ignored(IgnoreReason::Transitioning));
        assert_eq!(controller.goto(StablePhase::Folded), RequestOutcome::Ignored(IgnoreReason::Transitioning));
        assert_eq!(controller.phase(), Phase::Exploding);
        assert_eq!(controller.ui(), &ui_before);
    }

    #[test]
    fn multi_stage_route_flips_after_clip() {
        let mut controller = loaded(ViewerConfig::default());
        controller.goto(StablePhase::Exploded);
        run_ms(&mut controller, 4500);
        controller.drain_events();

        assert!(controller.goto(StablePhase::Reversed).is_started());
        run_ms(&mut controller, 4000);
        assert!(controller.tweens().is_active(Slot::MODEL_ROTATION), "flip starts after closing");
        run_ms(&mut controller, 2400);
        assert_eq!(controller.phase(), Phase::Reversed);
        assert!(!controller.tweens().is_active(Slot::MODEL_ROTATION));
    }

    #[test]
    fn settle_rewind_keeps_clip_playing() {
        let mut controller = loaded(ViewerConfig::default());
        controller.forward();
        let duration = controller.clips().get("explosion").unwrap().duration();
        run_ms(&mut controller, (duration * 1000.0) as u32 + 100);
        assert!(controller.mixer().is_playing("explosion"));
        let settled = controller.events().iter().any(|event| {
            matches!(event, ViewerEvent::ClipSettled { clip, .. } if clip.as_ref() == "explosion")
        });
        assert!(settled);
        let time = controller.mixer().time("explosion").unwrap();
        assert!(time >= duration - 9.0 && time < duration);
    }

    #[test]
    fn intro_ends_reversed_with_controls() {
        let mut controller = loaded(ViewerConfig::default());
        assert!(controller.discover_more().is_started());
        assert!(!controller.is_idle_spinning());
        assert!(!controller.ui().is_visible(Affordance::DISCOVER_MORE));
        run_ms(&mut controller, 6000);
        assert_eq!(controller.phase(), Phase::Reversed);
        assert!(controller.ui().is_visible(Affordance::BUTTON_BAR));
        assert!(controller.ui().is_visible(Affordance::POI_REVERSED));
        assert!((controller.model().rotation.x).abs() < 1e-4);
        assert_eq!(controller.model().position, Vec3::ZERO);
        assert_eq!(
            controller.discover_more(),
            RequestOutcome::Ignored(IgnoreReason::AlreadyDiscovered)
        );
    }

    #[test]
    fn sweep_needs_visible_control_and_free_axis() {
        let mut controller = loaded(ViewerConfig::default());
        assert_eq!(controller.free_rotate(), RequestOutcome::Ignored(IgnoreReason::Disabled));
        controller.discover_more();
        run_ms(&mut controller, 6000);

        assert!(controller.free_rotate().is_started());
        assert_eq!(controller.phase(), Phase::FreeRotating);
        assert!(!controller.ui().is_visible(Affordance::BUTTON_BAR));
        run_ms(&mut controller, 2500);
        assert_eq!(controller.phase(), Phase::Reversed);
        assert!((controller.model().rotation.x + PI).abs() < 1e-5);
        assert!(!controller.ui().is_visible(Affordance::BUTTON_BAR));

        assert!(controller.free_rotate().is_started());
        run_ms(&mut controller, 2500);
        assert_eq!(controller.model().rotation.x, 0.0);
        assert!(controller.ui().is_visible(Affordance::BUTTON_BAR));
    }

    #[test]
    fn looping_clip_settles_from_its_start_offset() {
        let mut controller = loaded(ViewerConfig::tour());
        assert!(controller.goto(StablePhase::Exploded).is_started());
        let duration = controller.clips().get("explosion").unwrap().duration();
        assert!(duration > 5.0);

        let mut settled_at = None;
        for _ in 0..((duration * 1000.0) as u32 / 20 + 10) {
            controller.update(TICK);
            let settled = controller.drain_events().into_iter().find_map(|event| match event {
                ViewerEvent::ClipSettled { clip, time } if clip.as_ref() == "explosion" => Some(time),
                _ => None,
            });
            if settled.is_some() {
                settled_at = settled;
                break;
            }
        }
        assert_eq!(settled_at, Some(5.0), "explosion loops back to 5 s");
        assert!(controller.mixer().is_playing("explosion"));
        let time = controller.mixer().time("explosion").unwrap();
        assert!((time - 5.0).abs() < 0.05, "cursor at {time}");
    }

    #[test]
    fn zero_sweep_step_is_rejected_before_it_can_lock_the_viewer() {
        let mut config = ViewerConfig::default();
        config.timing.sweep_step_radians = 0.0;
        config.affordances.discover_more = false;
        assert!(ViewController::new(config).is_err());
    }

    #[test]
    fn route_after_half_turn_restores_bar_and_next_sweep_is_half() {
        let mut controller = loaded(ViewerConfig::default());
        controller.discover_more();
        run_ms(&mut controller, 6000);
        assert!(controller.free_rotate().is_started());
        run_ms(&mut controller, 2500);
        assert!(!controller.ui().is_visible(Affordance::BUTTON_BAR));

        // The flip back to closed lands the pitch level again.
        assert!(controller.forward().is_started());
        run_ms(&mut controller, 2400);
        assert_eq!(controller.phase(), Phase::Closed);
        assert!(controller.model().rotation.x.abs() < 1e-5);
        assert!(controller.ui().is_visible(Affordance::BUTTON_BAR));

        controller.drain_events();
        assert!(controller.free_rotate().is_started());
        run_ms(&mut controller, 2500);
        assert_eq!(controller.phase(), Phase::Closed);
        assert!((controller.model().rotation.x + PI).abs() < 1e-5);
        assert!(controller.events().contains(&ViewerEvent::SweepHalfTurn));
    }

    #[test]
    fn dispose_cancels_everything() {
        let mut controller = loaded(ViewerConfig::default());
        controller.goto(StablePhase::Reversed);
        assert!(controller.pending_timeouts() > 0);
        controller.dispose();
        assert_eq!(controller.pending_timeouts(), 0);
        assert_eq!(controller.tweens().active_count(), 0);
        assert!(controller.mixer().playing().is_empty());
        let model = *controller.model();
        run_ms(&mut controller, 3000);
        assert_eq!(*controller.model(), model);
        assert_eq!(controller.forward(), RequestOutcome::Ignored(IgnoreReason::Disposed));
    }

    #[test]
    fn failed_load_shows_error_and_blocks_requests() {
        let mut controller = ViewController::new(ViewerConfig::default()).unwrap();
        controller.on_load_failed("404");
        assert_eq!(controller.load_state(), &LoadState::Failed("404".to_string()));
        assert!(controller.ui().is_visible(Affordance::LOAD_ERROR));
        assert_eq!(controller.forward(), RequestOutcome::Ignored(IgnoreReason::NotLoaded));
        controller.on_loaded(None);
        assert!(matches!(controller.load_state(), LoadState::Failed(_)));
    }

    #[test]
    fn tour_camera_follows_waypoints() {
        let mut controller = loaded(ViewerConfig::tour());
        assert!(controller.ui().is_visible(Affordance::BUTTON_BAR));
        controller.goto(StablePhase::Unfolded);
        run_ms(&mut controller, 18000);
        assert_eq!(controller.phase(), Phase::Unfolded);
        assert!((controller.camera_transform().position - Vec3::new(0.0, 3.0, 0.8)).length() < 1e-4);
    }
}
