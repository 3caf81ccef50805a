pub mod asset;
pub mod cli;
pub mod clips;
pub mod config;
pub mod controller;
pub mod events;
pub mod mixer;
pub mod phase;
pub mod rotation;
pub mod time;
pub mod transform;
pub mod tween;
pub mod ui;
pub mod viewport;

pub use controller::{LoadState, RequestOutcome, ViewController};
pub use phase::{IgnoreReason, Phase, Request, StablePhase};

use anyhow::{Context, Result};
use cli::{CliOverrides, ScriptStep};

/// Runs a headless session: load, play the script, then keep ticking for
/// `--seconds`. Every event is printed with the session clock.
pub fn run_with_overrides(cli: CliOverrides) -> Result<()> {
    let config = cli.resolve_config()?;
    let steps = cli.load_script()?;
    let mut wall = time::Time::new();
    let mut controller = ViewController::new(config).context("Failed to create view controller")?;
    println!("[viewer] variant={} steps={}", controller.config().variant, steps.len());

    if let Some(path) = cli.asset() {
        let result = controller.load_asset(path);
        print_events(&mut controller);
        let asset = result.with_context(|| format!("Failed to load asset {}", path.display()))?;
        println!(
            "[viewer] asset {}: {} channels, {} meshes, {:.1}s",
            asset.animation, asset.channel_count, asset.mesh_count, asset.duration
        );
    } else {
        controller.on_loaded(None);
        print_events(&mut controller);
    }

    for step in steps {
        match step {
            ScriptStep::Request(request) => {
                controller.request(request);
            }
            ScriptStep::Wait { ms } => advance(&mut controller, ms),
            ScriptStep::Resize { width, height } => {
                controller.resize(width, height);
            }
            ScriptStep::Dispose => controller.dispose(),
        }
        print_events(&mut controller);
    }

    advance(&mut controller, (cli.seconds() * 1000.0).round() as u32);
    controller.dispose();
    print_events(&mut controller);
    wall.tick();
    println!(
        "[viewer] simulated {:.1}s in {:.3}s wall time",
        controller.elapsed_ms() as f32 / 1000.0,
        wall.elapsed_seconds()
    );
    Ok(())
}

fn advance<M: mixer::AnimationMixer>(controller: &mut ViewController<M>, ms: u32) {
    let tick_ms = controller.config().timing.tick_ms.max(1);
    let dt = tick_ms as f32 / 1000.0;
    for _ in 0..ms / tick_ms {
        controller.update(dt);
        print_events(controller);
    }
}

fn print_events<M: mixer::AnimationMixer>(controller: &mut ViewController<M>) {
    let now = controller.elapsed_ms();
    for event in controller.drain_events() {
        println!("[{now:>7} ms] {event}");
    }
}

/// Wraps an angle into [-PI, PI).
/// Non-finite input comes back as NaN.
pub fn wrap_angle(radians: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if (-PI..PI).contains(&radians) {
        return radians;
    }
    let wrapped = (radians + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU itself.
    if wrapped >= PI {
        -PI
    } else {
        wrapped
    }
}
