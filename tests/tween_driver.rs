use glam::Vec3;
use std::f32::consts::PI;
use watch_viewer::rotation::IdleSpin;
use watch_viewer::transform::{SceneNodes, Slot, Transform};
use watch_viewer::tween::TweenDriver;

#[test]
fn tweens_land_on_target_after_exactly_n_ticks() {
    for steps in [1_u32, 10, 200] {
        let mut nodes = SceneNodes::default();
        let target = Vec3::new(1.0, -2.5, 0.3);
        let mut driver = TweenDriver::new();
        driver.start(Slot::MODEL_POSITION, nodes.read(Slot::MODEL_POSITION), target, steps);
        for tick in 1..steps {
            assert!(driver.tick(&mut nodes).is_empty(), "finished early at tick {tick} of {steps}");
        }
        let finished = driver.tick(&mut nodes);
        assert_eq!(finished.len(), 1);
        assert!((nodes.read(Slot::MODEL_POSITION) - target).length() < 1e-5, "steps={steps}");
        assert!(!driver.is_active(Slot::MODEL_POSITION));
    }
}

#[test]
fn superseded_tween_stops_mutating() {
    let mut nodes = SceneNodes::default();
    let mut driver = TweenDriver::new();
    let first = driver.start(Slot::CAMERA_POSITION, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 100);
    driver.tick(&mut nodes);
    let here = nodes.read(Slot::CAMERA_POSITION);
    let second = driver.start(Slot::CAMERA_POSITION, here, here, 5);
    assert!(!driver.is_current(first));
    assert!(!driver.cancel(first), "stale handle");
    for _ in 0..5 {
        driver.tick(&mut nodes);
    }
    assert_eq!(nodes.read(Slot::CAMERA_POSITION), here);
    assert!(!driver.is_current(second));
}

#[test]
fn idle_yaw_wraps_before_exceeding_pi() {
    let mut model = Transform::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0));
    let mut spin = IdleSpin::new(PI / 180.0);
    spin.start();
    let mut wrapped = false;
    for _ in 0..20 {
        spin.tick(&mut model, false);
        assert!(model.rotation.y < PI && model.rotation.y >= -PI);
        wrapped |= model.rotation.y < 0.0;
    }
    assert!(wrapped);
}
