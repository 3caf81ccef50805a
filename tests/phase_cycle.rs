use watch_viewer::config::ViewerConfig;
use watch_viewer::ui::{Affordance, ButtonState};
use watch_viewer::{IgnoreReason, Phase, Request, RequestOutcome, StablePhase, ViewController};

fn ready() -> ViewController {
    let mut controller = ViewController::new(ViewerConfig::default()).expect("controller");
    controller.on_loaded(Some(1600));
    controller
}

fn wait_ms(controller: &mut ViewController, ms: u32) {
    for _ in 0..ms / 20 {
        controller.update(0.02);
    }
}

#[test]
fn four_forwards_return_to_closed() {
    let mut controller = ready();
    let expected = [
        (Phase::Exploding, StablePhase::Exploded, 4500),
        (Phase::Unfolding, StablePhase::Unfolded, 5000),
        (Phase::Folding, StablePhase::Folded, 3000),
        (Phase::Closing, StablePhase::Closed, 4000),
    ];
    for (transient, stable, hold_ms) in expected {
        assert_eq!(controller.forward(), RequestOutcome::Started);
        assert_eq!(controller.phase(), transient);
        wait_ms(&mut controller, hold_ms);
        assert_eq!(controller.phase(), Phase::from(stable));
        assert!(controller.ui().is_visible(Affordance::point_of_interest(stable)));
    }
    assert_eq!(controller.active_clip().map(|clip| clip.as_ref()), Some("closing"));
}

#[test]
fn backward_from_closed_wraps_to_folded() {
    let mut controller = ready();
    controller.backward();
    assert_eq!(controller.phase(), Phase::Folding);
    wait_ms(&mut controller, 21000);
    assert_eq!(controller.phase(), Phase::Folded);
}

#[test]
fn backward_from_reversed_has_no_neighbour() {
    let mut controller = ready();
    controller.goto(StablePhase::Reversed);
    wait_ms(&mut controller, 2400);
    assert_eq!(controller.phase(), Phase::Reversed);
    assert_eq!(controller.backward(), RequestOutcome::Ignored(IgnoreReason::NoNeighbour));
    assert_eq!(controller.forward(), RequestOutcome::Started);
    wait_ms(&mut controller, 2400);
    assert_eq!(controller.phase(), Phase::Closed);
}

#[test]
fn requests_while_transitioning_leave_state_alone() {
    let mut controller = ready();
    controller.request(Request::Goto(StablePhase::Unfolded));
    wait_ms(&mut controller, 1000);
    let phase = controller.phase();
    let ui = controller.ui().clone();
    let clip = controller.active_clip().cloned();
    for request in [Request::Forward, Request::Backward, Request::Goto(StablePhase::Closed)] {
        assert_eq!(controller.request(request), RequestOutcome::Ignored(IgnoreReason::Transitioning));
    }
    assert_eq!(controller.phase(), phase);
    assert_eq!(controller.ui(), &ui);
    assert_eq!(controller.active_clip().cloned(), clip);
}

#[test]
fn buttons_update_before_the_phase_settles() {
    let mut controller = ready();
    controller.goto(StablePhase::Unfolded);
    let ui = controller.ui();
    assert_eq!(ui.button(StablePhase::Reversed), ButtonState::Backward);
    assert_eq!(ui.button(StablePhase::Exploded), ButtonState::Backward);
    assert_eq!(ui.button(StablePhase::Unfolded), ButtonState::Current);
    assert_eq!(ui.button(StablePhase::Folded), ButtonState::Forward);
    assert!((ui.progress - 0.7).abs() < 1e-6);
    assert!(!ui.visible.intersects(Affordance::POINTS_OF_INTEREST));
}

#[test]
fn goto_current_phase_is_ignored() {
    let mut controller = ready();
    assert_eq!(controller.goto(StablePhase::Closed), RequestOutcome::Ignored(IgnoreReason::AlreadyThere));
}
