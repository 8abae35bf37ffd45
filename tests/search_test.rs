mod common;

use foresight::search::{MultiClickTrigger, SwipeDetector};
use input_linux_sys::{BTN_LEFT, EV_KEY, REL_X};

#[test]
fn triple_click_fires_only_on_the_third_clean_click() {
    let mut trigger = MultiClickTrigger::new(EV_KEY as u16, BTN_LEFT as u16, 400_000, 3);

    assert!(!trigger.process(&common::key_ev(0, BTN_LEFT as u16, 1)));
    assert!(!trigger.process(&common::key_ev(100_000, BTN_LEFT as u16, 1)));
    assert!(trigger.process(&common::key_ev(200_000, BTN_LEFT as u16, 1)));
}

#[test]
fn click_after_the_reset_window_restarts_the_count() {
    let mut trigger = MultiClickTrigger::new(EV_KEY as u16, BTN_LEFT as u16, 50_000, 2);

    assert!(!trigger.process(&common::key_ev(0, BTN_LEFT as u16, 1)));
    // Far past the reset window: count restarts instead of accumulating.
    assert!(!trigger.process(&common::key_ev(1_000_000, BTN_LEFT as u16, 1)));
    assert!(trigger.process(&common::key_ev(1_050_000, BTN_LEFT as u16, 1)));
}

#[test]
fn swipe_threshold_counts_multiples_of_the_configured_distance() {
    let mut swipe = SwipeDetector::new();
    for delta in [40, 40, 40] {
        swipe.process(&common::rel_ev(0, REL_X as u16, delta));
    }
    assert_eq!(swipe.passed_threshold_count(50, 0), (2, 0));
}
