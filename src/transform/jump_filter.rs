//! Jump filters: drop implausibly large pointer-movement deltas, and
//! suppress the small jitter that accompanies the start of a click-drag.

use crate::context::{Context, Stage};
use crate::event::{is_mouse_movement, StageAction};

/// Drops any mouse-movement event whose magnitude exceeds `threshold`.
pub struct IgnoreBigJumps {
    pub threshold: i32,
}

impl Stage for IgnoreBigJumps {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        if let Some(event) = ctx.event {
            if is_mouse_movement(&event) && event.value().abs() > self.threshold {
                return StageAction::IgnoreEvent;
            }
        }
        StageAction::Next
    }
}

/// Suppresses small pointer jitter right after a left-button press, up
/// until either enough cumulative displacement or enough time has
/// passed — the "did they mean to drag" window.
pub struct IgnoreInitMoves {
    threshold: i32,
    time_threshold_us: u64,
    init_distance: i32,
    is_left_btn_down: bool,
    last_moved_us: u64,
}

impl IgnoreInitMoves {
    pub fn new(threshold: i32, time_threshold_us: u64) -> Self {
        IgnoreInitMoves {
            threshold,
            time_threshold_us,
            init_distance: 0,
            is_left_btn_down: false,
            last_moved_us: 0,
        }
    }
}

impl Stage for IgnoreInitMoves {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let Some(event) = ctx.event else {
            return StageAction::Next;
        };

        if event.type_() as i32 == input_linux_sys::EV_KEY
            && event.code() as i32 == input_linux_sys::BTN_LEFT
        {
            self.init_distance = 0;
            self.is_left_btn_down = event.value() == 1;
            return StageAction::Next;
        }

        if self.is_left_btn_down && is_mouse_movement(&event) {
            self.init_distance += event.value();
            let now = event.micros();

            if self.init_distance.abs() < self.threshold
                && now.saturating_sub(self.last_moved_us) >= self.time_threshold_us
            {
                return StageAction::IgnoreEvent;
            }
            self.last_moved_us = now;
            self.is_left_btn_down = false;
        }
        StageAction::Next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use input_linux_sys::{EV_REL, REL_X};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn ctx() -> Context {
        Context::new(Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn big_jump_is_dropped() {
        let mut stage = IgnoreBigJumps { threshold: 50 };
        let mut c = ctx();
        c.event = Some(Event::new(EV_REL as u16, REL_X as u16, 500));
        assert_eq!(stage.process(&mut c), StageAction::IgnoreEvent);
    }

    #[test]
    fn small_jump_passes_through() {
        let mut stage = IgnoreBigJumps { threshold: 50 };
        let mut c = ctx();
        c.event = Some(Event::new(EV_REL as u16, REL_X as u16, 5));
        assert_eq!(stage.process(&mut c), StageAction::Next);
    }
}
