//! Movement quantizer: accumulates relative-motion deltas and releases
//! them only in whole multiples of a fixed step, carrying the remainder
//! forward. `consume_*` is the conservation point — nothing is lost
//! across calls, only delayed until enough motion has accumulated. The
//! released amount keeps the sign of the accumulated value, so callers
//! get a signed step count they can apply directly.

use input_linux_sys::{REL_X, REL_Y};

use crate::context::{Context, Stage};
use crate::event::{is_mouse_movement, StageAction};

/// Accumulates a single axis of `EV_REL` motion against one button code.
pub struct Quantizer {
    step: i32,
    value: i32,
}

impl Quantizer {
    pub fn new(step: i32) -> Self {
        assert!(step > 0, "quantizer step must be positive");
        Quantizer { step, value: 0 }
    }

    pub fn process(&mut self, code: u16, event_code: u16, delta: i32) {
        if code != event_code {
            return;
        }
        self.value += delta;
    }

    /// Returns the signed number of whole `step`-sized increments
    /// accumulated so far (`steps = sign(v) * floor(|v|/step)`), keeping
    /// the sub-step remainder for the next call.
    pub fn consume_steps(&mut self) -> i32 {
        let steps = self.value.signum() * (self.value.abs() / self.step);
        self.value %= self.step;
        steps
    }
}

/// Quantizes both mouse axes independently.
pub struct MiceQuantizer {
    step: i32,
    x_value: i32,
    y_value: i32,
}

impl MiceQuantizer {
    pub fn new(step: i32) -> Self {
        assert!(step > 0, "quantizer step must be positive");
        MiceQuantizer {
            step,
            x_value: 0,
            y_value: 0,
        }
    }

    pub fn process_rel(&mut self, code: u16, delta: i32) {
        match code {
            c if c == REL_X as u16 => self.x_value += delta,
            c if c == REL_Y as u16 => self.y_value += delta,
            _ => {}
        }
    }

    pub fn consume_x(&mut self) -> i32 {
        let steps = self.x_value.signum() * (self.x_value.abs() / self.step);
        self.x_value %= self.step;
        steps
    }

    pub fn consume_y(&mut self) -> i32 {
        let steps = self.y_value.signum() * (self.y_value.abs() / self.step);
        self.y_value %= self.step;
        steps
    }
}

/// Composes `MiceQuantizer` over both axes into a pipeline stage:
/// quantizes `REL_X`/`REL_Y` motion, rewriting the event's value to the
/// signed step count and forwarding it, or holding the event back
/// (`IgnoreEvent`) while the accumulated motion is still under one step.
pub struct MouseMode {
    quantizer: MiceQuantizer,
}

impl MouseMode {
    pub fn new(step: i32) -> Self {
        MouseMode {
            quantizer: MiceQuantizer::new(step),
        }
    }
}

impl Stage for MouseMode {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let Some(event) = ctx.event.as_mut() else {
            return StageAction::Next;
        };
        if !is_mouse_movement(event) {
            return StageAction::Next;
        }

        let code = event.code();
        self.quantizer.process_rel(code, event.value());
        let steps = if code == REL_X as u16 {
            self.quantizer.consume_x()
        } else {
            self.quantizer.consume_y()
        };

        if steps == 0 {
            return StageAction::IgnoreEvent;
        }
        event.set_value(steps);
        StageAction::Next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conserves_motion_across_partial_accumulations() {
        let mut q = Quantizer::new(10);
        q.process(1, 1, 3);
        assert_eq!(q.consume_steps(), 0);
        q.process(1, 1, 3);
        assert_eq!(q.consume_steps(), 0);
        q.process(1, 1, 3);
        assert_eq!(q.consume_steps(), 0);
        q.process(1, 1, 3);
        // total accumulated = 12, one step of 10 consumed, 2 left over
        assert_eq!(q.consume_steps(), 1);
        q.process(1, 1, -2);
        // remainder 2 + (-2) = 0, no step yet
        assert_eq!(q.consume_steps(), 0);
    }

    #[test]
    fn mice_quantizer_tracks_axes_independently() {
        let mut q = MiceQuantizer::new(5);
        q.process_rel(input_linux_sys::REL_X as u16, 12);
        q.process_rel(input_linux_sys::REL_Y as u16, 3);
        assert_eq!(q.consume_x(), 2);
        assert_eq!(q.consume_y(), 0);
    }
}
