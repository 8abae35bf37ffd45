//! Trigger detectors that watch the event stream for a pattern: a typed
//! word, a held chord, a rapid multi-click, or a swipe past some
//! displacement threshold.

use std::collections::VecDeque;

use input_linux_sys::BTN_LEFT;

use crate::event::{is_mouse_movement, Event};
use crate::hashing::{fnv1a_hash, fnv1a_init};
use crate::keymap::{How2Type, Keymap};
use crate::keys_status::KeysStatus;

/// Watches for a literal string typed through the live layout.
///
/// The original engine kept a single hash that only ever grew, so it
/// could never actually signal a match past the first few keystrokes —
/// this keeps a trailing window of the last N key-press codes (N = the
/// trigger's length) and compares that window against the target
/// sequence, with a cheap hash pre-filter before the exact compare.
pub struct TypedTrigger {
    target_codes: Vec<u16>,
    target_hash: u64,
    window: VecDeque<u16>,
}

fn hash_codes(codes: impl IntoIterator<Item = u16>) -> u64 {
    let mut state = fnv1a_init();
    for code in codes {
        state = fnv1a_hash(state, code);
    }
    state
}

impl TypedTrigger {
    pub fn new(trigger: &str, keymap: &Keymap) -> Self {
        let how2type = How2Type::new(keymap);
        let mut target_codes = Vec::new();
        how2type.emit_str(trigger, |event| {
            if event.is_key_event() && event.value() == 1 {
                target_codes.push(event.code());
            }
        });
        let target_hash = hash_codes(target_codes.iter().copied());
        let window = VecDeque::with_capacity(target_codes.len());
        TypedTrigger {
            target_codes,
            target_hash,
            window,
        }
    }

    /// Feeds one event; returns true the instant the trailing window of
    /// key-presses matches the trigger sequence.
    pub fn process(&mut self, event: &Event) -> bool {
        if self.target_codes.is_empty() || !event.is_key_event() || event.value() != 1 {
            return false;
        }

        self.window.push_back(event.code());
        while self.window.len() > self.target_codes.len() {
            self.window.pop_front();
        }
        if self.window.len() != self.target_codes.len() {
            return false;
        }

        let window_hash = hash_codes(self.window.iter().copied());
        window_hash == self.target_hash && self.window.iter().eq(self.target_codes.iter())
    }
}

/// Fires when every key in a fixed set is simultaneously held down.
pub struct ChordTrigger {
    keys: Vec<u16>,
}

impl ChordTrigger {
    pub fn new(keys: Vec<u16>) -> Self {
        ChordTrigger { keys }
    }

    pub fn matches(&self, status: &KeysStatus) -> bool {
        !self.keys.is_empty() && status.is_pressed(&self.keys)
    }
}

/// Fires on the Nth click of a matched event within `duration_threshold`
/// of the previous one, ignoring sub-millisecond contact-bounce clicks.
pub struct MultiClickTrigger {
    event_type: u16,
    event_code: u16,
    duration_threshold_us: u64,
    target_count: u32,
    cur_count: u32,
    last_click_us: Option<u64>,
}

impl MultiClickTrigger {
    pub fn new(event_type: u16, event_code: u16, duration_threshold_us: u64, target_count: u32) -> Self {
        MultiClickTrigger {
            event_type,
            event_code,
            duration_threshold_us,
            target_count,
            cur_count: 0,
            last_click_us: None,
        }
    }

    pub fn process(&mut self, event: &Event) -> bool {
        if event.type_() != self.event_type || event.code() != self.event_code || event.value() != 1 {
            return false;
        }

        let now = event.micros();
        let Some(last) = self.last_click_us.replace(now) else {
            self.cur_count = 1;
            return false;
        };

        let dur = now.saturating_sub(last);
        if dur <= 1_000 {
            // Contact bounce: ignore, but the timestamp update above
            // still stands so a real click right after isn't penalized.
            return false;
        }
        if dur > self.duration_threshold_us {
            self.cur_count = 1;
            return false;
        }

        self.cur_count += 1;
        if self.cur_count >= self.target_count {
            self.cur_count = 0;
            true
        } else {
            false
        }
    }
}

/// Tracks cumulative pointer displacement since the last `BTN_LEFT`
/// click and reports how many threshold multiples have been crossed on
/// each axis.
pub struct SwipeDetector {
    cur_x: i32,
    cur_y: i32,
}

impl Default for SwipeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SwipeDetector {
    pub fn new() -> Self {
        SwipeDetector { cur_x: 0, cur_y: 0 }
    }

    pub fn reset(&mut self) {
        self.cur_x = 0;
        self.cur_y = 0;
    }

    pub fn process(&mut self, event: &Event) {
        if event.is_key_event() && event.code() == BTN_LEFT as u16 {
            self.reset();
            return;
        }
        if is_mouse_movement(event) {
            match i32::from(event.code()) {
                code if code == input_linux_sys::REL_X => self.cur_x += event.value(),
                code if code == input_linux_sys::REL_Y => self.cur_y += event.value(),
                _ => {}
            }
        }
    }

    pub fn is_active(&self, x_axis: i32, y_axis: i32) -> bool {
        (self.cur_x.abs() >= x_axis.abs())
            && (self.cur_x.signum() == x_axis.signum() || x_axis == 0)
            && (self.cur_y.abs() >= y_axis.abs())
            && (self.cur_y.signum() == y_axis.signum() || y_axis == 0)
    }

    pub fn passed_threshold_count(&self, x_axis: i32, y_axis: i32) -> (u16, u16) {
        let x_multiples = if x_axis != 0 && self.cur_x.signum() == x_axis.signum() {
            (self.cur_x.abs() / x_axis.abs()) as u16
        } else {
            0
        };
        let y_multiples = if y_axis != 0 && self.cur_y.signum() == y_axis.signum() {
            (self.cur_y.abs() / y_axis.abs()) as u16
        } else {
            0
        };
        (x_multiples, y_multiples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_linux_sys::{EV_KEY, EV_REL, REL_X};

    #[test]
    fn multi_click_ignores_bounce_and_fires_on_target_count() {
        let mut trigger = MultiClickTrigger::new(EV_KEY as u16, BTN_LEFT as u16, 400_000, 2);
        let mut click = |micros: u64| {
            let mut event = Event::new(EV_KEY as u16, BTN_LEFT as u16, 1);
            event.set_micros(micros);
            trigger.process(&event)
        };
        assert!(!click(0));
        assert!(!click(500)); // bounce, under 1ms
        assert!(click(100_000)); // second real click within threshold
    }

    #[test]
    fn swipe_detector_resets_on_left_click() {
        let mut swipe = SwipeDetector::new();
        let mut mv = Event::new(EV_REL as u16, REL_X as u16, 50);
        swipe.process(&mv);
        assert!(swipe.is_active(40, 0));
        let click = Event::new(EV_KEY as u16, BTN_LEFT as u16, 1);
        swipe.process(&click);
        mv = Event::new(EV_REL as u16, REL_X as u16, 10);
        swipe.process(&mv);
        assert!(!swipe.is_active(40, 0));
    }

    #[test]
    fn chord_trigger_requires_every_key_pressed() {
        let mut status = KeysStatus::new();
        status.process(&Event::new(EV_KEY as u16, 29, 1));
        let trigger = ChordTrigger::new(vec![29, 42]);
        assert!(!trigger.matches(&status));
        status.process(&Event::new(EV_KEY as u16, 42, 1));
        assert!(trigger.matches(&status));
    }
}
