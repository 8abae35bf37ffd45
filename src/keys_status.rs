//! Key and LED state tracking: fixed arrays indexed by evdev code, kept
//! current by feeding every event through `process`. Single-writer
//! (the pipeline thread), multi-reader; all indexing is bounds-checked
//! rather than trusting codes from the wire.

use input_linux_sys::{EV_KEY, EV_LED, KEY_MAX, LED_MAX};

use crate::event::Event;

/// Tracks the press state (0 = released, 1 = pressed, 2 = autorepeat) of
/// every `EV_KEY` code.
pub struct KeysStatus {
    btns: Vec<i32>,
}

impl Default for KeysStatus {
    fn default() -> Self {
        KeysStatus {
            btns: vec![0; KEY_MAX as usize],
        }
    }
}

impl KeysStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, codes: &[u16]) -> bool {
        codes
            .iter()
            .all(|&c| (c as usize) < self.btns.len() && self.btns[c as usize] != 0)
    }

    pub fn is_released(&self, codes: &[u16]) -> bool {
        codes
            .iter()
            .all(|&c| (c as usize) < self.btns.len() && self.btns[c as usize] == 0)
    }

    pub fn value(&self, code: u16) -> i32 {
        self.btns.get(code as usize).copied().unwrap_or(0)
    }

    pub fn process(&mut self, event: &Event) {
        if event.type_() as i32 != EV_KEY {
            return;
        }
        if let Some(slot) = self.btns.get_mut(event.code() as usize) {
            *slot = event.value();
        }
    }
}

/// Tracks the on/off state of every `EV_LED` code.
pub struct LedStatus {
    leds: Vec<i32>,
}

impl Default for LedStatus {
    fn default() -> Self {
        LedStatus {
            leds: vec![0; LED_MAX as usize],
        }
    }
}

impl LedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self, codes: &[u16]) -> bool {
        codes
            .iter()
            .all(|&c| (c as usize) < self.leds.len() && self.leds[c as usize] != 0)
    }

    pub fn is_off(&self, codes: &[u16]) -> bool {
        codes
            .iter()
            .all(|&c| (c as usize) < self.leds.len() && self.leds[c as usize] == 0)
    }

    pub fn process(&mut self, event: &Event) {
        if event.type_() as i32 != EV_LED {
            return;
        }
        if let Some(slot) = self.leds.get_mut(event.code() as usize) {
            *slot = event.value();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_linux_sys::EV_KEY;

    #[test]
    fn press_then_release_round_trips() {
        let mut status = KeysStatus::new();
        let mut down = Event::new(EV_KEY as u16, 30, 1);
        status.process(&down);
        assert!(status.is_pressed(&[30]));
        assert!(!status.is_released(&[30]));
        down.set_value(0);
        status.process(&down);
        assert!(status.is_released(&[30]));
    }

    #[test]
    fn out_of_range_code_is_ignored_not_panicking() {
        let mut status = KeysStatus::new();
        let huge = Event::new(EV_KEY as u16, u16::MAX, 1);
        status.process(&huge);
        assert!(!status.is_pressed(&[u16::MAX]));
    }
}
