//! Shared event-builder helpers for integration tests.

use foresight::event::Event;
use input_linux_sys::{EV_KEY, EV_REL, EV_SYN};

pub fn key_ev(ts_us: u64, code: u16, value: i32) -> Event {
    let mut e = Event::new(EV_KEY as u16, code, value);
    e.set_micros(ts_us);
    e
}

pub fn rel_ev(ts_us: u64, code: u16, value: i32) -> Event {
    let mut e = Event::new(EV_REL as u16, code, value);
    e.set_micros(ts_us);
    e
}

pub fn syn_ev(ts_us: u64) -> Event {
    let mut e = Event::new(EV_SYN as u16, 0, 0);
    e.set_micros(ts_us);
    e
}
