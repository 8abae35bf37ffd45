//! Converts a tablet's absolute-position stream into relative-motion
//! events a mouse-oriented downstream can consume, synthesizing button
//! clicks out of stylus state.

use input_linux_sys::{
    ABS_PRESSURE, ABS_TILT_X, ABS_TILT_Y, ABS_X, ABS_Y, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT,
    BTN_STYLUS, BTN_STYLUS2, BTN_STYLUS3, BTN_TOOL_AIRBRUSH, BTN_TOOL_BRUSH, BTN_TOOL_PEN,
    BTN_TOOL_PENCIL, BTN_TOOL_RUBBER, BTN_TOUCH, EV_ABS, EV_KEY, EV_REL, REL_X, REL_Y,
};

use crate::context::{Context, Stage};
use crate::event::StageAction;

/// Stateful abs-to-relative converter for a single tablet device.
pub struct AbsToRel {
    x_scale_factor: f64,
    y_scale_factor: f64,
    last_abs_x: Option<i32>,
    last_abs_y: Option<i32>,
    is_left_down: bool,
    pressure_threshold: i32,
    active_tool: Option<u16>,
    events_sent: i64,
}

impl AbsToRel {
    /// `configured_scale` is the caller's chosen pixels-per-unit target;
    /// the actual per-axis factor is `resolution / configured_scale`,
    /// read from the source device's abs-axis calibration.
    pub fn new(x_resolution: i32, y_resolution: i32, configured_scale: f64, pressure_threshold: i32) -> Self {
        AbsToRel {
            x_scale_factor: x_resolution as f64 / configured_scale,
            y_scale_factor: y_resolution as f64 / configured_scale,
            last_abs_x: None,
            last_abs_y: None,
            is_left_down: false,
            pressure_threshold,
            active_tool: None,
            events_sent: 0,
        }
    }
}

impl Stage for AbsToRel {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let Some(event) = ctx.event.as_mut() else {
            return StageAction::Next;
        };
        let (type_, code, value) = (event.type_() as i32, event.code() as i32, event.value());

        if event.is_syn() {
            let sent = self.events_sent;
            self.events_sent = -1;
            if sent <= 0 {
                return StageAction::IgnoreEvent;
            }
        }

        if type_ == EV_ABS {
            match code {
                ABS_X => {
                    let Some(last) = self.last_abs_x else {
                        self.last_abs_x = Some(value);
                        return StageAction::IgnoreEvent;
                    };
                    let delta = value - last;
                    let pixels = (delta as f64 / self.x_scale_factor).round() as i32;
                    event.set(EV_REL as u16, REL_X as u16);
                    event.set_value(pixels);
                    if pixels != 0 {
                        self.last_abs_x = Some(value);
                    }
                }
                ABS_Y => {
                    let Some(last) = self.last_abs_y else {
                        self.last_abs_y = Some(value);
                        return StageAction::IgnoreEvent;
                    };
                    let delta = value - last;
                    let pixels = (delta as f64 / self.y_scale_factor) as i32;
                    event.set(EV_REL as u16, REL_Y as u16);
                    event.set_value(pixels);
                    if pixels != 0 {
                        self.last_abs_y = Some(value);
                    }
                }
                ABS_TILT_X | ABS_TILT_Y => return StageAction::IgnoreEvent,
                ABS_PRESSURE => {
                    if value >= self.pressure_threshold && !self.is_left_down {
                        event.set(EV_KEY as u16, BTN_LEFT as u16);
                        event.set_value(1);
                        self.is_left_down = true;
                    } else if value < self.pressure_threshold && self.is_left_down {
                        event.set(EV_KEY as u16, BTN_LEFT as u16);
                        event.set_value(0);
                        self.is_left_down = false;
                    } else {
                        return StageAction::IgnoreEvent;
                    }
                }
                _ => {}
            }
        } else if type_ == EV_KEY {
            match code {
                BTN_STYLUS => event.set_code(BTN_RIGHT as u16),
                BTN_TOUCH | BTN_STYLUS2 | BTN_STYLUS3 => return StageAction::IgnoreEvent,
                BTN_TOOL_RUBBER => event.set_code(BTN_MIDDLE as u16),
                BTN_TOOL_PEN | BTN_TOOL_BRUSH | BTN_TOOL_PENCIL | BTN_TOOL_AIRBRUSH => {
                    self.active_tool = Some(code as u16);
                    return StageAction::IgnoreEvent;
                }
                _ => {}
            }
        } else if type_ == EV_REL {
            match code {
                REL_X => self.last_abs_x = Some(self.last_abs_x.unwrap_or(0) + value),
                REL_Y => self.last_abs_y = Some(self.last_abs_y.unwrap_or(0) + value),
                _ => {}
            }
        }

        self.events_sent += 1;
        StageAction::Next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::event::Event;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn first_abs_x_sample_only_seeds_state() {
        let mut stage = AbsToRel::new(1000, 1000, 100.0, 512);
        let mut ctx = Context::new(Arc::new(AtomicBool::new(false)));
        ctx.event = Some(Event::new(EV_ABS as u16, ABS_X as u16, 100));
        let action = stage.process(&mut ctx);
        assert_eq!(action, StageAction::IgnoreEvent);
    }

    #[test]
    fn abs_x_converts_to_scaled_rel_delta() {
        let mut stage = AbsToRel::new(1000, 1000, 100.0, 512);
        let mut ctx = Context::new(Arc::new(AtomicBool::new(false)));
        ctx.event = Some(Event::new(EV_ABS as u16, ABS_X as u16, 100));
        stage.process(&mut ctx);
        ctx.event = Some(Event::new(EV_ABS as u16, ABS_X as u16, 110));
        let action = stage.process(&mut ctx);
        let ev = ctx.event.unwrap();
        assert_eq!(action, StageAction::Next);
        assert_eq!(ev.type_() as i32, EV_REL);
        assert_eq!(ev.code() as i32, REL_X);
        assert_eq!(ev.value(), 1);
    }

    #[test]
    fn pressure_crossing_threshold_synthesizes_left_click() {
        let mut stage = AbsToRel::new(1000, 1000, 100.0, 512);
        let mut ctx = Context::new(Arc::new(AtomicBool::new(false)));
        ctx.event = Some(Event::new(EV_ABS as u16, ABS_PRESSURE as u16, 600));
        stage.process(&mut ctx);
        let ev = ctx.event.unwrap();
        assert_eq!(ev.type_() as i32, EV_KEY);
        assert_eq!(ev.code() as i32, BTN_LEFT);
        assert_eq!(ev.value(), 1);
    }
}
