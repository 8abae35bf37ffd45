//! Drops tablet-only noise (raw `EV_ABS` and tool-presence buttons) for
//! pipelines that only want the synthesized relative/click stream.

use input_linux_sys::{BTN_TOOL_BRUSH, BTN_TOOL_PEN, BTN_TOOL_RUBBER, EV_ABS, EV_KEY};

use crate::context::{Context, Stage};
use crate::event::StageAction;

pub struct IgnoreAbs;

impl Stage for IgnoreAbs {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        let Some(event) = ctx.event else {
            return StageAction::Next;
        };
        let (type_, code) = (event.type_() as i32, event.code() as i32);
        if type_ == EV_ABS {
            return StageAction::IgnoreEvent;
        }
        if type_ == EV_KEY && matches!(code, BTN_TOOL_RUBBER | BTN_TOOL_BRUSH | BTN_TOOL_PEN) {
            return StageAction::IgnoreEvent;
        }
        StageAction::Next
    }
}
