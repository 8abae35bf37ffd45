mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use foresight::context::{Context, Pipeline, Stage};
use foresight::event::StageAction;
use foresight::transform::{IgnoreBigJumps, MiceQuantizer, MouseMode};
use input_linux_sys::{REL_X, REL_Y};

/// Feeds a fixed vector of events through the pipeline, one per `process`
/// call, then signals `Exit`.
struct VecProducer {
    events: std::vec::IntoIter<foresight::event::Event>,
}

impl Stage for VecProducer {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        match self.events.next() {
            Some(event) => {
                ctx.event = Some(event);
                StageAction::Next
            }
            None => StageAction::Exit,
        }
    }
}

struct Collector(Vec<foresight::event::Event>);
impl Stage for Collector {
    fn process(&mut self, ctx: &mut Context) -> StageAction {
        if let Some(event) = ctx.event {
            self.0.push(event);
        }
        StageAction::Next
    }
}

#[test]
fn big_jumps_are_dropped_before_reaching_the_end_of_the_pipeline() {
    let events = vec![
        common::rel_ev(0, REL_X as u16, 5),
        common::rel_ev(1_000, REL_X as u16, 500), // dropped: exceeds threshold
        common::rel_ev(2_000, REL_Y as u16, 3),
    ];

    let stop = Arc::new(AtomicBool::new(false));
    let mut ctx = Context::new(stop);
    let mut pipeline = Pipeline::builder()
        .stage(VecProducer {
            events: events.into_iter(),
        })
        .stage(IgnoreBigJumps { threshold: 100 })
        .build();

    let mut seen = Vec::new();
    loop {
        match pipeline.run_once(&mut ctx) {
            StageAction::Exit => break,
            StageAction::Next => {
                if let Some(event) = ctx.event {
                    seen.push(event.value());
                }
            }
            StageAction::IgnoreEvent | StageAction::Idle => {}
        }
    }

    assert_eq!(seen, vec![5, 3]);
}

#[test]
fn quantizer_conserves_motion_through_the_pipeline() {
    let events = vec![
        common::rel_ev(0, REL_X as u16, 4),
        common::rel_ev(1_000, REL_X as u16, 4),
        common::rel_ev(2_000, REL_X as u16, 4),
    ];

    let mut quantizer = MiceQuantizer::new(10);
    for event in &events {
        quantizer.process_rel(event.code(), event.value());
    }
    // 4 + 4 + 4 = 12 -> one step of 10 consumed, remainder 2 kept.
    assert_eq!(quantizer.consume_x(), 1);
}

#[test]
fn mouse_mode_composes_into_a_real_pipeline_and_preserves_sign() {
    let events = vec![
        common::rel_ev(0, REL_X as u16, -12),
        common::rel_ev(1_000, REL_Y as u16, 3),
    ];

    let stop = Arc::new(AtomicBool::new(false));
    let mut ctx = Context::new(stop);
    let mut pipeline = Pipeline::builder()
        .stage(VecProducer {
            events: events.into_iter(),
        })
        .stage(MouseMode::new(10))
        .build();

    let mut seen = Vec::new();
    loop {
        match pipeline.run_once(&mut ctx) {
            StageAction::Exit => break,
            StageAction::Next => seen.push(ctx.event.unwrap().value()),
            StageAction::IgnoreEvent | StageAction::Idle => {}
        }
    }

    // -12 crosses one step of 10, sign preserved; 3 never reaches a step.
    assert_eq!(seen, vec![-1]);
}
