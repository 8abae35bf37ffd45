//! `Context` is the pipeline-global state every stage can see: the event
//! under processing, the cooperative stop flag, and a typed variable bag
//! stages can use to pass data sideways without widening their signature.
//!
//! Pipelines are assembled with a builder, not operator overloading —
//! `a | b | c` reads nicely for three stages but degrades badly once a
//! pipeline needs conditionals or device lists built at runtime.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::event::{Event, StageAction};

/// A typed registry of pipeline-scoped variables. Stages that need to
/// share state that doesn't fit the event stream itself (a shared
/// `KeysStatus`, a `Keymap`) stash it here instead of threading extra
/// constructor arguments through every downstream stage.
#[derive(Default)]
pub struct VarBag {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl VarBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: 'static>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }
}

/// Pipeline-global state visible to every stage.
pub struct Context {
    pub event: Option<Event>,
    stop: Arc<AtomicBool>,
    pub vars: VarBag,
}

impl Context {
    pub fn new(stop: Arc<AtomicBool>) -> Self {
        Context {
            event: None,
            stop,
            vars: VarBag::new(),
        }
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// A pipeline stage. `process` is called once per event that reaches it
/// and returns the action the runner should take next.
///
/// Producers read `ctx.event` only to check whether a previous stage has
/// already supplied one (e.g. a test harness feeding a fixed vector);
/// mutators read and usually rewrite it in place; a terminal emitter
/// consumes it and returns `Next` to let the loop continue with the
/// following event.
pub trait Stage {
    fn process(&mut self, ctx: &mut Context) -> StageAction;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Builds an ordered list of stages and drives them one event at a time.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { stages: Vec::new() }
    }

    /// Runs every stage in order for the current `ctx.event`. Stops early
    /// on `IgnoreEvent`, `Idle`, or `Exit`. Returns the action the last
    /// stage reached, or `StageAction::Next` if the pipeline is empty.
    pub fn run_once(&mut self, ctx: &mut Context) -> StageAction {
        let mut action = StageAction::Next;
        for stage in &mut self.stages {
            action = stage.process(ctx);
            if !matches!(action, StageAction::Next) {
                return action;
            }
        }
        action
    }

    /// Drives the pipeline until a stage returns `Exit` or the
    /// cooperative stop flag is observed set.
    pub fn run(&mut self, ctx: &mut Context) {
        loop {
            if ctx.should_stop() {
                tracing::info!("stop flag observed, shutting pipeline down");
                return;
            }
            match self.run_once(ctx) {
                StageAction::Exit => {
                    tracing::info!("pipeline stage requested exit");
                    return;
                }
                StageAction::Idle | StageAction::IgnoreEvent | StageAction::Next => continue,
            }
        }
    }
}

pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountTo(u32, u32);
    impl Stage for CountTo {
        fn process(&mut self, _ctx: &mut Context) -> StageAction {
            self.0 += 1;
            if self.0 >= self.1 {
                StageAction::Exit
            } else {
                StageAction::Next
            }
        }
    }

    #[test]
    fn run_once_stops_at_first_non_next() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut ctx = Context::new(stop);
        let mut pipe = Pipeline::builder().stage(CountTo(0, 1)).build();
        assert_eq!(pipe.run_once(&mut ctx), StageAction::Exit);
    }

    #[test]
    fn var_bag_round_trips_typed_values() {
        let mut bag = VarBag::new();
        bag.insert(42u32);
        bag.insert("hello".to_string());
        assert_eq!(bag.get::<u32>(), Some(&42));
        assert_eq!(bag.get::<String>().map(String::as_str), Some("hello"));
    }

    #[test]
    fn stop_flag_halts_run() {
        let stop = Arc::new(AtomicBool::new(true));
        let mut ctx = Context::new(stop);
        let mut pipe = Pipeline::builder().stage(CountTo(0, 1000)).build();
        pipe.run(&mut ctx);
        // Should return immediately without panicking or looping forever.
    }
}
