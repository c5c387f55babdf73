//! Shared component context

use std::rc::Rc;

use square_core::{EventDispatcher, FrameCallbacks, InteractionRuntime, Millis, TimerQueue};
use square_platform::Page;

/// What every component gets at attach time
///
/// Cloning is cheap; all fields are shared handles into one session.
#[derive(Clone)]
pub struct ComponentContext {
    pub page: Rc<dyn Page>,
    pub timers: TimerQueue,
    pub events: EventDispatcher,
    pub frames: FrameCallbacks,
}

impl ComponentContext {
    pub fn new(page: Rc<dyn Page>, runtime: &InteractionRuntime) -> Self {
        Self {
            page,
            timers: runtime.timers.clone(),
            events: runtime.events.clone(),
            frames: runtime.frames.clone(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.timers.now()
    }
}
