//! Square Runtime
//!
//! The interaction runtime that orchestrates the clock, timers, frame
//! callbacks and event dispatch for one page session.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use square_platform::PageEvent;

use crate::clock::{Clock, Millis};
use crate::dispatch::{DispatchOutcome, EventContext, EventDispatcher};
use crate::timer::TimerQueue;

/// Frame interval in milliseconds (~60 fps)
pub const FRAME_MS: Millis = 16;

new_key_type! {
    /// Handle to a registered frame callback
    pub struct FrameCallbackId;
}

/// Called once per animation frame with the elapsed milliseconds
pub type FrameCallback = Rc<dyn Fn(Millis)>;

/// Frame callback registry (cheap to clone)
#[derive(Clone, Default)]
pub struct FrameCallbacks {
    inner: Rc<RefCell<SlotMap<FrameCallbackId, FrameCallback>>>,
}

impl FrameCallbacks {
    pub fn add<F>(&self, f: F) -> FrameCallbackId
    where
        F: Fn(Millis) + 'static,
    {
        self.inner.borrow_mut().insert(Rc::new(f))
    }

    pub fn remove(&self, id: FrameCallbackId) -> bool {
        self.inner.borrow_mut().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn run(&self, dt: Millis) {
        let snapshot: SmallVec<[FrameCallback; 4]> =
            self.inner.borrow().values().cloned().collect();
        for callback in snapshot {
            callback(dt);
        }
    }

    fn clear(&self) {
        let drained: Vec<FrameCallback> = {
            let mut inner = self.inner.borrow_mut();
            let ids: Vec<FrameCallbackId> = inner.keys().collect();
            ids.into_iter().filter_map(|id| inner.remove(id)).collect()
        };
        drop(drained);
    }
}

/// The interaction runtime - owns the clock, timers, frames and event handling
pub struct InteractionRuntime {
    clock: Clock,
    pub timers: TimerQueue,
    pub events: EventDispatcher,
    pub frames: FrameCallbacks,
    next_frame: Cell<Millis>,
}

impl InteractionRuntime {
    pub fn new() -> Self {
        let clock = Clock::new();
        Self {
            timers: TimerQueue::new(clock.clone()),
            events: EventDispatcher::new(),
            frames: FrameCallbacks::default(),
            next_frame: Cell::new(FRAME_MS),
            clock,
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Deliver a page event to subscribed handlers
    pub fn dispatch(&self, event: &PageEvent) -> DispatchOutcome {
        let ctx = EventContext::new(self.now());
        let outcome = self.events.dispatch(event, &ctx);
        tracing::trace!(
            "dispatched {:?} to {} handler(s) at {}ms",
            event.kind(),
            outcome.handled,
            ctx.now()
        );
        outcome
    }

    /// Advance virtual time by `ms`, firing due timers and frames in order
    ///
    /// When a timer and a frame fall on the same millisecond the timer runs
    /// first.
    pub fn advance(&self, ms: Millis) {
        let target = self.now() + ms;
        loop {
            let frame_at = self.next_frame.get();
            let next = match self.timers.next_deadline() {
                Some(deadline) => deadline.min(frame_at),
                None => frame_at,
            };
            if next > target {
                break;
            }
            self.clock.set(next);
            self.timers.fire_due(next);
            if frame_at == next {
                self.next_frame.set(frame_at + FRAME_MS);
                self.frames.run(FRAME_MS);
            }
        }
        self.clock.set(target);
    }

    /// Detach every handler, cancel every timer and frame callback
    pub fn clear(&self) {
        self.events.clear();
        self.timers.clear();
        self.frames.clear();
    }

    /// Get statistics about the runtime
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            now: self.now(),
            pending_timers: self.timers.len(),
            handlers: self.events.len(),
            frame_callbacks: self.frames.len(),
        }
    }
}

impl Default for InteractionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    pub now: Millis,
    pub pending_timers: usize,
    pub handlers: usize,
    pub frame_callbacks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use square_platform::EventKind;

    #[test]
    fn test_runtime_integration() {
        let runtime = InteractionRuntime::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        let clock = runtime.clock().clone();
        runtime
            .timers
            .after(40, move || l.borrow_mut().push(("timer", clock.now())));

        let l = log.clone();
        let clock = runtime.clock().clone();
        runtime
            .frames
            .add(move |_| l.borrow_mut().push(("frame", clock.now())));

        runtime.advance(50);
        assert_eq!(
            *log.borrow(),
            vec![
                ("frame", 16),
                ("frame", 32),
                ("timer", 40),
                ("frame", 48)
            ]
        );
        assert_eq!(runtime.now(), 50);
    }

    #[test]
    fn test_timer_scheduled_from_frame_fires_in_same_advance() {
        let runtime = InteractionRuntime::new();
        let fired = Rc::new(Cell::new(None));
        let timers = runtime.timers.clone();
        let f = fired.clone();
        let scheduled = Rc::new(Cell::new(false));
        runtime.frames.add(move |_| {
            if !scheduled.replace(true) {
                let f = f.clone();
                let clock = timers.clock().clone();
                timers.after(10, move || f.set(Some(clock.now())));
            }
        });
        runtime.advance(100);
        assert_eq!(fired.get(), Some(26));
    }

    #[test]
    fn test_clear_and_stats() {
        let runtime = InteractionRuntime::new();
        runtime.events.on(EventKind::Scroll, |_, _| {});
        runtime.timers.after(10, || {});
        runtime.frames.add(|_| {});
        let stats = runtime.stats();
        assert_eq!(stats.handlers, 1);
        assert_eq!(stats.pending_timers, 1);
        assert_eq!(stats.frame_callbacks, 1);

        runtime.clear();
        let stats = runtime.stats();
        assert_eq!(stats.handlers + stats.pending_timers + stats.frame_callbacks, 0);
    }

    #[test]
    fn test_dispatch_reports_outcome() {
        let runtime = InteractionRuntime::new();
        runtime.events.on(EventKind::Scroll, |_, _| {});
        let outcome = runtime.dispatch(&PageEvent::scrolled(10.0));
        assert_eq!(outcome.handled, 1);
        assert!(!outcome.default_prevented);
    }
}
