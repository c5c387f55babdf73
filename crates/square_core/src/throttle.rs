//! Rate limiting for high-frequency signals
//!
//! - [`Throttle`] runs on the leading edge, then holds the latest call made
//!   during the cooldown and runs it when the window closes. At most one call
//!   runs per window and the last call of a burst is never lost.
//! - [`Debounce`] runs only after calls stop arriving for the delay; every
//!   call cancels and replaces the pending one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::Millis;
use crate::timer::{TimerId, TimerQueue};

type Deferred = Box<dyn FnOnce()>;

#[derive(Default)]
struct ThrottleState {
    cooldown: Cell<Option<TimerId>>,
    trailing: RefCell<Option<Deferred>>,
}

/// Leading- and trailing-edge throttle
#[derive(Clone)]
pub struct Throttle {
    timers: TimerQueue,
    window: Millis,
    state: Rc<ThrottleState>,
}

impl Throttle {
    pub fn new(timers: TimerQueue, window: Millis) -> Self {
        Self {
            timers,
            window,
            state: Rc::new(ThrottleState::default()),
        }
    }

    /// Run `f` now, or when the current window closes
    ///
    /// A call made during the cooldown replaces any call already waiting
    /// for the window to close. Returns whether `f` ran immediately.
    pub fn call<F>(&self, f: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        if self.is_cooling_down() {
            *self.state.trailing.borrow_mut() = Some(Box::new(f));
            return false;
        }
        arm(&self.timers, self.window, &self.state);
        f();
        true
    }

    pub fn is_cooling_down(&self) -> bool {
        self.state
            .cooldown
            .get()
            .is_some_and(|id| self.timers.is_pending(id))
    }

    /// Whether a call is waiting for the window to close
    pub fn has_trailing(&self) -> bool {
        self.state.trailing.borrow().is_some()
    }

    /// Drop the cooldown and any waiting call
    pub fn reset(&self) {
        self.state.trailing.borrow_mut().take();
        if let Some(id) = self.state.cooldown.take() {
            self.timers.cancel(id);
        }
    }
}

/// Start a cooldown; a trailing call found when it ends runs and starts the next one
fn arm(timers: &TimerQueue, window: Millis, state: &Rc<ThrottleState>) {
    let queue = timers.clone();
    let weak = Rc::downgrade(state);
    let id = timers.after(window, move || {
        let Some(state) = weak.upgrade() else {
            return;
        };
        state.cooldown.set(None);
        let trailing = state.trailing.borrow_mut().take();
        if let Some(f) = trailing {
            arm(&queue, window, &state);
            f();
        }
    });
    state.cooldown.set(Some(id));
}

/// Trailing-edge debounce
#[derive(Clone)]
pub struct Debounce {
    timers: TimerQueue,
    delay: Millis,
    pending: Rc<RefCell<Option<TimerId>>>,
}

impl Debounce {
    pub fn new(timers: TimerQueue, delay: Millis) -> Self {
        Self {
            timers,
            delay,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    /// Schedule `f`, replacing any call still waiting
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        let pending = self.pending.clone();
        let previous = self.pending.borrow_mut().take();
        let id = self.timers.replace(previous, |timers| {
            timers.after(self.delay, move || {
                pending.borrow_mut().take();
                f();
            })
        });
        *self.pending.borrow_mut() = Some(id);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .borrow()
            .is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn cancel(&self) {
        if let Some(id) = self.pending.borrow_mut().take() {
            self.timers.cancel(id);
        }
    }
}
