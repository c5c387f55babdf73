//! Virtual clock
//!
//! Time in the interaction layer is a millisecond counter advanced by the
//! host. Nothing reads wall-clock time, so every timing rule can be tested
//! deterministically.

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds since the session started
pub type Millis = u64;

/// Shared millisecond clock (cheap to clone)
#[derive(Clone, Debug, Default)]
pub struct Clock {
    now: Rc<Cell<Millis>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time
    pub fn now(&self) -> Millis {
        self.now.get()
    }

    /// Move the clock forward to `time`
    ///
    /// The clock never runs backwards; earlier values are ignored.
    pub(crate) fn set(&self, time: Millis) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }
}
