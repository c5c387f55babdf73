//! Square Core Runtime
//!
//! This crate provides the scheduling primitives every interaction component
//! builds on:
//!
//! - **Virtual Clock**: Millisecond time advanced by the host
//! - **Timers**: Cancellable one-shot and repeating tasks
//! - **Throttle/Debounce**: Rate limiting for scroll and resize signals
//! - **Event Dispatch**: Per-kind handlers fired in registration order
//! - **Frames**: 16 ms frame callbacks for the animation scheduler
//!
//! # Example
//!
//! ```rust
//! use square_core::InteractionRuntime;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let runtime = InteractionRuntime::new();
//! let fired = Rc::new(Cell::new(false));
//!
//! let f = fired.clone();
//! runtime.timers.after(500, move || f.set(true));
//!
//! runtime.advance(499);
//! assert!(!fired.get());
//! runtime.advance(1);
//! assert!(fired.get());
//! ```

pub mod clock;
pub mod dispatch;
pub mod runtime;
pub mod throttle;
pub mod timer;

pub use clock::{Clock, Millis};
pub use dispatch::{DispatchOutcome, EventContext, EventDispatcher, Handler, HandlerId};
pub use runtime::{
    FrameCallback, FrameCallbackId, FrameCallbacks, InteractionRuntime, RuntimeStats, FRAME_MS,
};
pub use throttle::{Debounce, Throttle};
pub use timer::{ControlFlow, TimerId, TimerQueue};
