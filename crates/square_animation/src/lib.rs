//! Square Animation System
//!
//! Eased tweens, staggered timelines and a frame-driven scheduler for page
//! choreography.
//!
//! # Features
//!
//! - **Easing**: Named curves (`power2.out`, `sine.inOut`, ...) with serde support
//! - **Tweens**: `to` / `from` / `fromTo` property animations with delay, repeat and yoyo
//! - **Timelines**: Sequential, relative (overlapping) and absolute positions with staggers
//! - **Scheduler**: Play, reverse, pause-all and retroactive duration caps for reduced motion

pub mod easing;
pub mod scheduler;
pub mod timeline;
pub mod tween;
pub mod values;

pub use easing::{Easing, UnknownEasing};
pub use scheduler::{AnimationCallback, AnimationScheduler, SchedulerHandle, TimelineId};
pub use timeline::{Position, StaggerBuilder, Timeline, TimelineEntryId};
pub use tween::{Repeat, ResolvedTween, Timing, Tween, TweenDefaults};
pub use values::{Interpolate, PropMask, PropTargets, Props};
