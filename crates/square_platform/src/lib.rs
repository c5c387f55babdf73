//! Square Platform Abstraction Layer
//!
//! This crate provides the host-facing surface of the interaction layer:
//! the [`Page`] trait components mutate, the [`PageEvent`] signals hosts
//! deliver, and a CSS selector subset used to find elements.
//!
//! # Architecture
//!
//! - [`Page`] - Document queries, class/attribute/style mutation, window state
//! - [`PageEvent`] - Lifecycle, viewport, input and preference signals
//! - [`SelectorList`] - Parsed selectors matched against any [`ElementView`]
//!
//! # Hosts
//!
//! - [`MemoryPage`] - Headless in-memory document for tests and the CLI demo
//!
//! # Example
//!
//! ```
//! use square_platform::prelude::*;
//!
//! let page = MemoryPage::new("/");
//! let button = page.build("button").class("btn").finish();
//! page.add_class(button, "active");
//! assert!(page.has_class(button, "active"));
//! ```

mod error;
mod event;
mod memory;
mod page;
pub mod selector;

// Re-export all public types
pub use error::{PlatformError, Result};
pub use event::{
    EventKind, InputEvent, IntersectionEntry, LifecycleEvent, PageEvent, PreferenceEvent,
    ViewportEvent,
};
pub use memory::{ElementBuilder, MemoryPage, Node};
pub use page::{ElementId, IntersectionOptions, Page, Rect, Size};
pub use selector::{ElementView, SelectorList};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{PlatformError, Result};
    pub use crate::event::{
        EventKind, InputEvent, IntersectionEntry, LifecycleEvent, PageEvent, PreferenceEvent,
        ViewportEvent,
    };
    pub use crate::memory::MemoryPage;
    pub use crate::page::{ElementId, IntersectionOptions, Page, Rect, Size};
}
