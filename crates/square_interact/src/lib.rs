//! Square Interaction Layer
//!
//! Client-side behavior for the Square marketing site, driven by page events
//! and virtual time:
//!
//! - **Navigation**: Mobile menu toggle, scrolled navbar, active link
//! - **Scroll Reveal**: One-shot `revealed` class with optional stagger
//! - **Counters**: Stepped count-up to a `data-target` value
//! - **Notifications**: Stacking toasts with timed dismissal
//! - **Forms**: Contact form submission with busy state and feedback
//! - **Hydration**: Company data fetched over HTTP and bound into the page
//! - **Motion**: Optional hero, section, hover and page-transition animation
//!
//! # Example
//!
//! ```rust
//! use square_interact::prelude::*;
//! use std::rc::Rc;
//!
//! let page = Rc::new(MemoryPage::new("/"));
//! let toggle = page.build("button").class("hamburger").finish();
//! let menu = page.build("ul").class("nav-menu").finish();
//!
//! let session = initialize(PageContext::new(page.clone()));
//! session.dispatch(&PageEvent::click(toggle));
//! assert!(page.has_class(menu, "active"));
//! ```

pub mod config;
pub mod context;
pub mod counter;
pub mod error;
pub mod forms;
pub mod hydration;
pub mod motion;
pub mod nav;
pub mod reveal;
pub mod session;
pub mod toast;

pub use config::{
    CounterConfig, FormConfig, HeroConfig, HoverConfig, HydrationConfig, InteractConfig,
    MotionConfig, NavConfig, OffsetState, RevealConfig, SectionConfig, ToastConfig,
    TransitionConfig,
};
pub use context::ComponentContext;
pub use counter::{CounterAnimator, CounterFormat, CounterTarget};
pub use error::{InteractError, Result};
pub use forms::{FormController, FormSubmission, FormTransport, SimulatedTransport};
pub use hydration::{apply_company_data, CompanyData, DataSource, HttpDataSource};
pub use motion::{MotionCapability, NoMotion, TimelineMotion};
pub use nav::NavController;
pub use reveal::{RevealEngine, RevealTarget, REVEALED_CLASS};
pub use session::{initialize, PageContext, SessionHandle, SessionStats};
pub use toast::{Notification, NotificationId, NotificationState, Severity, ToastManager};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::InteractConfig;
    pub use crate::error::{InteractError, Result};
    pub use crate::hydration::{DataSource, HttpDataSource};
    pub use crate::motion::{MotionCapability, NoMotion, TimelineMotion};
    pub use crate::session::{initialize, PageContext, SessionHandle};
    pub use crate::toast::Severity;
    pub use square_platform::prelude::*;
}
