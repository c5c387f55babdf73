//! Page session
//!
//! [`initialize`] wires every component into a fresh runtime for one page
//! load and returns the [`SessionHandle`] the host drives: it feeds page
//! events in, advances virtual time, and eventually disposes the session.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use square_core::{DispatchOutcome, InteractionRuntime, Millis, RuntimeStats};
use square_platform::{Page, PageEvent};

use crate::config::InteractConfig;
use crate::context::ComponentContext;
use crate::counter::CounterAnimator;
use crate::forms::{FormController, FormTransport, SimulatedTransport};
use crate::hydration::{apply_company_data, DataSource};
use crate::motion::{MotionCapability, NoMotion, TimelineMotion};
use crate::nav::NavController;
use crate::reveal::RevealEngine;
use crate::toast::{NotificationId, Severity, ToastManager};

/// Everything a session needs from its host
pub struct PageContext {
    pub page: Rc<dyn Page>,
    pub config: InteractConfig,
    /// Animation provider; chosen from the config when absent
    pub motion: Option<Rc<dyn MotionCapability>>,
    /// Form delivery; simulated when absent
    pub transport: Option<Rc<dyn FormTransport>>,
}

impl PageContext {
    pub fn new(page: Rc<dyn Page>) -> Self {
        Self {
            page,
            config: InteractConfig::default(),
            motion: None,
            transport: None,
        }
    }

    pub fn with_config(mut self, config: InteractConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_motion(mut self, motion: Rc<dyn MotionCapability>) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Run without an animation provider
    pub fn without_motion(self) -> Self {
        self.with_motion(Rc::new(NoMotion))
    }

    pub fn with_transport(mut self, transport: Rc<dyn FormTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// Snapshot of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub runtime: RuntimeStats,
    pub menu_open: bool,
    pub reveal_pending: usize,
    pub notifications: usize,
    pub motion: &'static str,
}

/// Initialize the interaction layer for one page load
///
/// Call once the host signals the document is ready.
pub fn initialize(context: PageContext) -> SessionHandle {
    let started = Instant::now();
    let PageContext {
        page,
        config,
        motion,
        transport,
    } = context;

    let runtime = InteractionRuntime::new();
    let ctx = ComponentContext::new(page.clone(), &runtime);

    let nav = NavController::attach(&ctx, &config.nav);
    let reveal = RevealEngine::attach(&ctx, &config.reveal);
    let counters = CounterAnimator::attach(&ctx, &config.counter);
    let toasts = ToastManager::attach(&ctx, &config.toast);
    let transport: Rc<dyn FormTransport> = match transport {
        Some(transport) => transport,
        None => Rc::new(SimulatedTransport::new(config.forms.simulated_latency_ms)),
    };
    let forms = FormController::attach(&ctx, &config.forms, transport, toasts.clone());

    let motion: Rc<dyn MotionCapability> = match motion {
        Some(motion) => motion,
        None if config.motion.enabled => Rc::new(
            TimelineMotion::new(config.motion.clone()).skipping(config.reveal.selector.clone()),
        ),
        None => Rc::new(NoMotion),
    };
    motion.clone().attach(&ctx);

    tracing::info!(
        "Square interactions initialized in {:?} (motion: {}, reveal targets: {}, counters: {})",
        started.elapsed(),
        motion.name(),
        reveal.len(),
        counters.targets().len()
    );

    SessionHandle {
        runtime,
        page,
        config,
        nav,
        reveal,
        counters,
        toasts,
        forms,
        motion,
        disposed: Cell::new(false),
    }
}

/// A live page session
///
/// Dropping the handle disposes the session.
pub struct SessionHandle {
    runtime: InteractionRuntime,
    page: Rc<dyn Page>,
    config: InteractConfig,
    nav: Rc<NavController>,
    reveal: Rc<RevealEngine>,
    counters: Rc<CounterAnimator>,
    toasts: Rc<ToastManager>,
    forms: Rc<FormController>,
    motion: Rc<dyn MotionCapability>,
    disposed: Cell<bool>,
}

impl SessionHandle {
    /// Deliver a page event
    pub fn dispatch(&self, event: &PageEvent) -> DispatchOutcome {
        if self.disposed.get() {
            return DispatchOutcome::default();
        }
        self.runtime.dispatch(event)
    }

    /// Deliver events in order
    pub fn dispatch_all(&self, events: impl IntoIterator<Item = PageEvent>) {
        for event in events {
            self.dispatch(&event);
        }
    }

    /// Advance virtual time, running due timers and animation frames
    pub fn advance(&self, ms: Millis) {
        self.runtime.advance(ms);
    }

    pub fn now(&self) -> Millis {
        self.runtime.now()
    }

    /// Show a notification
    pub fn notify(&self, message: &str, severity: Severity) -> NotificationId {
        self.toasts.show(message, severity)
    }

    /// Dismiss a notification early
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.toasts.dismiss(id)
    }

    /// Fetch company data and bind it into the page
    ///
    /// Failures are logged and leave the page untouched. Returns the number
    /// of elements updated.
    pub async fn hydrate(&self, source: &dyn DataSource) -> usize {
        match source.fetch().await {
            Ok(data) => {
                let updated =
                    apply_company_data(&*self.page, &data, &self.config.hydration.bind_attribute);
                tracing::debug!("hydrated {} element(s) from {}", updated, source.describe());
                updated
            }
            Err(err) => {
                tracing::warn!("company data unavailable from {}: {}", source.describe(), err);
                0
            }
        }
    }

    pub fn page(&self) -> &Rc<dyn Page> {
        &self.page
    }

    pub fn config(&self) -> &InteractConfig {
        &self.config
    }

    pub fn nav(&self) -> &NavController {
        &self.nav
    }

    pub fn reveal(&self) -> &RevealEngine {
        &self.reveal
    }

    pub fn counters(&self) -> &CounterAnimator {
        &self.counters
    }

    pub fn toasts(&self) -> &Rc<ToastManager> {
        &self.toasts
    }

    pub fn forms(&self) -> &Rc<FormController> {
        &self.forms
    }

    pub fn motion(&self) -> &Rc<dyn MotionCapability> {
        &self.motion
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            runtime: self.runtime.stats(),
            menu_open: self.nav.is_menu_open(),
            reveal_pending: self.reveal.pending(),
            notifications: self.toasts.len(),
            motion: self.motion.name(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Detach every handler and cancel every timer and frame callback
    ///
    /// A menu left open releases the scroll lock.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if self.nav.is_menu_open() {
            self.nav.close();
        }
        self.runtime.clear();
        tracing::debug!("session disposed at {}ms", self.runtime.now());
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InteractError, Result};
    use crate::hydration::CompanyData;
    use crate::reveal::REVEALED_CLASS;
    use square_platform::{ElementId, LifecycleEvent, MemoryPage, Rect};

    struct Site {
        page: Rc<MemoryPage>,
        toggle: ElementId,
        reveal: ElementId,
        counter: ElementId,
        bound: ElementId,
        form: ElementId,
    }

    fn site(page: MemoryPage) -> Site {
        let page = Rc::new(page);
        let navbar = page.build("nav").class("navbar").finish();
        let toggle = page.build_in(navbar, "button").class("hamburger").finish();
        let menu = page.build_in(navbar, "ul").class("nav-menu").finish();
        page.build_in(menu, "a").class("nav-link").attr("href", "/").finish();

        let main = page.build("main").finish();
        let reveal = page
            .build_in(main, "section")
            .class("reveal")
            .rect(Rect::band(1400.0, 300.0))
            .finish();
        let counter = page
            .build_in(main, "span")
            .attr("data-target", "70")
            .text("0%")
            .finish();
        let bound = page
            .build_in(main, "span")
            .attr("data-bind", "benefits.cost_reduction")
            .text("--")
            .finish();
        let form = page.build_in(main, "form").attr("data-contact-form", "").finish();
        page.build_in(form, "input").attr("name", "email").finish();
        page.build_in(form, "button").attr("type", "submit").text("Send").finish();

        Site {
            page,
            toggle,
            reveal,
            counter,
            bound,
            form,
        }
    }

    fn start(site: &Site) -> SessionHandle {
        let session = initialize(PageContext::new(site.page.clone()));
        session.dispatch_all(site.page.drain_events());
        session
    }

    #[test]
    fn test_components_share_one_session() {
        let site = site(MemoryPage::new("/"));
        let session = start(&site);
        assert_eq!(session.motion().name(), "timeline");

        session.dispatch(&PageEvent::click(site.toggle));
        assert!(session.stats().menu_open);
        assert!(site.page.is_scroll_locked());
        session.dispatch(&PageEvent::click(site.toggle));

        session.dispatch_all(site.page.scroll_to(1000.0));
        assert!(site.page.has_class(site.reveal, REVEALED_CLASS));

        session.dispatch(&PageEvent::Lifecycle(LifecycleEvent::Load));
        session.advance(500 + 60 * 50);
        assert_eq!(site.page.text(site.counter), "70%");

        let outcome = session.dispatch(&PageEvent::submit(site.form));
        assert!(outcome.default_prevented);
        session.advance(1500);
        assert_eq!(session.stats().notifications, 1);
    }

    #[test]
    fn test_without_motion_still_reveals() {
        let site = site(MemoryPage::new("/"));
        let session = initialize(PageContext::new(site.page.clone()).without_motion());
        session.dispatch_all(site.page.drain_events());
        assert!(!session.motion().is_available());
        assert_eq!(session.stats().motion, "none");

        session.dispatch_all(site.page.scroll_to(1000.0));
        assert!(session.reveal().is_revealed(site.reveal));
        assert!(site.page.style(site.reveal, "opacity").is_none());
    }

    #[test]
    fn test_dispose_detaches_everything() {
        let site = site(MemoryPage::new("/"));
        let session = start(&site);
        session.dispatch(&PageEvent::click(site.toggle));
        session.notify("hello", Severity::Info);
        assert!(session.stats().runtime.pending_timers > 0);

        session.dispose();
        assert!(session.is_disposed());
        assert!(!site.page.is_scroll_locked());
        let stats = session.stats();
        assert_eq!(stats.runtime.handlers, 0);
        assert_eq!(stats.runtime.pending_timers, 0);
        assert_eq!(stats.runtime.frame_callbacks, 0);

        let outcome = session.dispatch(&PageEvent::click(site.toggle));
        assert_eq!(outcome.handled, 0);
        assert!(!site.page.is_scroll_locked());
    }

    struct StubSource(Option<&'static str>);

    #[async_trait::async_trait]
    impl DataSource for StubSource {
        fn describe(&self) -> String {
            "stub".to_string()
        }

        async fn fetch(&self) -> Result<CompanyData> {
            match self.0 {
                Some(body) => CompanyData::from_json(body),
                None => Err(InteractError::Status(503)),
            }
        }
    }

    #[tokio::test]
    async fn test_hydrate_binds_payload() {
        let site = site(MemoryPage::new("/"));
        let session = start(&site);
        let source = StubSource(Some(r#"{"benefits": {"cost_reduction": "70%"}}"#));
        assert_eq!(session.hydrate(&source).await, 1);
        assert_eq!(site.page.text(site.bound), "70%");
    }

    #[tokio::test]
    async fn test_hydrate_failures_leave_page_alone() {
        let site = site(MemoryPage::new("/"));
        let session = start(&site);
        assert_eq!(session.hydrate(&StubSource(None)).await, 0);
        assert_eq!(session.hydrate(&StubSource(Some("{}"))).await, 0);
        assert_eq!(session.hydrate(&StubSource(Some("[1, 2"))).await, 0);
        assert_eq!(site.page.text(site.bound), "--");
    }
}
