//! Page-transition fades
//!
//! Same-origin link clicks fade and shrink the main content before
//! navigating; the load signal fades it back in.

use std::cell::RefCell;
use std::rc::Rc;

use square_animation::{PropTargets, SchedulerHandle, Tween};
use square_platform::{ElementId, EventKind, InputEvent, PageEvent};

use crate::config::TransitionConfig;
use crate::context::ComponentContext;

/// Fade-out/fade-in around navigation
pub struct PageTransitions {
    ctx: ComponentContext,
    handle: SchedulerHandle,
    config: TransitionConfig,
    main: ElementId,
    leaving: RefCell<Option<String>>,
}

impl PageTransitions {
    /// Returns `None` when the page has no main content element
    pub fn attach(
        ctx: &ComponentContext,
        handle: &SchedulerHandle,
        config: &TransitionConfig,
    ) -> Option<Rc<Self>> {
        let main = ctx.page.query(&config.main_selector)?;
        let transitions = Rc::new(Self {
            ctx: ctx.clone(),
            handle: handle.clone(),
            config: config.clone(),
            main,
            leaving: RefCell::new(None),
        });

        let weak = Rc::downgrade(&transitions);
        ctx.events.on(EventKind::Click, move |event, cx| {
            let (Some(transitions), PageEvent::Input(InputEvent::Click { element })) =
                (weak.upgrade(), event)
            else {
                return;
            };
            if let Some(href) = transitions.internal_href(*element) {
                cx.prevent_default();
                transitions.leave(href);
            }
        });

        let weak = Rc::downgrade(&transitions);
        ctx.events.on(EventKind::Load, move |_, _| {
            if let Some(transitions) = weak.upgrade() {
                transitions.enter();
            }
        });

        Some(transitions)
    }

    /// Destination of an in-flight transition
    pub fn leaving(&self) -> Option<String> {
        self.leaving.borrow().clone()
    }

    /// Fade the main content in
    pub fn enter(&self) {
        let hidden = PropTargets::new().opacity(0.0).scale(self.config.scale);
        self.handle.play_tween(
            Tween::from_to(self.main, hidden, PropTargets::identity()).delay(self.config.in_delay_ms),
        );
    }

    /// Fade the main content out, then navigate to `href`
    pub fn leave(self: &Rc<Self>, href: String) {
        if self.leaving.borrow().is_some() {
            return;
        }
        tracing::debug!("page transition to {}", href);
        *self.leaving.borrow_mut() = Some(href.clone());

        let out = PropTargets::new().opacity(0.0).scale(self.config.scale);
        let tween = Tween::to(self.main, out).duration(self.config.out_ms);
        match self.handle.play_tween(tween) {
            Some(id) => {
                let weak = Rc::downgrade(self);
                self.handle.on_complete(id, move || {
                    if let Some(transitions) = weak.upgrade() {
                        transitions.finish();
                    }
                });
            }
            None => self.finish(),
        }
    }

    fn finish(&self) {
        if let Some(href) = self.leaving.borrow_mut().take() {
            self.ctx.page.navigate(&href);
        }
    }

    /// Same-origin, cross-page href of a clicked link
    fn internal_href(&self, element: ElementId) -> Option<String> {
        let page = &self.ctx.page;
        let link = page.closest(element, "a[href]")?;
        if page.attribute(link, "target").is_some_and(|t| t == "_blank") {
            return None;
        }
        let href = page.attribute(link, "href")?;
        is_same_origin_page(&href, &page.origin()).then_some(href)
    }
}

/// Whether `href` leads to another page on the same origin
fn is_same_origin_page(href: &str, origin: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("//") {
        return false;
    }
    if let Some(rest) = href.strip_prefix(origin) {
        return rest.is_empty() || rest.starts_with('/');
    }
    // Anything else with a scheme (other origins, mailto:, tel:) is external
    let scheme_end = href.find(':');
    let path_start = href.find(['/', '?', '#']).unwrap_or(href.len());
    !scheme_end.is_some_and(|i| i < path_start)
}
