//! Navigation controller
//!
//! Owns the mobile menu state and the navbar decorations:
//!
//! - The toggle control flips the menu; an open menu locks page scroll and the
//!   toggle's `aria-expanded` always mirrors the state
//! - Activating any link inside the menu closes it
//! - Scroll (throttled) sets the navbar `scrolled` class past a fixed offset
//! - The link pointing at the current page is marked `active` once at attach
//! - Widening the viewport past the mobile breakpoint (debounced) closes the menu

use std::cell::Cell;
use std::rc::{Rc, Weak};

use square_core::{Debounce, Throttle};
use square_platform::{ElementId, EventKind, InputEvent, PageEvent, ViewportEvent};

use crate::config::NavConfig;
use crate::context::ComponentContext;

/// Mobile navigation and navbar state
pub struct NavController {
    ctx: ComponentContext,
    config: NavConfig,
    navbar: Option<ElementId>,
    toggle: Option<ElementId>,
    menu: Option<ElementId>,
    menu_open: Cell<bool>,
    scroll_throttle: Throttle,
    resize_debounce: Debounce,
    scroll_evaluations: Cell<usize>,
}

impl NavController {
    /// Wire the controller into a page session
    pub fn attach(ctx: &ComponentContext, config: &NavConfig) -> Rc<Self> {
        let page = &ctx.page;
        let nav = Rc::new(Self {
            navbar: page.query(&config.navbar_selector),
            toggle: page.query(&config.toggle_selector),
            menu: page.query(&config.menu_selector),
            menu_open: Cell::new(false),
            scroll_throttle: Throttle::new(ctx.timers.clone(), config.scroll_throttle_ms),
            resize_debounce: Debounce::new(ctx.timers.clone(), config.resize_debounce_ms),
            scroll_evaluations: Cell::new(0),
            config: config.clone(),
            ctx: ctx.clone(),
        });

        nav.sync_toggle();
        nav.highlight_active_link();
        nav.apply_scrolled(nav.ctx.page.scroll_y());

        let weak = Rc::downgrade(&nav);
        ctx.events.on(EventKind::Click, move |event, _| {
            if let (Some(nav), PageEvent::Input(InputEvent::Click { element })) =
                (weak.upgrade(), event)
            {
                nav.on_click(*element);
            }
        });

        let weak = Rc::downgrade(&nav);
        ctx.events.on(EventKind::Scroll, move |event, _| {
            if let (Some(nav), PageEvent::Viewport(ViewportEvent::Scrolled { scroll_y })) =
                (weak.upgrade(), event)
            {
                let scroll_y = *scroll_y;
                let target = Rc::downgrade(&nav);
                nav.scroll_throttle.call(move || {
                    if let Some(nav) = target.upgrade() {
                        nav.apply_scrolled(scroll_y);
                    }
                });
            }
        });

        let weak: Weak<Self> = Rc::downgrade(&nav);
        ctx.events.on(EventKind::Resize, move |event, _| {
            if let (Some(nav), PageEvent::Viewport(ViewportEvent::Resized { width, .. })) =
                (weak.upgrade(), event)
            {
                let width = *width;
                let target = Rc::downgrade(&nav);
                nav.resize_debounce.call(move || {
                    if let Some(nav) = target.upgrade() {
                        if width > nav.config.mobile_breakpoint && nav.is_menu_open() {
                            tracing::debug!("viewport widened to {}px, closing menu", width);
                            nav.close();
                        }
                    }
                });
            }
        });

        tracing::debug!(
            "navigation attached (toggle: {}, menu: {})",
            nav.toggle.is_some(),
            nav.menu.is_some()
        );
        nav
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open.get()
    }

    /// Flip the menu state
    pub fn toggle(&self) {
        if self.is_menu_open() {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn open(&self) {
        self.set_open(true);
    }

    pub fn close(&self) {
        self.set_open(false);
    }

    /// Number of times the `scrolled` state was recomputed
    pub fn scroll_evaluations(&self) -> usize {
        self.scroll_evaluations.get()
    }

    fn set_open(&self, open: bool) {
        self.menu_open.set(open);
        let page = &self.ctx.page;
        if let Some(toggle) = self.toggle {
            page.set_class(toggle, "active", open);
        }
        if let Some(menu) = self.menu {
            page.set_class(menu, "active", open);
        }
        page.set_scroll_locked(open);
        self.sync_toggle();
    }

    fn sync_toggle(&self) {
        if let Some(toggle) = self.toggle {
            let expanded = if self.is_menu_open() { "true" } else { "false" };
            self.ctx.page.set_attribute(toggle, "aria-expanded", expanded);
        }
    }

    fn on_click(&self, element: ElementId) {
        let page = &self.ctx.page;
        if page.closest(element, &self.config.toggle_selector).is_some() {
            self.toggle();
            return;
        }
        let in_menu = page
            .closest(element, &self.config.link_selector)
            .and_then(|link| page.closest(link, &self.config.menu_selector))
            .is_some();
        if in_menu {
            self.close();
        }
    }

    fn apply_scrolled(&self, scroll_y: f32) {
        self.scroll_evaluations.set(self.scroll_evaluations.get() + 1);
        if let Some(navbar) = self.navbar {
            self.ctx
                .page
                .set_class(navbar, "scrolled", scroll_y > self.config.scroll_threshold);
        }
    }

    fn highlight_active_link(&self) {
        let page = &self.ctx.page;
        let current = normalize_path(&page.path(), &page.origin());
        let links = page.query_all(&self.config.link_selector);

        for &link in &links {
            page.remove_class(link, "active");
            page.remove_attribute(link, "aria-current");
        }

        let Some(current) = current else {
            return;
        };
        let active = links.into_iter().find(|&link| {
            page.attribute(link, "href")
                .and_then(|href| normalize_path(&href, &page.origin()))
                .is_some_and(|path| path == current)
        });
        if let Some(link) = active {
            page.add_class(link, "active");
            page.set_attribute(link, "aria-current", "page");
        }
    }
}

/// Reduce a path or same-origin href to a comparable page path
///
/// `/index.html` and `/` both become `/`; pure fragment links have no path.
pub(crate) fn normalize_path(href: &str, origin: &str) -> Option<String> {
    let href = href.strip_prefix(origin).unwrap_or(href);
    let end = href.find(['#', '?']).unwrap_or(href.len());
    let path = &href[..end];
    if path.is_empty() {
        return None;
    }
    let mut path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if path.ends_with("/index.html") {
        path.truncate(path.len() - "index.html".len());
    }
    Some(path)
}
