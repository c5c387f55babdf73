//! Motion capability
//!
//! Choreographed animation is optional. A session gets one
//! [`MotionCapability`]: [`TimelineMotion`] drives the hero entrance,
//! scroll-triggered sections, hover micro-interactions and page transitions
//! through the [`AnimationScheduler`]; [`NoMotion`] does nothing and leaves
//! the page to CSS transitions and the reveal engine.
//!
//! Rendered state is written to inline `opacity` and `transform` styles once
//! per frame.

mod hero;
mod hover;
mod sections;
mod transitions;

pub use hero::HeroAnimation;
pub use hover::{HoverInteractions, HoverIntent, HoverState};
pub use sections::SectionTrigger;
pub use transitions::PageTransitions;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use square_animation::{AnimationScheduler, SchedulerHandle, TimelineId};
use square_core::FRAME_MS;
use square_platform::{ElementId, EventKind, LifecycleEvent, Page, PageEvent, PreferenceEvent};

use crate::config::MotionConfig;
use crate::context::ComponentContext;

/// An animation provider injected at initialization
pub trait MotionCapability {
    fn name(&self) -> &'static str;

    /// Whether this provider actually animates anything
    fn is_available(&self) -> bool;

    /// Wire the provider into a page session
    fn attach(self: Rc<Self>, ctx: &ComponentContext);

    /// Collapse (or restore) every animation duration
    fn set_reduced_motion(&self, reduced: bool);

    /// Freeze (or resume) every running animation
    fn set_paused(&self, paused: bool);
}

/// Fallback provider: no animation at all
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMotion;

impl MotionCapability for NoMotion {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn attach(self: Rc<Self>, _ctx: &ComponentContext) {
        tracing::debug!("motion capability unavailable, using CSS transitions only");
    }

    fn set_reduced_motion(&self, _reduced: bool) {}

    fn set_paused(&self, _paused: bool) {}
}

/// Timeline-driven motion
pub struct TimelineMotion {
    config: MotionConfig,
    /// Elements matching this selector belong to the reveal engine
    reveal_selector: Option<String>,
    scheduler: AnimationScheduler,
    reduced: Cell<bool>,
    hero: RefCell<Option<HeroAnimation>>,
    sections: RefCell<Vec<Rc<SectionTrigger>>>,
    hover: RefCell<Option<Rc<HoverInteractions>>>,
    transitions: RefCell<Option<Rc<PageTransitions>>>,
}

impl TimelineMotion {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            scheduler: AnimationScheduler::with_defaults(config.tween_defaults()),
            config,
            reveal_selector: None,
            reduced: Cell::new(false),
            hero: RefCell::new(None),
            sections: RefCell::new(Vec::new()),
            hover: RefCell::new(None),
            transitions: RefCell::new(None),
        }
    }

    /// Leave elements matching `selector` to the reveal engine
    pub fn skipping(mut self, selector: impl Into<String>) -> Self {
        self.reveal_selector = Some(selector.into());
        self
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced.get()
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Hero entrance timeline, if the page has a hero
    pub fn hero_timeline(&self) -> Option<TimelineId> {
        self.hero.borrow().as_ref().and_then(|h| h.entrance)
    }

    /// Floating badge timelines
    pub fn floating_timelines(&self) -> Vec<TimelineId> {
        self.hero
            .borrow()
            .as_ref()
            .map(|h| h.floating.clone())
            .unwrap_or_default()
    }

    pub fn sections(&self) -> Vec<Rc<SectionTrigger>> {
        self.sections.borrow().clone()
    }

    pub fn hover(&self) -> Option<Rc<HoverInteractions>> {
        self.hover.borrow().clone()
    }

    pub fn transitions(&self) -> Option<Rc<PageTransitions>> {
        self.transitions.borrow().clone()
    }

    /// Advance the scheduler and write changed elements to the page
    fn render_frame(&self, page: &dyn Page, dt_ms: f32) {
        for (element, props) in self.scheduler.tick(dt_ms) {
            if !page.contains(element) {
                continue;
            }
            page.set_style(element, "opacity", &props.opacity_css());
            page.set_style(element, "transform", &props.transform_css());
        }
    }

    fn owned_by_reveal(&self, page: &dyn Page, element: ElementId) -> bool {
        self.reveal_selector
            .as_deref()
            .is_some_and(|selector| page.matches(element, selector))
    }
}

impl MotionCapability for TimelineMotion {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn attach(self: Rc<Self>, ctx: &ComponentContext) {
        let page = ctx.page.clone();
        self.set_reduced_motion(page.prefers_reduced_motion());
        if page.is_hidden() {
            self.set_paused(true);
        }

        let handle = self.scheduler.handle();
        let owned = |el: ElementId| self.owned_by_reveal(&*page, el);

        *self.hero.borrow_mut() = Some(HeroAnimation::build(ctx, &handle, &self.config.hero, &owned));

        let sections: Vec<Rc<SectionTrigger>> = self
            .config
            .sections
            .iter()
            .filter_map(|section| SectionTrigger::attach(ctx, &handle, section, &owned))
            .collect();
        *self.sections.borrow_mut() = sections;

        *self.hover.borrow_mut() = Some(HoverInteractions::attach(ctx, &handle, &self.config.hover));
        *self.transitions.borrow_mut() =
            PageTransitions::attach(ctx, &handle, &self.config.transition);

        // Start states of `from` tweens show before the first frame
        self.render_frame(&*page, 0.0);

        let weak = Rc::downgrade(&self);
        let frame_page = page.clone();
        ctx.frames.add(move |dt| {
            if let Some(motion) = weak.upgrade() {
                motion.render_frame(&*frame_page, dt as f32);
            }
        });

        let weak = Rc::downgrade(&self);
        ctx.events.on(EventKind::ReducedMotion, move |event, _| {
            if let (Some(motion), PageEvent::Preference(PreferenceEvent::ReducedMotion(reduced))) =
                (weak.upgrade(), event)
            {
                motion.set_reduced_motion(*reduced);
            }
        });

        let weak = Rc::downgrade(&self);
        ctx.events.on(EventKind::Visibility, move |event, _| {
            if let (Some(motion), PageEvent::Lifecycle(LifecycleEvent::VisibilityChanged { hidden })) =
                (weak.upgrade(), event)
            {
                motion.set_paused(*hidden);
            }
        });

        tracing::debug!(
            "timeline motion attached: {} timeline(s), {} section(s), frame {}ms",
            self.scheduler.timeline_count(),
            self.sections.borrow().len(),
            FRAME_MS
        );
    }

    fn set_reduced_motion(&self, reduced: bool) {
        self.reduced.set(reduced);
        let cap = reduced.then_some(self.config.reduced_duration_ms);
        if self.scheduler.duration_cap() == cap {
            return;
        }
        self.scheduler.set_duration_cap(cap);
        tracing::info!("reduced motion {}", if reduced { "on" } else { "off" });
    }

    fn set_paused(&self, paused: bool) {
        if paused {
            self.scheduler.pause_all();
        } else {
            self.scheduler.resume_all();
        }
        tracing::debug!("animations {}", if paused { "paused" } else { "resumed" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use square_core::InteractionRuntime;
    use square_platform::{MemoryPage, Rect};

    const IDENTITY_TRANSFORM: &str = "translate(0px, 0px) scale(1)";

    struct Site {
        page: Rc<MemoryPage>,
        title: ElementId,
        stats: Vec<ElementId>,
        cards: Vec<ElementId>,
        owned_card: ElementId,
        hover_card: ElementId,
        about: ElementId,
        anchor: ElementId,
    }

    fn site(page: MemoryPage) -> Site {
        let page = Rc::new(page);
        let main = page.build("main").finish();
        let hero = page.build_in(main, "section").class("hero").finish();
        let title = page.build_in(hero, "h1").class("hero-title").finish();
        page.build_in(hero, "p").class("hero-subtitle").finish();
        let buttons = page.build_in(hero, "div").class("hero-buttons").finish();
        let about = page
            .build_in(buttons, "a")
            .class("btn")
            .attr("href", "/about.html")
            .finish();
        let anchor = page
            .build_in(buttons, "a")
            .class("btn")
            .attr("href", "#problem")
            .finish();
        let stats_box = page.build_in(hero, "div").class("hero-stats").finish();
        let stats = (0..3)
            .map(|_| page.build_in(stats_box, "div").class("stat").finish())
            .collect();

        let problem = page.build_in(main, "section").id_attr("problem").finish();
        let cards = (0..3)
            .map(|i| {
                page.build_in(problem, "div")
                    .class("problem-card")
                    .rect(Rect::band(1500.0 + i as f32 * 10.0, 200.0))
                    .finish()
            })
            .collect();
        let owned_card = page
            .build_in(problem, "div")
            .class("problem-card")
            .class("reveal")
            .rect(Rect::band(1600.0, 200.0))
            .finish();
        let hover_card = page
            .build_in(main, "div")
            .class("card")
            .rect(Rect::band(3000.0, 200.0))
            .finish();

        Site {
            page,
            title,
            stats,
            cards,
            owned_card,
            hover_card,
            about,
            anchor,
        }
    }

    fn attach(site: &Site) -> (InteractionRuntime, Rc<TimelineMotion>) {
        let runtime = InteractionRuntime::new();
        let ctx = ComponentContext::new(site.page.clone(), &runtime);
        let motion = Rc::new(
            TimelineMotion::new(MotionConfig::default()).skipping(".reveal, [data-reveal]"),
        );
        motion.clone().attach(&ctx);
        (runtime, motion)
    }

    fn dispatch_all(runtime: &InteractionRuntime, events: Vec<PageEvent>) {
        for event in events {
            runtime.dispatch(&event);
        }
    }

    fn settled(page: &MemoryPage, el: ElementId) -> bool {
        page.style(el, "opacity").as_deref() == Some("1")
            && page.style(el, "transform").as_deref() == Some(IDENTITY_TRANSFORM)
    }

    /// Advance frame by frame until the timeline stops playing; returns elapsed ms
    fn time_to_finish(runtime: &InteractionRuntime, handle: &SchedulerHandle, id: TimelineId) -> u64 {
        let start = runtime.now();
        while handle.is_playing(id) && runtime.now() - start < 5000 {
            runtime.advance(FRAME_MS);
        }
        runtime.now() - start
    }

    /// Advance frame by frame until `el` reaches identity; returns elapsed ms
    fn time_to_settle(runtime: &InteractionRuntime, page: &MemoryPage, el: ElementId) -> u64 {
        let start = runtime.now();
        while !settled(page, el) && runtime.now() - start < 5000 {
            runtime.advance(FRAME_MS);
        }
        runtime.now() - start
    }

    #[test]
    fn test_no_motion_is_inert() {
        let page: Rc<dyn Page> = Rc::new(MemoryPage::new("/"));
        let runtime = InteractionRuntime::new();
        let ctx = ComponentContext::new(page, &runtime);
        let motion = Rc::new(NoMotion);
        assert!(!motion.is_available());
        motion.attach(&ctx);
        let stats = runtime.stats();
        assert_eq!(stats.handlers + stats.frame_callbacks + stats.pending_timers, 0);
    }

    #[test]
    fn test_hero_entrance() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);

        // Start state is written before the first frame
        assert_eq!(site.page.style(site.title, "opacity").as_deref(), Some("0"));
        assert_eq!(
            site.page.style(site.title, "transform").as_deref(),
            Some("translate(0px, 50px) scale(1)")
        );
        assert_eq!(motion.floating_timelines().len(), 3);

        runtime.advance(2000);
        assert!(settled(&site.page, site.title));
        let entrance = motion.hero_timeline().unwrap();
        assert!(!motion.handle().is_playing(entrance));
        // Stat badges keep floating
        assert_eq!(site.page.style(site.stats[0], "opacity").as_deref(), Some("1"));
        assert!(motion.handle().props(site.stats[0]).y < 0.0);
    }

    #[test]
    fn test_section_plays_and_reverses() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);

        let sections = motion.sections();
        assert_eq!(sections.len(), 1);
        // The reveal engine owns the card marked for it
        assert_eq!(sections[0].elements(), site.cards.as_slice());
        assert!(site.page.style(site.owned_card, "opacity").is_none());

        assert_eq!(site.page.style(site.cards[0], "opacity").as_deref(), Some("0"));
        dispatch_all(&runtime, site.page.scroll_to(1000.0));
        assert!(sections[0].is_entered());
        runtime.advance(1100);
        assert!(site.cards.iter().all(|&c| settled(&site.page, c)));

        dispatch_all(&runtime, site.page.scroll_to(0.0));
        assert!(!sections[0].is_entered());
        runtime.advance(1100);
        assert_eq!(site.page.style(site.cards[0], "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_section_follows_viewport_resize() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);
        let section = motion.sections()[0].clone();

        // Trigger sits 700px below the fold, line at 640px
        dispatch_all(&runtime, site.page.scroll_to(800.0));
        assert!(!section.is_entered());

        dispatch_all(&runtime, site.page.resize(1280.0, 1000.0));
        assert!(section.is_entered());
        assert!(motion.handle().is_playing(section.timeline()));

        dispatch_all(&runtime, site.page.resize(1280.0, 800.0));
        assert!(!section.is_entered());
        assert!(motion.handle().is_reversed(section.timeline()));
    }

    #[test]
    fn test_reduced_motion_collapses_durations() {
        let default = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&default);
        let section = motion.sections()[0].timeline();
        assert!(motion.handle().duration_ms(section).unwrap() >= 600.0);
        dispatch_all(&runtime, default.page.scroll_to(1000.0));
        let default_ms = time_to_finish(&runtime, &motion.handle(), section);
        assert!(settled(&default.page, default.cards[0]));

        let reduced = site(MemoryPage::new("/").with_reduced_motion(true));
        let (runtime, motion) = attach(&reduced);
        assert!(motion.is_reduced());
        assert!(!settled(&reduced.page, reduced.title));
        let entrance = motion.hero_timeline().unwrap();
        let hero_ms = time_to_finish(&runtime, &motion.handle(), entrance);
        assert!(settled(&reduced.page, reduced.title));
        let section = motion.sections()[0].timeline();
        assert!(motion.handle().duration_ms(section).unwrap() <= 16.0);
        dispatch_all(&runtime, reduced.page.scroll_to(1000.0));
        let reduced_ms = time_to_finish(&runtime, &motion.handle(), section);
        assert!(settled(&reduced.page, reduced.cards[0]));

        assert!(default_ms >= 600, "default took {}ms", default_ms);
        assert!(reduced_ms <= 2 * FRAME_MS, "reduced took {}ms", reduced_ms);
        assert!(hero_ms <= 2 * FRAME_MS, "hero took {}ms", hero_ms);
        // Floating badges are parked at rest
        assert_eq!(motion.handle().props(reduced.stats[0]).y, 0.0);
    }

    #[test]
    fn test_reduced_motion_change_is_retroactive() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);
        runtime.advance(100);
        assert!(!settled(&site.page, site.title));

        runtime.dispatch(&site.page.set_reduced_motion(true));
        assert!(motion.is_reduced());
        assert!(time_to_settle(&runtime, &site.page, site.title) <= 2 * FRAME_MS);

        // Turning it off restarts the float
        runtime.dispatch(&site.page.set_reduced_motion(false));
        runtime.advance(1000);
        assert!(motion.handle().props(site.stats[0]).y < 0.0);
    }

    #[test]
    fn test_hover_last_intent_wins() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);
        let hover = motion.hover().unwrap();
        let card = site.hover_card;

        runtime.dispatch(&PageEvent::pointer_enter(card));
        runtime.advance(100);
        let entering = hover.state(card).unwrap();
        assert_eq!(entering.intent, HoverIntent::Enter);
        let scale = motion.handle().props(card).scale;
        assert!(scale > 1.0 && scale < 1.05);

        runtime.dispatch(&PageEvent::pointer_leave(card));
        runtime.dispatch(&PageEvent::pointer_enter(card));
        let state = hover.state(card).unwrap();
        assert_eq!(state.intent, HoverIntent::Enter);
        assert!(!motion.handle().contains(entering.tween.unwrap()));

        runtime.advance(400);
        assert_eq!(
            site.page.style(card, "transform").as_deref(),
            Some("translate(0px, -5px) scale(1.05)")
        );

        runtime.dispatch(&PageEvent::pointer_leave(card));
        runtime.advance(300);
        assert_eq!(site.page.style(card, "transform").as_deref(), Some(IDENTITY_TRANSFORM));
    }

    #[test]
    fn test_hover_ignores_children_of_a_card() {
        let site = site(MemoryPage::new("/"));
        let card = site.hover_card;
        let icon = site.page.build_in(card, "i").class("icon").finish();
        let (runtime, motion) = attach(&site);
        let hover = motion.hover().unwrap();

        runtime.dispatch(&PageEvent::pointer_enter(card));
        runtime.dispatch(&PageEvent::pointer_enter(icon));
        runtime.advance(100);
        runtime.dispatch(&PageEvent::pointer_leave(icon));
        runtime.advance(400);

        assert_eq!(hover.state(card).unwrap().intent, HoverIntent::Enter);
        assert!(hover.state(icon).is_none());
        assert_eq!(
            site.page.style(card, "transform").as_deref(),
            Some("translate(0px, -5px) scale(1.05)")
        );
    }

    #[test]
    fn test_page_transition_navigates_after_fade() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);

        let outcome = runtime.dispatch(&PageEvent::click(site.anchor));
        assert!(!outcome.default_prevented);

        let outcome = runtime.dispatch(&PageEvent::click(site.about));
        assert!(outcome.default_prevented);
        assert_eq!(
            motion.transitions().and_then(|t| t.leaving()).as_deref(),
            Some("/about.html")
        );
        runtime.advance(390);
        assert!(site.page.navigations().is_empty());
        runtime.advance(30);
        assert_eq!(site.page.navigations(), vec!["/about.html".to_string()]);
    }

    #[test]
    fn test_hidden_page_pauses_without_catch_up() {
        let site = site(MemoryPage::new("/"));
        let (runtime, motion) = attach(&site);
        let entrance = motion.hero_timeline().unwrap();
        runtime.advance(160);

        runtime.dispatch(&site.page.set_hidden(true));
        assert!(motion.is_paused());
        let frozen = motion.handle().time(entrance);
        runtime.advance(5000);
        assert_eq!(motion.handle().time(entrance), frozen);

        runtime.dispatch(&site.page.set_hidden(false));
        runtime.advance(16);
        assert_eq!(motion.handle().time(entrance), frozen.map(|t| t + 16.0));
    }
}
