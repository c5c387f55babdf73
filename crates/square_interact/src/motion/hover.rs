//! Hover micro-interactions
//!
//! Tracked elements scale up and lift on pointer-enter and settle back on
//! pointer-leave. Each element keeps one [`HoverState`]; a new intent
//! replaces whatever tween is still in flight.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use square_animation::{PropTargets, SchedulerHandle, TimelineId, Tween};
use square_platform::{ElementId, EventKind, InputEvent, PageEvent};

use crate::config::HoverConfig;
use crate::context::ComponentContext;

/// Latest pointer intent for an element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoverIntent {
    #[default]
    Idle,
    Enter,
    Leave,
}

/// Per-element hover state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverState {
    pub intent: HoverIntent,
    /// Tween carrying out the intent
    pub tween: Option<TimelineId>,
}

/// Hover handling for every tracked element
pub struct HoverInteractions {
    handle: SchedulerHandle,
    config: HoverConfig,
    states: RefCell<FxHashMap<ElementId, HoverState>>,
}

impl HoverInteractions {
    pub fn attach(ctx: &ComponentContext, handle: &SchedulerHandle, config: &HoverConfig) -> Rc<Self> {
        let states = ctx
            .page
            .query_all(&config.selector)
            .into_iter()
            .map(|el| (el, HoverState::default()))
            .collect();
        let hover = Rc::new(Self {
            handle: handle.clone(),
            config: config.clone(),
            states: RefCell::new(states),
        });

        let weak = Rc::downgrade(&hover);
        ctx.events.on(EventKind::PointerEnter, move |event, _| {
            if let (Some(hover), PageEvent::Input(InputEvent::PointerEnter { element })) =
                (weak.upgrade(), event)
            {
                if let Some(el) = hover.tracked(*element) {
                    hover.set_intent(el, HoverIntent::Enter);
                }
            }
        });

        let weak = Rc::downgrade(&hover);
        ctx.events.on(EventKind::PointerLeave, move |event, _| {
            if let (Some(hover), PageEvent::Input(InputEvent::PointerLeave { element })) =
                (weak.upgrade(), event)
            {
                if let Some(el) = hover.tracked(*element) {
                    hover.set_intent(el, HoverIntent::Leave);
                }
            }
        });

        tracing::debug!("hover tracking {} element(s)", hover.len());
        hover
    }

    pub fn state(&self, element: ElementId) -> Option<HoverState> {
        self.states.borrow().get(&element).copied()
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the element's in-flight tween with one for `intent`
    pub fn set_intent(&self, element: ElementId, intent: HoverIntent) {
        let target = match intent {
            HoverIntent::Enter => PropTargets::new().scale(self.config.scale).y(self.config.lift),
            HoverIntent::Leave | HoverIntent::Idle => PropTargets::new().scale(1.0).y(0.0),
        };
        let duration = match intent {
            HoverIntent::Enter => self.config.enter_ms,
            HoverIntent::Leave | HoverIntent::Idle => self.config.leave_ms,
        };

        let previous = self
            .states
            .borrow_mut()
            .get_mut(&element)
            .and_then(|state| state.tween.take());
        if let Some(previous) = previous {
            self.handle.remove(previous);
        }

        let tween = self
            .handle
            .play_tween(Tween::to(element, target).duration(duration));
        if let Some(state) = self.states.borrow_mut().get_mut(&element) {
            state.intent = intent;
            state.tween = tween;
        }
    }

    /// `element` itself when it is tracked
    ///
    /// Pointer enter/leave do not bubble, so crossing a child inside a card
    /// says nothing about the card.
    fn tracked(&self, element: ElementId) -> Option<ElementId> {
        self.states
            .borrow()
            .contains_key(&element)
            .then_some(element)
    }
}
