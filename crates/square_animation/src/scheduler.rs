//! Animation scheduler
//!
//! Owns every registered timeline and the rendered property state of every
//! animated element, and advances playing timelines each frame. Components
//! hold a [`SchedulerHandle`] (a weak reference) to register and control
//! timelines; the session holds the [`AnimationScheduler`] and ticks it from
//! its frame callback.
//!
//! Global controls:
//!
//! - [`AnimationScheduler::pause_all`] freezes every timeline; resuming does
//!   not catch up on the time spent paused
//! - [`AnimationScheduler::set_duration_cap`] clamps every duration, delay
//!   and offset, including those of already-registered timelines

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use square_platform::ElementId;

use crate::timeline::{Position, Timeline};
use crate::tween::{Tween, TweenDefaults};
use crate::values::Props;

new_key_type! {
    /// Handle to a registered timeline
    pub struct TimelineId;
}

/// Completion callback
pub type AnimationCallback = Rc<dyn Fn()>;

struct Playback {
    timeline: Timeline,
    time: f32,
    reversed: bool,
    playing: bool,
    /// Remove once it completes forward
    autoremove: bool,
    /// Infinite timeline held at its start by a duration cap
    parked: bool,
    on_complete: Option<AnimationCallback>,
    on_reverse_complete: Option<AnimationCallback>,
}

impl Playback {
    fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            time: 0.0,
            reversed: false,
            playing: false,
            autoremove: false,
            parked: false,
            on_complete: None,
            on_reverse_complete: None,
        }
    }
}

/// Internal state of the animation scheduler
struct SchedulerInner {
    timelines: SlotMap<TimelineId, Playback>,
    props: FxHashMap<ElementId, Props>,
    dirty: Vec<ElementId>,
    paused: bool,
    cap: Option<f32>,
    defaults: TweenDefaults,
}

impl SchedulerInner {
    fn render(&mut self, id: TimelineId) {
        if let Some(playback) = self.timelines.get_mut(id) {
            playback
                .timeline
                .render(playback.time, &mut self.props, &mut self.dirty);
        }
    }

    fn take_frame(&mut self) -> Vec<(ElementId, Props)> {
        let props = &self.props;
        self.dirty
            .drain(..)
            .map(|el| (el, props.get(&el).copied().unwrap_or_default()))
            .collect()
    }
}

/// The animation scheduler that ticks all registered timelines
pub struct AnimationScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_defaults(TweenDefaults::default())
    }

    /// Scheduler whose timelines fall back to `defaults`
    pub fn with_defaults(defaults: TweenDefaults) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                timelines: SlotMap::with_key(),
                props: FxHashMap::default(),
                dirty: Vec::new(),
                paused: false,
                cap: None,
                defaults,
            })),
        }
    }

    /// Get a weak handle for registering animations
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Advance playing timelines by `dt_ms`
    ///
    /// Returns every element whose rendered state changed since the last
    /// tick, with that state. Completion callbacks run after the state is
    /// updated.
    pub fn tick(&self, dt_ms: f32) -> Vec<(ElementId, Props)> {
        let mut callbacks: Vec<AnimationCallback> = Vec::new();
        let frame = {
            let mut inner = self.inner.borrow_mut();
            if !inner.paused {
                let ids: Vec<TimelineId> = inner
                    .timelines
                    .iter()
                    .filter(|(_, p)| p.playing)
                    .map(|(id, _)| id)
                    .collect();
                let mut finished = Vec::new();

                for id in ids {
                    let (done, autoremove) = {
                        let Some(playback) = inner.timelines.get_mut(id) else {
                            continue;
                        };
                        let total = playback.timeline.duration_ms();
                        let done = if playback.reversed {
                            playback.time = (playback.time - dt_ms).max(0.0);
                            playback.time <= 0.0
                        } else {
                            playback.time = (playback.time + dt_ms).min(total);
                            playback.time >= total
                        };
                        (done, playback.autoremove)
                    };
                    inner.render(id);

                    if done {
                        if let Some(playback) = inner.timelines.get_mut(id) {
                            playback.playing = false;
                            let callback = if playback.reversed {
                                playback.on_reverse_complete.clone()
                            } else {
                                playback.on_complete.clone()
                            };
                            callbacks.extend(callback);
                            if autoremove && !playback.reversed {
                                finished.push(id);
                            }
                        }
                    }
                }

                for id in finished {
                    inner.timelines.remove(id);
                }
            }
            inner.take_frame()
        };

        for callback in callbacks {
            callback();
        }
        frame
    }

    /// Pause every timeline
    pub fn pause_all(&self) {
        self.inner.borrow_mut().paused = true;
    }

    /// Resume after [`pause_all`](Self::pause_all) from where timelines stopped
    pub fn resume_all(&self) {
        self.inner.borrow_mut().paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    /// Clamp all timing to `cap` ms, or restore it with `None`
    ///
    /// Playing timelines keep their relative progress.
    pub fn set_duration_cap(&self, cap: Option<f32>) {
        let mut inner = self.inner.borrow_mut();
        if inner.cap == cap {
            return;
        }
        inner.cap = cap;
        let ids: Vec<TimelineId> = inner.timelines.keys().collect();
        for id in ids {
            let Some(playback) = inner.timelines.get_mut(id) else {
                continue;
            };
            let old_total = playback.timeline.duration_ms();
            playback.timeline.set_cap(cap);
            let new_total = playback.timeline.duration_ms();

            if old_total.is_finite() && new_total.is_finite() && old_total > 0.0 {
                playback.time = playback.time / old_total * new_total;
            } else if old_total.is_infinite() && new_total.is_finite() {
                playback.parked = playback.playing;
                playback.time = new_total;
            } else if new_total.is_infinite() && playback.parked {
                playback.parked = false;
                playback.playing = true;
                playback.time = 0.0;
            }
            inner.render(id);
        }
        tracing::debug!("animation duration cap set to {:?}", cap);
    }

    pub fn duration_cap(&self) -> Option<f32> {
        self.inner.borrow().cap
    }

    /// Whether any timeline is playing
    pub fn has_active_animations(&self) -> bool {
        self.inner.borrow().timelines.values().any(|p| p.playing)
    }

    pub fn timeline_count(&self) -> usize {
        self.inner.borrow().timelines.len()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the animation scheduler
///
/// Operations on a dropped scheduler are no-ops.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    fn with_inner<R>(&self, f: impl FnOnce(&mut SchedulerInner) -> R) -> Option<R> {
        self.inner.upgrade().map(|inner| f(&mut inner.borrow_mut()))
    }

    fn with_playback<R>(&self, id: TimelineId, f: impl FnOnce(&mut Playback) -> R) -> Option<R> {
        self.with_inner(|inner| inner.timelines.get_mut(id).map(f))
            .flatten()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Defaults new timelines should use
    pub fn defaults(&self) -> TweenDefaults {
        self.with_inner(|inner| inner.defaults).unwrap_or_default()
    }

    /// Empty timeline carrying the scheduler defaults
    pub fn timeline(&self) -> Timeline {
        Timeline::with_defaults(self.defaults())
    }

    /// Register a paused timeline
    ///
    /// Entries that render immediately (`from` tweens) take their start
    /// state now; it is reported by the next tick.
    pub fn register_timeline(&self, mut timeline: Timeline) -> Option<TimelineId> {
        self.with_inner(|inner| {
            timeline.set_cap(inner.cap);
            let id = inner.timelines.insert(Playback::new(timeline));
            inner.render(id);
            id
        })
    }

    /// Register and play a single tween, removing it when it completes
    pub fn play_tween(&self, tween: Tween) -> Option<TimelineId> {
        let mut timeline = self.timeline();
        timeline.add(tween, Position::At(0.0));
        let id = self.register_timeline(timeline)?;
        self.with_playback(id, |p| {
            p.autoremove = true;
            p.playing = true;
            p.parked = p.timeline.is_parked();
        });
        Some(id)
    }

    /// Play forward from the current position
    pub fn play(&self, id: TimelineId) {
        self.with_playback(id, |p| {
            p.reversed = false;
            p.playing = p.time < p.timeline.duration_ms();
            p.parked = p.timeline.is_parked();
        });
    }

    /// Play backward from the current position
    pub fn reverse(&self, id: TimelineId) {
        self.with_playback(id, |p| {
            p.reversed = true;
            p.playing = p.time > 0.0;
        });
    }

    /// Play forward from the start
    pub fn restart(&self, id: TimelineId) {
        self.with_playback(id, |p| {
            p.time = 0.0;
            p.reversed = false;
            p.playing = true;
            p.parked = p.timeline.is_parked();
        });
    }

    pub fn pause(&self, id: TimelineId) {
        self.with_playback(id, |p| {
            p.playing = false;
            p.parked = false;
        });
    }

    pub fn remove(&self, id: TimelineId) -> bool {
        self.with_inner(|inner| inner.timelines.remove(id).is_some())
            .unwrap_or(false)
    }

    pub fn is_playing(&self, id: TimelineId) -> bool {
        self.with_playback(id, |p| p.playing).unwrap_or(false)
    }

    pub fn is_reversed(&self, id: TimelineId) -> bool {
        self.with_playback(id, |p| p.reversed).unwrap_or(false)
    }

    pub fn contains(&self, id: TimelineId) -> bool {
        self.with_inner(|inner| inner.timelines.contains_key(id))
            .unwrap_or(false)
    }

    /// Playhead position in ms
    pub fn time(&self, id: TimelineId) -> Option<f32> {
        self.with_playback(id, |p| p.time)
    }

    /// Playhead position as a fraction of the duration
    pub fn progress(&self, id: TimelineId) -> Option<f32> {
        self.with_playback(id, |p| {
            let total = p.timeline.duration_ms();
            if total.is_infinite() {
                0.0
            } else if total <= 0.0 {
                1.0
            } else {
                p.time / total
            }
        })
    }

    /// Current duration (reflects any duration cap)
    pub fn duration_ms(&self, id: TimelineId) -> Option<f32> {
        self.with_playback(id, |p| p.timeline.duration_ms())
    }

    /// Run `f` whenever the timeline completes forward
    pub fn on_complete<F: Fn() + 'static>(&self, id: TimelineId, f: F) {
        self.with_playback(id, |p| p.on_complete = Some(Rc::new(f)));
    }

    /// Run `f` whenever the timeline returns to its start in reverse
    pub fn on_reverse_complete<F: Fn() + 'static>(&self, id: TimelineId, f: F) {
        self.with_playback(id, |p| p.on_reverse_complete = Some(Rc::new(f)));
    }

    /// Rendered state of an element
    pub fn props(&self, target: ElementId) -> Props {
        self.with_inner(|inner| inner.props.get(&target).copied())
            .flatten()
            .unwrap_or_default()
    }

    /// Seed an element's rendered state
    pub fn set_props(&self, target: ElementId, props: Props) {
        self.with_inner(|inner| {
            inner.props.insert(target, props);
            if !inner.dirty.contains(&target) {
                inner.dirty.push(target);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::tween::Repeat;
    use crate::values::PropTargets;
    use std::cell::Cell;

    fn el(n: u64) -> ElementId {
        ElementId::from_raw(n)
    }

    fn fade_in(n: u64, ms: f32) -> Timeline {
        let mut tl = Timeline::new();
        tl.add(
            Tween::from(el(n), PropTargets::new().opacity(0.0))
                .duration(ms)
                .ease(Easing::Linear),
            Position::Sequential,
        );
        tl
    }

    /// Tick in 16 ms frames until `done` or `limit` ms elapse; returns elapsed
    fn run_until(scheduler: &AnimationScheduler, limit: f32, done: impl Fn() -> bool) -> f32 {
        let mut elapsed = 0.0;
        while !done() && elapsed < limit {
            scheduler.tick(16.0);
            elapsed += 16.0;
        }
        elapsed
    }

    #[test]
    fn test_register_renders_start_state() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let id = handle.register_timeline(fade_in(1, 600.0)).unwrap();
        assert!(!handle.is_playing(id));

        let frame = scheduler.tick(16.0);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].1.opacity, 0.0);
        // Paused timelines don't advance
        assert_eq!(handle.time(id), Some(0.0));
    }

    #[test]
    fn test_play_to_completion() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let id = handle.register_timeline(fade_in(1, 100.0)).unwrap();
        let completed = Rc::new(Cell::new(0));
        let c = completed.clone();
        handle.on_complete(id, move || c.set(c.get() + 1));
        handle.play(id);

        scheduler.tick(50.0);
        assert!((handle.props(el(1)).opacity - 0.5).abs() < 1e-5);
        scheduler.tick(50.0);
        assert_eq!(handle.props(el(1)).opacity, 1.0);
        assert_eq!(completed.get(), 1);
        assert!(!handle.is_playing(id));

        // Further ticks don't re-fire
        scheduler.tick(50.0);
        assert_eq!(completed.get(), 1);
    }

    #[test]
    fn test_reverse_returns_to_start() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let id = handle.register_timeline(fade_in(1, 100.0)).unwrap();
        let reversed = Rc::new(Cell::new(false));
        let r = reversed.clone();
        handle.on_reverse_complete(id, move || r.set(true));

        handle.play(id);
        scheduler.tick(60.0);
        handle.reverse(id);
        scheduler.tick(30.0);
        assert!((handle.props(el(1)).opacity - 0.3).abs() < 1e-5);
        scheduler.tick(100.0);
        assert_eq!(handle.props(el(1)).opacity, 0.0);
        assert!(reversed.get());
    }

    #[test]
    fn test_play_tween_autoremoves() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let id = handle
            .play_tween(Tween::to(el(1), PropTargets::new().scale(1.05)).duration(200.0))
            .unwrap();
        scheduler.tick(100.0);
        assert!(handle.contains(id));
        scheduler.tick(100.0);
        assert!(!handle.contains(id));
        assert!((handle.props(el(1)).scale - 1.05).abs() < 1e-5);
    }

    #[test]
    fn test_pause_all_does_not_catch_up() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let id = handle.register_timeline(fade_in(1, 1000.0)).unwrap();
        handle.play(id);
        scheduler.tick(100.0);

        scheduler.pause_all();
        for _ in 0..100 {
            scheduler.tick(16.0);
        }
        assert_eq!(handle.time(id), Some(100.0));

        scheduler.resume_all();
        scheduler.tick(16.0);
        assert_eq!(handle.time(id), Some(116.0));
    }

    #[test]
    fn test_duration_cap_is_retroactive() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let id = handle.register_timeline(fade_in(1, 600.0)).unwrap();
        let done = Rc::new(Cell::new(false));
        let d = done.clone();
        handle.on_complete(id, move || d.set(true));
        handle.play(id);
        scheduler.tick(16.0);

        scheduler.set_duration_cap(Some(1.0));
        assert!(handle.duration_ms(id).is_some_and(|d| d <= 1.0));
        let elapsed = run_until(&scheduler, 1000.0, || done.get());
        assert!(elapsed <= 16.0);
        assert_eq!(handle.props(el(1)).opacity, 1.0);
    }

    #[test]
    fn test_cap_parks_and_restores_infinite() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        let mut tl = Timeline::new();
        tl.add(
            Tween::from_to(el(1), PropTargets::new().y(0.0), PropTargets::new().y(-10.0))
                .duration(2000.0)
                .repeat(Repeat::Infinite)
                .yoyo(true),
            Position::Sequential,
        );
        let id = handle.register_timeline(tl).unwrap();
        handle.play(id);
        scheduler.tick(1000.0);
        assert!(handle.props(el(1)).y < 0.0);

        scheduler.set_duration_cap(Some(1.0));
        scheduler.tick(16.0);
        assert_eq!(handle.props(el(1)).y, 0.0);
        assert!(!handle.is_playing(id));

        scheduler.set_duration_cap(None);
        assert!(handle.is_playing(id));
    }

    #[test]
    fn test_infinite_registered_under_cap_resumes() {
        let scheduler = AnimationScheduler::new();
        scheduler.set_duration_cap(Some(1.0));
        let handle = scheduler.handle();
        let mut tl = Timeline::new();
        tl.add(
            Tween::from_to(el(1), PropTargets::new().y(0.0), PropTargets::new().y(-10.0))
                .duration(2000.0)
                .repeat(Repeat::Infinite)
                .yoyo(true),
            Position::Sequential,
        );
        let id = handle.register_timeline(tl).unwrap();
        handle.play(id);
        scheduler.tick(16.0);
        assert!(!handle.is_playing(id));
        assert_eq!(handle.props(el(1)).y, 0.0);

        scheduler.set_duration_cap(None);
        assert!(handle.is_playing(id));
        scheduler.tick(1000.0);
        assert!(handle.props(el(1)).y < 0.0);
    }

    #[test]
    fn test_handle_outlives_scheduler() {
        let scheduler = AnimationScheduler::new();
        let handle = scheduler.handle();
        drop(scheduler);
        assert!(!handle.is_alive());
        assert!(handle.register_timeline(Timeline::new()).is_none());
        assert_eq!(handle.props(el(1)), Props::IDENTITY);
    }
}
