//! Timeline orchestration
//!
//! A timeline places tweens on a shared time axis. Positions follow the
//! page-script conventions:
//!
//! - [`Position::Sequential`] starts at the current end of the timeline
//! - [`Position::Relative`] offsets from the current end (`"-=0.6"` is
//!   `Relative(-600.0)`), so later segments can overlap earlier ones
//! - [`Position::At`] starts at an absolute time
//!
//! Staggered groups share one position; member `i` starts `i * each` later.
//!
//! ```
//! use square_animation::{Position, PropTargets, Timeline, Tween};
//! use square_platform::ElementId;
//!
//! let title = ElementId::from_raw(1);
//! let subtitle = ElementId::from_raw(2);
//!
//! let mut tl = Timeline::new();
//! tl.add(Tween::from(title, PropTargets::new().opacity(0.0)).duration(1000.0), Position::Sequential);
//! tl.add(Tween::from(subtitle, PropTargets::new().opacity(0.0)), Position::Relative(-600.0));
//!
//! assert_eq!(tl.duration_ms(), 1000.0);
//! ```

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use square_platform::ElementId;

use crate::tween::{ResolvedTween, Timing, Tween, TweenDefaults};
use crate::values::Props;

/// Where a tween (or staggered group) is placed
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    Sequential,
    Relative(f32),
    At(f32),
}

/// Handle to a timeline entry (index in insertion order)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimelineEntryId(pub usize);

#[derive(Clone, Debug)]
struct Entry {
    tween: Tween,
    position: Position,
    /// Entries added together by a stagger share a group
    group: usize,
    stagger_offset: f32,
    /// Laid-out start time (before the tween's own delay)
    start_ms: f32,
    timing: Timing,
    resolved: Option<ResolvedTween>,
}

impl Entry {
    fn end_ms(&self) -> f32 {
        self.start_ms + self.timing.total_ms()
    }
}

/// An ordered set of positioned tweens
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    entries: Vec<Entry>,
    defaults: TweenDefaults,
    cap: Option<f32>,
    next_group: usize,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline whose tweens fall back to `defaults`
    pub fn with_defaults(defaults: TweenDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn defaults(&self) -> TweenDefaults {
        self.defaults
    }

    /// Add a tween at a position
    pub fn add(&mut self, tween: Tween, position: Position) -> TimelineEntryId {
        let group = self.next_group;
        self.next_group += 1;
        self.entries.push(Entry {
            timing: tween.timing(&self.defaults, self.cap),
            tween,
            position,
            group,
            stagger_offset: 0.0,
            start_ms: 0.0,
            resolved: None,
        });
        self.layout();
        TimelineEntryId(self.entries.len() - 1)
    }

    /// Start building a staggered group
    pub fn stagger(&mut self, each_ms: f32) -> StaggerBuilder<'_> {
        StaggerBuilder {
            timeline: self,
            each_ms: each_ms.max(0.0),
            tweens: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_ids(&self) -> Vec<TimelineEntryId> {
        (0..self.entries.len()).map(TimelineEntryId).collect()
    }

    /// Laid-out start of an entry (including its own delay)
    pub fn entry_start_ms(&self, id: TimelineEntryId) -> Option<f32> {
        self.entries
            .get(id.0)
            .map(|e| e.start_ms + e.timing.delay_ms)
    }

    pub fn entry_timing(&self, id: TimelineEntryId) -> Option<Timing> {
        self.entries.get(id.0).map(|e| e.timing)
    }

    /// Elements animated by this timeline
    pub fn targets(&self) -> SmallVec<[ElementId; 8]> {
        let mut targets = SmallVec::new();
        for entry in &self.entries {
            if !targets.contains(&entry.tween.target) {
                targets.push(entry.tween.target);
            }
        }
        targets
    }

    /// End of the last entry (infinite if any entry repeats forever)
    pub fn duration_ms(&self) -> f32 {
        self.entries.iter().map(Entry::end_ms).fold(0.0, f32::max)
    }

    /// Whether a cap is holding an infinite entry at its start
    pub fn is_parked(&self) -> bool {
        self.entries.iter().any(|e| e.timing.parked)
    }

    /// Clamp every duration, delay and offset to `cap` (or restore them)
    pub fn set_cap(&mut self, cap: Option<f32>) {
        self.cap = cap;
        for entry in &mut self.entries {
            entry.timing = entry.tween.timing(&self.defaults, cap);
        }
        self.layout();
    }

    fn clamp(&self, v: f32) -> f32 {
        match self.cap {
            Some(c) => v.signum() * v.abs().min(c),
            None => v,
        }
    }

    /// Recompute entry start times from positions and effective timings
    fn layout(&mut self) {
        let mut end = 0.0_f32;
        let mut i = 0;
        while i < self.entries.len() {
            let group = self.entries[i].group;
            let group_start = match self.entries[i].position {
                Position::Sequential => end,
                Position::Relative(offset) => (end + self.clamp(offset)).max(0.0),
                Position::At(at) => self.clamp(at).max(0.0),
            };
            let mut j = i;
            while j < self.entries.len() && self.entries[j].group == group {
                let offset = self.clamp(self.entries[j].stagger_offset);
                let entry = &mut self.entries[j];
                entry.start_ms = group_start + offset;
                end = end.max(entry.end_ms());
                j += 1;
            }
            i = j;
        }
    }

    /// Render the timeline at `time` into the element property map
    ///
    /// Touched elements are appended to `dirty`.
    pub fn render(
        &mut self,
        time: f32,
        props: &mut FxHashMap<ElementId, Props>,
        dirty: &mut Vec<ElementId>,
    ) {
        for entry in &mut self.entries {
            let local = time - entry.start_ms - entry.timing.delay_ms;
            if local < 0.0 && entry.resolved.is_none() && !entry.tween.renders_immediately() {
                continue;
            }
            let current = props.entry(entry.tween.target).or_default();
            let resolved = *entry
                .resolved
                .get_or_insert_with(|| entry.tween.resolve(current));
            resolved.render(entry.timing.progress(local), current);
            if !dirty.contains(&entry.tween.target) {
                dirty.push(entry.tween.target);
            }
        }
    }
}

/// Builder for a staggered group of tweens sharing one position
pub struct StaggerBuilder<'a> {
    timeline: &'a mut Timeline,
    each_ms: f32,
    tweens: Vec<Tween>,
}

impl StaggerBuilder<'_> {
    /// Add the next member of the group
    pub fn tween(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    /// Add one member per target, built by `f`
    pub fn each<I, F>(mut self, targets: I, f: F) -> Self
    where
        I: IntoIterator<Item = ElementId>,
        F: Fn(ElementId) -> Tween,
    {
        self.tweens.extend(targets.into_iter().map(f));
        self
    }

    /// Place the group and return the member entry ids
    pub fn at(self, position: Position) -> Vec<TimelineEntryId> {
        let timeline = self.timeline;
        if self.tweens.is_empty() {
            return Vec::new();
        }
        let group = timeline.next_group;
        timeline.next_group += 1;
        let first = timeline.entries.len();
        for (i, tween) in self.tweens.into_iter().enumerate() {
            timeline.entries.push(Entry {
                timing: tween.timing(&timeline.defaults, timeline.cap),
                tween,
                position,
                group,
                stagger_offset: i as f32 * self.each_ms,
                start_ms: 0.0,
                resolved: None,
            });
        }
        timeline.layout();
        (first..timeline.entries.len()).map(TimelineEntryId).collect()
    }
}
