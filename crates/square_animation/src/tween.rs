//! Tweens
//!
//! A tween animates a sparse set of element properties between a start and
//! an end state. Like page-script tweens, the unspecified side is taken from
//! the element's rendered state when the tween first renders:
//!
//! - [`Tween::to`] animates from the current state to the given values
//! - [`Tween::from`] animates from the given values back to the current state
//!   (and renders its start state immediately, before its delay elapses)
//! - [`Tween::from_to`] animates between two explicit states

use square_platform::ElementId;

use crate::easing::Easing;
use crate::values::{Interpolate, PropMask, PropTargets, Props};

/// How many extra cycles a tween plays after the first
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    Once,
    Count(u32),
    Infinite,
}

impl Repeat {
    /// Extra cycles, `None` when infinite
    pub fn extra_cycles(&self) -> Option<u32> {
        match self {
            Repeat::Once => Some(0),
            Repeat::Count(n) => Some(*n),
            Repeat::Infinite => None,
        }
    }
}

/// Duration and easing applied when a tween doesn't set its own
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenDefaults {
    pub duration_ms: f32,
    pub easing: Easing,
}

impl Default for TweenDefaults {
    fn default() -> Self {
        Self {
            duration_ms: 600.0,
            easing: Easing::Power2Out,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    To,
    From,
    FromTo,
}

/// A single property animation on one element
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub target: ElementId,
    from: PropTargets,
    to: PropTargets,
    kind: Kind,
    pub duration_ms: Option<f32>,
    pub delay_ms: f32,
    pub easing: Option<Easing>,
    pub repeat: Repeat,
    pub yoyo: bool,
}

impl Tween {
    fn new(target: ElementId, from: PropTargets, to: PropTargets, kind: Kind) -> Self {
        Self {
            target,
            from,
            to,
            kind,
            duration_ms: None,
            delay_ms: 0.0,
            easing: None,
            repeat: Repeat::Once,
            yoyo: false,
        }
    }

    pub fn to(target: ElementId, to: PropTargets) -> Self {
        Self::new(target, PropTargets::new(), to, Kind::To)
    }

    pub fn from(target: ElementId, from: PropTargets) -> Self {
        Self::new(target, from, PropTargets::new(), Kind::From)
    }

    pub fn from_to(target: ElementId, from: PropTargets, to: PropTargets) -> Self {
        Self::new(target, from, to, Kind::FromTo)
    }

    pub fn duration(mut self, ms: f32) -> Self {
        self.duration_ms = Some(ms.max(0.0));
        self
    }

    pub fn delay(mut self, ms: f32) -> Self {
        self.delay_ms = ms.max(0.0);
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    /// Whether the start state renders before the delay elapses
    pub fn renders_immediately(&self) -> bool {
        matches!(self.kind, Kind::From | Kind::FromTo)
    }

    /// Capture start and end states against the element's current state
    pub fn resolve(&self, current: &Props) -> ResolvedTween {
        let (start, end) = match self.kind {
            Kind::To => (*current, self.to.resolve(current)),
            Kind::From => (self.from.resolve(current), *current),
            Kind::FromTo => (self.from.resolve(current), self.to.resolve(current)),
        };
        ResolvedTween {
            start,
            end,
            mask: self.from.mask_union(&self.to),
        }
    }

    /// Effective timing given defaults and an optional duration cap
    ///
    /// With a cap, every duration and delay is clamped to it and infinite
    /// repeats are parked at their start state.
    pub fn timing(&self, defaults: &TweenDefaults, cap: Option<f32>) -> Timing {
        let clamp = |v: f32| cap.map_or(v, |c| v.min(c));
        let parked = cap.is_some() && self.repeat == Repeat::Infinite;
        Timing {
            delay_ms: clamp(self.delay_ms),
            duration_ms: clamp(self.duration_ms.unwrap_or(defaults.duration_ms)),
            easing: self.easing.unwrap_or(defaults.easing),
            extra_cycles: if parked {
                Some(0)
            } else {
                self.repeat.extra_cycles()
            },
            yoyo: self.yoyo,
            parked,
        }
    }
}

/// Start/end states captured on first render
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTween {
    pub start: Props,
    pub end: Props,
    pub mask: PropMask,
}

impl ResolvedTween {
    /// Write the state at eased progress `p` into `props`
    pub fn render(&self, p: f32, props: &mut Props) {
        let value = self.start.lerp(&self.end, p);
        self.mask.write(&value, props);
    }
}

/// Effective timing of a tween
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    pub delay_ms: f32,
    pub duration_ms: f32,
    pub easing: Easing,
    /// `None` repeats forever
    pub extra_cycles: Option<u32>,
    pub yoyo: bool,
    /// Infinite tween held at its start state
    pub parked: bool,
}

impl Timing {
    /// Active time after the delay (infinite for endless repeats)
    pub fn active_ms(&self) -> f32 {
        match self.extra_cycles {
            Some(n) => self.duration_ms * (n as f32 + 1.0),
            None => f32::INFINITY,
        }
    }

    /// Delay plus active time
    pub fn total_ms(&self) -> f32 {
        self.delay_ms + self.active_ms()
    }

    /// Eased progress at `local` ms after the delay
    pub fn progress(&self, local: f32) -> f32 {
        if self.parked || local <= 0.0 {
            return 0.0;
        }
        if self.duration_ms <= 0.0 {
            return self.end_progress();
        }

        let (cycle, frac) = match self.extra_cycles {
            Some(n) if local >= self.active_ms() => (n, 1.0),
            _ => {
                let cycle = (local / self.duration_ms).floor();
                (cycle as u32, (local - cycle * self.duration_ms) / self.duration_ms)
            }
        };

        if self.yoyo && cycle % 2 == 1 {
            self.easing.apply(1.0 - frac)
        } else {
            self.easing.apply(frac)
        }
    }

    fn end_progress(&self) -> f32 {
        match self.extra_cycles {
            Some(n) if self.yoyo && n % 2 == 1 => 0.0,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el() -> ElementId {
        ElementId::from_raw(1)
    }

    #[test]
    fn test_defaults_applied() {
        let timing = Tween::to(el(), PropTargets::new().y(0.0)).timing(&TweenDefaults::default(), None);
        assert_eq!(timing.duration_ms, 600.0);
        assert_eq!(timing.easing, Easing::Power2Out);
        assert_eq!(timing.total_ms(), 600.0);
    }

    #[test]
    fn test_resolve_from_uses_current_as_end() {
        let tween = Tween::from(el(), PropTargets::new().y(50.0).opacity(0.0));
        let resolved = tween.resolve(&Props::IDENTITY);
        assert_eq!(resolved.start.y, 50.0);
        assert_eq!(resolved.start.opacity, 0.0);
        assert_eq!(resolved.end, Props::IDENTITY);
        assert!(resolved.mask.y && resolved.mask.opacity && !resolved.mask.scale);
        assert!(tween.renders_immediately());
    }

    #[test]
    fn test_yoyo_progress() {
        let timing = Tween::to(el(), PropTargets::new().y(-10.0))
            .duration(2000.0)
            .ease(Easing::Linear)
            .repeat(Repeat::Infinite)
            .yoyo(true)
            .timing(&TweenDefaults::default(), None);
        assert!(timing.total_ms().is_infinite());
        assert!((timing.progress(1000.0) - 0.5).abs() < 1e-5);
        assert!((timing.progress(2500.0) - 0.75).abs() < 1e-5);
        assert!((timing.progress(4000.0) - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_finite_repeat_end_state() {
        let timing = Tween::to(el(), PropTargets::new().y(10.0))
            .duration(100.0)
            .repeat(Repeat::Count(1))
            .yoyo(true)
            .timing(&TweenDefaults::default(), None);
        assert_eq!(timing.total_ms(), 200.0);
        // Odd repeat with yoyo ends back at the start
        assert_eq!(timing.progress(500.0), 0.0);
    }

    #[test]
    fn test_cap_collapses_timing_and_parks_infinite() {
        let defaults = TweenDefaults::default();
        let timing = Tween::from(el(), PropTargets::new().opacity(0.0))
            .duration(1000.0)
            .delay(100.0)
            .timing(&defaults, Some(1.0));
        assert_eq!(timing.total_ms(), 2.0);

        let floating = Tween::to(el(), PropTargets::new().y(-10.0))
            .repeat(Repeat::Infinite)
            .timing(&defaults, Some(1.0));
        assert!(floating.parked);
        assert!(floating.total_ms().is_finite());
        assert_eq!(floating.progress(50.0), 0.0);
    }
}
