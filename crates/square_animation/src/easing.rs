//! Easing functions
//!
//! Maps linear progress in `[0, 1]` to eased progress. Names follow the
//! `family.direction` convention used in page scripts (`power2.out`,
//! `sine.inOut`), which is also the serialized form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Easing {
    #[serde(rename = "none")]
    Linear,
    #[serde(rename = "power1.out")]
    Power1Out,
    #[default]
    #[serde(rename = "power2.out")]
    Power2Out,
    #[serde(rename = "power3.out")]
    Power3Out,
    #[serde(rename = "power2.in")]
    Power2In,
    #[serde(rename = "power2.inOut")]
    Power2InOut,
    #[serde(rename = "sine.inOut")]
    SineInOut,
    #[serde(rename = "back.out")]
    BackOut,
}

impl Easing {
    pub const ALL: [Easing; 8] = [
        Easing::Linear,
        Easing::Power1Out,
        Easing::Power2Out,
        Easing::Power3Out,
        Easing::Power2In,
        Easing::Power2InOut,
        Easing::SineInOut,
        Easing::BackOut,
    ];

    /// Apply the easing to a progress value (clamped to `[0, 1]`)
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power1Out => out_pow(t, 2),
            Easing::Power2Out => out_pow(t, 3),
            Easing::Power3Out => out_pow(t, 4),
            Easing::Power2In => t * t * t,
            Easing::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - out_pow_raw(2.0 * (1.0 - t), 3) / 2.0
                }
            }
            Easing::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::BackOut => {
                // Overshoot constant 1.70158
                let c1 = 1.70158_f32;
                let c3 = c1 + 1.0;
                let u = t - 1.0;
                1.0 + c3 * u * u * u + c1 * u * u
            }
        }
    }

    /// Serialized name
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "none",
            Easing::Power1Out => "power1.out",
            Easing::Power2Out => "power2.out",
            Easing::Power3Out => "power3.out",
            Easing::Power2In => "power2.in",
            Easing::Power2InOut => "power2.inOut",
            Easing::SineInOut => "sine.inOut",
            Easing::BackOut => "back.out",
        }
    }
}

/// `1 - (1 - t)^n`
#[inline]
fn out_pow(t: f32, n: i32) -> f32 {
    1.0 - (1.0 - t).powi(n)
}

#[inline]
fn out_pow_raw(v: f32, n: i32) -> f32 {
    v.powi(n)
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown easing name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEasing(pub String);

impl fmt::Display for UnknownEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown easing '{}'", self.0)
    }
}

impl std::error::Error for UnknownEasing {}

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Easing::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .or(match name {
                "linear" => Some(Easing::Linear),
                "power1" => Some(Easing::Power1Out),
                "power2" => Some(Easing::Power2Out),
                "power3" => Some(Easing::Power3Out),
                _ => None,
            })
            .ok_or_else(|| UnknownEasing(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_boundaries() {
        for easing in Easing::ALL {
            assert!(easing.apply(0.0).abs() < 0.001, "{:?} at t=0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 0.001, "{:?} at t=1", easing);
        }
    }

    #[test]
    fn test_easing_monotonic() {
        for easing in Easing::ALL {
            if easing == Easing::BackOut {
                continue; // overshoots
            }
            let mut prev = 0.0;
            for i in 0..=20 {
                let v = easing.apply(i as f32 / 20.0);
                assert!(v >= prev - 1e-6, "{:?} not monotonic at step {}", easing, i);
                prev = v;
            }
        }
    }

    #[test]
    fn test_power2_out_is_decelerating() {
        // Cubic ease-out covers 87.5% of the distance at the halfway point
        assert!((Easing::Power2Out.apply(0.5) - 0.875).abs() < 1e-5);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("power2.out".parse(), Ok(Easing::Power2Out));
        assert_eq!("sine.inOut".parse(), Ok(Easing::SineInOut));
        assert_eq!("linear".parse(), Ok(Easing::Linear));
        assert!("elastic.out".parse::<Easing>().is_err());
    }
}
