//! Animatable value types
//!
//! Elements animate four visual properties: opacity, translation and uniform
//! scale. [`Props`] is the full rendered state of an element; [`PropTargets`]
//! is a sparse set of properties a tween touches.

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

/// Rendered visual state of an element
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Props {
    pub opacity: f32,
    /// Horizontal translation in px
    pub x: f32,
    /// Vertical translation in px
    pub y: f32,
    pub scale: f32,
}

impl Props {
    /// Untransformed, fully opaque
    pub const IDENTITY: Props = Props {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };

    /// CSS `transform` value
    pub fn transform_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            round3(self.x),
            round3(self.y),
            round3(self.scale)
        )
    }

    /// CSS `opacity` value
    pub fn opacity_css(&self) -> String {
        round3(self.opacity).to_string()
    }

    /// Overwrite the properties present in `targets`
    pub fn apply(&mut self, targets: &PropTargets) {
        if let Some(v) = targets.opacity {
            self.opacity = v;
        }
        if let Some(v) = targets.x {
            self.x = v;
        }
        if let Some(v) = targets.y {
            self.y = v;
        }
        if let Some(v) = targets.scale {
            self.scale = v;
        }
    }
}

impl Default for Props {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Interpolate for Props {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Props {
            opacity: self.opacity.lerp(&other.opacity, t),
            x: self.x.lerp(&other.x, t),
            y: self.y.lerp(&other.y, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.opacity.approx_eq(&other.opacity, epsilon)
            && self.x.approx_eq(&other.x, epsilon)
            && self.y.approx_eq(&other.y, epsilon)
            && self.scale.approx_eq(&other.scale, epsilon)
    }
}

fn round3(v: f32) -> f32 {
    let r = (v * 1000.0).round() / 1000.0;
    // Avoid printing "-0"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Sparse property set touched by a tween
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PropTargets {
    pub opacity: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale: Option<f32>,
}

impl PropTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every property at its identity value
    pub fn identity() -> Self {
        Self::new().opacity(1.0).x(0.0).y(0.0).scale(1.0)
    }

    pub fn opacity(mut self, v: f32) -> Self {
        self.opacity = Some(v);
        self
    }

    pub fn x(mut self, v: f32) -> Self {
        self.x = Some(v);
        self
    }

    pub fn y(mut self, v: f32) -> Self {
        self.y = Some(v);
        self
    }

    pub fn scale(mut self, v: f32) -> Self {
        self.scale = Some(v);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.opacity.is_none() && self.x.is_none() && self.y.is_none() && self.scale.is_none()
    }

    /// Union of the property masks of `self` and `other`
    pub fn mask_union(&self, other: &PropTargets) -> PropMask {
        PropMask {
            opacity: self.opacity.is_some() || other.opacity.is_some(),
            x: self.x.is_some() || other.x.is_some(),
            y: self.y.is_some() || other.y.is_some(),
            scale: self.scale.is_some() || other.scale.is_some(),
        }
    }

    /// Fill in unspecified properties from `current`
    pub fn resolve(&self, current: &Props) -> Props {
        let mut props = *current;
        props.apply(self);
        props
    }
}

/// Which properties a tween writes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropMask {
    pub opacity: bool,
    pub x: bool,
    pub y: bool,
    pub scale: bool,
}

impl PropMask {
    /// Copy masked properties of `value` into `into`
    pub fn write(&self, value: &Props, into: &mut Props) {
        if self.opacity {
            into.opacity = value.opacity;
        }
        if self.x {
            into.x = value.x;
        }
        if self.y {
            into.y = value.y;
        }
        if self.scale {
            into.scale = value.scale;
        }
    }
}
