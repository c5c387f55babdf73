//! Interaction layer configuration
//!
//! Every selector and timing constant the components use lives here. All
//! fields have defaults, so a TOML file only needs the values it changes:
//!
//! ```toml
//! [nav]
//! scroll_threshold = 80.0
//!
//! [toast]
//! dismiss_after_ms = 3000
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use square_animation::{Easing, PropTargets, TweenDefaults};

use crate::error::Result;

/// Complete interaction layer configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InteractConfig {
    pub nav: NavConfig,
    pub reveal: RevealConfig,
    pub counter: CounterConfig,
    pub toast: ToastConfig,
    pub forms: FormConfig,
    pub hydration: HydrationConfig,
    pub motion: MotionConfig,
}

impl InteractConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Navigation controller settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NavConfig {
    pub navbar_selector: String,
    pub toggle_selector: String,
    pub menu_selector: String,
    pub link_selector: String,
    /// Scroll offset past which the navbar gets the `scrolled` class
    pub scroll_threshold: f32,
    pub scroll_throttle_ms: u64,
    pub resize_debounce_ms: u64,
    /// Viewport width above which the mobile menu closes itself
    pub mobile_breakpoint: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            navbar_selector: ".navbar".to_string(),
            toggle_selector: ".hamburger".to_string(),
            menu_selector: ".nav-menu".to_string(),
            link_selector: ".nav-link".to_string(),
            scroll_threshold: 100.0,
            scroll_throttle_ms: 100,
            resize_debounce_ms: 250,
            mobile_breakpoint: 768.0,
        }
    }
}

/// Scroll-reveal settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RevealConfig {
    pub selector: String,
    pub threshold: f32,
    /// Bottom root margin in px (negative shrinks the viewport)
    pub margin_bottom: f32,
    /// Transition delay per stagger index
    pub stagger_step_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: ".reveal, [data-reveal]".to_string(),
            threshold: 0.1,
            margin_bottom: -50.0,
            stagger_step_ms: 100,
        }
    }
}

/// Counter animation settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CounterConfig {
    pub selector: String,
    pub steps: u32,
    pub interval_ms: u64,
    /// Delay after the load signal before counters start
    pub start_delay_ms: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            selector: "[data-target]".to_string(),
            steps: 60,
            interval_ms: 50,
            start_delay_ms: 500,
        }
    }
}

/// Notification settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToastConfig {
    /// Time until the exit transition starts
    pub dismiss_after_ms: u64,
    /// Exit transition length; the element is removed when it ends
    pub exit_duration_ms: u64,
    pub style_id: String,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5000,
            exit_duration_ms: 300,
            style_id: "square-notification-styles".to_string(),
        }
    }
}

/// Contact form settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormConfig {
    pub selector: String,
    pub submit_selector: String,
    pub busy_label: String,
    pub success_message: String,
    pub error_message: String,
    /// Latency of the built-in simulated transport
    pub simulated_latency_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            selector: "[data-contact-form]".to_string(),
            submit_selector: "button[type=\"submit\"], input[type=\"submit\"]".to_string(),
            busy_label: "Sending...".to_string(),
            success_message: "Message sent successfully! We'll get back to you soon.".to_string(),
            error_message: "Failed to send message. Please try again.".to_string(),
            simulated_latency_ms: 1500,
        }
    }
}

/// Remote data hydration settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HydrationConfig {
    pub endpoint: String,
    pub bind_attribute: String,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/company-data".to_string(),
            bind_attribute: "data-bind".to_string(),
        }
    }
}

/// Timeline motion settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Use the timeline engine when no capability is injected
    pub enabled: bool,
    pub default_duration_ms: f32,
    pub default_easing: Easing,
    /// Duration every tween collapses to under reduced motion
    pub reduced_duration_ms: f32,
    pub hero: HeroConfig,
    pub sections: Vec<SectionConfig>,
    pub hover: HoverConfig,
    pub transition: TransitionConfig,
}

impl MotionConfig {
    pub fn tween_defaults(&self) -> TweenDefaults {
        TweenDefaults {
            duration_ms: self.default_duration_ms,
            easing: self.default_easing,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_duration_ms: 600.0,
            default_easing: Easing::Power2Out,
            reduced_duration_ms: 1.0,
            hero: HeroConfig::default(),
            sections: vec![
                SectionConfig {
                    name: "problem".to_string(),
                    selector: "#problem .problem-card".to_string(),
                    from: OffsetState {
                        y: Some(50.0),
                        opacity: Some(0.0),
                        ..OffsetState::default()
                    },
                    stagger_ms: 200.0,
                },
                SectionConfig {
                    name: "solution".to_string(),
                    selector: "#solution .solution-feature".to_string(),
                    from: OffsetState {
                        x: Some(-50.0),
                        opacity: Some(0.0),
                        ..OffsetState::default()
                    },
                    stagger_ms: 200.0,
                },
                SectionConfig {
                    name: "benefits".to_string(),
                    selector: "#benefits .benefit-card".to_string(),
                    from: OffsetState {
                        scale: Some(0.8),
                        opacity: Some(0.0),
                        ..OffsetState::default()
                    },
                    stagger_ms: 100.0,
                },
            ],
            hover: HoverConfig::default(),
            transition: TransitionConfig::default(),
        }
    }
}

/// Hero entrance and floating badges
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeroConfig {
    pub title_selector: String,
    pub subtitle_selector: String,
    pub buttons_selector: String,
    pub stats_selector: String,
    pub title_duration_ms: f32,
    /// Offset of each segment from the end of the previous one
    pub subtitle_offset_ms: f32,
    pub buttons_offset_ms: f32,
    pub stats_offset_ms: f32,
    pub stagger_ms: f32,
    pub float_distance: f32,
    pub float_duration_ms: f32,
    pub float_stagger_ms: f32,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            title_selector: ".hero-title".to_string(),
            subtitle_selector: ".hero-subtitle".to_string(),
            buttons_selector: ".hero-buttons .btn".to_string(),
            stats_selector: ".hero-stats .stat".to_string(),
            title_duration_ms: 1000.0,
            subtitle_offset_ms: -600.0,
            buttons_offset_ms: -400.0,
            stats_offset_ms: -200.0,
            stagger_ms: 100.0,
            float_distance: -10.0,
            float_duration_ms: 2000.0,
            float_stagger_ms: 300.0,
        }
    }
}

/// A scroll-triggered section group
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SectionConfig {
    pub name: String,
    /// Elements animated as one group; the first one is the trigger
    pub selector: String,
    /// Starting offset state; elements animate to identity
    #[serde(default)]
    pub from: OffsetState,
    #[serde(default)]
    pub stagger_ms: f32,
}

/// Sparse visual state used in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OffsetState {
    pub opacity: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale: Option<f32>,
}

impl OffsetState {
    pub fn to_targets(&self) -> PropTargets {
        PropTargets {
            opacity: self.opacity,
            x: self.x,
            y: self.y,
            scale: self.scale,
        }
    }
}

/// Hover micro-interactions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HoverConfig {
    pub selector: String,
    pub scale: f32,
    pub lift: f32,
    pub enter_ms: f32,
    pub leave_ms: f32,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            selector: ".card, .btn".to_string(),
            scale: 1.05,
            lift: -5.0,
            enter_ms: 300.0,
            leave_ms: 200.0,
        }
    }
}

/// Page-transition fade
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub main_selector: String,
    pub out_ms: f32,
    pub in_delay_ms: f32,
    pub scale: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            main_selector: "main".to_string(),
            out_ms: 400.0,
            in_delay_ms: 100.0,
            scale: 0.95,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page_constants() {
        let config = InteractConfig::default();
        assert_eq!(config.nav.scroll_throttle_ms, 100);
        assert_eq!(config.reveal.threshold, 0.1);
        assert_eq!(config.counter.steps, 60);
        assert_eq!(config.counter.interval_ms, 50);
        assert_eq!(config.toast.dismiss_after_ms, 5000);
        assert_eq!(config.toast.exit_duration_ms, 300);
        assert_eq!(config.motion.default_duration_ms, 600.0);
        assert_eq!(config.motion.default_easing, Easing::Power2Out);
        assert_eq!(config.motion.sections.len(), 3);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = InteractConfig::from_toml_str(
            r#"
            [nav]
            scroll_threshold = 80.0

            [motion]
            default_easing = "sine.inOut"

            [[motion.sections]]
            name = "team"
            selector = ".team-card"
            from = { y = 20.0, opacity = 0.0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.nav.scroll_threshold, 80.0);
        assert_eq!(config.nav.scroll_throttle_ms, 100);
        assert_eq!(config.motion.default_easing, Easing::SineInOut);
        assert_eq!(config.motion.sections.len(), 1);
        assert_eq!(config.motion.sections[0].from.y, Some(20.0));
        assert_eq!(config.motion.sections[0].stagger_ms, 0.0);
        assert_eq!(config.toast, ToastConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(InteractConfig::from_toml_str("[nav]\nscroll_threshold = \"far\"").is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = InteractConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(InteractConfig::from_toml_str(&text).unwrap(), config);
    }
}
