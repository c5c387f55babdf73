//! Hero entrance and floating stat badges

use square_animation::{
    Easing, Position, PropTargets, Repeat, SchedulerHandle, TimelineId, Tween,
};
use square_platform::ElementId;

use crate::config::HeroConfig;
use crate::context::ComponentContext;

/// Timelines started for the hero section
#[derive(Clone, Debug, Default)]
pub struct HeroAnimation {
    /// Title, subtitle, buttons and stats entrance
    pub entrance: Option<TimelineId>,
    /// One endless float per stat badge
    pub floating: Vec<TimelineId>,
}

impl HeroAnimation {
    /// Build and start the hero timelines
    ///
    /// Elements for which `skip` returns true are left out.
    pub fn build(
        ctx: &ComponentContext,
        handle: &SchedulerHandle,
        config: &HeroConfig,
        skip: &dyn Fn(ElementId) -> bool,
    ) -> Self {
        let page = &ctx.page;
        let select = |selector: &str| -> Vec<ElementId> {
            page.query_all(selector)
                .into_iter()
                .filter(|el| !skip(*el))
                .collect()
        };
        let title = select(&config.title_selector).into_iter().next();
        let subtitle = select(&config.subtitle_selector).into_iter().next();
        let buttons = select(&config.buttons_selector);
        let stats = select(&config.stats_selector);

        let mut tl = handle.timeline();
        if let Some(title) = title {
            tl.add(
                Tween::from(title, PropTargets::new().y(50.0).opacity(0.0))
                    .duration(config.title_duration_ms),
                Position::Sequential,
            );
        }
        if let Some(subtitle) = subtitle {
            tl.add(
                Tween::from(subtitle, PropTargets::new().y(30.0).opacity(0.0)),
                Position::Relative(config.subtitle_offset_ms),
            );
        }
        tl.stagger(config.stagger_ms)
            .each(buttons.iter().copied(), |b| {
                Tween::from(b, PropTargets::new().y(30.0).opacity(0.0))
            })
            .at(Position::Relative(config.buttons_offset_ms));
        // Stats enter by scale so the float owns their y
        tl.stagger(config.stagger_ms)
            .each(stats.iter().copied(), |s| {
                Tween::from(s, PropTargets::new().scale(0.8).opacity(0.0))
            })
            .at(Position::Relative(config.stats_offset_ms));

        let entrance = if tl.is_empty() {
            None
        } else {
            let id = handle.register_timeline(tl);
            if let Some(id) = id {
                handle.play(id);
            }
            id
        };

        let floating = stats
            .iter()
            .enumerate()
            .filter_map(|(i, &stat)| {
                let mut tl = handle.timeline();
                tl.add(
                    Tween::from_to(
                        stat,
                        PropTargets::new().y(0.0),
                        PropTargets::new().y(config.float_distance),
                    )
                    .duration(config.float_duration_ms)
                    .delay(i as f32 * config.float_stagger_ms)
                    .ease(Easing::SineInOut)
                    .repeat(Repeat::Infinite)
                    .yoyo(true),
                    Position::At(0.0),
                );
                let id = handle.register_timeline(tl)?;
                handle.play(id);
                Some(id)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "hero: entrance {}, {} floating badge(s)",
            entrance.is_some(),
            floating.len()
        );
        Self { entrance, floating }
    }
}
