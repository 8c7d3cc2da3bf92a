//! Skills every session starts with.

use std::time::Duration;

use glam::Vec2;
use prophecy_core::{MajorIssue, Stat, StatusKind};
use tracing::info;

use crate::{
    combat,
    registry::{self, Proximity},
    skills::{CastFault, ManaCost, SkillBook},
};

/// Time a dash keeps its speed boost and invincibility.
const DASH_WINDOW: Duration = Duration::from_millis(150);
const DASH_MULTIPLIER: f32 = 3.0;
const STRIKE_REACH: f32 = 180.0;

/// Builds the skill book holding `Dash`, `Strike` and `Focus`.
pub(crate) fn standard() -> Result<SkillBook, MajorIssue> {
    let mut book = SkillBook::new();

    let _ = book.register(
        "Dash",
        1,
        Duration::from_millis(500),
        ManaCost::flat(10.0),
        |world, request, out_events| {
            let now = world.now();
            let caster = world
                .entity_mut(request.caster)
                .ok_or(CastFault::MissingCaster(request.caster.get()))?;
            if caster.core.body.direction() == Vec2::ZERO {
                return Ok(false);
            }
            let boosted = caster.core.base_speed * DASH_MULTIPLIER;
            caster.core.body.set_speed(boosted);
            caster.core.body.set_fixed_direction(true);
            caster.core.boost_until = Some(now + DASH_WINDOW);
            if caster.core.animator.set_animation("Dash", true, false) {
                caster.core.animator.set_fixed(true);
                caster.core.animator.set_fixed_facing(true);
            }
            let _ = combat::add_status(
                world,
                request.caster,
                StatusKind::Invincible,
                DASH_WINDOW,
                out_events,
            );
            Ok(true)
        },
    )?;

    let _ = book.register(
        "Strike",
        3,
        Duration::from_millis(800),
        ManaCost::flat(10.0),
        |world, request, out_events| {
            let caster = world
                .entity(request.caster)
                .ok_or(CastFault::MissingCaster(request.caster.get()))?;
            let amount = caster.core.stat(Stat::Attack).unwrap_or(0.0);
            let reach = caster.core.stat(Stat::AttackRange).unwrap_or(STRIKE_REACH);
            let targets = registry::nearest(world, request.caster, &Proximity::enemies_within(reach));
            let _ = combat::damage(world, request.caster, &targets, amount, out_events);
            Ok(true)
        },
    )?;

    let _ = book.register(
        "Focus",
        1,
        Duration::ZERO,
        ManaCost::flat(0.0),
        |_, request, _| {
            info!(
                caster = request.caster.get(),
                level = request.level,
                targets = request.targets.len(),
                "focus"
            );
            Ok(true)
        },
    )?;

    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_book_declares_every_skill() {
        let book = standard().expect("catalog is consistent");
        assert_eq!(book.len(), 3);
        let dash = book.lookup("dash").expect("dash declared");
        assert_eq!(dash.cooldown(), Duration::from_millis(500));
        assert_eq!(dash.mana_cost(1), 10.0);
        assert!(book.lookup("STRIKE").is_some());
        assert!(book.lookup("Fireball").is_none());
    }
}
