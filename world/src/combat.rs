//! Damage, statuses, basic attacks and the death transition.

use std::time::Duration;

use prophecy_core::{Circle, EntityId, EntityKind, Event, Stat, StatusKind};
use tracing::debug;

use crate::{
    actions::{self, ActionFlow, ActionState},
    registry::{self, Proximity},
    World,
};

/// Name of the action state held while attacking.
pub const ATTACK: &str = "Attack";

/// Applies `amount` to every target that is hostile to `attacker`.
///
/// Allies, invalid targets and targets holding [`StatusKind::Invincible`]
/// are skipped. Each hit target plays its `Hurt` animation. Returns the
/// number of targets that lost health.
pub fn damage(
    world: &mut World,
    attacker: EntityId,
    targets: &[EntityId],
    amount: f32,
    out_events: &mut Vec<Event>,
) -> usize {
    if amount <= 0.0 {
        return 0;
    }
    let mut hits = 0;
    for &target in targets {
        if registry::is_ally(world, attacker, target) {
            continue;
        }
        let Some(victim) = world.entity_mut(target) else {
            continue;
        };
        if !victim.core.valid || victim.core.statuses.has(StatusKind::Invincible) {
            continue;
        }
        victim.core.take_damage(amount);
        if victim.core.animator.set_animation("Hurt", true, false) {
            victim.core.animator.set_fixed(true);
        }
        hits += 1;
        out_events.push(Event::Damaged {
            attacker,
            target,
            amount,
            remaining: victim.core.health,
        });
    }
    hits
}

/// Starts the death transition of `entity`.
///
/// The entity becomes invalid immediately. Without a `Death` animation it is
/// removed at once; otherwise removal waits for the animation to finish.
pub fn die(world: &mut World, entity: EntityId, out_events: &mut Vec<Event>) -> bool {
    let Some(target) = world.entity_mut(entity) else {
        return false;
    };
    if !target.core.valid {
        return false;
    }
    target.core.valid = false;
    target.core.action = None;
    let kind = target.kind();
    let animated = target.core.animator.set_animation("Death", true, true);
    if animated {
        target.core.animator.set_fixed(true);
    }
    if kind != EntityKind::Projectile {
        debug!(entity = entity.get(), ?kind, animated, "entity died");
    }
    out_events.push(Event::EntityDied { entity, kind });
    if !animated {
        let _ = registry::remove(world, entity, true, out_events);
    }
    true
}

/// Attaches a status unless one of the same kind is still running.
pub fn add_status(
    world: &mut World,
    entity: EntityId,
    status: StatusKind,
    duration: Duration,
    out_events: &mut Vec<Event>,
) -> bool {
    let added = world
        .entity_mut(entity)
        .is_some_and(|target| target.core.statuses.add(status, duration));
    if added {
        out_events.push(Event::StatusGained { entity, status });
    }
    added
}

/// Reports whether `entity` currently holds `status`.
#[must_use]
pub fn has_status(world: &World, entity: EntityId, status: StatusKind) -> bool {
    world
        .entity(entity)
        .is_some_and(|target| target.core.statuses.has(status))
}

/// Time left on the entity's `status`.
#[must_use]
pub fn status_time_left(world: &World, entity: EntityId, status: StatusKind) -> Option<Duration> {
    world.entity(entity)?.core.statuses.time_left(status)
}

/// Starts the entity's basic attack.
///
/// The player swings and damages nearby enemies once the windup elapses.
/// Other fighters strike the player immediately when it stands within their
/// attack range and then recover. Refused while an attack is underway.
pub fn begin_attack(world: &mut World, entity: EntityId, out_events: &mut Vec<Event>) -> bool {
    let now = world.now();
    let timing = world.config.attacks;
    let Some(attacker) = world.entity_mut(entity) else {
        return false;
    };
    if !attacker.core.valid || attacker.core.is_dead() || attacker.core.is_acting(ATTACK) {
        return false;
    }

    let state = match attacker.kind() {
        EntityKind::Projectile => return false,
        EntityKind::Player => {
            if attacker.core.animator.set_animation(ATTACK, true, false) {
                attacker.core.animator.set_fixed(true);
                attacker.core.animator.set_fixed_facing(true);
            }
            let reach = attacker
                .core
                .stat(Stat::AttackRange)
                .unwrap_or(timing.player_reach);
            ActionState::new(ATTACK, now, Duration::from_millis(timing.player_windup_ms)).on_elapse(
                move |world, id, out_events| {
                    let amount = world
                        .entity(id)
                        .and_then(|player| player.core.stat(Stat::Attack))
                        .unwrap_or(0.0);
                    let targets = registry::nearest(world, id, &Proximity::enemies_within(reach));
                    let _ = damage(world, id, &targets, amount, out_events);
                    ActionFlow::Finish
                },
            )
        }
        EntityKind::Enemy | EntityKind::Npc | EntityKind::Boss => {
            let _ = attacker.core.animator.set_animation(ATTACK, true, false);
            let reach = Circle::new(
                attacker.core.body.bounds().center(),
                attacker
                    .core
                    .stat(Stat::AttackRange)
                    .unwrap_or(Proximity::DEFAULT_DISTANCE),
            );
            let amount = attacker.core.stat(Stat::Attack).unwrap_or(0.0);
            let victim = world.player.filter(|player| {
                world
                    .entity(*player)
                    .is_some_and(|target| reach.intersects_rect(&target.core.body.bounds()))
            });
            if let Some(victim) = victim {
                let _ = damage(world, entity, &[victim], amount, out_events);
            }
            ActionState::new(ATTACK, now, Duration::from_millis(timing.enemy_recovery_ms))
                .on_elapse(|_, _, _| ActionFlow::Finish)
        }
    };

    let _ = actions::assign(world, entity, state);
    out_events.push(Event::AttackStarted { entity });
    true
}
