//! Per-tick update of the active room.

use std::time::Duration;

use glam::Vec2;
use prophecy_core::{EntityId, Event, Outcome, Rect, RoomKey};
use tracing::{debug, info};

use crate::{
    actions, combat,
    entity::{Behavior, EntityCore},
    projectile, registry, session, World,
};

/// Advances the clock and every member of the active room by `dt`.
pub(crate) fn advance(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    if world.outcome.is_some() {
        return;
    }
    world.clock = world.clock + dt;
    out_events.push(Event::TimeAdvanced {
        dt,
        now: world.clock,
    });

    let Some(room) = world.current_room.clone() else {
        return;
    };
    for entity in registry::entities_in_room(world, &room) {
        update(world, entity, dt, out_events);
    }
    animate(world, &room, dt, out_events);
    cross_doors(world, &room, out_events);
    decide_outcome(world, out_events);
}

fn update(world: &mut World, entity: EntityId, dt: Duration, out_events: &mut Vec<Event>) {
    let in_flight = world
        .entity(entity)
        .is_some_and(|target| target.flight().is_some());
    if in_flight {
        projectile::update(world, entity, dt, out_events);
    } else {
        update_living(world, entity, dt, out_events);
    }
}

fn update_living(world: &mut World, entity: EntityId, dt: Duration, out_events: &mut Vec<Event>) {
    let now = world.now();
    let Some(target) = world.entity_mut(entity) else {
        return;
    };
    if !target.core.valid {
        return;
    }
    if target.core.is_dead() {
        let _ = combat::die(world, entity, out_events);
        return;
    }
    for status in target.core.statuses.tick(dt) {
        out_events.push(Event::StatusExpired { entity, status });
    }
    if target.core.boost_until.is_some_and(|until| now >= until) {
        let base = target.core.base_speed;
        target.core.body.set_speed(base);
        target.core.body.set_fixed_direction(false);
        target.core.boost_until = None;
    }

    actions::resolve_elapsed(world, entity, out_events);

    let Some(bounds) = world.room_bounds_of(entity) else {
        return;
    };
    let Some(target) = world.entity_mut(entity) else {
        return;
    };
    if !target.core.valid {
        return;
    }
    match &mut target.behavior {
        Behavior::Player(state) => {
            state.regenerate(dt.as_secs_f32());
            walk(&mut target.core, &bounds);
        }
        Behavior::Enemy | Behavior::Npc => {
            walk(&mut target.core, &bounds);
            let _ = target.core.body.set_direction(Vec2::ZERO);
        }
        Behavior::Boss | Behavior::Projectile(_) | Behavior::HomingProjectile(..) => {}
    }
}

fn walk(core: &mut EntityCore, room: &Rect) {
    let direction = core.body.direction();
    let animation = if direction == Vec2::ZERO { "Stand" } else { "Move" };
    let _ = core.animator.set_animation(animation, false, false);
    core.animator.face(direction.x);
    let _ = core.body.move_within(room);
}

fn animate(world: &mut World, room: &RoomKey, dt: Duration, out_events: &mut Vec<Event>) {
    for entity in registry::entities_in_room(world, room) {
        let Some(target) = world.entity_mut(entity) else {
            continue;
        };
        let expired = target.core.animator.advance(dt);
        if expired.as_deref() == Some("Death") && !target.core.valid {
            debug!(entity = entity.get(), "death animation finished");
            let _ = registry::remove(world, entity, true, out_events);
        }
    }
}

fn cross_doors(world: &mut World, room: &RoomKey, out_events: &mut Vec<Event>) {
    let Some(player) = world
        .player
        .and_then(|id| world.entity(id))
        .filter(|entity| entity.core.valid && entity.core.room.as_ref() == Some(room))
        .map(|entity| entity.core.body.bounds())
    else {
        return;
    };
    let crossing = world.rooms.get(room).and_then(|current| {
        current
            .connected_doors()
            .into_iter()
            .find(|(_, door)| door.bounds().intersects(&player))
            .map(|(side, _)| side)
    });
    if let Some(side) = crossing {
        let _ = session::switch_room(world, side, out_events);
    }
}

fn decide_outcome(world: &mut World, out_events: &mut Vec<Event>) {
    let fallen = |id: Option<EntityId>| {
        id.is_some_and(|id| world.entity(id).map_or(true, |entity| entity.core.is_dead()))
    };
    let outcome = if fallen(world.player) {
        Outcome::Defeat
    } else if fallen(world.boss) {
        Outcome::Victory
    } else {
        return;
    };
    info!(?outcome, "session decided");
    world.outcome = Some(outcome);
    out_events.push(Event::OutcomeDecided { outcome });
}
