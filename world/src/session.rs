//! Session lifecycle: rebuilding the world, spawning from templates and
//! moving the player between rooms.

use glam::{IVec2, Vec2};
use prophecy_core::{Body, EntityId, Event, MajorIssue, Rect, RoomKey, Side, Stat};
use tracing::{debug, info, warn};

use crate::{
    animation::Animator,
    config::EntityTemplate,
    entity::{Behavior, Entity, EntityCore, PlayerState},
    registry, skills, World,
};

/// Gap left between the player and the door it arrived through.
const DOOR_CLEARANCE: i32 = 1;

/// Discards every room and entity and rebuilds the session.
pub(crate) fn reset(world: &mut World, out_events: &mut Vec<Event>) -> Result<(), MajorIssue> {
    let replays = world.resets;
    world.resets = world.resets.saturating_add(1);
    world.entities.clear();
    world.registry.clear();
    world.rooms.clear();
    world.current_room = None;
    world.player = None;
    world.boss = None;
    world.outcome = None;
    out_events.push(Event::WorldReset { replays });

    let start = world.config.start_room.clone();
    if !world.rooms.generate(&start, world.room_source.as_ref())? {
        return Err(MajorIssue::UnknownRoom { room: start });
    }
    let current = world
        .config
        .entry_room
        .as_deref()
        .map(RoomKey::new)
        .filter(|key| world.rooms.contains(key))
        .unwrap_or_else(|| RoomKey::new(&start));

    let markers: Vec<(RoomKey, IVec2)> = world
        .rooms
        .iter()
        .flat_map(|room| {
            room.spawn_points()
                .into_iter()
                .map(|point| (room.key().clone(), point))
        })
        .collect();
    let enemy = world.config.enemy.clone();
    for (room, location) in markers {
        let _ = spawn(world, &enemy, Behavior::Enemy, &room, location, out_events)?;
    }

    let player_template = world.config.player.clone();
    let mana = world.config.mana;
    let location = centred(world, &current, &player_template);
    let player = spawn(
        world,
        &player_template,
        Behavior::Player(PlayerState {
            mana: mana.max,
            max_mana: mana.max,
            mana_regen: mana.regen_per_second,
        }),
        &current,
        location,
        out_events,
    )?;
    let bonus = world.config.attack_bonus_per_replay * replays as f32;
    if let Some(core) = player.and_then(|id| world.entity_mut(id)).map(|entity| &mut entity.core) {
        let attack = core.stat(Stat::Attack).unwrap_or(0.0) + bonus;
        let _ = core.stats.insert(Stat::Attack, attack);
    }
    world.player = player;

    if let Some(room) = world
        .config
        .boss_room
        .as_deref()
        .map(RoomKey::new)
        .filter(|key| world.rooms.contains(key))
    {
        let boss = world.config.boss.clone();
        let location = centred(world, &room, &boss);
        let spawned = spawn(world, &boss, Behavior::Boss, &room, location, out_events)?;
        world.boss = spawned;
    }

    info!(
        replays,
        rooms = world.rooms.len(),
        entities = world.entities.len(),
        room = %current,
        "session built"
    );
    world.current_room = Some(current.clone());
    out_events.push(Event::RoomEntered { room: current });
    Ok(())
}

fn centred(world: &World, room: &RoomKey, template: &EntityTemplate) -> IVec2 {
    let center = world
        .rooms
        .get(room)
        .map_or(Vec2::ZERO, |room| room.bounds().center());
    IVec2::new(
        center.x as i32 - template.width / 2,
        center.y as i32 - template.height / 2,
    )
}

/// Creates a living entity from `template` and registers it in `room`.
///
/// A template naming a sprite sheet that was never loaded is a
/// [`MajorIssue`]. Returns `None` when the room rejects the entity.
pub(crate) fn spawn(
    world: &mut World,
    template: &EntityTemplate,
    behavior: Behavior,
    room: &RoomKey,
    location: IVec2,
    out_events: &mut Vec<Event>,
) -> Result<Option<EntityId>, MajorIssue> {
    let animator = match &template.sheet {
        Some(sheet) => {
            let set = world
                .animations
                .get(sheet)
                .ok_or_else(|| MajorIssue::MissingSheet {
                    entity: template.name.clone(),
                    sheet: sheet.clone(),
                })?;
            Animator::new(set, &template.default_animation)?
        }
        None => Animator::detached(),
    };

    let id = world.allocate_id();
    let body = Body::new(
        Rect::from_location(location, template.width, template.height),
        template.base_speed,
    );
    let mut core = EntityCore::new(id, template.name.clone(), body, template.health);
    core.stats = template.stats.clone();
    core.animator = animator;
    let kind = behavior.kind();
    let _ = world.entities.insert(id, Entity { core, behavior });

    if !registry::register(world, room, id) {
        let _ = world.entities.remove(&id);
        warn!(entity = template.name.as_str(), %room, "spawn rejected by room");
        return Ok(None);
    }
    for skill in &template.skills {
        let _ = skills::learn(world, id, skill, 1);
    }
    debug!(entity = id.get(), name = template.name.as_str(), ?kind, %room, "entity spawned");
    out_events.push(Event::EntitySpawned {
        entity: id,
        kind,
        room: room.clone(),
    });
    Ok(Some(id))
}

/// Spawns an enemy at `origin` in the named room.
pub(crate) fn spawn_enemy(
    world: &mut World,
    room: &str,
    origin: IVec2,
    out_events: &mut Vec<Event>,
) -> Result<Option<EntityId>, MajorIssue> {
    let template = world.config.enemy.clone();
    spawn_named(world, &template, Behavior::Enemy, room, origin, out_events)
}

/// Spawns a friendly character at `origin` in the named room.
pub(crate) fn spawn_npc(
    world: &mut World,
    room: &str,
    origin: IVec2,
    out_events: &mut Vec<Event>,
) -> Result<Option<EntityId>, MajorIssue> {
    let template = world.config.npc.clone();
    spawn_named(world, &template, Behavior::Npc, room, origin, out_events)
}

fn spawn_named(
    world: &mut World,
    template: &EntityTemplate,
    behavior: Behavior,
    room: &str,
    origin: IVec2,
    out_events: &mut Vec<Event>,
) -> Result<Option<EntityId>, MajorIssue> {
    let key = RoomKey::new(room);
    if !world.rooms.contains(&key) {
        warn!(room, entity = template.name.as_str(), "cannot spawn in unknown room");
        return Ok(None);
    }
    spawn(world, template, behavior, &key, origin, out_events)
}

/// Moves the player into the active room's neighbour on `side`.
///
/// The player lands just inside the door facing the one it left through,
/// or in the middle of the room when that door does not exist.
pub(crate) fn switch_room(world: &mut World, side: Side, out_events: &mut Vec<Event>) -> bool {
    let Some(current) = world.current_room.clone() else {
        return false;
    };
    let Some(target) = world
        .rooms
        .get(&current)
        .and_then(|room| room.neighbour(side))
        .cloned()
    else {
        return false;
    };
    let Some(player) = world.player else {
        return false;
    };
    let Some(size) = world
        .entity(player)
        .filter(|entity| entity.core.valid)
        .map(|entity| entity.core.body.bounds())
    else {
        return false;
    };
    let entry = side.opposite();
    let Some(landing) = world.rooms.get(&target).map(|room| {
        arrival(
            room.bounds(),
            room.door(entry).map(|door| door.bounds()),
            entry,
            size,
        )
    }) else {
        return false;
    };

    if !registry::remove(world, player, false, out_events) {
        return false;
    }
    if let Some(entity) = world.entity_mut(player) {
        entity.core.body.teleport(landing);
    }
    if !registry::register(world, &target, player) {
        warn!(room = %target, "player could not enter room");
        return false;
    }
    debug!(from = %current, to = %target, ?side, "room switched");
    world.current_room = Some(target.clone());
    out_events.push(Event::RoomEntered { room: target });
    true
}

/// Location of a body of size `body` entering `room` through `door`.
fn arrival(room: Rect, door: Option<Rect>, entry: Side, body: Rect) -> IVec2 {
    let Some(door) = door else {
        let center = room.center();
        return clamp_location(
            IVec2::new(
                center.x as i32 - body.width / 2,
                center.y as i32 - body.height / 2,
            ),
            body,
            room,
        );
    };
    let door_center = door.center();
    let across_x = door_center.x as i32 - body.width / 2;
    let across_y = door_center.y as i32 - body.height / 2;
    let location = match entry {
        Side::Left => IVec2::new(door.right() + DOOR_CLEARANCE, across_y),
        Side::Right => IVec2::new(door.left() - body.width - DOOR_CLEARANCE, across_y),
        Side::Top => IVec2::new(across_x, door.bottom() + DOOR_CLEARANCE),
        Side::Bottom => IVec2::new(across_x, door.top() - body.height - DOOR_CLEARANCE),
    };
    clamp_location(location, body, room)
}

fn clamp_location(location: IVec2, body: Rect, room: Rect) -> IVec2 {
    let max_x = (room.right() - body.width).max(room.left());
    let max_y = (room.bottom() - body.height).max(room.top());
    IVec2::new(
        location.x.clamp(room.left(), max_x),
        location.y.clamp(room.top(), max_y),
    )
}
