//! Per-room membership and faction-aware queries.
//!
//! Membership lists are copied before iteration so that entities may die,
//! spawn or change rooms while a tick walks over a room.

use std::collections::BTreeMap;

use prophecy_core::{EntityId, Event, RoomKey};
use tracing::warn;

use crate::{entity::Allegiance, World};

/// Authoritative room membership.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntityRegistry {
    rooms: BTreeMap<RoomKey, Vec<EntityId>>,
}

impl EntityRegistry {
    fn insert(&mut self, room: &RoomKey, entity: EntityId) -> bool {
        let members = self.rooms.entry(room.clone()).or_default();
        if members.contains(&entity) {
            return false;
        }
        members.push(entity);
        true
    }

    fn remove(&mut self, room: &RoomKey, entity: EntityId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let Some(position) = members.iter().position(|member| *member == entity) else {
            return false;
        };
        let _ = members.remove(position);
        true
    }

    fn contains(&self, room: &RoomKey, entity: EntityId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(&entity))
    }

    pub(crate) fn snapshot(&self, room: &RoomKey) -> Vec<EntityId> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.rooms.clear();
    }
}

/// Filter applied by [`nearest`] and [`all`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proximity {
    /// Whether the source itself may appear in the result.
    pub include_source: bool,
    /// Maximum center-to-center distance; `None` accepts any distance.
    pub distance: Option<f32>,
    /// Whether allies of the source are accepted.
    pub allies: bool,
    /// Whether enemies of the source are accepted.
    pub enemies: bool,
}

impl Proximity {
    /// Default search radius of [`nearest`].
    pub const DEFAULT_DISTANCE: f32 = 100.0;

    /// Enemies of the source within `distance`.
    #[must_use]
    pub const fn enemies_within(distance: f32) -> Self {
        Self {
            include_source: false,
            distance: Some(distance),
            allies: false,
            enemies: true,
        }
    }

    /// Allies of the source within `distance`.
    #[must_use]
    pub const fn allies_within(distance: f32) -> Self {
        Self {
            include_source: false,
            distance: Some(distance),
            allies: true,
            enemies: false,
        }
    }

    /// Enemies of the source anywhere in the room.
    #[must_use]
    pub const fn all_enemies() -> Self {
        Self {
            include_source: false,
            distance: None,
            allies: false,
            enemies: true,
        }
    }

    /// Also accepts the source itself.
    #[must_use]
    pub const fn including_source(mut self) -> Self {
        self.include_source = true;
        self
    }
}

impl Default for Proximity {
    fn default() -> Self {
        Self::enemies_within(Self::DEFAULT_DISTANCE)
    }
}

/// Adds `entity` to `room` and stamps the room on the entity.
///
/// Returns `false` when the room was never generated, the entity does not
/// exist, or it already belongs to a room.
pub fn register(world: &mut World, room: &RoomKey, entity: EntityId) -> bool {
    if !world.rooms.contains(room) {
        return false;
    }
    let Some(target) = world.entities.get_mut(&entity) else {
        return false;
    };
    if let Some(current) = &target.core.room {
        if world.registry.contains(current, entity) {
            return false;
        }
    }
    if !world.registry.insert(room, entity) {
        return false;
    }
    target.core.room = Some(room.clone());
    true
}

/// Takes `entity` out of its room.
///
/// A permanent removal also hides and invalidates the entity and drops it
/// from the world. Misuse is logged and reported as `false`.
pub fn remove(
    world: &mut World,
    entity: EntityId,
    permanent: bool,
    out_events: &mut Vec<Event>,
) -> bool {
    let Some(target) = world.entities.get_mut(&entity) else {
        warn!(entity = entity.get(), "cannot remove unknown entity");
        return false;
    };
    let Some(room) = target.core.room.clone() else {
        warn!(entity = entity.get(), "cannot remove entity without a room");
        return false;
    };
    if !world.rooms.contains(&room) {
        warn!(entity = entity.get(), %room, "cannot remove entity from unregistered room");
        return false;
    }
    if !world.registry.remove(&room, entity) {
        warn!(entity = entity.get(), %room, "entity is not a member of its room");
        return false;
    }

    target.core.room = None;
    if permanent {
        target.core.visible = false;
        target.core.valid = false;
        let _ = world.entities.remove(&entity);
        out_events.push(Event::EntityRemoved { entity });
    }
    true
}

/// Copy of the membership of `room` in registration order.
#[must_use]
pub fn entities_in_room(world: &World, room: &RoomKey) -> Vec<EntityId> {
    world.registry.snapshot(room)
}

/// Resolves the allegiance of `entity`; unknown entities are unowned.
#[must_use]
pub fn allegiance(world: &World, entity: EntityId) -> Allegiance {
    world
        .entities
        .get(&entity)
        .map_or(Allegiance::Unowned, |target| target.allegiance())
}

/// Ally rule applied to two resolved allegiances.
///
/// An entity is its own ally, and so is anything it cast. Unowned
/// projectiles are hostile to everything else.
#[must_use]
pub fn allied(a: (EntityId, Allegiance), b: (EntityId, Allegiance)) -> bool {
    if a.0 == b.0 {
        return true;
    }
    match (a.1, b.1) {
        (
            Allegiance::Member {
                id: left,
                faction: left_faction,
            },
            Allegiance::Member {
                id: right,
                faction: right_faction,
            },
        ) => left == right || left_faction.allied_with(right_faction),
        _ => false,
    }
}

/// Reports whether `a` and `b` are allies. The relation is symmetric.
#[must_use]
pub fn is_ally(world: &World, a: EntityId, b: EntityId) -> bool {
    allied((a, allegiance(world, a)), (b, allegiance(world, b)))
}

/// Valid members of the source's room accepted by `filter`.
#[must_use]
pub fn nearest(world: &World, source: EntityId, filter: &Proximity) -> Vec<EntityId> {
    let Some(origin) = world.entities.get(&source) else {
        return Vec::new();
    };
    let Some(room) = &origin.core.room else {
        return Vec::new();
    };
    let origin_bounds = origin.core.body.bounds();

    world
        .registry
        .snapshot(room)
        .into_iter()
        .filter(|candidate| {
            if *candidate == source && !filter.include_source {
                return false;
            }
            let Some(other) = world.entities.get(candidate) else {
                return false;
            };
            if !other.core.valid {
                return false;
            }
            if let Some(limit) = filter.distance {
                if origin_bounds.center_distance(&other.core.body.bounds()) > limit {
                    return false;
                }
            }
            let ally = is_ally(world, source, *candidate);
            (filter.allies && ally) || (filter.enemies && !ally)
        })
        .collect()
}

/// Like [`nearest`] but ignoring distance.
#[must_use]
pub fn all(world: &World, source: EntityId, filter: &Proximity) -> Vec<EntityId> {
    let unbounded = Proximity {
        distance: None,
        ..*filter
    };
    nearest(world, source, &unbounded)
}
