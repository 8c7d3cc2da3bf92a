#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Prophecy simulation.
//!
//! The world owns every room, entity, skill definition and animation set.
//! It mutates only through [`apply`], reports what happened as
//! [`Event`](prophecy_core::Event) values, and exposes read-only state
//! through [`query`].

pub mod actions;
pub mod animation;
mod catalog;
pub mod combat;
mod config;
mod entity;
pub mod projectile;
pub mod registry;
pub mod room;
mod session;
pub mod skills;
mod status;
mod tick;

use std::{collections::BTreeMap, fmt};

use prophecy_core::{Command, EntityId, Event, MajorIssue, Outcome, Rect, RoomKey, SimTime};
use tracing::warn;

pub use animation::{AnimationConfigDefect, AnimationLibrary};
pub use config::{AttackTiming, EntityTemplate, ManaConfig, WorldConfig};
pub use entity::Allegiance;
pub use room::{DirectoryRooms, MemoryRooms, RoomConfigError, RoomSource};
pub use skills::{CastFault, SkillBook};

use entity::Entity;
use registry::EntityRegistry;
use room::RoomTable;

/// Represents the authoritative Prophecy world state.
pub struct World {
    config: WorldConfig,
    clock: SimTime,
    rooms: RoomTable,
    room_source: Box<dyn RoomSource>,
    animations: AnimationLibrary,
    skills: SkillBook,
    registry: EntityRegistry,
    entities: BTreeMap<EntityId, Entity>,
    next_entity: u32,
    current_room: Option<RoomKey>,
    player: Option<EntityId>,
    boss: Option<EntityId>,
    resets: u32,
    outcome: Option<Outcome>,
}

impl World {
    /// Creates an empty world; submit [`Command::Reset`] to build a session.
    ///
    /// The built-in skills are registered immediately.
    pub fn new(
        config: WorldConfig,
        rooms: impl RoomSource + 'static,
        animations: AnimationLibrary,
    ) -> Result<Self, MajorIssue> {
        let viewport = glam::IVec2::new(config.viewport[0], config.viewport[1]);
        Ok(Self {
            rooms: RoomTable::new(config.tile_size, viewport),
            config,
            clock: SimTime::ZERO,
            room_source: Box::new(rooms),
            animations,
            skills: catalog::standard()?,
            registry: EntityRegistry::default(),
            entities: BTreeMap::new(),
            next_entity: 0,
            current_room: None,
            player: None,
            boss: None,
            resets: 0,
            outcome: None,
        })
    }

    /// Skill definitions, for registering additional skills.
    pub fn skill_book_mut(&mut self) -> &mut SkillBook {
        &mut self.skills
    }

    fn now(&self) -> SimTime {
        self.clock
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_entity = self.next_entity.saturating_add(1);
        EntityId::new(self.next_entity)
    }

    fn room_bounds_of(&self, id: EntityId) -> Option<Rect> {
        let room = self.entity(id)?.core.room.as_ref()?;
        self.rooms.get(room).map(room::Room::bounds)
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("clock", &self.clock)
            .field("rooms", &self.rooms.len())
            .field("entities", &self.entities.len())
            .field("current_room", &self.current_room)
            .field("player", &self.player)
            .field("boss", &self.boss)
            .field("resets", &self.resets)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Gameplay failures surface as events; only world-breaking faults are
/// returned as errors.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), MajorIssue> {
    match command {
        Command::Reset => session::reset(world, out_events)?,
        Command::Tick { dt } => tick::advance(world, dt, out_events),
        Command::Steer { entity, direction } => {
            if let Some(target) = world.entity_mut(entity).filter(|target| target.core.valid) {
                let _ = target.core.body.set_direction(direction);
            }
        }
        Command::CastSkill { entity, skill } => {
            let _ = skills::cast(world, entity, &skill, out_events);
        }
        Command::BeginAttack { entity } => {
            let _ = combat::begin_attack(world, entity, out_events);
        }
        Command::SwitchRoom { side } => {
            if !session::switch_room(world, side, out_events) {
                warn!(?side, "no room to switch to");
            }
        }
        Command::SpawnProjectile { caster, spec } => {
            let _ = projectile::launch(world, caster, spec, out_events);
        }
        Command::SpawnEnemy { room, origin } => {
            let _ = session::spawn_enemy(world, &room, origin, out_events)?;
        }
        Command::SpawnNpc { room, origin } => {
            let _ = session::spawn_npc(world, &room, origin, out_events)?;
        }
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use prophecy_core::{
        EntityId, EntitySnapshot, EntityView, Outcome, RoomKey, RoomView, SimTime, SkillStatus,
        StatusKind,
    };

    use super::{combat, registry, room::Room, skills, Allegiance, World};

    /// Current simulated time.
    #[must_use]
    pub fn now(world: &World) -> SimTime {
        world.now()
    }

    /// Result of the session once it has been decided.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Number of resets that preceded the running session.
    #[must_use]
    pub fn replays(world: &World) -> u32 {
        world.resets.saturating_sub(1)
    }

    /// Room the player is in.
    #[must_use]
    pub fn current_room(world: &World) -> Option<&RoomKey> {
        world.current_room.as_ref()
    }

    /// Room stored under `key`.
    #[must_use]
    pub fn room<'a>(world: &'a World, key: &RoomKey) -> Option<&'a Room> {
        world.rooms.get(key)
    }

    /// Number of generated rooms.
    #[must_use]
    pub fn room_count(world: &World) -> usize {
        world.rooms.len()
    }

    /// Read-only view of the active room.
    #[must_use]
    pub fn room_view(world: &World) -> Option<RoomView> {
        let key = world.current_room.as_ref()?;
        world.rooms.get(key).map(Room::view)
    }

    /// Snapshots of every member of the active room.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let snapshots = world
            .current_room
            .as_ref()
            .map(|room| {
                registry::entities_in_room(world, room)
                    .into_iter()
                    .filter_map(|id| world.entity(id).map(|entity| entity.snapshot()))
                    .collect()
            })
            .unwrap_or_default();
        EntityView::from_snapshots(snapshots)
    }

    /// Snapshot of one entity, wherever it is.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world.entity(id).map(|entity| entity.snapshot())
    }

    /// Number of entities the world holds across all rooms.
    #[must_use]
    pub fn entity_count(world: &World) -> usize {
        world.entities.len()
    }

    /// The player of the running session.
    #[must_use]
    pub fn player(world: &World) -> Option<EntityId> {
        world.player
    }

    /// The boss of the running session.
    #[must_use]
    pub fn boss(world: &World) -> Option<EntityId> {
        world.boss
    }

    /// Side `entity` fights for.
    #[must_use]
    pub fn allegiance(world: &World, entity: EntityId) -> Allegiance {
        registry::allegiance(world, entity)
    }

    /// Reports whether `a` and `b` are allies.
    #[must_use]
    pub fn is_ally(world: &World, a: EntityId, b: EntityId) -> bool {
        registry::is_ally(world, a, b)
    }

    /// Readiness of the entity's skill.
    #[must_use]
    pub fn skill_status(world: &World, entity: EntityId, skill: &str) -> Option<SkillStatus> {
        skills::status(world, entity, skill)
    }

    /// Reports whether the entity could cast `skill` right now.
    #[must_use]
    pub fn can_cast(world: &World, entity: EntityId, skill: &str) -> bool {
        skills::can_cast(world, entity, skill, true, true)
    }

    /// Level of the entity's skill.
    #[must_use]
    pub fn skill_level(world: &World, entity: EntityId, skill: &str) -> u32 {
        skills::level(world, entity, skill)
    }

    /// Reports whether `entity` holds `status`.
    #[must_use]
    pub fn has_status(world: &World, entity: EntityId, status: StatusKind) -> bool {
        combat::has_status(world, entity, status)
    }

    /// Time left on the entity's `status`.
    #[must_use]
    pub fn status_time_left(world: &World, entity: EntityId, status: StatusKind) -> Option<Duration> {
        combat::status_time_left(world, entity, status)
    }

    /// Name of the entity's action state.
    #[must_use]
    pub fn action_name(world: &World, entity: EntityId) -> Option<String> {
        world
            .entity(entity)?
            .core
            .action
            .as_ref()
            .map(|state| state.name().to_owned())
    }
}
