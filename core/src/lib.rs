#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Prophecy simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems react to on the following frame. Read-only snapshots
//! ([`EntityView`], [`RoomView`]) are the only way systems observe the world.

mod error;
mod geometry;
pub mod motion;
mod projectile;
mod time;

use std::{collections::BTreeMap, fmt, time::Duration};

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

pub use error::MajorIssue;
pub use geometry::{Circle, Rect};
pub use motion::Body;
pub use projectile::{
    Homing, ProjectileSpec, DEFAULT_DAMAGE, DEFAULT_MAX_DURATION, DEFAULT_MAX_RANGE,
};
pub use time::{CountdownTimer, SimTime};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards every room and entity and rebuilds the session from scratch.
    Reset,
    /// Advances the simulation clock and updates every entity in the active room.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Points an entity in a new direction; zero stops it.
    Steer {
        /// Entity being steered.
        entity: EntityId,
        /// Desired direction, normalised by the world.
        direction: Vec2,
    },
    /// Requests that an entity cast one of its skills.
    CastSkill {
        /// Entity casting the skill.
        entity: EntityId,
        /// Case-insensitive skill name.
        skill: String,
    },
    /// Requests that an entity begin its basic attack.
    BeginAttack {
        /// Entity starting the attack.
        entity: EntityId,
    },
    /// Moves the player through the active room's neighbour on `side`.
    SwitchRoom {
        /// Side of the active room to leave through.
        side: Side,
    },
    /// Launches a projectile into the active room.
    SpawnProjectile {
        /// Entity credited with the projectile, if any.
        caster: Option<EntityId>,
        /// Launch parameters.
        spec: ProjectileSpec,
    },
    /// Creates an enemy from the configured template.
    SpawnEnemy {
        /// Case-insensitive room name.
        room: String,
        /// Top-left corner of the enemy's bounding box.
        origin: IVec2,
    },
    /// Creates a friendly character from the configured template.
    SpawnNpc {
        /// Case-insensitive room name.
        room: String,
        /// Top-left corner of the character's bounding box.
        origin: IVec2,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The session was rebuilt from scratch.
    WorldReset {
        /// Number of resets that preceded this one.
        replays: u32,
    },
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Clock value after the tick.
        now: SimTime,
    },
    /// An entity was created and registered.
    EntitySpawned {
        /// Identifier of the new entity.
        entity: EntityId,
        /// Kind of the new entity.
        kind: EntityKind,
        /// Room that received the entity.
        room: RoomKey,
    },
    /// A projectile was launched.
    ProjectileLaunched {
        /// Identifier of the projectile.
        projectile: EntityId,
        /// Entity credited with the projectile.
        caster: Option<EntityId>,
    },
    /// An entity was permanently removed.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// Damage was applied to a target.
    Damaged {
        /// Entity that caused the damage.
        attacker: EntityId,
        /// Entity that lost health.
        target: EntityId,
        /// Health removed.
        amount: f32,
        /// Health left after the hit.
        remaining: f32,
    },
    /// An entity ran out of health and began dying.
    EntityDied {
        /// Identifier of the dying entity.
        entity: EntityId,
        /// Kind of the dying entity.
        kind: EntityKind,
    },
    /// A status effect was attached.
    StatusGained {
        /// Entity carrying the status.
        entity: EntityId,
        /// Status that was attached.
        status: StatusKind,
    },
    /// A status effect ran out.
    StatusExpired {
        /// Entity that carried the status.
        entity: EntityId,
        /// Status that expired.
        status: StatusKind,
    },
    /// A skill was cast successfully.
    SkillCast {
        /// Caster.
        entity: EntityId,
        /// Canonical skill name.
        skill: String,
    },
    /// A skill cast was refused or failed.
    SkillRejected {
        /// Caster.
        entity: EntityId,
        /// Requested skill name.
        skill: String,
        /// Why the cast did not happen.
        reason: CastRejection,
    },
    /// An entity began its basic attack.
    AttackStarted {
        /// Attacker.
        entity: EntityId,
    },
    /// A projectile struck one or more targets.
    ProjectileHit {
        /// Projectile that hit.
        projectile: EntityId,
        /// Every target damaged by the hit.
        targets: Vec<EntityId>,
    },
    /// A projectile reached the end of its life.
    ProjectileEnded {
        /// Projectile that ended.
        projectile: EntityId,
    },
    /// The player entered a room.
    RoomEntered {
        /// Room that became active.
        room: RoomKey,
    },
    /// The session was won or lost.
    OutcomeDecided {
        /// Final result.
        outcome: Outcome,
    },
}

/// Unique identifier assigned to every entity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Case-insensitive room name used as a lookup key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomKey(String);

impl RoomKey {
    /// Folds `name` into a key.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    /// Folded name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concrete behaviour category of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player-controlled hero.
    Player,
    /// A regular hostile creature.
    Enemy,
    /// A stationary boss that attacks through scheduled volleys.
    Boss,
    /// A friendly non-player character.
    Npc,
    /// A self-terminating attack object.
    Projectile,
}

impl EntityKind {
    /// Faction of the kind; projectiles borrow the faction of their caster.
    #[must_use]
    pub const fn faction(&self) -> Option<Faction> {
        match self {
            Self::Player => Some(Faction::Player),
            Self::Enemy | Self::Boss => Some(Faction::Enemy),
            Self::Npc => Some(Faction::Npc),
            Self::Projectile => None,
        }
    }
}

/// Side of the ally table an entity sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Faction {
    /// The player.
    Player,
    /// Enemies and bosses.
    Enemy,
    /// Friendly characters.
    Npc,
}

impl Faction {
    /// Reports whether members of the two factions are allies.
    #[must_use]
    pub const fn allied_with(self, other: Faction) -> bool {
        !matches!(
            (self, other),
            (Faction::Player, Faction::Enemy)
                | (Faction::Enemy, Faction::Player)
                | (Faction::Enemy, Faction::Npc)
                | (Faction::Npc, Faction::Enemy)
        )
    }
}

/// Named numeric attributes carried by entities.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    /// Damage dealt by basic attacks and melee skills.
    Attack,
    /// Lower bound of randomised attacks.
    MinAttack,
    /// Upper bound of randomised attacks.
    MaxAttack,
    /// Flat damage reduction.
    Defense,
    /// Reach of basic attacks in pixels.
    AttackRange,
    /// Distance at which enemies start chasing.
    FollowRange,
}

/// Timed modifiers that can be attached to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Damage is ignored while active.
    Invincible,
}

/// Readiness of a skill owned by an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkillStatus {
    /// The skill may be cast.
    Ready,
    /// The cooldown has not expired yet.
    OnCooldown,
    /// The caster cannot afford the mana cost.
    MissingMana,
}

/// Reason a skill cast did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastRejection {
    /// The caster does not own the skill.
    UnknownSkill,
    /// The skill is cooling down.
    OnCooldown,
    /// The caster cannot afford the mana cost.
    MissingMana,
    /// The caster is dead or no longer valid.
    CasterDead,
    /// No effect is registered for the skill.
    MissingEffect,
    /// The effect declined to run, for example for lack of a direction.
    Declined,
    /// The effect raised a fault that was caught and logged.
    Faulted,
}

/// Direction of a room neighbour or door.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// West.
    Left,
    /// East.
    Right,
    /// North.
    Top,
    /// South.
    Bottom,
}

impl Side {
    /// Every side in declaration order.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Side facing this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

/// Terrain category of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Impassable wall.
    Wall,
    /// Walkable floor.
    Floor,
    /// Passage to the neighbour on the given side.
    Door(Side),
}

/// Final result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The boss was defeated.
    Victory,
    /// The player was defeated.
    Defeat,
}

/// Sprite cell currently displayed by an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteFrame {
    /// Sheet the frame is cut from.
    pub sheet: String,
    /// Name of the playing animation.
    pub animation: String,
    /// Source rectangle on the sheet.
    pub source: Rect,
    /// Whether the frame faces left and must be mirrored.
    pub flip_horizontal: bool,
}

/// Immutable representation of a single entity used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Behaviour category.
    pub kind: EntityKind,
    /// Room holding the entity.
    pub room: Option<RoomKey>,
    /// Current bounding box.
    pub bounds: Rect,
    /// Current unit direction or zero.
    pub direction: Vec2,
    /// Current scalar speed.
    pub speed: f32,
    /// Remaining health.
    pub health: f32,
    /// Health ceiling.
    pub max_health: f32,
    /// Mana for casters that use it.
    pub mana: Option<f32>,
    /// Whether the entity still takes part in updates.
    pub valid: bool,
    /// Whether the entity should be drawn.
    pub visible: bool,
    /// Name of the active action state.
    pub action: Option<String>,
    /// Numeric attributes.
    pub stats: BTreeMap<Stat, f32>,
    /// Sprite cell currently displayed.
    pub frame: Option<SpriteFrame>,
}

impl EntitySnapshot {
    /// Value of `stat`, if the entity carries it.
    #[must_use]
    pub fn stat(&self, stat: Stat) -> Option<f32> {
        self.stats.get(&stat).copied()
    }

    /// Reports whether the active action state carries `name`.
    #[must_use]
    pub fn is_acting(&self, name: &str) -> bool {
        self.action
            .as_deref()
            .is_some_and(|action| action.eq_ignore_ascii_case(name))
    }
}

/// Read-only snapshot describing the entities of one room.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a view from snapshots, ordering them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshots of the given kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter().filter(move |s| s.kind == kind)
    }

    /// Snapshot of the given entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// Snapshot of the player, when present.
    #[must_use]
    pub fn player(&self) -> Option<&EntitySnapshot> {
        self.of_kind(EntityKind::Player).next()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSnapshot {
    /// Column and row inside the room.
    pub coord: IVec2,
    /// Terrain category.
    pub kind: TileKind,
    /// Area covered by the tile in world space.
    pub bounds: Rect,
    /// Whether entities may stand on the tile.
    pub passable: bool,
    /// Room reached through the tile when it is a connected door.
    pub leads_to: Option<RoomKey>,
}

/// Read-only snapshot of a room and its tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomView {
    /// Display name.
    pub name: String,
    /// Lookup key.
    pub key: RoomKey,
    /// Area covered by the room in world space.
    pub bounds: Rect,
    /// Width and height in tiles.
    pub dimensions: (u32, u32),
    /// Tiles ordered row by row.
    pub tiles: Vec<TileSnapshot>,
}
