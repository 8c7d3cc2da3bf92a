//! Tunables of a world session.

use std::collections::BTreeMap;

use prophecy_core::Stat;
use serde::Deserialize;

/// Parameters that shape every session built by the world.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Window size rooms are centred in.
    pub viewport: [i32; 2],
    /// Side length of a tile in pixels.
    pub tile_size: i32,
    /// Room generated first; its neighbours follow recursively.
    pub start_room: String,
    /// Room the player starts in, when it was generated.
    pub entry_room: Option<String>,
    /// Room the boss is spawned in.
    pub boss_room: Option<String>,
    /// Template of the player.
    pub player: EntityTemplate,
    /// Template of every regular enemy.
    pub enemy: EntityTemplate,
    /// Template of the boss.
    pub boss: EntityTemplate,
    /// Template of friendly characters.
    pub npc: EntityTemplate,
    /// Player mana pool.
    pub mana: ManaConfig,
    /// Attack stat gained by the player per completed reset.
    pub attack_bonus_per_replay: f32,
    /// Basic attack timings.
    pub attacks: AttackTiming,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            viewport: [1920, 1080],
            tile_size: 64,
            start_room: "MainHallV1".to_owned(),
            entry_room: Some("BossRoom".to_owned()),
            boss_room: Some("BossRoom".to_owned()),
            player: EntityTemplate::player(),
            enemy: EntityTemplate::enemy(),
            boss: EntityTemplate::boss(),
            npc: EntityTemplate::npc(),
            mana: ManaConfig::default(),
            attack_bonus_per_replay: 5.0,
            attacks: AttackTiming::default(),
        }
    }
}

/// Initial parameters of a living entity.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntityTemplate {
    /// Display name.
    pub name: String,
    /// Width of the bounding box.
    pub width: i32,
    /// Height of the bounding box.
    pub height: i32,
    /// Speed in pixels per tick.
    pub base_speed: f32,
    /// Starting and maximum health.
    pub health: f32,
    /// Named stats.
    pub stats: BTreeMap<Stat, f32>,
    /// Sprite sheet holding the entity's animations.
    pub sheet: Option<String>,
    /// Animation played when nothing else is.
    pub default_animation: String,
    /// Skills learned at level one.
    pub skills: Vec<String>,
}

impl Default for EntityTemplate {
    fn default() -> Self {
        Self {
            name: "Unnamed".to_owned(),
            width: 64,
            height: 64,
            base_speed: 0.0,
            health: 1.0,
            stats: BTreeMap::new(),
            sheet: None,
            default_animation: "Stand".to_owned(),
            skills: Vec::new(),
        }
    }
}

impl EntityTemplate {
    /// Servion, the player character.
    #[must_use]
    pub fn player() -> Self {
        Self {
            name: "Servion".to_owned(),
            width: 88,
            height: 144,
            base_speed: 7.5,
            health: 100.0,
            stats: BTreeMap::from([(Stat::Attack, 20.0), (Stat::AttackRange, 180.0)]),
            sheet: Some("Servion".to_owned()),
            skills: vec!["Dash".to_owned(), "Strike".to_owned()],
            ..Self::default()
        }
    }

    /// The wandering old man enemy.
    #[must_use]
    pub fn enemy() -> Self {
        Self {
            name: "OldMan".to_owned(),
            width: 72,
            height: 120,
            base_speed: 4.0,
            health: 30.0,
            stats: BTreeMap::from([
                (Stat::Attack, 10.0),
                (Stat::FollowRange, 512.0),
                (Stat::AttackRange, 100.0),
            ]),
            sheet: Some("OldMan".to_owned()),
            ..Self::default()
        }
    }

    /// A friendly villager; carries no sprite sheet by default.
    #[must_use]
    pub fn npc() -> Self {
        Self {
            name: "Villager".to_owned(),
            width: 64,
            height: 112,
            base_speed: 3.0,
            health: 40.0,
            ..Self::default()
        }
    }

    /// Runevark, the boss.
    #[must_use]
    pub fn boss() -> Self {
        Self {
            name: "Runevark".to_owned(),
            width: 180,
            height: 432,
            base_speed: 0.0,
            health: 500.0,
            stats: BTreeMap::from([(Stat::Attack, 10.0)]),
            sheet: Some("Runevark".to_owned()),
            ..Self::default()
        }
    }
}

/// Mana pool of the player.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ManaConfig {
    /// Maximum and starting mana.
    pub max: f32,
    /// Mana regained per second.
    pub regen_per_second: f32,
}

impl Default for ManaConfig {
    fn default() -> Self {
        Self {
            max: 100.0,
            regen_per_second: 10.0,
        }
    }
}

/// Basic attack timings.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttackTiming {
    /// Delay between the player's swing and its damage.
    pub player_windup_ms: u64,
    /// Reach of the player's swing when it has no `AttackRange` stat.
    pub player_reach: f32,
    /// Time an enemy waits after striking.
    pub enemy_recovery_ms: u64,
}

impl Default for AttackTiming {
    fn default() -> Self {
        Self {
            player_windup_ms: 500,
            player_reach: 180.0,
            enemy_recovery_ms: 1250,
        }
    }
}
