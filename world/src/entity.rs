//! Entity records: the shared core plus kind-specific behaviour.

use std::collections::BTreeMap;

use prophecy_core::{
    Body, EntityId, EntityKind, EntitySnapshot, Faction, RoomKey, SimTime, Stat,
};

use crate::{
    actions::ActionState, animation::Animator, projectile::{Flight, Steering}, skills::EntitySkill,
    status::StatusSet,
};

/// State shared by every simulated actor.
#[derive(Debug)]
pub(crate) struct EntityCore {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) body: Body,
    pub(crate) base_speed: f32,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) stats: BTreeMap<Stat, f32>,
    pub(crate) skills: BTreeMap<String, EntitySkill>,
    pub(crate) statuses: StatusSet,
    pub(crate) action: Option<ActionState>,
    pub(crate) animator: Animator,
    pub(crate) boost_until: Option<SimTime>,
    pub(crate) valid: bool,
    pub(crate) visible: bool,
    pub(crate) room: Option<RoomKey>,
}

impl EntityCore {
    pub(crate) fn new(id: EntityId, name: String, body: Body, health: f32) -> Self {
        let health = health.max(0.0);
        Self {
            id,
            name,
            base_speed: body.speed(),
            body,
            health,
            max_health: health,
            stats: BTreeMap::new(),
            skills: BTreeMap::new(),
            statuses: StatusSet::default(),
            action: None,
            animator: Animator::detached(),
            boost_until: None,
            valid: true,
            visible: true,
            room: None,
        }
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub(crate) fn stat(&self, stat: Stat) -> Option<f32> {
        self.stats.get(&stat).copied()
    }

    /// Lowers health without letting it drop below zero.
    pub(crate) fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).clamp(0.0, self.max_health);
    }

    pub(crate) fn is_acting(&self, name: &str) -> bool {
        self.action.as_ref().is_some_and(|state| state.is(name))
    }
}

/// Player-only resources.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlayerState {
    pub(crate) mana: f32,
    pub(crate) max_mana: f32,
    pub(crate) mana_regen: f32,
}

impl PlayerState {
    pub(crate) fn regenerate(&mut self, seconds: f32) {
        self.mana = (self.mana + self.mana_regen * seconds).clamp(0.0, self.max_mana);
    }

    pub(crate) fn spend(&mut self, cost: f32) {
        self.mana = (self.mana - cost).clamp(0.0, self.max_mana);
    }
}

/// Kind-specific state, dispatched by the tick loop.
#[derive(Debug)]
pub(crate) enum Behavior {
    Player(PlayerState),
    Enemy,
    Npc,
    Boss,
    Projectile(Flight),
    HomingProjectile(Flight, Steering),
}

impl Behavior {
    pub(crate) fn kind(&self) -> EntityKind {
        match self {
            Behavior::Player(_) => EntityKind::Player,
            Behavior::Enemy => EntityKind::Enemy,
            Behavior::Npc => EntityKind::Npc,
            Behavior::Boss => EntityKind::Boss,
            Behavior::Projectile(_) | Behavior::HomingProjectile(..) => EntityKind::Projectile,
        }
    }
}

/// Faction an entity answers to when allies are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Allegiance {
    /// Represents `id`, fighting for `faction`.
    Member {
        /// Entity the allegiance resolves to.
        id: EntityId,
        /// Faction of that entity.
        faction: Faction,
    },
    /// Projectile without a caster; hostile to everyone but itself.
    Unowned,
}

#[derive(Debug)]
pub(crate) struct Entity {
    pub(crate) core: EntityCore,
    pub(crate) behavior: Behavior,
}

impl Entity {
    pub(crate) fn kind(&self) -> EntityKind {
        self.behavior.kind()
    }

    pub(crate) fn allegiance(&self) -> Allegiance {
        match &self.behavior {
            Behavior::Projectile(flight) | Behavior::HomingProjectile(flight, _) => match flight.caster {
                Some((id, faction)) => Allegiance::Member { id, faction },
                None => Allegiance::Unowned,
            },
            other => match other.kind().faction() {
                Some(faction) => Allegiance::Member {
                    id: self.core.id,
                    faction,
                },
                None => Allegiance::Unowned,
            },
        }
    }

    pub(crate) fn flight(&self) -> Option<&Flight> {
        match &self.behavior {
            Behavior::Projectile(flight) | Behavior::HomingProjectile(flight, _) => Some(flight),
            _ => None,
        }
    }

    pub(crate) fn mana(&self) -> Option<f32> {
        match &self.behavior {
            Behavior::Player(state) => Some(state.mana),
            _ => None,
        }
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        let core = &self.core;
        EntitySnapshot {
            id: core.id,
            name: core.name.clone(),
            kind: self.kind(),
            room: core.room.clone(),
            bounds: core.body.bounds(),
            direction: core.body.direction(),
            speed: core.body.speed(),
            health: core.health,
            max_health: core.max_health,
            mana: self.mana(),
            valid: core.valid,
            visible: core.visible,
            action: core.action.as_ref().map(|state| state.name().to_owned()),
            stats: core.stats.clone(),
            frame: core.animator.frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prophecy_core::Rect;

    #[test]
    fn health_never_drops_below_zero() {
        let mut core = EntityCore::new(
            EntityId::new(1),
            "Dummy".to_owned(),
            Body::new(Rect::new(0, 0, 8, 8), 1.0),
            30.0,
        );
        core.take_damage(12.5);
        assert_eq!(core.health, 17.5);
        assert!(!core.is_dead());
        core.take_damage(100.0);
        assert_eq!(core.health, 0.0);
        assert!(core.is_dead());
    }

    #[test]
    fn mana_stays_within_bounds() {
        let mut state = PlayerState {
            mana: 95.0,
            max_mana: 100.0,
            mana_regen: 10.0,
        };
        state.regenerate(1.0);
        assert_eq!(state.mana, 100.0);
        state.spend(130.0);
        assert_eq!(state.mana, 0.0);
    }
}
