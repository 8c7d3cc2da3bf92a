//! Skill definitions, the shared effect table, and per-entity ownership.
//!
//! Definitions are reference data owned by the world's [`SkillBook`]. Effects
//! are looked up by [`SkillId`] at cast time, so an entity only stores its
//! level and cooldown expiry. Effects report expected failures as
//! `Ok(false)`; an `Err` is a fault in content code that is logged at the
//! cast boundary and turned into a failed cast.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    time::Duration,
};

use prophecy_core::{CastRejection, EntityId, Event, MajorIssue, SimTime, SkillStatus};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{entity::Behavior, World};

/// Unique identifier of a skill definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkillId(u32);

impl SkillId {
    /// Creates a new skill identifier with the provided value.
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

/// Mana required to cast a skill at a given level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManaCost {
    /// Cost at level zero.
    pub base: f32,
    /// Extra cost per level.
    pub per_level: f32,
}

impl ManaCost {
    /// Cost that ignores the level.
    #[must_use]
    pub const fn flat(base: f32) -> Self {
        Self {
            base,
            per_level: 0.0,
        }
    }

    /// Cost at `level`.
    #[must_use]
    pub fn at(&self, level: u32) -> f32 {
        self.base + self.per_level * level as f32
    }
}

/// Shared description of a skill.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillDef {
    id: SkillId,
    name: String,
    max_level: u32,
    cooldown: Duration,
    mana_cost: ManaCost,
}

impl SkillDef {
    /// Identifier used by the effect table.
    #[must_use]
    pub const fn id(&self) -> SkillId {
        self.id
    }

    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highest reachable level.
    #[must_use]
    pub const fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Time between casts.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Mana cost at `level`.
    #[must_use]
    pub fn mana_cost(&self, level: u32) -> f32 {
        self.mana_cost.at(level)
    }
}

/// Value attached to a cast request.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    /// Numeric value.
    Number(f32),
    /// Free text.
    Text(String),
    /// Reference to an entity.
    Entity(EntityId),
}

/// Named values attached to a cast request.
pub type CastMetadata = BTreeMap<String, Vec<MetaValue>>;

/// Arguments passed to a skill effect.
#[derive(Clone, Debug, PartialEq)]
pub struct CastRequest {
    /// Entity casting the skill.
    pub caster: EntityId,
    /// Entities the cast is aimed at.
    pub targets: Vec<EntityId>,
    /// Level of the caster's skill.
    pub level: u32,
    /// Extra parameters.
    pub metadata: CastMetadata,
}

/// Fault raised by a skill effect.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CastFault {
    /// The caster disappeared while the effect ran.
    #[error("caster {0} no longer exists")]
    MissingCaster(u32),
    /// The effect hit an inconsistency of its own.
    #[error("{0}")]
    Content(String),
}

/// Effect callback of a skill.
pub type CastEffect = Rc<dyn Fn(&mut World, &CastRequest, &mut Vec<Event>) -> Result<bool, CastFault>>;

/// Skill definitions plus the effect table keyed by [`SkillId`].
#[derive(Clone, Default)]
pub struct SkillBook {
    definitions: Vec<SkillDef>,
    by_name: HashMap<String, SkillId>,
    effects: HashMap<SkillId, CastEffect>,
}

impl SkillBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition without an effect.
    pub fn declare(
        &mut self,
        name: &str,
        max_level: u32,
        cooldown: Duration,
        mana_cost: ManaCost,
    ) -> Result<SkillId, MajorIssue> {
        let key = name.to_ascii_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(MajorIssue::DuplicateSkill {
                skill: name.to_owned(),
            });
        }
        let id = SkillId::new(self.definitions.len() as u32);
        self.definitions.push(SkillDef {
            id,
            name: name.to_owned(),
            max_level,
            cooldown,
            mana_cost,
        });
        let _ = self.by_name.insert(key, id);
        Ok(id)
    }

    /// Routes casts of `skill` to `effect`, replacing any previous effect.
    pub fn bind<F>(&mut self, skill: SkillId, effect: F)
    where
        F: Fn(&mut World, &CastRequest, &mut Vec<Event>) -> Result<bool, CastFault> + 'static,
    {
        let _ = self.effects.insert(skill, Rc::new(effect));
    }

    /// Declares a skill and binds its effect in one step.
    pub fn register<F>(
        &mut self,
        name: &str,
        max_level: u32,
        cooldown: Duration,
        mana_cost: ManaCost,
        effect: F,
    ) -> Result<SkillId, MajorIssue>
    where
        F: Fn(&mut World, &CastRequest, &mut Vec<Event>) -> Result<bool, CastFault> + 'static,
    {
        let id = self.declare(name, max_level, cooldown, mana_cost)?;
        self.bind(id, effect);
        Ok(id)
    }

    /// Definition called `name`, ignoring case.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&SkillDef> {
        let id = self.by_name.get(&name.to_ascii_lowercase())?;
        self.definition(*id)
    }

    /// Definition with identifier `id`.
    #[must_use]
    pub fn definition(&self, id: SkillId) -> Option<&SkillDef> {
        self.definitions.get(id.get() as usize)
    }

    fn effect(&self, id: SkillId) -> Option<CastEffect> {
        self.effects.get(&id).cloned()
    }

    /// Number of declared skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Reports whether no skill is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl fmt::Debug for SkillBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillBook")
            .field("definitions", &self.definitions)
            .field("effects", &self.effects.len())
            .finish()
    }
}

/// One entity's leveled, cooldown-tracked ownership of a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySkill {
    skill: SkillId,
    level: u32,
    cooldown_until: SimTime,
}

impl EntitySkill {
    /// Creates a ready binding at `level`.
    #[must_use]
    pub const fn new(skill: SkillId, level: u32) -> Self {
        Self {
            skill,
            level,
            cooldown_until: SimTime::ZERO,
        }
    }

    /// Bound definition.
    #[must_use]
    pub const fn skill(&self) -> SkillId {
        self.skill
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Whether at least one level was learned.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.level > 0
    }

    /// Raises the level by `levels`, capped at `max_level`.
    pub fn add_levels(&mut self, levels: u32, max_level: u32) -> u32 {
        self.level = self.level.saturating_add(levels).min(max_level);
        self.level
    }

    /// Starts a cooldown of `cooldown` at `now`.
    pub fn start_cooldown(&mut self, now: SimTime, cooldown: Duration) {
        self.cooldown_until = now + cooldown;
    }

    /// Clears any running cooldown.
    pub fn refresh_cooldown(&mut self) {
        self.cooldown_until = SimTime::ZERO;
    }

    /// Reports whether the cooldown has not expired at `now`.
    #[must_use]
    pub fn is_on_cooldown(&self, now: SimTime) -> bool {
        now < self.cooldown_until
    }

    /// Cooldown left at `now`.
    #[must_use]
    pub fn cooldown_remaining(&self, now: SimTime) -> Duration {
        now.until(self.cooldown_until)
    }

    /// Readiness at `now` for a caster holding `mana` (if it uses mana).
    #[must_use]
    pub fn status(&self, now: SimTime, mana: Option<f32>, cost: f32) -> SkillStatus {
        if self.is_on_cooldown(now) {
            SkillStatus::OnCooldown
        } else if mana.is_some_and(|available| available < cost) {
            SkillStatus::MissingMana
        } else {
            SkillStatus::Ready
        }
    }
}

/// Gives `entity` the skill called `name` at `level`.
///
/// Returns `false` for unknown skills, unknown entities, or skills the
/// entity already owns.
pub fn learn(world: &mut World, entity: EntityId, name: &str, level: u32) -> bool {
    let Some(def) = world.skills.lookup(name) else {
        warn!(entity = entity.get(), skill = name, "cannot learn unknown skill");
        return false;
    };
    let binding = EntitySkill::new(def.id(), level.min(def.max_level()));
    let key = def.name().to_ascii_lowercase();
    let Some(target) = world.entities.get_mut(&entity) else {
        return false;
    };
    if target.core.skills.contains_key(&key) {
        return false;
    }
    let _ = target.core.skills.insert(key, binding);
    true
}

/// Level of the entity's skill, or zero when it does not own it.
#[must_use]
pub fn level(world: &World, entity: EntityId, name: &str) -> u32 {
    binding(world, entity, name).map_or(0, |skill| skill.level())
}

/// Raises the entity's skill by `levels`, returning the new level.
pub fn add_levels(world: &mut World, entity: EntityId, name: &str, levels: u32) -> u32 {
    let Some(max_level) = world.skills.lookup(name).map(SkillDef::max_level) else {
        return 0;
    };
    world
        .entities
        .get_mut(&entity)
        .and_then(|target| target.core.skills.get_mut(&name.to_ascii_lowercase()))
        .map_or(0, |skill| skill.add_levels(levels, max_level))
}

/// Clears the cooldown of the entity's skill.
pub fn refresh_cooldown(world: &mut World, entity: EntityId, name: &str) -> bool {
    match world
        .entities
        .get_mut(&entity)
        .and_then(|target| target.core.skills.get_mut(&name.to_ascii_lowercase()))
    {
        Some(skill) => {
            skill.refresh_cooldown();
            true
        }
        None => false,
    }
}

/// Readiness of the entity's skill, or `None` when it does not own it.
#[must_use]
pub fn status(world: &World, entity: EntityId, name: &str) -> Option<SkillStatus> {
    let skill = binding(world, entity, name)?;
    let def = world.skills.definition(skill.skill())?;
    let mana = world.entities.get(&entity)?.mana();
    Some(skill.status(world.now(), mana, def.mana_cost(skill.level())))
}

/// Cooldown left on the entity's skill.
#[must_use]
pub fn cooldown_remaining(world: &World, entity: EntityId, name: &str) -> Option<Duration> {
    binding(world, entity, name).map(|skill| skill.cooldown_remaining(world.now()))
}

/// Checks whether the entity could cast `name` right now.
///
/// The mana check only applies to casters that use mana.
#[must_use]
pub fn can_cast(
    world: &World,
    entity: EntityId,
    name: &str,
    check_cooldown: bool,
    check_mana: bool,
) -> bool {
    gate(world, entity, name, check_cooldown, check_mana).is_ok()
}

fn gate(
    world: &World,
    entity: EntityId,
    name: &str,
    check_cooldown: bool,
    check_mana: bool,
) -> Result<(), CastRejection> {
    let skill = binding(world, entity, name).ok_or(CastRejection::UnknownSkill)?;
    let def = world
        .skills
        .definition(skill.skill())
        .ok_or(CastRejection::UnknownSkill)?;
    if check_cooldown && skill.is_on_cooldown(world.now()) {
        return Err(CastRejection::OnCooldown);
    }
    let mana = world.entities.get(&entity).and_then(|caster| caster.mana());
    if check_mana && mana.is_some_and(|available| available < def.mana_cost(skill.level())) {
        return Err(CastRejection::MissingMana);
    }
    Ok(())
}

/// Casts `name` at the caster itself with no metadata.
pub fn cast(world: &mut World, entity: EntityId, name: &str, out_events: &mut Vec<Event>) -> bool {
    cast_with(world, entity, name, vec![entity], CastMetadata::new(), out_events)
}

/// Casts `name` with explicit targets and metadata.
///
/// On success the cooldown starts and mana users pay the cost.
pub fn cast_with(
    world: &mut World,
    entity: EntityId,
    name: &str,
    targets: Vec<EntityId>,
    metadata: CastMetadata,
    out_events: &mut Vec<Event>,
) -> bool {
    let reject = |reason: CastRejection, out_events: &mut Vec<Event>| {
        out_events.push(Event::SkillRejected {
            entity,
            skill: name.to_owned(),
            reason,
        });
        false
    };

    if let Err(reason) = gate(world, entity, name, true, true) {
        return reject(reason, out_events);
    }
    let alive = world
        .entities
        .get(&entity)
        .is_some_and(|caster| caster.core.valid && !caster.core.is_dead());
    if !alive {
        return reject(CastRejection::CasterDead, out_events);
    }
    let Some(skill) = binding(world, entity, name) else {
        return reject(CastRejection::UnknownSkill, out_events);
    };
    let Some(def) = world.skills.definition(skill.skill()).cloned() else {
        return reject(CastRejection::UnknownSkill, out_events);
    };
    let Some(effect) = world.skills.effect(def.id()) else {
        warn!(skill = def.name(), "no effect registered for skill");
        return reject(CastRejection::MissingEffect, out_events);
    };

    let request = CastRequest {
        caster: entity,
        targets,
        level: skill.level(),
        metadata,
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| effect(world, &request, out_events)));
    let Ok(outcome) = outcome else {
        error!(
            entity = entity.get(),
            skill = def.name(),
            level = request.level,
            "skill effect panicked"
        );
        return reject(CastRejection::Faulted, out_events);
    };
    match outcome {
        Ok(true) => {}
        Ok(false) => return reject(CastRejection::Declined, out_events),
        Err(fault) => {
            error!(
                entity = entity.get(),
                skill = def.name(),
                level = request.level,
                targets = request.targets.len(),
                %fault,
                "skill effect faulted"
            );
            return reject(CastRejection::Faulted, out_events);
        }
    }

    let now = world.now();
    if let Some(caster) = world.entities.get_mut(&entity) {
        if let Some(owned) = caster.core.skills.get_mut(&def.name().to_ascii_lowercase()) {
            owned.start_cooldown(now, def.cooldown());
        }
        if let Behavior::Player(state) = &mut caster.behavior {
            state.spend(def.mana_cost(skill.level()));
        }
    }
    debug!(entity = entity.get(), skill = def.name(), "skill cast");
    out_events.push(Event::SkillCast {
        entity,
        skill: def.name().to_owned(),
    });
    true
}

fn binding(world: &World, entity: EntityId, name: &str) -> Option<EntitySkill> {
    world
        .entities
        .get(&entity)?
        .core
        .skills
        .get(&name.to_ascii_lowercase())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_checks_cooldown_before_mana() {
        let mut skill = EntitySkill::new(SkillId::new(0), 1);
        let now = SimTime::from_millis(1_000);
        assert_eq!(skill.status(now, Some(50.0), 10.0), SkillStatus::Ready);
        assert_eq!(skill.status(now, Some(5.0), 10.0), SkillStatus::MissingMana);
        assert_eq!(skill.status(now, None, 10.0), SkillStatus::Ready);

        skill.start_cooldown(now, Duration::from_millis(500));
        assert_eq!(skill.status(now, Some(5.0), 10.0), SkillStatus::OnCooldown);
        assert_eq!(
            skill.cooldown_remaining(SimTime::from_millis(1_200)),
            Duration::from_millis(300)
        );
        assert_eq!(
            skill.status(SimTime::from_millis(1_500), Some(50.0), 10.0),
            SkillStatus::Ready
        );

        skill.start_cooldown(now, Duration::from_secs(5));
        skill.refresh_cooldown();
        assert!(!skill.is_on_cooldown(now));
    }

    #[test]
    fn levels_are_capped() {
        let mut skill = EntitySkill::new(SkillId::new(0), 0);
        assert!(!skill.is_unlocked());
        assert_eq!(skill.add_levels(2, 3), 2);
        assert_eq!(skill.add_levels(5, 3), 3);
        assert!(skill.is_unlocked());
    }

    #[test]
    fn duplicate_names_are_major_issues() {
        let mut book = SkillBook::new();
        let id = book
            .declare("Blink", 1, Duration::ZERO, ManaCost::flat(0.0))
            .expect("first declaration");
        assert_eq!(book.lookup("BLINK").map(SkillDef::id), Some(id));
        assert!(matches!(
            book.declare("blink", 1, Duration::ZERO, ManaCost::flat(0.0)),
            Err(MajorIssue::DuplicateSkill { .. })
        ));
    }

    #[test]
    fn mana_cost_scales_with_level() {
        let cost = ManaCost {
            base: 10.0,
            per_level: 2.5,
        };
        assert_eq!(cost.at(0), 10.0);
        assert_eq!(cost.at(4), 20.0);
    }
}
