//! Self-terminating attack objects with travel and lifetime budgets.
//!
//! A projectile moves without bounds correction: leaving its room, running
//! out of range or time, or striking anything hostile ends it. On a hit every
//! colliding target is damaged in the same tick and the projectile is
//! consumed.

use std::{fmt, time::Duration};

use glam::Vec2;
use prophecy_core::{
    Body, Circle, EntityId, EntityKind, Event, Faction, ProjectileSpec, Rect, SimTime,
};
use tracing::{debug, warn};

use crate::{
    animation::Animator,
    combat,
    entity::{Allegiance, Behavior, Entity, EntityCore},
    registry::{self, Proximity},
    World,
};

/// Turning weight per second of simulated time for homing projectiles.
pub const HOMING_WEIGHT: f32 = 300.0;

/// Callback fired when a projectile hits or ends.
pub type ProjectileHook = Box<dyn FnMut(&mut World, EntityId, &mut Vec<Event>)>;

/// Budget and payload of a projectile in flight.
pub struct Flight {
    pub(crate) caster: Option<(EntityId, Faction)>,
    acceleration: f32,
    radius: f32,
    damage: f32,
    travelled: f32,
    elapsed: Duration,
    max_range: f32,
    max_duration: Duration,
    on_hit: Vec<ProjectileHook>,
    on_end: Vec<ProjectileHook>,
}

impl Flight {
    /// Entity and faction the projectile fights for.
    #[must_use]
    pub const fn caster(&self) -> Option<(EntityId, Faction)> {
        self.caster
    }

    /// Radius of the circular hit area.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Damage dealt to every target of a hit.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Distance covered so far.
    #[must_use]
    pub const fn travelled(&self) -> f32 {
        self.travelled
    }

    /// Time spent in flight so far.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn exhausted(&self) -> bool {
        self.travelled > self.max_range || self.elapsed > self.max_duration
    }
}

impl fmt::Debug for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flight")
            .field("caster", &self.caster)
            .field("radius", &self.radius)
            .field("damage", &self.damage)
            .field("travelled", &self.travelled)
            .field("elapsed", &self.elapsed)
            .field("on_hit", &self.on_hit.len())
            .field("on_end", &self.on_end.len())
            .finish_non_exhaustive()
    }
}

/// Direction blending of a homing projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Steering {
    inertia: f32,
    target: Option<EntityId>,
    pending: Option<(SimTime, EntityId)>,
}

impl Steering {
    /// Weight of the current direction; higher turns slower.
    #[must_use]
    pub const fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Entity currently chased.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }
}

fn flight_mut(behavior: &mut Behavior) -> Option<&mut Flight> {
    match behavior {
        Behavior::Projectile(flight) | Behavior::HomingProjectile(flight, _) => Some(flight),
        _ => None,
    }
}

/// Launches a projectile into the caster's room, or the active room when
/// there is no caster.
///
/// An aimed projectile starts pointing at its target. Returns `None` when
/// there is no room to launch into.
pub fn launch(
    world: &mut World,
    caster: Option<EntityId>,
    spec: ProjectileSpec,
    out_events: &mut Vec<Event>,
) -> Option<EntityId> {
    let source = caster.and_then(|id| world.entity(id));
    let room = source
        .and_then(|entity| entity.core.room.clone())
        .or_else(|| world.current_room.clone());
    let Some(room) = room else {
        warn!(projectile = spec.name.as_str(), "no room to launch projectile into");
        return None;
    };
    let side = source.and_then(|entity| match entity.allegiance() {
        Allegiance::Member { id, faction } => Some((id, faction)),
        Allegiance::Unowned => None,
    });

    let direction = match spec.aim_at.and_then(|target| world.entity(target)) {
        Some(target) => target.core.body.bounds().center() - spec.bounds.center(),
        None => spec.direction,
    };
    let mut body = Body::new(spec.bounds, spec.speed);
    let _ = body.set_direction(direction);

    let animator = projectile_animator(world, &spec);
    let id = world.allocate_id();
    let mut core = EntityCore::new(id, spec.name.clone(), body, 1.0);
    core.animator = animator;

    let flight = Flight {
        caster: side,
        acceleration: spec.acceleration,
        radius: spec.radius.unwrap_or_else(|| spec.bounds.diagonal() / 2.0),
        damage: spec.damage,
        travelled: 0.0,
        elapsed: Duration::ZERO,
        max_range: spec.max_range,
        max_duration: spec.max_duration,
        on_hit: Vec::new(),
        on_end: Vec::new(),
    };
    let behavior = match spec.homing {
        Some(homing) => {
            let now = world.now();
            let (target, pending) = match homing.target {
                Some(target) if homing.acquire_after > Duration::ZERO => {
                    (None, Some((now + homing.acquire_after, target)))
                }
                other => (other, None),
            };
            Behavior::HomingProjectile(
                flight,
                Steering {
                    inertia: homing.inertia,
                    target,
                    pending,
                },
            )
        }
        None => Behavior::Projectile(flight),
    };

    let _ = world.entities.insert(id, Entity { core, behavior });
    if !registry::register(world, &room, id) {
        let _ = world.entities.remove(&id);
        warn!(projectile = spec.name.as_str(), %room, "projectile could not join its room");
        return None;
    }
    debug!(projectile = id.get(), name = spec.name.as_str(), %room, "projectile launched");
    out_events.push(Event::EntitySpawned {
        entity: id,
        kind: EntityKind::Projectile,
        room,
    });
    out_events.push(Event::ProjectileLaunched {
        projectile: id,
        caster,
    });
    Some(id)
}

fn projectile_animator(world: &World, spec: &ProjectileSpec) -> Animator {
    let Some(sheet) = &spec.sheet else {
        return Animator::detached();
    };
    let Some(set) = world.animations.get(sheet) else {
        warn!(projectile = spec.name.as_str(), sheet = sheet.as_str(), "projectile sheet not loaded");
        return Animator::detached();
    };
    let Some(first) = set.clip_at(0).map(|clip| clip.name().to_owned()) else {
        return Animator::detached();
    };
    Animator::new(set, &first).unwrap_or_else(|issue| {
        warn!(projectile = spec.name.as_str(), %issue, "projectile animation unavailable");
        Animator::detached()
    })
}

/// Registers a callback fired when the projectile hits something.
pub fn on_hit<F>(world: &mut World, projectile: EntityId, hook: F) -> bool
where
    F: FnMut(&mut World, EntityId, &mut Vec<Event>) + 'static,
{
    match world
        .entity_mut(projectile)
        .and_then(|entity| flight_mut(&mut entity.behavior))
    {
        Some(flight) => {
            flight.on_hit.push(Box::new(hook));
            true
        }
        None => false,
    }
}

/// Registers a callback fired when the projectile ends for any reason.
pub fn on_end<F>(world: &mut World, projectile: EntityId, hook: F) -> bool
where
    F: FnMut(&mut World, EntityId, &mut Vec<Event>) + 'static,
{
    match world
        .entity_mut(projectile)
        .and_then(|entity| flight_mut(&mut entity.behavior))
    {
        Some(flight) => {
            flight.on_end.push(Box::new(hook));
            true
        }
        None => false,
    }
}

/// Points a homing projectile at a new target, or at nothing.
pub fn retarget(world: &mut World, projectile: EntityId, target: Option<EntityId>) -> bool {
    match world.entity_mut(projectile).map(|entity| &mut entity.behavior) {
        Some(Behavior::HomingProjectile(_, steering)) => {
            steering.target = target;
            steering.pending = None;
            true
        }
        _ => false,
    }
}

/// Advances one projectile by a tick.
pub(crate) fn update(
    world: &mut World,
    projectile: EntityId,
    dt: Duration,
    out_events: &mut Vec<Event>,
) {
    let Some(room_bounds) = world.room_bounds_of(projectile) else {
        return;
    };
    let Some(entity) = world.entity_mut(projectile) else {
        return;
    };
    if !entity.core.valid {
        return;
    }
    let inside = entity.core.body.move_unbounded(&room_bounds);
    let displacement = entity.core.body.last_displacement();
    let center = entity.core.body.bounds().center();
    let Some(flight) = flight_mut(&mut entity.behavior) else {
        return;
    };
    if !inside {
        end(world, projectile, out_events);
        return;
    }
    flight.travelled += displacement;
    flight.elapsed += dt;
    if flight.exhausted() {
        end(world, projectile, out_events);
        return;
    }
    let hit_area = Circle::new(center, flight.radius);
    let damage = flight.damage;

    let targets = colliding(world, projectile, &hit_area);
    if !targets.is_empty() {
        let _ = combat::damage(world, projectile, &targets, damage, out_events);
        out_events.push(Event::ProjectileHit {
            projectile,
            targets,
        });
        let hooks = world
            .entity_mut(projectile)
            .and_then(|entity| flight_mut(&mut entity.behavior))
            .map(|flight| std::mem::take(&mut flight.on_hit))
            .unwrap_or_default();
        run_hooks(world, projectile, hooks, out_events);
        end(world, projectile, out_events);
        return;
    }

    steer(world, projectile, dt);
}

fn colliding(world: &World, projectile: EntityId, hit_area: &Circle) -> Vec<EntityId> {
    registry::all(world, projectile, &Proximity::all_enemies())
        .into_iter()
        .filter(|candidate| {
            world.entity(*candidate).is_some_and(|target| {
                target.kind() != EntityKind::Projectile
                    && hit_area.intersects_rect(&target.core.body.bounds())
            })
        })
        .collect()
}

fn steer(world: &mut World, projectile: EntityId, dt: Duration) {
    let now = world.now();
    let chased = match world.entity(projectile).map(|entity| &entity.behavior) {
        Some(Behavior::HomingProjectile(_, steering)) => match steering.pending {
            Some((at, target)) if now >= at => Some(target),
            Some(_) => None,
            None => steering.target,
        },
        _ => None,
    };
    let goal = chased
        .and_then(|target| world.entity(target))
        .filter(|target| target.core.valid)
        .map(|target| target.core.body.bounds());

    let Some(entity) = world.entity_mut(projectile) else {
        return;
    };
    let origin = entity.core.body.bounds();
    match &mut entity.behavior {
        Behavior::Projectile(flight) => accelerate(&mut entity.core.body, flight),
        Behavior::HomingProjectile(flight, steering) => {
            accelerate(&mut entity.core.body, flight);
            if let Some(target) = chased {
                steering.target = Some(target);
                steering.pending = None;
            }
            if let Some(goal) = goal {
                let _ = entity.core.body.set_direction(blend(
                    entity.core.body.direction(),
                    &origin,
                    &goal,
                    steering.inertia,
                    dt,
                ));
            }
        }
        _ => {}
    }
}

fn accelerate(body: &mut Body, flight: &Flight) {
    body.set_speed(body.speed() + flight.acceleration);
}

/// Inertia-weighted blend of the current direction with the way to `goal`.
///
/// The result is left unnormalized; a zero blend keeps the body still.
fn blend(direction: Vec2, origin: &Rect, goal: &Rect, inertia: f32, dt: Duration) -> Vec2 {
    let toward = (goal.center() - origin.center()).normalize_or_zero();
    direction * inertia + toward * (HOMING_WEIGHT * dt.as_secs_f32())
}

fn run_hooks(
    world: &mut World,
    projectile: EntityId,
    hooks: Vec<ProjectileHook>,
    out_events: &mut Vec<Event>,
) {
    for mut hook in hooks {
        hook(world, projectile, out_events);
    }
}

/// Fires the end callbacks and kills the projectile. Runs once.
fn end(world: &mut World, projectile: EntityId, out_events: &mut Vec<Event>) {
    let hooks = match world.entity_mut(projectile) {
        Some(entity) if entity.core.valid => flight_mut(&mut entity.behavior)
            .map(|flight| std::mem::take(&mut flight.on_end))
            .unwrap_or_default(),
        _ => return,
    };
    run_hooks(world, projectile, hooks, out_events);
    out_events.push(Event::ProjectileEnded { projectile });
    let _ = combat::die(world, projectile, out_events);
}
