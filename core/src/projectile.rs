use std::time::Duration;

use glam::Vec2;

use crate::{EntityId, Rect};

/// Default lifetime of a projectile.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(5);
/// Default travel budget of a projectile in pixels.
pub const DEFAULT_MAX_RANGE: f32 = 1000.0;
/// Default damage dealt by a projectile.
pub const DEFAULT_DAMAGE: f32 = 5.0;

/// Parameters describing a projectile to launch.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Display name of the projectile.
    pub name: String,
    /// Initial bounding box.
    pub bounds: Rect,
    /// Initial direction; normalised on launch.
    pub direction: Vec2,
    /// Initial speed in pixels per tick.
    pub speed: f32,
    /// Speed gained after every tick.
    pub acceleration: f32,
    /// Hit radius; `None` derives it from the bounding box.
    pub radius: Option<f32>,
    /// Damage applied to every target hit.
    pub damage: f32,
    /// Lifetime budget.
    pub max_duration: Duration,
    /// Travel budget in pixels.
    pub max_range: f32,
    /// Target to face on launch.
    pub aim_at: Option<EntityId>,
    /// Steering configuration for homing projectiles.
    pub homing: Option<Homing>,
    /// Sprite sheet used to animate the projectile.
    pub sheet: Option<String>,
}

impl ProjectileSpec {
    /// Creates a stationary projectile with default budgets.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            bounds,
            direction: Vec2::ZERO,
            speed: 0.0,
            acceleration: 0.0,
            radius: None,
            damage: DEFAULT_DAMAGE,
            max_duration: DEFAULT_MAX_DURATION,
            max_range: DEFAULT_MAX_RANGE,
            aim_at: None,
            homing: None,
            sheet: None,
        }
    }

    /// Sets direction and speed.
    #[must_use]
    pub fn moving(mut self, direction: Vec2, speed: f32) -> Self {
        self.direction = direction;
        self.speed = speed;
        self
    }

    /// Sets the per-tick acceleration.
    #[must_use]
    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Overrides the hit radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Overrides the damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Overrides the lifetime budget.
    #[must_use]
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Overrides the travel budget.
    #[must_use]
    pub fn with_max_range(mut self, max_range: f32) -> Self {
        self.max_range = max_range;
        self
    }

    /// Faces `target` when launched.
    #[must_use]
    pub fn aimed_at(mut self, target: EntityId) -> Self {
        self.aim_at = Some(target);
        self
    }

    /// Turns the projectile into a homing projectile.
    #[must_use]
    pub fn homing(mut self, homing: Homing) -> Self {
        self.homing = Some(homing);
        self
    }

    /// Animates the projectile with the named sheet.
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// Steering parameters of a homing projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homing {
    /// Weight of the current heading; higher values turn slower.
    pub inertia: f32,
    /// Entity to chase.
    pub target: Option<EntityId>,
    /// Delay before the target is acquired.
    pub acquire_after: Duration,
}

impl Homing {
    /// Default inertia applied when none is configured.
    pub const DEFAULT_INERTIA: f32 = 1.5;

    /// Homing that chases `target` immediately.
    #[must_use]
    pub const fn chasing(target: EntityId, inertia: f32) -> Self {
        Self {
            inertia,
            target: Some(target),
            acquire_after: Duration::ZERO,
        }
    }

    /// Delays target acquisition.
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.acquire_after = delay;
        self
    }
}
