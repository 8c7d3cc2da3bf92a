//! Staged boss attack sequences resumed between ticks.

use std::time::Duration;

use glam::{IVec2, Vec2};
use prophecy_core::{Command, EntitySnapshot, Homing, ProjectileSpec, Rect};
use rand::Rng;

const SHOCKWAVE_RINGS: u32 = 3;
const SHOCKWAVE_FIRST_RING: u32 = 9;
const SHOCKWAVE_OFFSET: Vec2 = Vec2::new(200.0, 200.0);
const SHOCKWAVE_SPREAD: f32 = 0.4;
const SHOCKWAVE_SIZE: i32 = 128;
const SHOCKWAVE_PAUSE: Duration = Duration::from_millis(750);

const SPEAR_ROUNDS: u32 = 2;
const SPEAR_SIDE_OFFSET: i32 = 256;
const SPEAR_LIFT: i32 = 32;
const SPEAR_ACQUIRE: Duration = Duration::from_millis(500);

const FIREBALL_COUNT: std::ops::RangeInclusive<u32> = 12..=17;
const FIREBALL_FAN_DEGREES: u32 = 270;
const FIREBALL_VOLLEY: u64 = 2000;

/// Attack patterns the boss chooses from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Three widening rings of stationary blasts around the boss.
    ShockWave,
    /// Two rounds of spears flanking the boss that start chasing the player.
    LightningSpear,
    /// A fan of accelerating fireballs swept across the player.
    Fireball,
}

impl Pattern {
    /// Every pattern, in selection order.
    pub const ALL: [Pattern; 3] = [Pattern::ShockWave, Pattern::LightningSpear, Pattern::Fireball];

    /// Picks a pattern uniformly at random.
    pub(crate) fn choose(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Suspended attack sequence that is resumed whenever its wait has elapsed.
#[derive(Clone, Debug)]
pub(crate) struct Sequence {
    stage: Stage,
    elapsed: Duration,
    wait: Duration,
}

#[derive(Clone, Debug)]
enum Stage {
    ShockWave {
        ring: u32,
        count: u32,
        multiplier: f32,
        offset: Vec2,
    },
    LightningSpear {
        round: u32,
    },
    Fireball {
        remaining: u32,
        step: f32,
        interval: Duration,
        offset: Vec2,
    },
}

impl Sequence {
    /// Prepares `pattern` against the current boss and player positions.
    ///
    /// The first volley fires on the next call to [`Sequence::advance`].
    pub(crate) fn start(
        pattern: Pattern,
        boss: &EntitySnapshot,
        player: &EntitySnapshot,
        rng: &mut impl Rng,
    ) -> Self {
        let stage = match pattern {
            Pattern::ShockWave => Stage::ShockWave {
                ring: 0,
                count: SHOCKWAVE_FIRST_RING,
                multiplier: 1.0,
                offset: SHOCKWAVE_OFFSET,
            },
            Pattern::LightningSpear => Stage::LightningSpear { round: 0 },
            Pattern::Fireball => {
                let count = rng.gen_range(FIREBALL_COUNT);
                let toward = (player.bounds.location() - boss.bounds.location()).as_vec2();
                Stage::Fireball {
                    remaining: count,
                    step: whole_degrees(FIREBALL_FAN_DEGREES, count - 1),
                    interval: Duration::from_millis(FIREBALL_VOLLEY / u64::from(count)),
                    offset: rotate(toward, (-135.0_f32).to_radians()),
                }
            }
        };
        Self {
            stage,
            elapsed: Duration::ZERO,
            wait: Duration::ZERO,
        }
    }

    /// Pattern being played.
    pub(crate) fn pattern(&self) -> Pattern {
        match self.stage {
            Stage::ShockWave { .. } => Pattern::ShockWave,
            Stage::LightningSpear { .. } => Pattern::LightningSpear,
            Stage::Fireball { .. } => Pattern::Fireball,
        }
    }

    /// Adds `dt` to the wait accumulator and fires every volley that became
    /// due. Returns `false` once the sequence has nothing left to fire.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        boss: &EntitySnapshot,
        player: &EntitySnapshot,
        out: &mut Vec<Command>,
    ) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        while self.elapsed >= self.wait {
            self.elapsed -= self.wait;
            match self.resume(boss, player, out) {
                Some(next) => self.wait = next,
                None => return false,
            }
        }
        true
    }

    fn resume(
        &mut self,
        boss: &EntitySnapshot,
        player: &EntitySnapshot,
        out: &mut Vec<Command>,
    ) -> Option<Duration> {
        let center = boss.bounds.center();
        match &mut self.stage {
            Stage::ShockWave {
                ring,
                count,
                multiplier,
                offset,
            } => {
                let step = whole_degrees(360, *count - 1);
                for _ in 0..*count {
                    let point = (center + *offset * *multiplier).as_ivec2();
                    launch(boss, shockwave(point), out);
                    *offset = rotate(*offset, step);
                }
                *ring += 1;
                *count *= 2;
                *multiplier += SHOCKWAVE_SPREAD;
                (*ring < SHOCKWAVE_RINGS).then_some(SHOCKWAVE_PAUSE)
            }
            Stage::LightningSpear { round } => {
                let anchor = center.as_ivec2();
                for (side, lifetime) in [(-1, 3), (1, 5)] {
                    let origin = IVec2::new(
                        anchor.x + side * SPEAR_SIDE_OFFSET,
                        anchor.y - SPEAR_LIFT,
                    );
                    let spec = lightning_spear(origin, Duration::from_secs(lifetime))
                        .homing(Homing::chasing(player.id, 20.0).after(SPEAR_ACQUIRE));
                    launch(boss, spec, out);
                }
                *round += 1;
                (*round < SPEAR_ROUNDS).then_some(SPEAR_ACQUIRE)
            }
            Stage::Fireball {
                remaining,
                step,
                interval,
                offset,
            } => {
                let origin = (center + *offset * 0.1).as_ivec2();
                launch(boss, fireball(origin, offset.normalize_or_zero()), out);
                *offset = rotate(*offset, *step);
                *remaining -= 1;
                (*remaining > 0).then_some(*interval)
            }
        }
    }
}

fn launch(boss: &EntitySnapshot, spec: ProjectileSpec, out: &mut Vec<Command>) {
    out.push(Command::SpawnProjectile {
        caster: Some(boss.id),
        spec,
    });
}

fn shockwave(point: IVec2) -> ProjectileSpec {
    let half = SHOCKWAVE_SIZE / 2;
    ProjectileSpec::new(
        "Shockwave",
        Rect::new(point.x - half, point.y - half, SHOCKWAVE_SIZE, SHOCKWAVE_SIZE),
    )
    .with_radius(60.0)
    .with_damage(3.0)
    .with_max_duration(Duration::from_millis(1500))
    .with_sheet("Shockwave")
}

fn lightning_spear(origin: IVec2, lifetime: Duration) -> ProjectileSpec {
    ProjectileSpec::new("LightningSpear", Rect::from_location(origin, 32, 128))
        .moving(Vec2::ZERO, 4.0)
        .with_acceleration(0.02)
        .with_damage(2.0)
        .with_max_duration(lifetime)
        .with_sheet("LightningSpear")
}

fn fireball(origin: IVec2, direction: Vec2) -> ProjectileSpec {
    ProjectileSpec::new("Fireball", Rect::from_location(origin, 70, 98))
        .moving(direction, 0.5)
        .with_acceleration(0.2)
        .with_radius(60.0)
        .with_damage(4.0)
        .with_max_duration(Duration::from_secs(2))
        .with_sheet("Fireball")
}

/// Splits `total` degrees into `parts` whole-degree steps, in radians.
fn whole_degrees(total: u32, parts: u32) -> f32 {
    ((total / parts.max(1)) as f32).to_radians()
}

fn rotate(vector: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(vector)
}
