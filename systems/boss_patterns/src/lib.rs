#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic system that plays the boss's scheduled attack sequences.
//!
//! A sequence is a suspended coroutine: it fires a volley of projectiles,
//! then waits for simulated time to pass before firing the next one. The
//! boss only starts a new sequence once the previous one has finished and
//! every projectile it launched is gone.

mod sequence;

use std::{collections::BTreeSet, time::Duration};

use prophecy_core::{Command, EntityId, EntityKind, EntityView, Event};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use sequence::Sequence;
pub use sequence::Pattern;

/// Configuration parameters required to construct the boss pattern system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration seeding the pattern choices.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that emits the boss's projectile volleys.
#[derive(Debug)]
pub struct BossPatterns {
    rng: ChaCha8Rng,
    boss: Option<EntityId>,
    live: BTreeSet<EntityId>,
    sequence: Option<Sequence>,
    settling: bool,
}

impl BossPatterns {
    /// Creates a new boss pattern system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            boss: None,
            live: BTreeSet::new(),
            sequence: None,
            settling: false,
        }
    }

    /// Pattern currently being played, if any.
    #[must_use]
    pub fn active_pattern(&self) -> Option<Pattern> {
        self.sequence.as_ref().map(Sequence::pattern)
    }

    /// Number of boss projectiles known to be alive.
    #[must_use]
    pub fn live_projectiles(&self) -> usize {
        self.live.len()
    }

    /// Consumes world events and the active room's entities to emit
    /// projectile spawn commands.
    ///
    /// Every event the world produced since the previous call must be
    /// supplied, including those raised while applying this system's own
    /// commands, so that launched projectiles are tracked.
    pub fn handle(&mut self, events: &[Event], entity_view: &EntityView, out: &mut Vec<Command>) {
        let boss = entity_view.of_kind(EntityKind::Boss).next();
        if let Some(boss) = boss {
            self.boss = Some(boss.id);
        }

        let mut dt = Duration::ZERO;
        for event in events {
            match event {
                Event::WorldReset { .. } => self.abandon(),
                Event::TimeAdvanced { dt: step, .. } => dt = dt.saturating_add(*step),
                Event::ProjectileLaunched { projectile, caster } => {
                    if caster.is_some() && *caster == self.boss {
                        let _ = self.live.insert(*projectile);
                    }
                }
                Event::ProjectileEnded { projectile } => {
                    let _ = self.live.remove(projectile);
                }
                Event::EntityRemoved { entity } => {
                    let _ = self.live.remove(entity);
                }
                _ => {}
            }
        }
        let settled = !std::mem::take(&mut self.settling);

        let Some(boss) = boss else {
            return;
        };
        if !boss.valid {
            if self.sequence.take().is_some() {
                debug!(boss = boss.id.get(), "boss fell mid-sequence");
            }
            return;
        }
        let Some(player) = entity_view.player().filter(|player| player.valid) else {
            return;
        };

        if self.sequence.is_none() && settled && self.live.is_empty() {
            let pattern = Pattern::choose(&mut self.rng);
            debug!(?pattern, boss = boss.id.get(), "boss begins pattern");
            self.sequence = Some(Sequence::start(pattern, boss, player, &mut self.rng));
        }

        if let Some(sequence) = self.sequence.as_mut() {
            if !sequence.advance(dt, boss, player, out) {
                self.sequence = None;
                self.settling = true;
            }
        }
    }

    fn abandon(&mut self) {
        if let Some(sequence) = self.sequence.take() {
            debug!(pattern = ?sequence.pattern(), "abandoning boss pattern");
        }
        self.live.clear();
        self.settling = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use prophecy_core::{EntitySnapshot, Rect, SimTime};

    fn snapshot(id: u32, kind: EntityKind, bounds: Rect) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(id),
            name: format!("{kind:?}"),
            kind,
            room: None,
            bounds,
            direction: Vec2::ZERO,
            speed: 0.0,
            health: 100.0,
            max_health: 100.0,
            mana: None,
            valid: true,
            visible: true,
            action: None,
            stats: Default::default(),
            frame: None,
        }
    }

    fn view() -> EntityView {
        EntityView::from_snapshots(vec![
            snapshot(1, EntityKind::Boss, Rect::new(900, 400, 128, 160)),
            snapshot(2, EntityKind::Player, Rect::new(900, 800, 88, 144)),
        ])
    }

    fn tick(ms: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(ms),
            now: SimTime::ZERO,
        }
    }

    fn launched(out: &[Command], first_id: u32) -> Vec<Event> {
        (0..out.len() as u32)
            .map(|offset| Event::ProjectileLaunched {
                projectile: EntityId::new(first_id + offset),
                caster: Some(EntityId::new(1)),
            })
            .collect()
    }

    #[test]
    fn waits_for_live_projectiles_before_next_pattern() {
        let mut system = BossPatterns::new(Config::new(3));
        let view = view();
        let mut out = Vec::new();
        system.handle(&[tick(16)], &view, &mut out);
        assert!(system.active_pattern().is_some());
        assert!(!out.is_empty());

        let mut events = launched(&out, 100);
        let mut next_id = 100 + out.len() as u32;
        for _ in 0..400 {
            events.push(tick(16));
            out.clear();
            system.handle(&events, &view, &mut out);
            events = launched(&out, next_id);
            next_id += out.len() as u32;
        }
        assert!(system.active_pattern().is_none());
        assert!(system.live_projectiles() > 0);

        let ended: Vec<Event> = (100..next_id)
            .map(|projectile| Event::ProjectileEnded {
                projectile: EntityId::new(projectile),
            })
            .collect();
        out.clear();
        system.handle(&ended, &view, &mut out);
        assert_eq!(system.live_projectiles(), 0);
        assert!(system.active_pattern().is_some(), "a fresh pattern starts");
    }

    #[test]
    fn reset_abandons_the_running_sequence() {
        let mut system = BossPatterns::new(Config::new(11));
        let view = view();
        let mut out = Vec::new();
        system.handle(&[tick(16)], &view, &mut out);
        let events = launched(&out, 50);
        out.clear();
        system.handle(&events, &view, &mut out);
        assert!(system.live_projectiles() > 0);

        system.handle(&[Event::WorldReset { replays: 1 }], &EntityView::default(), &mut out);
        assert_eq!(system.live_projectiles(), 0);
        assert!(system.active_pattern().is_none());
    }

    #[test]
    fn same_seed_picks_the_same_patterns() {
        let picks = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..64)
                .map(|_| Pattern::choose(&mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(5), picks(5));
        assert!(Pattern::ALL.iter().all(|pattern| picks(5).contains(pattern)));
    }
}
