#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides when enemies chase and strike the player.

use glam::Vec2;
use prophecy_core::{Circle, Command, EntityId, EntityKind, EntitySnapshot, EntityView, Stat};
use tracing::trace;

/// Follow range used when an enemy carries no `FollowRange` stat.
pub const DEFAULT_FOLLOW_RANGE: f32 = 512.0;

/// Attack range used when an enemy carries no `AttackRange` stat.
pub const DEFAULT_ATTACK_RANGE: f32 = 100.0;

const ATTACK: &str = "Attack";

/// Enemy decision system that reuses a scratch buffer between frames.
#[derive(Debug, Default)]
pub struct EnemyAi {
    hunters: Vec<Hunter>,
}

impl EnemyAi {
    /// Creates the system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits steering and attack commands for every living enemy in the view.
    ///
    /// Enemies only react to a living player sharing their room.
    pub fn handle(&mut self, entity_view: &EntityView, out: &mut Vec<Command>) {
        let Some(player) = entity_view.player().filter(|player| player.valid) else {
            return;
        };

        self.hunters.clear();
        self.hunters.extend(
            entity_view
                .of_kind(EntityKind::Enemy)
                .filter(|enemy| enemy.valid && enemy.room == player.room)
                .map(|enemy| Hunter::evaluate(enemy, player)),
        );

        for hunter in &self.hunters {
            if let Some(direction) = hunter.chase {
                out.push(Command::Steer {
                    entity: hunter.enemy,
                    direction,
                });
            }
            if hunter.strike {
                trace!(enemy = hunter.enemy.get(), "enemy strikes");
                out.push(Command::BeginAttack {
                    entity: hunter.enemy,
                });
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Hunter {
    enemy: EntityId,
    chase: Option<Vec2>,
    strike: bool,
}

impl Hunter {
    fn evaluate(enemy: &EntitySnapshot, player: &EntitySnapshot) -> Self {
        let center = enemy.bounds.center();
        let follow = Circle::new(
            center,
            enemy.stat(Stat::FollowRange).unwrap_or(DEFAULT_FOLLOW_RANGE),
        );
        let reach = Circle::new(
            center,
            enemy.stat(Stat::AttackRange).unwrap_or(DEFAULT_ATTACK_RANGE),
        );

        let chase = (follow.intersects_rect(&player.bounds)
            && !enemy.bounds.intersects(&player.bounds))
        .then(|| (player.bounds.center() - center).normalize_or_zero());
        let strike = reach.intersects_rect(&player.bounds) && !enemy.is_acting(ATTACK);

        Self {
            enemy: enemy.id,
            chase,
            strike,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prophecy_core::{Rect, RoomKey};

    fn snapshot(id: u32, kind: EntityKind, bounds: Rect) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(id),
            name: format!("{kind:?}"),
            kind,
            room: Some(RoomKey::new("Hall")),
            bounds,
            direction: Vec2::ZERO,
            speed: 0.0,
            health: 10.0,
            max_health: 10.0,
            mana: None,
            valid: true,
            visible: true,
            action: None,
            stats: Default::default(),
            frame: None,
        }
    }

    fn decide(enemy: EntitySnapshot, player: EntitySnapshot) -> Vec<Command> {
        let view = EntityView::from_snapshots(vec![player, enemy]);
        let mut out = Vec::new();
        EnemyAi::new().handle(&view, &mut out);
        out
    }

    #[test]
    fn distant_player_is_ignored() {
        let player = snapshot(1, EntityKind::Player, Rect::new(2000, 0, 64, 64));
        let enemy = snapshot(2, EntityKind::Enemy, Rect::new(0, 0, 64, 64));
        assert!(decide(enemy, player).is_empty());
    }

    #[test]
    fn enemy_in_follow_range_walks_toward_player() {
        let player = snapshot(1, EntityKind::Player, Rect::new(400, 0, 64, 64));
        let enemy = snapshot(2, EntityKind::Enemy, Rect::new(0, 0, 64, 64));
        assert_eq!(
            decide(enemy, player),
            vec![Command::Steer {
                entity: EntityId::new(2),
                direction: Vec2::X,
            }]
        );
    }

    #[test]
    fn touching_enemy_stops_and_strikes() {
        let player = snapshot(1, EntityKind::Player, Rect::new(32, 0, 64, 64));
        let enemy = snapshot(2, EntityKind::Enemy, Rect::new(0, 0, 64, 64));
        assert_eq!(
            decide(enemy, player),
            vec![Command::BeginAttack {
                entity: EntityId::new(2),
            }]
        );
    }

    #[test]
    fn recovering_enemy_keeps_chasing_without_striking() {
        let player = snapshot(1, EntityKind::Player, Rect::new(100, 0, 64, 64));
        let mut enemy = snapshot(2, EntityKind::Enemy, Rect::new(0, 0, 64, 64));
        enemy.action = Some("attack".to_owned());
        let commands = decide(enemy, player);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::Steer { .. }));
    }

    #[test]
    fn stats_override_default_ranges() {
        let player = snapshot(1, EntityKind::Player, Rect::new(400, 0, 64, 64));
        let mut enemy = snapshot(2, EntityKind::Enemy, Rect::new(0, 0, 64, 64));
        let _ = enemy.stats.insert(Stat::FollowRange, 100.0);
        assert!(decide(enemy, player).is_empty());
    }
}
