use std::time::Duration;

use prophecy_core::{Command, EntityKind, Event};
use prophecy_system_enemy_ai::EnemyAi;
use prophecy_world::{self as world, query, AnimationLibrary, MemoryRooms, World, WorldConfig};

const ARENA: &str = "10 7
X X X X X X X X X X
X ~ ~ ~ ~ ~ ~ ~ ~ X
X ~ ~ ~ ~ ~ ~ ~ ~ X
X ~ ~ ~ ~ ~ ~ ~ ~ X
X ~ E ~ ~ ~ ~ ~ ~ X
X ~ ~ ~ ~ ~ ~ ~ ~ X
X X X X X X X X X X
";

fn arena() -> World {
    let mut config = WorldConfig {
        start_room: "Arena".to_owned(),
        entry_room: None,
        boss_room: None,
        ..WorldConfig::default()
    };
    config.player.sheet = None;
    config.enemy.sheet = None;

    let rooms = MemoryRooms::new().with_room("Arena", ARENA);
    let mut world = World::new(config, rooms, AnimationLibrary::new()).expect("skills register");
    let mut events = Vec::new();
    world::apply(&mut world, Command::Reset, &mut events).expect("arena exists");
    world
}

fn step(world: &mut World, ai: &mut EnemyAi) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
        &mut events,
    )
    .expect("tick");
    let mut commands = Vec::new();
    ai.handle(&query::entity_view(world), &mut commands);
    for command in commands {
        world::apply(world, command, &mut events).expect("enemy command");
    }
    events
}

#[test]
fn enemy_closes_in_and_strikes_once_per_recovery() {
    let mut world = arena();
    let mut ai = EnemyAi::new();
    let player = query::player(&world).expect("player");
    let enemy = query::entity_view(&world)
        .of_kind(EntityKind::Enemy)
        .map(|snapshot| snapshot.id)
        .next()
        .expect("enemy spawned at marker");
    let start = query::entity(&world, enemy).expect("enemy").bounds;
    let player_bounds = query::entity(&world, player).expect("player").bounds;
    let initial_gap = start.center_distance(&player_bounds);

    let mut strikes = Vec::new();
    for frame in 0..200 {
        let events = step(&mut world, &mut ai);
        if events
            .iter()
            .any(|event| matches!(event, Event::Damaged { target, .. } if *target == player))
        {
            strikes.push(frame);
        }
    }

    let moved = query::entity(&world, enemy).expect("enemy").bounds;
    assert!(moved.center_distance(&player_bounds) < initial_gap);
    assert!(!strikes.is_empty(), "enemy reached the player");
    for pair in strikes.windows(2) {
        assert!(pair[1] - pair[0] >= 78, "strikes respect the 1250 ms recovery");
    }
    let health = query::entity(&world, player).expect("player").health;
    assert_eq!(health, 100.0 - 10.0 * strikes.len() as f32);
}

#[test]
fn enemies_ignore_a_fallen_player() {
    let mut world = arena();
    let mut ai = EnemyAi::new();
    let player = query::player(&world).expect("player");
    let enemy = query::entity_view(&world)
        .of_kind(EntityKind::Enemy)
        .map(|snapshot| snapshot.id)
        .next()
        .expect("enemy spawned at marker");
    let mut events = Vec::new();
    let hits = world::combat::damage(&mut world, enemy, &[player], 1_000.0, &mut events);
    assert_eq!(hits, 1);
    let _ = step(&mut world, &mut ai);

    let mut commands = Vec::new();
    ai.handle(&query::entity_view(&world), &mut commands);
    assert!(commands.is_empty());
}
