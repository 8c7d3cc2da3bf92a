use std::time::Duration;

use glam::{IVec2, Vec2};
use prophecy_core::{CastRejection, Command, EntityId, EntityKind, Event, SkillStatus, StatusKind};
use prophecy_world::{
    self as world, combat, query,
    skills::{self, CastFault, ManaCost},
    MemoryRooms, World, WorldConfig,
};

const FRAME: Duration = Duration::from_millis(16);

fn arena() -> MemoryRooms {
    let row = "~ ~ ~ ~ ~ ~ ~ ~ ~ ~\n";
    MemoryRooms::new().with_room("Arena", format!("10 7\n{}", row.repeat(7)))
}

fn config() -> WorldConfig {
    let mut config = WorldConfig {
        start_room: "Arena".to_owned(),
        entry_room: None,
        boss_room: None,
        ..WorldConfig::default()
    };
    config.player.sheet = None;
    config.enemy.sheet = None;
    config.boss.sheet = None;
    config
}

fn session() -> (World, EntityId, EntityId) {
    let mut world =
        World::new(config(), arena(), Default::default()).expect("built-in skills register");
    let mut events = Vec::new();
    world::apply(&mut world, Command::Reset, &mut events).expect("arena exists");
    world::apply(
        &mut world,
        Command::SpawnEnemy {
            room: "arena".to_owned(),
            origin: IVec2::new(1010, 468),
        },
        &mut events,
    )
    .expect("enemy template is valid");

    let player = query::player(&world).expect("player spawned");
    let enemy = query::entity_view(&world)
        .iter()
        .find(|snapshot| snapshot.name == "OldMan")
        .map(|snapshot| snapshot.id)
        .expect("enemy spawned");
    (world, player, enemy)
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events).expect("no world-breaking faults");
    events
}

fn tick(world: &mut World, frames: usize) -> Vec<Event> {
    (0..frames)
        .flat_map(|_| run(world, Command::Tick { dt: FRAME }))
        .collect()
}

fn health(world: &World, entity: EntityId) -> f32 {
    query::entity(world, entity).expect("entity exists").health
}

#[test]
fn basic_attack_lands_after_the_windup() {
    let (mut world, player, enemy) = session();
    assert!(!query::is_ally(&world, player, enemy));

    let events = run(&mut world, Command::BeginAttack { entity: player });
    assert!(events.contains(&Event::AttackStarted { entity: player }));
    assert_eq!(query::action_name(&world, player).as_deref(), Some("Attack"));

    let refused = run(&mut world, Command::BeginAttack { entity: player });
    assert!(refused.is_empty(), "second swing refused while attacking");

    let early = tick(&mut world, 30);
    assert_eq!(health(&world, enemy), 30.0);
    assert!(!early.iter().any(|event| matches!(event, Event::Damaged { .. })));

    let events = tick(&mut world, 2);
    assert_eq!(health(&world, enemy), 10.0);
    assert!(events.contains(&Event::Damaged {
        attacker: player,
        target: enemy,
        amount: 20.0,
        remaining: 10.0,
    }));
    assert_eq!(query::action_name(&world, player), None);
}

#[test]
fn dash_grants_invincibility_and_speed_for_its_window() {
    let (mut world, player, enemy) = session();
    let _ = run(
        &mut world,
        Command::Steer {
            entity: player,
            direction: Vec2::new(3.0, 0.0),
        },
    );

    let events = run(
        &mut world,
        Command::CastSkill {
            entity: player,
            skill: "dash".to_owned(),
        },
    );
    assert!(events.contains(&Event::SkillCast {
        entity: player,
        skill: "Dash".to_owned(),
    }));
    assert!(query::has_status(&world, player, StatusKind::Invincible));
    let snapshot = query::entity(&world, player).expect("player");
    assert_eq!(snapshot.speed, 22.5);
    assert_eq!(snapshot.mana, Some(90.0));

    let events = run(&mut world, Command::BeginAttack { entity: enemy });
    assert!(events.contains(&Event::AttackStarted { entity: enemy }));
    assert_eq!(health(&world, player), 100.0, "dash absorbs the hit");

    let events = tick(&mut world, 10);
    assert!(events.contains(&Event::StatusExpired {
        entity: player,
        status: StatusKind::Invincible,
    }));
    assert!(!query::has_status(&world, player, StatusKind::Invincible));
    assert_eq!(query::entity(&world, player).expect("player").speed, 7.5);
}

#[test]
fn dash_needs_a_direction() {
    let (mut world, player, _) = session();
    let events = run(
        &mut world,
        Command::CastSkill {
            entity: player,
            skill: "Dash".to_owned(),
        },
    );
    assert!(events.contains(&Event::SkillRejected {
        entity: player,
        skill: "Dash".to_owned(),
        reason: CastRejection::Declined,
    }));
    assert_eq!(
        query::skill_status(&world, player, "Dash"),
        Some(SkillStatus::Ready)
    );
}

#[test]
fn cooldown_blocks_until_it_elapses() {
    let (mut world, player, _) = session();
    assert!(query::can_cast(&world, player, "Strike"));
    let _ = run(
        &mut world,
        Command::CastSkill {
            entity: player,
            skill: "Strike".to_owned(),
        },
    );
    assert!(!query::can_cast(&world, player, "Strike"));
    assert_eq!(
        query::skill_status(&world, player, "Strike"),
        Some(SkillStatus::OnCooldown)
    );

    let _ = tick(&mut world, 49);
    assert!(!query::can_cast(&world, player, "Strike"));
    let _ = tick(&mut world, 1);
    assert!(query::can_cast(&world, player, "Strike"));
}

#[test]
fn strike_hits_enemies_in_reach_at_once() {
    let (mut world, player, enemy) = session();
    let events = run(
        &mut world,
        Command::CastSkill {
            entity: player,
            skill: "Strike".to_owned(),
        },
    );
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Damaged { target, .. } if *target == enemy
    )));
    assert_eq!(health(&world, enemy), 10.0);
}

#[test]
fn statuses_of_one_kind_do_not_stack() {
    let (mut world, player, _) = session();
    let mut events = Vec::new();
    assert!(combat::add_status(
        &mut world,
        player,
        StatusKind::Invincible,
        Duration::from_secs(1),
        &mut events,
    ));
    assert!(!combat::add_status(
        &mut world,
        player,
        StatusKind::Invincible,
        Duration::from_secs(5),
        &mut events,
    ));
    assert_eq!(events.len(), 1);
    assert_eq!(
        query::status_time_left(&world, player, StatusKind::Invincible),
        Some(Duration::from_secs(1))
    );
}

#[test]
fn damage_is_never_friendly_and_never_drops_health_below_zero() {
    let (mut world, player, enemy) = session();
    let mut events = Vec::new();
    assert_eq!(combat::damage(&mut world, player, &[player], 50.0, &mut events), 0);
    assert_eq!(combat::damage(&mut world, player, &[enemy], 0.0, &mut events), 0);
    assert_eq!(combat::damage(&mut world, player, &[enemy], 500.0, &mut events), 1);
    assert_eq!(health(&world, enemy), 0.0);

    let events = tick(&mut world, 1);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::EntityDied { entity, .. } if *entity == enemy
    )));
    assert!(events.contains(&Event::EntityRemoved { entity: enemy }));
    assert!(query::entity(&world, enemy).is_none());
}

#[test]
fn faulting_effects_become_failed_casts() {
    let (mut world, player, _) = session();
    let _ = world
        .skill_book_mut()
        .register(
            "Backfire",
            1,
            Duration::from_secs(2),
            ManaCost::flat(5.0),
            |_, _, _| Err(CastFault::Content("misconfigured".to_owned())),
        )
        .expect("fresh name");
    let _ = world
        .skill_book_mut()
        .declare("Hollow", 1, Duration::ZERO, ManaCost::flat(0.0))
        .expect("fresh name");
    assert!(skills::learn(&mut world, player, "Backfire", 1));
    assert!(!skills::learn(&mut world, player, "backfire", 1));
    assert!(skills::learn(&mut world, player, "Hollow", 1));

    let mut events = Vec::new();
    assert!(!skills::cast(&mut world, player, "Backfire", &mut events));
    assert!(!skills::cast(&mut world, player, "Hollow", &mut events));
    let reasons: Vec<CastRejection> = events
        .iter()
        .filter_map(|event| match event {
            Event::SkillRejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![CastRejection::Faulted, CastRejection::MissingEffect]);
    assert_eq!(
        query::skill_status(&world, player, "Backfire"),
        Some(SkillStatus::Ready)
    );
    assert_eq!(query::entity(&world, player).expect("player").mana, Some(100.0));
}

#[test]
fn panicking_effects_become_failed_casts() {
    let (mut world, player, _) = session();
    let _ = world
        .skill_book_mut()
        .register(
            "Boom",
            1,
            Duration::from_secs(2),
            ManaCost::flat(5.0),
            |_, _, _| panic!("effect blew up"),
        )
        .expect("fresh name");
    assert!(skills::learn(&mut world, player, "Boom", 1));

    let events = run(
        &mut world,
        Command::CastSkill {
            entity: player,
            skill: "Boom".to_owned(),
        },
    );
    assert!(events.contains(&Event::SkillRejected {
        entity: player,
        skill: "Boom".to_owned(),
        reason: CastRejection::Faulted,
    }));
    assert_eq!(
        query::skill_status(&world, player, "Boom"),
        Some(SkillStatus::Ready)
    );
    assert_eq!(query::entity(&world, player).expect("player").mana, Some(100.0));

    let events = run(&mut world, Command::Tick { dt: FRAME });
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TimeAdvanced { .. })));
}

#[test]
fn mana_gates_casts_and_regenerates() {
    let (mut world, player, _) = session();
    let _ = world
        .skill_book_mut()
        .register(
            "Nova",
            1,
            Duration::ZERO,
            ManaCost::flat(95.0),
            |_, _, _| Ok(true),
        )
        .expect("fresh name");
    assert!(skills::learn(&mut world, player, "Nova", 1));
    assert_eq!(skills::add_levels(&mut world, player, "Nova", 4), 1);

    let mut events = Vec::new();
    assert!(skills::cast(&mut world, player, "Nova", &mut events));
    assert_eq!(
        query::skill_status(&world, player, "Nova"),
        Some(SkillStatus::MissingMana)
    );
    assert!(!skills::cast(&mut world, player, "Nova", &mut events));

    let _ = tick(&mut world, 60);
    let mana = query::entity(&world, player).expect("player").mana.expect("player mana");
    assert!((mana - 14.6).abs() < 0.01, "regenerated to {mana}");
}

#[test]
fn villagers_side_with_the_player() {
    let mut world =
        World::new(config(), arena(), Default::default()).expect("built-in skills register");
    let _ = run(&mut world, Command::Reset);
    let player = query::player(&world).expect("player spawned");
    let spawns = [
        Command::SpawnNpc {
            room: "Arena".to_owned(),
            origin: IVec2::new(1000, 480),
        },
        Command::SpawnEnemy {
            room: "Arena".to_owned(),
            origin: IVec2::new(650, 330),
        },
        Command::SpawnNpc {
            room: "Arena".to_owned(),
            origin: IVec2::new(700, 330),
        },
    ];
    for command in spawns {
        let _ = run(&mut world, command);
    }
    let view = query::entity_view(&world);
    let villagers: Vec<EntityId> = view
        .of_kind(EntityKind::Npc)
        .map(|snapshot| snapshot.id)
        .collect();
    let [beside_player, beside_enemy] = villagers[..] else {
        panic!("two villagers spawned: {villagers:?}");
    };
    let enemy = view
        .of_kind(EntityKind::Enemy)
        .map(|snapshot| snapshot.id)
        .next()
        .expect("enemy spawned");
    assert!(query::is_ally(&world, player, beside_player));
    assert!(query::is_ally(&world, beside_player, beside_enemy));
    assert!(!query::is_ally(&world, enemy, beside_enemy));
    assert!(!query::is_ally(&world, beside_enemy, enemy));

    let events = run(
        &mut world,
        Command::CastSkill {
            entity: player,
            skill: "Strike".to_owned(),
        },
    );
    assert!(events.contains(&Event::SkillCast {
        entity: player,
        skill: "Strike".to_owned(),
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::Damaged { .. })));
    assert_eq!(health(&world, beside_player), 40.0);

    assert!(skills::learn(&mut world, enemy, "Strike", 1));
    let events = run(
        &mut world,
        Command::CastSkill {
            entity: enemy,
            skill: "Strike".to_owned(),
        },
    );
    assert!(events.contains(&Event::Damaged {
        attacker: enemy,
        target: beside_enemy,
        amount: 10.0,
        remaining: 30.0,
    }));
    assert_eq!(health(&world, beside_player), 40.0);
    assert_eq!(health(&world, player), 100.0);
}
