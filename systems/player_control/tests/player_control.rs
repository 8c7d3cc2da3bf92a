use std::time::Duration;

use glam::Vec2;
use prophecy_core::{Command, Event, RoomKey, Side};
use prophecy_system_player_control::{InputFrame, Key, MouseButton, PlayerControl};
use prophecy_world::{self as world, query, AnimationLibrary, MemoryRooms, World, WorldConfig};

const HALL: &str = "6 5
X X X X X X
X ~ ~ ~ ~ X
X ~ ~ ~ ~ R
X ~ ~ ~ ~ X
X X X X X X

rooms
right: Annex
";

const ANNEX: &str = "6 5
X X X X X X
X ~ ~ ~ ~ X
L ~ ~ ~ ~ X
X ~ ~ ~ ~ X
X X X X X X

rooms
left: Hall
";

fn session() -> World {
    let rooms = MemoryRooms::new()
        .with_room("Hall", HALL)
        .with_room("Annex", ANNEX);
    let mut config = WorldConfig {
        start_room: "Hall".to_owned(),
        entry_room: None,
        boss_room: None,
        ..WorldConfig::default()
    };
    config.player.sheet = None;
    config.enemy.sheet = None;

    let mut world = World::new(config, rooms, AnimationLibrary::new()).expect("skills register");
    let mut events = Vec::new();
    world::apply(&mut world, Command::Reset, &mut events).expect("hall exists");
    world
}

fn frame_commands(
    control: &mut PlayerControl,
    world: &mut World,
    frame: &InputFrame,
) -> Vec<Command> {
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
    let _ = control.handle(&events, frame, &query::entity_view(world), &mut commands);
    commands
}

#[test]
fn movement_keys_steer_and_shift_dashes() {
    let mut world = session();
    let player = query::player(&world).expect("player");
    let mut control = PlayerControl::new();
    let mut frame = InputFrame::new();
    frame.press(Key::D);
    frame.press(Key::S);
    frame.press(Key::LeftShift);

    let commands = frame_commands(&mut control, &mut world, &frame);
    assert_eq!(
        commands,
        vec![
            Command::Steer {
                entity: player,
                direction: Vec2::new(1.0, 1.0),
            },
            Command::CastSkill {
                entity: player,
                skill: "Dash".to_owned(),
            },
        ]
    );

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events).expect("valid command");
    }
    assert!(events.iter().any(|event| matches!(event, Event::SkillCast { .. })));

    frame.advance();
    let commands = frame_commands(&mut control, &mut world, &frame);
    assert_eq!(commands.len(), 1, "holding shift does not dash again");
}

#[test]
fn releasing_the_mouse_attacks_once() {
    let mut world = session();
    let player = query::player(&world).expect("player");
    let mut control = PlayerControl::new();
    let mut frame = InputFrame::new();

    frame.set_mouse(MouseButton::Left, true);
    let commands = frame_commands(&mut control, &mut world, &frame);
    assert!(!commands.contains(&Command::BeginAttack { entity: player }));

    frame.advance();
    frame.set_mouse(MouseButton::Left, false);
    let commands = frame_commands(&mut control, &mut world, &frame);
    assert!(commands.contains(&Command::BeginAttack { entity: player }));
    let mut events = Vec::new();
    world::apply(&mut world, Command::BeginAttack { entity: player }, &mut events)
        .expect("attack");

    frame.advance();
    frame.set_mouse(MouseButton::Left, true);
    frame.advance();
    frame.set_mouse(MouseButton::Left, false);
    let commands = frame_commands(&mut control, &mut world, &frame);
    assert!(
        !commands.contains(&Command::BeginAttack { entity: player }),
        "no new swing while attacking"
    );
}

#[test]
fn numpad_travels_between_rooms() {
    let mut world = session();
    let mut control = PlayerControl::new();
    let mut frame = InputFrame::new();
    frame.press(Key::NumPad6);
    let _ = frame_commands(&mut control, &mut world, &frame);
    frame.advance();
    frame.release(Key::NumPad6);

    let commands = frame_commands(&mut control, &mut world, &frame);
    assert!(commands.contains(&Command::SwitchRoom { side: Side::Right }));
    let mut events = Vec::new();
    world::apply(&mut world, Command::SwitchRoom { side: Side::Right }, &mut events)
        .expect("switch");
    assert_eq!(
        query::current_room(&world),
        Some(&RoomKey::new("Annex"))
    );
}

#[test]
fn alt_enter_toggles_fullscreen_once() {
    let mut world = session();
    let mut control = PlayerControl::new();
    let mut frame = InputFrame::new();
    let mut toggles = 0;

    frame.press(Key::LeftAlt);
    for step in 0..10 {
        if step == 2 {
            frame.press(Key::Enter);
        }
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        )
        .expect("tick");
        let mut commands = Vec::new();
        let signals = control.handle(&events, &frame, &query::entity_view(&world), &mut commands);
        if signals.toggle_fullscreen {
            toggles += 1;
        }
        frame.advance();
    }
    assert_eq!(toggles, 1);
}
