use prophecy_core::Command;
use prophecy_rendering::{compose_frame, DrawHandle, FrameStyle, RecordingBackend};
use prophecy_world::{self as world, query, AnimationLibrary, MemoryRooms, World, WorldConfig};

const ARENA: &str = "5 4
X X X X X
X ~ E ~ X
X ~ ~ ~ X
X X X X X
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

#[test]
fn world_views_compose_into_one_ordered_frame() {
    let world = arena();
    let room = query::room_view(&world).expect("active room");
    let entities = query::entity_view(&world);

    let mut backend = RecordingBackend::new();
    let submitted = compose_frame(&mut backend, &FrameStyle::default(), &room, &entities, None)
        .expect("frame composes");

    let frame = backend.last_frame().expect("frame recorded");
    assert_eq!(backend.frames().len(), 1);
    assert_eq!(submitted, 20 + 2 + 2, "tiles, two bodies and the enemy health bar");
    let tiles = frame
        .requests
        .iter()
        .filter(|request| matches!(request.handle, DrawHandle::Tile(_)))
        .count();
    assert_eq!(tiles, 20);
    assert!(frame
        .requests
        .windows(2)
        .all(|pair| pair[0].order < pair[1].order));
}
