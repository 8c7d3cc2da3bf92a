use glam::{IVec2, Vec2};
use prophecy_core::{motion::Overflow, Body, Rect};

const ROOM: Rect = Rect::new(128, 64, 640, 384);

fn directions() -> Vec<Vec2> {
    let mut directions = Vec::new();
    for step in 0..32 {
        let angle = step as f32 * std::f32::consts::TAU / 32.0;
        directions.push(Vec2::new(angle.cos(), angle.sin()));
    }
    directions.extend([Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y]);
    directions
}

#[test]
fn corrected_moves_stay_inside_the_room() {
    let speeds = [0.5, 1.0, 7.5, 22.5, 64.0, 300.0];
    let starts = [
        IVec2::new(130, 66),
        IVec2::new(400, 200),
        IVec2::new(740, 420),
        IVec2::new(128, 428),
        IVec2::new(760, 64),
    ];

    for start in starts {
        for direction in directions() {
            for speed in speeds {
                let mut body = Body::new(Rect::from_location(start, 8, 20), speed);
                assert!(ROOM.contains(&body.bounds()), "start {start:?} inside");
                let _ = body.set_direction(direction);
                for tick in 0..40 {
                    let corrected = body.move_within(&ROOM);
                    if corrected {
                        assert!(
                            !Overflow::of(&body.bounds(), &ROOM).any(),
                            "tick {tick}: {direction:?} at {speed} left the room: {:?}",
                            body.bounds()
                        );
                    }
                    assert!(ROOM.contains(&body.bounds()));
                }
            }
        }
    }
}

#[test]
fn turning_mid_flight_never_escapes() {
    let mut body = Body::new(Rect::new(400, 200, 32, 48), 45.0);
    let mut state: u32 = 0x9e37_79b9;
    for _ in 0..2_000 {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let angle = (state >> 8) as f32 / (1u32 << 24) as f32 * std::f32::consts::TAU;
        let _ = body.set_direction(Vec2::new(angle.cos(), angle.sin()));
        let _ = body.move_within(&ROOM);
        assert!(ROOM.contains(&body.bounds()), "{:?}", body.bounds());
    }
}
