#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player control system translating device input into world commands.
//!
//! The system never touches device state itself; adapters fill an
//! [`InputFrame`] each frame and the system reads it.

mod input;

use std::time::Duration;

use glam::Vec2;
use prophecy_core::{Command, EntityView, Event, SimTime, Side};

pub use input::{
    Input, InputFrame, Key, MouseButton, MouseState, PressHistory, PressMode, NO_REACTION_WINDOW,
};

const DASH: &str = "Dash";
const ATTACK: &str = "Attack";

/// Window in which Alt and Enter must both be pressed to toggle fullscreen.
pub const FULLSCREEN_CHORD: Duration = Duration::from_millis(200);

const ROOM_KEYS: [(Key, Side); 4] = [
    (Key::NumPad8, Side::Top),
    (Key::NumPad2, Side::Bottom),
    (Key::NumPad4, Side::Left),
    (Key::NumPad6, Side::Right),
];

/// Requests aimed at the application shell rather than the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlSignals {
    /// Alt+Enter was pressed.
    pub toggle_fullscreen: bool,
    /// Escape was released.
    pub pause: bool,
}

/// Pure system that turns the player's input into commands.
#[derive(Debug, Default)]
pub struct PlayerControl {
    history: PressHistory,
    now: SimTime,
}

impl PlayerControl {
    /// Creates the system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events, the input frame and the active room's
    /// entities to emit player commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        frame: &InputFrame,
        entity_view: &EntityView,
        out: &mut Vec<Command>,
    ) -> ControlSignals {
        for event in events {
            if let Event::TimeAdvanced { now, .. } = event {
                self.now = *now;
            }
        }
        self.history.record(frame, self.now);

        let signals = ControlSignals {
            toggle_fullscreen: self.history.has_pressed(
                Key::LeftAlt,
                FULLSCREEN_CHORD,
                false,
                self.now,
            ) && self
                .history
                .has_pressed(Key::Enter, FULLSCREEN_CHORD, true, self.now),
            pause: frame.is_pressed(Key::Escape, PressMode::OnRelease),
        };

        let Some(player) = entity_view.player().filter(|player| player.valid) else {
            return signals;
        };

        out.push(Command::Steer {
            entity: player.id,
            direction: steering(frame),
        });
        if frame.is_pressed(Key::LeftShift, PressMode::Instant) {
            out.push(Command::CastSkill {
                entity: player.id,
                skill: DASH.to_owned(),
            });
        }
        if frame.is_pressed(MouseButton::Left, PressMode::OnRelease) && !player.is_acting(ATTACK) {
            out.push(Command::BeginAttack { entity: player.id });
        }
        if let Some((_, side)) = ROOM_KEYS
            .iter()
            .find(|(key, _)| frame.is_pressed(*key, PressMode::OnRelease))
        {
            out.push(Command::SwitchRoom { side: *side });
        }
        signals
    }
}

/// Direction requested by the movement keys; opposite keys cancel out.
#[must_use]
pub fn steering(frame: &InputFrame) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if frame.is_down(Key::W) {
        direction.y -= 1.0;
    }
    if frame.is_down(Key::S) {
        direction.y += 1.0;
    }
    if frame.is_down(Key::A) {
        direction.x -= 1.0;
    }
    if frame.is_down(Key::D) {
        direction.x += 1.0;
    }
    direction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_keys_cancel() {
        let mut frame = InputFrame::new();
        frame.press(Key::A);
        frame.press(Key::D);
        frame.press(Key::W);
        assert_eq!(steering(&frame), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn no_player_means_no_commands() {
        let mut control = PlayerControl::new();
        let mut frame = InputFrame::new();
        frame.press(Key::D);
        let mut out = Vec::new();
        let signals = control.handle(&[], &frame, &EntityView::default(), &mut out);
        assert!(out.is_empty());
        assert_eq!(signals, ControlSignals::default());
    }
}
