//! Queryable keyboard and mouse state for one frame.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use prophecy_core::SimTime;
use tracing::trace;

/// Period after a detected press during which new presses are not recorded.
pub const NO_REACTION_WINDOW: Duration = Duration::from_millis(50);

/// Keyboard keys the game reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Move up.
    W,
    /// Move left.
    A,
    /// Move down.
    S,
    /// Move right.
    D,
    /// Dash.
    LeftShift,
    /// Fullscreen modifier.
    LeftAlt,
    /// Fullscreen toggle together with [`Key::LeftAlt`].
    Enter,
    /// Pause.
    Escape,
    /// Debug travel to the room above.
    NumPad8,
    /// Debug travel to the room below.
    NumPad2,
    /// Debug travel to the room on the left.
    NumPad4,
    /// Debug travel to the room on the right.
    NumPad6,
}

/// Mouse buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
    /// First extra button.
    X1,
    /// Second extra button.
    X2,
}

/// Pressed state of every mouse button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseState {
    /// Primary button.
    pub left: bool,
    /// Secondary button.
    pub right: bool,
    /// Wheel button.
    pub middle: bool,
    /// First extra button.
    pub x1: bool,
    /// Second extra button.
    pub x2: bool,
}

impl MouseState {
    /// Reports whether `button` is held.
    #[must_use]
    pub const fn is_down(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Right => self.right,
            MouseButton::Middle => self.middle,
            MouseButton::X1 => self.x1,
            MouseButton::X2 => self.x2,
        }
    }

    /// Sets the state of `button`.
    pub fn set(&mut self, button: MouseButton, down: bool) {
        let field = match button {
            MouseButton::Left => &mut self.left,
            MouseButton::Right => &mut self.right,
            MouseButton::Middle => &mut self.middle,
            MouseButton::X1 => &mut self.x1,
            MouseButton::X2 => &mut self.x2,
        };
        *field = down;
    }
}

/// Anything that can be pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Input {
    /// A keyboard key.
    Key(Key),
    /// A mouse button.
    Mouse(MouseButton),
}

impl From<Key> for Input {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl From<MouseButton> for Input {
    fn from(button: MouseButton) -> Self {
        Self::Mouse(button)
    }
}

/// Edge that counts as a press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressMode {
    /// Down now, up last frame; reacts immediately.
    Instant,
    /// Up now, down last frame; allows holding before the press counts.
    OnRelease,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct DeviceState {
    keys: BTreeSet<Key>,
    mouse: MouseState,
}

impl DeviceState {
    fn is_down(&self, input: Input) -> bool {
        match input {
            Input::Key(key) => self.keys.contains(&key),
            Input::Mouse(button) => self.mouse.is_down(button),
        }
    }
}

/// Current and previous device state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputFrame {
    current: DeviceState,
    previous: DeviceState,
}

impl InputFrame {
    /// Creates a frame with nothing pressed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new frame; the current state becomes the previous one.
    pub fn advance(&mut self) {
        self.previous = self.current.clone();
    }

    /// Marks a key as held in the current frame.
    pub fn press(&mut self, key: Key) {
        let _ = self.current.keys.insert(key);
    }

    /// Marks a key as released in the current frame.
    pub fn release(&mut self, key: Key) {
        let _ = self.current.keys.remove(&key);
    }

    /// Sets a mouse button in the current frame.
    pub fn set_mouse(&mut self, button: MouseButton, down: bool) {
        self.current.mouse.set(button, down);
    }

    /// Mouse state of the current frame.
    #[must_use]
    pub const fn mouse(&self) -> MouseState {
        self.current.mouse
    }

    /// Reports whether `input` was just pressed according to `mode`.
    #[must_use]
    pub fn is_pressed(&self, input: impl Into<Input>, mode: PressMode) -> bool {
        let input = input.into();
        let now = self.current.is_down(input);
        let before = self.previous.is_down(input);
        match mode {
            PressMode::Instant => now && !before,
            PressMode::OnRelease => !now && before,
        }
    }

    /// Reports whether `input` is held in the current frame.
    #[must_use]
    pub fn is_down(&self, input: impl Into<Input>) -> bool {
        self.current.is_down(input.into())
    }

    /// Reports whether `input` was held in both this and the previous frame.
    #[must_use]
    pub fn is_holding(&self, input: impl Into<Input>) -> bool {
        let input = input.into();
        self.current.is_down(input) && self.previous.is_down(input)
    }

    fn fresh_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.current
            .keys
            .iter()
            .copied()
            .filter(|key| !self.previous.keys.contains(key))
    }
}

/// Remembers when keys were last pressed, for combination and double-press
/// detection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PressHistory {
    last_pressed: BTreeMap<Key, SimTime>,
    quiet_until: BTreeMap<Key, SimTime>,
}

impl PressHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `now` for every key that went down this frame, unless the key
    /// is inside its no-reaction window.
    pub fn record(&mut self, frame: &InputFrame, now: SimTime) {
        for key in frame.fresh_keys() {
            let quiet = self.quiet_until.get(&key).is_some_and(|until| now <= *until);
            if !quiet {
                trace!(?key, "key press recorded");
                let _ = self.last_pressed.insert(key, now);
            }
        }
    }

    /// Reports whether `key` was pressed within `window` before `now`.
    ///
    /// A positive answer opens the key's no-reaction window and, with
    /// `consume`, forgets the press.
    pub fn has_pressed(&mut self, key: Key, window: Duration, consume: bool, now: SimTime) -> bool {
        let Some(at) = self.last_pressed.get(&key).copied() else {
            return false;
        };
        if now.since(at) > window {
            return false;
        }
        if consume {
            let _ = self.last_pressed.remove(&key);
        }
        let _ = self.quiet_until.insert(key, now + NO_REACTION_WINDOW);
        true
    }

    /// Forgets the recorded press of `key`.
    pub fn consume(&mut self, key: Key) -> bool {
        self.last_pressed.remove(&key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_modes_detect_opposite_edges() {
        let mut frame = InputFrame::new();
        frame.press(Key::LeftShift);
        assert!(frame.is_pressed(Key::LeftShift, PressMode::Instant));
        assert!(!frame.is_pressed(Key::LeftShift, PressMode::OnRelease));
        assert!(!frame.is_holding(Key::LeftShift));

        frame.advance();
        assert!(frame.is_holding(Key::LeftShift));
        assert!(!frame.is_pressed(Key::LeftShift, PressMode::Instant));

        frame.advance();
        frame.release(Key::LeftShift);
        assert!(frame.is_pressed(Key::LeftShift, PressMode::OnRelease));
        assert!(!frame.is_down(Key::LeftShift));
    }

    #[test]
    fn mouse_buttons_map_to_fields() {
        let mut frame = InputFrame::new();
        frame.set_mouse(MouseButton::X2, true);
        assert!(frame.mouse().x2);
        assert!(frame.is_down(MouseButton::X2));
        assert!(!frame.is_down(MouseButton::Left));
    }

    #[test]
    fn history_respects_window_consumption_and_quiet_period() {
        let mut frame = InputFrame::new();
        let mut history = PressHistory::new();
        frame.press(Key::Enter);
        history.record(&frame, SimTime::from_millis(1_000));

        let window = Duration::from_millis(200);
        assert!(history.has_pressed(Key::Enter, window, false, SimTime::from_millis(1_150)));
        assert!(history.has_pressed(Key::Enter, window, true, SimTime::from_millis(1_160)));
        assert!(!history.has_pressed(Key::Enter, window, false, SimTime::from_millis(1_170)));

        frame.advance();
        frame.release(Key::Enter);
        frame.advance();
        frame.press(Key::Enter);
        history.record(&frame, SimTime::from_millis(1_200));
        assert!(!history.has_pressed(Key::Enter, window, false, SimTime::from_millis(1_200)));

        history.record(&frame, SimTime::from_millis(1_300));
        assert!(history.has_pressed(Key::Enter, window, false, SimTime::from_millis(1_300)));
        assert!(!history.has_pressed(Key::Enter, window, false, SimTime::from_millis(1_600)));
        assert!(history.consume(Key::Enter));
    }
}
