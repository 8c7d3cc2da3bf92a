//! Movement capability shared by every moveable entity.
//!
//! A [`Body`] owns the current and previous bounding boxes of an entity plus
//! its direction and scalar speed. Moving integrates `direction * speed`
//! truncated to whole pixels. When the result leaves the room rectangle the
//! body is pulled back along its own path of travel: the overflowing axis is
//! made flush with the room edge and the other axis receives the proportional
//! offset, after which the second axis gets the same treatment because fixing
//! the first may push the body across a corner.

use glam::{IVec2, Vec2};

use crate::Rect;

/// Edges of a room rectangle crossed by a bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overflow {
    /// The box extends past the left edge.
    pub left: bool,
    /// The box extends past the right edge.
    pub right: bool,
    /// The box extends past the top edge.
    pub top: bool,
    /// The box extends past the bottom edge.
    pub bottom: bool,
}

impl Overflow {
    /// Tests every edge of `bounds` against the matching edge of `room`.
    #[must_use]
    pub const fn of(bounds: &Rect, room: &Rect) -> Self {
        Self {
            left: bounds.left() < room.left(),
            right: bounds.right() > room.right(),
            top: bounds.top() < room.top(),
            bottom: bounds.bottom() > room.bottom(),
        }
    }

    /// Horizontal overflow on either side.
    #[must_use]
    pub const fn horizontal(&self) -> bool {
        self.left || self.right
    }

    /// Vertical overflow on either side.
    #[must_use]
    pub const fn vertical(&self) -> bool {
        self.top || self.bottom
    }

    /// Any overflow at all.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.horizontal() || self.vertical()
    }
}

/// Position, direction and speed of a moveable entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    bounds: Rect,
    previous: Rect,
    direction: Vec2,
    speed: f32,
    fixed_direction: bool,
}

impl Body {
    /// Creates a stationary body occupying `bounds`.
    #[must_use]
    pub const fn new(bounds: Rect, speed: f32) -> Self {
        Self {
            bounds,
            previous: bounds,
            direction: Vec2::ZERO,
            speed,
            fixed_direction: false,
        }
    }

    /// Current bounding box.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Bounding box cached before the most recent step.
    #[must_use]
    pub const fn previous(&self) -> Rect {
        self.previous
    }

    /// Places the body at `location` without producing a movement delta.
    pub fn teleport(&mut self, location: IVec2) {
        self.bounds = self.bounds.with_location(location);
        self.previous = self.bounds;
    }

    /// Unit direction of travel or zero.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Sets the direction, normalising non-zero vectors.
    ///
    /// Returns `false` without changing anything while the direction is fixed.
    pub fn set_direction(&mut self, direction: Vec2) -> bool {
        if self.fixed_direction {
            return false;
        }
        self.direction = direction.normalize_or_zero();
        true
    }

    /// Locks or unlocks the direction against [`Body::set_direction`].
    pub fn set_fixed_direction(&mut self, fixed: bool) {
        self.fixed_direction = fixed;
    }

    /// Reports whether the direction is locked.
    #[must_use]
    pub const fn fixed_direction(&self) -> bool {
        self.fixed_direction
    }

    /// Scalar speed in pixels per tick.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Replaces the scalar speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Direction scaled by speed.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.direction * self.speed
    }

    /// Distance covered by the most recent step.
    #[must_use]
    pub fn last_displacement(&self) -> f32 {
        (self.bounds.location() - self.previous.location())
            .as_vec2()
            .length()
    }

    /// Integrates velocity without consulting any bounds.
    pub fn step(&mut self) {
        self.previous = self.bounds;
        let velocity = self.velocity();
        // Truncation toward zero keeps slow movers from drifting.
        let offset = IVec2::new(velocity.x as i32, velocity.y as i32);
        self.bounds = self.bounds.translated(offset);
    }

    /// Steps and then pulls the body back inside `room` if it left it.
    ///
    /// Returns `true` when a correction was applied.
    pub fn move_within(&mut self, room: &Rect) -> bool {
        self.step();
        if !Overflow::of(&self.bounds, room).any() {
            return false;
        }
        self.fix_bounds(room);
        true
    }

    /// Steps and reports whether the body is still inside `room`.
    ///
    /// Nothing is corrected; callers treat `false` as the end of the body's
    /// existence.
    pub fn move_unbounded(&mut self, room: &Rect) -> bool {
        self.step();
        !Overflow::of(&self.bounds, room).any()
    }

    /// Restores the body inside `room` along its path of travel.
    pub fn fix_bounds(&mut self, room: &Rect) {
        let travel = (self.bounds.location() - self.previous.location()).as_vec2();
        if travel == Vec2::ZERO {
            return;
        }
        let travel = travel.normalize();
        let tangent = travel.y / travel.x;

        if self.fix_horizontal(room, tangent) {
            let _ = self.fix_vertical(room, tangent);
        } else if self.fix_vertical(room, tangent) {
            let _ = self.fix_horizontal(room, tangent);
        }

        if !room.contains(&self.bounds) {
            self.bounds = clamp_into(self.bounds, room);
        }
    }

    fn fix_horizontal(&mut self, room: &Rect, tangent: f32) -> bool {
        let overflow = Overflow::of(&self.bounds, room);
        let offset = if overflow.left {
            room.left() - self.previous.left()
        } else if overflow.right {
            room.right() - self.previous.right()
        } else {
            return false;
        };
        let cross = cross_offset(offset as f32 * tangent);
        let origin = self.previous.location();
        self.bounds = self
            .bounds
            .with_location(IVec2::new(origin.x + offset, origin.y + cross));
        true
    }

    fn fix_vertical(&mut self, room: &Rect, tangent: f32) -> bool {
        let overflow = Overflow::of(&self.bounds, room);
        let offset = if overflow.top {
            room.top() - self.previous.top()
        } else if overflow.bottom {
            room.bottom() - self.previous.bottom()
        } else {
            return false;
        };
        let cross = cross_offset(offset as f32 / tangent);
        let origin = self.previous.location();
        self.bounds = self
            .bounds
            .with_location(IVec2::new(origin.x + cross, origin.y + offset));
        true
    }
}

/// Axis-aligned travel yields an infinite or undefined ratio; such travel
/// gets no cross-axis offset.
fn cross_offset(value: f32) -> i32 {
    if value.is_finite() {
        value as i32
    } else {
        0
    }
}

fn clamp_into(bounds: Rect, room: &Rect) -> Rect {
    let x = bounds
        .x
        .min(room.right() - bounds.width)
        .max(room.left());
    let y = bounds
        .y
        .min(room.bottom() - bounds.height)
        .max(room.top());
    bounds.with_location(IVec2::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: Rect = Rect::new(0, 0, 640, 384);

    #[test]
    fn set_direction_normalises_and_respects_lock() {
        let mut body = Body::new(Rect::new(10, 10, 8, 8), 2.0);
        assert!(body.set_direction(Vec2::new(3.0, 4.0)));
        assert!((body.direction().length() - 1.0).abs() < 1e-6);

        body.set_fixed_direction(true);
        assert!(!body.set_direction(Vec2::new(-1.0, 0.0)));
        assert!(body.direction().x > 0.0);

        body.set_fixed_direction(false);
        assert!(body.set_direction(Vec2::ZERO));
        assert_eq!(body.direction(), Vec2::ZERO);
    }

    #[test]
    fn step_truncates_velocity_toward_zero() {
        let mut body = Body::new(Rect::new(100, 100, 8, 8), 1.9);
        let _ = body.set_direction(Vec2::new(-1.0, 0.0));
        body.step();
        assert_eq!(body.bounds().location(), IVec2::new(99, 100));
        assert_eq!(body.previous().location(), IVec2::new(100, 100));
    }

    #[test]
    fn horizontal_overflow_lands_flush_and_keeps_heading() {
        let mut body = Body::new(Rect::new(620, 100, 16, 16), 20.0);
        let _ = body.set_direction(Vec2::new(1.0, 1.0));
        assert!(body.move_within(&ROOM));
        let bounds = body.bounds();
        assert_eq!(bounds.right(), ROOM.right());
        assert_eq!(bounds.y, 104, "diagonal travel keeps its slope");
    }

    #[test]
    fn corner_overflow_fixes_both_axes() {
        let mut body = Body::new(Rect::new(620, 360, 16, 16), 30.0);
        let _ = body.set_direction(Vec2::new(1.0, 0.5));
        let _ = body.move_within(&ROOM);
        assert!(ROOM.contains(&body.bounds()), "{:?}", body.bounds());
    }

    #[test]
    fn axis_aligned_travel_has_no_cross_offset() {
        let mut body = Body::new(Rect::new(100, 4, 16, 16), 10.0);
        let _ = body.set_direction(Vec2::new(0.0, -1.0));
        let _ = body.move_within(&ROOM);
        assert_eq!(body.bounds().location(), IVec2::new(100, 0));
    }

    #[test]
    fn stationary_body_is_left_alone() {
        let mut body = Body::new(Rect::new(-5, 10, 16, 16), 10.0);
        body.fix_bounds(&ROOM);
        assert_eq!(body.bounds().x, -5);
    }

    #[test]
    fn unbounded_move_reports_exit() {
        let mut body = Body::new(Rect::new(600, 100, 16, 16), 30.0);
        let _ = body.set_direction(Vec2::X);
        assert!(!body.move_unbounded(&ROOM));
        assert_eq!(body.bounds().x, 630, "no correction applied");
    }
}
