//! Integer rectangles and circles used for bounds, hit areas and tiles.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle measured in whole world pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Horizontal coordinate of the left edge.
    pub x: i32,
    /// Vertical coordinate of the top edge.
    pub y: i32,
    /// Horizontal extent in pixels.
    pub width: i32,
    /// Vertical extent in pixels.
    pub height: i32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle anchored at `location` with the provided size.
    #[must_use]
    pub const fn from_location(location: IVec2, width: i32, height: i32) -> Self {
        Self::new(location.x, location.y, width, height)
    }

    /// Left edge.
    #[must_use]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Top edge.
    #[must_use]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[must_use]
    pub const fn location(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    /// Returns a copy moved so that its top-left corner sits at `location`.
    #[must_use]
    pub const fn with_location(self, location: IVec2) -> Self {
        Self::new(location.x, location.y, self.width, self.height)
    }

    /// Returns a copy translated by `offset`.
    #[must_use]
    pub const fn translated(self, offset: IVec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Geometric center in floating point world space.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Length of the diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f32 {
        Vec2::new(self.width as f32, self.height as f32).length()
    }

    /// Reports whether the two rectangles overlap by at least one pixel.
    #[must_use]
    pub const fn intersects(&self, other: &Rect) -> bool {
        other.left() < self.right()
            && self.left() < other.right()
            && other.top() < self.bottom()
            && self.top() < other.bottom()
    }

    /// Reports whether `other` lies entirely inside this rectangle.
    #[must_use]
    pub const fn contains(&self, other: &Rect) -> bool {
        self.left() <= other.left()
            && other.right() <= self.right()
            && self.top() <= other.top()
            && other.bottom() <= self.bottom()
    }

    /// Euclidean distance between the centers of the two rectangles.
    #[must_use]
    pub fn center_distance(&self, other: &Rect) -> f32 {
        self.center().distance(other.center())
    }
}

/// Circular hit area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// Center of the circle in world space.
    pub center: Vec2,
    /// Radius in pixels.
    pub radius: f32,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Reports whether the circle overlaps the rectangle.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        let closest = Vec2::new(
            self.center.x.clamp(rect.left() as f32, rect.right() as f32),
            self.center.y.clamp(rect.top() as f32, rect.bottom() as f32),
        );
        closest.distance_squared(self.center) < self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
    }

    #[test]
    fn circle_reaches_rect_corner_only_within_radius() {
        let rect = Rect::new(10, 10, 10, 10);
        assert!(Circle::new(Vec2::new(5.0, 5.0), 8.0).intersects_rect(&rect));
        assert!(!Circle::new(Vec2::new(5.0, 5.0), 7.0).intersects_rect(&rect));
        assert!(Circle::new(Vec2::new(15.0, 15.0), 0.5).intersects_rect(&rect));
    }

    #[test]
    fn containment_includes_shared_edges() {
        let room = Rect::new(0, 0, 100, 50);
        assert!(room.contains(&Rect::new(0, 0, 100, 50)));
        assert!(!room.contains(&Rect::new(-1, 0, 10, 10)));
        assert!(!room.contains(&Rect::new(95, 45, 10, 10)));
    }
}
