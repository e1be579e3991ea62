//! Axis-aligned rectangle geometry
//!
//! Every collidable reports its bounds as a `Rect`. Rectangles may be built
//! with flipped corners (walls in the level data sometimes are), so anything
//! that measures or compares rectangles goes through `norm()` first.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box given by two corners
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const ZERO: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Same rectangle with `min <= max` on both axes
    #[inline]
    pub fn norm(&self) -> Self {
        Self {
            min: self.min.min(self.max),
            max: self.min.max(self.max),
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    /// Area of the normalized rectangle
    pub fn area(&self) -> f32 {
        let r = self.norm();
        r.width() * r.height()
    }

    /// Translate by `delta`
    #[inline]
    pub fn moved(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Overlapping region of two rectangles, or `Rect::ZERO` if they are
    /// disjoint. Touching edges yield a zero-area rectangle on the shared edge.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let a = self.norm();
        let b = other.norm();
        let min = a.min.max(b.min);
        let max = a.max.min(b.max);
        if min.x > max.x || min.y > max.y {
            return Rect::ZERO;
        }
        Rect { min, max }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let a = self.norm();
        let b = other.norm();
        Rect {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// True when the rectangles interpenetrate. Touching edges don't count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let a = self.norm();
        let b = other.norm();
        a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let r = self.norm();
        p.x >= r.min.x && p.x <= r.max.x && p.y >= r.min.y && p.y <= r.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_swaps_flipped_corners() {
        // Level walls are sometimes written top-left to bottom-right
        let r = Rect::new(-10.0, 685.0, -5.0, 540.0).norm();
        assert_eq!(r.min, Vec2::new(-10.0, 540.0));
        assert_eq!(r.max, Vec2::new(-5.0, 685.0));
        assert!((r.height() - 145.0).abs() < 1e-4);
    }

    #[test]
    fn test_intersect_and_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        let i = a.intersect(&b);
        assert_eq!(i, Rect::new(5.0, 5.0, 10.0, 10.0));
        assert!((i.area() - 25.0).abs() < 1e-4);

        let far = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.intersect(&far), Rect::ZERO);
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.overlaps(&touching));
        assert_eq!(a.intersect(&touching).area(), 0.0);

        let inside = Rect::new(2.0, 2.0, 3.0, 3.0);
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn test_union_and_center() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, -5.0, 30.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, -5.0, 30.0, 10.0));
        assert_eq!(u.center(), Vec2::new(15.0, 2.5));
    }

    #[test]
    fn test_contains_point_is_inclusive() {
        let r = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert!(r.contains_point(Vec2::new(0.0, 10.0)));
        assert!(r.contains_point(Vec2::new(5.0, 5.0)));
        assert!(!r.contains_point(Vec2::new(10.5, 5.0)));
    }

    #[test]
    fn test_from_center() {
        let r = Rect::from_center(Vec2::new(0.0, 0.0), Vec2::new(168.0, 148.0));
        assert_eq!(r, Rect::new(-84.0, -74.0, 84.0, 74.0));
    }
}
