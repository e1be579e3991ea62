//! Swept AABB collision detection
//!
//! Broad phase: inflate the mover's box along its per-frame velocity and do a
//! cheap interval test. Narrow phase: the entry/exit time method, which gives
//! the fraction of this frame's motion at which the boxes first touch and the
//! face that was struck.
//!
//! Velocities here are per-frame displacements (dt already folded in), so a
//! time of impact of 0.25 means "a quarter of the way through this frame".

use glam::Vec2;

use super::rect::Rect;

/// Result of a swept test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether the boxes meet within this frame
    pub hit: bool,
    /// Fraction of the frame at which contact starts (1.0 on a miss)
    pub time: f32,
    /// Face of the target that was struck, pointing back toward the mover.
    /// Always one of the four axis unit vectors on a hit, zero on a miss.
    pub normal: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            time: 1.0,
            normal: Vec2::ZERO,
        }
    }

    fn contact(time: f32, normal: Vec2) -> Self {
        Self {
            hit: true,
            time,
            normal,
        }
    }
}

/// Box covering everything `rect` touches while moving by `vel`
pub fn swept_broadphase_rect(rect: Rect, vel: Vec2) -> Rect {
    let mut r = rect.norm();

    if vel.x > 0.0 {
        r.max.x += vel.x;
    } else {
        r.min.x += vel.x;
    }

    if vel.y > 0.0 {
        r.max.y += vel.y;
    } else {
        r.min.y += vel.y;
    }

    r
}

/// Broad-phase interval test.
///
/// Edges that merely touch still pass: the narrow phase makes the final call,
/// and zero-width boxes (spent projectiles) must not be rejected here.
pub fn aabb_check(a: Rect, b: Rect) -> bool {
    let a = a.norm();
    let b = b.norm();

    !(a.max.x < b.min.x || a.min.x > b.max.x || a.max.y < b.min.y || a.min.y > b.max.y)
}

/// Time of impact of `moving` (travelling by `vel` this frame) against a
/// stationary `target`.
///
/// Boxes that already overlap with positive area report an immediate hit at
/// `time == 0`, with the normal on the axis of least penetration.
pub fn swept_aabb(moving: Rect, vel: Vec2, target: Rect) -> CollisionResult {
    let m = moving.norm();
    let t = target.norm();

    // Zero-area contact (a spent laser lying inside a wall) goes through
    // the time test like any other pair
    if m.intersect(&t).area() > 0.0 {
        return CollisionResult::contact(0.0, overlap_normal(&m, &t));
    }

    // An axis with no motion never closes a gap on that axis
    if vel.x == 0.0 && !(m.min.x < t.max.x && t.min.x < m.max.x) {
        return CollisionResult::miss();
    }
    if vel.y == 0.0 && !(m.min.y < t.max.y && t.min.y < m.max.y) {
        return CollisionResult::miss();
    }

    let (entry_x, exit_x) = axis_times(m.min.x, m.max.x, t.min.x, t.max.x, vel.x);
    let (entry_y, exit_y) = axis_times(m.min.y, m.max.y, t.min.y, t.max.y, vel.y);

    let entry_time = entry_x.max(entry_y);
    let exit_time = exit_x.min(exit_y);

    if entry_time > exit_time || (entry_x < 0.0 && entry_y < 0.0) || entry_x > 1.0 || entry_y > 1.0
    {
        return CollisionResult::miss();
    }

    // The axis that arrives last is the one whose face blocks the mover.
    // Its entry time is finite, so the velocity on it is non-zero.
    let normal = if entry_x > entry_y {
        Vec2::new(-vel.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, -vel.y.signum())
    };

    CollisionResult::contact(entry_time, normal)
}

/// Entry and exit times on one axis
fn axis_times(m_min: f32, m_max: f32, t_min: f32, t_max: f32, v: f32) -> (f32, f32) {
    if v == 0.0 {
        return (f32::NEG_INFINITY, f32::INFINITY);
    }

    let (entry_dist, exit_dist) = if v > 0.0 {
        (t_min - m_max, t_max - m_min)
    } else {
        (t_max - m_min, t_min - m_max)
    };

    (entry_dist / v, exit_dist / v)
}

/// Normal for boxes that are already interpenetrating
fn overlap_normal(m: &Rect, t: &Rect) -> Vec2 {
    let overlap_x = m.max.x.min(t.max.x) - m.min.x.max(t.min.x);
    let overlap_y = m.max.y.min(t.max.y) - m.min.y.max(t.min.y);
    let (mc, tc) = (m.center(), t.center());

    if overlap_x < overlap_y {
        Vec2::new(if mc.x < tc.x { -1.0 } else { 1.0 }, 0.0)
    } else {
        Vec2::new(0.0, if mc.y < tc.y { -1.0 } else { 1.0 })
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n. With an axis normal this just
/// flips the component on that axis.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Displacement that undoes this frame's motion on the blocked axis only
#[inline]
pub fn push_back(velocity: Vec2, normal: Vec2) -> Vec2 {
    if normal.y == 0.0 {
        Vec2::new(-velocity.x, 0.0)
    } else {
        Vec2::new(0.0, -velocity.y)
    }
}

/// Whether `normal` is exactly one of (±1, 0), (0, ±1)
pub fn is_axis_normal(normal: Vec2) -> bool {
    (normal.x.abs() == 1.0 && normal.y == 0.0) || (normal.x == 0.0 && normal.y.abs() == 1.0)
}
