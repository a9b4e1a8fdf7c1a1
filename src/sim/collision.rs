//! Collision detection and response for the peg field
//!
//! Circle-circle checks between a falling ball and fixed pegs, plus the
//! reflection math shared with the wall bounces.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Whether the circles overlap
    pub hit: bool,
    /// Unit normal from peg center toward ball center
    pub normal: Vec2,
    /// Overlap depth along the normal (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a ball against one peg
///
/// Coincident centers fall back to a fixed `(1, 0)` normal instead of
/// dividing by zero.
pub fn ball_peg_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    peg_pos: Vec2,
    peg_radius: f32,
) -> CollisionResult {
    let delta = ball_pos - peg_pos;
    let dist = delta.length();
    let min_dist = ball_radius + peg_radius;

    if dist >= min_dist {
        return CollisionResult::miss();
    }

    let normal = if dist == 0.0 { Vec2::X } else { delta / dist };
    CollisionResult {
        hit: true,
        normal,
        penetration: min_dist - dist,
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflection with the normal term scaled by `damping`
///
/// Damping < 1 loses energy on impact; the tangential component is
/// untouched.
#[inline]
pub fn reflect_velocity_damped(velocity: Vec2, normal: Vec2, damping: f32) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal * damping
}
