//! 2D math types and helpers
//!
//! Thin aliases over `nalgebra` so the rest of the engine (and games built
//! on it) share one vocabulary for world-space math.

/// 2D vector in world units (pixels at scale 1)
pub type Vec2 = nalgebra::Vector2<f32>;

/// Construct a [`Vec2`] from its components.
#[inline]
pub fn vec2(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

/// Linear interpolation between `a` and `b` by `t` in `[0, 1]`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
