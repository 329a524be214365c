//! Transform component
//!
//! Pure data component: world-space position, rotation and scale in 2D.

use crate::ecs::Component;
use crate::foundation::math::Vec2;

/// World-space placement of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// World-space position
    pub position: Vec2,

    /// Rotation around the entity origin, in radians
    pub rotation: f32,

    /// Per-axis scale factors
    pub scale: Vec2,
}

impl Transform {
    /// Identity transform at the world origin.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from a position only.
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position and rotation.
    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Move the transform by `delta` world units.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Rotate by `radians` around the entity origin.
    pub fn rotate(&mut self, radians: f32) {
        self.rotation += radians;
    }

    /// Unit vector pointing along the transform's current rotation.
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.rotation.cos(), self.rotation.sin())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Component for Transform {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
