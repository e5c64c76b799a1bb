//! Local transform component.
//!
//! Stores position, scale, and rotation local to the entity's parent. The
//! world transform is the composition of the parent chain and is computed
//! on demand by [`EntityFactory::world_transform`]
//! (crate::entity::factory::EntityFactory::world_transform); nothing is
//! cached, so there is no propagation pass to keep in sync.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Position, scale, and rotation local to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Local position in world units.
    pub position: Vec2,
    /// Local scale factor per axis.
    pub scale: Vec2,
    /// Local rotation in degrees, counterclockwise.
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }
}

/// Composed world-space transform of a parent chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl WorldTransform {
    /// Treat a local transform as a root world transform.
    pub fn from_local(local: &Transform) -> Self {
        Self {
            position: local.position,
            scale: local.scale,
            rotation: local.rotation,
        }
    }

    /// Compose a child's local transform under `self`: scale the local
    /// offset by the parent scale, rotate it by the parent rotation, then
    /// translate. Rotations add, scales multiply per axis.
    pub fn compose(&self, local: &Transform) -> WorldTransform {
        let scaled = Vec2::new(
            local.position.x * self.scale.x,
            local.position.y * self.scale.y,
        );
        let rotated = scaled.rotated(self.rotation);
        WorldTransform {
            position: self.position + rotated,
            scale: Vec2::new(self.scale.x * local.scale.x, self.scale.y * local.scale.y),
            rotation: self.rotation + local.rotation,
        }
    }
}
