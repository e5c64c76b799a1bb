//! Collision notifications produced by the resolver.
//!
//! Contacts come from solid pairs after penetration resolution; overlaps
//! come from pairs where at least one collider is a trigger. Both are
//! collected per frame and handed to whoever cares (gameplay code, audio
//! dispatch, tests) after the collision pass.

use crate::entity::EntityId;
use crate::math::Vec2;

/// A resolved contact between two solid colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: EntityId,
    pub b: EntityId,
    /// Penetration of `b` into `a` at detection time, before separation.
    pub penetration: Vec2,
}

/// An overlap involving at least one trigger collider. No resolution
/// happened; both entities remain where they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapEvent {
    pub a: EntityId,
    pub b: EntityId,
}
