//! Axis-aligned rectangle collider.
//!
//! A collider is an ordered list of boxes, each a (half-size,
//! center-offset) pair in local space. The narrow phase works on the
//! world-space AABB enclosing all boxes. A trigger collider skips contact
//! resolution but still reports overlaps. The original box list can be
//! snapshotted so transient shape changes (projectile shape while thrown)
//! are reversible.

use serde::{Deserialize, Serialize};

use crate::components::transform::WorldTransform;
use crate::math::{Aabb, Vec2};

/// One box of a collider: half extents plus a center offset, local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderBox {
    pub half_size: Vec2,
    pub offset: Vec2,
}

impl ColliderBox {
    pub fn new(half_size: Vec2, offset: Vec2) -> Self {
        Self { half_size, offset }
    }
}

/// Multi-box AABB collider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectCollider {
    /// Ordered box list; world AABB is their union.
    pub boxes: Vec<ColliderBox>,
    /// Triggers report overlaps but never enter the penetration resolver.
    #[serde(default)]
    pub trigger: bool,
    /// Snapshot taken before a transient shape change, if any.
    #[serde(default)]
    pub original_boxes: Option<Vec<ColliderBox>>,
}

impl RectCollider {
    /// Single centered box of the given full size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            boxes: vec![ColliderBox::new(
                Vec2::new(width * 0.5, height * 0.5),
                Vec2::ZERO,
            )],
            trigger: false,
            original_boxes: None,
        }
    }

    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    pub fn push_box(&mut self, half_size: Vec2, offset: Vec2) {
        self.boxes.push(ColliderBox::new(half_size, offset));
    }

    /// Enclosing world-space AABB for a given world transform. Scale is
    /// applied to both offsets and half extents; rotation is ignored, the
    /// simulation is axis-aligned by contract.
    pub fn world_aabb(&self, world: &WorldTransform) -> Aabb {
        let mut result: Option<Aabb> = None;
        for b in &self.boxes {
            let center = world.position
                + Vec2::new(b.offset.x * world.scale.x, b.offset.y * world.scale.y);
            let half = Vec2::new(
                b.half_size.x * world.scale.x,
                b.half_size.y * world.scale.y,
            );
            let aabb = Aabb::from_center_half(center, half);
            result = Some(match result {
                Some(acc) => acc.union(&aabb),
                None => aabb,
            });
        }
        result.unwrap_or(Aabb::from_center_half(world.position, Vec2::ZERO))
    }

    /// Swap in a transient box list, snapshotting the current one the
    /// first time. Repeated calls keep the earliest snapshot.
    pub fn set_transient_boxes(&mut self, boxes: Vec<ColliderBox>) {
        if self.original_boxes.is_none() {
            self.original_boxes = Some(std::mem::take(&mut self.boxes));
        }
        self.boxes = boxes;
    }

    /// Restore the snapshotted box list. No-op without a snapshot.
    pub fn restore_original(&mut self) {
        if let Some(original) = self.original_boxes.take() {
            self.boxes = original;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transform::Transform;

    fn world_at(x: f32, y: f32) -> WorldTransform {
        WorldTransform::from_local(&Transform::new(x, y))
    }

    #[test]
    fn world_aabb_single_box() {
        let col = RectCollider::new(4.0, 2.0);
        let aabb = col.world_aabb(&world_at(10.0, 10.0));
        assert_eq!(aabb.min, Vec2::new(8.0, 9.0));
        assert_eq!(aabb.max, Vec2::new(12.0, 11.0));
    }

    #[test]
    fn world_aabb_unions_boxes() {
        let mut col = RectCollider::new(2.0, 2.0);
        col.push_box(Vec2::new(1.0, 1.0), Vec2::new(5.0, 0.0));
        let aabb = col.world_aabb(&world_at(0.0, 0.0));
        assert_eq!(aabb.min, Vec2::new(-1.0, -1.0));
        assert_eq!(aabb.max, Vec2::new(6.0, 1.0));
    }

    #[test]
    fn world_aabb_applies_scale() {
        let col = RectCollider::new(2.0, 2.0);
        let world = WorldTransform::from_local(
            &Transform::new(0.0, 0.0).with_scale(Vec2::new(2.0, 3.0)),
        );
        let aabb = col.world_aabb(&world);
        assert_eq!(aabb.min, Vec2::new(-2.0, -3.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn transient_boxes_restore() {
        let mut col = RectCollider::new(8.0, 8.0);
        let before = col.boxes.clone();
        col.set_transient_boxes(vec![ColliderBox::new(Vec2::new(1.0, 1.0), Vec2::ZERO)]);
        assert_eq!(col.boxes.len(), 1);
        assert_eq!(col.boxes[0].half_size, Vec2::new(1.0, 1.0));
        // A second transient change keeps the first snapshot.
        col.set_transient_boxes(vec![ColliderBox::new(Vec2::new(0.5, 0.5), Vec2::ZERO)]);
        col.restore_original();
        assert_eq!(col.boxes, before);
        assert!(col.original_boxes.is_none());
    }

    #[test]
    fn restore_without_snapshot_is_noop() {
        let mut col = RectCollider::new(2.0, 2.0);
        let before = col.boxes.clone();
        col.restore_original();
        assert_eq!(col.boxes, before);
    }
}
