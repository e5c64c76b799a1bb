//! Entity factory: the fixed-capacity arena every entity lives in.
//!
//! Creation allocates from a free list (LIFO, so recently freed ids are
//! reissued first); running out of slots is a loud, checkable failure.
//! Destruction only ever happens through the despawn queue, processed once
//! per frame after all updates, so no entity disappears mid-iteration.
//! Despawn is recursive: children go depth-first, then the node leaves its
//! parent's child list, then components are released and the id returns to
//! the free list.

use log::warn;
use smallvec::SmallVec;
use thiserror::Error;

use crate::components::transform::WorldTransform;
use crate::entity::{DEFAULT_LAYER, DEFAULT_TAG, Entity, EntityId};
use crate::resources::layers::LayerRegistry;

/// Default arena capacity.
pub const DEFAULT_CAPACITY: usize = 4096;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("entity pool exhausted (capacity {0})")]
    Exhausted(usize),
}

/// Fixed-capacity entity arena with insertion-order iteration.
pub struct EntityFactory {
    slots: Vec<Option<Entity>>,
    /// Freed slot indices, reissued LIFO.
    free: Vec<u32>,
    /// Live entities in creation order; drives UpdateAll.
    order: Vec<EntityId>,
    /// Entities awaiting ProcessDespawnQueue, in queue order.
    despawn_queue: Vec<EntityId>,
    capacity: usize,
    next_index: u32,
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EntityFactory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            despawn_queue: Vec::new(),
            capacity,
            next_index: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Create an entity. Fails when the pool is exhausted; callers must
    /// check. The new entity joins the given layer's reverse index.
    pub fn create(
        &mut self,
        layers: &mut LayerRegistry,
        name: impl Into<String>,
        tag: impl Into<String>,
        layer: impl Into<String>,
    ) -> Result<EntityId, PoolError> {
        if self.order.len() >= self.capacity {
            return Err(PoolError::Exhausted(self.capacity));
        }
        let id = match self.free.pop() {
            Some(index) => EntityId(index),
            None => {
                let index = self.next_index;
                self.next_index += 1;
                EntityId(index)
            }
        };
        let layer = layer.into();
        let entity = Entity::new(id, name.into(), tag.into(), layer.clone());
        if id.index() >= self.slots.len() {
            self.slots.resize_with(id.index() + 1, || None);
        }
        self.slots[id.index()] = Some(entity);
        self.order.push(id);
        layers.index_entity(&layer, id);
        Ok(id)
    }

    /// Create with default tag and layer.
    pub fn create_default(
        &mut self,
        layers: &mut LayerRegistry,
        name: impl Into<String>,
    ) -> Result<EntityId, PoolError> {
        self.create(layers, name, DEFAULT_TAG, DEFAULT_LAYER)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index())
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Live entity ids in insertion order.
    pub fn iter_order(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    /// Snapshot of the insertion order; use when mutation happens during
    /// the walk.
    pub fn order_snapshot(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.get(*id).map(|e| e.tag == tag).unwrap_or(false))
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Vec<EntityId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.get(*id).map(|e| e.name == name).unwrap_or(false))
            .collect()
    }

    pub fn find_first_by_tag(&self, tag: &str) -> Option<EntityId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.get(*id).map(|e| e.tag == tag).unwrap_or(false))
    }

    /// The player entity, identified by its tag.
    pub fn get_player(&self) -> Option<EntityId> {
        self.find_first_by_tag("Player")
    }

    /// Re-parent `child` under `parent`. Refuses cycles and self-parenting.
    /// Passing `None` detaches the child to the root.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) {
        if !self.is_alive(child) {
            return;
        }
        if let Some(p) = parent {
            if p == child || !self.is_alive(p) || self.is_ancestor(child, p) {
                warn!("refusing to parent {child} under {p}: would break the tree");
                return;
            }
        }
        // Unlink from the old parent first.
        if let Some(old) = self.get(child).and_then(|e| e.parent) {
            if let Some(old_parent) = self.get_mut(old) {
                old_parent.children.retain(|c| *c != child);
            }
        }
        if let Some(p) = parent {
            if let Some(new_parent) = self.get_mut(p) {
                new_parent.children.push(child);
            }
        }
        if let Some(e) = self.get_mut(child) {
            e.parent = parent;
        }
    }

    /// True when `ancestor` appears on `of`'s parent chain.
    fn is_ancestor(&self, ancestor: EntityId, of: EntityId) -> bool {
        let mut cursor = self.get(of).and_then(|e| e.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(|e| e.parent);
        }
        false
    }

    /// World transform composed along the parent chain. Identity when the
    /// entity has no Transform.
    pub fn world_transform(&self, id: EntityId) -> WorldTransform {
        let mut chain: SmallVec<[EntityId; 8]> = SmallVec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.get(current).and_then(|e| e.parent);
        }
        let mut world = WorldTransform::default();
        for current in chain.iter().rev() {
            if let Some(local) = self.get(*current).and_then(|e| e.transform()) {
                world = world.compose(local);
            }
        }
        world
    }

    /// Enqueue an entity for destruction at the end of the frame.
    /// Idempotent; a queued entity is skipped by every further update.
    pub fn queue_despawn(&mut self, id: EntityId) {
        let Some(entity) = self.get_mut(id) else {
            return;
        };
        if entity.pending_despawn {
            return;
        }
        entity.pending_despawn = true;
        self.despawn_queue.push(id);
    }

    pub fn is_pending_despawn(&self, id: EntityId) -> bool {
        self.get(id).map(|e| e.pending_despawn).unwrap_or(false)
    }

    /// Destroy everything queued since the last call. Returns the ids of
    /// all destroyed entities, descendants included.
    pub fn process_despawn_queue(&mut self, layers: &mut LayerRegistry) -> Vec<EntityId> {
        let queue = std::mem::take(&mut self.despawn_queue);
        let mut destroyed = Vec::new();
        for id in queue {
            if self.is_alive(id) {
                self.despawn(layers, id, &mut destroyed);
            }
        }
        destroyed
    }

    /// Immediate recursive destruction. Prefer [`queue_despawn`]
    /// (Self::queue_despawn) from frame code; this is the primitive the
    /// queue drains into.
    pub fn despawn_now(&mut self, layers: &mut LayerRegistry, id: EntityId) -> Vec<EntityId> {
        let mut destroyed = Vec::new();
        if self.is_alive(id) {
            self.despawn(layers, id, &mut destroyed);
        }
        destroyed
    }

    fn despawn(&mut self, layers: &mut LayerRegistry, id: EntityId, destroyed: &mut Vec<EntityId>) {
        // Children first, depth-first.
        let children: SmallVec<[EntityId; 4]> = self
            .get(id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        for child in children {
            if self.is_alive(child) {
                self.despawn(layers, child, destroyed);
            }
        }
        // Atomic with destruction: leave the parent's child list.
        if let Some(parent) = self.get(id).and_then(|e| e.parent) {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(entity) = self.slots[id.index()].take() {
            layers.unindex_entity(&entity.layer, id);
            destroyed.push(id);
        }
        self.order.retain(|e| *e != id);
        self.despawn_queue.retain(|e| *e != id);
        // Only now may the id be reissued.
        self.free.push(id.0);
    }

    /// Destroy every entity and reset the id sequence.
    pub fn clear(&mut self, layers: &mut LayerRegistry) {
        for id in self.order.clone() {
            let mut sink = Vec::new();
            if self.is_alive(id) {
                self.despawn(layers, id, &mut sink);
            }
        }
        self.slots.clear();
        self.free.clear();
        self.order.clear();
        self.despawn_queue.clear();
        self.next_index = 0;
    }

    /// Move an entity to another layer, keeping the reverse index in step.
    pub fn set_layer(&mut self, layers: &mut LayerRegistry, id: EntityId, layer: &str) {
        let Some(entity) = self.get_mut(id) else {
            return;
        };
        let old = std::mem::replace(&mut entity.layer, layer.to_string());
        layers.unindex_entity(&old, id);
        layers.index_entity(layer, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Component;
    use crate::components::transform::Transform;
    use crate::math::Vec2;

    fn setup() -> (EntityFactory, LayerRegistry) {
        (EntityFactory::default(), LayerRegistry::default())
    }

    #[test]
    fn ids_are_monotonic_then_recycled_lifo() {
        let (mut f, mut layers) = setup();
        let a = f.create_default(&mut layers, "a").unwrap();
        let b = f.create_default(&mut layers, "b").unwrap();
        let c = f.create_default(&mut layers, "c").unwrap();
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));

        f.queue_despawn(a);
        f.queue_despawn(b);
        f.process_despawn_queue(&mut layers);

        // b freed last, so b's id comes back first.
        let d = f.create_default(&mut layers, "d").unwrap();
        let e = f.create_default(&mut layers, "e").unwrap();
        assert_eq!(d.0, b.0);
        assert_eq!(e.0, a.0);
    }

    #[test]
    fn over_capacity_fails() {
        let mut f = EntityFactory::with_capacity(2);
        let mut layers = LayerRegistry::default();
        f.create_default(&mut layers, "a").unwrap();
        f.create_default(&mut layers, "b").unwrap();
        assert!(matches!(
            f.create_default(&mut layers, "c"),
            Err(PoolError::Exhausted(2))
        ));
    }

    #[test]
    fn queue_despawn_is_idempotent() {
        let (mut f, mut layers) = setup();
        let a = f.create_default(&mut layers, "a").unwrap();
        f.queue_despawn(a);
        f.queue_despawn(a);
        let destroyed = f.process_despawn_queue(&mut layers);
        assert_eq!(destroyed, vec![a]);
        assert!(!f.is_alive(a));
    }

    #[test]
    fn despawn_is_recursive_and_unlinks_parent() {
        let (mut f, mut layers) = setup();
        let root = f.create_default(&mut layers, "root").unwrap();
        let child = f.create_default(&mut layers, "child").unwrap();
        let grandchild = f.create_default(&mut layers, "grandchild").unwrap();
        f.set_parent(child, Some(root));
        f.set_parent(grandchild, Some(child));

        f.queue_despawn(child);
        let destroyed = f.process_despawn_queue(&mut layers);
        // Depth-first: grandchild before child.
        assert_eq!(destroyed, vec![grandchild, child]);
        assert!(f.is_alive(root));
        assert!(f.get(root).unwrap().children.is_empty());
    }

    #[test]
    fn set_parent_refuses_cycles() {
        let (mut f, mut layers) = setup();
        let a = f.create_default(&mut layers, "a").unwrap();
        let b = f.create_default(&mut layers, "b").unwrap();
        f.set_parent(b, Some(a));
        f.set_parent(a, Some(b)); // would be a cycle
        assert_eq!(f.get(a).unwrap().parent, None);
        f.set_parent(a, Some(a)); // self-parenting
        assert_eq!(f.get(a).unwrap().parent, None);
    }

    #[test]
    fn world_transform_composes_parent_chain() {
        let (mut f, mut layers) = setup();
        let parent = f.create_default(&mut layers, "p").unwrap();
        let child = f.create_default(&mut layers, "c").unwrap();
        f.get_mut(parent)
            .unwrap()
            .attach(Component::Transform(Transform::new(10.0, 0.0)));
        f.get_mut(child)
            .unwrap()
            .attach(Component::Transform(Transform::new(0.0, 5.0)));
        f.set_parent(child, Some(parent));
        let world = f.world_transform(child);
        assert_eq!(world.position, Vec2::new(10.0, 5.0));
    }

    #[test]
    fn find_by_tag_respects_insertion_order() {
        let (mut f, mut layers) = setup();
        let a = f.create(&mut layers, "a", "Wall", "Default").unwrap();
        let _b = f.create(&mut layers, "b", "Floor", "Default").unwrap();
        let c = f.create(&mut layers, "c", "Wall", "Default").unwrap();
        assert_eq!(f.find_by_tag("Wall"), vec![a, c]);
        assert_eq!(f.find_first_by_tag("Wall"), Some(a));
    }

    #[test]
    fn clear_resets_id_sequence() {
        let (mut f, mut layers) = setup();
        f.create_default(&mut layers, "a").unwrap();
        f.create_default(&mut layers, "b").unwrap();
        f.clear(&mut layers);
        assert!(f.is_empty());
        let a = f.create_default(&mut layers, "again").unwrap();
        assert_eq!(a.0, 0);
    }
}
