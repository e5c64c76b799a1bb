//! Entity records and identifiers.
//!
//! An entity is an integer-identified container owning at most one
//! component of each [`ComponentKind`], a name, a tag, a layer, and a
//! place in the parent-child tree. All cross-entity references (parents,
//! chase targets, held entities) are plain [`EntityId`]s; they never
//! extend a lifetime and must be validated against the
//! [`EntityFactory`](factory::EntityFactory) arena before use.

pub mod factory;

use std::fmt;

use arrayvec::ArrayVec;
use smallvec::SmallVec;

use crate::components::ai::AiStateMachine;
use crate::components::animator::Animator;
use crate::components::audiosource::AudioSource;
use crate::components::explosion::Explosion;
use crate::components::health::Health;
use crate::components::playercontroller::PlayerController;
use crate::components::rectcollider::RectCollider;
use crate::components::rigidbody::RigidBody;
use crate::components::spawner::Spawner;
use crate::components::sprite::{Sprite, UiSprite};
use crate::components::transform::Transform;
use crate::components::{COMPONENT_KIND_COUNT, Component, ComponentKind};

/// Default tag for entities without a registered one.
pub const DEFAULT_TAG: &str = "Untagged";
/// Default layer for entities without a registered one.
pub const DEFAULT_LAYER: &str = "Default";

/// Index into the entity arena. Monotonically issued; freed ids are
/// recycled LIFO after full destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One live entity in the arena.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    /// Mutable display label.
    pub name: String,
    /// Semantic tag; set through the engine so registry coercion applies.
    pub tag: String,
    /// Rendering/physics partition; see the layer registry.
    pub layer: String,
    /// Weak parent reference; ownership flows through `children` only.
    pub parent: Option<EntityId>,
    pub children: SmallVec<[EntityId; 4]>,
    /// Components in kind order, at most one per kind.
    components: ArrayVec<Component, COMPONENT_KIND_COUNT>,
    /// Suppresses transform side effects while a scene load binds parents.
    pub deserializing: bool,
    /// Set when the entity enters the despawn queue; updates skip it.
    pub pending_despawn: bool,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: String, tag: String, layer: String) -> Self {
        Self {
            id,
            name,
            tag,
            layer,
            parent: None,
            children: SmallVec::new(),
            components: ArrayVec::new(),
            deserializing: false,
            pending_despawn: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Attach a component, replacing any existing one of the same kind.
    /// Kind order is maintained so iteration observes the update order.
    pub fn attach(&mut self, component: Component) {
        let kind = component.kind();
        if let Some(slot) = self.components.iter_mut().find(|c| c.kind() == kind) {
            *slot = component;
            return;
        }
        let pos = self
            .components
            .iter()
            .position(|c| c.kind() > kind)
            .unwrap_or(self.components.len());
        self.components.insert(pos, component);
    }

    pub fn detach(&mut self, kind: ComponentKind) -> Option<Component> {
        let pos = self.components.iter().position(|c| c.kind() == kind)?;
        Some(self.components.remove(pos))
    }

    pub fn get(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.kind() == kind)
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.get(kind).is_some()
    }

    /// Components in kind order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn transform(&self) -> Option<&Transform> {
        match self.get(ComponentKind::Transform) {
            Some(Component::Transform(t)) => Some(t),
            _ => None,
        }
    }

    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        match self.get_mut(ComponentKind::Transform) {
            Some(Component::Transform(t)) => Some(t),
            _ => None,
        }
    }

    pub fn rigidbody(&self) -> Option<&RigidBody> {
        match self.get(ComponentKind::RigidBody) {
            Some(Component::RigidBody(rb)) => Some(rb),
            _ => None,
        }
    }

    pub fn rigidbody_mut(&mut self) -> Option<&mut RigidBody> {
        match self.get_mut(ComponentKind::RigidBody) {
            Some(Component::RigidBody(rb)) => Some(rb),
            _ => None,
        }
    }

    pub fn collider(&self) -> Option<&RectCollider> {
        match self.get(ComponentKind::RectCollider) {
            Some(Component::RectCollider(c)) => Some(c),
            _ => None,
        }
    }

    pub fn collider_mut(&mut self) -> Option<&mut RectCollider> {
        match self.get_mut(ComponentKind::RectCollider) {
            Some(Component::RectCollider(c)) => Some(c),
            _ => None,
        }
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        match self.get(ComponentKind::Sprite) {
            Some(Component::Sprite(s)) => Some(s),
            _ => None,
        }
    }

    pub fn sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self.get_mut(ComponentKind::Sprite) {
            Some(Component::Sprite(s)) => Some(s),
            _ => None,
        }
    }

    pub fn ui_sprite_mut(&mut self) -> Option<&mut UiSprite> {
        match self.get_mut(ComponentKind::UiSprite) {
            Some(Component::UiSprite(s)) => Some(s),
            _ => None,
        }
    }

    pub fn animator(&self) -> Option<&Animator> {
        match self.get(ComponentKind::Animator) {
            Some(Component::Animator(a)) => Some(a),
            _ => None,
        }
    }

    pub fn animator_mut(&mut self) -> Option<&mut Animator> {
        match self.get_mut(ComponentKind::Animator) {
            Some(Component::Animator(a)) => Some(a),
            _ => None,
        }
    }

    pub fn ai(&self) -> Option<&AiStateMachine> {
        match self.get(ComponentKind::AiStateMachine) {
            Some(Component::AiStateMachine(sm)) => Some(sm),
            _ => None,
        }
    }

    pub fn ai_mut(&mut self) -> Option<&mut AiStateMachine> {
        match self.get_mut(ComponentKind::AiStateMachine) {
            Some(Component::AiStateMachine(sm)) => Some(sm),
            _ => None,
        }
    }

    pub fn health(&self) -> Option<&Health> {
        match self.get(ComponentKind::Health) {
            Some(Component::Health(h)) => Some(h),
            _ => None,
        }
    }

    pub fn health_mut(&mut self) -> Option<&mut Health> {
        match self.get_mut(ComponentKind::Health) {
            Some(Component::Health(h)) => Some(h),
            _ => None,
        }
    }

    pub fn explosion(&self) -> Option<&Explosion> {
        match self.get(ComponentKind::Explosion) {
            Some(Component::Explosion(e)) => Some(e),
            _ => None,
        }
    }

    pub fn explosion_mut(&mut self) -> Option<&mut Explosion> {
        match self.get_mut(ComponentKind::Explosion) {
            Some(Component::Explosion(e)) => Some(e),
            _ => None,
        }
    }

    pub fn spawner_mut(&mut self) -> Option<&mut Spawner> {
        match self.get_mut(ComponentKind::Spawner) {
            Some(Component::Spawner(s)) => Some(s),
            _ => None,
        }
    }

    pub fn player(&self) -> Option<&PlayerController> {
        match self.get(ComponentKind::PlayerController) {
            Some(Component::PlayerController(p)) => Some(p),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerController> {
        match self.get_mut(ComponentKind::PlayerController) {
            Some(Component::PlayerController(p)) => Some(p),
            _ => None,
        }
    }

    pub fn audio_source(&self) -> Option<&AudioSource> {
        match self.get(ComponentKind::AudioSource) {
            Some(Component::AudioSource(a)) => Some(a),
            _ => None,
        }
    }

    pub fn audio_source_mut(&mut self) -> Option<&mut AudioSource> {
        match self.get_mut(ComponentKind::AudioSource) {
            Some(Component::AudioSource(a)) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transform::Transform;

    fn blank(id: u32) -> Entity {
        Entity::new(
            EntityId(id),
            "test".into(),
            DEFAULT_TAG.into(),
            DEFAULT_LAYER.into(),
        )
    }

    #[test]
    fn attach_keeps_kind_order() {
        let mut e = blank(0);
        e.attach(Component::Health(Health::new(10.0)));
        e.attach(Component::Transform(Transform::new(1.0, 2.0)));
        e.attach(Component::RigidBody(RigidBody::new(1.0)));
        let kinds: Vec<_> = e.components().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::Transform,
                ComponentKind::RigidBody,
                ComponentKind::Health
            ]
        );
    }

    #[test]
    fn attach_replaces_same_kind() {
        let mut e = blank(0);
        e.attach(Component::Transform(Transform::new(1.0, 1.0)));
        e.attach(Component::Transform(Transform::new(9.0, 9.0)));
        assert_eq!(e.components().len(), 1);
        assert_eq!(e.transform().unwrap().position.x, 9.0);
    }

    #[test]
    fn detach_removes_component() {
        let mut e = blank(0);
        e.attach(Component::Health(Health::new(10.0)));
        assert!(e.detach(ComponentKind::Health).is_some());
        assert!(e.health().is_none());
        assert!(e.detach(ComponentKind::Health).is_none());
    }
}
