//! Components attachable to entities.
//!
//! Components are a tagged sum: every component value is one variant of
//! [`Component`], keyed by a fixed [`ComponentKind`]. An entity carries at
//! most one component of each kind, stored in kind order so per-entity
//! updates observe the dependency order (Transform before RigidBody before
//! collider before sprites/UI).
//!
//! Submodules overview:
//! - [`transform`] – local position/scale/rotation, world composition
//! - [`rigidbody`] – linear velocity, acceleration, mass, drag, knockback
//! - [`rectcollider`] – multi-box AABB collider with trigger flag
//! - [`sprite`] – world and UI sprites (animation key, tint, render layer)
//! - [`animator`] – parameter-driven animation state machine
//! - [`ai`] – AI state machine with guarded transitions
//! - [`health`] – hit points, damage cooldown, death latch
//! - [`explosion`] – timed radial blast
//! - [`spawner`] – interval enemy spawner with weighted table
//! - [`playercontroller`] – player intent, hold/drag/suction state
//! - [`audiosource`] – per-entity audio bindings
//! - [`ui`] – buttons and text labels with script hooks

pub mod ai;
pub mod animator;
pub mod audiosource;
pub mod explosion;
pub mod health;
pub mod playercontroller;
pub mod rectcollider;
pub mod rigidbody;
pub mod spawner;
pub mod sprite;
pub mod transform;
pub mod ui;

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
use crate::components::ui::{Button, Label};

/// Number of component kinds; also the per-entity component capacity.
pub const COMPONENT_KIND_COUNT: usize = 14;

/// Fixed enumeration of component kinds.
///
/// The declaration order is the per-entity update order and must not be
/// reordered: Transform first, then physics, then collision, then
/// everything visual or behavioral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    Transform,
    RigidBody,
    RectCollider,
    Sprite,
    UiSprite,
    Animator,
    AiStateMachine,
    Health,
    Explosion,
    Spawner,
    PlayerController,
    AudioSource,
    Button,
    Label,
}

impl ComponentKind {
    /// All kinds in update order.
    pub const ALL: [ComponentKind; COMPONENT_KIND_COUNT] = [
        ComponentKind::Transform,
        ComponentKind::RigidBody,
        ComponentKind::RectCollider,
        ComponentKind::Sprite,
        ComponentKind::UiSprite,
        ComponentKind::Animator,
        ComponentKind::AiStateMachine,
        ComponentKind::Health,
        ComponentKind::Explosion,
        ComponentKind::Spawner,
        ComponentKind::PlayerController,
        ComponentKind::AudioSource,
        ComponentKind::Button,
        ComponentKind::Label,
    ];

    /// Key used for this kind's sub-table in scene files.
    pub fn scene_key(&self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::RigidBody => "RigidBody",
            ComponentKind::RectCollider => "RectCollider",
            ComponentKind::Sprite => "Sprite",
            ComponentKind::UiSprite => "UISprite",
            ComponentKind::Animator => "Animator",
            ComponentKind::AiStateMachine => "AIStateMachine",
            ComponentKind::Health => "Health",
            ComponentKind::Explosion => "Explosion",
            ComponentKind::Spawner => "Spawner",
            ComponentKind::PlayerController => "PlayerController",
            ComponentKind::AudioSource => "Audio",
            ComponentKind::Button => "Button",
            ComponentKind::Label => "Label",
        }
    }

    /// Inverse of [`scene_key`](Self::scene_key). Unknown keys return `None`
    /// so scene loading can skip tables it does not recognize.
    pub fn from_scene_key(key: &str) -> Option<ComponentKind> {
        ComponentKind::ALL.iter().copied().find(|k| k.scene_key() == key)
    }
}

/// A component value, tagged by its kind.
#[derive(Debug, Clone)]
pub enum Component {
    Transform(Transform),
    RigidBody(RigidBody),
    RectCollider(RectCollider),
    Sprite(Sprite),
    UiSprite(UiSprite),
    Animator(Animator),
    AiStateMachine(AiStateMachine),
    Health(Health),
    Explosion(Explosion),
    Spawner(Spawner),
    PlayerController(PlayerController),
    AudioSource(AudioSource),
    Button(Button),
    Label(Label),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::RigidBody(_) => ComponentKind::RigidBody,
            Component::RectCollider(_) => ComponentKind::RectCollider,
            Component::Sprite(_) => ComponentKind::Sprite,
            Component::UiSprite(_) => ComponentKind::UiSprite,
            Component::Animator(_) => ComponentKind::Animator,
            Component::AiStateMachine(_) => ComponentKind::AiStateMachine,
            Component::Health(_) => ComponentKind::Health,
            Component::Explosion(_) => ComponentKind::Explosion,
            Component::Spawner(_) => ComponentKind::Spawner,
            Component::PlayerController(_) => ComponentKind::PlayerController,
            Component::AudioSource(_) => ComponentKind::AudioSource,
            Component::Button(_) => ComponentKind::Button,
            Component::Label(_) => ComponentKind::Label,
        }
    }
}
