//! Player movement, suction grab, carry, and throw.
//!
//! Movement intent writes the body's velocity unless a knockback is in
//! flight. Holding the grab button runs the suction: the nearest AI body
//! inside range is pulled toward the hand and, after enough continuous
//! suction, snaps into the carry slot. A carried entity tracks the hand
//! anchor every frame until thrown, at which point it becomes a
//! projectile with a transient collider shape.

use crate::components::playercontroller::SUCTION_GRAB_TIME;
use crate::entity::factory::EntityFactory;
use crate::entity::EntityId;
use crate::input::InputSnapshot;
use crate::math::Vec2;
use crate::resources::layers::LayerRegistry;
use crate::resources::worldtime::WorldTime;
use crate::systems::collision::projectile_boxes;

/// Suction reach from the player center.
pub const SUCTION_RANGE: f32 = 96.0;
/// Speed at which a suction target is pulled in.
pub const SUCTION_PULL_SPEED: f32 = 180.0;
/// Launch speed of a thrown entity.
pub const THROW_SPEED: f32 = 520.0;
/// Flight time of a thrown entity before it reverts.
pub const THROW_LIFETIME: f32 = 4.0;

pub fn update_player(
    factory: &mut EntityFactory,
    layers: &LayerRegistry,
    time: &WorldTime,
    input: &InputSnapshot,
) {
    let dt = time.step_dt();
    if dt <= 0.0 {
        return;
    }
    let Some(player_id) = factory.get_player() else {
        return;
    };
    let player_pos = factory.world_transform(player_id).position;

    let (mut held, dragging, hand_offset, move_speed, mut suction_time, mut facing_left) = {
        let Some(pc) = factory.get(player_id).and_then(|e| e.player()) else {
            return;
        };
        (
            pc.held,
            pc.dragging,
            pc.hand_offset,
            pc.move_speed,
            pc.suction_time,
            pc.facing_left,
        )
    };

    // A carried entity that despawned releases the slot.
    if let Some(id) = held {
        if !factory.is_alive(id) || factory.is_pending_despawn(id) {
            held = None;
            suction_time = 0.0;
        }
    }

    // Movement intent.
    let dir = input.move_dir();
    if dir.x != 0.0 {
        facing_left = dir.x < 0.0;
    }
    let in_knockback = factory
        .get(player_id)
        .and_then(|e| e.rigidbody())
        .map(|rb| rb.in_knockback)
        .unwrap_or(false);
    if !in_knockback {
        if let Some(rb) = factory.get_mut(player_id).and_then(|e| e.rigidbody_mut()) {
            rb.velocity = dir * move_speed;
        }
    }

    // Suction and grab completion.
    if input.grab && held.is_none() {
        if let Some(target) = nearest_grabbable(factory, layers, player_id, player_pos) {
            suction_time += dt;
            if suction_time >= SUCTION_GRAB_TIME {
                held = Some(target);
                suction_time = 0.0;
                if let Some(rb) = factory.get_mut(target).and_then(|e| e.rigidbody_mut()) {
                    rb.velocity = Vec2::ZERO;
                }
            } else {
                let target_pos = factory.world_transform(target).position;
                let pull = (player_pos - target_pos).normalized() * SUCTION_PULL_SPEED;
                if let Some(rb) = factory.get_mut(target).and_then(|e| e.rigidbody_mut()) {
                    rb.velocity = pull;
                }
            }
        } else {
            suction_time = 0.0;
        }
    } else if !input.grab {
        suction_time = 0.0;
    }

    // Throw before the carry snap so a throw frame launches from the hand.
    if input.throw {
        if let Some(id) = held.take() {
            let from = hand_anchor(player_pos, hand_offset);
            let dir = input.throw_dir(from, facing_left);
            if let Some(entity) = factory.get_mut(id) {
                if let Some(ai) = entity.ai_mut() {
                    ai.launch_projectile(THROW_LIFETIME);
                }
                if let Some(collider) = entity.collider_mut() {
                    collider.set_transient_boxes(projectile_boxes());
                }
                if let Some(rb) = entity.rigidbody_mut() {
                    rb.velocity = dir * THROW_SPEED;
                }
            }
            suction_time = 0.0;
        }
    }

    // The carried entity rides the hand anchor.
    if let Some(id) = held {
        let anchor = hand_anchor(player_pos, hand_offset);
        if let Some(entity) = factory.get_mut(id) {
            if let Some(t) = entity.transform_mut() {
                t.position = anchor;
            }
            if let Some(rb) = entity.rigidbody_mut() {
                rb.velocity = Vec2::ZERO;
            }
        }
    }

    if let Some(pc) = factory.get_mut(player_id).and_then(|e| e.player_mut()) {
        pc.held = held;
        pc.dragging = dragging;
        pc.suction_time = suction_time;
        pc.facing_left = facing_left;
    }
}

/// Carry anchor above the player's head, y-down world.
fn hand_anchor(player_pos: Vec2, hand_offset: f32) -> Vec2 {
    player_pos - Vec2::new(0.0, hand_offset)
}

/// Nearest non-projectile AI body inside suction range, on an active
/// layer and not already despawning.
fn nearest_grabbable(
    factory: &EntityFactory,
    layers: &LayerRegistry,
    player_id: EntityId,
    player_pos: Vec2,
) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for id in factory.iter_order() {
        if id == player_id {
            continue;
        }
        let Some(entity) = factory.get(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        let Some(ai) = entity.ai() else {
            continue;
        };
        if ai.is_projectile {
            continue;
        }
        let distance = player_pos.distance_to(factory.world_transform(id).position);
        if distance > SUCTION_RANGE {
            continue;
        }
        if best.map(|(_, d)| distance < d).unwrap_or(true) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}
