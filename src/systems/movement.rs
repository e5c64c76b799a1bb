//! Rigid-body integration.
//!
//! Velocity and position advance over the frame's fixed sub-steps; the
//! total displacement of a constant-velocity body is exactly
//! `velocity * fixed_dt * current_steps`. The acceleration accumulator is
//! consumed and cleared; drag damps velocity per sub-step the way the
//! knockback and throw arcs expect.

use crate::entity::factory::EntityFactory;
use crate::math::Vec2;
use crate::resources::layers::LayerRegistry;
use crate::resources::worldtime::WorldTime;

/// Integrate every rigid body on an active layer. Entities queued for
/// despawn are left untouched.
pub fn integrate(factory: &mut EntityFactory, layers: &LayerRegistry, time: &WorldTime) {
    let steps = time.current_steps;
    if steps == 0 {
        return;
    }
    let fixed_dt = time.fixed_dt;
    let step_dt = time.step_dt();

    for id in factory.order_snapshot() {
        let Some(entity) = factory.get_mut(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        let Some(rb) = entity.rigidbody() else {
            continue;
        };
        let mut velocity = rb.velocity;
        let acceleration = rb.acceleration;
        let drag = rb.drag;

        let mut displacement = Vec2::ZERO;
        for _ in 0..steps {
            velocity += acceleration * fixed_dt;
            let damp = (1.0 - drag * fixed_dt).max(0.0);
            velocity = velocity * damp;
            displacement += velocity * fixed_dt;
        }

        if let Some(rb) = entity.rigidbody_mut() {
            rb.velocity = velocity;
            rb.acceleration = Vec2::ZERO;
            rb.tick_knockback(step_dt);
        }
        if let Some(transform) = entity.transform_mut() {
            transform.position += displacement;
        }
    }
}
