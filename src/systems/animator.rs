//! Animation clock and rule evaluation.
//!
//! After gameplay has written its parameters, every animator feeds the
//! body's speed in, evaluates its rules, and switches the sprite to the
//! selected key. The frame clock accumulates here; the renderer divides
//! it by the animation's frame durations. The `blink` flag dims the
//! sprite tint while set, which is how a charging Heavy telegraphs.

use crate::entity::factory::EntityFactory;
use crate::resources::layers::LayerRegistry;
use crate::resources::worldtime::WorldTime;

/// Alpha applied while the blink flag is on.
const BLINK_ALPHA: u8 = 60;

pub fn update_animators(factory: &mut EntityFactory, layers: &LayerRegistry, time: &WorldTime) {
    let dt = time.step_dt();
    for id in factory.order_snapshot() {
        let Some(entity) = factory.get_mut(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        let speed = entity
            .rigidbody()
            .map(|rb| rb.velocity.length())
            .unwrap_or(0.0);

        let (key, blink) = {
            let Some(animator) = entity.animator_mut() else {
                continue;
            };
            animator.set_number("speed", speed);
            animator.set_flag("moving", speed > 0.0);
            let blink = animator.flags.get("blink").copied().unwrap_or(false);
            (animator.select_key().to_string(), blink)
        };

        if let Some(sprite) = entity.sprite_mut() {
            sprite.frame_clock += dt;
            sprite.set_animation(&key);
            sprite.tint.a = if blink { BLINK_ALPHA } else { 255 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animator::{Animator, CmpOp, Condition};
    use crate::components::rigidbody::RigidBody;
    use crate::components::sprite::Sprite;
    use crate::components::transform::Transform;
    use crate::components::Component;
    use crate::math::Vec2;

    fn stepped_time() -> WorldTime {
        let mut time = WorldTime::from_target_fps(60);
        time.advance(1.0 / 60.0);
        time
    }

    #[test]
    fn speed_parameter_selects_animation() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let id = factory.create_default(&mut layers, "walker").unwrap();
        {
            let e = factory.get_mut(id).unwrap();
            e.attach(Component::Transform(Transform::new(0.0, 0.0)));
            let mut rb = RigidBody::new(1.0);
            rb.velocity = Vec2::new(120.0, 0.0);
            e.attach(Component::RigidBody(rb));
            e.attach(Component::Sprite(Sprite::new("idle")));
            e.attach(Component::Animator(Animator::new("idle").with_rule(
                Condition::NumCmp {
                    key: "speed".into(),
                    op: CmpOp::Gt,
                    value: 1.0,
                },
                "walk",
            )));
        }

        update_animators(&mut factory, &layers, &stepped_time());

        let sprite = factory.get(id).unwrap().sprite().unwrap();
        assert_eq!(sprite.animation, "walk");
        assert!(sprite.frame_clock > 0.0);
    }

    #[test]
    fn blink_flag_dims_the_tint() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let id = factory.create_default(&mut layers, "heavy").unwrap();
        {
            let e = factory.get_mut(id).unwrap();
            e.attach(Component::Sprite(Sprite::new("idle")));
            let mut animator = Animator::new("idle");
            animator.set_flag("blink", true);
            e.attach(Component::Animator(animator));
        }

        update_animators(&mut factory, &layers, &stepped_time());
        assert_eq!(factory.get(id).unwrap().sprite().unwrap().tint.a, BLINK_ALPHA);

        factory
            .get_mut(id)
            .unwrap()
            .animator_mut()
            .unwrap()
            .set_flag("blink", false);
        update_animators(&mut factory, &layers, &stepped_time());
        assert_eq!(factory.get(id).unwrap().sprite().unwrap().tint.a, 255);
    }
}
