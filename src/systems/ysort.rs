//! Depth assignment for world sprites.
//!
//! World sprites draw in an order derived from their world y: ranks are
//! assigned from layer 2 upward in descending-y order, so layer grows as
//! y shrinks, entities sharing a y share a layer, and everything lands in
//! [2, 100]. UI sprites and entities on inactive layers are untouched.

use crate::entity::factory::EntityFactory;
use crate::entity::EntityId;
use crate::resources::layers::LayerRegistry;

/// First layer handed out by the sort; 0 and 1 stay free for backdrops.
pub const YSORT_FIRST_LAYER: i32 = 2;
/// Highest layer the sort will assign.
pub const YSORT_LAST_LAYER: i32 = 100;

pub fn sort_sprites(factory: &mut EntityFactory, layers: &LayerRegistry) {
    let mut sortable: Vec<(EntityId, f32)> = Vec::new();
    for id in factory.iter_order() {
        let Some(entity) = factory.get(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        if entity.sprite().is_none() {
            continue;
        }
        sortable.push((id, factory.world_transform(id).position.y));
    }
    sortable.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut layer = YSORT_FIRST_LAYER;
    let mut previous_y: Option<f32> = None;
    for (id, y) in sortable {
        if let Some(prev) = previous_y {
            if y < prev {
                layer = (layer + 1).min(YSORT_LAST_LAYER);
            }
        }
        previous_y = Some(y);
        if let Some(sprite) = factory.get_mut(id).and_then(|e| e.sprite_mut()) {
            sprite.layer = layer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::sprite::Sprite;
    use crate::components::transform::Transform;
    use crate::components::Component;

    fn spawn_sprite(
        factory: &mut EntityFactory,
        layers: &mut LayerRegistry,
        y: f32,
    ) -> EntityId {
        let id = factory.create_default(layers, "sprite").unwrap();
        let e = factory.get_mut(id).unwrap();
        e.attach(Component::Transform(Transform::new(0.0, y)));
        e.attach(Component::Sprite(Sprite::new("idle")));
        id
    }

    #[test]
    fn layer_grows_as_y_shrinks() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let low = spawn_sprite(&mut factory, &mut layers, 200.0);
        let mid = spawn_sprite(&mut factory, &mut layers, 0.0);
        let high = spawn_sprite(&mut factory, &mut layers, -200.0);

        sort_sprites(&mut factory, &layers);

        let l = |id| factory.get(id).unwrap().sprite().unwrap().layer;
        assert_eq!(l(low), 2);
        assert_eq!(l(mid), 3);
        assert_eq!(l(high), 4);
    }

    #[test]
    fn equal_y_shares_a_layer() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let a = spawn_sprite(&mut factory, &mut layers, 10.0);
        let b = spawn_sprite(&mut factory, &mut layers, 10.0);

        sort_sprites(&mut factory, &layers);

        let l = |id| factory.get(id).unwrap().sprite().unwrap().layer;
        assert_eq!(l(a), l(b));
    }

    #[test]
    fn layers_clamp_at_the_top() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let mut ids = Vec::new();
        for i in 0..120 {
            ids.push(spawn_sprite(&mut factory, &mut layers, -(i as f32)));
        }

        sort_sprites(&mut factory, &layers);

        for &id in &ids {
            let layer = factory.get(id).unwrap().sprite().unwrap().layer;
            assert!((YSORT_FIRST_LAYER..=YSORT_LAST_LAYER).contains(&layer));
        }
        // The deepest sprite saturates at the cap.
        let top = factory.get(ids[119]).unwrap().sprite().unwrap().layer;
        assert_eq!(top, YSORT_LAST_LAYER);
    }
}
