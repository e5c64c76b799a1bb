//! Spawner component ticking.
//!
//! Each spawner advances its private clock by the frame's step time and
//! reports the enemy kinds that came due, together with the spawner's
//! world position. The engine turns these requests into entities; this
//! pass never touches the arena beyond reading.

use crate::components::ai::EnemyKind;
use crate::entity::factory::EntityFactory;
use crate::math::Vec2;
use crate::resources::layers::LayerRegistry;
use crate::resources::worldtime::WorldTime;

/// One spawn that came due this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: EnemyKind,
    pub position: Vec2,
}

pub fn tick_spawners(
    factory: &mut EntityFactory,
    layers: &LayerRegistry,
    time: &WorldTime,
) -> Vec<SpawnRequest> {
    let dt = time.step_dt();
    let mut requests = Vec::new();
    if dt <= 0.0 {
        return requests;
    }
    for id in factory.order_snapshot() {
        let Some(entity) = factory.get(id) else {
            continue;
        };
        if entity.pending_despawn || !layers.is_active(&entity.layer) {
            continue;
        }
        if entity.get(crate::components::ComponentKind::Spawner).is_none() {
            continue;
        }
        let position = factory.world_transform(id).position;
        let Some(spawner) = factory.get_mut(id).and_then(|e| e.spawner_mut()) else {
            continue;
        };
        if let Some(kind) = spawner.tick(dt) {
            requests.push(SpawnRequest { kind, position });
        }
    }
    requests
}
