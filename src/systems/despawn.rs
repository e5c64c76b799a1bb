//! Delayed despawn bookkeeping.
//!
//! Gameplay schedules an entity to die in N seconds; the manager counts
//! the timers down by the frame's step time and funnels expired entries
//! into the factory's despawn queue. Rescheduling an already tracked
//! entity keeps the earlier deadline.

use rustc_hash::FxHashMap;

use crate::entity::factory::EntityFactory;
use crate::entity::EntityId;
use crate::resources::worldtime::WorldTime;

#[derive(Debug, Default)]
pub struct DespawnManager {
    entries: FxHashMap<EntityId, f32>,
}

impl DespawnManager {
    /// Schedule `entity` to despawn after `seconds`. An existing earlier
    /// deadline wins; a later one is tightened.
    pub fn schedule(&mut self, entity: EntityId, seconds: f32) {
        self.entries
            .entry(entity)
            .and_modify(|remaining| *remaining = remaining.min(seconds))
            .or_insert(seconds);
    }

    pub fn is_scheduled(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    pub fn cancel(&mut self, entity: EntityId) {
        self.entries.remove(&entity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Count timers down and queue expired entities. Entries for entities
    /// that died some other way drop silently.
    pub fn tick(&mut self, factory: &mut EntityFactory, time: &WorldTime) {
        let dt = time.step_dt();
        if dt <= 0.0 {
            return;
        }
        let mut expired = Vec::new();
        self.entries.retain(|&entity, remaining| {
            if !factory.is_alive(entity) {
                return false;
            }
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(entity);
                false
            } else {
                true
            }
        });
        for entity in expired {
            factory.queue_despawn(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::layers::LayerRegistry;

    fn stepped_time() -> WorldTime {
        let mut time = WorldTime::from_target_fps(60);
        time.advance(1.0 / 60.0);
        time
    }

    #[test]
    fn one_and_a_half_seconds_expires_on_the_ninetieth_tick() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let id = factory.create_default(&mut layers, "corpse").unwrap();
        let mut manager = DespawnManager::default();
        manager.schedule(id, 1.5);
        let time = stepped_time();

        for _ in 0..89 {
            manager.tick(&mut factory, &time);
        }
        assert!(!factory.is_pending_despawn(id));
        manager.tick(&mut factory, &time);
        assert!(factory.is_pending_despawn(id));
        assert!(!manager.is_scheduled(id));
    }

    #[test]
    fn reschedule_keeps_the_earlier_deadline() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let id = factory.create_default(&mut layers, "corpse").unwrap();
        let mut manager = DespawnManager::default();
        manager.schedule(id, 1.0 / 60.0);
        manager.schedule(id, 10.0);

        manager.tick(&mut factory, &stepped_time());
        assert!(factory.is_pending_despawn(id));
    }

    #[test]
    fn dead_entities_drop_from_the_book() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let id = factory.create_default(&mut layers, "corpse").unwrap();
        let mut manager = DespawnManager::default();
        manager.schedule(id, 5.0);
        factory.queue_despawn(id);
        factory.process_despawn_queue(&mut layers);

        manager.tick(&mut factory, &stepped_time());
        assert!(!manager.is_scheduled(id));
    }

    #[test]
    fn cancel_removes_the_entry() {
        let mut factory = EntityFactory::default();
        let mut layers = LayerRegistry::default();
        let id = factory.create_default(&mut layers, "corpse").unwrap();
        let mut manager = DespawnManager::default();
        manager.schedule(id, 1.0 / 60.0);
        manager.cancel(id);

        manager.tick(&mut factory, &stepped_time());
        assert!(!factory.is_pending_despawn(id));
    }
}
