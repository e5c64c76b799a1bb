//! Layer registry.
//!
//! Layers partition entities for physics, collision, and rendering. Each
//! layer has an active flag; inactive layers are skipped by those systems
//! wholesale. The registry also keeps the reverse index layer → entities,
//! maintained by the entity factory so no entity ever appears on more than
//! one layer.

use std::fs;
use std::io;
use std::path::Path;

use log::warn;
use rustc_hash::FxHashMap;

use crate::entity::{DEFAULT_LAYER, EntityId};

#[derive(Debug, Clone, Default)]
struct LayerEntry {
    active: bool,
    entities: Vec<EntityId>,
}

#[derive(Debug, Clone)]
pub struct LayerRegistry {
    layers: FxHashMap<String, LayerEntry>,
}

impl Default for LayerRegistry {
    fn default() -> Self {
        let mut layers = FxHashMap::default();
        layers.insert(
            DEFAULT_LAYER.to_string(),
            LayerEntry {
                active: true,
                entities: Vec::new(),
            },
        );
        Self { layers }
    }
}

impl LayerRegistry {
    /// Register a layer, active by default. Re-registration keeps the
    /// existing entry.
    pub fn register(&mut self, name: impl Into<String>) {
        self.layers.entry(name.into()).or_insert(LayerEntry {
            active: true,
            entities: Vec::new(),
        });
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// The layer itself when registered, otherwise the default with a
    /// warning line.
    pub fn coerce(&self, name: &str) -> String {
        if self.is_registered(name) {
            name.to_string()
        } else {
            warn!("layer {name:?} is not registered, coercing to {DEFAULT_LAYER:?}");
            DEFAULT_LAYER.to_string()
        }
    }

    /// Active flag; unknown layers read as inactive.
    pub fn is_active(&self, name: &str) -> bool {
        self.layers.get(name).map(|l| l.active).unwrap_or(false)
    }

    pub fn set_active(&mut self, name: &str, active: bool) {
        if let Some(layer) = self.layers.get_mut(name) {
            layer.active = active;
        } else {
            warn!("cannot set activity of unknown layer {name:?}");
        }
    }

    /// Entities currently on a layer, in index order.
    pub fn entities_on(&self, name: &str) -> &[EntityId] {
        self.layers
            .get(name)
            .map(|l| l.entities.as_slice())
            .unwrap_or(&[])
    }

    /// Called by the factory when an entity joins a layer. The entity
    /// must already have left any previous layer.
    pub(crate) fn index_entity(&mut self, name: &str, id: EntityId) {
        let entry = self
            .layers
            .entry(name.to_string())
            .or_insert_with(|| LayerEntry {
                active: true,
                entities: Vec::new(),
            });
        if !entry.entities.contains(&id) {
            entry.entities.push(id);
        }
    }

    pub(crate) fn unindex_entity(&mut self, name: &str, id: EntityId) {
        if let Some(entry) = self.layers.get_mut(name) {
            entry.entities.retain(|e| *e != id);
        }
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.keys().map(String::as_str).collect()
    }

    /// Load layer names from a newline-delimited file.
    pub fn load_from_file(&mut self, path: &Path) -> io::Result<()> {
        let content = fs::read_to_string(path)?;
        for line in content.lines() {
            let name = line.trim();
            if !name.is_empty() {
                self.register(name);
            }
        }
        Ok(())
    }

    /// Save layer names, one per line, sorted.
    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        let mut names: Vec<&str> = self.layers.keys().map(String::as_str).collect();
        names.sort_unstable();
        let mut out = names.join("\n");
        out.push('\n');
        fs::write(path, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layer_is_active() {
        let reg = LayerRegistry::default();
        assert!(reg.is_active(DEFAULT_LAYER));
    }

    #[test]
    fn unknown_layer_is_inactive() {
        let reg = LayerRegistry::default();
        assert!(!reg.is_active("Ghost"));
    }

    #[test]
    fn reverse_index_tracks_membership() {
        let mut reg = LayerRegistry::default();
        reg.register("UI");
        reg.index_entity("UI", EntityId(3));
        reg.index_entity("UI", EntityId(3)); // duplicate insert ignored
        assert_eq!(reg.entities_on("UI"), &[EntityId(3)]);
        reg.unindex_entity("UI", EntityId(3));
        assert!(reg.entities_on("UI").is_empty());
    }

    #[test]
    fn deactivation_round_trips() {
        let mut reg = LayerRegistry::default();
        reg.register("Background");
        reg.set_active("Background", false);
        assert!(!reg.is_active("Background"));
        reg.set_active("Background", true);
        assert!(reg.is_active("Background"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.txt");
        let mut reg = LayerRegistry::default();
        reg.register("UI");
        reg.register("Background");
        reg.save_to_file(&path).unwrap();

        let mut loaded = LayerRegistry::default();
        loaded.load_from_file(&path).unwrap();
        assert!(loaded.is_registered("UI"));
        assert!(loaded.is_registered("Background"));
        assert!(loaded.is_active("UI"));
    }
}
