//! Scene save/load and prefab instantiation.
//!
//! Saving walks the arena in insertion order and emits one table per
//! entity under its decimal id; serde_json's map keeps keys sorted so
//! identical worlds produce byte-identical files. Loading is two-pass:
//! the whole file parses and validates before the arena is touched, then
//! pass one creates every entity in ascending saved-id order and pass two
//! binds parents through a saved-id remap table. A load that fails for
//! any reason leaves the previous scene intact and logs one error line.

use std::fs;
use std::path::Path;

use log::{error, info};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::components::{Component, ComponentKind};
use crate::entity::factory::EntityFactory;
use crate::entity::EntityId;
use crate::math::Vec2;
use crate::resources::layers::LayerRegistry;
use crate::resources::tags::TagRegistry;
use crate::scene::SceneError;

/// Key of the per-entity identity sub-table.
const NAME_KEY: &str = "Name";
/// Parent id meaning "root" in the Name sub-table.
const ROOT_PARENT: i64 = -1;

/// Serialize one component to its scene value.
fn component_to_value(component: &Component) -> serde_json::Result<Value> {
    match component {
        Component::Transform(c) => serde_json::to_value(c),
        Component::RigidBody(c) => serde_json::to_value(c),
        Component::RectCollider(c) => serde_json::to_value(c),
        Component::Sprite(c) => serde_json::to_value(c),
        Component::UiSprite(c) => serde_json::to_value(c),
        Component::Animator(c) => serde_json::to_value(c),
        Component::AiStateMachine(c) => serde_json::to_value(c),
        Component::Health(c) => serde_json::to_value(c),
        Component::Explosion(c) => serde_json::to_value(c),
        Component::Spawner(c) => serde_json::to_value(c),
        Component::PlayerController(c) => serde_json::to_value(c),
        Component::AudioSource(c) => serde_json::to_value(c),
        Component::Button(c) => serde_json::to_value(c),
        Component::Label(c) => serde_json::to_value(c),
    }
}

/// Deserialize a component of `kind` from its scene value.
fn component_from_value(kind: ComponentKind, value: Value) -> serde_json::Result<Component> {
    Ok(match kind {
        ComponentKind::Transform => Component::Transform(serde_json::from_value(value)?),
        ComponentKind::RigidBody => Component::RigidBody(serde_json::from_value(value)?),
        ComponentKind::RectCollider => Component::RectCollider(serde_json::from_value(value)?),
        ComponentKind::Sprite => Component::Sprite(serde_json::from_value(value)?),
        ComponentKind::UiSprite => Component::UiSprite(serde_json::from_value(value)?),
        ComponentKind::Animator => Component::Animator(serde_json::from_value(value)?),
        ComponentKind::AiStateMachine => {
            Component::AiStateMachine(serde_json::from_value(value)?)
        }
        ComponentKind::Health => Component::Health(serde_json::from_value(value)?),
        ComponentKind::Explosion => Component::Explosion(serde_json::from_value(value)?),
        ComponentKind::Spawner => Component::Spawner(serde_json::from_value(value)?),
        ComponentKind::PlayerController => {
            Component::PlayerController(serde_json::from_value(value)?)
        }
        ComponentKind::AudioSource => Component::AudioSource(serde_json::from_value(value)?),
        ComponentKind::Button => Component::Button(serde_json::from_value(value)?),
        ComponentKind::Label => Component::Label(serde_json::from_value(value)?),
    })
}

/// Save the whole arena to a scene file.
pub fn save_scene(factory: &EntityFactory, path: &Path) -> Result<(), SceneError> {
    let mut root = Map::new();
    for id in factory.iter_order() {
        let Some(entity) = factory.get(id) else {
            continue;
        };
        let mut table = Map::new();
        let mut name = Map::new();
        name.insert("name".into(), Value::from(entity.name.clone()));
        name.insert(
            "parentID".into(),
            Value::from(entity.parent.map(|p| p.0 as i64).unwrap_or(ROOT_PARENT)),
        );
        name.insert("tag".into(), Value::from(entity.tag.clone()));
        name.insert("layer".into(), Value::from(entity.layer.clone()));
        table.insert(NAME_KEY.into(), Value::Object(name));

        for component in entity.components() {
            table.insert(
                component.kind().scene_key().to_string(),
                component_to_value(component)?,
            );
        }
        root.insert(id.0.to_string(), Value::Object(table));
    }
    let text = serde_json::to_string_pretty(&Value::Object(root))?;
    fs::write(path, text)?;
    Ok(())
}

struct ParsedEntity {
    saved_id: u32,
    name: String,
    parent: Option<u32>,
    tag: String,
    layer: String,
    components: Vec<Component>,
}

/// Parse and validate a scene file without touching any arena.
fn parse_scene(path: &Path) -> Result<Vec<ParsedEntity>, SceneError> {
    let text = fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&text)?;
    let Value::Object(root) = root else {
        return Err(SceneError::Malformed("top level is not a table".into()));
    };

    let mut parsed = Vec::new();
    for (key, value) in root {
        let saved_id: u32 = key
            .parse()
            .map_err(|_| SceneError::Malformed(format!("entity key {key:?} is not an id")))?;
        let Value::Object(table) = value else {
            return Err(SceneError::Malformed(format!(
                "entity {saved_id} is not a table"
            )));
        };
        let Some(Value::Object(name)) = table.get(NAME_KEY) else {
            return Err(SceneError::Malformed(format!(
                "entity {saved_id} has no Name table"
            )));
        };
        let display_name = name
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unnamed")
            .to_string();
        let parent_raw = name
            .get("parentID")
            .and_then(Value::as_i64)
            .unwrap_or(ROOT_PARENT);
        let parent = if parent_raw == ROOT_PARENT {
            None
        } else {
            Some(u32::try_from(parent_raw).map_err(|_| {
                SceneError::Malformed(format!("entity {saved_id} has parent {parent_raw}"))
            })?)
        };
        let tag = name
            .get("tag")
            .and_then(Value::as_str)
            .unwrap_or(crate::entity::DEFAULT_TAG)
            .to_string();
        let layer = name
            .get("layer")
            .and_then(Value::as_str)
            .unwrap_or(crate::entity::DEFAULT_LAYER)
            .to_string();

        let mut components = Vec::new();
        for (key, value) in &table {
            if key == NAME_KEY {
                continue;
            }
            // Unrecognized sub-tables are skipped so newer files still load.
            let Some(kind) = ComponentKind::from_scene_key(key) else {
                info!("scene entity {saved_id}: skipping unknown table {key:?}");
                continue;
            };
            components.push(component_from_value(kind, value.clone())?);
        }
        parsed.push(ParsedEntity {
            saved_id,
            name: display_name,
            parent,
            tag,
            layer,
            components,
        });
    }
    // Ascending saved id keeps creation deterministic.
    parsed.sort_by_key(|e| e.saved_id);

    // Validate parent references up front so loading never has to roll
    // back a half-built scene.
    let known: rustc_hash::FxHashSet<u32> = parsed.iter().map(|e| e.saved_id).collect();
    for entity in &parsed {
        if let Some(parent) = entity.parent {
            if !known.contains(&parent) {
                return Err(SceneError::Malformed(format!(
                    "entity {} references missing parent {}",
                    entity.saved_id, parent
                )));
            }
        }
    }
    Ok(parsed)
}

/// Replace the arena contents with a scene file. On any error the current
/// scene stays as it was.
pub fn load_scene(
    factory: &mut EntityFactory,
    tags: &TagRegistry,
    layers: &mut LayerRegistry,
    path: &Path,
) -> Result<(), SceneError> {
    let parsed = match parse_scene(path) {
        Ok(parsed) => parsed,
        Err(err) => {
            error!("failed to load scene {}: {err}", path.display());
            return Err(err);
        }
    };

    if parsed.len() > factory.capacity() {
        let err = SceneError::Malformed(format!(
            "scene holds {} entities, pool capacity is {}",
            parsed.len(),
            factory.capacity()
        ));
        error!("failed to load scene {}: {err}", path.display());
        return Err(err);
    }

    factory.clear(layers);
    let remap = instantiate(factory, tags, layers, &parsed)?;
    info!(
        "loaded scene {} ({} entities)",
        path.display(),
        remap.len()
    );
    Ok(())
}

/// Instantiate a prefab scene file into the existing arena, offsetting
/// every root entity by `position`. Returns the first root's id.
pub fn instantiate_prefab(
    factory: &mut EntityFactory,
    tags: &TagRegistry,
    layers: &mut LayerRegistry,
    path: &Path,
    position: Vec2,
) -> Result<EntityId, SceneError> {
    let parsed = parse_scene(path)?;
    if parsed.is_empty() {
        return Err(SceneError::Malformed("prefab has no entities".into()));
    }
    let remap = instantiate(factory, tags, layers, &parsed)?;

    let mut first_root = None;
    for entity in &parsed {
        if entity.parent.is_some() {
            continue;
        }
        let id = remap[&entity.saved_id];
        if let Some(t) = factory.get_mut(id).and_then(|e| e.transform_mut()) {
            t.position += position;
        }
        first_root.get_or_insert(id);
    }
    first_root.ok_or_else(|| SceneError::Malformed("prefab has no root entity".into()))
}

/// Pass one creates entities and attaches components under the
/// deserializing flag; pass two binds parents through the remap.
fn instantiate(
    factory: &mut EntityFactory,
    tags: &TagRegistry,
    layers: &mut LayerRegistry,
    parsed: &[ParsedEntity],
) -> Result<FxHashMap<u32, EntityId>, SceneError> {
    let mut remap: FxHashMap<u32, EntityId> = FxHashMap::default();
    for entity in parsed {
        let tag = tags.coerce(&entity.tag);
        let layer = layers.coerce(&entity.layer);
        let id = factory.create(layers, entity.name.clone(), tag, layer)?;
        if let Some(e) = factory.get_mut(id) {
            e.deserializing = true;
            for component in &entity.components {
                e.attach(component.clone());
            }
        }
        remap.insert(entity.saved_id, id);
    }
    for entity in parsed {
        let id = remap[&entity.saved_id];
        if let Some(saved_parent) = entity.parent {
            match remap.get(&saved_parent) {
                Some(parent) => factory.set_parent(id, Some(*parent)),
                None => {
                    return Err(SceneError::Malformed(format!(
                        "entity {} references missing parent {}",
                        entity.saved_id, saved_parent
                    )));
                }
            }
        }
        if let Some(e) = factory.get_mut(id) {
            e.deserializing = false;
        }
    }
    Ok(remap)
}
