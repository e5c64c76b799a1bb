//! Scene persistence.
//!
//! Scenes are JSON tables of tables: the top level maps the decimal
//! entity id to an entity table, which holds a `Name` sub-table (name,
//! parent id, tag, layer) plus one sub-table per component, keyed by the
//! component's scene key. See [`serialize`] for the save/load passes and
//! prefab instantiation.

pub mod serialize;

use thiserror::Error;

pub use serialize::{instantiate_prefab, load_scene, save_scene};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene io: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed scene: {0}")]
    Malformed(String),
    #[error("entity pool exhausted while instantiating scene")]
    Pool(#[from] crate::entity::factory::PoolError),
}
