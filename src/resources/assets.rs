//! Asset registry: name → handle.
//!
//! The core never decodes textures, fonts, or sounds; it hands out opaque
//! handles the outer layers resolve. A missing asset logs once and
//! resolves to the sentinel handle so the simulation keeps running with a
//! visibly wrong asset instead of stopping.

use std::path::{Path, PathBuf};

use log::warn;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Font,
    Sound,
    Prefab,
    Animation,
}

/// Opaque asset handle. Handle 0 is the missing-asset sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub u32);

impl AssetHandle {
    pub const MISSING: AssetHandle = AssetHandle(0);

    pub fn is_missing(&self) -> bool {
        *self == AssetHandle::MISSING
    }
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    by_name: FxHashMap<(AssetKind, String), AssetHandle>,
    /// Prefab assets also carry the path their table loads from.
    prefab_paths: FxHashMap<String, PathBuf>,
    next: u32,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            by_name: FxHashMap::default(),
            prefab_paths: FxHashMap::default(),
            next: 0,
        }
    }

    /// Register an asset name, issuing a fresh handle. Re-registering the
    /// same name returns the existing handle.
    pub fn register(&mut self, kind: AssetKind, name: impl Into<String>) -> AssetHandle {
        let key = (kind, name.into());
        if let Some(handle) = self.by_name.get(&key) {
            return *handle;
        }
        self.next += 1;
        let handle = AssetHandle(self.next);
        self.by_name.insert(key, handle);
        handle
    }

    /// Register a prefab together with the file its table loads from.
    pub fn register_prefab(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        self.register(AssetKind::Prefab, name.clone());
        self.prefab_paths.insert(name, path.into());
    }

    pub fn prefab_path(&self, name: &str) -> Option<&Path> {
        self.prefab_paths.get(name).map(PathBuf::as_path)
    }

    pub fn try_lookup(&self, kind: AssetKind, name: &str) -> Option<AssetHandle> {
        self.by_name.get(&(kind, name.to_string())).copied()
    }

    /// Handle for a name, or the sentinel with a warning when absent.
    pub fn lookup(&self, kind: AssetKind, name: &str) -> AssetHandle {
        match self.try_lookup(kind, name) {
            Some(handle) => handle,
            None => {
                warn!("asset {name:?} ({kind:?}) not found, using sentinel");
                AssetHandle::MISSING
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
