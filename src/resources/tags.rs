//! Tag registry.
//!
//! The set of known tags, persisted as a newline-delimited UTF-8 file.
//! Unregistered tags coerce to `"Untagged"` with a warning rather than
//! failing; tags drive discovery ([`find_by_tag`]
//! (crate::entity::factory::EntityFactory::find_by_tag)) and role-based
//! collision dispatch.

use std::fs;
use std::io;
use std::path::Path;

use log::warn;
use rustc_hash::FxHashSet;

use crate::entity::DEFAULT_TAG;

#[derive(Debug, Clone)]
pub struct TagRegistry {
    tags: FxHashSet<String>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        let mut tags = FxHashSet::default();
        tags.insert(DEFAULT_TAG.to_string());
        Self { tags }
    }
}

impl TagRegistry {
    /// Register a tag. Duplicate registrations are harmless.
    pub fn register(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The tag itself when registered, otherwise the default with a
    /// warning line.
    pub fn coerce(&self, tag: &str) -> String {
        if self.is_registered(tag) {
            tag.to_string()
        } else {
            warn!("tag {tag:?} is not registered, coercing to {DEFAULT_TAG:?}");
            DEFAULT_TAG.to_string()
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Load tags from a newline-delimited file, merging into the set.
    /// Blank lines are skipped; names may appear at most once.
    pub fn load_from_file(&mut self, path: &Path) -> io::Result<()> {
        let content = fs::read_to_string(path)?;
        for line in content.lines() {
            let name = line.trim();
            if !name.is_empty() {
                self.tags.insert(name.to_string());
            }
        }
        Ok(())
    }

    /// Save the tag set, one name per line, sorted for stable files.
    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        let mut names: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        names.sort_unstable();
        let mut out = names.join("\n");
        out.push('\n');
        fs::write(path, out)
    }
}
