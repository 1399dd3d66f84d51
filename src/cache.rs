use std::fs;
use std::path::PathBuf;

use crate::core::item::Item;

/// Durable snapshot of the shopping list for cache-only operation.
///
/// Best effort on both ends: `load` falls back to an empty list on missing
/// or corrupt data, and `save` swallows write errors after logging them.
/// Once synced mode is active the cache holds no authoritative copy.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default cache location under the user data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("cesto")
            .join("list.json")
    }

    /// Read the last persisted snapshot.
    pub fn load(&self) -> Vec<Item> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                log::warn!(
                    "Discarding corrupt list cache at {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the snapshot with the current list. Writes go through a
    /// temp sibling and a rename, so a failed write leaves the previous
    /// snapshot untouched.
    pub fn save(&self, items: &[Item]) {
        if let Err(e) = self.try_save(items) {
            log::error!(
                "Failed to persist shopping list to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn try_save(&self, items: &[Item]) -> Result<(), String> {
        let json =
            serde_json::to_string_pretty(items).map_err(|e| format!("serialize list: {}", e))?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| format!("create {}: {}", dir.display(), e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| format!("write {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| format!("rename {}: {}", tmp.display(), e))?;
        Ok(())
    }
}
