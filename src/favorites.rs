use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// JSON array of track paths on disk. Every mutation is one locked
/// load-modify-save cycle.
pub struct FavoritesStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Vec<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.load()
    }

    /// Appends `entry` unless it is already present.
    pub fn add(&self, entry: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.load();
        if !favorites.iter().any(|existing| existing == entry) {
            favorites.push(entry.to_string());
            self.save(&favorites)?;
        }
        Ok(favorites)
    }

    pub fn remove(&self, entry: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut favorites = self.load();
        if let Some(index) = favorites.iter().position(|existing| existing == entry) {
            favorites.remove(index);
            self.save(&favorites)?;
        }
        Ok(favorites)
    }

    fn load(&self) -> Vec<String> {
        if !self.path.exists() {
            return Vec::new();
        }
        let parsed = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read favorites {}", self.path.display()))
            .and_then(|raw| {
                serde_json::from_str::<Vec<String>>(&raw).with_context(|| {
                    format!("failed to parse favorites {}", self.path.display())
                })
            });
        parsed.unwrap_or_else(|err| {
            tracing::warn!("{err:#}");
            Vec::new()
        })
    }

    fn save(&self, favorites: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(favorites)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
