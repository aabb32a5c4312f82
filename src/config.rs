use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8090;
const CONFIG_FILE_NAME: &str = "config.json";
const FAVORITES_FILE_NAME: &str = "favorites.json";
const MUSIC_DIRECTORY_KEY: &str = "music_directory";

/// The library scope every scan and guard check runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Normalized value as written to the config file.
    pub music_directory: String,
    /// Absolute form of `music_directory`, if it has one.
    pub media_root: Option<PathBuf>,
}

impl LibraryConfig {
    pub fn from_raw(raw: &str) -> Self {
        let music_directory = normalize_music_dir(raw);
        let media_root = absolute_root(&music_directory);
        Self {
            music_directory,
            media_root,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.media_root.as_deref()
    }

    pub fn root_exists(&self) -> bool {
        self.media_root.as_deref().is_some_and(Path::exists)
    }
}

/// Trims, converts backslashes, and restores the leading slash on NAS style
/// `volume1/...` paths.
pub fn normalize_music_dir(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        return String::new();
    }
    let value = value.replace('\\', "/");
    if value.starts_with("vol") {
        return format!("/{value}");
    }
    value
}

fn absolute_root(normalized: &str) -> Option<PathBuf> {
    if normalized.is_empty() {
        return None;
    }
    std::path::absolute(normalized).ok()
}

#[derive(Debug, Error)]
pub enum ConfigUpdateError {
    #[error("music_directory is required")]
    Required,
    #[error("invalid path")]
    InvalidPath,
    #[error("directory not found")]
    DirectoryNotFound,
    #[error("config path not set")]
    NoConfigPath,
    #[error("failed to save config")]
    Save,
}

/// Reads the config file as a JSON object. Missing, unreadable or non-object
/// files read as empty.
pub fn load_document(path: Option<&Path>) -> Map<String, Value> {
    let Some(path) = path else {
        return Map::new();
    };
    if !path.exists() {
        return Map::new();
    }

    let parsed = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))
        .and_then(|raw| {
            serde_json::from_str::<Value>(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))
        });
    match parsed {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::warn!("config file {} is not a JSON object", path.display());
            Map::new()
        }
        Err(err) => {
            tracing::warn!("{err:#}");
            Map::new()
        }
    }
}

/// Merges `updates` over the stored document and writes the result back.
pub fn save_merged(path: &Path, updates: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut current = load_document(Some(path));
    current.extend(updates);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&Value::Object(current.clone()))?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(current)
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Owns the config file and the active [`LibraryConfig`]. All writes go
/// through [`ConfigStore::set_music_directory`].
pub struct ConfigStore {
    path: Option<PathBuf>,
    env_music_dir: RwLock<Option<String>>,
    write_lock: Mutex<()>,
    active: RwLock<Arc<LibraryConfig>>,
}

impl ConfigStore {
    /// A non-blank `env_music_dir` takes precedence over the file's value.
    pub fn open(path: Option<PathBuf>, env_music_dir: Option<String>) -> Self {
        let raw = match env_music_dir.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(value) => value.to_string(),
            None => load_document(path.as_deref())
                .get(MUSIC_DIRECTORY_KEY)
                .map(value_as_text)
                .unwrap_or_default(),
        };
        let active = LibraryConfig::from_raw(&raw);
        tracing::info!(
            "media root: {}",
            active
                .media_root
                .as_deref()
                .map(|root| root.display().to_string())
                .unwrap_or_else(|| String::from("(not configured)"))
        );

        Self {
            path,
            env_music_dir: RwLock::new(env_music_dir),
            write_lock: Mutex::new(()),
            active: RwLock::new(Arc::new(active)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The `MUSIC_DIR` value in effect. Starts as the startup environment
    /// value and follows every successful update.
    pub fn env_music_dir(&self) -> Option<String> {
        self.env_music_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current(&self) -> Arc<LibraryConfig> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn document(&self) -> Map<String, Value> {
        load_document(self.path.as_deref())
    }

    /// `music_directory` as stored in the file, ignoring the environment.
    pub fn stored_music_directory(&self) -> Option<String> {
        self.document().get(MUSIC_DIRECTORY_KEY).map(value_as_text)
    }

    pub fn set_music_directory(
        &self,
        raw: Option<&str>,
    ) -> Result<Arc<LibraryConfig>, ConfigUpdateError> {
        let value = normalize_music_dir(raw.unwrap_or_default());
        if value.is_empty() {
            return Err(ConfigUpdateError::Required);
        }
        let root = std::path::absolute(&value).map_err(|_| ConfigUpdateError::InvalidPath)?;
        if !root.is_dir() {
            return Err(ConfigUpdateError::DirectoryNotFound);
        }
        let Some(path) = self.path.as_deref() else {
            return Err(ConfigUpdateError::NoConfigPath);
        };

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updates = Map::new();
        updates.insert(MUSIC_DIRECTORY_KEY.to_string(), Value::String(value.clone()));
        save_merged(path, updates).map_err(|err| {
            tracing::error!("{err:#}");
            ConfigUpdateError::Save
        })?;

        let next = Arc::new(LibraryConfig {
            music_directory: value,
            media_root: Some(root),
        });
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        *self.env_music_dir.write().unwrap_or_else(PoisonError::into_inner) =
            Some(next.music_directory.clone());
        tracing::info!("media root changed to {}", next.music_directory);
        Ok(next)
    }
}

/// Process settings gathered from the environment and the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub ui_dir: PathBuf,
    pub favorites_file: PathBuf,
    pub config_path: Option<PathBuf>,
    pub env_music_dir: Option<String>,
}

impl ServerSettings {
    pub fn resolve<F>(lookup: F, app_root: &Path) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let pkgvar = var("TRIM_PKGVAR").map(PathBuf::from);

        let config_path = var("CONFIG_FILE")
            .map(PathBuf::from)
            .or_else(|| pkgvar.as_ref().map(|dir| dir.join(CONFIG_FILE_NAME)));
        let document = load_document(config_path.as_deref());

        let port = var("PORT")
            .and_then(|raw| raw.trim().parse().ok())
            .or_else(|| document.get("port").and_then(port_from_value))
            .unwrap_or(DEFAULT_PORT);
        let host = var("HOST")
            .or_else(|| document.get("host").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| String::from(DEFAULT_HOST));

        let ui_dir = var("UI_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| app_root.join("ui"));
        let favorites_file = var("FAVORITES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                pkgvar
                    .as_deref()
                    .unwrap_or(app_root)
                    .join(FAVORITES_FILE_NAME)
            });

        Self {
            host,
            port,
            ui_dir,
            favorites_file,
            config_path,
            env_music_dir: lookup("MUSIC_DIR"),
        }
    }
}

fn port_from_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|port| u16::try_from(port).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
