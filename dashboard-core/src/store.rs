//! Persisted preferences: theme, favorite cities and recent searches.
//!
//! Each bucket is stored as text under its own key and is written back
//! synchronously on every mutation.

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

use crate::model::Theme;

pub const THEME_KEY: &str = "theme";
pub const FAVORITES_KEY: &str = "weatherFavorites";
pub const RECENT_KEY: &str = "recentSearches";

/// Most-recent-first capacity of the recent searches list.
pub const RECENT_CAPACITY: usize = 5;

pub trait KeyValueStore: std::fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object on disk, loaded once and rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse preferences file: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize preferences")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}

/// Preference buckets backed by a [`KeyValueStore`].
#[derive(Debug)]
pub struct Preferences {
    store: Box<dyn KeyValueStore>,
    theme: Theme,
    favorites: Vec<String>,
    recent: Vec<String>,
}

impl Preferences {
    /// Read all buckets once. Unreadable values fall back to defaults.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let theme = store
            .get(THEME_KEY)
            .and_then(|raw| match Theme::try_from(raw.as_str()) {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::warn!("Ignoring stored theme: {e}");
                    None
                }
            })
            .unwrap_or_default();

        let favorites = read_list(store.as_ref(), FAVORITES_KEY);
        let mut recent: Vec<String> = read_list(store.as_ref(), RECENT_KEY);
        recent.truncate(RECENT_CAPACITY);

        Self { store, theme, favorites, recent }
    }

    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStore::default()))
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        self.store.set(THEME_KEY, theme.as_str().to_string())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    pub fn is_favorite(&self, city: &str) -> bool {
        self.favorites.iter().any(|f| f == city)
    }

    /// Add or remove `city`; returns whether it is a favorite afterwards.
    pub fn toggle_favorite(&mut self, city: &str) -> Result<bool> {
        let now_favorite = if let Some(pos) = self.favorites.iter().position(|f| f == city) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(city.to_string());
            true
        };

        write_list(self.store.as_mut(), FAVORITES_KEY, &self.favorites)?;
        Ok(now_favorite)
    }

    pub fn recent_searches(&self) -> &[String] {
        &self.recent
    }

    /// Move `city` to the front, dropping the oldest entry past capacity.
    pub fn push_recent(&mut self, city: &str) -> Result<()> {
        self.recent.retain(|c| c != city);
        self.recent.insert(0, city.to_string());
        self.recent.truncate(RECENT_CAPACITY);

        write_list(self.store.as_mut(), RECENT_KEY, &self.recent)
    }
}

fn read_list<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let Some(raw) = store.get(key) else {
        return T::default();
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key, "Ignoring unreadable stored value: {e}");
        T::default()
    })
}

fn write_list<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).with_context(|| format!("Failed to encode {key}"))?;
    store.set(key, json)
}
