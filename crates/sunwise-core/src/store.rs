//! Process-wide persisted state.
//!
//! `LocalStore` is a string key/value file modelled on browser local storage:
//! it is read once on open and rewritten in full after every mutation.
//! `ProfileStore` layers the typed user and theme entries on top of it and is
//! the only way the rest of the crate stack touches persisted state.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::advice::SessionRecorder;
use crate::error::StorageError;
use crate::profile::{SkinType, SunSession, User};

pub const STORAGE_FILE: &str = "storage.json";
pub const USER_KEY: &str = "sunwise_user";
pub const THEME_KEY: &str = "sunwise_theme";

/// String key/value storage persisted as a single JSON object.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store in `dir`. A missing file means empty storage; an
    /// unreadable or corrupt file is logged and treated as empty.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(STORAGE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt storage file {:?}: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read storage file {:?}: {}", path, e);
                BTreeMap::new()
            }
        };

        tracing::debug!("Opened local storage at {:?} ({} keys)", path, entries.len());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.into());
        self.save()
    }

    pub fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Deserialize a JSON value stored under `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| StorageError::Malformed {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Write(e.to_string()))?;
        self.set_item(key, raw)
    }

    fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        fs::write(&self.path, contents).map_err(|e| StorageError::Write(e.to_string()))
    }
}

/// Display theme, persisted as `"dark"` / `"light"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Typed access to the stored user and theme.
///
/// The user is loaded once on open and cached; every mutation writes
/// through to disk.
#[derive(Debug)]
pub struct ProfileStore {
    inner: RwLock<ProfileState>,
}

#[derive(Debug)]
struct ProfileState {
    storage: LocalStore,
    user: Option<User>,
    theme: Theme,
}

impl ProfileStore {
    pub fn open(dir: &Path, default_theme: Theme) -> Self {
        let storage = LocalStore::open(dir);

        let user = match storage.get_json::<User>(USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Discarding stored profile: {}", e);
                None
            }
        };

        let theme = match storage.get_item(THEME_KEY) {
            Some("dark") => Theme::Dark,
            Some("light") => Theme::Light,
            _ => default_theme,
        };

        Self {
            inner: RwLock::new(ProfileState {
                storage,
                user,
                theme,
            }),
        }
    }

    /// The stored user, or `None` when onboarding is still required.
    pub fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    pub fn needs_onboarding(&self) -> bool {
        self.inner.read().user.is_none()
    }

    pub fn set_user(&self, user: User) -> Result<(), StorageError> {
        let mut state = self.inner.write();
        state.storage.set_json(USER_KEY, &user)?;
        tracing::info!("Saved profile for {}", user.name);
        state.user = Some(user);
        Ok(())
    }

    /// Log out: forget the stored user.
    pub fn clear_user(&self) -> Result<(), StorageError> {
        let mut state = self.inner.write();
        state.user = None;
        state.storage.remove_item(USER_KEY)
    }

    /// Returns the updated user, or `None` if there is no profile.
    pub fn update_skin_type(&self, skin_type: SkinType) -> Result<Option<User>, StorageError> {
        self.mutate_user(|user| user.skin_type = skin_type)
    }

    pub fn theme(&self) -> Theme {
        self.inner.read().theme
    }

    pub fn toggle_theme(&self) -> Result<Theme, StorageError> {
        let mut state = self.inner.write();
        let theme = state.theme.toggled();
        state.storage.set_item(THEME_KEY, theme.as_str())?;
        state.theme = theme;
        Ok(theme)
    }

    fn mutate_user(&self, f: impl FnOnce(&mut User)) -> Result<Option<User>, StorageError> {
        let mut state = self.inner.write();
        let Some(mut user) = state.user.clone() else {
            return Ok(None);
        };
        f(&mut user);
        state.storage.set_json(USER_KEY, &user)?;
        state.user = Some(user.clone());
        Ok(Some(user))
    }
}

impl SessionRecorder for ProfileStore {
    fn record(&self, session: SunSession) {
        let minutes = session.duration_minutes;
        match self.mutate_user(|user| user.record_session(session)) {
            Ok(Some(_)) => tracing::info!("Recorded {} minute sun session", minutes),
            Ok(None) => tracing::warn!("No profile stored, dropping completed session"),
            Err(e) => tracing::error!("Failed to persist session: {}", e),
        }
    }
}
