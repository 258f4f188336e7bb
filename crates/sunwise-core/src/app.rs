use std::sync::Arc;

use crate::error::AppError;

use crate::store::{ProfileStore, Theme};
use crate::Config;

/// Application state and lifecycle: configuration plus the persisted profile.
pub struct App {
    config: Arc<Config>,
    store: Arc<ProfileStore>,
}

impl App {
    /// Load and validate configuration, then open local storage.
    pub fn new() -> Result<Self, AppError> {
        let (config, _) = Config::load_validated()?;
        Ok(Self::with_config(config))
    }

    /// Build an application around an already loaded configuration.
    pub fn with_config(config: Config) -> Self {
        let default_theme = if config.ui.dark_mode_default {
            Theme::Dark
        } else {
            Theme::Light
        };
        let store = ProfileStore::open(&config.config_dir, default_theme);

        tracing::info!("Application initialized (config dir {:?})", config.config_dir);

        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the profile store
    pub fn store(&self) -> Arc<ProfileStore> {
        self.store.clone()
    }
}
