pub mod advice;
pub mod app;
pub mod config;
pub mod error;
pub mod profile;
pub mod store;

pub use advice::{AdviceProvider, SessionRecorder, SunAdvice};
pub use app::App;
pub use config::{AdvisorConfig, Config, LocationConfig, TimerConfig, UiConfig, WeatherConfig};
pub use error::{AdvisorError, AppError, ConfigError, NetworkError, StorageError};
pub use profile::{ExposureProfile, SkinType, SunSession, User};
pub use store::{LocalStore, ProfileStore, Theme};

use anyhow::Result;

/// Initialize logging for the process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Sunwise core initialized");
    Ok(())
}
