use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::error::ConfigError;

/// Stockholm, used when no location can be determined.
pub const DEFAULT_FALLBACK_LATITUDE: f64 = 59.3293;
pub const DEFAULT_FALLBACK_LONGITUDE: f64 = 18.0686;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory (also holds local storage)
    pub config_dir: PathBuf,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Generative-AI advisor settings
    #[serde(default)]
    pub advisor: AdvisorConfig,

    /// Location lookup settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Countdown settings
    #[serde(default)]
    pub timer: TimerConfig,

    /// Presentation preferences
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo API base URL
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Refresh interval in minutes
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_refresh_minutes() -> u32 {
    15
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            refresh_minutes: default_refresh_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Generative Language API base URL
    #[serde(default = "default_advisor_base_url")]
    pub base_url: String,

    /// Model used for every completion
    #[serde(default = "default_advisor_model")]
    pub model: String,

    /// API key (optional, can be set via GEMINI_API_KEY or API_KEY).
    /// Never written back to disk.
    #[serde(default = "default_api_key", skip_serializing)]
    pub api_key: Option<String>,
}

fn default_advisor_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_advisor_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("API_KEY"))
        .ok()
        .filter(|key| !key.trim().is_empty())
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: default_advisor_base_url(),
            model: default_advisor_model(),
            api_key: default_api_key(),
        }
    }
}

impl AdvisorConfig {
    /// Check if an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// IP geolocation endpoint returning `{"latitude": .., "longitude": ..}`.
    /// `None` skips the lookup and uses the fallback coordinate.
    #[serde(default = "default_lookup_url")]
    pub lookup_url: Option<String>,

    #[serde(default = "default_fallback_latitude")]
    pub fallback_latitude: f64,

    #[serde(default = "default_fallback_longitude")]
    pub fallback_longitude: f64,
}

fn default_lookup_url() -> Option<String> {
    Some("https://ipapi.co/json/".to_string())
}

fn default_fallback_latitude() -> f64 {
    DEFAULT_FALLBACK_LATITUDE
}

fn default_fallback_longitude() -> f64 {
    DEFAULT_FALLBACK_LONGITUDE
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            lookup_url: default_lookup_url(),
            fallback_latitude: DEFAULT_FALLBACK_LATITUDE,
            fallback_longitude: DEFAULT_FALLBACK_LONGITUDE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Milliseconds between countdown ticks
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_tick_millis() -> u64 {
    1000
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Theme used until the user toggles it
    #[serde(default)]
    pub dark_mode_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sunwise");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            advisor: AdvisorConfig::default(),
            location: LocationConfig::default(),
            timer: TimerConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::Access(format!("{}: {}", config_path.display(), e))
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        Self::load()?.into_validated()
    }

    /// Validate, logging warnings and rejecting the config on any error.
    pub fn into_validated(self) -> Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        self.validate_url(&self.advisor.base_url, "advisor.base_url", &mut result);

        if let Some(lookup_url) = &self.location.lookup_url {
            self.validate_url(lookup_url, "location.lookup_url", &mut result);
        }

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh disabled (0 minutes)",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if self.advisor.model.trim().is_empty() {
            result.add_error("advisor.model", "Model name must not be empty");
        }

        if !self.advisor.is_configured() {
            result.add_warning(
                "advisor.api_key",
                "No API key configured - advice will use safe defaults",
            );
        }

        if !(-90.0..=90.0).contains(&self.location.fallback_latitude) {
            result.add_error(
                "location.fallback_latitude",
                format!(
                    "Latitude must be between -90 and 90, got {}",
                    self.location.fallback_latitude
                ),
            );
        }

        if !(-180.0..=180.0).contains(&self.location.fallback_longitude) {
            result.add_error(
                "location.fallback_longitude",
                format!(
                    "Longitude must be between -180 and 180, got {}",
                    self.location.fallback_longitude
                ),
            );
        }

        if self.timer.tick_millis == 0 {
            result.add_error("timer.tick_millis", "Tick interval must be greater than 0");
        } else if self.timer.tick_millis != 1000 {
            result.add_warning(
                "timer.tick_millis",
                "Countdown will not run in real time (tick is not 1000 ms)",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Access(format!("{}: {}", parent.display(), e))
            })?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(&config_path, contents).map_err(|e| {
            ConfigError::Access(format!("{}: {}", config_path.display(), e))
        })
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no user config directory".to_string()))?
            .join("sunwise");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.advisor.base_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_lookup_url_optional() {
        let mut config = Config::default();
        config.location.lookup_url = None;
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_fallback_coordinates_range() {
        let mut config = Config::default();
        config.location.fallback_latitude = 91.0;
        config.location.fallback_longitude = -181.0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.fallback_latitude"));
        assert!(result.errors.iter().any(|e| e.field == "location.fallback_longitude"));
    }

    #[test]
    fn test_zero_tick_is_error() {
        let mut config = Config::default();
        config.timer.tick_millis = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "timer.tick_millis"));
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let mut config = Config::default();
        config.advisor.api_key = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "advisor.api_key"));
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let mut config = Config::default();
        config.advisor.api_key = Some("   ".to_string());
        assert!(!config.advisor.is_configured());
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let toml = r#"
            config_dir = "/tmp/sunwise"

            [timer]
            tick_millis = 250
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.timer.tick_millis, 250);
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com");
        assert_eq!(config.advisor.model, "gemini-2.5-flash");
        assert_eq!(config.location.fallback_latitude, DEFAULT_FALLBACK_LATITUDE);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[timer\ntick_millis = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.timer.tick_millis = 0;
        match config.into_validated() {
            Err(ConfigError::Invalid(summary)) => assert!(summary.contains("timer.tick_millis")),
            other => panic!("expected invalid config, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_valid_config_passes_with_warnings() {
        let mut config = Config::default();
        config.advisor.api_key = None;
        let (_, validation) = config.into_validated().unwrap();
        assert!(!validation.warnings.is_empty());
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
