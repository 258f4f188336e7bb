use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sunwise_core::error::ReqwestErrorExt;
use sunwise_core::{AppError, NetworkError};

/// Days shown in the forecast strip
pub const FORECAST_DAYS: usize = 5;

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Whether it's worth going out to tan
    pub fn is_sunny(&self) -> bool {
        matches!(self, Self::Clear | Self::PartlyCloudy)
    }
}

/// UV intensity bands used to colour the reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl UvLevel {
    pub fn from_index(uv_index: f64) -> Self {
        if uv_index < 3.0 {
            Self::Low
        } else if uv_index < 6.0 {
            Self::Moderate
        } else if uv_index < 8.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city_name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            city_name: None,
        }
    }
}

/// Daily forecast as parallel arrays, the way Open-Meteo returns it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    pub time: Vec<String>,
    pub weather_code: Vec<i32>,
    pub max_temp: Vec<f64>,
    pub min_temp: Vec<f64>,
}

/// One row of the daily forecast
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    pub date: Option<NaiveDate>,
    pub condition: WeatherCondition,
    pub high: f64,
    pub low: f64,
}

impl DailyForecast {
    /// Zip the parallel arrays into rows; stops at the shortest array.
    pub fn days(&self) -> Vec<DayForecast> {
        self.time
            .iter()
            .zip(&self.weather_code)
            .zip(self.max_temp.iter().zip(&self.min_temp))
            .map(|((time, code), (high, low))| DayForecast {
                date: NaiveDate::parse_from_str(time, "%Y-%m-%d").ok(),
                condition: WeatherCondition::from_wmo_code(*code),
                high: *high,
                low: *low,
            })
            .collect()
    }
}

/// Current conditions plus optional daily forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub temperature: f64,
    pub uv_index: f64,
    pub weather_code: i32,
    #[serde(default)]
    pub daily: Option<DailyForecast>,
}

impl WeatherData {
    /// Placeholder conditions used when the weather service can't be reached
    pub fn fallback() -> Self {
        Self {
            temperature: 20.0,
            uv_index: 5.0,
            weather_code: 0,
            daily: None,
        }
    }

    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }

    pub fn uv_level(&self) -> UvLevel {
        UvLevel::from_index(self.uv_index)
    }

    /// Forecast rows for display, capped at [`FORECAST_DAYS`]
    pub fn forecast(&self) -> Vec<DayForecast> {
        self.daily
            .as_ref()
            .map(|daily| daily.days().into_iter().take(FORECAST_DAYS).collect())
            .unwrap_or_default()
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<WeatherError> for NetworkError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Network(e) => e.into_network_error(),
            WeatherError::Api { status, message } => NetworkError::ServerError { status, message },
            WeatherError::Parse(message) => NetworkError::InvalidResponse(message),
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        AppError::Network(err.into())
    }
}
