use crate::types::{DailyForecast, Location, WeatherData, WeatherError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use sunwise_core::NetworkError;
use tracing::instrument;

pub const OPEN_METEO_BASE: &str = "https://api.open-meteo.com";

/// Open-Meteo forecast client
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: i32,
    /// Null for some locations at night.
    #[serde(default)]
    uv_index: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    weather_code: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

impl From<ForecastResponse> for WeatherData {
    fn from(resp: ForecastResponse) -> Self {
        Self {
            temperature: resp.current.temperature_2m,
            uv_index: resp.current.uv_index.unwrap_or(0.0).max(0.0),
            weather_code: resp.current.weather_code,
            daily: resp.daily.map(|d| DailyForecast {
                time: d.time,
                weather_code: d.weather_code,
                max_temp: d.temperature_2m_max,
                min_temp: d.temperature_2m_min,
            }),
        }
    }
}

impl WeatherProvider {
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current conditions and the daily forecast for a location.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, location: &Location) -> Result<WeatherData, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", "temperature_2m,weather_code,uv_index"),
                ("daily", "weather_code,temperature_2m_max,temperature_2m_min"),
                ("timezone", "auto"),
                ("wind_speed_unit", "ms"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::debug!(
            "Weather: {}°C, UV {:?}, code {}",
            parsed.current.temperature_2m,
            parsed.current.uv_index,
            parsed.current.weather_code
        );

        Ok(parsed.into())
    }

    /// Like [`fetch`](Self::fetch) but never fails: any error yields
    /// [`WeatherData::fallback`].
    pub async fn fetch_or_default(&self, location: &Location) -> WeatherData {
        match self.fetch(location).await {
            Ok(data) => data,
            Err(e) => {
                let err = NetworkError::from(e);
                tracing::warn!(
                    "Weather fetch failed, using defaults: {} ({})",
                    err,
                    err.user_message()
                );
                WeatherData::fallback()
            }
        }
    }
}
