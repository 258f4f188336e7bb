//! Location sources. Every source yields a position once; callers go through
//! [`resolve_location`], which substitutes a fixed coordinate on failure.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use sunwise_core::LocationConfig;

use crate::types::{Location, LocationError};

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_location(&self) -> Result<Location, LocationError>;
}

/// Always reports the same coordinate.
#[derive(Debug, Clone)]
pub struct FixedLocation(pub Location);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Ok(self.0.clone())
    }
}

/// Source that never has a position, as when permission is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// IP-based geolocation over HTTP
#[derive(Debug, Clone)]
pub struct IpLocation {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}

impl IpLocation {
    pub fn new(url: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl LocationSource for IpLocation {
    async fn current_location(&self) -> Result<Location, LocationError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(LocationError::Other(format!(
                "lookup returned {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await?;
        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Location {
                latitude,
                longitude,
                city_name: body.city,
            }),
            _ => Err(LocationError::ServiceUnavailable),
        }
    }
}

/// Build the configured source: IP lookup when a URL is set, otherwise none.
pub fn source_from_config(config: &LocationConfig) -> Box<dyn LocationSource> {
    match &config.lookup_url {
        Some(url) => match IpLocation::new(url) {
            Ok(source) => Box::new(source),
            Err(e) => {
                tracing::warn!("Location lookup disabled: {}", e);
                Box::new(NoLocation)
            }
        },
        None => Box::new(NoLocation),
    }
}

pub fn fallback_from_config(config: &LocationConfig) -> Location {
    Location::new(config.fallback_latitude, config.fallback_longitude)
}

/// Ask `source` once; any failure yields `fallback`.
pub async fn resolve_location(source: &dyn LocationSource, fallback: Location) -> Location {
    match source.current_location().await {
        Ok(location) => {
            tracing::info!("Got location: {}, {}", location.latitude, location.longitude);
            location
        }
        Err(e) => {
            tracing::warn!(
                "Location unavailable ({}), using {}, {}",
                e,
                fallback.latitude,
                fallback.longitude
            );
            fallback
        }
    }
}
