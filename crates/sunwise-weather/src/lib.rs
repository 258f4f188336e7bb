//! Weather service for Sunwise
//!
//! Provides current conditions, UV index and a daily forecast via the
//! Open-Meteo API, plus location sources with a fixed fallback coordinate.

pub mod location;
pub mod provider;
pub mod types;

pub use location::{resolve_location, FixedLocation, IpLocation, LocationSource, NoLocation};
pub use provider::WeatherProvider;
pub use types::*;
