use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::DashboardError,
    model::{AirQuality, Coordinates, CurrentConditions, Forecast, UnitSystem},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// One geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoCandidate {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
}

/// The upstream calls a fetch cycle is made of.
///
/// Each method is one HTTP request; aggregation and windowing live in
/// [`crate::fetcher`].
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// Best geocoding matches for `city`; an empty list means "not found".
    async fn geocode(&self, city: &str) -> Result<Vec<GeoCandidate>, DashboardError>;

    async fn current(
        &self,
        at: Coordinates,
        unit: UnitSystem,
    ) -> Result<CurrentConditions, DashboardError>;

    async fn forecast(&self, at: Coordinates, unit: UnitSystem)
    -> Result<Forecast, DashboardError>;

    async fn air_quality(&self, at: Coordinates) -> Result<AirQuality, DashboardError>;
}
