//! Turns what the user asked for into a [`Location`].

use crate::{
    error::DashboardError,
    model::{Coordinates, Location},
    provider::WeatherApi,
};

/// Geocode `city` to its single best match.
///
/// An empty result set is [`DashboardError::NotFound`]; there is no retry.
pub async fn resolve(api: &dyn WeatherApi, city: &str) -> Result<Location, DashboardError> {
    let query = city.trim();
    if query.is_empty() {
        return Err(DashboardError::NotFound { query: city.to_string() });
    }

    tracing::debug!(query, "resolving city");

    let best = api
        .geocode(query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DashboardError::NotFound { query: query.to_string() })?;

    tracing::debug!(
        name = %best.name,
        country = %best.country,
        lat = best.coordinates.latitude,
        lon = best.coordinates.longitude,
        "resolved city"
    );

    Ok(Location {
        coordinates: best.coordinates,
        name: Some(best.name),
        country: Some(best.country).filter(|c| !c.is_empty()),
    })
}

/// Location for a device position. Name and country come from the weather
/// response later; geocoding is not queried again.
pub fn resolve_from_coordinates(latitude: f64, longitude: f64) -> Location {
    Location { coordinates: Coordinates::new(latitude, longitude), name: None, country: None }
}
