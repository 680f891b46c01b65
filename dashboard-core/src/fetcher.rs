//! Joins the three weather requests of a fetch cycle into one snapshot.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::collections::HashSet;

use crate::{
    error::DashboardError,
    model::{ForecastEntry, Location, UnitSystem, WeatherSnapshot},
    provider::WeatherApi,
};

/// Entries shown in the hourly strip (3-hour slices, so one day).
pub const HOURLY_WINDOW: usize = 8;

/// Fetch current conditions, forecast and air quality for `location`.
///
/// The requests run concurrently and the first failure aborts the whole
/// cycle; no partial snapshot is ever returned.
pub async fn fetch_all(
    api: &dyn WeatherApi,
    location: Location,
    unit: UnitSystem,
) -> Result<WeatherSnapshot, DashboardError> {
    let at = location.coordinates;

    let (current, forecast, air_quality) =
        tokio::try_join!(api.current(at, unit), api.forecast(at, unit), api.air_quality(at))?;

    let hourly = hourly_window(&forecast.entries);
    let daily = daily_representatives(&forecast.entries, forecast.utc_offset_secs);

    tracing::debug!(
        hourly = hourly.len(),
        daily = daily.len(),
        aqi = air_quality.index,
        %unit,
        "fetched weather snapshot"
    );

    Ok(WeatherSnapshot { location, unit, current, hourly, daily, air_quality })
}

pub fn hourly_window(entries: &[ForecastEntry]) -> Vec<ForecastEntry> {
    entries.iter().take(HOURLY_WINDOW).cloned().collect()
}

/// One entry per calendar date in the city's local time, chronological,
/// first occurrence wins.
pub fn daily_representatives(entries: &[ForecastEntry], utc_offset_secs: i32) -> Vec<ForecastEntry> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or(Utc.fix());

    let mut ordered: Vec<&ForecastEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.time);

    let mut seen: HashSet<NaiveDate> = HashSet::new();
    ordered
        .into_iter()
        .filter(|e| seen.insert(e.time.with_timezone(&offset).date_naive()))
        .cloned()
        .collect()
}
