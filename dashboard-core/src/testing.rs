//! In-memory doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::DateTime;
use std::{
    cell::RefCell,
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    controller::Presenter,
    error::{DashboardError, Endpoint},
    model::{
        AirQuality, Coordinates, CurrentConditions, Forecast, ForecastEntry, Location, Pollutants,
        UnitSystem, WeatherSnapshot,
    },
    provider::{GeoCandidate, WeatherApi},
    render::DashboardView,
};

/// 2023-11-14T00:00:00Z
pub const FIRST_SLOT: i64 = 1_699_920_000;
pub const JAKARTA_OFFSET: i32 = 7 * 3600;

pub fn entry(ts: i64, temperature: f64) -> ForecastEntry {
    ForecastEntry {
        time: DateTime::from_timestamp(ts, 0).unwrap(),
        temperature,
        description: "light rain".to_string(),
        icon: "10d".to_string(),
    }
}

fn to_unit(celsius: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Metric => celsius,
        UnitSystem::Imperial => celsius * 9.0 / 5.0 + 32.0,
    }
}

fn speed_to_unit(mps: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Metric => mps,
        UnitSystem::Imperial => mps * 2.237,
    }
}

fn current_conditions(unit: UnitSystem) -> CurrentConditions {
    CurrentConditions {
        city: "Jakarta".to_string(),
        country: Some("ID".to_string()),
        temperature: to_unit(30.6, unit),
        feels_like: to_unit(34.9, unit),
        humidity_pct: 70,
        wind_speed: speed_to_unit(3.6, unit),
        pressure_hpa: 1009.0,
        visibility_m: Some(10_000),
        sunrise: DateTime::from_timestamp(FIRST_SLOT - 4_500, 0).unwrap(),
        sunset: DateTime::from_timestamp(FIRST_SLOT + 39_600, 0).unwrap(),
        observed_at: DateTime::from_timestamp(FIRST_SLOT, 0).unwrap(),
        utc_offset_secs: JAKARTA_OFFSET,
        description: "scattered clouds".to_string(),
        icon: "03d".to_string(),
    }
}

fn forecast(unit: UnitSystem) -> Forecast {
    Forecast {
        utc_offset_secs: JAKARTA_OFFSET,
        entries: (0..40)
            .map(|i| entry(FIRST_SLOT + i * 3 * 3600, to_unit(26.0 + (i % 8) as f64, unit)))
            .collect(),
    }
}

fn air_quality() -> AirQuality {
    AirQuality {
        index: 3,
        components: Pollutants { pm2_5: 35.2, pm10: 48.9, o3: 61.0, no2: 12.4, ..Default::default() },
    }
}

/// A complete Jakarta snapshot as the fetcher would assemble it.
pub fn snapshot(unit: UnitSystem) -> WeatherSnapshot {
    let forecast = forecast(unit);
    WeatherSnapshot {
        location: Location {
            coordinates: Coordinates::new(-6.2, 106.8),
            name: Some("Jakarta".to_string()),
            country: Some("ID".to_string()),
        },
        unit,
        current: current_conditions(unit),
        hourly: crate::fetcher::hourly_window(&forecast.entries),
        daily: crate::fetcher::daily_representatives(&forecast.entries, forecast.utc_offset_secs),
        air_quality: air_quality(),
    }
}

pub type WeatherCall = (&'static str, Coordinates, Option<UnitSystem>);

/// Scripted [`WeatherApi`] that records every call.
#[derive(Debug, Default)]
pub struct FakeApi {
    cities: HashMap<String, GeoCandidate>,
    failing: Option<Endpoint>,
    slow: HashMap<String, usize>,
    geocode_queries: Mutex<Vec<String>>,
    weather_calls: Mutex<Vec<WeatherCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl FakeApi {
    pub fn jakarta() -> Self {
        Self::default().with_city("Jakarta", "ID", -6.2, 106.8)
    }

    pub fn with_city(mut self, name: &str, country: &str, lat: f64, lon: f64) -> Self {
        self.cities.insert(
            name.to_string(),
            GeoCandidate {
                name: name.to_string(),
                country: country.to_string(),
                coordinates: Coordinates::new(lat, lon),
            },
        );
        self
    }

    pub fn with_no_geocoding_match(mut self) -> Self {
        self.cities.clear();
        self
    }

    pub fn failing(mut self, endpoint: Endpoint) -> Self {
        self.failing = Some(endpoint);
        self
    }

    /// Geocoding `city` yields to the scheduler `yields` times first.
    pub fn slow_city(mut self, city: &str, yields: usize) -> Self {
        self.slow.insert(city.to_string(), yields);
        self
    }

    pub fn geocode_queries(&self) -> Vec<String> {
        lock(&self.geocode_queries).clone()
    }

    pub fn weather_calls(&self) -> Vec<WeatherCall> {
        lock(&self.weather_calls).clone()
    }

    fn check(&self, endpoint: Endpoint) -> Result<(), DashboardError> {
        match self.failing {
            Some(failing) if failing == endpoint => {
                Err(DashboardError::fetch(endpoint, "status 500 Internal Server Error"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl WeatherApi for FakeApi {
    async fn geocode(&self, city: &str) -> Result<Vec<GeoCandidate>, DashboardError> {
        lock(&self.geocode_queries).push(city.to_string());
        for _ in 0..self.slow.get(city).copied().unwrap_or(0) {
            tokio::task::yield_now().await;
        }
        self.check(Endpoint::Geocoding)?;
        Ok(self.cities.get(city).cloned().into_iter().collect())
    }

    async fn current(
        &self,
        at: Coordinates,
        unit: UnitSystem,
    ) -> Result<CurrentConditions, DashboardError> {
        lock(&self.weather_calls).push(("current", at, Some(unit)));
        self.check(Endpoint::Current)?;
        Ok(current_conditions(unit))
    }

    async fn forecast(
        &self,
        at: Coordinates,
        unit: UnitSystem,
    ) -> Result<Forecast, DashboardError> {
        lock(&self.weather_calls).push(("forecast", at, Some(unit)));
        self.check(Endpoint::Forecast)?;
        Ok(forecast(unit))
    }

    async fn air_quality(&self, at: Coordinates) -> Result<AirQuality, DashboardError> {
        lock(&self.weather_calls).push(("air_quality", at, None));
        self.check(Endpoint::AirQuality)?;
        Ok(air_quality())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Loading(bool),
    Rendered(String),
    Alert(String),
}

/// Presenter that records what the user would have seen.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: RefCell<Vec<UiEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Alert(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn rendered_titles(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Rendered(title) => Some(title),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn set_loading(&self, loading: bool) {
        self.events.borrow_mut().push(UiEvent::Loading(loading));
    }

    fn render(&self, view: &DashboardView) {
        self.events.borrow_mut().push(UiEvent::Rendered(view.title()));
    }

    fn alert(&self, message: &str) {
        self.events.borrow_mut().push(UiEvent::Alert(message.to_string()));
    }
}
