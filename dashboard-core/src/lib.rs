//! Core library for the `weather-dash` dashboard.
//!
//! This crate defines:
//! - Configuration (API key, endpoints, default city and units)
//! - The OpenWeather client and the location resolver
//! - The fetch pipeline that joins current, forecast and air quality data
//! - Rendering of snapshots into display strings
//! - Persisted preferences and the dashboard controller
//!
//! It is used by `dashboard-cli`, but can also be driven by any other front end
//! that implements [`Presenter`].

pub mod config;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod render;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, Endpoints};
pub use controller::{CycleOutcome, Dashboard, Presenter};
pub use error::{DashboardError, Endpoint};
pub use geolocation::{FixedPosition, Geolocator, IpGeolocator, Unsupported};
pub use model::{Coordinates, Location, Theme, UnitSystem, WeatherSnapshot};
pub use provider::{OpenWeatherClient, WeatherApi};
pub use render::DashboardView;
pub use store::{FileStore, KeyValueStore, MemoryStore, Preferences};
