//! Session state and the user actions that drive fetch cycles.
//!
//! Everything runs on one thread. State lives in a `RefCell` that is never
//! borrowed across an `.await`, so each mutation is atomic with respect to
//! other actions. Overlapping fetch cycles are ordered by a generation
//! counter: only the most recently started cycle may commit its result.

use anyhow::{Result, anyhow};
use std::cell::{Cell, RefCell};

use crate::{
    error::DashboardError,
    fetcher,
    geolocation::Geolocator,
    model::{Location, Theme, UnitSystem},
    provider::WeatherApi,
    render::{self, DashboardView},
    resolver,
    store::Preferences,
};

/// Display surface the controller drives.
pub trait Presenter {
    fn set_loading(&self, loading: bool);
    fn render(&self, view: &DashboardView);
    /// Blocking user-facing notification.
    fn alert(&self, message: &str);
}

#[derive(Debug)]
pub enum CycleOutcome {
    /// The cycle committed and its view is on screen.
    Rendered,
    /// A newer cycle started meanwhile; this result was dropped.
    Superseded,
    /// The user was alerted and the previous view was kept.
    Failed(DashboardError),
}

impl CycleOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, CycleOutcome::Rendered)
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub unit: UnitSystem,
    pub current_city: Option<String>,
    pub displayed: Option<DashboardView>,
    generation: u64,
}

enum Target<'a> {
    /// Typed by the user; recorded in recent searches once geocoded.
    Search(&'a str),
    City(&'a str),
    Position(Location),
}

pub struct Dashboard<'a> {
    api: &'a dyn WeatherApi,
    geolocator: &'a dyn Geolocator,
    presenter: &'a dyn Presenter,
    prefs: RefCell<Preferences>,
    state: RefCell<AppState>,
    loading: Cell<bool>,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        api: &'a dyn WeatherApi,
        geolocator: &'a dyn Geolocator,
        presenter: &'a dyn Presenter,
        prefs: Preferences,
        unit: UnitSystem,
    ) -> Self {
        Self {
            api,
            geolocator,
            presenter,
            prefs: RefCell::new(prefs),
            state: RefCell::new(AppState { unit, ..AppState::default() }),
            loading: Cell::new(false),
        }
    }

    pub fn unit(&self) -> UnitSystem {
        self.state.borrow().unit
    }

    pub fn current_city(&self) -> Option<String> {
        self.state.borrow().current_city.clone()
    }

    pub fn displayed(&self) -> Option<DashboardView> {
        self.state.borrow().displayed.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Startup load of the configured city. Not recorded as a search.
    pub async fn load_default(&self, city: &str) -> CycleOutcome {
        self.run_cycle(Target::City(city)).await
    }

    /// Search from the input box. Blank input is ignored.
    pub async fn search(&self, city: &str) -> Option<CycleOutcome> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        Some(self.run_cycle(Target::Search(city)).await)
    }

    /// Re-run a recent search without reordering the list.
    pub async fn select_recent(&self, city: &str) -> CycleOutcome {
        self.run_cycle(Target::City(city)).await
    }

    /// Fetch weather for the device position.
    pub async fn locate(&self) -> CycleOutcome {
        let (generation, unit) = self.begin_cycle();

        match self.geolocator.current_position().await {
            Ok(at) => {
                let location = resolver::resolve_from_coordinates(at.latitude, at.longitude);
                self.complete_cycle(generation, unit, Target::Position(location)).await
            }
            Err(_) if !self.is_latest(generation) => {
                tracing::debug!(generation, "discarding superseded geolocation failure");
                CycleOutcome::Superseded
            }
            Err(e) => {
                tracing::warn!("Geolocation failed: {e}");
                self.presenter.alert(e.alert_message());
                self.show_loading(false);
                CycleOutcome::Failed(e)
            }
        }
    }

    /// Switch units; re-fetches the current city since snapshots are not
    /// converted in place.
    pub async fn set_unit(&self, unit: UnitSystem) -> Option<CycleOutcome> {
        let city = {
            let mut state = self.state.borrow_mut();
            state.unit = unit;
            state.current_city.clone()
        };

        tracing::debug!(%unit, "unit system changed");

        match city {
            Some(city) => Some(self.run_cycle(Target::City(&city)).await),
            None => None,
        }
    }

    pub async fn toggle_unit(&self) -> Option<CycleOutcome> {
        self.set_unit(self.unit().toggled()).await
    }

    pub fn theme(&self) -> Theme {
        self.prefs.borrow().theme()
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        self.prefs.borrow_mut().toggle_theme()
    }

    /// Toggle the current city in favorites; returns the new membership.
    pub fn toggle_favorite(&self) -> Result<bool> {
        let city = self
            .current_city()
            .ok_or_else(|| anyhow!("No city is displayed yet; search for one first."))?;
        self.prefs.borrow_mut().toggle_favorite(&city)
    }

    pub fn is_current_favorite(&self) -> bool {
        self.current_city().is_some_and(|city| self.prefs.borrow().is_favorite(&city))
    }

    pub fn favorites(&self) -> Vec<String> {
        self.prefs.borrow().favorites().to_vec()
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.prefs.borrow().recent_searches().to_vec()
    }

    fn show_loading(&self, loading: bool) {
        self.loading.set(loading);
        self.presenter.set_loading(loading);
    }

    fn start_generation(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        state.generation
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.state.borrow().generation == generation
    }

    /// Claims a new generation and fixes the unit the requests will use.
    fn begin_cycle(&self) -> (u64, UnitSystem) {
        let generation = self.start_generation();
        let unit = self.unit();
        self.show_loading(true);
        (generation, unit)
    }

    async fn run_cycle(&self, target: Target<'_>) -> CycleOutcome {
        let (generation, unit) = self.begin_cycle();
        self.complete_cycle(generation, unit, target).await
    }

    fn record_search(&self, generation: u64, query: &str) {
        if !self.is_latest(generation) {
            return;
        }
        if let Err(e) = self.prefs.borrow_mut().push_recent(query) {
            tracing::warn!("Failed to store recent search: {e:#}");
        }
    }

    async fn complete_cycle(
        &self,
        generation: u64,
        unit: UnitSystem,
        target: Target<'_>,
    ) -> CycleOutcome {
        let result = async {
            let location = match target {
                Target::Search(query) => {
                    let location = resolver::resolve(self.api, query).await?;
                    self.record_search(generation, query);
                    location
                }
                Target::City(city) => resolver::resolve(self.api, city).await?,
                Target::Position(location) => location,
            };
            fetcher::fetch_all(self.api, location, unit).await
        }
        .await;

        if !self.is_latest(generation) {
            tracing::debug!(generation, "discarding superseded fetch cycle");
            return CycleOutcome::Superseded;
        }

        let outcome = match result {
            Ok(snapshot) => {
                let view = render::render(&snapshot);
                tracing::info!(city = %view.title(), %unit, generation, "rendering weather");
                self.presenter.render(&view);

                let mut state = self.state.borrow_mut();
                state.current_city = Some(snapshot.city_name().to_string());
                state.displayed = Some(view);
                CycleOutcome::Rendered
            }
            Err(e) => {
                tracing::warn!(generation, "fetch cycle failed: {e}");
                self.presenter.alert(e.alert_message());
                CycleOutcome::Failed(e)
            }
        };

        self.show_loading(false);
        outcome
    }
}
