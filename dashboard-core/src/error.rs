use std::fmt;

/// Which upstream call a [`DashboardError::Fetch`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Geocoding,
    Current,
    Forecast,
    AirQuality,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Geocoding => "geocoding",
            Endpoint::Current => "current weather",
            Endpoint::Forecast => "forecast",
            Endpoint::AirQuality => "air quality",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of a fetch cycle. Each one ends up as a single user-facing alert.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("City '{query}' not found")]
    NotFound { query: String },

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("{endpoint} request failed: {reason}")]
    Fetch { endpoint: Endpoint, reason: String },
}

impl DashboardError {
    pub(crate) fn fetch(endpoint: Endpoint, reason: impl fmt::Display) -> Self {
        DashboardError::Fetch { endpoint, reason: reason.to_string() }
    }

    /// Message shown to the user when a cycle fails.
    pub fn alert_message(&self) -> &'static str {
        match self {
            DashboardError::NotFound { .. } => "City not found, please try again",
            DashboardError::LocationUnavailable(_) => {
                "Unable to get your location. Please search for a city manually."
            }
            DashboardError::Fetch { endpoint: Endpoint::Geocoding, .. } => {
                "City not found, please try again"
            }
            DashboardError::Fetch { .. } => "Error loading weather data. Please try again",
        }
    }
}
