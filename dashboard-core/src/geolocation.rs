//! Device position sources.
//!
//! A terminal has no browser geolocation prompt, so the position comes from
//! the command line, from an IP lookup service, or is simply unavailable.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{error::DashboardError, model::Coordinates};

pub const DEFAULT_IP_LOOKUP_BASE: &str = "http://ip-api.com";

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// May suspend until the platform answers. Denial and missing support
    /// both map to [`DashboardError::LocationUnavailable`].
    async fn current_position(&self) -> Result<Coordinates, DashboardError>;
}

/// Position given explicitly, e.g. `--lat/--lon`.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, DashboardError> {
        let Coordinates { latitude, longitude } = self.0;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DashboardError::LocationUnavailable(format!(
                "coordinates ({latitude}, {longitude}) are out of range"
            )));
        }
        Ok(self.0)
    }
}

/// No position source on this platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl Geolocator for Unsupported {
    async fn current_position(&self) -> Result<Coordinates, DashboardError> {
        Err(DashboardError::LocationUnavailable(
            "geolocation is not supported on this platform".to_string(),
        ))
    }
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    base: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new(base: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { base: base.into(), http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinates, DashboardError> {
        let url = format!("{}/json", self.base.trim_end_matches('/'));
        let unavailable = |reason: String| {
            tracing::debug!(%reason, "IP geolocation failed");
            DashboardError::LocationUnavailable(reason)
        };

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(format!("lookup request failed: {e}")))?;

        if !res.status().is_success() {
            return Err(unavailable(format!("lookup returned status {}", res.status())));
        }

        let body: IpLookupResponse =
            res.json().await.map_err(|e| unavailable(format!("malformed lookup response: {e}")))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(unavailable(
                body.message.unwrap_or_else(|| format!("lookup status '{}'", body.status)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_position_returns_coordinates() {
        let pos = FixedPosition(Coordinates::new(-6.2, 106.8));
        assert_eq!(pos.current_position().await.unwrap(), Coordinates::new(-6.2, 106.8));
    }

    #[tokio::test]
    async fn fixed_position_rejects_out_of_range() {
        let pos = FixedPosition(Coordinates::new(123.0, 0.0));
        let err = pos.current_position().await.unwrap_err();
        assert!(matches!(err, DashboardError::LocationUnavailable(_)));
    }

    #[tokio::test]
    async fn unsupported_is_unavailable() {
        let err = Unsupported.current_position().await.unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }
}
