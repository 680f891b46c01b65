use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::Endpoints,
    error::{DashboardError, Endpoint},
    model::{
        AirQuality, Coordinates, CurrentConditions, Forecast, ForecastEntry, Pollutants,
        UnitSystem,
    },
};

use super::{GeoCandidate, WeatherApi};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the OpenWeather geocoding, weather, forecast and
/// air-pollution endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, endpoints: Endpoints) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { api_key, endpoints, http })
    }

    fn weather_url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoints.weather_base.trim_end_matches('/'))
    }

    fn coordinate_query(&self, at: Coordinates, unit: Option<UnitSystem>) -> Vec<(&str, String)> {
        let mut query = vec![
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
        ];
        if let Some(unit) = unit {
            query.push(("units", unit.as_str().to_string()));
        }
        query.push(("appid", self.api_key.clone()));
        query
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, DashboardError> {
        tracing::debug!(%endpoint, url, "sending OpenWeather request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| DashboardError::fetch(endpoint, format!("failed to send request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| DashboardError::fetch(endpoint, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(DashboardError::fetch(
                endpoint,
                format!("status {status}: {}", truncate_body(&body)),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| DashboardError::fetch(endpoint, format!("malformed JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeo {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    visibility: Option<u32>,
    wind: OwWind,
    sys: OwSys,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwTemp {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwTemp,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwAqi {
    aqi: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwComponents {
    co: f64,
    no: f64,
    no2: f64,
    o3: f64,
    so2: f64,
    pm2_5: f64,
    pm10: f64,
    nh3: f64,
}

#[derive(Debug, Deserialize)]
struct OwPollutionEntry {
    main: OwAqi,
    #[serde(default)]
    components: OwComponents,
}

#[derive(Debug, Deserialize)]
struct OwPollutionResponse {
    list: Vec<OwPollutionEntry>,
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn geocode(&self, city: &str) -> Result<Vec<GeoCandidate>, DashboardError> {
        let url = format!("{}/direct", self.endpoints.geo_base.trim_end_matches('/'));
        let query = [
            ("q", city.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.api_key.clone()),
        ];

        let matches: Vec<OwGeo> = self.get_json(Endpoint::Geocoding, &url, &query).await?;

        Ok(matches
            .into_iter()
            .map(|g| GeoCandidate {
                name: g.name,
                country: g.country,
                coordinates: Coordinates::new(g.lat, g.lon),
            })
            .collect())
    }

    async fn current(
        &self,
        at: Coordinates,
        unit: UnitSystem,
    ) -> Result<CurrentConditions, DashboardError> {
        let endpoint = Endpoint::Current;
        let parsed: OwCurrentResponse = self
            .get_json(endpoint, &self.weather_url("weather"), &self.coordinate_query(at, Some(unit)))
            .await?;

        let (description, icon) = describe(&parsed.weather);

        Ok(CurrentConditions {
            city: parsed.name,
            country: parsed.sys.country,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            pressure_hpa: parsed.main.pressure,
            visibility_m: parsed.visibility,
            sunrise: unix_to_utc(endpoint, parsed.sys.sunrise)?,
            sunset: unix_to_utc(endpoint, parsed.sys.sunset)?,
            observed_at: unix_to_utc(endpoint, parsed.dt)?,
            utc_offset_secs: parsed.timezone,
            description,
            icon,
        })
    }

    async fn forecast(
        &self,
        at: Coordinates,
        unit: UnitSystem,
    ) -> Result<Forecast, DashboardError> {
        let endpoint = Endpoint::Forecast;
        let parsed: OwForecastResponse = self
            .get_json(endpoint, &self.weather_url("forecast"), &self.coordinate_query(at, Some(unit)))
            .await?;

        let entries = parsed
            .list
            .into_iter()
            .map(|e| {
                let (description, icon) = describe(&e.weather);
                Ok(ForecastEntry {
                    time: unix_to_utc(endpoint, e.dt)?,
                    temperature: e.main.temp,
                    description,
                    icon,
                })
            })
            .collect::<Result<Vec<_>, DashboardError>>()?;

        Ok(Forecast { utc_offset_secs: parsed.city.timezone, entries })
    }

    async fn air_quality(&self, at: Coordinates) -> Result<AirQuality, DashboardError> {
        let endpoint = Endpoint::AirQuality;
        let parsed: OwPollutionResponse = self
            .get_json(endpoint, &self.weather_url("air_pollution"), &self.coordinate_query(at, None))
            .await?;

        let entry = parsed
            .list
            .into_iter()
            .next()
            .ok_or_else(|| DashboardError::fetch(endpoint, "response contained no data"))?;

        let c = entry.components;
        Ok(AirQuality {
            index: entry.main.aqi,
            components: Pollutants {
                co: c.co,
                no: c.no,
                no2: c.no2,
                o3: c.o3,
                so2: c.so2,
                pm2_5: c.pm2_5,
                pm10: c.pm10,
                nh3: c.nh3,
            },
        })
    }
}

fn describe(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

fn unix_to_utc(endpoint: Endpoint, ts: i64) -> Result<DateTime<Utc>, DashboardError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| DashboardError::fetch(endpoint, format!("timestamp {ts} out of range")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
