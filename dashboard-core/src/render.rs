//! Maps a [`WeatherSnapshot`] onto display strings.
//!
//! Formatting only: rounding, unit suffixes, local clock times and icon
//! URLs. Labels always use the unit the snapshot was requested with.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::fmt;

use crate::model::{Coordinates, ForecastEntry, UnitSystem, WeatherSnapshot};

const ICON_BASE: &str = "https://openweathermap.org/img/wn";

/// Large icon used in the current-conditions panel.
pub fn detail_icon_url(icon: &str) -> Option<String> {
    (!icon.is_empty()).then(|| format!("{ICON_BASE}/{icon}@2x.png"))
}

/// Small icon used in the hourly and daily lists.
pub fn list_icon_url(icon: &str) -> Option<String> {
    (!icon.is_empty()).then(|| format!("{ICON_BASE}/{icon}.png"))
}

pub fn map_url(at: Coordinates) -> String {
    let (lat, lon) = (at.latitude, at.longitude);
    format!("https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=10/{lat}/{lon}")
}

pub fn format_temperature(value: f64, unit: UnitSystem) -> String {
    format!("{}{}", value.round() as i64, unit.temperature_suffix())
}

pub fn format_wind(value: f64, unit: UnitSystem) -> String {
    format!("{value:.1} {}", unit.speed_suffix())
}

fn format_clock(time: DateTime<Utc>, offset: FixedOffset) -> String {
    time.with_timezone(&offset).format("%-I:%M %p").to_string()
}

fn format_day(time: DateTime<Utc>, offset: FixedOffset) -> String {
    time.with_timezone(&offset).format("%a, %b %-d").to_string()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCell {
    pub label: String,
    pub temperature: String,
    pub description: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityView {
    pub index: u8,
    pub label: &'static str,
    pub pm2_5: String,
    pub pm10: String,
    pub o3: String,
    pub no2: String,
}

/// Everything the dashboard shows for one committed fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub city: String,
    pub country: Option<String>,
    pub unit: UnitSystem,
    pub temperature: String,
    pub feels_like: String,
    pub description: String,
    pub icon_url: Option<String>,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub visibility: String,
    pub sunrise: String,
    pub sunset: String,
    pub updated: String,
    pub hourly: Vec<ForecastCell>,
    pub daily: Vec<ForecastCell>,
    pub air_quality: AirQualityView,
    pub map_url: String,
}

impl DashboardView {
    pub fn title(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {country}", self.city),
            None => self.city.clone(),
        }
    }
}

pub fn render(snapshot: &WeatherSnapshot) -> DashboardView {
    let unit = snapshot.unit;
    let current = &snapshot.current;
    let offset = FixedOffset::east_opt(current.utc_offset_secs).unwrap_or(Utc.fix());

    let cell = |entry: &ForecastEntry, label: String| ForecastCell {
        label,
        temperature: format_temperature(entry.temperature, unit),
        description: title_case(&entry.description),
        icon_url: list_icon_url(&entry.icon),
    };

    let aq = &snapshot.air_quality;

    DashboardView {
        city: snapshot.city_name().to_string(),
        country: snapshot.country().map(str::to_owned),
        unit,
        temperature: format_temperature(current.temperature, unit),
        feels_like: format_temperature(current.feels_like, unit),
        description: title_case(&current.description),
        icon_url: detail_icon_url(&current.icon),
        humidity: format!("{}%", current.humidity_pct),
        wind: format_wind(current.wind_speed, unit),
        pressure: format!("{} hPa", current.pressure_hpa.round() as i64),
        visibility: current
            .visibility_m
            .map(|m| format!("{:.1} km", f64::from(m) / 1000.0))
            .unwrap_or_else(|| "n/a".to_string()),
        sunrise: format_clock(current.sunrise, offset),
        sunset: format_clock(current.sunset, offset),
        updated: format_clock(current.observed_at, offset),
        hourly: snapshot.hourly.iter().map(|e| cell(e, format_clock(e.time, offset))).collect(),
        daily: snapshot.daily.iter().map(|e| cell(e, format_day(e.time, offset))).collect(),
        air_quality: AirQualityView {
            index: aq.index,
            label: aq.label(),
            pm2_5: format!("{:.1}", aq.components.pm2_5),
            pm10: format!("{:.1}", aq.components.pm10),
            o3: format!("{:.1}", aq.components.o3),
            no2: format!("{:.1}", aq.components.no2),
        },
        map_url: map_url(snapshot.location.coordinates),
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  (updated {})", self.title(), self.updated)?;
        writeln!(f, "  {}  {}  feels like {}", self.temperature, self.description, self.feels_like)?;
        if let Some(icon) = &self.icon_url {
            writeln!(f, "  icon: {icon}")?;
        }
        writeln!(
            f,
            "  humidity {}  wind {}  pressure {}  visibility {}",
            self.humidity, self.wind, self.pressure, self.visibility
        )?;
        writeln!(f, "  sunrise {}  sunset {}", self.sunrise, self.sunset)?;
        writeln!(
            f,
            "  air quality: {} ({})  PM2.5 {}  PM10 {}  O3 {}  NO2 {}",
            self.air_quality.label,
            self.air_quality.index,
            self.air_quality.pm2_5,
            self.air_quality.pm10,
            self.air_quality.o3,
            self.air_quality.no2
        )?;

        writeln!(f, "\nHourly")?;
        for cell in &self.hourly {
            writeln!(f, "  {:>8}  {:>6}  {}", cell.label, cell.temperature, cell.description)?;
        }

        writeln!(f, "\nDaily")?;
        for cell in &self.daily {
            writeln!(f, "  {:<11}  {:>6}  {}", cell.label, cell.temperature, cell.description)?;
        }

        write!(f, "\nMap: {}", self.map_url)
    }
}
