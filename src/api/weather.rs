//! Weather forecast proxy
//!
//! Fetches current conditions and a short forecast from Open-Meteo for a
//! fixed set of growing provinces, maps WMO weather codes to display
//! conditions, and attaches a growth recommendation for dragon fruit.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::error::AppError;
use crate::AppState;

use super::error::ApiError;

/// Supported provinces with Open-Meteo coordinates, in display order.
const PROVINCES: &[(&str, f64, f64)] = &[
    ("Metro Manila", 14.5995, 120.9842),
    ("Cebu", 10.3157, 123.8854),
    ("Davao", 7.1907, 125.4553),
    ("Ilocos Norte", 18.1960, 120.5927),
    ("Cavite", 14.2889, 120.9167),
    ("Laguna", 14.2721, 121.3653),
    ("Batangas", 13.7565, 121.0583),
    ("Rizal", 14.5869, 121.1789),
    ("Quezon", 13.9314, 121.6172),
    ("Pampanga", 15.0437, 120.6925),
];

static PROVINCE_COORDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    PROVINCES
        .iter()
        .map(|(name, lat, lon)| (*name, (*lat, *lon)))
        .collect()
});

const DEFAULT_PROVINCE: &str = "Metro Manila";

/// Map a WMO weather code to a display condition.
///
/// Snow codes (71-77) are mapped to rain; they do not occur at these
/// latitudes but Open-Meteo can still emit them.
fn weather_condition(code: i64) -> &'static str {
    match code {
        0 => "Sunny",
        1..=3 => "Partly Cloudy",
        45..=48 => "Cloudy",
        51..=67 | 80..=82 => "Light Rain",
        71..=77 => "Rain",
        95.. => "Thunderstorm",
        _ => "Cloudy",
    }
}

/// Query parameters for the forecast endpoint.
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    /// Province name; unknown or missing values fall back to Metro Manila.
    pub province: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: OpenMeteoCurrent,
    #[serde(default)]
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: i64,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    time: Vec<String>,
    weather_code: Vec<i64>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

/// One forecast day as rendered by the app.
#[derive(Debug, Serialize)]
pub struct ForecastDay {
    /// Short weekday label ("Mon").
    pub day: String,
    /// Midpoint of the daily min/max temperature, rounded.
    pub temp: i64,
    /// Display condition.
    pub condition: &'static str,
}

/// Weather report for one province.
#[derive(Debug, Serialize)]
pub struct WeatherReport {
    /// Province the report covers.
    pub province: String,
    /// Current temperature, rounded (°C).
    pub temperature: i64,
    /// Current relative humidity (%).
    pub humidity: f64,
    /// Current display condition.
    pub condition: &'static str,
    /// Current wind speed (km/h).
    #[serde(rename = "windSpeed")]
    pub wind_speed: f64,
    /// Upcoming days.
    pub forecast: Vec<ForecastDay>,
    /// Growth recommendation derived from the current conditions.
    pub recommendation: Recommendation,
}

/// Dragon fruit growth recommendation.
#[derive(Debug, Serialize)]
pub struct Recommendation {
    /// Overall assessment: Suitable / Caution / Warning.
    pub status: &'static str,
    /// UI accent color for the assessment.
    pub color: &'static str,
    /// Headline message.
    pub message: &'static str,
    /// Individual observations.
    pub details: Vec<&'static str>,
}

/// Ideal growing range is 20-30°C with 60-80% humidity.
fn growth_recommendation(temperature: i64, humidity: f64, condition: &str) -> Recommendation {
    let mut status = "Suitable";
    let mut color = "green";
    let mut details = Vec::new();

    if temperature < 20 {
        status = "Caution";
        color = "orange";
        details.push("Temperature is below optimal range (20-30°C). Growth may slow down.");
    } else if temperature > 35 {
        status = "Warning";
        color = "red";
        details.push("High temperature detected. Ensure adequate hydration for plants.");
    } else {
        details.push("Temperature is within the ideal range.");
    }

    if humidity < 50.0 {
        details.push("Humidity is low. Consider misting if prolonged.");
    }

    if condition == "Thunderstorm" || condition.contains("Rain") {
        if status == "Suitable" {
            status = "Caution";
            color = "orange";
        }
        details.push("Rain may affect pollination if flowering. Ensure good drainage.");
    } else if condition == "Sunny" {
        details.push("Good sunlight exposure for photosynthesis.");
    }

    Recommendation {
        status,
        color,
        message: "Conditions are excellent for dragon fruit growth.",
        details,
    }
}

/// Short weekday label for an ISO date ("2026-08-07" -> "Fri").
fn weekday_label(iso_date: &str) -> String {
    NaiveDate::parse_from_str(iso_date, "%Y-%m-%d")
        .map(|date| date.format("%a").to_string())
        .unwrap_or_else(|_| iso_date.to_string())
}

async fn fetch_weather(
    state: &AppState,
    province: &str,
) -> Result<WeatherReport, AppError> {
    let (lat, lon) = PROVINCE_COORDS
        .get(province)
        .copied()
        .unwrap_or_else(|| PROVINCE_COORDS[DEFAULT_PROVINCE]);

    let url = format!(
        "{}/v1/forecast",
        state.weather_api_url.trim_end_matches('/')
    );
    let response = state
        .http_client
        .get(&url)
        .query(&[
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m".to_string(),
            ),
            (
                "daily",
                "weather_code,temperature_2m_max,temperature_2m_min".to_string(),
            ),
            ("timezone", "Asia/Singapore".to_string()),
            ("forecast_days", "4".to_string()),
        ])
        .send()
        .await
        .map_err(|err| {
            warn!(error = %err, "Weather upstream request failed");
            AppError::Upstream(err.to_string())
        })?;

    if !response.status().is_success() {
        warn!(status = %response.status(), "Weather upstream returned an error status");
        return Err(AppError::Upstream(format!(
            "weather upstream status {}",
            response.status()
        )));
    }

    let data: OpenMeteoResponse = response.json().await.map_err(|err| {
        warn!(error = %err, "Weather upstream returned a malformed body");
        AppError::Upstream(err.to_string())
    })?;

    let mut forecast = Vec::new();
    if let Some(daily) = &data.daily {
        // Today is index 0; the app shows the next three days.
        for i in 1..4 {
            let (Some(time), Some(code), Some(max), Some(min)) = (
                daily.time.get(i),
                daily.weather_code.get(i),
                daily.temperature_2m_max.get(i),
                daily.temperature_2m_min.get(i),
            ) else {
                break;
            };
            forecast.push(ForecastDay {
                day: weekday_label(time),
                temp: ((max + min) / 2.0).round() as i64,
                condition: weather_condition(*code),
            });
        }
    }

    let temperature = data.current.temperature_2m.round() as i64;
    let condition = weather_condition(data.current.weather_code);
    let recommendation =
        growth_recommendation(temperature, data.current.relative_humidity_2m, condition);

    Ok(WeatherReport {
        province: province.to_string(),
        temperature,
        humidity: data.current.relative_humidity_2m,
        condition,
        wind_speed: data.current.wind_speed_10m,
        forecast,
        recommendation,
    })
}

/// GET /api/weather?province=Name
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<WeatherReport>, ApiError> {
    let province = query
        .province
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_PROVINCE);

    let report = fetch_weather(&state, province).await?;
    Ok(Json(report))
}

/// GET /api/weather/provinces
pub async fn list_provinces() -> Json<Vec<&'static str>> {
    Json(PROVINCES.iter().map(|(name, _, _)| *name).collect())
}
