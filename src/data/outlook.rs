//! Forecast weather from the OpenWeatherMap 5-day/3-hour endpoint.
//!
//! The provider returns sub-daily records; we aggregate them to one row per
//! calendar day (mean temperature, summed rain-in-window) before anything
//! downstream sees them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::WeatherPoint;
use crate::error::AppError;

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

pub struct OutlookClient {
    client: Client,
    latitude: f64,
    longitude: f64,
    api_key: String,
}

impl OutlookClient {
    pub fn new(latitude: f64, longitude: f64, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            latitude,
            longitude,
            api_key: api_key.to_string(),
        }
    }

    /// Fetch the 3-hourly forecast and aggregate to the first `days` days.
    pub fn fetch_daily(&self, days: u32) -> Result<Vec<WeatherPoint>, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::input(
                "Missing forecast-provider API key (config.json api_key or API_KEY env var).",
            ));
        }

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("lat", self.latitude.to_string()),
                ("lon", self.longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .map_err(|e| AppError::external(format!("Forecast weather request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::external(format!(
                "Forecast weather request failed with status {}.",
                resp.status()
            )));
        }

        let body: OutlookResponse = resp
            .json()
            .map_err(|e| AppError::external(format!("Failed to parse forecast response: {e}")))?;

        let mut daily = aggregate_daily(&body)?;
        daily.truncate(days as usize);
        Ok(daily)
    }
}

#[derive(Debug, Deserialize)]
struct OutlookResponse {
    list: Vec<OutlookEntry>,
}

#[derive(Debug, Deserialize)]
struct OutlookEntry {
    /// Timestamp like `2024-01-01 12:00:00`; the date part keys the aggregation.
    dt_txt: String,
    main: OutlookMain,
    #[serde(default)]
    rain: Option<OutlookRain>,
}

#[derive(Debug, Deserialize)]
struct OutlookMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OutlookRain {
    /// Rain volume (mm) over the 3-hour window; absent means no rain.
    #[serde(rename = "3h", default)]
    three_h: Option<f64>,
}

/// Aggregate sub-daily samples to daily mean temperature and summed rain.
fn aggregate_daily(body: &OutlookResponse) -> Result<Vec<WeatherPoint>, AppError> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize, f64)> = BTreeMap::new();

    for entry in &body.list {
        let raw_date = entry.dt_txt.split(' ').next().unwrap_or(&entry.dt_txt);
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            AppError::external(format!("Invalid forecast timestamp '{}': {e}", entry.dt_txt))
        })?;
        let rain = entry
            .rain
            .as_ref()
            .and_then(|r| r.three_h)
            .unwrap_or(0.0);

        let bucket = buckets.entry(date).or_insert((0.0, 0, 0.0));
        bucket.0 += entry.main.temp;
        bucket.1 += 1;
        bucket.2 += rain;
    }

    Ok(buckets
        .into_iter()
        .map(|(date, (temp_sum, n, rain_sum))| WeatherPoint {
            date,
            temp_c: Some(temp_sum / n as f64),
            rain_mm: Some(rain_sum),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_three_hourly_samples_per_day() {
        let raw = r#"{
            "list": [
                {"dt_txt": "2024-01-01 09:00:00", "main": {"temp": 24.0}, "rain": {"3h": 1.0}},
                {"dt_txt": "2024-01-01 12:00:00", "main": {"temp": 28.0}},
                {"dt_txt": "2024-01-02 09:00:00", "main": {"temp": 30.0}, "rain": {"3h": 2.5}}
            ]
        }"#;
        let body: OutlookResponse = serde_json::from_str(raw).unwrap();
        let daily = aggregate_daily(&body).unwrap();

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        // Mean of 24 and 28; the sample without a rain block counts as 0mm.
        assert_eq!(daily[0].temp_c, Some(26.0));
        assert_eq!(daily[0].rain_mm, Some(1.0));
        assert_eq!(daily[1].rain_mm, Some(2.5));
    }

    #[test]
    fn rejects_malformed_timestamps() {
        let raw = r#"{"list": [{"dt_txt": "bogus", "main": {"temp": 20.0}}]}"#;
        let body: OutlookResponse = serde_json::from_str(raw).unwrap();
        let err = aggregate_daily(&body).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::External);
    }
}
