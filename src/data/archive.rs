//! Historical daily climate from the Open-Meteo archive API.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::WeatherPoint;
use crate::error::AppError;

const BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

pub struct ArchiveClient {
    client: Client,
    latitude: f64,
    longitude: f64,
}

impl ArchiveClient {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            client: Client::new(),
            latitude,
            longitude,
        }
    }

    /// Fetch one row per day over the closed range `[start, end]`.
    ///
    /// An empty result (no station coverage for the point/range) comes back
    /// as `Ok(vec![])`; callers decide how to report that.
    pub fn fetch_daily(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherPoint>, AppError> {
        if end < start {
            return Err(AppError::input(format!(
                "Invalid weather range: {end} is before {start}."
            )));
        }

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
                ("daily", "temperature_2m_mean,precipitation_sum".to_string()),
                ("timezone", "UTC".to_string()),
            ])
            .send()
            .map_err(|e| AppError::external(format!("Climate archive request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::external(format!(
                "Climate archive request failed with status {}.",
                resp.status()
            )));
        }

        let body: ArchiveResponse = resp
            .json()
            .map_err(|e| AppError::external(format!("Failed to parse archive response: {e}")))?;

        decode_daily(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

fn decode_daily(body: &ArchiveResponse) -> Result<Vec<WeatherPoint>, AppError> {
    let Some(daily) = &body.daily else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(daily.time.len());
    for (i, raw_date) in daily.time.iter().enumerate() {
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            AppError::external(format!("Invalid archive date '{raw_date}': {e}"))
        })?;
        out.push(WeatherPoint {
            date,
            temp_c: finite_or_none(daily.temperature_2m_mean.get(i).copied().flatten()),
            rain_mm: finite_or_none(daily.precipitation_sum.get(i).copied().flatten()),
        });
    }
    Ok(out)
}

fn finite_or_none(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_daily_block_with_gaps() {
        let raw = r#"{
            "daily": {
                "time": ["2024-01-01", "2024-01-02", "2024-01-03"],
                "temperature_2m_mean": [25.4, null, 27.1],
                "precipitation_sum": [0.0, 5.2, null]
            }
        }"#;
        let body: ArchiveResponse = serde_json::from_str(raw).unwrap();
        let points = decode_daily(&body).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].temp_c, Some(25.4));
        assert_eq!(points[1].temp_c, None);
        assert_eq!(points[1].rain_mm, Some(5.2));
        assert_eq!(points[2].rain_mm, None);
    }

    #[test]
    fn missing_daily_block_is_an_empty_result() {
        let body: ArchiveResponse = serde_json::from_str("{}").unwrap();
        assert!(decode_daily(&body).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_dates() {
        let raw = r#"{
            "daily": {
                "time": ["01/01/2024"],
                "temperature_2m_mean": [25.0],
                "precipitation_sum": [0.0]
            }
        }"#;
        let body: ArchiveResponse = serde_json::from_str(raw).unwrap();
        let err = decode_daily(&body).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::External);
    }
}
