//! Process configuration.
//!
//! A small `config.json` holds the forecast-provider API key and the
//! geographic point the business operates from. When the file is absent we
//! fall back to environment variables (loaded through `.env` if present), so
//! containerized runs don't need to ship a config file.

use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Recognized configuration fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key for the forecast weather provider (OpenWeatherMap).
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Config {
    /// Load configuration from `path`, falling back to environment variables
    /// (`API_KEY`, `LATITUDE`, `LONGITUDE`) when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                AppError::input(format!("Failed to read config '{}': {e}", path.display()))
            })?;
            let config: Config = serde_json::from_str(&raw).map_err(|e| {
                AppError::input(format!("Failed to parse config '{}': {e}", path.display()))
            })?;
            return Ok(config);
        }

        dotenvy::dotenv().ok();
        Ok(Config {
            // A missing API key is tolerated here: only the forecast provider
            // needs it, and that path checks for an empty key itself.
            api_key: std::env::var("API_KEY").unwrap_or_default(),
            latitude: env_f64("LATITUDE", path)?,
            longitude: env_f64("LONGITUDE", path)?,
        })
    }
}

/// Coordinates have no sensible default: (0, 0) is open ocean, and a run
/// against it produces plausible-looking junk. Missing means error.
fn env_f64(name: &str, config_path: &Path) -> Result<f64, AppError> {
    let raw = std::env::var(name).map_err(|_| {
        AppError::input(format!(
            "Config '{}' not found and {name} is not set in the environment.",
            config_path.display()
        ))
    })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AppError::input(format!("Invalid {name} value '{raw}' in environment.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_json() {
        let dir = std::env::temp_dir().join("sales-wx-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            r#"{"api_key": "k123", "latitude": -3.75, "longitude": -73.25}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_key, "k123");
        assert!((config.latitude - -3.75).abs() < 1e-12);
        assert!((config.longitude - -73.25).abs() < 1e-12);
    }

    #[test]
    fn env_fallback_requires_coordinates() {
        // Single test body: these assertions share process-global env state.
        std::env::remove_var("LATITUDE");
        std::env::remove_var("LONGITUDE");
        let missing = Path::new("/nonexistent/sales-wx-config.json");

        let err = Config::load(missing).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(err.to_string().contains("LATITUDE"));

        std::env::set_var("LATITUDE", "not-a-number");
        let err = Config::load(missing).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(err.to_string().contains("not-a-number"));

        std::env::remove_var("LATITUDE");
    }

    #[test]
    fn rejects_malformed_config() {
        let dir = std::env::temp_dir().join("sales-wx-config-test-bad");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
    }
}
