//! External data collaborators: the transaction ledger and the two weather
//! providers.
//!
//! The orchestrator only sees the [`ClimateSource`] capability trait, so
//! tests can stub the network and the HTTP clients stay swappable.

mod archive;
mod ledger;
mod outlook;

pub use archive::ArchiveClient;
pub use ledger::{
    daily_sales, filter_by_range, load_ledger, summarize, LedgerData, LedgerRow, LedgerSummary,
    RowError,
};
pub use outlook::OutlookClient;

use chrono::NaiveDate;

use crate::config::Config;
use crate::domain::WeatherPoint;
use crate::error::AppError;

/// Weather access as the session sees it: a historical archive queried over a
/// closed date range, and a short-term outlook queried by horizon.
pub trait ClimateSource {
    /// One row per day with mean temperature and precipitation total.
    /// An empty result for the range is valid (no station coverage), not an
    /// error.
    fn daily_history(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<WeatherPoint>, AppError>;

    /// Daily-aggregated forecast covariates for the next `days` days.
    fn daily_outlook(&self, days: u32) -> Result<Vec<WeatherPoint>, AppError>;
}

/// Production [`ClimateSource`]: Open-Meteo archive + OpenWeatherMap outlook.
pub struct WeatherService {
    archive: ArchiveClient,
    outlook: OutlookClient,
}

impl WeatherService {
    pub fn new(config: &Config) -> Self {
        Self {
            archive: ArchiveClient::new(config.latitude, config.longitude),
            outlook: OutlookClient::new(config.latitude, config.longitude, &config.api_key),
        }
    }
}

impl ClimateSource for WeatherService {
    fn daily_history(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeatherPoint>, AppError> {
        self.archive.fetch_daily(start, end)
    }

    fn daily_outlook(&self, days: u32) -> Result<Vec<WeatherPoint>, AppError> {
        self.outlook.fetch_daily(days)
    }
}
