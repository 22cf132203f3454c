//! Shared forecast-pipeline logic behind the `run` and `correlate` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ledger ingest -> weather fetch -> align/impute -> correlate -> train ->
//! forecast, with the front-end focusing on presentation and export.

use chrono::NaiveDate;

use crate::analysis;
use crate::data::ClimateSource;
use crate::domain::{
    CorrelationResult, ForecastPoint, ImputedSeries, MergedSeries, SalesPoint, WeatherPoint,
    OUTLOOK_SHEET_DAYS,
};
use crate::error::{AppError, ErrorKind};
use crate::forecast::{ForecastEngine, ModelComponents};
use crate::session::{Session, SessionState, WeatherLoad};

/// All computed outputs of a single pipeline run.
pub struct RunOutput {
    pub weather: WeatherLoad,
    /// Historical weather rows as loaded (for the weather-only sheet).
    pub weather_history: Vec<WeatherPoint>,
    pub merged: MergedSeries,
    pub imputed: ImputedSeries,
    /// `None` when the weather load came back empty.
    pub correlation: Option<CorrelationResult>,
    pub forecast: Vec<ForecastPoint>,
    pub components: Option<ModelComponents>,
    pub last_historical: Option<NaiveDate>,
    /// Standalone 7-day outlook for the workbook sheet.
    pub weather_outlook: Vec<WeatherPoint>,
    /// A non-fatal training failure (degenerate data); the run still
    /// produces the correlation analysis and a partial report.
    pub train_failure: Option<AppError>,
}

/// Execute the pipeline on an already aggregated daily sales series.
///
/// Provider and ingest failures are fatal; an empty weather range and a
/// failed model fit are not — they degrade the output instead.
pub fn run_forecast<C: ClimateSource, E: ForecastEngine>(
    session: &mut Session<C, E>,
    sales: Vec<SalesPoint>,
) -> Result<RunOutput, AppError> {
    session.load_sales(sales)?;

    let weather = session.load_historical_weather()?;
    let merged = session.merged();
    let imputed = session.imputed();
    let last_historical = session.last_historical_date();

    if weather == WeatherLoad::Empty {
        return Ok(RunOutput {
            weather,
            weather_history: Vec::new(),
            merged,
            imputed,
            correlation: None,
            forecast: Vec::new(),
            components: None,
            last_historical,
            weather_outlook: Vec::new(),
            train_failure: None,
        });
    }

    let correlation = Some(analysis::analyze(&imputed)?);

    let train_failure = match session.train() {
        Ok(_) => None,
        // Degenerate training data should not take down the analysis half of
        // the run; anything else (provider failures, bad state) is fatal.
        Err(e) if matches!(e.kind(), ErrorKind::ModelFit | ErrorKind::DataUnavailable) => Some(e),
        Err(e) => return Err(e),
    };

    let weather_outlook = if session.state() == SessionState::ForecastReady {
        session.climate().daily_outlook(OUTLOOK_SHEET_DAYS)?
    } else {
        Vec::new()
    };

    Ok(RunOutput {
        weather,
        weather_history: session.weather().to_vec(),
        merged,
        imputed,
        correlation,
        forecast: session.forecast_points().to_vec(),
        components: session.components().cloned(),
        last_historical,
        weather_outlook,
        train_failure,
    })
}
