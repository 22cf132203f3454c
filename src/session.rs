//! Forecast Orchestrator: a state machine that owns one session's data and
//! drives the forecasting engine through load/train/forecast phases.
//!
//! All mutable state lives in the [`Session`] value — there are no
//! module-level globals — so concurrent sessions are simply separate values
//! and tests never need process restarts. Operations run on temporaries and
//! commit only on success, so a failure can never leave the session in a
//! partially transitioned state.

use chrono::{Days, NaiveDate};

use crate::data::ClimateSource;
use crate::domain::{
    ForecastPoint, FutureRow, ImputedSeries, MergedSeries, SalesPoint, WeatherPoint,
    DEFAULT_HORIZON_DAYS,
};
use crate::error::AppError;
use crate::forecast::{ForecastEngine, ModelComponents, TrainedModel};
use crate::series;

/// Session lifecycle phase.
///
/// `train()` passes through `ModelTrained` and lands on `ForecastReady` in
/// one call; callers never observe a trained-but-unpredicted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    WeatherLoaded,
    ModelTrained,
    ForecastReady,
}

/// Outcome of a historical-weather load. An empty range result is valid and
/// non-fatal: the session stays `Idle` and the caller may retry with other
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherLoad {
    Loaded(usize),
    Empty,
}

/// One coherent lifecycle of loaded sales, loaded weather, trained model and
/// resulting forecast.
pub struct Session<C, E> {
    climate: C,
    engine: E,
    horizon_days: u32,
    state: SessionState,
    sales: Vec<SalesPoint>,
    weather: Vec<WeatherPoint>,
    model: Option<Box<dyn TrainedModel>>,
    future: Vec<FutureRow>,
    forecast: Vec<ForecastPoint>,
    components: Option<ModelComponents>,
}

impl<C: ClimateSource, E: ForecastEngine> Session<C, E> {
    pub fn new(climate: C, engine: E) -> Self {
        Self::with_horizon(climate, engine, DEFAULT_HORIZON_DAYS)
    }

    pub fn with_horizon(climate: C, engine: E, horizon_days: u32) -> Self {
        Self {
            climate,
            engine,
            horizon_days,
            state: SessionState::Idle,
            sales: Vec::new(),
            weather: Vec::new(),
            model: None,
            future: Vec::new(),
            forecast: Vec::new(),
            components: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn climate(&self) -> &C {
        &self.climate
    }

    pub fn sales(&self) -> &[SalesPoint] {
        &self.sales
    }

    pub fn weather(&self) -> &[WeatherPoint] {
        &self.weather
    }

    pub fn forecast_points(&self) -> &[ForecastPoint] {
        &self.forecast
    }

    pub fn components(&self) -> Option<&ModelComponents> {
        self.components.as_ref()
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// First and last sales dates. `None` until sales are loaded.
    pub fn sales_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.sales.first(), self.sales.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    /// Current sales joined against current historical weather.
    pub fn merged(&self) -> MergedSeries {
        series::align(&self.sales, &self.weather)
    }

    /// Merged series with covariate gaps mean-filled.
    pub fn imputed(&self) -> ImputedSeries {
        series::impute(&self.merged())
    }

    /// Load a new sales series. Valid from any state; resets the session so
    /// stale weather, models or forecasts can never leak across ledgers.
    pub fn load_sales(&mut self, sales: Vec<SalesPoint>) -> Result<(), AppError> {
        if sales.is_empty() {
            return Err(AppError::unavailable("Sales series is empty."));
        }

        let mut sales = sales;
        sales.sort_by_key(|s| s.date);

        self.sales = sales;
        self.weather.clear();
        self.model = None;
        self.future.clear();
        self.forecast.clear();
        self.components = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Query the historical climate provider over the sales date span.
    ///
    /// Valid only from `Idle`. An empty result reports
    /// [`WeatherLoad::Empty`] and leaves the session in `Idle`.
    pub fn load_historical_weather(&mut self) -> Result<WeatherLoad, AppError> {
        if self.state != SessionState::Idle {
            return Err(AppError::precondition(
                "Historical weather is already loaded for this sales set; reload sales to start over.",
            ));
        }
        let (start, end) = self
            .sales_span()
            .ok_or_else(|| AppError::precondition("No sales loaded; load a ledger first."))?;

        let weather = self.climate.daily_history(start, end)?;
        if weather.is_empty() {
            return Ok(WeatherLoad::Empty);
        }

        let n = weather.len();
        self.weather = weather;
        self.state = SessionState::WeatherLoaded;
        Ok(WeatherLoad::Loaded(n))
    }

    /// Fit the engine and predict over the historical span plus the horizon.
    ///
    /// Valid only from `WeatherLoaded`. Everything is computed on temporaries
    /// and committed at the end, so a fit or provider failure leaves the
    /// session exactly where it was.
    pub fn train(&mut self) -> Result<&[ForecastPoint], AppError> {
        match self.state {
            SessionState::WeatherLoaded => {}
            SessionState::Idle => {
                return Err(AppError::precondition(
                    "No historical weather loaded; load weather before training.",
                ));
            }
            SessionState::ModelTrained | SessionState::ForecastReady => {
                return Err(AppError::precondition(
                    "Model already trained for this session; reload sales to retrain.",
                ));
            }
        }

        let training = self.imputed();
        if training.is_empty() {
            return Err(AppError::unavailable(
                "No overlapping dates between sales and weather after alignment.",
            ));
        }

        let model = self.engine.fit(&training)?;

        // Future index: the training dates plus the forecast horizon.
        let last = training
            .last_date()
            .ok_or_else(|| AppError::unavailable("Training series has no dates."))?;
        let mut index: Vec<NaiveDate> = training.rows.iter().map(|r| r.date).collect();
        for offset in 1..=u64::from(self.horizon_days) {
            index.push(last + Days::new(offset));
        }

        // Future covariates: historical weather extended with the provider's
        // outlook, aligned to the index and imputed as its own series (the
        // future pass computes its own mean-fill statistics).
        let mut combined = self.weather.clone();
        combined.extend(self.climate.daily_outlook(self.horizon_days)?);
        let aligned = series::align_covariates(&index, &combined);
        let filled = series::impute_covariates(&aligned);
        let future = series::to_future_rows(&filled);

        let forecast = model.predict(&future)?;
        let components = model.components(&future)?;

        // Commit. Training always yields a forecast in one call: the session
        // is `ModelTrained` only for the instant between these assignments.
        self.model = Some(model);
        self.state = SessionState::ModelTrained;
        self.future = future;
        self.forecast = forecast;
        self.components = Some(components);
        self.state = SessionState::ForecastReady;
        Ok(&self.forecast)
    }

    /// Re-derive forecast output from the already trained model (e.g. for
    /// re-rendering). Idempotent; valid only from `ForecastReady`.
    pub fn forecast(&mut self) -> Result<&[ForecastPoint], AppError> {
        if self.state != SessionState::ForecastReady {
            return Err(AppError::precondition(
                "No trained model; train before requesting a forecast.",
            ));
        }
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| AppError::precondition("No trained model handle in session."))?;

        self.forecast = model.predict(&self.future)?;
        Ok(&self.forecast)
    }

    /// Last date of the historical (training) span, once weather is loaded.
    pub fn last_historical_date(&self) -> Option<NaiveDate> {
        self.sales.last().map(|s| s.date)
    }
}
