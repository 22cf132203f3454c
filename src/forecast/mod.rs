//! Forecasting engine boundary.
//!
//! The orchestrator never depends on the engine's internals, only on this
//! fit/predict contract, so the statistical machinery is swappable (and
//! trivially stubbed in tests).

mod seasonal;

pub use seasonal::SeasonalOls;

use chrono::NaiveDate;

use crate::domain::{ForecastPoint, FutureRow, ImputedSeries};
use crate::error::AppError;

/// Capability interface for the statistical forecasting engine.
pub trait ForecastEngine {
    /// Fit a model using the sales value as the response and the two weather
    /// covariates as exogenous regressors.
    fn fit(&self, training: &ImputedSeries) -> Result<Box<dyn TrainedModel>, AppError>;
}

/// A trained-model handle: predicts over an externally supplied future index.
pub trait TrainedModel {
    /// Predict one point (with interval bounds) per future row.
    fn predict(&self, future: &[FutureRow]) -> Result<Vec<ForecastPoint>, AppError>;

    /// Decompose predictions into additive components for the component chart.
    fn components(&self, future: &[FutureRow]) -> Result<ModelComponents, AppError>;
}

/// Additive decomposition of the fitted signal, one value per future row.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelComponents {
    pub dates: Vec<NaiveDate>,
    pub trend: Vec<f64>,
    pub weekly: Vec<f64>,
    pub yearly: Vec<f64>,
    /// Combined contribution of the weather regressors.
    pub regressors: Vec<f64>,
}
