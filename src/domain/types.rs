//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during alignment/imputation/fitting
//! - exported to CSV/Markdown artifacts
//! - reloaded later for comparisons
//!
//! Dates are `NaiveDate` everywhere. Joining on a timestamp-typed key
//! silently produces zero matches when one side keeps a time-of-day
//! component; a date-only key makes that failure mode unrepresentable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of aggregated sales (the response series).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    /// Total sales for the day, in currency units. Non-negative.
    pub amount: f64,
}

/// One day of weather covariates.
///
/// Either field may be absent: historical stations have gaps, and forecast
/// aggregation can produce days with no rain samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub date: NaiveDate,
    /// Daily mean temperature (°C).
    pub temp_c: Option<f64>,
    /// Daily precipitation total (mm).
    pub rain_mm: Option<f64>,
}

/// A sales day joined against weather; covariates may still be null here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub sales: f64,
    pub temp_c: Option<f64>,
    pub rain_mm: Option<f64>,
}

/// Left join of a sales series against weather, sorted ascending by date.
///
/// Invariant: the date set equals the sales date set exactly (left-join
/// cardinality preservation). Produced by [`crate::series::align`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedSeries {
    pub rows: Vec<MergedRow>,
}

impl MergedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// A merged row with all covariate cells filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImputedRow {
    pub date: NaiveDate,
    pub sales: f64,
    pub temp_c: f64,
    pub rain_mm: f64,
}

/// A merged series after mean-fill imputation: zero null covariate cells.
///
/// Produced by [`crate::series::impute`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImputedSeries {
    pub rows: Vec<ImputedRow>,
}

impl ImputedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// One day on the combined (historical + horizon) index with covariates
/// filled, ready to feed into `TrainedModel::predict`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FutureRow {
    pub date: NaiveDate,
    pub temp_c: f64,
    pub rain_mm: f64,
}

/// One forecasted day: point estimate plus interval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Sign label attached to a correlation coefficient.
///
/// Per the analysis contract, the sign (not a magnitude threshold) is the
/// only qualitative interpretation we attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationSign {
    Positive,
    Negative,
}

impl CorrelationSign {
    pub fn of(coefficient: f64) -> Self {
        if coefficient > 0.0 {
            CorrelationSign::Positive
        } else {
            CorrelationSign::Negative
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CorrelationSign::Positive => "positive",
            CorrelationSign::Negative => "negative",
        }
    }
}

/// Output of the correlation analyzer.
///
/// Coefficients are `None` when Pearson is undefined for the column
/// (fewer than two rows, or zero variance on either side); callers can then
/// distinguish "zero correlation" from "correlation could not be computed".
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub temp: Option<f64>,
    pub rain: Option<f64>,
    /// Top-5 hottest days with their sales, hottest first.
    pub hottest: Vec<ImputedRow>,
    /// Top-5 wettest days with their sales, wettest first.
    pub wettest: Vec<ImputedRow>,
    /// Mean sales over days with rain exactly 0mm; `None` if no such day.
    pub dry_mean: Option<f64>,
    /// Mean sales over days with rain > 0mm; `None` if no such day.
    pub wet_mean: Option<f64>,
}

/// Number of rows kept in each extremes table.
pub const TOP_K: usize = 5;

/// Default forecast horizon beyond the last historical date, in days.
pub const DEFAULT_HORIZON_DAYS: u32 = 14;

/// Horizon used for the standalone weather-outlook sheet in the workbook.
pub const OUTLOOK_SHEET_DAYS: u32 = 7;

/// Rows shown in the numeric forecast table of the report document.
pub const FORECAST_TABLE_DAYS: usize = 7;
