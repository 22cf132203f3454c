//! Report Assembler: formatted terminal output plus exported artifacts
//! (CSV workbook sheets, Markdown document, chart PNGs).

pub mod artifacts;
pub mod document;
pub mod format;
pub mod workbook;

pub use artifacts::{ensure_report_dir, timestamp, unique_path, REPORT_DIR};
pub use document::{
    render_document, render_summary_document, write_document, write_summary_document,
    DocumentInputs, SummaryDocumentInputs,
};
pub use format::{
    fmt_opt_mean, format_correlation, format_forecast_table, format_run_header, format_summary,
    sign_note,
};
pub use workbook::{write_workbook, WorkbookInputs, WorkbookPaths};

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::{ForecastPoint, FORECAST_TABLE_DAYS};
use crate::error::AppError;

/// What an export run produced. Per-artifact failures are collected rather
/// than aborting the run, so one bad artifact cannot take down the rest.
#[derive(Debug, Default)]
pub struct ExportOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<(String, AppError)>,
}

impl ExportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record(&mut self, label: &str, result: Result<PathBuf, AppError>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(e) => self.failures.push((label.to_string(), e)),
        }
    }
}

/// The first 7 strictly-future rows of a forecast, in date order.
///
/// The forecast covers the historical span too; reports only tabulate days
/// after the last historical date.
pub fn seven_day_extract(
    forecast: &[ForecastPoint],
    last_historical: NaiveDate,
) -> Vec<&ForecastPoint> {
    forecast
        .iter()
        .filter(|p| p.date > last_historical)
        .take(FORECAST_TABLE_DAYS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn seven_day_extract_skips_historical_rows_and_caps_at_seven() {
        let forecast: Vec<ForecastPoint> = (1..=20)
            .map(|day| ForecastPoint {
                date: d(day),
                yhat: 0.0,
                yhat_lower: 0.0,
                yhat_upper: 0.0,
            })
            .collect();

        let extract = seven_day_extract(&forecast, d(5));
        assert_eq!(extract.len(), 7);
        assert_eq!(extract[0].date, d(6));
        assert_eq!(extract[6].date, d(12));
    }

    #[test]
    fn short_horizons_yield_short_extracts() {
        let forecast = vec![ForecastPoint {
            date: d(9),
            yhat: 0.0,
            yhat_lower: 0.0,
            yhat_upper: 0.0,
        }];
        assert_eq!(seven_day_extract(&forecast, d(8)).len(), 1);
        assert!(seven_day_extract(&forecast, d(9)).is_empty());
    }

    #[test]
    fn export_outcome_tracks_partial_failure() {
        let mut outcome = ExportOutcome::default();
        outcome.record("workbook", Ok(PathBuf::from("a.csv")));
        outcome.record("document", Err(AppError::export("disk full")));

        assert!(!outcome.is_complete());
        assert_eq!(outcome.written.len(), 1);
        assert_eq!(outcome.failures[0].0, "document");
    }
}
