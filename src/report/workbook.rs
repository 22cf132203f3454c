//! Spreadsheet export: one CSV sheet per concern, sharing a timestamped stem.
//!
//! Four independent tabular sheets, no cross-sheet references:
//! predictions; merged historical sales+weather; weather-only historical;
//! weather-only forecast. Currency values are written at 2 decimal places —
//! that rounding policy is the only permitted precision loss on a read-back.

use std::path::{Path, PathBuf};

use crate::domain::{ForecastPoint, MergedSeries, WeatherPoint};
use crate::error::AppError;
use crate::report::artifacts::unique_path;

/// In-memory inputs for the four sheets.
pub struct WorkbookInputs<'a> {
    pub predictions: &'a [ForecastPoint],
    pub merged: &'a MergedSeries,
    pub weather_history: &'a [WeatherPoint],
    pub weather_outlook: &'a [WeatherPoint],
}

/// Paths of the sheets actually written.
#[derive(Debug, Clone, Default)]
pub struct WorkbookPaths {
    pub written: Vec<PathBuf>,
}

/// Write all four sheets. Per-sheet failures abort the workbook but report
/// which sheets were already written, so a partial export is identifiable.
pub fn write_workbook(
    dir: &Path,
    ts: &str,
    inputs: &WorkbookInputs<'_>,
) -> Result<WorkbookPaths, (WorkbookPaths, AppError)> {
    let mut paths = WorkbookPaths::default();

    let prediction_rows: Vec<Vec<String>> = inputs
        .predictions
        .iter()
        .map(|p| {
            vec![
                p.date.to_string(),
                format!("{:.2}", p.yhat),
                format!("{:.2}", p.yhat_lower),
                format!("{:.2}", p.yhat_upper),
            ]
        })
        .collect();
    let merged_rows: Vec<Vec<String>> = inputs
        .merged
        .rows
        .iter()
        .map(|r| {
            vec![
                r.date.to_string(),
                format!("{:.2}", r.sales),
                opt_cell(r.temp_c),
                opt_cell(r.rain_mm),
            ]
        })
        .collect();

    let sheets: [(&str, &[&str], Vec<Vec<String>>); 4] = [
        (
            "predicciones_clima",
            &["date", "prediction", "lower_bound", "upper_bound"],
            prediction_rows,
        ),
        (
            "historico_ventas_clima",
            &["date", "sales", "temp_c", "rain_mm"],
            merged_rows,
        ),
        (
            "clima_historico",
            &["date", "temp_c", "rain_mm"],
            weather_rows(inputs.weather_history),
        ),
        (
            "clima_pronostico",
            &["date", "temp_c", "rain_mm"],
            weather_rows(inputs.weather_outlook),
        ),
    ];

    for (stem, header, rows) in sheets {
        let path = unique_path(dir, stem, ts, "csv");
        match write_sheet(&path, header, rows) {
            Ok(()) => paths.written.push(path),
            Err(e) => return Err((paths, e)),
        }
    }

    Ok(paths)
}

fn weather_rows(points: &[WeatherPoint]) -> Vec<Vec<String>> {
    points
        .iter()
        .map(|w| vec![w.date.to_string(), opt_cell(w.temp_c), opt_cell(w.rain_mm)])
        .collect()
}

/// Null covariate cells export as empty, not as a numeric sentinel.
fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

fn write_sheet(path: &Path, header: &[&str], rows: Vec<Vec<String>>) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::export(format!("Failed to create sheet '{}': {e}", path.display()))
    })?;

    writer
        .write_record(header)
        .map_err(|e| AppError::export(format!("Failed to write sheet header: {e}")))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| AppError::export(format!("Failed to write sheet row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::export(format!("Failed to flush sheet '{}': {e}", path.display())))
}

/// Read the predictions sheet back into memory for round-trip checks.
#[cfg(test)]
fn read_predictions_sheet(path: &Path) -> Result<Vec<ForecastPoint>, AppError> {
    use chrono::NaiveDate;

    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::input(format!("Failed to open sheet '{}': {e}", path.display()))
    })?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::input(format!("Unreadable sheet row: {e}")))?;
        let date = record
            .get(0)
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
            .ok_or_else(|| AppError::input("Sheet row has an unparseable date."))?;
        let mut nums = [0.0f64; 3];
        for (i, slot) in nums.iter_mut().enumerate() {
            *slot = record
                .get(i + 1)
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| AppError::input("Sheet row has an unparseable value."))?;
        }
        out.push(ForecastPoint {
            date,
            yhat: nums[0],
            yhat_lower: nums[1],
            yhat_upper: nums[2],
        });
    }
    Ok(out)
}
