//! Correlation Analyzer: linear association between sales and each weather
//! covariate, plus extremal subsets and the dry/wet split.
//!
//! The numeric computation here is pure; the scatter artifact that usually
//! accompanies it is rendered by [`crate::plot`] and assembled by
//! [`crate::report`].

use std::cmp::Ordering;

use crate::domain::{CorrelationResult, ImputedRow, ImputedSeries, TOP_K};
use crate::error::AppError;

/// Compute correlation diagnostics over an imputed series.
///
/// Errors only on an empty series (nothing to analyze); individual
/// coefficients that are undefined (zero variance, fewer than two rows) come
/// back as `None` rather than a silent 0.
pub fn analyze(series: &ImputedSeries) -> Result<CorrelationResult, AppError> {
    if series.is_empty() {
        return Err(AppError::unavailable(
            "No rows to analyze: sales series is empty after alignment.",
        ));
    }

    let sales: Vec<f64> = series.rows.iter().map(|r| r.sales).collect();
    let temps: Vec<f64> = series.rows.iter().map(|r| r.temp_c).collect();
    let rains: Vec<f64> = series.rows.iter().map(|r| r.rain_mm).collect();

    let dry: Vec<f64> = series
        .rows
        .iter()
        .filter(|r| r.rain_mm == 0.0)
        .map(|r| r.sales)
        .collect();
    let wet: Vec<f64> = series
        .rows
        .iter()
        .filter(|r| r.rain_mm > 0.0)
        .map(|r| r.sales)
        .collect();

    Ok(CorrelationResult {
        temp: pearson(&sales, &temps),
        rain: pearson(&sales, &rains),
        hottest: top_by(series, |r| r.temp_c),
        wettest: top_by(series, |r| r.rain_mm),
        dry_mean: mean(&dry),
        wet_mean: mean(&wet),
    })
}

/// Pearson correlation coefficient, or `None` when undefined.
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len();
    if n < 2 || n != b.len() {
        return None;
    }

    let n_f = n as f64;
    let mean_a = a.iter().sum::<f64>() / n_f;
    let mean_b = b.iter().sum::<f64>() / n_f;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }

    let r = cov / (var_a.sqrt() * var_b.sqrt());
    r.is_finite().then_some(r)
}

/// Top-K rows by covariate value descending; ties broken by date ascending.
fn top_by(series: &ImputedSeries, key: impl Fn(&ImputedRow) -> f64) -> Vec<ImputedRow> {
    let mut sorted: Vec<ImputedRow> = series.rows.clone();
    // Rows arrive date-ascending, so a stable sort on the covariate alone
    // preserves the date order within ties.
    sorted.sort_by(|x, y| key(y).partial_cmp(&key(x)).unwrap_or(Ordering::Equal));
    sorted.truncate(TOP_K);
    sorted
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(day: u32, sales: f64, temp_c: f64, rain_mm: f64) -> ImputedRow {
        ImputedRow { date: d(day), sales, temp_c, rain_mm }
    }

    #[test]
    fn perfect_linear_series_has_coefficient_one() {
        // sales = 2 * temp + 50, no noise.
        let series = ImputedSeries {
            rows: (1..=10)
                .map(|i| row(i, 2.0 * (15.0 + i as f64) + 50.0, 15.0 + i as f64, 0.0))
                .collect(),
        };

        let result = analyze(&series).unwrap();
        let r = result.temp.unwrap();
        assert!((r - 1.0).abs() < 1e-12, "expected 1.0, got {r}");
        // Rain column is constant, so its coefficient is undefined.
        assert_eq!(result.rain, None);
    }

    #[test]
    fn top_k_ranks_descending_with_date_tiebreak() {
        let series = ImputedSeries {
            rows: vec![
                row(1, 10.0, 30.0, 0.0),
                row(2, 20.0, 32.0, 1.0),
                row(3, 30.0, 30.0, 2.0),
                row(4, 40.0, 28.0, 3.0),
                row(5, 50.0, 31.0, 4.0),
                row(6, 60.0, 27.0, 5.0),
            ],
        };

        let result = analyze(&series).unwrap();
        let dates: Vec<NaiveDate> = result.hottest.iter().map(|r| r.date).collect();
        // 32 > 31 > 30 (day 1 before day 3 on the tie) > 30 > 28.
        assert_eq!(dates, vec![d(2), d(5), d(1), d(3), d(4)]);
        assert_eq!(result.hottest.len(), TOP_K);

        let wet_dates: Vec<NaiveDate> = result.wettest.iter().map(|r| r.date).collect();
        assert_eq!(wet_dates, vec![d(6), d(5), d(4), d(3), d(2)]);
    }

    #[test]
    fn dry_wet_split_uses_exact_zero() {
        // Worked scenario from the imputation example: after mean-filling,
        // rain = [0.0, 5.0, 2.5], so only the first row is dry.
        let series = ImputedSeries {
            rows: vec![
                row(1, 100.0, 20.0, 0.0),
                row(2, 200.0, 25.0, 5.0),
                row(3, 150.0, 22.5, 2.5),
            ],
        };

        let result = analyze(&series).unwrap();
        assert!((result.dry_mean.unwrap() - 100.0).abs() < 1e-12);
        assert!((result.wet_mean.unwrap() - 175.0).abs() < 1e-12);
    }

    #[test]
    fn empty_partition_is_reported_as_none_not_zero() {
        let series = ImputedSeries {
            rows: vec![row(1, 100.0, 20.0, 1.0), row(2, 150.0, 21.0, 2.0)],
        };

        let result = analyze(&series).unwrap();
        assert_eq!(result.dry_mean, None);
        assert!(result.wet_mean.is_some());
    }

    #[test]
    fn empty_series_is_a_data_availability_error() {
        let err = analyze(&ImputedSeries::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataUnavailable);
    }
}
