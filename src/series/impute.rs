//! Imputation Engine: column-wise mean fill of missing covariates.

use chrono::NaiveDate;

use crate::domain::{ImputedRow, ImputedSeries, MergedSeries};

/// Fill every null covariate cell with the arithmetic mean of the non-null
/// values in that column. A column that is entirely null falls back to 0.0.
///
/// Non-finite values introduced upstream are demoted to null before the mean
/// is computed, so infinities never reach the mean nor the trained model.
///
/// Idempotent: imputing an already-imputed series changes nothing.
pub fn impute(series: &MergedSeries) -> ImputedSeries {
    let temp_mean = column_mean(series.rows.iter().map(|r| r.temp_c));
    let rain_mean = column_mean(series.rows.iter().map(|r| r.rain_mm));

    let rows = series
        .rows
        .iter()
        .map(|r| ImputedRow {
            date: r.date,
            sales: r.sales,
            temp_c: fill(r.temp_c, temp_mean),
            rain_mm: fill(r.rain_mm, rain_mean),
        })
        .collect();

    ImputedSeries { rows }
}

/// Mean-fill an aligned covariate-only series (the future regressor pass).
///
/// Each call computes its own column statistics: the future series is its own
/// population and must not reuse the historical means.
pub fn impute_covariates(
    aligned: &[(NaiveDate, Option<f64>, Option<f64>)],
) -> Vec<(NaiveDate, f64, f64)> {
    let temp_mean = column_mean(aligned.iter().map(|&(_, t, _)| t));
    let rain_mean = column_mean(aligned.iter().map(|&(_, _, p)| p));

    aligned
        .iter()
        .map(|&(date, temp, rain)| (date, fill(temp, temp_mean), fill(rain, rain_mean)))
        .collect()
}

fn fill(cell: Option<f64>, mean: f64) -> f64 {
    match cell {
        Some(v) if v.is_finite() => v,
        _ => mean,
    }
}

/// Arithmetic mean of the finite, present values; 0.0 when there are none.
fn column_mean(cells: impl Iterator<Item = Option<f64>>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for cell in cells {
        if let Some(v) = cell {
            if v.is_finite() {
                sum += v;
                n += 1;
            }
        }
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MergedRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(rows: Vec<MergedRow>) -> MergedSeries {
        MergedSeries { rows }
    }

    #[test]
    fn fills_gaps_with_column_means() {
        let merged = series(vec![
            MergedRow { date: d(1), sales: 100.0, temp_c: Some(20.0), rain_mm: Some(0.0) },
            MergedRow { date: d(2), sales: 200.0, temp_c: Some(25.0), rain_mm: Some(5.0) },
            MergedRow { date: d(3), sales: 150.0, temp_c: None, rain_mm: None },
        ]);

        let imputed = impute(&merged);
        assert!((imputed.rows[2].temp_c - 22.5).abs() < 1e-12);
        assert!((imputed.rows[2].rain_mm - 2.5).abs() < 1e-12);
        // Present cells are untouched.
        assert!((imputed.rows[0].temp_c - 20.0).abs() < 1e-12);
    }

    #[test]
    fn all_null_column_falls_back_to_zero() {
        let merged = series(vec![
            MergedRow { date: d(1), sales: 10.0, temp_c: None, rain_mm: Some(1.0) },
            MergedRow { date: d(2), sales: 20.0, temp_c: None, rain_mm: None },
        ]);

        let imputed = impute(&merged);
        assert_eq!(imputed.rows[0].temp_c, 0.0);
        assert_eq!(imputed.rows[1].temp_c, 0.0);
        assert!((imputed.rows[1].rain_mm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_cells_are_treated_as_null() {
        let merged = series(vec![
            MergedRow { date: d(1), sales: 10.0, temp_c: Some(f64::INFINITY), rain_mm: Some(2.0) },
            MergedRow { date: d(2), sales: 20.0, temp_c: Some(30.0), rain_mm: Some(f64::NAN) },
        ]);

        let imputed = impute(&merged);
        // The infinity is replaced by the mean of the remaining finite values.
        assert!((imputed.rows[0].temp_c - 30.0).abs() < 1e-12);
        assert!((imputed.rows[1].rain_mm - 2.0).abs() < 1e-12);
        for r in &imputed.rows {
            assert!(r.temp_c.is_finite() && r.rain_mm.is_finite());
        }
    }

    #[test]
    fn imputation_is_idempotent() {
        let merged = series(vec![
            MergedRow { date: d(1), sales: 100.0, temp_c: Some(20.0), rain_mm: None },
            MergedRow { date: d(2), sales: 200.0, temp_c: None, rain_mm: Some(4.0) },
        ]);

        let once = impute(&merged);
        let again = impute(&MergedSeries {
            rows: once
                .rows
                .iter()
                .map(|r| MergedRow {
                    date: r.date,
                    sales: r.sales,
                    temp_c: Some(r.temp_c),
                    rain_mm: Some(r.rain_mm),
                })
                .collect(),
        });
        assert_eq!(once, again);
    }

    #[test]
    fn covariate_pass_uses_its_own_means() {
        let aligned = vec![
            (d(1), Some(10.0), Some(0.0)),
            (d(2), None, Some(8.0)),
            (d(3), Some(30.0), None),
        ];
        let filled = impute_covariates(&aligned);
        assert!((filled[1].1 - 20.0).abs() < 1e-12);
        assert!((filled[2].2 - 4.0).abs() < 1e-12);
    }
}
