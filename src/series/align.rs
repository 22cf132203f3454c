//! Series Aligner: left join of a sales series against weather covariates.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{FutureRow, MergedRow, MergedSeries, SalesPoint, WeatherPoint};

/// Merge a sales series and a weather series into one table keyed by date.
///
/// - Join key: calendar date, exact equality.
/// - Join kind: left join on the sales key set. Every sales day is preserved;
///   weather days with no matching sales day are discarded; sales days with
///   no matching weather record get null covariates.
/// - Result is sorted ascending by date, so the output is deterministic for a
///   given pair of inputs regardless of input ordering.
///
/// When the same date appears more than once on either side, the last record
/// wins (upstream aggregation produces unique dates, so this is a guardrail,
/// not an expected path).
pub fn align(sales: &[SalesPoint], weather: &[WeatherPoint]) -> MergedSeries {
    let by_date: HashMap<NaiveDate, &WeatherPoint> =
        weather.iter().map(|w| (w.date, w)).collect();

    let mut latest: HashMap<NaiveDate, f64> = HashMap::with_capacity(sales.len());
    for s in sales {
        latest.insert(s.date, s.amount);
    }

    let mut rows: Vec<MergedRow> = latest
        .into_iter()
        .map(|(date, amount)| {
            let w = by_date.get(&date);
            MergedRow {
                date,
                sales: amount,
                temp_c: w.and_then(|w| w.temp_c),
                rain_mm: w.and_then(|w| w.rain_mm),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.date);

    MergedSeries { rows }
}

/// Align a covariate-only series against an explicit date index.
///
/// This is the second alignment pass the orchestrator runs before prediction:
/// the index spans the full historical range plus the future horizon, and the
/// covariates are the concatenation of historical weather with a forecast
/// query. Index dates with no covariate record get nulls, to be filled by a
/// fresh imputation pass over this series.
pub fn align_covariates(index: &[NaiveDate], weather: &[WeatherPoint]) -> Vec<(NaiveDate, Option<f64>, Option<f64>)> {
    let mut by_date: HashMap<NaiveDate, (Option<f64>, Option<f64>)> =
        HashMap::with_capacity(weather.len());
    for w in weather {
        by_date.insert(w.date, (w.temp_c, w.rain_mm));
    }

    index
        .iter()
        .map(|&date| {
            let (temp, rain) = by_date.get(&date).copied().unwrap_or((None, None));
            (date, temp, rain)
        })
        .collect()
}

/// Convenience view of aligned-and-filled covariates as future rows.
pub fn to_future_rows(filled: &[(NaiveDate, f64, f64)]) -> Vec<FutureRow> {
    filled
        .iter()
        .map(|&(date, temp_c, rain_mm)| FutureRow {
            date,
            temp_c,
            rain_mm,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn left_join_preserves_sales_date_set() {
        let sales = vec![
            SalesPoint { date: d(2024, 1, 3), amount: 150.0 },
            SalesPoint { date: d(2024, 1, 1), amount: 100.0 },
            SalesPoint { date: d(2024, 1, 2), amount: 200.0 },
        ];
        let weather = vec![
            WeatherPoint { date: d(2024, 1, 1), temp_c: Some(20.0), rain_mm: Some(0.0) },
            WeatherPoint { date: d(2024, 1, 2), temp_c: Some(25.0), rain_mm: Some(5.0) },
            // A weather day with no matching sales day must be discarded.
            WeatherPoint { date: d(2024, 1, 9), temp_c: Some(30.0), rain_mm: Some(1.0) },
        ];

        let merged = align(&sales, &weather);
        let dates: Vec<NaiveDate> = merged.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);

        // Unmatched sales day keeps null covariates rather than being dropped.
        assert_eq!(merged.rows[2].temp_c, None);
        assert_eq!(merged.rows[2].rain_mm, None);
        assert!((merged.rows[2].sales - 150.0).abs() < 1e-12);
    }

    #[test]
    fn join_is_order_insensitive() {
        let sales = vec![
            SalesPoint { date: d(2024, 2, 2), amount: 10.0 },
            SalesPoint { date: d(2024, 2, 1), amount: 20.0 },
        ];
        let weather = vec![
            WeatherPoint { date: d(2024, 2, 2), temp_c: Some(22.0), rain_mm: None },
            WeatherPoint { date: d(2024, 2, 1), temp_c: Some(21.0), rain_mm: Some(3.0) },
        ];

        let mut sales_rev = sales.clone();
        sales_rev.reverse();
        let mut weather_rev = weather.clone();
        weather_rev.reverse();

        assert_eq!(align(&sales, &weather), align(&sales_rev, &weather_rev));
    }

    #[test]
    fn covariate_alignment_follows_the_index() {
        let index = vec![d(2024, 3, 1), d(2024, 3, 2), d(2024, 3, 3)];
        let weather = vec![
            WeatherPoint { date: d(2024, 3, 1), temp_c: Some(19.0), rain_mm: Some(0.0) },
            WeatherPoint { date: d(2024, 3, 3), temp_c: None, rain_mm: Some(2.0) },
        ];

        let aligned = align_covariates(&index, &weather);
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0], (d(2024, 3, 1), Some(19.0), Some(0.0)));
        assert_eq!(aligned[1], (d(2024, 3, 2), None, None));
        assert_eq!(aligned[2], (d(2024, 3, 3), None, Some(2.0)));
    }
}
