//! Built-in forecasting engine: seasonal regression via least squares.
//!
//! The model is additive and linear in its parameters:
//!
//! ```text
//! y(t) = trend(t) + weekly(t) + yearly(t) + b_temp * temp(t) + b_rain * rain(t)
//! ```
//!
//! - trend: intercept + linear term in days-since-origin
//! - weekly/yearly seasonality: truncated Fourier series (period 7 / 365.25)
//! - regressors: daily mean temperature and precipitation total
//!
//! Seasonal blocks are auto-dropped when the sales history is too short to
//! identify them (weekly needs two weeks of span, yearly a full year).
//! Interval bounds come from the in-sample residual spread at a fixed
//! two-sided 80% width.

use std::f64::consts::TAU;

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use crate::domain::{ForecastPoint, FutureRow, ImputedSeries};
use crate::error::AppError;
use crate::forecast::{ForecastEngine, ModelComponents, TrainedModel};
use crate::math::solve_least_squares;

const WEEKLY_PERIOD: f64 = 7.0;
const YEARLY_PERIOD: f64 = 365.25;

/// Two-sided 80% normal quantile; fixed default prediction-interval width.
const INTERVAL_Z: f64 = 1.281_551_565_544_600_4;

/// Seasonal-regression engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalOls {
    /// Fourier order of the weekly component.
    pub weekly_order: usize,
    /// Fourier order of the yearly component.
    pub yearly_order: usize,
}

impl Default for SeasonalOls {
    fn default() -> Self {
        Self {
            weekly_order: 3,
            yearly_order: 2,
        }
    }
}

impl ForecastEngine for SeasonalOls {
    fn fit(&self, training: &ImputedSeries) -> Result<Box<dyn TrainedModel>, AppError> {
        let n = training.len();
        if n < 3 {
            return Err(AppError::model_fit(format!(
                "Insufficient training data: {n} day(s); need at least 3."
            )));
        }

        let first = training.rows[0].date;
        let last = training.rows[n - 1].date;
        let span_days = (last - first).num_days().max(1) as f64;

        let mut sales_min = f64::INFINITY;
        let mut sales_max = f64::NEG_INFINITY;
        for r in &training.rows {
            sales_min = sales_min.min(r.sales);
            sales_max = sales_max.max(r.sales);
        }
        if sales_min == sales_max {
            return Err(AppError::model_fit(
                "Constant sales series: nothing for the model to explain.",
            ));
        }

        let shape = BasisShape {
            origin: first,
            trend_scale: span_days,
            weekly_order: if span_days >= 2.0 * WEEKLY_PERIOD {
                self.weekly_order
            } else {
                0
            },
            yearly_order: if span_days >= YEARLY_PERIOD {
                self.yearly_order
            } else {
                0
            },
        };

        let p = shape.width();
        if n <= p {
            return Err(AppError::model_fit(format!(
                "Insufficient training data: {n} day(s) for {p} model parameters."
            )));
        }

        let mut design = DMatrix::zeros(n, p);
        let mut response = DVector::zeros(n);
        for (i, r) in training.rows.iter().enumerate() {
            let row = shape.features(r.date, r.temp_c, r.rain_mm);
            for (j, v) in row.iter().enumerate() {
                design[(i, j)] = *v;
            }
            response[i] = r.sales;
        }

        let beta = solve_least_squares(&design, &response).ok_or_else(|| {
            AppError::model_fit("Seasonal regression is too ill-conditioned to fit.")
        })?;

        // In-sample residual spread drives the interval width.
        let fitted = &design * &beta;
        let dof = (n - p) as f64;
        let sse: f64 = (0..n).map(|i| (response[i] - fitted[i]).powi(2)).sum();
        let sigma = if dof > 0.0 { (sse / dof).sqrt() } else { 0.0 };

        Ok(Box::new(TrainedSeasonal { shape, beta, sigma }))
    }
}

/// Fixed geometry of the design matrix, shared between fit and predict.
#[derive(Debug, Clone, Copy)]
struct BasisShape {
    origin: NaiveDate,
    trend_scale: f64,
    weekly_order: usize,
    yearly_order: usize,
}

impl BasisShape {
    fn width(&self) -> usize {
        // intercept + trend + fourier pairs + two regressors
        2 + 2 * self.weekly_order + 2 * self.yearly_order + 2
    }

    fn day_index(&self, date: NaiveDate) -> f64 {
        (date - self.origin).num_days() as f64
    }

    fn features(&self, date: NaiveDate, temp_c: f64, rain_mm: f64) -> Vec<f64> {
        let t = self.day_index(date);
        let mut row = Vec::with_capacity(self.width());
        row.push(1.0);
        row.push(t / self.trend_scale);
        push_fourier(&mut row, t, WEEKLY_PERIOD, self.weekly_order);
        push_fourier(&mut row, t, YEARLY_PERIOD, self.yearly_order);
        row.push(temp_c);
        row.push(rain_mm);
        row
    }
}

fn push_fourier(row: &mut Vec<f64>, t: f64, period: f64, order: usize) {
    for k in 1..=order {
        let angle = TAU * k as f64 * t / period;
        row.push(angle.sin());
        row.push(angle.cos());
    }
}

struct TrainedSeasonal {
    shape: BasisShape,
    beta: DVector<f64>,
    sigma: f64,
}

impl TrainedSeasonal {
    fn point_estimate(&self, row: &FutureRow) -> f64 {
        let features = self.shape.features(row.date, row.temp_c, row.rain_mm);
        features
            .iter()
            .zip(self.beta.iter())
            .map(|(x, b)| x * b)
            .sum()
    }

    /// Sum of `beta[j] * feature[j]` over a half-open column range.
    fn partial(&self, features: &[f64], cols: std::ops::Range<usize>) -> f64 {
        cols.map(|j| features[j] * self.beta[j]).sum()
    }
}

impl TrainedModel for TrainedSeasonal {
    fn predict(&self, future: &[FutureRow]) -> Result<Vec<ForecastPoint>, AppError> {
        let mut out = Vec::with_capacity(future.len());
        let half_width = INTERVAL_Z * self.sigma;
        for row in future {
            let yhat = self.point_estimate(row);
            if !yhat.is_finite() {
                return Err(AppError::model_fit(format!(
                    "Non-finite prediction for {}.",
                    row.date
                )));
            }
            out.push(ForecastPoint {
                date: row.date,
                yhat,
                yhat_lower: yhat - half_width,
                yhat_upper: yhat + half_width,
            });
        }
        Ok(out)
    }

    fn components(&self, future: &[FutureRow]) -> Result<ModelComponents, AppError> {
        let weekly_cols = 2..2 + 2 * self.shape.weekly_order;
        let yearly_cols = weekly_cols.end..weekly_cols.end + 2 * self.shape.yearly_order;
        let regressor_cols = yearly_cols.end..yearly_cols.end + 2;

        let mut components = ModelComponents {
            dates: Vec::with_capacity(future.len()),
            trend: Vec::with_capacity(future.len()),
            weekly: Vec::with_capacity(future.len()),
            yearly: Vec::with_capacity(future.len()),
            regressors: Vec::with_capacity(future.len()),
        };

        for row in future {
            let features = self.shape.features(row.date, row.temp_c, row.rain_mm);
            components.dates.push(row.date);
            components.trend.push(self.partial(&features, 0..2));
            components
                .weekly
                .push(self.partial(&features, weekly_cols.clone()));
            components
                .yearly
                .push(self.partial(&features, yearly_cols.clone()));
            components
                .regressors
                .push(self.partial(&features, regressor_cols.clone()));
        }

        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImputedRow;
    use crate::error::ErrorKind;

    fn d(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(offset as u64)
    }

    /// A process the model can represent exactly:
    /// sales = 200 + 2*temp - 5*rain + 10*sin(2π t / 7).
    fn synthetic(n: i64) -> ImputedSeries {
        let rows = (0..n)
            .map(|i| {
                let temp = 20.0 + (i % 9) as f64;
                let rain = (i % 4) as f64;
                let weekly = 10.0 * (TAU * i as f64 / 7.0).sin();
                ImputedRow {
                    date: d(i),
                    sales: 200.0 + 2.0 * temp - 5.0 * rain + weekly,
                    temp_c: temp,
                    rain_mm: rain,
                }
            })
            .collect();
        ImputedSeries { rows }
    }

    #[test]
    fn recovers_an_exactly_representable_process() {
        let engine = SeasonalOls::default();
        let model = engine.fit(&synthetic(120)).unwrap();

        let future: Vec<FutureRow> = (120..134)
            .map(|i| FutureRow {
                date: d(i),
                temp_c: 24.0,
                rain_mm: 1.0,
            })
            .collect();

        let points = model.predict(&future).unwrap();
        assert_eq!(points.len(), 14);
        for (i, p) in points.iter().enumerate() {
            let t = (120 + i) as f64;
            let expected = 200.0 + 2.0 * 24.0 - 5.0 * 1.0 + 10.0 * (TAU * t / 7.0).sin();
            assert!(
                (p.yhat - expected).abs() < 1e-6,
                "day {i}: expected {expected}, got {}",
                p.yhat
            );
            assert!(p.yhat_lower <= p.yhat && p.yhat <= p.yhat_upper);
        }
    }

    #[test]
    fn components_sum_to_the_point_estimate() {
        let engine = SeasonalOls::default();
        let model = engine.fit(&synthetic(120)).unwrap();

        let future = vec![FutureRow {
            date: d(130),
            temp_c: 22.0,
            rain_mm: 0.5,
        }];
        let points = model.predict(&future).unwrap();
        let parts = model.components(&future).unwrap();

        let total = parts.trend[0] + parts.weekly[0] + parts.yearly[0] + parts.regressors[0];
        assert!((total - points[0].yhat).abs() < 1e-9);
        // 120 days of span: weekly identified, yearly dropped.
        assert_eq!(parts.yearly[0], 0.0);
    }

    #[test]
    fn rejects_insufficient_points() {
        let engine = SeasonalOls::default();
        let Err(err) = engine.fit(&synthetic(2)) else {
            panic!("fit accepted a 2-day series");
        };
        assert_eq!(err.kind(), ErrorKind::ModelFit);
    }

    #[test]
    fn rejects_constant_sales() {
        let rows = (0..30)
            .map(|i| ImputedRow {
                date: d(i),
                sales: 500.0,
                temp_c: 20.0 + i as f64,
                rain_mm: 0.0,
            })
            .collect();
        let Err(err) = SeasonalOls::default().fit(&ImputedSeries { rows }) else {
            panic!("fit accepted a constant series");
        };
        assert_eq!(err.kind(), ErrorKind::ModelFit);
    }
}
