//! PNG chart rendering for the exported report.
//!
//! Charts are drawn with geometric primitives only (frames, mesh lines,
//! series); no text is rasterized, so the bitmap backend needs no font
//! machinery. The report document carries the titles and axis meaning.
//!
//! All series and bounds are computed before drawing, and degenerate bounds
//! (empty, constant, or non-finite data) are rejected up front rather than
//! handed to the chart builder.

use std::path::Path;

use chrono::NaiveDate;
use plotters::prelude::*;

use crate::domain::{ForecastPoint, ImputedSeries, SalesPoint};
use crate::error::AppError;
use crate::forecast::ModelComponents;

const CHART_SIZE: (u32, u32) = (960, 540);

/// Scatter panels of sales against each weather covariate:
/// temperature on the left, rain on the right.
pub fn render_correlation_chart(path: &Path, series: &ImputedSeries) -> Result<(), AppError> {
    let temp: Vec<(f64, f64)> = series.rows.iter().map(|r| (r.temp_c, r.sales)).collect();
    let rain: Vec<(f64, f64)> = series.rows.iter().map(|r| (r.rain_mm, r.sales)).collect();

    let (sales_lo, sales_hi) = padded_range(series.rows.iter().map(|r| r.sales))
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate sales range."))?;
    let temp_bounds = padded_range(series.rows.iter().map(|r| r.temp_c));
    let rain_bounds = padded_range(series.rows.iter().map(|r| r.rain_mm));

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, &e))?;

    let drawn: Result<(), Box<dyn std::error::Error>> = (|| {
        let panels = root.split_evenly((1, 2));

        if let Some((lo, hi)) = temp_bounds {
            let mut chart = ChartBuilder::on(&panels[0])
                .margin(12)
                .build_cartesian_2d(lo..hi, sales_lo..sales_hi)?;
            chart.configure_mesh().x_labels(0).y_labels(0).draw()?;
            chart.draw_series(
                temp.iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, RGBColor(230, 126, 34).filled())),
            )?;
        }

        if let Some((lo, hi)) = rain_bounds {
            let mut chart = ChartBuilder::on(&panels[1])
                .margin(12)
                .build_cartesian_2d(lo..hi, sales_lo..sales_hi)?;
            chart.configure_mesh().x_labels(0).y_labels(0).draw()?;
            chart.draw_series(
                rain.iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, RGBColor(52, 152, 219).filled())),
            )?;
        }

        Ok(())
    })();
    drawn.map_err(|e| chart_err(path, &e))?;
    root.present().map_err(|e| chart_err(path, &e))
}

/// Historical sales as points, the forecast as a line, and the prediction
/// interval as a shaded band.
pub fn render_forecast_chart(
    path: &Path,
    history: &ImputedSeries,
    forecast: &[ForecastPoint],
) -> Result<(), AppError> {
    let origin = history
        .rows
        .first()
        .map(|r| r.date)
        .or_else(|| forecast.first().map(|p| p.date))
        .ok_or_else(|| AppError::unavailable("Nothing to plot: empty forecast."))?;
    let day = |d: NaiveDate| (d - origin).num_days() as f64;

    let observed: Vec<(f64, f64)> = history.rows.iter().map(|r| (day(r.date), r.sales)).collect();
    let line: Vec<(f64, f64)> = forecast.iter().map(|p| (day(p.date), p.yhat)).collect();
    // Band polygon: lower bound left-to-right, then upper bound back.
    let mut band: Vec<(f64, f64)> = forecast
        .iter()
        .map(|p| (day(p.date), p.yhat_lower))
        .collect();
    band.extend(forecast.iter().rev().map(|p| (day(p.date), p.yhat_upper)));

    let xs = observed.iter().chain(&line).map(|&(x, _)| x);
    let ys = observed
        .iter()
        .chain(&band)
        .chain(&line)
        .map(|&(_, y)| y);
    let (x_lo, x_hi) = padded_range(xs)
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate date range."))?;
    let (y_lo, y_hi) = padded_range(ys)
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate value range."))?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, &e))?;

    let drawn: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
        chart.configure_mesh().x_labels(0).y_labels(0).draw()?;

        let band_color = RGBColor(52, 152, 219).mix(0.25);
        let line_color = RGBColor(41, 128, 185);

        chart.draw_series(std::iter::once(Polygon::new(band.clone(), band_color)))?;
        chart.draw_series(LineSeries::new(line.iter().copied(), line_color.stroke_width(2)))?;
        chart.draw_series(
            observed
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 2, BLACK.filled())),
        )?;

        Ok(())
    })();
    drawn.map_err(|e| chart_err(path, &e))?;
    root.present().map_err(|e| chart_err(path, &e))
}

/// Stacked panels of the fitted model components: trend, weekly seasonality,
/// yearly seasonality, weather-regressor contribution.
pub fn render_components_chart(path: &Path, components: &ModelComponents) -> Result<(), AppError> {
    let origin = components
        .dates
        .first()
        .copied()
        .ok_or_else(|| AppError::unavailable("Nothing to plot: empty components."))?;
    let xs: Vec<f64> = components
        .dates
        .iter()
        .map(|&d| (d - origin).num_days() as f64)
        .collect();
    let (x_lo, x_hi) = padded_range(xs.iter().copied())
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate date range."))?;

    let panels_data: [&[f64]; 4] = [
        &components.trend,
        &components.weekly,
        &components.yearly,
        &components.regressors,
    ];

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, &e))?;

    let drawn: Result<(), Box<dyn std::error::Error>> = (|| {
        let panels = root.split_evenly((4, 1));
        for (panel, values) in panels.iter().zip(panels_data) {
            // Flat components (e.g. yearly on a short series) still get a
            // visible zero line, so every panel reads the same way.
            let (y_lo, y_hi) =
                padded_range(values.iter().copied()).unwrap_or((-1.0, 1.0));
            let mut chart = ChartBuilder::on(panel)
                .margin(8)
                .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
            chart.configure_mesh().x_labels(0).y_labels(0).draw()?;
            chart.draw_series(LineSeries::new(
                xs.iter().copied().zip(values.iter().copied()),
                RGBColor(41, 128, 185).stroke_width(2),
            ))?;
        }
        Ok(())
    })();
    drawn.map_err(|e| chart_err(path, &e))?;
    root.present().map_err(|e| chart_err(path, &e))
}

/// Daily sales trend: one line with point markers, weather-free.
pub fn render_trend_chart(path: &Path, daily: &[SalesPoint]) -> Result<(), AppError> {
    let origin = daily
        .first()
        .map(|p| p.date)
        .ok_or_else(|| AppError::unavailable("Nothing to plot: empty sales series."))?;
    let points: Vec<(f64, f64)> = daily
        .iter()
        .map(|p| ((p.date - origin).num_days() as f64, p.amount))
        .collect();

    let (x_lo, x_hi) = padded_range(points.iter().map(|&(x, _)| x))
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate date range."))?;
    let (y_lo, y_hi) = padded_range(points.iter().map(|&(_, y)| y))
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate value range."))?;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, &e))?;

    let drawn: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
        chart.configure_mesh().x_labels(0).y_labels(0).draw()?;

        let color = RGBColor(41, 128, 185);
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
        chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))?;
        Ok(())
    })();
    drawn.map_err(|e| chart_err(path, &e))?;
    root.present().map_err(|e| chart_err(path, &e))
}

/// Horizontal bars of the top clients' summed sales, largest at the top.
pub fn render_top_clients_chart(path: &Path, totals: &[(String, f64)]) -> Result<(), AppError> {
    if totals.is_empty() {
        return Err(AppError::unavailable("Nothing to plot: no client totals."));
    }
    // Bars grow from zero, so zero anchors the value axis.
    let (_, x_hi) = padded_range(totals.iter().map(|&(_, v)| v).chain(std::iter::once(0.0)))
        .ok_or_else(|| AppError::unavailable("Nothing to plot: degenerate client totals."))?;
    let n = totals.len() as f64;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_err(path, &e))?;

    let drawn: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .build_cartesian_2d(0.0..x_hi, 0.0..n)?;
        chart.configure_mesh().x_labels(0).y_labels(0).draw()?;

        for (i, (_, total)) in totals.iter().enumerate() {
            let top = n - i as f64;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(0.0, top - 0.8), (total.max(0.0), top - 0.2)],
                RGBColor(52, 152, 219).filled(),
            )))?;
        }
        Ok(())
    })();
    drawn.map_err(|e| chart_err(path, &e))?;
    root.present().map_err(|e| chart_err(path, &e))
}

/// Finite min/max padded by 5%, widened when the data is constant.
/// `None` when there is no finite value to plot.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    let pad = ((hi - lo) * 0.05).max(1e-6);
    Some((lo - pad, hi + pad))
}

fn chart_err(path: &Path, e: &dyn std::fmt::Display) -> AppError {
    AppError::export(format!("Chart '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImputedRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series() -> ImputedSeries {
        ImputedSeries {
            rows: (1..=10)
                .map(|day| ImputedRow {
                    date: d(day),
                    sales: 100.0 + f64::from(day) * 3.0,
                    temp_c: 20.0 + f64::from(day),
                    rain_mm: f64::from(day % 3),
                })
                .collect(),
        }
    }

    fn out(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("sales-wx-chart-tests");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn padded_range_ignores_non_finite_values() {
        let r = padded_range([1.0, f64::NAN, 3.0, f64::INFINITY].into_iter()).unwrap();
        assert!(r.0 < 1.0 && r.1 > 3.0);
        assert!(padded_range(std::iter::empty()).is_none());
        // Constant data still yields a non-empty interval.
        let flat = padded_range([5.0, 5.0].into_iter()).unwrap();
        assert!(flat.1 > flat.0);
    }

    #[test]
    fn forecast_chart_writes_a_png() {
        let forecast: Vec<ForecastPoint> = (1..=15)
            .map(|day| ForecastPoint {
                date: d(day),
                yhat: 110.0 + f64::from(day),
                yhat_lower: 100.0 + f64::from(day),
                yhat_upper: 120.0 + f64::from(day),
            })
            .collect();

        let path = out("forecast.png");
        render_forecast_chart(&path, &series(), &forecast).unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        assert!(len > 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn correlation_chart_writes_a_png() {
        let path = out("correlation.png");
        render_correlation_chart(&path, &series()).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn components_chart_handles_flat_panels() {
        let n = 10usize;
        let components = ModelComponents {
            dates: (1..=n as u32).map(d).collect(),
            trend: (0..n).map(|i| 100.0 + i as f64).collect(),
            weekly: (0..n).map(|i| (i as f64).sin()).collect(),
            yearly: vec![0.0; n],
            regressors: (0..n).map(|i| i as f64 * 0.1).collect(),
        };

        let path = out("components.png");
        render_components_chart(&path, &components).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn trend_chart_writes_a_png() {
        let daily: Vec<SalesPoint> = (1..=14)
            .map(|day| SalesPoint {
                date: d(day),
                amount: 100.0 + f64::from(day % 5) * 12.0,
            })
            .collect();

        let path = out("trend.png");
        render_trend_chart(&path, &daily).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn top_clients_chart_writes_a_png() {
        let totals = vec![
            ("Bodega Rosa".to_string(), 300.0),
            ("Juan Pérez".to_string(), 60.0),
            ("María".to_string(), 0.0),
        ];

        let path = out("clients.png");
        render_top_clients_chart(&path, &totals).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();

        let err = render_top_clients_chart(&out("no-clients.png"), &[]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataUnavailable);
    }

    #[test]
    fn empty_series_is_rejected() {
        let path = out("never-written.png");
        let err = render_correlation_chart(&path, &ImputedSeries::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataUnavailable);
    }
}
