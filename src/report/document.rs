//! Report document assembly (Markdown).
//!
//! The document is a fixed sequence of sections; any section whose inputs are
//! missing (e.g., no trained model yet) is omitted rather than failing the
//! whole export. Chart sections reference the independently exported PNG
//! artifacts by relative filename.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::data::LedgerSummary;
use crate::domain::{CorrelationResult, ForecastPoint};
use crate::error::AppError;
use crate::report::artifacts::unique_path;
use crate::report::{fmt_opt_mean, seven_day_extract, sign_note};

/// Everything the document can include. All chart/forecast inputs are
/// optional by design.
pub struct DocumentInputs<'a> {
    pub correlation: Option<&'a CorrelationResult>,
    pub correlation_chart: Option<&'a Path>,
    pub forecast_chart: Option<&'a Path>,
    pub components_chart: Option<&'a Path>,
    pub forecast: &'a [ForecastPoint],
    pub last_historical: Option<NaiveDate>,
}

/// Render and write the document; returns the path written.
pub fn write_document(
    dir: &Path,
    ts: &str,
    inputs: &DocumentInputs<'_>,
) -> Result<PathBuf, AppError> {
    let path = unique_path(dir, "informe_prediccion_clima", ts, "md");
    let body = render_document(inputs);
    std::fs::write(&path, body).map_err(|e| {
        AppError::export(format!(
            "Failed to write report document '{}': {e}",
            path.display()
        ))
    })?;
    Ok(path)
}

pub fn render_document(inputs: &DocumentInputs<'_>) -> String {
    let mut out = String::new();

    // 1) Overview.
    out.push_str("# Weather-adjusted sales report\n\n");
    out.push_str(
        "This report shows the relationship between weather and sales, and the \
         sales outlook adjusted for weather covariates.\n\n",
    );

    // 2) Correlation chart.
    if let Some(chart) = inputs.correlation_chart {
        out.push_str("## Weather vs sales correlation\n\n");
        push_image(&mut out, chart);
    }

    if let Some(corr) = inputs.correlation {
        out.push_str("## Correlation coefficients\n\n");
        out.push_str(&format!(
            "- Sales vs temperature: {}\n",
            sign_note(corr.temp)
        ));
        out.push_str(&format!("- Sales vs rain: {}\n\n", sign_note(corr.rain)));

        // 3) Extremes tables.
        out.push_str("## Top 5 hottest days\n\n");
        out.push_str("| date | temp (°C) | sales |\n|---|---|---|\n");
        for row in &corr.hottest {
            out.push_str(&format!(
                "| {} | {:.1} | {:.2} |\n",
                row.date, row.temp_c, row.sales
            ));
        }
        out.push_str("\n## Top 5 wettest days\n\n");
        out.push_str("| date | rain (mm) | sales |\n|---|---|---|\n");
        for row in &corr.wettest {
            out.push_str(&format!(
                "| {} | {:.1} | {:.2} |\n",
                row.date, row.rain_mm, row.sales
            ));
        }

        // 4) Climate-conditioned averages.
        out.push_str("\n## Average sales by climate condition\n\n");
        out.push_str(&format!(
            "- Dry days (rain = 0mm): {}\n",
            fmt_opt_mean(corr.dry_mean)
        ));
        out.push_str(&format!(
            "- Wet days (rain > 0mm): {}\n\n",
            fmt_opt_mean(corr.wet_mean)
        ));
    }

    // 5) Forecast chart.
    if let Some(chart) = inputs.forecast_chart {
        out.push_str("## Weather-adjusted sales forecast\n\n");
        push_image(&mut out, chart);
    }

    // 6) Model components chart.
    if let Some(chart) = inputs.components_chart {
        out.push_str("## Model components\n\n");
        out.push_str(
            "Trend, weekly/yearly seasonality, and the weather-regressor \
             contribution fitted by the model.\n\n",
        );
        push_image(&mut out, chart);
    }

    // 7) Numeric 7-day table.
    if let Some(last) = inputs.last_historical {
        let next = seven_day_extract(inputs.forecast, last);
        if !next.is_empty() {
            out.push_str("## Next 7 days\n\n");
            out.push_str("| date | prediction | lower | upper |\n|---|---|---|---|\n");
            for p in next {
                out.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:.2} |\n",
                    p.date, p.yhat, p.yhat_lower, p.yhat_upper
                ));
            }
        }
    }

    out
}

/// Inputs for the ledger-summary document. Charts are optional: a failed
/// chart export drops its section, not the document.
pub struct SummaryDocumentInputs<'a> {
    pub summary: &'a LedgerSummary,
    pub trend_chart: Option<&'a Path>,
    pub clients_chart: Option<&'a Path>,
}

/// Render and write the ledger-summary document; returns the path written.
pub fn write_summary_document(
    dir: &Path,
    ts: &str,
    inputs: &SummaryDocumentInputs<'_>,
) -> Result<PathBuf, AppError> {
    let path = unique_path(dir, "informe_resumen_ventas", ts, "md");
    let body = render_summary_document(inputs);
    std::fs::write(&path, body).map_err(|e| {
        AppError::export(format!(
            "Failed to write summary document '{}': {e}",
            path.display()
        ))
    })?;
    Ok(path)
}

pub fn render_summary_document(inputs: &SummaryDocumentInputs<'_>) -> String {
    let s = inputs.summary;
    let mut out = String::new();

    out.push_str("# Sales summary report\n\n");
    out.push_str("## Overview\n\n");
    out.push_str(&format!("- Operations: {}\n", s.operations));
    out.push_str(&format!("- Total sales: {:.2}\n", s.total_sales));
    out.push_str(&format!("- Total discounts: {:.2}\n", s.total_discounts));
    out.push_str(&format!("- Total units: {}\n", s.total_units));
    out.push_str(&format!("- Average ticket: {:.2}\n", s.average_ticket));
    if let Some(best) = s.best_day {
        out.push_str(&format!("- Best day: {} ({:.2})\n", best.date, best.amount));
    }
    out.push('\n');

    out.push_str("## Top clients by sales\n\n");
    out.push_str("| client | sales |\n|---|---|\n");
    for (client, total) in &s.top_by_sales {
        out.push_str(&format!("| {client} | {total:.2} |\n"));
    }
    out.push_str("\n## Top clients by units\n\n");
    out.push_str("| client | units |\n|---|---|\n");
    for (client, units) in &s.top_by_units {
        out.push_str(&format!("| {client} | {units} |\n"));
    }
    out.push('\n');

    if let Some(chart) = inputs.clients_chart {
        out.push_str("## Top clients chart\n\n");
        push_image(&mut out, chart);
    }
    if let Some(chart) = inputs.trend_chart {
        out.push_str("## Daily sales trend\n\n");
        push_image(&mut out, chart);
    }

    out.push_str("## Sales by day\n\n");
    out.push_str("| date | sales |\n|---|---|\n");
    for day in &s.daily {
        out.push_str(&format!("| {} | {:.2} |\n", day.date, day.amount));
    }

    out
}

fn push_image(out: &mut String, chart: &Path) {
    let name = chart
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| chart.display().to_string());
    out.push_str(&format!("![{name}]({name})\n\n"));
}
