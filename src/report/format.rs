//! Formatted terminal output for analysis, forecast and summary results.
//!
//! We keep formatting code in one place so:
//! - the fitting/analysis code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use chrono::NaiveDate;

use crate::data::LedgerSummary;
use crate::domain::{CorrelationResult, CorrelationSign, ForecastPoint, ImputedRow};
use crate::report::seven_day_extract;

/// Coefficient with its sign label, or `n/a` when Pearson was undefined.
pub fn sign_note(coefficient: Option<f64>) -> String {
    match coefficient {
        Some(r) => format!("{r:.3} ({})", CorrelationSign::of(r).display_name()),
        None => "n/a (not computable)".to_string(),
    }
}

/// Conditional mean, or `n/a` when the partition was empty.
pub fn fmt_opt_mean(mean: Option<f64>) -> String {
    match mean {
        Some(m) => format!("{m:.2}"),
        None => "n/a (no such days)".to_string(),
    }
}

/// Format the full correlation analysis block.
pub fn format_correlation(result: &CorrelationResult) -> String {
    let mut out = String::new();

    out.push_str("Correlation with sales:\n");
    out.push_str(&format!("- temperature: {}\n", sign_note(result.temp)));
    out.push_str(&format!("- rain       : {}\n", sign_note(result.rain)));
    out.push('\n');

    out.push_str("Top hottest days:\n");
    out.push_str(&format_extremes_table(&result.hottest, "temp_c", |r| {
        r.temp_c
    }));
    out.push('\n');

    out.push_str("Top wettest days:\n");
    out.push_str(&format_extremes_table(&result.wettest, "rain_mm", |r| {
        r.rain_mm
    }));
    out.push('\n');

    out.push_str("Average sales by condition:\n");
    out.push_str(&format!("- dry days (rain = 0mm): {}\n", fmt_opt_mean(result.dry_mean)));
    out.push_str(&format!("- wet days (rain > 0mm): {}\n", fmt_opt_mean(result.wet_mean)));

    out
}

fn format_extremes_table(
    rows: &[ImputedRow],
    value_label: &str,
    value: impl Fn(&ImputedRow) -> f64,
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:>10} {:>12}\n",
        "date", value_label, "sales"
    ));
    out.push_str(&format!("{:-<12} {:-<10} {:-<12}\n", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:<12} {:>10.1} {:>12.2}\n",
            r.date.to_string(),
            value(r),
            r.sales
        ));
    }
    out
}

/// Format the next-7-days forecast table shown after training.
pub fn format_forecast_table(forecast: &[ForecastPoint], last_historical: NaiveDate) -> String {
    let mut out = String::new();

    out.push_str("Next 7 days (weather-adjusted):\n");
    out.push_str(&format!(
        "{:<12} {:>12} {:>12} {:>12}\n",
        "date", "prediction", "lower", "upper"
    ));
    out.push_str(&format!("{:-<12} {:-<12} {:-<12} {:-<12}\n", "", "", "", ""));
    for p in seven_day_extract(forecast, last_historical) {
        out.push_str(&format!(
            "{:<12} {:>12.2} {:>12.2} {:>12.2}\n",
            p.date.to_string(),
            p.yhat,
            p.yhat_lower,
            p.yhat_upper
        ));
    }

    out
}

/// Format the ledger summary block (the `summary` command's output).
pub fn format_summary(summary: &LedgerSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Ledger summary ===\n");
    out.push_str(&format!("Operations    : {}\n", summary.operations));
    out.push_str(&format!("Total sales   : {:.2}\n", summary.total_sales));
    out.push_str(&format!("Total discounts: {:.2}\n", summary.total_discounts));
    out.push_str(&format!("Total units   : {}\n", summary.total_units));
    out.push_str(&format!("Average ticket: {:.2}\n", summary.average_ticket));
    if let Some(best) = summary.best_day {
        out.push_str(&format!(
            "Best day      : {} ({:.2})\n",
            best.date, best.amount
        ));
    }
    out.push('\n');

    out.push_str("Top clients by sales:\n");
    out.push_str(&format!("{:<28} {:>12}\n", "client", "sales"));
    out.push_str(&format!("{:-<28} {:-<12}\n", "", ""));
    for (client, total) in &summary.top_by_sales {
        out.push_str(&format!("{:<28} {:>12.2}\n", truncate(client, 28), total));
    }
    out.push('\n');

    out.push_str("Top clients by units:\n");
    out.push_str(&format!("{:<28} {:>12}\n", "client", "units"));
    out.push_str(&format!("{:-<28} {:-<12}\n", "", ""));
    for (client, units) in &summary.top_by_units {
        out.push_str(&format!("{:<28} {:>12}\n", truncate(client, 28), units));
    }
    out.push('\n');

    out.push_str("Sales by day:\n");
    out.push_str(&format!("{:<12} {:>12}\n", "date", "sales"));
    out.push_str(&format!("{:-<12} {:-<12}\n", "", ""));
    for day in &summary.daily {
        out.push_str(&format!(
            "{:<12} {:>12.2}\n",
            day.date.to_string(),
            day.amount
        ));
    }

    out
}

/// Header block printed at the start of a pipeline run.
pub fn format_run_header(
    sales_days: usize,
    span: Option<(NaiveDate, NaiveDate)>,
    horizon_days: u32,
) -> String {
    let mut out = String::new();
    out.push_str("=== swx - Weather-adjusted sales forecast ===\n");
    match span {
        Some((first, last)) => {
            out.push_str(&format!(
                "Sales: {sales_days} days | span=[{first}, {last}]\n"
            ));
        }
        None => out.push_str(&format!("Sales: {sales_days} days\n")),
    }
    out.push_str(&format!("Horizon: {horizon_days} days\n"));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
