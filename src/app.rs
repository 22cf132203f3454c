//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - ingests the sales ledger
//! - fetches weather and runs the forecast pipeline
//! - prints analysis/forecast output
//! - writes the report artifacts

use std::path::Path;

use clap::Parser;

use crate::cli::{Cli, Command, RunArgs, SummaryArgs};
use crate::config::Config;
use crate::data::{self, WeatherService};
use crate::error::AppError;
use crate::forecast::SeasonalOls;
use crate::report;
use crate::session::{Session, WeatherLoad};

pub mod pipeline;

/// Entry point for the `swx` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Correlate(args) => handle_correlate(args),
        Command::Summary(args) => handle_summary(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = Config::load(&args.config)?;
    let ledger = data::load_ledger(&args.ledger)?;
    for err in &ledger.row_errors {
        eprintln!("warning: ledger line {}: {}", err.line, err.message);
    }

    let daily = ledger.daily();
    let span = match (daily.first(), daily.last()) {
        (Some(first), Some(last)) => Some((first.date, last.date)),
        _ => None,
    };
    println!("{}", report::format_run_header(daily.len(), span, args.horizon));

    let mut session = Session::with_horizon(
        WeatherService::new(&config),
        SeasonalOls::default(),
        args.horizon,
    );
    let out = pipeline::run_forecast(&mut session, daily)?;

    if out.weather == WeatherLoad::Empty {
        println!("No weather coverage for the sales date range; nothing to analyze.");
        return Ok(());
    }
    if let WeatherLoad::Loaded(n) = out.weather {
        println!("Historical weather: {n} days\n");
    }

    if let Some(correlation) = &out.correlation {
        println!("{}", report::format_correlation(correlation));
    }

    match (&out.train_failure, out.last_historical) {
        (Some(failure), _) => {
            eprintln!("warning: model training failed: {failure}");
            eprintln!("warning: continuing with the analysis-only report.");
        }
        (None, Some(last)) => {
            println!();
            println!("{}", report::format_forecast_table(&out.forecast, last));
        }
        (None, None) => {}
    }

    export_artifacts(&args.out_dir, &out)
}

/// Correlation analysis only: historical weather, no model fit, no export.
/// The forecast provider (and its API key) is never touched.
fn handle_correlate(args: RunArgs) -> Result<(), AppError> {
    let config = Config::load(&args.config)?;
    let ledger = data::load_ledger(&args.ledger)?;
    for err in &ledger.row_errors {
        eprintln!("warning: ledger line {}: {}", err.line, err.message);
    }

    let mut session = Session::with_horizon(
        WeatherService::new(&config),
        SeasonalOls::default(),
        args.horizon,
    );
    session.load_sales(ledger.daily())?;

    if session.load_historical_weather()? == WeatherLoad::Empty {
        println!("No weather coverage for the sales date range; nothing to analyze.");
        return Ok(());
    }

    let correlation = crate::analysis::analyze(&session.imputed())?;
    println!("{}", report::format_correlation(&correlation));
    Ok(())
}

/// Write charts, workbook sheets and the report document. Artifact failures
/// are collected and reported together; any failure makes the run exit
/// non-zero after the remaining artifacts were attempted.
fn export_artifacts(out_dir: &Path, out: &pipeline::RunOutput) -> Result<(), AppError> {
    let dir = report::ensure_report_dir(out_dir)?;
    let ts = report::timestamp();
    let mut outcome = report::ExportOutcome::default();

    let correlation_chart = report::unique_path(&dir, "correlacion_clima", &ts, "png");
    outcome.record(
        "correlation chart",
        crate::plot::render_correlation_chart(&correlation_chart, &out.imputed)
            .map(|()| correlation_chart.clone()),
    );

    let mut forecast_chart = None;
    let mut components_chart = None;
    if !out.forecast.is_empty() {
        let path = report::unique_path(&dir, "pronostico_ventas", &ts, "png");
        outcome.record(
            "forecast chart",
            crate::plot::render_forecast_chart(&path, &out.imputed, &out.forecast)
                .map(|()| path.clone()),
        );
        forecast_chart = Some(path);
    }
    if let Some(components) = &out.components {
        let path = report::unique_path(&dir, "componentes_modelo", &ts, "png");
        outcome.record(
            "components chart",
            crate::plot::render_components_chart(&path, components).map(|()| path.clone()),
        );
        components_chart = Some(path);
    }

    match report::write_workbook(
        &dir,
        &ts,
        &report::WorkbookInputs {
            predictions: &out.forecast,
            merged: &out.merged,
            weather_history: &out.weather_history,
            weather_outlook: &out.weather_outlook,
        },
    ) {
        Ok(paths) => outcome.written.extend(paths.written),
        Err((paths, e)) => {
            outcome.written.extend(paths.written);
            outcome.failures.push(("workbook".to_string(), e));
        }
    }

    outcome.record(
        "document",
        report::write_document(
            &dir,
            &ts,
            &report::DocumentInputs {
                correlation: out.correlation.as_ref(),
                correlation_chart: chart_ref(&outcome, &correlation_chart),
                forecast_chart: forecast_chart.as_deref().and_then(|p| chart_ref(&outcome, p)),
                components_chart: components_chart
                    .as_deref()
                    .and_then(|p| chart_ref(&outcome, p)),
                forecast: &out.forecast,
                last_historical: out.last_historical,
            },
        ),
    );

    println!("Artifacts in '{}':", dir.display());
    for path in &outcome.written {
        println!("- {}", path.display());
    }
    for (label, e) in &outcome.failures {
        eprintln!("warning: {label} export failed: {e}");
    }

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(AppError::export(format!(
            "{} of the report artifacts could not be written.",
            outcome.failures.len()
        )))
    }
}

/// Only reference a chart from the document if it was actually written.
fn chart_ref<'a>(outcome: &report::ExportOutcome, path: &'a Path) -> Option<&'a Path> {
    outcome.written.iter().any(|p| p == path).then_some(path)
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let ledger = data::load_ledger(&args.ledger)?;
    for err in &ledger.row_errors {
        eprintln!("warning: ledger line {}: {}", err.line, err.message);
    }

    let rows = data::filter_by_range(&ledger.rows, args.from, args.to);

    if rows.is_empty() {
        return Err(AppError::unavailable(
            "No operations in the requested date range.",
        ));
    }

    let summary = data::summarize(&rows);
    println!("{}", report::format_summary(&summary));

    if args.report {
        export_summary_artifacts(&args.out_dir, &summary)?;
    }
    Ok(())
}

/// Write the summary artifacts: trend chart, top-clients chart, and the
/// Markdown summary document. Same failure policy as the pipeline export.
fn export_summary_artifacts(out_dir: &Path, summary: &data::LedgerSummary) -> Result<(), AppError> {
    let dir = report::ensure_report_dir(out_dir)?;
    let ts = report::timestamp();
    let mut outcome = report::ExportOutcome::default();

    let trend_chart = report::unique_path(&dir, "tendencia_diaria", &ts, "png");
    outcome.record(
        "trend chart",
        crate::plot::render_trend_chart(&trend_chart, &summary.daily)
            .map(|()| trend_chart.clone()),
    );
    let clients_chart = report::unique_path(&dir, "ventas_clientes", &ts, "png");
    outcome.record(
        "top clients chart",
        crate::plot::render_top_clients_chart(&clients_chart, &summary.top_by_sales)
            .map(|()| clients_chart.clone()),
    );

    outcome.record(
        "summary document",
        report::write_summary_document(
            &dir,
            &ts,
            &report::SummaryDocumentInputs {
                summary,
                trend_chart: chart_ref(&outcome, &trend_chart),
                clients_chart: chart_ref(&outcome, &clients_chart),
            },
        ),
    );

    println!("Artifacts in '{}':", dir.display());
    for path in &outcome.written {
        println!("- {}", path.display());
    }
    for (label, e) in &outcome.failures {
        eprintln!("warning: {label} export failed: {e}");
    }

    if outcome.is_complete() {
        Ok(())
    } else {
        Err(AppError::export(format!(
            "{} of the summary artifacts could not be written.",
            outcome.failures.len()
        )))
    }
}
