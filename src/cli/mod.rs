//! Command-line parsing for the weather-adjusted sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the data/modeling code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::domain::DEFAULT_HORIZON_DAYS;
use crate::report::REPORT_DIR;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "swx", version, about = "Weather-adjusted sales forecaster")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: ingest the ledger, fetch weather, train the
    /// model, and export the report artifacts.
    Run(RunArgs),
    /// Print the weather/sales correlation analysis only, no model fit and
    /// no export (useful for scripting).
    Correlate(RunArgs),
    /// Print ledger metrics (totals, top clients, best day), no weather.
    Summary(SummaryArgs),
}

/// Common options for pipeline commands.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Sales ledger CSV export.
    pub ledger: PathBuf,

    /// Configuration file (JSON); environment variables are used as a
    /// fallback when the file does not exist.
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Forecast horizon beyond the last historical day, in days.
    #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
    pub horizon: u32,

    /// Folder to write report artifacts into.
    #[arg(short = 'o', long, default_value = REPORT_DIR)]
    pub out_dir: PathBuf,
}

/// Options for the ledger summary command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    /// Sales ledger CSV export.
    pub ledger: PathBuf,

    /// Keep only operations on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Keep only operations on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Also export the summary artifacts: daily-trend and top-clients
    /// charts plus a Markdown summary document.
    #[arg(long)]
    pub report: bool,

    /// Folder to write summary artifacts into.
    #[arg(short = 'o', long, default_value = REPORT_DIR)]
    pub out_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["swx", "run", "ventas.csv"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.ledger, PathBuf::from("ventas.csv"));
                assert_eq!(args.horizon, DEFAULT_HORIZON_DAYS);
                assert_eq!(args.out_dir, PathBuf::from(REPORT_DIR));
                assert_eq!(args.config, PathBuf::from("config.json"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn summary_parses_date_bounds() {
        let cli = Cli::try_parse_from([
            "swx", "summary", "ventas.csv", "--from", "2024-01-01", "--to", "2024-03-31",
        ])
        .unwrap();
        match cli.command {
            Command::Summary(args) => {
                assert_eq!(
                    args.from,
                    Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                );
                assert_eq!(args.to, Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
                assert!(!args.report);
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn summary_report_flag_enables_artifact_export() {
        let cli = Cli::try_parse_from(["swx", "summary", "ventas.csv", "--report"]).unwrap();
        match cli.command {
            Command::Summary(args) => {
                assert!(args.report);
                assert_eq!(args.out_dir, PathBuf::from(REPORT_DIR));
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn bad_date_bound_is_a_parse_error() {
        assert!(Cli::try_parse_from(["swx", "summary", "v.csv", "--from", "01/02/2024"]).is_err());
    }
}
