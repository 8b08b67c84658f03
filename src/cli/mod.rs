use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::importers::nav_csv::parse_nav_date;

pub mod formatters;

#[derive(Parser, Debug)]
#[command(name = "navwatch")]
#[command(
    version,
    about = "Fund NAV report with currency normalization and stale NAV alerts"
)]
#[command(
    long_about = "Read a scraped CSV of fund NAVs, convert every NAV to one base currency, summarise average NAV and volatility per currency, and flag funds whose NAV date is not the as-of date. The stale list can be posted to a chat webhook."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Config file (default: $NAVWATCH_CONFIG or <config dir>/navwatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fund overview with NAVs normalized to the base currency
    Show {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Average NAV and NAV volatility per currency
    Stats {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Funds whose NAV was not published on the as-of date
    Stale {
        /// Path to the NAV CSV file (default: `csv_path` from the config)
        file: Option<PathBuf>,

        #[command(flatten)]
        alert: AlertArgs,
    },

    /// Every section: overview, average, volatility and stale funds
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        alert: AlertArgs,
    },

    /// Show the exchange rates in effect
    Rates,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Path to the NAV CSV file (default: `csv_path` from the config)
    pub file: Option<PathBuf>,

    /// Only include these currencies (repeatable; default: all)
    #[arg(short, long = "currency", value_name = "CODE")]
    pub currencies: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AlertArgs {
    /// Expected NAV date (YYYY-MM-DD; default: config `as_of`, else latest NAV date)
    #[arg(long, value_parser = parse_as_of)]
    pub as_of: Option<NaiveDate>,

    /// Post the stale fund summary to the configured webhook
    #[arg(long)]
    pub notify: bool,

    /// Print the webhook payload instead of sending it
    #[arg(short, long, requires = "notify")]
    pub dry_run: bool,
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    parse_nav_date(s).ok_or_else(|| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}
