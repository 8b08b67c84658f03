//! Command dispatcher that routes parsed CLI commands to their handlers.
//!
//! Every handler follows the same path: load config, read and normalize the
//! CSV, build the section(s) it needs, then print either tables or JSON.

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::cli::formatters::{self, StatMetric};
use crate::cli::{AlertArgs, Cli, Commands, InputArgs};
use crate::config::Config;
use crate::error::NavError;
use crate::fx::{NormalizedRecord, RateTable};
use crate::importers;
use crate::notify::{format_stale_summary, WebhookNotifier, WebhookPayload};
use crate::reports::{self, StalenessReport};

/// Route a parsed command line to its handler
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let json_output = cli.json;

    match cli.command {
        Commands::Show { input } => dispatch_show(&config, &input, json_output),
        Commands::Stats { input } => dispatch_stats(&config, &input, json_output),
        Commands::Stale { file, alert } => {
            dispatch_stale(&config, file, &alert, json_output).await
        }
        Commands::Report { input, alert } => {
            dispatch_report(&config, &input, &alert, json_output).await
        }
        Commands::Rates => dispatch_rates(&config, json_output),
    }
}

/// Records read from the input file, normalized with the configured rates
struct LoadedInput {
    path: PathBuf,
    rates: RateTable,
    records: Vec<NormalizedRecord>,
}

fn load_input(config: &Config, file: Option<PathBuf>) -> Result<LoadedInput> {
    let path = file
        .or_else(|| config.csv_path.clone())
        .ok_or_else(|| anyhow!("No input file: pass a CSV path or set `csv_path` in the config"))?;

    let raw = importers::import_file(&path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    let rates = config.rate_table();
    let records = rates.normalize(&raw);
    info!("Loaded {} NAV records from {:?}", records.len(), path);

    Ok(LoadedInput {
        path,
        rates,
        records,
    })
}

/// Why a filtered selection came out empty: no rows at all, or none in the chosen currencies
fn empty_message(loaded: &LoadedInput, currencies: &[String]) -> String {
    if loaded.records.is_empty() || currencies.is_empty() {
        formatters::format_empty_input(&loaded.path)
    } else {
        formatters::format_no_match(currencies)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

fn dispatch_show(config: &Config, input: &InputArgs, json_output: bool) -> Result<()> {
    let loaded = load_input(config, input.file.clone())?;
    let records = reports::filter_currencies(&loaded.records, &input.currencies);

    if json_output {
        return print_json(&records);
    }

    if records.is_empty() {
        print!("{}", empty_message(&loaded, &input.currencies));
        return Ok(());
    }

    print!("{}", formatters::format_overview(&records, &loaded.rates.base));
    Ok(())
}

fn dispatch_stats(config: &Config, input: &InputArgs, json_output: bool) -> Result<()> {
    let loaded = load_input(config, input.file.clone())?;
    let records = reports::filter_currencies(&loaded.records, &input.currencies);
    let stats = reports::currency_stats(&records);
    let average = reports::by_mean_desc(&stats);
    let volatility = reports::by_std_dev_desc(&stats);

    if json_output {
        #[derive(Serialize)]
        struct StatsJson<'a> {
            base_currency: &'a str,
            average: &'a [reports::CurrencyStats],
            volatility: &'a [reports::CurrencyStats],
        }

        return print_json(&StatsJson {
            base_currency: &loaded.rates.base,
            average: &average,
            volatility: &volatility,
        });
    }

    if records.is_empty() {
        print!("{}", empty_message(&loaded, &input.currencies));
        return Ok(());
    }

    print!(
        "{}",
        formatters::format_stats(&average, StatMetric::Mean, &loaded.rates.base)
    );
    print!(
        "{}",
        formatters::format_stats(&volatility, StatMetric::StdDev, &loaded.rates.base)
    );
    Ok(())
}

fn dispatch_rates(config: &Config, json_output: bool) -> Result<()> {
    let table = config.rate_table();

    if json_output {
        return print_json(&table);
    }

    print!("{}", formatters::format_rates(&table));
    Ok(())
}

/// What happened to the webhook alert, for JSON output
#[derive(Debug, Serialize)]
struct NotificationJson {
    payload: WebhookPayload,
    sent: bool,
    dry_run: bool,
    status: Option<u16>,
}

async fn dispatch_stale(
    config: &Config,
    file: Option<PathBuf>,
    alert: &AlertArgs,
    json_output: bool,
) -> Result<()> {
    let loaded = load_input(config, file)?;
    let as_of = reports::resolve_as_of(alert.as_of, config.as_of_date()?, &loaded.records)?;
    let report = reports::detect_stale(&loaded.records, as_of);

    if !json_output {
        print!("{}", formatters::format_stale(&report, &loaded.rates.base));
    }

    let notification = send_alert(config, &report, &loaded.rates.base, alert, json_output).await?;

    if json_output {
        #[derive(Serialize)]
        struct StaleJson<'a> {
            as_of: chrono::NaiveDate,
            total: usize,
            stale_count: usize,
            stale: &'a [NormalizedRecord],
            notification: Option<NotificationJson>,
        }

        print_json(&StaleJson {
            as_of: report.as_of,
            total: report.total(),
            stale_count: report.stale.len(),
            stale: &report.stale,
            notification,
        })?;
    }

    Ok(())
}

async fn dispatch_report(
    config: &Config,
    input: &InputArgs,
    alert: &AlertArgs,
    json_output: bool,
) -> Result<()> {
    let loaded = load_input(config, input.file.clone())?;
    let as_of = reports::resolve_as_of(alert.as_of, config.as_of_date()?, &loaded.records)?;
    let report = reports::build_nav_report(
        &loaded.records,
        &loaded.rates.base,
        &input.currencies,
        as_of,
    );

    if !json_output {
        if loaded.records.is_empty() {
            print!("{}", formatters::format_empty_input(&loaded.path));
            return Ok(());
        }

        let base = &report.base_currency;
        print!("{}", formatters::format_overview(&report.overview, base));
        print!(
            "{}",
            formatters::format_stats(&report.average, StatMetric::Mean, base)
        );
        print!(
            "{}",
            formatters::format_stats(&report.volatility, StatMetric::StdDev, base)
        );
        print!("{}", formatters::format_stale(&report.staleness, base));
    }

    let notification = send_alert(
        config,
        &report.staleness,
        &report.base_currency,
        alert,
        json_output,
    )
    .await?;

    if json_output {
        #[derive(Serialize)]
        struct ReportJson<'a> {
            #[serde(flatten)]
            report: &'a reports::NavReport,
            notification: Option<NotificationJson>,
        }

        print_json(&ReportJson {
            report: &report,
            notification,
        })?;
    }

    Ok(())
}

/// Post (or preview) the stale summary when `--notify` is set.
///
/// Nothing is posted when every fund is current.
async fn send_alert(
    config: &Config,
    report: &StalenessReport,
    base_currency: &str,
    alert: &AlertArgs,
    json_output: bool,
) -> Result<Option<NotificationJson>> {
    if !alert.notify {
        return Ok(None);
    }

    let payload = WebhookPayload {
        text: format_stale_summary(report, base_currency),
    };

    if alert.dry_run {
        if !json_output {
            println!(
                "\n{} Dry run - webhook payload not sent:\n{}",
                "ℹ".blue().bold(),
                serde_json::to_string_pretty(&payload).context("JSON serialization failed")?
            );
        }
        return Ok(Some(NotificationJson {
            payload,
            sent: false,
            dry_run: true,
            status: None,
        }));
    }

    if !report.has_stale() {
        info!("All funds current on {}, skipping webhook", report.as_of);
        if !json_output {
            println!("\n{} No stale funds - webhook not called", "ℹ".blue().bold());
        }
        return Ok(Some(NotificationJson {
            payload,
            sent: false,
            dry_run: false,
            status: None,
        }));
    }

    let url = config.webhook_url.as_deref().ok_or(NavError::NoWebhook)?;
    let notifier = WebhookNotifier::new(url, config.timeout())?;
    let outcome = notifier
        .send(&payload.text)
        .await
        .context("Failed to deliver stale NAV alert")?;

    if !json_output {
        println!(
            "\n{} Stale NAV alert sent ({})",
            "✓".green().bold(),
            outcome.status
        );
    }

    Ok(Some(NotificationJson {
        payload,
        sent: true,
        dry_run: false,
        status: Some(outcome.status.as_u16()),
    }))
}
