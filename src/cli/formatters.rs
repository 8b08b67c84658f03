//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation. Charts are
//! horizontal bars drawn with block characters.

use colored::Colorize;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::fx::{NormalizedRecord, RateTable};
use crate::reports::{CurrencyStats, StalenessReport};

const BAR_WIDTH: usize = 40;

#[derive(Tabled)]
struct FundRow {
    #[tabled(rename = "Fund")]
    fund: String,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "NAV")]
    nav: String,
    #[tabled(rename = "NAV Date")]
    nav_date: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "NAV (Base)")]
    nav_base: String,
}

fn fund_rows(records: &[NormalizedRecord], base_currency: &str) -> Vec<FundRow> {
    records
        .iter()
        .map(|r| FundRow {
            fund: r.record.fund.clone(),
            currency: r.record.currency.clone(),
            nav: r
                .record
                .nav
                .map(|v| v.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            nav_date: r
                .record
                .nav_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            rate: r.rate.to_string(),
            nav_base: r
                .nav_base
                .map(|v| format!("{} {:.4}", base_currency, v))
                .unwrap_or_else(|| "N/A".to_string()),
        })
        .collect()
}

fn fund_table(records: &[NormalizedRecord], base_currency: &str) -> String {
    let mut table = Table::new(fund_rows(records, base_currency));
    table.with(Style::modern());
    // Right-align the numeric columns: NAV (2), Rate (4), NAV (Base) (5)
    table.modify(Columns::new(2..3), Alignment::right());
    table.modify(Columns::new(4..), Alignment::right());
    table.to_string()
}

/// Fund overview section
pub fn format_overview(records: &[NormalizedRecord], base_currency: &str) -> String {
    let mut output = format!(
        "\n{} Fund Overview (Normalized to {})\n\n",
        "📋".cyan().bold(),
        base_currency
    );
    output.push_str(&fund_table(records, base_currency));
    output.push_str(&format!(
        "\n\n{} fund(s)\n",
        records.len().to_string().bold()
    ));
    output
}

/// Which aggregate a statistics section displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatMetric {
    Mean,
    StdDev,
}

impl StatMetric {
    fn value(self, stats: &CurrencyStats) -> Option<Decimal> {
        match self {
            StatMetric::Mean => stats.mean,
            StatMetric::StdDev => stats.std_dev,
        }
    }

    fn title(self) -> &'static str {
        match self {
            StatMetric::Mean => "Average NAV by Currency",
            StatMetric::StdDev => "NAV Volatility by Currency",
        }
    }

    fn column(self) -> &'static str {
        match self {
            StatMetric::Mean => "Average NAV",
            StatMetric::StdDev => "Std Deviation",
        }
    }
}

/// Statistics section: table followed by a bar chart, rows in given order
pub fn format_stats(stats: &[CurrencyStats], metric: StatMetric, base_currency: &str) -> String {
    let icon = match metric {
        StatMetric::Mean => "💵",
        StatMetric::StdDev => "📊",
    };
    let mut output = format!(
        "\n{} {} ({})\n\n",
        icon.cyan().bold(),
        metric.title(),
        base_currency
    );

    let mut builder = Builder::default();
    builder.push_record([
        "Currency".to_string(),
        "Funds".to_string(),
        "Priced".to_string(),
        metric.column().to_string(),
    ]);
    for s in stats {
        builder.push_record([
            s.currency.clone(),
            s.funds.to_string(),
            s.priced.to_string(),
            metric
                .value(s)
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "N/A".to_string()),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    let bars: Vec<(String, Option<Decimal>)> = stats
        .iter()
        .map(|s| (s.currency.clone(), metric.value(s)))
        .collect();
    output.push_str("\n\n");
    output.push_str(&format_bar_chart(&bars, BAR_WIDTH));
    output
}

/// Horizontal bar chart scaled to the largest value
pub fn format_bar_chart(bars: &[(String, Option<Decimal>)], width: usize) -> String {
    let label_width = bars.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let max = bars
        .iter()
        .filter_map(|(_, v)| *v)
        .filter(|v| *v > Decimal::ZERO)
        .max()
        .unwrap_or(Decimal::ZERO);

    let mut output = String::new();
    for (label, value) in bars {
        let line = match value {
            Some(v) => {
                let len = if max > Decimal::ZERO && *v > Decimal::ZERO {
                    (*v / max * Decimal::from(width))
                        .round()
                        .to_usize()
                        .unwrap_or(0)
                        .max(1)
                } else {
                    0
                };
                format!(
                    "{:<label_width$} │{} {:.4}",
                    label,
                    "█".repeat(len).cyan(),
                    v,
                    label_width = label_width
                )
            }
            None => format!(
                "{:<label_width$} │ {}",
                label,
                "N/A".bright_black(),
                label_width = label_width
            ),
        };
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Stale fund section: warning line and the stale funds
pub fn format_stale(report: &StalenessReport, base_currency: &str) -> String {
    let as_of = report.as_of.format("%d %b %Y");
    let mut output = format!(
        "\n{} Funds Not Updated (≠ {})\n\n",
        "⚠".yellow().bold(),
        as_of
    );

    if !report.has_stale() {
        output.push_str(&format!(
            "{} All {} fund(s) updated their NAV on {}.\n",
            "✓".green().bold(),
            report.total(),
            as_of
        ));
        return output;
    }

    output.push_str(&format!(
        "{}\n\n",
        format!(
            "{} fund(s) have not updated their NAV on {}.",
            report.stale.len(),
            as_of
        )
        .yellow()
    ));
    output.push_str(&fund_table(&report.stale, base_currency));
    output.push('\n');
    output
}

/// Effective exchange rate table
pub fn format_rates(table: &RateTable) -> String {
    #[derive(Tabled)]
    struct RateRow {
        #[tabled(rename = "Currency")]
        currency: String,
        #[tabled(rename = "Rate")]
        rate: String,
    }

    let rows: Vec<RateRow> = table
        .rates
        .iter()
        .map(|(code, rate)| RateRow {
            currency: code.clone(),
            rate: rate.to_string(),
        })
        .collect();

    let mut output = format!(
        "\n{} Exchange rates to {}\n\n",
        "💱".cyan().bold(),
        table.base
    );
    let mut rendered = Table::new(&rows);
    rendered.with(Style::modern());
    rendered.modify(Columns::new(1..), Alignment::right());
    output.push_str(&rendered.to_string());
    output.push_str(&format!(
        "\n\nUnlisted currencies convert at {}\n",
        table.fallback
    ));
    output
}

/// Message for an input file without any NAV rows
pub fn format_empty_input(path: &Path) -> String {
    format!(
        "{} No NAV records found in {}\n",
        "ℹ".blue().bold(),
        path.display()
    )
}

/// Message for a currency filter that matched no fund
pub fn format_no_match(currencies: &[String]) -> String {
    let selected: Vec<String> = currencies.iter().map(|c| c.trim().to_uppercase()).collect();
    format!(
        "{} No funds quoted in {} (--currency filter)\n",
        "ℹ".blue().bold(),
        selected.join(", ")
    )
}
