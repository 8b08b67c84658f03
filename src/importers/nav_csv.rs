use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::NavError;

/// One fund NAV row as scraped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavRecord {
    pub fund: String,
    pub currency: String,
    pub nav: Option<Decimal>,
    pub nav_date: Option<NaiveDate>,
}

/// Parse a scraped NAV CSV file
pub fn parse_nav_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<NavRecord>> {
    let path = file_path.as_ref();
    info!("Parsing NAV CSV file: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true) // Allow variable number of columns
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    debug!("CSV headers: {:?}", headers);

    let column_mapping = find_columns(&headers)?;
    debug!("Column mapping: {:?}", column_mapping);

    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;

        if let Some(nav_record) = parse_csv_row(&record, &column_mapping, idx + 2) {
            records.push(nav_record);
        }
    }

    info!("Successfully parsed {} NAV records from CSV", records.len());
    Ok(records)
}

#[derive(Debug)]
struct CsvColumnMapping {
    fund: Option<usize>,
    currency: usize,
    nav: usize,
    date: usize,
}

fn find_columns(headers: &csv::StringRecord) -> Result<CsvColumnMapping> {
    let mut fund_idx = None;
    let mut currency_idx = None;
    let mut nav_idx = None;
    let mut date_idx = None;

    for (idx, header) in headers.iter().enumerate() {
        let text = header.trim().to_lowercase();

        // Unnamed index column from a dataframe export
        if text.is_empty() {
            continue;
        }

        if text.contains("date") {
            if date_idx.is_none() {
                date_idx = Some(idx);
            }
        } else if text.contains("currency") || text == "ccy" {
            if currency_idx.is_none() {
                currency_idx = Some(idx);
            }
        } else if text == "nav" {
            nav_idx = Some(idx);
        } else if text.contains("nav") && !text.contains('(') {
            // "NAV (USD)" is a derived column, never the raw price
            if nav_idx.is_none() {
                nav_idx = Some(idx);
            }
        } else if (text.contains("fund") || text.contains("name")) && fund_idx.is_none() {
            fund_idx = Some(idx);
        }
    }

    Ok(CsvColumnMapping {
        fund: fund_idx,
        currency: currency_idx.ok_or(NavError::MissingColumn("currency"))?,
        nav: nav_idx.ok_or(NavError::MissingColumn("NAV"))?,
        date: date_idx.ok_or(NavError::MissingColumn("NAV date"))?,
    })
}

/// Build a record from one row. A short row is kept: its missing cells read
/// as empty, so an absent NAV or date becomes `None` rather than dropping the fund.
fn parse_csv_row(
    record: &csv::StringRecord,
    mapping: &CsvColumnMapping,
    row_num: usize,
) -> Option<NavRecord> {
    if record.iter().all(|cell| cell.trim().is_empty()) {
        return None;
    }

    let cell = |idx: usize| record.get(idx).unwrap_or("");

    let fund = mapping
        .fund
        .map(|idx| cell(idx).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("row {}", row_num));

    let currency = cell(mapping.currency).trim().to_uppercase();
    if currency.is_empty() {
        warn!("Row {} ({}): no currency", row_num, fund);
    }

    let nav_str = cell(mapping.nav);
    let nav = parse_nav_value(nav_str);
    if nav.is_none() {
        warn!("Row {} ({}): NAV '{}' is not a number", row_num, fund, nav_str);
    }

    let date_str = cell(mapping.date);
    let nav_date = parse_nav_date(date_str);
    if nav_date.is_none() {
        warn!("Row {} ({}): NAV date '{}' not recognised", row_num, fund, date_str);
    }

    Some(NavRecord {
        fund,
        currency,
        nav,
        nav_date,
    })
}

/// Parse a NAV cell: "1,234.5678", "12.30 SGD", "1.5e3"; anything else is None
pub fn parse_nav_value(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().replace(',', "");

    // Drop a trailing currency code, nothing else
    let number = match cleaned.rsplit_once(char::is_whitespace) {
        Some((value, code)) if !code.is_empty() && code.chars().all(char::is_alphabetic) => {
            value.trim()
        }
        _ => cleaned.as_str(),
    };

    if number.is_empty() {
        return None;
    }

    if number.contains(['e', 'E']) {
        Decimal::from_scientific(&number.to_lowercase()).ok()
    } else {
        Decimal::from_str(number).ok()
    }
}

/// Parse a NAV date cell in any of the formats the scraper has produced
pub fn parse_nav_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    for format in ["%Y-%m-%d", "%d %b %Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::RateTable;
    use crate::reports::detect_stale;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_nav_value() {
        assert_eq!(parse_nav_value("1,234.5678"), Some(dec!(1234.5678)));
        assert_eq!(parse_nav_value(" 12.30 SGD"), Some(dec!(12.30)));
        assert_eq!(parse_nav_value("-0.5"), Some(dec!(-0.5)));
        assert_eq!(parse_nav_value("nan"), None);
        assert_eq!(parse_nav_value(""), None);
        assert_eq!(parse_nav_value("1.2.3"), None);
    }

    #[test]
    fn test_parse_nav_value_rejects_embedded_letters() {
        assert_eq!(parse_nav_value("1.5e3"), Some(dec!(1500)));
        assert_eq!(parse_nav_value("2.5E-1"), Some(dec!(0.25)));
        assert_eq!(parse_nav_value("12abc34"), None);
        assert_eq!(parse_nav_value("12.3 S G D"), None);
        assert_eq!(parse_nav_value("SGD"), None);
    }

    #[test]
    fn test_parse_nav_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 4);
        assert_eq!(parse_nav_date("2025-04-04"), expected);
        assert_eq!(parse_nav_date("04 Apr 2025"), expected);
        assert_eq!(parse_nav_date("04/04/2025"), expected);
        assert_eq!(parse_nav_date("2025-04-04 00:00:00"), expected);
        assert_eq!(parse_nav_date("yesterday"), None);
    }

    #[test]
    fn test_parses_dataframe_export_with_index_column() {
        let file = write_csv(
            ",Fund Name,Currency,NAV,NAV Date\n\
             0,Asian Equity Fund,usd,12.3456,2025-04-04\n\
             1,Japan Dynamic Fund,JPY,\"1,520.00\",2025-04-03\n\
             ,,,,\n\
             2,Global Bond Fund,SGD,,2025-04-04\n",
        );

        let records = parse_nav_csv(file.path()).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].fund, "Asian Equity Fund");
        assert_eq!(records[0].currency, "USD");
        assert_eq!(records[0].nav, Some(dec!(12.3456)));
        assert_eq!(records[0].nav_date, NaiveDate::from_ymd_opt(2025, 4, 4));

        assert_eq!(records[1].nav, Some(dec!(1520.00)));
        assert_eq!(records[1].nav_date, NaiveDate::from_ymd_opt(2025, 4, 3));

        // Missing NAV keeps the row
        assert_eq!(records[2].fund, "Global Bond Fund");
        assert_eq!(records[2].nav, None);
    }

    #[test]
    fn test_derived_usd_column_is_not_the_nav() {
        let file = write_csv(
            "Fund,NAV (USD),Currency,NAV,NAV Date\n\
             Alpha,7.40,SGD,10.00,2025-04-04\n",
        );

        let records = parse_nav_csv(file.path()).unwrap();
        assert_eq!(records[0].nav, Some(dec!(10.00)));
    }

    #[test]
    fn test_missing_fund_column_uses_row_number() {
        let file = write_csv("Currency,NAV,NAV Date\nEUR,1.5,2025-04-04\n");

        let records = parse_nav_csv(file.path()).unwrap();
        assert_eq!(records[0].fund, "row 2");
    }

    #[test]
    fn test_missing_currency_column_is_an_error() {
        let file = write_csv("Fund,NAV,NAV Date\nAlpha,1.5,2025-04-04\n");

        let err = parse_nav_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("currency"));
    }

    #[test]
    fn test_short_rows_are_kept_and_reported_stale() {
        let file = write_csv(
            "Fund,Currency,NAV,NAV Date\n\
             Alpha,EUR,1.5\n\
             Beta,GBP,2.0,2025-04-04\n",
        );

        let records = parse_nav_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fund, "Alpha");
        assert_eq!(records[0].nav, Some(dec!(1.5)));
        assert_eq!(records[0].nav_date, None);

        let as_of = NaiveDate::from_ymd_opt(2025, 4, 4).unwrap();
        let report = detect_stale(&RateTable::default().normalize(&records), as_of);
        let stale: Vec<_> = report.stale.iter().map(|r| r.record.fund.as_str()).collect();
        assert_eq!(stale, vec!["Alpha"]);
    }

    #[test]
    fn test_first_currency_column_wins() {
        let file = write_csv(
            "Fund,Currency,NAV,NAV Date,Quote Currency\n\
             Alpha,SGD,1.5,2025-04-04,USD\n",
        );

        let records = parse_nav_csv(file.path()).unwrap();
        assert_eq!(records[0].currency, "SGD");
    }
}
