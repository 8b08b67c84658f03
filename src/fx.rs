//! Currency normalization
//!
//! Converts each NAV into a single base currency using a fixed rate table.
//! The rates are approximations, not live quotes: a code missing from the
//! table converts at the fallback rate instead of failing the run.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::importers::NavRecord;

/// Approximate rates to USD as of April 2025, as (code, mantissa, scale)
const APRIL_2025_USD_RATES: [(&str, i64, u32); 9] = [
    ("USD", 100, 2),
    ("SGD", 74, 2),
    ("EUR", 108, 2),
    ("JPY", 66, 4),
    ("GBP", 125, 2),
    ("AUD", 66, 2),
    ("CNH", 14, 2),
    ("HKD", 13, 2),
    ("NZD", 60, 2),
];

/// Fixed conversion rates into a base currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateTable {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
    pub fallback: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        let rates = APRIL_2025_USD_RATES
            .iter()
            .map(|(code, mantissa, scale)| (code.to_string(), Decimal::new(*mantissa, *scale)))
            .collect();

        Self {
            base: "USD".to_string(),
            rates,
            fallback: Decimal::ONE,
        }
    }
}

impl RateTable {
    /// Build a table from explicit rates; codes are upper-cased
    pub fn new(base: &str, rates: BTreeMap<String, Decimal>, fallback: Decimal) -> Self {
        Self {
            base: base.trim().to_uppercase(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.trim().to_uppercase(), rate))
                .collect(),
            fallback,
        }
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.rates.contains_key(&code.trim().to_uppercase())
    }

    /// Rate for one unit of `code` in the base currency
    pub fn rate_for(&self, code: &str) -> Decimal {
        self.rates
            .get(&code.trim().to_uppercase())
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Convert a NAV into the base currency
    pub fn convert(&self, nav: Decimal, code: &str) -> Decimal {
        nav * self.rate_for(code)
    }

    /// Attach the base-currency NAV to every record, preserving order
    pub fn normalize(&self, records: &[NavRecord]) -> Vec<NormalizedRecord> {
        let mut unknown = BTreeSet::new();

        let normalized = records
            .iter()
            .map(|record| {
                if !self.is_known(&record.currency) && unknown.insert(record.currency.clone()) {
                    warn!(
                        "No {} rate for currency '{}', using fallback {}",
                        self.base, record.currency, self.fallback
                    );
                }

                let rate = self.rate_for(&record.currency);
                NormalizedRecord {
                    record: record.clone(),
                    rate,
                    nav_base: record.nav.map(|nav| self.convert(nav, &record.currency)),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Normalized {} records to {} ({} unknown currencies)",
            normalized.len(),
            self.base,
            unknown.len()
        );
        normalized
    }
}

/// A NAV record with its value in the base currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub record: NavRecord,
    pub rate: Decimal,
    pub nav_base: Option<Decimal>,
}
