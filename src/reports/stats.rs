use itertools::Itertools;
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;
use std::cmp::Ordering;

use crate::fx::NormalizedRecord;

/// Per-currency aggregate of base-currency NAVs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyStats {
    pub currency: String,
    /// Funds quoted in this currency, priced or not
    pub funds: usize,
    /// Funds with a NAV, the sample size for mean and std_dev
    pub priced: usize,
    pub mean: Option<Decimal>,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: Option<Decimal>,
}

/// Keep only records in the selected currencies; an empty selection keeps all
pub fn filter_currencies(records: &[NormalizedRecord], selected: &[String]) -> Vec<NormalizedRecord> {
    if selected.is_empty() {
        return records.to_vec();
    }

    let wanted: Vec<String> = selected.iter().map(|c| c.trim().to_uppercase()).collect();
    records
        .iter()
        .filter(|r| wanted.contains(&r.record.currency))
        .cloned()
        .collect()
}

/// Currencies in first-seen order, like a dataframe's `unique()`
pub fn currencies(records: &[NormalizedRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.record.currency.clone())
        .unique()
        .collect()
}

/// Group by currency and compute mean and sample standard deviation
pub fn currency_stats(records: &[NormalizedRecord]) -> Vec<CurrencyStats> {
    records
        .iter()
        .into_group_map_by(|r| r.record.currency.clone())
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(currency, group)| {
            let values: Vec<Decimal> = group.iter().filter_map(|r| r.nav_base).collect();
            let mean = mean(&values);
            let std_dev = mean.and_then(|m| sample_std_dev(&values, m));

            CurrencyStats {
                currency,
                funds: group.len(),
                priced: values.len(),
                mean,
                std_dev,
            }
        })
        .collect()
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

fn sample_std_dev(values: &[Decimal], mean: Decimal) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let squared: Decimal = values.iter().map(|v| (*v - mean) * (*v - mean)).sum();
    let variance = squared / Decimal::from(values.len() - 1);
    variance.sqrt()
}

/// Descending by average NAV, currencies without one last
pub fn by_mean_desc(stats: &[CurrencyStats]) -> Vec<CurrencyStats> {
    stats
        .iter()
        .cloned()
        .sorted_by(|a, b| desc_none_last(a.mean, b.mean).then_with(|| a.currency.cmp(&b.currency)))
        .collect()
}

/// Descending by volatility, currencies without one last
pub fn by_std_dev_desc(stats: &[CurrencyStats]) -> Vec<CurrencyStats> {
    stats
        .iter()
        .cloned()
        .sorted_by(|a, b| {
            desc_none_last(a.std_dev, b.std_dev).then_with(|| a.currency.cmp(&b.currency))
        })
        .collect()
}

fn desc_none_last(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
