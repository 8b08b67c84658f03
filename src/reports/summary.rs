use chrono::NaiveDate;
use serde::Serialize;

use super::staleness::{detect_stale, StalenessReport};
use super::stats::{by_mean_desc, by_std_dev_desc, currency_stats, filter_currencies, CurrencyStats};
use crate::fx::NormalizedRecord;

/// Every section of the NAV report, in display order
#[derive(Debug, Clone, Serialize)]
pub struct NavReport {
    pub base_currency: String,
    pub currencies: Vec<String>,
    pub overview: Vec<NormalizedRecord>,
    pub average: Vec<CurrencyStats>,
    pub volatility: Vec<CurrencyStats>,
    pub staleness: StalenessReport,
}

/// Build the full report.
///
/// The currency selection narrows the overview and both statistics sections;
/// the stale check always covers every fund.
pub fn build_nav_report(
    records: &[NormalizedRecord],
    base_currency: &str,
    selected: &[String],
    as_of: NaiveDate,
) -> NavReport {
    let overview = filter_currencies(records, selected);
    let stats = currency_stats(&overview);

    NavReport {
        base_currency: base_currency.to_string(),
        currencies: super::stats::currencies(&overview),
        average: by_mean_desc(&stats),
        volatility: by_std_dev_desc(&stats),
        staleness: detect_stale(records, as_of),
        overview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::RateTable;
    use crate::importers::NavRecord;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_filter_does_not_hide_stale_funds() {
        let as_of = NaiveDate::from_ymd_opt(2025, 4, 4).unwrap();
        let records = vec![
            NavRecord {
                fund: "Fresh USD".to_string(),
                currency: "USD".to_string(),
                nav: Some(dec!(10)),
                nav_date: Some(as_of),
            },
            NavRecord {
                fund: "Stale JPY".to_string(),
                currency: "JPY".to_string(),
                nav: Some(dec!(1000)),
                nav_date: as_of.pred_opt(),
            },
        ];
        let normalized = RateTable::default().normalize(&records);

        let report = build_nav_report(&normalized, "USD", &["USD".to_string()], as_of);

        assert_eq!(report.overview.len(), 1);
        assert_eq!(report.currencies, vec!["USD"]);
        assert_eq!(report.average.len(), 1);
        assert_eq!(report.staleness.stale.len(), 1);
        assert_eq!(report.staleness.stale[0].record.fund, "Stale JPY");
        assert_eq!(report.staleness.stale[0].nav_base, Some(dec!(6.6)));
    }
}
