// Reports module - per-currency statistics and stale NAV detection

pub mod staleness;
pub mod stats;
pub mod summary;

pub use staleness::{detect_stale, resolve_as_of, StalenessReport};
pub use stats::{by_mean_desc, by_std_dev_desc, currency_stats, filter_currencies, CurrencyStats};
pub use summary::{build_nav_report, NavReport};
