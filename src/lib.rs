//! Navwatch - fund NAV report with stale NAV alerts
//!
//! This library reads scraped fund NAV records, normalizes them to a base
//! currency, computes per-currency statistics, detects funds that missed
//! the as-of date and posts the stale list to a chat webhook.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fx;
pub mod importers;
pub mod notify;
pub mod reports;
