use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::NavError;
use crate::fx::NormalizedRecord;

/// Records split by whether their NAV was published on the as-of date
#[derive(Debug, Clone, Serialize)]
pub struct StalenessReport {
    pub as_of: NaiveDate,
    pub fresh: Vec<NormalizedRecord>,
    pub stale: Vec<NormalizedRecord>,
}

impl StalenessReport {
    pub fn total(&self) -> usize {
        self.fresh.len() + self.stale.len()
    }

    pub fn has_stale(&self) -> bool {
        !self.stale.is_empty()
    }
}

/// Partition records on `nav_date == as_of`.
///
/// A record without a readable NAV date can't be shown to be current, so it
/// lands in `stale`. Input order is kept in both partitions.
pub fn detect_stale(records: &[NormalizedRecord], as_of: NaiveDate) -> StalenessReport {
    let (fresh, stale): (Vec<_>, Vec<_>) = records
        .iter()
        .cloned()
        .partition(|r| r.record.nav_date == Some(as_of));

    info!(
        "{} of {} funds not updated on {}",
        stale.len(),
        records.len(),
        as_of
    );

    StalenessReport {
        as_of,
        fresh,
        stale,
    }
}

/// Pick the as-of date: command line, then config, then the newest NAV date
pub fn resolve_as_of(
    explicit: Option<NaiveDate>,
    configured: Option<NaiveDate>,
    records: &[NormalizedRecord],
) -> Result<NaiveDate> {
    if let Some(date) = explicit.or(configured) {
        return Ok(date);
    }

    let latest = records
        .iter()
        .filter_map(|r| r.record.nav_date)
        .max()
        .ok_or(NavError::NoAsOfDate)?;

    debug!("No as-of date given, using latest NAV date {}", latest);
    Ok(latest)
}
