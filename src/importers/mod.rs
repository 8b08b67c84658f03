// Import module - scraped NAV CSV parser

pub mod nav_csv;

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

use crate::error::NavError;

pub use nav_csv::NavRecord;

/// Import NAV records from a file (dispatches on extension)
pub fn import_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<NavRecord>> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension: {}", path.display()))?
        .to_lowercase();

    info!("Importing NAV file: {:?} (type: {})", path, extension);

    match extension.as_str() {
        "csv" | "txt" => nav_csv::parse_nav_csv(path),
        _ => Err(NavError::UnsupportedFormat(extension).into()),
    }
}
