//! Time-partitioned output folder resolution
//!
//! Executed notebooks are filed under `root/YYYY[/MM[/DD[/HH]]]`,
//! truncated at the configured partition granularity.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;

/// Time resolution at which output folders are nested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionGranularity {
    Year,
    Month,
    Day,
    Hour,
}

impl PartitionGranularity {
    /// Parse a single-letter granularity code, case-insensitively
    ///
    /// Returns `None` for unrecognized codes; callers treat that as full
    /// year/month/day/hour nesting.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "y" => Some(PartitionGranularity::Year),
            "m" => Some(PartitionGranularity::Month),
            "d" => Some(PartitionGranularity::Day),
            "h" => Some(PartitionGranularity::Hour),
            _ => None,
        }
    }
}

/// Build the partitioned folder path without touching the filesystem
pub fn partitioned_dir(
    root: &Path,
    start_time: DateTime<Utc>,
    granularity: Option<PartitionGranularity>,
) -> PathBuf {
    let mut path = root.join(start_time.format("%Y").to_string());
    if granularity == Some(PartitionGranularity::Year) {
        return path;
    }
    path.push(start_time.format("%m").to_string());
    if granularity == Some(PartitionGranularity::Month) {
        return path;
    }
    path.push(start_time.format("%d").to_string());
    if granularity == Some(PartitionGranularity::Day) {
        return path;
    }
    // Hour, or an unrecognized code falling through to full nesting.
    path.push(start_time.format("%H").to_string());
    path
}

/// Resolve the output folder for a job start time, creating missing levels
pub async fn resolve(
    root: &Path,
    start_time: DateTime<Utc>,
    granularity: Option<PartitionGranularity>,
) -> io::Result<PathBuf> {
    let dir = partitioned_dir(root, start_time, granularity);
    fs::create_dir_all(&dir).await?;
    Ok(dir)
}
