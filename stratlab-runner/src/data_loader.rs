//! CSV bar loading for the runner.
//!
//! The core never does I/O: the runner parses a CSV export into `Bar`s,
//! checks the series is strictly ascending with no duplicate timestamps,
//! and hands the finished slice to the simulator. Expected header:
//! `timestamp,open,high,low,close,volume` with RFC 3339 timestamps.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use stratlab_core::domain::Bar;

/// Errors from the bar loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read bar file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("bar file contains no rows")]
    Empty,

    #[error("non-finite price in row {row}")]
    BadPrice { row: usize },

    #[error("timestamps not strictly ascending at row {row} ({current} after {previous})")]
    NotAscending {
        row: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load a bar series from a CSV file.
pub fn load_bars(path: impl AsRef<Path>) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path)?;
    read_bars(file)
}

/// Parse a bar series from any CSV reader. Duplicate timestamps count as
/// not ascending; out-of-order data is rejected rather than silently
/// re-sorted, since it usually means a corrupted export.
pub fn read_bars(reader: impl Read) -> Result<Vec<Bar>, LoadError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut bars: Vec<Bar> = Vec::new();

    for (i, row) in csv_reader.deserialize::<BarRow>().enumerate() {
        let row = row?;
        let prices = [row.open, row.high, row.low, row.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(LoadError::BadPrice { row: i });
        }
        if let Some(prev) = bars.last() {
            if row.timestamp <= prev.timestamp {
                return Err(LoadError::NotAscending {
                    row: i,
                    previous: prev.timestamp,
                    current: row.timestamp,
                });
            }
        }
        bars.push(Bar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(bars)
}
