//! Bar loading for the runner.
//!
//! Reads one daily CSV per symbol from a history directory and merges all
//! instruments into a single event stream ordered by `(timestamp, kind
//! precedence)`, ready to drive the engine through a `VecFeed`.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use csv::ReaderBuilder;
use quantlab_core::domain::{BarEvent, Event};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no bar file for '{symbol}' at {path}")]
    MissingFile { symbol: String, path: PathBuf },

    #[error("failed to read '{path}': {source}")]
    BadRow { path: PathBuf, source: csv::Error },
}

/// One CSV row: `date,open,high,low,close,adj_close,volume`.
#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adj_close: f64,
    #[allow(dead_code)]
    volume: u64,
}

/// Load daily bars for `symbols` from `<hist_dir>/<SYMBOL>.csv`, filtered to
/// the inclusive date range, merged into one time-ordered event stream.
pub fn load_events(
    hist_dir: &Path,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Event>, LoadError> {
    let mut events = Vec::new();
    for symbol in symbols {
        let path = hist_dir.join(format!("{symbol}.csv"));
        if !path.exists() {
            return Err(LoadError::MissingFile {
                symbol: symbol.clone(),
                path,
            });
        }
        let count = load_symbol(&path, symbol, start, end, &mut events)?;
        info!(symbol = %symbol, bars = count, "loaded history");
    }
    events.sort_by_key(|event| event.sort_key());
    Ok(events)
}

fn load_symbol(
    path: &Path,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    events: &mut Vec<Event>,
) -> Result<usize, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| LoadError::BadRow {
            path: path.to_path_buf(),
            source,
        })?;

    let mut count = 0;
    for row in reader.deserialize() {
        let row: CsvBar = row.map_err(|source| LoadError::BadRow {
            path: path.to_path_buf(),
            source,
        })?;
        if row.date < start || row.date > end {
            continue;
        }
        let bar_start = Utc.from_utc_datetime(&row.date.and_hms_opt(0, 0, 0).unwrap_or_default());
        events.push(Event::Bar(BarEvent {
            instrument: symbol.to_string(),
            start: bar_start,
            end: bar_start + Duration::days(1),
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
        }));
        count += 1;
    }
    Ok(count)
}
