//! Artifact export — CSV and JSON files for a finished run.
//!
//! `save_results` writes four files into the target directory:
//! - `equity.csv` — timestamp, equity, cash
//! - `positions.csv` — timestamp plus one market-value column per instrument
//! - `trades.csv` — the trade tape
//! - `summary.json` — the full `BacktestReport`

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::runner::BacktestReport;

pub fn save_results(dir: &Path, report: &BacktestReport) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    fs::write(dir.join("equity.csv"), equity_csv(report)?)
        .context("failed to write equity.csv")?;
    fs::write(dir.join("positions.csv"), positions_csv(report)?)
        .context("failed to write positions.csv")?;
    fs::write(dir.join("trades.csv"), trades_csv(report)?)
        .context("failed to write trades.csv")?;

    let json = serde_json::to_string_pretty(report)
        .context("failed to serialize report to JSON")?;
    fs::write(dir.join("summary.json"), json).context("failed to write summary.json")?;

    Ok(())
}

pub fn equity_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity", "cash"])?;
    for row in &report.record.rows {
        wtr.write_record([
            &row.timestamp.to_rfc3339(),
            &format!("{:.2}", row.equity),
            &format!("{:.2}", row.cash),
        ])?;
    }
    finish(wtr)
}

pub fn positions_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // Holdings are keyed identically on every row; use the first row's
    // (sorted) keys as the column set.
    let columns: Vec<String> = report
        .record
        .rows
        .first()
        .map(|row| row.holdings.keys().cloned().collect())
        .unwrap_or_default();

    let mut header = vec!["timestamp".to_string()];
    header.extend(columns.iter().cloned());
    wtr.write_record(&header)?;

    for row in &report.record.rows {
        let mut record = vec![row.timestamp.to_rfc3339()];
        for column in &columns {
            let value = row.holdings.get(column).copied().unwrap_or(0.0);
            record.push(format!("{value:.2}"));
        }
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

pub fn trades_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "instrument", "quantity", "price", "commission"])?;
    for trade in &report.record.trades {
        wtr.write_record([
            &trade.timestamp.to_rfc3339(),
            &trade.instrument,
            &format!("{:.4}", trade.quantity),
            &format!("{:.6}", trade.price),
            &format!("{:.4}", trade.commission),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
