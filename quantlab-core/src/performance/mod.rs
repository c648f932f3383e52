//! Performance accumulator — an append-only time series of portfolio
//! valuations plus trade-level statistics, finalized into an immutable
//! record with derived metrics.
//!
//! The snapshot protocol is deliberately deferred: the row for timestamp T
//! is appended only when the first event of a *later* timestamp arrives, and
//! is valued off the board/ledger state at that moment — which still
//! predates the new event's mark. A row therefore never sees information
//! from its own timestamp, which is what keeps look-ahead bias out of the
//! historical series. The last timestamp of a run has no later event, so
//! `update_final_performance` forces its snapshot explicitly.

pub mod stats;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::DataBoard;
use crate::domain::{Fill, Portfolio};

/// One valuation snapshot. Holdings are per-instrument market values over
/// the subscribed universe (0.0 when flat).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub cash: f64,
    pub holdings: BTreeMap<String, f64>,
}

/// One executed trade, recorded independently of valuation timing.
/// Quantity is signed: positive buys, negative sells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub instrument: String,
    pub quantity: f64,
    pub price: f64,
    pub commission: f64,
}

/// Derived statistics, computed once at finalize time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub cumulative_return: f64,
    pub annualized_volatility: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub turnover: f64,
    pub total_commission: f64,
    pub final_equity: f64,
}

/// The finalized, immutable output of a run. Any reporting sink can consume
/// this without reaching back into engine internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub rows: Vec<PerformanceRow>,
    pub trades: Vec<TradeLogEntry>,
    pub summary: PerformanceSummary,
}

impl PerformanceRecord {
    pub fn equity_curve(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.equity).collect()
    }
}

/// Accumulates rows and trades during a run.
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    universe: Vec<String>,
    rows: Vec<PerformanceRow>,
    trades: Vec<TradeLogEntry>,
    pending: Option<DateTime<Utc>>,
}

impl PerformanceTracker {
    pub fn new(universe: Vec<String>) -> Self {
        Self {
            universe,
            rows: Vec::new(),
            trades: Vec::new(),
            pending: None,
        }
    }

    /// Called on every market event, strictly before the ledger's
    /// mark-to-market for that event. Appends the row for the previous
    /// timestamp when a new one arrives; repeated calls within the same
    /// timestamp are no-ops.
    pub fn update_performance(
        &mut self,
        now: DateTime<Utc>,
        portfolio: &Portfolio,
        board: &DataBoard,
    ) {
        match self.pending {
            None => self.pending = Some(now),
            Some(pending) if now != pending => {
                let row = self.snapshot(pending, portfolio, board);
                self.rows.push(row);
                self.pending = Some(now);
            }
            Some(_) => {}
        }
    }

    /// Trade-level accounting, independent of valuation timing.
    pub fn on_fill(&mut self, fill: &Fill) {
        self.trades.push(TradeLogEntry {
            timestamp: fill.timestamp,
            instrument: fill.instrument.clone(),
            quantity: fill.signed_quantity(),
            price: fill.fill_price,
            commission: fill.commission,
        });
    }

    /// Force the snapshot for the final timestamp, using the final mark.
    pub fn update_final_performance(
        &mut self,
        now: DateTime<Utc>,
        portfolio: &Portfolio,
        board: &DataBoard,
    ) {
        let row = self.snapshot(now, portfolio, board);
        self.rows.push(row);
        self.pending = None;
    }

    /// Rows accumulated so far (inspectable mid-run and after aborts).
    pub fn rows(&self) -> &[PerformanceRow] {
        &self.rows
    }

    pub fn trades(&self) -> &[TradeLogEntry] {
        &self.trades
    }

    /// Consume the tracker into the immutable record, computing the derived
    /// statistics exactly once.
    pub fn finalize(self) -> PerformanceRecord {
        let equity: Vec<f64> = self.rows.iter().map(|r| r.equity).collect();
        let returns = stats::returns(&equity);
        let total_commission: f64 = self.trades.iter().map(|t| t.commission).sum();
        let notional: f64 = self.trades.iter().map(|t| t.quantity.abs() * t.price).sum();
        let base_equity = equity.first().copied().unwrap_or(0.0);
        let turnover = if base_equity > 0.0 {
            notional / base_equity
        } else {
            0.0
        };

        let summary = PerformanceSummary {
            cumulative_return: stats::cumulative_return(&equity),
            annualized_volatility: stats::annualized_volatility(&returns),
            sharpe: stats::sharpe_ratio(&equity, 0.0),
            max_drawdown: stats::max_drawdown(&equity),
            trade_count: self.trades.len(),
            turnover,
            total_commission,
            final_equity: equity.last().copied().unwrap_or(0.0),
        };

        PerformanceRecord {
            rows: self.rows,
            trades: self.trades,
            summary,
        }
    }

    /// Value the portfolio off the board's latest prices. An instrument the
    /// board has never seen is valued at the position's own mark — it cannot
    /// be marked, so the last known basis carries forward.
    fn snapshot(
        &self,
        timestamp: DateTime<Utc>,
        portfolio: &Portfolio,
        board: &DataBoard,
    ) -> PerformanceRow {
        let mut holdings: BTreeMap<String, f64> = self
            .universe
            .iter()
            .map(|instrument| (instrument.clone(), 0.0))
            .collect();

        let mut position_value = 0.0;
        for (instrument, pos) in &portfolio.positions {
            let price = board.last_price(instrument).unwrap_or(pos.last_mark);
            let value = pos.quantity * price;
            position_value += value;
            holdings.insert(instrument.clone(), value);
        }

        PerformanceRow {
            timestamp,
            equity: portfolio.cash + position_value,
            cash: portfolio.cash,
            holdings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderSide, Position, TickEvent};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn tracker() -> PerformanceTracker {
        PerformanceTracker::new(vec!["AAPL".to_string()])
    }

    #[test]
    fn first_update_emits_no_row() {
        let mut t = tracker();
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        t.update_performance(ts(1), &portfolio, &board);
        assert!(t.rows().is_empty());
    }

    #[test]
    fn new_timestamp_snapshots_previous() {
        let mut t = tracker();
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        t.update_performance(ts(1), &portfolio, &board);
        t.update_performance(ts(2), &portfolio, &board);
        assert_eq!(t.rows().len(), 1);
        assert_eq!(t.rows()[0].timestamp, ts(1));
        assert_eq!(t.rows()[0].equity, 100_000.0);
    }

    #[test]
    fn repeated_timestamp_is_noop() {
        let mut t = tracker();
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        t.update_performance(ts(1), &portfolio, &board);
        t.update_performance(ts(1), &portfolio, &board);
        assert!(t.rows().is_empty());
    }

    #[test]
    fn final_update_forces_last_row() {
        let mut t = tracker();
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        t.update_performance(ts(1), &portfolio, &board);
        t.update_final_performance(ts(1), &portfolio, &board);
        assert_eq!(t.rows().len(), 1);
        assert_eq!(t.rows()[0].timestamp, ts(1));
    }

    #[test]
    fn snapshot_values_positions_at_board_price() {
        let mut t = tracker();
        let mut portfolio = Portfolio::new(99_000.0);
        portfolio
            .positions
            .insert("AAPL".into(), Position::new("AAPL", 100.0, 10.0));
        let mut board = DataBoard::new();
        board.on_tick(&TickEvent {
            instrument: "AAPL".into(),
            timestamp: ts(1),
            price: 11.0,
        });

        t.update_performance(ts(1), &portfolio, &board);
        t.update_performance(ts(2), &portfolio, &board);
        let row = &t.rows()[0];
        assert_eq!(row.equity, 99_000.0 + 1_100.0);
        assert_eq!(row.cash, 99_000.0);
        assert_eq!(row.holdings["AAPL"], 1_100.0);
    }

    #[test]
    fn holdings_cover_universe_with_zero_for_flat() {
        let mut t = PerformanceTracker::new(vec!["AAPL".into(), "MSFT".into()]);
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        t.update_performance(ts(1), &portfolio, &board);
        t.update_final_performance(ts(1), &portfolio, &board);
        let row = &t.rows()[0];
        assert_eq!(row.holdings.len(), 2);
        assert_eq!(row.holdings["MSFT"], 0.0);
    }

    #[test]
    fn finalize_computes_summary() {
        let mut t = tracker();
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        t.update_performance(ts(1), &portfolio, &board);
        t.update_performance(ts(2), &portfolio, &board);
        t.on_fill(&Fill {
            instrument: "AAPL".into(),
            timestamp: ts(2),
            side: OrderSide::Buy,
            quantity: 10.0,
            fill_price: 100.0,
            commission: 1.0,
        });
        t.update_final_performance(ts(2), &portfolio, &board);

        let record = t.finalize();
        assert_eq!(record.rows.len(), 2);
        assert_eq!(record.summary.trade_count, 1);
        assert_eq!(record.summary.total_commission, 1.0);
        // 1000 notional / 100k base
        assert!((record.summary.turnover - 0.01).abs() < 1e-12);
        assert_eq!(record.summary.final_equity, 100_000.0);
    }

    #[test]
    fn rows_are_non_decreasing_in_time() {
        let mut t = tracker();
        let portfolio = Portfolio::new(100_000.0);
        let board = DataBoard::new();
        for secs in [1, 2, 2, 3, 5, 5, 8] {
            t.update_performance(ts(secs), &portfolio, &board);
        }
        t.update_final_performance(ts(8), &portfolio, &board);
        let times: Vec<_> = t.rows().iter().map(|r| r.timestamp).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
}
