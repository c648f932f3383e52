//! Data board — the engine's view of "latest known price" per instrument.
//!
//! Updated only by the dispatcher's market-event handlers, after the
//! components that need the previous snapshot (performance, ledger) have run
//! and before the event reaches the strategy. State is monotonic in time: a
//! later event may overwrite an entry, but entries are never rolled back.
//! No history beyond the latest point is retained here — history lives in
//! the performance record.

use std::collections::HashMap;

use crate::domain::{BarEvent, TickEvent};

#[derive(Debug, Clone, Default)]
pub struct DataBoard {
    last_price: HashMap<String, f64>,
    last_bar: HashMap<String, BarEvent>,
}

impl DataBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick as the instrument's latest price.
    pub fn on_tick(&mut self, tick: &TickEvent) {
        self.last_price.insert(tick.instrument.clone(), tick.price);
    }

    /// Record a bar as the instrument's latest bar; the board price becomes
    /// the adjusted close (all valuation uses adjusted prices).
    pub fn on_bar(&mut self, bar: &BarEvent) {
        self.last_price
            .insert(bar.instrument.clone(), bar.adj_close);
        self.last_bar.insert(bar.instrument.clone(), bar.clone());
    }

    /// Latest observed price, or `None` if the instrument has not appeared
    /// yet. Callers must treat `None` as "cannot mark/fill; skip".
    pub fn last_price(&self, instrument: &str) -> Option<f64> {
        self.last_price.get(instrument).copied()
    }

    /// Latest observed bar, if any.
    pub fn last_bar(&self, instrument: &str) -> Option<&BarEvent> {
        self.last_bar.get(instrument)
    }

    /// Instruments that have appeared at least once.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.last_price.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tick(instrument: &str, secs: i64, price: f64) -> TickEvent {
        TickEvent {
            instrument: instrument.into(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            price,
        }
    }

    #[test]
    fn unknown_instrument_is_none() {
        let board = DataBoard::new();
        assert_eq!(board.last_price("AAPL"), None);
        assert!(board.last_bar("AAPL").is_none());
    }

    #[test]
    fn later_tick_overwrites() {
        let mut board = DataBoard::new();
        board.on_tick(&tick("AAPL", 1, 10.0));
        board.on_tick(&tick("AAPL", 2, 12.0));
        assert_eq!(board.last_price("AAPL"), Some(12.0));
    }

    #[test]
    fn bar_price_is_adjusted_close() {
        let mut board = DataBoard::new();
        let bar = BarEvent {
            instrument: "AAPL".into(),
            start: Utc.timestamp_opt(0, 0).unwrap(),
            end: Utc.timestamp_opt(86_400, 0).unwrap(),
            open: 100.0,
            high: 106.0,
            low: 99.0,
            close: 105.0,
            adj_close: 104.5,
        };
        board.on_bar(&bar);
        assert_eq!(board.last_price("AAPL"), Some(104.5));
        assert_eq!(board.last_bar("AAPL").unwrap().close, 105.0);
    }
}
