//! The event union flowing through the dispatcher.
//!
//! Events are immutable once created. Within a run the dispatcher presents
//! them in non-decreasing timestamp order; at equal timestamps, market data
//! events (Tick, Bar) precede trading events (Order, Fill) so a strategy
//! never reacts to its own same-instant fill before the market state that
//! caused it is visible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fill::Fill;
use super::order::Order;

/// Point-in-time price observation for a single instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickEvent {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Interval-aggregated OHLC observation for a single instrument.
///
/// The dispatch timestamp of a bar is its `end` — decisions made on a bar
/// happen once the interval has fully elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarEvent {
    pub instrument: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
}

/// Discriminated union of everything the dispatcher routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Tick(TickEvent),
    Bar(BarEvent),
    Order(Order),
    Fill(Fill),
}

/// Event discriminant, used as the key of the dispatcher's routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Tick,
    Bar,
    Order,
    Fill,
}

impl EventKind {
    /// Dispatch precedence at equal timestamps: lower sorts first.
    /// Market data events outrank trading events.
    pub fn precedence(self) -> u8 {
        match self {
            EventKind::Tick | EventKind::Bar => 0,
            EventKind::Order => 1,
            EventKind::Fill => 2,
        }
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Tick(_) => EventKind::Tick,
            Event::Bar(_) => EventKind::Bar,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }

    /// Timestamp used for ordering. For bars this is the bar end.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Tick(t) => t.timestamp,
            Event::Bar(b) => b.end,
            Event::Order(o) => o.timestamp,
            Event::Fill(f) => f.timestamp,
        }
    }

    /// True for Tick/Bar — events produced by the feed rather than derived
    /// from handler cascades.
    pub fn is_market_data(&self) -> bool {
        matches!(self, Event::Tick(_) | Event::Bar(_))
    }

    /// Sort key for merging event streams: timestamp, then kind precedence.
    pub fn sort_key(&self) -> (DateTime<Utc>, u8) {
        (self.timestamp(), self.kind().precedence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderSide, OrderType};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn bar_dispatches_at_end() {
        let bar = BarEvent {
            instrument: "AAPL".into(),
            start: ts(0),
            end: ts(86_400),
            open: 100.0,
            high: 105.0,
            low: 99.0,
            close: 103.0,
            adj_close: 103.0,
        };
        assert_eq!(Event::Bar(bar).timestamp(), ts(86_400));
    }

    #[test]
    fn market_data_precedes_trading_at_same_timestamp() {
        let tick = Event::Tick(TickEvent {
            instrument: "AAPL".into(),
            timestamp: ts(100),
            price: 10.0,
        });
        let order = Event::Order(Order {
            instrument: "AAPL".into(),
            timestamp: ts(100),
            side: OrderSide::Buy,
            quantity: 100.0,
            order_type: OrderType::Market,
        });
        assert!(tick.sort_key() < order.sort_key());
    }

    #[test]
    fn event_serialization_roundtrip() {
        let tick = Event::Tick(TickEvent {
            instrument: "AAPL".into(),
            timestamp: ts(42),
            price: 123.45,
        });
        let json = serde_json::to_string(&tick).unwrap();
        let deser: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.kind(), EventKind::Tick);
        assert_eq!(deser.timestamp(), ts(42));
    }
}
