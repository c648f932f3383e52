//! Market data feed — the lazy, time-ordered event source the engine pulls
//! from. The dispatcher never calls back into the feed except to pull the
//! next item; feed exhaustion is the run's sole termination condition.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{BarEvent, Event};

/// Source of Tick/Bar events ordered by timestamp ascending.
/// Finite and non-restartable.
pub trait MarketDataFeed {
    /// Declare the instrument universe before the run starts.
    fn subscribe(&mut self, instruments: &[String]);

    /// Pull the next market event, or `None` when exhausted.
    fn next_event(&mut self) -> Option<Event>;
}

/// In-memory feed over a pre-sorted event vector. The workhorse for tests
/// and for CSV-loaded histories.
#[derive(Debug, Default)]
pub struct VecFeed {
    events: std::collections::VecDeque<Event>,
    subscribed: Vec<String>,
}

impl VecFeed {
    /// Build from events already sorted by `(timestamp, kind precedence)`.
    /// Debug builds assert the ordering.
    pub fn new(events: Vec<Event>) -> Self {
        debug_assert!(
            events.windows(2).all(|w| w[0].sort_key() <= w[1].sort_key()),
            "VecFeed events must be pre-sorted"
        );
        Self {
            events: events.into(),
            subscribed: Vec::new(),
        }
    }

    pub fn subscribed(&self) -> &[String] {
        &self.subscribed
    }
}

impl MarketDataFeed for VecFeed {
    fn subscribe(&mut self, instruments: &[String]) {
        self.subscribed.extend_from_slice(instruments);
    }

    fn next_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }
}

/// Seeded geometric random walk emitting one daily bar per subscribed
/// instrument. Deterministic for a given seed; used by benches and the
/// `synthetic` datasource.
pub struct RandomWalkFeed {
    rng: StdRng,
    instruments: Vec<String>,
    prices: Vec<f64>,
    start_price: f64,
    current_day: DateTime<Utc>,
    days_remaining: usize,
    cursor: usize,
    daily_vol: f64,
}

impl RandomWalkFeed {
    pub fn new(seed: u64, days: usize, start_price: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            instruments: Vec::new(),
            prices: Vec::new(),
            start_price,
            current_day: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            days_remaining: days,
            cursor: 0,
            daily_vol: 0.01,
        }
    }

    pub fn with_volatility(mut self, daily_vol: f64) -> Self {
        self.daily_vol = daily_vol;
        self
    }
}

impl MarketDataFeed for RandomWalkFeed {
    fn subscribe(&mut self, instruments: &[String]) {
        for instrument in instruments {
            self.instruments.push(instrument.clone());
            self.prices.push(self.start_price);
        }
    }

    fn next_event(&mut self) -> Option<Event> {
        if self.days_remaining == 0 || self.instruments.is_empty() {
            return None;
        }

        let i = self.cursor;
        let open = self.prices[i];
        let drift: f64 = self.rng.gen_range(-self.daily_vol..=self.daily_vol);
        let close = (open * (1.0 + drift)).max(0.01);
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..self.daily_vol));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..self.daily_vol));
        self.prices[i] = close;

        let start = self.current_day;
        let end = start + Duration::days(1);
        let bar = BarEvent {
            instrument: self.instruments[i].clone(),
            start,
            end,
            open,
            high,
            low,
            close,
            adj_close: close,
        };

        self.cursor += 1;
        if self.cursor == self.instruments.len() {
            self.cursor = 0;
            self.current_day = end;
            self.days_remaining -= 1;
        }

        Some(Event::Bar(bar))
    }
}
