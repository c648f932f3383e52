//! Moving-average crossover: market buy on golden cross (short SMA over
//! long SMA), market sell on death cross, with an invested latch so each
//! cross trades at most once.

use std::collections::VecDeque;

use tracing::info;

use crate::board::DataBoard;
use crate::domain::{BarEvent, Order, OrderSide, TickEvent};
use crate::strategy::{Strategy, StrategyParams};

pub struct MovingAverageCross {
    instrument: String,
    short_window: usize,
    long_window: usize,
    quantity: f64,
    closes: VecDeque<f64>,
    invested: bool,
}

impl MovingAverageCross {
    pub fn new(
        instrument: impl Into<String>,
        short_window: usize,
        long_window: usize,
        quantity: f64,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            short_window,
            long_window,
            quantity,
            closes: VecDeque::new(),
            invested: false,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(
            params.instrument.clone(),
            (params.get_or("short_window", 100.0).max(1.0)) as usize,
            (params.get_or("long_window", 400.0).max(1.0)) as usize,
            params.get_or("quantity", 100.0),
        )
    }

    /// Warm-up length: the buffer must cover the larger window even if the
    /// windows are configured inverted.
    fn warmup(&self) -> usize {
        self.long_window.max(self.short_window)
    }

    fn sma(&self, window: usize) -> f64 {
        let len = self.closes.len();
        self.closes.iter().skip(len - window).sum::<f64>() / window as f64
    }

    fn on_price(&mut self, price: f64, orders: &mut Vec<Order>, make: impl Fn(OrderSide, f64) -> Order) {
        let warmup = self.warmup();
        self.closes.push_back(price);
        if self.closes.len() > warmup {
            self.closes.pop_front();
        }
        if self.closes.len() < warmup {
            return;
        }

        let short_sma = self.sma(self.short_window);
        let long_sma = self.sma(self.long_window);

        if short_sma > long_sma && !self.invested {
            info!(instrument = %self.instrument, short_sma, long_sma, "golden cross: entering long");
            orders.push(make(OrderSide::Buy, self.quantity));
            self.invested = true;
        } else if short_sma < long_sma && self.invested {
            info!(instrument = %self.instrument, short_sma, long_sma, "death cross: exiting");
            orders.push(make(OrderSide::Sell, self.quantity));
            self.invested = false;
        }
    }
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn on_tick(&mut self, tick: &TickEvent, _board: &DataBoard, orders: &mut Vec<Order>) {
        if tick.instrument != self.instrument {
            return;
        }
        let instrument = self.instrument.clone();
        let timestamp = tick.timestamp;
        self.on_price(tick.price, orders, move |side, qty| {
            Order::market(instrument.clone(), timestamp, side, qty)
        });
    }

    fn on_bar(&mut self, bar: &BarEvent, _board: &DataBoard, orders: &mut Vec<Order>) {
        if bar.instrument != self.instrument {
            return;
        }
        let instrument = self.instrument.clone();
        let timestamp = bar.end;
        self.on_price(bar.adj_close, orders, move |side, qty| {
            Order::market(instrument.clone(), timestamp, side, qty)
        });
    }
}
