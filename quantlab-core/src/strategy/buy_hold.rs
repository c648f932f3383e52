//! Buy on the first observation of the instrument, then hold.

use crate::board::DataBoard;
use crate::domain::{BarEvent, Order, OrderSide, TickEvent};
use crate::strategy::{Strategy, StrategyParams};

pub struct BuyAndHold {
    instrument: String,
    quantity: f64,
    invested: bool,
}

impl BuyAndHold {
    pub fn new(instrument: impl Into<String>, quantity: f64) -> Self {
        Self {
            instrument: instrument.into(),
            quantity,
            invested: false,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(params.instrument.clone(), params.get_or("quantity", 100.0))
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_tick(&mut self, tick: &TickEvent, _board: &DataBoard, orders: &mut Vec<Order>) {
        if self.invested || tick.instrument != self.instrument {
            return;
        }
        orders.push(Order::market(
            self.instrument.clone(),
            tick.timestamp,
            OrderSide::Buy,
            self.quantity,
        ));
        self.invested = true;
    }

    fn on_bar(&mut self, bar: &BarEvent, _board: &DataBoard, orders: &mut Vec<Order>) {
        if self.invested || bar.instrument != self.instrument {
            return;
        }
        orders.push(Order::market(
            self.instrument.clone(),
            bar.end,
            OrderSide::Buy,
            self.quantity,
        ));
        self.invested = true;
    }
}
