//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side of an order or fill. Quantities are positive; side carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// What kind of order and its price parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill at the current data board price.
    Market,
    /// Fill only if the limit price is marketable against the board price;
    /// otherwise the order is dropped (no resting book).
    Limit { limit_price: f64 },
}

/// A trading instruction emitted by a strategy. An order is a request;
/// the brokerage's `Fill` is the response, and not every order yields one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    pub quantity: f64,
    pub order_type: OrderType,
}

impl Order {
    /// Market order helper, the common case for strategies.
    pub fn market(
        instrument: impl Into<String>,
        timestamp: DateTime<Utc>,
        side: OrderSide,
        quantity: f64,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            side,
            quantity,
            order_type: OrderType::Market,
        }
    }

    /// Signed quantity: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> f64 {
        self.side.sign() * self.quantity
    }
}
