use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// Execution record produced by the simulated brokerage in response to an
/// order. Carries the originating order's timestamp: the Order → Fill cascade
/// settles within the same simulated instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    pub quantity: f64,
    pub fill_price: f64,
    pub commission: f64,
}

impl Fill {
    /// Signed quantity: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> f64 {
        self.side.sign() * self.quantity
    }
}
