use serde::{Deserialize, Serialize};

/// Per-instrument holding. Owned exclusively by the portfolio ledger and
/// mutated only through `PortfolioLedger::on_fill` / `mark_to_market`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub instrument: String,
    /// Signed: positive long, negative short.
    pub quantity: f64,
    /// Volume-weighted average entry cost.
    pub avg_cost: f64,
    /// Latest mark-to-market price. Seeded with the opening fill price so
    /// equity is defined before the first mark after the fill arrives.
    pub last_mark: f64,
}

impl Position {
    pub fn new(instrument: impl Into<String>, quantity: f64, avg_cost: f64) -> Self {
        Self {
            instrument: instrument.into(),
            quantity,
            avg_cost,
            last_mark: avg_cost,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    /// Market value at the latest mark.
    pub fn market_value(&self) -> f64 {
        self.quantity * self.last_mark
    }

    /// Unrealized PnL against the latest mark.
    pub fn unrealized_pnl(&self) -> f64 {
        self.quantity * (self.last_mark - self.avg_cost)
    }
}
