//! Portfolio — aggregate state of cash + all open positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::position::Position;

/// The single source of truth for "what do we hold".
///
/// Created once at simulation start and mutated by every fill and mark; the
/// accounting identity must hold at every snapshot:
/// `equity == initial_cash + realized_pnl + unrealized_pnl - total_commission`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_cash: f64,
    pub positions: HashMap<String, Position>,
    pub realized_pnl: f64,
    pub total_commission: f64,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            positions: HashMap::new(),
            realized_pnl: 0.0,
            total_commission: 0.0,
        }
    }

    /// Total equity = cash + sum of position market values at their marks.
    pub fn equity(&self) -> f64 {
        let position_value: f64 = self.positions.values().map(Position::market_value).sum();
        self.cash + position_value
    }

    /// Sum of unrealized PnL across open positions.
    pub fn unrealized_pnl(&self) -> f64 {
        self.positions.values().map(Position::unrealized_pnl).sum()
    }

    /// Held quantity for an instrument, 0.0 if flat or never traded.
    pub fn quantity(&self, instrument: &str) -> f64 {
        self.positions
            .get(instrument)
            .map(|p| p.quantity)
            .unwrap_or(0.0)
    }

    pub fn has_position(&self, instrument: &str) -> bool {
        self.positions.get(instrument).is_some_and(|p| !p.is_flat())
    }
}
