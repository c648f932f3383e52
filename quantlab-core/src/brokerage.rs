//! Simulated brokerage — turns orders into fills against the data board.
//!
//! The brokerage is stateless across calls except for its commission model:
//! it holds no order book and produces at most one fill per order, for the
//! full requested quantity.

use tracing::debug;

use crate::board::DataBoard;
use crate::domain::{Fill, Order, OrderSide, OrderType};

/// Pluggable fee function applied to every fill.
pub trait CommissionModel: Send + Sync {
    fn commission(&self, fill_price: f64, quantity: f64) -> f64;
}

/// No commission (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCommission;

impl CommissionModel for NoCommission {
    fn commission(&self, _fill_price: f64, _quantity: f64) -> f64 {
        0.0
    }
}

/// Fixed amount per share.
#[derive(Debug, Clone, Copy)]
pub struct PerShareCommission {
    pub per_share: f64,
}

impl CommissionModel for PerShareCommission {
    fn commission(&self, _fill_price: f64, quantity: f64) -> f64 {
        self.per_share * quantity.abs()
    }
}

/// Basis points of traded notional (1 bp = 0.01%).
#[derive(Debug, Clone, Copy)]
pub struct BpsCommission {
    pub bps: f64,
}

impl CommissionModel for BpsCommission {
    fn commission(&self, fill_price: f64, quantity: f64) -> f64 {
        (fill_price * quantity.abs()) * self.bps / 10_000.0
    }
}

/// The simulated brokerage.
pub struct SimBrokerage {
    commission: Box<dyn CommissionModel>,
}

impl Default for SimBrokerage {
    fn default() -> Self {
        Self::new(Box::new(NoCommission))
    }
}

impl SimBrokerage {
    pub fn new(commission: Box<dyn CommissionModel>) -> Self {
        Self { commission }
    }

    /// Match an order against the current board state.
    ///
    /// Market orders fill at the current board price for the instrument.
    /// The board has already absorbed the event that triggered the order by
    /// the time the strategy ran, so an order placed in response to a tick
    /// fills at that same tick's price. Same-instant matching, not strictly
    /// prior: a deliberate approximation of the matching rule.
    ///
    /// Limit orders fill (at the board price, i.e. at-or-better) only when
    /// marketable: buy limit >= board price, sell limit <= board price.
    /// Non-marketable limits are dropped — a defined no-fill outcome, not an
    /// error. An instrument the board has never seen also yields no fill.
    pub fn place_order(&self, order: &Order, board: &DataBoard) -> Option<Fill> {
        let Some(board_price) = board.last_price(&order.instrument) else {
            debug!(
                instrument = %order.instrument,
                "no board price yet; order skipped"
            );
            return None;
        };

        let marketable = match order.order_type {
            OrderType::Market => true,
            OrderType::Limit { limit_price } => match order.side {
                OrderSide::Buy => limit_price >= board_price,
                OrderSide::Sell => limit_price <= board_price,
            },
        };
        if !marketable {
            debug!(
                instrument = %order.instrument,
                board_price,
                "limit not marketable; order dropped"
            );
            return None;
        }

        let commission = self.commission.commission(board_price, order.quantity);
        Some(Fill {
            instrument: order.instrument.clone(),
            timestamp: order.timestamp,
            side: order.side,
            quantity: order.quantity,
            fill_price: board_price,
            commission,
        })
    }
}
