//! Pre-trade risk gate. The dispatcher's order path calls `check` before any
//! order reaches the brokerage; a reject produces no fill and is counted
//! without aborting the run.

use crate::domain::{Order, OrderSide, Portfolio};

/// Outcome of a pre-trade check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskVerdict {
    Allowed,
    Rejected { reason: String },
}

impl RiskVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RiskVerdict::Allowed)
    }
}

pub trait RiskGate: Send {
    fn check(&self, order: &Order, portfolio: &Portfolio) -> RiskVerdict;
}

/// Default gate: allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughGate;

impl RiskGate for PassThroughGate {
    fn check(&self, _order: &Order, _portfolio: &Portfolio) -> RiskVerdict {
        RiskVerdict::Allowed
    }
}

/// Rejects any sell that would take the position below flat.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShortGate;

impl RiskGate for NoShortGate {
    fn check(&self, order: &Order, portfolio: &Portfolio) -> RiskVerdict {
        if order.side == OrderSide::Sell {
            let held = portfolio.quantity(&order.instrument);
            if order.quantity > held {
                return RiskVerdict::Rejected {
                    reason: format!(
                        "sell {} {} exceeds held quantity {held} (short selling disabled)",
                        order.quantity, order.instrument
                    ),
                };
            }
        }
        RiskVerdict::Allowed
    }
}
