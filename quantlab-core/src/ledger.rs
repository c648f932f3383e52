//! Portfolio ledger — the only component allowed to mutate cash and
//! position quantities, and it does so exclusively through `on_fill`.
//! `mark_to_market` rewrites valuation marks and nothing else.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{Fill, OrderSide, Portfolio, Position};

#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    portfolio: Portfolio,
}

impl PortfolioLedger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            portfolio: Portfolio::new(initial_cash),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn cash(&self) -> f64 {
        self.portfolio.cash
    }

    pub fn realized_pnl(&self) -> f64 {
        self.portfolio.realized_pnl
    }

    pub fn equity(&self) -> f64 {
        self.portfolio.equity()
    }

    /// Revalue `instrument` at `price` without touching quantity or cash.
    /// Idempotent: re-marking at the same price changes nothing. An
    /// instrument with no open position is a no-op.
    pub fn mark_to_market(&mut self, _timestamp: DateTime<Utc>, instrument: &str, price: f64) {
        if let Some(pos) = self.portfolio.positions.get_mut(instrument) {
            pos.last_mark = price;
        }
    }

    /// Apply a fill: move cash, update the position's quantity and
    /// volume-weighted average cost, and book realized PnL on any quantity
    /// that reduces or closes the existing position.
    pub fn on_fill(&mut self, fill: &Fill) {
        let signed_qty = fill.signed_quantity();

        // Cash: buys pay, sells receive; commission always paid.
        self.portfolio.cash -= signed_qty * fill.fill_price;
        self.portfolio.cash -= fill.commission;
        self.portfolio.total_commission += fill.commission;

        let pos = self
            .portfolio
            .positions
            .entry(fill.instrument.clone())
            .or_insert_with(|| Position::new(fill.instrument.clone(), 0.0, fill.fill_price));

        let prev_qty = pos.quantity;
        let new_qty = prev_qty + signed_qty;

        if prev_qty == 0.0 || prev_qty.signum() == signed_qty.signum() {
            // Opening or adding in the same direction: VWAP the cost basis.
            let total = prev_qty.abs() + signed_qty.abs();
            pos.avg_cost = (pos.avg_cost * prev_qty.abs() + fill.fill_price * signed_qty.abs())
                / total;
            if prev_qty == 0.0 {
                // Fresh position: seed the mark so equity is defined before
                // the next mark-to-market arrives.
                pos.last_mark = fill.fill_price;
            }
        } else {
            // Reducing (possibly through flat): realize PnL on the closed
            // quantity in the direction of the existing position.
            let closed = signed_qty.abs().min(prev_qty.abs());
            let direction = prev_qty.signum();
            self.portfolio.realized_pnl +=
                (fill.fill_price - pos.avg_cost) * closed * direction;

            if prev_qty.abs() < signed_qty.abs() {
                // Crossed through flat: the remainder opens a new position
                // at the fill price.
                pos.avg_cost = fill.fill_price;
                pos.last_mark = fill.fill_price;
            }
        }

        pos.quantity = new_qty;
        if pos.is_flat() {
            self.portfolio.positions.remove(&fill.instrument);
            debug!(instrument = %fill.instrument, "position closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fill(side: OrderSide, quantity: f64, price: f64) -> Fill {
        Fill {
            instrument: "AAPL".into(),
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            side,
            quantity,
            fill_price: price,
            commission: 0.0,
        }
    }

    fn fill_with_commission(side: OrderSide, quantity: f64, price: f64, commission: f64) -> Fill {
        Fill {
            commission,
            ..fill(side, quantity, price)
        }
    }

    #[test]
    fn buy_moves_cash_and_opens_position() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill_with_commission(OrderSide::Buy, 100.0, 10.0, 1.0));
        assert_eq!(ledger.cash(), 100_000.0 - 1_000.0 - 1.0);
        let pos = &ledger.portfolio().positions["AAPL"];
        assert_eq!(pos.quantity, 100.0);
        assert_eq!(pos.avg_cost, 10.0);
        assert_eq!(pos.last_mark, 10.0);
    }

    #[test]
    fn adding_averages_cost() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 10.0));
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 12.0));
        let pos = &ledger.portfolio().positions["AAPL"];
        assert_eq!(pos.quantity, 200.0);
        assert!((pos.avg_cost - 11.0).abs() < 1e-12);
        assert_eq!(ledger.realized_pnl(), 0.0);
    }

    #[test]
    fn reducing_realizes_pnl() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 10.0));
        ledger.on_fill(&fill(OrderSide::Sell, 40.0, 12.0));
        // (12 - 10) * 40 = 80 realized
        assert!((ledger.realized_pnl() - 80.0).abs() < 1e-12);
        let pos = &ledger.portfolio().positions["AAPL"];
        assert_eq!(pos.quantity, 60.0);
        // Cost basis of the remainder unchanged
        assert_eq!(pos.avg_cost, 10.0);
    }

    #[test]
    fn full_close_removes_position() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 10.0));
        ledger.on_fill(&fill(OrderSide::Sell, 100.0, 12.0));
        assert!((ledger.realized_pnl() - 200.0).abs() < 1e-12);
        assert!(ledger.portfolio().positions.is_empty());
        // 100k - 1000 + 1200
        assert!((ledger.cash() - 100_200.0).abs() < 1e-12);
        assert!((ledger.equity() - 100_200.0).abs() < 1e-12);
    }

    #[test]
    fn crossing_through_flat_reopens_at_fill_price() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 10.0));
        ledger.on_fill(&fill(OrderSide::Sell, 150.0, 12.0));
        // Realized on the closed 100: (12-10)*100 = 200
        assert!((ledger.realized_pnl() - 200.0).abs() < 1e-12);
        let pos = &ledger.portfolio().positions["AAPL"];
        assert_eq!(pos.quantity, -50.0);
        assert_eq!(pos.avg_cost, 12.0);
    }

    #[test]
    fn short_round_trip_realizes_pnl() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Sell, 100.0, 10.0));
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 8.0));
        // Short at 10, covered at 8: (8 - 10) * 100 * (-1) = +200
        assert!((ledger.realized_pnl() - 200.0).abs() < 1e-12);
        assert!(ledger.portfolio().positions.is_empty());
    }

    #[test]
    fn mark_to_market_is_idempotent_and_leaves_cash_alone() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 10.0));
        let ts = Utc.timestamp_opt(10, 0).unwrap();

        ledger.mark_to_market(ts, "AAPL", 12.0);
        let cash = ledger.cash();
        let realized = ledger.realized_pnl();
        let equity = ledger.equity();

        ledger.mark_to_market(ts, "AAPL", 12.0);
        assert_eq!(ledger.cash(), cash);
        assert_eq!(ledger.realized_pnl(), realized);
        assert_eq!(ledger.equity(), equity);
        assert_eq!(ledger.portfolio().positions["AAPL"].quantity, 100.0);
    }

    #[test]
    fn mark_for_unknown_instrument_is_noop() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.mark_to_market(Utc.timestamp_opt(0, 0).unwrap(), "MSFT", 50.0);
        assert_eq!(ledger.equity(), 100_000.0);
    }

    #[test]
    fn equity_uses_latest_mark_not_fill_price() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill(OrderSide::Buy, 100.0, 10.0));
        ledger.mark_to_market(Utc.timestamp_opt(10, 0).unwrap(), "AAPL", 12.0);
        // 99_000 cash + 100 * 12 mark
        assert!((ledger.equity() - 100_200.0).abs() < 1e-12);
    }

    #[test]
    fn accounting_identity_holds() {
        let mut ledger = PortfolioLedger::new(100_000.0);
        ledger.on_fill(&fill_with_commission(OrderSide::Buy, 100.0, 10.0, 2.0));
        ledger.mark_to_market(Utc.timestamp_opt(5, 0).unwrap(), "AAPL", 11.0);
        ledger.on_fill(&fill_with_commission(OrderSide::Sell, 50.0, 11.0, 1.0));

        let p = ledger.portfolio();
        let identity =
            p.initial_cash + p.realized_pnl + p.unrealized_pnl() - p.total_commission;
        assert!((p.equity() - identity).abs() < 1e-9);
    }
}
