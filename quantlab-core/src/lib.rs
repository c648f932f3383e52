//! QuantLab Core — the event-driven backtesting engine.
//!
//! This crate contains the simulation machinery:
//! - Domain types (ticks, bars, orders, fills, positions, portfolio)
//! - Event dispatcher with an explicit routing table and derived-event queue
//! - Data board holding the latest observation per instrument
//! - Simulated brokerage with pluggable commission models
//! - Portfolio ledger (cash, positions, realized PnL)
//! - Performance accumulator with deferred anti-look-ahead snapshots
//! - Pre-trade risk gates
//! - Strategy contract, registry, and built-in strategies
//! - Market data feed trait with in-memory and synthetic implementations

pub mod board;
pub mod brokerage;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod ledger;
pub mod performance;
pub mod risk;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the sweep worker boundary
    /// is Send. Runs execute on rayon workers, so a non-Send component would
    /// break parallel sweeps at a distance.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Event>();
        require_sync::<domain::Event>();
        require_send::<domain::TickEvent>();
        require_sync::<domain::TickEvent>();
        require_send::<domain::BarEvent>();
        require_sync::<domain::BarEvent>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Fill>();
        require_sync::<domain::Fill>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();

        // Engine state
        require_send::<board::DataBoard>();
        require_sync::<board::DataBoard>();
        require_send::<ledger::PortfolioLedger>();
        require_sync::<ledger::PortfolioLedger>();
        require_send::<performance::PerformanceTracker>();
        require_sync::<performance::PerformanceTracker>();
        require_send::<performance::PerformanceRecord>();
        require_sync::<performance::PerformanceRecord>();

        // Boxed seams
        require_send::<Box<dyn strategy::Strategy>>();
        require_send::<Box<dyn risk::RiskGate>>();
        require_send::<engine::Backtest>();
    }

    /// Architecture contract: strategies cannot see the portfolio.
    ///
    /// `on_tick`/`on_bar` take the event, the board, and an order sink — no
    /// portfolio parameter. Position-awareness has to live in the risk gate
    /// or inside the strategy's own state. If this stops compiling, the
    /// contract changed.
    #[test]
    fn strategy_trait_has_no_portfolio_parameter() {
        fn _check_trait_object_builds(
            strategy: &mut dyn strategy::Strategy,
            tick: &domain::TickEvent,
            board: &board::DataBoard,
            orders: &mut Vec<domain::Order>,
        ) {
            strategy.on_tick(tick, board, orders);
        }
    }
}
