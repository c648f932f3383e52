//! The assembled engine: context, wiring, and the run lifecycle.

use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::board::DataBoard;
use crate::brokerage::SimBrokerage;
use crate::domain::EventKind;
use crate::engine::{handlers, EngineError, EventDispatcher};
use crate::feed::MarketDataFeed;
use crate::ledger::PortfolioLedger;
use crate::performance::{PerformanceRecord, PerformanceTracker};
use crate::risk::{PassThroughGate, RiskGate};
use crate::strategy::Strategy;

/// All mutable engine state, shared by the handlers. Public fields: the
/// context stays inspectable after a run, including one aborted by an error
/// or a stop signal.
pub struct EngineContext {
    pub board: DataBoard,
    pub ledger: PortfolioLedger,
    pub performance: PerformanceTracker,
    pub brokerage: SimBrokerage,
    pub risk: Box<dyn RiskGate>,
    pub strategy: Box<dyn Strategy>,
    /// Timestamp of the most recent feed event.
    pub clock: Option<DateTime<Utc>>,
    pub risk_rejections: u64,
}

/// A fully wired backtest over one strategy and one feed.
pub struct Backtest {
    dispatcher: EventDispatcher,
    ctx: EngineContext,
    universe: Vec<String>,
    events_dispatched: u64,
}

impl Backtest {
    /// Wire the standard engine: tick/bar/order/fill routes, a pass-through
    /// risk gate, and a commission-free brokerage. Calls `on_init` on the
    /// strategy once wiring succeeds.
    pub fn new(
        initial_cash: f64,
        universe: Vec<String>,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, EngineError> {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_handler(EventKind::Tick, handlers::tick_handler)?;
        dispatcher.register_handler(EventKind::Bar, handlers::bar_handler)?;
        dispatcher.register_handler(EventKind::Order, handlers::order_handler)?;
        dispatcher.register_handler(EventKind::Fill, handlers::fill_handler)?;

        let mut ctx = EngineContext {
            board: DataBoard::new(),
            ledger: PortfolioLedger::new(initial_cash),
            performance: PerformanceTracker::new(universe.clone()),
            brokerage: SimBrokerage::default(),
            risk: Box::new(PassThroughGate),
            strategy,
            clock: None,
            risk_rejections: 0,
        };
        ctx.strategy.on_init();

        Ok(Self {
            dispatcher,
            ctx,
            universe,
            events_dispatched: 0,
        })
    }

    pub fn with_brokerage(mut self, brokerage: SimBrokerage) -> Self {
        self.ctx.brokerage = brokerage;
        self
    }

    pub fn with_risk_gate(mut self, risk: Box<dyn RiskGate>) -> Self {
        self.ctx.risk = risk;
        self
    }

    /// Drive the feed to exhaustion and write the final performance row.
    pub fn run(&mut self, feed: &mut dyn MarketDataFeed) -> Result<(), EngineError> {
        self.run_with_stop(feed, None)
    }

    pub fn run_with_stop(
        &mut self,
        feed: &mut dyn MarketDataFeed,
        stop: Option<&AtomicBool>,
    ) -> Result<(), EngineError> {
        feed.subscribe(&self.universe);
        self.ctx.strategy.on_start();
        info!(strategy = %self.ctx.strategy.name(), universe = ?self.universe, "run started");

        let dispatched = self.dispatcher.run(feed, &mut self.ctx, stop)?;
        self.events_dispatched += dispatched;

        if let Some(clock) = self.ctx.clock {
            self.ctx
                .performance
                .update_final_performance(clock, self.ctx.ledger.portfolio(), &self.ctx.board);
        }
        info!(
            dispatched,
            equity = self.ctx.ledger.equity(),
            rejections = self.ctx.risk_rejections,
            "run finished"
        );
        Ok(())
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched
    }

    pub fn risk_rejections(&self) -> u64 {
        self.ctx.risk_rejections
    }

    /// Consume the backtest into its immutable performance record.
    pub fn finalize(self) -> PerformanceRecord {
        self.ctx.performance.finalize()
    }
}
