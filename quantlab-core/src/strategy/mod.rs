//! Strategy contract and the by-name registry.
//!
//! A strategy is a pure decision layer: it reads events and the board, and
//! pushes orders into a sink. It never touches the portfolio, the brokerage,
//! or the queue directly.

mod buy_hold;
mod ma_cross;

pub use buy_hold::BuyAndHold;
pub use ma_cross::MovingAverageCross;

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::board::DataBoard;
use crate::domain::{BarEvent, Order, TickEvent};

/// Parameters handed to a strategy builder: the instrument it trades plus a
/// free-form numeric parameter map. The map is ordered so anything derived
/// from its serialized form is reproducible.
#[derive(Debug, Clone, Default)]
pub struct StrategyParams {
    pub instrument: String,
    pub params: BTreeMap<String, f64>,
}

impl StrategyParams {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Parameter lookup with a fallback.
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

/// Trading logic driven by the dispatcher.
///
/// `on_tick` / `on_bar` run after the board has absorbed the event, so
/// `board.last_price` already reflects it. Orders pushed into `orders` are
/// queued behind the current event and routed through the risk gate.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// One-time setup before any event is dispatched.
    fn on_init(&mut self) {}

    /// Called when the run starts, after `on_init`.
    fn on_start(&mut self) {}

    fn on_tick(&mut self, _tick: &TickEvent, _board: &DataBoard, _orders: &mut Vec<Order>) {}

    fn on_bar(&mut self, _bar: &BarEvent, _board: &DataBoard, _orders: &mut Vec<Order>) {}
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name()).finish()
    }
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

type StrategyBuilder = fn(&StrategyParams) -> Box<dyn Strategy>;

/// Maps strategy names to builder functions. An explicit value constructed
/// per run; there is no global registry.
pub struct StrategyRegistry {
    builders: HashMap<String, StrategyBuilder>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, builder: StrategyBuilder) {
        self.builders.insert(name.into(), builder);
    }

    pub fn build(
        &self,
        name: &str,
        params: &StrategyParams,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))?;
        Ok(builder(params))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the built-in strategies.
pub fn default_registry() -> StrategyRegistry {
    let mut registry = StrategyRegistry::new();
    registry.register("ma_cross", |params| {
        Box::new(MovingAverageCross::from_params(params))
    });
    registry.register("buy_and_hold", |params| {
        Box::new(BuyAndHold::from_params(params))
    });
    registry
}
