//! Single-run wiring: config → feed + strategy + gates → report.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use quantlab_core::brokerage::{
    BpsCommission, CommissionModel, NoCommission, PerShareCommission, SimBrokerage,
};
use quantlab_core::engine::{Backtest, EngineError};
use quantlab_core::feed::{MarketDataFeed, RandomWalkFeed, VecFeed};
use quantlab_core::performance::{PerformanceRecord, PerformanceSummary};
use quantlab_core::risk::{NoShortGate, PassThroughGate, RiskGate};
use quantlab_core::strategy::{default_registry, StrategyError, StrategyParams};

use crate::config::{BacktestConfig, CommissionConfig, ConfigError, DataSourceConfig, RunId};
use crate::data_loader::{load_events, LoadError};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Load(#[from] LoadError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Complete serializable result of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub universe: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub summary: PerformanceSummary,
    pub record: PerformanceRecord,
    pub risk_rejections: u64,
    pub events_dispatched: u64,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Validate the config, wire the engine, run it to feed exhaustion, and
/// finalize into a report.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestReport, RunError> {
    let registry = default_registry();
    config.validate(&registry)?;
    let run_id = config.run_id()?;

    let mut params = StrategyParams::new(config.strategy_instrument());
    params.params = config.strategy.params.clone();
    let strategy = registry.build(&config.strategy.name, &params)?;

    let universe = config.universe();
    let mut feed = build_feed(config, &universe)?;

    let mut backtest = Backtest::new(config.initial_cash, universe.clone(), strategy)?
        .with_brokerage(SimBrokerage::new(commission_model(&config.commission)))
        .with_risk_gate(risk_gate(config.allow_short));

    info!(run_id = %run_id, strategy = %config.strategy.name, "starting backtest");
    backtest.run(feed.as_mut())?;

    let risk_rejections = backtest.risk_rejections();
    let events_dispatched = backtest.events_dispatched();
    let record = backtest.finalize();

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: config.strategy.name.clone(),
        universe,
        start_date: config.start_date,
        end_date: config.end_date,
        initial_cash: config.initial_cash,
        summary: record.summary.clone(),
        record,
        risk_rejections,
        events_dispatched,
    })
}

fn build_feed(
    config: &BacktestConfig,
    universe: &[String],
) -> Result<Box<dyn MarketDataFeed>, RunError> {
    match &config.datasource {
        DataSourceConfig::Local { hist_dir } => {
            let events = load_events(hist_dir, universe, config.start_date, config.end_date)?;
            Ok(Box::new(VecFeed::new(events)))
        }
        DataSourceConfig::Synthetic { seed, start_price } => {
            let days = (config.end_date - config.start_date).num_days().max(1) as usize;
            Ok(Box::new(RandomWalkFeed::new(*seed, days, *start_price)))
        }
    }
}

fn commission_model(config: &CommissionConfig) -> Box<dyn CommissionModel> {
    match config {
        CommissionConfig::None => Box::new(NoCommission),
        CommissionConfig::PerShare { per_share } => Box::new(PerShareCommission {
            per_share: *per_share,
        }),
        CommissionConfig::Bps { bps } => Box::new(BpsCommission { bps: *bps }),
    }
}

fn risk_gate(allow_short: bool) -> Box<dyn RiskGate> {
    if allow_short {
        Box::new(PassThroughGate)
    } else {
        Box::new(NoShortGate)
    }
}

impl BacktestReport {
    /// Wall-clock label used for artifact directories.
    pub fn artifact_label(&self) -> String {
        format!(
            "{}_{}",
            self.strategy,
            Utc::now().format("%Y%m%d_%H%M%S")
        )
    }
}
