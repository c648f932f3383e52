//! Serializable backtest configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use quantlab_core::strategy::StrategyRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("ticker universe is empty")]
    EmptyUniverse,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("initial cash must be positive, got {0}")]
    NonPositiveCash(f64),

    #[error("unknown strategy '{name}' (available: {available:?})")]
    UnknownStrategy { name: String, available: Vec<String> },

    #[error("invalid parameters for strategy '{name}': {reason}")]
    InvalidStrategyParams { name: String, reason: String },
}

/// Everything needed to reproduce a single backtest run.
///
/// Two configs that serialize to the same JSON have the same `run_id`, so
/// results keyed by it are content-addressable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    /// Initial cash balance.
    pub initial_cash: f64,

    /// Instruments the strategy trades.
    pub tickers: Vec<String>,

    /// Optional benchmark instrument: subscribed and marked, never traded.
    #[serde(default)]
    pub benchmark: Option<String>,

    /// Backtest start date (inclusive).
    pub start_date: NaiveDate,

    /// Backtest end date (inclusive).
    pub end_date: NaiveDate,

    /// Where bars come from.
    pub datasource: DataSourceConfig,

    /// Strategy selection and parameters.
    pub strategy: StrategyConfig,

    /// Commission model applied to every fill.
    #[serde(default)]
    pub commission: CommissionConfig,

    /// When false, a no-short risk gate rejects sells beyond the held
    /// quantity.
    #[serde(default = "default_allow_short")]
    pub allow_short: bool,

    /// Artifact directory for exported results.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_allow_short() -> bool {
    true
}

/// Bar source for the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceConfig {
    /// Daily CSV files, one per symbol, under `hist_dir`.
    Local { hist_dir: PathBuf },

    /// Seeded random-walk bars. Deterministic per seed; for smoke tests
    /// and benchmarks, never for real results.
    Synthetic {
        seed: u64,
        #[serde(default = "default_start_price")]
        start_price: f64,
    },
}

fn default_start_price() -> f64 {
    100.0
}

/// Strategy selection: registry name plus numeric parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    pub name: String,

    /// Instrument the strategy trades; defaults to the first ticker.
    #[serde(default)]
    pub instrument: Option<String>,

    /// Ordered so that serialization (and therefore the run id) does not
    /// depend on insertion order.
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

/// Commission configuration (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionConfig {
    #[default]
    None,

    /// Fixed amount per share.
    PerShare { per_share: f64 },

    /// Basis points of traded notional.
    Bps { bps: f64 },
}

impl BacktestConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Fail fast on configurations that cannot produce a meaningful run.
    pub fn validate(&self, registry: &StrategyRegistry) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.initial_cash <= 0.0 {
            return Err(ConfigError::NonPositiveCash(self.initial_cash));
        }
        if !registry.contains(&self.strategy.name) {
            return Err(ConfigError::UnknownStrategy {
                name: self.strategy.name.clone(),
                available: registry.names().iter().map(|s| s.to_string()).collect(),
            });
        }
        self.validate_strategy_params()
    }

    /// Per-strategy parameter checks for the built-in strategies.
    fn validate_strategy_params(&self) -> Result<(), ConfigError> {
        if self.strategy.name == "ma_cross" {
            let short = self.strategy.params.get("short_window").copied().unwrap_or(100.0);
            let long = self.strategy.params.get("long_window").copied().unwrap_or(400.0);
            if short < 1.0 {
                return Err(ConfigError::InvalidStrategyParams {
                    name: self.strategy.name.clone(),
                    reason: format!("short_window must be at least 1, got {short}"),
                });
            }
            if short >= long {
                return Err(ConfigError::InvalidStrategyParams {
                    name: self.strategy.name.clone(),
                    reason: format!(
                        "short_window ({short}) must be below long_window ({long})"
                    ),
                });
            }
        }
        Ok(())
    }

    /// Instrument the strategy trades.
    pub fn strategy_instrument(&self) -> &str {
        self.strategy
            .instrument
            .as_deref()
            .unwrap_or(&self.tickers[0])
    }

    /// Full subscription universe: tickers plus the benchmark, deduplicated.
    pub fn universe(&self) -> Vec<String> {
        let mut universe = self.tickers.clone();
        if let Some(benchmark) = &self.benchmark {
            if !universe.contains(benchmark) {
                universe.push(benchmark.clone());
            }
        }
        universe
    }

    /// Deterministic content hash of this configuration.
    pub fn run_id(&self) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
