//! QuantLab Runner — orchestration around the core engine.
//!
//! - Validated, serializable backtest configuration (TOML)
//! - CSV bar loading merged into one time-ordered event stream
//! - Single-run wiring: feed + strategy + risk + commission → report
//! - CSV/JSON artifact export
//! - Parallel parameter sweeps

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;
