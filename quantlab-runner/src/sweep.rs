//! Parameter sweeps: independent runs in parallel with rayon.

use rayon::prelude::*;
use tracing::info;

use crate::config::BacktestConfig;
use crate::runner::{run_backtest, BacktestReport, RunError};

/// Grid of moving-average windows to sweep.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
}

impl ParamGrid {
    /// All valid (short < long) combinations applied to the base config.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::new();
        for &short in &self.short_windows {
            for &long in &self.long_windows {
                if short >= long {
                    continue;
                }
                let mut config = base.clone();
                config
                    .strategy
                    .params
                    .insert("short_window".to_string(), short as f64);
                config
                    .strategy
                    .params
                    .insert("long_window".to_string(), long as f64);
                configs.push(config);
            }
        }
        configs
    }
}

/// Run each config on a rayon worker. Every run owns its whole engine, so
/// results are identical to running the configs sequentially.
pub fn run_sweep(configs: &[BacktestConfig]) -> Vec<Result<BacktestReport, RunError>> {
    info!(runs = configs.len(), "starting sweep");
    configs.par_iter().map(run_backtest).collect()
}
