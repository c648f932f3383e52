//! QuantLab CLI — run backtests and parameter sweeps.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config file
//! - `sweep` — run a moving-average parameter grid over the same config

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quantlab_runner::config::BacktestConfig;
use quantlab_runner::export::save_results;
use quantlab_runner::runner::{run_backtest, BacktestReport};
use quantlab_runner::sweep::{run_sweep, ParamGrid};

#[derive(Parser)]
#[command(name = "quantlab", about = "QuantLab — event-driven backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts. Overrides the config's
        /// output_dir; when neither is set, nothing is written to disk.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run a moving-average parameter grid over one config.
    Sweep {
        /// Path to a TOML config file (strategy must be ma_cross).
        #[arg(long)]
        config: PathBuf,

        /// Short window values, comma-separated (e.g. 10,20,50).
        #[arg(long, value_delimiter = ',', default_value = "10,20,50")]
        short: Vec<usize>,

        /// Long window values, comma-separated (e.g. 100,200,400).
        #[arg(long, value_delimiter = ',', default_value = "100,200,400")]
        long: Vec<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, output_dir } => cmd_run(&config, output_dir),
        Commands::Sweep {
            config,
            short,
            long,
        } => cmd_sweep(&config, short, long),
    }
}

fn cmd_run(config_path: &PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let config = BacktestConfig::from_toml_file(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let report = run_backtest(&config).context("backtest failed")?;
    print_summary(&report);

    if let Some(dir) = output_dir.or(config.output_dir.clone()) {
        let target = dir.join(report.artifact_label());
        save_results(&target, &report)?;
        info!(dir = %target.display(), "artifacts written");
        println!("\nArtifacts: {}", target.display());
    }
    Ok(())
}

fn cmd_sweep(config_path: &PathBuf, short: Vec<usize>, long: Vec<usize>) -> Result<()> {
    let base = BacktestConfig::from_toml_file(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let grid = ParamGrid {
        short_windows: short,
        long_windows: long,
    };
    let configs = grid.generate_configs(&base);
    anyhow::ensure!(!configs.is_empty(), "parameter grid is empty");

    let results = run_sweep(&configs);

    println!(
        "{:<8} {:<8} {:>14} {:>10} {:>10} {:>8}",
        "short", "long", "final equity", "return", "max dd", "trades"
    );
    let mut ranked = Vec::new();
    for (config, result) in configs.iter().zip(results) {
        let short = config.strategy.params["short_window"];
        let long = config.strategy.params["long_window"];
        match result {
            Ok(report) => {
                println!(
                    "{:<8} {:<8} {:>14.2} {:>9.2}% {:>9.2}% {:>8}",
                    short,
                    long,
                    report.summary.final_equity,
                    report.summary.cumulative_return * 100.0,
                    report.summary.max_drawdown * 100.0,
                    report.summary.trade_count,
                );
                ranked.push((short, long, report.summary.cumulative_return));
            }
            Err(err) => {
                println!("{short:<8} {long:<8} failed: {err}");
            }
        }
    }

    if let Some((short, long, ret)) = ranked
        .iter()
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .copied()
    {
        println!(
            "\nBest: short={short} long={long} ({:.2}% return)",
            ret * 100.0
        );
    }
    Ok(())
}

fn print_summary(report: &BacktestReport) {
    let s = &report.summary;
    println!("Run:              {}", report.run_id);
    println!("Strategy:         {}", report.strategy);
    println!("Universe:         {}", report.universe.join(", "));
    println!(
        "Period:           {} .. {}",
        report.start_date, report.end_date
    );
    println!("Initial cash:     {:.2}", report.initial_cash);
    println!("Final equity:     {:.2}", s.final_equity);
    println!("Return:           {:.2}%", s.cumulative_return * 100.0);
    println!("Volatility (ann): {:.2}%", s.annualized_volatility * 100.0);
    println!("Sharpe:           {:.2}", s.sharpe);
    println!("Max drawdown:     {:.2}%", s.max_drawdown * 100.0);
    println!("Trades:           {}", s.trade_count);
    println!("Turnover:         {:.2}x", s.turnover);
    println!("Commission paid:  {:.2}", s.total_commission);
    println!("Risk rejections:  {}", report.risk_rejections);
    println!("Events:           {}", report.events_dispatched);
}
