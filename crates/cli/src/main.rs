use anyhow::Context;
use clap::{Parser, Subcommand};
use newsalpha_core::ConfigLoader;
use std::path::PathBuf;

mod commands;

use commands::{AdjustArgs, BacktestArgs, OptimizeArgs};

#[derive(Parser)]
#[command(name = "newsalpha")]
#[command(about = "Backtest market predictions and tune the prediction config", long_about = None)]
struct Cli {
    /// Directory holding Config.toml / Config.json
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify past predictions against realized prices, then optimize
    Backtest(BacktestArgs),
    /// Analyze the latest backtest results and apply recommendations
    Optimize(OptimizeArgs),
    /// Weight a single prediction with the current prediction config
    Adjust(AdjustArgs),
    /// Show the current prediction config and accuracy trend
    Summary,
    /// Run backtest cycles on the configured cron schedule
    Daemon,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Exits non-zero only when logging or configuration cannot be set up.
/// Command failures are reported and leave the exit code at zero.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let app = ConfigLoader::load_from(&cli.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", cli.config_dir.display()))?;

    let result = match cli.command {
        Commands::Backtest(args) => commands::run_backtest(&app, &args).await,
        Commands::Optimize(args) => commands::run_optimize(&app, &args),
        Commands::Adjust(args) => commands::run_adjust(&app, &args),
        Commands::Summary => {
            commands::run_summary(&app);
            Ok(())
        }
        Commands::Daemon => commands::run_daemon(app).await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e:#}");
        println!("error: {e:#}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use newsalpha_core::{Direction, Source};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn backtest_flags_parse() {
        let cli = Cli::try_parse_from([
            "newsalpha", "backtest", "--monthly", "--days", "14", "--skip-optimize",
        ])
        .unwrap();
        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest");
        };
        assert!(args.monthly && !args.weekly);
        assert_eq!(args.days, Some(14));
        assert!(args.skip_optimize && !args.dry_run);
        assert_eq!(cli.config_dir, PathBuf::from("config"));
    }

    #[test]
    fn adjust_parses_direction_and_source() {
        let cli = Cli::try_parse_from([
            "newsalpha", "adjust", "--symbol", "600519", "--direction", "down",
            "--source", "monthly_sell", "--confidence", "0.8", "--config-dir", "/tmp/cfg",
        ])
        .unwrap();
        let Commands::Adjust(args) = cli.command else {
            panic!("expected adjust");
        };
        assert_eq!(args.direction, Direction::Down);
        assert_eq!(args.source, Source::MonthlySell);
        assert!((args.record().confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(cli.config_dir, PathBuf::from("/tmp/cfg"));
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Cli::try_parse_from([
            "newsalpha", "adjust", "--symbol", "AAA", "--direction", "up", "--source", "tv",
        ])
        .is_err());
    }
}
