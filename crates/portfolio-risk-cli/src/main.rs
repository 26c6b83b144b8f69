mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::{AnalysisArgs, DiversificationArgs, TailRiskArgs};
use commands::bootstrap::BootstrapArgs;

/// Portfolio risk and return analytics
#[derive(Parser)]
#[command(
    name = "prisk",
    version,
    about = "Portfolio risk and return analytics",
    long_about = "A CLI for analysing a weighted multi-asset portfolio from its price \
                  history: annualised return and volatility, Sharpe ratio, maximum \
                  drawdown, historical VaR/CVaR over a rolling horizon, and the \
                  diversification ratio."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the risk report
    Analyze(AnalysisArgs),
    /// Portfolio return series with annualised statistics
    Returns(AnalysisArgs),
    /// Wealth index and maximum drawdown
    Drawdown(AnalysisArgs),
    /// Historical VaR/CVaR over rolling windows
    TailRisk(TailRiskArgs),
    /// Diversification ratio from the estimated covariance matrix
    Diversification(DiversificationArgs),
    /// Probability of beating a target annual return (bootstrap resampling)
    Bootstrap(BootstrapArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Returns(args) => commands::analysis::run_returns(args),
        Commands::Drawdown(args) => commands::analysis::run_drawdown(args),
        Commands::TailRisk(args) => commands::analysis::run_tail_risk(args),
        Commands::Diversification(args) => commands::analysis::run_diversification(args),
        Commands::Bootstrap(args) => commands::bootstrap::run_bootstrap(args),
        Commands::Version => {
            println!("prisk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
