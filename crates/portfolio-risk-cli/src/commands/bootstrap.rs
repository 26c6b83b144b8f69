use clap::Args;
use serde_json::Value;

use portfolio_risk_core::analytics::bootstrap::{bootstrap_target_probability, BootstrapInput};
use portfolio_risk_core::returns::{aggregate_portfolio, build_returns};

use super::analysis::{load_input, AnalysisArgs};

/// Arguments for the target-return bootstrap
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    #[command(flatten)]
    pub common: AnalysisArgs,

    /// Annual return to beat
    #[arg(long, default_value = "0.06", allow_hyphen_values = true)]
    pub target: f64,

    /// Number of resampled annualised returns
    #[arg(long, default_value = "100000")]
    pub samples: u32,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_bootstrap(args: BootstrapArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis = load_input(&args.common)?;
    analysis.config.validate()?;
    let returns = build_returns(&analysis.prices, analysis.config.return_mode)?;
    let series = aggregate_portfolio(&returns, &analysis.weights)?;

    let input = BootstrapInput {
        target_return: args.target,
        num_samples: args.samples,
        seed: args.seed,
    };
    let result = bootstrap_target_probability(&series, analysis.config.periods_per_year, &input)?;
    Ok(serde_json::to_value(result)?)
}
