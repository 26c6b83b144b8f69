use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use portfolio_risk_core::analytics::tail_risk::Histogram;
use portfolio_risk_core::analytics::{
    analyze_drawdown, annualize, estimate_tail_risk, score_diversification, AnnualizedStats,
    DiversificationScore, DrawdownAnalysis, RiskMatrix,
};
use portfolio_risk_core::returns::{aggregate_portfolio, build_returns, PortfolioReturnSeries, ReturnMatrix};
use portfolio_risk_core::{
    analyze_portfolio, AnalysisConfig, PortfolioAnalysisInput, ReturnMode, WeightVector,
};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReturnModeArg {
    Log,
    Arithmetic,
}

impl From<ReturnModeArg> for ReturnMode {
    fn from(arg: ReturnModeArg) -> Self {
        match arg {
            ReturnModeArg::Log => ReturnMode::Log,
            ReturnModeArg::Arithmetic => ReturnMode::Arithmetic,
        }
    }
}

/// Inputs shared by every analysis command
#[derive(Args, Debug, Default)]
pub struct AnalysisArgs {
    /// Path to a JSON analysis input (prices, weights, optional config)
    #[arg(long, conflicts_with = "prices")]
    pub input: Option<String>,

    /// Path to a price CSV: `date,<asset>,...`; empty cells are missing prices
    #[arg(long)]
    pub prices: Option<String>,

    /// Portfolio weights as fractions (e.g. "SPY=0.6,TLT=0.4")
    #[arg(long, value_delimiter = ',', conflicts_with = "weights_pct")]
    pub weights: Option<Vec<String>>,

    /// Portfolio weights as percentages (e.g. "SPY=60,TLT=40")
    #[arg(long, value_delimiter = ',')]
    pub weights_pct: Option<Vec<String>>,

    /// Analysis config file (YAML, or JSON by extension)
    #[arg(long)]
    pub config: Option<String>,

    /// Return convention
    #[arg(long)]
    pub return_mode: Option<ReturnModeArg>,

    /// Periods per year used for annualisation (252 trading, 365 calendar)
    #[arg(long)]
    pub periods_per_year: Option<u32>,

    /// Rolling window in periods for VaR/CVaR
    #[arg(long)]
    pub window: Option<usize>,

    /// VaR/CVaR confidence level (e.g. 0.95)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Annual risk-free rate for the Sharpe ratio
    #[arg(long, allow_hyphen_values = true)]
    pub risk_free_rate: Option<f64>,

    /// Portfolio value for dollar VaR/CVaR
    #[arg(long)]
    pub notional: Option<Decimal>,
}

/// Arguments for the tail-risk command
#[derive(Args, Debug)]
pub struct TailRiskArgs {
    #[command(flatten)]
    pub common: AnalysisArgs,

    /// Bucket the rolling window sums into a histogram with this many bins
    #[arg(long)]
    pub bins: Option<usize>,
}

/// Arguments for the diversification command
#[derive(Args, Debug)]
pub struct DiversificationArgs {
    #[command(flatten)]
    pub common: AnalysisArgs,

    /// Score against the correlation matrix instead of the covariance matrix
    #[arg(long)]
    pub correlation: bool,
}

#[derive(Debug, Serialize)]
struct ReturnsOutput {
    #[serde(flatten)]
    stats: AnnualizedStats,
    series: PortfolioReturnSeries,
}

#[derive(Debug, Serialize)]
struct DrawdownOutput {
    #[serde(flatten)]
    analysis: DrawdownAnalysis,
    periods: usize,
}

#[derive(Debug, Serialize)]
struct TailRiskOutput {
    var: f64,
    cvar: f64,
    confidence_level: f64,
    window: usize,
    tail_observations: usize,
    rolling_windows: usize,
    worst_window: Option<f64>,
    best_window: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    histogram: Option<Histogram>,
}

#[derive(Debug, Serialize)]
struct DiversificationOutput {
    #[serde(flatten)]
    score: DiversificationScore,
    matrix: RiskMatrix,
}

/// Load the analysis input from `--prices` CSV, `--input` JSON, or stdin,
/// then layer the config file and individual flags on top.
pub fn load_input(args: &AnalysisArgs) -> Result<PortfolioAnalysisInput, Box<dyn std::error::Error>> {
    let weights = parse_weights(args)?;

    let mut analysis: PortfolioAnalysisInput = if let Some(ref path) = args.prices {
        let (prices, dropped) = input::prices::read_price_csv(path)?;
        if dropped > 0 {
            tracing::warn!(dropped, "dropped dates without a price for every asset");
        }
        let weights = weights
            .clone()
            .ok_or("--prices requires --weights or --weights-pct")?;
        PortfolioAnalysisInput {
            prices,
            weights,
            config: AnalysisConfig::default(),
            risk_free_rate: 0.0,
            notional: None,
        }
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide --prices with --weights, --input <file.json>, or pipe JSON via stdin".into());
    };

    if let Some(w) = weights {
        analysis.weights = w;
    }
    if let Some(ref path) = args.config {
        analysis.config = input::file::read_config(path)?;
    }
    apply_overrides(&mut analysis, args);

    if analysis.weights.len() < 2 {
        return Err("Portfolio analysis needs at least two assets; got a single-asset weight vector".into());
    }
    Ok(analysis)
}

fn apply_overrides(analysis: &mut PortfolioAnalysisInput, args: &AnalysisArgs) {
    let config = &mut analysis.config;
    if let Some(mode) = args.return_mode {
        config.return_mode = mode.into();
    }
    if let Some(p) = args.periods_per_year {
        config.periods_per_year = p;
    }
    if let Some(w) = args.window {
        config.rolling_window = w;
    }
    if let Some(c) = args.confidence {
        config.confidence_level = c;
    }
    if let Some(rf) = args.risk_free_rate {
        analysis.risk_free_rate = rf;
    }
    if let Some(n) = args.notional {
        analysis.notional = Some(n);
    }
}

fn parse_weights(args: &AnalysisArgs) -> Result<Option<WeightVector>, Box<dyn std::error::Error>> {
    if let Some(ref pairs) = args.weights {
        Ok(Some(WeightVector::new(parse_pairs(pairs)?)?))
    } else if let Some(ref pairs) = args.weights_pct {
        Ok(Some(WeightVector::from_percentages(parse_pairs(pairs)?)?))
    } else {
        Ok(None)
    }
}

/// Parse `ASSET=value` pairs.
fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, f64)>, Box<dyn std::error::Error>> {
    pairs
        .iter()
        .map(|pair| {
            let (asset, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Expected ASSET=WEIGHT, got '{}'", pair))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|e| format!("Bad weight for '{}': {}", asset.trim(), e))?;
            Ok((asset.trim().to_string(), value))
        })
        .collect()
}

struct Stages {
    analysis: PortfolioAnalysisInput,
    returns: ReturnMatrix,
    series: PortfolioReturnSeries,
}

fn build_stages(args: &AnalysisArgs) -> Result<Stages, Box<dyn std::error::Error>> {
    let analysis = load_input(args)?;
    analysis.config.validate()?;
    let returns = build_returns(&analysis.prices, analysis.config.return_mode)?;
    let series = aggregate_portfolio(&returns, &analysis.weights)?;
    Ok(Stages {
        analysis,
        returns,
        series,
    })
}

pub fn run_analyze(args: AnalysisArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis = load_input(&args)?;
    let result = analyze_portfolio(&analysis)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_returns(args: AnalysisArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stages = build_stages(&args)?;
    let stats = annualize(
        &stages.series,
        stages.analysis.config.periods_per_year,
        stages.analysis.risk_free_rate,
    )?;
    let output = ReturnsOutput {
        stats,
        series: stages.series,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_drawdown(args: AnalysisArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stages = build_stages(&args)?;
    let output = DrawdownOutput {
        analysis: analyze_drawdown(&stages.series),
        periods: stages.series.len(),
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_tail_risk(args: TailRiskArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stages = build_stages(&args.common)?;
    let config = stages.analysis.config;
    let estimate = estimate_tail_risk(&stages.series, config.rolling_window, config.confidence_level)?;

    let sums = estimate.rolling.values();
    let histogram = args.bins.map(|b| estimate.rolling.histogram(b)).transpose()?;
    let output = TailRiskOutput {
        var: estimate.var,
        cvar: estimate.cvar,
        confidence_level: estimate.confidence_level,
        window: estimate.window,
        tail_observations: estimate.tail_observations,
        rolling_windows: sums.len(),
        worst_window: sums.iter().copied().min_by(f64::total_cmp),
        best_window: sums.iter().copied().max_by(f64::total_cmp),
        histogram,
    };
    Ok(serde_json::to_value(output)?)
}

pub fn run_diversification(args: DiversificationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stages = build_stages(&args.common)?;
    let matrix = if args.correlation {
        RiskMatrix::correlation(&stages.returns)?
    } else {
        RiskMatrix::covariance(&stages.returns)?
    };
    let score = score_diversification(&stages.analysis.weights, &matrix)?;
    Ok(serde_json::to_value(DiversificationOutput { score, matrix })?)
}
