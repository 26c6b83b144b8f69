use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use portfolio_risk_core::analytics::bootstrap::{bootstrap_target_probability, BootstrapInput};
use portfolio_risk_core::analytics::{
    analyze_drawdown, annualize, estimate_tail_risk, score_diversification, RiskMatrix,
};
use portfolio_risk_core::returns::{aggregate_portfolio, build_returns, PortfolioReturnSeries, ReturnMatrix};
use portfolio_risk_core::PortfolioAnalysisInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_input(input_json: &str) -> NapiResult<PortfolioAnalysisInput> {
    let input: PortfolioAnalysisInput = serde_json::from_str(input_json).map_err(to_napi_error)?;
    input.config.validate().map_err(to_napi_error)?;
    Ok(input)
}

fn portfolio_series(
    input: &PortfolioAnalysisInput,
) -> NapiResult<(ReturnMatrix, PortfolioReturnSeries)> {
    let returns = build_returns(&input.prices, input.config.return_mode).map_err(to_napi_error)?;
    let series = aggregate_portfolio(&returns, &input.weights).map_err(to_napi_error)?;
    Ok((returns, series))
}

// ---------------------------------------------------------------------------
// Full report
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_portfolio(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let output = portfolio_risk_core::analyze_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Individual stages
// ---------------------------------------------------------------------------

#[napi]
pub fn portfolio_returns(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let (_, series) = portfolio_series(&input)?;
    let stats = annualize(&series, input.config.periods_per_year, input.risk_free_rate)
        .map_err(to_napi_error)?;
    let output = serde_json::json!({ "stats": stats, "series": series });
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn drawdown(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let (_, series) = portfolio_series(&input)?;
    serde_json::to_string(&analyze_drawdown(&series)).map_err(to_napi_error)
}

#[napi]
pub fn tail_risk(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let (_, series) = portfolio_series(&input)?;
    let output = estimate_tail_risk(
        &series,
        input.config.rolling_window,
        input.config.confidence_level,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn diversification(input_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let (returns, _) = portfolio_series(&input)?;
    let matrix = RiskMatrix::covariance(&returns).map_err(to_napi_error)?;
    let output = score_diversification(&input.weights, &matrix).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BootstrapRequest {
    input: PortfolioAnalysisInput,
    #[serde(default)]
    bootstrap: BootstrapInput,
}

#[napi]
pub fn bootstrap_target_return(request_json: String) -> NapiResult<String> {
    let request: BootstrapRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    request.input.config.validate().map_err(to_napi_error)?;
    let (_, series) = portfolio_series(&request.input)?;
    let output = bootstrap_target_probability(
        &series,
        request.input.config.periods_per_year,
        &request.bootstrap,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
