use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use portfolio_risk_core::analytics::{
    annualize, analyze_drawdown, returns_from_wealth, wealth_index, MatrixKind, RiskMatrix,
};
use portfolio_risk_core::returns::{aggregate_portfolio, build_returns, PortfolioReturnSeries};
use portfolio_risk_core::{
    run_pipeline, AnalysisConfig, PortfolioAnalysisInput, PortfolioRiskError, PriceMatrix,
    ReturnMode, WeightVector,
};

// ===========================================================================
// Fixtures
// ===========================================================================

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2019, 1, 2).unwrap();
    (0..n as u64).map(|i| start + Days::new(i)).collect()
}

/// Prices that reproduce the given log returns exactly (up to rounding).
fn prices_from_log_returns(returns: &[f64]) -> Vec<f64> {
    let mut p = 100.0;
    let mut out = vec![p];
    for r in returns {
        p *= r.exp();
        out.push(p);
    }
    out
}

/// Three assets over `n` days with deterministic, mildly correlated moves.
fn three_asset_input(n: usize) -> PortfolioAnalysisInput {
    let rows = (0..n)
        .map(|i| {
            let t = i as f64;
            vec![
                100.0 * (1.0 + 0.0004 * t) + 4.0 * (t / 9.0).sin(),
                40.0 * (1.0 + 0.0002 * t) + 1.5 * (t / 5.0).cos(),
                75.0 + 0.01 * t + 2.5 * (t / 13.0).sin() * (t / 3.0).cos(),
            ]
        })
        .collect();
    PortfolioAnalysisInput {
        prices: PriceMatrix::new(
            dates(n),
            vec!["SPY".into(), "TLT".into(), "GLD".into()],
            rows,
        )
        .unwrap(),
        weights: WeightVector::new([("SPY", 0.5), ("TLT", 0.3), ("GLD", 0.2)]).unwrap(),
        config: AnalysisConfig::trading_days().with_rolling_window(60),
        risk_free_rate: 0.045,
        notional: Some(dec!(250000)),
    }
}

// ===========================================================================
// Scenario: identical assets, equal weights
// ===========================================================================

#[test]
fn test_identical_assets_series_equals_inputs() {
    let r = [0.01, -0.02, 0.015, -0.005];
    let p = prices_from_log_returns(&r);
    let rows = p.iter().map(|&x| vec![x, x]).collect();
    let prices = PriceMatrix::new(dates(5), vec!["A".into(), "B".into()], rows).unwrap();
    let weights = WeightVector::new([("A", 0.5), ("B", 0.5)]).unwrap();

    let returns = build_returns(&prices, ReturnMode::Log).unwrap();
    let series = aggregate_portfolio(&returns, &weights).unwrap();

    assert_eq!(series.len(), 4);
    for (got, want) in series.values().iter().zip(r.iter()) {
        assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
    }

    let stats = annualize(&series, 252, 0.0).unwrap();
    let mean = r.iter().sum::<f64>() / 4.0;
    let var = r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 3.0;
    let expected_return = (mean * 252.0).exp() - 1.0;
    let expected_vol = var.sqrt() * 252f64.sqrt();

    assert!((stats.annualized_return - expected_return).abs() < 1e-9);
    assert!((stats.annualized_volatility - expected_vol).abs() < 1e-9);
}

#[test]
fn test_identical_assets_full_pipeline_has_no_diversification() {
    let r = [0.01, -0.02, 0.015, -0.005];
    let p = prices_from_log_returns(&r);
    let rows = p.iter().map(|&x| vec![x, x]).collect();
    let input = PortfolioAnalysisInput {
        prices: PriceMatrix::new(dates(5), vec!["A".into(), "B".into()], rows).unwrap(),
        weights: WeightVector::new([("A", 0.5), ("B", 0.5)]).unwrap(),
        config: AnalysisConfig::trading_days().with_rolling_window(2),
        risk_free_rate: 0.0,
        notional: None,
    };
    let report = run_pipeline(&input).unwrap();
    assert!((report.diversification_ratio - 1.0).abs() < 1e-9);
    assert_eq!(report.rolling_returns().len(), 3);
}

// ===========================================================================
// Boundaries
// ===========================================================================

#[test]
fn test_single_asset_diversification_is_one_hundred_percent() {
    let rows = (0..40)
        .map(|i| vec![100.0 + (i as f64 / 3.0).sin() * 5.0 + i as f64])
        .collect();
    let input = PortfolioAnalysisInput {
        prices: PriceMatrix::new(dates(40), vec!["ONLY".into()], rows).unwrap(),
        weights: WeightVector::new([("ONLY", 1.0)]).unwrap(),
        config: AnalysisConfig::trading_days().with_rolling_window(10),
        risk_free_rate: 0.02,
        notional: None,
    };
    let report = run_pipeline(&input).unwrap();
    assert!((report.diversification_ratio - 1.0).abs() < 1e-12);
    assert!((report.diversification_percentage - 100.0).abs() < 1e-9);
}

#[test]
fn test_constant_price_asset_still_scores_diversification() {
    let rows = (0..60)
        .map(|i| {
            let t = i as f64;
            vec![100.0 + 0.3 * t + 2.0 * (t / 4.0).sin(), 1.0]
        })
        .collect();
    let input = PortfolioAnalysisInput {
        prices: PriceMatrix::new(dates(60), vec!["EQ".into(), "CASH".into()], rows).unwrap(),
        weights: WeightVector::new([("EQ", 0.7), ("CASH", 0.3)]).unwrap(),
        config: AnalysisConfig::trading_days().with_rolling_window(10),
        risk_free_rate: 0.0,
        notional: None,
    };
    let report = run_pipeline(&input).unwrap();
    assert!(report.diversification_ratio.is_finite());
    assert!((report.diversification_ratio - 1.0).abs() < 1e-9);
    assert!(report.diversification.concentration.weighted_correlation.is_none());
    assert!(report.diversification.concentration.score.is_none());
}

#[test]
fn test_strictly_increasing_series_has_zero_drawdown() {
    let values = vec![0.001, 0.002, 0.0005, 0.003, 0.0001, 0.004];
    for mode in [ReturnMode::Log, ReturnMode::Arithmetic] {
        let series = PortfolioReturnSeries::new(mode, dates(6), values.clone()).unwrap();
        assert_eq!(analyze_drawdown(&series).max_drawdown, 0.0);
    }
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn test_wealth_round_trip_recovers_series() {
    let report = run_pipeline(&three_asset_input(300)).unwrap();
    let series = &report.portfolio_returns;
    let recovered = returns_from_wealth(series.mode(), &wealth_index(series));
    for (a, b) in series.values().iter().zip(recovered.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_pipeline_is_idempotent() {
    let input = three_asset_input(300);
    let first = run_pipeline(&input).unwrap();
    let second = run_pipeline(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_weight_order_does_not_matter() {
    let input = three_asset_input(200);
    let mut reordered = input.clone();
    reordered.weights = WeightVector::new([("GLD", 0.2), ("TLT", 0.3), ("SPY", 0.5)]).unwrap();
    let a = run_pipeline(&input).unwrap();
    let b = run_pipeline(&reordered).unwrap();
    assert_eq!(a.portfolio_returns, b.portfolio_returns);
    assert_eq!(a.var, b.var);
}

#[test]
fn test_report_invariants() {
    let report = run_pipeline(&three_asset_input(400)).unwrap();
    assert!(report.max_drawdown <= 0.0);
    assert!(report.cvar >= report.var);
    assert!(report.annualized_volatility > 0.0);
    assert!(report.diversification_ratio >= 1.0 - 1e-12);
    assert!(report.diversification_ratio <= report.diversification.max_ratio + 1e-12);
    assert_eq!(report.rolling_returns().len(), 399 - 60 + 1);
    assert_eq!(report.asset_breakdown.assets.len(), 3);
    let sharpe = (report.annualized_return - 0.045) / report.annualized_volatility;
    assert!((report.sharpe_ratio - sharpe).abs() < 1e-12);
}

// ===========================================================================
// Failure scenarios
// ===========================================================================

#[test]
fn test_overweight_vector_rejected_before_aggregation() {
    let err = WeightVector::new([("A", 0.6), ("B", 0.5)]).unwrap_err();
    assert!(matches!(err, PortfolioRiskError::InvalidInput { .. }));
}

#[test]
fn test_window_longer_than_history() {
    let mut input = three_asset_input(101);
    input.config = AnalysisConfig::calendar_days();
    let err = run_pipeline(&input).unwrap_err();
    assert!(matches!(
        err,
        PortfolioRiskError::InsufficientHistory {
            required: 366,
            available: 100
        }
    ));
}

#[test]
fn test_misaligned_weights_fail() {
    let mut input = three_asset_input(100);
    input.weights = WeightVector::new([("SPY", 0.5), ("TLT", 0.5)]).unwrap();
    let err = run_pipeline(&input).unwrap_err();
    assert!(matches!(err, PortfolioRiskError::DimensionMismatch { .. }));
}

#[test]
fn test_single_price_row_is_invalid() {
    let prices = PriceMatrix::new(dates(1), vec!["A".into()], vec![vec![10.0]]).unwrap();
    let err = build_returns(&prices, ReturnMode::Arithmetic).unwrap_err();
    assert!(matches!(err, PortfolioRiskError::InvalidInput { .. }));
}

// ===========================================================================
// Serialization
// ===========================================================================

#[test]
fn test_input_from_json() {
    let json = r#"{
        "prices": {
            "dates": ["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"],
            "assets": ["A", "B"],
            "prices": [[10.0, 20.0], [10.5, 19.5], [10.2, 20.4], [10.8, 20.1]]
        },
        "weights": {"A": 0.7, "B": 0.3},
        "config": {"return_mode": "arithmetic", "rolling_window": 2},
        "risk_free_rate": 0.01,
        "notional": "10000"
    }"#;
    let input: PortfolioAnalysisInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.config.return_mode, ReturnMode::Arithmetic);
    assert_eq!(input.config.periods_per_year, 252);
    let report = run_pipeline(&input).unwrap();
    assert_eq!(report.portfolio_returns.len(), 3);
    assert!(report.dollar_exposure.is_some());
}

#[test]
fn test_correlation_and_covariance_matrices_agree_on_ordering() {
    let input = three_asset_input(120);
    let returns = build_returns(&input.prices, ReturnMode::Log).unwrap();
    let cov = RiskMatrix::covariance(&returns).unwrap();
    let corr = RiskMatrix::correlation(&returns).unwrap();
    assert_eq!(corr.kind, MatrixKind::Correlation);
    assert_eq!(cov.assets, corr.assets);
    for i in 0..3 {
        assert_eq!(corr.values[i][i], 1.0);
    }
}
