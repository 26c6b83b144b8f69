use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::PortfolioRiskError;
use crate::returns::PortfolioReturnSeries;
use crate::types::Rate;
use crate::PortfolioRiskResult;

fn default_target_return() -> Rate {
    0.06
}

fn default_num_samples() -> u32 {
    100_000
}

/// Parameters of the target-return bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapInput {
    /// Annual return to beat
    #[serde(default = "default_target_return")]
    pub target_return: Rate,
    #[serde(default = "default_num_samples")]
    pub num_samples: u32,
    /// Optional seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for BootstrapInput {
    fn default() -> Self {
        BootstrapInput {
            target_return: default_target_return(),
            num_samples: default_num_samples(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapOutput {
    pub target_return: Rate,
    pub num_samples: u32,
    /// Fraction of resampled annualised returns strictly above the target
    pub probability_above_target: f64,
    pub mean_sampled_return: Rate,
}

/// Estimate the probability of beating an annual target return by resampling
/// annualised period returns `r_t × P` with replacement.
pub fn bootstrap_target_probability(
    series: &PortfolioReturnSeries,
    periods_per_year: u32,
    input: &BootstrapInput,
) -> PortfolioRiskResult<BootstrapOutput> {
    if input.num_samples == 0 {
        return Err(PortfolioRiskError::invalid(
            "num_samples",
            "must be at least 1",
        ));
    }
    if series.is_empty() {
        return Err(PortfolioRiskError::InsufficientHistory {
            required: 1,
            available: 0,
        });
    }

    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let p = periods_per_year as f64;
    let values = series.values();
    let mut above = 0u64;
    let mut sum = 0.0;

    for _ in 0..input.num_samples {
        let sample = values[rng.gen_range(0..values.len())] * p;
        if sample > input.target_return {
            above += 1;
        }
        sum += sample;
    }

    let n = input.num_samples as f64;
    Ok(BootstrapOutput {
        target_return: input.target_return,
        num_samples: input.num_samples,
        probability_above_target: above as f64 / n,
        mean_sampled_return: sum / n,
    })
}
