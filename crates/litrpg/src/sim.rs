// ABOUTME: Monte Carlo simulation for dice notation.
// ABOUTME: Runs many trials to compute probability distributions and statistics.

use crate::dice::DiceDescriptor;
use crate::error::Result;
use crate::parser;
use crate::roller::{roll, FastRng, Rng};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of a Monte Carlo simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimResult {
    /// Distribution of outcomes: value -> count.
    pub distribution: BTreeMap<i64, usize>,
    /// Minimum value observed.
    pub min: i64,
    /// Maximum value observed.
    pub max: i64,
    /// Mean (average) value.
    pub mean: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// Number of trials run.
    pub n: usize,
}

impl SimResult {
    /// Returns the probability of each outcome.
    pub fn probabilities(&self) -> BTreeMap<i64, f64> {
        self.distribution
            .iter()
            .map(|(&k, &v)| (k, v as f64 / self.n as f64))
            .collect()
    }

    /// Returns the mode (most common outcome).
    pub fn mode(&self) -> Option<i64> {
        self.distribution
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&value, _)| value)
    }
}

/// Run a Monte Carlo simulation on dice notation.
pub fn simulate(notation: &str, n: usize) -> Result<SimResult> {
    let dice = parser::parse(notation)?;
    Ok(simulate_with_rng(&dice, n, &mut FastRng::new()))
}

/// Run a simulation with a seeded RNG for reproducibility.
pub fn simulate_seeded(notation: &str, n: usize, seed: u64) -> Result<SimResult> {
    let dice = parser::parse(notation)?;
    Ok(simulate_with_rng(&dice, n, &mut FastRng::with_seed(seed)))
}

/// Run a simulation of an already parsed descriptor.
pub fn simulate_with_rng(dice: &DiceDescriptor, n: usize, rng: &mut impl Rng) -> SimResult {
    let mut distribution: BTreeMap<i64, usize> = BTreeMap::new();
    let mut sum: i128 = 0;
    let mut sum_sq: i128 = 0;
    let mut min = i64::MAX;
    let mut max = i64::MIN;

    for _ in 0..n {
        let total = roll(dice, rng).total;

        *distribution.entry(total).or_insert(0) += 1;
        sum += i128::from(total);
        sum_sq += i128::from(total) * i128::from(total);
        min = min.min(total);
        max = max.max(total);
    }

    if n == 0 {
        return SimResult {
            distribution,
            min: 0,
            max: 0,
            mean: 0.0,
            std_dev: 0.0,
            n,
        };
    }

    let trials = n as i128;
    let mean = sum as f64 / n as f64;
    let variance = (trials * sum_sq - sum * sum) as f64 / (trials * trials) as f64;
    let std_dev = variance.max(0.0).sqrt();

    SimResult {
        distribution,
        min,
        max,
        mean,
        std_dev,
        n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_basic() {
        let result = simulate("1d6", 1000).unwrap();

        assert!(result.min >= 1);
        assert!(result.max <= 6);
        assert_eq!(result.n, 1000);
        assert!((result.mean - 3.5).abs() < 0.5);
    }

    #[test]
    fn test_simulate_single_sided() {
        let result = simulate("3d1+2", 100).unwrap();

        assert_eq!(result.min, 5);
        assert_eq!(result.max, 5);
        assert_eq!(result.mean, 5.0);
        assert_eq!(result.std_dev, 0.0);
        assert_eq!(result.distribution[&5], 100);
        assert_eq!(result.mode(), Some(5));
        assert_eq!(result.probabilities()[&5], 1.0);
    }

    #[test]
    fn test_simulate_seeded_reproducible() {
        let first = simulate_seeded("2d6", 1000, 42).unwrap();
        let second = simulate_seeded("2d6", 1000, 42).unwrap();

        assert_eq!(first.distribution, second.distribution);
        assert_eq!(first.mean, second.mean);
    }

    #[test]
    fn test_simulate_zero_trials() {
        let result = simulate("2d6", 0).unwrap();
        assert_eq!(result.n, 0);
        assert!(result.distribution.is_empty());
    }

    #[test]
    fn test_simulate_huge_dice() {
        let result = simulate_seeded("100d1000000", 10000, 1).unwrap();

        assert!(result.min >= 100 && result.max <= 100_000_000);
        assert!((result.mean - 50_000_050.0).abs() < 500_000.0);
        assert!(result.std_dev.is_finite());
        // 1e6 * sqrt(100 / 12) is roughly 2.89e6
        assert!((2.5e6..3.3e6).contains(&result.std_dev));
    }

    #[test]
    fn test_simulate_rejects_bad_notation() {
        assert!(simulate("2x6", 10).is_err());
    }
}
