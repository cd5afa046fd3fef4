// ABOUTME: Python bindings for the litrpg dice core using PyO3.
// ABOUTME: Exposes rolling, parsing, area scaling and simulation to the narrative scripts.

use ::litrpg as core;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::BTreeMap;

fn value_error(e: core::Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Result of a dice roll.
#[pyclass]
#[derive(Clone)]
pub struct RollResult {
    #[pyo3(get)]
    pub total: i64,
    #[pyo3(get)]
    pub rolls: Vec<i64>,
    #[pyo3(get)]
    pub modifier: i64,
    #[pyo3(get)]
    pub notation: String,
    text: String,
}

#[pymethods]
impl RollResult {
    fn __repr__(&self) -> String {
        format!("RollResult({})", self.text)
    }

    fn __str__(&self) -> String {
        self.text.clone()
    }
}

impl From<core::RollResult> for RollResult {
    fn from(r: core::RollResult) -> Self {
        let text = r.to_string();
        Self {
            total: r.total,
            rolls: r.rolls,
            modifier: r.modifier,
            notation: r.notation,
            text,
        }
    }
}

/// A parsed dice descriptor.
#[pyclass]
#[derive(Clone)]
pub struct Dice {
    #[pyo3(get)]
    pub count: u32,
    #[pyo3(get)]
    pub sides: u32,
    #[pyo3(get)]
    pub modifier: i64,
}

#[pymethods]
impl Dice {
    fn min_total(&self) -> i64 {
        self.descriptor().min_total()
    }

    fn max_total(&self) -> i64 {
        self.descriptor().max_total()
    }

    fn __repr__(&self) -> String {
        format!("Dice({})", self.descriptor())
    }

    fn __str__(&self) -> String {
        self.descriptor().to_string()
    }
}

impl Dice {
    fn descriptor(&self) -> core::DiceDescriptor {
        core::DiceDescriptor {
            count: self.count,
            sides: self.sides,
            modifier: self.modifier,
        }
    }
}

/// Result of a Monte Carlo simulation.
#[pyclass]
#[derive(Clone)]
pub struct SimResult {
    #[pyo3(get)]
    pub distribution: BTreeMap<i64, usize>,
    #[pyo3(get)]
    pub min: i64,
    #[pyo3(get)]
    pub max: i64,
    #[pyo3(get)]
    pub mean: f64,
    #[pyo3(get)]
    pub std_dev: f64,
    #[pyo3(get)]
    pub n: usize,
}

#[pymethods]
impl SimResult {
    /// Get the mode (most common outcome).
    fn mode(&self) -> Option<i64> {
        self.distribution
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&value, _)| value)
    }

    /// Get probability of each outcome.
    fn probabilities(&self) -> BTreeMap<i64, f64> {
        self.distribution
            .iter()
            .map(|(&k, &v)| (k, v as f64 / self.n as f64))
            .collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "SimResult(n={}, mean={:.2}, std_dev={:.2}, min={}, max={})",
            self.n, self.mean, self.std_dev, self.min, self.max
        )
    }
}

/// Roll dice notation.
///
/// Args:
///     notation: Dice like "2d6+3" or "d20"
///     seed: Optional seed for a reproducible roll
///
/// Example:
///     >>> result = roll("2d6+3")
///     >>> print(result)
///     2d6+3[4, 2] = 9
#[pyfunction]
#[pyo3(signature = (notation, seed=None))]
fn roll(notation: &str, seed: Option<u64>) -> PyResult<RollResult> {
    let result = match seed {
        Some(seed) => core::roll_with_rng(notation, &mut core::FastRng::with_seed(seed)),
        None => core::roll(notation),
    };
    result.map(RollResult::from).map_err(value_error)
}

/// Parse dice notation without rolling.
///
/// Raises ValueError for anything that is not `[count]d<sides>[+/-modifier]`.
#[pyfunction]
fn parse(notation: &str) -> PyResult<Dice> {
    let dice = core::parse(notation).map_err(value_error)?;
    Ok(Dice {
        count: dice.count,
        sides: dice.sides,
        modifier: dice.modifier,
    })
}

/// Scale dice for an area level relative to the player's level.
///
/// Example:
///     >>> scale_for_area("2d6+3", 5, 3)
///     '3d6+11'
#[pyfunction]
fn scale_for_area(notation: &str, area_level: i64, player_level: i64) -> PyResult<String> {
    core::scale_for_area(notation, area_level, player_level).map_err(value_error)
}

/// Roll weapon damage with a flat bonus; a critical multiplies the total.
/// Never less than 1.
#[pyfunction]
#[pyo3(signature = (notation, bonus=0, critical=false, crit_multiplier=2.0))]
fn roll_damage(notation: &str, bonus: i64, critical: bool, crit_multiplier: f64) -> PyResult<i64> {
    let dice = core::parse(notation).map_err(value_error)?;
    Ok(core::roll_damage(
        &dice,
        bonus,
        critical,
        crit_multiplier,
        &mut core::FastRng::new(),
    ))
}

/// Roll a heal given as a literal ("20") or dice ("2d4+2").
#[pyfunction]
#[pyo3(signature = (amount, bonus=0))]
fn roll_healing(amount: &str, bonus: i64) -> PyResult<i64> {
    core::roll_healing(amount, bonus, &mut core::FastRng::new()).map_err(value_error)
}

/// Simulate rolling dice many times to get probability distribution.
///
/// Args:
///     notation: Dice like "2d6"
///     n: Number of trials to run (default: 10000)
///
/// Example:
///     >>> sim = simulate("2d6", n=100000)
///     >>> print(sim.mean)  # ~7.0
#[pyfunction]
#[pyo3(signature = (notation, n=10000))]
fn simulate(notation: &str, n: usize) -> PyResult<SimResult> {
    core::simulate(notation, n)
        .map(|r| SimResult {
            distribution: r.distribution,
            min: r.min,
            max: r.max,
            mean: r.mean,
            std_dev: r.std_dev,
            n: r.n,
        })
        .map_err(value_error)
}

/// Python module for litrpg.
#[pymodule]
fn litrpg(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(roll, m)?)?;
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    m.add_function(wrap_pyfunction!(scale_for_area, m)?)?;
    m.add_function(wrap_pyfunction!(roll_damage, m)?)?;
    m.add_function(wrap_pyfunction!(roll_healing, m)?)?;
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_class::<RollResult>()?;
    m.add_class::<Dice>()?;
    m.add_class::<SimResult>()?;
    Ok(())
}
