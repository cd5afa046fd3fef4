// ABOUTME: Dice rolling for parsed descriptors.
// ABOUTME: Provides plain, advantage, damage and healing rolls over an abstract RNG.

use crate::dice::{Amount, DiceDescriptor};
use crate::error::Result;
use std::fmt;

/// Trait for random number generation, allowing for testing with fixed values.
pub trait Rng {
    /// Generate a random number in the range [1, max].
    fn roll(&mut self, max: u32) -> u32;

    /// Generate a uniform float in [0, 1) for percentage checks.
    fn chance(&mut self) -> f64;
}

/// Default RNG using fastrand.
pub struct FastRng(fastrand::Rng);

impl FastRng {
    pub fn new() -> Self {
        Self(fastrand::Rng::new())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }
}

impl Default for FastRng {
    fn default() -> Self {
        Self::new()
    }
}

impl Rng for FastRng {
    fn roll(&mut self, max: u32) -> u32 {
        self.0.u32(1..=max)
    }

    fn chance(&mut self) -> f64 {
        self.0.f64()
    }
}

/// Result of rolling a dice descriptor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RollResult {
    /// Sum of all dice plus the modifier.
    pub total: i64,
    /// Each die in roll order.
    pub rolls: Vec<i64>,
    pub modifier: i64,
    /// Canonical notation that was rolled.
    pub notation: String,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dice = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}[{}] = {}", self.notation, dice, self.total)
    }
}

/// Roll every die in the descriptor and add its modifier.
pub fn roll(dice: &DiceDescriptor, rng: &mut impl Rng) -> RollResult {
    let rolls: Vec<i64> = (0..dice.count)
        .map(|_| i64::from(rng.roll(dice.sides)))
        .collect();
    let total = rolls.iter().sum::<i64>() + dice.modifier;

    tracing::debug!(notation = %dice, ?rolls, total, "rolled dice");

    RollResult {
        total,
        rolls,
        modifier: dice.modifier,
        notation: dice.to_string(),
    }
}

/// Roll the whole expression twice and keep the higher (or lower) total.
pub fn roll_with_advantage(dice: &DiceDescriptor, rng: &mut impl Rng, take_higher: bool) -> i64 {
    let first = roll(dice, rng).total;
    let second = roll(dice, rng).total;
    if take_higher {
        first.max(second)
    } else {
        first.min(second)
    }
}

/// Roll weapon damage with a flat bonus and optional critical multiplier.
///
/// Never returns less than 1.
pub fn roll_damage(
    dice: &DiceDescriptor,
    flat_bonus: i64,
    is_critical: bool,
    crit_multiplier: f64,
    rng: &mut impl Rng,
) -> i64 {
    let mut damage = roll(dice, rng).total + flat_bonus;
    if is_critical {
        damage = apply_multiplier(damage, crit_multiplier);
    }
    damage.max(1)
}

/// Roll a heal amount given as a literal ("20") or dice ("2d4+2"), plus a bonus.
///
/// Literals bypass the RNG entirely. There is no minimum.
pub fn roll_healing(input: &str, heal_bonus: i64, rng: &mut impl Rng) -> Result<i64> {
    let amount: Amount = input.parse()?;
    Ok(amount.roll(rng) + heal_bonus)
}

/// Multiply and floor, the way every percentage modifier in combat rounds.
pub(crate) fn apply_multiplier(value: i64, multiplier: f64) -> i64 {
    (value as f64 * multiplier).floor() as i64
}
