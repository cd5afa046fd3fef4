// ABOUTME: Core library for LitRPG dice rolling and combat resolution.
// ABOUTME: Parses XdY+Z notation, scales it by area, and resolves attacks, spells and status effects.

//! # LitRPG
//!
//! Dice rolling and combat rules for a text adventure.
//!
//! ## Quick Start
//!
//! ```
//! use litrpg::{roll, scale_for_area, simulate};
//!
//! // Roll dice
//! let result = roll("2d6+3").unwrap();
//! println!("{}", result);  // e.g., "2d6+3[4, 2] = 9"
//!
//! // Harder areas roll harder dice
//! assert_eq!(scale_for_area("2d6+3", 5, 3).unwrap(), "3d6+11");
//!
//! // Simulate probability distribution
//! let sim = simulate("2d6", 10000).unwrap();
//! println!("Mean: {:.2}", sim.mean);  // ~7.0
//! ```
//!
//! ## Supported Notation
//!
//! - Dice: `2d6`, `d20` (count defaults to 1), `1D8` (either case)
//! - Flat modifiers: `1d8+2`, `3d4-1`
//!
//! Everything else (bare numbers, `4d6kh3`, arithmetic) is rejected.
//!
//! ## Combat
//!
//! [`Engine`] owns one [`GameState`] and applies rules to it: attacks,
//! incoming damage, spells, skill checks, status effects, experience and
//! inventory. Each rule validates before it mutates, so an `Err` leaves the
//! state untouched.

pub mod area;
pub mod combat;
pub mod config;
pub mod content;
pub mod dice;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod inventory;
pub mod lexer;
pub mod parser;
pub mod progression;
pub mod roller;
pub mod sim;
pub mod state;

pub use area::{scale_for_area, AreaContext};
pub use combat::{AttackResult, CheckResult, DamageResult, EnemyAttackResult, SpellKind, SpellResult};
pub use config::GameConfig;
pub use content::Catalog;
pub use dice::{Amount, DiceDescriptor};
pub use effects::{ApplyResult, StatusEffectInstance, StatusEffects, TickReport};
pub use engine::Engine;
pub use error::{Error, Result};
pub use events::{EventLog, EventSink, GameEvent, SessionLog};
pub use progression::{create_character, RestKind};
pub use roller::{roll_damage, roll_healing, roll_with_advantage, FastRng, Rng, RollResult};
pub use sim::{simulate, simulate_seeded, SimResult};
pub use state::{Attribute, Character, GameState, Resource, StateStore};

/// Parse and roll dice notation in one step.
///
/// # Examples
///
/// ```
/// let result = litrpg::roll("2d6+5").unwrap();
/// println!("Total: {}", result.total);
/// println!("Notation: {}", result.notation);
/// ```
pub fn roll(notation: &str) -> Result<RollResult> {
    roll_with_rng(notation, &mut FastRng::new())
}

/// Parse and roll with a custom RNG.
///
/// Useful for testing or when you need reproducible results.
///
/// # Examples
///
/// ```
/// use litrpg::{roll_with_rng, FastRng};
///
/// let mut rng = FastRng::with_seed(42);
/// let result = roll_with_rng("2d6", &mut rng).unwrap();
/// ```
pub fn roll_with_rng(notation: &str, rng: &mut impl Rng) -> Result<RollResult> {
    let dice = parser::parse(notation)?;
    Ok(roller::roll(&dice, rng))
}

/// Parse dice notation without rolling.
///
/// # Examples
///
/// ```
/// let dice = litrpg::parse("d20-1").unwrap();
/// assert_eq!(dice.count, 1);
/// assert_eq!(dice.sides, 20);
/// assert_eq!(dice.modifier, -1);
/// assert_eq!(dice.to_string(), "1d20-1");
/// ```
pub fn parse(notation: &str) -> Result<DiceDescriptor> {
    parser::parse(notation)
}
