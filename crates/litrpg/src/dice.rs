// ABOUTME: Dice descriptor and amount types for "NdS+M" notation.
// ABOUTME: Handles canonical rendering and the serde boundary for dice strings.

use crate::error::{Error, Result};
use crate::parser;
use crate::roller::{self, Rng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A parsed dice expression: roll `count` dice with `sides` faces, add `modifier`.
///
/// Always holds `count >= 1` and `sides >= 1`; the parser rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceDescriptor {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl DiceDescriptor {
    /// Build a descriptor, validating the count and side bounds.
    pub fn new(count: u32, sides: u32, modifier: i64) -> Result<Self> {
        if count == 0 || sides == 0 {
            return Err(Error::InvalidNotation {
                notation: format!("{count}d{sides}"),
                reason: "dice count and sides must be at least 1".to_string(),
            });
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Smallest possible total.
    pub fn min_total(&self) -> i64 {
        i64::from(self.count) + self.modifier
    }

    /// Largest possible total.
    pub fn max_total(&self) -> i64 {
        i64::from(self.count) * i64::from(self.sides) + self.modifier
    }
}

/// Canonical notation: the modifier term is omitted when zero and always
/// carries an explicit sign otherwise.
impl fmt::Display for DiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

impl FromStr for DiceDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parser::parse(s)
    }
}

impl TryFrom<String> for DiceDescriptor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        parser::parse(&value)
    }
}

impl From<DiceDescriptor> for String {
    fn from(dice: DiceDescriptor) -> Self {
        dice.to_string()
    }
}

/// A quantity that is either a literal number or a dice roll.
///
/// Used for heal amounts, effect potency and content values such as a
/// potion's `"heal": "2d4+2"` or `"heal": 20`. Literal numbers always win:
/// `"20"` is exactly twenty, never a parse attempt as dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Flat(i64),
    Dice(DiceDescriptor),
}

impl Amount {
    /// Resolve to a number, rolling if this is a dice amount.
    pub fn roll(&self, rng: &mut impl Rng) -> i64 {
        match self {
            Amount::Flat(n) => *n,
            Amount::Dice(dice) => roller::roll(dice, rng).total,
        }
    }

    /// True for a literal zero, the "no payload" marker.
    pub fn is_zero(&self) -> bool {
        matches!(self, Amount::Flat(0))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Flat(0)
    }
}

impl From<i64> for Amount {
    fn from(n: i64) -> Self {
        Amount::Flat(n)
    }
}

impl From<DiceDescriptor> for Amount {
    fn from(dice: DiceDescriptor) -> Self {
        Amount::Dice(dice)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Flat(n) => write!(f, "{n}"),
            Amount::Dice(dice) => write!(f, "{dice}"),
        }
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().parse::<i64>() {
            Ok(n) => Ok(Amount::Flat(n)),
            Err(_) => parser::parse(s).map(Amount::Dice),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Amount::Flat(n) => serializer.serialize_i64(*n),
            Amount::Dice(dice) => serializer.collect_str(dice),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(Amount::Flat(n)),
            Raw::Float(x) => Ok(Amount::Flat(x.floor() as i64)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display_canonical() {
        let dice = DiceDescriptor::new(2, 6, 3).unwrap();
        assert_eq!(dice.to_string(), "2d6+3");
        let dice = DiceDescriptor::new(1, 20, -1).unwrap();
        assert_eq!(dice.to_string(), "1d20-1");
        let dice = DiceDescriptor::new(3, 8, 0).unwrap();
        assert_eq!(dice.to_string(), "3d8");
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(DiceDescriptor::new(0, 6, 0).is_err());
        assert!(DiceDescriptor::new(1, 0, 0).is_err());
    }

    #[test]
    fn test_bounds() {
        let dice: DiceDescriptor = "2d6+3".parse().unwrap();
        assert_eq!(dice.min_total(), 5);
        assert_eq!(dice.max_total(), 15);
    }

    #[test]
    fn test_serde_as_string() {
        let dice: DiceDescriptor = serde_json::from_str("\"d8-2\"").unwrap();
        assert_eq!(dice, DiceDescriptor::new(1, 8, -2).unwrap());
        assert_eq!(serde_json::to_string(&dice).unwrap(), "\"1d8-2\"");
        assert!(serde_json::from_str::<DiceDescriptor>("\"12\"").is_err());
    }

    #[test]
    fn test_amount_prefers_literal() {
        assert_eq!("20".parse::<Amount>().unwrap(), Amount::Flat(20));
        assert_eq!(" -4 ".parse::<Amount>().unwrap(), Amount::Flat(-4));
        assert_eq!(
            "2d4+2".parse::<Amount>().unwrap(),
            Amount::Dice(DiceDescriptor::new(2, 4, 2).unwrap())
        );
        assert!("lots".parse::<Amount>().is_err());
    }

    #[test]
    fn test_amount_serde() {
        let flat: Amount = serde_json::from_str("5").unwrap();
        assert_eq!(flat, Amount::Flat(5));
        let text: Amount = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(text, Amount::Flat(5));
        let dice: Amount = serde_json::from_str("\"1d4\"").unwrap();
        assert_eq!(serde_json::to_string(&dice).unwrap(), "\"1d4\"");
        assert_eq!(serde_json::to_string(&flat).unwrap(), "5");
    }

    proptest! {
        #[test]
        fn prop_render_parses_back(count in 1u32..100, sides in 1u32..1000, modifier in -500i64..500) {
            let d = DiceDescriptor { count, sides, modifier };
            let text = d.to_string();
            prop_assert_eq!(text.parse::<DiceDescriptor>().unwrap(), d);
            prop_assert_eq!(text.to_uppercase().replace('D', " D ").parse::<DiceDescriptor>().unwrap(), d);
        }
    }
}
