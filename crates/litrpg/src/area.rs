// ABOUTME: Area-based difficulty scaling for enemy dice.
// ABOUTME: Grows dice and flat bonus with area level, corrected for player level.

use crate::dice::DiceDescriptor;
use crate::error::Result;
use crate::parser;
use serde::Serialize;

/// Levels above baseline per extra die.
const LEVELS_PER_DIE: i64 = 3;
/// Flat bonus added per level above baseline.
const MODIFIER_PER_LEVEL: i64 = 2;
/// Level gap beyond which the player-relative correction kicks in.
const LEVEL_GAP_TOLERANCE: i64 = 2;

/// Difficulty context of the area the character is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaContext {
    pub area_level: i64,
    pub player_level: i64,
    pub enemy_modifier: f64,
    pub xp_modifier: f64,
}

impl AreaContext {
    /// Whether enemy attacks in this area should be scaled at all.
    pub fn scales_enemies(&self) -> bool {
        self.enemy_modifier > 1.0
    }

    pub fn scale(&self, dice: &DiceDescriptor) -> DiceDescriptor {
        scale(dice, self.area_level, self.player_level)
    }
}

/// Scale a descriptor for an area, relative to the player's level.
///
/// Every three levels above 1 adds a die and every level adds +2. An area
/// more than two levels above the player adds the gap to the modifier again;
/// a player more than two levels above the area loses one die (never below
/// one) but keeps the modifier.
pub fn scale(dice: &DiceDescriptor, area_level: i64, player_level: i64) -> DiceDescriptor {
    let level_diff = (area_level - 1).max(0);

    let mut count = i64::from(dice.count) + level_diff / LEVELS_PER_DIE;
    let mut modifier = dice.modifier + level_diff * MODIFIER_PER_LEVEL;

    let player_diff = area_level - player_level;
    if player_diff > LEVEL_GAP_TOLERANCE {
        modifier += player_diff;
    } else if player_diff < -LEVEL_GAP_TOLERANCE {
        count = (count - 1).max(1);
    }

    DiceDescriptor {
        count: u32::try_from(count).unwrap_or(u32::MAX),
        sides: dice.sides,
        modifier,
    }
}

/// Text-in, text-out form of [`scale`], rendering canonical notation.
pub fn scale_for_area(notation: &str, area_level: i64, player_level: i64) -> Result<String> {
    let dice = parser::parse(notation)?;
    Ok(scale(&dice, area_level, player_level).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_unchanged() {
        assert_eq!(scale_for_area("2d6+3", 1, 1).unwrap(), "2d6+3");
        assert_eq!(scale_for_area("d8", 1, 1).unwrap(), "1d8");
    }

    #[test]
    fn test_higher_area() {
        // diff 4: +1 die, +8 modifier; player gap of 2 is tolerated
        assert_eq!(scale_for_area("2d6+3", 5, 3).unwrap(), "3d6+11");
    }

    #[test]
    fn test_underleveled_player_punished() {
        // diff 6: +2 dice, +12; player gap 5 added again
        assert_eq!(scale_for_area("1d8", 7, 2).unwrap(), "3d8+17");
    }

    #[test]
    fn test_overleveled_player_loses_a_die() {
        assert_eq!(scale_for_area("3d6+3", 1, 5).unwrap(), "2d6+3");
        assert_eq!(scale_for_area("1d6", 1, 10).unwrap(), "1d6");
    }

    #[test]
    fn test_zero_or_negative_area_level() {
        assert_eq!(scale_for_area("2d4-1", 0, 1).unwrap(), "2d4-1");
    }

    #[test]
    fn test_negative_modifier_can_cross_zero() {
        assert_eq!(scale_for_area("1d4-2", 2, 2).unwrap(), "1d4");
    }

    #[test]
    fn test_invalid_notation() {
        assert!(scale_for_area("12", 3, 1).is_err());
    }

    #[test]
    fn test_context_scales_only_with_enemy_modifier() {
        let ctx = AreaContext {
            area_level: 4,
            player_level: 4,
            enemy_modifier: 1.0,
            xp_modifier: 1.0,
        };
        assert!(!ctx.scales_enemies());
        let ctx = AreaContext {
            enemy_modifier: 1.5,
            ..ctx
        };
        assert!(ctx.scales_enemies());
        assert_eq!(ctx.scale(&"1d6".parse().unwrap()).to_string(), "2d6+6");
    }
}
