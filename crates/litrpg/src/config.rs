// ABOUTME: Typed game configuration with built-in defaults.
// ABOUTME: Loads config.json, migrates legacy keys once, and deep-merges over the defaults.

use crate::area::AreaContext;
use crate::dice::Amount;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Duration used when an effect config names none.
pub const DEFAULT_EFFECT_DURATION: i64 = 5;

/// Complete configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub game_constants: GameConstants,
    pub status_effects: BTreeMap<String, EffectConfig>,
    pub area_scaling: BTreeMap<String, AreaConfig>,
    pub class_progression: BTreeMap<String, ClassConfig>,
    pub recovery: Recovery,
    /// Spell-id substring to status effect, checked in order.
    pub spell_effects: Vec<SpellEffectRule>,
    pub starting_area: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConstants {
    pub xp_base: i64,
    pub xp_multiplier: f64,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub dodge_chance: f64,
    /// Dodge chance granted per point of dexterity at character creation.
    pub dodge_modifier: f64,
    pub stamina_attack_cost: i64,
    pub stamina_dodge_cost: i64,
    pub sneak_attack_bonus_per_level: i64,
    /// Status effect that boosts damage while at or below half health.
    pub low_hp_effect: String,
    pub low_hp_damage_bonus: f64,
    pub default_spell_cost: i64,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            xp_base: 100,
            xp_multiplier: 1.5,
            crit_chance: 0.1,
            crit_multiplier: 2.0,
            dodge_chance: 0.1,
            dodge_modifier: 0.01,
            stamina_attack_cost: 10,
            stamina_dodge_cost: 5,
            sneak_attack_bonus_per_level: 3,
            low_hp_effect: "bloodlust".to_string(),
            low_hp_damage_bonus: 0.1,
            default_spell_cost: 10,
        }
    }
}

/// Defaults and per-turn behaviour of a named status effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Turns the effect lasts; older configs call this `duration_base`.
    pub duration: Option<i64>,
    pub damage_per_turn: Option<Amount>,
    pub heal_per_turn: Option<Amount>,
    /// Passive effects never tick down.
    pub passive: bool,
    pub skill_bonus: i64,
    pub armor_bonus: i64,
    pub armor_penalty: i64,
    pub damage_bonus: i64,
    pub description: String,
}

impl EffectConfig {
    pub fn default_duration(&self) -> i64 {
        self.duration.unwrap_or(DEFAULT_EFFECT_DURATION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    pub level: i64,
    pub enemy_modifier: f64,
    pub xp_modifier: f64,
    pub description: String,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            level: 1,
            enemy_modifier: 1.0,
            xp_modifier: 1.0,
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    pub hp_per_level: i64,
    pub mp_per_level: i64,
    pub stamina_per_level: i64,
    pub primary_stats: Vec<String>,
    /// Whether sneak attacks earn the per-level bonus.
    pub sneak_attack: bool,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            hp_per_level: 10,
            mp_per_level: 5,
            stamina_per_level: 5,
            primary_stats: vec!["strength".to_string(), "constitution".to_string()],
            sneak_attack: false,
        }
    }
}

/// Fractions of each maximum restored by a rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestRates {
    pub hp: f64,
    pub mp: f64,
    pub stamina: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recovery {
    pub short_rest: RestRates,
    pub long_rest: RestRates,
    /// Effects removed by a long rest.
    pub long_rest_cures: Vec<String>,
}

impl Default for Recovery {
    fn default() -> Self {
        Self {
            short_rest: RestRates {
                hp: 0.3,
                mp: 0.5,
                stamina: 1.0,
            },
            long_rest: RestRates {
                hp: 1.0,
                mp: 1.0,
                stamina: 1.0,
            },
            long_rest_cures: ["poisoned", "burning", "frozen"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellEffectRule {
    /// Case-insensitive substring of the spell id.
    pub pattern: String,
    pub effect: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        let effect = |duration: Option<i64>| EffectConfig {
            duration,
            ..EffectConfig::default()
        };

        let status_effects = BTreeMap::from([
            (
                "poisoned".to_string(),
                EffectConfig {
                    damage_per_turn: Some(Amount::Flat(5)),
                    ..effect(Some(3))
                },
            ),
            (
                "burning".to_string(),
                EffectConfig {
                    damage_per_turn: Some(Amount::Flat(8)),
                    ..effect(Some(2))
                },
            ),
            ("frozen".to_string(), effect(Some(2))),
            (
                "blessed".to_string(),
                EffectConfig {
                    skill_bonus: 2,
                    ..effect(Some(5))
                },
            ),
            (
                "shield_spell".to_string(),
                EffectConfig {
                    armor_bonus: 3,
                    ..effect(Some(3))
                },
            ),
            (
                "rage".to_string(),
                EffectConfig {
                    damage_bonus: 5,
                    armor_penalty: 2,
                    ..effect(Some(3))
                },
            ),
            (
                "bloodlust".to_string(),
                EffectConfig {
                    passive: true,
                    description: "Deal more damage when badly hurt".to_string(),
                    ..effect(Some(0))
                },
            ),
        ]);

        let class = |hp, mp, stamina, primary: [&str; 2], sneak_attack| ClassConfig {
            hp_per_level: hp,
            mp_per_level: mp,
            stamina_per_level: stamina,
            primary_stats: primary.map(String::from).to_vec(),
            sneak_attack,
        };

        let class_progression = BTreeMap::from([
            (
                "berserker".to_string(),
                class(15, 2, 10, ["strength", "constitution"], false),
            ),
            (
                "warrior".to_string(),
                class(12, 3, 8, ["strength", "constitution"], false),
            ),
            (
                "mage".to_string(),
                class(6, 12, 4, ["intelligence", "wisdom"], false),
            ),
            (
                "rogue".to_string(),
                class(8, 5, 10, ["dexterity", "charisma"], true),
            ),
            ("custom".to_string(), ClassConfig::default()),
        ]);

        let area_scaling = BTreeMap::from([(
            "tutorial_village".to_string(),
            AreaConfig {
                description: "A quiet village where every adventure begins".to_string(),
                ..AreaConfig::default()
            },
        )]);

        let spell_effects = [("shield", "shield_spell"), ("bless", "blessed")]
            .map(|(pattern, effect)| SpellEffectRule {
                pattern: pattern.to_string(),
                effect: effect.to_string(),
            })
            .to_vec();

        Self {
            game_constants: GameConstants::default(),
            status_effects,
            area_scaling,
            class_progression,
            recovery: Recovery::default(),
            spell_effects,
            starting_area: "tutorial_village".to_string(),
        }
    }
}

impl GameConfig {
    /// Load a config file, falling back to the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse config JSON and merge it over the defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut loaded: Value = serde_json::from_str(text)?;
        migrate_legacy_keys(&mut loaded);

        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge(&mut merged, loaded);
        Ok(serde_json::from_value(merged)?)
    }

    pub fn effect(&self, name: &str) -> Option<&EffectConfig> {
        self.status_effects.get(name)
    }

    /// Class progression for a class name, falling back to `custom`.
    pub fn class(&self, class_name: &str) -> ClassConfig {
        let key = class_name.to_lowercase();
        self.class_progression
            .get(&key)
            .or_else(|| self.class_progression.get("custom"))
            .cloned()
            .unwrap_or_default()
    }

    /// Area settings, with level-1 neutral defaults for unlisted areas.
    pub fn area(&self, area_name: &str) -> AreaConfig {
        self.area_scaling
            .get(area_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn area_context(&self, area_name: &str, player_level: i64) -> AreaContext {
        let area = self.area(area_name);
        AreaContext {
            area_level: area.level,
            player_level,
            enemy_modifier: area.enemy_modifier,
            xp_modifier: area.xp_modifier,
        }
    }

    /// First status effect whose pattern occurs in the spell id.
    pub fn spell_effect(&self, spell_id: &str) -> Option<&str> {
        let id = spell_id.to_lowercase();
        self.spell_effects
            .iter()
            .find(|rule| id.contains(&rule.pattern.to_lowercase()))
            .map(|rule| rule.effect.as_str())
    }
}

/// Rename `duration_base` to `duration` in every status effect entry.
fn migrate_legacy_keys(config: &mut Value) {
    let Some(effects) = config
        .get_mut("status_effects")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    for (name, effect) in effects.iter_mut() {
        let Some(fields) = effect.as_object_mut() else {
            continue;
        };
        if let Some(legacy) = fields.remove("duration_base") {
            if !fields.contains_key("duration") {
                tracing::debug!(effect = %name, "migrating duration_base to duration");
                fields.insert("duration".to_string(), legacy);
            }
        }
    }
}

/// Objects merge key by key; any other value replaces the base.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
