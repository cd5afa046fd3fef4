// ABOUTME: Character creation, recovery, experience, areas, gold, flags and status.
// ABOUTME: Everything that moves a character forward between fights.

use crate::area;
use crate::config::{GameConfig, RestRates};
use crate::dice::DiceDescriptor;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{EventSink, GameEvent};
use crate::roller::{self, apply_multiplier, Rng};
use crate::state::{Attribute, Character, Equipment, GameState, Resource, Slot};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Starting resource pools are this many levels' worth of class gains.
const STARTING_POOL_LEVELS: i64 = 10;
const BASE_ATTRIBUTE: i64 = 10;
const PRIMARY_STAT_BONUS: i64 = 6;
const STARTING_GOLD: i64 = 50;
const SKILL_POINTS_PER_LEVEL: i64 = 1;
const STAT_POINTS_PER_LEVEL: i64 = 2;
/// Extra monster XP per area level above 1.
const MONSTER_XP_PER_AREA_LEVEL: f64 = 0.5;
/// Area levels per point of bonus monster armor.
const AREA_LEVELS_PER_ARMOR: i64 = 3;

/// Build a fresh level-1 character of the given class.
///
/// Unknown classes use the `custom` progression.
pub fn create_character(config: &GameConfig, name: &str, class_name: &str) -> GameState {
    let class = config.class(class_name);
    let constants = &config.game_constants;

    let mut character = Character {
        name: name.to_string(),
        class: class_name.to_string(),
        level: 1,
        xp: 0,
        xp_next: constants.xp_base,
        hp: 0,
        hp_max: class.hp_per_level * STARTING_POOL_LEVELS,
        mp: 0,
        mp_max: class.mp_per_level * STARTING_POOL_LEVELS,
        stamina: 0,
        stamina_max: class.stamina_per_level * STARTING_POOL_LEVELS,
        strength: BASE_ATTRIBUTE,
        dexterity: BASE_ATTRIBUTE,
        intelligence: BASE_ATTRIBUTE,
        constitution: BASE_ATTRIBUTE,
        wisdom: BASE_ATTRIBUTE,
        charisma: BASE_ATTRIBUTE,
        damage_bonus: 0,
        armor: 0,
        crit_chance: constants.crit_chance,
        dodge_chance: 0.0,
        gold: STARTING_GOLD,
        inventory: Vec::new(),
        equipment: Equipment::default(),
        skill_points: 0,
        stat_points: 0,
    };
    character.hp = character.hp_max;
    character.mp = character.mp_max;
    character.stamina = character.stamina_max;

    for stat in &class.primary_stats {
        match stat.parse::<Attribute>() {
            Ok(attribute) => *character.attribute_mut(attribute) += PRIMARY_STAT_BONUS,
            Err(_) => tracing::warn!(class = class_name, stat = %stat, "ignoring unknown primary stat"),
        }
    }
    character.damage_bonus = character.strength / 3;
    character.dodge_chance = character.dexterity as f64 * constants.dodge_modifier;

    tracing::info!(name, class = class_name, "created character");
    GameState::new(character, config.starting_area.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestKind {
    Short,
    Long,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealResult {
    pub resource: Resource,
    pub healed: i64,
    pub current: i64,
    pub max: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestResult {
    pub hp_recovered: i64,
    pub mp_recovered: i64,
    pub stamina_recovered: i64,
    pub current_hp: i64,
    pub current_mp: i64,
    pub current_stamina: i64,
    pub status_effects_cleared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XpResult {
    pub xp_gained: i64,
    pub current_xp: i64,
    pub xp_to_next: i64,
    pub leveled_up: bool,
    pub new_level: Option<i64>,
    pub skill_points: i64,
    pub stat_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaChange {
    pub success: bool,
    pub new_area: String,
    pub area_level: i64,
    pub description: String,
}

/// A bestiary entry adjusted for where the character is standing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledMonster {
    pub id: String,
    pub category: &'static str,
    pub name: Option<String>,
    pub hp: DiceDescriptor,
    pub damage: DiceDescriptor,
    pub xp: i64,
    pub armor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoldResult {
    pub gold_change: i64,
    pub gold_total: i64,
    pub transaction: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagResult {
    pub flag: String,
    pub value: Option<Value>,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub name: String,
    pub class: String,
    pub level: i64,
    pub hp: String,
    pub mp: String,
    pub stamina: String,
    pub xp: String,
    pub gold: i64,
    pub health_percent: f64,
    pub mana_percent: f64,
    pub stamina_percent: f64,
    pub current_area: String,
    pub equipment: BTreeMap<Slot, String>,
    pub inventory_count: usize,
    pub active_effects: Vec<String>,
}

impl<R: Rng, S: EventSink> Engine<R, S> {
    /// Restore a resource by a literal or dice amount, up to its maximum.
    pub fn heal(&mut self, amount: &str, resource: Resource) -> Result<HealResult> {
        let rolled = roller::roll_healing(amount, 0, &mut self.rng)?;
        let character = &mut self.state.character;
        let healed = character.adjust_resource(resource, rolled);
        Ok(HealResult {
            resource,
            healed,
            current: character.resource(resource),
            max: character.resource_max(resource),
            percent: character.resource_fraction(resource),
        })
    }

    pub fn rest(&mut self, kind: RestKind) -> RestResult {
        let recovery = &self.config.recovery;
        let rates: RestRates = match kind {
            RestKind::Short => recovery.short_rest,
            RestKind::Long => recovery.long_rest,
        };
        let cures = match kind {
            RestKind::Short => Vec::new(),
            RestKind::Long => recovery.long_rest_cures.clone(),
        };

        let character = &mut self.state.character;
        let mut recover = |resource: Resource, rate: f64| {
            let amount = apply_multiplier(character.resource_max(resource), rate);
            character.adjust_resource(resource, amount)
        };
        let hp_recovered = recover(Resource::Hp, rates.hp);
        let mp_recovered = recover(Resource::Mp, rates.mp);
        let stamina_recovered = recover(Resource::Stamina, rates.stamina);

        let status_effects_cleared = cures
            .into_iter()
            .filter(|effect| self.remove_status_effect(effect))
            .collect();

        let character = &self.state.character;
        RestResult {
            hp_recovered,
            mp_recovered,
            stamina_recovered,
            current_hp: character.hp,
            current_mp: character.mp,
            current_stamina: character.stamina,
            status_effects_cleared,
        }
    }

    /// Award experience, scaled by the current area, and level up as many
    /// times as it pays for.
    pub fn gain_xp(&mut self, amount: i64) -> XpResult {
        let area = self.config.area(&self.state.current_area);
        let amount = apply_multiplier(amount, area.xp_modifier);
        let class = self.config.class(&self.state.character.class);
        let xp_base = self.config.game_constants.xp_base;
        let xp_multiplier = self.config.game_constants.xp_multiplier;

        self.state.character.xp += amount;
        self.emit(GameEvent::XpGained {
            amount,
            total_xp: self.state.character.xp,
            current_level: self.state.character.level,
        });

        let mut level_ups = 0;
        while self.state.character.xp_next > 0
            && self.state.character.xp >= self.state.character.xp_next
        {
            let character = &mut self.state.character;
            character.xp -= character.xp_next;
            character.level += 1;
            level_ups += 1;

            character.hp_max += class.hp_per_level;
            character.mp_max += class.mp_per_level;
            character.stamina_max += class.stamina_per_level;
            character.hp = character.hp_max;
            character.mp = character.mp_max;
            character.stamina = character.stamina_max;
            character.skill_points += SKILL_POINTS_PER_LEVEL;
            character.stat_points += STAT_POINTS_PER_LEVEL;
            character.xp_next = next_level_xp(xp_base, xp_multiplier, character.level);

            let event = GameEvent::LevelUp {
                new_level: character.level,
                hp_max: character.hp_max,
                mp_max: character.mp_max,
                stamina_max: character.stamina_max,
                location: self.state.current_area.clone(),
            };
            self.emit(event);
        }

        let character = &self.state.character;
        XpResult {
            xp_gained: amount,
            current_xp: character.xp,
            xp_to_next: character.xp_next,
            leveled_up: level_ups > 0,
            new_level: (level_ups > 0).then_some(character.level),
            skill_points: character.skill_points,
            stat_points: character.stat_points,
        }
    }

    /// Move to a configured area.
    pub fn change_area(&mut self, name: &str) -> Result<AreaChange> {
        let area = self
            .config
            .area_scaling
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownArea(name.to_string()))?;

        self.state.current_area = name.to_string();
        self.emit(GameEvent::AreaEntered {
            area: name.to_string(),
            level: area.level,
            description: area.description.clone(),
        });

        Ok(AreaChange {
            success: true,
            new_area: name.to_string(),
            area_level: area.level,
            description: area.description,
        })
    }

    /// Look up a monster scaled for the current area and character level.
    pub fn area_monster(&self, id: &str) -> Result<ScaledMonster> {
        let (category, def) = self
            .catalog
            .monster(id)
            .ok_or_else(|| Error::UnknownMonster(id.to_string()))?;
        let context = self
            .config
            .area_context(&self.state.current_area, self.state.character.level);

        let mut monster = ScaledMonster {
            id: id.to_string(),
            category,
            name: def.name.clone(),
            hp: def.hp,
            damage: def.damage,
            xp: def.xp,
            armor: def.armor,
        };

        if context.area_level > 1 {
            monster.hp = area::scale(&def.hp, context.area_level, context.player_level);
            monster.damage = area::scale(&def.damage, context.area_level, context.player_level);
            let xp_scale = 1.0 + (context.area_level - 1) as f64 * MONSTER_XP_PER_AREA_LEVEL;
            monster.xp = apply_multiplier(monster.xp, xp_scale);
            monster.armor += context.area_level / AREA_LEVELS_PER_ARMOR;
        }
        monster.xp = apply_multiplier(monster.xp, context.xp_modifier);

        Ok(monster)
    }

    /// Add or spend gold. The purse never goes below zero.
    pub fn modify_gold(&mut self, delta: i64) -> GoldResult {
        let character = &mut self.state.character;
        character.gold = (character.gold + delta).max(0);
        GoldResult {
            gold_change: delta,
            gold_total: character.gold,
            transaction: if delta > 0 { "gain" } else { "spend" },
        }
    }

    pub fn set_flag(&mut self, key: &str, value: Value) -> FlagResult {
        self.state.flags.insert(key.to_string(), value.clone());
        FlagResult {
            flag: key.to_string(),
            value: Some(value),
            exists: true,
        }
    }

    pub fn get_flag(&self, key: &str) -> FlagResult {
        let value = self.state.flags.get(key).cloned();
        FlagResult {
            flag: key.to_string(),
            exists: value.is_some(),
            value,
        }
    }

    pub fn status(&self) -> StatusReport {
        let character = &self.state.character;
        let equipment = [Slot::Weapon, Slot::Armor, Slot::Accessory]
            .into_iter()
            .filter_map(|slot| {
                let id = character.equipment.slot(slot)?;
                let item = self.catalog.item(id)?;
                let detail = item
                    .def
                    .damage
                    .clone()
                    .or_else(|| item.def.armor.map(|armor| armor.to_string()))
                    .unwrap_or_else(|| "equipped".to_string());
                Some((slot, format!("{id} ({detail})")))
            })
            .collect();

        StatusReport {
            name: character.name.clone(),
            class: character.class.clone(),
            level: character.level,
            hp: format!("{}/{}", character.hp, character.hp_max),
            mp: format!("{}/{}", character.mp, character.mp_max),
            stamina: format!("{}/{}", character.stamina, character.stamina_max),
            xp: format!("{}/{}", character.xp, character.xp_next),
            gold: character.gold,
            health_percent: character.resource_fraction(Resource::Hp),
            mana_percent: character.resource_fraction(Resource::Mp),
            stamina_percent: character.resource_fraction(Resource::Stamina),
            current_area: self.state.current_area.clone(),
            equipment,
            inventory_count: character.inventory.len(),
            active_effects: self.state.status_effects.names().map(String::from).collect(),
        }
    }
}

/// XP needed to leave `level`.
fn next_level_xp(xp_base: i64, xp_multiplier: f64, level: i64) -> i64 {
    let exponent = i32::try_from(level - 1).unwrap_or(i32::MAX);
    (xp_base as f64 * xp_multiplier.powi(exponent)).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AreaConfig;
    use crate::content::{ItemCategory, ItemDef, MonsterDef};
    use crate::engine::tests::{engine_with, TestEngine};

    fn add_area(engine: &mut TestEngine, name: &str, level: i64, xp_modifier: f64) {
        engine.config.area_scaling.insert(
            name.to_string(),
            AreaConfig {
                level,
                enemy_modifier: 1.2,
                xp_modifier,
                description: format!("{name} description"),
            },
        );
    }

    #[test]
    fn test_create_warrior() {
        let config = GameConfig::default();
        let state = create_character(&config, "Marcus", "Warrior");
        let c = &state.character;
        assert_eq!(c.class, "Warrior");
        assert_eq!((c.hp, c.hp_max), (120, 120));
        assert_eq!((c.mp, c.mp_max), (30, 30));
        assert_eq!(c.stamina_max, 80);
        assert_eq!(c.strength, 16);
        assert_eq!(c.constitution, 16);
        assert_eq!(c.dexterity, 10);
        assert_eq!(c.damage_bonus, 5);
        assert!((c.dodge_chance - 0.1).abs() < 1e-9);
        assert!((c.crit_chance - 0.1).abs() < 1e-9);
        assert_eq!(c.gold, 50);
        assert_eq!(c.xp_next, 100);
        assert_eq!(state.current_area, "tutorial_village");
        assert!(state.status_effects.is_empty());
    }

    #[test]
    fn test_create_unknown_class_uses_custom() {
        let config = GameConfig::default();
        let state = create_character(&config, "Zed", "bard");
        assert_eq!(state.character.hp_max, 100);
        assert_eq!(state.character.mp_max, 50);
    }

    #[test]
    fn test_create_mage_primary_stats() {
        let config = GameConfig::default();
        let c = create_character(&config, "Lyra", "mage").character;
        assert_eq!(c.intelligence, 16);
        assert_eq!(c.wisdom, 16);
        assert_eq!(c.strength, 10);
        assert_eq!(c.damage_bonus, 3);
    }

    #[test]
    fn test_heal_literal_and_dice() {
        let mut engine = engine_with(vec![3, 4]);
        engine.state.character.hp = 70;

        let result = engine.heal("20", Resource::Hp).unwrap();
        assert_eq!(result.healed, 20);
        assert_eq!(result.current, 90);

        let result = engine.heal("2d4+2", Resource::Hp).unwrap();
        assert_eq!(result.healed, 9);
        assert_eq!(result.current, 99);

        let result = engine.heal("50", Resource::Hp).unwrap();
        assert_eq!(result.healed, 1);
        assert_eq!(result.current, 100);
        assert!((result.percent - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_heal_other_resources() {
        let mut engine = engine_with(vec![1]);
        engine.state.character.mp = 0;
        let result = engine.heal("15", Resource::Mp).unwrap();
        assert_eq!(result.current, 15);
        assert_eq!(result.max, 50);
    }

    #[test]
    fn test_heal_bad_amount() {
        let mut engine = engine_with(vec![1]);
        assert!(engine.heal("lots", Resource::Hp).is_err());
    }

    #[test]
    fn test_short_rest() {
        let mut engine = engine_with(vec![1]);
        engine.state.character.hp = 10;
        engine.state.character.mp = 0;
        engine.state.character.stamina = 0;
        engine.apply_status_effect("poisoned", None, None).unwrap();

        let result = engine.rest(RestKind::Short);
        assert_eq!(result.hp_recovered, 30);
        assert_eq!(result.mp_recovered, 25);
        assert_eq!(result.stamina_recovered, 80);
        assert!(result.status_effects_cleared.is_empty());
        assert!(engine.has_effect("poisoned"));
    }

    #[test]
    fn test_long_rest_cures_debuffs_only() {
        let mut engine = engine_with(vec![1]);
        engine.state.character.hp = 95;
        engine.apply_status_effect("poisoned", None, None).unwrap();
        engine.apply_status_effect("blessed", None, None).unwrap();

        let result = engine.rest(RestKind::Long);
        assert_eq!(result.hp_recovered, 5);
        assert_eq!(result.current_hp, 100);
        assert_eq!(result.status_effects_cleared, vec!["poisoned".to_string()]);
        assert!(engine.has_effect("blessed"));
        assert!(!engine.has_effect("poisoned"));
    }

    #[test]
    fn test_gain_xp_without_level() {
        let mut engine = engine_with(vec![1]);
        let result = engine.gain_xp(40);
        assert_eq!(result.current_xp, 40);
        assert!(!result.leveled_up);
        assert_eq!(result.new_level, None);
    }

    #[test]
    fn test_gain_xp_multiple_levels() {
        let mut engine = engine_with(vec![1]);
        engine.state.character.hp = 1;
        // 100 to reach 2, 150 to reach 3, then 20 left over
        let result = engine.gain_xp(270);
        assert!(result.leveled_up);
        assert_eq!(result.new_level, Some(3));
        assert_eq!(result.current_xp, 20);
        assert_eq!(result.xp_to_next, 225);
        assert_eq!(result.skill_points, 2);
        assert_eq!(result.stat_points, 4);

        let c = &engine.state.character;
        assert_eq!(c.hp_max, 124);
        assert_eq!(c.hp, 124);
        assert_eq!(c.mp_max, 56);
        assert_eq!(c.stamina_max, 96);

        let level_ups = engine
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelUp { .. }))
            .count();
        assert_eq!(level_ups, 2);
    }

    #[test]
    fn test_gain_xp_area_modifier() {
        let mut engine = engine_with(vec![1]);
        add_area(&mut engine, "darkwood_forest", 4, 1.25);
        engine.state.current_area = "darkwood_forest".to_string();
        assert_eq!(engine.gain_xp(30).xp_gained, 37);
    }

    #[test]
    fn test_change_area() {
        let mut engine = engine_with(vec![1]);
        add_area(&mut engine, "darkwood_forest", 4, 1.0);

        let result = engine.change_area("darkwood_forest").unwrap();
        assert_eq!(result.area_level, 4);
        assert_eq!(engine.state.current_area, "darkwood_forest");
        assert!(matches!(
            engine.sink().events().last(),
            Some(GameEvent::AreaEntered { level: 4, .. })
        ));

        let err = engine.change_area("atlantis").unwrap_err();
        assert_eq!(err.reason(), Some("unknown_area"));
        assert_eq!(engine.state.current_area, "darkwood_forest");
    }

    fn add_goblin(engine: &mut TestEngine) {
        engine.catalog.insert_monster(
            "goblin",
            MonsterDef {
                name: Some("Goblin".to_string()),
                hp: "2d6".parse().unwrap(),
                damage: "1d6".parse().unwrap(),
                xp: 25,
                armor: 1,
            },
        );
    }

    #[test]
    fn test_area_monster_unscaled_in_starting_area() {
        let mut engine = engine_with(vec![1]);
        add_goblin(&mut engine);
        let monster = engine.area_monster("goblin").unwrap();
        assert_eq!(monster.hp.to_string(), "2d6");
        assert_eq!(monster.xp, 25);
        assert_eq!(monster.armor, 1);
        assert_eq!(monster.category, "common_enemies");
    }

    #[test]
    fn test_area_monster_scaled() {
        let mut engine = engine_with(vec![1]);
        add_goblin(&mut engine);
        add_area(&mut engine, "darkwood_forest", 4, 1.5);
        engine.state.current_area = "darkwood_forest".to_string();
        engine.state.character.level = 4;

        let monster = engine.area_monster("goblin").unwrap();
        assert_eq!(monster.hp.to_string(), "3d6+6");
        assert_eq!(monster.damage.to_string(), "2d6+6");
        // 25 * 2.5 = 62, then * 1.5 = 93
        assert_eq!(monster.xp, 93);
        assert_eq!(monster.armor, 2);
    }

    #[test]
    fn test_area_monster_unknown() {
        let engine = engine_with(vec![1]);
        assert_eq!(
            engine.area_monster("dragon").unwrap_err().reason(),
            Some("unknown_monster")
        );
    }

    #[test]
    fn test_modify_gold_floors_at_zero() {
        let mut engine = engine_with(vec![1]);
        let result = engine.modify_gold(25);
        assert_eq!(result.gold_total, 75);
        assert_eq!(result.transaction, "gain");

        let result = engine.modify_gold(-200);
        assert_eq!(result.gold_total, 0);
        assert_eq!(result.transaction, "spend");
    }

    #[test]
    fn test_flags() {
        let mut engine = engine_with(vec![1]);
        assert!(!engine.get_flag("met_elder").exists);
        engine.set_flag("met_elder", Value::Bool(true));
        let flag = engine.get_flag("met_elder");
        assert!(flag.exists);
        assert_eq!(flag.value, Some(Value::Bool(true)));
    }

    #[test]
    fn test_status_report() {
        let mut engine = engine_with(vec![1]);
        engine.catalog.insert_item(
            "longsword",
            ItemCategory::Weapons,
            ItemDef {
                damage: Some("1d8+1".to_string()),
                ..ItemDef::default()
            },
        );
        engine.state.character.equipment.weapon = Some("longsword".to_string());
        engine.state.character.hp = 50;
        engine.apply_status_effect("blessed", None, None).unwrap();

        let status = engine.status();
        assert_eq!(status.hp, "50/100");
        assert_eq!(status.xp, "0/100");
        assert!((status.health_percent - 0.5).abs() < 1e-9);
        assert_eq!(status.equipment[&Slot::Weapon], "longsword (1d8+1)");
        assert_eq!(status.active_effects, vec!["blessed".to_string()]);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["equipment"]["weapon"], "longsword (1d8+1)");
    }

    #[test]
    fn test_next_level_xp() {
        assert_eq!(next_level_xp(100, 1.5, 1), 100);
        assert_eq!(next_level_xp(100, 1.5, 2), 150);
        assert_eq!(next_level_xp(100, 1.5, 4), 337);
    }
}
