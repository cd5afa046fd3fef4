// ABOUTME: Combat resolution: attacks, incoming damage, spells and skill checks.
// ABOUTME: Composes dice rolls with crits, sneak bonuses, status effects and armor.

use crate::dice::{Amount, DiceDescriptor};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{EventSink, GameEvent};
use crate::roller::{self, apply_multiplier, Rng};
use crate::state::{Attribute, Resource};
use serde::Serialize;

/// Damage when nothing better is wielded.
pub const UNARMED_DAMAGE: DiceDescriptor = DiceDescriptor {
    count: 1,
    sides: 4,
    modifier: 0,
};

/// Power of a spell cast without a catalog entry or override.
const DEFAULT_SPELL_POWER: DiceDescriptor = DiceDescriptor {
    count: 1,
    sides: 6,
    modifier: 0,
};

/// Dexterity check penalty while frozen.
const FROZEN_DEXTERITY_PENALTY: i64 = 3;

/// Fraction of max HP at or below which the low-HP effect boosts damage.
const LOW_HP_THRESHOLD: f64 = 0.5;

const PHYSICAL: &str = "physical";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackResult {
    pub damage: i64,
    pub critical: bool,
    pub stamina_remaining: i64,
    pub sneak_attack: bool,
    pub weapon_used: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageResult {
    pub damage_taken: i64,
    pub hp_remaining: i64,
    pub hp_max: i64,
    pub is_alive: bool,
    pub health_percent: f64,
    pub armor_reduced: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyAttackResult {
    pub dodged: bool,
    pub area_scaled: bool,
    /// The (possibly scaled) notation that was rolled.
    pub enemy_damage: String,
    /// Damage that landed on the character; 0 on a dodge.
    pub damage: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamina_cost: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamina_remaining: Option<i64>,
    /// Damage that landed; absent when dodged.
    #[serde(flatten)]
    pub hit: Option<DamageResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellKind {
    Damage,
    Healing,
    Buff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellResult {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: SpellKind,
    pub mp_cost: i64,
    pub mp_remaining: i64,
    pub spell_id: Option<String>,
    /// Rolled damage for the caller to apply to its target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_applied: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub success: bool,
    pub roll: i64,
    pub modifier: i64,
    pub total: i64,
    pub difficulty: i64,
    pub critical_success: bool,
    pub critical_failure: bool,
    pub margin: i64,
}

impl<R: Rng, S: EventSink> Engine<R, S> {
    /// Resolve one attack by the character.
    ///
    /// The stamina cost is always paid, even from an empty pool; an attack is
    /// never refused for lack of stamina.
    pub fn attack(
        &mut self,
        weapon: Option<DiceDescriptor>,
        target_armor: i64,
        force_crit: bool,
        is_sneak: bool,
    ) -> Result<AttackResult> {
        let weapon = match weapon {
            Some(weapon) => weapon,
            None => self.equipped_weapon()?,
        };
        let constants = &self.config.game_constants;
        let crit_multiplier = constants.crit_multiplier;
        let low_hp_bonus = constants.low_hp_damage_bonus;
        let low_hp_effect = constants.low_hp_effect.clone();
        let sneak_per_level = constants.sneak_attack_bonus_per_level;
        let stamina_cost = constants.stamina_attack_cost;
        let status_damage = self.effect_total(|e| e.damage_bonus);
        let sneak_allowed = self.config.class(&self.state.character.class).sneak_attack;

        let character = &self.state.character;
        let mut damage = roller::roll_damage(
            &weapon,
            character.damage_bonus,
            force_crit,
            crit_multiplier,
            &mut self.rng,
        );

        if self.state.status_effects.contains(&low_hp_effect)
            && character.resource_fraction(Resource::Hp) <= LOW_HP_THRESHOLD
        {
            damage = apply_multiplier(damage, 1.0 + low_hp_bonus);
        }

        let mut critical = force_crit;
        if !force_crit && self.rng.chance() < character.crit_chance {
            damage = apply_multiplier(damage, crit_multiplier);
            critical = true;
        }

        if is_sneak && sneak_allowed {
            damage += character.level * sneak_per_level;
        }

        damage += status_damage;
        let damage = (damage - target_armor).max(1);

        let character = &mut self.state.character;
        let stamina_remaining = character.set_resource(
            Resource::Stamina,
            character.stamina - stamina_cost,
        );

        tracing::debug!(%weapon, damage, critical, is_sneak, "resolved attack");
        self.emit(GameEvent::DamageDealt {
            amount: damage,
            target: "enemy".to_string(),
            critical,
            sneak_attack: is_sneak,
        });

        Ok(AttackResult {
            damage,
            critical,
            stamina_remaining,
            sneak_attack: is_sneak,
            weapon_used: weapon.to_string(),
        })
    }

    fn equipped_weapon(&self) -> Result<DiceDescriptor> {
        let damage = self
            .state
            .character
            .equipment
            .weapon
            .as_deref()
            .and_then(|id| self.catalog.item(id))
            .and_then(|item| item.def.damage);
        match damage {
            Some(notation) => notation.parse(),
            None => Ok(UNARMED_DAMAGE),
        }
    }

    /// Armor from the character, worn armor and active effects, never negative.
    pub fn effective_armor(&self) -> i64 {
        let character = &self.state.character;
        let worn = character
            .equipment
            .armor
            .as_deref()
            .and_then(|id| self.catalog.item(id))
            .and_then(|item| item.def.armor)
            .unwrap_or(0);
        let bonus = self.effect_total(|e| e.armor_bonus);
        let penalty = self.effect_total(|e| e.armor_penalty);
        (character.armor + worn + bonus - penalty).max(0)
    }

    /// Take incoming damage. Only physical damage is reduced by armor, and
    /// never below 1.
    pub fn take_damage(&mut self, amount: i64, damage_type: &str) -> DamageResult {
        let armor = self.effective_armor();
        let physical = damage_type == PHYSICAL;
        let amount = if physical {
            (amount - armor).max(1)
        } else {
            amount
        };
        let armor_reduced = if physical { armor } else { 0 };

        let character = &mut self.state.character;
        character.adjust_resource(Resource::Hp, -amount);
        let result = DamageResult {
            damage_taken: amount,
            hp_remaining: character.hp,
            hp_max: character.hp_max,
            is_alive: character.is_alive(),
            health_percent: character.resource_fraction(Resource::Hp),
            armor_reduced,
        };

        self.emit(GameEvent::DamageTaken {
            amount,
            source: damage_type.to_string(),
            armor_reduced,
            hp_remaining: result.hp_remaining,
        });
        result
    }

    /// An enemy attacks the character, scaled for the current area.
    ///
    /// A successful dodge avoids all damage but still costs stamina.
    pub fn enemy_attack(&mut self, damage: DiceDescriptor) -> EnemyAttackResult {
        let area = self
            .config
            .area_context(&self.state.current_area, self.state.character.level);
        let area_scaled = area.scales_enemies();
        let damage = if area_scaled {
            area.scale(&damage)
        } else {
            damage
        };

        let rolled = roller::roll(&damage, &mut self.rng).total;

        if self.rng.chance() < self.state.character.dodge_chance {
            let cost = self.config.game_constants.stamina_dodge_cost;
            let character = &mut self.state.character;
            let remaining = character.set_resource(Resource::Stamina, character.stamina - cost);
            tracing::debug!(%damage, rolled, "dodged enemy attack");
            return EnemyAttackResult {
                dodged: true,
                area_scaled,
                enemy_damage: damage.to_string(),
                damage: 0,
                stamina_cost: Some(cost),
                stamina_remaining: Some(remaining),
                hit: None,
            };
        }

        let hit = self.take_damage(rolled, PHYSICAL);
        EnemyAttackResult {
            dodged: false,
            area_scaled,
            enemy_damage: damage.to_string(),
            damage: hit.damage_taken,
            stamina_cost: None,
            stamina_remaining: None,
            hit: Some(hit),
        }
    }

    /// Cast a spell from the catalog, or an ad-hoc damage spell without an id.
    ///
    /// A power of literally `"0"` means the spell has no numeric payload.
    pub fn cast_spell(
        &mut self,
        mp_cost: Option<i64>,
        spell_id: Option<&str>,
        power: Option<&str>,
    ) -> Result<SpellResult> {
        let power = power.map(str::parse::<Amount>).transpose()?;
        let default_cost = self.config.game_constants.default_spell_cost;

        let (kind, cost, power) = match spell_id {
            Some(id) => {
                let spell = self
                    .catalog
                    .spell(id)
                    .ok_or_else(|| Error::UnknownSpell(id.to_string()))?;
                let cost = mp_cost.or(spell.mp_cost).unwrap_or(default_cost);
                if let Some(healing) = spell.healing {
                    (SpellKind::Healing, cost, power.unwrap_or(healing))
                } else if let Some(damage) = spell.damage {
                    (SpellKind::Damage, cost, power.unwrap_or(damage))
                } else if spell.effect.is_some() || self.config.spell_effect(id).is_some() {
                    (SpellKind::Buff, cost, power.unwrap_or(Amount::Flat(0)))
                } else {
                    (
                        SpellKind::Damage,
                        cost,
                        power.unwrap_or(Amount::Dice(DEFAULT_SPELL_POWER)),
                    )
                }
            }
            None => (
                SpellKind::Damage,
                mp_cost.unwrap_or(default_cost),
                power.unwrap_or(Amount::Dice(DEFAULT_SPELL_POWER)),
            ),
        };

        let buff = match (kind, spell_id) {
            (SpellKind::Buff, Some(id)) => self.config.spell_effect(id).map(String::from),
            _ => None,
        };
        if let Some(effect) = &buff {
            if self.config.effect(effect).is_none() {
                return Err(Error::UnknownEffect(effect.clone()));
            }
        }

        let available = self.state.character.mp;
        if available < cost {
            return Err(Error::InsufficientMana {
                required: cost,
                available,
            });
        }
        self.state.character.mp -= cost;

        let effect_value = if power.is_zero() {
            0
        } else {
            power.roll(&mut self.rng) + self.state.character.intelligence / 2
        };

        let mut result = SpellResult {
            success: true,
            kind,
            mp_cost: cost,
            mp_remaining: self.state.character.mp,
            spell_id: spell_id.map(String::from),
            effect_value: None,
            healed: None,
            hp: None,
            effect_applied: None,
        };

        match kind {
            SpellKind::Healing => {
                let healed = self
                    .state
                    .character
                    .adjust_resource(Resource::Hp, effect_value);
                result.healed = Some(healed);
                result.hp = Some(self.state.character.hp);
            }
            SpellKind::Buff => {
                if let Some(effect) = buff {
                    self.apply_status_effect(&effect, None, None)?;
                    result.effect_applied = Some(effect);
                }
            }
            SpellKind::Damage => result.effect_value = Some(effect_value),
        }

        tracing::debug!(?spell_id, ?kind, cost, effect_value, "cast spell");
        Ok(result)
    }

    /// Roll a d20 attribute check against a difficulty.
    ///
    /// A natural 20 always succeeds and a natural 1 always fails.
    pub fn skill_check(&mut self, attribute: Attribute, difficulty: i64) -> CheckResult {
        let mut modifier = (self.state.character.attribute(attribute) - 10).div_euclid(2);
        modifier += self.effect_total(|e| e.skill_bonus);
        if attribute == Attribute::Dexterity && self.has_effect("frozen") {
            modifier -= FROZEN_DEXTERITY_PENALTY;
        }

        let roll = i64::from(self.rng.roll(20));
        let total = roll + modifier;
        let critical_success = roll == 20;
        let critical_failure = roll == 1;
        let success = !critical_failure && (total >= difficulty || critical_success);

        CheckResult {
            success,
            roll,
            modifier,
            total,
            difficulty,
            critical_success,
            critical_failure,
            margin: total - difficulty,
        }
    }
}
