// ABOUTME: Timed status effects and the per-turn ticker.
// ABOUTME: Effects are keyed by name, kept in insertion order, and replaced rather than stacked.

use crate::dice::Amount;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{EventSink, GameEvent};
use crate::roller::Rng;
use crate::state::Resource;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One active effect on the character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEffectInstance {
    pub name: String,
    /// Turns remaining; 0 means it never runs out.
    pub duration: i64,
    /// Damage dealt each turn.
    pub power: Amount,
}

#[derive(Serialize, Deserialize)]
struct InstanceBody {
    duration: i64,
    #[serde(default)]
    power: Amount,
}

/// Active effects in the order they were first applied.
///
/// Serialized as a JSON object keyed by effect name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusEffects(Vec<StatusEffectInstance>);

impl StatusEffects {
    /// Insert an effect, replacing any existing instance of the same name in place.
    pub fn insert(&mut self, instance: StatusEffectInstance) {
        match self.0.iter_mut().find(|e| e.name == instance.name) {
            Some(existing) => *existing = instance,
            None => self.0.push(instance),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<StatusEffectInstance> {
        let index = self.0.iter().position(|e| e.name == name)?;
        Some(self.0.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&StatusEffectInstance> {
        self.0.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StatusEffectInstance> {
        self.0.iter_mut().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffectInstance> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StatusEffects {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for effect in &self.0 {
            map.serialize_entry(
                &effect.name,
                &InstanceBody {
                    duration: effect.duration,
                    power: effect.power,
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatusEffects {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EffectsVisitor;

        impl<'de> Visitor<'de> for EffectsVisitor {
            type Value = StatusEffects;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of status effect name to {duration, power}")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut effects = StatusEffects::default();
                while let Some((name, body)) = access.next_entry::<String, InstanceBody>()? {
                    effects.insert(StatusEffectInstance {
                        name,
                        duration: body.duration,
                        power: body.power,
                    });
                }
                Ok(effects)
            }
        }

        deserializer.deserialize_map(EffectsVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyResult {
    pub success: bool,
    pub effect_applied: String,
    pub duration: i64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickKind {
    Damage,
    Healing,
    Expired,
}

/// One line of what a tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickEntry {
    pub effect: String,
    #[serde(rename = "type")]
    pub kind: TickKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Number of effect instances that were active at the start of the tick.
    ///
    /// This counts instances, not `log` entries: an effect that deals damage
    /// and expires in the same tick adds two entries to `log` but counts once.
    pub effects_processed: usize,
    pub log: Vec<TickEntry>,
    pub hp_remaining: i64,
    pub active_effects: Vec<String>,
}

impl<R: Rng, S: EventSink> Engine<R, S> {
    /// Apply a configured status effect, replacing any previous instance of it.
    ///
    /// Duration and power fall back to the effect's config; power defaults to
    /// the config's damage per turn, or nothing at all.
    pub fn apply_status_effect(
        &mut self,
        name: &str,
        duration: Option<i64>,
        power: Option<Amount>,
    ) -> Result<ApplyResult> {
        let config = self
            .config
            .effect(name)
            .ok_or_else(|| Error::UnknownEffect(name.to_string()))?;

        let duration = duration.unwrap_or_else(|| config.default_duration());
        let power = power.or(config.damage_per_turn).unwrap_or_default();
        let description = config.description.clone();

        self.state.status_effects.insert(StatusEffectInstance {
            name: name.to_string(),
            duration,
            power,
        });
        self.emit(GameEvent::StatusApplied {
            status: name.to_string(),
            duration,
        });

        Ok(ApplyResult {
            success: true,
            effect_applied: name.to_string(),
            duration,
            description,
        })
    }

    /// Remove an effect if present, announcing the removal.
    pub(crate) fn remove_status_effect(&mut self, name: &str) -> bool {
        if self.state.status_effects.remove(name).is_some() {
            self.emit(GameEvent::StatusRemoved {
                status: name.to_string(),
            });
            true
        } else {
            false
        }
    }

    /// Advance every active effect by one turn.
    pub fn tick_status_effects(&mut self) -> TickReport {
        let names: Vec<String> = self
            .state
            .status_effects
            .names()
            .map(String::from)
            .collect();
        let mut log = Vec::new();

        for name in &names {
            let Some(instance) = self.state.status_effects.get(name).cloned() else {
                continue;
            };
            let config = self.config.effect(name).cloned().unwrap_or_default();

            let damage = instance.power.roll(&mut self.rng);
            if damage > 0 {
                self.state.character.adjust_resource(Resource::Hp, -damage);
                log.push(TickEntry {
                    effect: name.clone(),
                    kind: TickKind::Damage,
                    amount: Some(damage),
                });
            }

            if let Some(heal) = config.heal_per_turn {
                let healing = heal.roll(&mut self.rng);
                if healing > 0 {
                    self.state.character.adjust_resource(Resource::Hp, healing);
                    log.push(TickEntry {
                        effect: name.clone(),
                        kind: TickKind::Healing,
                        amount: Some(healing),
                    });
                }
            }

            if config.passive || instance.duration <= 0 {
                continue;
            }
            let remaining = instance.duration - 1;
            if remaining > 0 {
                if let Some(active) = self.state.status_effects.get_mut(name) {
                    active.duration = remaining;
                }
            } else {
                self.remove_status_effect(name);
                log.push(TickEntry {
                    effect: name.clone(),
                    kind: TickKind::Expired,
                    amount: None,
                });
            }
        }

        tracing::debug!(processed = names.len(), entries = log.len(), "ticked status effects");

        TickReport {
            effects_processed: names.len(),
            log,
            hp_remaining: self.state.character.hp,
            active_effects: self
                .state
                .status_effects
                .names()
                .map(String::from)
                .collect(),
        }
    }
}
