// ABOUTME: Inventory management: picking up, equipping and using items.
// ABOUTME: Item definitions come from the catalog; the inventory holds one id per item.

use crate::content::ItemCategory;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::events::{EventSink, GameEvent};
use crate::roller::Rng;
use crate::state::{Resource, Slot};
use serde::Serialize;

const APPLY_STATUS: &str = "apply_status";
const POISONED: &str = "poisoned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddItemResult {
    pub success: bool,
    pub item_added: String,
    pub quantity: u32,
    pub inventory_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipResult {
    pub success: bool,
    pub equipped: String,
    pub slot: Slot,
    pub unequipped: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UseResult {
    pub success: bool,
    pub item_used: String,
    /// Human-readable lines, one per effect.
    pub effects: Vec<String>,
}

impl ItemCategory {
    /// Weapons and armor have their own slots; anything else is an accessory.
    pub fn slot(self) -> Slot {
        match self {
            ItemCategory::Weapons => Slot::Weapon,
            ItemCategory::Armor => Slot::Armor,
            ItemCategory::Consumables | ItemCategory::Special => Slot::Accessory,
        }
    }
}

impl<R: Rng, S: EventSink> Engine<R, S> {
    pub fn add_item(&mut self, id: &str, quantity: u32) -> Result<AddItemResult> {
        let item = self
            .catalog
            .item(id)
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;

        let inventory = &mut self.state.character.inventory;
        inventory.extend((0..quantity).map(|_| id.to_string()));
        let inventory_size = inventory.len();

        self.emit(GameEvent::ItemAcquired {
            item: item.display_name().to_string(),
            quantity,
        });
        Ok(AddItemResult {
            success: true,
            item_added: id.to_string(),
            quantity,
            inventory_size,
        })
    }

    /// Equip an item from the inventory. Whatever held the slot goes back
    /// into the inventory.
    pub fn equip_item(&mut self, id: &str) -> Result<EquipResult> {
        let position = self.inventory_position(id)?;
        let item = self
            .catalog
            .item(id)
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;
        let slot = item.category.slot();

        let character = &mut self.state.character;
        character.inventory.remove(position);
        let unequipped = character.equipment.slot_mut(slot).replace(id.to_string());
        if let Some(old) = &unequipped {
            character.inventory.push(old.clone());
        }

        self.emit(GameEvent::ItemEquipped {
            item: item.display_name().to_string(),
            slot,
            unequipped: unequipped.clone(),
        });
        Ok(EquipResult {
            success: true,
            equipped: id.to_string(),
            slot,
            unequipped,
        })
    }

    /// Consume one of an item, applying everything it does.
    pub fn use_item(&mut self, id: &str) -> Result<UseResult> {
        let position = self.inventory_position(id)?;
        let item = self
            .catalog
            .item(id)
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;
        if item.category != ItemCategory::Consumables {
            return Err(Error::NotConsumable(id.to_string()));
        }
        let def = &item.def;
        let status = def
            .status
            .as_deref()
            .filter(|_| def.effect.as_deref() == Some(APPLY_STATUS));
        if let Some(status) = status {
            if self.config.effect(status).is_none() {
                return Err(Error::UnknownEffect(status.to_string()));
            }
        }

        let mut effects = Vec::new();
        let lower_id = id.to_lowercase();

        if let Some(heal) = def.heal {
            let amount = heal.roll(&mut self.rng);
            self.state.character.adjust_resource(Resource::Hp, amount);
            effects.push(format!("Healed {amount} HP"));
        }

        if let Some(restore) = def.restore {
            let amount = restore.roll(&mut self.rng);
            let (resource, label) = if lower_id.contains("mana") || lower_id.contains("mp") {
                (Resource::Mp, "MP")
            } else {
                (Resource::Stamina, "Stamina")
            };
            self.state.character.adjust_resource(resource, amount);
            effects.push(format!("Restored {amount} {label}"));
        }

        if let Some(status) = status {
            let applied = self.apply_status_effect(status, def.duration, def.power)?;
            effects.push(format!(
                "Applied {} for {} turns",
                applied.effect_applied, applied.duration
            ));
        }

        if def.cure.as_deref() == Some("poison") || lower_id.contains("antidote") {
            if self.remove_status_effect(POISONED) {
                effects.push("Cured poison".to_string());
            } else {
                effects.push("No poison to cure".to_string());
            }
        }

        self.state.character.inventory.remove(position);
        self.emit(GameEvent::ItemUsed {
            item: item.display_name().to_string(),
            effect: effects.join(", "),
        });

        Ok(UseResult {
            success: true,
            item_used: item.display_name().to_string(),
            effects,
        })
    }

    fn inventory_position(&self, id: &str) -> Result<usize> {
        self.state
            .character
            .inventory
            .iter()
            .position(|held| held == id)
            .ok_or_else(|| Error::ItemNotInInventory(id.to_string()))
    }
}
