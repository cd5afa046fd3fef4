// ABOUTME: Read-only content catalog of items, spells and monsters.
// ABOUTME: Loaded from the content/*.json files, searched category by category.

use crate::dice::{Amount, DiceDescriptor};
use crate::error::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Weapons,
    Armor,
    Consumables,
    Special,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    pub name: Option<String>,
    /// Weapon damage notation.
    pub damage: Option<String>,
    /// Armor value granted while equipped.
    pub armor: Option<i64>,
    pub heal: Option<Amount>,
    pub restore: Option<Amount>,
    /// `"apply_status"` makes the item apply `status` when used.
    pub effect: Option<String>,
    pub status: Option<String>,
    pub duration: Option<i64>,
    pub power: Option<Amount>,
    pub cure: Option<String>,
}

/// An item together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub category: ItemCategory,
    pub def: ItemDef,
}

impl Item {
    pub fn display_name(&self) -> &str {
        self.def.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellDef {
    pub name: Option<String>,
    pub mp_cost: Option<i64>,
    pub healing: Option<Amount>,
    pub damage: Option<Amount>,
    pub effect: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDef {
    #[serde(default)]
    pub name: Option<String>,
    pub hp: DiceDescriptor,
    pub damage: DiceDescriptor,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub armor: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ItemsFile {
    weapons: BTreeMap<String, ItemDef>,
    armor: BTreeMap<String, ItemDef>,
    consumables: BTreeMap<String, ItemDef>,
    special: BTreeMap<String, ItemDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SpellsFile {
    basic_spells: BTreeMap<String, SpellDef>,
    intermediate_spells: BTreeMap<String, SpellDef>,
    advanced_spells: BTreeMap<String, SpellDef>,
    ritual_magic: BTreeMap<String, SpellDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BestiaryFile {
    common_enemies: BTreeMap<String, MonsterDef>,
    elite_enemies: BTreeMap<String, MonsterDef>,
    bosses: BTreeMap<String, MonsterDef>,
}

/// All content definitions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: ItemsFile,
    spells: SpellsFile,
    monsters: BestiaryFile,
}

impl Catalog {
    /// Load `items.json`, `spells.json` and `bestiary.json` from a directory.
    /// Missing files leave that part of the catalog empty.
    pub fn load(content_dir: &Path) -> Result<Self> {
        Ok(Self {
            items: load_file(&content_dir.join("items.json"))?,
            spells: load_file(&content_dir.join("spells.json"))?,
            monsters: load_file(&content_dir.join("bestiary.json"))?,
        })
    }

    pub fn item(&self, id: &str) -> Option<Item> {
        let items = &self.items;
        [
            (ItemCategory::Weapons, &items.weapons),
            (ItemCategory::Armor, &items.armor),
            (ItemCategory::Consumables, &items.consumables),
            (ItemCategory::Special, &items.special),
        ]
        .into_iter()
        .find_map(|(category, defs)| {
            defs.get(id).map(|def| Item {
                id: id.to_string(),
                category,
                def: def.clone(),
            })
        })
    }

    pub fn spell(&self, id: &str) -> Option<&SpellDef> {
        let spells = &self.spells;
        [
            &spells.basic_spells,
            &spells.intermediate_spells,
            &spells.advanced_spells,
            &spells.ritual_magic,
        ]
        .into_iter()
        .find_map(|defs| defs.get(id))
    }

    /// Look up a monster, returning the bestiary category it came from.
    pub fn monster(&self, id: &str) -> Option<(&'static str, &MonsterDef)> {
        let monsters = &self.monsters;
        [
            ("common_enemies", &monsters.common_enemies),
            ("elite_enemies", &monsters.elite_enemies),
            ("bosses", &monsters.bosses),
        ]
        .into_iter()
        .find_map(|(category, defs)| defs.get(id).map(|def| (category, def)))
    }

    pub fn insert_item(&mut self, id: impl Into<String>, category: ItemCategory, def: ItemDef) {
        let items = &mut self.items;
        let defs = match category {
            ItemCategory::Weapons => &mut items.weapons,
            ItemCategory::Armor => &mut items.armor,
            ItemCategory::Consumables => &mut items.consumables,
            ItemCategory::Special => &mut items.special,
        };
        defs.insert(id.into(), def);
    }

    pub fn insert_spell(&mut self, id: impl Into<String>, def: SpellDef) {
        self.spells.basic_spells.insert(id.into(), def);
    }

    pub fn insert_monster(&mut self, id: impl Into<String>, def: MonsterDef) {
        self.monsters.common_enemies.insert(id.into(), def);
    }
}

fn load_file<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "content file missing");
        return Ok(T::default());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("items.json"),
            r#"{
                "weapons": {"longsword": {"name": "Longsword", "damage": "1d8+1"}},
                "consumables": {"health_potion": {"heal": "2d4+2"}}
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("spells.json"),
            r#"{"intermediate_spells": {"firebolt": {"mp_cost": 15, "damage": "2d6"}}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("bestiary.json"),
            r#"{"elite_enemies": {"wolf": {"hp": "3d8", "damage": "1d6+1", "xp": 40}}}"#,
        )
        .unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();

        let sword = catalog.item("longsword").unwrap();
        assert_eq!(sword.category, ItemCategory::Weapons);
        assert_eq!(sword.display_name(), "Longsword");
        assert_eq!(sword.def.damage.as_deref(), Some("1d8+1"));

        let potion = catalog.item("health_potion").unwrap();
        assert_eq!(potion.display_name(), "health_potion");
        assert_eq!(potion.category, ItemCategory::Consumables);

        assert_eq!(catalog.spell("firebolt").unwrap().mp_cost, Some(15));

        let (category, wolf) = catalog.monster("wolf").unwrap();
        assert_eq!(category, "elite_enemies");
        assert_eq!(wolf.xp, 40);
        assert_eq!(wolf.armor, 0);

        assert!(catalog.item("excalibur").is_none());
        assert!(catalog.spell("wish").is_none());
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("content")).unwrap();
        assert!(catalog.item("torch").is_none());
    }

    #[test]
    fn test_bad_monster_dice_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bestiary.json"),
            r#"{"bosses": {"lich": {"hp": "lots", "damage": "2d10"}}}"#,
        )
        .unwrap();
        assert!(Catalog::load(dir.path()).is_err());
    }
}
