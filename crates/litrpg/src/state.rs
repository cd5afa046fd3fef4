// ABOUTME: Persisted character record and the JSON state store.
// ABOUTME: Typed access to resources and attributes; atomic temp-file-then-rename saves.

use crate::effects::StatusEffects;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A pool with a current value and a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Hp,
    Mp,
    Stamina,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Hp => write!(f, "hp"),
            Resource::Mp => write!(f, "mp"),
            Resource::Stamina => write!(f, "stamina"),
        }
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hp" => Ok(Resource::Hp),
            "mp" => Ok(Resource::Mp),
            "stamina" => Ok(Resource::Stamina),
            _ => Err(Error::InvalidResource(s.to_string())),
        }
    }
}

/// One of the six core attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Strength,
    Dexterity,
    Intelligence,
    Constitution,
    Wisdom,
    Charisma,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Strength,
        Attribute::Dexterity,
        Attribute::Intelligence,
        Attribute::Constitution,
        Attribute::Wisdom,
        Attribute::Charisma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Strength => "strength",
            Attribute::Dexterity => "dexterity",
            Attribute::Intelligence => "intelligence",
            Attribute::Constitution => "constitution",
            Attribute::Wisdom => "wisdom",
            Attribute::Charisma => "charisma",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == lower)
            .ok_or_else(|| Error::InvalidResource(s.to_string()))
    }
}

/// Items currently worn or wielded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<String>,
    pub armor: Option<String>,
    pub accessory: Option<String>,
}

/// The equipment slot an item occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Weapon,
    Armor,
    Accessory,
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Slot::Weapon => "weapon",
            Slot::Armor => "armor",
            Slot::Accessory => "accessory",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Equipment {
    pub fn slot(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Weapon => self.weapon.as_deref(),
            Slot::Armor => self.armor.as_deref(),
            Slot::Accessory => self.accessory.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::Weapon => &mut self.weapon,
            Slot::Armor => &mut self.armor,
            Slot::Accessory => &mut self.accessory,
        }
    }
}

/// Numeric state of the player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub class: String,
    pub level: i64,
    pub xp: i64,
    pub xp_next: i64,

    pub hp: i64,
    pub hp_max: i64,
    pub mp: i64,
    pub mp_max: i64,
    pub stamina: i64,
    pub stamina_max: i64,

    pub strength: i64,
    pub dexterity: i64,
    pub intelligence: i64,
    pub constitution: i64,
    pub wisdom: i64,
    pub charisma: i64,

    pub damage_bonus: i64,
    pub armor: i64,
    pub crit_chance: f64,
    pub dodge_chance: f64,

    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub skill_points: i64,
    #[serde(default)]
    pub stat_points: i64,
}

impl Character {
    pub fn resource(&self, resource: Resource) -> i64 {
        match resource {
            Resource::Hp => self.hp,
            Resource::Mp => self.mp,
            Resource::Stamina => self.stamina,
        }
    }

    pub fn resource_max(&self, resource: Resource) -> i64 {
        match resource {
            Resource::Hp => self.hp_max,
            Resource::Mp => self.mp_max,
            Resource::Stamina => self.stamina_max,
        }
    }

    /// Set a resource, clamped to `[0, max]`. Returns the stored value.
    pub fn set_resource(&mut self, resource: Resource, value: i64) -> i64 {
        let clamped = value.clamp(0, self.resource_max(resource).max(0));
        match resource {
            Resource::Hp => self.hp = clamped,
            Resource::Mp => self.mp = clamped,
            Resource::Stamina => self.stamina = clamped,
        }
        clamped
    }

    /// Add (or with a negative delta, remove) from a resource. Returns the
    /// change actually applied after clamping.
    pub fn adjust_resource(&mut self, resource: Resource, delta: i64) -> i64 {
        let before = self.resource(resource);
        self.set_resource(resource, before + delta) - before
    }

    pub fn resource_fraction(&self, resource: Resource) -> f64 {
        let max = self.resource_max(resource);
        if max <= 0 {
            return 0.0;
        }
        self.resource(resource) as f64 / max as f64
    }

    pub fn attribute(&self, attribute: Attribute) -> i64 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Intelligence => self.intelligence,
            Attribute::Constitution => self.constitution,
            Attribute::Wisdom => self.wisdom,
            Attribute::Charisma => self.charisma,
        }
    }

    pub fn attribute_mut(&mut self, attribute: Attribute) -> &mut i64 {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Intelligence => &mut self.intelligence,
            Attribute::Constitution => &mut self.constitution,
            Attribute::Wisdom => &mut self.wisdom,
            Attribute::Charisma => &mut self.charisma,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Everything persisted between commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub character: Character,
    #[serde(default)]
    pub status_effects: StatusEffects,
    pub current_area: String,
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
    #[serde(default)]
    pub kills: i64,
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
}

impl GameState {
    pub fn new(character: Character, starting_area: impl Into<String>) -> Self {
        Self {
            character,
            status_effects: StatusEffects::default(),
            current_area: starting_area.into(),
            flags: BTreeMap::new(),
            kills: 0,
            session_start: Some(Utc::now()),
        }
    }
}

/// Reads and writes the game state file.
///
/// Assumes a single process owns the file; concurrent writers race.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, or `None` if no game has been started.
    pub fn load(&self) -> Result<Option<GameState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Load the state, failing if no game has been started.
    pub fn load_existing(&self) -> Result<GameState> {
        self.load()?
            .ok_or_else(|| Error::NoCharacter(self.path.clone()))
    }

    /// Write the whole state atomically: temp file, then rename over the target.
    pub fn save(&self, state: &GameState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "saved game state");
        Ok(())
    }
}
