// ABOUTME: Error types for the litrpg library.
// ABOUTME: Separates soft game-rule failures from fatal configuration and I/O errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid dice notation '{notation}': {reason}")]
    InvalidNotation { notation: String, reason: String },

    #[error("Unknown status effect: {0}")]
    UnknownEffect(String),

    #[error("Unknown spell: {0}")]
    UnknownSpell(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Unknown area: {0}")]
    UnknownArea(String),

    #[error("Unknown monster: {0}")]
    UnknownMonster(String),

    #[error("You don't have {0}")]
    ItemNotInInventory(String),

    #[error("{0} is not consumable")]
    NotConsumable(String),

    #[error("Insufficient mana: need {required}, have {available}")]
    InsufficientMana { required: i64, available: i64 },

    #[error("Invalid resource or attribute: {0}")]
    InvalidResource(String),

    #[error("No character found at {}; run `init` first", .0.display())]
    NoCharacter(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Machine-readable reason for soft failures.
    ///
    /// Soft failures are ordinary game outcomes (not enough mana, a typo in an
    /// item id) and are reported as `{"success": false, "reason": ...}`.
    /// Returns `None` for errors that should abort the command.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Error::InsufficientMana { .. } => Some("insufficient_mp"),
            Error::UnknownSpell(_) => Some("unknown_spell"),
            Error::UnknownEffect(_) => Some("unknown_effect"),
            Error::UnknownItem(_) => Some("unknown_item"),
            Error::UnknownArea(_) => Some("unknown_area"),
            Error::UnknownMonster(_) => Some("unknown_monster"),
            Error::ItemNotInInventory(_) => Some("item_not_in_inventory"),
            Error::NotConsumable(_) => Some("not_consumable"),
            Error::InvalidNotation { .. }
            | Error::InvalidResource(_)
            | Error::NoCharacter(_)
            | Error::Io(_)
            | Error::Json(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
