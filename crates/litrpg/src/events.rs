// ABOUTME: Game events and the sinks that record them.
// ABOUTME: Events are fire-and-forget; the session log sink appends timestamped lines.

use crate::state::Slot;
use chrono::Local;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Something narratively interesting that happened to the character.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    DamageDealt {
        amount: i64,
        target: String,
        critical: bool,
        sneak_attack: bool,
    },
    DamageTaken {
        amount: i64,
        source: String,
        armor_reduced: i64,
        hp_remaining: i64,
    },
    StatusApplied {
        status: String,
        duration: i64,
    },
    StatusRemoved {
        status: String,
    },
    ItemAcquired {
        item: String,
        quantity: u32,
    },
    ItemUsed {
        item: String,
        effect: String,
    },
    ItemEquipped {
        item: String,
        slot: Slot,
        unequipped: Option<String>,
    },
    XpGained {
        amount: i64,
        total_xp: i64,
        current_level: i64,
    },
    LevelUp {
        new_level: i64,
        hp_max: i64,
        mp_max: i64,
        stamina_max: i64,
        location: String,
    },
    AreaEntered {
        area: String,
        level: i64,
        description: String,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::DamageDealt { amount, target, .. } => {
                write!(f, "DAMAGE: Dealt {amount} to {target}")
            }
            GameEvent::DamageTaken { amount, source, .. } => {
                write!(f, "DAMAGE: Took {amount} from {source}")
            }
            GameEvent::StatusApplied { status, duration } => {
                write!(f, "STATUS: {status} applied for {duration} turns")
            }
            GameEvent::StatusRemoved { status } => write!(f, "STATUS: {status} removed"),
            GameEvent::ItemAcquired { item, quantity } => {
                write!(f, "ITEM: Acquired {item} x{quantity}")
            }
            GameEvent::ItemUsed { item, effect } => write!(f, "ITEM: Used {item} {effect}"),
            GameEvent::ItemEquipped { item, slot, .. } => {
                write!(f, "EQUIP: {item} equipped to {slot}")
            }
            GameEvent::XpGained { amount, .. } => write!(f, "XP GAINED: +{amount} XP"),
            GameEvent::LevelUp { new_level, .. } => {
                write!(f, "LEVEL UP: Reached level {new_level}")
            }
            GameEvent::AreaEntered { area, level, .. } => {
                write!(f, "AREA: Entered {area} (Level {level})")
            }
        }
    }
}

/// Receives events from the engine. Nothing is returned to the caller.
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Appends `[HH:MM:SS] message` lines to the session narrative log.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {}", Local::now().format("%H:%M:%S"), line)
    }
}

impl EventSink for SessionLog {
    fn emit(&mut self, event: GameEvent) {
        if let Err(e) = self.append(&event.to_string()) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write session log");
        }
    }
}
