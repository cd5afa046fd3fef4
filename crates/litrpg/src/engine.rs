// ABOUTME: The game engine that owns one character's state for a command.
// ABOUTME: Combat, status effects, progression and inventory are implemented in sibling modules.

use crate::config::GameConfig;
use crate::content::Catalog;
use crate::events::{EventSink, GameEvent};
use crate::roller::Rng;
use crate::state::GameState;

/// Applies game rules to a [`GameState`].
///
/// Every operation validates first and mutates second, so an `Err` leaves the
/// state exactly as it was. Persisting the state is the caller's job.
pub struct Engine<R: Rng, S: EventSink> {
    pub(crate) config: GameConfig,
    pub(crate) catalog: Catalog,
    pub(crate) state: GameState,
    pub(crate) rng: R,
    pub(crate) sink: S,
}

impl<R: Rng, S: EventSink> Engine<R, S> {
    pub fn new(config: GameConfig, catalog: Catalog, state: GameState, rng: R, sink: S) -> Self {
        Self {
            config,
            catalog,
            state,
            rng,
            sink,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        tracing::info!(%event, "game event");
        self.sink.emit(event);
    }

    pub(crate) fn has_effect(&self, name: &str) -> bool {
        self.state.status_effects.contains(name)
    }

    /// Sum a numeric field over the configs of every active effect.
    pub(crate) fn effect_total(&self, field: impl Fn(&crate::config::EffectConfig) -> i64) -> i64 {
        self.state
            .status_effects
            .names()
            .filter_map(|name| self.config.effect(name))
            .map(field)
            .sum()
    }
}
