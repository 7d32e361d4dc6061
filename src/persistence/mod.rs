//! Save/load persistence against an external key-value store
//!
//! Features:
//! - `KeyValueStore` trait with in-memory and directory-backed stores
//! - Versioned JSON progression record for the single local save slot
//! - Defensive loading: missing, corrupt or out-of-range data falls back to defaults

pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use serde::{Deserialize, Serialize};

use crate::sim::progression::MAX_LEVEL;
use crate::sim::ship::{Ship, ShipClass, StatBlock};
use crate::sim::state::Player;

/// Key of the local progression save slot
pub const PROGRESSION_KEY: &str = "broadside_progression";

/// Current progression record format
pub const PROGRESSION_VERSION: u32 = 1;

/// Persisted progression of the local player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRecord {
    pub version: u32,
    pub score: u64,
    pub level: u32,
    pub xp: u32,
    /// Stored by name so an unknown class degrades to the starting class
    pub ship_class: String,
    pub stats: StatBlock,
    pub upgrade_points: u32,
}

impl Default for ProgressionRecord {
    fn default() -> Self {
        Self {
            version: PROGRESSION_VERSION,
            score: 0,
            level: 1,
            xp: 0,
            ship_class: ShipClass::default().as_str().to_string(),
            stats: StatBlock::default(),
            upgrade_points: 0,
        }
    }
}

impl ProgressionRecord {
    pub fn from_player(player: &Player) -> Self {
        Self {
            version: PROGRESSION_VERSION,
            score: player.ship.score,
            level: player.ship.level,
            xp: player.ship.xp,
            ship_class: player.ship.class.as_str().to_string(),
            stats: player.ship.stats,
            upgrade_points: player.upgrade_points,
        }
    }

    pub fn class(&self) -> ShipClass {
        ShipClass::from_name(&self.ship_class).unwrap_or_default()
    }

    /// Restore this progression onto a freshly built ship (full health)
    pub fn apply_to(&self, ship: &mut Ship) {
        ship.score = self.score;
        ship.level = self.level;
        ship.xp = self.xp;
        ship.stats = self.stats;
        let class = self.class();
        // A class the restored level has not unlocked falls back to the start class
        ship.class = if class.stats().unlock_level <= self.level {
            class
        } else {
            ShipClass::default()
        };
        ship.max_health = ship.derived_max_health();
        ship.heal_full();
    }

    /// Clamp every field into its legal range
    pub fn sanitized(mut self) -> Self {
        self.level = self.level.clamp(1, MAX_LEVEL);
        self.stats = self.stats.clamped();
        if ShipClass::from_name(&self.ship_class).is_none() {
            log::warn!("Unknown ship class '{}' in save, using default", self.ship_class);
            self.ship_class = ShipClass::default().as_str().to_string();
        }
        self
    }

    /// Parse a stored record; `None` for anything unusable
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<ProgressionRecord>(json) {
            Ok(record) if record.version == PROGRESSION_VERSION => Some(record.sanitized()),
            Ok(record) => {
                log::warn!(
                    "Progression save version {} (expected {}), starting fresh",
                    record.version,
                    PROGRESSION_VERSION
                );
                None
            }
            Err(e) => {
                log::warn!("Corrupt progression save: {}", e);
                None
            }
        }
    }

    /// Load from the store; never fails, falls back to `None` (default start)
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        match store.get(PROGRESSION_KEY) {
            Ok(Some(json)) => {
                let record = Self::from_json(&json);
                if let Some(record) = &record {
                    log::info!("Loaded progression: level {} {}", record.level, record.ship_class);
                }
                record
            }
            Ok(None) => {
                log::info!("No saved progression found, starting fresh");
                None
            }
            Err(e) => {
                log::warn!("Failed to read progression: {}", e);
                None
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(PROGRESSION_KEY, &json)
    }
}

/// Persistence work produced by a tick, flushed by the driver afterwards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingWrites {
    /// Latest progression of the local player (only the newest matters)
    pub progression: Option<ProgressionRecord>,
    /// (name, final score) of local games that ended
    pub finished_games: Vec<(String, u64)>,
}

impl PendingWrites {
    pub fn is_empty(&self) -> bool {
        self.progression.is_none() && self.finished_games.is_empty()
    }
}
