//! Notifications emitted on state transitions
//!
//! Events are queued on the world in the order they happen during a tick and
//! drained by the driver once per tick boundary.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entities::{EntityId, NeutralKind, PlayerId};
use super::ship::{Ability, ShipClass, StatBlock};
use crate::snapshot::IslandView;

/// Who landed a killing blow on a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Killer {
    Player { id: PlayerId, name: String },
    Neutral { id: EntityId, kind: NeutralKind },
    Unknown,
}

impl Killer {
    pub fn display_name(&self) -> String {
        match self {
            Killer::Player { name, .. } => name.clone(),
            Killer::Neutral { kind, .. } => kind.display_name().to_string(),
            Killer::Unknown => "Unknown".to_string(),
        }
    }
}

/// What received damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageTarget {
    Ship(PlayerId),
    Neutral(EntityId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerAssigned {
        player_id: PlayerId,
    },
    WorldInitialized {
        islands: Vec<IslandView>,
    },
    PlayerDied {
        player_id: PlayerId,
        killer: Killer,
        score: u64,
    },
    LevelUp {
        player_id: PlayerId,
        level: u32,
        upgrade_points: u32,
        available_classes: Vec<ShipClass>,
    },
    StatsChanged {
        player_id: PlayerId,
        stats: StatBlock,
        upgrade_points: u32,
        max_health: f32,
    },
    ClassChanged {
        player_id: PlayerId,
        class: ShipClass,
    },
    Respawned {
        player_id: PlayerId,
        pos: Vec2,
    },
    KillFeed {
        killer: String,
        victim: String,
    },
    /// `critical` marks a killing blow
    DamageDealt {
        target: DamageTarget,
        pos: Vec2,
        amount: f32,
        critical: bool,
    },
    XpGained {
        player_id: PlayerId,
        pos: Vec2,
        amount: u32,
    },
    AbilityActivated {
        player_id: PlayerId,
        ability: Ability,
    },
    NeutralDestroyed {
        id: EntityId,
        kind: NeutralKind,
        pos: Vec2,
    },
}
