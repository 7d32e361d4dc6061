//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (dense arenas, no hash-ordered walks)
//! - No I/O; persistence is queued and flushed by the driver

pub mod ai;
pub mod arena;
pub mod collision;
pub mod entities;
pub mod events;
pub mod geometry;
pub mod grid;
pub mod progression;
pub mod ship;
pub mod state;
pub mod tick;

pub use ai::bot_input;
pub use arena::{Arena, Keyed};
pub use collision::resolve_collisions;
pub use entities::{Bullet, Drone, EntityId, Island, NeutralKind, NeutralObject, Owner, PlayerId, WeaponType};
pub use events::{DamageTarget, GameEvent, Killer};
pub use geometry::{circles_overlap, clamp_outside_circle_along_segment, first_segment_circle_hit, point_in_circle};
pub use grid::SpatialHashGrid;
pub use progression::{
    MAX_LEVEL, XP_TABLE, award_xp, handle_death, respawn, upgrade_ship_class, upgrade_stat, xp_to_next_level,
};
pub use ship::{Ability, Ship, ShipClass, StatBlock, StatKind};
pub use state::{JoinInfo, Player, ShipInput, World};
pub use tick::tick;
