//! Broadside - authoritative simulation core for a top-down naval combat game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, combat, progression)
//! - `snapshot`: Read-only per-tick world view for renderers
//! - `game`: Fixed-rate driver, request handling and persistence flushing
//! - `persistence`: Key-value store interface and versioned save records
//! - `highscores`: Top-10 leaderboard of finished games
//! - `settings`: Tunable simulation configuration

pub mod game;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use game::{ConsumerError, Game, SnapshotConsumer};
pub use highscores::HighScores;
pub use settings::SimConfig;
pub use snapshot::WorldSnapshot;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference tick rate (20 Hz / 50 ms)
    pub const TICK_RATE_HZ: u32 = 20;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 4000.0;
    pub const WORLD_HEIGHT: f32 = 4000.0;
    /// Smallest world edge a config may ask for; fits any neutral with its spawn margin
    pub const MIN_WORLD_SIZE: f32 = 200.0;
    /// Fraction of the world kept clear around the edge when picking spawn points
    pub const SAFE_SPAWN_MARGIN: f32 = 0.1;

    /// Collision radii
    pub const SHIP_RADIUS: f32 = 18.0;
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const DRONE_RADIUS: f32 = 8.0;
    /// Gap left between a resolved entity and the island it was pushed out of
    pub const COLLISION_EPSILON: f32 = 0.5;

    /// Ship engagement range, also the spatial grid cell size
    pub const ENGAGEMENT_RANGE: f32 = 400.0;

    /// Projectiles
    pub const BULLET_SPEED: f32 = 600.0;
    pub const BULLET_LIFETIME_MS: f32 = 1500.0;
    pub const SHELL_SPEED: f32 = 420.0;
    pub const SHELL_LIFETIME_MS: f32 = 2200.0;
    pub const TURRET_BULLET_SPEED: f32 = 450.0;
    pub const TURRET_BULLET_LIFETIME_MS: f32 = 1800.0;

    /// Drones
    pub const DRONE_SPEED: f32 = 220.0;
    pub const DRONE_TURN_RATE: f32 = 3.5;
    pub const DRONE_HEALTH: f32 = 20.0;
    pub const DRONE_DAMAGE: f32 = 15.0;
    pub const DRONE_LIFETIME_MS: f32 = 8000.0;
    pub const DRONE_SEEK_RANGE: f32 = 450.0;
    /// Homing drones strike a neutral once this close to its hull
    pub const DRONE_CONTACT_DISTANCE: f32 = 10.0;
    pub const DRONES_PER_LAUNCH: u32 = 3;

    /// Ship-vs-ship contact damage applied to both ships per overlapping tick
    pub const COLLISION_DAMAGE: f32 = 2.0;
    /// Velocity retained per second when not thrusting
    pub const SHIP_DRAG: f32 = 0.2;

    /// Neutral placement
    pub const NEUTRAL_ISLAND_CLEARANCE: f32 = 60.0;
    pub const NEUTRAL_SPAWN_RETRIES: u32 = 10;
    /// Heading jitter (radians) applied when a moving neutral bounces off an island
    pub const NEUTRAL_BOUNCE_JITTER: f32 = 0.3;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along a heading
#[inline]
pub fn heading_to_vec(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Rotate `current` toward `target` by at most `max_delta` radians (shortest way round)
pub fn turn_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = normalize_angle(target - current);
    normalize_angle(current + delta.clamp(-max_delta, max_delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - -PI).abs() < 1e-4);
        assert!((normalize_angle(-PI / 2.0) - -PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_turn_toward_takes_short_way() {
        // From just below +π to just above -π is a tiny step across the seam
        let turned = turn_toward(PI - 0.1, -PI + 0.1, 1.0);
        assert!((normalize_angle(turned - (-PI + 0.1))).abs() < 1e-4);

        // Rate limited
        let turned = turn_toward(0.0, 1.0, 0.25);
        assert!((turned - 0.25).abs() < 1e-6);
    }
}
