//! Simulation configuration
//!
//! Loaded from JSON; every field falls back to its default when absent.

use serde::{Deserialize, Serialize};

use crate::consts::{MIN_WORLD_SIZE, TICK_RATE_HZ, WORLD_HEIGHT, WORLD_WIDTH};

/// Tunable world and scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Scheduler ===
    /// Fixed ticks per second
    pub tick_rate_hz: u32,
    /// Maximum ticks run for one `advance` call (prevents spiral of death)
    pub max_substeps: u32,

    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    /// Seed for islands, spawns and AI jitter
    pub seed: u64,
    pub island_count: u32,
    pub island_min_radius: f32,
    pub island_max_radius: f32,

    // === Neutrals ===
    pub neutral_cap: usize,
    pub initial_neutrals: usize,
    pub neutral_spawn_interval_ms: u64,

    // === Players ===
    pub spawn_protection_ms: u64,
    pub leaderboard_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ,
            max_substeps: 4,

            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            seed: 0x5EA5_1DE5,
            island_count: 14,
            island_min_radius: 80.0,
            island_max_radius: 220.0,

            neutral_cap: 40,
            initial_neutrals: 20,
            neutral_spawn_interval_ms: 1500,

            spawn_protection_ms: 3000,
            leaderboard_size: 10,
        }
    }
}

impl SimConfig {
    /// Milliseconds per tick
    pub fn tick_ms(&self) -> u64 {
        1000 / u64::from(self.tick_rate_hz.max(1))
    }

    /// Seconds per tick
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    /// True if `pos` lies inside the world rectangle (edges included)
    pub fn in_bounds(&self, pos: glam::Vec2) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= self.world_width && pos.y <= self.world_height
    }

    /// Parse a JSON config; unknown fields are ignored, missing ones defaulted
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::sanitized)
    }

    /// Load from a file path, falling back to defaults on any problem
    pub fn load(path: Option<&std::path::Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default simulation config");
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded simulation config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Invalid config {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read config {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Repair values that would break the simulation
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.tick_rate_hz == 0 {
            self.tick_rate_hz = defaults.tick_rate_hz;
        }
        let usable = |edge: f32| edge.is_finite() && edge >= MIN_WORLD_SIZE;
        if !usable(self.world_width) || !usable(self.world_height) {
            log::warn!(
                "World {}x{} is below the {} minimum - using {}x{}",
                self.world_width,
                self.world_height,
                MIN_WORLD_SIZE,
                defaults.world_width,
                defaults.world_height
            );
            self.world_width = defaults.world_width;
            self.world_height = defaults.world_height;
        }
        if self.island_min_radius > self.island_max_radius {
            std::mem::swap(&mut self.island_min_radius, &mut self.island_max_radius);
        }
        self.max_substeps = self.max_substeps.max(1);
        self.initial_neutrals = self.initial_neutrals.min(self.neutral_cap);
        self
    }
}
