//! World state and core simulation types
//!
//! The `World` owns every entity collection. Other components borrow it for
//! the duration of a single call and never keep references across ticks.

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

use super::arena::{Arena, Keyed};
use super::collision::CollisionGrids;
use super::entities::{Bullet, Drone, EntityId, Island, NeutralKind, NeutralObject, PlayerId};
use super::events::GameEvent;
use super::geometry::clamp_outside_circle_along_segment;
use super::ship::Ship;
use crate::consts::*;
use crate::persistence::{PendingWrites, ProgressionRecord};
use crate::settings::SimConfig;
use crate::snapshot::IslandView;

/// Last-known intent for a ship, replaced wholesale on every update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipInput {
    /// Trusted position from a local-authority client; `None` means integrate thrust
    pub target_pos: Option<Vec2>,
    /// Desired heading (radians)
    pub heading: f32,
    pub thrust: bool,
    pub fire: bool,
    pub use_ability: bool,
}

/// Session wrapper around a ship
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ship: Ship,
    pub input: ShipInput,
    /// Earliest sim time the guns may fire again
    pub next_fire_ms: u64,
    /// Damage is ignored until this sim time
    pub protected_until_ms: u64,
    pub is_dead: bool,
    pub death_time_ms: Option<u64>,
    pub upgrade_points: u32,
    /// Progression for this player is written to the local save slot
    pub is_local: bool,
}

impl Player {
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn is_protected(&self, now_ms: u64) -> bool {
        now_ms < self.protected_until_ms
    }

    /// Alive, visible and not spawn protected
    pub fn is_targetable(&self, now_ms: u64) -> bool {
        self.is_alive() && !self.ship.stealthed && !self.is_protected(now_ms)
    }
}

impl Keyed for Player {
    type Id = PlayerId;
    fn id(&self) -> PlayerId {
        self.id
    }
}

/// Returned to a joining client
#[derive(Debug, Clone)]
pub struct JoinInfo {
    pub player_id: PlayerId,
    pub islands: Arc<[IslandView]>,
}

/// Complete authoritative simulation state
#[derive(Debug)]
pub struct World {
    pub config: SimConfig,
    pub rng: Pcg32,
    /// Sim clock of the most recent tick (ms)
    pub now_ms: u64,
    pub tick_count: u64,
    pub players: Arena<Player>,
    pub bullets: Arena<Bullet>,
    pub neutrals: Arena<NeutralObject>,
    pub drones: Arena<Drone>,
    /// Immutable after construction
    pub islands: Vec<Island>,
    pub last_neutral_spawn_ms: u64,
    pub(crate) island_views: Arc<[IslandView]>,
    pub(crate) grids: CollisionGrids,
    events: Vec<GameEvent>,
    pending: PendingWrites,
    next_player_id: u32,
    next_bullet_id: u32,
    next_neutral_id: u32,
    next_drone_id: u32,
}

impl World {
    /// Create a world, generate its islands and seed the initial neutrals
    pub fn new(config: SimConfig) -> Self {
        let config = config.sanitized();
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let islands = generate_islands(&config, &mut rng);
        let island_views: Arc<[IslandView]> = islands.iter().map(IslandView::from).collect();

        let mut world = Self {
            config,
            rng,
            now_ms: 0,
            tick_count: 0,
            players: Arena::new(),
            bullets: Arena::new(),
            neutrals: Arena::new(),
            drones: Arena::new(),
            islands,
            last_neutral_spawn_ms: 0,
            island_views,
            grids: CollisionGrids::default(),
            events: Vec::new(),
            pending: PendingWrites::default(),
            next_player_id: 1,
            next_bullet_id: 1,
            next_neutral_id: 1,
            next_drone_id: 1,
        };

        for _ in 0..world.config.initial_neutrals {
            let kind = NeutralKind::weighted_random(&mut world.rng);
            world.spawn_neutral(kind);
        }

        log::info!(
            "World initialized: {}x{}, {} islands, {} neutrals",
            world.config.world_width,
            world.config.world_height,
            world.islands.len(),
            world.neutrals.len()
        );
        world
    }

    pub fn island_views(&self) -> Arc<[IslandView]> {
        Arc::clone(&self.island_views)
    }

    /// Add a player with a fresh ship at a random safe position
    ///
    /// A `restore` record replaces the starting progression.
    pub fn join(&mut self, name: &str, is_local: bool, restore: Option<&ProgressionRecord>) -> JoinInfo {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;

        let pos = self.random_spawn_point();
        let heading = self.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        let mut ship = Ship::new(pos, heading);
        let mut upgrade_points = 0;
        if let Some(record) = restore {
            record.apply_to(&mut ship);
            upgrade_points = record.upgrade_points;
        }

        let player = Player {
            id,
            name: name.to_string(),
            ship,
            input: ShipInput {
                heading,
                ..Default::default()
            },
            next_fire_ms: 0,
            protected_until_ms: self.now_ms + self.config.spawn_protection_ms,
            is_dead: false,
            death_time_ms: None,
            upgrade_points,
            is_local,
        };
        self.players.insert(player);

        log::info!("Player {} joined as {:?} at ({:.0}, {:.0})", name, id, pos.x, pos.y);
        self.emit(GameEvent::PlayerAssigned { player_id: id });
        self.emit(GameEvent::WorldInitialized {
            islands: self.island_views.to_vec(),
        });

        JoinInfo {
            player_id: id,
            islands: self.island_views(),
        }
    }

    /// Remove a player; their projectiles and drones stay in flight
    pub fn leave(&mut self, id: PlayerId) -> bool {
        let removed = self.players.remove(id);
        if let Some(player) = &removed {
            log::info!("Player {} left", player.name);
        }
        removed.is_some()
    }

    /// Replace a player's buffered input; ignored for unknown players
    pub fn set_input(&mut self, id: PlayerId, input: ShipInput) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.input = input;
                true
            }
            None => false,
        }
    }

    pub fn next_bullet_id(&mut self) -> EntityId {
        let id = EntityId(self.next_bullet_id);
        self.next_bullet_id += 1;
        id
    }

    pub fn next_drone_id(&mut self) -> EntityId {
        let id = EntityId(self.next_drone_id);
        self.next_drone_id += 1;
        id
    }

    pub fn next_neutral_id(&mut self) -> EntityId {
        let id = EntityId(self.next_neutral_id);
        self.next_neutral_id += 1;
        id
    }

    /// Place a neutral of `kind` away from islands; `None` if no spot was found
    pub fn spawn_neutral(&mut self, kind: NeutralKind) -> Option<EntityId> {
        let margin = kind.radius() + 20.0;
        if self.config.world_width <= 2.0 * margin || self.config.world_height <= 2.0 * margin {
            log::debug!("World too small for {:?}, skipping spawn", kind);
            return None;
        }
        for _ in 0..NEUTRAL_SPAWN_RETRIES {
            let pos = Vec2::new(
                self.rng.random_range(margin..self.config.world_width - margin),
                self.rng.random_range(margin..self.config.world_height - margin),
            );
            let clear = self
                .islands
                .iter()
                .all(|island| pos.distance(island.center) >= island.radius + NEUTRAL_ISLAND_CLEARANCE);
            if !clear {
                continue;
            }

            let heading = self.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
            let id = self.next_neutral_id();
            self.neutrals.insert(NeutralObject::new(id, kind, pos, heading));
            log::debug!("Spawned {:?} {:?} at ({:.0}, {:.0})", kind, id, pos.x, pos.y);
            return Some(id);
        }
        log::debug!("No clear spot for {:?}, skipping spawn", kind);
        None
    }

    /// Random point in the inner region of the world, outside every island
    pub fn random_spawn_point(&mut self) -> Vec2 {
        let (w, h) = (self.config.world_width, self.config.world_height);
        let (min_x, max_x) = (w * SAFE_SPAWN_MARGIN, w * (1.0 - SAFE_SPAWN_MARGIN));
        let (min_y, max_y) = (h * SAFE_SPAWN_MARGIN, h * (1.0 - SAFE_SPAWN_MARGIN));
        let clearance = SHIP_RADIUS + 40.0;

        let mut candidate = Vec2::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5);
        for _ in 0..20 {
            candidate = Vec2::new(
                self.rng.random_range(min_x..max_x),
                self.rng.random_range(min_y..max_y),
            );
            let clear = self
                .islands
                .iter()
                .all(|island| candidate.distance(island.center) >= island.radius + clearance);
            if clear {
                return candidate;
            }
        }

        // Crowded map: push the last candidate out of whatever it landed in
        for island in &self.islands {
            candidate =
                clamp_outside_circle_along_segment(candidate, candidate, SHIP_RADIUS, island.center, island.radius);
        }
        candidate
    }

    /// Clamp a point so a circle of `radius` stays inside the world
    pub fn clamp_to_bounds(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(radius, (self.config.world_width - radius).max(radius)),
            pos.y.clamp(radius, (self.config.world_height - radius).max(radius)),
        )
    }

    /// Queue a notification for the current tick
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event queued since the last drain, in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Record the local player's current progression for the next flush
    pub fn queue_progression_save(&mut self, id: PlayerId) {
        if let Some(player) = self.players.get(id) {
            if player.is_local {
                self.pending.progression = Some(ProgressionRecord::from_player(player));
            }
        }
    }

    /// Record a finished game for the high score table
    pub fn queue_finished_game(&mut self, name: &str, score: u64) {
        self.pending.finished_games.push((name.to_string(), score));
    }

    /// Take persistence work accumulated since the last flush
    pub fn take_pending_writes(&mut self) -> PendingWrites {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_writes(&self) -> &PendingWrites {
        &self.pending
    }
}

/// Scatter non-overlapping islands across the world
fn generate_islands(config: &SimConfig, rng: &mut Pcg32) -> Vec<Island> {
    const ISLAND_GAP: f32 = 120.0;
    const ATTEMPTS_PER_ISLAND: u32 = 30;

    let mut islands: Vec<Island> = Vec::with_capacity(config.island_count as usize);
    let mut next_id = 1;

    for _ in 0..config.island_count {
        for _ in 0..ATTEMPTS_PER_ISLAND {
            let radius = if config.island_max_radius > config.island_min_radius {
                rng.random_range(config.island_min_radius..config.island_max_radius)
            } else {
                config.island_min_radius
            };
            let edge = radius + 100.0;
            if config.world_width <= 2.0 * edge || config.world_height <= 2.0 * edge {
                break;
            }
            let center = Vec2::new(
                rng.random_range(edge..config.world_width - edge),
                rng.random_range(edge..config.world_height - edge),
            );
            let overlaps = islands
                .iter()
                .any(|other| center.distance(other.center) < other.radius + radius + ISLAND_GAP);
            if overlaps {
                continue;
            }

            islands.push(Island::generate(EntityId(next_id), center, radius, rng.next_u64()));
            next_id += 1;
            break;
        }
    }
    islands
}
