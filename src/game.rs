//! Fixed-rate game driver
//!
//! Owns the world, the key-value store and the high score table. Runs ticks
//! from an elapsed-time accumulator, hands each snapshot and its events to the
//! registered consumers, and flushes queued persistence after every tick.
//! Store and consumer failures are logged and never stop the simulation.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::highscores::HighScores;
use crate::persistence::{KeyValueStore, ProgressionRecord};
use crate::settings::SimConfig;
use crate::sim::entities::PlayerId;
use crate::sim::events::GameEvent;
use crate::sim::progression;
use crate::sim::ship::{ShipClass, StatKind};
use crate::sim::state::{JoinInfo, ShipInput, World};
use crate::sim::tick::tick;
use crate::snapshot::WorldSnapshot;

/// Failure reported by a snapshot consumer
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("consumer disconnected")]
    Disconnected,
    #[error("consumer failed: {0}")]
    Failed(String),
}

/// Receives one snapshot and the events of that tick, once per tick
pub trait SnapshotConsumer {
    fn consume(&mut self, snapshot: &WorldSnapshot, events: &[GameEvent]) -> Result<(), ConsumerError>;
}

pub struct Game {
    world: World,
    store: Box<dyn KeyValueStore>,
    high_scores: HighScores,
    consumers: Vec<Box<dyn SnapshotConsumer>>,
    /// Sim time not yet consumed by a tick (ms)
    accumulator_ms: u64,
    /// Sim clock handed to the next tick (ms)
    clock_ms: u64,
    last_snapshot: WorldSnapshot,
}

impl Game {
    pub fn new(config: SimConfig, store: Box<dyn KeyValueStore>) -> Self {
        let world = World::new(config);
        let high_scores = HighScores::load(&*store);
        let last_snapshot = WorldSnapshot::capture(&world);
        Self {
            world,
            store,
            high_scores,
            consumers: Vec::new(),
            accumulator_ms: 0,
            clock_ms: 0,
            last_snapshot,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        &*self.store
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    /// Rank the player's current score would take on the high score table
    pub fn projected_rank(&self, id: PlayerId) -> Option<usize> {
        let player = self.world.players.get(id)?;
        self.high_scores.potential_rank(player.ship.score)
    }

    /// Snapshot of the most recent tick (or of the initial world)
    pub fn last_snapshot(&self) -> &WorldSnapshot {
        &self.last_snapshot
    }

    pub fn add_consumer(&mut self, consumer: Box<dyn SnapshotConsumer>) {
        self.consumers.push(consumer);
    }

    /// Join the player whose progression lives in the local save slot
    pub fn join_local(&mut self, name: &str) -> JoinInfo {
        let record = ProgressionRecord::load(&*self.store);
        self.world.join(name, true, record.as_ref())
    }

    /// Join a remote or bot player with fresh progression
    pub fn join(&mut self, name: &str) -> JoinInfo {
        self.world.join(name, false, None)
    }

    pub fn leave(&mut self, id: PlayerId) -> bool {
        self.world.leave(id)
    }

    /// Buffer input for the next tick
    pub fn set_input(&mut self, id: PlayerId, input: ShipInput) -> bool {
        self.world.set_input(id, input)
    }

    pub fn upgrade_stat(&mut self, id: PlayerId, stat: StatKind) -> bool {
        progression::upgrade_stat(&mut self.world, id, stat)
    }

    pub fn upgrade_ship_class(&mut self, id: PlayerId, class: ShipClass) -> bool {
        progression::upgrade_ship_class(&mut self.world, id, class)
    }

    pub fn respawn(&mut self, id: PlayerId) -> bool {
        progression::respawn(&mut self.world, id)
    }

    /// Feed real elapsed time and run as many whole ticks as it covers
    ///
    /// At most `max_substeps` ticks run per call; a longer stall is dropped
    /// rather than replayed. Returns the number of ticks run.
    pub fn advance(&mut self, elapsed_ms: u64) -> u32 {
        let tick_ms = self.world.config.tick_ms();
        let max_substeps = self.world.config.max_substeps.max(1);
        self.accumulator_ms += elapsed_ms.min(tick_ms * u64::from(max_substeps));

        let mut substeps = 0;
        while self.accumulator_ms >= tick_ms && substeps < max_substeps {
            self.step();
            self.accumulator_ms -= tick_ms;
            substeps += 1;
        }
        substeps
    }

    /// Run exactly one tick, publish it and flush persistence
    pub fn step(&mut self) -> &WorldSnapshot {
        self.clock_ms += self.world.config.tick_ms();
        let snapshot = tick(&mut self.world, self.clock_ms);
        let events = self.world.drain_events();

        self.flush_pending_writes();

        for consumer in &mut self.consumers {
            if let Err(e) = consumer.consume(&snapshot, &events) {
                log::warn!("Snapshot consumer error at tick {}: {}", snapshot.tick, e);
            }
        }

        self.last_snapshot = snapshot;
        &self.last_snapshot
    }

    fn flush_pending_writes(&mut self) {
        let pending = self.world.take_pending_writes();
        if pending.is_empty() {
            return;
        }

        if let Some(record) = pending.progression {
            if let Err(e) = record.save(self.store.as_mut()) {
                log::warn!("Failed to save progression: {}", e);
            }
        }

        if pending.finished_games.is_empty() {
            return;
        }
        let date = unix_time_ms();
        for (name, score) in pending.finished_games {
            if let Some(rank) = self.high_scores.add_score(&name, score, date) {
                log::info!("New high score #{}: {} ({})", rank, name, score);
            }
        }
        if let Err(e) = self.high_scores.save(self.store.as_mut()) {
            log::warn!("Failed to save high scores: {}", e);
        }
    }
}

fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
