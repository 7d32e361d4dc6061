//! Broadside headless entry point
//!
//! Runs the simulation at its fixed tick rate with one local captain and a
//! fleet of bots, logging kills and the leaderboard.
//!
//! Usage: `broadside [config.json]`
//! Environment:
//! - `RUST_LOG`: log filter (e.g. `info`)
//! - `BROADSIDE_SAVE_DIR`: directory for progression and high scores (in-memory otherwise)
//! - `BROADSIDE_SECONDS`: how long to run (default 30)

use std::path::PathBuf;
use std::time::{Duration, Instant};

use broadside::persistence::{FileStore, KeyValueStore, MemoryStore};
use broadside::sim::{GameEvent, PlayerId, StatKind, bot_input};
use broadside::{ConsumerError, Game, SimConfig, SnapshotConsumer, WorldSnapshot};

const BOT_NAMES: [&str; 7] = ["Drake", "Nelson", "Tromp", "Yi Sun-sin", "Jervis", "Ruyter", "Farragut"];
/// Dead ships come back after this long (ms)
const RESPAWN_DELAY_MS: u64 = 3000;
/// Leaderboard log interval in ticks
const LEADERBOARD_EVERY: u64 = 100;
/// Bots spend points round-robin over these
const STAT_ORDER: [StatKind; 4] = [StatKind::Reload, StatKind::Damage, StatKind::Health, StatKind::Speed];

/// Logs kill feed and level-ups as they happen, the leaderboard periodically
struct LogConsumer;

impl SnapshotConsumer for LogConsumer {
    fn consume(&mut self, snapshot: &WorldSnapshot, events: &[GameEvent]) -> Result<(), ConsumerError> {
        for event in events {
            match event {
                GameEvent::KillFeed { killer, victim } => log::info!("{} sank {}", killer, victim),
                GameEvent::LevelUp { player_id, level, .. } => log::info!("{:?} is now level {}", player_id, level),
                _ => {}
            }
        }

        if snapshot.tick % LEADERBOARD_EVERY == 0 {
            log::info!(
                "Tick {}: {} ships, {} neutrals, {} bullets, {} drones",
                snapshot.tick,
                snapshot.ships.len(),
                snapshot.neutrals.len(),
                snapshot.bullets.len(),
                snapshot.drones.len()
            );
            for (rank, entry) in snapshot.leaderboard.iter().enumerate() {
                log::info!("  #{:<2} {:<12} lvl {:<2} {}", rank + 1, entry.name, entry.level, entry.score);
            }
        }
        Ok(())
    }
}

fn open_store() -> Box<dyn KeyValueStore> {
    match std::env::var("BROADSIDE_SAVE_DIR") {
        Ok(dir) => match FileStore::open(&dir) {
            Ok(store) => {
                log::info!("Saving to {}", dir);
                Box::new(store)
            }
            Err(e) => {
                log::warn!("Cannot open save dir {}: {} - saves will not persist", dir, e);
                Box::new(MemoryStore::new())
            }
        },
        Err(_) => Box::new(MemoryStore::new()),
    }
}

/// Steer every ship, spend points and respawn the fallen
fn drive_fleet(game: &mut Game, fleet: &[PlayerId]) {
    let now = game.world().now_ms;
    for &id in fleet {
        let Some(player) = game.world().players.get(id) else {
            continue;
        };

        if player.is_dead {
            let due = player.death_time_ms.is_some_and(|t| now >= t + RESPAWN_DELAY_MS);
            if due {
                game.respawn(id);
            }
            continue;
        }

        let points = player.upgrade_points;
        let current = player.ship.class;
        let next_class = current
            .available_upgrades(player.ship.level)
            .into_iter()
            .filter(|c| c.stats().unlock_level > current.stats().unlock_level)
            .max_by_key(|c| c.stats().unlock_level);
        let input = bot_input(game.world(), id);

        game.set_input(id, input);
        if let Some(class) = next_class {
            game.upgrade_ship_class(id, class);
        }
        for i in 0..points {
            let stat = STAT_ORDER[(id.0 + i) as usize % STAT_ORDER.len()];
            if !game.upgrade_stat(id, stat) {
                break;
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Broadside (headless) starting...");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SimConfig::load(config_path.as_deref());
    let tick_ms = config.tick_ms();
    let seconds: u64 = std::env::var("BROADSIDE_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    let mut game = Game::new(config, open_store());
    game.add_consumer(Box::new(LogConsumer));

    let captain = game.join_local("Captain").player_id;
    let mut fleet = vec![captain];
    fleet.extend(BOT_NAMES.iter().map(|name| game.join(name).player_id));

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last = Instant::now();
    while Instant::now() < deadline {
        drive_fleet(&mut game, &fleet);

        let now = Instant::now();
        let elapsed = now.duration_since(last).as_millis() as u64;
        last = now;
        game.advance(elapsed);

        std::thread::sleep(Duration::from_millis(tick_ms));
    }

    if let Some(rank) = game.projected_rank(captain) {
        log::info!("Captain's current score would place #{}", rank);
    }
    if let Some(best) = game.high_scores().entries.first() {
        log::info!("Best finished game: {} with {}", best.name, best.score);
    }
    log::info!("Broadside stopped after {} ticks", game.world().tick_count);
}

#[cfg(target_arch = "wasm32")]
fn main() {}
