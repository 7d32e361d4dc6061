//! Combat outcomes and player progression
//!
//! Death handling, XP and leveling, stat upgrades, class switches and respawn.
//! Invalid requests (unknown player, no points, locked class) change nothing
//! and return `false`.

use glam::Vec2;
use rand::Rng;

use super::entities::{Owner, PlayerId};
use super::events::{GameEvent, Killer};
use super::ship::{Ship, ShipClass, StatKind};
use super::state::{ShipInput, World};

/// Level cap
pub const MAX_LEVEL: u32 = 10;

/// XP needed to advance from level `i + 1` to `i + 2`
pub const XP_TABLE: [u32; (MAX_LEVEL - 1) as usize] = [40, 90, 150, 225, 320, 440, 580, 750, 950];

/// Score awarded per point of XP
pub const XP_SCORE_MULTIPLIER: u64 = 10;
/// Score bonus for a kill, per level of the victim
pub const KILL_SCORE_PER_LEVEL: u64 = 100;
/// XP for a kill, per level of the victim
pub const KILL_XP_PER_LEVEL: u32 = 20;

/// XP required to leave `level`, or `None` at the cap
pub fn xp_to_next_level(level: u32) -> Option<u32> {
    if level == 0 || level >= MAX_LEVEL {
        return None;
    }
    XP_TABLE.get((level - 1) as usize).copied()
}

/// Kill a player and credit whoever caused it
///
/// Idempotent: an already-dead or unknown player is a no-op returning `false`.
pub fn handle_death(world: &mut World, victim_id: PlayerId, cause: Option<Owner>) -> bool {
    let now = world.now_ms;
    let Some(victim) = world.players.get_mut(victim_id) else {
        return false;
    };
    if victim.is_dead {
        return false;
    }

    victim.is_dead = true;
    victim.death_time_ms = Some(now);
    victim.ship.health = 0.0;
    victim.ship.vel = Vec2::ZERO;
    victim.ship.clear_ability_effects();
    let victim_name = victim.name.clone();
    let victim_level = victim.ship.level;
    let victim_pos = victim.ship.pos;
    let final_score = victim.ship.score;
    let is_local = victim.is_local;

    let killer = resolve_killer(world, cause, victim_id);
    if let Killer::Player { id, .. } = killer {
        if let Some(k) = world.players.get_mut(id) {
            k.ship.kills += 1;
            k.ship.score += KILL_SCORE_PER_LEVEL * u64::from(victim_level);
        }
        award_xp(world, id, KILL_XP_PER_LEVEL * victim_level, victim_pos);
    }

    if is_local {
        world.queue_finished_game(&victim_name, final_score);
    }

    log::info!(
        "{} was sunk by {} (score {})",
        victim_name,
        killer.display_name(),
        final_score
    );
    world.emit(GameEvent::KillFeed {
        killer: killer.display_name(),
        victim: victim_name,
    });
    world.emit(GameEvent::PlayerDied {
        player_id: victim_id,
        killer,
        score: final_score,
    });
    true
}

fn resolve_killer(world: &World, cause: Option<Owner>, victim_id: PlayerId) -> Killer {
    match cause {
        Some(Owner::Player(id)) if id != victim_id => match world.players.get(id) {
            Some(p) => Killer::Player {
                id,
                name: p.name.clone(),
            },
            None => Killer::Unknown,
        },
        Some(Owner::Neutral(id)) => match world.neutrals.get(id) {
            Some(n) => Killer::Neutral { id, kind: n.kind },
            None => Killer::Unknown,
        },
        _ => Killer::Unknown,
    }
}

/// Grant XP (and score) to a player, leveling up as many times as it covers
pub fn award_xp(world: &mut World, id: PlayerId, amount: u32, pos: Vec2) -> bool {
    let Some(player) = world.players.get_mut(id) else {
        return false;
    };

    let ship = &mut player.ship;
    ship.xp += amount;
    ship.score += u64::from(amount) * XP_SCORE_MULTIPLIER;

    let mut level_ups = Vec::new();
    while let Some(threshold) = xp_to_next_level(ship.level) {
        if ship.xp < threshold {
            break;
        }
        ship.level += 1;
        ship.xp -= threshold;
        player.upgrade_points += 1;
        ship.heal_full();
        level_ups.push((ship.level, player.upgrade_points, ship.class.available_upgrades(ship.level)));
    }

    world.emit(GameEvent::XpGained {
        player_id: id,
        pos,
        amount,
    });
    for (level, upgrade_points, available_classes) in level_ups {
        log::info!("{:?} reached level {}", id, level);
        world.emit(GameEvent::LevelUp {
            player_id: id,
            level,
            upgrade_points,
            available_classes,
        });
    }
    world.queue_progression_save(id);
    true
}

/// Spend one upgrade point on `stat`
pub fn upgrade_stat(world: &mut World, id: PlayerId, stat: StatKind) -> bool {
    let Some(player) = world.players.get_mut(id) else {
        return false;
    };
    if player.upgrade_points == 0 || !player.ship.stats.increment(stat) {
        return false;
    }
    player.upgrade_points -= 1;
    if stat == StatKind::Health {
        player.ship.refresh_max_health();
    }

    log::debug!("{:?} upgraded {:?}", id, stat);
    let event = GameEvent::StatsChanged {
        player_id: id,
        stats: player.ship.stats,
        upgrade_points: player.upgrade_points,
        max_health: player.ship.max_health,
    };
    world.emit(event);
    world.queue_progression_save(id);
    true
}

/// Switch hull; requires the class's unlock level
pub fn upgrade_ship_class(world: &mut World, id: PlayerId, class: ShipClass) -> bool {
    let Some(player) = world.players.get_mut(id) else {
        return false;
    };
    if player.is_dead || player.ship.class == class || player.ship.level < class.stats().unlock_level {
        return false;
    }

    player.ship.class = class;
    player.ship.clear_ability_effects();
    player.ship.max_health = player.ship.derived_max_health();
    player.ship.heal_full();

    log::debug!("{:?} switched to {:?}", id, class);
    world.emit(GameEvent::ClassChanged { player_id: id, class });
    world.queue_progression_save(id);
    true
}

/// Bring a dead player back as a fresh level-1 ship with spawn protection
pub fn respawn(world: &mut World, id: PlayerId) -> bool {
    match world.players.get(id) {
        Some(player) if player.is_dead => {}
        _ => return false,
    }

    let pos = world.random_spawn_point();
    let heading = world.rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
    let now = world.now_ms;
    let protection = world.config.spawn_protection_ms;

    let Some(player) = world.players.get_mut(id) else {
        return false;
    };
    player.ship = Ship::new(pos, heading);
    player.upgrade_points = 0;
    player.is_dead = false;
    player.death_time_ms = None;
    player.next_fire_ms = 0;
    player.protected_until_ms = now + protection;
    player.input = ShipInput {
        heading,
        ..Default::default()
    };

    log::info!("{} respawned", player.name);
    world.emit(GameEvent::Respawned { player_id: id, pos });
    world.queue_progression_save(id);
    true
}
