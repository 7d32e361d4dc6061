//! Per-tick collision resolution
//!
//! Broad phase uses two spatial hash grids (ships and neutrals) rebuilt at the
//! start of every resolution pass. Grids store dense arena indices, which stay
//! valid because nothing is removed until the final removal pass.
//!
//! Pass order: bullet/ship, bullet/neutral, ship/ship, drone/ship,
//! drone/neutral. Consumed bullets, drones and destroyed neutrals are collected
//! in sets and skipped by later passes, so no entity is processed after it
//! has been used up.

use std::collections::HashSet;

use glam::Vec2;

use super::entities::{EntityId, NeutralKind, Owner, PlayerId};
use super::events::{DamageTarget, GameEvent};
use super::geometry::{circles_overlap, clamp_outside_circle_along_segment};
use super::grid::SpatialHashGrid;
use super::progression::{award_xp, handle_death};
use super::state::World;
use crate::consts::*;

/// Broad-phase grids and query scratch, kept on the world between ticks
#[derive(Debug)]
pub struct CollisionGrids {
    ships: SpatialHashGrid<usize>,
    neutrals: SpatialHashGrid<usize>,
    candidates: Vec<usize>,
}

impl Default for CollisionGrids {
    fn default() -> Self {
        Self {
            ships: SpatialHashGrid::new(ENGAGEMENT_RANGE),
            neutrals: SpatialHashGrid::new(ENGAGEMENT_RANGE),
            candidates: Vec::new(),
        }
    }
}

impl CollisionGrids {
    fn rebuild(&mut self, world: &World) {
        self.ships.clear();
        for (idx, player) in world.players.iter().enumerate() {
            if player.is_alive() {
                self.ships.insert(player.ship.pos.x, player.ship.pos.y, idx);
            }
        }
        self.neutrals.clear();
        for (idx, neutral) in world.neutrals.iter().enumerate() {
            self.neutrals.insert(neutral.pos.x, neutral.pos.y, idx);
        }
    }
}

/// Largest collision radius of any neutral kind
fn max_neutral_radius() -> f32 {
    NeutralKind::ALL.iter().map(|k| k.radius()).fold(0.0, f32::max)
}

/// Entities used up during one resolution pass
#[derive(Debug, Default)]
struct Removals {
    bullets: HashSet<EntityId>,
    neutrals: HashSet<EntityId>,
    drones: HashSet<EntityId>,
}

/// Resolve every collision for the current positions
pub fn resolve_collisions(world: &mut World) {
    let mut grids = std::mem::take(&mut world.grids);
    grids.rebuild(world);
    let mut removals = Removals::default();

    bullets_vs_ships(world, &mut grids, &mut removals);
    bullets_vs_neutrals(world, &mut grids, &mut removals);
    ships_vs_ships(world, &mut grids);
    drones_vs_ships(world, &mut grids, &removals);
    drones_vs_neutrals(world, &mut grids, &mut removals);

    world.bullets.remove_all(&removals.bullets);
    world.neutrals.remove_all(&removals.neutrals);
    world.drones.remove_all(&removals.drones);
    world.grids = grids;
}

fn bullets_vs_ships(world: &mut World, grids: &mut CollisionGrids, removals: &mut Removals) {
    let now = world.now_ms;
    let range = SHIP_RADIUS + BULLET_RADIUS;

    for b in 0..world.bullets.len() {
        let bullet = world.bullets.as_slice()[b];
        grids
            .ships
            .query_into(bullet.pos.x, bullet.pos.y, range, &mut grids.candidates);

        for &s in &grids.candidates {
            let player = &world.players.as_slice()[s];
            if bullet.owner == Owner::Player(player.id)
                || player.is_dead
                || player.ship.stealthed
                || player.is_protected(now)
            {
                continue;
            }
            if !circles_overlap(bullet.pos, BULLET_RADIUS, player.ship.pos, SHIP_RADIUS) {
                continue;
            }

            removals.bullets.insert(bullet.id);
            damage_ship(world, s, bullet.damage, bullet.owner);
            break;
        }
    }
}

fn bullets_vs_neutrals(world: &mut World, grids: &mut CollisionGrids, removals: &mut Removals) {
    let range = BULLET_RADIUS + max_neutral_radius();

    for b in 0..world.bullets.len() {
        let bullet = world.bullets.as_slice()[b];
        if removals.bullets.contains(&bullet.id) {
            continue;
        }
        // Neutral fire and bullets of players who left never damage neutrals
        let Some(shooter) = bullet.owner.player() else {
            continue;
        };
        if !world.players.contains(shooter) {
            continue;
        }

        grids
            .neutrals
            .query_into(bullet.pos.x, bullet.pos.y, range, &mut grids.candidates);
        for &n in &grids.candidates {
            let neutral = &world.neutrals.as_slice()[n];
            if neutral.is_destroyed() || !circles_overlap(bullet.pos, BULLET_RADIUS, neutral.pos, neutral.radius()) {
                continue;
            }

            let id = neutral.id;
            removals.bullets.insert(bullet.id);
            if damage_neutral(world, id, bullet.damage, shooter) {
                removals.neutrals.insert(id);
            }
            break;
        }
    }
}

fn ships_vs_ships(world: &mut World, grids: &mut CollisionGrids) {
    let now = world.now_ms;
    let contact = SHIP_RADIUS * 2.0;

    for i in 0..world.players.len() {
        if world.players.as_slice()[i].is_dead {
            continue;
        }
        let pos = world.players.as_slice()[i].ship.pos;
        grids.ships.query_into(pos.x, pos.y, contact, &mut grids.candidates);
        let mut others = std::mem::take(&mut grids.candidates);
        others.sort_unstable();

        for &j in others.iter().filter(|&&j| j > i) {
            let players = world.players.as_slice();
            if players[i].is_dead || players[j].is_dead {
                continue;
            }
            let delta = players[j].ship.pos - players[i].ship.pos;
            let dist = delta.length();
            if dist >= contact {
                continue;
            }

            let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::X };
            let push = normal * ((contact - dist) * 0.5);
            let (a, b) = (players[i].id, players[j].id);
            let (a_prev, b_prev) = (players[i].ship.pos, players[j].ship.pos);
            let a_pos = keep_clear(world, a_prev, a_prev - push, SHIP_RADIUS);
            let b_pos = keep_clear(world, b_prev, b_prev + push, SHIP_RADIUS);
            world.players.as_mut_slice()[i].ship.pos = a_pos;
            world.players.as_mut_slice()[j].ship.pos = b_pos;

            for (idx, other) in [(i, b), (j, a)] {
                let player = &world.players.as_slice()[idx];
                if player.is_dead || player.is_protected(now) {
                    continue;
                }
                damage_ship(world, idx, COLLISION_DAMAGE, Owner::Player(other));
            }
        }
        grids.candidates = others;
    }
}

fn drones_vs_ships(world: &mut World, grids: &mut CollisionGrids, removals: &Removals) {
    let now = world.now_ms;
    let range = SHIP_RADIUS + DRONE_RADIUS;

    for d in 0..world.drones.len() {
        let drone = world.drones.as_slice()[d];
        if removals.drones.contains(&drone.id) {
            continue;
        }
        grids
            .ships
            .query_into(drone.pos.x, drone.pos.y, range, &mut grids.candidates);

        for &s in &grids.candidates {
            let player = &world.players.as_slice()[s];
            if player.id == drone.owner || player.is_dead || player.ship.stealthed || player.is_protected(now) {
                continue;
            }
            let ship_pos = player.ship.pos;
            if !circles_overlap(drone.pos, DRONE_RADIUS, ship_pos, SHIP_RADIUS) {
                continue;
            }

            damage_ship(world, s, DRONE_DAMAGE, Owner::Player(drone.owner));

            // Drones bounce off ships instead of being consumed
            let offset = drone.pos - ship_pos;
            let normal = if offset.length_squared() > f32::EPSILON {
                offset.normalize()
            } else {
                -crate::heading_to_vec(drone.heading)
            };
            let pushed = keep_clear(world, drone.pos, ship_pos + normal * (range + COLLISION_EPSILON), DRONE_RADIUS);
            world.drones.as_mut_slice()[d].pos = pushed;
            break;
        }
    }
}

fn drones_vs_neutrals(world: &mut World, grids: &mut CollisionGrids, removals: &mut Removals) {
    let range = DRONE_RADIUS + max_neutral_radius();

    for d in 0..world.drones.len() {
        let drone = world.drones.as_slice()[d];
        if removals.drones.contains(&drone.id) {
            continue;
        }
        grids
            .neutrals
            .query_into(drone.pos.x, drone.pos.y, range, &mut grids.candidates);

        for &n in &grids.candidates {
            let neutral = &world.neutrals.as_slice()[n];
            if neutral.is_destroyed() || !circles_overlap(drone.pos, DRONE_RADIUS, neutral.pos, neutral.radius()) {
                continue;
            }

            let id = neutral.id;
            removals.drones.insert(drone.id);
            if damage_neutral(world, id, DRONE_DAMAGE, drone.owner) {
                removals.neutrals.insert(id);
            }
            break;
        }
    }
}

/// Move from `prev` toward `next` without leaving the world or entering an island
///
/// Same sequential per-island pass as ship movement.
fn keep_clear(world: &World, prev: Vec2, next: Vec2, radius: f32) -> Vec2 {
    let mut pos = world.clamp_to_bounds(next, radius);
    for island in &world.islands {
        pos = clamp_outside_circle_along_segment(prev, pos, radius, island.center, island.radius);
    }
    pos
}

/// Apply damage to the ship at arena index `idx`, honoring shields
///
/// Shielded ships take nothing but still report a zero-damage hit.
pub(crate) fn damage_ship(world: &mut World, idx: usize, amount: f32, source: Owner) {
    let Some(player) = world.players.as_mut_slice().get_mut(idx) else {
        return;
    };
    let id = player.id;
    let pos = player.ship.pos;

    if player.ship.shielded {
        world.emit(GameEvent::DamageDealt {
            target: DamageTarget::Ship(id),
            pos,
            amount: 0.0,
            critical: false,
        });
        return;
    }

    player.ship.apply_damage(amount);
    let lethal = player.ship.health <= 0.0;
    world.emit(GameEvent::DamageDealt {
        target: DamageTarget::Ship(id),
        pos,
        amount,
        critical: lethal,
    });
    if lethal {
        handle_death(world, id, Some(source));
    }
}

/// Damage a neutral on behalf of a player; true if this was the killing blow
///
/// The killing blow awards the neutral's XP to `attacker`. The caller is
/// responsible for removing the destroyed neutral.
pub(crate) fn damage_neutral(world: &mut World, id: EntityId, amount: f32, attacker: PlayerId) -> bool {
    let Some(neutral) = world.neutrals.get_mut(id) else {
        return false;
    };
    if neutral.is_destroyed() {
        return false;
    }
    let killed = neutral.apply_damage(amount);
    let (kind, pos, xp) = (neutral.kind, neutral.pos, neutral.xp_value);

    world.emit(GameEvent::DamageDealt {
        target: DamageTarget::Neutral(id),
        pos,
        amount,
        critical: killed,
    });
    if killed {
        log::debug!("{:?} {:?} destroyed by {:?}", kind, id, attacker);
        world.emit(GameEvent::NeutralDestroyed { id, kind, pos });
        award_xp(world, attacker, xp, pos);
    }
    killed
}
