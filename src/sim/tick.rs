//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically. Phases run in a
//! fixed order: spawn, players, neutrals, drones, bullets, collisions,
//! snapshot. Timers compare against `now_ms` deadlines, never tick counters.

use std::collections::HashSet;
use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use super::collision::{damage_neutral, resolve_collisions};
use super::entities::{Bullet, Drone, Island, NeutralKind, Owner, PlayerId, WeaponType};
use super::events::GameEvent;
use super::geometry::{clamp_outside_circle_along_segment, first_segment_circle_hit};
use super::ship::{Ability, Ship};
use super::state::{Player, World};
use crate::consts::*;
use crate::snapshot::WorldSnapshot;
use crate::{heading_to_vec, normalize_angle, turn_toward};

/// Speed multiplier while Boost is active
const BOOST_MULTIPLIER: f32 = 1.6;
/// Reload multiplier while RapidFire is active
const RAPID_FIRE_MULTIPLIER: f32 = 0.5;
const BARRAGE_SHELLS: u32 = 5;
/// Angle between adjacent barrage shells (radians)
const BARRAGE_SPREAD: f32 = 0.15;
/// Angle between adjacent launched drones (radians)
const DRONE_LAUNCH_SPREAD: f32 = 0.5;

/// Something created during a phase, inserted once the phase's borrows end
enum Spawn {
    Bullet {
        owner: Owner,
        pos: Vec2,
        heading: f32,
        damage: f32,
        weapon: WeaponType,
    },
    Drone {
        owner: PlayerId,
        pos: Vec2,
        heading: f32,
    },
}

/// Advance the world to `now_ms` by one fixed step and return its snapshot
pub fn tick(world: &mut World, now_ms: u64) -> WorldSnapshot {
    let dt = world.config.dt();
    world.now_ms = now_ms;
    world.tick_count += 1;

    spawn_neutrals(world);
    update_players(world, dt);
    update_neutrals(world, dt);
    update_drones(world, dt);
    update_bullets(world, dt);
    resolve_collisions(world);

    WorldSnapshot::capture(world)
}

fn spawn_neutrals(world: &mut World) {
    let now = world.now_ms;
    if world.neutrals.len() >= world.config.neutral_cap {
        return;
    }
    if now.saturating_sub(world.last_neutral_spawn_ms) < world.config.neutral_spawn_interval_ms {
        return;
    }
    world.last_neutral_spawn_ms = now;
    let kind = NeutralKind::weighted_random(&mut world.rng);
    world.spawn_neutral(kind);
}

fn update_players(world: &mut World, dt: f32) {
    let now = world.now_ms;
    let (width, height) = (world.config.world_width, world.config.world_height);
    let mut spawns = Vec::new();
    let mut activations = Vec::new();

    for player in world.players.iter_mut() {
        if player.is_dead {
            continue;
        }

        let ship = &mut player.ship;
        if ship.ability.active && now >= ship.ability.active_until {
            ship.clear_ability_effects();
        }
        if player.input.use_ability && ship.ability.ready(now) {
            let ability = activate_ability(player.id, ship, now, &mut spawns);
            activations.push((player.id, ability));
        }

        move_ship(player, &world.islands, width, height, dt);

        if player.input.fire && now >= player.next_fire_ms {
            let ship = &player.ship;
            let mut cooldown = ship.fire_cooldown_ms();
            if active_ability(ship) == Some(Ability::RapidFire) {
                cooldown *= RAPID_FIRE_MULTIPLIER;
            }
            spawns.push(Spawn::Bullet {
                owner: Owner::Player(player.id),
                pos: ship.pos + heading_to_vec(ship.heading) * (SHIP_RADIUS + BULLET_RADIUS + 1.0),
                heading: ship.heading,
                damage: ship.bullet_damage(),
                weapon: WeaponType::Cannon,
            });
            player.next_fire_ms = now + cooldown.round() as u64;
        }
    }

    for (player_id, ability) in activations {
        log::debug!("{:?} used {:?}", player_id, ability);
        world.emit(GameEvent::AbilityActivated { player_id, ability });
    }
    apply_spawns(world, spawns);
}

fn active_ability(ship: &Ship) -> Option<Ability> {
    ship.ability.active.then(|| ship.class.stats().ability)
}

/// Start the class ability; instant abilities only set the cooldown
fn activate_ability(id: PlayerId, ship: &mut Ship, now: u64, spawns: &mut Vec<Spawn>) -> Ability {
    let ability = ship.class.stats().ability;
    ship.ability.cooldown_until = now + ability.cooldown_ms();

    match ability {
        Ability::Barrage => {
            let middle = (BARRAGE_SHELLS - 1) as f32 * 0.5;
            for k in 0..BARRAGE_SHELLS {
                let heading = normalize_angle(ship.heading + (k as f32 - middle) * BARRAGE_SPREAD);
                spawns.push(Spawn::Bullet {
                    owner: Owner::Player(id),
                    pos: ship.pos + heading_to_vec(heading) * (SHIP_RADIUS + BULLET_RADIUS + 1.0),
                    heading,
                    damage: ship.bullet_damage(),
                    weapon: WeaponType::Shell,
                });
            }
        }
        Ability::LaunchDrones => {
            let middle = (DRONES_PER_LAUNCH - 1) as f32 * 0.5;
            for k in 0..DRONES_PER_LAUNCH {
                let heading = normalize_angle(ship.heading + (k as f32 - middle) * DRONE_LAUNCH_SPREAD);
                spawns.push(Spawn::Drone {
                    owner: id,
                    pos: ship.pos + heading_to_vec(heading) * (SHIP_RADIUS + DRONE_RADIUS + 2.0),
                    heading,
                });
            }
        }
        Ability::Boost | Ability::RapidFire | Ability::Stealth | Ability::Shield => {
            ship.ability.active = true;
            ship.ability.active_until = now + ability.duration_ms();
            ship.stealthed = ability == Ability::Stealth;
            ship.shielded = ability == Ability::Shield;
        }
    }
    ability
}

/// Integrate one ship, keeping it inside the world and outside every island
fn move_ship(player: &mut Player, islands: &[Island], width: f32, height: f32, dt: f32) {
    let input = player.input;
    let ship = &mut player.ship;
    let prev = ship.pos;

    let intended = match input.target_pos {
        Some(target) => {
            ship.heading = normalize_angle(input.heading);
            target
        }
        None => {
            ship.heading = turn_toward(ship.heading, input.heading, ship.turn_rate() * dt);
            if input.thrust {
                let mut speed = ship.max_speed();
                if active_ability(ship) == Some(Ability::Boost) {
                    speed *= BOOST_MULTIPLIER;
                }
                ship.vel = heading_to_vec(ship.heading) * speed;
            } else {
                ship.vel *= SHIP_DRAG.powf(dt);
            }
            prev + ship.vel * dt
        }
    };

    let mut next = clamp_to_world(intended, SHIP_RADIUS, width, height);
    for island in islands {
        next = clamp_outside_circle_along_segment(prev, next, SHIP_RADIUS, island.center, island.radius);
    }

    if input.target_pos.is_some() || next != intended {
        ship.vel = (next - prev) / dt;
    }
    ship.pos = next;
}

fn update_neutrals(world: &mut World, dt: f32) {
    let now = world.now_ms;
    let (width, height) = (world.config.world_width, world.config.world_height);
    let mut spawns = Vec::new();

    for neutral in world.neutrals.iter_mut() {
        let radius = neutral.radius();

        if let Some(motion) = neutral.motion.as_mut() {
            let prev = neutral.pos;
            let mut next = prev + motion.vel * dt;

            let mut bounced = false;
            if next.x < radius || next.x > width - radius {
                motion.vel.x = -motion.vel.x;
                bounced = true;
            }
            if next.y < radius || next.y > height - radius {
                motion.vel.y = -motion.vel.y;
                bounced = true;
            }
            if bounced {
                motion.heading = motion.vel.y.atan2(motion.vel.x);
                next = clamp_to_world(next, radius, width, height);
            }

            for island in &world.islands {
                let clamped = clamp_outside_circle_along_segment(prev, next, radius, island.center, island.radius);
                if clamped != next {
                    next = clamped;
                    let jitter = world.rng.random_range(-NEUTRAL_BOUNCE_JITTER..NEUTRAL_BOUNCE_JITTER);
                    motion.steer(motion.heading + PI + jitter);
                }
            }
            neutral.pos = next;
        }

        let Some(turret) = neutral.kind.turret() else {
            continue;
        };
        if !neutral.can_fire(now) {
            continue;
        }
        let origin = neutral.pos;
        let target = world
            .players
            .iter()
            .filter(|p| p.is_targetable(now))
            .map(|p| (p.ship.pos, p.ship.pos.distance(origin)))
            .filter(|(_, dist)| *dist <= turret.range)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((target_pos, _)) = target {
            let aim = target_pos - origin;
            let heading = aim.y.atan2(aim.x);
            spawns.push(Spawn::Bullet {
                owner: Owner::Neutral(neutral.id),
                pos: origin + heading_to_vec(heading) * (radius + BULLET_RADIUS + 1.0),
                heading,
                damage: turret.damage,
                weapon: WeaponType::TurretRound,
            });
            neutral.last_fire_ms = Some(now);
        }
    }

    apply_spawns(world, spawns);
}

fn update_drones(world: &mut World, dt: f32) {
    let (width, height) = (world.config.world_width, world.config.world_height);
    let mut spent = HashSet::new();
    let mut strikes = Vec::new();

    for drone in world.drones.iter_mut() {
        drone.remaining_ms -= dt * 1000.0;
        if drone.remaining_ms <= 0.0 {
            spent.insert(drone.id);
            continue;
        }

        let target = world
            .neutrals
            .iter()
            .filter(|n| !n.is_destroyed())
            .map(|n| (n, n.pos.distance(drone.pos)))
            .filter(|(_, dist)| *dist <= DRONE_SEEK_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n);

        if let Some(n) = target {
            let to = n.pos - drone.pos;
            drone.heading = turn_toward(drone.heading, to.y.atan2(to.x), DRONE_TURN_RATE * dt);
        }
        let next = drone.pos + heading_to_vec(drone.heading) * DRONE_SPEED * dt;
        drone.pos = clamp_to_world(next, DRONE_RADIUS, width, height);

        if let Some(n) = target {
            if drone.pos.distance(n.pos) - n.radius() <= DRONE_CONTACT_DISTANCE {
                strikes.push((drone.id, n.id, drone.owner));
            }
        }
    }

    let mut destroyed = HashSet::new();
    for (drone_id, neutral_id, owner) in strikes {
        let live = world.neutrals.get(neutral_id).is_some_and(|n| !n.is_destroyed());
        if !live {
            continue;
        }
        spent.insert(drone_id);
        if damage_neutral(world, neutral_id, DRONE_DAMAGE, owner) {
            destroyed.insert(neutral_id);
        }
    }

    world.drones.remove_all(&spent);
    world.neutrals.remove_all(&destroyed);
}

fn update_bullets(world: &mut World, dt: f32) {
    let mut spent = HashSet::new();

    for bullet in world.bullets.iter_mut() {
        bullet.remaining_ms -= dt * 1000.0;
        let prev = bullet.pos;
        bullet.pos += bullet.vel * dt;

        let out_of_bounds = !world.config.in_bounds(bullet.pos);
        let grounded = !bullet.ignores_terrain
            && world
                .islands
                .iter()
                .any(|island| first_segment_circle_hit(prev, bullet.pos, island.center, island.radius + BULLET_RADIUS).is_some());

        if bullet.remaining_ms <= 0.0 || out_of_bounds || grounded {
            spent.insert(bullet.id);
        }
    }

    world.bullets.remove_all(&spent);
}

fn apply_spawns(world: &mut World, spawns: Vec<Spawn>) {
    for spawn in spawns {
        match spawn {
            Spawn::Bullet {
                owner,
                pos,
                heading,
                damage,
                weapon,
            } => {
                let (speed, lifetime, ignores_terrain) = match weapon {
                    WeaponType::Cannon => (BULLET_SPEED, BULLET_LIFETIME_MS, false),
                    WeaponType::Shell => (SHELL_SPEED, SHELL_LIFETIME_MS, true),
                    WeaponType::TurretRound => (TURRET_BULLET_SPEED, TURRET_BULLET_LIFETIME_MS, false),
                };
                let id = world.next_bullet_id();
                world.bullets.insert(Bullet {
                    id,
                    owner,
                    pos,
                    vel: heading_to_vec(heading) * speed,
                    damage,
                    remaining_ms: lifetime,
                    weapon,
                    ignores_terrain,
                });
            }
            Spawn::Drone { owner, pos, heading } => {
                let id = world.next_drone_id();
                world.drones.insert(Drone {
                    id,
                    owner,
                    pos,
                    heading,
                    health: DRONE_HEALTH,
                    remaining_ms: DRONE_LIFETIME_MS,
                });
            }
        }
    }
}

#[inline]
fn clamp_to_world(pos: Vec2, radius: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(radius, (width - radius).max(radius)),
        pos.y.clamp(radius, (height - radius).max(radius)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimConfig;
    use crate::sim::entities::{EntityId, NeutralObject};
    use crate::sim::ship::ShipClass;
    use crate::sim::state::ShipInput;

    fn open_sea() -> World {
        World::new(SimConfig {
            island_count: 0,
            initial_neutrals: 0,
            neutral_cap: 0,
            ..Default::default()
        })
    }

    fn place(world: &mut World, name: &str, pos: Vec2, heading: f32) -> PlayerId {
        let id = world.join(name, false, None).player_id;
        if let Some(p) = world.players.get_mut(id) {
            p.ship.pos = pos;
            p.ship.heading = heading;
            p.input.heading = heading;
            p.protected_until_ms = 0;
        }
        id
    }

    fn run(world: &mut World, ticks: u64) -> WorldSnapshot {
        let step = world.config.tick_ms();
        let mut snapshot = WorldSnapshot::capture(world);
        for _ in 0..ticks {
            let now = world.now_ms + step;
            snapshot = tick(world, now);
        }
        snapshot
    }

    #[test]
    fn test_identical_worlds_stay_identical() {
        let config = SimConfig {
            seed: 1234,
            ..Default::default()
        };
        let mut a = World::new(config.clone());
        let mut b = World::new(config);

        for world in [&mut a, &mut b] {
            for i in 0..4 {
                let id = world.join(&format!("bot{i}"), false, None).player_id;
                world.set_input(
                    id,
                    ShipInput {
                        heading: i as f32,
                        thrust: true,
                        fire: true,
                        use_ability: true,
                        ..Default::default()
                    },
                );
            }
        }

        let snap_a = run(&mut a, 200);
        let snap_b = run(&mut b, 200);
        let json_a = serde_json::to_string(&snap_a).expect("serializable");
        let json_b = serde_json::to_string(&snap_b).expect("serializable");
        assert_eq!(json_a, json_b);
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_ship_never_enters_island() {
        let mut world = open_sea();
        let center = Vec2::new(2000.0, 2000.0);
        world.islands.push(Island::generate(EntityId(1), center, 150.0, 5));
        let id = place(&mut world, "Rammer", Vec2::new(1500.0, 2000.0), 0.0);
        world.set_input(
            id,
            ShipInput {
                heading: 0.0,
                thrust: true,
                ..Default::default()
            },
        );

        let step = world.config.tick_ms();
        for _ in 0..100 {
            let now = world.now_ms + step;
            tick(&mut world, now);
            let pos = world.players.get(id).map(|p| p.ship.pos).unwrap_or(center);
            assert!(pos.distance(center) >= 150.0 + SHIP_RADIUS);
        }
    }

    #[test]
    fn test_trusted_position_cannot_jump_through_island() {
        let mut world = open_sea();
        let center = Vec2::new(2000.0, 2000.0);
        world.islands.push(Island::generate(EntityId(1), center, 100.0, 5));
        let id = place(&mut world, "Teleporter", Vec2::new(1850.0, 2000.0), 0.0);
        world.set_input(
            id,
            ShipInput {
                target_pos: Some(Vec2::new(2150.0, 2000.0)),
                ..Default::default()
            },
        );

        run(&mut world, 1);
        let pos = world.players.get(id).map(|p| p.ship.pos).unwrap_or(center);
        assert!(pos.distance(center) >= 100.0 + SHIP_RADIUS);
        assert!(pos.x < center.x, "stopped on the near side");
    }

    #[test]
    fn test_bullets_stop_at_islands_but_shells_fly_over() {
        let mut world = open_sea();
        let center = Vec2::new(2000.0, 2000.0);
        world.islands.push(Island::generate(EntityId(1), center, 100.0, 5));

        let start = Vec2::new(1880.0, 2000.0);
        apply_spawns(
            &mut world,
            vec![
                Spawn::Bullet {
                    owner: Owner::Neutral(EntityId(9)),
                    pos: start,
                    heading: 0.0,
                    damage: 1.0,
                    weapon: WeaponType::Cannon,
                },
                Spawn::Bullet {
                    owner: Owner::Neutral(EntityId(9)),
                    pos: start,
                    heading: 0.0,
                    damage: 1.0,
                    weapon: WeaponType::Shell,
                },
            ],
        );

        run(&mut world, 1);
        assert_eq!(world.bullets.len(), 1);
        assert!(world.bullets.iter().all(|b| b.weapon == WeaponType::Shell));
    }

    #[test]
    fn test_bullet_expires_and_leaves_bounds() {
        let mut world = open_sea();
        apply_spawns(
            &mut world,
            vec![Spawn::Bullet {
                owner: Owner::Neutral(EntityId(9)),
                pos: Vec2::new(3990.0, 2000.0),
                heading: 0.0,
                damage: 1.0,
                weapon: WeaponType::Cannon,
            }],
        );
        run(&mut world, 1);
        assert!(world.bullets.is_empty());

        apply_spawns(
            &mut world,
            vec![Spawn::Bullet {
                owner: Owner::Neutral(EntityId(9)),
                pos: Vec2::new(1000.0, 2000.0),
                heading: 0.0,
                damage: 1.0,
                weapon: WeaponType::Cannon,
            }],
        );
        run(&mut world, 29);
        assert_eq!(world.bullets.len(), 1);
        run(&mut world, 1);
        assert!(world.bullets.is_empty(), "lifetime of 1500ms is 30 ticks");
    }

    #[test]
    fn test_fire_rate_follows_cooldown_deadline() {
        let mut world = open_sea();
        let id = place(&mut world, "Gunner", Vec2::new(2000.0, 2000.0), 0.0);
        world.set_input(
            id,
            ShipInput {
                fire: true,
                ..Default::default()
            },
        );
        // Ticks at 50..=1000ms; 400ms reload fires at 50, 450 and 850
        run(&mut world, 20);
        assert_eq!(world.bullets.len(), 3);
    }

    #[test]
    fn test_dead_ships_do_not_move_or_fire() {
        let mut world = open_sea();
        let start = Vec2::new(2000.0, 2000.0);
        let id = place(&mut world, "Wreck", start, 0.0);
        world.set_input(
            id,
            ShipInput {
                thrust: true,
                fire: true,
                ..Default::default()
            },
        );
        crate::sim::progression::handle_death(&mut world, id, None);
        run(&mut world, 10);
        assert_eq!(world.players.get(id).map(|p| p.ship.pos), Some(start));
        assert!(world.bullets.is_empty());
    }

    #[test]
    fn test_health_stays_in_range_during_brawl() {
        let mut world = World::new(SimConfig {
            seed: 99,
            world_width: 1200.0,
            world_height: 1200.0,
            island_count: 2,
            island_min_radius: 60.0,
            island_max_radius: 90.0,
            spawn_protection_ms: 0,
            ..Default::default()
        });
        let ids: Vec<PlayerId> = (0..6)
            .map(|i| world.join(&format!("p{i}"), false, None).player_id)
            .collect();

        let step = world.config.tick_ms();
        for t in 0..400u64 {
            for (i, id) in ids.iter().enumerate() {
                world.set_input(
                    *id,
                    ShipInput {
                        heading: (t as f32 * 0.05) + i as f32,
                        thrust: true,
                        fire: true,
                        use_ability: t % 50 == 0,
                        ..Default::default()
                    },
                );
            }
            let now = world.now_ms + step;
            let snapshot = tick(&mut world, now);
            for ship in &snapshot.ships {
                assert!(ship.health >= 0.0 && ship.health <= ship.max_health);
            }
            for p in world.players.iter() {
                assert!(p.ship.health >= 0.0 && p.ship.health <= p.ship.max_health);
                if !p.is_dead {
                    assert!(p.ship.health > 0.0);
                }
            }
            for n in world.neutrals.iter() {
                assert!(n.health > 0.0 && n.health <= n.max_health);
            }
        }
    }

    #[test]
    fn test_neutral_spawns_respect_interval_and_cap() {
        let mut world = World::new(SimConfig {
            island_count: 0,
            initial_neutrals: 0,
            neutral_cap: 3,
            neutral_spawn_interval_ms: 1000,
            ..Default::default()
        });
        // First spawn happens once the interval has elapsed since t=0
        run(&mut world, 19);
        assert_eq!(world.neutrals.len(), 0);
        run(&mut world, 1);
        assert_eq!(world.neutrals.len(), 1);
        run(&mut world, 200);
        assert_eq!(world.neutrals.len(), 3);
    }

    #[test]
    fn test_lighthouse_targets_only_unprotected_ships_in_range() {
        let mut world = open_sea();
        let id = world.next_neutral_id();
        let origin = Vec2::new(2000.0, 2000.0);
        world
            .neutrals
            .insert(NeutralObject::new(id, NeutralKind::Lighthouse, origin, 0.0));

        let shielded_by_time = world.join("Fresh", false, None).player_id;
        if let Some(p) = world.players.get_mut(shielded_by_time) {
            p.ship.pos = origin + Vec2::new(200.0, 0.0);
        }
        run(&mut world, 1);
        assert!(world.bullets.is_empty(), "spawn protected ship is ignored");

        let target = place(&mut world, "Target", origin + Vec2::new(0.0, 300.0), 0.0);
        run(&mut world, 1);
        let shot = world.bullets.iter().next().copied().expect("turret fired");
        assert_eq!(shot.owner, Owner::Neutral(id));
        assert!(shot.vel.y > 0.0 && shot.vel.x.abs() < 1e-3);
        assert!(world.players.contains(target));

        // Cooldown holds fire for 1500ms
        run(&mut world, 5);
        assert_eq!(
            world
                .bullets
                .iter()
                .filter(|b| b.weapon == WeaponType::TurretRound)
                .count(),
            1
        );
    }

    #[test]
    fn test_shield_ability_runs_for_duration_then_cools_down() {
        let mut world = open_sea();
        let id = place(&mut world, "Cruiser", Vec2::new(2000.0, 2000.0), 0.0);
        if let Some(p) = world.players.get_mut(id) {
            p.ship.class = ShipClass::Cruiser;
            p.ship.level = 4;
        }
        world.set_input(
            id,
            ShipInput {
                use_ability: true,
                ..Default::default()
            },
        );

        run(&mut world, 1);
        assert_eq!(world.players.get(id).map(|p| p.ship.shielded), Some(true));
        assert!(world
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::AbilityActivated { ability: Ability::Shield, .. })));

        // Active for 3000ms (60 ticks)
        run(&mut world, 60);
        let p = world.players.get(id).expect("present");
        assert!(!p.ship.shielded);
        assert!(!p.ship.ability.active);
        assert!(!p.ship.ability.ready(world.now_ms), "still cooling down");
    }

    #[test]
    fn test_barrage_and_drone_launch() {
        let mut world = open_sea();
        let battleship = place(&mut world, "Big Guns", Vec2::new(1000.0, 1000.0), 0.0);
        let carrier = place(&mut world, "Flattop", Vec2::new(3000.0, 3000.0), 0.0);
        for (id, class) in [(battleship, ShipClass::Battleship), (carrier, ShipClass::Carrier)] {
            if let Some(p) = world.players.get_mut(id) {
                p.ship.class = class;
                p.ship.level = 6;
            }
            world.set_input(
                id,
                ShipInput {
                    use_ability: true,
                    ..Default::default()
                },
            );
        }

        run(&mut world, 1);
        let shells = world.bullets.iter().filter(|b| b.weapon == WeaponType::Shell).count();
        assert_eq!(shells as u32, BARRAGE_SHELLS);
        assert!(world.bullets.iter().all(|b| b.ignores_terrain));
        assert_eq!(world.drones.len() as u32, DRONES_PER_LAUNCH);
        assert!(world.drones.iter().all(|d| d.owner == carrier));

        // Instant abilities do not re-trigger while cooling down
        run(&mut world, 1);
        assert_eq!(world.drones.len() as u32, DRONES_PER_LAUNCH);
    }

    #[test]
    fn test_drone_homes_onto_neutral_and_expires() {
        let mut world = open_sea();
        let owner = place(&mut world, "Flattop", Vec2::new(500.0, 500.0), 0.0);
        let neutral = world.next_neutral_id();
        world
            .neutrals
            .insert(NeutralObject::new(neutral, NeutralKind::Lighthouse, Vec2::new(2000.0, 2200.0), 0.0));
        apply_spawns(
            &mut world,
            vec![
                Spawn::Drone {
                    owner,
                    pos: Vec2::new(2000.0, 2000.0),
                    heading: 0.0,
                },
                Spawn::Drone {
                    owner,
                    pos: Vec2::new(3500.0, 3500.0),
                    heading: PI,
                },
            ],
        );

        run(&mut world, 40);
        let n = world.neutrals.get(neutral).expect("lighthouse survives one drone");
        assert_eq!(n.health, n.max_health - DRONE_DAMAGE);
        assert_eq!(world.drones.len(), 1, "striking drone is consumed");

        run(&mut world, 160);
        assert!(world.drones.is_empty(), "idle drone expires after its lifetime");
    }

    fn place_neutral(world: &mut World, kind: NeutralKind, pos: Vec2, heading: f32) -> EntityId {
        let id = world.next_neutral_id();
        world.neutrals.insert(NeutralObject::new(id, kind, pos, heading));
        id
    }

    #[test]
    fn test_lighthouse_ignores_stealthed_ship() {
        let mut world = open_sea();
        let origin = Vec2::new(2000.0, 2000.0);
        place_neutral(&mut world, NeutralKind::Lighthouse, origin, 0.0);
        let ghost = place(&mut world, "Ghost", origin + Vec2::new(150.0, 0.0), 0.0);
        if let Some(p) = world.players.get_mut(ghost) {
            p.ship.stealthed = true;
        }

        run(&mut world, 1);
        assert!(world.bullets.is_empty());

        if let Some(p) = world.players.get_mut(ghost) {
            p.ship.stealthed = false;
        }
        run(&mut world, 1);
        assert_eq!(world.bullets.len(), 1, "visible again, so the turret opens fire");
    }

    #[test]
    fn test_cargo_reflects_off_world_edge() {
        let mut world = open_sea();
        let radius = NeutralKind::Cargo.radius();
        let edge = world.config.world_width - radius;
        let cargo = place_neutral(&mut world, NeutralKind::Cargo, Vec2::new(edge - 1.0, 2000.0), 0.0);

        run(&mut world, 1);
        let n = world.neutrals.get(cargo).expect("present");
        let motion = n.motion.expect("cargo moves");
        assert!(n.pos.x <= edge);
        assert!(motion.vel.x < 0.0);
        assert!((motion.heading.abs() - PI).abs() < 1e-4, "heading follows the reflected velocity");
        assert!((motion.vel.length() - NeutralKind::Cargo.speed()).abs() < 1e-3);
    }

    #[test]
    fn test_cargo_turns_back_from_island() {
        let mut world = open_sea();
        let center = Vec2::new(2000.0, 2000.0);
        world.islands.push(Island::generate(EntityId(1), center, 100.0, 11));
        let expanded = 100.0 + NeutralKind::Cargo.radius();
        let cargo = place_neutral(&mut world, NeutralKind::Cargo, Vec2::new(center.x - expanded - 1.0, center.y), 0.0);

        run(&mut world, 1);
        let n = world.neutrals.get(cargo).expect("present");
        let motion = n.motion.expect("cargo moves");
        assert!(n.pos.distance(center) >= expanded);
        assert!(motion.heading.abs() >= PI - NEUTRAL_BOUNCE_JITTER - 1e-4, "heading flipped");
        assert!(motion.vel.x < 0.0);
        assert!((motion.vel.length() - NeutralKind::Cargo.speed()).abs() < 1e-3);

        // Sails away rather than staying pinned to the shore
        run(&mut world, 10);
        let n = world.neutrals.get(cargo).expect("present");
        assert!(n.pos.distance(center) > expanded + 10.0);
    }
}
