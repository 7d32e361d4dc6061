//! Read-only world snapshot handed to renderers once per tick
//!
//! Every view is an owned copy, so a consumer running at frame rate never sees
//! a half-updated tick. Islands never change and are shared behind an `Arc`.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::entities::{Bullet, Drone, EntityId, Island, NeutralKind, NeutralObject, Owner, PlayerId, WeaponType};
use crate::sim::ship::ShipClass;
use crate::sim::state::{Player, World};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipView {
    pub player_id: PlayerId,
    pub name: String,
    pub pos: Vec2,
    pub heading: f32,
    pub health: f32,
    pub max_health: f32,
    pub level: u32,
    pub class: ShipClass,
    pub score: u64,
    pub kills: u32,
    pub is_dead: bool,
    pub stealthed: bool,
    pub shielded: bool,
    pub protected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletView {
    pub id: EntityId,
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub weapon: WeaponType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeutralView {
    pub id: EntityId,
    pub kind: NeutralKind,
    pub pos: Vec2,
    pub heading: Option<f32>,
    pub health: f32,
    pub max_health: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroneView {
    pub id: EntityId,
    pub owner: PlayerId,
    pub pos: Vec2,
    pub heading: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandView {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub outline: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u64,
    pub level: u32,
}

/// Everything a renderer needs for one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub ships: Vec<ShipView>,
    pub bullets: Vec<BulletView>,
    pub neutrals: Vec<NeutralView>,
    pub islands: Arc<[IslandView]>,
    pub drones: Vec<DroneView>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let now = world.now_ms;
        Self {
            tick: world.tick_count,
            timestamp_ms: now,
            ships: world.players.iter().map(|p| ShipView::new(p, now)).collect(),
            bullets: world.bullets.iter().map(BulletView::from).collect(),
            neutrals: world.neutrals.iter().map(NeutralView::from).collect(),
            islands: world.island_views(),
            drones: world.drones.iter().map(DroneView::from).collect(),
            leaderboard: leaderboard(world.players.as_slice(), world.config.leaderboard_size),
        }
    }

    pub fn ship(&self, id: PlayerId) -> Option<&ShipView> {
        self.ships.iter().find(|s| s.player_id == id)
    }

    pub fn neutral(&self, id: EntityId) -> Option<&NeutralView> {
        self.neutrals.iter().find(|n| n.id == id)
    }
}

/// Top `size` living players by score, descending (stable for ties)
pub fn leaderboard(players: &[Player], size: usize) -> Vec<LeaderboardEntry> {
    let mut living: Vec<&Player> = players.iter().filter(|p| p.is_alive()).collect();
    living.sort_by(|a, b| b.ship.score.cmp(&a.ship.score));
    living
        .into_iter()
        .take(size)
        .map(|p| LeaderboardEntry {
            player_id: p.id,
            name: p.name.clone(),
            score: p.ship.score,
            level: p.ship.level,
        })
        .collect()
}

impl ShipView {
    fn new(player: &Player, now_ms: u64) -> Self {
        let ship = &player.ship;
        Self {
            player_id: player.id,
            name: player.name.clone(),
            pos: ship.pos,
            heading: ship.heading,
            health: ship.health.clamp(0.0, ship.max_health),
            max_health: ship.max_health,
            level: ship.level,
            class: ship.class,
            score: ship.score,
            kills: ship.kills,
            is_dead: player.is_dead,
            stealthed: ship.stealthed,
            shielded: ship.shielded,
            protected: player.is_protected(now_ms),
        }
    }
}

impl From<&Bullet> for BulletView {
    fn from(b: &Bullet) -> Self {
        Self {
            id: b.id,
            owner: b.owner,
            pos: b.pos,
            vel: b.vel,
            weapon: b.weapon,
        }
    }
}

impl From<&NeutralObject> for NeutralView {
    fn from(n: &NeutralObject) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            pos: n.pos,
            heading: n.motion.map(|m| m.heading),
            health: n.health.clamp(0.0, n.max_health),
            max_health: n.max_health,
        }
    }
}

impl From<&Drone> for DroneView {
    fn from(d: &Drone) -> Self {
        Self {
            id: d.id,
            owner: d.owner,
            pos: d.pos,
            heading: d.heading,
        }
    }
}

impl From<&Island> for IslandView {
    fn from(i: &Island) -> Self {
        Self {
            id: i.id,
            center: i.center,
            radius: i.radius,
            outline: i.outline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimConfig;

    #[test]
    fn test_leaderboard_orders_living_players() {
        let mut world = World::new(SimConfig {
            initial_neutrals: 0,
            ..Default::default()
        });
        let ids: Vec<PlayerId> = (0..12)
            .map(|i| world.join(&format!("p{i}"), false, None).player_id)
            .collect();
        for (i, id) in ids.iter().enumerate() {
            if let Some(p) = world.players.get_mut(*id) {
                p.ship.score = (i as u64) * 10;
            }
        }
        // Top scorer is dead and must be excluded
        if let Some(p) = world.players.get_mut(ids[11]) {
            p.is_dead = true;
        }

        let snapshot = WorldSnapshot::capture(&world);
        assert_eq!(snapshot.leaderboard.len(), 10);
        assert_eq!(snapshot.leaderboard[0].player_id, ids[10]);
        assert!(snapshot.leaderboard.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(snapshot.leaderboard.iter().all(|e| e.player_id != ids[11]));
    }

    #[test]
    fn test_snapshot_is_decoupled_from_world() {
        let mut world = World::new(SimConfig::default());
        let id = world.join("a", false, None).player_id;
        let snapshot = WorldSnapshot::capture(&world);

        if let Some(p) = world.players.get_mut(id) {
            p.ship.pos += Vec2::new(100.0, 0.0);
        }
        let before = snapshot.ship(id).map(|s| s.pos);
        let after = world.players.get(id).map(|p| p.ship.pos);
        assert_ne!(before, after);
        assert_eq!(snapshot.islands.len(), world.islands.len());
    }
}
