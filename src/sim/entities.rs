//! Non-ship world entities: projectiles, neutrals, drones and islands

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::Keyed;
use crate::heading_to_vec;

/// Identifier of a connected player (and their ship)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Identifier of a bullet, neutral, drone or island
///
/// Each category draws from its own monotonically increasing counter, so ids
/// are never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Who fired a projectile or launched a drone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Player(PlayerId),
    Neutral(EntityId),
}

impl Owner {
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Owner::Player(id) => Some(*id),
            Owner::Neutral(_) => None,
        }
    }
}

/// Projectile flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponType {
    /// Standard ship gun
    Cannon,
    /// Battleship barrage shell, arcs over terrain
    Shell,
    /// Lighthouse and tank fire
    TurretRound,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub id: EntityId,
    pub owner: Owner,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub remaining_ms: f32,
    pub weapon: WeaponType,
    pub ignores_terrain: bool,
}

impl Keyed for Bullet {
    type Id = EntityId;
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Neutral object variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeutralKind {
    /// Passive buoy, an easy XP source
    Buoy,
    /// Patrolling cargo vessel
    Cargo,
    /// Stationary turret
    Lighthouse,
    /// Mobile turret
    Tank,
}

/// Turret parameters for the shooting neutral variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretStats {
    pub range: f32,
    pub fire_rate_ms: u64,
    pub damage: f32,
}

impl NeutralKind {
    pub const ALL: [NeutralKind; 4] = [
        NeutralKind::Buoy,
        NeutralKind::Cargo,
        NeutralKind::Lighthouse,
        NeutralKind::Tank,
    ];

    /// Hull points; a buoy carries 24 so two base 12-damage shots sink it
    pub fn max_health(&self) -> f32 {
        match self {
            NeutralKind::Buoy => 24.0,
            NeutralKind::Cargo => 80.0,
            NeutralKind::Lighthouse => 150.0,
            NeutralKind::Tank => 110.0,
        }
    }

    pub fn xp_value(&self) -> u32 {
        match self {
            NeutralKind::Buoy => 8,
            NeutralKind::Cargo => 30,
            NeutralKind::Lighthouse => 60,
            NeutralKind::Tank => 45,
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            NeutralKind::Buoy => 14.0,
            NeutralKind::Cargo => 30.0,
            NeutralKind::Lighthouse => 26.0,
            NeutralKind::Tank => 24.0,
        }
    }

    /// Cruise speed for the moving variants
    pub fn speed(&self) -> f32 {
        match self {
            NeutralKind::Cargo => 60.0,
            NeutralKind::Tank => 45.0,
            NeutralKind::Buoy | NeutralKind::Lighthouse => 0.0,
        }
    }

    pub fn turret(&self) -> Option<TurretStats> {
        match self {
            NeutralKind::Lighthouse => Some(TurretStats {
                range: 380.0,
                fire_rate_ms: 1500,
                damage: 10.0,
            }),
            NeutralKind::Tank => Some(TurretStats {
                range: 300.0,
                fire_rate_ms: 1100,
                damage: 8.0,
            }),
            NeutralKind::Buoy | NeutralKind::Cargo => None,
        }
    }

    /// Relative spawn weight
    pub fn spawn_weight(&self) -> u32 {
        match self {
            NeutralKind::Buoy => 50,
            NeutralKind::Cargo => 25,
            NeutralKind::Lighthouse => 10,
            NeutralKind::Tank => 15,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NeutralKind::Buoy => "Buoy",
            NeutralKind::Cargo => "Cargo Vessel",
            NeutralKind::Lighthouse => "Lighthouse",
            NeutralKind::Tank => "Tank",
        }
    }

    /// Pick a kind according to spawn weights
    pub fn weighted_random(rng: &mut impl Rng) -> Self {
        let total: u32 = Self::ALL.iter().map(|k| k.spawn_weight()).sum();
        let mut roll = rng.random_range(0..total);
        for kind in Self::ALL {
            let weight = kind.spawn_weight();
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        NeutralKind::Buoy
    }
}

/// Heading and velocity of a moving neutral
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Motion {
    pub heading: f32,
    pub vel: Vec2,
}

impl Motion {
    pub fn new(heading: f32, speed: f32) -> Self {
        Self {
            heading,
            vel: heading_to_vec(heading) * speed,
        }
    }

    /// Set a new heading and re-derive velocity at the same speed
    pub fn steer(&mut self, heading: f32) {
        let speed = self.vel.length();
        self.heading = crate::normalize_angle(heading);
        self.vel = heading_to_vec(self.heading) * speed;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeutralObject {
    pub id: EntityId,
    pub kind: NeutralKind,
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub xp_value: u32,
    pub motion: Option<Motion>,
    pub last_fire_ms: Option<u64>,
}

impl NeutralObject {
    pub fn new(id: EntityId, kind: NeutralKind, pos: Vec2, heading: f32) -> Self {
        let motion = match kind {
            NeutralKind::Cargo | NeutralKind::Tank => Some(Motion::new(heading, kind.speed())),
            NeutralKind::Buoy | NeutralKind::Lighthouse => None,
        };
        Self {
            id,
            kind,
            pos,
            health: kind.max_health(),
            max_health: kind.max_health(),
            xp_value: kind.xp_value(),
            motion,
            last_fire_ms: None,
        }
    }

    pub fn radius(&self) -> f32 {
        self.kind.radius()
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Subtract damage, clamped at zero; returns true if this hit destroyed it
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        let was_alive = !self.is_destroyed();
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        was_alive && self.is_destroyed()
    }

    /// Whether the turret cooldown has elapsed
    pub fn can_fire(&self, now_ms: u64) -> bool {
        match (self.kind.turret(), self.last_fire_ms) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(turret), Some(last)) => now_ms.saturating_sub(last) >= turret.fire_rate_ms,
        }
    }
}

impl Keyed for NeutralObject {
    type Id = EntityId;
    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Drone {
    pub id: EntityId,
    pub owner: PlayerId,
    pub pos: Vec2,
    pub heading: f32,
    pub health: f32,
    pub remaining_ms: f32,
}

impl Keyed for Drone {
    type Id = EntityId;
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Static circular obstacle
///
/// `outline` is only for renderers; collision always uses `radius`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Island {
    pub id: EntityId,
    pub center: Vec2,
    pub radius: f32,
    pub outline: Vec<Vec2>,
    pub seed: u64,
}

/// Vertices in a generated island outline
const OUTLINE_POINTS: usize = 16;

impl Island {
    /// Build an island with a jittered outline derived from `seed`
    pub fn generate(id: EntityId, center: Vec2, radius: f32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let outline = (0..OUTLINE_POINTS)
            .map(|i| {
                let angle = i as f32 / OUTLINE_POINTS as f32 * std::f32::consts::TAU;
                // Outline stays inside the collision circle
                let r = radius * rng.random_range(0.8..1.0);
                center + heading_to_vec(angle) * r
            })
            .collect();
        Self {
            id,
            center,
            radius,
            outline,
            seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_island_outline_is_deterministic_and_inside_radius() {
        let a = Island::generate(EntityId(1), Vec2::new(500.0, 500.0), 120.0, 77);
        let b = Island::generate(EntityId(1), Vec2::new(500.0, 500.0), 120.0, 77);
        assert_eq!(a.outline, b.outline);
        assert_eq!(a.outline.len(), OUTLINE_POINTS);
        for p in &a.outline {
            assert!(p.distance(a.center) <= a.radius + 1e-3);
        }
    }

    #[test]
    fn test_neutral_damage_reports_killing_blow_once() {
        let mut buoy = NeutralObject::new(EntityId(3), NeutralKind::Buoy, Vec2::ZERO, 0.0);
        assert!(!buoy.apply_damage(12.0));
        assert!(buoy.apply_damage(12.0));
        assert_eq!(buoy.health, 0.0);
        // Already dead: further hits are not kills
        assert!(!buoy.apply_damage(12.0));
    }

    #[test]
    fn test_turret_cooldown() {
        let mut lighthouse = NeutralObject::new(EntityId(4), NeutralKind::Lighthouse, Vec2::ZERO, 0.0);
        assert!(lighthouse.can_fire(0));
        lighthouse.last_fire_ms = Some(1000);
        assert!(!lighthouse.can_fire(2000));
        assert!(lighthouse.can_fire(2500));

        let buoy = NeutralObject::new(EntityId(5), NeutralKind::Buoy, Vec2::ZERO, 0.0);
        assert!(!buoy.can_fire(10_000));
    }

    #[test]
    fn test_only_moving_variants_have_motion() {
        for kind in NeutralKind::ALL {
            let n = NeutralObject::new(EntityId(1), kind, Vec2::ZERO, 0.0);
            assert_eq!(n.motion.is_some(), kind.speed() > 0.0);
        }
    }

    #[test]
    fn test_weighted_random_covers_all_kinds() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let kind = NeutralKind::weighted_random(&mut rng);
            let idx = NeutralKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
