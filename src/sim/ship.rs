//! Ship classes, upgradeable stats and abilities

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Maximum points that can be spent in any single stat
pub const MAX_STAT_POINTS: u32 = 5;
/// Extra max health per health point
pub const HEALTH_PER_POINT: f32 = 20.0;
/// Fractional speed gain per speed point
pub const SPEED_PER_POINT: f32 = 0.08;
/// Fractional damage gain per damage point
pub const DAMAGE_PER_POINT: f32 = 0.10;
/// Fractional reload reduction per reload point
pub const RELOAD_PER_POINT: f32 = 0.08;

/// The six hull types a player can sail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShipClass {
    #[default]
    PatrolBoat,
    Destroyer,
    Submarine,
    Cruiser,
    Battleship,
    Carrier,
}

/// Base numbers for a ship class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStats {
    /// Top speed (units/s)
    pub speed: f32,
    /// Milliseconds between shots
    pub fire_cooldown_ms: f32,
    pub damage: f32,
    pub max_health: f32,
    /// Radians per second
    pub turn_rate: f32,
    pub unlock_level: u32,
    pub ability: Ability,
}

impl ShipClass {
    pub const ALL: [ShipClass; 6] = [
        ShipClass::PatrolBoat,
        ShipClass::Destroyer,
        ShipClass::Submarine,
        ShipClass::Cruiser,
        ShipClass::Battleship,
        ShipClass::Carrier,
    ];

    pub fn stats(&self) -> ClassStats {
        match self {
            ShipClass::PatrolBoat => ClassStats {
                speed: 200.0,
                fire_cooldown_ms: 400.0,
                damage: 12.0,
                max_health: 100.0,
                turn_rate: 3.2,
                unlock_level: 1,
                ability: Ability::Boost,
            },
            ShipClass::Destroyer => ClassStats {
                speed: 185.0,
                fire_cooldown_ms: 320.0,
                damage: 14.0,
                max_health: 130.0,
                turn_rate: 2.8,
                unlock_level: 2,
                ability: Ability::RapidFire,
            },
            ShipClass::Submarine => ClassStats {
                speed: 170.0,
                fire_cooldown_ms: 600.0,
                damage: 24.0,
                max_health: 110.0,
                turn_rate: 2.4,
                unlock_level: 3,
                ability: Ability::Stealth,
            },
            ShipClass::Cruiser => ClassStats {
                speed: 160.0,
                fire_cooldown_ms: 450.0,
                damage: 18.0,
                max_health: 170.0,
                turn_rate: 2.2,
                unlock_level: 4,
                ability: Ability::Shield,
            },
            ShipClass::Battleship => ClassStats {
                speed: 130.0,
                fire_cooldown_ms: 700.0,
                damage: 30.0,
                max_health: 240.0,
                turn_rate: 1.6,
                unlock_level: 5,
                ability: Ability::Barrage,
            },
            ShipClass::Carrier => ClassStats {
                speed: 120.0,
                fire_cooldown_ms: 800.0,
                damage: 16.0,
                max_health: 220.0,
                turn_rate: 1.5,
                unlock_level: 6,
                ability: Ability::LaunchDrones,
            },
        }
    }

    /// Classes reachable from this one
    pub fn upgrade_path(&self) -> &'static [ShipClass] {
        match self {
            ShipClass::PatrolBoat => &[
                ShipClass::Destroyer,
                ShipClass::Submarine,
                ShipClass::Cruiser,
                ShipClass::Battleship,
                ShipClass::Carrier,
            ],
            ShipClass::Destroyer => &[ShipClass::Cruiser, ShipClass::Battleship],
            ShipClass::Submarine => &[ShipClass::Cruiser, ShipClass::Carrier],
            ShipClass::Cruiser => &[ShipClass::Battleship, ShipClass::Carrier],
            ShipClass::Battleship => &[ShipClass::Carrier],
            ShipClass::Carrier => &[ShipClass::Battleship],
        }
    }

    /// Upgrade-path classes whose unlock level has been reached
    pub fn available_upgrades(&self, level: u32) -> Vec<ShipClass> {
        self.upgrade_path()
            .iter()
            .copied()
            .filter(|class| class.stats().unlock_level <= level)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipClass::PatrolBoat => "patrol_boat",
            ShipClass::Destroyer => "destroyer",
            ShipClass::Submarine => "submarine",
            ShipClass::Cruiser => "cruiser",
            ShipClass::Battleship => "battleship",
            ShipClass::Carrier => "carrier",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "patrol_boat" | "patrolboat" => Some(ShipClass::PatrolBoat),
            "destroyer" => Some(ShipClass::Destroyer),
            "submarine" => Some(ShipClass::Submarine),
            "cruiser" => Some(ShipClass::Cruiser),
            "battleship" => Some(ShipClass::Battleship),
            "carrier" => Some(ShipClass::Carrier),
            _ => None,
        }
    }
}

/// Class-specific active ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    /// Speed burst
    Boost,
    /// Halved reload
    RapidFire,
    /// Untargetable and undamageable by other ships, turrets and drones
    Stealth,
    /// Incoming damage nullified
    Shield,
    /// Fan of terrain-ignoring shells
    Barrage,
    /// Spawns homing drones
    LaunchDrones,
}

impl Ability {
    /// How long the ability stays active (ms); zero for instant abilities
    pub fn duration_ms(&self) -> u64 {
        match self {
            Ability::Boost => 2500,
            Ability::RapidFire => 4000,
            Ability::Stealth => 5000,
            Ability::Shield => 3000,
            Ability::Barrage => 0,
            Ability::LaunchDrones => 0,
        }
    }

    pub fn cooldown_ms(&self) -> u64 {
        match self {
            Ability::Boost => 8000,
            Ability::RapidFire => 12000,
            Ability::Stealth => 15000,
            Ability::Shield => 14000,
            Ability::Barrage => 10000,
            Ability::LaunchDrones => 18000,
        }
    }
}

/// Names of the upgradeable stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatKind {
    Health,
    Speed,
    Damage,
    Reload,
}

impl StatKind {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "health" | "health_bonus" => Some(StatKind::Health),
            "speed" | "speed_bonus" => Some(StatKind::Speed),
            "damage" | "damage_bonus" => Some(StatKind::Damage),
            "reload" | "reload_bonus" => Some(StatKind::Reload),
            _ => None,
        }
    }
}

/// Points spent in each upgradeable stat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    pub health_bonus: u32,
    pub speed_bonus: u32,
    pub damage_bonus: u32,
    pub reload_bonus: u32,
}

impl StatBlock {
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Health => self.health_bonus,
            StatKind::Speed => self.speed_bonus,
            StatKind::Damage => self.damage_bonus,
            StatKind::Reload => self.reload_bonus,
        }
    }

    fn slot_mut(&mut self, stat: StatKind) -> &mut u32 {
        match stat {
            StatKind::Health => &mut self.health_bonus,
            StatKind::Speed => &mut self.speed_bonus,
            StatKind::Damage => &mut self.damage_bonus,
            StatKind::Reload => &mut self.reload_bonus,
        }
    }

    /// Add one point to `stat`; false if already capped
    pub fn increment(&mut self, stat: StatKind) -> bool {
        let slot = self.slot_mut(stat);
        if *slot >= MAX_STAT_POINTS {
            return false;
        }
        *slot += 1;
        true
    }

    /// Clamp every stat into `0..=MAX_STAT_POINTS`
    pub fn clamped(self) -> Self {
        Self {
            health_bonus: self.health_bonus.min(MAX_STAT_POINTS),
            speed_bonus: self.speed_bonus.min(MAX_STAT_POINTS),
            damage_bonus: self.damage_bonus.min(MAX_STAT_POINTS),
            reload_bonus: self.reload_bonus.min(MAX_STAT_POINTS),
        }
    }
}

/// Timers for the class ability (absolute sim-clock deadlines in ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityState {
    pub active: bool,
    pub cooldown_until: u64,
    pub active_until: u64,
}

impl AbilityState {
    pub fn ready(&self, now_ms: u64) -> bool {
        !self.active && now_ms >= self.cooldown_until
    }
}

/// A player's vessel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    /// Radians
    pub heading: f32,
    pub vel: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub level: u32,
    pub xp: u32,
    pub class: ShipClass,
    pub kills: u32,
    pub score: u64,
    pub stats: StatBlock,
    pub ability: AbilityState,
    pub stealthed: bool,
    pub shielded: bool,
}

impl Ship {
    pub fn new(pos: Vec2, heading: f32) -> Self {
        let class = ShipClass::default();
        let max_health = class.stats().max_health;
        Self {
            pos,
            heading,
            vel: Vec2::ZERO,
            health: max_health,
            max_health,
            level: 1,
            xp: 0,
            class,
            kills: 0,
            score: 0,
            stats: StatBlock::default(),
            ability: AbilityState::default(),
            stealthed: false,
            shielded: false,
        }
    }

    /// Max health from class base plus health points
    pub fn derived_max_health(&self) -> f32 {
        self.class.stats().max_health + self.stats.health_bonus as f32 * HEALTH_PER_POINT
    }

    pub fn max_speed(&self) -> f32 {
        self.class.stats().speed * (1.0 + self.stats.speed_bonus as f32 * SPEED_PER_POINT)
    }

    pub fn bullet_damage(&self) -> f32 {
        self.class.stats().damage * (1.0 + self.stats.damage_bonus as f32 * DAMAGE_PER_POINT)
    }

    pub fn fire_cooldown_ms(&self) -> f32 {
        self.class.stats().fire_cooldown_ms * (1.0 - self.stats.reload_bonus as f32 * RELOAD_PER_POINT)
    }

    pub fn turn_rate(&self) -> f32 {
        self.class.stats().turn_rate
    }

    /// Recompute max health, keeping current health at the same ratio (rounded)
    pub fn refresh_max_health(&mut self) {
        let old_max = self.max_health.max(1.0);
        let new_max = self.derived_max_health();
        let ratio = self.health / old_max;
        self.max_health = new_max;
        self.health = (ratio * new_max).round().clamp(0.0, new_max);
    }

    pub fn heal_full(&mut self) {
        self.health = self.max_health;
    }

    /// Subtract damage, clamped at zero; returns the damage actually applied
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        before - self.health
    }

    /// Drop any active ability and its flags
    pub fn clear_ability_effects(&mut self) {
        self.ability.active = false;
        self.stealthed = false;
        self.shielded = false;
    }
}
