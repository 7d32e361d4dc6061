//! Bot steering for ships without a human at the helm
//!
//! Produces the same `ShipInput` a client would send, so bots go through the
//! normal input path. Purely a function of the world, no hidden state.

use glam::Vec2;

use super::entities::PlayerId;
use super::state::{ShipInput, World};
use crate::consts::{ENGAGEMENT_RANGE, SHIP_RADIUS};
use crate::{heading_to_vec, normalize_angle};

/// Bots stop closing in once this near their target
const STANDOFF_DISTANCE: f32 = 160.0;
/// Fire when the bow is within this angle of the target (radians)
const FIRING_ARC: f32 = 0.25;
/// How far ahead a bot looks for islands
const LOOKAHEAD: f32 = 140.0;

/// Decide what a bot-controlled ship does this tick
pub fn bot_input(world: &World, id: PlayerId) -> ShipInput {
    let Some(me) = world.players.get(id) else {
        return ShipInput::default();
    };
    if me.is_dead {
        return ShipInput::default();
    }

    let now = world.now_ms;
    let pos = me.ship.pos;

    // Enemy ships in range take priority, otherwise hunt the closest neutral
    let enemy = world
        .players
        .iter()
        .filter(|p| p.id != id && p.is_targetable(now))
        .map(|p| (p.ship.pos, p.ship.pos.distance(pos)))
        .filter(|(_, dist)| *dist <= ENGAGEMENT_RANGE)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let neutral = || {
        world
            .neutrals
            .iter()
            .filter(|n| !n.is_destroyed())
            .map(|n| (n.pos, n.pos.distance(pos)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    };
    let target = enemy.or_else(neutral);

    let center = Vec2::new(world.config.world_width, world.config.world_height) * 0.5;
    let (aim_point, distance) = target.unwrap_or((center, pos.distance(center)));
    let aim = aim_point - pos;
    let mut heading = if aim.length_squared() > f32::EPSILON {
        aim.y.atan2(aim.x)
    } else {
        me.ship.heading
    };

    let aligned = normalize_angle(heading - me.ship.heading).abs() < FIRING_ARC;
    let in_range = target.is_some() && distance <= ENGAGEMENT_RANGE;

    // Veer off an island that sits on the current course
    let ahead = pos + heading_to_vec(me.ship.heading) * LOOKAHEAD;
    if let Some(island) = world
        .islands
        .iter()
        .find(|i| ahead.distance(i.center) < i.radius + SHIP_RADIUS * 2.0)
    {
        let away = pos - island.center;
        let tangent = Vec2::new(-away.y, away.x);
        let side = if tangent.dot(heading_to_vec(me.ship.heading)) >= 0.0 {
            tangent
        } else {
            -tangent
        };
        heading = side.y.atan2(side.x);
    }

    ShipInput {
        target_pos: None,
        heading,
        thrust: distance > STANDOFF_DISTANCE,
        fire: in_range && aligned,
        use_ability: in_range && me.ship.ability.ready(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimConfig;
    use crate::sim::entities::{NeutralKind, NeutralObject};

    fn open_sea() -> World {
        World::new(SimConfig {
            island_count: 0,
            initial_neutrals: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_bot_turns_toward_nearest_neutral() {
        let mut world = open_sea();
        let id = world.join("bot", false, None).player_id;
        if let Some(p) = world.players.get_mut(id) {
            p.ship.pos = Vec2::new(1000.0, 1000.0);
            p.ship.heading = 0.0;
        }
        let n = world.next_neutral_id();
        world
            .neutrals
            .insert(NeutralObject::new(n, NeutralKind::Buoy, Vec2::new(1000.0, 1300.0), 0.0));

        let input = bot_input(&world, id);
        assert!((input.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
        assert!(input.thrust);
        assert!(!input.fire, "not yet facing the target");
    }

    #[test]
    fn test_bot_fires_when_aligned_and_in_range() {
        let mut world = open_sea();
        let id = world.join("bot", false, None).player_id;
        if let Some(p) = world.players.get_mut(id) {
            p.ship.pos = Vec2::new(1000.0, 1000.0);
            p.ship.heading = 0.0;
        }
        let n = world.next_neutral_id();
        world
            .neutrals
            .insert(NeutralObject::new(n, NeutralKind::Cargo, Vec2::new(1100.0, 1000.0), 0.0));

        let input = bot_input(&world, id);
        assert!(input.fire);
        assert!(!input.thrust, "inside standoff distance");
    }

    #[test]
    fn test_dead_or_missing_bot_idles() {
        let mut world = open_sea();
        assert_eq!(bot_input(&world, PlayerId(42)), ShipInput::default());

        let id = world.join("bot", false, None).player_id;
        if let Some(p) = world.players.get_mut(id) {
            p.is_dead = true;
        }
        assert_eq!(bot_input(&world, id), ShipInput::default());
    }
}
