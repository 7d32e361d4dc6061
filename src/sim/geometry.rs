//! Collision primitives for circles and swept segments
//!
//! Islands are circles; every moving entity is a circle sweeping a straight
//! segment each tick. These helpers are pure and stateless.

use glam::Vec2;

use crate::consts::COLLISION_EPSILON;

/// First intersection of segment `start -> end` with a circle.
///
/// Solves |start + t·d - center|² = r² and returns the smaller root in [0, 1]
/// (the entry point), or `None` if the segment never touches the circle.
/// A segment that starts inside the circle reports `t = 0`.
pub fn first_segment_circle_hit(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = end - start;
    let f = start - center;

    let c = f.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let a = d.length_squared();
    if a <= f32::EPSILON {
        // Zero-length segment outside the circle
        return None;
    }

    let b = 2.0 * f.dot(d);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    if (0.0..=1.0).contains(&t1) {
        Some(t1)
    } else if (0.0..=1.0).contains(&t2) {
        Some(t2)
    } else {
        None
    }
}

/// Keep a circle of `entity_radius` moving from `prev` to `next` outside an island.
///
/// If `next` already lies inside the expanded circle it is pushed radially out
/// to the boundary plus [`COLLISION_EPSILON`]. If only the path crosses the
/// circle, the entry point is pushed out the same way. Otherwise `next` is
/// returned unchanged.
pub fn clamp_outside_circle_along_segment(
    prev: Vec2,
    next: Vec2,
    entity_radius: f32,
    center: Vec2,
    circle_radius: f32,
) -> Vec2 {
    let expanded = circle_radius + entity_radius;

    if point_in_circle(next, center, expanded) {
        return push_out(next, prev, center, expanded);
    }

    match first_segment_circle_hit(prev, next, center, expanded) {
        Some(t) => {
            let hit = prev + (next - prev) * t;
            push_out(hit, prev, center, expanded)
        }
        None => next,
    }
}

/// Project `point` radially out of the circle, just past its boundary
fn push_out(point: Vec2, prev: Vec2, center: Vec2, expanded_radius: f32) -> Vec2 {
    let mut normal = (point - center).normalize_or_zero();
    if normal == Vec2::ZERO {
        // Sitting exactly on the center: back out along the direction of travel
        normal = (prev - point).normalize_or_zero();
        if normal == Vec2::ZERO {
            normal = Vec2::X;
        }
    }
    center + normal * (expanded_radius + COLLISION_EPSILON)
}

/// Strict point-in-circle test
#[inline]
pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    point.distance_squared(center) < radius * radius
}

/// Circle-circle overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    a.distance_squared(b) <= combined * combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_segment_hits_circle_entry_point() {
        let t = first_segment_circle_hit(
            Vec2::new(-10.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::ZERO,
            5.0,
        );
        let t = t.expect("segment passes through circle");
        assert!((t - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_segment_misses_circle() {
        let t = first_segment_circle_hit(
            Vec2::new(-10.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::ZERO,
            5.0,
        );
        assert!(t.is_none());

        // Stops short of the circle
        let t = first_segment_circle_hit(
            Vec2::new(-20.0, 0.0),
            Vec2::new(-10.0, 0.0),
            Vec2::ZERO,
            5.0,
        );
        assert!(t.is_none());
    }

    #[test]
    fn test_zero_length_segment() {
        assert!(first_segment_circle_hit(Vec2::new(20.0, 0.0), Vec2::new(20.0, 0.0), Vec2::ZERO, 5.0).is_none());
        assert_eq!(
            first_segment_circle_hit(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0), Vec2::ZERO, 5.0),
            Some(0.0)
        );
    }

    #[test]
    fn test_clamp_endpoint_inside_is_pushed_radially() {
        let corrected = clamp_outside_circle_along_segment(
            Vec2::new(150.0, 0.0),
            Vec2::new(105.0, 0.0),
            10.0,
            Vec2::ZERO,
            100.0,
        );
        assert!((corrected.x - (110.0 + COLLISION_EPSILON)).abs() < 1e-3);
        assert!(corrected.y.abs() < 1e-4);
    }

    #[test]
    fn test_clamp_tunneling_path_stops_at_entry() {
        // Fast enough to jump clean over a thin island in one tick
        let corrected = clamp_outside_circle_along_segment(
            Vec2::new(-50.0, 0.0),
            Vec2::new(50.0, 0.0),
            2.0,
            Vec2::ZERO,
            10.0,
        );
        assert!(corrected.x < 0.0);
        assert!(corrected.length() >= 12.0 + COLLISION_EPSILON - 1e-3);
    }

    #[test]
    fn test_clamp_degenerate_center_uses_travel_direction() {
        let corrected = clamp_outside_circle_along_segment(
            Vec2::new(0.0, 40.0),
            Vec2::ZERO,
            5.0,
            Vec2::ZERO,
            20.0,
        );
        assert!(corrected.y > 0.0);
        assert!((corrected.length() - (25.0 + COLLISION_EPSILON)).abs() < 1e-3);

        // No motion at all still resolves
        let corrected = clamp_outside_circle_along_segment(Vec2::ZERO, Vec2::ZERO, 5.0, Vec2::ZERO, 20.0);
        assert!(corrected.length() >= 25.0);
    }

    #[test]
    fn test_clamp_clear_path_unchanged() {
        let next = Vec2::new(300.0, 300.0);
        let corrected =
            clamp_outside_circle_along_segment(Vec2::new(290.0, 300.0), next, 10.0, Vec2::ZERO, 100.0);
        assert_eq!(corrected, next);
    }

    proptest! {
        #[test]
        fn prop_no_tunneling(
            sx in -500.0f32..500.0,
            sy in -500.0f32..500.0,
            dx in -60.0f32..60.0,
            dy in -60.0f32..60.0,
            radius in 30.0f32..250.0,
            entity_radius in 0.0f32..30.0,
        ) {
            let center = Vec2::ZERO;
            let expanded = radius + entity_radius;
            let prev = Vec2::new(sx, sy);
            // Only paths that start outside the island are meaningful
            prop_assume!(prev.length() > expanded + COLLISION_EPSILON);
            let next = prev + Vec2::new(dx, dy);

            let corrected = clamp_outside_circle_along_segment(prev, next, entity_radius, center, radius);
            prop_assert!(corrected.length() >= expanded + COLLISION_EPSILON * 0.5);
        }
    }
}
