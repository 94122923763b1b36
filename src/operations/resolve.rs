use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::JoineryStyle;
use crate::error::DegenerateJoinery;
use crate::geometry::{Endpoint, WallEntity};
use crate::store::{EntityArena, EntityId};

use super::detect::Intersection;

/// Outcome of one joinery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoineryReport {
    /// Intersections that produced corner trims.
    pub accepted: Vec<Intersection>,
    /// Candidates dropped because an endpoint was already claimed by a closer
    /// partner (three or more walls at one point), or because they referenced
    /// a wall that is no longer in the arena.
    pub discarded: Vec<Intersection>,
    pub warnings: Vec<DegenerateJoinery>,
}

/// Recomputes corner trims for every wall in the arena.
///
/// The pass is a pure function of authored geometry and the intersection
/// list: adjusted points are always rebuilt from `start`/`end`, and walls
/// without an accepted intersection are reset to raw geometry. Running it
/// twice on the same inputs gives bit-identical results.
///
/// Only two walls can share an endpoint. When an endpoint appears in several
/// candidates, the closest pair wins (ties broken by entity id, then
/// endpoint) and the others are reported in [`JoineryReport::discarded`];
/// T- and cross-junctions are therefore not resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolveJoinery {
    style: JoineryStyle,
    min_length: f64,
}

impl ResolveJoinery {
    #[must_use]
    pub fn new(style: JoineryStyle, min_length: f64) -> Self {
        Self { style, min_length }
    }

    /// Executes the pass, mutating the adjusted fields of every wall.
    pub fn execute(&self, arena: &mut EntityArena, intersections: &[Intersection]) -> JoineryReport {
        let (accepted, discarded) = select_corners(arena, intersections);

        // Requested trim per wall: (start, end). Larger request wins.
        let mut requests: HashMap<EntityId, (f64, f64)> = HashMap::new();
        for corner in &accepted {
            for (id, endpoint) in [
                (corner.wall_a, corner.endpoint_a),
                (corner.wall_b, corner.endpoint_b),
            ] {
                let Ok(wall) = arena.wall(id) else { continue };
                let trim = self.trim_for(wall);
                let entry = requests.entry(id).or_insert((0.0, 0.0));
                match endpoint {
                    Endpoint::Start => entry.0 = entry.0.max(trim),
                    Endpoint::End => entry.1 = entry.1.max(trim),
                }
            }
        }

        let mut warnings = Vec::new();
        for wall in arena.walls_mut() {
            let Some(&(start, end)) = requests.get(&wall.id()) else {
                wall.reset_adjustments();
                continue;
            };
            match wall.apply_adjustments(start, end, self.min_length) {
                Ok(None) => {}
                Ok(Some(warning)) => {
                    warn!(%warning, "clamped wall length at competing corners");
                    warnings.push(warning);
                }
                Err(err) => {
                    warn!(wall = ?wall.id(), %err, "skipping joinery for malformed wall");
                    wall.reset_adjustments();
                }
            }
        }

        debug!(
            accepted = accepted.len(),
            discarded = discarded.len(),
            warnings = warnings.len(),
            "joinery pass complete"
        );

        JoineryReport {
            accepted,
            discarded,
            warnings,
        }
    }

    fn trim_for(&self, wall: &WallEntity) -> f64 {
        match self.style {
            JoineryStyle::Butt => wall.half_thickness(),
        }
    }
}

/// Picks at most one partner per wall endpoint, closest first.
fn select_corners(
    arena: &EntityArena,
    intersections: &[Intersection],
) -> (Vec<Intersection>, Vec<Intersection>) {
    let mut ordered: Vec<&Intersection> = intersections.iter().collect();
    ordered.sort_by(|a, b| {
        a.distance.total_cmp(&b.distance).then_with(|| {
            (a.wall_a, a.endpoint_a, a.wall_b, a.endpoint_b)
                .cmp(&(b.wall_a, b.endpoint_a, b.wall_b, b.endpoint_b))
        })
    });

    let mut claimed: HashSet<(EntityId, Endpoint)> = HashSet::new();
    let mut accepted = Vec::new();
    let mut discarded = Vec::new();
    for candidate in ordered {
        let key_a = (candidate.wall_a, candidate.endpoint_a);
        let key_b = (candidate.wall_b, candidate.endpoint_b);

        if arena.wall(candidate.wall_a).is_err() || arena.wall(candidate.wall_b).is_err() {
            debug!(?candidate, "dropping intersection with a missing wall");
            discarded.push(candidate.clone());
            continue;
        }
        if claimed.contains(&key_a) || claimed.contains(&key_b) {
            warn!(
                wall_a = ?candidate.wall_a,
                wall_b = ?candidate.wall_b,
                x = candidate.position.x,
                z = candidate.position.y,
                "unresolved multi-wall junction, keeping the closest pair"
            );
            discarded.push(candidate.clone());
            continue;
        }
        claimed.insert(key_a);
        claimed.insert(key_b);
        accepted.push(candidate.clone());
    }
    (accepted, discarded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::WallParams;
    use crate::math::Point2;
    use crate::operations::DetectIntersections;

    const MIN: f64 = 1e-3;

    fn add(arena: &mut EntityArena, a: (f64, f64), b: (f64, f64), thickness: f64) -> EntityId {
        arena
            .add_wall(WallParams::new(
                Point2::new(a.0, a.1),
                Point2::new(b.0, b.1),
                thickness,
                3.0,
            ))
            .unwrap()
    }

    fn run(arena: &mut EntityArena, tolerance: f64) -> JoineryReport {
        let walls: Vec<WallEntity> = arena.walls().cloned().collect();
        let refs: Vec<&WallEntity> = walls.iter().collect();
        let hits = DetectIntersections::new(tolerance).execute(&refs).unwrap();
        ResolveJoinery::new(JoineryStyle::Butt, MIN).execute(arena, &hits)
    }

    #[test]
    fn l_corner_trims_both_walls() {
        let mut arena = EntityArena::new();
        let a = add(&mut arena, (0.0, 0.0), (4.0, 0.0), 0.2);
        let b = add(&mut arena, (4.0, 0.0), (4.0, 3.0), 0.2);

        let report = run(&mut arena, 0.05);
        assert_eq!(report.accepted.len(), 1);
        assert!(report.warnings.is_empty());

        let wa = arena.wall(a).unwrap();
        assert!(wa.adjust_for_joinery());
        assert_relative_eq!(wa.end_adjustment(), 0.1);
        assert_relative_eq!(wa.start_adjustment(), 0.0);
        assert_relative_eq!(wa.actual_length(), 3.9, epsilon = 1e-12);
        assert_relative_eq!(wa.adjusted_end().x, 3.9, epsilon = 1e-12);

        let wb = arena.wall(b).unwrap();
        assert_relative_eq!(wb.start_adjustment(), 0.1);
        assert_relative_eq!(wb.actual_length(), 2.9, epsilon = 1e-12);
        assert_relative_eq!(wb.adjusted_start().y, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn each_wall_uses_its_own_thickness() {
        let mut arena = EntityArena::new();
        let thin = add(&mut arena, (0.0, 0.0), (4.0, 0.0), 0.1);
        let thick = add(&mut arena, (4.0, 0.0), (4.0, 3.0), 0.4);
        run(&mut arena, 0.05);
        assert_relative_eq!(arena.wall(thin).unwrap().end_adjustment(), 0.05);
        assert_relative_eq!(arena.wall(thick).unwrap().start_adjustment(), 0.2);
    }

    #[test]
    fn second_pass_is_bit_identical() {
        let mut arena = EntityArena::new();
        add(&mut arena, (0.0, 0.0), (5.0, 0.0), 0.2);
        add(&mut arena, (5.0, 0.0), (5.0, 4.0), 0.3);
        add(&mut arena, (5.0, 4.0), (0.0, 4.0), 0.25);
        add(&mut arena, (0.0, 4.0), (0.01, 0.02), 0.15);

        run(&mut arena, 0.05);
        let first: Vec<WallEntity> = arena.walls().cloned().collect();
        for _ in 0..5 {
            run(&mut arena, 0.05);
        }
        let last: Vec<WallEntity> = arena.walls().cloned().collect();
        assert_eq!(first, last);
    }

    #[test]
    fn trim_stays_within_own_half_thickness_of_corner() {
        let mut arena = EntityArena::new();
        let a = add(&mut arena, (0.0, 0.0), (3.0, 4.0), 0.2);
        let b = add(&mut arena, (3.0, 4.0), (8.0, 4.0), 0.3);
        run(&mut arena, 0.05);

        let corner = Point2::new(3.0, 4.0);
        let wa = arena.wall(a).unwrap();
        let wb = arena.wall(b).unwrap();
        assert_relative_eq!((corner - wa.adjusted_end()).norm(), 0.1, epsilon = 1e-12);
        assert_relative_eq!((wb.adjusted_start() - corner).norm(), 0.15, epsilon = 1e-12);
        assert!(wa.actual_length() >= wa.authored_length() - (0.1 + 0.15));
        assert!(wb.actual_length() >= wb.authored_length() - (0.15 + 0.1));
    }

    #[test]
    fn three_walls_at_one_point_keep_closest_pair() {
        let mut arena = EntityArena::new();
        let a = add(&mut arena, (0.0, 0.0), (4.0, 0.0), 0.2);
        let b = add(&mut arena, (4.0, 0.0), (4.0, 3.0), 0.2);
        let c = add(&mut arena, (4.01, 0.0), (8.0, 0.0), 0.2);

        let report = run(&mut arena, 0.05);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.discarded.len(), 2);
        let corner = &report.accepted[0];
        assert_eq!((corner.wall_a, corner.wall_b), (a, b));
        assert!(!arena.wall(c).unwrap().adjust_for_joinery());
    }

    #[test]
    fn walls_without_partner_are_reset() {
        let mut arena = EntityArena::new();
        let a = add(&mut arena, (0.0, 0.0), (4.0, 0.0), 0.2);
        let b = add(&mut arena, (4.0, 0.0), (4.0, 3.0), 0.2);
        run(&mut arena, 0.05);
        assert!(arena.wall(a).unwrap().adjust_for_joinery());

        arena.remove(b).unwrap();
        let report = run(&mut arena, 0.05);
        assert!(report.accepted.is_empty());
        let wa = arena.wall(a).unwrap();
        assert!(!wa.adjust_for_joinery());
        assert_eq!(wa.adjusted_end(), wa.end());
        assert_relative_eq!(wa.actual_length(), 4.0);
    }

    #[test]
    fn stale_intersection_is_discarded() {
        let mut arena = EntityArena::new();
        let a = add(&mut arena, (0.0, 0.0), (4.0, 0.0), 0.2);
        let b = add(&mut arena, (4.0, 0.0), (4.0, 3.0), 0.2);
        let walls: Vec<WallEntity> = arena.walls().cloned().collect();
        let refs: Vec<&WallEntity> = walls.iter().collect();
        let hits = DetectIntersections::new(0.05).execute(&refs).unwrap();
        arena.remove(b).unwrap();

        let report = ResolveJoinery::new(JoineryStyle::Butt, MIN).execute(&mut arena, &hits);
        assert_eq!(report.discarded.len(), 1);
        assert!(!arena.wall(a).unwrap().adjust_for_joinery());
    }

    #[test]
    fn short_wall_between_two_corners_is_clamped() {
        let mut arena = EntityArena::new();
        let short = add(&mut arena, (0.0, 0.0), (0.15, 0.0), 0.2);
        add(&mut arena, (0.0, 2.0), (0.0, 0.0), 0.2);
        add(&mut arena, (0.15, 0.0), (0.15, 2.0), 0.2);

        let report = run(&mut arena, 0.05);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].wall, short);

        let w = arena.wall(short).unwrap();
        assert_relative_eq!(w.actual_length(), MIN);
        assert!(w.actual_length() > 0.0);
    }
}
