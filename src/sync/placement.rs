use serde::{Deserialize, Serialize};

use crate::geometry::WallEntity;
use crate::math::plan_2d::{heading, midpoint};
use crate::math::{Point2, Point3};

/// A wall's effective geometry, ready to be pushed to the scene.
///
/// Built once per wall after joinery and projected into both the 3D and the
/// plan representation, so the two share the exact same center and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallPlacement {
    /// Adjusted start if joinery applies, authored start otherwise.
    pub effective_start: Point2,
    pub effective_end: Point2,
    /// Plan-view midpoint of the effective segment.
    pub center: Point2,
    /// `atan2(Δz, Δx)` of the authored centerline, in radians. Trimming never
    /// changes direction, and a fully clamped wall keeps its orientation.
    pub rotation: f64,
    /// The wall's adjusted length.
    pub length: f64,
    pub thickness: f64,
    pub height: f64,
}

/// Box extrusion in the 3D view, `y` up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrusion3D {
    pub center: Point3,
    pub rotation: f64,
    pub length: f64,
    pub thickness: f64,
    pub height: f64,
}

/// Footprint rectangle on the ground plane of the 2D plan view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanFootprint {
    pub center: Point3,
    pub rotation: f64,
    pub length: f64,
    pub thickness: f64,
}

impl WallPlacement {
    #[must_use]
    pub fn from_wall(wall: &WallEntity) -> Self {
        let effective_start = wall.effective_start();
        let effective_end = wall.effective_end();
        Self {
            effective_start,
            effective_end,
            center: midpoint(&effective_start, &effective_end),
            rotation: heading(&wall.start(), &wall.end()),
            length: wall.actual_length(),
            thickness: wall.thickness(),
            height: wall.height(),
        }
    }

    /// 3D representation: plan center lifted by half the wall height.
    #[must_use]
    pub fn extrusion(&self) -> Extrusion3D {
        Extrusion3D {
            center: Point3::new(self.center.x, self.height * 0.5, self.center.y),
            rotation: self.rotation,
            length: self.length,
            thickness: self.thickness,
            height: self.height,
        }
    }

    /// Plan representation on the ground plane, no vertical offset.
    #[must_use]
    pub fn plan(&self) -> PlanFootprint {
        PlanFootprint {
            center: Point3::new(self.center.x, 0.0, self.center.y),
            rotation: self.rotation,
            length: self.length,
            thickness: self.thickness,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    use super::*;
    use crate::geometry::WallParams;
    use crate::store::EntityId;

    fn wall(a: (f64, f64), b: (f64, f64)) -> WallEntity {
        let mut keys: SlotMap<EntityId, ()> = SlotMap::with_key();
        WallEntity::from_params(
            keys.insert(()),
            WallParams::new(Point2::new(a.0, a.1), Point2::new(b.0, b.1), 0.2, 2.8),
        )
    }

    #[test]
    fn raw_wall_uses_authored_points() {
        let p = WallPlacement::from_wall(&wall((0.0, 0.0), (4.0, 0.0)));
        assert_relative_eq!(p.center.x, 2.0);
        assert_relative_eq!(p.center.y, 0.0);
        assert_relative_eq!(p.rotation, 0.0);
        assert_relative_eq!(p.length, 4.0);
    }

    #[test]
    fn adjusted_wall_uses_trimmed_points() {
        let mut w = wall((4.0, 0.0), (4.0, 3.0));
        w.apply_adjustments(0.1, 0.0, 1e-3).unwrap();
        let p = WallPlacement::from_wall(&w);
        assert_relative_eq!(p.center.y, 1.55, epsilon = 1e-12);
        assert_relative_eq!(p.rotation, FRAC_PI_2);
        assert_relative_eq!(p.length, 2.9, epsilon = 1e-12);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn both_views_share_center_and_rotation() {
        let mut w = wall((1.0, 2.0), (5.0, 5.0));
        w.apply_adjustments(0.1, 0.1, 1e-3).unwrap();
        let p = WallPlacement::from_wall(&w);
        let solid = p.extrusion();
        let plan = p.plan();

        assert_eq!(solid.center.x, plan.center.x);
        assert_eq!(solid.center.z, plan.center.z);
        assert_eq!(solid.rotation, plan.rotation);
        assert_eq!(solid.length, plan.length);
        assert_relative_eq!(solid.center.y, 1.4);
        assert_relative_eq!(plan.center.y, 0.0);
    }

    #[test]
    fn clamped_vertical_wall_keeps_its_rotation() {
        let mut w = wall((0.0, 0.0), (0.0, 0.15));
        w.apply_adjustments(0.1, 0.1, 1e-3).unwrap();
        let p = WallPlacement::from_wall(&w);
        assert_relative_eq!(p.effective_start.y, p.effective_end.y);
        assert_relative_eq!(p.rotation, FRAC_PI_2);
        assert_relative_eq!(p.extrusion().rotation, FRAC_PI_2);
        assert_relative_eq!(p.plan().rotation, FRAC_PI_2);
        assert_relative_eq!(p.length, 1e-3);
    }
}
