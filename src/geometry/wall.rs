use serde::{Deserialize, Serialize};

use crate::error::{DegenerateJoinery, GeometryError};
use crate::math::plan_2d::{advance, direction, is_finite, length};
use crate::math::{Point2, Vector2, TOLERANCE};
use crate::store::EntityId;

/// One of the two ends of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// Parameters for creating a wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallParams {
    pub start: Point2,
    pub end: Point2,
    pub thickness: f64,
    pub height: f64,
    #[serde(default)]
    pub material: Option<String>,
}

impl WallParams {
    /// Creates wall parameters without a material.
    #[must_use]
    pub fn new(start: Point2, end: Point2, thickness: f64, height: f64) -> Self {
        Self {
            start,
            end,
            thickness,
            height,
            material: None,
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Checks the authored geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] for non-finite coordinates, coincident
    /// endpoints, or a thickness/height that is not a positive finite number.
    pub fn validate(&self) -> Result<(), GeometryError> {
        validate_geometry(&self.start, &self.end, self.thickness, self.height)
    }
}

/// A partial update of a wall's authored parameters.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallUpdate {
    #[serde(default)]
    pub start: Option<Point2>,
    #[serde(default)]
    pub end: Option<Point2>,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub material: Option<String>,
}

impl WallUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_start(mut self, start: Point2) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn with_end(mut self, end: Point2) -> Self {
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }
}

/// A straight parametric wall.
///
/// `start`/`end` are the authored (as-drawn) endpoints and are only changed by
/// an explicit update. The adjusted fields are joinery output and are always
/// derived from the authored endpoints, never from a previous adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallEntity {
    id: EntityId,
    start: Point2,
    end: Point2,
    thickness: f64,
    height: f64,
    material: Option<String>,
    start_adjustment: f64,
    end_adjustment: f64,
    adjusted_start: Point2,
    adjusted_end: Point2,
    actual_length: f64,
    adjust_for_joinery: bool,
}

impl WallEntity {
    /// Builds a wall with zero adjustments. `params` must already be valid.
    pub(crate) fn from_params(id: EntityId, params: WallParams) -> Self {
        let actual_length = length(&params.start, &params.end);
        Self {
            id,
            start: params.start,
            end: params.end,
            thickness: params.thickness,
            height: params.height,
            material: params.material,
            start_adjustment: 0.0,
            end_adjustment: 0.0,
            adjusted_start: params.start,
            adjusted_end: params.end,
            actual_length,
            adjust_for_joinery: false,
        }
    }

    /// Returns the store id of the wall.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the authored start point.
    #[must_use]
    pub fn start(&self) -> Point2 {
        self.start
    }

    /// Returns the authored end point.
    #[must_use]
    pub fn end(&self) -> Point2 {
        self.end
    }

    /// Returns the full wall thickness.
    #[must_use]
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Returns half the thickness, the trim this wall applies at a corner.
    #[must_use]
    pub fn half_thickness(&self) -> f64 {
        self.thickness * 0.5
    }

    /// Returns the wall height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the material tag, if any.
    #[must_use]
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    /// Returns the trim applied at the start, in world units.
    #[must_use]
    pub fn start_adjustment(&self) -> f64 {
        self.start_adjustment
    }

    /// Returns the trim applied at the end, in world units.
    #[must_use]
    pub fn end_adjustment(&self) -> f64 {
        self.end_adjustment
    }

    /// Returns the start point after joinery.
    #[must_use]
    pub fn adjusted_start(&self) -> Point2 {
        self.adjusted_start
    }

    /// Returns the end point after joinery.
    #[must_use]
    pub fn adjusted_end(&self) -> Point2 {
        self.adjusted_end
    }

    /// Adjusted length, never below the configured minimum.
    #[must_use]
    pub fn actual_length(&self) -> f64 {
        self.actual_length
    }

    /// Returns `true` if either endpoint is trimmed.
    #[must_use]
    pub fn adjust_for_joinery(&self) -> bool {
        self.adjust_for_joinery
    }

    /// Length of the authored centerline.
    #[must_use]
    pub fn authored_length(&self) -> f64 {
        length(&self.start, &self.end)
    }

    /// Authored position of the given endpoint.
    #[must_use]
    pub fn endpoint(&self, which: Endpoint) -> Point2 {
        match which {
            Endpoint::Start => self.start,
            Endpoint::End => self.end,
        }
    }

    /// Returns the trim applied at `which`.
    #[must_use]
    pub fn adjustment(&self, which: Endpoint) -> f64 {
        match which {
            Endpoint::Start => self.start_adjustment,
            Endpoint::End => self.end_adjustment,
        }
    }

    /// Start point used for rendering: adjusted if joinery applies, authored otherwise.
    #[must_use]
    pub fn effective_start(&self) -> Point2 {
        if self.adjust_for_joinery {
            self.adjusted_start
        } else {
            self.start
        }
    }

    /// Adjusted end if joinery applies, authored end otherwise.
    #[must_use]
    pub fn effective_end(&self) -> Point2 {
        if self.adjust_for_joinery {
            self.adjusted_end
        } else {
            self.end
        }
    }

    /// Unit direction of the authored centerline.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroLength`] if the endpoints coincide.
    pub fn direction(&self) -> Result<Vector2, GeometryError> {
        direction(&self.start, &self.end)
    }

    /// Returns `true` if the authored endpoints are finite and distinct.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        is_finite(&self.start)
            && is_finite(&self.end)
            && length(&self.start, &self.end) >= TOLERANCE
    }

    /// Merges `update` into the authored parameters and drops any derived
    /// geometry. On error the wall is left untouched.
    pub(crate) fn apply_update(&mut self, update: &WallUpdate) -> Result<(), GeometryError> {
        let start = update.start.unwrap_or(self.start);
        let end = update.end.unwrap_or(self.end);
        let thickness = update.thickness.unwrap_or(self.thickness);
        let height = update.height.unwrap_or(self.height);
        validate_geometry(&start, &end, thickness, height)?;

        self.start = start;
        self.end = end;
        self.thickness = thickness;
        self.height = height;
        if let Some(material) = &update.material {
            self.material = Some(material.clone());
        }
        self.reset_adjustments();
        Ok(())
    }

    /// Trims the wall by the requested amounts at each end.
    ///
    /// Adjusted points are computed from the authored endpoints. Each trim is
    /// clamped to half the authored length and the resulting length to
    /// `min_length`; any clamping is reported as [`DegenerateJoinery`].
    pub(crate) fn apply_adjustments(
        &mut self,
        requested_start: f64,
        requested_end: f64,
        min_length: f64,
    ) -> Result<Option<DegenerateJoinery>, GeometryError> {
        let unit = self.direction()?;
        let authored = self.authored_length();
        let half = authored * 0.5;

        let start_adj = requested_start.clamp(0.0, half);
        let end_adj = requested_end.clamp(0.0, half);
        let remaining = authored - start_adj - end_adj;
        let actual_length = remaining.max(min_length);

        self.start_adjustment = start_adj;
        self.end_adjustment = end_adj;
        self.adjusted_start = advance(&self.start, &unit, start_adj);
        self.adjusted_end = advance(&self.end, &unit, -end_adj);
        self.actual_length = actual_length;
        self.adjust_for_joinery = start_adj > 0.0 || end_adj > 0.0;

        let clamped =
            start_adj < requested_start || end_adj < requested_end || remaining < min_length;
        Ok(clamped.then_some(DegenerateJoinery {
            wall: self.id,
            authored_length: authored,
            requested_start,
            requested_end,
            actual_length,
        }))
    }

    /// Restores raw geometry: zero adjustments, adjusted points = authored points.
    pub(crate) fn reset_adjustments(&mut self) {
        self.start_adjustment = 0.0;
        self.end_adjustment = 0.0;
        self.adjusted_start = self.start;
        self.adjusted_end = self.end;
        self.actual_length = self.authored_length();
        self.adjust_for_joinery = false;
    }
}

fn validate_geometry(
    start: &Point2,
    end: &Point2,
    thickness: f64,
    height: f64,
) -> Result<(), GeometryError> {
    if !is_finite(start) {
        return Err(GeometryError::NonFinite { field: "start" });
    }
    if !is_finite(end) {
        return Err(GeometryError::NonFinite { field: "end" });
    }
    check_positive("thickness", thickness)?;
    check_positive("height", height)?;
    if length(start, end) < TOLERANCE {
        return Err(GeometryError::ZeroLength);
    }
    Ok(())
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(GeometryError::NonPositive { field, value });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    use super::*;

    fn wall(start: (f64, f64), end: (f64, f64), thickness: f64) -> WallEntity {
        let mut keys: SlotMap<EntityId, ()> = SlotMap::with_key();
        let id = keys.insert(());
        let params = WallParams::new(
            Point2::new(start.0, start.1),
            Point2::new(end.0, end.1),
            thickness,
            3.0,
        );
        params.validate().unwrap();
        WallEntity::from_params(id, params)
    }

    #[test]
    fn new_wall_has_raw_geometry() {
        let w = wall((0.0, 0.0), (4.0, 0.0), 0.2);
        assert!(!w.adjust_for_joinery());
        assert_eq!(w.adjusted_start(), w.start());
        assert_eq!(w.adjusted_end(), w.end());
        assert_relative_eq!(w.actual_length(), 4.0);
    }

    #[test]
    fn zero_length_rejected() {
        let p = Point2::new(1.0, 1.0);
        let params = WallParams::new(p, p, 0.2, 3.0);
        assert_eq!(params.validate(), Err(GeometryError::ZeroLength));
    }

    #[test]
    fn non_positive_dimensions_rejected() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(matches!(
            WallParams::new(a, b, 0.0, 3.0).validate(),
            Err(GeometryError::NonPositive { field: "thickness", .. })
        ));
        assert!(matches!(
            WallParams::new(a, b, 0.2, -1.0).validate(),
            Err(GeometryError::NonPositive { field: "height", .. })
        ));
        assert!(matches!(
            WallParams::new(a, b, f64::NAN, 3.0).validate(),
            Err(GeometryError::NonFinite { field: "thickness" })
        ));
    }

    #[test]
    fn adjustments_trim_inward_from_authored_points() {
        let mut w = wall((0.0, 0.0), (4.0, 0.0), 0.2);
        let warning = w.apply_adjustments(0.0, 0.1, 1e-3).unwrap();
        assert!(warning.is_none());
        assert!(w.adjust_for_joinery());
        assert_relative_eq!(w.adjusted_end().x, 3.9);
        assert_relative_eq!(w.adjusted_start().x, 0.0);
        assert_relative_eq!(w.actual_length(), 3.9);
        assert_eq!(w.effective_end(), w.adjusted_end());
    }

    #[test]
    fn repeated_adjustment_does_not_compound() {
        let mut w = wall((0.0, 0.0), (4.0, 3.0), 0.3);
        w.apply_adjustments(0.15, 0.15, 1e-3).unwrap();
        let first = w.clone();
        for _ in 0..10 {
            w.apply_adjustments(0.15, 0.15, 1e-3).unwrap();
        }
        assert_eq!(w, first);
    }

    #[test]
    fn over_trim_is_clamped_and_reported() {
        let mut w = wall((0.0, 0.0), (0.15, 0.0), 0.2);
        let warning = w.apply_adjustments(0.1, 0.1, 1e-3).unwrap().unwrap();
        assert_relative_eq!(w.actual_length(), 1e-3);
        assert_relative_eq!(w.start_adjustment(), 0.075);
        assert_relative_eq!(w.end_adjustment(), 0.075);
        assert_relative_eq!(warning.authored_length, 0.15);
        assert_relative_eq!(warning.actual_length, 1e-3);
    }

    #[test]
    fn reset_restores_authored_geometry() {
        let mut w = wall((0.0, 0.0), (4.0, 0.0), 0.2);
        w.apply_adjustments(0.1, 0.1, 1e-3).unwrap();
        w.reset_adjustments();
        assert!(!w.adjust_for_joinery());
        assert_eq!(w.adjusted_start(), w.start());
        assert_eq!(w.adjusted_end(), w.end());
        assert_relative_eq!(w.actual_length(), 4.0);
    }

    #[test]
    fn failed_update_leaves_wall_untouched() {
        let mut w = wall((0.0, 0.0), (4.0, 0.0), 0.2);
        let before = w.clone();
        let update = WallUpdate::new().with_end(Point2::new(0.0, 0.0));
        assert_eq!(w.apply_update(&update), Err(GeometryError::ZeroLength));
        assert_eq!(w, before);
    }

    #[test]
    fn update_invalidates_adjustments() {
        let mut w = wall((0.0, 0.0), (4.0, 0.0), 0.2);
        w.apply_adjustments(0.1, 0.1, 1e-3).unwrap();
        w.apply_update(&WallUpdate::new().with_thickness(0.3).with_material("brick"))
            .unwrap();
        assert!(!w.adjust_for_joinery());
        assert_relative_eq!(w.thickness(), 0.3);
        assert_eq!(w.material(), Some("brick"));
    }
}
