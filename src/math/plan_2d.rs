use crate::error::GeometryError;

use super::{Point2, Vector2, TOLERANCE};

/// Returns the unit vector pointing from `a` to `b`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroLength`] if the two points coincide
/// (within [`TOLERANCE`]).
pub fn direction(a: &Point2, b: &Point2) -> Result<Vector2, GeometryError> {
    let delta = b - a;
    let len = delta.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroLength);
    }
    Ok(delta / len)
}

/// Moves `point` along `unit` by `distance`.
#[must_use]
pub fn advance(point: &Point2, unit: &Vector2, distance: f64) -> Point2 {
    point + unit * distance
}

/// Euclidean distance between `a` and `b`.
#[must_use]
pub fn length(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

#[must_use]
pub fn midpoint(a: &Point2, b: &Point2) -> Point2 {
    Point2::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

/// Plan heading of the segment `a → b`: `atan2(Δz, Δx)` in radians.
#[must_use]
pub fn heading(a: &Point2, b: &Point2) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Returns `true` if both components of `p` are finite.
#[must_use]
pub fn is_finite(p: &Point2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}
