pub mod plan_2d;

/// Plan-view point. The second component is the world `z` axis.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type, `y` up.
pub type Point3 = nalgebra::Point3<f64>;

/// Plan-view vector. The second component is the world `z` axis.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-9;

/// Default lower bound for a wall's adjusted length (1 mm in metres).
pub const MIN_WALL_LENGTH: f64 = 1e-3;
