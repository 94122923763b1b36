pub mod opening;
pub mod wall;

pub use opening::{OpeningEntity, OpeningKind, OpeningParams, OpeningUpdate};
pub use wall::{Endpoint, WallEntity, WallParams, WallUpdate};
