pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod store;
pub mod sync;

pub use config::{JoineryConfig, JoineryStyle};
pub use error::{DegenerateJoinery, GeometryError, JoineryError, OperationError, Result};
pub use geometry::{Endpoint, WallEntity, WallParams, WallUpdate};
pub use operations::Intersection;
pub use store::{ChangeEvent, ChangeReason, EntityId, ObjectStore};
pub use sync::{SceneSync, WallPlacement};
