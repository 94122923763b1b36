use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::store::EntityId;

use super::wall::check_positive;

pub const DEFAULT_DOOR_WIDTH: f64 = 0.9;
pub const DEFAULT_WINDOW_WIDTH: f64 = 1.0;
pub const DEFAULT_OPENING_HEIGHT: f64 = 2.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpeningKind {
    Door,
    Window,
}

/// Parameters for an opening hosted by a wall.
///
/// `offset` is the distance from the host's authored start to the opening's
/// center; `None` centers the opening on the wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningParams {
    pub host: EntityId,
    pub kind: OpeningKind,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub offset: Option<f64>,
}

impl OpeningParams {
    #[must_use]
    pub fn door(host: EntityId) -> Self {
        Self {
            host,
            kind: OpeningKind::Door,
            width: DEFAULT_DOOR_WIDTH,
            height: DEFAULT_OPENING_HEIGHT,
            offset: None,
        }
    }

    #[must_use]
    pub fn window(host: EntityId) -> Self {
        Self {
            host,
            kind: OpeningKind::Window,
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_OPENING_HEIGHT,
            offset: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// # Errors
    ///
    /// Returns a [`GeometryError`] if a dimension is not a positive finite
    /// number or the offset is not finite.
    pub fn validate(&self) -> Result<(), GeometryError> {
        validate_dimensions(self.width, self.height, self.offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningUpdate {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
}

/// A door or window riding on a host wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningEntity {
    id: EntityId,
    host: EntityId,
    kind: OpeningKind,
    width: f64,
    height: f64,
    offset: Option<f64>,
}

impl OpeningEntity {
    pub(crate) fn from_params(id: EntityId, params: OpeningParams) -> Self {
        Self {
            id,
            host: params.host,
            kind: params.kind,
            width: params.width,
            height: params.height,
            offset: params.offset,
        }
    }

    /// Returns the store id of the opening.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the id of the hosting wall.
    #[must_use]
    pub fn host(&self) -> EntityId {
        self.host
    }

    /// Returns whether this is a door or a window.
    #[must_use]
    pub fn kind(&self) -> OpeningKind {
        self.kind
    }

    /// Returns the opening width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the opening height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the offset along the host wall, if placed explicitly.
    #[must_use]
    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    pub(crate) fn apply_update(&mut self, update: &OpeningUpdate) -> Result<(), GeometryError> {
        let width = update.width.unwrap_or(self.width);
        let height = update.height.unwrap_or(self.height);
        let offset = update.offset.or(self.offset);
        validate_dimensions(width, height, offset)?;
        self.width = width;
        self.height = height;
        self.offset = offset;
        Ok(())
    }
}

fn validate_dimensions(width: f64, height: f64, offset: Option<f64>) -> Result<(), GeometryError> {
    check_positive("width", width)?;
    check_positive("height", height)?;
    if offset.is_some_and(|o| !o.is_finite()) {
        return Err(GeometryError::NonFinite { field: "offset" });
    }
    Ok(())
}
