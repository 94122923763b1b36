use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::{JoineryError, Result};
use crate::geometry::{
    OpeningEntity, OpeningParams, OpeningUpdate, WallEntity, WallParams, WallUpdate,
};

slotmap::new_key_type! {
    /// Unique identifier for an entity in the store.
    pub struct EntityId;
}

/// Field-less tag for the entity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Wall,
    Opening,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wall => f.write_str("wall"),
            Self::Opening => f.write_str("opening"),
        }
    }
}

/// Any entity owned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Wall(WallEntity),
    Opening(OpeningEntity),
}

impl Entity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Wall(_) => EntityKind::Wall,
            Self::Opening(_) => EntityKind::Opening,
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        match self {
            Self::Wall(w) => w.id(),
            Self::Opening(o) => o.id(),
        }
    }

    #[must_use]
    pub fn as_wall(&self) -> Option<&WallEntity> {
        match self {
            Self::Wall(w) => Some(w),
            Self::Opening(_) => None,
        }
    }

    #[must_use]
    pub fn as_opening(&self) -> Option<&OpeningEntity> {
        match self {
            Self::Opening(o) => Some(o),
            Self::Wall(_) => None,
        }
    }
}

/// Creation parameters, one variant per entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityParams {
    Wall(WallParams),
    Opening(OpeningParams),
}

impl EntityParams {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Wall(_) => EntityKind::Wall,
            Self::Opening(_) => EntityKind::Opening,
        }
    }
}

/// Partial update, one variant per entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityUpdate {
    Wall(WallUpdate),
    Opening(OpeningUpdate),
}

impl EntityUpdate {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Wall(_) => EntityKind::Wall,
            Self::Opening(_) => EntityKind::Opening,
        }
    }
}

/// Central arena that owns all entities.
///
/// Entities reference each other via [`EntityId`] (generational indices), so
/// a stale handle to a deleted entity is reported as not found rather than
/// aliasing a newer one.
#[derive(Debug, Default)]
pub struct EntityArena {
    entities: SlotMap<EntityId, Entity>,
}

impl EntityArena {
    /// Creates a new, empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    // --- Wall operations ---

    /// Validates `params` and inserts a new wall.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::InvalidGeometry`] if validation fails.
    pub fn add_wall(&mut self, params: WallParams) -> Result<EntityId> {
        params.validate()?;
        Ok(self
            .entities
            .insert_with_key(|id| Entity::Wall(WallEntity::from_params(id, params))))
    }

    /// Returns a reference to the wall, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] for an unknown id and
    /// [`JoineryError::WrongKind`] if the entity is not a wall.
    pub fn wall(&self, id: EntityId) -> Result<&WallEntity> {
        match self.entity(id)? {
            Entity::Wall(w) => Ok(w),
            Entity::Opening(_) => Err(wrong_kind(id, EntityKind::Wall, EntityKind::Opening)),
        }
    }

    /// Returns a mutable reference to the wall, or an error if not found.
    ///
    /// # Errors
    ///
    /// Same as [`EntityArena::wall`].
    pub fn wall_mut(&mut self, id: EntityId) -> Result<&mut WallEntity> {
        match self.entity_mut(id)? {
            Entity::Wall(w) => Ok(w),
            Entity::Opening(_) => Err(wrong_kind(id, EntityKind::Wall, EntityKind::Opening)),
        }
    }

    /// Iterates all walls in slot order.
    pub fn walls(&self) -> impl Iterator<Item = &WallEntity> {
        self.entities.values().filter_map(Entity::as_wall)
    }

    pub fn walls_mut(&mut self) -> impl Iterator<Item = &mut WallEntity> {
        self.entities.values_mut().filter_map(|e| match e {
            Entity::Wall(w) => Some(w),
            Entity::Opening(_) => None,
        })
    }

    // --- Opening operations ---

    /// Validates `params` and inserts a new opening on an existing wall.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`]/[`JoineryError::WrongKind`] if the
    /// host is not a wall, or [`JoineryError::InvalidGeometry`] for bad
    /// dimensions.
    pub fn add_opening(&mut self, params: OpeningParams) -> Result<EntityId> {
        self.wall(params.host)?;
        params.validate()?;
        Ok(self
            .entities
            .insert_with_key(|id| Entity::Opening(OpeningEntity::from_params(id, params))))
    }

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] for an unknown id and
    /// [`JoineryError::WrongKind`] if the entity is not an opening.
    pub fn opening(&self, id: EntityId) -> Result<&OpeningEntity> {
        match self.entity(id)? {
            Entity::Opening(o) => Ok(o),
            Entity::Wall(_) => Err(wrong_kind(id, EntityKind::Opening, EntityKind::Wall)),
        }
    }

    /// # Errors
    ///
    /// Same as [`EntityArena::opening`].
    pub fn opening_mut(&mut self, id: EntityId) -> Result<&mut OpeningEntity> {
        match self.entity_mut(id)? {
            Entity::Opening(o) => Ok(o),
            Entity::Wall(_) => Err(wrong_kind(id, EntityKind::Opening, EntityKind::Wall)),
        }
    }

    /// Ids of all openings hosted by `wall`.
    #[must_use]
    pub fn openings_on(&self, wall: EntityId) -> Vec<EntityId> {
        self.entities
            .values()
            .filter_map(Entity::as_opening)
            .filter(|o| o.host() == wall)
            .map(OpeningEntity::id)
            .collect()
    }

    // --- Generic operations ---

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] if the entity is not in the arena.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id).ok_or(JoineryError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] if the entity is not in the arena.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(id).ok_or(JoineryError::NotFound(id))
    }

    /// Removes an entity and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] if the entity is not in the arena.
    pub fn remove(&mut self, id: EntityId) -> Result<Entity> {
        self.entities.remove(id).ok_or(JoineryError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

fn wrong_kind(id: EntityId, expected: EntityKind, actual: EntityKind) -> JoineryError {
    JoineryError::WrongKind {
        id,
        expected,
        actual,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

    fn params() -> WallParams {
        WallParams::new(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), 0.2, 3.0)
    }

    #[test]
    fn add_and_fetch_wall() {
        let mut arena = EntityArena::new();
        let id = arena.add_wall(params()).unwrap();
        assert_eq!(arena.wall(id).unwrap().id(), id);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn invalid_wall_is_not_inserted() {
        let mut arena = EntityArena::new();
        let mut p = params();
        p.thickness = 0.0;
        assert!(matches!(
            arena.add_wall(p),
            Err(JoineryError::InvalidGeometry(_))
        ));
        assert!(arena.is_empty());
    }

    #[test]
    fn stale_id_is_not_found() {
        let mut arena = EntityArena::new();
        let id = arena.add_wall(params()).unwrap();
        arena.remove(id).unwrap();
        let _reused = arena.add_wall(params()).unwrap();
        assert!(matches!(arena.wall(id), Err(JoineryError::NotFound(_))));
    }

    #[test]
    fn opening_requires_wall_host() {
        let mut arena = EntityArena::new();
        let wall = arena.add_wall(params()).unwrap();
        let door = arena.add_opening(OpeningParams::door(wall)).unwrap();
        assert!(matches!(
            arena.add_opening(OpeningParams::window(door)),
            Err(JoineryError::WrongKind {
                expected: EntityKind::Wall,
                actual: EntityKind::Opening,
                ..
            })
        ));
        assert_eq!(arena.openings_on(wall), vec![door]);
        assert!(matches!(arena.wall(door), Err(JoineryError::WrongKind { .. })));
    }
}
