//! Contract between the object store and the rendering backend.
//!
//! The store pushes one [`WallPlacement`] per affected wall after every
//! joinery pass. A bridge only ever sees placements, never the wall entities
//! themselves, so it cannot alter authored or adjusted geometry.

mod placement;

use std::collections::HashMap;

pub use placement::{Extrusion3D, PlanFootprint, WallPlacement};

use crate::store::EntityId;

/// Receives effective wall geometry from the store.
pub trait SceneSync {
    /// Called once per affected wall after a pipeline run.
    fn sync_wall(&mut self, id: EntityId, placement: &WallPlacement);

    /// Called once for each wall removed from the store.
    fn remove_wall(&mut self, _id: EntityId) {}
}

/// Bridge that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl SceneSync for NoopSync {
    fn sync_wall(&mut self, _id: EntityId, _placement: &WallPlacement) {}
}

/// In-memory copy of both scene representations.
///
/// Useful as a headless backend and for checking what a renderer would
/// receive.
#[derive(Debug, Clone, Default)]
pub struct SceneMirror {
    solids: HashMap<EntityId, Extrusion3D>,
    plans: HashMap<EntityId, PlanFootprint>,
    sync_calls: usize,
    remove_calls: usize,
}

impl SceneMirror {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last 3D extrusion pushed for `id`.
    #[must_use]
    pub fn solid(&self, id: EntityId) -> Option<&Extrusion3D> {
        self.solids.get(&id)
    }

    /// Returns the last plan footprint pushed for `id`.
    #[must_use]
    pub fn plan(&self, id: EntityId) -> Option<&PlanFootprint> {
        self.plans.get(&id)
    }

    /// Returns the number of walls currently mirrored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.solids.len()
    }

    /// Returns `true` if no wall is mirrored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Total number of `sync_wall` calls received.
    #[must_use]
    pub fn sync_calls(&self) -> usize {
        self.sync_calls
    }

    /// Total number of `remove_wall` calls received.
    #[must_use]
    pub fn remove_calls(&self) -> usize {
        self.remove_calls
    }
}

impl SceneSync for SceneMirror {
    fn sync_wall(&mut self, id: EntityId, placement: &WallPlacement) {
        self.solids.insert(id, placement.extrusion());
        self.plans.insert(id, placement.plan());
        self.sync_calls += 1;
    }

    fn remove_wall(&mut self, id: EntityId) {
        self.solids.remove(&id);
        self.plans.remove(&id);
        self.remove_calls += 1;
    }
}
