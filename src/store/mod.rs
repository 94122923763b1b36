//! Object store: entity CRUD plus the detect → resolve → sync → notify
//! pipeline that runs after every wall mutation.

mod arena;
mod notifier;

use std::collections::HashMap;

use tracing::debug;

pub use arena::{Entity, EntityArena, EntityId, EntityKind, EntityParams, EntityUpdate};
pub use notifier::{ChangeEvent, ChangeNotifier, ChangeReason, ListenerId};

use crate::config::JoineryConfig;
use crate::error::{DegenerateJoinery, JoineryError, OperationError, Result};
use crate::geometry::{WallEntity, WallParams, WallUpdate};
use crate::operations::{DetectIntersections, Intersection, ResolveJoinery};
use crate::sync::{NoopSync, SceneSync, WallPlacement};

#[derive(Debug, Default)]
struct BatchState {
    depth: usize,
    /// Something changed inside the batch.
    dirty: bool,
    /// A wall changed inside the batch, so joinery must run at the end.
    walls_dirty: bool,
}

/// Sole owner of all entities.
///
/// Every call runs to completion before returning: after `create_wall`,
/// `update_wall_geometry` or `delete_wall`, `get_wall` observes fully
/// resolved joinery. Inside a batch ([`ObjectStore::begin_batch`]) only
/// authored geometry is updated until the outermost batch ends.
#[derive(Debug)]
pub struct ObjectStore<S = NoopSync> {
    arena: EntityArena,
    config: JoineryConfig,
    notifier: ChangeNotifier,
    sync: S,
    /// Last placement pushed to the scene bridge, per wall.
    placements: HashMap<EntityId, WallPlacement>,
    /// Deleted walls the bridge has not been told about yet.
    pending_removals: Vec<EntityId>,
    warnings: Vec<DegenerateJoinery>,
    batch: BatchState,
}

impl ObjectStore<NoopSync> {
    /// Creates an empty store with the default configuration and no scene
    /// bridge.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(JoineryConfig::default(), NoopSync)
    }

    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the configuration is invalid.
    pub fn with_config(config: JoineryConfig) -> Result<Self> {
        Self::with_sync(config, NoopSync)
    }
}

impl Default for ObjectStore<NoopSync> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SceneSync> ObjectStore<S> {
    /// Creates an empty store that pushes placements to `sync`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the configuration is invalid.
    pub fn with_sync(config: JoineryConfig, sync: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, sync))
    }

    fn from_parts(config: JoineryConfig, sync: S) -> Self {
        Self {
            arena: EntityArena::new(),
            config,
            notifier: ChangeNotifier::new(),
            sync,
            placements: HashMap::new(),
            pending_removals: Vec::new(),
            warnings: Vec::new(),
            batch: BatchState::default(),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &JoineryConfig {
        &self.config
    }

    /// The scene bridge, read-only.
    #[must_use]
    pub fn sync(&self) -> &S {
        &self.sync
    }

    /// Consumes the store and returns its scene bridge.
    #[must_use]
    pub fn into_sync(self) -> S {
        self.sync
    }

    /// Returns the number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the store holds no entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    // --- Generic CRUD ---

    /// Creates an entity and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::InvalidGeometry`] for invalid parameters, or
    /// [`JoineryError::NotFound`]/[`JoineryError::WrongKind`] for an opening
    /// whose host is not a wall.
    pub fn create(&mut self, params: EntityParams) -> Result<EntityId> {
        let id = match params {
            EntityParams::Wall(p) => {
                let id = self.arena.add_wall(p)?;
                debug!(?id, "wall created");
                self.commit(ChangeReason::Created, true)?;
                id
            }
            EntityParams::Opening(p) => {
                let id = self.arena.add_opening(p)?;
                debug!(?id, "opening created");
                self.commit(ChangeReason::Created, false)?;
                id
            }
        };
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] if the entity does not exist.
    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.arena.entity(id)
    }

    /// Applies a partial update. On error the entity is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`], [`JoineryError::WrongKind`] if the
    /// update variant does not match the entity, or
    /// [`JoineryError::InvalidGeometry`] if the merged parameters are invalid.
    pub fn update(&mut self, id: EntityId, update: &EntityUpdate) -> Result<()> {
        let wall_affecting = match (self.arena.entity_mut(id)?, update) {
            (Entity::Wall(wall), EntityUpdate::Wall(u)) => {
                wall.apply_update(u)?;
                true
            }
            (Entity::Opening(opening), EntityUpdate::Opening(u)) => {
                opening.apply_update(u)?;
                false
            }
            (entity, update) => {
                return Err(JoineryError::WrongKind {
                    id,
                    expected: update.kind(),
                    actual: entity.kind(),
                });
            }
        };
        debug!(?id, "entity updated");
        self.commit(ChangeReason::Updated, wall_affecting)
    }

    /// Deletes an entity. Deleting a wall also deletes the openings it hosts.
    ///
    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] if the entity does not exist.
    pub fn delete(&mut self, id: EntityId) -> Result<()> {
        let removed = self.arena.remove(id)?;
        let wall_affecting = match removed {
            Entity::Wall(_) => {
                for opening in self.arena.openings_on(id) {
                    self.arena.remove(opening)?;
                }
                self.pending_removals.push(id);
                true
            }
            Entity::Opening(_) => false,
        };
        debug!(?id, "entity deleted");
        self.commit(ChangeReason::Deleted, wall_affecting)
    }

    /// All entities, optionally filtered by kind.
    #[must_use]
    pub fn all(&self, kind: Option<EntityKind>) -> Vec<&Entity> {
        self.arena
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind() == k))
            .collect()
    }

    // --- Wall API ---

    /// # Errors
    ///
    /// Returns [`JoineryError::InvalidGeometry`] for a zero-length wall or a
    /// non-positive thickness/height.
    pub fn create_wall(&mut self, params: WallParams) -> Result<EntityId> {
        self.create(EntityParams::Wall(params))
    }

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`], [`JoineryError::WrongKind`] or
    /// [`JoineryError::InvalidGeometry`].
    pub fn update_wall_geometry(&mut self, id: EntityId, update: &WallUpdate) -> Result<()> {
        self.arena.wall_mut(id)?.apply_update(update)?;
        debug!(?id, "wall geometry updated");
        self.commit(ChangeReason::Updated, true)
    }

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] or [`JoineryError::WrongKind`].
    pub fn delete_wall(&mut self, id: EntityId) -> Result<()> {
        self.arena.wall(id)?;
        self.delete(id)
    }

    /// # Errors
    ///
    /// Returns [`JoineryError::NotFound`] or [`JoineryError::WrongKind`].
    pub fn get_wall(&self, id: EntityId) -> Result<&WallEntity> {
        self.arena.wall(id)
    }

    /// Returns every wall, with resolved joinery outside batches.
    #[must_use]
    pub fn list_walls(&self) -> Vec<&WallEntity> {
        self.arena.walls().collect()
    }

    /// Read-only intersection scan over the current walls.
    ///
    /// `None` uses the configured tolerance.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a negative or non-finite
    /// tolerance.
    pub fn get_intersections(&self, tolerance: Option<f64>) -> Result<Vec<Intersection>> {
        let walls = self.list_walls();
        self.detector(tolerance.unwrap_or(self.config.tolerance), walls.len())
            .execute(&walls)
    }

    /// Clamping warnings from the most recent pipeline run.
    #[must_use]
    pub fn warnings(&self) -> &[DegenerateJoinery] {
        &self.warnings
    }

    // --- Notifications ---

    /// Registers a listener called once per logical mutation.
    pub fn on_change(&mut self, listener: impl FnMut(&ChangeEvent) + 'static) -> ListenerId {
        self.notifier.subscribe(listener)
    }

    /// Removes a change listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // --- Batching ---

    /// Starts a batch. Batches nest; only the outermost
    /// [`ObjectStore::end_batch`] runs the pipeline.
    pub fn begin_batch(&mut self) {
        self.batch.depth += 1;
    }

    /// Ends a batch. When the outermost batch ends, joinery, scene sync and a
    /// single [`ChangeReason::JoineryRecomputed`] notification run if
    /// anything changed.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NoBatch` if no batch is open.
    pub fn end_batch(&mut self) -> Result<()> {
        if self.batch.depth == 0 {
            return Err(OperationError::NoBatch.into());
        }
        self.batch.depth -= 1;
        if self.batch.depth > 0 {
            return Ok(());
        }
        let BatchState {
            dirty, walls_dirty, ..
        } = std::mem::take(&mut self.batch);
        if walls_dirty {
            self.run_pipeline()?;
        }
        if dirty {
            self.notify(ChangeReason::JoineryRecomputed);
        }
        Ok(())
    }

    /// Runs `f` inside a batch. The batch is closed even if `f` fails.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or from closing the batch.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.begin_batch();
        let out = f(self);
        self.end_batch()?;
        out
    }

    /// Returns `true` while a batch is open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch.depth > 0
    }

    /// Forces a full joinery pass and a [`ChangeReason::JoineryRecomputed`]
    /// notification. Inside a batch this is deferred to the batch end.
    ///
    /// # Errors
    ///
    /// Returns an error if intersection detection fails.
    pub fn recompute(&mut self) -> Result<()> {
        self.commit(ChangeReason::JoineryRecomputed, true)
    }

    // --- Pipeline ---

    fn commit(&mut self, reason: ChangeReason, wall_affecting: bool) -> Result<()> {
        if self.is_batching() {
            self.batch.dirty = true;
            self.batch.walls_dirty |= wall_affecting;
            return Ok(());
        }
        if wall_affecting {
            self.run_pipeline()?;
        }
        self.notify(reason);
        Ok(())
    }

    fn detector(&self, tolerance: f64, wall_count: usize) -> DetectIntersections {
        DetectIntersections::new(tolerance)
            .with_spatial_hash(wall_count > self.config.spatial_hash_threshold)
    }

    fn run_pipeline(&mut self) -> Result<()> {
        let intersections = self.get_intersections(None)?;
        let report = ResolveJoinery::new(self.config.style, self.config.min_length)
            .execute(&mut self.arena, &intersections);
        self.warnings = report.warnings;
        self.push_placements();
        Ok(())
    }

    /// Sends the bridge every wall whose placement changed since the last
    /// push, and every removal.
    fn push_placements(&mut self) {
        for id in self.pending_removals.drain(..) {
            if self.placements.remove(&id).is_some() {
                self.sync.remove_wall(id);
            }
        }
        let mut synced = 0_usize;
        for wall in self.arena.walls() {
            let placement = WallPlacement::from_wall(wall);
            if self.placements.get(&wall.id()) != Some(&placement) {
                self.sync.sync_wall(wall.id(), &placement);
                self.placements.insert(wall.id(), placement);
                synced += 1;
            }
        }
        debug!(synced, "scene sync complete");
    }

    fn notify(&mut self, reason: ChangeReason) {
        if self.notifier.is_empty() {
            return;
        }
        let event = ChangeEvent {
            reason,
            walls: self.arena.walls().cloned().collect(),
            warnings: self.warnings.clone(),
        };
        self.notifier.emit(&event);
    }
}
