use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OperationError, Result};
use crate::geometry::{Endpoint, WallEntity};
use crate::math::plan_2d::{length, midpoint};
use crate::math::Point2;
use crate::store::EntityId;

/// Endpoint pairings in canonical output order.
const PAIRINGS: [(Endpoint, Endpoint); 4] = [
    (Endpoint::Start, Endpoint::Start),
    (Endpoint::Start, Endpoint::End),
    (Endpoint::End, Endpoint::Start),
    (Endpoint::End, Endpoint::End),
];

/// Smallest grid cell used by the spatial hash, so a zero tolerance does not
/// blow up cell coordinates.
const MIN_CELL_SIZE: f64 = 1e-6;

/// Two wall endpoints lying within tolerance of each other.
///
/// Recomputed on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub wall_a: EntityId,
    pub endpoint_a: Endpoint,
    pub wall_b: EntityId,
    pub endpoint_b: Endpoint,
    pub distance: f64,
    /// Midpoint of the two endpoints.
    pub position: Point2,
}

impl Intersection {
    /// Returns `true` if this intersection uses the given wall endpoint.
    #[must_use]
    pub fn involves(&self, wall: EntityId, endpoint: Endpoint) -> bool {
        (self.wall_a == wall && self.endpoint_a == endpoint)
            || (self.wall_b == wall && self.endpoint_b == endpoint)
    }
}

/// Finds wall endpoints that meet within a distance tolerance.
///
/// Every unordered pair of walls is checked on all four endpoint pairings,
/// so a wall's start and end can each join a different partner. Output is
/// ordered by input pair `(i, j)` with `i < j`, then by pairing
/// (start–start, start–end, end–start, end–end), whichever scan is used.
#[derive(Debug, Clone, Copy)]
pub struct DetectIntersections {
    tolerance: f64,
    spatial_hash: bool,
}

impl DetectIntersections {
    /// Creates a new detector using the pairwise scan.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            spatial_hash: false,
        }
    }

    /// Selects the uniform-grid scan instead of the pairwise one.
    #[must_use]
    pub fn with_spatial_hash(mut self, enabled: bool) -> Self {
        self.spatial_hash = enabled;
        self
    }

    /// Runs the scan. Walls with malformed endpoints are skipped.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if the tolerance is negative or
    /// not finite.
    pub fn execute(&self, walls: &[&WallEntity]) -> Result<Vec<Intersection>> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            ))
            .into());
        }

        let walls: Vec<&WallEntity> = walls
            .iter()
            .copied()
            .filter(|w| {
                let ok = w.is_well_formed();
                if !ok {
                    debug!(wall = ?w.id(), "skipping malformed wall in intersection scan");
                }
                ok
            })
            .collect();

        let hits = if self.spatial_hash {
            self.scan_grid(&walls)
        } else {
            self.scan_pairwise(&walls)
        };

        Ok(hits
            .into_iter()
            .map(|hit| {
                let (ea, eb) = PAIRINGS[hit.pairing];
                let pa = walls[hit.i].endpoint(ea);
                let pb = walls[hit.j].endpoint(eb);
                Intersection {
                    wall_a: walls[hit.i].id(),
                    endpoint_a: ea,
                    wall_b: walls[hit.j].id(),
                    endpoint_b: eb,
                    distance: hit.distance,
                    position: midpoint(&pa, &pb),
                }
            })
            .collect())
    }

    fn scan_pairwise(&self, walls: &[&WallEntity]) -> Vec<Hit> {
        let mut hits = Vec::new();
        for i in 0..walls.len() {
            for j in (i + 1)..walls.len() {
                for (pairing, &(ea, eb)) in PAIRINGS.iter().enumerate() {
                    let distance = length(&walls[i].endpoint(ea), &walls[j].endpoint(eb));
                    if distance <= self.tolerance {
                        hits.push(Hit {
                            i,
                            j,
                            pairing,
                            distance,
                        });
                    }
                }
            }
        }
        hits
    }

    /// Buckets endpoints into cells no smaller than the tolerance, so any
    /// matching pair lies in the same or an adjacent cell.
    fn scan_grid(&self, walls: &[&WallEntity]) -> Vec<Hit> {
        let cell_size = self.tolerance.max(MIN_CELL_SIZE);
        let mut grid: HashMap<(i64, i64), Vec<(usize, Endpoint)>> = HashMap::new();
        for (i, wall) in walls.iter().enumerate() {
            for endpoint in [Endpoint::Start, Endpoint::End] {
                let cell = grid_cell(&wall.endpoint(endpoint), cell_size);
                grid.entry(cell).or_default().push((i, endpoint));
            }
        }

        let mut hits = Vec::new();
        for (i, wall) in walls.iter().enumerate() {
            for ea in [Endpoint::Start, Endpoint::End] {
                let pa = wall.endpoint(ea);
                let (cx, cy) = grid_cell(&pa, cell_size);
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        let cell = (cx.saturating_add(dx), cy.saturating_add(dy));
                        let Some(bucket) = grid.get(&cell) else {
                            continue;
                        };
                        for &(j, eb) in bucket {
                            if j <= i {
                                continue;
                            }
                            let distance = length(&pa, &walls[j].endpoint(eb));
                            if distance <= self.tolerance {
                                hits.push(Hit {
                                    i,
                                    j,
                                    pairing: pairing_index(ea, eb),
                                    distance,
                                });
                            }
                        }
                    }
                }
            }
        }
        hits.sort_by_key(|h| (h.i, h.j, h.pairing));
        hits
    }
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    i: usize,
    j: usize,
    pairing: usize,
    distance: f64,
}

fn pairing_index(a: Endpoint, b: Endpoint) -> usize {
    match (a, b) {
        (Endpoint::Start, Endpoint::Start) => 0,
        (Endpoint::Start, Endpoint::End) => 1,
        (Endpoint::End, Endpoint::Start) => 2,
        (Endpoint::End, Endpoint::End) => 3,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn grid_cell(p: &Point2, cell_size: f64) -> (i64, i64) {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
    )
}
