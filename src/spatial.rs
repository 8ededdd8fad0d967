//! Uniform-grid spatial index with ring-expanding queries.
//!
//! Members are bucketed by the [`GridCoordinate`] of their last reported
//! position. Queries start in the origin's own cell and walk outward one ring
//! at a time, stopping as soon as the current ring produced an answer.
//!
//! The index is generic over any `slotmap` key, so the same structure backs
//! agent populations and obstacle fields.
//!
//! # Example
//!
//! ```ignore
//! let mut index = SpatialIndex::<AgentHandle>::new(GridSpec::new(Vec3::ZERO, 5.0, 9));
//! let coord = index.coordinate_of(position);
//! index.register(coord, handle, position, collider);
//!
//! // after the agent moved
//! if let Some(new_coord) = index.rebucket(handle, new_position) {
//!     agent.grid_coordinate = new_coord;
//! }
//!
//! let probe = index.probe(handle).unwrap();
//! let close = index.find_within_radius(&probe, 4.0);
//! ```

use crate::bounds::BoundingVolume;
use crate::grid::GridCoordinate;
use glam::Vec3;
use slotmap::{Key, SecondaryMap};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Sizing of the grid an index buckets into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// World-space center of the bounding volume; local positions are relative to it.
    pub center: Vec3,
    /// World units per cell.
    pub cell_size: f32,
    /// Grid resolution in cells.
    pub resolution: u32,
}

impl GridSpec {
    /// Grid centered at `center`.
    pub const fn new(center: Vec3, cell_size: f32, resolution: u32) -> Self {
        Self {
            center,
            cell_size,
            resolution,
        }
    }

    /// Grid covering `bounds`, with `cell_size = max(size.x, size.z) / resolution`.
    pub fn for_bounds(bounds: &BoundingVolume, resolution: u32) -> Self {
        let cell_size = bounds.size.x.max(bounds.size.z) / resolution.max(1) as f32;
        Self::new(bounds.center, cell_size, resolution)
    }

    /// Cell containing world position `world`.
    #[inline]
    pub fn coordinate_of(&self, world: Vec3) -> GridCoordinate {
        GridCoordinate::from_position(world - self.center, self.cell_size, self.resolution)
    }
}

/// Starting point of a query.
#[derive(Clone, Copy, Debug)]
pub struct Probe<K> {
    /// World position distances are measured from.
    pub position: Vec3,
    /// Cell the ring walk starts from.
    pub coordinate: GridCoordinate,
    /// Member to leave out of the results (the querying agent itself).
    pub exclude: Option<K>,
}

/// Members currently bucketed in one cell, with their colliders alongside.
#[derive(Clone, Debug)]
pub struct Bucket<K: Key> {
    instances: BTreeSet<K>,
    colliders: BTreeMap<K, BoundingVolume>,
}

impl<K: Key> Default for Bucket<K> {
    fn default() -> Self {
        Self {
            instances: BTreeSet::new(),
            colliders: BTreeMap::new(),
        }
    }
}

impl<K: Key> Bucket<K> {
    /// Members in this cell, in key order.
    pub fn instances(&self) -> impl Iterator<Item = K> + '_ {
        self.instances.iter().copied()
    }

    /// Collision volumes of the members in this cell.
    pub fn colliders(&self) -> impl Iterator<Item = (K, &BoundingVolume)> + '_ {
        self.colliders.iter().map(|(k, v)| (*k, v))
    }

    /// Whether `key` is in this cell.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.instances.contains(&key)
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the cell is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
struct Member {
    coordinate: GridCoordinate,
    position: Vec3,
}

/// Mapping from grid cell to the members inside it.
///
/// Emptied buckets are kept, so a cell that once held members keeps
/// reporting (empty) data until the index is cleared.
#[derive(Clone, Debug)]
pub struct SpatialIndex<K: Key> {
    spec: GridSpec,
    cells: HashMap<GridCoordinate, Bucket<K>>,
    members: SecondaryMap<K, Member>,
}

impl<K: Key> SpatialIndex<K> {
    /// Empty index over `spec`.
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            cells: HashMap::new(),
            members: SecondaryMap::new(),
        }
    }

    /// Grid sizing.
    #[inline]
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Cell a world position falls into under this index's grid.
    #[inline]
    pub fn coordinate_of(&self, world: Vec3) -> GridCoordinate {
        self.spec.coordinate_of(world)
    }

    /// Number of registered members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `key` is registered.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.members.contains_key(key)
    }

    /// Bucket key `key` is stored under.
    pub fn coordinate(&self, key: K) -> Option<GridCoordinate> {
        self.members.get(key).map(|m| m.coordinate)
    }

    /// Last position reported for `key`.
    pub fn position(&self, key: K) -> Option<Vec3> {
        self.members.get(key).map(|m| m.position)
    }

    /// Bucket for `coord`, if one was ever created.
    pub fn bucket(&self, coord: &GridCoordinate) -> Option<&Bucket<K>> {
        self.cells.get(coord)
    }

    /// Every bucket, including emptied ones. Order is unspecified.
    pub fn cells(&self) -> impl Iterator<Item = (&GridCoordinate, &Bucket<K>)> + '_ {
        self.cells.iter()
    }

    /// Drop every member and bucket.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.members.clear();
    }

    /// Insert `key` into the bucket for `coord`, creating it if needed.
    ///
    /// Returns `coord` so the caller can store it on the member. Registering a
    /// key twice moves it rather than duplicating it.
    pub fn register(
        &mut self,
        coord: GridCoordinate,
        key: K,
        position: Vec3,
        collider: BoundingVolume,
    ) -> GridCoordinate {
        if self.members.contains_key(key) {
            self.remove(key);
        }

        let bucket = self.cells.entry(coord).or_default();
        bucket.instances.insert(key);
        bucket.colliders.insert(key, collider.with_center(position));

        self.members.insert(
            key,
            Member {
                coordinate: coord,
                position,
            },
        );
        coord
    }

    /// Take `key` out of its bucket. Absent keys are ignored.
    pub fn remove(&mut self, key: K) -> Option<GridCoordinate> {
        let member = self.members.remove(key)?;
        if let Some(bucket) = self.cells.get_mut(&member.coordinate) {
            bucket.instances.remove(&key);
            bucket.colliders.remove(&key);
        }
        Some(member.coordinate)
    }

    /// Record a new position for `key` and move it if its cell changed.
    ///
    /// Returns the new coordinate when the member changed cells, `None` when it
    /// stayed put or is not registered.
    pub fn rebucket(&mut self, key: K, position: Vec3) -> Option<GridCoordinate> {
        let old = self.members.get(key)?.coordinate;
        let new = self.spec.coordinate_of(position);

        if new == old {
            if let Some(member) = self.members.get_mut(key) {
                member.position = position;
            }
            if let Some(collider) = self
                .cells
                .get_mut(&old)
                .and_then(|b| b.colliders.get_mut(&key))
            {
                collider.center = position;
            }
            return None;
        }

        let collider = self
            .cells
            .get(&old)
            .and_then(|b| b.colliders.get(&key))
            .copied()
            .unwrap_or_default();
        self.remove(key);
        self.register(new, key, position, collider);
        tracing::trace!(%old, %new, "rebucketed member");
        Some(new)
    }

    /// Query origin for a registered member, excluding the member itself.
    pub fn probe(&self, key: K) -> Option<Probe<K>> {
        self.members.get(key).map(|m| Probe {
            position: m.position,
            coordinate: m.coordinate,
            exclude: Some(key),
        })
    }

    /// Query origin at an arbitrary world position.
    pub fn probe_at(&self, position: Vec3) -> Probe<K> {
        Probe {
            position,
            coordinate: self.spec.coordinate_of(position),
            exclude: None,
        }
    }

    /// Members in the cells of ring `level` around the probe (that ring only).
    pub fn find_in_ring(&self, probe: &Probe<K>, level: u32) -> Vec<K> {
        let mut out = Vec::new();
        self.visit_ring(probe, level, |key, _| out.push(key));
        out
    }

    /// Members within `radius_squared` (XZ distance) of the probe.
    ///
    /// The walk stops after the first ring that either produced a hit or held
    /// any member outside the radius. Members in farther rings can be missed
    /// when the population is uneven; this keeps the common case to one or
    /// two rings.
    pub fn find_within_radius(&self, probe: &Probe<K>, radius_squared: f32) -> Vec<K> {
        let mut targets = Vec::new();
        if self.is_empty() {
            return targets;
        }

        for level in 0..=probe.coordinate.max_tracing_level() {
            let mut surpassed = false;
            self.visit_ring(probe, level, |key, position| {
                if xz_distance_squared(position, probe.position) < radius_squared {
                    targets.push(key);
                } else {
                    surpassed = true;
                }
            });
            if !targets.is_empty() || surpassed {
                break;
            }
        }
        targets
    }

    /// Closest member (XZ distance) nearer than `min_distance_squared`.
    ///
    /// Walks rings `0..=max_level`, never past the probe cell's maximum tracing
    /// level (also the default), and stops after the first ring that produced
    /// a candidate. Ties go to the first member visited.
    pub fn find_nearest(
        &self,
        probe: &Probe<K>,
        min_distance_squared: f32,
        max_level: Option<u32>,
    ) -> Option<K> {
        if self.is_empty() {
            return None;
        }

        // nothing past the last ring can be inside the grid
        let limit = probe.coordinate.max_tracing_level();
        let max_level = max_level.map_or(limit, |level| level.min(limit));
        let mut best = None;
        let mut best_distance = min_distance_squared;

        for level in 0..=max_level {
            self.visit_ring(probe, level, |key, position| {
                let d = xz_distance_squared(position, probe.position);
                if d < best_distance {
                    best_distance = d;
                    best = Some(key);
                }
            });
            if best.is_some() {
                break;
            }
        }
        best
    }

    /// Members within rings `0..=max_level` whose collider strictly overlaps `volume`.
    pub fn find_overlapping(
        &self,
        probe: &Probe<K>,
        volume: &BoundingVolume,
        max_level: u32,
    ) -> Vec<K> {
        let mut hits = Vec::new();
        for level in 0..=max_level {
            let Some(ring) = probe.coordinate.ring(level) else {
                break;
            };
            for coord in ring {
                let Some(bucket) = self.cells.get(&coord) else {
                    continue;
                };
                for (key, collider) in bucket.colliders() {
                    if Some(key) != probe.exclude && collider.overlaps(volume) {
                        hits.push(key);
                    }
                }
            }
        }
        hits
    }

    fn visit_ring(&self, probe: &Probe<K>, level: u32, mut visit: impl FnMut(K, Vec3)) {
        let Some(ring) = probe.coordinate.ring(level) else {
            return;
        };
        for coord in ring {
            let Some(bucket) = self.cells.get(&coord) else {
                continue;
            };
            for key in bucket.instances() {
                if Some(key) == probe.exclude {
                    continue;
                }
                if let Some(member) = self.members.get(key) {
                    visit(key, member.position);
                }
            }
        }
    }
}

/// Squared distance between two points, ignoring Y.
#[inline]
pub fn xz_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}
