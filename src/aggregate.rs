//! Per-cell flock averages.
//!
//! After every tick the system averages the position and velocity of the
//! agents sharing each grid cell. Alignment and cohesion read these averages
//! instead of scanning neighbors, and presentation layers can read them for
//! markers.
//!
//! An empty or unknown cell reports `Vec3::ZERO` for both averages. The same
//! value is a legitimate average too; consumers treat zero as "no data".

use crate::grid::GridCoordinate;
use crate::spatial::SpatialIndex;
use glam::Vec3;
use slotmap::Key;
use std::collections::HashMap;

/// What the averaging needs to know about one member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemberMotion {
    /// Current position.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Desired steering speed of this member.
    pub max_steering_speed: f32,
}

/// Averages for one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellAverage {
    /// Mean member position.
    pub position: Vec3,
    /// Mean heading scaled to the fastest member's steering speed.
    pub velocity: Vec3,
    /// Members counted.
    pub count: usize,
}

/// Global summary over every populated cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlockMarker {
    /// Mean of the per-cell average positions.
    pub position: Vec3,
    /// Mean of the per-cell average velocities.
    pub velocity: Vec3,
}

/// Cache of [`CellAverage`]s keyed by grid cell.
#[derive(Clone, Debug, Default)]
pub struct CellAggregates {
    cells: HashMap<GridCoordinate, CellAverage>,
    marker: Option<FlockMarker>,
    dirty: bool,
}

impl CellAggregates {
    /// Empty cache, not yet dirty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every cell from the index.
    ///
    /// `motion` resolves a member key to its current state; keys it cannot
    /// resolve are skipped.
    pub fn refresh<K, F>(&mut self, index: &SpatialIndex<K>, mut motion: F)
    where
        K: Key,
        F: FnMut(K) -> Option<MemberMotion>,
    {
        self.cells.clear();

        let mut marker_position = Vec3::ZERO;
        let mut marker_velocity = Vec3::ZERO;

        for (coord, bucket) in index.cells() {
            let mut position_sum = Vec3::ZERO;
            let mut velocity_sum = Vec3::ZERO;
            let mut steering_speed = 0.0f32;
            let mut count = 0usize;

            for key in bucket.instances() {
                let Some(m) = motion(key) else { continue };
                position_sum += m.position;
                velocity_sum += m.velocity;
                steering_speed = steering_speed.max(m.max_steering_speed);
                count += 1;
            }
            if count == 0 {
                continue;
            }

            let average = CellAverage {
                position: position_sum / count as f32,
                velocity: (velocity_sum / count as f32).normalize_or_zero() * steering_speed,
                count,
            };
            marker_position += average.position;
            marker_velocity += average.velocity;
            self.cells.insert(*coord, average);
        }

        self.marker = if self.cells.is_empty() {
            None
        } else {
            let n = self.cells.len() as f32;
            Some(FlockMarker {
                position: marker_position / n,
                velocity: marker_velocity / n,
            })
        };
        self.dirty = false;
    }

    /// Flag the cache as stale after membership changed outside a tick.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether membership changed since the last refresh.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Averages for `coord`, if any agent was there at the last refresh.
    pub fn cell(&self, coord: &GridCoordinate) -> Option<&CellAverage> {
        self.cells.get(coord)
    }

    /// Average velocity for `coord`; zero when the cell is empty.
    pub fn average_velocity(&self, coord: &GridCoordinate) -> Vec3 {
        self.cells.get(coord).map_or(Vec3::ZERO, |c| c.velocity)
    }

    /// Average position for `coord`; zero when the cell is empty.
    pub fn average_position(&self, coord: &GridCoordinate) -> Vec3 {
        self.cells.get(coord).map_or(Vec3::ZERO, |c| c.position)
    }

    /// Summary over populated cells, `None` when every cell is empty.
    #[inline]
    pub fn marker(&self) -> Option<FlockMarker> {
        self.marker
    }

    /// Populated cells and their averages.
    pub fn iter(&self) -> impl Iterator<Item = (&GridCoordinate, &CellAverage)> + '_ {
        self.cells.iter()
    }

    /// Number of populated cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell has been averaged.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
