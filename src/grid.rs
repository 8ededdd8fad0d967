//! Discrete grid coordinates and ring traversal.
//!
//! The simulation area is cut into square cells on the XZ plane. A cell is
//! identified by `ceil(local / cell_size)` on each axis, where `local` is the
//! position relative to the center of the bounding volume. Y never takes part
//! in grid math.
//!
//! Neighbor searches walk outward one *ring* at a time: ring `k` is every cell
//! at Chebyshev distance exactly `k` from the origin cell.
//!
//! ```text
//!        W W N N N          level 2 around `o`, labelled by the arm
//!        W . . . N          of the walk that emits each cell
//!        W . o . N
//!        S . . . E
//!        S S S E E
//! ```

use glam::Vec3;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Compass direction on the grid plane.
///
/// North is +Z and East is +X.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +Z
    North,
    /// +X
    East,
    /// -Z
    South,
    /// -X
    West,
}

impl Direction {
    /// Walk order used by ring traversal.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit cell offset `(dx, dz)`.
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// The direction a ring walk travels along this direction's far edge.
    ///
    /// Rotates clockwise when seen from above: N walks east, E walks south, and so on.
    #[inline]
    pub const fn orthogonal(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// World-space unit vector for this direction.
    #[inline]
    pub fn to_vector(self) -> Vec3 {
        let (dx, dz) = self.offset();
        Vec3::new(dx as f32, 0.0, dz as f32)
    }
}

/// Identifier of one grid cell.
///
/// Equality and hashing only look at `x` and `z`; the sizing fields travel
/// along so that a coordinate can compute its own neighbors.
#[derive(Clone, Copy, Debug)]
pub struct GridCoordinate {
    x: i32,
    z: i32,
    cell_size: f32,
    resolution: u32,
    max_tracing_level: u32,
}

impl GridCoordinate {
    /// Build a coordinate from raw cell indices.
    pub fn new(x: i32, z: i32, cell_size: f32, resolution: u32) -> Self {
        let r = resolution as i64;
        let (x64, z64) = (x as i64, z as i64);
        // north, east, south, west
        let reach = [r - z64, r - x64, r + z64, r + x64];
        let max_tracing_level = reach.into_iter().max().unwrap_or(0).clamp(0, u32::MAX as i64);

        Self {
            x,
            z,
            cell_size,
            resolution,
            max_tracing_level: max_tracing_level as u32,
        }
    }

    /// Cell containing `local`, a position relative to the grid center.
    ///
    /// Uses ceiling division, so a point exactly on a boundary belongs to the
    /// lower cell: with `cell_size = 2`, `x = 2.0` is cell 1 and `x = 2.01` is cell 2.
    pub fn from_position(local: Vec3, cell_size: f32, resolution: u32) -> Self {
        Self::new(
            cell_index(local.x, cell_size),
            cell_index(local.z, cell_size),
            cell_size,
            resolution,
        )
    }

    /// Cell index along X.
    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Cell index along Z.
    #[inline]
    pub fn z(&self) -> i32 {
        self.z
    }

    /// World units per cell.
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid resolution this coordinate was computed with.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Largest ring level that can still touch the grid from this cell.
    #[inline]
    pub fn max_tracing_level(&self) -> u32 {
        self.max_tracing_level
    }

    /// Neighbor `steps` cells away in `dir`.
    pub fn step(&self, dir: Direction, steps: i32) -> Self {
        let (dx, dz) = dir.offset();
        self.offset_by(dx * steps, dz * steps)
    }

    fn offset_by(&self, dx: i32, dz: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.z.saturating_add(dz),
            self.cell_size,
            self.resolution,
        )
    }

    /// Local-space center of this cell (relative to the grid center, y = 0).
    pub fn local_center(&self) -> Vec3 {
        Vec3::new(
            (self.x as f32 - 0.5) * self.cell_size,
            0.0,
            (self.z as f32 - 0.5) * self.cell_size,
        )
    }

    /// Cells at Chebyshev distance exactly `level`.
    ///
    /// Level 0 yields only `self`. Returns `None` past [`max_tracing_level`],
    /// since nothing out there can be inside the grid.
    ///
    /// [`max_tracing_level`]: GridCoordinate::max_tracing_level
    pub fn ring(&self, level: u32) -> Option<RingCells> {
        if level > self.max_tracing_level {
            return None;
        }
        Some(RingCells {
            origin: *self,
            level: level as i32,
            arm: 0,
            step: 0,
            remaining: ring_len(level),
        })
    }
}

/// Explicit conversion of a coordinate into an `(x, 0, z)` vector of cell indices.
#[inline]
pub fn coordinate_to_vector(coord: &GridCoordinate) -> Vec3 {
    Vec3::new(coord.x as f32, 0.0, coord.z as f32)
}

#[inline]
fn cell_index(local: f32, cell_size: f32) -> i32 {
    // `as` saturates, and maps NaN to 0
    (local / cell_size).ceil() as i32
}

#[inline]
fn ring_len(level: u32) -> usize {
    if level == 0 {
        1
    } else {
        8 * level as usize
    }
}

impl PartialEq for GridCoordinate {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.z == other.z
    }
}

impl Eq for GridCoordinate {}

impl Hash for GridCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.z.hash(state);
    }
}

impl PartialOrd for GridCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.x, self.z).cmp(&(other.x, other.z))
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Iterator over the cells of one ring, in a fixed order.
///
/// For each direction N, E, S, W the walk first covers `level + 1` cells of
/// that direction's far edge (moving along [`Direction::orthogonal`]), then
/// turns the corner and covers `level - 1` cells of the next edge back toward
/// the axis. The four arms tile the perimeter, so every cell is emitted once.
#[derive(Clone, Debug)]
pub struct RingCells {
    origin: GridCoordinate,
    level: i32,
    arm: usize,
    step: i32,
    remaining: usize,
}

impl Iterator for RingCells {
    type Item = GridCoordinate;

    fn next(&mut self) -> Option<GridCoordinate> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let level = self.level;
        if level == 0 {
            return Some(self.origin);
        }

        let dir = Direction::ALL[self.arm];
        let (ax, az) = dir.offset();
        let (ox, oz) = dir.orthogonal().offset();

        let s = self.step;
        let cell = if s <= level {
            // far edge, walking along the orthogonal
            self.origin.offset_by(ax * level + ox * s, az * level + oz * s)
        } else {
            // past the corner, walking back toward the axis
            let back = s - level;
            self.origin.offset_by(
                ax * (level - back) + ox * level,
                az * (level - back) + oz * level,
            )
        };

        self.step += 1;
        if self.step == 2 * level {
            self.step = 0;
            self.arm += 1;
        }

        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RingCells {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn coord(x: i32, z: i32) -> GridCoordinate {
        GridCoordinate::new(x, z, 1.0, 9)
    }

    fn hash_of(c: &GridCoordinate) -> u64 {
        let mut h = DefaultHasher::new();
        c.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_ceiling_assignment() {
        let a = GridCoordinate::from_position(Vec3::new(2.0, 0.0, 0.5), 2.0, 9);
        let b = GridCoordinate::from_position(Vec3::new(2.01, 0.0, 0.5), 2.0, 9);
        let c = GridCoordinate::from_position(Vec3::new(-0.5, 0.0, -2.0), 2.0, 9);
        assert_eq!((a.x(), a.z()), (1, 1));
        assert_eq!((b.x(), b.z()), (2, 1));
        assert_eq!((c.x(), c.z()), (0, -1));
    }

    #[test]
    fn test_from_position_is_stable() {
        let p = Vec3::new(3.7, 12.0, -8.2);
        let a = GridCoordinate::from_position(p, 1.5, 9);
        let b = GridCoordinate::from_position(p, 1.5, 9);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_y_is_ignored() {
        let a = GridCoordinate::from_position(Vec3::new(1.0, -100.0, 1.0), 1.0, 9);
        let b = GridCoordinate::from_position(Vec3::new(1.0, 250.0, 1.0), 1.0, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_ignores_sizing() {
        let a = GridCoordinate::new(2, 3, 1.0, 9);
        let b = GridCoordinate::new(2, 3, 4.0, 16);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, GridCoordinate::new(3, 2, 1.0, 9));
    }

    #[test]
    fn test_max_tracing_level() {
        assert_eq!(coord(0, 0).max_tracing_level(), 9);
        assert_eq!(coord(2, -3).max_tracing_level(), 12);
        assert_eq!(coord(-4, 1).max_tracing_level(), 13);
    }

    #[test]
    fn test_ring_zero_is_self() {
        let c = coord(4, -2);
        let ring: Vec<_> = c.ring(0).unwrap().collect();
        assert_eq!(ring, vec![c]);
    }

    #[test]
    fn test_ring_past_max_is_none() {
        let c = coord(0, 0);
        assert!(c.ring(c.max_tracing_level()).is_some());
        assert!(c.ring(c.max_tracing_level() + 1).is_none());
    }

    #[test]
    fn test_ring_one_order() {
        let ring: Vec<(i32, i32)> = coord(0, 0)
            .ring(1)
            .unwrap()
            .map(|c| (c.x(), c.z()))
            .collect();
        assert_eq!(
            ring,
            vec![
                (0, 1),
                (1, 1),
                (1, 0),
                (1, -1),
                (0, -1),
                (-1, -1),
                (-1, 0),
                (-1, 1),
            ]
        );
    }

    #[test]
    fn test_rings_are_exact_chebyshev_shells() {
        let origin = coord(1, -1);
        let mut seen = HashSet::new();
        for level in 0..=5u32 {
            let ring: Vec<_> = origin.ring(level).unwrap().collect();
            assert_eq!(ring.len(), ring_len(level));
            for c in ring {
                let d = (c.x() - origin.x()).abs().max((c.z() - origin.z()).abs());
                assert_eq!(d as u32, level);
                assert!(seen.insert(c), "duplicate cell {} at level {}", c, level);
            }
        }
        // full 11x11 square
        assert_eq!(seen.len(), 121);
    }

    #[test]
    fn test_ring_is_deterministic() {
        let a: Vec<_> = coord(3, 3).ring(3).unwrap().collect();
        let b: Vec<_> = coord(3, 3).ring(3).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_direction_vectors() {
        assert_eq!(Direction::North.to_vector(), Vec3::Z);
        assert_eq!(Direction::South.to_vector(), -Vec3::Z);
        assert_eq!(Direction::East.to_vector(), Vec3::X);
        assert_eq!(Direction::West.to_vector(), -Vec3::X);
        assert_eq!(coord(0, 0).step(Direction::West, 3), coord(-3, 0));
    }

    #[test]
    fn test_coordinate_to_vector() {
        assert_eq!(coordinate_to_vector(&coord(-2, 5)), Vec3::new(-2.0, 0.0, 5.0));
    }

    #[test]
    fn test_local_center_maps_back() {
        let c = GridCoordinate::from_position(Vec3::new(5.3, 0.0, -1.2), 2.0, 9);
        let back = GridCoordinate::from_position(c.local_center(), 2.0, 9);
        assert_eq!(c, back);
    }
}
