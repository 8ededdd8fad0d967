//! Spawn context for agent placement.
//!
//! Provides helper methods to reduce boilerplate when choosing spawn
//! positions, plus the obstacle lattice layout.
//!
//! ```ignore
//! // ring of agents around the plane center, all resting on the plane
//! system.spawn_with(12, |ctx| {
//!     let p = ctx.on_ring(8.0);
//!     ctx.above_plane(p)
//! });
//! ```

use crate::bounds::BoundingVolume;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// RNG for a system: seeded when `seed` is given, from OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Context handed to spawner closures.
pub struct SpawnContext<'a> {
    /// Index of the agent being spawned (0 to count-1).
    pub index: usize,
    /// Total number of agents being spawned.
    pub count: usize,
    /// The plane agents live on.
    pub plane: &'a BoundingVolume,
    /// Size of the collider of each spawned agent.
    pub collider_size: Vec3,
    rng: &'a mut SmallRng,
}

impl<'a> SpawnContext<'a> {
    pub(crate) fn new(
        index: usize,
        count: usize,
        plane: &'a BoundingVolume,
        collider_size: Vec3,
        rng: &'a mut SmallRng,
    ) -> Self {
        Self {
            index,
            count,
            plane,
            collider_size,
            rng,
        }
    }

    /// Normalized progress through the spawn (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.index as f32 / self.count as f32
    }

    /// Random f32 in the given range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Random point resting on the plane, within 90 % of its XZ extent.
    pub fn random_above_plane(&mut self) -> Vec3 {
        self.plane.random_position_above(&mut *self.rng, self.collider_size)
    }

    /// `position` lifted so the agent rests on the plane.
    pub fn above_plane(&self, position: Vec3) -> Vec3 {
        self.plane.sampled_position(position, self.collider_size)
    }

    /// Point on a circle of `radius` around the plane center, at the center
    /// height, spaced by [`progress`](Self::progress).
    pub fn on_ring(&self, radius: f32) -> Vec3 {
        let theta = self.progress() * TAU;
        self.plane.center + Vec3::new(radius * theta.cos(), 0.0, radius * theta.sin())
    }

    /// Random unit vector in the XZ plane.
    pub fn random_heading(&mut self) -> Vec3 {
        let theta = self.rng.gen_range(0.0..TAU);
        Vec3::new(theta.sin(), 0.0, theta.cos())
    }
}

/// Obstacle lattice over `plane`.
///
/// `count / 2` columns along X by `count - count / 2` rows along Z, one point
/// at the center of each column/row cell, at the plane's center height.
/// A count of one yields the plane center; zero yields nothing.
pub fn lattice_positions(plane: &BoundingVolume, count: usize) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let x_count = (count / 2).max(1);
    let z_count = count - count / 2;

    let x_step = plane.size.x / x_count as f32;
    let z_step = plane.size.z / z_count as f32;
    let min = plane.min_bound();
    let initial = Vec3::new(x_step, 0.0, z_step) * 0.5;

    let mut positions = Vec::with_capacity(x_count * z_count);
    for x in 0..x_count {
        for z in 0..z_count {
            let offset = Vec3::new(x as f32 * x_step, 0.0, z as f32 * z_step) + initial;
            positions.push(Vec3::new(min.x, plane.center.y, min.z) + offset);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> BoundingVolume {
        BoundingVolume::new(Vec3::ZERO, Vec3::new(30.0, 1.0, 30.0))
    }

    #[test]
    fn test_lattice_counts() {
        let p = plane();
        assert!(lattice_positions(&p, 0).is_empty());
        assert_eq!(lattice_positions(&p, 1), vec![Vec3::ZERO]);
        // 9 -> 4 columns x 5 rows
        assert_eq!(lattice_positions(&p, 9).len(), 20);
    }

    #[test]
    fn test_lattice_is_centered_in_cells() {
        let positions = lattice_positions(&plane(), 6);
        // 3 x 3, step 10
        assert_eq!(positions[0], Vec3::new(-10.0, 0.0, -10.0));
        assert_eq!(positions[4], Vec3::ZERO);
        assert_eq!(positions[8], Vec3::new(10.0, 0.0, 10.0));
    }

    #[test]
    fn test_context_helpers() {
        let p = plane();
        let mut rng = seeded_rng(Some(5));
        let mut ctx = SpawnContext::new(2, 4, &p, Vec3::ONE, &mut rng);
        assert_eq!(ctx.progress(), 0.5);

        let ring = ctx.on_ring(5.0);
        assert!((ring - Vec3::new(-5.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(ctx.above_plane(Vec3::ZERO).y, 1.5);

        let spawned = ctx.random_above_plane();
        assert_eq!(spawned.y, 1.5);
        assert!(spawned.x.abs() <= 13.5 && spawned.z.abs() <= 13.5);

        let heading = ctx.random_heading();
        assert!((heading.length() - 1.0).abs() < 1e-5);
        assert_eq!(ctx.random_range(2.0, 2.0), 2.0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = seeded_rng(Some(42));
        let mut b = seeded_rng(Some(42));
        let xs: Vec<f32> = (0..4).map(|_| a.gen()).collect();
        let ys: Vec<f32> = (0..4).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }
}
