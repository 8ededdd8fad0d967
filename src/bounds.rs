//! Axis-aligned bounding volumes.
//!
//! Used for the simulation plane, agent colliders, obstacles, and resistance
//! areas alike.

use crate::error::ConfigError;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fraction of the plane's half-extent that random spawn positions may use.
const SPAWN_MARGIN: f32 = 0.45;

/// An axis-aligned box described by its world-space center and full size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    /// World-space center.
    pub center: Vec3,
    /// Full edge lengths along each axis.
    pub size: Vec3,
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            size: Vec3::ONE,
        }
    }
}

impl BoundingVolume {
    /// Create a box from its center and full size.
    pub const fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Reject negative or non-finite sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = self.size;
        if !s.is_finite() || s.min_element() < 0.0 || !self.center.is_finite() {
            return Err(ConfigError::InvalidBoundingSize(s.to_array()));
        }
        Ok(())
    }

    /// Same size, moved to `center`.
    #[inline]
    pub fn with_center(&self, center: Vec3) -> Self {
        Self {
            center,
            size: self.size,
        }
    }

    /// Half of [`size`](Self::size).
    #[inline]
    pub fn half_size(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Lowest corner.
    #[inline]
    pub fn min_bound(&self) -> Vec3 {
        self.center - self.half_size()
    }

    /// Highest corner.
    #[inline]
    pub fn max_bound(&self) -> Vec3 {
        self.center + self.half_size()
    }

    /// Mean of the X and Z sizes, used as a stand-in radius on the plane.
    #[inline]
    pub fn average_xz_length(&self) -> f32 {
        (self.size.x + self.size.z) * 0.5
    }

    /// Squared length of the size vector.
    #[inline]
    pub fn extent_squared(&self) -> f32 {
        self.size.length_squared()
    }

    /// Strict AABB overlap: touching faces do not count.
    pub fn overlaps(&self, other: &BoundingVolume) -> bool {
        let (a_min, a_max) = (self.min_bound(), self.max_bound());
        let (b_min, b_max) = (other.min_bound(), other.max_bound());
        b_max.cmpgt(a_min).all() && a_max.cmpgt(b_min).all()
    }

    /// Whether `point` lies inside the box (faces included).
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min_bound()).all() && point.cmple(self.max_bound()).all()
    }

    /// Lift `position` so that a box of `other_size` rests on top of this one.
    pub fn sampled_position(&self, mut position: Vec3, other_size: Vec3) -> Vec3 {
        position.y += self.size.y + other_size.y * 0.5;
        position
    }

    /// Random point at the center height, within 90 % of the XZ extent.
    pub fn random_position_xz<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let x = rng.gen_range(-SPAWN_MARGIN..SPAWN_MARGIN) * self.size.x;
        let z = rng.gen_range(-SPAWN_MARGIN..SPAWN_MARGIN) * self.size.z;
        self.center + Vec3::new(x, 0.0, z)
    }

    /// Random point on the plane, lifted for a box of `other_size`.
    pub fn random_position_above<R: Rng + ?Sized>(&self, rng: &mut R, other_size: Vec3) -> Vec3 {
        let p = self.random_position_xz(rng);
        self.sampled_position(p, other_size)
    }
}
