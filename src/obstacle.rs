//! Static box obstacles on the simulation plane.
//!
//! An [`ObstacleField`] keeps its own [`SpatialIndex`] so agents can find the
//! most threatening obstacle with the same ring search they use for each
//! other. Obstacles never move once placed.

use crate::bounds::BoundingVolume;
use crate::error::{ConfigError, SimulationError};
use crate::params::ObstacleConfig;
use crate::spatial::{GridSpec, SpatialIndex};
use glam::Vec3;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle to an obstacle in an [`ObstacleField`].
    pub struct ObstacleHandle;
}

/// A population of static obstacles.
#[derive(Clone, Debug)]
pub struct ObstacleField {
    plane: BoundingVolume,
    size: Vec3,
    obstacles: SlotMap<ObstacleHandle, BoundingVolume>,
    index: SpatialIndex<ObstacleHandle>,
}

impl ObstacleField {
    /// Empty field over `plane`.
    pub fn new(plane: BoundingVolume, config: &ObstacleConfig) -> Result<Self, ConfigError> {
        plane.validate()?;
        config.validate()?;
        let spec = GridSpec::for_bounds(&plane, config.resolution);
        if !(spec.cell_size.is_finite() && spec.cell_size > 0.0) {
            return Err(ConfigError::NonPositiveCellSize(spec.cell_size));
        }

        Ok(Self {
            plane,
            size: config.size,
            obstacles: SlotMap::with_key(),
            index: SpatialIndex::new(spec),
        })
    }

    /// Field over `plane` pre-filled with `config.count` obstacles in a lattice.
    pub fn with_lattice(plane: BoundingVolume, config: &ObstacleConfig) -> Result<Self, ConfigError> {
        let mut field = Self::new(plane, config)?;
        field.spawn_lattice(config.count);
        Ok(field)
    }

    /// Place an obstacle centered at `position`.
    pub fn spawn(&mut self, position: Vec3) -> ObstacleHandle {
        let volume = BoundingVolume::new(position, self.size);
        let handle = self.obstacles.insert(volume);
        let coord = self.index.coordinate_of(position);
        self.index.register(coord, handle, position, volume);
        tracing::debug!(?handle, %coord, "spawned obstacle");
        handle
    }

    /// Place an obstacle resting on the plane at the XZ of `position`.
    pub fn spawn_above_plane(&mut self, position: Vec3) -> ObstacleHandle {
        let lifted = self.plane.sampled_position(position, self.size);
        self.spawn(lifted)
    }

    /// Spread obstacles over the plane in a lattice.
    ///
    /// The plane is split into `count / 2` columns along X and
    /// `count - count / 2` rows along Z; one obstacle rests at the center of
    /// each cell. Returns the new handles in column-major order.
    pub fn spawn_lattice(&mut self, count: usize) -> Vec<ObstacleHandle> {
        crate::spawn::lattice_positions(&self.plane, count)
            .into_iter()
            .map(|p| self.spawn_above_plane(p))
            .collect()
    }

    /// Remove an obstacle.
    pub fn destroy(&mut self, handle: ObstacleHandle) -> Result<BoundingVolume, SimulationError> {
        let volume = self
            .obstacles
            .remove(handle)
            .ok_or(SimulationError::ObstacleNotFound(handle))?;
        self.index.remove(handle);
        tracing::debug!(?handle, "destroyed obstacle");
        Ok(volume)
    }

    /// The obstacle's box.
    pub fn get(&self, handle: ObstacleHandle) -> Result<&BoundingVolume, SimulationError> {
        self.obstacles
            .get(handle)
            .ok_or(SimulationError::ObstacleNotFound(handle))
    }

    /// Closest obstacle to `position` within `min_distance_squared`, searching
    /// rings up to `max_level`.
    pub fn nearest(
        &self,
        position: Vec3,
        min_distance_squared: f32,
        max_level: Option<u32>,
    ) -> Option<(ObstacleHandle, &BoundingVolume)> {
        let probe = self.index.probe_at(position);
        let handle = self.index.find_nearest(&probe, min_distance_squared, max_level)?;
        self.obstacles.get(handle).map(|v| (handle, v))
    }

    /// Every obstacle with its box.
    pub fn iter(&self) -> impl Iterator<Item = (ObstacleHandle, &BoundingVolume)> + '_ {
        self.obstacles.iter()
    }

    /// The plane obstacles are placed on.
    #[inline]
    pub fn plane(&self) -> &BoundingVolume {
        &self.plane
    }

    /// Spatial index over the obstacles.
    #[inline]
    pub fn index(&self) -> &SpatialIndex<ObstacleHandle> {
        &self.index
    }

    /// Number of obstacles.
    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Whether the field has no obstacles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> BoundingVolume {
        BoundingVolume::new(Vec3::ZERO, Vec3::new(40.0, 1.0, 40.0))
    }

    #[test]
    fn test_lattice_layout() {
        let config = ObstacleConfig {
            count: 4,
            ..Default::default()
        };
        let field = ObstacleField::with_lattice(plane(), &config).expect("valid config");
        assert_eq!(field.len(), 4);

        let mut centers: Vec<_> = field.iter().map(|(_, v)| v.center).collect();
        centers.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.z.total_cmp(&b.z)));
        // two columns of 20 and two rows of 20; y lifted to rest on the plane
        assert_eq!(centers[0], Vec3::new(-10.0, 1.5, -10.0));
        assert_eq!(centers[3], Vec3::new(10.0, 1.5, 10.0));
    }

    #[test]
    fn test_nearest_respects_threshold() {
        let mut field = ObstacleField::new(plane(), &ObstacleConfig::default()).expect("valid config");
        let near = field.spawn(Vec3::new(2.0, 0.0, 0.0));
        field.spawn(Vec3::new(15.0, 0.0, 15.0));

        let found = field.nearest(Vec3::ZERO, 36.0, Some(2)).map(|(h, _)| h);
        assert_eq!(found, Some(near));
        assert!(field.nearest(Vec3::ZERO, 1.0, Some(2)).is_none());
    }

    #[test]
    fn test_destroy_twice_is_not_found() {
        let mut field = ObstacleField::new(plane(), &ObstacleConfig::default()).expect("valid config");
        let h = field.spawn(Vec3::ZERO);
        assert!(field.destroy(h).is_ok());
        assert!(matches!(field.destroy(h), Err(SimulationError::ObstacleNotFound(_))));
        assert!(field.get(h).is_err());
        assert!(field.index().is_empty());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let config = ObstacleConfig {
            resolution: 0,
            ..Default::default()
        };
        assert!(matches!(
            ObstacleField::new(plane(), &config),
            Err(ConfigError::NonPositiveResolution)
        ));
    }
}
