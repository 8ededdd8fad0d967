//! Construction-time configuration.
//!
//! Everything here is plain data that an outer loading layer can deserialize.
//! Defaults are the stock scene tuning; [`SystemConfig::validate`]
//! is called by [`SimulationSystem::new`](crate::SimulationSystem::new) so bad
//! values fail before the first tick.
//!
//! ```ignore
//! let config: SystemConfig = serde_json::from_str(r#"{
//!     "kind": "Flocker",
//!     "resolution": 12,
//!     "agent": { "max_speed": 6.0, "max_steering_speed": 4.0 }
//! }"#)?;
//! ```

use crate::bounds::BoundingVolume;
use crate::error::ConfigError;
use crate::path::Path;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Weight and activation threshold for one steering behavior.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Multiplier applied to the raw force before summation.
    pub force_scale: f32,
    /// Squared distance at which the behavior activates or starts easing.
    pub threshold_squared: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            force_scale: 2.0,
            threshold_squared: 36.0,
        }
    }
}

impl SteeringParams {
    /// Create params from a weight and a squared threshold.
    pub const fn new(force_scale: f32, threshold_squared: f32) -> Self {
        Self {
            force_scale,
            threshold_squared,
        }
    }

    /// Check both fields are finite and non-negative.
    pub fn validate(&self, behavior: &'static str) -> Result<(), ConfigError> {
        let ok = |v: f32| v.is_finite() && v >= 0.0;
        if ok(self.force_scale) && ok(self.threshold_squared) {
            Ok(())
        } else {
            Err(ConfigError::InvalidSteeringParams {
                behavior,
                force_scale: self.force_scale,
                threshold_squared: self.threshold_squared,
            })
        }
    }
}

/// Physical limits shared by every agent of a system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Mass used to turn force into acceleration. Must be > 0.
    pub mass: f32,
    /// Cap on the composed steering force.
    pub max_force: f32,
    /// Cap on velocity magnitude after integration.
    pub max_speed: f32,
    /// Desired speed used inside steering computations.
    pub max_steering_speed: f32,
    /// Largest wander-angle change per tick, in radians.
    pub wander_range: f32,
    /// Seconds of extrapolation for path following.
    pub future_lookup_time: f32,
    /// Cap on the squared pursuit/evasion prediction horizon.
    pub max_prediction_time_squared: f32,
    /// Size of each agent's collision box.
    pub collider_size: Vec3,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            max_force: 5.0,
            max_speed: 10.0,
            max_steering_speed: 1.0,
            wander_range: 0.333,
            future_lookup_time: 1.8,
            max_prediction_time_squared: 9.0,
            collider_size: Vec3::ONE,
        }
    }
}

impl AgentConfig {
    /// Check mass and every limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ConfigError::NonPositiveMass(self.mass));
        }
        let limits = [
            ("max_force", self.max_force),
            ("max_speed", self.max_speed),
            ("max_steering_speed", self.max_steering_speed),
            ("wander_range", self.wander_range),
            ("future_lookup_time", self.future_lookup_time),
            ("max_prediction_time_squared", self.max_prediction_time_squared),
        ];
        for (name, value) in limits {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeLimit { name, value });
            }
        }
        BoundingVolume::new(Vec3::ZERO, self.collider_size).validate()
    }
}

/// Per-behavior weights used when a system is built from an [`AgentKind`] preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorParams {
    /// Seek toward the system's target. The threshold is the arrival radius
    /// squared; cohesion, wander, pursuit, and path leads ease with it too.
    pub seeking: SteeringParams,
    /// Flee from the system's target.
    pub fleeing: SteeringParams,
    /// Wander; the threshold is the projection distance of the wander circle.
    pub wandering: SteeringParams,
    /// Obstacle avoidance; the threshold is the obstacle search radius squared.
    pub avoiding: SteeringParams,
    /// Separation; the threshold is the neighbor search radius squared.
    pub separation: SteeringParams,
    /// Alignment with the cell's average velocity.
    pub alignment: SteeringParams,
    /// Cohesion toward the cell's average position.
    pub cohesion: SteeringParams,
    /// Push back inside the bounding volume.
    pub bounding: SteeringParams,
    /// Path following; the threshold is how far ahead on the segment to aim.
    pub path_follow: SteeringParams,
    /// Pursue the quarry.
    pub pursuit: SteeringParams,
    /// Evade the quarry.
    pub evasion: SteeringParams,
    /// Drag inside resistance areas, for sets that add
    /// [`Behavior::Resistance`](crate::Behavior::Resistance).
    pub resistance: SteeringParams,
}

impl BehaviorParams {
    /// Check every entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.seeking.validate("seeking")?;
        self.fleeing.validate("fleeing")?;
        self.wandering.validate("wandering")?;
        self.avoiding.validate("avoiding")?;
        self.separation.validate("separation")?;
        self.alignment.validate("alignment")?;
        self.cohesion.validate("cohesion")?;
        self.bounding.validate("bounding")?;
        self.path_follow.validate("path_follow")?;
        self.pursuit.validate("pursuit")?;
        self.evasion.validate("evasion")?;
        self.resistance.validate("resistance")
    }
}

/// Preset behavior mixes, one per kind of agent population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    /// Seek, avoid obstacles, separate, align, cohere, stay in bounds.
    #[default]
    Flocker,
    /// Follow the system path, separate, stay in bounds. Planar.
    PathFollower,
    /// Wander and stay in bounds. Planar.
    Wanderer,
    /// Avoid obstacles, wander in 3D, stay inside the 3D volume.
    Drifter,
    /// Pursue the quarry, avoid obstacles, stay in bounds.
    Hunter,
    /// Evade the quarry, avoid obstacles, stay in bounds.
    Prey,
}

/// A box region that drags agents passing through it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResistanceArea {
    /// Region covered.
    pub volume: BoundingVolume,
    /// Fraction of velocity removed per unit time while inside.
    pub drag_coefficient: f32,
}

impl ResistanceArea {
    /// Check the region and the coefficient.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.volume.validate()?;
        if !(self.drag_coefficient.is_finite() && self.drag_coefficient >= 0.0) {
            return Err(ConfigError::NegativeLimit {
                name: "drag_coefficient",
                value: self.drag_coefficient,
            });
        }
        Ok(())
    }
}

/// Static obstacle population laid out over the plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Lattice parameter: `count / 2` columns by `count - count / 2` rows.
    pub count: usize,
    /// Size of every obstacle box.
    pub size: Vec3,
    /// Grid resolution of the obstacle index.
    pub resolution: u32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: 9,
            size: Vec3::ONE,
            resolution: 9,
        }
    }
}

impl ObstacleConfig {
    /// Check the box size and the grid resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        BoundingVolume::new(Vec3::ZERO, self.size).validate()?;
        if self.resolution == 0 {
            return Err(ConfigError::NonPositiveResolution);
        }
        Ok(())
    }
}

/// Everything needed to build a [`SimulationSystem`](crate::SimulationSystem).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Area the agents live in; also the grid's extent.
    pub bounds: BoundingVolume,
    /// Cells across the larger of the X/Z extents.
    pub resolution: u32,
    /// Agents created by [`spawn_initial`](crate::SimulationSystem::spawn_initial).
    pub initial_spawn_count: usize,
    /// Behavior preset.
    pub kind: AgentKind,
    /// Weights for the preset's behaviors.
    pub behavior_params: BehaviorParams,
    /// Limits shared by every agent.
    pub agent: AgentConfig,
    /// Path for path-following populations.
    pub path: Option<Path>,
    /// Drag regions.
    pub resistance_areas: Vec<ResistanceArea>,
    /// Obstacles to build alongside the agents, if any.
    pub obstacles: Option<ObstacleConfig>,
    /// Seed for wander and spawn randomness; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingVolume::new(Vec3::ZERO, Vec3::new(50.0, 1.0, 50.0)),
            resolution: 9,
            initial_spawn_count: 9,
            kind: AgentKind::default(),
            behavior_params: BehaviorParams::default(),
            agent: AgentConfig::default(),
            path: None,
            resistance_areas: Vec::new(),
            obstacles: None,
            rng_seed: None,
        }
    }
}

impl SystemConfig {
    /// World units per grid cell: the larger planar extent over the resolution.
    pub fn cell_size(&self) -> f32 {
        if self.resolution == 0 {
            return 0.0;
        }
        self.bounds.size.x.max(self.bounds.size.z) / self.resolution as f32
    }

    /// Check the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bounds.validate()?;
        if self.resolution == 0 {
            return Err(ConfigError::NonPositiveResolution);
        }
        let cell_size = self.cell_size();
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::NonPositiveCellSize(cell_size));
        }
        self.agent.validate()?;
        self.behavior_params.validate()?;
        if let Some(path) = &self.path {
            path.validate()?;
        }
        for area in &self.resistance_areas {
            area.validate()?;
        }
        if let Some(obstacles) = &self.obstacles {
            obstacles.validate()?;
        }
        Ok(())
    }
}
