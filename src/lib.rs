//! # steerfield - steering agents over a uniform grid
//!
//! Simulates many autonomous agents moving over a bounded area with classic
//! steering behaviors, using a uniform spatial grid so every agent can find
//! its neighbors without scanning the whole population.
//!
//! ## Quick Start
//!
//! ```ignore
//! use steerfield::prelude::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let mut system = SimulationSystem::new(SystemConfig {
//!         kind: AgentKind::Flocker,
//!         resolution: 12,
//!         rng_seed: Some(42),
//!         ..Default::default()
//!     })?;
//!
//!     system.spawn_initial();
//!     system.set_seek_target(Some(Vec3::new(15.0, 0.0, -5.0)));
//!
//!     let mut clock = TickClock::new();
//!     clock.set_fixed_delta(Some(1.0 / 60.0));
//!     loop {
//!         system.advance_tick(clock.update());
//!         upload(bytemuck::cast_slice(&system.poses()));
//!     }
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Grid
//!
//! World positions map to [`GridCoordinate`]s by ceiling division of the
//! position relative to the bounds center. Neighbor searches walk square
//! rings of cells outward from the origin cell, one ring at a time, and stop
//! as soon as a ring produced an answer.
//!
//! ### Behaviors
//!
//! Every agent's motion is a weighted sum of [`Behavior`]s, clamped to the
//! agent's maximum force:
//!
//! ```ignore
//! let behaviors = BehaviorSet::planar()
//!     .with(Behavior::Seek(SteeringParams::new(2.0, 36.0)))
//!     .with(Behavior::Separation(SteeringParams::new(3.0, 4.0)))
//!     .with(Behavior::Bounding(SteeringParams::new(4.0, 0.0)));
//! ```
//!
//! Presets exist for each [`AgentKind`].
//!
//! ### Handles
//!
//! Agents are addressed by [`AgentHandle`]. Operations on a destroyed agent
//! fail with [`SimulationError::AgentNotFound`]; empty queries are not errors.
//!
//! ## Feature Overview
//!
//! | Category | Behaviors |
//! |----------|-----------|
//! | Targets | [`Behavior::Seek`], [`Behavior::Flee`], [`Behavior::Pursue`], [`Behavior::Evade`] |
//! | Flocking | [`Behavior::Separation`], [`Behavior::Alignment`], [`Behavior::Cohesion`] |
//! | Roaming | [`Behavior::Wander`], [`Behavior::Wander3D`], [`Behavior::PathFollow`] |
//! | Boundaries | [`Behavior::Bounding`], [`Behavior::Bounding3D`] |
//! | Environment | [`Behavior::ObstacleAvoidance`], [`Behavior::Resistance`] |
//! | Custom | [`Behavior::Custom`] with a [`SteeringContributor`] |
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for spawn/destroy/teleport,
//! `trace` per tick, `warn` for rejected input) and never installs a
//! subscriber.

pub mod agent;
pub mod aggregate;
pub mod behavior;
pub mod bounds;
pub mod clock;
mod error;
pub mod grid;
pub mod obstacle;
pub mod params;
pub mod path;
pub mod pose;
pub mod spatial;
pub mod spawn;
pub mod steering;
mod system;

pub use agent::{Agent, TickPhase, WanderState};
pub use aggregate::{CellAggregates, CellAverage, FlockMarker};
pub use behavior::{Behavior, BehaviorSet, SteeringContributor, SteeringState, Surroundings};
pub use bounds::BoundingVolume;
pub use error::{ConfigError, SimulationError};
pub use glam::{Quat, Vec2, Vec3};
pub use grid::{coordinate_to_vector, Direction, GridCoordinate};
pub use obstacle::{ObstacleField, ObstacleHandle};
pub use params::{
    AgentConfig, AgentKind, BehaviorParams, ObstacleConfig, ResistanceArea, SteeringParams,
    SystemConfig,
};
pub use path::{segment_delta, Path, PathNode};
pub use pose::AgentPose;
pub use spatial::SpatialIndex;
pub use system::{AgentHandle, SimulationSystem};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use steerfield::prelude::*;
/// ```
///
/// This imports:
/// - [`SimulationSystem`] and [`AgentHandle`]
/// - the configuration structs
/// - [`Behavior`], [`BehaviorSet`], and [`SteeringContributor`]
/// - [`TickClock`](crate::clock::TickClock)
/// - [`Vec2`], [`Vec3`], [`Quat`] - glam types
pub mod prelude {
    pub use crate::behavior::{Behavior, BehaviorSet, SteeringContributor, SteeringState, Surroundings};
    pub use crate::bounds::BoundingVolume;
    pub use crate::clock::TickClock;
    pub use crate::error::{ConfigError, SimulationError};
    pub use crate::grid::GridCoordinate;
    pub use crate::obstacle::{ObstacleField, ObstacleHandle};
    pub use crate::params::{
        AgentConfig, AgentKind, BehaviorParams, ObstacleConfig, ResistanceArea, SteeringParams,
        SystemConfig,
    };
    pub use crate::path::Path;
    pub use crate::pose::AgentPose;
    pub use crate::spawn::SpawnContext;
    pub use crate::steering::Kinematics;
    pub use crate::system::{AgentHandle, SimulationSystem};
    pub use crate::{Agent, Quat, Vec2, Vec3};
}
