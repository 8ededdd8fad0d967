//! Error types for steerfield.
//!
//! Configuration problems are reported once, when a system or field is built.
//! Handle problems are reported per call, so a caller that raced a destroy
//! can tell the difference between "nothing nearby" and "that agent is gone".

use crate::obstacle::ObstacleHandle;
use crate::system::AgentHandle;
use thiserror::Error;

/// Invalid construction-time configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Agent mass must be strictly positive.
    #[error("mass must be positive, got {0}")]
    NonPositiveMass(f32),
    /// Grid resolution must be at least one cell.
    #[error("grid resolution must be positive")]
    NonPositiveResolution,
    /// Derived cell size collapsed to zero (flat or empty bounding volume).
    #[error("cell size must be positive, got {0}")]
    NonPositiveCellSize(f32),
    /// A bounding volume had a negative or non-finite extent.
    #[error("bounding volume size must be non-negative, got {0:?}")]
    InvalidBoundingSize([f32; 3]),
    /// A scalar limit (speed, force, range) was negative or non-finite.
    #[error("{name} must be non-negative, got {value}")]
    NegativeLimit {
        /// Name of the offending field.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// Steering parameters must be non-negative.
    #[error("steering params for {behavior} must be non-negative (force_scale={force_scale}, threshold_squared={threshold_squared})")]
    InvalidSteeringParams {
        /// Behavior the params belong to.
        behavior: &'static str,
        /// Rejected weight.
        force_scale: f32,
        /// Rejected activation threshold.
        threshold_squared: f32,
    },
    /// A path needs at least one segment.
    #[error("path needs at least 2 nodes, got {0}")]
    PathTooShort(usize),
}

/// Errors surfaced by operations on a running simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The agent handle is stale (destroyed) or never belonged to this system.
    #[error("agent {0:?} not found")]
    AgentNotFound(AgentHandle),
    /// The obstacle handle is stale or foreign.
    #[error("obstacle {0:?} not found")]
    ObstacleNotFound(ObstacleHandle),
    /// Configuration rejected while (re)building part of the simulation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn test_messages_name_the_problem() {
        let err = ConfigError::NonPositiveMass(0.0);
        assert_eq!(err.to_string(), "mass must be positive, got 0");

        let handle = AgentHandle::from(KeyData::from_ffi(1));
        let err = SimulationError::AgentNotFound(handle);
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: SimulationError = ConfigError::NonPositiveResolution.into();
        assert_eq!(
            err,
            SimulationError::Config(ConfigError::NonPositiveResolution)
        );
        assert_eq!(err.to_string(), "grid resolution must be positive");
    }
}
