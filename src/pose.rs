//! Presentation snapshot of an agent.
//!
//! `AgentPose` is laid out for direct upload: a renderer can
//! `bytemuck::cast_slice(&system.poses())` straight into an instance buffer.
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0 | `position` | `[f32; 3]` |
//! | 12 | `yaw` | `f32` |
//! | 16 | `velocity` | `[f32; 3]` |
//! | 28 | `speed` | `f32` |

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

/// Position, heading, and motion of one agent. 32 bytes, 16-byte friendly.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct AgentPose {
    /// World position.
    pub position: [f32; 3],
    /// Heading around Y, radians; zero faces +Z.
    pub yaw: f32,
    /// World velocity.
    pub velocity: [f32; 3],
    /// Length of `velocity`.
    pub speed: f32,
}

impl AgentPose {
    /// Snapshot from position, heading and velocity.
    pub fn new(position: Vec3, yaw: f32, velocity: Vec3) -> Self {
        Self {
            position: position.to_array(),
            yaw,
            velocity: velocity.to_array(),
            speed: velocity.length(),
        }
    }

    /// Position as a vector.
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Velocity as a vector.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    /// Heading as a rotation.
    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }
}
