//! Agent kinematic state and the per-tick integration state machine.
//!
//! An agent moves through four phases every tick:
//!
//! ```text
//! Idle -> ForceAccumulating -> Integrating -> Rebucketing -> Idle
//! ```
//!
//! [`apply_force`](Agent::apply_force) accumulates clamped, mass-scaled
//! acceleration; [`integrate`](Agent::integrate) turns it into motion and
//! clears the accumulator; the owning system re-buckets the agent and hands
//! back its grid coordinate with [`settle`](Agent::settle).

use crate::bounds::BoundingVolume;
use crate::grid::GridCoordinate;
use crate::params::AgentConfig;
use crate::pose::AgentPose;
use crate::steering::{Kinematics, MovingTarget};
use glam::{Quat, Vec2, Vec3};

/// Where an agent is in the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TickPhase {
    /// Between ticks.
    #[default]
    Idle,
    /// Forces are being summed into the acceleration accumulator.
    ForceAccumulating,
    /// Velocity and position are being advanced.
    Integrating,
    /// Position changed; waiting for the spatial index to catch up.
    Rebucketing,
}

/// Wander angles carried across ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WanderState {
    /// Planar wander angle, radians.
    pub angle: f32,
    /// Angles for the spherical variant (`x` around X, `y` around Y).
    pub angles: Vec2,
}

/// A steering-driven vehicle.
#[derive(Clone, Debug)]
pub struct Agent {
    position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    yaw: f32,
    mass: f32,
    max_force: f32,
    max_speed: f32,
    max_steering_speed: f32,
    collider: BoundingVolume,
    coordinate: GridCoordinate,
    wander: WanderState,
    phase: TickPhase,
}

impl Agent {
    /// Create an agent at rest, facing +Z.
    ///
    /// `config` is assumed validated; the owning system checks it before any
    /// agent is built.
    pub fn new(position: Vec3, config: &AgentConfig, coordinate: GridCoordinate) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            yaw: 0.0,
            mass: config.mass,
            max_force: config.max_force,
            max_speed: config.max_speed,
            max_steering_speed: config.max_steering_speed,
            collider: BoundingVolume::new(position, config.collider_size),
            coordinate,
            wander: WanderState::default(),
            phase: TickPhase::Idle,
        }
    }

    /// Start moving with `velocity`, turning to face it.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self.face(velocity);
        self
    }

    // ========== Accessors ==========

    /// World position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Accumulated acceleration for the current tick.
    #[inline]
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    /// Heading around the Y axis, radians. Zero faces +Z.
    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Unit heading on the XZ plane.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    /// Unit vector to the right of [`forward`](Self::forward).
    #[inline]
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Heading as a rotation.
    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Mass dividing applied forces.
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Cap on a single applied force.
    #[inline]
    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    /// Cap on velocity magnitude.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Desired speed used by steering computations.
    #[inline]
    pub fn max_steering_speed(&self) -> f32 {
        self.max_steering_speed
    }

    /// Collision box, centered on the agent.
    #[inline]
    pub fn collider(&self) -> &BoundingVolume {
        &self.collider
    }

    /// The grid cell this agent is bucketed under.
    #[inline]
    pub fn grid_coordinate(&self) -> &GridCoordinate {
        &self.coordinate
    }

    /// Wander angles carried between ticks.
    #[inline]
    pub fn wander(&self) -> WanderState {
        self.wander
    }

    /// Current step of the tick cycle.
    #[inline]
    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Steering view of this agent.
    pub fn kinematics(&self, arrival_threshold_squared: f32) -> Kinematics {
        Kinematics {
            position: self.position,
            velocity: self.velocity,
            forward: self.forward(),
            right: self.right(),
            max_speed: self.max_speed,
            max_steering_speed: self.max_steering_speed,
            arrival_threshold_squared,
        }
    }

    /// This agent as something to chase or flee.
    #[inline]
    pub fn as_target(&self) -> MovingTarget {
        MovingTarget {
            position: self.position,
            velocity: self.velocity,
        }
    }

    /// Presentation snapshot.
    pub fn pose(&self) -> AgentPose {
        AgentPose::new(self.position, self.yaw, self.velocity)
    }

    // ========== Tick phases ==========

    /// Clamp `force` to `max_force` and add `force / mass` to the accumulator.
    pub fn apply_force(&mut self, force: Vec3) {
        self.phase = TickPhase::ForceAccumulating;
        if !force.is_finite() {
            return;
        }
        self.acceleration += force.clamp_length_max(self.max_force) / self.mass;
    }

    /// Advance by `dt` seconds and clear the accumulator.
    ///
    /// Velocity is capped at `max_speed`. A velocity with no planar component
    /// leaves the heading unchanged.
    pub fn integrate(&mut self, dt: f32) {
        self.phase = TickPhase::Integrating;

        self.velocity = (self.velocity + self.acceleration * dt).clamp_length_max(self.max_speed);
        self.position += self.velocity * dt;
        self.collider.center = self.position;
        self.face(self.velocity);
        self.acceleration = Vec3::ZERO;

        self.phase = TickPhase::Rebucketing;
    }

    /// Record the cell the index put this agent in and return to idle.
    pub fn settle(&mut self, coordinate: GridCoordinate) {
        self.coordinate = coordinate;
        self.phase = TickPhase::Idle;
    }

    pub(crate) fn set_wander(&mut self, wander: WanderState) {
        self.wander = wander;
    }

    /// Move without integrating. The caller re-buckets.
    pub(crate) fn place(&mut self, position: Vec3) {
        self.position = position;
        self.collider.center = position;
        self.phase = TickPhase::Rebucketing;
    }

    fn face(&mut self, direction: Vec3) {
        if direction.x == 0.0 && direction.z == 0.0 {
            return;
        }
        self.yaw = direction.x.atan2(direction.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn agent_at(position: Vec3) -> Agent {
        let coordinate = GridCoordinate::from_position(position, 1.0, 10);
        Agent::new(position, &AgentConfig::default(), coordinate)
    }

    #[test]
    fn test_new_agent_is_idle_and_at_rest() {
        let a = agent_at(Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(a.phase(), TickPhase::Idle);
        assert_eq!(a.velocity(), Vec3::ZERO);
        assert_eq!(a.forward(), Vec3::Z);
        assert_eq!(a.collider().center, Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_zero_force_integration_is_idempotent() {
        let mut a = agent_at(Vec3::ZERO).with_velocity(Vec3::new(2.0, 0.0, 1.0));
        a.apply_force(Vec3::ZERO);
        a.integrate(0.5);
        assert_eq!(a.position(), Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(a.velocity(), Vec3::new(2.0, 0.0, 1.0));
        assert_eq!(a.phase(), TickPhase::Rebucketing);
    }

    #[test]
    fn test_force_is_clamped_then_divided_by_mass() {
        let config = AgentConfig {
            mass: 2.0,
            max_force: 4.0,
            ..Default::default()
        };
        let mut a = Agent::new(Vec3::ZERO, &config, GridCoordinate::new(0, 0, 1.0, 5));
        a.apply_force(Vec3::new(100.0, 0.0, 0.0));
        assert!((a.acceleration() - Vec3::new(2.0, 0.0, 0.0)).length() < EPS);
        assert_eq!(a.phase(), TickPhase::ForceAccumulating);
    }

    #[test]
    fn test_accumulator_resets_after_integrate() {
        let mut a = agent_at(Vec3::ZERO);
        a.apply_force(Vec3::X);
        a.apply_force(Vec3::X);
        assert!((a.acceleration() - Vec3::new(2.0, 0.0, 0.0)).length() < EPS);
        a.integrate(1.0);
        assert_eq!(a.acceleration(), Vec3::ZERO);
    }

    #[test]
    fn test_velocity_clamped_to_max_speed() {
        let mut a = agent_at(Vec3::ZERO);
        for _ in 0..10 {
            a.apply_force(Vec3::new(0.0, 0.0, 5.0));
            a.integrate(1.0);
        }
        assert!((a.velocity().length() - a.max_speed()).abs() < EPS);
    }

    #[test]
    fn test_heading_follows_velocity() {
        let mut a = agent_at(Vec3::ZERO).with_velocity(Vec3::X);
        assert!((a.forward() - Vec3::X).length() < EPS);
        assert!((a.right() - Vec3::new(0.0, 0.0, -1.0)).length() < EPS);

        // vertical-only and zero velocities keep the last heading
        a.apply_force(Vec3::new(-1.0, 3.0, 0.0));
        a.integrate(1.0);
        assert_eq!(a.velocity().x, 0.0);
        assert!((a.forward() - Vec3::X).length() < EPS);

        let rotated = a.rotation() * Vec3::Z;
        assert!((rotated - Vec3::X).length() < EPS);
    }

    #[test]
    fn test_non_finite_force_is_ignored() {
        let mut a = agent_at(Vec3::ZERO);
        a.apply_force(Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(a.acceleration(), Vec3::ZERO);
    }

    #[test]
    fn test_settle_returns_to_idle() {
        let mut a = agent_at(Vec3::ZERO).with_velocity(Vec3::new(3.0, 0.0, 0.0));
        a.integrate(1.0);
        let coord = GridCoordinate::from_position(a.position(), 1.0, 10);
        a.settle(coord);
        assert_eq!(a.phase(), TickPhase::Idle);
        assert_eq!(a.grid_coordinate(), &coord);
    }
}
