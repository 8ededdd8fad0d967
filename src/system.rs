//! The simulation: agents, their spatial index, and the tick pipeline.
//!
//! # Tick pipeline
//!
//! [`advance_tick`](SimulationSystem::advance_tick) runs four phases, each
//! finished for every agent before the next starts:
//!
//! 1. **Refresh** - per-cell averages are recomputed if spawns, destroys, or
//!    teleports happened since the last tick.
//! 2. **Accumulate** - every agent's composed steering force is computed
//!    against the same snapshot of positions, velocities, and averages.
//! 3. **Integrate** - forces become acceleration, velocity, and position.
//! 4. **Rebucket** - agents whose cell changed move buckets; the per-cell
//!    averages are recomputed for the next tick.
//!
//! # Example
//!
//! ```ignore
//! use steerfield::prelude::*;
//!
//! let mut system = SimulationSystem::new(SystemConfig {
//!     kind: AgentKind::Flocker,
//!     rng_seed: Some(7),
//!     ..Default::default()
//! })?;
//!
//! system.spawn_initial();
//! system.set_seek_target(Some(Vec3::new(10.0, 0.0, 10.0)));
//!
//! for _ in 0..600 {
//!     system.advance_tick(1.0 / 60.0);
//! }
//! let poses = system.poses();
//! ```

use crate::agent::{Agent, WanderState};
use crate::aggregate::{CellAggregates, FlockMarker, MemberMotion};
use crate::behavior::{BehaviorSet, SteeringState, Surroundings};
use crate::bounds::BoundingVolume;
use crate::error::{ConfigError, SimulationError};
use crate::grid::GridCoordinate;
use crate::obstacle::ObstacleField;
use crate::params::SystemConfig;
use crate::pose::AgentPose;
use crate::spatial::{GridSpec, SpatialIndex};
use crate::spawn::{seeded_rng, SpawnContext};
use glam::{Quat, Vec3};
use rand::rngs::SmallRng;
use slotmap::{new_key_type, SecondaryMap, SlotMap};
use std::sync::Arc;

new_key_type! {
    /// Stable handle to an agent in a [`SimulationSystem`].
    ///
    /// Handles are generational: once an agent is destroyed its handle never
    /// resolves again, even if the slot is reused.
    pub struct AgentHandle;
}

/// Ring levels searched by [`SimulationSystem::colliding_with`].
const COLLISION_SEARCH_LEVELS: u32 = 1;

/// A population of steering agents sharing one grid, one behavior set, and
/// one set of targets.
#[derive(Debug)]
pub struct SimulationSystem {
    config: SystemConfig,
    behaviors: BehaviorSet,
    agents: SlotMap<AgentHandle, Agent>,
    index: SpatialIndex<AgentHandle>,
    aggregates: CellAggregates,
    obstacles: Option<Arc<ObstacleField>>,
    seek_target: Option<Vec3>,
    quarry: Option<AgentHandle>,
    predictions: SecondaryMap<AgentHandle, Vec3>,
    rng: SmallRng,
    tick: u64,
}

impl SimulationSystem {
    /// Build a system whose behaviors come from `config.kind`.
    ///
    /// Fails if any part of `config` is invalid. When `config.obstacles` is
    /// set, an obstacle lattice is built over the bounds as well.
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        let behaviors = BehaviorSet::for_kind(config.kind, &config.behavior_params);
        Self::with_behaviors(config, behaviors)
    }

    /// Build a system with a hand-assembled behavior set.
    pub fn with_behaviors(config: SystemConfig, behaviors: BehaviorSet) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "rejected simulation config");
            return Err(err);
        }
        for behavior in behaviors.iter() {
            behavior.params().validate(behavior.name())?;
        }

        let obstacles = match &config.obstacles {
            Some(obstacle_config) => Some(Arc::new(ObstacleField::with_lattice(
                config.bounds,
                obstacle_config,
            )?)),
            None => None,
        };

        let spec = GridSpec::for_bounds(&config.bounds, config.resolution);
        tracing::debug!(
            cell_size = spec.cell_size,
            resolution = spec.resolution,
            behaviors = behaviors.len(),
            "created simulation system"
        );

        Ok(Self {
            rng: seeded_rng(config.rng_seed),
            config,
            behaviors,
            agents: SlotMap::with_key(),
            index: SpatialIndex::new(spec),
            aggregates: CellAggregates::new(),
            obstacles,
            seek_target: None,
            quarry: None,
            predictions: SecondaryMap::new(),
            tick: 0,
        })
    }

    /// Use `field` for obstacle avoidance, replacing any configured lattice.
    ///
    /// The field is shared, so several systems can avoid the same obstacles.
    pub fn with_obstacles(mut self, field: Arc<ObstacleField>) -> Self {
        self.obstacles = Some(field);
        self
    }

    /// Replace or remove the obstacle field consulted by obstacle avoidance.
    pub fn set_obstacles(&mut self, field: Option<Arc<ObstacleField>>) {
        self.obstacles = field;
    }

    // ========== Spawning ==========

    /// Create an agent at `position` and register it in the index.
    pub fn spawn(&mut self, position: Vec3) -> AgentHandle {
        let coord = self.index.coordinate_of(position);
        let agent = Agent::new(position, &self.config.agent, coord);
        let collider = *agent.collider();
        let handle = self.agents.insert(agent);
        self.index.register(coord, handle, position, collider);
        self.aggregates.mark_dirty();
        tracing::debug!(?handle, %coord, "spawned agent");
        handle
    }

    /// Create an agent at a random spot resting on the plane.
    pub fn spawn_random(&mut self) -> AgentHandle {
        let position = self
            .config
            .bounds
            .random_position_above(&mut self.rng, self.config.agent.collider_size);
        self.spawn(position)
    }

    /// Create an agent resting on the plane at the XZ of `position`.
    pub fn spawn_above_plane(&mut self, position: Vec3) -> AgentHandle {
        let lifted = self
            .config
            .bounds
            .sampled_position(position, self.config.agent.collider_size);
        self.spawn(lifted)
    }

    /// Create `initial_spawn_count` agents at random spots on the plane.
    pub fn spawn_initial(&mut self) -> Vec<AgentHandle> {
        (0..self.config.initial_spawn_count)
            .map(|_| self.spawn_random())
            .collect()
    }

    /// Create `count` agents at positions chosen by `spawner`.
    pub fn spawn_with<F>(&mut self, count: usize, mut spawner: F) -> Vec<AgentHandle>
    where
        F: FnMut(&mut SpawnContext<'_>) -> Vec3,
    {
        let mut positions = Vec::with_capacity(count);
        for index in 0..count {
            let mut ctx = SpawnContext::new(
                index,
                count,
                &self.config.bounds,
                self.config.agent.collider_size,
                &mut self.rng,
            );
            positions.push(spawner(&mut ctx));
        }
        positions.into_iter().map(|p| self.spawn(p)).collect()
    }

    /// Remove an agent from the system and the index.
    ///
    /// A quarry that is destroyed is cleared.
    pub fn destroy(&mut self, handle: AgentHandle) -> Result<Agent, SimulationError> {
        let agent = self
            .agents
            .remove(handle)
            .ok_or(SimulationError::AgentNotFound(handle))?;
        self.index.remove(handle);
        self.predictions.remove(handle);
        if self.quarry == Some(handle) {
            self.quarry = None;
        }
        self.aggregates.mark_dirty();
        tracing::debug!(?handle, "destroyed agent");
        Ok(agent)
    }

    /// Move an agent to a random spot on the plane and re-bucket it at once.
    ///
    /// Returns the new position.
    pub fn teleport(&mut self, handle: AgentHandle) -> Result<Vec3, SimulationError> {
        // resolve first so a stale handle leaves the RNG untouched
        self.agent(handle)?;
        let position = self
            .config
            .bounds
            .random_position_above(&mut self.rng, self.config.agent.collider_size);
        self.move_agent(handle, position)?;
        tracing::debug!(?handle, ?position, "teleported agent");
        Ok(position)
    }

    /// Move an agent to `position` without integrating, and re-bucket it.
    pub fn move_agent(&mut self, handle: AgentHandle, position: Vec3) -> Result<(), SimulationError> {
        let agent = self
            .agents
            .get_mut(handle)
            .ok_or(SimulationError::AgentNotFound(handle))?;
        agent.place(position);
        let coord = self
            .index
            .rebucket(handle, position)
            .unwrap_or(*agent.grid_coordinate());
        agent.settle(coord);
        self.aggregates.mark_dirty();
        Ok(())
    }

    // ========== Tick ==========

    /// Advance every agent by `dt` seconds.
    ///
    /// A negative or non-finite `dt` is ignored.
    pub fn advance_tick(&mut self, dt: f32) {
        if !(dt.is_finite() && dt >= 0.0) {
            tracing::warn!(dt, "ignored tick with invalid dt");
            return;
        }

        if self.aggregates.is_dirty() {
            self.refresh_aggregates();
        }

        let forces = self.accumulate_forces();

        for (handle, step) in forces {
            let Some(agent) = self.agents.get_mut(handle) else {
                continue;
            };
            agent.set_wander(step.wander);
            agent.apply_force(step.force);
            agent.integrate(dt);

            match step.predicted_position {
                Some(p) => {
                    self.predictions.insert(handle, p);
                }
                None => {
                    self.predictions.remove(handle);
                }
            }
        }

        let mut rebucketed = 0usize;
        for (handle, agent) in self.agents.iter_mut() {
            let coord = match self.index.rebucket(handle, agent.position()) {
                Some(new) => {
                    rebucketed += 1;
                    new
                }
                None => *agent.grid_coordinate(),
            };
            agent.settle(coord);
        }

        self.refresh_aggregates();
        self.tick += 1;

        tracing::trace!(
            tick = self.tick,
            agents = self.agents.len(),
            rebucketed,
            dt,
            "advanced tick"
        );
    }

    fn accumulate_forces(&mut self) -> Vec<(AgentHandle, ForceStep)> {
        let quarry = self
            .quarry
            .and_then(|q| self.agents.get(q).map(|a| (q, a.as_target())));
        let arrival_threshold_squared = self.config.behavior_params.seeking.threshold_squared;

        let mut steps = Vec::with_capacity(self.agents.len());
        for (handle, agent) in &self.agents {
            let world = Surroundings {
                handle,
                agents: &self.agents,
                index: &self.index,
                aggregates: &self.aggregates,
                obstacles: self.obstacles.as_deref(),
                bounds: &self.config.bounds,
                path: self.config.path.as_ref(),
                seek_target: self.seek_target,
                quarry: quarry.filter(|(q, _)| *q != handle).map(|(_, t)| t),
                resistance_areas: &self.config.resistance_areas,
                agent_config: &self.config.agent,
                arrival_threshold_squared,
            };
            let mut state = SteeringState::new(agent.wander(), &mut self.rng);
            let force = self.behaviors.compose(agent, &world, &mut state);
            steps.push((
                handle,
                ForceStep {
                    force,
                    wander: state.wander,
                    predicted_position: state.predicted_position,
                },
            ));
        }
        steps
    }

    /// Recompute the per-cell averages now.
    pub fn refresh_aggregates(&mut self) {
        let agents = &self.agents;
        self.aggregates.refresh(&self.index, |handle| {
            agents.get(handle).map(|a| MemberMotion {
                position: a.position(),
                velocity: a.velocity(),
                max_steering_speed: a.max_steering_speed(),
            })
        });
    }

    // ========== Queries ==========

    /// Closest other agent, searching rings up to `max_level` (default: as far
    /// as the grid reaches).
    pub fn query_nearest(
        &self,
        handle: AgentHandle,
        max_level: Option<u32>,
    ) -> Result<Option<AgentHandle>, SimulationError> {
        let probe = self
            .index
            .probe(handle)
            .ok_or(SimulationError::AgentNotFound(handle))?;
        Ok(self.index.find_nearest(&probe, f32::MAX, max_level))
    }

    /// Other agents within `radius_squared` on the XZ plane.
    ///
    /// Uses the early-exit ring search: agents beyond the first ring that
    /// crossed the radius may be left out.
    pub fn query_within_radius(
        &self,
        handle: AgentHandle,
        radius_squared: f32,
    ) -> Result<Vec<AgentHandle>, SimulationError> {
        let probe = self
            .index
            .probe(handle)
            .ok_or(SimulationError::AgentNotFound(handle))?;
        Ok(self.index.find_within_radius(&probe, radius_squared))
    }

    /// Other agents in exactly ring `level` around the agent's cell.
    pub fn query_in_ring(&self, handle: AgentHandle, level: u32) -> Result<Vec<AgentHandle>, SimulationError> {
        let probe = self
            .index
            .probe(handle)
            .ok_or(SimulationError::AgentNotFound(handle))?;
        Ok(self.index.find_in_ring(&probe, level))
    }

    /// Agents whose collider strictly overlaps `volume`, searched in the
    /// volume's cell and the ring around it.
    pub fn colliding_with(&self, volume: &BoundingVolume) -> Vec<AgentHandle> {
        let probe = self.index.probe_at(volume.center);
        self.index
            .find_overlapping(&probe, volume, COLLISION_SEARCH_LEVELS)
    }

    // ========== Accessors ==========

    /// The agent behind `handle`.
    pub fn agent(&self, handle: AgentHandle) -> Result<&Agent, SimulationError> {
        self.agents
            .get(handle)
            .ok_or(SimulationError::AgentNotFound(handle))
    }

    /// World position of an agent.
    pub fn position(&self, handle: AgentHandle) -> Result<Vec3, SimulationError> {
        self.agent(handle).map(Agent::position)
    }

    /// Current velocity of an agent.
    pub fn velocity(&self, handle: AgentHandle) -> Result<Vec3, SimulationError> {
        self.agent(handle).map(Agent::velocity)
    }

    /// Unit heading on the XZ plane.
    pub fn heading(&self, handle: AgentHandle) -> Result<Vec3, SimulationError> {
        self.agent(handle).map(Agent::forward)
    }

    /// Heading of an agent as a rotation around Y.
    pub fn rotation(&self, handle: AgentHandle) -> Result<Quat, SimulationError> {
        self.agent(handle).map(Agent::rotation)
    }

    /// Point pursuit or evasion predicted for this agent's quarry last tick.
    pub fn last_predicted_position(&self, handle: AgentHandle) -> Result<Option<Vec3>, SimulationError> {
        self.agent(handle)?;
        Ok(self.predictions.get(handle).copied())
    }

    /// Every agent.
    pub fn agents(&self) -> impl Iterator<Item = (AgentHandle, &Agent)> + '_ {
        self.agents.iter()
    }

    /// Presentation snapshots of every agent, in storage order.
    pub fn poses(&self) -> Vec<AgentPose> {
        self.agents.values().map(Agent::pose).collect()
    }

    /// Number of live agents.
    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the system has no agents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Whether `handle` still resolves.
    #[inline]
    pub fn contains(&self, handle: AgentHandle) -> bool {
        self.agents.contains_key(handle)
    }

    /// Ticks advanced so far.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Configuration the system was built with.
    #[inline]
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Contributors applied to every agent.
    #[inline]
    pub fn behaviors(&self) -> &BehaviorSet {
        &self.behaviors
    }

    /// Spatial index over the agents.
    #[inline]
    pub fn index(&self) -> &SpatialIndex<AgentHandle> {
        &self.index
    }

    /// Obstacle field consulted by obstacle avoidance, if any.
    pub fn obstacles(&self) -> Option<&ObstacleField> {
        self.obstacles.as_deref()
    }

    /// World units per grid cell.
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.index.spec().cell_size
    }

    /// Cells across the larger planar extent.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.index.spec().resolution
    }

    /// Grid cell containing world position `position`.
    pub fn coordinate_of(&self, position: Vec3) -> GridCoordinate {
        self.index.coordinate_of(position)
    }

    // ========== Aggregates ==========

    /// Average velocity of the agents in `coord`; zero when empty.
    pub fn average_velocity_at(&self, coord: &GridCoordinate) -> Vec3 {
        self.aggregates.average_velocity(coord)
    }

    /// Average position of the agents in `coord`; zero when empty.
    pub fn average_position_at(&self, coord: &GridCoordinate) -> Vec3 {
        self.aggregates.average_position(coord)
    }

    /// Per-cell averages as of the last refresh.
    #[inline]
    pub fn aggregates(&self) -> &CellAggregates {
        &self.aggregates
    }

    /// Average over every populated cell, `None` when there are no agents.
    pub fn flock_marker(&self) -> Option<FlockMarker> {
        self.aggregates.marker()
    }

    // ========== Targets ==========

    /// Point for seek and flee behaviors.
    pub fn set_seek_target(&mut self, target: Option<Vec3>) {
        self.seek_target = target;
    }

    /// Current seek target.
    #[inline]
    pub fn seek_target(&self) -> Option<Vec3> {
        self.seek_target
    }

    /// Agent for pursue and evade behaviors.
    pub fn set_quarry(&mut self, quarry: Option<AgentHandle>) -> Result<(), SimulationError> {
        if let Some(handle) = quarry {
            self.agent(handle)?;
        }
        self.quarry = quarry;
        Ok(())
    }

    /// Current quarry.
    #[inline]
    pub fn quarry(&self) -> Option<AgentHandle> {
        self.quarry
    }
}

/// Output of the accumulate phase for one agent.
struct ForceStep {
    force: Vec3,
    wander: WanderState,
    predicted_position: Option<Vec3>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TickPhase;
    use crate::behavior::Behavior;
    use crate::params::SteeringParams;

    fn config() -> SystemConfig {
        SystemConfig {
            bounds: BoundingVolume::new(Vec3::ZERO, Vec3::new(20.0, 1.0, 20.0)),
            resolution: 10,
            rng_seed: Some(1),
            ..Default::default()
        }
    }

    fn idle_system() -> SimulationSystem {
        SimulationSystem::with_behaviors(config(), BehaviorSet::new()).expect("valid config")
    }

    #[test]
    fn test_rejects_zero_mass() {
        let mut c = config();
        c.agent.mass = 0.0;
        assert!(matches!(
            SimulationSystem::new(c),
            Err(ConfigError::NonPositiveMass(_))
        ));
    }

    #[test]
    fn test_rejects_bad_custom_weights() {
        let set = BehaviorSet::new().with(Behavior::Cohesion(SteeringParams::new(-1.0, 0.0)));
        assert!(SimulationSystem::with_behaviors(config(), set).is_err());
    }

    #[test]
    fn test_spawn_registers_in_index() {
        let mut s = idle_system();
        let h = s.spawn(Vec3::new(3.0, 0.0, -3.0));
        let coord = *s.agent(h).expect("alive").grid_coordinate();
        assert_eq!((coord.x(), coord.z()), (2, -1));
        assert!(s.index().bucket(&coord).is_some_and(|b| b.contains(h)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_destroy_then_stale_handle() {
        let mut s = idle_system();
        let h = s.spawn(Vec3::ZERO);
        assert!(s.destroy(h).is_ok());
        assert!(s.index().is_empty());
        assert_eq!(s.destroy(h).err(), Some(SimulationError::AgentNotFound(h)));
        assert_eq!(s.position(h).err(), Some(SimulationError::AgentNotFound(h)));
        assert!(s.query_nearest(h, None).is_err());
        assert!(s.query_within_radius(h, 4.0).is_err());
        assert!(s.teleport(h).is_err());
    }

    #[test]
    fn test_tick_returns_agents_to_idle() {
        let mut s = idle_system();
        let h = s.spawn(Vec3::ZERO);
        s.move_agent(h, Vec3::new(0.5, 0.0, 0.5)).expect("alive");
        s.advance_tick(0.1);
        assert_eq!(s.agent(h).expect("alive").phase(), TickPhase::Idle);
        assert_eq!(s.tick(), 1);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut s = idle_system();
        s.spawn(Vec3::ZERO);
        s.advance_tick(f32::NAN);
        s.advance_tick(-1.0);
        assert_eq!(s.tick(), 0);
    }

    #[test]
    fn test_aggregates_refresh_lazily_after_spawn() {
        let mut s = idle_system();
        assert!(s.flock_marker().is_none());
        s.spawn(Vec3::new(1.0, 0.0, 1.0));
        // membership changed; averages catch up on the next tick
        assert!(s.flock_marker().is_none());
        s.advance_tick(0.0);
        let marker = s.flock_marker().expect("one agent");
        assert_eq!(marker.position, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_destroyed_quarry_is_cleared() {
        let mut s = idle_system();
        let q = s.spawn(Vec3::ZERO);
        s.set_quarry(Some(q)).expect("alive");
        s.destroy(q).expect("alive");
        assert_eq!(s.quarry(), None);
        assert!(s.set_quarry(Some(q)).is_err());
    }

    #[test]
    fn test_spawn_with_context() {
        let mut s = idle_system();
        let handles = s.spawn_with(4, |ctx| ctx.on_ring(5.0));
        assert_eq!(handles.len(), 4);
        let first = s.position(handles[0]).expect("alive");
        assert!((first - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_configured_obstacles_are_built() {
        let mut c = config();
        c.obstacles = Some(crate::params::ObstacleConfig {
            count: 4,
            ..Default::default()
        });
        let s = SimulationSystem::new(c).expect("valid config");
        assert_eq!(s.obstacles().map(ObstacleField::len), Some(4));
    }
}
