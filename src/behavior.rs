//! Steering contributors and their composition.
//!
//! An agent's motion is the weighted sum of independent contributors, each a
//! [`Behavior`]. A [`BehaviorSet`] is assembled once per system, either from
//! an [`AgentKind`] preset or by hand:
//!
//! ```ignore
//! let behaviors = BehaviorSet::planar()
//!     .with(Behavior::Seek(SteeringParams::new(2.0, 36.0)))
//!     .with(Behavior::Separation(SteeringParams::new(3.0, 4.0)))
//!     .with(Behavior::Bounding(SteeringParams::new(4.0, 0.0)));
//!
//! let system = SimulationSystem::with_behaviors(config, behaviors)?;
//! ```
//!
//! Contributors read the world through [`Surroundings`], a snapshot taken
//! before any agent of the tick integrates, so the result never depends on
//! agent iteration order.

use crate::agent::{Agent, WanderState};
use crate::aggregate::CellAggregates;
use crate::bounds::BoundingVolume;
use crate::obstacle::ObstacleField;
use crate::params::{AgentConfig, AgentKind, BehaviorParams, ResistanceArea, SteeringParams};
use crate::path::Path;
use crate::spatial::SpatialIndex;
use crate::steering::{self, Kinematics, MovingTarget};
use crate::system::AgentHandle;
use glam::Vec3;
use rand::rngs::SmallRng;
use slotmap::SlotMap;
use std::fmt;
use std::sync::Arc;

/// Ring levels searched for the most threatening obstacle.
const OBSTACLE_SEARCH_LEVELS: u32 = 2;

/// Read-only view of the world for one agent during force accumulation.
pub struct Surroundings<'a> {
    /// The agent being steered.
    pub handle: AgentHandle,
    /// Every agent, as of the start of the tick.
    pub agents: &'a SlotMap<AgentHandle, Agent>,
    /// Agent positions by cell.
    pub index: &'a SpatialIndex<AgentHandle>,
    /// Per-cell averages from the last refresh.
    pub aggregates: &'a CellAggregates,
    /// Obstacles to avoid, if the system has any.
    pub obstacles: Option<&'a ObstacleField>,
    /// The area agents are kept inside.
    pub bounds: &'a BoundingVolume,
    /// Path to follow, if any.
    pub path: Option<&'a Path>,
    /// Point to seek or flee.
    pub seek_target: Option<Vec3>,
    /// Agent to pursue or evade. Never the steered agent itself.
    pub quarry: Option<MovingTarget>,
    /// Drag regions.
    pub resistance_areas: &'a [ResistanceArea],
    /// Limits shared by all agents.
    pub agent_config: &'a AgentConfig,
    /// Arrival radius squared for cohesion, wander, pursuit, and path leads.
    pub arrival_threshold_squared: f32,
}

impl Surroundings<'_> {
    /// Positions of the neighbors within `radius_squared` of the steered agent.
    pub fn neighbors_within(&self, radius_squared: f32) -> Vec<Vec3> {
        let Some(probe) = self.index.probe(self.handle) else {
            return Vec::new();
        };
        self.index
            .find_within_radius(&probe, radius_squared)
            .into_iter()
            .filter_map(|k| self.index.position(k))
            .collect()
    }
}

/// Per-agent mutable state threaded through one force computation.
pub struct SteeringState<'r> {
    /// Wander angles; written back to the agent after the force pass.
    pub wander: WanderState,
    /// Point predicted by pursuit or evasion this tick.
    pub predicted_position: Option<Vec3>,
    /// System RNG.
    pub rng: &'r mut SmallRng,
}

impl<'r> SteeringState<'r> {
    /// Fresh state for one agent's force pass.
    pub fn new(wander: WanderState, rng: &'r mut SmallRng) -> Self {
        Self {
            wander,
            predicted_position: None,
            rng,
        }
    }
}

/// Anything that turns an agent's situation into an unweighted steering force.
///
/// Implement this for behaviors the built-in [`Behavior`] variants do not cover
/// and add them with [`Behavior::Custom`].
pub trait SteeringContributor: Send + Sync + fmt::Debug {
    /// Raw force for `agent`; weighting and clamping happen in the caller.
    fn steering_force(
        &self,
        agent: &Agent,
        kinematics: &Kinematics,
        world: &Surroundings<'_>,
        state: &mut SteeringState<'_>,
    ) -> Vec3;
}

/// Built-in steering contributors.
///
/// Every variant carries the [`SteeringParams`] whose `force_scale` weights
/// its force. The meaning of `threshold_squared` varies per variant and is
/// noted below.
#[derive(Clone, Debug)]
pub enum Behavior {
    /// Seek the system's seek target.
    ///
    /// Zero while no target is set. `threshold_squared` is the arrival radius
    /// squared: inside it the desired speed eases toward zero.
    ///
    /// # Example
    ///
    /// ```ignore
    /// system.set_seek_target(Some(Vec3::new(10.0, 0.0, 0.0)));
    /// Behavior::Seek(SteeringParams::new(2.0, 36.0))
    /// ```
    Seek(SteeringParams),

    /// Flee the system's seek target.
    Flee(SteeringParams),

    /// Planar wander. `threshold_squared` is the projection distance of the
    /// wander circle.
    Wander(SteeringParams),

    /// Wander on a sphere, jittering around both X and Y.
    Wander3D(SteeringParams),

    /// Move away from close neighbors.
    ///
    /// `threshold_squared` is the neighbor search radius squared.
    ///
    /// # Example
    ///
    /// ```ignore
    /// Behavior::Separation(SteeringParams::new(3.0, 4.0))  // neighbors within 2 units
    /// ```
    Separation(SteeringParams),

    /// Match the average velocity of the agent's cell.
    Alignment(SteeringParams),

    /// Seek the average position of the agent's cell.
    Cohesion(SteeringParams),

    /// Push back inside the system bounds on X and Z.
    Bounding(SteeringParams),

    /// Push back inside the system bounds on all three axes.
    Bounding3D(SteeringParams),

    /// Sidestep the nearest obstacle.
    ///
    /// `threshold_squared` is the obstacle search radius squared; the search
    /// covers rings 0 to 2 around the agent's cell.
    ObstacleAvoidance(SteeringParams),

    /// Seek where the quarry will be.
    Pursue(SteeringParams),

    /// Flee where the quarry will be.
    Evade(SteeringParams),

    /// Stay on the system path.
    ///
    /// `threshold_squared` is how far ahead along the nearest segment to aim
    /// when the agent has drifted off.
    PathFollow(SteeringParams),

    /// Drag inside resistance areas: `-velocity * drag_coefficient` per area
    /// containing the agent. No preset includes it; add it by hand.
    Resistance(SteeringParams),

    /// User-supplied contributor.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Debug)]
    /// struct Updraft(f32);
    ///
    /// impl SteeringContributor for Updraft {
    ///     fn steering_force(&self, _: &Agent, _: &Kinematics, _: &Surroundings, _: &mut SteeringState) -> Vec3 {
    ///         Vec3::Y * self.0
    ///     }
    /// }
    ///
    /// Behavior::Custom(SteeringParams::new(1.0, 0.0), Arc::new(Updraft(2.0)))
    /// ```
    Custom(SteeringParams, Arc<dyn SteeringContributor>),
}

impl Behavior {
    /// Weight and threshold of this behavior.
    pub fn params(&self) -> &SteeringParams {
        match self {
            Behavior::Seek(p)
            | Behavior::Flee(p)
            | Behavior::Wander(p)
            | Behavior::Wander3D(p)
            | Behavior::Separation(p)
            | Behavior::Alignment(p)
            | Behavior::Cohesion(p)
            | Behavior::Bounding(p)
            | Behavior::Bounding3D(p)
            | Behavior::ObstacleAvoidance(p)
            | Behavior::Pursue(p)
            | Behavior::Evade(p)
            | Behavior::PathFollow(p)
            | Behavior::Resistance(p)
            | Behavior::Custom(p, _) => p,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Seek(_) => "seek",
            Behavior::Flee(_) => "flee",
            Behavior::Wander(_) => "wander",
            Behavior::Wander3D(_) => "wander_3d",
            Behavior::Separation(_) => "separation",
            Behavior::Alignment(_) => "alignment",
            Behavior::Cohesion(_) => "cohesion",
            Behavior::Bounding(_) => "bounding",
            Behavior::Bounding3D(_) => "bounding_3d",
            Behavior::ObstacleAvoidance(_) => "obstacle_avoidance",
            Behavior::Pursue(_) => "pursue",
            Behavior::Evade(_) => "evade",
            Behavior::PathFollow(_) => "path_follow",
            Behavior::Resistance(_) => "resistance",
            Behavior::Custom(..) => "custom",
        }
    }
}

impl SteeringContributor for Behavior {
    fn steering_force(
        &self,
        agent: &Agent,
        k: &Kinematics,
        world: &Surroundings<'_>,
        state: &mut SteeringState<'_>,
    ) -> Vec3 {
        let config = world.agent_config;
        match self {
            Behavior::Seek(p) => world.seek_target.map_or(Vec3::ZERO, |target| {
                let k = Kinematics {
                    arrival_threshold_squared: p.threshold_squared,
                    ..*k
                };
                steering::seek(&k, target)
            }),

            Behavior::Flee(_) => world
                .seek_target
                .map_or(Vec3::ZERO, |target| steering::flee(k, target)),

            Behavior::Wander(p) => steering::wander(
                k,
                &mut state.wander.angle,
                config.wander_range,
                p.threshold_squared,
                &mut *state.rng,
            ),

            Behavior::Wander3D(p) => steering::wander_3d(
                k,
                &mut state.wander.angles,
                config.wander_range,
                p.threshold_squared,
                &mut *state.rng,
            ),

            Behavior::Separation(p) => {
                steering::separate(k, world.neighbors_within(p.threshold_squared))
            }

            Behavior::Alignment(_) => {
                steering::align(k, world.aggregates.average_velocity(agent.grid_coordinate()))
            }

            Behavior::Cohesion(_) => {
                steering::cohere(k, world.aggregates.average_position(agent.grid_coordinate()))
            }

            Behavior::Bounding(_) => steering::bounding_force(k, world.bounds),

            Behavior::Bounding3D(_) => steering::bounding_force_3d(k, world.bounds),

            Behavior::ObstacleAvoidance(p) => {
                let Some(field) = world.obstacles else {
                    return Vec3::ZERO;
                };
                let Some((_, obstacle)) =
                    field.nearest(k.position, p.threshold_squared, Some(OBSTACLE_SEARCH_LEVELS))
                else {
                    return Vec3::ZERO;
                };
                let combined_radius =
                    agent.collider().average_xz_length() + obstacle.average_xz_length();
                steering::avoid_obstacle(k, obstacle.center, combined_radius)
            }

            Behavior::Pursue(_) => {
                let Some(quarry) = world.quarry else {
                    return Vec3::ZERO;
                };
                let (force, predicted) =
                    steering::pursue(k, &quarry, config.max_prediction_time_squared);
                state.predicted_position = Some(predicted);
                force
            }

            Behavior::Evade(_) => {
                let Some(quarry) = world.quarry else {
                    return Vec3::ZERO;
                };
                let (force, predicted) =
                    steering::evade(k, &quarry, config.max_prediction_time_squared);
                state.predicted_position = Some(predicted);
                force
            }

            Behavior::PathFollow(p) => {
                let Some(path) = world.path else {
                    return Vec3::ZERO;
                };
                let future = k.position + k.velocity * config.future_lookup_time;
                steering::follow_path(k, path, future, p.threshold_squared)
            }

            Behavior::Resistance(_) => world
                .resistance_areas
                .iter()
                .filter(|area| area.volume.contains(k.position))
                .map(|area| -k.velocity * area.drag_coefficient)
                .sum(),

            Behavior::Custom(_, contributor) => contributor.steering_force(agent, k, world, state),
        }
    }
}

/// The contributors acting on every agent of a system.
#[derive(Clone, Debug, Default)]
pub struct BehaviorSet {
    behaviors: Vec<Behavior>,
    planar: bool,
}

impl BehaviorSet {
    /// Empty set whose forces keep their Y component.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty set whose composed force has Y zeroed.
    pub fn planar() -> Self {
        Self {
            behaviors: Vec::new(),
            planar: true,
        }
    }

    /// Preset contributors for `kind`, weighted by `params`.
    pub fn for_kind(kind: AgentKind, params: &BehaviorParams) -> Self {
        use Behavior::*;
        match kind {
            AgentKind::Flocker => Self::planar()
                .with(Seek(params.seeking))
                .with(ObstacleAvoidance(params.avoiding))
                .with(Separation(params.separation))
                .with(Alignment(params.alignment))
                .with(Cohesion(params.cohesion))
                .with(Bounding(params.bounding)),
            AgentKind::PathFollower => Self::planar()
                .with(PathFollow(params.path_follow))
                .with(Separation(params.separation))
                .with(Bounding(params.bounding)),
            AgentKind::Wanderer => Self::planar()
                .with(Wander(params.wandering))
                .with(Bounding(params.bounding)),
            AgentKind::Drifter => Self::new()
                .with(ObstacleAvoidance(params.avoiding))
                .with(Wander3D(params.wandering))
                .with(Bounding3D(params.bounding)),
            AgentKind::Hunter => Self::planar()
                .with(Pursue(params.pursuit))
                .with(ObstacleAvoidance(params.avoiding))
                .with(Bounding(params.bounding)),
            AgentKind::Prey => Self::planar()
                .with(Evade(params.evasion))
                .with(ObstacleAvoidance(params.avoiding))
                .with(Bounding(params.bounding)),
        }
    }

    /// Add a contributor.
    pub fn with(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Add a contributor in place.
    pub fn push(&mut self, behavior: Behavior) {
        self.behaviors.push(behavior);
    }

    /// Whether composed forces have Y zeroed.
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.planar
    }

    /// Zero (or keep) the Y component of composed forces.
    pub fn set_planar(&mut self, planar: bool) {
        self.planar = planar;
    }

    /// Contributors in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Behavior> + '_ {
        self.behaviors.iter()
    }

    /// Number of contributors.
    #[inline]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Whether the set has no contributors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Weighted sum of every contributor, Y zeroed when planar, clamped to
    /// the agent's `max_force`.
    pub fn compose(&self, agent: &Agent, world: &Surroundings<'_>, state: &mut SteeringState<'_>) -> Vec3 {
        let k = agent.kinematics(world.arrival_threshold_squared);

        let mut total = Vec3::ZERO;
        for behavior in &self.behaviors {
            let force = behavior.steering_force(agent, &k, world, state);
            if !force.is_finite() {
                tracing::warn!(behavior = behavior.name(), "discarded non-finite steering force");
                continue;
            }
            total += force * behavior.params().force_scale;
        }

        if self.planar {
            total.y = 0.0;
        }
        total.clamp_length_max(agent.max_force())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SystemConfig;
    use crate::spatial::GridSpec;
    use crate::spawn::seeded_rng;

    const EPS: f32 = 1e-5;

    struct World {
        config: SystemConfig,
        agents: SlotMap<AgentHandle, Agent>,
        index: SpatialIndex<AgentHandle>,
        aggregates: CellAggregates,
    }

    impl World {
        fn new() -> Self {
            let config = SystemConfig {
                bounds: BoundingVolume::new(Vec3::ZERO, Vec3::new(20.0, 1.0, 20.0)),
                resolution: 10,
                ..Default::default()
            };
            let index = SpatialIndex::new(GridSpec::for_bounds(&config.bounds, config.resolution));
            Self {
                config,
                agents: SlotMap::with_key(),
                index,
                aggregates: CellAggregates::new(),
            }
        }

        fn add(&mut self, position: Vec3, velocity: Vec3) -> AgentHandle {
            let coord = self.index.coordinate_of(position);
            let agent = Agent::new(position, &self.config.agent, coord).with_velocity(velocity);
            let collider = *agent.collider();
            let handle = self.agents.insert(agent);
            self.index.register(coord, handle, position, collider);
            handle
        }

        fn surroundings(&self, handle: AgentHandle) -> Surroundings<'_> {
            Surroundings {
                handle,
                agents: &self.agents,
                index: &self.index,
                aggregates: &self.aggregates,
                obstacles: None,
                bounds: &self.config.bounds,
                path: self.config.path.as_ref(),
                seek_target: None,
                quarry: None,
                resistance_areas: &self.config.resistance_areas,
                agent_config: &self.config.agent,
                arrival_threshold_squared: 36.0,
            }
        }
    }

    #[derive(Debug)]
    struct Updraft(f32);

    impl SteeringContributor for Updraft {
        fn steering_force(
            &self,
            _: &Agent,
            _: &Kinematics,
            _: &Surroundings<'_>,
            _: &mut SteeringState<'_>,
        ) -> Vec3 {
            Vec3::Y * self.0
        }
    }

    #[test]
    fn test_presets() {
        let params = BehaviorParams::default();
        let flocker = BehaviorSet::for_kind(AgentKind::Flocker, &params);
        let names: Vec<_> = flocker.iter().map(Behavior::name).collect();
        assert_eq!(
            names,
            [
                "seek",
                "obstacle_avoidance",
                "separation",
                "alignment",
                "cohesion",
                "bounding"
            ]
        );
        assert!(flocker.is_planar());
        assert!(!BehaviorSet::for_kind(AgentKind::Drifter, &params).is_planar());
    }

    #[test]
    fn test_presets_leave_resistance_opt_in() {
        let params = BehaviorParams::default();
        let kinds = [
            AgentKind::Flocker,
            AgentKind::PathFollower,
            AgentKind::Wanderer,
            AgentKind::Drifter,
            AgentKind::Hunter,
            AgentKind::Prey,
        ];
        for kind in kinds {
            let set = BehaviorSet::for_kind(kind, &params);
            assert!(
                set.iter().all(|b| !matches!(b, Behavior::Resistance(_))),
                "{kind:?} preset should not drag"
            );
        }
        let path_follower = BehaviorSet::for_kind(AgentKind::PathFollower, &params);
        let names: Vec<_> = path_follower.iter().map(Behavior::name).collect();
        assert_eq!(names, ["path_follow", "separation", "bounding"]);
    }

    #[test]
    fn test_seek_without_target_is_zero() {
        let mut w = World::new();
        let h = w.add(Vec3::ZERO, Vec3::ZERO);
        let set = BehaviorSet::new().with(Behavior::Seek(SteeringParams::new(1.0, 36.0)));
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);
        let world = w.surroundings(h);
        assert_eq!(set.compose(&w.agents[h], &world, &mut state), Vec3::ZERO);
    }

    #[test]
    fn test_weights_and_clamp() {
        let mut w = World::new();
        w.config.agent.max_steering_speed = 1.0;
        let h = w.add(Vec3::ZERO, Vec3::ZERO);
        let set = BehaviorSet::new().with(Behavior::Seek(SteeringParams::new(2.0, 0.0)));
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);

        let mut world = w.surroundings(h);
        world.seek_target = Some(Vec3::new(8.0, 0.0, 0.0));
        world.arrival_threshold_squared = 0.0;
        let force = set.compose(&w.agents[h], &world, &mut state);
        assert!((force - Vec3::new(2.0, 0.0, 0.0)).length() < EPS);

        let heavy = BehaviorSet::new().with(Behavior::Seek(SteeringParams::new(100.0, 0.0)));
        let force = heavy.compose(&w.agents[h], &world, &mut state);
        assert!((force.length() - w.config.agent.max_force).abs() < EPS);
    }

    #[test]
    fn test_seek_eases_with_its_own_threshold() {
        let mut w = World::new();
        w.config.agent.max_steering_speed = 1.0;
        let h = w.add(Vec3::ZERO, Vec3::ZERO);
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);

        let mut world = w.surroundings(h);
        world.seek_target = Some(Vec3::new(3.0, 0.0, 0.0));
        world.arrival_threshold_squared = 36.0;
        let k = w.agents[h].kinematics(world.arrival_threshold_squared);

        let sharp = Behavior::Seek(SteeringParams::new(1.0, 0.0));
        let force = sharp.steering_force(&w.agents[h], &k, &world, &mut state);
        assert!((force - Vec3::new(1.0, 0.0, 0.0)).length() < EPS);

        // d² = 9 of 36: a quarter of full speed
        let eased = Behavior::Seek(SteeringParams::new(1.0, 36.0));
        let force = eased.steering_force(&w.agents[h], &k, &world, &mut state);
        assert!((force - Vec3::new(0.25, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_planar_zeroes_y() {
        let mut w = World::new();
        let h = w.add(Vec3::ZERO, Vec3::ZERO);
        let custom = Behavior::Custom(SteeringParams::new(1.0, 0.0), Arc::new(Updraft(2.0)));
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);
        let world = w.surroundings(h);

        let free = BehaviorSet::new().with(custom.clone());
        assert!((free.compose(&w.agents[h], &world, &mut state) - Vec3::new(0.0, 2.0, 0.0)).length() < EPS);

        let planar = BehaviorSet::planar().with(custom);
        assert_eq!(planar.compose(&w.agents[h], &world, &mut state), Vec3::ZERO);
    }

    #[test]
    fn test_separation_reads_index() {
        let mut w = World::new();
        w.config.agent.max_steering_speed = 5.0;
        let me = w.add(Vec3::new(0.5, 0.0, 0.5), Vec3::ZERO);
        w.add(Vec3::new(1.5, 0.0, 0.5), Vec3::ZERO);

        let behavior = Behavior::Separation(SteeringParams::new(1.0, 4.0));
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);
        let world = w.surroundings(me);
        let k = w.agents[me].kinematics(36.0);
        let force = behavior.steering_force(&w.agents[me], &k, &world, &mut state);
        assert!((force - Vec3::new(-5.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_pursue_records_prediction() {
        let mut w = World::new();
        let me = w.add(Vec3::ZERO, Vec3::ZERO);
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);

        let mut world = w.surroundings(me);
        world.quarry = Some(MovingTarget {
            position: Vec3::new(2.0, 0.0, 0.0),
            velocity: Vec3::new(0.0, 0.0, 1.0),
        });
        let k = w.agents[me].kinematics(0.0);
        let force = Behavior::Pursue(SteeringParams::default()).steering_force(&w.agents[me], &k, &world, &mut state);
        // d² = 4, steering speed 1 -> t² = 4 capped at 9 -> t = 2
        assert_eq!(state.predicted_position, Some(Vec3::new(2.0, 0.0, 2.0)));
        assert!(force.x > 0.0 && force.z > 0.0);
    }

    #[test]
    fn test_wander_updates_state_only() {
        let mut w = World::new();
        let me = w.add(Vec3::ZERO, Vec3::ZERO);
        let mut rng = seeded_rng(Some(9));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);
        let world = w.surroundings(me);
        let set = BehaviorSet::planar().with(Behavior::Wander(SteeringParams::default()));
        for _ in 0..5 {
            set.compose(&w.agents[me], &world, &mut state);
        }
        assert!(state.wander.angle != 0.0);
        assert_eq!(w.agents[me].wander(), WanderState::default());
    }

    #[test]
    fn test_resistance_inside_area_only() {
        let mut w = World::new();
        w.config.resistance_areas.push(ResistanceArea {
            volume: BoundingVolume::new(Vec3::ZERO, Vec3::new(4.0, 4.0, 4.0)),
            drag_coefficient: 0.5,
        });
        let inside = w.add(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        let outside = w.add(Vec3::new(8.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let behavior = Behavior::Resistance(SteeringParams::new(1.0, 0.0));
        let mut rng = seeded_rng(Some(1));
        let mut state = SteeringState::new(WanderState::default(), &mut rng);

        let k = w.agents[inside].kinematics(36.0);
        let world = w.surroundings(inside);
        let force = behavior.steering_force(&w.agents[inside], &k, &world, &mut state);
        assert!((force - Vec3::new(-1.0, 0.0, 0.0)).length() < EPS);

        let k = w.agents[outside].kinematics(36.0);
        let world = w.surroundings(outside);
        assert_eq!(behavior.steering_force(&w.agents[outside], &k, &world, &mut state), Vec3::ZERO);
    }
}
