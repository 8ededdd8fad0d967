//! Steering force library.
//!
//! Every function here is a pure function of an agent's [`Kinematics`] and
//! some target data, returning a *velocity delta*: `desired_velocity - velocity`.
//! Forces are neither weighted, mass-scaled, nor clamped here; the caller sums
//! `force * params.force_scale` over its behaviors and clamps the total to
//! `max_force`.
//!
//! Degenerate geometry (coincident points, empty neighbor sets, zero averages)
//! yields `Vec3::ZERO` rather than NaN.
//!
//! # Behaviors
//!
//! | Function | Desired velocity |
//! |----------|------------------|
//! | [`seek`] | toward target at steering speed, easing inside the arrival threshold |
//! | [`flee`] | away from target at steering speed |
//! | [`wander`] / [`wander_3d`] | seek a jittering point projected ahead |
//! | [`separate`] | away from the inverse-square-weighted neighbors |
//! | [`align`] | the neighbors' average velocity |
//! | [`cohere`] | seek the neighbors' average position |
//! | [`bounding_force`] / [`bounding_force_3d`] | back inside the box on violated axes |
//! | [`avoid`] / [`avoid_obstacle`] | sideways away from an obstacle ahead |
//! | [`pursue`] / [`evade`] | seek / flee a target's predicted position |
//! | [`follow_path`] | back onto the nearest path segment |

use crate::bounds::BoundingVolume;
use crate::path::{normal_point, segment_delta, segment_rect_contains, Path};
use glam::{Vec2, Vec3};
use rand::Rng;

/// The slice of an agent's state steering needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    /// World position.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Unit heading on the XZ plane.
    pub forward: Vec3,
    /// Unit vector to the right of `forward` on the XZ plane.
    pub right: Vec3,
    /// Velocity cap after integration.
    pub max_speed: f32,
    /// Desired speed used by every behavior.
    pub max_steering_speed: f32,
    /// Squared distance inside which [`seek`] starts slowing down.
    pub arrival_threshold_squared: f32,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            forward: Vec3::Z,
            right: Vec3::X,
            max_speed: 10.0,
            max_steering_speed: 1.0,
            arrival_threshold_squared: 36.0,
        }
    }
}

/// Position and velocity of something being chased or fled from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovingTarget {
    /// World position.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
}

/// Force that turns the current velocity into `desired`.
#[inline]
pub fn steer(k: &Kinematics, desired: Vec3) -> Vec3 {
    desired - k.velocity
}

/// Linear remap of `value` from `[in_start, in_stop]` to `[out_start, out_stop]`.
#[inline]
pub fn remap(value: f32, in_start: f32, in_stop: f32, out_start: f32, out_stop: f32) -> f32 {
    out_start + (out_stop - out_start) * ((value - in_start) / (in_stop - in_start))
}

/// Desired speed at `distance_squared` from a seek target.
///
/// Full steering speed at or beyond the threshold; inside it the speed falls
/// linearly with the squared distance, reaching zero on the target.
pub fn arrival_speed(k: &Kinematics, distance_squared: f32) -> f32 {
    let threshold = k.arrival_threshold_squared;
    if threshold > distance_squared {
        remap(distance_squared, 0.0, threshold, 0.0, k.max_steering_speed)
    } else {
        k.max_steering_speed
    }
}

/// Steer toward `target`, easing in near it.
pub fn seek(k: &Kinematics, target: Vec3) -> Vec3 {
    let diff = target - k.position;
    let distance_squared = diff.length_squared();
    if distance_squared <= f32::EPSILON {
        return Vec3::ZERO;
    }
    let desired = diff.normalize() * arrival_speed(k, distance_squared);
    steer(k, desired)
}

/// Steer directly away from `target` at full steering speed.
pub fn flee(k: &Kinematics, target: Vec3) -> Vec3 {
    let diff = k.position - target;
    if diff.length_squared() <= f32::EPSILON {
        return Vec3::ZERO;
    }
    steer(k, diff.normalize() * k.max_steering_speed)
}

/// Unit vector at `angle` around the Y axis, in the XZ plane.
#[inline]
pub fn unit_rotation_y(angle: f32) -> Vec3 {
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Unit vector at `angle` around the X axis, in the YZ plane.
#[inline]
pub fn unit_rotation_x(angle: f32) -> Vec3 {
    Vec3::new(0.0, angle.cos(), angle.sin())
}

/// Planar wander.
///
/// Advances `angle` by a uniform step in `[-range, range]`, then seeks a point
/// `distance` ahead along `forward + unit_rotation_y(angle)`.
pub fn wander<R: Rng + ?Sized>(
    k: &Kinematics,
    angle: &mut f32,
    range: f32,
    distance: f32,
    rng: &mut R,
) -> Vec3 {
    *angle += rng.gen_range(-1.0f32..=1.0) * range;
    let circle = k.forward + unit_rotation_y(*angle);
    seek(k, k.position + circle * distance)
}

/// Wander on a sphere: both angles jitter independently.
///
/// `angles.x` drives the rotation around X, `angles.y` the rotation around Y.
pub fn wander_3d<R: Rng + ?Sized>(
    k: &Kinematics,
    angles: &mut Vec2,
    range: f32,
    distance: f32,
    rng: &mut R,
) -> Vec3 {
    let jitter = Vec2::new(rng.gen_range(-1.0f32..=1.0), rng.gen_range(-1.0f32..=1.0));
    *angles += jitter * range;
    let sphere = k.forward + unit_rotation_y(angles.y) + unit_rotation_x(angles.x);
    seek(k, k.position + sphere * distance)
}

/// Steer away from neighbors, weighting each by the inverse square of its distance.
pub fn separate<I>(k: &Kinematics, neighbors: I) -> Vec3
where
    I: IntoIterator<Item = Vec3>,
{
    let mut sum = Vec3::ZERO;
    let mut count = 0usize;
    for neighbor in neighbors {
        let diff = k.position - neighbor;
        let d2 = diff.length_squared();
        if d2 <= f32::EPSILON {
            continue;
        }
        sum += diff / d2;
        count += 1;
    }
    if count == 0 {
        return Vec3::ZERO;
    }

    let dir = (sum / count as f32).normalize_or_zero();
    if dir == Vec3::ZERO {
        return Vec3::ZERO;
    }
    steer(k, dir * k.max_steering_speed)
}

/// Match the neighbors' average velocity. A zero average means "no data".
pub fn align(k: &Kinematics, average_velocity: Vec3) -> Vec3 {
    if average_velocity == Vec3::ZERO {
        return Vec3::ZERO;
    }
    steer(k, average_velocity)
}

/// Seek the neighbors' average position. A zero average means "no data".
pub fn cohere(k: &Kinematics, average_position: Vec3) -> Vec3 {
    if average_position == Vec3::ZERO {
        return Vec3::ZERO;
    }
    seek(k, average_position)
}

/// Push back inside `bounds` on the X and Z axes.
///
/// A violated axis gets `∓max_steering_speed` as its desired component; the
/// other planar axis keeps its current velocity and Y is zero. Returns zero
/// while the agent is inside.
pub fn bounding_force(k: &Kinematics, bounds: &BoundingVolume) -> Vec3 {
    let (min, max) = (bounds.min_bound(), bounds.max_bound());
    let s = k.max_steering_speed;
    let p = k.position;

    let mut desired = Vec3::new(k.velocity.x, 0.0, k.velocity.z);
    let mut violated = false;

    if p.x > max.x {
        desired.x = -s;
        violated = true;
    } else if p.x < min.x {
        desired.x = s;
        violated = true;
    }

    if p.z > max.z {
        desired.z = -s;
        violated = true;
    } else if p.z < min.z {
        desired.z = s;
        violated = true;
    }

    if !violated {
        return Vec3::ZERO;
    }
    steer(k, desired)
}

/// [`bounding_force`] with the Y axis checked as well.
pub fn bounding_force_3d(k: &Kinematics, bounds: &BoundingVolume) -> Vec3 {
    let (min, max) = (bounds.min_bound(), bounds.max_bound());
    let s = k.max_steering_speed;

    let mut desired = k.velocity;
    let mut violated = false;

    for axis in 0..3 {
        let p = k.position[axis];
        if p > max[axis] {
            desired[axis] = -s;
            violated = true;
        } else if p < min[axis] {
            desired[axis] = s;
            violated = true;
        }
    }

    if !violated {
        return Vec3::ZERO;
    }
    steer(k, desired)
}

/// Sidestep an obstacle at offset `obstacle_direction` from the agent.
///
/// Obstacles behind the agent or farther than `combined_radius` to either
/// side are ignored. Otherwise the agent turns away from the side the
/// obstacle is on, at full steering speed.
pub fn avoid(k: &Kinematics, obstacle_direction: Vec3, combined_radius: f32) -> Vec3 {
    let forward_projection = obstacle_direction.dot(k.forward);
    if forward_projection < 0.0 {
        return Vec3::ZERO;
    }

    let right_projection = obstacle_direction.dot(k.right);
    if right_projection.abs() > combined_radius {
        return Vec3::ZERO;
    }

    // obstacle on the right: turn left, and vice versa
    let direction = if right_projection > 0.0 { -k.right } else { k.right };
    steer(k, direction.normalize_or_zero() * k.max_steering_speed)
}

/// Obstacle avoidance from three vantage points.
///
/// Sums [`avoid`] for the obstacle's current offset, for the offset seen from
/// a point projected ahead by `|v|² / max_speed²` along `forward`, and from
/// halfway to that point. The overlapping samples keep the agent from
/// flickering between sides near the obstacle's edge.
pub fn avoid_obstacle(k: &Kinematics, obstacle_position: Vec3, combined_radius: f32) -> Vec3 {
    let front = obstacle_position - k.position;

    let max_speed_squared = k.max_speed * k.max_speed;
    let lookahead = if max_speed_squared > 0.0 {
        k.velocity.length_squared() / max_speed_squared
    } else {
        0.0
    };
    let future_offset = k.forward * lookahead;
    let half_future_offset = future_offset * 0.5;

    avoid(k, front, combined_radius)
        + avoid(k, front - future_offset, combined_radius)
        + avoid(k, front - half_future_offset, combined_radius)
}

/// Where `target` will be once the agent could close the gap.
///
/// The horizon is `sqrt(min(d² / max_steering_speed², max_prediction_time_squared))`,
/// so it shrinks as the agent gets closer and never exceeds the cap.
pub fn predict_position(k: &Kinematics, target: &MovingTarget, max_prediction_time_squared: f32) -> Vec3 {
    let distance_squared = (target.position - k.position).length_squared();
    let speed_squared = k.max_steering_speed * k.max_steering_speed;
    let time_squared = if speed_squared > 0.0 {
        (distance_squared / speed_squared).min(max_prediction_time_squared)
    } else {
        max_prediction_time_squared
    };
    target.position + target.velocity * time_squared.max(0.0).sqrt()
}

/// Seek the target's predicted position.
///
/// Returns the force and the predicted point, which callers may expose for display.
pub fn pursue(k: &Kinematics, target: &MovingTarget, max_prediction_time_squared: f32) -> (Vec3, Vec3) {
    let predicted = predict_position(k, target, max_prediction_time_squared);
    (seek(k, predicted), predicted)
}

/// Flee the target's predicted position.
///
/// Returns the force and the predicted point.
pub fn evade(k: &Kinematics, target: &MovingTarget, max_prediction_time_squared: f32) -> (Vec3, Vec3) {
    let predicted = predict_position(k, target, max_prediction_time_squared);
    (flee(k, predicted), predicted)
}

/// Steer back onto `path` when the agent's projected position drifts off it.
///
/// `future_position` is projected onto every segment. A projection that falls
/// outside the segment's XZ rectangle snaps to the segment's end node, and the
/// direction is taken from the following segment instead. The segment closest
/// to `future_position` wins; when even that one is farther than
/// `path.radius_squared`, the agent seeks a point `lead_distance` ahead of the
/// projection along the segment. Otherwise the agent is on the path and the
/// force is zero.
pub fn follow_path(k: &Kinematics, path: &Path, future_position: Vec3, lead_distance: f32) -> Vec3 {
    if path.len() < 2 {
        return Vec3::ZERO;
    }

    let mut min_distance_squared = f32::MAX;
    let mut target = Vec3::ZERO;

    for i in 0..path.len() {
        let mut a = path.node(i);
        let mut b = path.node(i + 1);
        let mut normal = normal_point(future_position, a.position, b.position);

        if !segment_rect_contains(a, b, normal) {
            normal = b.position;
            a = b;
            b = path.node(i + 2);
        }

        let distance_squared = (future_position - normal).length_squared();
        if distance_squared < min_distance_squared {
            min_distance_squared = distance_squared;
            target = normal + segment_delta(a, b).normalize_or_zero() * lead_distance;
        }
    }

    if min_distance_squared <= path.radius_squared {
        return Vec3::ZERO;
    }
    seek(k, target)
}
