//! Closed polyline paths for path-following agents.

use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One waypoint of a [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathNode {
    /// World-space position.
    pub position: Vec3,
}

impl PathNode {
    /// Node at `position`.
    pub const fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// Vector from `from` to `to`.
#[inline]
pub fn segment_delta(from: &PathNode, to: &PathNode) -> Vec3 {
    to.position - from.position
}

/// Whether `point` lies inside the XZ rectangle spanned by a segment's ends.
pub fn segment_rect_contains(a: &PathNode, b: &PathNode, point: Vec3) -> bool {
    let lo = a.position.min(b.position);
    let hi = a.position.max(b.position);
    point.x >= lo.x && point.x <= hi.x && point.z >= lo.z && point.z <= hi.z
}

/// Orthogonal projection of `point` onto the infinite line through `start` and `end`.
///
/// A degenerate segment projects everything onto `start`.
pub fn normal_point(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    let dir = (end - start).normalize_or_zero();
    start + dir * (point - start).dot(dir)
}

/// A cyclic sequence of nodes; the last node connects back to the first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Waypoints in travel order.
    pub nodes: Vec<PathNode>,
    /// Squared distance from the path at which agents count as "on path".
    pub radius_squared: f32,
}

impl Path {
    /// Build a path from raw positions.
    pub fn new(points: impl IntoIterator<Item = Vec3>, radius_squared: f32) -> Self {
        Self {
            nodes: points.into_iter().map(PathNode::new).collect(),
            radius_squared,
        }
    }

    /// Needs two nodes and a non-negative radius.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.len() < 2 {
            return Err(ConfigError::PathTooShort(self.nodes.len()));
        }
        if !(self.radius_squared.is_finite() && self.radius_squared >= 0.0) {
            return Err(ConfigError::NegativeLimit {
                name: "path.radius_squared",
                value: self.radius_squared,
            });
        }
        Ok(())
    }

    /// Number of nodes (and, since the path is closed, of segments).
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index after `i`, wrapping.
    #[inline]
    pub fn next_index(&self, i: usize) -> usize {
        (i + 1) % self.nodes.len()
    }

    /// Index before `i`, wrapping.
    #[inline]
    pub fn previous_index(&self, i: usize) -> usize {
        (i + self.nodes.len() - 1) % self.nodes.len()
    }

    /// Node `i` modulo the path length.
    #[inline]
    pub fn node(&self, i: usize) -> &PathNode {
        &self.nodes[i % self.nodes.len()]
    }
}
