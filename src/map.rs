// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::search::{
    solve, Estimator, SearchOptions, ShortestPathProblem, WaypointsProblem, MAX_WAYPOINTS,
};
use crate::{Graph, LandmarkIndex, LandmarkOptions, LandmarkRecord, PathResult, RouteError};

/// Where a route should end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goal {
    /// A specific node
    Node(i64),

    /// Any node with the given `key=value` tag
    Tag(String),

    /// The node to which a named landmark is bound
    Landmark(String),
}

/// A location which a route must visit before reaching its [Goal].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Waypoint {
    /// A specific node
    Node(i64),

    /// Any node with the given `key=value` tag
    Tag(String),

    /// The node to which a named landmark is bound
    Landmark(String),
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Node(i64),
    Tag(&'a str),
    Landmark(&'a str),
}

impl Goal {
    fn target(&self) -> Target<'_> {
        match self {
            Self::Node(id) => Target::Node(*id),
            Self::Tag(tag) => Target::Tag(tag),
            Self::Landmark(name) => Target::Landmark(name),
        }
    }
}

impl Waypoint {
    fn target(&self) -> Target<'_> {
        match self {
            Self::Node(id) => Target::Node(*id),
            Self::Tag(tag) => Target::Tag(tag),
            Self::Landmark(name) => Target::Landmark(name),
        }
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "label={}", id),
            Self::Tag(tag) => f.write_str(tag),
            Self::Landmark(name) => write!(f, "landmark={}", name),
        }
    }
}

/// Formats the goal as the tag matched by its nodes.
impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.target(), f)
    }
}

/// Formats the waypoint as the tag matched by its nodes.
impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.target(), f)
    }
}

/// A [Graph] together with the [LandmarkIndex] built over it;
/// the read-only context for route queries.
///
/// All queries take `&self`. A single map can be shared between threads,
/// with independent queries running concurrently.
#[derive(Debug, Clone)]
pub struct CityMap {
    graph: Graph,
    landmarks: LandmarkIndex,
}

impl CityMap {
    /// Creates a new map, binding the landmarks to graph nodes and
    /// precomputing landmark route costs (see [LandmarkIndex::new]).
    pub fn new(graph: Graph, landmarks: &[LandmarkRecord], options: &LandmarkOptions) -> Self {
        let landmarks = LandmarkIndex::new(&graph, landmarks, options);
        Self { graph, landmarks }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn landmarks(&self) -> &LandmarkIndex {
        &self.landmarks
    }

    /// Returns `true` if a node carries the provided `key=value` tag,
    /// either directly (see [Node::has_tag](crate::Node::has_tag)) or through a landmark bound to it.
    pub fn has_tag(&self, node: i64, tag: &str) -> bool {
        match self.graph.get_node(node) {
            Some(n) => n.has_tag(tag) || self.landmarks.tags_at(node).iter().any(|t| t == tag),
            None => false,
        }
    }

    /// Returns all nodes carrying the provided tag (see [CityMap::has_tag]), in ascending order.
    pub fn locations_with_tag(&self, tag: &str) -> Vec<i64> {
        if let Some(id) = tag.strip_prefix("label=").and_then(|id| id.parse::<i64>().ok()) {
            if self.graph.contains(id) {
                return vec![id];
            }
        }

        self.graph
            .iter()
            .filter(|n| n.has_tag(tag) || self.landmarks.tags_at(n.id).iter().any(|t| t == tag))
            .map(|n| n.id)
            .collect()
    }

    fn resolve(&self, target: Target) -> Result<Vec<i64>, RouteError> {
        match target {
            Target::Node(id) if self.graph.contains(id) => Ok(vec![id]),
            Target::Node(id) => Err(RouteError::NodeNotFound(id)),
            Target::Landmark(name) => Ok(vec![self.landmarks.resolve(name)?]),
            Target::Tag(tag) => {
                let nodes = self.locations_with_tag(tag);
                if nodes.is_empty() {
                    log::debug!("no location is tagged with {}", tag);
                    Err(RouteError::NoPathFound)
                } else {
                    Ok(nodes)
                }
            }
        }
    }

    fn matches(&self, target: Target, node: i64) -> bool {
        match target {
            Target::Node(id) => id == node,
            Target::Tag(tag) => self.has_tag(node, tag),
            Target::Landmark(name) => self.landmarks.resolve(name) == Ok(node),
        }
    }

    /// Returns `true` if a route ending at `node` reaches the provided goal.
    pub fn is_goal(&self, node: i64, goal: &Goal) -> bool {
        self.matches(goal.target(), node)
    }

    /// Returns `true` if visiting `node` satisfies the provided waypoint.
    pub fn visits(&self, node: i64, waypoint: &Waypoint) -> bool {
        self.matches(waypoint.target(), node)
    }

    /// Finds the cheapest route from `start` to any node matching the `goal`.
    ///
    /// A route from a node matching the goal to itself has zero cost and a single node.
    pub fn shortest_path(
        &self,
        start: i64,
        goal: &Goal,
        options: &SearchOptions,
    ) -> Result<PathResult, RouteError> {
        if !self.graph.contains(start) {
            return Err(RouteError::NodeNotFound(start));
        }

        let goals = self.resolve(goal.target())?;
        let heuristic = Estimator::new(options.heuristic, &self.graph, &self.landmarks, &goals);
        let problem = ShortestPathProblem::new(&self.graph, start, &goals, heuristic)?;
        let solution = solve(&problem, options)?;

        PathResult::new(
            &self.graph,
            solution.nodes,
            solution.cost,
            Vec::new(),
            solution.stats,
        )
    }

    /// Finds the cheapest route from `start` to any node matching the `goal`,
    /// which visits every waypoint (in any order). Visiting a waypoint has no cost,
    /// and a single node may satisfy multiple waypoints at once.
    ///
    /// Fails with [RouteError::TooManyWaypoints] if more than [MAX_WAYPOINTS]
    /// waypoints are provided, and with [RouteError::NoPathFound] if some waypoint
    /// is not matched by any node.
    pub fn waypoints_path(
        &self,
        start: i64,
        waypoints: &[Waypoint],
        goal: &Goal,
        options: &SearchOptions,
    ) -> Result<PathResult, RouteError> {
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(RouteError::TooManyWaypoints {
                count: waypoints.len(),
                max: MAX_WAYPOINTS,
            });
        }
        if !self.graph.contains(start) {
            return Err(RouteError::NodeNotFound(start));
        }

        let goals = self.resolve(goal.target())?;
        let waypoint_nodes = waypoints
            .iter()
            .map(|w| self.resolve(w.target()))
            .collect::<Result<Vec<_>, _>>()?;

        let heuristic = Estimator::new(options.heuristic, &self.graph, &self.landmarks, &goals);
        let problem = WaypointsProblem::new(&self.graph, start, &goals, &waypoint_nodes, heuristic)?;
        let solution = solve(&problem, options)?;

        PathResult::new(
            &self.graph,
            solution.nodes,
            solution.cost,
            waypoints.iter().map(|w| w.to_string()).collect(),
            solution.stats,
        )
    }
}
