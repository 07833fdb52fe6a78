// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::heuristic::Heuristic;
use super::problem::{ProblemKind, SearchProblem, Successor};
use crate::{Graph, RouteError};

/// Maximum number of required waypoints in a [WaypointsProblem].
///
/// The state space grows exponentially with the number of waypoints;
/// the visited set is stored as a bitmask in a [u32].
pub const MAX_WAYPOINTS: usize = 20;

/// Search state of a [WaypointsProblem]: the current node and
/// a bitmask of already visited waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaypointState {
    pub node: i64,
    pub visited: u32,
}

/// Finding the cheapest route from a start node to any of the goal nodes,
/// which passes through every required waypoint (in any order).
///
/// Each waypoint is a set of nodes; visiting any of them satisfies the waypoint.
/// Visiting is free - only traversing edges has a cost.
///
/// The heuristic is only consulted with the current node, ignoring any
/// outstanding waypoints. This stays admissible, but becomes less informed
/// the more waypoints remain.
#[derive(Debug, Clone)]
pub struct WaypointsProblem<'a, H> {
    graph: &'a Graph,
    start: i64,
    goals: Vec<i64>,
    masks: HashMap<i64, u32>,
    all_visited: u32,
    heuristic: H,
}

impl<'a, H: Heuristic> WaypointsProblem<'a, H> {
    /// Creates a new problem.
    ///
    /// Fails with [RouteError::NodeNotFound] if the start, any of the goals
    /// or any of the waypoint nodes don't exist in the graph, and with
    /// [RouteError::TooManyWaypoints] if more than [MAX_WAYPOINTS] are provided.
    pub fn new(
        graph: &'a Graph,
        start: i64,
        goals: &[i64],
        waypoints: &[Vec<i64>],
        heuristic: H,
    ) -> Result<Self, RouteError> {
        if waypoints.len() > MAX_WAYPOINTS {
            return Err(RouteError::TooManyWaypoints {
                count: waypoints.len(),
                max: MAX_WAYPOINTS,
            });
        }

        if !graph.contains(start) {
            return Err(RouteError::NodeNotFound(start));
        }
        if let Some(&missing) = goals
            .iter()
            .chain(waypoints.iter().flatten())
            .find(|&&id| !graph.contains(id))
        {
            return Err(RouteError::NodeNotFound(missing));
        }

        let mut goals = goals.to_vec();
        goals.sort_unstable();
        goals.dedup();

        let mut masks: HashMap<i64, u32> = HashMap::default();
        for (idx, nodes) in waypoints.iter().enumerate() {
            for &node in nodes {
                *masks.entry(node).or_default() |= 1 << idx;
            }
        }

        let all_visited = (1u32 << waypoints.len()) - 1;

        Ok(Self {
            graph,
            start,
            goals,
            masks,
            all_visited,
            heuristic,
        })
    }

    fn mask_at(&self, node: i64) -> u32 {
        self.masks.get(&node).cloned().unwrap_or(0)
    }

    /// Returns `true` if all waypoints were visited in the given state.
    pub fn all_visited(&self, state: WaypointState) -> bool {
        state.visited == self.all_visited
    }
}

impl<H: Heuristic> SearchProblem for WaypointsProblem<'_, H> {
    type State = WaypointState;

    fn kind(&self) -> ProblemKind {
        ProblemKind::Waypoints
    }

    fn start_state(&self) -> WaypointState {
        WaypointState {
            node: self.start,
            visited: self.mask_at(self.start),
        }
    }

    fn is_goal(&self, state: WaypointState) -> bool {
        self.all_visited(state) && self.goals.binary_search(&state.node).is_ok()
    }

    fn location(&self, state: WaypointState) -> i64 {
        state.node
    }

    fn successors(&self, state: WaypointState, out: &mut Vec<Successor<WaypointState>>) {
        out.extend(self.graph.get_edges(state.node).iter().map(|e| Successor {
            action: e.to,
            state: WaypointState {
                node: e.to,
                visited: state.visited | self.mask_at(e.to),
            },
            cost: e.cost,
        }));
    }

    fn heuristic(&self, state: WaypointState) -> f64 {
        self.heuristic.estimate(state.node)
    }
}
