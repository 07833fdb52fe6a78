// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::heuristic::Heuristic;
use super::problem::{ProblemKind, SearchProblem, Successor};
use crate::{Graph, RouteError};

/// Finding the cheapest route from a start node to any of the goal nodes.
///
/// States are plain node ids.
#[derive(Debug, Clone)]
pub struct ShortestPathProblem<'a, H> {
    graph: &'a Graph,
    start: i64,
    goals: Vec<i64>,
    heuristic: H,
}

impl<'a, H: Heuristic> ShortestPathProblem<'a, H> {
    /// Creates a new problem, failing with [RouteError::NodeNotFound]
    /// if the start or any of the goal nodes don't exist in the graph.
    pub fn new(graph: &'a Graph, start: i64, goals: &[i64], heuristic: H) -> Result<Self, RouteError> {
        if !graph.contains(start) {
            return Err(RouteError::NodeNotFound(start));
        }
        if let Some(&missing) = goals.iter().find(|&&id| !graph.contains(id)) {
            return Err(RouteError::NodeNotFound(missing));
        }

        let mut goals = goals.to_vec();
        goals.sort_unstable();
        goals.dedup();

        Ok(Self {
            graph,
            start,
            goals,
            heuristic,
        })
    }
}

impl<H: Heuristic> SearchProblem for ShortestPathProblem<'_, H> {
    type State = i64;

    fn kind(&self) -> ProblemKind {
        ProblemKind::ShortestPath
    }

    fn start_state(&self) -> i64 {
        self.start
    }

    fn is_goal(&self, state: i64) -> bool {
        self.goals.binary_search(&state).is_ok()
    }

    fn location(&self, state: i64) -> i64 {
        state
    }

    fn successors(&self, state: i64, out: &mut Vec<Successor<i64>>) {
        out.extend(self.graph.get_edges(state).iter().map(|e| Successor {
            action: e.to,
            state: e.to,
            cost: e.cost,
        }));
    }

    fn heuristic(&self, state: i64) -> f64 {
        self.heuristic.estimate(state)
    }
}
