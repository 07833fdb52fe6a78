// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod engine;
mod heuristic;
mod problem;
mod shortest_path;
mod waypoints;

pub(crate) use engine::{multi_source_costs, single_source_costs};
pub use engine::{solve, SearchStats, Solution};
pub use heuristic::{
    Estimator, ExactCost, Heuristic, LandmarkBound, StraightLine, ZeroHeuristic,
};
pub use problem::{ProblemKind, SearchProblem, Successor};
pub use shortest_path::ShortestPathProblem;
pub use waypoints::{WaypointState, WaypointsProblem, MAX_WAYPOINTS};

/// Suggested value of [SearchOptions::step_limit] for hosts which need to bound
/// the work done by a single query. Searches are unbounded by default.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Order in which [solve] explores the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Uniform cost search (Dijkstra's algorithm): states are expanded in order
    /// of their cost from the start; the heuristic is not used.
    UniformCost,

    /// [A* search](https://en.wikipedia.org/wiki/A*_search_algorithm): states are
    /// expanded in order of their cost from the start plus the heuristic estimate.
    #[default]
    AStar,
}

/// Lower bound used by [CityMap](crate::CityMap) routing with [Strategy::AStar].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeuristicKind {
    /// No estimate, equivalent to [Strategy::UniformCost].
    Zero,

    /// Great-circle distance to the goal, see [StraightLine].
    ///
    /// Only admissible if every edge costs at least the geographic distance
    /// between its nodes. Graphs with explicit edge costs may violate this,
    /// resulting in suboptimal routes.
    StraightLine,

    /// Differential heuristic over precomputed landmark costs, see [LandmarkBound].
    #[default]
    Landmarks,

    /// The larger of [HeuristicKind::StraightLine] and [HeuristicKind::Landmarks].
    Combined,

    /// Exact route cost to the closest goal node, ignoring outstanding waypoints,
    /// see [ExactCost].
    ///
    /// Computing it takes a full search over the reversed graph for every query,
    /// which pays off for waypoint queries, where the state space is much larger
    /// than the graph itself.
    Exact,
}

/// Controls a single route search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub strategy: Strategy,
    pub heuristic: HeuristicKind,

    /// Maximum number of state expansions before
    /// [RouteError::StepLimitExceeded](crate::RouteError::StepLimitExceeded) is returned,
    /// or `None` to search until a goal is reached or the frontier is exhausted.
    ///
    /// Concluding that no route exists requires expanding every reachable state,
    /// which can take a very long time on large graphs (or with many waypoints).
    pub step_limit: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            heuristic: HeuristicKind::default(),
            step_limit: None,
        }
    }
}
