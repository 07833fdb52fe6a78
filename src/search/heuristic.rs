// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::{multi_source_costs, HeuristicKind};
use crate::landmarks::GoalSummary;
use crate::{earth_distance, Graph, LandmarkIndex};

/// Lower bound of the cost from a node to the closest goal node.
///
/// [A* search](super::Strategy::AStar) only returns optimal routes
/// if the estimate never exceeds the true remaining cost (the heuristic is
/// *admissible*). This is not verified at runtime.
pub trait Heuristic {
    fn estimate(&self, node: i64) -> f64;
}

impl<F: Fn(i64) -> f64> Heuristic for F {
    fn estimate(&self, node: i64) -> f64 {
        self(node)
    }
}

/// Trivially admissible heuristic which always returns zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn estimate(&self, _: i64) -> f64 {
        0.0
    }
}

/// Great-circle distance to the closest goal node.
///
/// Admissible only if no edge costs less than the geographic distance between
/// its nodes, which holds for graphs built from distance-based
/// [CostProfiles](crate::CostProfile), but not necessarily for explicit edge costs.
#[derive(Debug, Clone)]
pub struct StraightLine<'a> {
    graph: &'a Graph,
    goals: Vec<(f64, f64)>,
}

impl<'a> StraightLine<'a> {
    /// Creates a straight-line heuristic towards the provided goal nodes.
    /// Goal nodes absent from the graph are ignored.
    pub fn new(graph: &'a Graph, goals: &[i64]) -> Self {
        let goals = goals
            .iter()
            .filter_map(|&id| graph.get_node(id))
            .map(|n| (n.lat, n.lon))
            .collect();
        Self { graph, goals }
    }
}

impl Heuristic for StraightLine<'_> {
    fn estimate(&self, node: i64) -> f64 {
        match self.graph.get_node(node) {
            Some(n) => min_or_zero(
                self.goals
                    .iter()
                    .map(|&(lat, lon)| earth_distance(n.lat, n.lon, lat, lon)),
            ),
            None => 0.0,
        }
    }
}

/// Differential (landmark-based) lower bound to the closest goal node,
/// see [LandmarkIndex::lower_bound].
///
/// Route costs between every landmark and the goal set are summarized upfront,
/// so an estimate takes a single lookup per landmark regardless of the number of goals.
/// With multiple goals the bound may be looser than the smallest per-goal bound,
/// but it stays admissible and consistent.
#[derive(Debug, Clone)]
pub struct LandmarkBound<'a> {
    index: &'a LandmarkIndex,
    goals: Vec<GoalSummary>,
}

impl<'a> LandmarkBound<'a> {
    pub fn new(index: &'a LandmarkIndex, goals: &[i64]) -> Self {
        Self {
            index,
            goals: index.summarize_goals(goals),
        }
    }
}

impl Heuristic for LandmarkBound<'_> {
    fn estimate(&self, node: i64) -> f64 {
        self.index.lower_bound_to_goals(node, &self.goals)
    }
}

/// Exact cost of the cheapest route to the closest goal node,
/// precomputed with a single search over the reversed graph.
///
/// Nodes from which no goal is reachable are estimated at infinity.
/// For [waypoint problems](super::WaypointsProblem), the estimate ignores outstanding
/// waypoints; it remains admissible, and is the tightest such bound.
#[derive(Debug, Clone, Default)]
pub struct ExactCost {
    costs: HashMap<i64, f64>,
}

impl ExactCost {
    pub fn new(graph: &Graph, goals: &[i64]) -> Self {
        let costs = multi_source_costs(&graph.reversed(), goals);
        log::debug!("exact costs to {} goal(s) known for {} nodes", goals.len(), costs.len());
        Self { costs }
    }
}

impl Heuristic for ExactCost {
    fn estimate(&self, node: i64) -> f64 {
        self.costs.get(&node).cloned().unwrap_or(f64::INFINITY)
    }
}

/// Runtime selection of a [Heuristic], as configured by [HeuristicKind].
#[derive(Debug, Clone)]
pub enum Estimator<'a> {
    Zero,
    StraightLine(StraightLine<'a>),
    Landmarks(LandmarkBound<'a>),

    /// The larger of both bounds.
    Combined(StraightLine<'a>, LandmarkBound<'a>),

    Exact(ExactCost),
}

impl<'a> Estimator<'a> {
    pub fn new(
        kind: HeuristicKind,
        graph: &'a Graph,
        landmarks: &'a LandmarkIndex,
        goals: &[i64],
    ) -> Self {
        match kind {
            HeuristicKind::Zero => Self::Zero,
            HeuristicKind::StraightLine => Self::StraightLine(StraightLine::new(graph, goals)),
            HeuristicKind::Landmarks => Self::Landmarks(LandmarkBound::new(landmarks, goals)),
            HeuristicKind::Combined => Self::Combined(
                StraightLine::new(graph, goals),
                LandmarkBound::new(landmarks, goals),
            ),
            HeuristicKind::Exact => Self::Exact(ExactCost::new(graph, goals)),
        }
    }
}

impl Heuristic for Estimator<'_> {
    fn estimate(&self, node: i64) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::StraightLine(h) => h.estimate(node),
            Self::Landmarks(h) => h.estimate(node),
            Self::Combined(a, b) => a.estimate(node).max(b.estimate(node)),
            Self::Exact(h) => h.estimate(node),
        }
    }
}

fn min_or_zero<I: Iterator<Item = f64>>(values: I) -> f64 {
    let min = values.fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        min
    } else {
        0.0
    }
}
