// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fmt::Debug;
use std::hash::Hash;

/// Variant tag of a [SearchProblem], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    /// States are plain graph nodes, see [ShortestPathProblem](super::ShortestPathProblem).
    ShortestPath,

    /// States are nodes with a set of visited waypoints,
    /// see [WaypointsProblem](super::WaypointsProblem).
    Waypoints,
}

/// A single transition out of a search state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Successor<S> {
    /// Node entered by taking this transition.
    pub action: i64,

    /// State after taking this transition.
    pub state: S,

    /// Non-negative cost of taking this transition.
    pub cost: f64,
}

/// Formulation of a route search, as explored by [solve](super::solve).
///
/// Every state is located at a graph node, and every transition moves to
/// another node, which makes it possible to reconstruct a route as a sequence of nodes.
///
/// Implementors must only produce non-negative transition costs. Best-first search
/// returns optimal routes only if [SearchProblem::heuristic] never overestimates
/// the remaining cost to a goal; this is not verified at runtime.
pub trait SearchProblem {
    type State: Copy + Eq + Hash + Debug;

    fn kind(&self) -> ProblemKind;

    fn start_state(&self) -> Self::State;

    fn is_goal(&self, state: Self::State) -> bool;

    /// Returns the graph node at which the state is located.
    fn location(&self, state: Self::State) -> i64;

    /// Appends all transitions out of `state` to `out`.
    fn successors(&self, state: Self::State, out: &mut Vec<Successor<Self::State>>);

    /// Estimates the remaining cost from `state` to a goal.
    fn heuristic(&self, state: Self::State) -> f64;
}
