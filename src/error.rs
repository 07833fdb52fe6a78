// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

/// Conditions which abort [Graph](crate::Graph) construction.
/// No partial graph is ever returned alongside these errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphBuildError {
    /// Two node records share the same identifier.
    #[error("duplicate node: {0}")]
    DuplicateNode(i64),

    /// A node record has a non-finite latitude or longitude.
    #[error("invalid coordinates of node {0}")]
    InvalidCoordinate(i64),

    /// An edge record references a node absent from the node records.
    #[error("edge {from} -> {to} references an unknown node")]
    UnknownNode { from: i64, to: i64 },

    /// An edge cost is negative, NaN or infinite (possibly after applying a penalty).
    #[error("edge {from} -> {to} has an invalid cost: {cost}")]
    InvalidCost { from: i64, to: i64, cost: f64 },
}

/// Outcomes of route queries other than a found route.
///
/// None of these conditions affect the shared [CityMap](crate::CityMap)
/// (or [Graph](crate::Graph) and [LandmarkIndex](crate::LandmarkIndex)),
/// subsequent queries remain valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The requested node doesn't exist in the graph.
    #[error("invalid node: {0}")]
    NodeNotFound(i64),

    /// The landmark is not known, or could not be bound to any graph node.
    #[error("unknown landmark: {0}")]
    LandmarkNotFound(String),

    /// The query is valid, but no route satisfies it.
    #[error("no path found")]
    NoPathFound,

    /// More required waypoints than fit in the visited-set bitmask.
    #[error("too many waypoints: {count} (at most {max} are supported)")]
    TooManyWaypoints { count: usize, max: usize },

    /// Route search has exceeded its limit of node expansions.
    ///
    /// Concluding that no route exists requires traversing the whole
    /// reachable state space, which can be prohibitively expensive.
    /// The step limit protects against resource exhaustion.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}

/// Failures of reading or writing a persisted [PathResult](crate::PathResult).
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The persisted path refers to a node which doesn't exist in the graph.
    #[error("persisted path references unknown node {0}")]
    UnknownNode(i64),
}

/// A geographic position string which isn't a valid `"<lat>,<lon>"` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid geographic position: {0:?}")]
pub struct InvalidGeo(pub String);

/// Reasons for which a [PathResult](crate::PathResult) doesn't satisfy a route query,
/// see [PathResult::check_valid](crate::PathResult::check_valid).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathViolation {
    #[error("path is empty")]
    Empty,

    #[error("path does not start at {expected} (starts at {actual})")]
    WrongStart { expected: i64, actual: i64 },

    #[error("path ends at {0}, which is not a goal")]
    WrongEnd(i64),

    #[error("{from} is not connected to {to}")]
    Disconnected { from: i64, to: i64 },

    #[error("path does not visit waypoint {0}")]
    MissingWaypoint(String),
}
