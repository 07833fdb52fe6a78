// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Landmark-guided route finding over city maps.
//!
//! A city map is a weighted directed [Graph] built from raw node and edge records
//! (usually extracted from [OpenStreetMap](https://www.openstreetmap.org/)),
//! together with a set of named [landmarks](LandmarkIndex) snapped to their closest nodes.
//! Routes are found with uniform cost search or A*, guided by a differential heuristic
//! over precomputed landmark distances. Routes may be required to pass through
//! any number of waypoints (up to [MAX_WAYPOINTS]), in any order.
//!
//! # Example
//!
//! ```no_run
//! use landroute::{CityMap, EdgeRecord, Goal, Graph, LandmarkOptions, LandmarkRecord, Node, Waypoint};
//!
//! let graph = Graph::build(
//!     [
//!         Node::new(1, 37.4275, -122.1697),
//!         Node::new(2, 37.4280, -122.1697),
//!         Node::new(3, 37.4280, -122.1690),
//!     ],
//!     [EdgeRecord::new(1, 2), EdgeRecord::new(2, 3), EdgeRecord::new(1, 3).with_cost(500.0)],
//!     &landroute::FOOT_PROFILE,
//! )
//! .expect("invalid map");
//!
//! let map = CityMap::new(
//!     graph,
//!     &[LandmarkRecord::new("gates", 37.4280, -122.1690)],
//!     &LandmarkOptions::default(),
//! );
//!
//! let route = map
//!     .waypoints_path(1, &[Waypoint::Node(2)], &Goal::Landmark("gates".into()), &Default::default())
//!     .expect("failed to find route");
//!
//! println!("Route: {:?} ({:.1} m)", route.nodes, route.cost);
//! route.write_to_file("route.json", landroute::FileFormat::Unknown).expect("failed to save route");
//! ```

mod builder;
mod distance;
mod error;
mod graph;
mod kd;
mod landmarks;
mod map;
mod path;
pub mod search;

pub use builder::{CostProfile, EdgeRecord, Penalty, DISTANCE_PROFILE, FOOT_PROFILE};
pub use distance::earth_distance;
pub use error::{GraphBuildError, InvalidGeo, PathViolation, PersistError, RouteError};
pub use graph::{Graph, UNIT_DELTA};
pub use kd::KDTree;
pub use landmarks::{GeoPoint, Landmark, LandmarkIndex, LandmarkOptions, LandmarkRecord};
pub use map::{CityMap, Goal, Waypoint};
pub use path::{FileFormat, PathResult};
pub use search::{
    HeuristicKind, SearchOptions, SearchStats, Strategy, DEFAULT_STEP_LIMIT, MAX_WAYPOINTS,
};

/// Represents an element of the [Graph].
///
/// Every node implicitly carries the `label=<id>` tag,
/// in addition to the explicitly provided `key=value` tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: Vec<String>,
}

impl Node {
    pub fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self {
            id,
            lat,
            lon,
            tags: Vec::new(),
        }
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns `true` if the node has the given `key=value` tag, including the implicit `label=<id>`.
    pub fn has_tag(&self, tag: &str) -> bool {
        if let Some(label) = tag.strip_prefix("label=") {
            if label.parse::<i64>().is_ok_and(|id| id == self.id) {
                return true;
            }
        }
        self.tags.iter().any(|t| t == tag)
    }
}

/// Represents an outgoing (one-way) connection from a specific [Node].
///
/// `cost` is always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub cost: f64,
}

impl Edge {
    pub fn new(to: i64, cost: f64) -> Self {
        Self { to, cost }
    }
}
