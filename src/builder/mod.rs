// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::Entry;

use crate::{earth_distance, Edge, Graph, GraphBuildError, Node};

mod profile;

pub use profile::{CostProfile, Penalty, DISTANCE_PROFILE, FOOT_PROFILE};

/// Raw connection between two nodes, as produced by a map data parser.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub from: i64,
    pub to: i64,

    /// Explicit traversal cost. If missing, the great-circle distance
    /// between the nodes (in meters) is used instead.
    pub cost: Option<f64>,

    /// Class of the road (e.g. OSM's `highway` value), used to look up a
    /// [Penalty] in the [CostProfile].
    pub road_class: Option<String>,

    /// Whether the connection can be traversed from `to` to `from` as well.
    pub bidirectional: bool,
}

impl EdgeRecord {
    /// Creates a bidirectional connection without an explicit cost or road class.
    pub fn new(from: i64, to: i64) -> Self {
        Self {
            from,
            to,
            cost: None,
            road_class: None,
            bidirectional: true,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_road_class<S: Into<String>>(mut self, road_class: S) -> Self {
        self.road_class = Some(road_class.into());
        self
    }

    /// Restricts the connection to the `from` -> `to` direction.
    pub fn one_way(mut self) -> Self {
        self.bidirectional = false;
        self
    }
}

impl Graph {
    /// Builds a [Graph] from raw node and edge records, as per the provided [CostProfile].
    ///
    /// Fails if two nodes share an id, a node has invalid coordinates, an edge references
    /// an unknown node, or an edge has a negative (or non-finite) cost. No partial graph
    /// is returned on failure.
    ///
    /// Edges of road classes excluded by the profile are skipped. If multiple records
    /// connect the same pair of nodes in the same direction, the cheapest one is kept.
    pub fn build<N, E>(nodes: N, edges: E, profile: &CostProfile) -> Result<Graph, GraphBuildError>
    where
        N: IntoIterator<Item = Node>,
        E: IntoIterator<Item = EdgeRecord>,
    {
        let mut builder = GraphBuilder::new(profile);
        for node in nodes {
            builder.add_node(node)?;
        }
        for edge in edges {
            builder.add_edge(edge)?;
        }
        Ok(builder.finish())
    }
}

/// Helper object used for storing state related to converting raw records into a [Graph].
struct GraphBuilder<'a> {
    g: Graph,
    profile: &'a CostProfile<'a>,
    excluded_edges: usize,
}

impl<'a> GraphBuilder<'a> {
    fn new(profile: &'a CostProfile<'a>) -> Self {
        Self {
            g: Graph::default(),
            profile,
            excluded_edges: 0,
        }
    }

    fn add_node(&mut self, node: Node) -> Result<(), GraphBuildError> {
        if !node.lat.is_finite() || !node.lon.is_finite() {
            return Err(GraphBuildError::InvalidCoordinate(node.id));
        }

        match self.g.0.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
                Ok(())
            }
            Entry::Occupied(e) => Err(GraphBuildError::DuplicateNode(*e.key())),
        }
    }

    fn add_edge(&mut self, record: EdgeRecord) -> Result<(), GraphBuildError> {
        let (from, to) = match (self.g.get_node(record.from), self.g.get_node(record.to)) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                return Err(GraphBuildError::UnknownNode {
                    from: record.from,
                    to: record.to,
                })
            }
        };

        let base_cost = match record.cost {
            Some(cost) if cost.is_finite() && cost >= 0.0 => cost,
            Some(cost) => {
                return Err(GraphBuildError::InvalidCost {
                    from: record.from,
                    to: record.to,
                    cost,
                })
            }
            None => earth_distance(from.lat, from.lon, to.lat, to.lon),
        };

        let penalty = self.profile.edge_penalty(record.road_class.as_deref());
        if penalty.is_infinite() {
            log::trace!(
                "edge {} -> {} ({:?}) excluded by the {} profile",
                record.from,
                record.to,
                record.road_class,
                self.profile.name,
            );
            self.excluded_edges += 1;
            return Ok(());
        }

        let cost = base_cost * penalty;
        if !cost.is_finite() {
            return Err(GraphBuildError::InvalidCost {
                from: record.from,
                to: record.to,
                cost,
            });
        }

        self.set_edge(record.from, record.to, cost);
        if record.bidirectional {
            self.set_edge(record.to, record.from, cost);
        }
        Ok(())
    }

    /// Creates an [Edge], or lowers the cost of an existing one.
    fn set_edge(&mut self, from_id: i64, to_id: i64, cost: f64) {
        if let Some((_, edges)) = self.g.0.get_mut(&from_id) {
            if let Some(existing) = edges.iter_mut().find(|e| e.to == to_id) {
                existing.cost = existing.cost.min(cost);
            } else {
                edges.push(Edge::new(to_id, cost));
            }
        }
    }

    fn finish(self) -> Graph {
        if self.excluded_edges > 0 {
            log::info!(
                "{} edge records excluded by the {} profile",
                self.excluded_edges,
                self.profile.name,
            );
        }
        log::debug!(
            "built graph with {} nodes and {} edges",
            self.g.len(),
            self.g.edge_count(),
        );
        self.g
    }
}
