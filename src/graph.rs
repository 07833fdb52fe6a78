// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::btree_map::BTreeMap;

use crate::{Edge, Node, RouteError};

/// Change of latitude/longitude (in degrees) which equates to roughly one meter.
/// Used to lay out [Graph::grid] nodes.
pub const UNIT_DELTA: f64 = 0.00001;

/// Represents a road network as a set of [Nodes](Node)
/// and directed [Edges](Edge) between them.
///
/// Graphs are immutable once built (see [Graph::build](crate::Graph::build)).
/// Every edge references a node present in the graph, and all edge costs
/// are finite and non-negative.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(pub(crate) BTreeMap<i64, (Node, Vec<Edge>)>);

impl Graph {
    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.values().map(|(node, _)| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<&Node> {
        self.0.get(&id).map(|(node, _)| node)
    }

    /// Checks whether a node with the provided id exists.
    pub fn contains(&self, id: i64) -> bool {
        self.0.contains_key(&id)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id,
    /// failing with [RouteError::NodeNotFound] for unknown nodes.
    ///
    /// The returned slice is always the same for the same node.
    pub fn neighbors(&self, id: i64) -> Result<&[Edge], RouteError> {
        self.0
            .get(&id)
            .map(|(_, edges)| edges.as_slice())
            .ok_or(RouteError::NodeNotFound(id))
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    /// Unknown nodes have no edges.
    pub fn get_edges(&self, id: i64) -> &[Edge] {
        self.0
            .get(&id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the cost of an [Edge] from one node to another, if such an edge exists.
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> Option<f64> {
        self.get_edges(from_id)
            .iter()
            .find(|e| e.to == to_id)
            .map(|e| e.cost)
    }

    /// Returns the number of (directed) edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.0.values().map(|(_, edges)| edges.len()).sum()
    }

    /// Returns a graph with the same nodes and every edge flipped.
    ///
    /// Single-source passes over the reversed graph compute
    /// costs *to* a node, rather than *from* it.
    pub fn reversed(&self) -> Graph {
        let mut reversed: BTreeMap<i64, (Node, Vec<Edge>)> = self
            .0
            .iter()
            .map(|(&id, (node, _))| (id, (node.clone(), Vec::new())))
            .collect();

        for (&from_id, (_, edges)) in &self.0 {
            for edge in edges {
                if let Some((_, incoming)) = reversed.get_mut(&edge.to) {
                    incoming.push(Edge {
                        to: from_id,
                        cost: edge.cost,
                    });
                }
            }
        }

        Graph(reversed)
    }

    /// Creates a `width` × `height` grid of nodes, with bidirectional
    /// unit-cost edges between horizontally and vertically adjacent nodes.
    ///
    /// Node `(x, y)` has the id `x * height + y` (see [Graph::grid_id]),
    /// lies at `(x * UNIT_DELTA, y * UNIT_DELTA)`, and is tagged with `x=<x>` and `y=<y>`.
    pub fn grid(width: usize, height: usize) -> Graph {
        let mut g = BTreeMap::default();

        for x in 0..width {
            for y in 0..height {
                let id = Self::grid_id(x, y, height);
                let node = Node {
                    id,
                    lat: x as f64 * UNIT_DELTA,
                    lon: y as f64 * UNIT_DELTA,
                    tags: vec![format!("x={}", x), format!("y={}", y)],
                };

                let mut edges = Vec::with_capacity(4);
                if x > 0 {
                    edges.push(Edge::new(Self::grid_id(x - 1, y, height), 1.0));
                }
                if x + 1 < width {
                    edges.push(Edge::new(Self::grid_id(x + 1, y, height), 1.0));
                }
                if y > 0 {
                    edges.push(Edge::new(Self::grid_id(x, y - 1, height), 1.0));
                }
                if y + 1 < height {
                    edges.push(Edge::new(Self::grid_id(x, y + 1, height), 1.0));
                }

                g.insert(id, (node, edges));
            }
        }

        Graph(g)
    }

    /// Returns the id of node `(x, y)` in a [Graph::grid] with the provided height.
    pub fn grid_id(x: usize, y: usize, height: usize) -> i64 {
        (x * height + y) as i64
    }
}
