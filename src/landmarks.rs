// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::search::single_source_costs;
use crate::{Graph, InvalidGeo, KDTree, RouteError};

/// Geographic position, deserialized from a `"<lat>,<lon>"` string.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl FromStr for GeoPoint {
    type Err = InvalidGeo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidGeo(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;

        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Ok(Self { lat, lon })
        } else {
            Err(invalid())
        }
    }
}

impl TryFrom<String> for GeoPoint {
    type Error = InvalidGeo;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// A single entry of a landmark file:
///
/// ```json
/// {"landmark": "gates", "geo": "37.4300,-122.1733", "amenity": "library"}
/// ```
///
/// Any keys other than `landmark` and `geo` are kept as free-form tags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LandmarkRecord {
    #[serde(rename = "landmark")]
    pub name: String,

    pub geo: GeoPoint,

    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
}

impl LandmarkRecord {
    pub fn new<S: Into<String>>(name: S, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            geo: GeoPoint { lat, lon },
            tags: BTreeMap::default(),
        }
    }

    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Controls how landmarks are bound to graph nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkOptions {
    /// Landmarks farther than this (in meters) from the closest graph node
    /// remain unbound, and can't be [resolved](LandmarkIndex::resolve).
    pub max_snap_distance: f64,
}

impl Default for LandmarkOptions {
    fn default() -> Self {
        Self {
            max_snap_distance: 250.0,
        }
    }
}

/// A named location, bound to its closest graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    /// The closest graph node, or `None` if no node was close enough.
    pub node: Option<i64>,

    pub tags: BTreeMap<String, String>,
}

/// Exact route costs from and to a single landmark node.
#[derive(Debug, Clone)]
struct DistanceTable {
    anchor: i64,
    from_anchor: HashMap<i64, f64>,
    to_anchor: HashMap<i64, f64>,
}

impl DistanceTable {
    fn new(graph: &Graph, reversed: &Graph, anchor: i64) -> Self {
        Self {
            anchor,
            from_anchor: single_source_costs(graph, anchor),
            to_anchor: single_source_costs(reversed, anchor),
        }
    }

    /// Lower bound of the route cost from one node to another,
    /// following from the triangle inequality. Zero if nothing can be concluded.
    fn lower_bound(&self, from: i64, to: i64) -> f64 {
        let mut bound: f64 = 0.0;

        // d(L, to) <= d(L, from) + d(from, to)
        if let (Some(l_from), Some(l_to)) = (self.from_anchor.get(&from), self.from_anchor.get(&to)) {
            bound = bound.max(l_to - l_from);
        }

        // d(from, L) <= d(from, to) + d(to, L)
        if let (Some(from_l), Some(to_l)) = (self.to_anchor.get(&from), self.to_anchor.get(&to)) {
            bound = bound.max(from_l - to_l);
        }

        bound
    }
}

/// Route costs between the anchor of a single [DistanceTable] and a set of goal nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GoalSummary {
    table: usize,

    /// Cost from the anchor to the closest goal, `None` if no goal is reachable.
    min_from_anchor: Option<f64>,

    /// Cost to the anchor from the farthest goal, `None` if any goal can't reach the anchor.
    max_to_anchor: Option<f64>,
}

impl DistanceTable {
    fn summarize(&self, table: usize, goals: &[i64]) -> GoalSummary {
        let min_from_anchor = goals
            .iter()
            .filter_map(|goal| self.from_anchor.get(goal).cloned())
            .reduce(f64::min);

        let max_to_anchor = goals
            .iter()
            .map(|goal| self.to_anchor.get(goal).cloned())
            .collect::<Option<Vec<f64>>>()
            .and_then(|costs| costs.into_iter().reduce(f64::max));

        GoalSummary {
            table,
            min_from_anchor,
            max_to_anchor,
        }
    }

    /// Like [DistanceTable::lower_bound], but to the closest of the summarized goals.
    fn lower_bound_to_goals(&self, from: i64, goals: &GoalSummary) -> f64 {
        let mut bound: f64 = 0.0;

        // d(L, g) <= d(L, from) + d(from, g) for every goal g
        if let (Some(l_from), Some(l_goal)) = (self.from_anchor.get(&from), goals.min_from_anchor)
        {
            bound = bound.max(l_goal - l_from);
        }

        // d(from, L) <= d(from, g) + d(g, L) for every goal g
        if let (Some(from_l), Some(goal_l)) = (self.to_anchor.get(&from), goals.max_to_anchor) {
            bound = bound.max(from_l - goal_l);
        }

        bound
    }
}

/// Set of named [Landmarks](Landmark) bound to the nodes of a specific [Graph],
/// together with precomputed route costs from and to every bound landmark.
///
/// Building the index runs two full single-source searches per distinct landmark node,
/// which is by far its most expensive part. The index is read-only afterward, and
/// can be shared between any number of searches over the same graph.
#[derive(Debug, Clone, Default)]
pub struct LandmarkIndex {
    landmarks: Vec<Landmark>,
    by_name: HashMap<String, usize>,
    node_tags: HashMap<i64, Vec<String>>,
    tables: Vec<DistanceTable>,
}

impl LandmarkIndex {
    /// Binds the provided landmarks to their closest nodes in the graph and
    /// precomputes route costs from and to them.
    ///
    /// Landmarks without a node within [LandmarkOptions::max_snap_distance]
    /// are kept, but remain unbound. If multiple records share the same name,
    /// only the first one is used.
    pub fn new(graph: &Graph, records: &[LandmarkRecord], options: &LandmarkOptions) -> Self {
        let mut index = Self::default();
        let tree = KDTree::from_graph(graph);

        for record in records {
            if index.by_name.contains_key(&record.name) {
                log::warn!("duplicate landmark {:?} ignored", record.name);
                continue;
            }

            let node = match &tree {
                Some(tree) => {
                    let (node, dist) = tree.find_nearest_node(record.geo.lat, record.geo.lon);
                    if dist < options.max_snap_distance {
                        Some(node)
                    } else {
                        log::warn!(
                            "landmark {:?} is {:.1} m away from the closest node {} (limit is {} m)",
                            record.name,
                            dist,
                            node,
                            options.max_snap_distance,
                        );
                        None
                    }
                }
                None => None,
            };

            if let Some(node) = node {
                let tags = index.node_tags.entry(node).or_default();
                tags.push(format!("landmark={}", record.name));
                tags.extend(record.tags.iter().map(|(k, v)| format!("{}={}", k, v)));
            }

            index.by_name.insert(record.name.clone(), index.landmarks.len());
            index.landmarks.push(Landmark {
                name: record.name.clone(),
                lat: record.geo.lat,
                lon: record.geo.lon,
                node,
                tags: record.tags.clone(),
            });
        }

        index.precompute(graph);
        index
    }

    fn precompute(&mut self, graph: &Graph) {
        let mut anchors: Vec<i64> = Vec::new();
        for node in self.landmarks.iter().filter_map(|l| l.node) {
            if !anchors.contains(&node) {
                anchors.push(node);
            }
        }

        if anchors.is_empty() {
            return;
        }

        let reversed = graph.reversed();
        self.tables = anchors
            .into_iter()
            .map(|anchor| {
                log::info!("precomputing route costs for landmark node {}", anchor);
                DistanceTable::new(graph, &reversed, anchor)
            })
            .collect();
    }

    /// Returns the number of landmarks, including unbound ones.
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Returns an iterator over all landmarks, in the order of their records.
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter()
    }

    /// Retrieves a landmark by its name.
    pub fn get(&self, name: &str) -> Option<&Landmark> {
        self.by_name.get(name).map(|&idx| &self.landmarks[idx])
    }

    /// Returns the node to which a landmark with the provided name is bound.
    ///
    /// Fails with [RouteError::LandmarkNotFound] if there's no such landmark,
    /// or if it's too far away from any graph node.
    pub fn resolve(&self, name: &str) -> Result<i64, RouteError> {
        self.get(name)
            .and_then(|l| l.node)
            .ok_or_else(|| RouteError::LandmarkNotFound(name.to_string()))
    }

    /// Returns the `key=value` tags attached to a node by its landmarks:
    /// `landmark=<name>`, followed by free-form tags of the landmark record.
    pub fn tags_at(&self, node: i64) -> &[String] {
        self.node_tags
            .get(&node)
            .map(|tags| tags.as_slice())
            .unwrap_or_default()
    }

    /// Returns all nodes with a landmark tag equal to `tag`, in ascending order.
    pub fn nodes_with_tag(&self, tag: &str) -> Vec<i64> {
        let mut nodes: Vec<i64> = self
            .node_tags
            .iter()
            .filter(|(_, tags)| tags.iter().any(|t| t == tag))
            .map(|(&node, _)| node)
            .collect();
        nodes.sort_unstable();
        nodes
    }

    /// Returns the landmark nodes for which route costs were precomputed.
    pub fn anchors(&self) -> impl Iterator<Item = i64> + '_ {
        self.tables.iter().map(|t| t.anchor)
    }

    /// Returns a lower bound of the route cost between two nodes,
    /// using the [differential heuristic](https://en.wikipedia.org/wiki/Admissible_heuristic):
    /// the largest bound implied by the triangle inequality over all landmarks.
    ///
    /// The bound never overestimates the true cost (it is admissible), and satisfies
    /// the triangle inequality itself (it is consistent). On graphs with symmetric
    /// edge costs this is `max |d(L, to) - d(L, from)|` over all landmarks `L`.
    /// Returns zero if no landmark is reachable in a useful way.
    pub fn lower_bound(&self, from: i64, to: i64) -> f64 {
        self.tables
            .iter()
            .map(|t| t.lower_bound(from, to))
            .fold(0.0, f64::max)
    }

    /// Summarizes route costs between every landmark and a set of goal nodes,
    /// for use with [LandmarkIndex::lower_bound_to_goals].
    pub(crate) fn summarize_goals(&self, goals: &[i64]) -> Vec<GoalSummary> {
        self.tables
            .iter()
            .enumerate()
            .map(|(idx, t)| t.summarize(idx, goals))
            .collect()
    }

    /// Returns a lower bound of the route cost from a node to the closest of the
    /// summarized goals, the largest one implied by the triangle inequality over all landmarks.
    ///
    /// For a single goal, this equals [LandmarkIndex::lower_bound].
    pub(crate) fn lower_bound_to_goals(&self, from: i64, goals: &[GoalSummary]) -> f64 {
        goals
            .iter()
            .map(|g| self.tables[g.table].lower_bound_to_goals(from, g))
            .fold(0.0, f64::max)
    }

    /// Like [LandmarkIndex::lower_bound], but towards the node of a named landmark.
    pub fn lower_bound_to_landmark(&self, from: i64, name: &str) -> Result<f64, RouteError> {
        let to = self.resolve(name)?;
        Ok(self.lower_bound(from, to))
    }

    /// Returns the exact route cost from a landmark to a node,
    /// or `None` if the landmark is unbound or the node is unreachable from it.
    pub fn cost_from(&self, name: &str, node: i64) -> Option<f64> {
        let anchor = self.get(name)?.node?;
        self.tables
            .iter()
            .find(|t| t.anchor == anchor)?
            .from_anchor
            .get(&node)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeRecord, Node, DISTANCE_PROFILE};

    /// Directed graph from the documentation: A -> B -> D, A -> C -> D.
    fn abcd(bidirectional: bool) -> Graph {
        let edges = [(1, 2, 1.0), (2, 4, 1.0), (1, 3, 5.0), (3, 4, 1.0)]
            .into_iter()
            .map(|(from, to, cost)| {
                let e = EdgeRecord::new(from, to).with_cost(cost);
                if bidirectional {
                    e
                } else {
                    e.one_way()
                }
            });

        Graph::build(
            [
                Node::new(1, 0.0, 0.0),
                Node::new(2, 0.001, 0.0),
                Node::new(3, 0.0, 0.001),
                Node::new(4, 0.001, 0.001),
            ],
            edges,
            &DISTANCE_PROFILE,
        )
        .unwrap()
    }

    #[test]
    fn geo_point() {
        let p: GeoPoint = "37.4300, -122.1733".parse().unwrap();
        assert_eq!(p, GeoPoint { lat: 37.43, lon: -122.1733 });
        assert_eq!(p.to_string(), "37.43,-122.1733");

        assert!("37.43".parse::<GeoPoint>().is_err());
        assert!("north,east".parse::<GeoPoint>().is_err());
        assert!("91.0,0.0".parse::<GeoPoint>().is_err());
    }

    #[test]
    fn record_from_json() {
        let records: Vec<LandmarkRecord> = serde_json::from_str(
            r#"[
                {"landmark": "gates", "geo": "37.4300,-122.1733"},
                {"landmark": "green_library", "geo": "37.4269,-122.1671", "amenity": "library"}
            ]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], LandmarkRecord::new("gates", 37.43, -122.1733));
        assert_eq!(
            records[1],
            LandmarkRecord::new("green_library", 37.4269, -122.1671).with_tag("amenity", "library"),
        );

        let invalid = serde_json::from_str::<LandmarkRecord>(r#"{"landmark": "x", "geo": "nowhere"}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn resolve() {
        let g = abcd(true);
        let index = LandmarkIndex::new(
            &g,
            &[
                LandmarkRecord::new("B", 0.00101, 0.0).with_tag("amenity", "food"),
                LandmarkRecord::new("far away", 1.0, 1.0),
            ],
            &LandmarkOptions::default(),
        );

        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve("B"), Ok(2));
        assert_eq!(index.get("far away").unwrap().node, None);
        assert_eq!(
            index.resolve("far away"),
            Err(RouteError::LandmarkNotFound("far away".to_string()))
        );
        assert_eq!(
            index.resolve("missing"),
            Err(RouteError::LandmarkNotFound("missing".to_string()))
        );

        // Failed queries leave the index intact
        assert_eq!(index.resolve("B"), Ok(2));
        assert_eq!(index.anchors().collect::<Vec<_>>(), vec![2]);

        assert_eq!(index.tags_at(2), &["landmark=B".to_string(), "amenity=food".to_string()]);
        assert!(index.tags_at(1).is_empty());
        assert_eq!(index.nodes_with_tag("amenity=food"), vec![2]);
        assert!(index.nodes_with_tag("amenity=park").is_empty());
    }

    #[test]
    fn duplicate_names() {
        let g = abcd(true);
        let index = LandmarkIndex::new(
            &g,
            &[
                LandmarkRecord::new("X", 0.0, 0.0),
                LandmarkRecord::new("X", 0.001, 0.001),
            ],
            &LandmarkOptions::default(),
        );

        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("X"), Ok(1));
        assert!(index.tags_at(4).is_empty());
    }

    #[test]
    fn snap_distance() {
        let g = abcd(true);
        let records = [LandmarkRecord::new("near", 0.0005, 0.0)];

        let strict = LandmarkIndex::new(&g, &records, &LandmarkOptions { max_snap_distance: 10.0 });
        assert!(strict.resolve("near").is_err());
        assert_eq!(strict.anchors().count(), 0);

        let loose = LandmarkIndex::new(&g, &records, &LandmarkOptions::default());
        assert!(loose.resolve("near").is_ok());
    }

    #[test]
    fn empty_graph() {
        let index = LandmarkIndex::new(
            &Graph::default(),
            &[LandmarkRecord::new("anything", 0.0, 0.0)],
            &LandmarkOptions::default(),
        );
        assert_eq!(index.len(), 1);
        assert!(index.resolve("anything").is_err());
        assert_eq!(index.lower_bound(1, 2), 0.0);
    }

    #[test]
    fn differential_bound_undirected() {
        let g = abcd(true);
        let index = LandmarkIndex::new(
            &g,
            &[LandmarkRecord::new("B", 0.001, 0.0)],
            &LandmarkOptions::default(),
        );

        // d(B, ·): A=1, B=0, C=2, D=1
        assert_eq!(index.cost_from("B", 3), Some(2.0));
        assert_eq!(index.lower_bound(1, 4), 0.0);
        assert_eq!(index.lower_bound(2, 4), 1.0);
        assert_eq!(index.lower_bound(3, 4), 1.0);
        assert_eq!(index.lower_bound(3, 1), 1.0);
        assert_eq!(index.lower_bound(4, 4), 0.0);
        assert_eq!(index.lower_bound_to_landmark(3, "B"), Ok(2.0));
        assert!(index.lower_bound_to_landmark(3, "Z").is_err());
    }

    #[test]
    fn differential_bound_directed() {
        let g = abcd(false);
        let index = LandmarkIndex::new(
            &g,
            &[LandmarkRecord::new("C", 0.0, 0.001)],
            &LandmarkOptions::default(),
        );

        // C -> D only; A -> C and B unreachable from C
        assert_eq!(index.cost_from("C", 4), Some(1.0));
        assert_eq!(index.cost_from("C", 1), None);

        // d(C, D) - d(C, C); D can't reach C, so only the forward bound applies
        assert_eq!(index.lower_bound(3, 4), 1.0);
        // d(A, C) = 5, d(C, C) = 0
        assert_eq!(index.lower_bound(1, 3), 5.0);
    }

    #[test]
    fn bound_is_admissible() {
        let g = Graph::grid(6, 6);
        let index = LandmarkIndex::new(
            &g,
            &[
                LandmarkRecord::new("corner", 0.0, 0.0),
                LandmarkRecord::new("middle", 0.00003, 0.00002),
            ],
            &LandmarkOptions::default(),
        );
        assert_eq!(index.anchors().count(), 2);

        for from in g.iter() {
            let exact = single_source_costs(&g, from.id);
            for to in g.iter() {
                let bound = index.lower_bound(from.id, to.id);
                assert!(bound >= 0.0);
                assert!(bound <= exact[&to.id], "{} -> {}", from.id, to.id);
            }
        }
    }

    #[test]
    fn goal_set_bound() {
        let g = Graph::grid(6, 6);
        let index = LandmarkIndex::new(
            &g,
            &[
                LandmarkRecord::new("corner", 0.0, 0.0),
                LandmarkRecord::new("edge", 0.00005, 0.00002),
            ],
            &LandmarkOptions::default(),
        );
        let goals = [Graph::grid_id(5, 1, 6), Graph::grid_id(2, 4, 6), Graph::grid_id(3, 3, 6)];
        let summary = index.summarize_goals(&goals);

        for from in g.iter() {
            let exact = single_source_costs(&g, from.id);
            let closest = goals.iter().map(|goal| exact[goal]).fold(f64::INFINITY, f64::min);
            let bound = index.lower_bound_to_goals(from.id, &summary);
            assert!(bound >= 0.0);
            assert!(bound <= closest, "{}", from.id);

            let single = index.summarize_goals(&goals[..1]);
            assert_eq!(
                index.lower_bound_to_goals(from.id, &single),
                index.lower_bound(from.id, goals[0])
            );
        }
    }

    #[test]
    fn goal_set_bound_directed() {
        let g = abcd(false);
        let index = LandmarkIndex::new(
            &g,
            &[LandmarkRecord::new("C", 0.0, 0.001)],
            &LandmarkOptions::default(),
        );

        // d(A, C) = 5, d(C, C) = 0
        assert_eq!(index.lower_bound_to_goals(1, &index.summarize_goals(&[3])), 5.0);
        // D can't reach C, and A is unreachable from C - nothing can be concluded
        assert_eq!(index.lower_bound_to_goals(1, &index.summarize_goals(&[3, 4])), 0.0);
        assert_eq!(index.lower_bound_to_goals(1, &index.summarize_goals(&[])), 0.0);
    }
}
