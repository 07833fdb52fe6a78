// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::search::SearchStats;
use crate::{CityMap, Goal, Graph, PathViolation, PersistError, RouteError, Waypoint};

/// Format of a persisted [PathResult]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the file extension
    /// (`.gz` and `.bz2` are compressed, anything else is plain JSON)
    #[default]
    Unknown,

    /// Force uncompressed JSON
    Json,

    /// Force JSON with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    JsonGz,

    /// Force JSON with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    JsonBz2,
}

impl FileFormat {
    fn resolve(self, path: &Path) -> Self {
        if self != Self::Unknown {
            return self;
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Self::JsonGz,
            Some("bz2") => Self::JsonBz2,
            _ => Self::Json,
        }
    }
}

/// Route found by a search, in the form handed over to map visualization.
///
/// Serialized as:
///
/// ```json
/// {
///   "waypointTags": ["landmark=gates"],
///   "path": [1, 2, 4],
///   "cost": 2.0,
///   "coordinates": [[37.43, -122.17], [37.431, -122.17], [37.432, -122.169]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    /// Descriptions of the waypoints the route was required to visit.
    #[serde(rename = "waypointTags", default)]
    pub waypoint_tags: Vec<String>,

    /// Ids of the visited nodes, from the start to the goal.
    #[serde(rename = "path")]
    pub nodes: Vec<i64>,

    /// Total cost of the route, equal to the sum of costs of all traversed edges.
    pub cost: f64,

    /// `[lat, lon]` position of every node from [PathResult::nodes].
    pub coordinates: Vec<[f64; 2]>,

    /// Work done by the search which found this route. Not persisted.
    #[serde(skip)]
    pub stats: SearchStats,
}

impl PathResult {
    /// Creates a new path result, looking up node coordinates in the graph.
    pub fn new(
        graph: &Graph,
        nodes: Vec<i64>,
        cost: f64,
        waypoint_tags: Vec<String>,
        stats: SearchStats,
    ) -> Result<Self, RouteError> {
        let coordinates = nodes
            .iter()
            .map(|&id| {
                graph
                    .get_node(id)
                    .map(|n| [n.lat, n.lon])
                    .ok_or(RouteError::NodeNotFound(id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            waypoint_tags,
            nodes,
            cost,
            coordinates,
            stats,
        })
    }

    /// Looks up the positions of [PathResult::nodes] in a graph.
    ///
    /// For a path read back from a file, this reproduces the
    /// persisted [PathResult::coordinates] exactly, provided that the same graph is used.
    pub fn rederive_coordinates(&self, graph: &Graph) -> Result<Vec<[f64; 2]>, PersistError> {
        self.nodes
            .iter()
            .map(|&id| {
                graph
                    .get_node(id)
                    .map(|n| [n.lat, n.lon])
                    .ok_or(PersistError::UnknownNode(id))
            })
            .collect()
    }

    /// Sums the costs of edges between consecutive nodes, as stored in the graph.
    /// Returns `None` if any two consecutive nodes are not connected.
    pub fn recompute_cost(&self, graph: &Graph) -> Option<f64> {
        self.nodes
            .windows(2)
            .try_fold(0.0, |total, pair| Some(total + graph.get_edge(pair[0], pair[1])?))
    }

    /// Checks that the path answers a route query: it must start at `start`, end at a node
    /// matching the `goal`, follow existing edges and visit every waypoint.
    ///
    /// The cost is not checked, see [PathResult::recompute_cost].
    pub fn check_valid(
        &self,
        map: &CityMap,
        start: i64,
        goal: &Goal,
        waypoints: &[Waypoint],
    ) -> Result<(), PathViolation> {
        let (first, last) = match (self.nodes.first(), self.nodes.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(PathViolation::Empty),
        };

        if first != start {
            return Err(PathViolation::WrongStart {
                expected: start,
                actual: first,
            });
        }

        if !map.is_goal(last, goal) {
            return Err(PathViolation::WrongEnd(last));
        }

        if let Some(pair) = self
            .nodes
            .windows(2)
            .find(|pair| map.graph().get_edge(pair[0], pair[1]).is_none())
        {
            return Err(PathViolation::Disconnected {
                from: pair[0],
                to: pair[1],
            });
        }

        match waypoints
            .iter()
            .find(|&w| !self.nodes.iter().any(|&n| map.visits(n, w)))
        {
            Some(missing) => Err(PathViolation::MissingWaypoint(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Serializes the path result as pretty-printed JSON into the provided writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a path result from JSON read from the provided reader.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, PersistError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes the path result to a file, as per the provided [FileFormat].
    pub fn write_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        format: FileFormat,
    ) -> Result<(), PersistError> {
        let path = path.as_ref();
        let io_error = |e: io::Error| PersistError::Io(path.to_path_buf(), e);

        let f = File::create(path).map_err(io_error)?;
        let w = BufWriter::new(f);

        let w = match format.resolve(path) {
            FileFormat::JsonGz => {
                let mut e = flate2::write::GzEncoder::new(w, flate2::Compression::default());
                self.to_writer(&mut e)?;
                e.finish().map_err(io_error)?
            }

            FileFormat::JsonBz2 => {
                let mut e = bzip2::write::BzEncoder::new(w, bzip2::Compression::default());
                self.to_writer(&mut e)?;
                e.finish().map_err(io_error)?
            }

            FileFormat::Json | FileFormat::Unknown => {
                let mut w = w;
                self.to_writer(&mut w)?;
                w
            }
        };

        w.into_inner()
            .map_err(|e| io_error(e.into_error()))?
            .sync_all()
            .map_err(io_error)?;

        log::debug!("path with {} nodes written to {}", self.nodes.len(), path.display());
        Ok(())
    }

    /// Reads a path result from a file, as per the provided [FileFormat].
    pub fn read_from_file<P: AsRef<Path>>(path: P, format: FileFormat) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| PersistError::Io(path.to_path_buf(), e))?;

        match format.resolve(path) {
            FileFormat::JsonGz => {
                let d = flate2::read::MultiGzDecoder::new(f);
                Self::from_reader(BufReader::new(d))
            }

            FileFormat::JsonBz2 => {
                let d = bzip2::read::MultiBzDecoder::new(f);
                Self::from_reader(BufReader::new(d))
            }

            FileFormat::Json | FileFormat::Unknown => Self::from_reader(BufReader::new(f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeRecord, Node, DISTANCE_PROFILE};

    fn graph() -> Graph {
        Graph::build(
            [
                Node::new(1, 37.427466, -122.170255),
                Node::new(2, 37.4280071, -122.1697021),
                Node::new(3, 37.42914, -122.16923),
            ],
            [EdgeRecord::new(1, 2), EdgeRecord::new(2, 3)],
            &DISTANCE_PROFILE,
        )
        .unwrap()
    }

    fn path(g: &Graph) -> PathResult {
        let cost = g.get_edge(1, 2).unwrap() + g.get_edge(2, 3).unwrap();
        PathResult::new(
            g,
            vec![1, 2, 3],
            cost,
            vec!["landmark=gates".to_string()],
            SearchStats::default(),
        )
        .unwrap()
    }

    #[test]
    fn new_looks_up_coordinates() {
        let g = graph();
        let p = path(&g);
        assert_eq!(p.coordinates[1], [37.4280071, -122.1697021]);
        assert_eq!(p.recompute_cost(&g), Some(p.cost));

        let err = PathResult::new(&g, vec![1, 5], 0.0, vec![], SearchStats::default()).unwrap_err();
        assert_eq!(err, RouteError::NodeNotFound(5));
    }

    #[test]
    fn recompute_cost_disconnected() {
        let g = graph();
        let mut p = path(&g);
        p.nodes = vec![1, 3];
        assert_eq!(p.recompute_cost(&g), None);

        p.nodes = vec![2];
        assert_eq!(p.recompute_cost(&g), Some(0.0));
    }

    #[test]
    fn json_layout() {
        let g = graph();
        let value = serde_json::to_value(path(&g)).unwrap();
        assert_eq!(value["waypointTags"], serde_json::json!(["landmark=gates"]));
        assert_eq!(value["path"], serde_json::json!([1, 2, 3]));
        assert!(value["cost"].is_f64());
        assert_eq!(value["coordinates"][0], serde_json::json!([37.427466, -122.170255]));
        assert!(value.get("stats").is_none());
    }

    #[test]
    fn file_round_trip() {
        let g = graph();
        let original = path(&g);
        let dir = tempfile::tempdir().unwrap();

        for (name, format) in [
            ("path.json", FileFormat::Unknown),
            ("path.json.gz", FileFormat::Unknown),
            ("path.json.bz2", FileFormat::Unknown),
            ("compressed", FileFormat::JsonGz),
        ] {
            let file = dir.path().join(name);
            original.write_to_file(&file, format).unwrap();

            let read = PathResult::read_from_file(&file, format).unwrap();
            assert_eq!(read, original, "{}", name);
            assert_eq!(read.rederive_coordinates(&g).unwrap(), original.coordinates);
        }
    }

    #[test]
    fn compression_is_detected_from_extension() {
        let g = graph();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("path.json.gz");
        path(&g).write_to_file(&file, FileFormat::Unknown).unwrap();

        // Reading a gzip file as plain JSON must fail
        assert!(PathResult::read_from_file(&file, FileFormat::Json).is_err());
    }

    #[test]
    fn read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PathResult::read_from_file(dir.path().join("missing.json"), FileFormat::Json)
            .unwrap_err();
        assert!(matches!(err, PersistError::Io(_, _)));
    }

    #[test]
    fn rederive_with_other_graph() {
        let g = graph();
        let p = path(&g);
        let err = p.rederive_coordinates(&Graph::grid(2, 2)).unwrap_err();
        assert!(matches!(err, PersistError::UnknownNode(1)));
    }

    #[test]
    fn read_minimal_record() {
        // Records produced by other tools may lack waypoint tags
        let p = PathResult::from_reader(
            r#"{"path": [3, 2], "cost": 1.5, "coordinates": [[0.0, 0.0], [0.5, 0.5]]}"#.as_bytes(),
        )
        .unwrap();
        assert!(p.waypoint_tags.is_empty());
        assert_eq!(p.nodes, vec![3, 2]);
    }
}
