// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Graph};

/// Position of a graph node, as stored in the [KDTree].
#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    id: i64,
    lat: f64,
    lon: f64,
}

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree),
/// used to snap arbitrary positions (like landmark coordinates) onto the closest
/// node of a [Graph] without computing the distance to every node.
///
/// This implementation assumes euclidean geometry, even though the distance function
/// used is [earth_distance]. This results in undefined behavior when points
/// are close to the ante meridian (180°/-180° longitude) or poles (90°/-90° latitude),
/// or when the data spans multiple continents.
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: Point,
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Builds a k-d tree over all nodes of a [Graph].
    /// Returns `None` if the graph is empty.
    pub fn from_graph(g: &Graph) -> Option<Self> {
        let mut points = g
            .iter()
            .map(|n| Point {
                id: n.id,
                lat: n.lat,
                lon: n.lon,
            })
            .collect::<Vec<_>>();
        Self::build(points.as_mut_slice(), false)
    }

    /// Finds the id of the node closest to the given position,
    /// together with the distance to it (in meters).
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> (i64, f64) {
        let (point, dist) = self.find_nearest_impl(lat, lon, false);
        (point.id, dist)
    }

    fn find_nearest_impl(&self, lat: f64, lon: f64, lon_divides: bool) -> (Point, f64) {
        let mut best = self.pivot;
        let mut best_dist = earth_distance(lat, lon, best.lat, best.lon);

        let first_left = if lon_divides {
            lon < best.lon
        } else {
            lat < best.lat
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(branch) = first {
            let (alt, alt_dist) = branch.find_nearest_impl(lat, lon, !lon_divides);
            if alt_dist < best_dist {
                best = alt;
                best_dist = alt_dist;
            }
        }

        if let Some(branch) = second {
            // The other side of the splitting axis may only contain a closer node
            // if the axis itself is closer than the current best.
            let (axis_lat, axis_lon) = if lon_divides {
                (lat, self.pivot.lon)
            } else {
                (self.pivot.lat, lon)
            };

            if earth_distance(lat, lon, axis_lat, axis_lon) < best_dist {
                let (alt, alt_dist) = branch.find_nearest_impl(lat, lon, !lon_divides);
                if alt_dist < best_dist {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        (best, best_dist)
    }

    fn build(points: &mut [Point], lon_divides: bool) -> Option<Self> {
        match points.len() {
            0 => None,
            1 => Some(Self {
                pivot: points[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    points.sort_by(|a, b| a.lon.total_cmp(&b.lon).then(a.id.cmp(&b.id)));
                } else {
                    points.sort_by(|a, b| a.lat.total_cmp(&b.lat).then(a.id.cmp(&b.id)));
                }
                let median = points.len() / 2;
                let pivot = points[median];
                let (left, right_and_pivot) = points.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build(left, !lon_divides).map(Box::new),
                    right: Self::build(right, !lon_divides).map(Box::new),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeRecord, Node, DISTANCE_PROFILE};

    #[test]
    fn kd_tree() {
        let g = Graph::build(
            [
                Node::new(1, 0.01, 0.01),
                Node::new(2, 0.01, 0.05),
                Node::new(3, 0.03, 0.09),
                Node::new(4, 0.04, 0.03),
                Node::new(5, 0.04, 0.07),
                Node::new(6, 0.07, 0.03),
                Node::new(7, 0.07, 0.01),
                Node::new(8, 0.08, 0.05),
                Node::new(9, 0.08, 0.09),
            ],
            Vec::<EdgeRecord>::new(),
            &DISTANCE_PROFILE,
        )
        .unwrap();
        let tree = KDTree::from_graph(&g).expect("k-d tree from non-empty graph must not be empty");

        assert_eq!(tree.find_nearest_node(0.02, 0.02).0, 1);
        assert_eq!(tree.find_nearest_node(0.05, 0.03).0, 4);
        assert_eq!(tree.find_nearest_node(0.05, 0.08).0, 5);
        assert_eq!(tree.find_nearest_node(0.09, 0.06).0, 8);

        let (id, dist) = tree.find_nearest_node(0.01, 0.05);
        assert_eq!(id, 2);
        assert_eq!(dist, 0.0);
    }

    #[test]
    fn kd_tree_empty_graph() {
        assert!(KDTree::from_graph(&Graph::default()).is_none());
    }
}
