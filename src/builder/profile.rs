// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Describes how raw edge records are converted into [Edge](crate::Edge) costs.
///
/// Every edge gets a base cost - the explicit cost carried by the record, or the
/// great-circle distance between its endpoints (in meters) if there is none.
/// The base cost is then multiplied by the penalty of the edge's road class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostProfile<'a> {
    /// Human readable name of the profile. Only used for logging.
    pub name: &'a str,

    /// Multipliers for specific road classes, checked in order.
    /// The first [Penalty] with a matching [Penalty::road_class] is used.
    ///
    /// Penalties must be finite and not less than one, which preserves the
    /// straight-line heuristic admissibility. An infinite penalty excludes the
    /// road class from routing altogether.
    pub penalties: &'a [Penalty<'a>],

    /// Multiplier used for edges without a road class, or with a road class
    /// not matched by any of the [CostProfile::penalties].
    pub default_penalty: f64,
}

/// Numeric multiplier for edges of a specific road class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalty<'a> {
    /// Road class to which this penalty applies, e.g. "residential" or "footway".
    pub road_class: &'a str,

    /// Multiplier of the base cost, to express preference for a specific road class.
    pub penalty: f64,
}

impl<'a> CostProfile<'a> {
    /// Finds the penalty for an edge of the given road class.
    ///
    /// Returns [f64::INFINITY] if the road class is excluded, or if the configured
    /// penalty is invalid (not finite or less than one).
    pub fn edge_penalty(&self, road_class: Option<&str>) -> f64 {
        let penalty = road_class
            .and_then(|class| {
                self.penalties
                    .iter()
                    .find(|p| p.road_class == class)
                    .map(|p| p.penalty)
            })
            .unwrap_or(self.default_penalty);

        if penalty.is_finite() && penalty >= 1.0 {
            penalty
        } else {
            f64::INFINITY
        }
    }
}

/// Profile using the base cost as-is: explicit costs or pure geographic distance.
pub const DISTANCE_PROFILE: CostProfile<'static> = CostProfile {
    name: "distance",
    penalties: &[],
    default_penalty: 1.0,
};

/// Profile for walking: same costs as [DISTANCE_PROFILE],
/// but motorways and trunk roads are not routable.
pub const FOOT_PROFILE: CostProfile<'static> = CostProfile {
    name: "foot",
    penalties: &[
        Penalty {
            road_class: "motorway",
            penalty: f64::INFINITY,
        },
        Penalty {
            road_class: "motorway_link",
            penalty: f64::INFINITY,
        },
        Penalty {
            road_class: "trunk",
            penalty: f64::INFINITY,
        },
        Penalty {
            road_class: "trunk_link",
            penalty: f64::INFINITY,
        },
    ],
    default_penalty: 1.0,
};
