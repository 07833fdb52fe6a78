// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::problem::{ProblemKind, SearchProblem, Successor};
use super::{SearchOptions, Strategy};
use crate::{Graph, RouteError};

/// Counters describing the work done by a single search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Number of states whose successors were generated.
    pub expanded: usize,

    /// Number of entries pushed onto the frontier.
    pub pushed: usize,
}

/// Route found by [solve].
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<S> {
    /// Visited nodes, starting at the location of the start state
    /// and ending at the location of `goal`.
    pub nodes: Vec<i64>,

    /// Sum of all transition costs along the route.
    pub cost: f64,

    /// The goal state at which the search ended.
    pub goal: S,

    pub stats: SearchStats,
}

#[derive(Debug, Clone, Copy)]
struct QueueItem<S> {
    state: S,
    cost: f64,
    score: f64,
    seq: u64,
}

impl<S> PartialEq for QueueItem<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S> Eq for QueueItem<S> {}

impl<S> PartialOrd for QueueItem<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for QueueItem<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: Comparisons are reversed, as lower scores (and among equal scores,
        // earlier insertions) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best-first exploration of a [SearchProblem]'s state space.
///
/// Instead of decreasing keys in the frontier, a state is pushed again whenever
/// a strictly cheaper way to reach it is found. Outdated frontier entries are
/// recognized by comparing with `known_costs` and skipped when popped.
struct BestFirst<'p, P: SearchProblem> {
    problem: &'p P,
    use_heuristic: bool,
    queue: BinaryHeap<QueueItem<P::State>>,
    known_costs: HashMap<P::State, f64>,
    came_from: HashMap<P::State, (P::State, i64)>,
    stats: SearchStats,
    seq: u64,
}

impl<'p, P: SearchProblem> BestFirst<'p, P> {
    fn new(problem: &'p P, use_heuristic: bool) -> Self {
        let mut search = Self {
            problem,
            use_heuristic,
            queue: BinaryHeap::default(),
            known_costs: HashMap::default(),
            came_from: HashMap::default(),
            stats: SearchStats::default(),
            seq: 0,
        };

        let start = problem.start_state();
        search.known_costs.insert(start, 0.0);
        search.push(start, 0.0);
        search
    }

    fn push(&mut self, state: P::State, cost: f64) {
        let score = if self.use_heuristic {
            cost + self.problem.heuristic(state)
        } else {
            cost
        };

        self.queue.push(QueueItem {
            state,
            cost,
            score,
            seq: self.seq,
        });
        self.seq += 1;
        self.stats.pushed += 1;
    }

    /// Explores the state space until a goal state is popped from the frontier,
    /// returning that state together with its cost. Returns `Ok(None)` if the
    /// whole reachable state space was explored without reaching a goal.
    fn run(&mut self, step_limit: usize) -> Result<Option<(P::State, f64)>, RouteError> {
        let mut successors: Vec<Successor<P::State>> = Vec::new();

        while let Some(item) = self.queue.pop() {
            let known_cost = self
                .known_costs
                .get(&item.state)
                .cloned()
                .unwrap_or(f64::INFINITY);
            if item.cost > known_cost {
                continue;
            }

            if self.problem.is_goal(item.state) {
                return Ok(Some((item.state, item.cost)));
            }

            self.stats.expanded += 1;
            if self.stats.expanded > step_limit {
                return Err(RouteError::StepLimitExceeded);
            }

            log::trace!("expanding {:?} at cost {}", item.state, item.cost);

            successors.clear();
            self.problem.successors(item.state, &mut successors);

            for succ in &successors {
                debug_assert!(succ.cost >= 0.0, "negative transition cost: {:?}", succ);

                let cost = item.cost + succ.cost;
                let best_cost = self
                    .known_costs
                    .get(&succ.state)
                    .cloned()
                    .unwrap_or(f64::INFINITY);
                if cost >= best_cost {
                    continue;
                }

                self.known_costs.insert(succ.state, cost);
                self.came_from.insert(succ.state, (item.state, succ.action));
                self.push(succ.state, cost);
            }
        }

        Ok(None)
    }

    fn reconstruct_path(&self, mut last: P::State) -> Vec<i64> {
        let mut actions = Vec::new();

        while let Some(&(before, action)) = self.came_from.get(&last) {
            actions.push(action);
            last = before;
        }

        let mut path = Vec::with_capacity(actions.len() + 1);
        path.push(self.problem.location(last));
        path.extend(actions.into_iter().rev());
        path
    }
}

/// Runs best-first search over the provided [SearchProblem].
///
/// With [Strategy::UniformCost], the frontier is ordered by the cost from the start state
/// and the problem's heuristic is never consulted. With [Strategy::AStar], the frontier is
/// ordered by cost plus heuristic estimate. Entries with equal priorities are expanded
/// in insertion order, making the search fully deterministic.
///
/// The returned route is optimal as long as the problem's heuristic is admissible
/// (never overestimates). Routes found with inadmissible heuristics may be suboptimal;
/// this is the caller's responsibility.
///
/// Fails with [RouteError::NoPathFound] if no goal state is reachable, and
/// with [RouteError::StepLimitExceeded] if a [SearchOptions::step_limit] is set
/// and more than that many states were expanded.
pub fn solve<P: SearchProblem>(
    problem: &P,
    options: &SearchOptions,
) -> Result<Solution<P::State>, RouteError> {
    let use_heuristic = options.strategy == Strategy::AStar;
    let mut search = BestFirst::new(problem, use_heuristic);
    let outcome = search.run(options.step_limit.unwrap_or(usize::MAX));

    log::debug!(
        "{:?} search over {:?} problem: {} states expanded, {} pushed",
        options.strategy,
        problem.kind(),
        search.stats.expanded,
        search.stats.pushed,
    );

    match outcome? {
        Some((goal, cost)) => Ok(Solution {
            nodes: search.reconstruct_path(goal),
            cost,
            goal,
            stats: search.stats,
        }),
        None => Err(RouteError::NoPathFound),
    }
}

/// Search problem without goal states, which makes [BestFirst] explore
/// every node reachable from `source`.
struct Reachability<'a> {
    graph: &'a Graph,
    source: i64,
}

impl SearchProblem for Reachability<'_> {
    type State = i64;

    fn kind(&self) -> ProblemKind {
        ProblemKind::ShortestPath
    }

    fn start_state(&self) -> i64 {
        self.source
    }

    fn is_goal(&self, _: i64) -> bool {
        false
    }

    fn location(&self, state: i64) -> i64 {
        state
    }

    fn successors(&self, state: i64, out: &mut Vec<Successor<i64>>) {
        out.extend(self.graph.get_edges(state).iter().map(|e| Successor {
            action: e.to,
            state: e.to,
            cost: e.cost,
        }));
    }

    fn heuristic(&self, _: i64) -> f64 {
        0.0
    }
}

/// Computes the cost of the shortest route from `source` to every reachable node.
/// Unreachable nodes are absent from the returned map.
pub(crate) fn single_source_costs(graph: &Graph, source: i64) -> HashMap<i64, f64> {
    multi_source_costs(graph, &[source])
}

/// Computes the cost of the shortest route from the closest of `sources` to every
/// reachable node. Unreachable nodes are absent from the returned map.
pub(crate) fn multi_source_costs(graph: &Graph, sources: &[i64]) -> HashMap<i64, f64> {
    let Some((&first, rest)) = sources.split_first() else {
        return HashMap::default();
    };

    let problem = Reachability {
        graph,
        source: first,
    };
    let mut search = BestFirst::new(&problem, false);
    for &source in rest {
        if !search.known_costs.contains_key(&source) {
            search.known_costs.insert(source, 0.0);
            search.push(source, 0.0);
        }
    }

    // Reachability has no goal states and the step limit is unbounded, so `run` can only
    // end with an exhausted frontier; at that point all known costs are final.
    let _ = search.run(usize::MAX);
    search.known_costs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeRecord, Node, DISTANCE_PROFILE};

    /// Problem over a graph with a caller-provided heuristic.
    struct Plain<'a, H: Fn(i64) -> f64> {
        graph: &'a Graph,
        start: i64,
        goal: i64,
        h: H,
    }

    impl<H: Fn(i64) -> f64> SearchProblem for Plain<'_, H> {
        type State = i64;

        fn kind(&self) -> ProblemKind {
            ProblemKind::ShortestPath
        }

        fn start_state(&self) -> i64 {
            self.start
        }

        fn is_goal(&self, state: i64) -> bool {
            state == self.goal
        }

        fn location(&self, state: i64) -> i64 {
            state
        }

        fn successors(&self, state: i64, out: &mut Vec<Successor<i64>>) {
            out.extend(self.graph.get_edges(state).iter().map(|e| Successor {
                action: e.to,
                state: e.to,
                cost: e.cost,
            }));
        }

        fn heuristic(&self, state: i64) -> f64 {
            (self.h)(state)
        }
    }

    fn diamond() -> Graph {
        //   2
        //  / \
        // 1   4 -- 5
        //  \ /
        //   3
        Graph::build(
            (1..=5).map(|id| Node::new(id, 0.0, 0.0)),
            [
                EdgeRecord::new(1, 2).with_cost(1.0),
                EdgeRecord::new(1, 3).with_cost(1.0),
                EdgeRecord::new(2, 4).with_cost(1.0),
                EdgeRecord::new(3, 4).with_cost(1.0),
                EdgeRecord::new(4, 5).with_cost(2.0),
            ],
            &DISTANCE_PROFILE,
        )
        .unwrap()
    }

    #[test]
    fn uniform_cost() {
        let g = diamond();
        let problem = Plain {
            graph: &g,
            start: 1,
            goal: 5,
            h: |_: i64| 0.0,
        };
        let options = SearchOptions {
            strategy: Strategy::UniformCost,
            ..Default::default()
        };

        let solution = solve(&problem, &options).unwrap();
        assert_eq!(solution.cost, 4.0);
        assert_eq!(solution.goal, 5);
        // Equal-cost ties are broken by insertion order: 2 was discovered before 3.
        assert_eq!(solution.nodes, vec![1, 2, 4, 5]);
    }

    #[test]
    fn heuristic_is_ignored_by_uniform_cost() {
        let g = diamond();
        // Grossly inadmissible heuristic preferring node 3
        let problem = Plain {
            graph: &g,
            start: 1,
            goal: 5,
            h: |n: i64| if n == 2 { 100.0 } else { 0.0 },
        };

        let ucs = solve(
            &problem,
            &SearchOptions {
                strategy: Strategy::UniformCost,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(ucs.nodes, vec![1, 2, 4, 5]);

        let astar = solve(&problem, &SearchOptions::default()).unwrap();
        assert_eq!(astar.nodes, vec![1, 3, 4, 5]);
        assert_eq!(astar.cost, 4.0);
    }

    #[test]
    fn start_is_goal() {
        let g = diamond();
        let problem = Plain {
            graph: &g,
            start: 4,
            goal: 4,
            h: |_: i64| 0.0,
        };

        let solution = solve(&problem, &SearchOptions::default()).unwrap();
        assert_eq!(solution.nodes, vec![4]);
        assert_eq!(solution.cost, 0.0);
        assert_eq!(solution.stats.expanded, 0);
    }

    #[test]
    fn no_path() {
        let g = Graph::build(
            (1..=4).map(|id| Node::new(id, 0.0, 0.0)),
            [
                EdgeRecord::new(1, 2).with_cost(1.0),
                EdgeRecord::new(3, 4).with_cost(1.0),
            ],
            &DISTANCE_PROFILE,
        )
        .unwrap();
        let problem = Plain {
            graph: &g,
            start: 1,
            goal: 4,
            h: |_: i64| 0.0,
        };

        let err = solve(&problem, &SearchOptions::default()).unwrap_err();
        assert_eq!(err, RouteError::NoPathFound);
    }

    #[test]
    fn step_limit() {
        let g = Graph::grid(10, 10);
        let problem = Plain {
            graph: &g,
            start: Graph::grid_id(0, 0, 10),
            goal: Graph::grid_id(9, 9, 10),
            h: |_: i64| 0.0,
        };
        let options = SearchOptions {
            step_limit: Some(5),
            ..Default::default()
        };

        let err = solve(&problem, &options).unwrap_err();
        assert_eq!(err, RouteError::StepLimitExceeded);
    }

    #[test]
    fn cheaper_path_found_later() {
        // 1 -> 2 is expensive directly, but cheap through 3
        let g = Graph::build(
            (1..=3).map(|id| Node::new(id, 0.0, 0.0)),
            [
                EdgeRecord::new(1, 2).with_cost(10.0).one_way(),
                EdgeRecord::new(1, 3).with_cost(1.0).one_way(),
                EdgeRecord::new(3, 2).with_cost(1.0).one_way(),
            ],
            &DISTANCE_PROFILE,
        )
        .unwrap();
        let problem = Plain {
            graph: &g,
            start: 1,
            goal: 2,
            h: |_: i64| 0.0,
        };

        let solution = solve(&problem, &SearchOptions::default()).unwrap();
        assert_eq!(solution.nodes, vec![1, 3, 2]);
        assert_eq!(solution.cost, 2.0);
        // 1, then 3; the stale (1 -> 2, cost 10) entry is never expanded
        assert_eq!(solution.stats.expanded, 2);
        assert_eq!(solution.stats.pushed, 4);
    }

    #[test]
    fn single_source() {
        let g = diamond();
        let costs = single_source_costs(&g, 1);
        assert_eq!(costs.len(), 5);
        assert_eq!(costs[&1], 0.0);
        assert_eq!(costs[&4], 2.0);
        assert_eq!(costs[&5], 4.0);

        let isolated = Graph::build(
            (1..=2).map(|id| Node::new(id, 0.0, 0.0)),
            Vec::<EdgeRecord>::new(),
            &DISTANCE_PROFILE,
        )
        .unwrap();
        let costs = single_source_costs(&isolated, 1);
        assert_eq!(costs.len(), 1);
        assert!(!costs.contains_key(&2));
    }

    #[test]
    fn multi_source() {
        // 0 - 1 - 2 - 3 - 4 - 5 - 6
        let g = Graph::grid(1, 7);
        let costs = multi_source_costs(&g, &[1, 5, 5]);
        assert_eq!(costs.len(), 7);
        assert_eq!(costs[&0], 1.0);
        assert_eq!(costs[&1], 0.0);
        assert_eq!(costs[&3], 2.0);
        assert_eq!(costs[&5], 0.0);
        assert_eq!(costs[&6], 1.0);

        assert!(multi_source_costs(&g, &[]).is_empty());
    }
}
