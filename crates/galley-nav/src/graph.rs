//! Undirected weighted station graph with memoised shortest paths.

use crate::error::NavError;
use galley_core::NodeId;
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

/// Distance reported between nodes with no connecting path.
pub const UNREACHABLE: u32 = 999;

/// Time charged for a move to a node that is not directly connected.
pub const DEFAULT_NON_ADJACENT_COST: u32 = 100;

/// Internal marker for "not reached yet" during Dijkstra.
const UNSET: u32 = u32::MAX;

/// An undirected edge with a positive traversal time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// One endpoint.
    pub a: NodeId,
    /// The other endpoint.
    pub b: NodeId,
    /// Traversal time in ticks.
    pub weight: u32,
}

impl Edge {
    /// Create an edge between `a` and `b`.
    pub fn new(a: impl Into<NodeId>, b: impl Into<NodeId>, weight: u32) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            weight,
        }
    }
}

impl From<(u32, u32, u32)> for Edge {
    fn from((a, b, weight): (u32, u32, u32)) -> Self {
        Self::new(a, b, weight)
    }
}

/// Immutable station graph.
///
/// Node ids are dense (`0..node_count`). Adjacency lists are kept in
/// ascending id order so iteration is deterministic, and the full
/// distance matrix is computed once in [`new`](Self::new).
///
/// Queries taking a [`NodeId`] panic on ids outside `0..node_count`:
/// the node set is closed when the kitchen is configured, so an unknown
/// id is a programming error rather than an agent mistake.
///
/// # Examples
///
/// ```
/// use galley_core::NodeId;
/// use galley_nav::{Edge, NavigationGraph, UNREACHABLE};
///
/// let g = NavigationGraph::new(
///     [NodeId(0), NodeId(1), NodeId(2), NodeId(3)],
///     [Edge::new(0u32, 1u32, 2), Edge::new(1u32, 2u32, 3)],
/// )
/// .unwrap();
///
/// assert_eq!(g.distance(NodeId(0), NodeId(2)), 5);
/// assert_eq!(g.distance(NodeId(0), NodeId(3)), UNREACHABLE);
/// assert_eq!(g.move_cost(NodeId(0), NodeId(0)), 1);
/// assert_eq!(g.move_cost(NodeId(0), NodeId(1)), 2);
/// assert_eq!(g.move_cost(NodeId(0), NodeId(2)), 100);
/// ```
#[derive(Clone, Debug)]
pub struct NavigationGraph {
    node_count: usize,
    neighbors: Vec<SmallVec<[NodeId; 4]>>,
    weights: Vec<SmallVec<[u32; 4]>>,
    /// Row-major `node_count * node_count`, `UNSET` where unreachable.
    dist: Vec<u32>,
    non_adjacent_cost: u32,
}

impl NavigationGraph {
    /// Build a graph and compute all-pairs shortest paths.
    ///
    /// # Errors
    ///
    /// Returns a [`NavError`] if the node set is empty, contains
    /// duplicates or gaps, or if an edge is a self-loop, a duplicate,
    /// has zero weight, or names a node outside the set. A shortest
    /// path of [`UNREACHABLE`] ticks or more is also rejected, since it
    /// could not be told apart from a missing path.
    pub fn new<N, E>(node_ids: N, edges: E) -> Result<Self, NavError>
    where
        N: IntoIterator<Item = NodeId>,
        E: IntoIterator<Item = Edge>,
    {
        let mut ids: Vec<NodeId> = node_ids.into_iter().collect();
        if ids.is_empty() {
            return Err(NavError::EmptyGraph);
        }
        ids.sort_unstable();
        for (expected, &found) in ids.iter().enumerate() {
            let expected = NodeId(expected as u32);
            if found < expected {
                return Err(NavError::DuplicateNode { node: found });
            }
            if found != expected {
                return Err(NavError::NonDenseIds { expected, found });
            }
        }
        let node_count = ids.len();

        let mut neighbors: Vec<SmallVec<[NodeId; 4]>> = vec![SmallVec::new(); node_count];
        let mut weights: Vec<SmallVec<[u32; 4]>> = vec![SmallVec::new(); node_count];
        let mut seen = BTreeSet::new();
        for edge in edges {
            let Edge { a, b, weight } = edge;
            for node in [a, b] {
                if node.index() >= node_count {
                    return Err(NavError::UnknownNode {
                        node,
                        from: a,
                        to: b,
                    });
                }
            }
            if a == b {
                return Err(NavError::SelfLoop { node: a });
            }
            if weight == 0 {
                return Err(NavError::ZeroWeight { from: a, to: b });
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Err(NavError::DuplicateEdge { a, b });
            }
            for (from, to) in [(a, b), (b, a)] {
                let list = &mut neighbors[from.index()];
                let pos = list.partition_point(|&n| n < to);
                list.insert(pos, to);
                weights[from.index()].insert(pos, weight);
            }
        }

        let mut graph = Self {
            node_count,
            neighbors,
            weights,
            dist: Vec::new(),
            non_adjacent_cost: DEFAULT_NON_ADJACENT_COST,
        };
        graph.dist = graph.all_pairs();
        if let Some((from, to, distance)) = graph.longest_finite_path() {
            if distance >= UNREACHABLE {
                return Err(NavError::PathTooLong { from, to, distance });
            }
        }
        Ok(graph)
    }

    /// Override the time charged for moves to non-adjacent nodes.
    pub fn with_non_adjacent_cost(mut self, cost: u32) -> Self {
        self.non_adjacent_cost = cost;
        self
    }

    // ── Construction helpers ────────────────────────────────────

    fn all_pairs(&self) -> Vec<u32> {
        let n = self.node_count;
        let mut dist = vec![UNSET; n * n];
        for source in 0..n {
            self.dijkstra(source, &mut dist[source * n..(source + 1) * n]);
        }
        dist
    }

    /// The reachable pair with the largest distance, if any pair is.
    fn longest_finite_path(&self) -> Option<(NodeId, NodeId, u32)> {
        let n = self.node_count;
        self.dist
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d != UNSET)
            .max_by_key(|&(_, &d)| d)
            .map(|(i, &d)| (NodeId((i / n) as u32), NodeId((i % n) as u32), d))
    }

    fn dijkstra(&self, source: usize, row: &mut [u32]) {
        let mut heap = BinaryHeap::new();
        row[source] = 0;
        heap.push(Reverse((0u32, source)));
        while let Some(Reverse((d, u))) = heap.pop() {
            if d > row[u] {
                continue;
            }
            for (&v, &w) in self.neighbors[u].iter().zip(&self.weights[u]) {
                let next = d.saturating_add(w);
                let v = v.index();
                if next < row[v] {
                    row[v] = next;
                    heap.push(Reverse((next, v)));
                }
            }
        }
    }

    fn check(&self, node: NodeId) -> usize {
        let i = node.index();
        assert!(
            i < self.node_count,
            "unknown node {node} (graph has {} nodes)",
            self.node_count
        );
        i
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count as u32).map(NodeId)
    }

    /// Shortest-path distance, or [`UNREACHABLE`] if no path exists.
    ///
    /// # Panics
    ///
    /// Panics if either node is not in the graph.
    pub fn distance(&self, u: NodeId, v: NodeId) -> u32 {
        let (i, j) = (self.check(u), self.check(v));
        match self.dist[i * self.node_count + j] {
            UNSET => UNREACHABLE,
            d => d,
        }
    }

    /// Directly connected nodes in ascending id order.
    ///
    /// # Panics
    ///
    /// Panics if `u` is not in the graph.
    pub fn neighbors(&self, u: NodeId) -> &[NodeId] {
        &self.neighbors[self.check(u)]
    }

    /// Weight of the edge between `u` and `v`, if there is one.
    ///
    /// # Panics
    ///
    /// Panics if either node is not in the graph.
    pub fn edge_weight(&self, u: NodeId, v: NodeId) -> Option<u32> {
        let i = self.check(u);
        self.check(v);
        self.neighbors[i]
            .binary_search(&v)
            .ok()
            .map(|pos| self.weights[i][pos])
    }

    /// Whether an edge connects `u` and `v`.
    ///
    /// # Panics
    ///
    /// Panics if either node is not in the graph.
    pub fn is_adjacent(&self, u: NodeId, v: NodeId) -> bool {
        self.edge_weight(u, v).is_some()
    }

    /// Time charged for moving from `u` to `v`.
    ///
    /// Staying put costs one tick, an adjacent move costs the edge
    /// weight, and anything else costs the non-adjacent penalty. The
    /// result is always positive when edge weights and the penalty are.
    ///
    /// # Panics
    ///
    /// Panics if either node is not in the graph.
    pub fn move_cost(&self, u: NodeId, v: NodeId) -> u32 {
        if u == v {
            self.check(u);
            return 1;
        }
        self.edge_weight(u, v).unwrap_or(self.non_adjacent_cost)
    }

    /// The penalty charged for non-adjacent moves.
    pub fn non_adjacent_cost(&self) -> u32 {
        self.non_adjacent_cost
    }

    /// Nodes with a path from `u` (including `u`), ascending.
    ///
    /// # Panics
    ///
    /// Panics if `u` is not in the graph.
    pub fn reachable_from(&self, u: NodeId) -> Vec<NodeId> {
        let i = self.check(u);
        let row = &self.dist[i * self.node_count..(i + 1) * self.node_count];
        row.iter()
            .enumerate()
            .filter(|&(_, &d)| d != UNSET)
            .map(|(j, _)| NodeId(j as u32))
            .collect()
    }

    /// Whether every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        self.dist[..self.node_count].iter().all(|&d| d != UNSET)
    }
}
