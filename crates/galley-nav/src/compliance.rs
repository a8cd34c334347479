//! Graph invariant test helpers.
//!
//! These functions check the metric and adjacency invariants every
//! [`NavigationGraph`] must satisfy. Reused by the unit tests and the
//! property tests over random graphs.

use crate::graph::{NavigationGraph, UNREACHABLE};

/// Assert that `distance(a, a) == 0` for all nodes.
pub fn assert_distance_reflexive(g: &NavigationGraph) {
    for a in g.node_ids() {
        let d = g.distance(a, a);
        assert_eq!(d, 0, "distance({a}, {a}) = {d}, expected 0");
    }
}

/// Assert that `distance(a, b) == distance(b, a)` for all node pairs.
pub fn assert_distance_symmetric(g: &NavigationGraph) {
    for a in g.node_ids() {
        for b in g.node_ids() {
            let dab = g.distance(a, b);
            let dba = g.distance(b, a);
            assert_eq!(dab, dba, "distance({a}, {b}) = {dab} != distance({b}, {a}) = {dba}");
        }
    }
}

/// Assert triangle inequality: `d(a, c) <= d(a, b) + d(b, c)` for all triples.
pub fn assert_distance_triangle_inequality(g: &NavigationGraph) {
    for a in g.node_ids() {
        for b in g.node_ids() {
            for c in g.node_ids() {
                let dac = g.distance(a, c);
                let dab = g.distance(a, b);
                let dbc = g.distance(b, c);
                assert!(
                    dac <= dab + dbc,
                    "triangle inequality violated: d({a},{c})={dac} > d({a},{b})={dab} + d({b},{c})={dbc}"
                );
            }
        }
    }
}

/// Assert that `b in neighbors(a)` implies `a in neighbors(b)` with equal weight.
pub fn assert_neighbors_symmetric(g: &NavigationGraph) {
    for a in g.node_ids() {
        for &b in g.neighbors(a) {
            assert!(
                g.neighbors(b).contains(&a),
                "neighbor symmetry violated: {b} in N({a}) but {a} not in N({b})"
            );
            assert_eq!(g.edge_weight(a, b), g.edge_weight(b, a));
        }
    }
}

/// Assert that adjacent nodes are never further apart than their edge.
pub fn assert_edges_bound_distance(g: &NavigationGraph) {
    for a in g.node_ids() {
        for &b in g.neighbors(a) {
            let w = g.edge_weight(a, b).unwrap_or(UNREACHABLE);
            let d = g.distance(a, b);
            assert!(d <= w, "distance({a}, {b}) = {d} exceeds edge weight {w}");
        }
    }
}

/// Assert that `UNREACHABLE` is reported exactly for pairs outside `reachable_from`.
pub fn assert_unreachable_consistent(g: &NavigationGraph) {
    for a in g.node_ids() {
        let reach = g.reachable_from(a);
        for b in g.node_ids() {
            let d = g.distance(a, b);
            assert_eq!(
                reach.contains(&b),
                d != UNREACHABLE,
                "reachable_from({a}) disagrees with distance({a}, {b}) = {d}"
            );
        }
    }
}

/// Run all compliance checks on a graph.
pub fn run_full_compliance(g: &NavigationGraph) {
    assert_distance_reflexive(g);
    assert_distance_symmetric(g);
    assert_distance_triangle_inequality(g);
    assert_neighbors_symmetric(g);
    assert_edges_bound_distance(g);
    assert_unreachable_consistent(g);
}
