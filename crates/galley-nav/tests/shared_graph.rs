//! A built graph is shared read-only across threads.

use galley_core::NodeId;
use galley_nav::{Edge, NavigationGraph, UNREACHABLE};
use std::sync::Arc;
use std::thread;

fn ring(n: u32) -> NavigationGraph {
    let edges = (0..n).map(|i| Edge::new(i, (i + 1) % n, 1 + i % 3));
    NavigationGraph::new((0..n).map(NodeId), edges).unwrap()
}

#[test]
fn concurrent_readers_agree() {
    let graph = Arc::new(ring(12));
    let expected: Vec<u32> = graph
        .node_ids()
        .map(|v| graph.distance(NodeId(0), v))
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let g = Arc::clone(&graph);
            thread::spawn(move || {
                g.node_ids()
                    .map(|v| g.distance(NodeId(0), v))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}

#[test]
fn ring_distances_take_shorter_arc() {
    let g = ring(6);
    // Weights around the ring: 1,2,3,1,2,3.
    assert_eq!(g.distance(NodeId(0), NodeId(3)), 6);
    assert_eq!(g.distance(NodeId(0), NodeId(5)), 3);
    assert_eq!(g.distance(NodeId(0), NodeId(4)), 5);
    assert!(g.is_connected());
    assert!(g.node_ids().all(|v| g.distance(NodeId(2), v) < UNREACHABLE));
}
