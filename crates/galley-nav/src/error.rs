//! Error types for graph construction.

use galley_core::NodeId;

/// Errors arising from navigation graph construction.
///
/// All of these are configuration errors: they are reported once at
/// startup and the world is never built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    /// Attempted to construct a graph with zero nodes.
    #[error("navigation graph must have at least one node")]
    EmptyGraph,
    /// The same node id was listed twice.
    #[error("node {node} listed more than once")]
    DuplicateNode {
        /// The repeated id.
        node: NodeId,
    },
    /// Node ids must be exactly `0..node_count`.
    #[error("node ids must be dense: expected id {expected}, found {found}")]
    NonDenseIds {
        /// The id that should have been present.
        expected: NodeId,
        /// The id actually found at that position after sorting.
        found: NodeId,
    },
    /// An edge references a node id outside `0..node_count`.
    #[error("edge ({from}, {to}) references unknown node {node}")]
    UnknownNode {
        /// The unknown endpoint.
        node: NodeId,
        /// First endpoint of the offending edge.
        from: NodeId,
        /// Second endpoint of the offending edge.
        to: NodeId,
    },
    /// An edge connects a node to itself.
    #[error("edge ({node}, {node}) is a self-loop")]
    SelfLoop {
        /// The node on both ends.
        node: NodeId,
    },
    /// The same pair of nodes is connected twice.
    #[error("duplicate edge between {a} and {b}")]
    DuplicateEdge {
        /// One endpoint.
        a: NodeId,
        /// The other endpoint.
        b: NodeId,
    },
    /// An edge has zero traversal time, which would make moves free.
    #[error("edge ({from}, {to}) has zero weight")]
    ZeroWeight {
        /// First endpoint.
        from: NodeId,
        /// Second endpoint.
        to: NodeId,
    },
    /// A shortest path is as long as the unreachable marker.
    #[error("path from {from} to {to} takes {distance} ticks, too long to tell from unreachable")]
    PathTooLong {
        /// Start of the path.
        from: NodeId,
        /// End of the path.
        to: NodeId,
        /// Its total weight.
        distance: u32,
    },
}
