//! Station navigation graph for Galley kitchens.
//!
//! This crate defines [`NavigationGraph`]: an immutable, undirected graph
//! over station nodes with non-negative integer traversal times. All-pairs
//! shortest-path distances are computed once at construction (Dijkstra
//! from every source) and memoised for the graph's lifetime.
//!
//! Moving to a non-adjacent node is not an error anywhere in this crate:
//! [`NavigationGraph::move_cost`] reports a configurable penalty instead,
//! so exploration never aborts an episode.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod graph;

#[cfg(test)]
pub(crate) mod compliance;

pub use error::NavError;
pub use graph::{Edge, NavigationGraph, DEFAULT_NON_ADJACENT_COST, UNREACHABLE};
