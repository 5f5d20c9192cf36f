//! # mcrf-core: Multi-depot Capacitated Rooted Forest Modeling Core
//!
//! Provides the graph model shared by every algorithm in the workspace: an
//! immutable vertex/edge/arc topology with depots and customers, plus the
//! per-depot exclusion index that preprocessing fills in and pricing consults.
//!
//! ## Design Philosophy
//!
//! Instances are **undirected simple graphs** where:
//! - **Vertices**: [`Depot`]s (with a capacity) and [`Customer`]s
//! - **Edges**: undirected, integer weight, each owning two directed [`Arc`]s
//!
//! Edges carry weights and constraint bookkeeping; arcs are the unit of
//! directed traversal and of exclusion. Arc `2e` runs from the first endpoint
//! of edge `e` to the second, arc `2e + 1` runs back.
//!
//! ## Quick Start
//!
//! ```rust
//! use mcrf_core::*;
//!
//! let mut builder = GraphBuilder::new("path");
//! let depot = builder.add_vertex(0.0, 0.0);
//! let a = builder.add_vertex(1.0, 0.0);
//! let b = builder.add_vertex(2.0, 0.0);
//! builder.set_capacity(depot, 10.0);
//! builder.add_edge(depot, a, 3).unwrap();
//! builder.add_edge(a, b, 4).unwrap();
//!
//! let graph = builder.finalize();
//! assert_eq!(graph.depot_count(), 1);
//! assert_eq!(graph.customer_count(), 2);
//! assert!(graph.includes_edge(EdgeId::new(1), DepotId::new(0)));
//! ```
//!
//! ## Modules
//!
//! - [`graph`] - Immutable topology and exclusion queries
//! - [`builder`] - Mutable construction graph that finalizes into [`Graph`]
//! - [`exclusion`] - The (arc, depot) / (customer, depot) inclusion tables
//! - [`bitset`] - Fixed-size membership bit sets used by columns
//! - [`graph_utils`] - Minimum spanning forest weight and instance statistics

use serde::{Deserialize, Serialize};

pub mod bitset;
pub mod builder;
pub mod constants;
pub mod error;
pub mod exclusion;
pub mod graph;
pub mod graph_utils;

pub use bitset::MembershipBits;
pub use builder::{EdgeKey, GraphBuilder, VertexKey};
pub use constants::*;
pub use error::{McrfError, McrfResult};
pub use exclusion::ExclusionIndex;
pub use graph::{Arc, Customer, Depot, Edge, Graph, Vertex, VertexKind};
pub use graph_utils::{graph_stats, prim_dijkstra_mst, GraphStats};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepotId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcId(usize);

impl VertexId {
    #[inline]
    pub fn new(value: usize) -> Self {
        VertexId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl DepotId {
    #[inline]
    pub fn new(value: usize) -> Self {
        DepotId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl CustomerId {
    #[inline]
    pub fn new(value: usize) -> Self {
        CustomerId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl EdgeId {
    #[inline]
    pub fn new(value: usize) -> Self {
        EdgeId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }

    /// The two arcs `(a, b)` and `(b, a)` realizing this edge.
    #[inline]
    pub fn arcs(&self) -> [ArcId; 2] {
        [ArcId(2 * self.0), ArcId(2 * self.0 + 1)]
    }
}

impl ArcId {
    #[inline]
    pub fn new(value: usize) -> Self {
        ArcId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }

    /// The edge this arc belongs to.
    #[inline]
    pub fn edge(&self) -> EdgeId {
        EdgeId(self.0 / 2)
    }

    /// The reverse arc of the same edge.
    #[inline]
    pub fn opposite(&self) -> ArcId {
        ArcId(self.0 ^ 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_ids_pair_up_per_edge() {
        let edge = EdgeId::new(7);
        let [forward, backward] = edge.arcs();
        assert_eq!(forward.value(), 14);
        assert_eq!(backward.value(), 15);
        assert_eq!(forward.opposite(), backward);
        assert_eq!(backward.opposite(), forward);
        assert_eq!(forward.edge(), edge);
        assert_eq!(backward.edge(), edge);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&DepotId::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: CustomerId = serde_json::from_str("12").unwrap();
        assert_eq!(back, CustomerId::new(12));
    }
}
