//! Immutable instance topology.
//!
//! A [`Graph`] is produced once by [`GraphBuilder::finalize`](crate::GraphBuilder::finalize)
//! and is read-only afterwards apart from exclusion clearing performed by
//! preprocessing. Algorithms keep their scratch state (visited flags, depot
//! assignments) in local vectors sized from the graph, so nothing carries over
//! between runs.

use crate::{ArcId, CustomerId, DepotId, EdgeId, ExclusionIndex, VertexId};
use serde::Serialize;

/// A depot vertex with a capacity on the total edge weight of its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Depot {
    pub vertex: VertexId,
    pub id: DepotId,
    pub capacity: f64,
    pub x: f64,
    pub y: f64,
}

/// A customer vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub vertex: VertexId,
    pub id: CustomerId,
    pub x: f64,
    pub y: f64,
}

/// Compact tag identifying what a vertex is and its index within its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Depot(DepotId),
    Customer(CustomerId),
}

impl VertexKind {
    pub fn depot(self) -> Option<DepotId> {
        match self {
            VertexKind::Depot(d) => Some(d),
            VertexKind::Customer(_) => None,
        }
    }

    pub fn customer(self) -> Option<CustomerId> {
        match self {
            VertexKind::Customer(c) => Some(c),
            VertexKind::Depot(_) => None,
        }
    }
}

/// Borrowed view of a vertex.
#[derive(Debug, Clone, Copy)]
pub enum Vertex<'a> {
    Depot(&'a Depot),
    Customer(&'a Customer),
}

impl Vertex<'_> {
    pub fn id(&self) -> VertexId {
        match self {
            Vertex::Depot(d) => d.vertex,
            Vertex::Customer(c) => c.vertex,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        match self {
            Vertex::Depot(d) => (d.x, d.y),
            Vertex::Customer(c) => (c.x, c.y),
        }
    }
}

/// Undirected weighted edge `{a, b}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub endpoints: [VertexId; 2],
    pub weight: u32,
}

impl Edge {
    /// Position (0 or 1) of `vertex` among the endpoints.
    pub fn endpoint_index(&self, vertex: VertexId) -> Option<usize> {
        self.endpoints.iter().position(|v| *v == vertex)
    }

    /// The endpoint opposite to `vertex`.
    pub fn other(&self, vertex: VertexId) -> VertexId {
        if self.endpoints[0] == vertex {
            self.endpoints[1]
        } else {
            self.endpoints[0]
        }
    }

    pub fn arcs(&self) -> [ArcId; 2] {
        self.id.arcs()
    }
}

/// Directed traversal of an [`Edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Arc {
    pub id: ArcId,
    pub edge: EdgeId,
    pub source: VertexId,
    pub target: VertexId,
}

impl Arc {
    pub fn opposite(&self) -> ArcId {
        self.id.opposite()
    }
}

/// Graph with immutable structure plus its exclusion index.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    kinds: Vec<VertexKind>,
    depots: Vec<Depot>,
    customers: Vec<Customer>,
    edges: Vec<Edge>,
    arcs: Vec<Arc>,
    adj: Vec<Vec<EdgeId>>,
    adj_out: Vec<Vec<ArcId>>,
    adj_in: Vec<Vec<ArcId>>,
    exclusion: ExclusionIndex,
}

impl Graph {
    /// Assembles a graph from already numbered parts. Endpoints must refer to
    /// existing vertices; the builder guarantees this.
    pub(crate) fn from_parts(
        name: String,
        kinds: Vec<VertexKind>,
        depots: Vec<Depot>,
        customers: Vec<Customer>,
        edges: Vec<Edge>,
    ) -> Self {
        let vertex_count = kinds.len();
        let mut arcs = Vec::with_capacity(2 * edges.len());
        let mut adj = vec![Vec::new(); vertex_count];
        let mut adj_out = vec![Vec::new(); vertex_count];
        let mut adj_in = vec![Vec::new(); vertex_count];

        for edge in &edges {
            let [a, b] = edge.endpoints;
            let [forward, backward] = edge.id.arcs();
            for (id, source, target) in [(forward, a, b), (backward, b, a)] {
                arcs.push(Arc {
                    id,
                    edge: edge.id,
                    source,
                    target,
                });
                adj_out[source.value()].push(id);
                adj_in[target.value()].push(id);
                adj[source.value()].push(edge.id);
            }
        }

        let exclusion = ExclusionIndex::new(arcs.len(), customers.len(), depots.len());
        Self {
            name,
            kinds,
            depots,
            customers,
            edges,
            arcs,
            adj,
            adj_out,
            adj_in,
            exclusion,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn depot_count(&self) -> usize {
        self.depots.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.kinds.len()).map(VertexId::new)
    }

    #[inline]
    pub fn kind(&self, vertex: VertexId) -> VertexKind {
        self.kinds[vertex.value()]
    }

    pub fn vertex(&self, vertex: VertexId) -> Vertex<'_> {
        match self.kind(vertex) {
            VertexKind::Depot(d) => Vertex::Depot(&self.depots[d.value()]),
            VertexKind::Customer(c) => Vertex::Customer(&self.customers[c.value()]),
        }
    }

    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    #[inline]
    pub fn depot(&self, depot: DepotId) -> &Depot {
        &self.depots[depot.value()]
    }

    #[inline]
    pub fn customer(&self, customer: CustomerId) -> &Customer {
        &self.customers[customer.value()]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn edge(&self, edge: EdgeId) -> &Edge {
        &self.edges[edge.value()]
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    #[inline]
    pub fn arc(&self, arc: ArcId) -> &Arc {
        &self.arcs[arc.value()]
    }

    /// Edges incident to `vertex`, each listed once.
    #[inline]
    pub fn adj(&self, vertex: VertexId) -> &[EdgeId] {
        &self.adj[vertex.value()]
    }

    /// Arcs leaving `vertex`.
    #[inline]
    pub fn adj_out(&self, vertex: VertexId) -> &[ArcId] {
        &self.adj_out[vertex.value()]
    }

    /// Arcs entering `vertex`.
    #[inline]
    pub fn adj_in(&self, vertex: VertexId) -> &[ArcId] {
        &self.adj_in[vertex.value()]
    }

    pub fn exclusion(&self) -> &ExclusionIndex {
        &self.exclusion
    }

    /// Indicates whether `arc` may be used in the subtree of `depot`.
    #[inline]
    pub fn includes_arc(&self, arc: ArcId, depot: DepotId) -> bool {
        self.exclusion.includes_arc(arc, depot)
    }

    /// Indicates whether `edge` may be used by `depot`, i.e. either of its arcs is.
    #[inline]
    pub fn includes_edge(&self, edge: EdgeId, depot: DepotId) -> bool {
        edge.arcs().into_iter().any(|arc| self.includes_arc(arc, depot))
    }

    /// Indicates whether `customer` may be served by `depot`.
    #[inline]
    pub fn includes_customer(&self, customer: CustomerId, depot: DepotId) -> bool {
        self.exclusion.includes_customer(customer, depot)
    }

    /// Marks `arc` as excluded for the subtree of `depot`.
    pub fn exclude_arc(&mut self, arc: ArcId, depot: DepotId) {
        self.exclusion.exclude_arc(arc, depot);
    }

    /// Marks `customer` as excluded for the subtree of `depot`.
    pub fn exclude_customer(&mut self, customer: CustomerId, depot: DepotId) {
        self.exclusion.exclude_customer(customer, depot);
    }

    /// Number of arcs times depots minus the excluded (arc, depot) pairs.
    pub fn included_arc_count(&self) -> usize {
        self.exclusion.included_arc_count()
    }

    /// Copies the exclusions of `other` onto the shared prefix of this graph.
    ///
    /// Used when a graph is extended (extra vertices and edges appended after
    /// the original ones) so that original ids keep their meaning.
    pub fn copy_exclusions_from(&mut self, other: &Graph) {
        for depot in 0..other.depot_count() {
            let depot = DepotId::new(depot);
            for arc in 0..other.arc_count() {
                let arc = ArcId::new(arc);
                if !other.includes_arc(arc, depot) {
                    self.exclude_arc(arc, depot);
                }
            }
            for customer in 0..other.customer_count() {
                let customer = CustomerId::new(customer);
                if !other.includes_customer(customer, depot) {
                    self.exclude_customer(customer, depot);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::GraphBuilder;

    use super::*;

    fn triangle() -> Graph {
        let mut builder = GraphBuilder::new("triangle");
        let d = builder.add_vertex(0.0, 0.0);
        let a = builder.add_vertex(1.0, 0.0);
        let b = builder.add_vertex(0.0, 1.0);
        builder.set_capacity(d, 5.0);
        builder.add_edge(d, a, 2).unwrap();
        builder.add_edge(a, b, 3).unwrap();
        builder.add_edge(b, d, 4).unwrap();
        builder.finalize()
    }

    #[test]
    fn arcs_and_adjacency_are_consistent() {
        let graph = triangle();
        assert_eq!(graph.arc_count(), 6);
        for arc in graph.arcs() {
            assert!(graph.adj_out(arc.source).contains(&arc.id));
            assert!(graph.adj_in(arc.target).contains(&arc.id));
            let opposite = graph.arc(arc.opposite());
            assert_eq!(opposite.source, arc.target);
            assert_eq!(opposite.target, arc.source);
            assert_eq!(opposite.edge, arc.edge);
        }
        for vertex in graph.vertex_ids() {
            assert_eq!(graph.adj(vertex).len(), 2);
        }
    }

    #[test]
    fn vertex_kinds_follow_insertion_order() {
        let graph = triangle();
        assert_eq!(graph.kind(VertexId::new(0)), VertexKind::Depot(DepotId::new(0)));
        assert_eq!(
            graph.kind(VertexId::new(2)),
            VertexKind::Customer(CustomerId::new(1))
        );
        assert_eq!(graph.depot(DepotId::new(0)).capacity, 5.0);
        assert!(matches!(graph.vertex(VertexId::new(1)), Vertex::Customer(_)));
    }

    #[test]
    fn edge_inclusion_needs_one_arc() {
        let mut graph = triangle();
        let depot = DepotId::new(0);
        let edge = EdgeId::new(1);
        let [forward, backward] = edge.arcs();

        graph.exclude_arc(forward, depot);
        assert!(graph.includes_edge(edge, depot));
        graph.exclude_arc(backward, depot);
        assert!(!graph.includes_edge(edge, depot));
        assert_eq!(graph.included_arc_count(), 4);
    }

    #[test]
    fn edge_endpoint_helpers() {
        let graph = triangle();
        let edge = graph.edge(EdgeId::new(2));
        assert_eq!(edge.endpoint_index(VertexId::new(2)), Some(0));
        assert_eq!(edge.endpoint_index(VertexId::new(0)), Some(1));
        assert_eq!(edge.endpoint_index(VertexId::new(1)), None);
        assert_eq!(edge.other(VertexId::new(2)), VertexId::new(0));
    }
}
