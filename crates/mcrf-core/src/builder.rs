//! Mutable construction graph.
//!
//! Instance readers and shaping operations (edge cuts, depot placement) work
//! on a [`GraphBuilder`]. Vertices and edges are addressed by stable keys that
//! survive removals; [`GraphBuilder::finalize`] renumbers the survivors densely
//! into an immutable [`Graph`].

use crate::graph::{Customer, Depot, Edge, Graph, VertexKind};
use crate::{CustomerId, DepotId, EdgeId, McrfError, McrfResult, VertexId};

/// Stable handle of a vertex inside a [`GraphBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexKey(usize);

/// Stable handle of an edge inside a [`GraphBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(usize);

#[derive(Debug, Clone)]
struct BuilderVertex {
    x: f64,
    y: f64,
    capacity: Option<f64>,
    adj: Vec<EdgeKey>,
}

#[derive(Debug, Clone)]
struct BuilderEdge {
    a: VertexKey,
    b: VertexKey,
    weight: u32,
}

/// Graph whose structure may still change.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    name: String,
    vertices: Vec<Option<BuilderVertex>>,
    edges: Vec<Option<BuilderEdge>>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds a customer vertex at the given coordinates.
    pub fn add_vertex(&mut self, x: f64, y: f64) -> VertexKey {
        self.vertices.push(Some(BuilderVertex {
            x,
            y,
            capacity: None,
            adj: Vec::new(),
        }));
        VertexKey(self.vertices.len() - 1)
    }

    /// Turns `vertex` into a depot with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` was removed.
    pub fn set_capacity(&mut self, vertex: VertexKey, capacity: f64) {
        self.vertex_mut(vertex).capacity = Some(capacity);
    }

    pub fn capacity(&self, vertex: VertexKey) -> Option<f64> {
        self.vertex_ref(vertex).capacity
    }

    pub fn position(&self, vertex: VertexKey) -> (f64, f64) {
        let v = self.vertex_ref(vertex);
        (v.x, v.y)
    }

    /// Adds an undirected edge between two live vertices.
    pub fn add_edge(&mut self, a: VertexKey, b: VertexKey, weight: u32) -> McrfResult<EdgeKey> {
        if a == b {
            return Err(McrfError::Graph(format!("self loop on vertex {}", a.0)));
        }
        for key in [a, b] {
            if !self.contains_vertex(key) {
                return Err(McrfError::Graph(format!("unknown vertex {}", key.0)));
            }
        }
        let key = EdgeKey(self.edges.len());
        self.edges.push(Some(BuilderEdge { a, b, weight }));
        self.vertex_mut(a).adj.push(key);
        self.vertex_mut(b).adj.push(key);
        Ok(key)
    }

    /// Removes an edge. Removing an edge twice is a no-op.
    pub fn remove_edge(&mut self, edge: EdgeKey) {
        let Some(removed) = self.edges.get_mut(edge.0).and_then(Option::take) else {
            return;
        };
        for endpoint in [removed.a, removed.b] {
            if let Some(Some(vertex)) = self.vertices.get_mut(endpoint.0) {
                vertex.adj.retain(|k| *k != edge);
            }
        }
    }

    /// Removes a vertex together with all incident edges.
    pub fn remove_vertex(&mut self, vertex: VertexKey) {
        let incident = match self.vertices.get(vertex.0) {
            Some(Some(v)) => v.adj.clone(),
            _ => return,
        };
        for edge in incident {
            self.remove_edge(edge);
        }
        self.vertices[vertex.0] = None;
    }

    pub fn contains_vertex(&self, vertex: VertexKey) -> bool {
        matches!(self.vertices.get(vertex.0), Some(Some(_)))
    }

    /// Live vertices in insertion order.
    pub fn vertex_keys(&self) -> impl Iterator<Item = VertexKey> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| VertexKey(i))
    }

    /// Live edges in insertion order as `(key, a, b, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, VertexKey, VertexKey, u32)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeKey(i), e.a, e.b, e.weight)))
    }

    /// Edges incident to `vertex` paired with the opposite endpoint.
    pub fn incident(&self, vertex: VertexKey) -> Vec<(EdgeKey, VertexKey)> {
        self.vertex_ref(vertex)
            .adj
            .iter()
            .filter_map(|key| {
                self.edges[key.0].as_ref().map(|e| {
                    let other = if e.a == vertex { e.b } else { e.a };
                    (*key, other)
                })
            })
            .collect()
    }

    pub fn edge_weight(&self, edge: EdgeKey) -> Option<u32> {
        self.edges.get(edge.0).and_then(|e| e.as_ref()).map(|e| e.weight)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_some()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    pub fn depot_count(&self) -> usize {
        self.vertices
            .iter()
            .flatten()
            .filter(|v| v.capacity.is_some())
            .count()
    }

    /// Live vertex at position `index` of the insertion order.
    pub fn vertex_at(&self, index: usize) -> Option<VertexKey> {
        self.vertex_keys().nth(index)
    }

    /// Produces the immutable graph. Vertex ids follow insertion order of the
    /// live vertices; depot and customer ids are assigned in the same order.
    pub fn finalize(&self) -> Graph {
        let mut vertex_ids = vec![None; self.vertices.len()];
        let mut kinds = Vec::new();
        let mut depots = Vec::new();
        let mut customers = Vec::new();

        for (index, vertex) in self.vertices.iter().enumerate() {
            let Some(vertex) = vertex else { continue };
            let id = VertexId::new(kinds.len());
            vertex_ids[index] = Some(id);
            match vertex.capacity {
                Some(capacity) => {
                    let depot = DepotId::new(depots.len());
                    depots.push(Depot {
                        vertex: id,
                        id: depot,
                        capacity,
                        x: vertex.x,
                        y: vertex.y,
                    });
                    kinds.push(VertexKind::Depot(depot));
                }
                None => {
                    let customer = CustomerId::new(customers.len());
                    customers.push(Customer {
                        vertex: id,
                        id: customer,
                        x: vertex.x,
                        y: vertex.y,
                    });
                    kinds.push(VertexKind::Customer(customer));
                }
            }
        }

        let edges = self
            .edges
            .iter()
            .flatten()
            .filter_map(|e| Some((vertex_ids[e.a.0]?, vertex_ids[e.b.0]?, e.weight)))
            .enumerate()
            .map(|(i, (a, b, weight))| Edge {
                id: EdgeId::new(i),
                endpoints: [a, b],
                weight,
            })
            .collect();

        Graph::from_parts(self.name.clone(), kinds, depots, customers, edges)
    }

    fn vertex_ref(&self, vertex: VertexKey) -> &BuilderVertex {
        match self.vertices.get(vertex.0) {
            Some(Some(v)) => v,
            _ => panic!("vertex {} is not part of the graph", vertex.0),
        }
    }

    fn vertex_mut(&mut self, vertex: VertexKey) -> &mut BuilderVertex {
        match self.vertices.get_mut(vertex.0) {
            Some(Some(v)) => v,
            _ => panic!("vertex {} is not part of the graph", vertex.0),
        }
    }
}

impl Graph {
    /// Copies structure, coordinates and depot capacities into a new builder.
    /// Vertex keys equal the vertex ids of this graph. Exclusions are not copied.
    pub fn to_builder(&self) -> GraphBuilder {
        let mut builder = GraphBuilder::new(self.name());
        for vertex in self.vertex_ids() {
            let (x, y) = self.vertex(vertex).position();
            let key = builder.add_vertex(x, y);
            if let VertexKind::Depot(depot) = self.kind(vertex) {
                builder.set_capacity(key, self.depot(depot).capacity);
            }
        }
        for edge in self.edges() {
            let [a, b] = edge.endpoints;
            builder.edges.push(Some(BuilderEdge {
                a: VertexKey(a.value()),
                b: VertexKey(b.value()),
                weight: edge.weight,
            }));
            let key = EdgeKey(builder.edges.len() - 1);
            builder.vertex_mut(VertexKey(a.value())).adj.push(key);
            builder.vertex_mut(VertexKey(b.value())).adj.push(key);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_loop_rejected() {
        let mut builder = GraphBuilder::new("loop");
        let v = builder.add_vertex(0.0, 0.0);
        let err = builder.add_edge(v, v, 1).unwrap_err();
        assert!(matches!(err, McrfError::Graph(_)));
    }

    #[test]
    fn test_finalize_assigns_ids_in_vertex_order() {
        let mut builder = GraphBuilder::new("ids");
        let c0 = builder.add_vertex(0.0, 0.0);
        let d0 = builder.add_vertex(1.0, 0.0);
        let c1 = builder.add_vertex(2.0, 0.0);
        builder.set_capacity(d0, 7.0);
        builder.add_edge(c0, d0, 1).unwrap();
        builder.add_edge(d0, c1, 2).unwrap();

        let graph = builder.finalize();
        assert_eq!(graph.depot_count(), 1);
        assert_eq!(graph.customer_count(), 2);
        assert_eq!(graph.depot(DepotId::new(0)).vertex, VertexId::new(1));
        assert_eq!(graph.customer(CustomerId::new(1)).vertex, VertexId::new(2));
        assert_eq!(graph.edge(EdgeId::new(1)).weight, 2);
    }

    #[test]
    fn test_remove_vertex_drops_incident_edges() {
        let mut builder = GraphBuilder::new("remove");
        let a = builder.add_vertex(0.0, 0.0);
        let b = builder.add_vertex(1.0, 0.0);
        let c = builder.add_vertex(2.0, 0.0);
        builder.add_edge(a, b, 1).unwrap();
        builder.add_edge(b, c, 1).unwrap();
        builder.add_edge(a, c, 5).unwrap();

        builder.remove_vertex(b);
        assert_eq!(builder.vertex_count(), 2);
        assert_eq!(builder.edge_count(), 1);
        assert_eq!(builder.incident(a).len(), 1);

        let graph = builder.finalize();
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(
            graph.edge(EdgeId::new(0)).endpoints,
            [VertexId::new(0), VertexId::new(1)]
        );
        assert_eq!(graph.edge(EdgeId::new(0)).weight, 5);
    }

    #[test]
    fn test_to_builder_round_trip() {
        let mut builder = GraphBuilder::new("copy");
        let d = builder.add_vertex(0.0, 0.0);
        let c = builder.add_vertex(3.0, 4.0);
        builder.set_capacity(d, 2.5);
        builder.add_edge(d, c, 5).unwrap();
        let graph = builder.finalize();

        let copy = graph.to_builder().finalize();
        assert_eq!(copy.name(), "copy");
        assert_eq!(copy.depots(), graph.depots());
        assert_eq!(copy.customers(), graph.customers());
        assert_eq!(copy.edges(), graph.edges());
    }
}
