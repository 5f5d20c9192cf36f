//! Exclusion rules that shrink the (arc, depot) and (customer, depot) space.

use mcrf_core::{ArcId, Graph, VertexKind, EPSILON_WEIGHTS};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Triangle rule: an arc `(i, j)` is useless for depot `d` when the direct arc
/// `(d, j)` is strictly lighter. Returns the number of (arc, depot) pairs removed.
pub fn exclude_triangle(graph: &mut Graph) -> usize {
    let before = graph.included_arc_count();
    let mut excluded = Vec::new();
    for depot in graph.depots() {
        for &dj in graph.adj_out(depot.vertex) {
            let dj = graph.arc(dj);
            let direct = graph.edge(dj.edge).weight;
            for &ij in graph.adj_in(dj.target) {
                if graph.edge(graph.arc(ij).edge).weight > direct {
                    excluded.push((ij, depot.id));
                }
            }
        }
    }
    for (arc, depot) in excluded {
        graph.exclude_arc(arc, depot);
    }
    before - graph.included_arc_count()
}

/// Dijkstra rule: arcs that cannot lie on a path from the depot within its
/// capacity are excluded, and so are customers left without an included
/// entering arc. Paths run through customers only. Returns the number of
/// (arc, depot) pairs removed.
pub fn exclude_dijkstra(graph: &mut Graph) -> usize {
    let before = graph.included_arc_count();
    let depots: Vec<_> = graph.depots().iter().map(|d| (d.id, d.vertex, d.capacity)).collect();

    for (depot, source, capacity) in depots {
        let limit = capacity + EPSILON_WEIGHTS;
        let mut dist: Vec<Option<u64>> = vec![None; graph.vertex_count()];
        dist[source.value()] = Some(0);
        let mut queue = BinaryHeap::new();
        queue.push(Reverse((0u64, source)));

        while let Some(Reverse((d, vertex))) = queue.pop() {
            if dist[vertex.value()].is_some_and(|best| best < d) {
                continue;
            }
            for &arc in graph.adj_out(vertex) {
                let arc = graph.arc(arc);
                if matches!(graph.kind(arc.target), VertexKind::Depot(_)) {
                    continue;
                }
                let next = d + u64::from(graph.edge(arc.edge).weight);
                let improves = dist[arc.target.value()].map_or(true, |best| next < best);
                if improves && next as f64 <= limit {
                    dist[arc.target.value()] = Some(next);
                    queue.push(Reverse((next, arc.target)));
                }
            }
        }

        let unreachable: Vec<ArcId> = graph
            .arcs()
            .iter()
            .filter(|arc| match dist[arc.source.value()] {
                Some(d) => (d + u64::from(graph.edge(arc.edge).weight)) as f64 > limit,
                None => true,
            })
            .map(|arc| arc.id)
            .collect();
        for arc in unreachable {
            graph.exclude_arc(arc, depot);
        }

        let isolated: Vec<_> = graph
            .customers()
            .iter()
            .filter(|c| !graph.adj_in(c.vertex).iter().any(|&a| graph.includes_arc(a, depot)))
            .map(|c| c.id)
            .collect();
        for customer in isolated {
            graph.exclude_customer(customer, depot);
        }
    }
    before - graph.included_arc_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcrf_core::{CustomerId, DepotId, EdgeId, GraphBuilder};

    // depot 0 -- a (2), depot -- b (5), a -- b (1), b -- c (4)
    fn instance(capacity: f64) -> Graph {
        let mut builder = GraphBuilder::new("small");
        let d = builder.add_vertex(0.0, 0.0);
        let a = builder.add_vertex(1.0, 0.0);
        let b = builder.add_vertex(1.0, 1.0);
        let c = builder.add_vertex(2.0, 1.0);
        builder.set_capacity(d, capacity);
        builder.add_edge(d, a, 2).unwrap();
        builder.add_edge(d, b, 5).unwrap();
        builder.add_edge(a, b, 1).unwrap();
        builder.add_edge(b, c, 4).unwrap();
        builder.finalize()
    }

    #[test]
    fn test_triangle_removes_heavier_entering_arcs() {
        let mut graph = instance(100.0);
        let removed = exclude_triangle(&mut graph);
        let depot = DepotId::new(0);
        // entering a: (d,a) 2, (b,a) 1 -> nothing heavier than 2
        // entering b: (d,b) 5, (a,b) 1, (c,b) 4 -> nothing heavier than 5
        assert_eq!(removed, 0);
        assert!(graph.includes_edge(EdgeId::new(3), depot));

        let mut builder = graph.to_builder();
        let keys: Vec<_> = builder.vertex_keys().collect();
        // direct depot edge to c
        builder.add_edge(keys[0], keys[3], 3).unwrap();
        let mut graph = builder.finalize();
        let removed = exclude_triangle(&mut graph);
        // entering c: (d,c) 3, (b,c) 4 -> (b,c) removed
        assert_eq!(removed, 1);
        let [b_to_c, c_to_b] = EdgeId::new(3).arcs();
        assert!(!graph.includes_arc(b_to_c, depot));
        assert!(graph.includes_arc(c_to_b, depot));
    }

    #[test]
    fn test_dijkstra_respects_capacity() {
        let mut graph = instance(4.0);
        let removed = exclude_dijkstra(&mut graph);
        let depot = DepotId::new(0);
        // distances: a = 2, b = 3 (via a), c unreachable (7 > 4)
        assert!(graph.includes_customer(CustomerId::new(0), depot));
        assert!(graph.includes_customer(CustomerId::new(1), depot));
        assert!(!graph.includes_customer(CustomerId::new(2), depot));
        // (d,b) weight 5 > 4
        let [d_to_b, _] = EdgeId::new(1).arcs();
        assert!(!graph.includes_arc(d_to_b, depot));
        // (b,c) 3 + 4 > 4, (c,b) from an unreachable source
        let [b_to_c, c_to_b] = EdgeId::new(3).arcs();
        assert!(!graph.includes_arc(b_to_c, depot));
        assert!(!graph.includes_arc(c_to_b, depot));
        // (a,d) 2 + 2 = 4 stays, (b,d) 3 + 5 goes
        assert_eq!(removed, 4);
    }

    #[test]
    fn test_dijkstra_never_routes_through_other_depots() {
        let mut builder = GraphBuilder::new("two depots");
        let d0 = builder.add_vertex(0.0, 0.0);
        let d1 = builder.add_vertex(1.0, 0.0);
        let c = builder.add_vertex(2.0, 0.0);
        builder.set_capacity(d0, 10.0);
        builder.set_capacity(d1, 10.0);
        builder.add_edge(d0, d1, 1).unwrap();
        builder.add_edge(d1, c, 1).unwrap();
        let mut graph = builder.finalize();
        exclude_dijkstra(&mut graph);

        assert!(!graph.includes_customer(CustomerId::new(0), DepotId::new(0)));
        assert!(graph.includes_customer(CustomerId::new(0), DepotId::new(1)));
        // the arc between depots only leaves the own depot
        let [d0_to_d1, d1_to_d0] = EdgeId::new(0).arcs();
        assert!(graph.includes_arc(d0_to_d1, DepotId::new(0)));
        assert!(!graph.includes_arc(d1_to_d0, DepotId::new(0)));
    }
}
