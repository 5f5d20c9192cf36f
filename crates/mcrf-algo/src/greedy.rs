//! Greedy capacitated forest and the two-step heuristic built on it.
//!
//! All depots grow simultaneously, Prim-Dijkstra style: the globally shortest
//! frontier arc is taken next and its target joins the tree of the arc's
//! source if that depot still has capacity left for the arc's weight.

use mcrf_core::{ArcId, CustomerId, DepotId, EdgeId, Graph, VertexId, VertexKind};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Depot assignment produced by [`greedy_forest`].
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyForest {
    /// Depot serving each customer, `None` if unassigned.
    pub customer_depot: Vec<Option<DepotId>>,
    /// Depot whose tree uses each edge.
    pub edge_depot: Vec<Option<DepotId>>,
    /// Capacity left per depot.
    pub remaining_capacity: Vec<f64>,
}

impl GreedyForest {
    pub fn assigned_customers(&self) -> impl Iterator<Item = (CustomerId, DepotId)> + '_ {
        self.customer_depot
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (CustomerId::new(i), d)))
    }

    pub fn assigned_edges(&self) -> impl Iterator<Item = (EdgeId, DepotId)> + '_ {
        self.edge_depot
            .iter()
            .enumerate()
            .filter_map(|(e, d)| d.map(|d| (EdgeId::new(e), d)))
    }

    pub fn assigned_edge_count(&self) -> usize {
        self.edge_depot.iter().filter(|d| d.is_some()).count()
    }
}

// Frontier entry; depot seeds carry no arc and sort before every real arc.
// Ties on weight are broken by arc id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    weight: Option<u32>,
    arc: Option<ArcId>,
    target: VertexId,
}

/// Builds a capacity-respecting forest rooted at the depots.
///
/// Arcs and customers excluded for a depot are never offered to that
/// depot's tree. Customers that cannot be attached stay unassigned.
pub fn greedy_forest(graph: &Graph) -> GreedyForest {
    let mut vertex_depot: Vec<Option<DepotId>> = vec![None; graph.vertex_count()];
    let mut edge_depot = vec![None; graph.edge_count()];
    let mut remaining_capacity = vec![0.0; graph.depot_count()];
    let mut queue = BinaryHeap::new();

    for depot in graph.depots() {
        vertex_depot[depot.vertex.value()] = Some(depot.id);
        remaining_capacity[depot.id.value()] = depot.capacity;
        queue.push(Reverse(Frontier {
            weight: None,
            arc: None,
            target: depot.vertex,
        }));
    }

    while let Some(Reverse(entry)) = queue.pop() {
        let target = entry.target;
        if matches!(graph.kind(target), VertexKind::Customer(_))
            && vertex_depot[target.value()].is_some()
        {
            continue;
        }
        if let Some(arc) = entry.arc {
            let arc = graph.arc(arc);
            let Some(depot) = vertex_depot[arc.source.value()] else {
                continue;
            };
            let weight = f64::from(graph.edge(arc.edge).weight);
            if remaining_capacity[depot.value()] < weight {
                continue;
            }
            remaining_capacity[depot.value()] -= weight;
            vertex_depot[target.value()] = Some(depot);
            edge_depot[arc.edge.value()] = Some(depot);
        }

        let Some(depot) = vertex_depot[target.value()] else {
            continue;
        };
        for &arc_id in graph.adj_out(target) {
            let arc = graph.arc(arc_id);
            if vertex_depot[arc.target.value()].is_some() || !graph.includes_arc(arc_id, depot) {
                continue;
            }
            if let VertexKind::Customer(customer) = graph.kind(arc.target) {
                if !graph.includes_customer(customer, depot) {
                    continue;
                }
            }
            queue.push(Reverse(Frontier {
                weight: Some(graph.edge(arc.edge).weight),
                arc: Some(arc_id),
                target: arc.target,
            }));
        }
    }

    let customer_depot = graph
        .customers()
        .iter()
        .map(|c| vertex_depot[c.vertex.value()])
        .collect();
    GreedyForest {
        customer_depot,
        edge_depot,
        remaining_capacity,
    }
}

/// Two-step heuristic baseline: the number of edges the greedy forest uses.
pub fn two_step_heuristic(graph: &Graph) -> usize {
    greedy_forest(graph).assigned_edge_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcrf_core::GraphBuilder;

    fn path_instance(capacity: f64) -> Graph {
        let mut builder = GraphBuilder::new("path");
        let v: Vec<_> = (0..4).map(|i| builder.add_vertex(i as f64, 0.0)).collect();
        builder.set_capacity(v[0], capacity);
        builder.add_edge(v[0], v[1], 3).unwrap();
        builder.add_edge(v[1], v[2], 4).unwrap();
        builder.add_edge(v[2], v[3], 5).unwrap();
        builder.finalize()
    }

    #[test]
    fn test_path_stops_when_capacity_runs_out() {
        let forest = greedy_forest(&path_instance(10.0));
        let depot = Some(DepotId::new(0));
        assert_eq!(forest.customer_depot, vec![depot, depot, None]);
        assert_eq!(forest.edge_depot, vec![depot, depot, None]);
        assert_eq!(forest.remaining_capacity, vec![3.0]);
        assert_eq!(two_step_heuristic(&path_instance(10.0)), 2);
    }

    #[test]
    fn test_exact_capacity_is_admitted() {
        let forest = greedy_forest(&path_instance(12.0));
        assert_eq!(forest.assigned_edge_count(), 3);
        assert_eq!(forest.remaining_capacity, vec![0.0]);
    }

    #[test]
    fn test_costlier_path_used_after_rejection() {
        // depot d with capacity 6; customer b reachable directly (weight 7)
        // or through a (2 + 3)
        let mut builder = GraphBuilder::new("detour");
        let d = builder.add_vertex(0.0, 0.0);
        let a = builder.add_vertex(1.0, 0.0);
        let b = builder.add_vertex(2.0, 0.0);
        builder.set_capacity(d, 6.0);
        builder.add_edge(d, b, 7).unwrap();
        builder.add_edge(d, a, 2).unwrap();
        builder.add_edge(a, b, 3).unwrap();
        let forest = greedy_forest(&builder.finalize());
        assert_eq!(
            forest.edge_depot,
            vec![None, Some(DepotId::new(0)), Some(DepotId::new(0))]
        );
        assert_eq!(forest.remaining_capacity, vec![1.0]);
    }

    #[test]
    fn test_excluded_arcs_and_customers_are_skipped() {
        let mut graph = path_instance(100.0);
        let depot = DepotId::new(0);
        // forbid the arc from customer 0 to customer 1
        graph.exclude_arc(ArcId::new(2), depot);
        let forest = greedy_forest(&graph);
        assert_eq!(forest.customer_depot, vec![Some(depot), None, None]);

        let mut graph = path_instance(100.0);
        graph.exclude_customer(CustomerId::new(0), depot);
        let forest = greedy_forest(&graph);
        assert_eq!(forest.assigned_edge_count(), 0);
    }

    #[test]
    fn test_depots_never_exceed_capacity() {
        // 5x5 grid with two depots in opposite corners
        let mut builder = GraphBuilder::new("grid");
        let mut v = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                v.push(builder.add_vertex(x as f64, y as f64));
            }
        }
        builder.set_capacity(v[0], 9.0);
        builder.set_capacity(v[24], 7.0);
        for y in 0..5 {
            for x in 0..5 {
                let i = y * 5 + x;
                if x + 1 < 5 {
                    builder.add_edge(v[i], v[i + 1], ((i * 7) % 5 + 1) as u32).unwrap();
                }
                if y + 1 < 5 {
                    builder.add_edge(v[i], v[i + 5], ((i * 3) % 4 + 1) as u32).unwrap();
                }
            }
        }
        let graph = builder.finalize();
        let forest = greedy_forest(&graph);

        for depot in graph.depots() {
            let used: u32 = forest
                .assigned_edges()
                .filter(|(_, d)| *d == depot.id)
                .map(|(e, _)| graph.edge(e).weight)
                .sum();
            assert!(
                f64::from(used) <= depot.capacity,
                "depot {:?} uses {used} of {}",
                depot.id,
                depot.capacity
            );
            assert_eq!(
                forest.remaining_capacity[depot.id.value()],
                depot.capacity - f64::from(used)
            );
        }
        // every assigned customer is reached by exactly one assigned edge of its depot
        assert_eq!(
            forest.assigned_customers().count(),
            forest.assigned_edge_count()
        );
    }
}
