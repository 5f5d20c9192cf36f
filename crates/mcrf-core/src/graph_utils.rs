use crate::Graph;
use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Summary statistics reported by `mcrf inspect` (sizes, degrees, components, exclusion fill).
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub name: String,
    pub vertex_count: usize,
    pub depot_count: usize,
    pub customer_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub included_arc_pairs: usize,
    pub total_capacity: f64,
    pub mst_weight: f64,
}

/// Total weight of a minimum spanning forest (Prim-Dijkstra started from every
/// unvisited vertex in turn). Exclusions are ignored.
pub fn prim_dijkstra_mst(graph: &Graph) -> f64 {
    let mut visited = vec![false; graph.vertex_count()];
    let mut total = 0u64;
    // (weight, vertex, reached via an edge); component roots enter without an edge
    let mut queue = BinaryHeap::new();

    for start in graph.vertex_ids() {
        if visited[start.value()] {
            continue;
        }
        queue.push(Reverse((0u32, start, false)));
        while let Some(Reverse((weight, vertex, via_edge))) = queue.pop() {
            if visited[vertex.value()] {
                continue;
            }
            visited[vertex.value()] = true;
            if via_edge {
                total += u64::from(weight);
            }
            for &arc in graph.adj_out(vertex) {
                let arc = graph.arc(arc);
                if !visited[arc.target.value()] {
                    queue.push(Reverse((graph.edge(arc.edge).weight, arc.target, true)));
                }
            }
        }
    }
    total as f64
}

/// Calculates instance statistics; components are counted on a `petgraph` view of the topology.
pub fn graph_stats(graph: &Graph) -> GraphStats {
    let node_count = graph.vertex_count();
    let edge_count = graph.edge_count();

    let mut view = UnGraph::<(), u32>::with_capacity(node_count, edge_count);
    let nodes: Vec<_> = (0..node_count).map(|_| view.add_node(())).collect();
    for edge in graph.edges() {
        let [a, b] = edge.endpoints;
        view.add_edge(nodes[a.value()], nodes[b.value()], edge.weight);
    }

    let degrees: Vec<usize> = graph.vertex_ids().map(|v| graph.adj(v).len()).collect();
    let min_degree = degrees.iter().copied().min().unwrap_or(0);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / node_count as f64
    };
    let density = if node_count < 2 {
        0.0
    } else {
        2.0 * edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
    };

    GraphStats {
        name: graph.name().to_string(),
        vertex_count: node_count,
        depot_count: graph.depot_count(),
        customer_count: graph.customer_count(),
        edge_count,
        connected_components: connected_components(&view),
        min_degree,
        max_degree,
        avg_degree,
        density,
        included_arc_pairs: graph.included_arc_count(),
        total_capacity: graph.depots().iter().map(|d| d.capacity).sum(),
        mst_weight: prim_dijkstra_mst(graph),
    }
}
