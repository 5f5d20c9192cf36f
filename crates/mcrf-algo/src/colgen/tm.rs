//! Spanning-tree formulation over the graph augmented with a super-root.
//!
//! The super-root is an extra depot (last depot id, capacity 0) joined by
//! zero-weight edges to every customer. A column is a spanning tree of the
//! augmented graph; edge-to-depot labels `x` and vertex-to-depot labels `y`
//! are static master variables tied to the trees through the
//! vertex-edge-label rows.

use super::column::{Column, TmMembership};
use super::engine::{Formulation, PricingOutcome};
use crate::lp::{ConstraintHandle, LinearExpr, LinearRelaxationSolver, Relation, VariableHandle};
use crate::relaxation::Utilization;
use mcrf_core::{DepotId, EdgeId, Graph, McrfError, McrfResult, MembershipBits, VertexId, VertexKind};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

type TmColumn = Column<TmMembership>;

#[derive(Debug, Clone)]
struct TmRows {
    // [edge][depot]
    x: Vec<Vec<Option<VariableHandle>>>,
    // [vertex][depot]
    y: Vec<Vec<Option<VariableHandle>>>,
    // [edge][endpoint][depot]
    vertex_edge_label_1: Vec<[Vec<Option<ConstraintHandle>>; 2]>,
    vertex_edge_label_2: Vec<[Vec<Option<ConstraintHandle>>; 2]>,
    // [edge]
    edge_upper_bound: Vec<ConstraintHandle>,
    // [depot'][depot]
    depot_inclusion: Vec<Vec<ConstraintHandle>>,
    // [depot], None at the super-root
    weight: Vec<Option<ConstraintHandle>>,
    lambda_sum: ConstraintHandle,
}

/// Dual prices of the spanning-tree master.
#[derive(Debug, Clone, PartialEq)]
pub struct TmDuals {
    /// vertex-edge-label-1, `[edge][endpoint][depot]`
    pub alpha: Vec<[Vec<Option<f64>>; 2]>,
    /// vertex-edge-label-2, `[edge][endpoint][depot]`
    pub beta: Vec<[Vec<Option<f64>>; 2]>,
    /// edge-label-upper-bound, `[edge]`
    pub gamma: Vec<f64>,
    /// lambda-sum
    pub zeta: f64,
}

/// Spanning-tree column generation.
#[derive(Debug, Clone)]
pub struct TmRelaxation {
    graph: Graph,
    root: DepotId,
    original_edges: usize,
    rows: Option<TmRows>,
}

impl TmRelaxation {
    /// Builds the augmented graph. Exclusions of `graph` carry over; the
    /// super-root and its edges are included for every depot.
    pub fn new(graph: &Graph) -> McrfResult<Self> {
        let mut builder = graph.to_builder();
        let keys: Vec<_> = builder.vertex_keys().collect();
        let root = builder.add_vertex(0.0, 0.0);
        builder.set_capacity(root, 0.0);
        for customer in graph.customers() {
            let key = keys
                .get(customer.vertex.value())
                .copied()
                .ok_or_else(|| McrfError::Graph(format!("missing vertex {}", customer.vertex.value())))?;
            builder.add_edge(root, key, 0)?;
        }
        let mut augmented = builder.finalize();
        augmented.copy_exclusions_from(graph);

        let root = DepotId::new(augmented.depot_count() - 1);
        debug_assert_eq!(augmented.depot(root).vertex.value(), augmented.vertex_count() - 1);
        Ok(Self {
            graph: augmented,
            root,
            original_edges: graph.edge_count(),
            rows: None,
        })
    }

    /// The augmented graph; its last depot is the super-root.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn root(&self) -> DepotId {
        self.root
    }

    /// Edges incident to the super-root.
    pub fn root_edges(&self) -> &[EdgeId] {
        self.graph.adj(self.graph.depot(self.root).vertex)
    }

    /// Reads every row's dual through `dual`. Empty before initialization.
    pub fn duals_from(&self, dual: impl Fn(ConstraintHandle) -> f64) -> TmDuals {
        let Some(rows) = &self.rows else {
            return TmDuals {
                alpha: Vec::new(),
                beta: Vec::new(),
                gamma: Vec::new(),
                zeta: 0.0,
            };
        };
        let read = |labels: &Vec<[Vec<Option<ConstraintHandle>>; 2]>| -> Vec<[Vec<Option<f64>>; 2]> {
            labels
                .iter()
                .map(|endpoints| {
                    endpoints
                        .each_ref()
                        .map(|per_depot| per_depot.iter().map(|c| c.map(&dual)).collect())
                })
                .collect()
        };
        TmDuals {
            alpha: read(&rows.vertex_edge_label_1),
            beta: read(&rows.vertex_edge_label_2),
            gamma: rows.edge_upper_bound.iter().map(|&c| dual(c)).collect(),
            zeta: dual(rows.lambda_sum),
        }
    }

    fn add_edge(&self, rows: &TmRows, column: &mut TmColumn, edge: EdgeId) {
        let e = edge.value();
        for endpoint in 0..2 {
            for row in rows.vertex_edge_label_1[e][endpoint].iter().flatten() {
                column.add_term(1.0, *row);
            }
            for row in rows.vertex_edge_label_2[e][endpoint].iter().flatten() {
                column.add_term(1.0, *row);
            }
        }
        column.add_term(-1.0, rows.edge_upper_bound[e]);
        column.membership_mut().set(e);
    }

    fn edge_weight(duals: &TmDuals, edge: EdgeId) -> f64 {
        let e = edge.value();
        let labels: f64 = (0..2)
            .map(|endpoint| {
                duals.alpha[e][endpoint]
                    .iter()
                    .zip(&duals.beta[e][endpoint])
                    .map(|(a, b)| a.unwrap_or(0.0) + b.unwrap_or(0.0))
                    .sum::<f64>()
            })
            .sum();
        labels - duals.gamma[e]
    }
}

// Frontier entry of the pricing search; depot seeds carry no edge and
// weight -inf. Ties on weight are broken by edge id, then target.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    weight: f64,
    edge: Option<EdgeId>,
    target: VertexId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then(self.edge.cmp(&other.edge))
            .then(self.target.cmp(&other.target))
    }
}

impl Formulation for TmRelaxation {
    type Membership = TmMembership;
    type Duals = TmDuals;

    fn name(&self) -> &'static str {
        "TM"
    }

    fn initialize(&mut self, solver: &mut dyn LinearRelaxationSolver) -> McrfResult<Vec<TmColumn>> {
        let graph = &self.graph;
        let root = self.root;

        // static labels
        let x: Vec<Vec<Option<VariableHandle>>> = graph
            .edges()
            .iter()
            .map(|edge| {
                graph
                    .depots()
                    .iter()
                    .map(|d| {
                        let objective = if d.id == root { 0.0 } else { 1.0 };
                        graph
                            .includes_edge(edge.id, d.id)
                            .then(|| solver.add_variable(0.0, f64::INFINITY, objective, &[]))
                    })
                    .collect()
            })
            .collect();
        let y: Vec<Vec<Option<VariableHandle>>> = graph
            .vertex_ids()
            .map(|v| {
                graph
                    .depots()
                    .iter()
                    .map(|d| {
                        let allowed = match graph.kind(v) {
                            VertexKind::Customer(c) => graph.includes_customer(c, d.id),
                            VertexKind::Depot(_) => true,
                        };
                        allowed.then(|| solver.add_variable(0.0, 1.0, 0.0, &[]))
                    })
                    .collect()
            })
            .collect();

        let mut vertex_edge_label_1 = Vec::with_capacity(graph.edge_count());
        let mut vertex_edge_label_2 = Vec::with_capacity(graph.edge_count());
        for edge in graph.edges() {
            let e = edge.id.value();
            let mut label_1: [Vec<Option<ConstraintHandle>>; 2] = [Vec::new(), Vec::new()];
            let mut label_2: [Vec<Option<ConstraintHandle>>; 2] = [Vec::new(), Vec::new()];
            for (endpoint, &v) in edge.endpoints.iter().enumerate() {
                for d in graph.depots() {
                    let dd = d.id.value();
                    // -x + y <= 1
                    label_1[endpoint].push(y[v.value()][dd].map(|y_v| {
                        let expr = LinearExpr::new().term(-1.0, x[e][dd]).term(1.0, Some(y_v));
                        solver.add_constraint(expr, Relation::LessEqual, 1.0)
                    }));
                    // x - y <= 1
                    label_2[endpoint].push(x[e][dd].map(|x_e| {
                        let expr = LinearExpr::new().term(1.0, Some(x_e)).term(-1.0, y[v.value()][dd]);
                        solver.add_constraint(expr, Relation::LessEqual, 1.0)
                    }));
                }
            }
            vertex_edge_label_1.push(label_1);
            vertex_edge_label_2.push(label_2);
        }

        let edge_upper_bound: Vec<ConstraintHandle> = x
            .iter()
            .map(|per_depot| {
                let expr = per_depot
                    .iter()
                    .fold(LinearExpr::new(), |expr, &x_e| expr.term(1.0, x_e));
                solver.add_constraint(expr, Relation::Equal, 0.0)
            })
            .collect();

        let depot_inclusion: Vec<Vec<ConstraintHandle>> = graph
            .depots()
            .iter()
            .map(|other| {
                graph
                    .depots()
                    .iter()
                    .map(|d| {
                        let rhs = if other.id == d.id { 1.0 } else { 0.0 };
                        let expr = LinearExpr::new().term(1.0, y[other.vertex.value()][d.id.value()]);
                        solver.add_constraint(expr, Relation::Equal, rhs)
                    })
                    .collect()
            })
            .collect();

        let weight: Vec<Option<ConstraintHandle>> = graph
            .depots()
            .iter()
            .map(|d| {
                (d.id != root).then(|| {
                    let expr = graph.edges().iter().fold(LinearExpr::new(), |expr, edge| {
                        expr.term(f64::from(edge.weight), x[edge.id.value()][d.id.value()])
                    });
                    solver.add_constraint(expr, Relation::LessEqual, d.capacity)
                })
            })
            .collect();

        let lambda_sum = solver.add_constraint(LinearExpr::new(), Relation::Equal, 1.0);

        let rows = TmRows {
            x,
            y,
            vertex_edge_label_1,
            vertex_edge_label_2,
            edge_upper_bound,
            depot_inclusion,
            weight,
            lambda_sum,
        };

        // the star of super-root edges
        let mut column = Column::new(MembershipBits::new(self.graph.edge_count()));
        for &edge in self.root_edges() {
            self.add_edge(&rows, &mut column, edge);
        }
        column.add_term(1.0, rows.lambda_sum);

        self.rows = Some(rows);
        Ok(vec![column])
    }

    fn read_duals(&self, solver: &dyn LinearRelaxationSolver) -> TmDuals {
        self.duals_from(|c| solver.dual_value(c))
    }

    fn price(&self, duals: &TmDuals, tolerance: f64) -> PricingOutcome<TmMembership> {
        let Some(rows) = &self.rows else {
            debug_assert!(false, "pricing before initialization");
            return PricingOutcome {
                total: 0.0,
                dual: duals.zeta,
                column: None,
            };
        };
        let graph = &self.graph;
        let weights: Vec<f64> = graph
            .edges()
            .iter()
            .map(|edge| Self::edge_weight(duals, edge.id))
            .collect();

        let mut column = Column::new(MembershipBits::new(graph.edge_count()));
        let mut total = 0.0;
        let mut visited = vec![false; graph.vertex_count()];
        let mut queue = BinaryHeap::new();
        for depot in graph.depots() {
            queue.push(Reverse(Frontier {
                weight: f64::NEG_INFINITY,
                edge: None,
                target: depot.vertex,
            }));
        }

        while let Some(Reverse(entry)) = queue.pop() {
            if visited[entry.target.value()] {
                continue;
            }
            visited[entry.target.value()] = true;
            if let Some(edge) = entry.edge {
                self.add_edge(rows, &mut column, edge);
                total += entry.weight;
            }
            for &arc in graph.adj_out(entry.target) {
                let arc = graph.arc(arc);
                if visited[arc.target.value()] {
                    continue;
                }
                queue.push(Reverse(Frontier {
                    weight: weights[arc.edge.value()],
                    edge: Some(arc.edge),
                    target: arc.target,
                }));
            }
        }

        if total >= -duals.zeta - tolerance {
            return PricingOutcome {
                total,
                dual: duals.zeta,
                column: None,
            };
        }
        column.add_term(1.0, rows.lambda_sum);
        PricingOutcome {
            total,
            dual: duals.zeta,
            column: Some(column),
        }
    }

    /// Customer usage is `Σ y` over the real depots, capped at 1; edge usage
    /// is `Σ x` over the real depots, for the edges of the original graph.
    fn utilization(
        &self,
        solver: &dyn LinearRelaxationSolver,
        _columns: &[(&TmColumn, f64)],
    ) -> Utilization {
        let Some(rows) = &self.rows else {
            return Utilization::default();
        };
        let real = |d: usize| d != self.root.value();
        let customers = self
            .graph
            .customers()
            .iter()
            .map(|c| {
                let used: f64 = rows.y[c.vertex.value()]
                    .iter()
                    .enumerate()
                    .filter(|(d, _)| real(*d))
                    .filter_map(|(_, y)| y.map(|y| solver.primal_value(y)))
                    .sum();
                used.min(1.0)
            })
            .collect();
        let edges = rows.x[..self.original_edges]
            .iter()
            .map(|per_depot| {
                per_depot
                    .iter()
                    .enumerate()
                    .filter(|(d, _)| real(*d))
                    .filter_map(|(_, x)| x.map(|x| solver.primal_value(x)))
                    .sum::<f64>()
            })
            .collect();
        Utilization { customers, edges }
    }
}
