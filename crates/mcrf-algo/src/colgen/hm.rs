//! Subforest formulation: one column per capacity-feasible forest in which
//! every customer is assigned to at most one depot.
//!
//! Master rows (all created empty, columns fill them):
//!
//! | family | index | relation |
//! |--------|-------|----------|
//! | vertex-inclusion-1 | customer `i`, depot `d` including `i` | `≤ 0` |
//! | vertex-inclusion-2 | edge `e`, customer endpoint, depot `d` including `e` | `≤ 0` |
//! | weight | depot `d` | `≤ capacity(d)` |
//! | edge-vertex-count | | `= 0` |
//! | lambda-sum | | `≤ 1` |
//!
//! Pricing first assigns each customer to its cheapest depot, then runs
//! Kruskal per depot over the edges with negative adjusted weight.

use super::column::{Column, HmMembership};
use super::engine::{Formulation, PricingOutcome};
use crate::greedy::greedy_forest;
use crate::lp::{ConstraintHandle, LinearExpr, LinearRelaxationSolver, Relation};
use crate::relaxation::Utilization;
use crate::union_find::UnionFind;
use mcrf_core::{CustomerId, DepotId, EdgeId, Graph, McrfResult, MembershipBits, VertexId, VertexKind};

type HmColumn = Column<HmMembership>;

#[derive(Debug, Clone)]
struct HmRows {
    // [customer][depot]
    vertex_inclusion_1: Vec<Vec<Option<ConstraintHandle>>>,
    // [edge][endpoint][depot], endpoint slot is None for depot endpoints
    vertex_inclusion_2: Vec<[Option<Vec<Option<ConstraintHandle>>>; 2]>,
    weight: Vec<ConstraintHandle>,
    edge_vertex_count: ConstraintHandle,
    lambda_sum: ConstraintHandle,
}

/// Dual prices of the subforest master, shaped like its rows. `None` marks
/// rows that do not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct HmDuals {
    /// vertex-inclusion-1, `[customer][depot]`
    pub alpha: Vec<Vec<Option<f64>>>,
    /// vertex-inclusion-2, `[edge][endpoint][depot]`
    pub beta: Vec<[Option<Vec<Option<f64>>>; 2]>,
    /// weight, `[depot]`
    pub gamma: Vec<f64>,
    /// edge-vertex-count
    pub delta: f64,
    /// lambda-sum
    pub epsilon: f64,
}

impl HmDuals {
    fn beta(&self, edge: EdgeId, endpoint: usize, depot: DepotId) -> Option<f64> {
        self.beta[edge.value()][endpoint]
            .as_ref()
            .and_then(|per_depot| per_depot[depot.value()])
    }
}

/// Subforest column generation over a preprocessed graph.
#[derive(Debug, Clone)]
pub struct HmRelaxation<'g> {
    graph: &'g Graph,
    rows: Option<HmRows>,
}

impl<'g> HmRelaxation<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph, rows: None }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Reads every row's dual through `dual`. Empty before initialization.
    pub fn duals_from(&self, dual: impl Fn(ConstraintHandle) -> f64) -> HmDuals {
        let Some(rows) = &self.rows else {
            return HmDuals {
                alpha: Vec::new(),
                beta: Vec::new(),
                gamma: Vec::new(),
                delta: 0.0,
                epsilon: 0.0,
            };
        };
        let read = |c: &Option<ConstraintHandle>| c.map(&dual);
        HmDuals {
            alpha: rows
                .vertex_inclusion_1
                .iter()
                .map(|per_depot| per_depot.iter().map(read).collect())
                .collect(),
            beta: rows
                .vertex_inclusion_2
                .iter()
                .map(|endpoints| {
                    endpoints.each_ref().map(|slot| {
                        slot.as_ref()
                            .map(|per_depot| per_depot.iter().map(read).collect::<Vec<_>>())
                    })
                })
                .collect(),
            gamma: rows.weight.iter().map(|&c| dual(c)).collect(),
            delta: dual(rows.edge_vertex_count),
            epsilon: dual(rows.lambda_sum),
        }
    }

    fn empty_column(&self) -> HmColumn {
        let depots = self.graph.depot_count();
        Column::new(HmMembership {
            customers: MembershipBits::new(depots * self.graph.customer_count()),
            edges: MembershipBits::new(depots * self.graph.edge_count()),
        })
    }

    /// Coefficients of selecting customer `customer` for depot `depot`.
    fn add_customer(&self, rows: &HmRows, column: &mut HmColumn, customer: CustomerId, depot: DepotId) {
        let Some(row) = rows.vertex_inclusion_1[customer.value()][depot.value()] else {
            debug_assert!(false, "customer {customer:?} excluded for depot {depot:?}");
            return;
        };
        column.add_term(1.0, row);
        let vertex = self.graph.customer(customer).vertex;
        for &edge in self.graph.adj(vertex) {
            let endpoint = endpoint_index(self.graph, edge, vertex);
            let row = rows.vertex_inclusion_2[edge.value()][endpoint]
                .as_ref()
                .and_then(|per_depot| per_depot[depot.value()]);
            if let Some(row) = row {
                column.add_term(-1.0, row);
            }
        }
        column.add_term(1.0, rows.edge_vertex_count);
        let bit = depot.value() * self.graph.customer_count() + customer.value();
        column.membership_mut().customers.set(bit);
    }

    /// Coefficients of selecting edge `edge` for depot `depot`.
    fn add_edge(&self, rows: &HmRows, column: &mut HmColumn, edge: EdgeId, depot: DepotId) {
        let data = self.graph.edge(edge);
        for (endpoint, &vertex) in data.endpoints.iter().enumerate() {
            let VertexKind::Customer(customer) = self.graph.kind(vertex) else {
                continue;
            };
            let inclusion_1 = rows.vertex_inclusion_1[customer.value()][depot.value()];
            let inclusion_2 = rows.vertex_inclusion_2[edge.value()][endpoint]
                .as_ref()
                .and_then(|per_depot| per_depot[depot.value()]);
            debug_assert!(inclusion_1.is_some() && inclusion_2.is_some());
            if let Some(row) = inclusion_1 {
                column.add_term(-1.0, row);
            }
            if let Some(row) = inclusion_2 {
                column.add_term(1.0, row);
            }
        }
        column.add_term(f64::from(data.weight), rows.weight[depot.value()]);
        column.add_term(-1.0, rows.edge_vertex_count);
        column.add_objective(1.0);
        let bit = depot.value() * self.graph.edge_count() + edge.value();
        column.membership_mut().edges.set(bit);
    }

    /// Whether `edge` may appear in the forest of `depot`: included, no
    /// endpoint owned by another depot, every customer endpoint included.
    fn edge_available(&self, edge: EdgeId, depot: DepotId) -> bool {
        self.graph.includes_edge(edge, depot)
            && self.graph.edge(edge).endpoints.iter().all(|&v| match self.graph.kind(v) {
                VertexKind::Depot(owner) => owner == depot,
                VertexKind::Customer(c) => self.graph.includes_customer(c, depot),
            })
    }

    /// Adjusted Kruskal weight of `edge` for `depot`.
    fn edge_weight(&self, duals: &HmDuals, edge: EdgeId, depot: DepotId) -> f64 {
        let data = self.graph.edge(edge);
        let endpoints: f64 = data
            .endpoints
            .iter()
            .enumerate()
            .filter_map(|(endpoint, &v)| {
                let customer = self.graph.kind(v).customer()?;
                let alpha = duals.alpha[customer.value()][depot.value()].unwrap_or(0.0);
                let beta = duals.beta(edge, endpoint, depot).unwrap_or(0.0);
                Some(-alpha + beta)
            })
            .sum();
        endpoints + f64::from(data.weight) * duals.gamma[depot.value()] - duals.delta - 1.0
    }
}

fn endpoint_index(graph: &Graph, edge: EdgeId, vertex: VertexId) -> usize {
    graph.edge(edge).endpoint_index(vertex).unwrap_or(0)
}

// union-find element of a vertex: every depot maps to 0, customer i to i + 1
fn local_id(graph: &Graph, vertex: VertexId) -> usize {
    match graph.kind(vertex) {
        VertexKind::Depot(_) => 0,
        VertexKind::Customer(c) => c.value() + 1,
    }
}

impl Formulation for HmRelaxation<'_> {
    type Membership = HmMembership;
    type Duals = HmDuals;

    fn name(&self) -> &'static str {
        "HM"
    }

    fn initialize(&mut self, solver: &mut dyn LinearRelaxationSolver) -> McrfResult<Vec<HmColumn>> {
        let graph = self.graph;
        let mut empty_row = |relation, rhs| solver.add_constraint(LinearExpr::new(), relation, rhs);

        let vertex_inclusion_1: Vec<Vec<Option<ConstraintHandle>>> = graph
            .customers()
            .iter()
            .map(|c| {
                graph
                    .depots()
                    .iter()
                    .map(|d| {
                        graph
                            .includes_customer(c.id, d.id)
                            .then(|| empty_row(Relation::LessEqual, 0.0))
                    })
                    .collect()
            })
            .collect();

        let vertex_inclusion_2: Vec<[Option<Vec<Option<ConstraintHandle>>>; 2]> = graph
            .edges()
            .iter()
            .map(|edge| {
                edge.endpoints.map(|v| {
                    graph.kind(v).customer().map(|_| {
                        graph
                            .depots()
                            .iter()
                            .map(|d| {
                                graph
                                    .includes_edge(edge.id, d.id)
                                    .then(|| empty_row(Relation::LessEqual, 0.0))
                            })
                            .collect()
                    })
                })
            })
            .collect();

        let weight: Vec<ConstraintHandle> = graph
            .depots()
            .iter()
            .map(|d| empty_row(Relation::LessEqual, d.capacity))
            .collect();
        let edge_vertex_count = empty_row(Relation::Equal, 0.0);
        let lambda_sum = empty_row(Relation::LessEqual, 1.0);

        let rows = HmRows {
            vertex_inclusion_1,
            vertex_inclusion_2,
            weight,
            edge_vertex_count,
            lambda_sum,
        };

        let forest = greedy_forest(graph);
        let mut column = self.empty_column();
        for (customer, depot) in forest.assigned_customers() {
            self.add_customer(&rows, &mut column, customer, depot);
        }
        for (edge, depot) in forest.assigned_edges() {
            self.add_edge(&rows, &mut column, edge, depot);
        }
        column.add_term(1.0, rows.lambda_sum);

        self.rows = Some(rows);
        Ok(vec![column])
    }

    fn read_duals(&self, solver: &dyn LinearRelaxationSolver) -> HmDuals {
        self.duals_from(|c| solver.dual_value(c))
    }

    fn price(&self, duals: &HmDuals, tolerance: f64) -> PricingOutcome<HmMembership> {
        let none = |total| PricingOutcome {
            total,
            dual: duals.epsilon,
            column: None,
        };
        let Some(rows) = &self.rows else {
            debug_assert!(false, "pricing before initialization");
            return none(0.0);
        };
        let graph = self.graph;
        let mut column = self.empty_column();
        let mut total = 0.0;

        // customer to depot assignment
        for customer in graph.customers() {
            let mut best: Option<(DepotId, f64)> = None;
            for depot in graph.depots() {
                let Some(alpha) = duals.alpha[customer.id.value()][depot.id.value()] else {
                    continue;
                };
                let incident: f64 = graph
                    .adj(customer.vertex)
                    .iter()
                    .map(|&e| {
                        let endpoint = endpoint_index(graph, e, customer.vertex);
                        duals.beta(e, endpoint, depot.id).unwrap_or(0.0)
                    })
                    .sum();
                let score = alpha + duals.delta - incident;
                if score < best.map_or(0.0, |(_, s)| s) {
                    best = Some((depot.id, score));
                }
            }
            if let Some((depot, score)) = best {
                self.add_customer(rows, &mut column, customer.id, depot);
                total += score;
            }
        }

        // minimum weight forest per depot
        for depot in graph.depots() {
            let mut candidates: Vec<(f64, EdgeId)> = graph
                .edges()
                .iter()
                .filter(|edge| self.edge_available(edge.id, depot.id))
                .map(|edge| (self.edge_weight(duals, edge.id, depot.id), edge.id))
                .filter(|(weight, _)| *weight < 0.0)
                .collect();
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let mut components = UnionFind::new(graph.customer_count() + 1);
            for (weight, edge) in candidates {
                let [a, b] = graph.edge(edge).endpoints;
                let (a, b) = (local_id(graph, a), local_id(graph, b));
                if components.find(a) != components.find(b) {
                    components.union(a, b);
                    self.add_edge(rows, &mut column, edge, depot.id);
                    total += weight;
                }
            }
        }

        if total >= -duals.epsilon - tolerance {
            return none(total);
        }
        column.add_term(1.0, rows.lambda_sum);
        PricingOutcome {
            total,
            dual: duals.epsilon,
            column: Some(column),
        }
    }

    fn utilization(
        &self,
        _solver: &dyn LinearRelaxationSolver,
        columns: &[(&HmColumn, f64)],
    ) -> Utilization {
        let graph = self.graph;
        let mut customers = vec![0.0; graph.customer_count()];
        let mut edges = vec![0.0; graph.edge_count()];
        for (column, value) in columns.iter().filter(|(_, v)| *v > 0.0) {
            let membership = column.membership();
            for bit in membership.customers.iter() {
                customers[bit % graph.customer_count()] += value;
            }
            for bit in membership.edges.iter() {
                edges[bit % graph.edge_count()] += value;
            }
        }
        Utilization { customers, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::ClarabelSolver;
    use mcrf_core::{GraphBuilder, EPSILON_PRICING_PROBLEM};

    fn path_instance() -> Graph {
        let mut builder = GraphBuilder::new("path");
        let v: Vec<_> = (0..4).map(|i| builder.add_vertex(i as f64, 0.0)).collect();
        builder.set_capacity(v[0], 10.0);
        builder.add_edge(v[0], v[1], 3).unwrap();
        builder.add_edge(v[1], v[2], 4).unwrap();
        builder.add_edge(v[2], v[3], 5).unwrap();
        builder.finalize()
    }

    fn initialized(graph: &Graph) -> (HmRelaxation<'_>, HmColumn) {
        let mut hm = HmRelaxation::new(graph);
        let mut solver = ClarabelSolver::default();
        let mut columns = hm.initialize(&mut solver).unwrap();
        (hm, columns.remove(0))
    }

    #[test]
    fn test_initial_column_follows_greedy_forest() {
        let graph = path_instance();
        let (hm, column) = initialized(&graph);
        let membership = column.membership();
        assert_eq!(membership.customers.iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(membership.edges.iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(column.objective(), 2.0);

        let rows = hm.rows.as_ref().unwrap();
        assert_eq!(column.coefficient(rows.weight[0]), 7.0);
        // two customers minus two edges
        assert_eq!(column.coefficient(rows.edge_vertex_count), 0.0);
        assert_eq!(column.coefficient(rows.lambda_sum), 1.0);
        // customer 0 is endpoint of edges 0 and 1; both edges select it back
        let c0 = rows.vertex_inclusion_1[0][0].unwrap();
        assert_eq!(column.coefficient(c0), 1.0 - 2.0);
    }

    #[test]
    fn test_zero_duals_price_the_full_forest() {
        let graph = path_instance();
        let (hm, _) = initialized(&graph);
        let duals = hm.duals_from(|_| 0.0);
        let outcome = hm.price(&duals, EPSILON_PRICING_PROBLEM);
        // every edge weighs -1, no customer score is negative
        assert_eq!(outcome.total, -3.0);
        let column = outcome.column.unwrap();
        assert_eq!(column.membership().edges.count_ones(), 3);
        assert_eq!(column.membership().customers.count_ones(), 0);
        assert_eq!(column.objective(), 3.0);
    }

    #[test]
    fn test_equal_weight_cycle_breaks_ties_by_edge_id() {
        let mut builder = GraphBuilder::new("triangle");
        let v: Vec<_> = (0..3).map(|i| builder.add_vertex(i as f64, 1.0)).collect();
        builder.set_capacity(v[0], 10.0);
        builder.add_edge(v[0], v[1], 1).unwrap();
        builder.add_edge(v[1], v[2], 1).unwrap();
        builder.add_edge(v[0], v[2], 1).unwrap();
        let graph = builder.finalize();
        let (hm, _) = initialized(&graph);
        let duals = hm.duals_from(|_| 0.0);
        let outcome = hm.price(&duals, EPSILON_PRICING_PROBLEM);
        // all three edges weigh -1; the last one closes the cycle
        assert_eq!(outcome.total, -2.0);
        let column = outcome.column.unwrap();
        assert_eq!(column.membership().edges.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_large_convexity_dual_stops_pricing() {
        let graph = path_instance();
        let (hm, _) = initialized(&graph);
        let lambda_sum = hm.rows.as_ref().unwrap().lambda_sum;
        let duals = hm.duals_from(|c| if c == lambda_sum { 10.0 } else { 0.0 });
        let outcome = hm.price(&duals, EPSILON_PRICING_PROBLEM);
        assert!(outcome.column.is_none());
        assert_eq!(outcome.total, -3.0);
        assert_eq!(outcome.gap(), -7.0);
    }

    #[test]
    fn test_reduced_cost_matches_pricing_total() {
        let graph = path_instance();
        let (hm, _) = initialized(&graph);
        // arbitrary but deterministic dual values per row
        let price_of = |c: ConstraintHandle| ((c.value() * 37 % 11) as f64 - 5.0) / 4.0;
        let duals = hm.duals_from(price_of);
        let outcome = hm.price(&duals, EPSILON_PRICING_PROBLEM);
        if let Some(column) = outcome.column {
            let replayed = -column.reduced_cost(price_of);
            assert!((replayed - (outcome.total + duals.epsilon)).abs() < 1e-9);
        } else {
            assert!(outcome.total >= -duals.epsilon - EPSILON_PRICING_PROBLEM);
        }
    }

    #[test]
    fn test_customer_assigned_to_cheapest_depot() {
        // two depots sharing one customer
        let mut builder = GraphBuilder::new("shared");
        let d0 = builder.add_vertex(0.0, 0.0);
        let c = builder.add_vertex(1.0, 0.0);
        let d1 = builder.add_vertex(2.0, 0.0);
        builder.set_capacity(d0, 5.0);
        builder.set_capacity(d1, 5.0);
        builder.add_edge(d0, c, 1).unwrap();
        builder.add_edge(c, d1, 1).unwrap();
        let graph = builder.finalize();
        let (hm, _) = initialized(&graph);
        let rows = hm.rows.as_ref().unwrap();
        let at_d0 = rows.vertex_inclusion_1[0][0].unwrap();
        let at_d1 = rows.vertex_inclusion_1[0][1].unwrap();
        let duals = hm.duals_from(|h| {
            if h == at_d0 {
                -1.0
            } else if h == at_d1 {
                -2.0
            } else {
                0.0
            }
        });
        let outcome = hm.price(&duals, EPSILON_PRICING_PROBLEM);
        let column = outcome.column.unwrap();
        // bit d * |C| + i
        assert!(column.membership().customers.contains(1));
        assert!(!column.membership().customers.contains(0));
    }
}
