//! Gavish-Graves relaxation decomposed per depot.
//!
//! Every arc carries two flow labels per depot: `α` (unit) and `β` (scaled
//! by the customer count). `y[v][d]` marks vertex `v` as part of the tree of
//! depot `d`.

use super::{at_most, equal, linear, solver_error, vertex_allowed};
use crate::relaxation::{PhaseTimer, RelaxationResult, Utilization};
use good_lp::solvers::clarabel::clarabel;
use good_lp::{variable, variables, Expression, Solution, SolverModel, Variable};
use mcrf_core::{Graph, McrfResult};
use tracing::info;

/// Solves the GG relaxation of `graph` with Clarabel.
pub fn solve_gg(graph: &Graph) -> McrfResult<RelaxationResult> {
    let mut timer = PhaseTimer::new();
    timer.start("init");

    let mut vars = variables!();
    let y: Vec<Vec<Option<Variable>>> = graph
        .vertex_ids()
        .map(|v| {
            graph
                .depots()
                .iter()
                .map(|d| vertex_allowed(graph, v, d.id).then(|| vars.add(variable().min(0.0))))
                .collect()
        })
        .collect();
    let mut arc_labels = || -> Vec<Vec<Option<Variable>>> {
        graph
            .arcs()
            .iter()
            .map(|a| {
                graph
                    .depots()
                    .iter()
                    .map(|d| graph.includes_arc(a.id, d.id).then(|| vars.add(variable().min(0.0))))
                    .collect()
            })
            .collect()
    };
    let alpha = arc_labels();
    let beta = arc_labels();

    let n = graph.customer_count() as f64;
    let y_ref = &y;
    let covered = move |d: usize| {
        graph
            .customers()
            .iter()
            .map(move |c| (1.0, y_ref[c.vertex.value()][d]))
    };
    let objective = linear((0..graph.depot_count()).flat_map(covered))
        .unwrap_or_else(|| Expression::from(0.0));

    let mut constraints = Vec::new();

    // disjoint-trees
    for v in graph.vertex_ids() {
        let trees = linear(y[v.value()].iter().map(|&y_v| (1.0, y_v)));
        constraints.push(at_most(trees, Some(Expression::from(1.0))));
    }

    // depot-inclusion
    for d in graph.depots() {
        let own = linear([(1.0, y[d.vertex.value()][d.id.value()])]);
        constraints.push(equal(own, Some(Expression::from(1.0))));
    }

    // indegree-customer
    for c in graph.customers() {
        for d in graph.depots() {
            if !graph.includes_customer(c.id, d.id) {
                continue;
            }
            let dd = d.id.value();
            let indegree = linear(graph.adj_in(c.vertex).iter().flat_map(|a| {
                [(1.0, alpha[a.value()][dd]), (1.0, beta[a.value()][dd])]
            }));
            constraints.push(equal(indegree, linear([(1.0, y[c.vertex.value()][dd])])));
        }
    }

    // indegree-depot
    for other in graph.depots() {
        for d in graph.depots() {
            let dd = d.id.value();
            let indegree = linear(graph.adj_in(other.vertex).iter().flat_map(|a| {
                [(1.0, alpha[a.value()][dd]), (1.0, beta[a.value()][dd])]
            }));
            constraints.push(equal(indegree, None));
        }
    }

    // flow-conservation
    for c in graph.customers() {
        for d in graph.depots() {
            if !graph.includes_customer(c.id, d.id) {
                continue;
            }
            let dd = d.id.value();
            let incoming = graph
                .adj_in(c.vertex)
                .iter()
                .flat_map(|a| [(1.0, alpha[a.value()][dd]), (n, beta[a.value()][dd])]);
            let outgoing = graph
                .adj_out(c.vertex)
                .iter()
                .flat_map(|a| [(-1.0, alpha[a.value()][dd]), (-n, beta[a.value()][dd])]);
            constraints.push(equal(
                linear(incoming.chain(outgoing)),
                linear([(1.0, y[c.vertex.value()][dd])]),
            ));
        }
    }

    // depot-flow
    for d in graph.depots() {
        let dd = d.id.value();
        let outflow = linear(
            graph
                .adj_out(d.vertex)
                .iter()
                .flat_map(|a| [(1.0, alpha[a.value()][dd]), (n, beta[a.value()][dd])]),
        );
        constraints.push(equal(outflow, linear(covered(dd))));
    }

    // capacity
    for d in graph.depots() {
        let dd = d.id.value();
        let used = linear(graph.arcs().iter().flat_map(|a| {
            let w = f64::from(graph.edge(a.edge).weight);
            [(w, alpha[a.id.value()][dd]), (w, beta[a.id.value()][dd])]
        }));
        constraints.push(at_most(used, Some(Expression::from(d.capacity))));
    }

    timer.start("optimize");
    let mut model = vars.maximise(objective).using(clarabel);
    for constraint in constraints.into_iter().flatten() {
        model = model.with(constraint);
    }
    let solution = model.solve().map_err(solver_error)?;

    let value = |v: &Option<Variable>| v.map_or(0.0, |v| solution.value(v));
    let customers: Vec<f64> = graph
        .customers()
        .iter()
        .map(|c| y[c.vertex.value()].iter().map(value).sum::<f64>())
        .collect();
    let objective_value: f64 = customers.iter().sum();
    let edges: Vec<f64> = graph
        .edges()
        .iter()
        .map(|e| {
            let used: f64 = e
                .arcs()
                .iter()
                .flat_map(|a| alpha[a.value()].iter().chain(&beta[a.value()]))
                .map(value)
                .sum();
            used.min(1.0)
        })
        .collect();
    let customers: Vec<f64> = customers.into_iter().map(|u| u.min(1.0)).collect();

    let time = timer.finish();
    info!(graph = graph.name(), objective = objective_value, "GG relaxation solved");
    Ok(RelaxationResult {
        objective_value,
        time,
        iterations: 1,
        columns: 0,
        progress: Vec::new(),
        utilization: Some(Utilization { customers, edges }),
    })
}
