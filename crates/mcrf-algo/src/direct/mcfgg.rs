//! Multi-commodity flow strengthening of the Gavish-Graves relaxation.
//!
//! Each customer `c` is its own commodity: depot `d` ships one unit of flow
//! `f[a][c][d]` to `c` if `c` joins its tree, and an arc label `x[a][d]`
//! bounds every commodity on that arc.

use super::{at_most, equal, linear, solver_error, vertex_allowed};
use crate::relaxation::{PhaseTimer, RelaxationResult, Utilization};
use good_lp::solvers::clarabel::clarabel;
use good_lp::{variable, variables, Expression, Solution, SolverModel, Variable};
use mcrf_core::{Graph, McrfResult};
use tracing::info;

/// Solves the MCF-GG relaxation of `graph` with Clarabel.
pub fn solve_mcfgg(graph: &Graph) -> McrfResult<RelaxationResult> {
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
    let x: Vec<Vec<Option<Variable>>> = graph
        .arcs()
        .iter()
        .map(|a| {
            graph
                .depots()
                .iter()
                .map(|d| graph.includes_arc(a.id, d.id).then(|| vars.add(variable().min(0.0))))
                .collect()
        })
        .collect();
    // [arc][customer][depot]
    let f: Vec<Vec<Vec<Option<Variable>>>> = graph
        .arcs()
        .iter()
        .map(|a| {
            graph
                .customers()
                .iter()
                .map(|c| {
                    graph
                        .depots()
                        .iter()
                        .map(|d| {
                            (graph.includes_arc(a.id, d.id) && graph.includes_customer(c.id, d.id))
                                .then(|| vars.add(variable().min(0.0)))
                        })
                        .collect()
                })
                .collect()
        })
        .collect();

    let y_ref = &y;
    let objective = linear(graph.depots().iter().flat_map(move |d| {
        graph
            .customers()
            .iter()
            .map(move |c| (1.0, y_ref[c.vertex.value()][d.id.value()]))
    }))
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
            let indegree = linear(graph.adj_in(c.vertex).iter().map(|a| (1.0, x[a.value()][dd])));
            constraints.push(equal(indegree, linear([(1.0, y[c.vertex.value()][dd])])));
        }
    }

    // indegree-depot
    for other in graph.depots() {
        for d in graph.depots() {
            let dd = d.id.value();
            let indegree = linear(graph.adj_in(other.vertex).iter().map(|a| (1.0, x[a.value()][dd])));
            constraints.push(equal(indegree, None));
        }
    }

    // flow-lower-bound and flow-upper-bound
    for a in graph.arcs() {
        let aa = a.id.value();
        for d in graph.depots() {
            let dd = d.id.value();
            let Some(x_a) = x[aa][dd] else { continue };
            let commodities = linear(f[aa].iter().map(|per_depot| (1.0, per_depot[dd])));
            constraints.push(at_most(linear([(1.0, Some(x_a))]), commodities));
            for per_depot in &f[aa] {
                if per_depot[dd].is_some() {
                    constraints.push(at_most(linear([(1.0, per_depot[dd])]), linear([(1.0, Some(x_a))])));
                }
            }
        }
    }

    // flow-conservation
    for j in graph.customers() {
        for c in graph.customers() {
            for d in graph.depots() {
                if !graph.includes_customer(c.id, d.id) {
                    continue;
                }
                let (cc, dd) = (c.id.value(), d.id.value());
                let incoming = graph.adj_in(j.vertex).iter().map(|a| (1.0, f[a.value()][cc][dd]));
                let outgoing = graph.adj_out(j.vertex).iter().map(|a| (-1.0, f[a.value()][cc][dd]));
                let demand = if j.id == c.id {
                    linear([(1.0, y[j.vertex.value()][dd])])
                } else {
                    None
                };
                constraints.push(equal(linear(incoming.chain(outgoing)), demand));
            }
        }
    }

    // depot-flow
    for c in graph.customers() {
        for d in graph.depots() {
            let (cc, dd) = (c.id.value(), d.id.value());
            let outflow = linear(graph.adj_out(d.vertex).iter().map(|a| (1.0, f[a.value()][cc][dd])));
            constraints.push(equal(outflow, linear([(1.0, y[c.vertex.value()][dd])])));
        }
    }

    // capacity
    for d in graph.depots() {
        let dd = d.id.value();
        let used = linear(
            graph
                .arcs()
                .iter()
                .map(|a| (f64::from(graph.edge(a.edge).weight), x[a.id.value()][dd])),
        );
        constraints.push(at_most(used, Some(Expression::from(d.capacity))));
    }

    timer.start("optimize");
    let mut model = vars.maximise(objective).using(clarabel);
    for constraint in constraints.into_iter().flatten() {
        model = model.with(constraint);
    }
    let solution = model.solve().map_err(solver_error)?;

    let value = |v: &Option<Variable>| v.map_or(0.0, |v| solution.value(v));
    let covered: Vec<f64> = graph
        .customers()
        .iter()
        .map(|c| y[c.vertex.value()].iter().map(value).sum::<f64>())
        .collect();
    let objective_value: f64 = covered.iter().sum();
    let edges: Vec<f64> = graph
        .edges()
        .iter()
        .map(|e| {
            let used: f64 = e.arcs().iter().flat_map(|a| x[a.value()].iter()).map(value).sum();
            used.min(1.0)
        })
        .collect();
    let customers: Vec<f64> = covered.into_iter().map(|u| u.min(1.0)).collect();

    let time = timer.finish();
    info!(graph = graph.name(), objective = objective_value, "MCF-GG relaxation solved");
    Ok(RelaxationResult {
        objective_value,
        time,
        iterations: 1,
        columns: 0,
        progress: Vec::new(),
        utilization: Some(Utilization { customers, edges }),
    })
}
