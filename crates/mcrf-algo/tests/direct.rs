use mcrf_algo::{apply_exclusions, solve_gg, solve_mcfgg, ColumnGenerationConfig, Method};
use mcrf_core::{Graph, GraphBuilder};

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
fn test_gg_bound_on_path() {
    let result = solve_gg(&path_instance(10.0)).unwrap();
    assert!(result.objective_value >= 2.0 - 1e-6);
    assert!(result.objective_value <= 3.0 + 1e-6);
    assert!(result.time.contains_key("init"));
    assert!(result.time.contains_key("optimize"));
    assert_eq!(result.iterations, 1);
}

#[test]
fn test_mcfgg_bound_on_path() {
    let result = solve_mcfgg(&path_instance(10.0)).unwrap();
    assert!(result.objective_value >= 2.0 - 1e-6);
    assert!(result.objective_value <= 3.0 + 1e-6);
}

#[test]
fn test_ample_capacity_covers_every_customer() {
    let graph = path_instance(100.0);
    for result in [solve_gg(&graph).unwrap(), solve_mcfgg(&graph).unwrap()] {
        assert!((result.objective_value - 3.0).abs() < 1e-5);
        let utilization = result.utilization.unwrap();
        assert_eq!(utilization.customers.len(), 3);
        assert!(utilization.customers.iter().all(|u| (u - 1.0).abs() < 1e-5));
    }
}

#[test]
fn test_excluded_customer_is_not_covered() {
    let mut graph = path_instance(10.0);
    let report = apply_exclusions(&mut graph, true, false);
    assert!(report.removed_by_dijkstra > 0);
    // the last customer is out of reach, the first two fit
    let result = solve_gg(&graph).unwrap();
    assert!((result.objective_value - 2.0).abs() < 1e-5);
    let result = solve_mcfgg(&graph).unwrap();
    assert!((result.objective_value - 2.0).abs() < 1e-5);
}

#[test]
fn test_methods_dispatch() {
    let graph = path_instance(10.0);
    let config = ColumnGenerationConfig::default();
    for method in Method::ALL {
        let result = method.run(&graph, &config).unwrap();
        let lower = if method == Method::Tm { 0.0 } else { 2.0 };
        assert!(result.objective_value >= lower - 1e-6, "{method}");
        assert!(result.objective_value <= 3.0 + 1e-6, "{method}");
    }
    let heuristic = Method::TwoStep.run(&graph, &config).unwrap();
    assert_eq!(heuristic.objective_value, 2.0);
    assert!(heuristic.utilization.is_none());
}
