use anyhow::{Context, Result};
use mcrf_algo::Method;
use mcrf_cli::cli::ShapingArgs;
use mcrf_cli::config::McrfConfig;
use std::path::Path;
use tracing::info;

use super::{finalize, load_shaped};

#[allow(clippy::too_many_arguments)]
pub fn handle(
    config: &McrfConfig,
    file: &Path,
    method: Method,
    depots: Option<usize>,
    shaping: &ShapingArgs,
    max_iterations: Option<usize>,
    utilization: bool,
    json: bool,
) -> Result<()> {
    let preprocessing = config.preprocessing.with_overrides(shaping);
    let builder = load_shaped(file, depots, &preprocessing)?;
    let (graph, report) = finalize(&builder, &preprocessing);
    info!(
        graph = graph.name(),
        depots = graph.depot_count(),
        customers = graph.customer_count(),
        edges = graph.edge_count(),
        excluded = report.initial - report.remaining,
        "instance ready"
    );

    let mut cg = config.column_generation.clone();
    if max_iterations.is_some() {
        cg.max_iterations = max_iterations;
    }
    let mut result = method
        .run(&graph, &cg)
        .with_context(|| format!("running {method} on {}", graph.name()))?;
    if !utilization {
        result.utilization = None;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{} {} {}", graph.name(), method, result);
    if let Some(utilization) = &result.utilization {
        for (customer, value) in graph.customers().iter().zip(&utilization.customers) {
            println!(
                "  customer {:>4} (vertex {:>4}): {:.4}",
                customer.id.value(),
                customer.vertex.value(),
                value
            );
        }
        for (edge, value) in graph.edges().iter().zip(&utilization.edges) {
            if *value > 0.0 {
                let [a, b] = edge.endpoints;
                println!(
                    "  edge {:>4} ({}-{}, w {}): {:.4}",
                    edge.id.value(),
                    a.value(),
                    b.value(),
                    edge.weight,
                    value
                );
            }
        }
    }
    Ok(())
}
