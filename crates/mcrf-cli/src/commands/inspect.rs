use anyhow::Result;
use mcrf_cli::config::PreprocessingConfig;
use mcrf_core::graph_stats;
use mcrf_io::load_instance;
use std::path::Path;

use super::load_shaped;

pub fn handle(file: &Path, depots: Option<usize>, json: bool) -> Result<()> {
    let builder = match depots {
        Some(_) => load_shaped(file, depots, &PreprocessingConfig::default())?,
        // depot-less instances can still be inspected
        None => load_instance(file)?,
    };
    let stats = graph_stats(&builder.finalize());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Graph statistics for {}:", stats.name);
    println!("  Vertices      : {}", stats.vertex_count);
    println!("  Depots        : {}", stats.depot_count);
    println!("  Customers     : {}", stats.customer_count);
    println!("  Edges         : {}", stats.edge_count);
    println!("  Components    : {}", stats.connected_components);
    println!(
        "  Degree [min/avg/max]: {}/{:.2}/{}",
        stats.min_degree, stats.avg_degree, stats.max_degree
    );
    println!("  Density       : {:.4}", stats.density);
    println!("  Included pairs: {}", stats.included_arc_pairs);
    println!("  Capacity      : {:.2}", stats.total_capacity);
    println!("  MST weight    : {:.1}", stats.mst_weight);
    Ok(())
}
