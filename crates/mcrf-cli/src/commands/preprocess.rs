use anyhow::{Context, Result};
use mcrf_cli::cli::ShapingArgs;
use mcrf_cli::config::McrfConfig;
use mcrf_io::write_txt_file;
use std::path::Path;

use super::{finalize, load_shaped};

pub fn handle(
    config: &McrfConfig,
    file: &Path,
    depots: Option<usize>,
    shaping: &ShapingArgs,
    out: Option<&Path>,
) -> Result<()> {
    let preprocessing = config.preprocessing.with_overrides(shaping);
    let builder = load_shaped(file, depots, &preprocessing)?;
    let (graph, report) = finalize(&builder, &preprocessing);

    println!("Preprocessing {}:", graph.name());
    println!("  Edges               : {}", graph.edge_count());
    println!("  (arc, depot) pairs  : {}", report.initial);
    println!("  Removed by Dijkstra : {}", report.removed_by_dijkstra);
    println!("  Removed by triangle : {}", report.removed_by_triangle);
    println!("  Remaining           : {}", report.remaining);

    if let Some(out) = out {
        write_txt_file(&graph, out).with_context(|| format!("writing {}", out.display()))?;
        println!("Wrote shaped instance to {}", out.display());
    }
    Ok(())
}
