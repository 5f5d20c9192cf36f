use anyhow::{Context, Result};
use mcrf_cli::config::PreprocessingConfig;
use mcrf_io::write_txt_file;
use std::path::Path;
use tracing::info;

use super::load_shaped;

pub fn handle(input: &Path, output: &Path, depots: Option<usize>) -> Result<()> {
    // conversion keeps every edge
    let shaping = PreprocessingConfig {
        geometry_cut: false,
        ..PreprocessingConfig::default()
    };
    let graph = load_shaped(input, depots, &shaping)?.finalize();
    write_txt_file(&graph, output).with_context(|| format!("writing {}", output.display()))?;
    info!(
        input = %input.display(),
        output = %output.display(),
        depots = graph.depot_count(),
        "converted instance"
    );
    println!("Converted {} to {}", input.display(), output.display());
    Ok(())
}
