use anyhow::{bail, Context, Result};
use mcrf_algo::{Method, RelaxationResult};
use mcrf_cli::cli::ShapingArgs;
use mcrf_cli::config::McrfConfig;
use mcrf_io::Format;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{finalize, load_shaped};

/// One line of the batch output.
#[derive(Debug, Serialize)]
struct BatchRecord<'a> {
    instance: &'a str,
    file: String,
    method: Method,
    depots: usize,
    customers: usize,
    edges: usize,
    excluded: usize,
    #[serde(flatten)]
    result: &'a RelaxationResult,
}

pub fn handle(
    config: &McrfConfig,
    directory: &Path,
    method: Method,
    depot_counts: &[usize],
    shaping: &ShapingArgs,
    out: Option<&Path>,
) -> Result<()> {
    let preprocessing = config.preprocessing.with_overrides(shaping);
    let files = instance_files(directory)?;
    if files.is_empty() {
        bail!("no .tsp or .txt instances in {}", directory.display());
    }

    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.results_dir.join(format!("{method}.jsonl")));
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating results directory {}", parent.display()))?;
    }
    let mut writer = BufWriter::new(
        File::create(&out).with_context(|| format!("creating {}", out.display()))?,
    );

    let mut written = 0;
    let mut failed = 0;
    for file in &files {
        // instances with their own depots run once
        let runs: Vec<Option<usize>> = if Format::detect(file) == Some(Format::Tsplib) {
            depot_counts.iter().copied().map(Some).collect()
        } else {
            vec![None]
        };
        for depots in runs {
            let outcome = load_shaped(file, depots, &preprocessing).and_then(|builder| {
                let (graph, report) = finalize(&builder, &preprocessing);
                let result = method.run(&graph, &config.column_generation)?;
                Ok((graph, report, result))
            });
            let (graph, report, result) = match outcome {
                Ok(run) => run,
                Err(err) => {
                    warn!(file = %file.display(), ?depots, "skipping instance: {err:#}");
                    failed += 1;
                    continue;
                }
            };
            let record = BatchRecord {
                instance: graph.name(),
                file: file.display().to_string(),
                method,
                depots: graph.depot_count(),
                customers: graph.customer_count(),
                edges: graph.edge_count(),
                excluded: report.initial - report.remaining,
                result: &result,
            };
            serde_json::to_writer(&mut writer, &record)?;
            writeln!(writer)?;
            writer.flush()?;
            written += 1;
            info!(instance = graph.name(), method = %method, "{result}");
        }
    }

    println!("Wrote {written} results to {} ({failed} failed)", out.display());
    Ok(())
}

/// Instance files of `directory` in name order.
fn instance_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(directory)
        .with_context(|| format!("reading instance directory {}", directory.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && Format::detect(path).is_some())
        .collect();
    files.sort();
    Ok(files)
}
