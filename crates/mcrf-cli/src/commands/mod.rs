use anyhow::{bail, Context, Result};
use mcrf_algo::preprocess::{assign_depots, geometry_cut};
use mcrf_algo::{apply_exclusions, ExclusionReport};
use mcrf_core::{Graph, GraphBuilder};
use mcrf_io::load_instance;
use mcrf_cli::config::PreprocessingConfig;
use std::path::Path;

pub mod batch;
pub mod convert;
pub mod inspect;
pub mod preprocess;
pub mod solve;

/// Loads `path` and places `depots` depots when asked to.
///
/// Instances that already carry depots keep them; asking for a depot count on
/// such an instance is an error, and so is an instance left without depots.
pub fn load_shaped(path: &Path, depots: Option<usize>, config: &PreprocessingConfig) -> Result<GraphBuilder> {
    let mut builder =
        load_instance(path).with_context(|| format!("loading instance {}", path.display()))?;
    match (builder.depot_count(), depots) {
        (0, Some(count)) => assign_depots(&mut builder, count)
            .with_context(|| format!("placing {count} depots on {}", builder.name()))?,
        (0, None) => bail!(
            "instance {} has no depots; pass --depots 1, 2, 4 or 8",
            path.display()
        ),
        (existing, Some(_)) => bail!(
            "instance {} already has {existing} depots",
            path.display()
        ),
        (_, None) => {}
    }
    if config.geometry_cut {
        geometry_cut(&mut builder, config.geometry_scale, config.geometry_degree);
    }
    Ok(builder)
}

/// Finalizes `builder` and runs the enabled exclusion rules.
pub fn finalize(builder: &GraphBuilder, config: &PreprocessingConfig) -> (Graph, ExclusionReport) {
    let mut graph = builder.finalize();
    let report = apply_exclusions(&mut graph, config.dijkstra, config.triangle);
    (graph, report)
}
