//! Instance preparation run before any relaxation.
//!
//! - [`exclusion`]: per-depot arc and customer exclusion rules on a finalized graph
//! - [`shaping`]: edge thinning and depot placement on a mutable graph

pub mod exclusion;
pub mod shaping;

pub use exclusion::{exclude_dijkstra, exclude_triangle};
pub use shaping::{assign_depots, geometry_cut};

use mcrf_core::Graph;
use serde::Serialize;

/// Counts of included (arc, depot) pairs before and after each rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExclusionReport {
    pub initial: usize,
    pub removed_by_dijkstra: usize,
    pub removed_by_triangle: usize,
    pub remaining: usize,
}

/// Applies the Dijkstra rule and then the triangle rule, either of which may be skipped.
pub fn apply_exclusions(graph: &mut Graph, dijkstra: bool, triangle: bool) -> ExclusionReport {
    let initial = graph.included_arc_count();
    let removed_by_dijkstra = if dijkstra { exclude_dijkstra(graph) } else { 0 };
    let removed_by_triangle = if triangle { exclude_triangle(graph) } else { 0 };
    let report = ExclusionReport {
        initial,
        removed_by_dijkstra,
        removed_by_triangle,
        remaining: graph.included_arc_count(),
    };
    tracing::debug!(
        graph = graph.name(),
        initial = report.initial,
        dijkstra = report.removed_by_dijkstra,
        triangle = report.removed_by_triangle,
        remaining = report.remaining,
        "exclusion preprocessing"
    );
    report
}
