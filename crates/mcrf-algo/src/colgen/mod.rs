//! Column generation for the subforest (HM) and spanning-tree (TM)
//! relaxations.
//!
//! [`ColumnGeneration`] owns the restricted master and alternates between
//! optimizing it and asking a [`Formulation`] for an improving column:
//!
//! ```text
//! Initializing -> Optimizing -> Pricing -> Adding -> Optimizing -> ...
//!                                      \-> Terminating
//! ```
//!
//! The loop stops when pricing finds no column with negative pricing score
//! beyond the convexity dual, when the optional termination predicate holds
//! for the current objective, or when the configured iteration cap is hit.

mod column;
mod engine;
mod hm;
mod tm;

pub use column::{Column, ColumnId, HmMembership, TmMembership};
pub use engine::{
    ColumnGeneration, ColumnGenerationConfig, Formulation, Phase, PricingOutcome, RemovalPolicy,
};
pub use hm::{HmDuals, HmRelaxation};
pub use tm::{TmDuals, TmRelaxation};

use crate::relaxation::RelaxationResult;
use mcrf_core::{Graph, McrfResult};

/// Runs subforest column generation on `graph` with the bundled solver.
pub fn solve_hm(graph: &Graph, config: &ColumnGenerationConfig) -> McrfResult<RelaxationResult> {
    ColumnGeneration::new(HmRelaxation::new(graph), config.clone()).run()
}

/// Runs spanning-tree column generation on `graph` with the bundled solver.
pub fn solve_tm(graph: &Graph, config: &ColumnGenerationConfig) -> McrfResult<RelaxationResult> {
    ColumnGeneration::new(TmRelaxation::new(graph)?, config.clone()).run()
}
