//! # mcrf-algo: Relaxations for Capacitated Multi-Depot Forests
//!
//! Upper bounds on the number of customers that capacitated depot trees can
//! cover, together with the combinatorial building blocks they share.
//!
//! ## Methods
//!
//! | Method | Entry point | Technique |
//! |--------|-------------|-----------|
//! | [`Method::Hm`] | [`solve_hm`] | column generation, subforest columns, Kruskal pricing |
//! | [`Method::Tm`] | [`solve_tm`] | column generation, spanning-tree columns, Prim pricing |
//! | [`Method::Gg`] | `solve_gg` | Gavish-Graves LP |
//! | [`Method::McfGg`] | `solve_mcfgg` | multi-commodity flow Gavish-Graves LP |
//! | [`Method::TwoStep`] | [`two_step_heuristic`] | greedy forest (lower bound) |
//!
//! The direct LPs are built with `good_lp` and need the `solver-clarabel`
//! feature (on by default). Column generation drives its own restricted
//! master through [`lp::LinearRelaxationSolver`].
//!
//! ## Example
//!
//! ```ignore
//! use mcrf_algo::{solve_hm, ColumnGenerationConfig};
//! use mcrf_io::load_instance;
//!
//! let graph = load_instance("instances/att48.2.txt".as_ref())?.finalize();
//! let result = solve_hm(&graph, &ColumnGenerationConfig::default())?;
//! println!("{result}");
//! ```

pub mod colgen;
#[cfg(feature = "solver-clarabel")]
pub mod direct;
pub mod greedy;
pub mod lp;
pub mod preprocess;
pub mod relaxation;
pub mod union_find;

pub use colgen::{
    solve_hm, solve_tm, Column, ColumnGeneration, ColumnGenerationConfig, ColumnId, Formulation,
    HmDuals, HmMembership, HmRelaxation, Phase, PricingOutcome, RemovalPolicy, TmDuals,
    TmMembership, TmRelaxation,
};
#[cfg(feature = "solver-clarabel")]
pub use direct::{solve_gg, solve_mcfgg};
pub use greedy::{greedy_forest, two_step_heuristic, GreedyForest};
pub use preprocess::{apply_exclusions, ExclusionReport};
pub use relaxation::{PhaseTimer, RelaxationResult, Utilization};
pub use union_find::UnionFind;

use mcrf_core::{Graph, McrfError, McrfResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Relaxation (or baseline) to run on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Hm,
    Tm,
    Gg,
    McfGg,
    TwoStep,
}

impl Method {
    pub const ALL: [Method; 5] = [Method::Hm, Method::Tm, Method::Gg, Method::McfGg, Method::TwoStep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Hm => "hm",
            Method::Tm => "tm",
            Method::Gg => "gg",
            Method::McfGg => "mcf-gg",
            Method::TwoStep => "two-step",
        }
    }

    /// Runs the method on `graph`. `config` only affects the column
    /// generation methods.
    pub fn run(&self, graph: &Graph, config: &ColumnGenerationConfig) -> McrfResult<RelaxationResult> {
        match self {
            Method::Hm => solve_hm(graph, config),
            Method::Tm => solve_tm(graph, config),
            #[cfg(feature = "solver-clarabel")]
            Method::Gg => solve_gg(graph),
            #[cfg(feature = "solver-clarabel")]
            Method::McfGg => solve_mcfgg(graph),
            #[cfg(not(feature = "solver-clarabel"))]
            Method::Gg | Method::McfGg => Err(McrfError::Config(format!(
                "{} needs the solver-clarabel feature",
                self
            ))),
            Method::TwoStep => {
                let start = Instant::now();
                let objective = two_step_heuristic(graph);
                let mut time = BTreeMap::new();
                time.insert("heuristic".to_string(), start.elapsed().as_secs_f64());
                Ok(RelaxationResult {
                    objective_value: objective as f64,
                    time,
                    iterations: 1,
                    columns: 0,
                    progress: Vec::new(),
                    utilization: None,
                })
            }
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = McrfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hm" => Ok(Method::Hm),
            "tm" => Ok(Method::Tm),
            "gg" => Ok(Method::Gg),
            "mcf-gg" | "mcfgg" => Ok(Method::McfGg),
            "two-step" | "twostep" => Ok(Method::TwoStep),
            other => Err(McrfError::Config(format!("unknown method '{}'", other))),
        }
    }
}
