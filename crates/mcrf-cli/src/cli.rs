use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use mcrf_algo::Method;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mcrf", author, version, about = "Relaxation bounds for capacitated multi-depot forests", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// TOML configuration file; a missing file means defaults
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute a bound for one instance
    Solve {
        /// Instance file (.tsp or .txt)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Relaxation to run: hm, tm, gg, mcf-gg or two-step
        #[arg(short, long, default_value = "hm")]
        method: Method,
        /// Place this many depots (1, 2, 4 or 8) on a depot-less instance
        #[arg(short, long)]
        depots: Option<usize>,
        #[command(flatten)]
        shaping: ShapingArgs,
        /// Stop column generation after this many master solves
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Include per-customer and per-edge utilization in the output
        #[arg(long)]
        utilization: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one method over every instance of a directory
    Batch {
        /// Directory of .tsp / .txt instances
        #[arg(value_hint = ValueHint::DirPath)]
        directory: PathBuf,
        /// Relaxation to run
        #[arg(short, long, default_value = "hm")]
        method: Method,
        /// Depot counts placed on depot-less instances
        #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 4, 8])]
        depots: Vec<usize>,
        #[command(flatten)]
        shaping: ShapingArgs,
        /// Output JSON-lines file (default: <results_dir>/<method>.jsonl)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Shape an instance and report what the exclusion rules remove
    Preprocess {
        /// Instance file (.tsp or .txt)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Place this many depots on a depot-less instance
        #[arg(short, long)]
        depots: Option<usize>,
        #[command(flatten)]
        shaping: ShapingArgs,
        /// Write the shaped instance as .txt
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Convert an instance to the depot .txt layout
    Convert {
        /// Input instance (.tsp or .txt)
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output .txt file
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        /// Place this many depots on a depot-less instance
        #[arg(short, long)]
        depots: Option<usize>,
    },
    /// Print instance statistics
    Inspect {
        /// Instance file (.tsp or .txt)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Place this many depots on a depot-less instance
        #[arg(short, long)]
        depots: Option<usize>,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Overrides for the `[preprocessing]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct ShapingArgs {
    /// Skip the Dijkstra exclusion rule
    #[arg(long)]
    pub no_dijkstra: bool,
    /// Skip the triangle exclusion rule
    #[arg(long)]
    pub no_triangle: bool,
    /// Thin edges by geometry before solving
    #[arg(long)]
    pub geometry_cut: bool,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
