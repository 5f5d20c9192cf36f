//! # mcrf-io: Instance I/O
//!
//! Readers and writers for the instance files consumed by the `mcrf` tools.
//! Readers return a [`GraphBuilder`](mcrf_core::GraphBuilder) so that callers
//! can still reshape the instance (edge cuts, depot placement) before
//! finalizing it.
//!
//! ## Supported Formats
//!
//! | Format | Extension | Depots | Notes |
//! |--------|-----------|--------|-------|
//! | TSPLIB | `.tsp` | none | complete graph, rounded euclidean weights |
//! | depot instance | `.txt` | listed | capacity = MST / (5 · depots) |
//!
//! ```rust,no_run
//! use mcrf_io::load_instance;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let graph = load_instance(Path::new("instances/att48.2.txt"))?.finalize();
//!     println!("{} depots, {} customers", graph.depot_count(), graph.customer_count());
//!     Ok(())
//! }
//! ```

pub mod format;
pub mod tsplib;
pub mod txt;

pub use format::{load_instance, Format};
pub use tsplib::{parse_tsp_file, parse_tsp_string};
pub use txt::{parse_txt_file, parse_txt_string, write_txt_file, write_txt_string};
