pub mod cli;
pub mod config;

pub use cli::{build_cli_command, Cli, Commands, ShapingArgs};
pub use config::{load_config, McrfConfig, OutputConfig, PreprocessingConfig};
