//! `mcrf` configuration file.
//!
//! ```toml
//! [column_generation]
//! pricing_tolerance = 1e-6
//! max_iterations = 500
//! removal = { inactive_for = { iterations = 5 } }
//!
//! [column_generation.solver]
//! max_iter = 200
//!
//! [preprocessing]
//! dijkstra = true
//! triangle = true
//! geometry_cut = false
//! geometry_scale = 0.5
//! geometry_degree = 3
//!
//! [output]
//! results_dir = "results"
//! ```

use crate::cli::ShapingArgs;
use anyhow::{Context, Result};
use mcrf_algo::ColumnGenerationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct McrfConfig {
    #[serde(default)]
    pub column_generation: ColumnGenerationConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Instance preparation applied before a relaxation runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessingConfig {
    #[serde(default = "default_true")]
    pub dijkstra: bool,
    #[serde(default = "default_true")]
    pub triangle: bool,
    #[serde(default)]
    pub geometry_cut: bool,
    #[serde(default = "default_geometry_scale")]
    pub geometry_scale: f64,
    #[serde(default = "default_geometry_degree")]
    pub geometry_degree: usize,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            dijkstra: true,
            triangle: true,
            geometry_cut: false,
            geometry_scale: default_geometry_scale(),
            geometry_degree: default_geometry_degree(),
        }
    }
}

impl PreprocessingConfig {
    /// Command-line flags win over the file.
    pub fn with_overrides(&self, args: &ShapingArgs) -> Self {
        Self {
            dijkstra: self.dijkstra && !args.no_dijkstra,
            triangle: self.triangle && !args.no_triangle,
            geometry_cut: self.geometry_cut || args.geometry_cut,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Where `batch` writes its JSON lines
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_geometry_scale() -> f64 {
    0.5
}

fn default_geometry_degree() -> usize {
    3
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

/// Reads the configuration at `path`. No path, or a path that does not
/// exist, yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<McrfConfig> {
    let Some(path) = path else {
        return Ok(McrfConfig::default());
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(McrfConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing config file: {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<McrfConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcrf_algo::RemovalPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, McrfConfig::default());
        assert!(config.preprocessing.dijkstra);
        assert_eq!(config.preprocessing.geometry_scale, 0.5);
        assert_eq!(config.preprocessing.geometry_degree, 3);
        assert_eq!(config.output.results_dir, PathBuf::from("results"));
    }

    #[test]
    fn test_sections_are_read() {
        let config = parse_config(
            r#"
            [column_generation]
            max_iterations = 40
            removal = { inactive_for = { iterations = 3 } }

            [column_generation.solver]
            max_iter = 50

            [preprocessing]
            triangle = false
            geometry_cut = true

            [output]
            results_dir = "out"
            "#,
        )
        .unwrap();
        assert_eq!(config.column_generation.max_iterations, Some(40));
        assert_eq!(
            config.column_generation.removal,
            RemovalPolicy::InactiveFor { iterations: 3 }
        );
        assert_eq!(config.column_generation.solver.max_iter, 50);
        assert!(config.preprocessing.dijkstra);
        assert!(!config.preprocessing.triangle);
        assert!(config.preprocessing.geometry_cut);
        assert_eq!(config.output.results_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, McrfConfig::default());
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mcrf.toml");
        fs::write(&path, "[preprocessing]\ndijkstra = \"yes\"\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("mcrf.toml"));
    }

    #[test]
    fn test_flags_override_file() {
        let file = PreprocessingConfig::default();
        let args = ShapingArgs {
            no_dijkstra: true,
            no_triangle: false,
            geometry_cut: true,
        };
        let merged = file.with_overrides(&args);
        assert!(!merged.dijkstra);
        assert!(merged.triangle);
        assert!(merged.geometry_cut);
        assert_eq!(merged.geometry_degree, 3);
    }
}
