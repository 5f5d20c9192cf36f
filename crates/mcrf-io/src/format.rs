//! Format detection and unified load interface.

use std::path::Path;

use anyhow::{anyhow, Result};
use mcrf_core::GraphBuilder;

use crate::{tsplib, txt};

/// Supported instance formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TSPLIB coordinate files; a complete graph without depots
    Tsplib,
    /// Whitespace separated depot instances
    Txt,
}

impl Format {
    pub const ALL: &'static [Format] = &[Format::Tsplib, Format::Txt];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Tsplib => &["tsp"],
            Format::Txt => &["txt"],
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            Format::Tsplib => "TSPLIB coordinates",
            Format::Txt => "depot instance",
        }
    }

    /// Detect format from the file extension.
    pub fn detect(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn load(&self, path: &Path) -> Result<GraphBuilder> {
        match self {
            Format::Tsplib => tsplib::parse_tsp_file(path),
            Format::Txt => txt::parse_txt_file(path),
        }
    }
}

/// Loads an instance, picking the reader by extension.
pub fn load_instance(path: &Path) -> Result<GraphBuilder> {
    let format = Format::detect(path)
        .ok_or_else(|| anyhow!("unsupported instance format: {}", path.display()))?;
    tracing::debug!(path = %path.display(), format = format.friendly_name(), "loading instance");
    format.load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(Format::detect(Path::new("a/berlin52.tsp")), Some(Format::Tsplib));
        assert_eq!(Format::detect(Path::new("a/b.2.TXT")), Some(Format::Txt));
        assert_eq!(Format::detect(Path::new("a/b.json")), None);
        assert_eq!(Format::detect(Path::new("noext")), None);
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let err = load_instance(Path::new("instance.csv")).unwrap_err();
        assert!(err.to_string().contains("unsupported instance format"));
    }
}
