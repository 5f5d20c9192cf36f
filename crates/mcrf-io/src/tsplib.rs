//! TSPLIB `.tsp` reader.
//!
//! Only the `NODE_COORD_SECTION` is interpreted. The result is the complete
//! graph on the listed points with euclidean distances rounded to the nearest
//! integer as weights; it carries no depots.

use anyhow::{anyhow, Context, Result};
use mcrf_core::GraphBuilder;
use std::fs;
use std::path::Path;

/// Parse a `.tsp` file. The graph is named after the file stem.
pub fn parse_tsp_file(path: &Path) -> Result<GraphBuilder> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading TSPLIB file: {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("instance");
    parse_tsp_string(name, &content)
}

/// Parse `.tsp` content from a string.
pub fn parse_tsp_string(name: &str, content: &str) -> Result<GraphBuilder> {
    let mut builder = GraphBuilder::new(name);
    let mut reading_coordinates = false;

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        match trimmed {
            "NODE_COORD_SECTION" => reading_coordinates = true,
            "EOF" => break,
            "" => {}
            _ if reading_coordinates => {
                let fields: Vec<&str> = trimmed.split_whitespace().collect();
                if fields.len() < 3 {
                    return Err(anyhow!(
                        "line {}: expected `id x y`, found {:?}",
                        line_no + 1,
                        trimmed
                    ));
                }
                let x: f64 = fields[1]
                    .parse()
                    .with_context(|| format!("invalid x coordinate at line {}", line_no + 1))?;
                let y: f64 = fields[2]
                    .parse()
                    .with_context(|| format!("invalid y coordinate at line {}", line_no + 1))?;
                builder.add_vertex(x, y);
            }
            _ => {}
        }
    }

    let vertices: Vec<_> = builder.vertex_keys().collect();
    for (i, &a) in vertices.iter().enumerate() {
        for &b in &vertices[i + 1..] {
            let (ax, ay) = builder.position(a);
            let (bx, by) = builder.position(b);
            builder.add_edge(a, b, euclidean_weight(ax - bx, ay - by))?;
        }
    }
    Ok(builder)
}

/// Euclidean length rounded half up.
fn euclidean_weight(dx: f64, dy: f64) -> u32 {
    ((dx * dx + dy * dy).sqrt() + 0.5) as u32
}
