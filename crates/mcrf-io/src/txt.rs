//! Depot instance `.txt` reader and writer.
//!
//! Layout (whitespace separated tokens):
//!
//! ```text
//! vertexCount depotCount edgeCount
//! depot vertex ids (1-based)          depotCount tokens
//! thresholds                          depotCount tokens, ignored on read
//! x y                                 vertexCount pairs
//! a b w                               edgeCount triples, 1-based
//! ```
//!
//! Capacities are not taken from the file: every depot receives
//! `MST weight / (5 · depotCount)`.

use anyhow::{anyhow, Context, Result};
use mcrf_core::{prim_dijkstra_mst, Graph, GraphBuilder, VertexKind, CAPACITY_DIVISOR};
use std::fs;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

/// Parse a `.txt` instance. The graph is named `<stem>_<depotCount>` where the
/// stem is the file name up to its first `.`.
pub fn parse_txt_file(path: &Path) -> Result<GraphBuilder> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading instance file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("instance");
    let stem = file_name.split('.').next().unwrap_or(file_name);
    parse_txt_string(stem, &content)
}

/// Parse `.txt` content from a string; `stem` is the base of the graph name.
pub fn parse_txt_string(stem: &str, content: &str) -> Result<GraphBuilder> {
    let mut tokens = Tokens::new(content);
    let vertex_count: usize = tokens.next("vertex count")?;
    let depot_count: usize = tokens.next("depot count")?;
    let edge_count: usize = tokens.next("edge count")?;

    let mut builder = GraphBuilder::new(format!("{stem}_{depot_count}"));

    let mut depot_indices = Vec::with_capacity(depot_count);
    for _ in 0..depot_count {
        depot_indices.push(one_based(tokens.next("depot id")?, vertex_count)?);
    }
    for _ in 0..depot_count {
        tokens.skip("depot threshold")?;
    }

    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let x: f64 = tokens.next("x coordinate")?;
        let y: f64 = tokens.next("y coordinate")?;
        vertices.push(builder.add_vertex(x, y));
    }

    for _ in 0..edge_count {
        let a = one_based(tokens.next("edge endpoint")?, vertex_count)?;
        let b = one_based(tokens.next("edge endpoint")?, vertex_count)?;
        let w: u32 = tokens.next("edge weight")?;
        if a != b {
            builder.add_edge(vertices[a], vertices[b], w)?;
        }
    }

    if depot_count > 0 {
        let capacity =
            prim_dijkstra_mst(&builder.finalize()) / (CAPACITY_DIVISOR * depot_count as f64);
        for index in depot_indices {
            builder.set_capacity(vertices[index], capacity);
        }
    }
    Ok(builder)
}

/// Serialize `graph` in `.txt` layout. Depots are renumbered to come first,
/// their capacities are written on the threshold line.
pub fn write_txt_string(graph: &Graph) -> String {
    let depot_count = graph.depot_count();
    let new_index = |vertex| match graph.kind(vertex) {
        VertexKind::Depot(d) => d.value(),
        VertexKind::Customer(c) => depot_count + c.value(),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "{} {} {}\n",
        graph.vertex_count(),
        depot_count,
        graph.edge_count()
    ));
    let ids: Vec<String> = (1..=depot_count).map(|i| i.to_string()).collect();
    out.push_str(&format!("{}\n", ids.join(" ")));
    let capacities: Vec<String> = graph.depots().iter().map(|d| d.capacity.to_string()).collect();
    out.push_str(&format!("{}\n", capacities.join(" ")));
    for depot in graph.depots() {
        out.push_str(&format!("{} {}\n", depot.x, depot.y));
    }
    for customer in graph.customers() {
        out.push_str(&format!("{} {}\n", customer.x, customer.y));
    }
    for edge in graph.edges() {
        let [a, b] = edge.endpoints;
        out.push_str(&format!("{} {} {}\n", new_index(a) + 1, new_index(b) + 1, edge.weight));
    }
    out
}

/// Write `graph` to `path`, creating parent directories.
pub fn write_txt_file(graph: &Graph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }
    fs::write(path, write_txt_string(graph))
        .with_context(|| format!("writing instance file: {}", path.display()))
}

fn one_based(id: usize, vertex_count: usize) -> Result<usize> {
    if id == 0 || id > vertex_count {
        return Err(anyhow!("vertex id {id} outside 1..={vertex_count}"));
    }
    Ok(id - 1)
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            inner: content.split_whitespace(),
            position: 0,
        }
    }

    fn raw(&mut self, what: &str) -> Result<&'a str> {
        self.position += 1;
        self.inner
            .next()
            .ok_or_else(|| anyhow!("unexpected end of input, expected {what} (token {})", self.position))
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.raw(what)?;
        token
            .parse()
            .map_err(|_| anyhow!("invalid {what} {token:?} (token {})", self.position))
    }

    fn skip(&mut self, what: &str) -> Result<()> {
        self.raw(what).map(|_| ())
    }
}
