use mcrf_core::{DepotId, GraphBuilder};
use mcrf_io::{load_instance, write_txt_file};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_txt_written_then_loaded_by_extension() {
    let mut builder = GraphBuilder::new("square");
    let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
        .into_iter()
        .map(|(x, y)| builder.add_vertex(x, y))
        .collect();
    for i in 0..4 {
        builder.add_edge(v[i], v[(i + 1) % 4], 10).unwrap();
    }
    builder.set_capacity(v[2], 6.0);
    let graph = builder.finalize();

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("square.1.txt");
    write_txt_file(&graph, &path).unwrap();

    let loaded = load_instance(&path).unwrap().finalize();
    assert_eq!(loaded.name(), "square_1");
    assert_eq!(loaded.vertex_count(), 4);
    assert_eq!(loaded.edge_count(), 4);
    // capacity is recomputed from the MST: 30 / 5
    assert_eq!(loaded.depot(DepotId::new(0)).capacity, 6.0);
    assert_eq!(loaded.depot(DepotId::new(0)).x, 1.0);
    assert_eq!(loaded.depot(DepotId::new(0)).y, 1.0);
}

#[test]
fn test_tsp_file_uses_file_stem() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tiny.tsp");
    fs::write(
        &path,
        "NAME : tiny\nNODE_COORD_SECTION\n1 0 0\n2 6 8\nEOF\n",
    )
    .unwrap();

    let graph = load_instance(&path).unwrap().finalize();
    assert_eq!(graph.name(), "tiny");
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.edges()[0].weight, 10);
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = load_instance(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.txt"));
}
