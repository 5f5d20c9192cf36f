//! Instance shaping on the mutable graph: geometric edge thinning and grid
//! depot placement for depot-less coordinate instances.

use mcrf_core::{prim_dijkstra_mst, EdgeKey, GraphBuilder, McrfError, McrfResult, CAPACITY_DIVISOR};
use std::collections::HashSet;

/// Keeps for every vertex at most `degree` incident edges chosen greedily by
/// a score mixing relative weight and angular spread, then drops every edge
/// no vertex chose.
///
/// The score of a candidate edge is `scale · w / w_max + Σ cos(θ_chosen − θ)`,
/// so short edges pointing away from already chosen directions win.
pub fn geometry_cut(builder: &mut GraphBuilder, scale: f64, degree: usize) {
    let mut chosen: HashSet<EdgeKey> = HashSet::new();
    let vertices: Vec<_> = builder.vertex_keys().collect();

    for v in vertices {
        let (vx, vy) = builder.position(v);
        let candidates: Vec<(EdgeKey, u32, f64)> = builder
            .incident(v)
            .into_iter()
            .filter_map(|(edge, other)| {
                let weight = builder.edge_weight(edge)?;
                let (ox, oy) = builder.position(other);
                Some((edge, weight, (oy - vy).atan2(ox - vx)))
            })
            .collect();
        let Some(max_weight) = candidates.iter().map(|(_, w, _)| *w).max() else {
            continue;
        };
        let max_weight = f64::from(max_weight);

        let mut taken: Vec<usize> = Vec::with_capacity(degree);
        let mut angles: Vec<f64> = Vec::with_capacity(degree);
        for _ in 0..degree {
            let best = candidates
                .iter()
                .enumerate()
                .filter(|(i, _)| !taken.contains(i))
                .map(|(i, (_, weight, angle))| {
                    let relative = if max_weight > 0.0 {
                        f64::from(*weight) / max_weight
                    } else {
                        0.0
                    };
                    let spread: f64 = angles.iter().map(|a| (a - angle).cos()).sum();
                    (i, scale * relative + spread)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let Some((index, _)) = best else { break };
            taken.push(index);
            angles.push(candidates[index].2);
            chosen.insert(candidates[index].0);
        }
    }

    let dropped: Vec<EdgeKey> = builder
        .edges()
        .map(|(key, ..)| key)
        .filter(|key| !chosen.contains(key))
        .collect();
    for key in dropped {
        builder.remove_edge(key);
    }
}

/// Normalized rectangle centers for the supported depot counts.
fn grid_centers(depot_count: usize) -> McrfResult<&'static [(f64, f64)]> {
    match depot_count {
        1 => Ok(&[(0.5, 0.5)]),
        2 => Ok(&[(0.25, 0.5), (0.75, 0.5)]),
        4 => Ok(&[(0.25, 0.25), (0.25, 0.75), (0.75, 0.25), (0.75, 0.75)]),
        8 => Ok(&[
            (0.125, 0.25),
            (0.125, 0.75),
            (0.375, 0.25),
            (0.375, 0.75),
            (0.625, 0.25),
            (0.625, 0.75),
            (0.875, 0.25),
            (0.875, 0.75),
        ]),
        other => Err(McrfError::Validation(format!(
            "unsupported depot count {other}, expected 1, 2, 4 or 8"
        ))),
    }
}

/// Turns the vertices closest to the centers of a `depot_count` grid over the
/// bounding box into depots of capacity `MST / (5 · depot_count)` and appends
/// `_<depot_count>` to the graph name.
pub fn assign_depots(builder: &mut GraphBuilder, depot_count: usize) -> McrfResult<()> {
    let centers = grid_centers(depot_count)?;
    let vertices: Vec<_> = builder.vertex_keys().collect();
    if vertices.is_empty() {
        return Err(McrfError::Validation("cannot place depots in an empty graph".into()));
    }

    let (mut x_min, mut y_min) = (f64::INFINITY, f64::INFINITY);
    let (mut x_max, mut y_max) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &v in &vertices {
        let (x, y) = builder.position(v);
        x_min = x_min.min(x);
        y_min = y_min.min(y);
        x_max = x_max.max(x);
        y_max = y_max.max(y);
    }

    let capacity = prim_dijkstra_mst(&builder.finalize()) / (CAPACITY_DIVISOR * depot_count as f64);

    for &(cx, cy) in centers {
        let cx = (x_max - x_min) * cx + x_min;
        let cy = (y_max - y_min) * cy + y_min;
        let mut closest = vertices[0];
        let mut closest_dist = f64::INFINITY;
        for &v in &vertices {
            let (x, y) = builder.position(v);
            let dist = (cx - x) * (cx - x) + (cy - y) * (cy - y);
            if dist < closest_dist {
                closest = v;
                closest_dist = dist;
            }
        }
        if builder.capacity(closest).is_some() {
            return Err(McrfError::Graph(format!(
                "two grid centers resolve to the same vertex in {}",
                builder.name()
            )));
        }
        builder.set_capacity(closest, capacity);
    }

    let name = format!("{}_{}", builder.name(), depot_count);
    builder.set_name(name);
    Ok(())
}
