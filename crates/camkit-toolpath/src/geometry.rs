//! Geometry normalization: validates raw loops and classifies them into one
//! outer boundary plus islands.
//!
//! Upstream import is expected to deliver closed polylines already; this is
//! the safety net, not the primary validation path. Pure function of its
//! input.

use camkit_core::error::GeometryError;
use camkit_core::geom::{dedupe_vertices, point_in_polygon, signed_area, Loop, LoopRole, LoopSet, Point};
use tracing::debug;

/// Validates and classifies raw loops. The largest-area loop becomes the
/// outer boundary; every other loop must nest strictly inside it.
pub fn normalize_loops(
    raw: &[Vec<Point>],
    tolerance: f64,
) -> Result<LoopSet, GeometryError> {
    if raw.is_empty() {
        return Err(GeometryError::DegenerateLoop {
            loop_index: 0,
            reason: "no loops supplied".to_string(),
        });
    }

    let mut cleaned: Vec<(usize, Vec<Point>, f64)> = Vec::with_capacity(raw.len());
    for (i, pts) in raw.iter().enumerate() {
        if pts.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { loop_index: i });
        }
        let clean = dedupe_vertices(pts, tolerance);
        if clean.len() < 3 {
            return Err(GeometryError::DegenerateLoop {
                loop_index: i,
                reason: "fewer than 3 distinct points".to_string(),
            });
        }
        let area = signed_area(&clean).abs();
        if area <= tolerance * tolerance {
            return Err(GeometryError::DegenerateLoop {
                loop_index: i,
                reason: "zero enclosed area".to_string(),
            });
        }
        cleaned.push((i, clean, area));
    }

    // Largest area is the outer boundary.
    let outer_pos = cleaned
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.2.total_cmp(&b.2))
        .map(|(pos, _)| pos)
        .unwrap_or(0);
    let (_, outer_pts, outer_area) = cleaned.swap_remove(outer_pos);
    let outer = Loop::new(outer_pts, LoopRole::Outer);

    let mut islands = Vec::with_capacity(cleaned.len());
    let mut island_area_sum = 0.0;
    // Deterministic island ordering: original input order.
    cleaned.sort_by_key(|(i, _, _)| *i);
    for (i, pts, area) in cleaned {
        if area >= outer_area {
            return Err(GeometryError::InvalidNesting { loop_index: i });
        }
        // Every island vertex (and no edge crossing) must be inside the
        // outer. Vertex containment is sufficient for non-self-intersecting
        // input.
        if !pts.iter().all(|p| point_in_polygon(p, &outer.pts)) {
            return Err(GeometryError::InvalidNesting { loop_index: i });
        }
        island_area_sum += area;
        islands.push(Loop::new(pts, LoopRole::Island));
    }
    if island_area_sum >= outer_area {
        return Err(GeometryError::InvalidNesting { loop_index: 0 });
    }

    debug!(
        islands = islands.len(),
        outer_area, "normalized loop set"
    );
    Ok(LoopSet { outer, islands })
}
