//! Polygon offset engine.
//!
//! Produces concentric inward offset rings of the pocket boundary at
//! stepover spacing, dilates islands outward into keep-out boundaries, and
//! clips every ring where it would enter a keep-out (path-level boolean
//! difference). Offsetting is delegated to `cavalier_contours`; bulge
//! vertices in its output are tessellated at the smoothing tolerance so the
//! rest of the pipeline works on plain polylines.

use camkit_core::error::{CamError, GeometryError, OffsetError};
use camkit_core::geom::{point_in_polygon, segment_intersection_t, signed_area, Point};
use camkit_core::params::CuttingParams;
use camkit_core::geom::LoopSet;
use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};
use tracing::debug;

const POINT_EPS: f64 = 1e-7;

/// One connected piece of an offset ring after island clipping. Clipping an
/// annular ring against a keep-out leaves open chains; untouched rings stay
/// closed.
#[derive(Debug, Clone)]
pub struct RingPath {
    pub pts: Vec<Point>,
    pub closed: bool,
}

impl RingPath {
    pub fn length(&self) -> f64 {
        let mut len = 0.0;
        for w in self.pts.windows(2) {
            len += w[0].distance_to(&w[1]);
        }
        if self.closed && self.pts.len() > 2 {
            len += self.pts[self.pts.len() - 1].distance_to(&self.pts[0]);
        }
        len
    }
}

/// All ring paths at one inset distance from the pocket boundary.
#[derive(Debug, Clone)]
pub struct Ring {
    /// Inset from the boundary (mm). Ring 0 sits at the tool radius.
    pub inset: f64,
    pub paths: Vec<RingPath>,
}

/// Result of the offset stage.
#[derive(Debug, Clone)]
pub struct OffsetOutcome {
    /// Rings ordered outermost first.
    pub rings: Vec<Ring>,
    /// Island keep-out polygons, dilated by the tool radius. The toolpath
    /// must never enter these.
    pub keepouts: Vec<Vec<Point>>,
    pub warnings: Vec<String>,
}

/// Computes the full inward ring set. Retries once with a 10x relaxed
/// tolerance if the offset collapses prematurely, per the error-handling
/// contract.
pub fn compute_rings(loops: &LoopSet, params: &CuttingParams) -> Result<OffsetOutcome, CamError> {
    match compute_rings_at_tolerance(loops, params, params.smoothing_tolerance) {
        Err(CamError::Offset(OffsetError::PrematureCollapse { .. })) => {
            debug!("offset collapsed prematurely, retrying with relaxed tolerance");
            compute_rings_at_tolerance(loops, params, params.smoothing_tolerance * 10.0)
        }
        other => other,
    }
}

fn compute_rings_at_tolerance(
    loops: &LoopSet,
    params: &CuttingParams,
    tolerance: f64,
) -> Result<OffsetOutcome, CamError> {
    let tool_radius = params.tool_diameter / 2.0;
    let step = params.ring_step();
    let outer = to_closed_polyline(&loops.outer.pts);

    // The pocket must admit the tool at all before any ring work.
    if offset_paths(&outer, tool_radius, tolerance).is_empty() {
        return Err(GeometryError::ToolExceedsPocket {
            tool_diameter: params.tool_diameter,
        }
        .into());
    }

    let keepouts = dilate_islands(loops, tool_radius, tolerance)?;

    let mut rings: Vec<Ring> = Vec::new();
    let mut last_inset = tool_radius;
    let mut k = 0usize;
    loop {
        let inset = tool_radius + step * k as f64;
        let raw = offset_paths(&outer, inset, tolerance);
        if raw.is_empty() {
            break;
        }
        last_inset = inset;
        let mut paths: Vec<RingPath> = Vec::new();
        for pts in raw {
            paths.extend(clip_against_keepouts(pts, &keepouts));
        }
        if !paths.is_empty() {
            rings.push(Ring { inset, paths });
        }
        k += 1;
    }

    if rings.is_empty() {
        // Offsets existed at the tool radius but everything fell inside the
        // island keep-outs.
        return Err(OffsetError::PrematureCollapse { rings: 0 }.into());
    }

    // Probe one tool radius beyond the deepest ring: surviving material
    // there is farther from the last ring than the tool can reach.
    let mut warnings = Vec::new();
    let probe = offset_paths(&outer, last_inset + tool_radius, tolerance);
    let uncut_length: f64 = probe
        .into_iter()
        .flat_map(|pts| clip_against_keepouts(pts, &keepouts))
        .map(|p| p.length())
        .sum();
    if uncut_length > params.tool_diameter {
        if params.allow_partial {
            warnings.push(format!(
                "offset collapsed after {} ring(s); leaving an uncut boss at the pocket center",
                rings.len()
            ));
        } else {
            return Err(OffsetError::PrematureCollapse { rings: rings.len() }.into());
        }
    }

    debug!(
        rings = rings.len(),
        keepouts = keepouts.len(),
        "offset ring set computed"
    );
    Ok(OffsetOutcome {
        rings,
        keepouts,
        warnings,
    })
}

/// Dilates each island outward by the tool radius into a keep-out polygon.
fn dilate_islands(
    loops: &LoopSet,
    tool_radius: f64,
    tolerance: f64,
) -> Result<Vec<Vec<Point>>, CamError> {
    let mut keepouts = Vec::with_capacity(loops.islands.len());
    for (i, island) in loops.islands.iter().enumerate() {
        let pline = to_closed_polyline(&island.pts);
        // Positive distance grows a clockwise-oriented closed polyline.
        let grown = pline.parallel_offset(tool_radius);
        let mut best: Option<Vec<Point>> = None;
        let mut best_area = 0.0;
        for pl in &grown {
            let pts = tessellate_polyline(pl, tolerance);
            let area = signed_area(&pts).abs();
            if area > best_area {
                best_area = area;
                best = Some(pts);
            }
        }
        match best {
            Some(pts) if pts.len() >= 3 => keepouts.push(pts),
            _ => return Err(OffsetError::IslandClipFailed { island_index: i }.into()),
        }
    }
    Ok(keepouts)
}

/// Inward offset of the boundary by `inset`, as tessellated point loops.
/// Degenerate slivers below the tolerance are dropped; multi-loop results
/// are ordered deterministically.
fn offset_paths(outer: &Polyline, inset: f64, tolerance: f64) -> Vec<Vec<Point>> {
    let mut result: Vec<Vec<Point>> = outer
        .parallel_offset(-inset)
        .iter()
        .map(|pl| tessellate_polyline(pl, tolerance))
        .filter(|pts| pts.len() >= 3 && signed_area(pts).abs() > tolerance * tolerance)
        .collect();
    result.sort_by(|a, b| {
        let ka = a
            .iter()
            .map(|p| (p.x, p.y))
            .fold((f64::INFINITY, f64::INFINITY), |acc, p| {
                if (p.0, p.1) < acc {
                    p
                } else {
                    acc
                }
            });
        let kb = b
            .iter()
            .map(|p| (p.x, p.y))
            .fold((f64::INFINITY, f64::INFINITY), |acc, p| {
                if (p.0, p.1) < acc {
                    p
                } else {
                    acc
                }
            });
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    });
    result
}

/// Builds a clockwise closed polyline, the orientation the offset math
/// expects for inward-negative distances.
fn to_closed_polyline(pts: &[Point]) -> Polyline {
    let mut ordered: Vec<Point> = pts.to_vec();
    if signed_area(&ordered) > 0.0 {
        ordered.reverse();
    }
    let mut pline = Polyline::new();
    for p in &ordered {
        pline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    pline.set_is_closed(true);
    pline
}

/// Flattens a polyline to points, sampling bulge arcs at the tolerance.
fn tessellate_polyline(pline: &Polyline, tolerance: f64) -> Vec<Point> {
    let n = pline.vertex_data.len();
    let mut pts: Vec<Point> = Vec::with_capacity(n);
    for i in 0..n {
        let v = pline.vertex_data[i];
        let w = pline.vertex_data[(i + 1) % n];
        let p0 = Point::new(v.x, v.y);
        let p1 = Point::new(w.x, w.y);
        push_unique(&mut pts, p0);
        if v.bulge.abs() > 1e-12 {
            sample_bulge_arc(p0, p1, v.bulge, tolerance, &mut pts);
        }
    }
    if pts.len() > 1 && pts[0].distance_to(&pts[pts.len() - 1]) <= POINT_EPS {
        pts.pop();
    }
    pts
}

fn push_unique(pts: &mut Vec<Point>, p: Point) {
    if pts.last().map_or(true, |last| last.distance_to(&p) > POINT_EPS) {
        pts.push(p);
    }
}

/// Samples the interior of a bulge arc between `p0` and `p1`. The bulge is
/// tan(theta/4) with CCW positive.
fn sample_bulge_arc(p0: Point, p1: Point, bulge: f64, tolerance: f64, out: &mut Vec<Point>) {
    let theta = 4.0 * bulge.atan();
    let chord = p0.distance_to(&p1);
    if chord < POINT_EPS {
        return;
    }
    let half = (theta / 2.0).abs();
    let radius = chord / (2.0 * half.sin());
    if radius <= tolerance {
        return;
    }
    // Unit left normal of the chord; the signed apothem places the center on
    // the correct side for either winding.
    let nx = -(p1.y - p0.y) / chord;
    let ny = (p1.x - p0.x) / chord;
    let apothem = radius * (theta / 2.0).cos() * bulge.signum();
    let mid = p0.midpoint(&p1);
    let center = Point::new(mid.x + nx * apothem, mid.y + ny * apothem);

    let max_step = 2.0 * (1.0 - tolerance / radius).clamp(-1.0, 1.0).acos();
    let steps = ((theta.abs() / max_step.max(1e-3)).ceil() as usize).max(1);
    let a0 = (p0.y - center.y).atan2(p0.x - center.x);
    for i in 1..steps {
        let a = a0 + theta * i as f64 / steps as f64;
        push_unique(
            out,
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin()),
        );
    }
}

/// Splits a closed ring where it enters island keep-outs, keeping the
/// portions outside. Returns the surviving pieces as ring paths.
fn clip_against_keepouts(mut pts: Vec<Point>, keepouts: &[Vec<Point>]) -> Vec<RingPath> {
    // Canonical counter-clockwise winding, so open chains produced here keep
    // a known traversal direction for the strategy stage.
    if signed_area(&pts) < 0.0 {
        pts.reverse();
    }
    if keepouts.is_empty() {
        return vec![RingPath { pts, closed: true }];
    }

    let inside_any = |p: &Point| keepouts.iter().any(|k| point_in_polygon(p, k));

    // Walk each edge of the implicitly closed ring, splitting at keep-out
    // boundary crossings and keeping sub-segments whose midpoint is outside.
    let n = pts.len();
    let mut kept_edges: Vec<(Point, Point)> = Vec::new();
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let mut cuts: Vec<f64> = vec![0.0, 1.0];
        for keepout in keepouts {
            let m = keepout.len();
            for j in 0..m {
                let k0 = keepout[j];
                let k1 = keepout[(j + 1) % m];
                if let Some(t) = segment_intersection_t(&a, &b, &k0, &k1) {
                    cuts.push(t);
                }
            }
        }
        cuts.sort_by(|x, y| x.total_cmp(y));
        for w in cuts.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            if t1 - t0 < 1e-9 {
                continue;
            }
            let s = Point::new(a.x + (b.x - a.x) * t0, a.y + (b.y - a.y) * t0);
            let e = Point::new(a.x + (b.x - a.x) * t1, a.y + (b.y - a.y) * t1);
            let mid = s.midpoint(&e);
            if !inside_any(&mid) {
                kept_edges.push((s, e));
            }
        }
    }

    // Stitch consecutive kept edges back into chains.
    let mut chains: Vec<Vec<Point>> = Vec::new();
    for (s, e) in kept_edges {
        match chains.last_mut() {
            Some(chain)
                if chain
                    .last()
                    .is_some_and(|last| last.distance_to(&s) <= POINT_EPS) =>
            {
                chain.push(e);
            }
            _ => chains.push(vec![s, e]),
        }
    }
    if chains.is_empty() {
        return Vec::new();
    }

    // The walk starts mid-ring; merge a wrap-around split between the last
    // and first chain.
    if chains.len() > 1 {
        let wraps = match (
            chains.first().and_then(|c| c.first()),
            chains.last().and_then(|c| c.last()),
        ) {
            (Some(first), Some(last)) => last.distance_to(first) <= POINT_EPS,
            _ => false,
        };
        if wraps {
            if let Some(mut last) = chains.pop() {
                last.pop();
                let first = std::mem::take(&mut chains[0]);
                last.extend(first);
                chains[0] = last;
            }
        }
    }

    chains
        .into_iter()
        .map(|mut chain| {
            let closed = chain.len() > 2
                && chain[0].distance_to(&chain[chain.len() - 1]) <= POINT_EPS;
            if closed {
                chain.pop();
            }
            RingPath { pts: chain, closed }
        })
        .filter(|rp| rp.pts.len() >= 2)
        .collect()
}
