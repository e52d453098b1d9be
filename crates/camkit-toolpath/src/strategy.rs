//! Toolpath strategy generation.
//!
//! Turns the offset ring set into an ordered XY move template. Z levels are
//! assigned later by the multi-pass scheduler; every cutting segment here is
//! tagged with the nominal radial engagement for the curvature and trochoid
//! stages.

use crate::offset::{OffsetOutcome, RingPath};
use crate::segment::Segment;
use camkit_core::geom::{point_in_polygon, segments_intersect, signed_area, Point};
use camkit_core::params::{CuttingParams, Strategy};
use tracing::debug;

/// The XY move template shared by every Z pass.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    pub segments: Vec<Segment>,
}

/// Builds the move template for the configured strategy.
pub fn generate(offset: &OffsetOutcome, params: &CuttingParams) -> PathTemplate {
    let template = match params.strategy {
        Strategy::Spiral => generate_spiral(offset, params),
        Strategy::Lanes => generate_lanes(offset, params),
    };
    debug!(
        strategy = ?params.strategy,
        segments = template.segments.len(),
        "strategy template generated"
    );
    template
}

/// Spiral: walk rings outermost to innermost, starting each ring at the
/// vertex nearest the previous exit point and bridging with a short cutting
/// move. A bridge that would cross an island keep-out becomes a
/// retract-and-reposition instead.
fn generate_spiral(offset: &OffsetOutcome, params: &CuttingParams) -> PathTemplate {
    let engagement = params.nominal_engagement();
    let mut segments: Vec<Segment> = Vec::new();
    let mut cursor: Option<Point> = None;

    for ring in &offset.rings {
        for path in &ring.paths {
            let pts = oriented(path, params.climb);
            if pts.len() < 2 {
                continue;
            }
            // Open chains keep their winding and endpoints; only closed
            // rings rotate their start toward the previous exit.
            let start_idx = if path.closed {
                match cursor {
                    Some(c) => nearest_index(&pts, &c),
                    None => 0,
                }
            } else {
                0
            };

            let entry = pts[start_idx];
            if let Some(c) = cursor {
                if c.distance_to(&entry) > 1e-6 {
                    if bridge_is_safe(&c, &entry, &offset.keepouts) {
                        segments.push(Segment::linear(c, entry, params.feed_xy, engagement));
                    } else {
                        segments.push(Segment::rapid_retract(c));
                        segments.push(Segment::rapid_traverse(c, entry));
                    }
                }
            }

            let mut current = entry;
            let n = pts.len();
            let steps = if path.closed { n } else { n - 1 - start_idx };
            for i in 1..=steps {
                let next = pts[(start_idx + i) % n];
                if current.distance_to(&next) > 1e-9 {
                    segments.push(Segment::linear(current, next, params.feed_xy, engagement));
                    current = next;
                }
            }
            cursor = Some(current);
        }
    }

    PathTemplate { segments }
}

/// Lanes: scanline raster over the tool-center region at stepover spacing,
/// with a retract-and-reposition between lanes for chip clearance. Island
/// keep-outs participate in the even-odd intersection pairing, so lanes
/// simply skip over them.
fn generate_lanes(offset: &OffsetOutcome, params: &CuttingParams) -> PathTemplate {
    let engagement = params.nominal_engagement();
    let mut segments: Vec<Segment> = Vec::new();
    let Some(boundary_ring) = offset.rings.first() else {
        return PathTemplate { segments };
    };

    // The outermost ring is the tool-center boundary; lanes fill its
    // interior.
    let mut edge_loops: Vec<&[Point]> = boundary_ring
        .paths
        .iter()
        .filter(|p| p.closed)
        .map(|p| p.pts.as_slice())
        .collect();
    for keepout in &offset.keepouts {
        edge_loops.push(keepout.as_slice());
    }
    if edge_loops.is_empty() {
        return PathTemplate { segments };
    }

    let (min_y, max_y) = edge_loops
        .iter()
        .flat_map(|pts| pts.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });

    let step = params.ring_step();
    let mut y = min_y + step / 2.0;
    let mut cursor: Option<Point> = None;
    while y < max_y {
        let mut xs: Vec<f64> = Vec::new();
        for pts in &edge_loops {
            let n = pts.len();
            for i in 0..n {
                let a = pts[i];
                let b = pts[(i + 1) % n];
                if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                    xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        xs.sort_by(|p, q| p.total_cmp(q));

        for pair in xs.chunks(2) {
            if pair.len() < 2 || pair[1] - pair[0] < 1e-6 {
                continue;
            }
            let lane_start = Point::new(pair[0], y);
            let lane_end = Point::new(pair[1], y);
            if let Some(c) = cursor {
                segments.push(Segment::rapid_retract(c));
                segments.push(Segment::rapid_traverse(c, lane_start));
            } else {
                segments.push(Segment::rapid_retract(lane_start));
                segments.push(Segment::rapid_traverse(lane_start, lane_start));
            }
            segments.push(Segment::linear(
                lane_start,
                lane_end,
                params.feed_xy,
                engagement,
            ));
            cursor = Some(lane_end);
        }
        y += step;
    }

    PathTemplate { segments }
}

/// Orients a ring path for the milling direction: counter-clockwise for
/// climb milling of internal contours, clockwise for conventional. Open
/// chains arrive in their parent ring's counter-clockwise order and flip
/// with the same rule.
fn oriented(path: &RingPath, climb: bool) -> Vec<Point> {
    let mut pts = path.pts.clone();
    let ccw = if path.closed {
        signed_area(&pts) > 0.0
    } else {
        true
    };
    if ccw != climb {
        pts.reverse();
    }
    pts
}

fn nearest_index(pts: &[Point], target: &Point) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, p) in pts.iter().enumerate() {
        let d = p.distance_to(target);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// A straight bridge is safe when it neither crosses a keep-out boundary nor
/// runs through a keep-out interior.
fn bridge_is_safe(a: &Point, b: &Point, keepouts: &[Vec<Point>]) -> bool {
    let mid = a.midpoint(b);
    for keepout in keepouts {
        if point_in_polygon(&mid, keepout) {
            return false;
        }
        let n = keepout.len();
        for i in 0..n {
            if segments_intersect(a, b, &keepout[i], &keepout[(i + 1) % n]) {
                return false;
            }
        }
    }
    true
}
