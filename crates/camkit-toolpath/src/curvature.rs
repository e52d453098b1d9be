//! Curvature-adaptive feed annotation.
//!
//! Computes discrete Menger curvature along contiguous cutting runs and
//! stores a feed-scale factor on segments whose local radius falls below the
//! configured multiple of the tool diameter. Annotation only: the scale is
//! folded into an actual feed override at emission time.

use crate::segment::{MoveKind, Segment};
use camkit_core::geom::Point;
use camkit_core::params::CuttingParams;

/// Menger curvature of the triple (a, b, c): `4 * area / (|ab| |bc| |ac|)`.
/// Zero for collinear points.
pub fn menger_curvature(a: &Point, b: &Point, c: &Point) -> f64 {
    let ab = a.distance_to(b);
    let bc = b.distance_to(c);
    let ac = a.distance_to(c);
    if ab < 1e-12 || bc < 1e-12 || ac < 1e-12 {
        return 0.0;
    }
    let area2 = ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs();
    2.0 * area2 / (ab * bc * ac)
}

/// Annotates feed-scale factors in place. Each triple of consecutive path
/// points inside a cutting run scales the two segments meeting at the middle
/// point; runs are broken by rapids.
pub fn annotate(segments: &mut [Segment], params: &CuttingParams) {
    let tuning = &params.tuning;
    let threshold = tuning.curvature_radius_multiple * params.tool_diameter;
    let floor = tuning.feed_scale_floor;

    let mut run_start = 0;
    let mut i = 0;
    while i <= segments.len() {
        let run_broken = i == segments.len()
            || !segments[i].kind.is_cutting()
            || (i > run_start && segments[i - 1].end.distance_to(&segments[i].start) > 1e-6);
        if run_broken {
            annotate_run(&mut segments[run_start..i], threshold, floor);
            run_start = i + 1;
            if i < segments.len() && segments[i].kind.is_cutting() {
                run_start = i;
            }
        }
        i += 1;
    }
}

fn annotate_run(run: &mut [Segment], threshold: f64, floor: f64) {
    if run.len() < 2 {
        return;
    }
    for i in 0..run.len() - 1 {
        // Arc segments already encode their radius; the triple test covers
        // the polyline corners the strategies emit.
        if run[i].kind != MoveKind::LinearCut || run[i + 1].kind != MoveKind::LinearCut {
            continue;
        }
        let a = run[i].start;
        let b = run[i].end;
        let c = run[i + 1].end;
        let k = menger_curvature(&a, &b, &c);
        if k < 1e-12 {
            continue;
        }
        let radius = 1.0 / k;
        if radius >= threshold {
            continue;
        }
        let scale = (floor + (1.0 - floor) * (radius / threshold)).clamp(floor, 1.0);
        run[i].feed_scale = run[i].feed_scale.min(scale);
        run[i + 1].feed_scale = run[i + 1].feed_scale.min(scale);
    }
}
