//! Trochoidal re-engagement insertion.
//!
//! Wherever the curvature analyzer flagged a cutting segment (feed-scale
//! below 1.0), the straight move is replaced by pairs of CW-departure /
//! CCW-return semicircular arcs advancing along the original chord. The
//! loop radius and advance pitch are selected deterministically from the
//! corner severity, and the final pair lands exactly on the original
//! endpoint so downstream segments are unaffected.

use crate::segment::{MoveKind, Segment};
use camkit_core::geom::Point;
use camkit_core::params::CuttingParams;
use tracing::debug;

/// Splices trochoid loops into the template. Operates on the segment arena
/// by index; the output vector replaces the input order one-for-one with
/// flagged segments expanded in place.
pub fn insert(segments: &mut Vec<Segment>, params: &CuttingParams) {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut inserted = 0usize;

    // Segments shorter than the tightest loop pitch stay as derated linear
    // cuts; a single stunted loop would not reduce engagement.
    let min_len = params.tool_diameter * params.tuning.trochoid_pitch_min_ratio;

    for seg in segments.drain(..) {
        let eligible = seg.kind == MoveKind::LinearCut
            && seg.feed_scale < 1.0 - 1e-9
            && seg.start.distance_to(&seg.end) >= min_len;
        if !eligible {
            out.push(seg);
            continue;
        }
        inserted += 1;
        expand_segment(&seg, params, &mut out);
    }

    if inserted > 0 {
        debug!(segments = inserted, "trochoid loops spliced");
    }
    *segments = out;
}

/// Severity of the engagement problem, 0 at full feed down to 1 at the
/// feed-scale floor.
fn severity(feed_scale: f64, floor: f64) -> f64 {
    if floor >= 1.0 {
        return 0.0;
    }
    ((1.0 - feed_scale) / (1.0 - floor)).clamp(0.0, 1.0)
}

fn expand_segment(seg: &Segment, params: &CuttingParams, out: &mut Vec<Segment>) {
    let tuning = &params.tuning;
    let s = severity(seg.feed_scale, tuning.feed_scale_floor);

    let radius = params.tool_diameter
        * (tuning.trochoid_radius_min_ratio
            + (tuning.trochoid_radius_max_ratio - tuning.trochoid_radius_min_ratio) * s);
    let pitch = params.tool_diameter
        * (tuning.trochoid_pitch_max_ratio
            - (tuning.trochoid_pitch_max_ratio - tuning.trochoid_pitch_min_ratio) * s);
    let reduction = tuning.engagement_reduction_min
        + (tuning.engagement_reduction_max - tuning.engagement_reduction_min) * s;
    let engagement = seg.engagement * (1.0 - reduction);

    let dx = seg.end.x - seg.start.x;
    let dy = seg.end.y - seg.start.y;
    let len = seg.start.distance_to(&seg.end);
    let ux = dx / len;
    let uy = dy / len;
    // Left normal of the travel direction; the departure arc bulges to this
    // side, the return arc mirrors it.
    let nx = -uy;
    let ny = ux;

    let loops = (len / pitch).ceil().max(1.0) as usize;
    let advance = len / loops as f64;
    // Each semicircle runs between a chord endpoint and the apex about their
    // midpoint, so its realized radius is half that span. The apex height is
    // solved from the target radius; wide advances at low severity push the
    // radius up within the configured band instead of shrinking the arc.
    let radius = radius
        .max(advance / 4.0)
        .min(params.tool_diameter * tuning.trochoid_radius_max_ratio);
    let height = (4.0 * radius * radius - (advance / 2.0).powi(2))
        .max(0.0)
        .sqrt();

    let mut at = seg.start;
    for i in 1..=loops {
        let target = if i == loops {
            // Exact landing, no accumulated drift.
            seg.end
        } else {
            Point::new(
                seg.start.x + ux * advance * i as f64,
                seg.start.y + uy * advance * i as f64,
            )
        };
        let apex = Point::new(
            (at.x + target.x) / 2.0 + nx * height,
            (at.y + target.y) / 2.0 + ny * height,
        );

        let mut depart = Segment::arc(
            MoveKind::ArcCw,
            at,
            apex,
            at.midpoint(&apex),
            seg.feed,
            engagement,
        );
        depart.feed_scale = seg.feed_scale;
        depart.z = seg.z;
        out.push(depart);

        let mut ret = Segment::arc(
            MoveKind::ArcCcw,
            apex,
            target,
            apex.midpoint(&target),
            seg.feed,
            engagement,
        );
        ret.feed_scale = seg.feed_scale;
        ret.z = seg.z;
        out.push(ret);

        at = target;
    }
}
