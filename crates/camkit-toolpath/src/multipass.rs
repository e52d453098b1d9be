//! Multi-pass Z scheduling.
//!
//! Splits the total depth into evenly spaced passes bounded by the stepdown
//! and replays the XY template at each level. Pass k of n targets
//! `depth * k / n`, so the spacing is even, no pass exceeds the stepdown,
//! and the final pass lands exactly on the requested depth with no
//! accumulated drift.

use crate::segment::{MoveKind, Pass, Segment};
use crate::strategy::PathTemplate;
use camkit_core::error::CamError;
use camkit_core::params::CuttingParams;
use camkit_core::types::CancelToken;
use tracing::debug;

/// Number of Z passes for the given depth and stepdown.
pub fn pass_count(depth: f64, stepdown: f64) -> usize {
    ((depth.abs() / stepdown).ceil() as usize).max(1)
}

/// Schedules the template across Z levels. Checks the cancellation token
/// between passes.
pub fn schedule(
    template: &PathTemplate,
    params: &CuttingParams,
    cancel: &CancelToken,
) -> Result<Vec<Pass>, CamError> {
    let n = pass_count(params.depth, params.stepdown);
    let mut passes = Vec::with_capacity(n);

    for k in 1..=n {
        if cancel.is_cancelled() {
            return Err(CamError::Cancelled);
        }
        let z = params.depth * k as f64 / n as f64;
        passes.push(build_pass(template, params, z));
    }

    debug!(passes = n, depth = params.depth, "z schedule complete");
    Ok(passes)
}

/// Replays the XY template at one Z level, inserting retract/reposition
/// preambles and plunges wherever the tool is airborne before a cut.
fn build_pass(template: &PathTemplate, params: &CuttingParams, z: f64) -> Pass {
    let mut segments: Vec<Segment> = Vec::new();
    let mut airborne = true;

    // Templates that begin with their own retract (lanes) already reposition
    // before the first cut; spiral templates get an explicit preamble.
    if template
        .segments
        .first()
        .is_some_and(|s| s.kind.is_cutting())
    {
        let entry = template.segments[0].start;
        let mut retract = Segment::rapid_retract(entry);
        retract.z = params.safe_z;
        segments.push(retract);
        let mut traverse = Segment::rapid_traverse(entry, entry);
        traverse.z = params.safe_z;
        segments.push(traverse);
    }

    for seg in &template.segments {
        match seg.kind {
            MoveKind::RapidRetract => {
                let mut s = seg.clone();
                s.z = params.safe_z;
                segments.push(s);
                airborne = true;
            }
            MoveKind::RapidTraverse => {
                let mut s = seg.clone();
                s.z = params.safe_z;
                segments.push(s);
            }
            _ => {
                if airborne {
                    let mut plunge =
                        Segment::linear(seg.start, seg.start, params.feed_z, 0.0);
                    plunge.z = z;
                    segments.push(plunge);
                    airborne = false;
                }
                let mut s = seg.clone();
                s.z = z;
                segments.push(s);
            }
        }
    }

    Pass { z, segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camkit_core::geom::Point;
    use camkit_core::params::{AdaptiveTuning, Strategy};

    fn params(depth: f64, stepdown: f64) -> CuttingParams {
        CuttingParams {
            tool_diameter: 6.0,
            stepover: 0.45,
            stepdown,
            strategy: Strategy::Spiral,
            feed_xy: 1200.0,
            feed_z: 300.0,
            safe_z: 5.0,
            depth,
            climb: true,
            smoothing_tolerance: 0.01,
            allow_partial: false,
            tuning: AdaptiveTuning::default(),
        }
    }

    fn template() -> PathTemplate {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let c = Point::new(10.0, 10.0);
        PathTemplate {
            segments: vec![
                Segment::linear(a, b, 1200.0, 2.7),
                Segment::linear(b, c, 1200.0, 2.7),
            ],
        }
    }

    #[test]
    fn test_pass_count() {
        assert_eq!(pass_count(-3.0, 1.5), 2);
        assert_eq!(pass_count(-3.1, 1.5), 3);
        assert_eq!(pass_count(-0.5, 1.5), 1);
    }

    #[test]
    fn test_even_spacing_and_exact_landing() {
        let p = params(-5.0, 1.5);
        let passes = schedule(&template(), &p, &CancelToken::new()).unwrap();
        assert_eq!(passes.len(), 4);
        let mut prev = 0.0;
        for pass in &passes {
            let step = prev - pass.z;
            assert!(step > 0.0);
            assert!(step <= p.stepdown + 1e-9, "stepdown exceeded: {}", step);
            prev = pass.z;
        }
        assert_eq!(passes.last().unwrap().z, -5.0);
    }

    #[test]
    fn test_depth_round_trip() {
        let p = params(-7.3, 2.0);
        let passes = schedule(&template(), &p, &CancelToken::new()).unwrap();
        let mut prev = 0.0;
        let mut total = 0.0;
        for pass in &passes {
            total += prev - pass.z;
            prev = pass.z;
        }
        assert!((total - 7.3).abs() < 1e-12);
    }

    #[test]
    fn test_passes_strictly_deepening() {
        let p = params(-6.0, 1.0);
        let passes = schedule(&template(), &p, &CancelToken::new()).unwrap();
        for pair in passes.windows(2) {
            assert!(pair[1].z < pair[0].z);
        }
    }

    #[test]
    fn test_plunge_inserted_before_first_cut() {
        let p = params(-3.0, 1.5);
        let passes = schedule(&template(), &p, &CancelToken::new()).unwrap();
        let pass = &passes[0];
        assert_eq!(pass.segments[0].kind, MoveKind::RapidRetract);
        assert_eq!(pass.segments[1].kind, MoveKind::RapidTraverse);
        let plunge = &pass.segments[2];
        assert_eq!(plunge.kind, MoveKind::LinearCut);
        assert!(plunge.start.distance_to(&plunge.end) < 1e-12);
        assert_eq!(plunge.z, pass.z);
        assert_eq!(plunge.feed, 300.0);
    }

    #[test]
    fn test_z_constant_within_pass_outside_transitions() {
        let p = params(-3.0, 1.5);
        let passes = schedule(&template(), &p, &CancelToken::new()).unwrap();
        for pass in &passes {
            for seg in pass.segments.iter().filter(|s| s.kind.is_cutting()) {
                assert_eq!(seg.z, pass.z);
            }
        }
    }

    #[test]
    fn test_cancellation_between_passes() {
        let p = params(-3.0, 1.5);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = schedule(&template(), &p, &cancel).unwrap_err();
        assert!(matches!(err, CamError::Cancelled));
    }
}
