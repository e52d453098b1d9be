// Integration tests for the full pocketing pipeline.

use camkit_core::geom::Point;
use camkit_core::params::{AdaptiveTuning, CuttingParams, MachineKinematics, Strategy};
use camkit_core::types::CancelToken;
use camkit_toolpath::{generate, MoveKind};
use proptest::prelude::*;

fn rect(w: f64, h: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ]
}

fn params(strategy: Strategy) -> CuttingParams {
    CuttingParams {
        tool_diameter: 6.0,
        stepover: 0.45,
        stepdown: 1.5,
        strategy,
        feed_xy: 1200.0,
        feed_z: 300.0,
        safe_z: 5.0,
        depth: -3.0,
        climb: true,
        smoothing_tolerance: 0.01,
        allow_partial: false,
        tuning: AdaptiveTuning::default(),
    }
}

#[test]
fn test_rectangle_spiral_two_passes() {
    let loops = vec![rect(100.0, 60.0)];
    let kin = MachineKinematics::default();
    let result = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    assert_eq!(result.passes.len(), 2);
    assert_eq!(result.passes[0].z, -1.5);
    assert_eq!(result.passes[1].z, -3.0);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_spiral_is_mostly_cutting() {
    let loops = vec![rect(100.0, 60.0)];
    let kin = MachineKinematics::default();
    let result = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    for pass in &result.passes {
        assert!(
            pass.cutting_move_ratio() >= 0.9,
            "cutting ratio {} below 0.9",
            pass.cutting_move_ratio()
        );
    }
}

#[test]
fn test_lanes_strategy_runs() {
    let loops = vec![rect(100.0, 60.0)];
    let kin = MachineKinematics::default();
    let result = generate(&loops, &params(Strategy::Lanes), &kin, false, &CancelToken::new())
        .unwrap();
    assert_eq!(result.passes.len(), 2);
    let cuts = result.passes[0]
        .segments
        .iter()
        .filter(|s| s.kind.is_cutting())
        .count();
    assert!(cuts > 0);
}

#[test]
fn test_island_never_violated() {
    let loops = vec![
        rect(100.0, 60.0),
        vec![
            Point::new(40.0, 20.0),
            Point::new(60.0, 20.0),
            Point::new(60.0, 40.0),
            Point::new(40.0, 40.0),
        ],
    ];
    let kin = MachineKinematics::default();
    let result = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    // The dilated island keepout extends tool_radius (3 mm) past the island.
    let min_x = 40.0 - 3.0;
    let max_x = 60.0 + 3.0;
    let min_y = 20.0 - 3.0;
    let max_y = 40.0 + 3.0;
    let tol = 1e-6;
    for pass in &result.passes {
        for seg in pass.segments.iter().filter(|s| s.kind == MoveKind::LinearCut) {
            for p in [&seg.start, &seg.end] {
                let inside = p.x > min_x + tol
                    && p.x < max_x - tol
                    && p.y > min_y + tol
                    && p.y < max_y - tol;
                assert!(!inside, "cut endpoint inside keepout: ({}, {})", p.x, p.y);
            }
        }
    }
}

#[test]
fn test_feed_scale_within_bounds() {
    let loops = vec![rect(100.0, 60.0)];
    let kin = MachineKinematics::default();
    let result = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    for pass in &result.passes {
        for seg in &pass.segments {
            assert!(seg.feed_scale >= 0.4 - 1e-12);
            assert!(seg.feed_scale <= 1.0 + 1e-12);
        }
    }
}

#[test]
fn test_deterministic_output() {
    let loops = vec![rect(80.0, 50.0)];
    let kin = MachineKinematics::default();
    let a = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    let b = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    assert_eq!(a.passes.len(), b.passes.len());
    for (pa, pb) in a.passes.iter().zip(&b.passes) {
        assert_eq!(pa.segments.len(), pb.segments.len());
        for (sa, sb) in pa.segments.iter().zip(&pb.segments) {
            assert_eq!(sa.kind, sb.kind);
            assert_eq!(sa.start.x.to_bits(), sb.start.x.to_bits());
            assert_eq!(sa.start.y.to_bits(), sb.start.y.to_bits());
            assert_eq!(sa.end.x.to_bits(), sb.end.x.to_bits());
            assert_eq!(sa.end.y.to_bits(), sb.end.y.to_bits());
        }
    }
}

#[test]
fn test_estimate_has_bounds() {
    let loops = vec![rect(100.0, 60.0)];
    let kin = MachineKinematics::default();
    let result = generate(&loops, &params(Strategy::Spiral), &kin, false, &CancelToken::new())
        .unwrap();
    assert!(result.estimate.seconds > 0.0);
    assert!(result.estimate.lower_bound < result.estimate.seconds);
    assert!(result.estimate.upper_bound > result.estimate.seconds);
    assert_eq!(result.estimate.pass_seconds.len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_pass_depths_within_stepdown(
        depth in -20.0f64..-0.5,
        stepdown in 0.5f64..5.0,
    ) {
        let mut p = params(Strategy::Spiral);
        p.depth = depth;
        p.stepdown = stepdown;
        let loops = vec![rect(100.0, 60.0)];
        let kin = MachineKinematics::default();
        let result =
            generate(&loops, &p, &kin, false, &CancelToken::new()).unwrap();
        let mut prev = 0.0;
        for pass in &result.passes {
            let step = prev - pass.z;
            prop_assert!(step <= stepdown + 1e-9);
            prop_assert!(step > 0.0);
            prev = pass.z;
        }
        prop_assert!((prev - depth).abs() < 1e-9);
    }

    #[test]
    fn prop_rectangle_sizes_always_complete(
        w in 30.0f64..200.0,
        h in 30.0f64..200.0,
    ) {
        let loops = vec![rect(w, h)];
        let kin = MachineKinematics::default();
        let result = generate(
            &loops,
            &params(Strategy::Spiral),
            &kin,
            false,
            &CancelToken::new(),
        )
        .unwrap();
        prop_assert!(!result.passes.is_empty());
        prop_assert!(result.warnings.is_empty());
    }
}
