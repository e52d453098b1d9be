//! Jerk-limited cycle time estimation.
//!
//! Models each motion segment with a symmetric S-curve profile: velocity
//! ramps through jerk-bounded acceleration phases, so short segments never
//! reach the commanded feed. The result is a per-pass and total time along
//! with ±20% bounds reflecting controller-level effects the model ignores
//! (lookahead depth, exact-stop tuning, spindle dwell variance).

use crate::segment::{MoveKind, Pass, Segment};
use camkit_core::error::KinematicsError;
use camkit_core::params::MachineKinematics;
use serde::Serialize;
use tracing::debug;

/// Fraction of commanded velocity reachable on arc moves.
const ARC_VELOCITY_FACTOR: f64 = 0.9;
/// Time credit applied when the controller blends corners (G64-style).
const BLENDING_TIME_FACTOR: f64 = 0.9;
/// Half-width of the estimate bounds.
const BOUNDS_FRACTION: f64 = 0.20;

/// Cycle time estimate in seconds with uncertainty bounds.
#[derive(Debug, Clone, Serialize)]
pub struct CycleTimeEstimate {
    pub seconds: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub pass_seconds: Vec<f64>,
}

/// Estimates total cycle time for the scheduled passes.
pub fn estimate(
    passes: &[Pass],
    kin: &MachineKinematics,
    corner_blending: bool,
) -> Result<CycleTimeEstimate, KinematicsError> {
    kin.validate()?;

    let mut pass_seconds = Vec::with_capacity(passes.len());
    let mut total = 0.0;
    let mut current_z = 0.0;
    for pass in passes {
        let mut t = 0.0;
        for seg in &pass.segments {
            t += segment_time(seg, current_z, kin);
            current_z = seg.z;
        }
        pass_seconds.push(t);
        total += t;
    }

    if corner_blending {
        total *= BLENDING_TIME_FACTOR;
        for t in &mut pass_seconds {
            *t *= BLENDING_TIME_FACTOR;
        }
    }

    debug!(seconds = total, passes = passes.len(), "cycle time estimated");
    Ok(CycleTimeEstimate {
        seconds: total,
        lower_bound: total * (1.0 - BOUNDS_FRACTION),
        upper_bound: total * (1.0 + BOUNDS_FRACTION),
        pass_seconds,
    })
}

fn segment_time(seg: &Segment, prev_z: f64, kin: &MachineKinematics) -> f64 {
    // Plunges and retracts move in Z with unchanged XY.
    let distance = seg.length().max((seg.z - prev_z).abs());
    if distance <= 0.0 {
        return 0.0;
    }

    let commanded_mm_s = match seg.kind {
        MoveKind::RapidRetract | MoveKind::RapidTraverse => kin.rapid_rate / 60.0,
        MoveKind::ArcCw | MoveKind::ArcCcw => {
            seg.feed * seg.feed_scale / 60.0 * ARC_VELOCITY_FACTOR
        }
        MoveKind::LinearCut => seg.feed * seg.feed_scale / 60.0,
    };
    if commanded_mm_s <= 0.0 {
        return 0.0;
    }

    scurve_time(distance, commanded_mm_s, kin.max_accel, kin.max_jerk)
}

/// Time to traverse `distance` under a symmetric jerk-limited profile.
///
/// The jerk phases each last `t_a = accel / jerk` and cover
/// `s_a = 0.5 * accel * t_a^2`. If the remaining distance supports a
/// constant-acceleration phase the peak velocity is
/// `sqrt(2 * accel * (d - 2 * s_a))`, capped at the commanded feed; below
/// that the profile degenerates to pure jerk ramps.
fn scurve_time(distance: f64, v_cmd: f64, accel: f64, jerk: f64) -> f64 {
    let t_a = accel / jerk;
    let s_a = 0.5 * accel * t_a * t_a;

    let v_peak = if distance > 2.0 * s_a {
        (2.0 * accel * (distance - 2.0 * s_a)).sqrt().min(v_cmd)
    } else {
        // Jerk-limited triangular profile: v = jerk * (t/2)^2 over half the
        // distance each way.
        let t_half = (distance / jerk).cbrt();
        (jerk * t_half * t_half).min(v_cmd)
    };

    if v_peak <= 0.0 {
        return 0.0;
    }

    // Ramp-up time to v_peak: jerk phases plus any constant-accel middle.
    let ramp_time = if v_peak >= accel * t_a {
        t_a + v_peak / accel
    } else {
        2.0 * (v_peak / jerk).sqrt()
    };
    // Distance covered in one ramp is v_peak * ramp_time / 2 for this
    // symmetric profile family.
    let ramp_dist = v_peak * ramp_time / 2.0;
    let cruise_dist = (distance - 2.0 * ramp_dist).max(0.0);

    2.0 * ramp_time + cruise_dist / v_peak
}
