//! Adaptive 2.5D pocketing toolpath generation.
//!
//! Turns closed boundary/island loops plus cutting parameters into a
//! multi-pass toolpath: concentric offset rings or parallel lanes, with
//! curvature-based feed derating, trochoidal expansion in tight regions,
//! evenly scheduled Z passes and a jerk-limited cycle time estimate.
//! Output is deterministic for identical input.

pub mod curvature;
pub mod geometry;
pub mod kinematics;
pub mod multipass;
pub mod offset;
pub mod segment;
pub mod strategy;
pub mod trochoid;

pub use kinematics::CycleTimeEstimate;
pub use offset::{OffsetOutcome, Ring, RingPath};
pub use segment::{MoveKind, Pass, Segment};
pub use strategy::PathTemplate;

use camkit_core::error::CamError;
use camkit_core::geom::Point;
use camkit_core::params::{CuttingParams, MachineKinematics};
use camkit_core::types::CancelToken;
use tracing::info;

/// Result of a full toolpath generation run.
#[derive(Debug, Clone)]
pub struct GeneratedToolpath {
    pub passes: Vec<Pass>,
    pub estimate: CycleTimeEstimate,
    pub warnings: Vec<String>,
}

/// Runs the full pipeline: normalize, offset, route, derate, expand,
/// schedule, estimate.
pub fn generate(
    loops: &[Vec<Point>],
    params: &CuttingParams,
    kin: &MachineKinematics,
    corner_blending: bool,
    cancel: &CancelToken,
) -> Result<GeneratedToolpath, CamError> {
    params.validate()?;

    let loop_set = geometry::normalize_loops(loops, params.smoothing_tolerance)?;
    if cancel.is_cancelled() {
        return Err(CamError::Cancelled);
    }

    let offset = offset::compute_rings(&loop_set, params)?;
    let mut template = strategy::generate(&offset, params);
    curvature::annotate(&mut template.segments, params);
    trochoid::insert(&mut template.segments, params);

    let passes = multipass::schedule(&template, params, cancel)?;
    let estimate = kinematics::estimate(&passes, kin, corner_blending)?;

    info!(
        passes = passes.len(),
        seconds = estimate.seconds,
        warnings = offset.warnings.len(),
        "toolpath generated"
    );

    Ok(GeneratedToolpath {
        passes,
        estimate,
        warnings: offset.warnings,
    })
}
