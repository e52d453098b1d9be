//! Request-to-program export pipeline.
//!
//! Validates the dialect eagerly, consults the feasibility gate, runs
//! toolpath generation and renders the final program. RED and UNKNOWN
//! risk buckets block the request unless the caller set the override
//! flag; YELLOW proceeds with its warnings carried into the envelope.

use crate::emitter;
use crate::profile::{Dialect, MachineProfile};
use camkit_core::error::CamError;
use camkit_core::feasibility::{FeasibilityResult, RiskBucket};
use camkit_core::request::ToolpathRequest;
use camkit_core::types::CancelToken;
use camkit_toolpath::{CycleTimeEstimate, Pass};
use tracing::{info, warn};

/// External feasibility collaborator.
///
/// `evaluate` runs before any geometry work; `review_passes` gets a second
/// look at the scheduled result (engagement spikes, pass counts) and
/// defaults to a pass.
pub trait FeasibilityGate {
    fn evaluate(&self, request: &ToolpathRequest) -> FeasibilityResult;

    fn review_passes(&self, _request: &ToolpathRequest, _passes: &[Pass]) -> FeasibilityResult {
        FeasibilityResult::green()
    }
}

/// A gate that approves everything, for callers without a rule engine.
pub struct ApproveAll;

impl FeasibilityGate for ApproveAll {
    fn evaluate(&self, _request: &ToolpathRequest) -> FeasibilityResult {
        FeasibilityResult::green()
    }
}

/// The response envelope: program text plus everything the caller needs to
/// present it.
#[derive(Debug, Clone)]
pub struct GcodeProgram {
    pub gcode: String,
    pub passes: Vec<Pass>,
    pub estimate: CycleTimeEstimate,
    pub warnings: Vec<String>,
}

/// Runs the full export pipeline for one request.
pub fn generate_program(
    request: &ToolpathRequest,
    gate: &dyn FeasibilityGate,
    cancel: &CancelToken,
) -> Result<GcodeProgram, CamError> {
    // Unknown dialects must fail before any generation work.
    let dialect: Dialect = request
        .post_id
        .parse()
        .map_err(CamError::Emit)?;
    let profile = MachineProfile::for_dialect(dialect);

    let params = request.cutting_params()?;
    let mut warnings = Vec::new();

    let verdict = gate.evaluate(request);
    apply_verdict(&verdict, request.feasibility_override, &mut warnings)?;

    let loops = request.loop_points();
    let result = camkit_toolpath::generate(
        &loops,
        &params,
        &profile.kinematics,
        profile.corner_blending,
        cancel,
    )?;
    warnings.extend(result.warnings);

    let review = gate.review_passes(request, &result.passes);
    apply_verdict(&review, request.feasibility_override, &mut warnings)?;

    let gcode = emitter::emit_program(&result.passes, &profile, params.safe_z)?;

    info!(
        dialect = %profile.dialect,
        passes = result.passes.len(),
        bytes = gcode.len(),
        "export complete"
    );

    Ok(GcodeProgram {
        gcode,
        passes: result.passes,
        estimate: result.estimate,
        warnings,
    })
}

fn apply_verdict(
    verdict: &FeasibilityResult,
    override_flag: bool,
    warnings: &mut Vec<String>,
) -> Result<(), CamError> {
    let bucket = verdict.risk_bucket.normalized();
    if bucket.blocks() && !override_flag {
        return Err(CamError::Blocked {
            bucket,
            warnings: verdict.warnings.clone(),
            rule_ids: verdict.rule_ids.clone(),
        });
    }
    if bucket.blocks() {
        warn!(rule_ids = ?verdict.rule_ids, "feasibility block overridden by caller");
    }
    warnings.extend(verdict.warnings.iter().cloned());
    Ok(())
}
