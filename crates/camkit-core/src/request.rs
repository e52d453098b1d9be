//! The toolpath generation request contract.
//!
//! This is the language-agnostic request object supplied by upstream
//! collaborators (import/validation, API layer). Loading a request converts
//! it to metric [`CuttingParams`] and raw loop vertex lists.

use crate::error::{CamError, KinematicsError};
use crate::geom::Point;
use crate::params::{AdaptiveTuning, CuttingParams, Strategy};
use crate::units::Units;
use serde::{Deserialize, Serialize};

/// One raw input loop, an implicitly closed polyline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLoop {
    pub pts: Vec<[f64; 2]>,
}

/// A toolpath generation request as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolpathRequest {
    pub loops: Vec<RequestLoop>,
    pub tool_d: f64,
    pub stepover: f64,
    pub stepdown: f64,
    #[serde(default)]
    pub strategy: Strategy,
    pub feed_xy: f64,
    pub feed_z: f64,
    pub safe_z: f64,
    /// Target roughing depth, negative.
    pub z_rough: f64,
    pub post_id: String,
    #[serde(default)]
    pub units: Units,
    #[serde(default = "default_climb")]
    pub climb: bool,
    #[serde(default = "default_smoothing")]
    pub smoothing_tolerance: f64,
    /// Accept a partial ring set (uncut boss) if the offset collapses early.
    #[serde(default)]
    pub allow_partial: bool,
    /// Proceed despite a RED/UNKNOWN feasibility bucket.
    #[serde(default)]
    pub feasibility_override: bool,
    #[serde(default)]
    pub tuning: Option<AdaptiveTuning>,
}

fn default_climb() -> bool {
    true
}

fn default_smoothing() -> f64 {
    0.01
}

impl ToolpathRequest {
    /// Converts the request to validated metric cutting parameters.
    pub fn cutting_params(&self) -> Result<CuttingParams, CamError> {
        let k = self.units.to_mm_factor();
        if !self.z_rough.is_finite() {
            return Err(KinematicsError::invalid("z_rough", self.z_rough, "must be finite").into());
        }
        let params = CuttingParams {
            tool_diameter: self.tool_d * k,
            stepover: self.stepover,
            stepdown: self.stepdown * k,
            strategy: self.strategy,
            feed_xy: self.feed_xy * k,
            feed_z: self.feed_z * k,
            safe_z: self.safe_z * k,
            depth: self.z_rough * k,
            climb: self.climb,
            smoothing_tolerance: self.smoothing_tolerance * k,
            allow_partial: self.allow_partial,
            tuning: self.tuning.clone().unwrap_or_default(),
        };
        params.validate()?;
        Ok(params)
    }

    /// Raw loop vertex lists in millimeters.
    pub fn loop_points(&self) -> Vec<Vec<Point>> {
        let k = self.units.to_mm_factor();
        self.loops
            .iter()
            .map(|l| l.pts.iter().map(|p| Point::new(p[0] * k, p[1] * k)).collect())
            .collect()
    }
}
