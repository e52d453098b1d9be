//! Cutting parameters and adaptive-control tuning.
//!
//! All values are metric and request-scoped: once a generation request
//! starts these structs are never mutated.

use crate::error::KinematicsError;
use serde::{Deserialize, Serialize};

/// Pocket clearing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One continuous inward path merging the concentric offset rings.
    #[default]
    Spiral,
    /// Parallel raster lanes with retract-and-reposition between lanes;
    /// better chip clearance for slotting and hard materials.
    Lanes,
}

/// Tuning constants for curvature-adaptive feed control and trochoidal
/// insertion. The defaults are the documented conservative values; they are
/// configurable because they are heuristics, not physical derivations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveTuning {
    /// Lowest feed-scale factor applied in tight corners.
    pub feed_scale_floor: f64,
    /// Curvature slowdown kicks in below this many tool diameters of local
    /// radius.
    pub curvature_radius_multiple: f64,
    /// Trochoid loop radius as a fraction of tool diameter, mildest corner.
    pub trochoid_radius_min_ratio: f64,
    /// Trochoid loop radius as a fraction of tool diameter, tightest corner.
    pub trochoid_radius_max_ratio: f64,
    /// Trochoid advance per loop pair as a fraction of tool diameter,
    /// tightest corner.
    pub trochoid_pitch_min_ratio: f64,
    /// Trochoid advance per loop pair as a fraction of tool diameter,
    /// mildest corner.
    pub trochoid_pitch_max_ratio: f64,
    /// Radial engagement reduction attributed to a trochoid, mildest corner.
    pub engagement_reduction_min: f64,
    /// Radial engagement reduction attributed to a trochoid, tightest corner.
    pub engagement_reduction_max: f64,
}

impl Default for AdaptiveTuning {
    fn default() -> Self {
        Self {
            feed_scale_floor: 0.4,
            curvature_radius_multiple: 3.0,
            trochoid_radius_min_ratio: 0.25,
            trochoid_radius_max_ratio: 0.50,
            trochoid_pitch_min_ratio: 0.50,
            trochoid_pitch_max_ratio: 1.50,
            engagement_reduction_min: 0.40,
            engagement_reduction_max: 0.60,
        }
    }
}

/// Cutting parameters for one generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuttingParams {
    /// Tool diameter (mm).
    pub tool_diameter: f64,
    /// Lateral stepover as a fraction of tool diameter. (0, 0.95] for
    /// Spiral, up to 1.0 for Lanes (slotting).
    pub stepover: f64,
    /// Maximum depth of cut per Z pass (mm, positive magnitude).
    pub stepdown: f64,
    pub strategy: Strategy,
    /// XY cutting feed (mm/min).
    pub feed_xy: f64,
    /// Plunge feed (mm/min).
    pub feed_z: f64,
    /// Retract height (mm, above stock top).
    pub safe_z: f64,
    /// Target depth (mm, negative).
    pub depth: f64,
    /// Climb milling (tool CCW around internal contours) vs conventional.
    pub climb: bool,
    /// Geometric tolerance for vertex dedupe and arc tessellation (mm).
    pub smoothing_tolerance: f64,
    /// Leave an uncut boss when the offset collapses before the pocket
    /// center instead of failing.
    pub allow_partial: bool,
    pub tuning: AdaptiveTuning,
}

impl CuttingParams {
    /// Radial engagement of a nominal stepover cut (mm).
    pub fn nominal_engagement(&self) -> f64 {
        self.stepover * self.tool_diameter
    }

    /// Offset distance between consecutive rings (mm).
    pub fn ring_step(&self) -> f64 {
        self.stepover * self.tool_diameter
    }

    /// Validates parameter ranges. Invalid machine parameters are rejected
    /// before any geometry work begins.
    pub fn validate(&self) -> Result<(), KinematicsError> {
        if !self.tool_diameter.is_finite() || self.tool_diameter <= 0.0 {
            return Err(KinematicsError::invalid(
                "tool_d",
                self.tool_diameter,
                "must be positive",
            ));
        }
        let stepover_max = match self.strategy {
            Strategy::Spiral => 0.95,
            Strategy::Lanes => 1.0,
        };
        if !(self.stepover > 0.0 && self.stepover <= stepover_max) {
            return Err(KinematicsError::invalid(
                "stepover",
                self.stepover,
                "must be in (0, 0.95] (up to 1.0 for lanes)",
            ));
        }
        if !self.stepdown.is_finite() || self.stepdown <= 0.0 {
            return Err(KinematicsError::invalid(
                "stepdown",
                self.stepdown,
                "must be positive",
            ));
        }
        if !self.feed_xy.is_finite() || self.feed_xy <= 0.0 {
            return Err(KinematicsError::invalid(
                "feed_xy",
                self.feed_xy,
                "must be positive",
            ));
        }
        if !self.feed_z.is_finite() || self.feed_z <= 0.0 {
            return Err(KinematicsError::invalid(
                "feed_z",
                self.feed_z,
                "must be positive",
            ));
        }
        if !self.safe_z.is_finite() || self.safe_z <= 0.0 {
            return Err(KinematicsError::invalid(
                "safe_z",
                self.safe_z,
                "must be positive",
            ));
        }
        if !self.depth.is_finite() || self.depth >= 0.0 {
            return Err(KinematicsError::invalid(
                "z_rough",
                self.depth,
                "must be negative",
            ));
        }
        if !self.smoothing_tolerance.is_finite() || self.smoothing_tolerance <= 0.0 {
            return Err(KinematicsError::invalid(
                "smoothing_tolerance",
                self.smoothing_tolerance,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Machine motion limits used by the cycle-time estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineKinematics {
    /// Maximum acceleration (mm/s²).
    pub max_accel: f64,
    /// Maximum jerk (mm/s³).
    pub max_jerk: f64,
    /// Rapid traverse rate (mm/min).
    pub rapid_rate: f64,
}

impl Default for MachineKinematics {
    fn default() -> Self {
        Self {
            max_accel: 800.0,
            max_jerk: 20_000.0,
            rapid_rate: 3000.0,
        }
    }
}

impl MachineKinematics {
    pub fn validate(&self) -> Result<(), KinematicsError> {
        if !self.max_accel.is_finite() || self.max_accel <= 0.0 {
            return Err(KinematicsError::invalid(
                "max_accel",
                self.max_accel,
                "must be positive",
            ));
        }
        if !self.max_jerk.is_finite() || self.max_jerk <= 0.0 {
            return Err(KinematicsError::invalid(
                "max_jerk",
                self.max_jerk,
                "must be positive",
            ));
        }
        if !self.rapid_rate.is_finite() || self.rapid_rate <= 0.0 {
            return Err(KinematicsError::invalid(
                "rapid_rate",
                self.rapid_rate,
                "must be positive",
            ));
        }
        Ok(())
    }
}
