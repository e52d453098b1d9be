//! Error taxonomy for the toolpath pipeline.
//!
//! Every stage returns a structured error kind carrying the offending
//! parameter path where one exists. Nothing is swallowed: a rejected request
//! always surfaces one of these, never best-effort geometry.

use crate::feasibility::RiskBucket;
use thiserror::Error;

/// Invalid or degenerate input geometry. Rejected before any computation;
/// non-retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A loop contains a NaN or infinite coordinate.
    #[error("Loop {loop_index} contains a non-finite coordinate")]
    NonFiniteCoordinate { loop_index: usize },

    /// A loop is unusable: too few distinct points or zero enclosed area.
    #[error("Loop {loop_index} is degenerate: {reason}")]
    DegenerateLoop { loop_index: usize, reason: String },

    /// An island loop is not contained in the outer boundary, or its area
    /// exceeds the outer area.
    #[error("Loop {loop_index} violates nesting: island must lie inside the outer boundary")]
    InvalidNesting { loop_index: usize },

    /// The tool cannot enter the pocket at all.
    #[error("Tool diameter {tool_diameter}mm exceeds the pocket's inscribed width")]
    ToolExceedsPocket { tool_diameter: f64 },
}

/// Offset-engine failure. A premature collapse is retried once with relaxed
/// tolerance before it surfaces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OffsetError {
    /// Inward offsetting degenerated to an empty polygon while reachable
    /// material remained. `rings` is the count of rings produced before the
    /// collapse.
    #[error("Offset collapsed after {rings} ring(s) with uncut material remaining")]
    PrematureCollapse { rings: usize },

    /// An island keep-out boundary could not be constructed.
    #[error("Island {island_index} keep-out dilation produced no boundary")]
    IslandClipFailed { island_index: usize },
}

/// Invalid machine or cutting parameters. Non-retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("Parameter '{param}' is invalid: {value} ({reason})")]
    InvalidParameter {
        param: String,
        value: f64,
        reason: String,
    },
}

impl KinematicsError {
    pub fn invalid(param: &str, value: f64, reason: &str) -> Self {
        Self::InvalidParameter {
            param: param.to_string(),
            value,
            reason: reason.to_string(),
        }
    }
}

/// G-code emission failure. The dialect is validated at request entry, so
/// this never surfaces mid-stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("Unsupported post-processor dialect: {0}")]
    UnsupportedDialect(String),
}

/// Umbrella error for a generation request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CamError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Offset error: {0}")]
    Offset(#[from] OffsetError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),

    /// The feasibility gate refused the request. Carries the gate's own
    /// diagnostics so the caller can surface them verbatim.
    #[error("Generation blocked by feasibility gate ({bucket:?}): {}", warnings.join("; "))]
    Blocked {
        bucket: RiskBucket,
        warnings: Vec<String>,
        rule_ids: Vec<String>,
    },

    /// Cooperative cancellation tripped between passes.
    #[error("Generation cancelled")]
    Cancelled,
}

/// Result alias for pipeline operations.
pub type CamResult<T> = Result<T, CamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::DegenerateLoop {
            loop_index: 2,
            reason: "fewer than 3 distinct points".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Loop 2 is degenerate: fewer than 3 distinct points"
        );

        let err = GeometryError::ToolExceedsPocket { tool_diameter: 6.0 };
        assert!(err.to_string().contains("6mm"));
    }

    #[test]
    fn test_offset_error_display() {
        let err = OffsetError::PrematureCollapse { rings: 4 };
        assert_eq!(
            err.to_string(),
            "Offset collapsed after 4 ring(s) with uncut material remaining"
        );
    }

    #[test]
    fn test_kinematics_error_display() {
        let err = KinematicsError::invalid("jerk", 0.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "Parameter 'jerk' is invalid: 0 (must be positive)"
        );
    }

    #[test]
    fn test_error_conversion() {
        let geo = GeometryError::NonFiniteCoordinate { loop_index: 0 };
        let cam: CamError = geo.into();
        assert!(matches!(cam, CamError::Geometry(_)));

        let emit = EmitError::UnsupportedDialect("tinyg".to_string());
        let cam: CamError = emit.into();
        assert!(matches!(cam, CamError::Emit(_)));
    }
}
