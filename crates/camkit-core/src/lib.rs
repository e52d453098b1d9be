//! # CamKit Core
//!
//! Core types for CamKit: geometry primitives, measurement units, cutting
//! parameters, the toolpath request contract, the feasibility-gate contract,
//! and the structured error taxonomy shared by the pipeline crates.

pub mod error;
pub mod feasibility;
pub mod geom;
pub mod params;
pub mod request;
pub mod types;
pub mod units;

pub use error::{
    CamError, CamResult, EmitError, GeometryError, KinematicsError, OffsetError,
};
pub use feasibility::{FeasibilityResult, RiskBucket};
pub use geom::{Loop, LoopRole, LoopSet, Point};
pub use params::{AdaptiveTuning, CuttingParams, MachineKinematics, Strategy};
pub use request::ToolpathRequest;
pub use types::CancelToken;
pub use units::Units;
