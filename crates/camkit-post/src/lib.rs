//! Dialect-aware G-code export.
//!
//! Takes a [`ToolpathRequest`](camkit_core::request::ToolpathRequest),
//! consults the feasibility gate, drives toolpath generation and renders
//! controller-specific G-code for GRBL, Mach4, LinuxCNC, PathPilot, MASSO
//! and FANUC.

pub mod emitter;
pub mod pipeline;
pub mod profile;

pub use emitter::emit_program;
pub use pipeline::{generate_program, ApproveAll, FeasibilityGate, GcodeProgram};
pub use profile::{CommentStyle, Dialect, MachineProfile};
