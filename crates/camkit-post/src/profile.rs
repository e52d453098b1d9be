//! Controller dialect profiles.
//!
//! Each supported controller family gets a `MachineProfile` describing the
//! syntax variations the emitter has to honor: comment style, program end
//! code, spindle ramp-up dwell, and whether the controller blends corners
//! (which feeds back into the cycle time estimate).

use camkit_core::error::EmitError;
use camkit_core::params::MachineKinematics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported controller families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Grbl,
    Mach4,
    LinuxCnc,
    PathPilot,
    Masso,
    Fanuc,
}

impl FromStr for Dialect {
    type Err = EmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grbl" => Ok(Dialect::Grbl),
            "mach4" => Ok(Dialect::Mach4),
            "linuxcnc" => Ok(Dialect::LinuxCnc),
            "pathpilot" => Ok(Dialect::PathPilot),
            "masso" => Ok(Dialect::Masso),
            "fanuc" => Ok(Dialect::Fanuc),
            other => Err(EmitError::UnsupportedDialect(other.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Grbl => "GRBL",
            Dialect::Mach4 => "Mach4",
            Dialect::LinuxCnc => "LinuxCNC",
            Dialect::PathPilot => "PathPilot",
            Dialect::Masso => "MASSO",
            Dialect::Fanuc => "FANUC",
        };
        write!(f, "{}", name)
    }
}

/// Comment syntax accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `; text` to end of line.
    Semicolon,
    /// `( text )` inline.
    Parentheses,
}

impl CommentStyle {
    pub fn render(&self, text: &str) -> String {
        match self {
            CommentStyle::Semicolon => format!("; {}", text),
            CommentStyle::Parentheses => format!("({})", text),
        }
    }
}

/// Per-dialect emission settings.
#[derive(Debug, Clone)]
pub struct MachineProfile {
    pub dialect: Dialect,
    pub comment_style: CommentStyle,
    /// O-number for dialects that wrap programs (FANUC).
    pub program_number: Option<u32>,
    pub spindle_rpm: u32,
    /// Post-spindle-on dwell in seconds, for controllers without spindle
    /// ramp-up feedback.
    pub spindle_dwell: Option<f64>,
    pub tool_id: u32,
    /// Whether the controller runs a lookahead corner blender (G64-style).
    pub corner_blending: bool,
    pub program_end: &'static str,
    pub kinematics: MachineKinematics,
}

impl MachineProfile {
    pub fn for_dialect(dialect: Dialect) -> Self {
        let comment_style = match dialect {
            Dialect::Grbl => CommentStyle::Semicolon,
            _ => CommentStyle::Parentheses,
        };
        let program_number = match dialect {
            Dialect::Fanuc => Some(1000),
            _ => None,
        };
        let spindle_dwell = match dialect {
            Dialect::Fanuc | Dialect::Masso => Some(2.0),
            _ => None,
        };
        let corner_blending = matches!(
            dialect,
            Dialect::LinuxCnc | Dialect::PathPilot | Dialect::Mach4
        );
        let program_end = match dialect {
            Dialect::LinuxCnc => "M2",
            _ => "M30",
        };
        Self {
            dialect,
            comment_style,
            program_number,
            spindle_rpm: 16000,
            spindle_dwell,
            tool_id: 1,
            corner_blending,
            program_end,
            kinematics: MachineKinematics::default(),
        }
    }
}
