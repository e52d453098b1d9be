//! Measurement units for the request boundary.
//!
//! All internal computation is metric; inch-unit requests are scaled to mm
//! when the request is loaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MM_PER_INCH: f64 = 25.4;

/// Linear units accepted on a toolpath request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters
    #[default]
    Mm,
    /// Inches
    Inch,
}

impl Units {
    /// Scale factor from this unit to millimeters.
    pub fn to_mm_factor(&self) -> f64 {
        match self {
            Units::Mm => 1.0,
            Units::Inch => MM_PER_INCH,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Mm => write!(f, "mm"),
            Units::Inch => write!(f, "inch"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mm" | "metric" | "millimeter" | "millimeters" => Ok(Units::Mm),
            "inch" | "in" | "imperial" | "inches" => Ok(Units::Inch),
            _ => Err(format!("Unknown units: {}", s)),
        }
    }
}
