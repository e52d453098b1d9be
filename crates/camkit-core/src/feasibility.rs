//! Feasibility-gate contract types.
//!
//! The rule engine itself is an external collaborator; the pipeline only
//! consumes its result. RED and UNKNOWN buckets block generation unless the
//! caller supplies an explicit override, YELLOW proceeds with its warnings
//! surfaced in the response envelope.

use serde::{Deserialize, Serialize};

/// Risk classification supplied by the feasibility rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBucket {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl RiskBucket {
    /// UNKNOWN is treated as RED for gating purposes.
    pub fn normalized(self) -> RiskBucket {
        match self {
            RiskBucket::Unknown => RiskBucket::Red,
            other => other,
        }
    }

    /// True if this bucket blocks generation without an override.
    pub fn blocks(self) -> bool {
        matches!(self.normalized(), RiskBucket::Red)
    }
}

/// Result of a feasibility evaluation. Consumed, never produced, by the CAM
/// core; the structure mirrors the rule engine's output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityResult {
    pub risk_bucket: RiskBucket,
    pub score: f64,
    pub warnings: Vec<String>,
    pub rule_ids: Vec<String>,
}

impl FeasibilityResult {
    /// A passing result with no findings.
    pub fn green() -> Self {
        Self {
            risk_bucket: RiskBucket::Green,
            score: 0.0,
            warnings: Vec::new(),
            rule_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_normalizes_to_red() {
        assert_eq!(RiskBucket::Unknown.normalized(), RiskBucket::Red);
        assert!(RiskBucket::Unknown.blocks());
        assert!(RiskBucket::Red.blocks());
        assert!(!RiskBucket::Yellow.blocks());
        assert!(!RiskBucket::Green.blocks());
    }

    #[test]
    fn test_bucket_serde_uppercase() {
        let json = serde_json::to_string(&RiskBucket::Yellow).unwrap();
        assert_eq!(json, "\"YELLOW\"");
        let parsed: RiskBucket = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(parsed, RiskBucket::Unknown);
    }
}
