// assurance.rs — Identity assurance tiers and their ordering.
//
// Tiers form a total order L0 < L1 < L2 < L3. The two top tiers (L4KYC for
// know-your-customer verification, L4FIN for financial-grade verification)
// each sit strictly above L3 but are achieved independently: holding L4KYC
// does not satisfy a requirement for L4FIN, and vice versa.
//
// Unknown tier strings fail closed — they satisfy nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How strongly an agent's identity has been verified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssuranceLevel {
    /// No verification — self-asserted identity.
    L0,
    /// Email verified.
    L1,
    /// Organization verified.
    L2,
    /// Strong organization verification.
    L3,
    /// KYC-grade verification. Superset of L3, independent of L4FIN.
    #[serde(rename = "L4KYC")]
    L4Kyc,
    /// Financial-grade verification. Superset of L3, independent of L4KYC.
    #[serde(rename = "L4FIN")]
    L4Fin,
}

/// Error returned when parsing an unrecognized tier name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown assurance level: '{0}'")]
pub struct UnknownLevel(pub String);

impl AssuranceLevel {
    /// Numeric rank for the totally ordered portion of the tier set.
    /// Both top tiers rank above L3.
    fn rank(self) -> u8 {
        match self {
            Self::L0 => 0,
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
            Self::L4Kyc | Self::L4Fin => 4,
        }
    }

    /// Does this level satisfy a requirement for `required`?
    ///
    /// For the base tiers this is plain ordering. A top tier requirement
    /// (L4KYC or L4FIN) is only satisfied by that exact tier — the authority
    /// must assert each top-tier credential separately.
    pub fn satisfies(self, required: AssuranceLevel) -> bool {
        match required {
            AssuranceLevel::L4Kyc | AssuranceLevel::L4Fin => self == required,
            _ => self.rank() >= required.rank(),
        }
    }

    /// Compare two tier names as strings, failing closed on unknown input.
    ///
    /// Returns `false` if either name does not parse — callers must treat
    /// that as "requirement not met", never as a pass.
    pub fn satisfies_str(current: &str, required: &str) -> bool {
        match (current.parse::<Self>(), required.parse::<Self>()) {
            (Ok(current), Ok(required)) => current.satisfies(required),
            _ => false,
        }
    }
}

impl fmt::Display for AssuranceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::L0 => "L0",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4Kyc => "L4KYC",
            Self::L4Fin => "L4FIN",
        };
        f.write_str(name)
    }
}

impl FromStr for AssuranceLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L0" => Ok(Self::L0),
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            "L3" => Ok(Self::L3),
            "L4KYC" => Ok(Self::L4Kyc),
            "L4FIN" => Ok(Self::L4Fin),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_tiers_are_totally_ordered() {
        assert!(AssuranceLevel::L3.satisfies(AssuranceLevel::L2));
        assert!(AssuranceLevel::L2.satisfies(AssuranceLevel::L2));
        assert!(!AssuranceLevel::L2.satisfies(AssuranceLevel::L3));
        assert!(!AssuranceLevel::L0.satisfies(AssuranceLevel::L1));
    }

    #[test]
    fn top_tiers_exceed_l3() {
        assert!(AssuranceLevel::L4Kyc.satisfies(AssuranceLevel::L3));
        assert!(AssuranceLevel::L4Fin.satisfies(AssuranceLevel::L3));
        assert!(AssuranceLevel::L4Fin.satisfies(AssuranceLevel::L0));
    }

    #[test]
    fn top_tiers_are_mutually_independent() {
        // Holding one L4 credential never implies the other.
        assert!(!AssuranceLevel::L4Kyc.satisfies(AssuranceLevel::L4Fin));
        assert!(!AssuranceLevel::L4Fin.satisfies(AssuranceLevel::L4Kyc));
        assert!(!AssuranceLevel::L3.satisfies(AssuranceLevel::L4Kyc));
        assert!(AssuranceLevel::L4Kyc.satisfies(AssuranceLevel::L4Kyc));
    }

    #[test]
    fn unknown_tier_fails_closed() {
        assert!(!AssuranceLevel::satisfies_str("L9", "L1"));
        assert!(!AssuranceLevel::satisfies_str("L2", "platinum"));
        assert!(!AssuranceLevel::satisfies_str("", ""));
        assert!(AssuranceLevel::satisfies_str("L3", "L2"));
        assert!(!AssuranceLevel::satisfies_str("L2", "L3"));
    }

    #[test]
    fn serializes_with_source_names() {
        assert_eq!(
            serde_json::to_string(&AssuranceLevel::L4Kyc).unwrap(),
            "\"L4KYC\""
        );
        let parsed: AssuranceLevel = serde_json::from_str("\"L4FIN\"").unwrap();
        assert_eq!(parsed, AssuranceLevel::L4Fin);
    }
}
