use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Basic,
    Silver,
    Gold,
    Platinum,
}

impl PlanTier {
    /// Key used for this plan in quotation premium tables.
    pub fn key(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }

    /// Matches a premium-table key or a user's typed choice, ignoring case and
    /// surrounding whitespace. A trailing " plan" is accepted.
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_ascii_lowercase();
        let choice = lowered.strip_suffix(" plan").unwrap_or(lowered.as_str()).trim();
        PLAN_CATALOG.iter().map(|entry| entry.tier).find(|tier| tier.key() == choice)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanEntry {
    pub tier: PlanTier,
    /// Overseas medical coverage, as printed to the user.
    pub medical_coverage: &'static str,
}

/// Presentation order of plans in every comparison message.
pub const PLAN_CATALOG: [PlanEntry; 4] = [
    PlanEntry { tier: PlanTier::Basic, medical_coverage: "150,000" },
    PlanEntry { tier: PlanTier::Silver, medical_coverage: "250,000" },
    PlanEntry { tier: PlanTier::Gold, medical_coverage: "500,000" },
    PlanEntry { tier: PlanTier::Platinum, medical_coverage: "750,000" },
];
