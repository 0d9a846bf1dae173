use super::super::domain::{AgeRange, DocumentRole};
use serde::{Deserialize, Serialize};

/// Verdict for a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationDecision {
    Verified,
    NeedsReview(ReviewReason),
}

impl VerificationDecision {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationDecision::Verified)
    }

    /// Stable, user-facing reason string.
    pub fn reason(&self) -> String {
        match self {
            VerificationDecision::Verified => "Verified".to_string(),
            VerificationDecision::NeedsReview(reason) => {
                format!("Needs-Review: {}", reason.label())
            }
        }
    }
}

/// Guard outcomes that send an attempt to a mentor for manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewReason {
    NameMismatch,
    LowConfidence(DocumentRole),
    AgeUndetermined,
    AgeOutOfBounds { age: u32 },
    AgeRangeMismatch { age: u32, declared: AgeRange },
    IncomeUndetermined,
    IncomeAboveCeiling { income: u64 },
}

impl ReviewReason {
    /// Label drawn from a fixed set; payloads never leak into it.
    pub const fn label(&self) -> &'static str {
        match self {
            ReviewReason::NameMismatch => "name mismatch",
            ReviewReason::LowConfidence(DocumentRole::PrimaryId) => {
                "primary id confidence below threshold"
            }
            ReviewReason::LowConfidence(DocumentRole::SecondaryId) => {
                "secondary id confidence below threshold"
            }
            ReviewReason::LowConfidence(DocumentRole::Income) => {
                "income proof confidence below threshold"
            }
            ReviewReason::AgeUndetermined => "age undetermined",
            ReviewReason::AgeOutOfBounds { .. } => "age outside bounds",
            ReviewReason::AgeRangeMismatch { .. } => "age range mismatch",
            ReviewReason::IncomeUndetermined => "income undetermined",
            ReviewReason::IncomeAboveCeiling { .. } => "income above ceiling",
        }
    }
}
