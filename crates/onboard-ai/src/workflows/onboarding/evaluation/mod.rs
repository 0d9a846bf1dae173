mod config;
mod policy;
mod rules;

pub use config::{
    EligibilityConfig, OnboardingSettings, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INCOME_CEILING,
    DEFAULT_MAX_AGE, DEFAULT_MIN_AGE,
};
pub use policy::{ReviewReason, VerificationDecision};

#[cfg(test)]
pub(crate) use rules::{age_on, parse_date_of_birth, parse_income};

use super::domain::{CandidateInfo, ExtractionResult};
use chrono::NaiveDate;
use tracing::debug;

/// Borrowed view over everything the guard chain looks at.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub candidate: &'a CandidateInfo,
    pub primary_id: &'a ExtractionResult,
    pub income: &'a ExtractionResult,
    pub secondary_id: Option<&'a ExtractionResult>,
    pub name_match: bool,
}

/// Stateless evaluator applying the eligibility thresholds to extracted documents.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEngine {
    config: EligibilityConfig,
}

impl EligibilityEngine {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Pure decision: identical inputs and `today` always yield the same verdict.
    pub fn decide(
        &self,
        input: &DecisionInput<'_>,
        skip_rules: bool,
        today: NaiveDate,
    ) -> VerificationDecision {
        if skip_rules {
            return VerificationDecision::Verified;
        }

        match rules::first_failing_guard(input, &self.config, today) {
            Some(reason) => {
                debug!(reason = reason.label(), "eligibility guard rejected attempt");
                VerificationDecision::NeedsReview(reason)
            }
            None => VerificationDecision::Verified,
        }
    }
}
