//! Candidate onboarding: document extraction, identity matching, eligibility decisions and
//! audit publication for a single verification attempt.
//!
//! The decision engine is pure; extraction, roster lookup, alerting and audit storage sit
//! behind traits so the orchestrator can be exercised with in-memory doubles.

pub mod alerts;
pub mod audit;
pub mod clock;
pub mod demo;
pub mod directory;
pub mod domain;
pub(crate) mod evaluation;
pub mod gateway;
pub mod identity;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use alerts::{AlertError, LowConfidenceAlert, LowConfidenceAlerter, TracingAlerter};
pub use audit::{
    audit_blob_name, AuditError, AuditPublisher, AuditRecord, FileSystemAuditPublisher,
    UnconfiguredAuditPublisher,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use demo::DemoFallback;
pub use directory::{DirectoryError, RosterDirectory, StudentDirectory};
pub use domain::{
    AgeRange, CandidateInfo, DocumentClass, DocumentRole, ExtractedDocuments, ExtractionResult,
    OnboardingResult, StudentId, VerificationRequest,
};
pub use evaluation::{
    DecisionInput, EligibilityConfig, EligibilityEngine, OnboardingSettings, ReviewReason,
    VerificationDecision, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INCOME_CEILING, DEFAULT_MAX_AGE,
    DEFAULT_MIN_AGE,
};
pub use gateway::{
    interpret_analyze_response, AnalyzeResponseGateway, ExtractionGateway, UnconfiguredGateway,
};
pub use router::onboarding_router;
pub use service::{OnboardingError, OnboardingService};
