use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use tracing::{info, warn};
use uuid::Uuid;

use super::alerts::{LowConfidenceAlert, LowConfidenceAlerter};
use super::audit::{audit_blob_name, AuditPublisher, AuditRecord};
use super::clock::{Clock, SystemClock};
use super::demo::{DemoFallback, MockContext};
use super::directory::{DirectoryError, StudentDirectory};
use super::domain::{
    CandidateInfo, DocumentClass, DocumentRole, ExtractedDocuments, ExtractionResult,
    OnboardingResult, StudentId, VerificationRequest,
};
use super::evaluation::{DecisionInput, EligibilityEngine, OnboardingSettings};
use super::gateway::ExtractionGateway;
use super::identity;

/// Orchestrator composing extraction, identity matching, eligibility and audit publication.
pub struct OnboardingService<G, D, A, P> {
    gateway: Arc<G>,
    directory: Arc<D>,
    alerts: Arc<A>,
    audit: Arc<P>,
    engine: EligibilityEngine,
    fallback: DemoFallback,
    skip_rules: bool,
    clock: Arc<dyn Clock>,
}

impl<G, D, A, P> OnboardingService<G, D, A, P>
where
    G: ExtractionGateway + 'static,
    D: StudentDirectory + 'static,
    A: LowConfidenceAlerter + 'static,
    P: AuditPublisher + 'static,
{
    pub fn new(
        gateway: Arc<G>,
        directory: Arc<D>,
        alerts: Arc<A>,
        audit: Arc<P>,
        settings: OnboardingSettings,
    ) -> Self {
        Self::with_clock(
            gateway,
            directory,
            alerts,
            audit,
            settings,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        gateway: Arc<G>,
        directory: Arc<D>,
        alerts: Arc<A>,
        audit: Arc<P>,
        settings: OnboardingSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let OnboardingSettings {
            eligibility,
            demo_mode,
            skip_rules,
        } = settings;

        Self {
            gateway,
            directory,
            alerts,
            audit,
            engine: EligibilityEngine::new(eligibility),
            fallback: DemoFallback::from_flag(demo_mode),
            skip_rules,
            clock,
        }
    }

    /// Verify one candidate's documents. Never fails outward: errors and collaborator panics
    /// are folded into the returned result.
    pub fn verify(&self, request: VerificationRequest) -> OnboardingResult {
        let student_id = request.student_id.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_verify(request)))
            .unwrap_or_else(|payload| Err(OnboardingError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    student_id = student_id.as_ref().map(StudentId::as_str).unwrap_or("unknown"),
                    %error,
                    "verification aborted"
                );
                OnboardingResult::failed(student_id, error)
            }
        }
    }

    fn try_verify(
        &self,
        request: VerificationRequest,
    ) -> Result<OnboardingResult, OnboardingError> {
        let VerificationRequest {
            student_id,
            primary_id,
            secondary_id,
            income_proof,
            candidate,
        } = request;

        ensure_readable(DocumentRole::PrimaryId, &primary_id)?;
        ensure_readable(DocumentRole::Income, &income_proof)?;
        if let Some(secondary) = &secondary_id {
            ensure_readable(DocumentRole::SecondaryId, secondary)?;
        }

        let profile_name = self.resolve_profile_name(student_id.as_ref(), &candidate)?;
        let now = self.clock.now();
        let today = now.date_naive();

        let extracted = self.extract_all(&primary_id, secondary_id.as_deref(), &income_proof)?;
        let (documents, demo_fallback) = self.fallback.apply(
            extracted,
            &MockContext {
                profile_name: &profile_name,
                student_id: student_id.as_ref(),
                candidate: &candidate,
                today,
            },
        );
        if demo_fallback {
            info!("demo mode substituted synthetic extraction results");
        }

        let name_match = identity::all_match(
            &profile_name,
            &documents.primary_id.name,
            documents.secondary_id.as_ref().map(|doc| doc.name.as_str()),
            &documents.income.name,
        );

        let alert_errors = self.alert_low_confidence(student_id.as_ref(), &documents);

        let decision = self.engine.decide(
            &DecisionInput {
                candidate: &candidate,
                primary_id: &documents.primary_id,
                income: &documents.income,
                secondary_id: documents.secondary_id.as_ref(),
                name_match,
            },
            self.skip_rules,
            today,
        );
        let verified = decision.is_verified();
        let reason = decision.reason();
        let document_map = documents.to_map();

        let record = AuditRecord {
            attempt_id: Uuid::new_v4(),
            recorded_at: now,
            student_id: student_id.clone(),
            profile_name: profile_name.clone(),
            candidate,
            documents: document_map.clone(),
            demo_fallback,
            name_match,
            decision,
            verified,
            reason: reason.clone(),
        };
        let blob_name = audit_blob_name(student_id.as_ref(), &profile_name, now);
        let (audit_location, audit_error) = match self.audit.publish(&blob_name, &record) {
            Ok(location) => (location, String::new()),
            Err(error) => {
                warn!(%blob_name, %error, "audit record publish failed");
                (String::new(), error.to_string())
            }
        };

        info!(
            student_id = student_id.as_ref().map(StudentId::as_str).unwrap_or("unknown"),
            verified,
            %reason,
            name_match,
            demo_fallback,
            "verification completed"
        );

        Ok(OnboardingResult {
            verified,
            student_id,
            documents: document_map,
            reason,
            name_match,
            demo_fallback,
            audit_location,
            audit_error,
            alert_errors,
        })
    }

    /// Stored roster name first, then the candidate's declared name, else empty.
    fn resolve_profile_name(
        &self,
        student_id: Option<&StudentId>,
        candidate: &CandidateInfo,
    ) -> Result<String, OnboardingError> {
        if let Some(student_id) = student_id {
            if let Some(name) = self.directory.name_for(student_id)? {
                return Ok(name);
            }
        }

        Ok(candidate.declared_name().unwrap_or_default().to_string())
    }

    /// Run every extraction concurrently and wait for all of them.
    fn extract_all(
        &self,
        primary_id: &[u8],
        secondary_id: Option<&[u8]>,
        income_proof: &[u8],
    ) -> Result<ExtractedDocuments, OnboardingError> {
        let gateway = self.gateway.as_ref();

        thread::scope(|scope| {
            let primary =
                scope.spawn(move || gateway.analyze(primary_id, DocumentClass::PrimaryId));
            let secondary = secondary_id.map(|bytes| {
                scope.spawn(move || gateway.analyze(bytes, DocumentClass::SecondaryId))
            });
            let income =
                scope.spawn(move || gateway.analyze(income_proof, DocumentClass::IncomeProof));

            // Join everything before inspecting results so no worker outlives the scope unjoined.
            let primary = join_extraction(primary, DocumentRole::PrimaryId);
            let secondary =
                secondary.map(|handle| join_extraction(handle, DocumentRole::SecondaryId));
            let income = join_extraction(income, DocumentRole::Income);

            Ok(ExtractedDocuments {
                primary_id: primary?,
                secondary_id: secondary.transpose()?,
                income: income?,
            })
        })
    }

    fn alert_low_confidence(
        &self,
        student_id: Option<&StudentId>,
        documents: &ExtractedDocuments,
    ) -> Vec<String> {
        let threshold = self.engine.config().confidence_threshold;
        let mut errors = Vec::new();

        for (role, result) in documents.submitted() {
            if result.meets(threshold) {
                continue;
            }
            let alert = LowConfidenceAlert {
                student_id: student_id.cloned(),
                role,
                confidence: result.confidence,
            };
            if let Err(error) = self.alerts.notify(&alert) {
                warn!(doc_type = role.label(), %error, "low confidence alert not delivered");
                errors.push(format!("{role}: {error}"));
            }
        }

        errors
    }
}

fn ensure_readable(role: DocumentRole, bytes: &[u8]) -> Result<(), OnboardingError> {
    if bytes.is_empty() {
        Err(OnboardingError::EmptyDocument(role))
    } else {
        Ok(())
    }
}

fn join_extraction(
    handle: ScopedJoinHandle<'_, ExtractionResult>,
    role: DocumentRole,
) -> Result<ExtractionResult, OnboardingError> {
    handle
        .join()
        .map_err(|_| OnboardingError::ExtractionAborted(role))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Failures that abort an attempt before a verdict exists.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("{0} document is empty or unreadable")]
    EmptyDocument(DocumentRole),
    #[error("{0} extraction aborted unexpectedly")]
    ExtractionAborted(DocumentRole),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("verification aborted unexpectedly: {0}")]
    Panicked(String),
}
