use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::warn;

use super::alerts::LowConfidenceAlerter;
use super::audit::AuditPublisher;
use super::directory::StudentDirectory;
use super::domain::{CandidateInfo, OnboardingResult, StudentId, VerificationRequest};
use super::gateway::ExtractionGateway;
use super::service::OnboardingService;

/// Per-document upload cap, matching the intake form.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
const MAX_REQUEST_BYTES: usize = 3 * MAX_DOCUMENT_BYTES + 64 * 1024;

/// Router builder exposing the verification endpoint.
pub fn onboarding_router<G, D, A, P>(service: Arc<OnboardingService<G, D, A, P>>) -> Router
where
    G: ExtractionGateway + 'static,
    D: StudentDirectory + 'static,
    A: LowConfidenceAlerter + 'static,
    P: AuditPublisher + 'static,
{
    Router::new()
        .route("/api/onboarding/verify", post(verify_handler::<G, D, A, P>))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(service)
}

/// Always answers `200` with a well-formed result, even for malformed uploads.
pub(crate) async fn verify_handler<G, D, A, P>(
    State(service): State<Arc<OnboardingService<G, D, A, P>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    G: ExtractionGateway + 'static,
    D: StudentDirectory + 'static,
    A: LowConfidenceAlerter + 'static,
    P: AuditPublisher + 'static,
{
    let request = match multipart {
        Ok(multipart) => read_verification_form(multipart).await,
        Err(rejection) => Err(FormError::Rejected(rejection.to_string())),
    };

    let result = match request {
        Ok(request) => {
            let student_id = request.student_id.clone();
            match tokio::task::spawn_blocking(move || service.verify(request)).await {
                Ok(result) => result,
                Err(error) => {
                    warn!(%error, "verification worker did not complete");
                    OnboardingResult::failed(student_id, "verification worker did not complete")
                }
            }
        }
        Err(error) => {
            warn!(%error, "rejected verification upload");
            OnboardingResult::failed(None, error)
        }
    };

    (StatusCode::OK, Json(result)).into_response()
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FormError {
    #[error("invalid upload: {0}")]
    Rejected(String),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("missing required document `{0}`")]
    MissingDocument(&'static str),
    #[error("document `{field}` exceeds the 10 MiB upload limit")]
    DocumentTooLarge { field: String },
}

async fn read_verification_form(
    mut multipart: Multipart,
) -> Result<VerificationRequest, FormError> {
    let mut student_id = None;
    let mut primary_id = None;
    let mut secondary_id = None;
    let mut income_proof = None;
    let mut candidate = CandidateInfo::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "primaryId" | "aadhaar" => primary_id = Some(read_document(&name, field).await?),
            "secondaryId" | "pan" => {
                let bytes = read_document(&name, field).await?;
                // Browsers send an empty part for an untouched optional file input.
                if !bytes.is_empty() {
                    secondary_id = Some(bytes);
                }
            }
            "income" => income_proof = Some(read_document(&name, field).await?),
            "studentId" => student_id = StudentId::parse(&field.text().await?),
            "candidateName" => candidate.name = non_blank(field.text().await?),
            "candidateAgeRange" => candidate.age_range = non_blank(field.text().await?),
            "candidateEducation" => candidate.education_level = non_blank(field.text().await?),
            "candidateLocation" => candidate.location = non_blank(field.text().await?),
            "candidateInterests" => candidate.interests = non_blank(field.text().await?),
            "candidateSkills" => candidate.skills = non_blank(field.text().await?),
            "candidateLanguage" => candidate.language = non_blank(field.text().await?),
            _ => {}
        }
    }

    Ok(VerificationRequest {
        student_id,
        primary_id: primary_id.ok_or(FormError::MissingDocument("primaryId"))?,
        secondary_id,
        income_proof: income_proof.ok_or(FormError::MissingDocument("income"))?,
        candidate,
    })
}

async fn read_document(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<Vec<u8>, FormError> {
    let bytes = field.bytes().await?;
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(FormError::DocumentTooLarge {
            field: name.to_string(),
        });
    }
    Ok(bytes.to_vec())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
