use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::domain::{CandidateInfo, DocumentRole, ExtractionResult, StudentId};
use super::evaluation::VerificationDecision;

/// Durable snapshot of one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub attempt_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub student_id: Option<StudentId>,
    pub profile_name: String,
    pub candidate: CandidateInfo,
    pub documents: BTreeMap<DocumentRole, ExtractionResult>,
    pub demo_fallback: bool,
    pub name_match: bool,
    pub decision: VerificationDecision,
    pub verified: bool,
    pub reason: String,
}

/// Storage abstraction for audit records; returns the location written to.
pub trait AuditPublisher: Send + Sync {
    fn publish(&self, blob_name: &str, record: &AuditRecord) -> Result<String, AuditError>;
}

/// Error enumeration for audit write failures.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit storage is not configured")]
    NotConfigured,
    #[error("audit record could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write audit record to {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("audit storage unavailable: {0}")]
    Unavailable(String),
    #[error("audit blob name `{0}` escapes the audit root")]
    InvalidBlobName(String),
}

/// Blob name for an attempt: `onboarding/YYYY/MM/DD/student-<id>-<name>-<millis>.json`.
///
/// Both segments are reduced to ASCII alphanumerics and `-`; the id keeps its case.
pub fn audit_blob_name(
    student_id: Option<&StudentId>,
    candidate_name: &str,
    at: DateTime<Utc>,
) -> String {
    let student = student_id.map(StudentId::as_str).unwrap_or_default();
    format!(
        "onboarding/{}/student-{}-{}-{}.json",
        at.format("%Y/%m/%d"),
        slug_segment(student),
        slug_segment(&candidate_name.to_lowercase()),
        at.timestamp_millis()
    )
}

fn slug_segment(value: &str) -> String {
    let trimmed = value.trim();
    let mut slug = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

/// Writes pretty-printed JSON records beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemAuditPublisher {
    root: PathBuf,
}

impl FileSystemAuditPublisher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AuditPublisher for FileSystemAuditPublisher {
    fn publish(&self, blob_name: &str, record: &AuditRecord) -> Result<String, AuditError> {
        let relative = Path::new(blob_name);
        let contained = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            return Err(AuditError::InvalidBlobName(blob_name.to_string()));
        }

        let path = self.root.join(relative);
        let body = serde_json::to_vec_pretty(record)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| AuditError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, body).map_err(|source| AuditError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "audit record written");
        Ok(path.display().to_string())
    }
}

/// Publisher used when no audit storage is configured; every write is reported as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredAuditPublisher;

impl AuditPublisher for UnconfiguredAuditPublisher {
    fn publish(&self, _blob_name: &str, _record: &AuditRecord) -> Result<String, AuditError> {
        Err(AuditError::NotConfigured)
    }
}
