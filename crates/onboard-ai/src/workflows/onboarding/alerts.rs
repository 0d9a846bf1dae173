use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{DocumentRole, StudentId};

/// Notification raised for a submitted document whose extraction confidence is too low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowConfidenceAlert {
    pub student_id: Option<StudentId>,
    pub role: DocumentRole,
    pub confidence: f64,
}

/// Best-effort outbound hook (webhook, chat, e-mail adapters).
pub trait LowConfidenceAlerter: Send + Sync {
    fn notify(&self, alert: &LowConfidenceAlert) -> Result<(), AlertError>;
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}

/// Emits one structured log event per alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlerter;

impl LowConfidenceAlerter for TracingAlerter {
    fn notify(&self, alert: &LowConfidenceAlert) -> Result<(), AlertError> {
        warn!(
            student_id = alert.student_id.as_ref().map(StudentId::as_str).unwrap_or("unknown"),
            doc_type = alert.role.label(),
            confidence = alert.confidence,
            "low confidence document extraction"
        );
        Ok(())
    }
}
