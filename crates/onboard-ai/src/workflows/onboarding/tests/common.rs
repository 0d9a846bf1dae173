use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::onboarding::alerts::{AlertError, LowConfidenceAlert, LowConfidenceAlerter};
use crate::workflows::onboarding::audit::{AuditError, AuditPublisher, AuditRecord};
use crate::workflows::onboarding::clock::{Clock, FixedClock};
use crate::workflows::onboarding::directory::{DirectoryError, RosterDirectory, StudentDirectory};
use crate::workflows::onboarding::domain::{
    CandidateInfo, DocumentClass, ExtractionResult, StudentId, VerificationRequest,
};
use crate::workflows::onboarding::evaluation::OnboardingSettings;
use crate::workflows::onboarding::gateway::ExtractionGateway;
use crate::workflows::onboarding::service::OnboardingService;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0)
            .single()
            .expect("valid timestamp"),
    ))
}

/// Born 2006-03-10, so 19 on the fixed clock.
pub(super) const NINETEEN_DOB: &str = "2006-03-10";

pub(super) fn id_result(name: &str, dob: &str, confidence: f64) -> ExtractionResult {
    ExtractionResult::new(
        name,
        Some(dob.to_string()),
        "4521-8890-1123",
        None,
        confidence,
    )
}

pub(super) fn income_result(name: &str, income: &str, confidence: f64) -> ExtractionResult {
    ExtractionResult::new(
        name,
        None,
        "INC-2025-0042",
        Some(income.to_string()),
        confidence,
    )
}

pub(super) fn candidate(name: Option<&str>, age_range: Option<&str>) -> CandidateInfo {
    CandidateInfo {
        name: name.map(str::to_string),
        age_range: age_range.map(str::to_string),
        education_level: Some("12th Pass".to_string()),
        location: Some("Pune, Maharashtra".to_string()),
        interests: Some("Technology, Sports".to_string()),
        skills: Some("Communication, Typing".to_string()),
        language: Some("Hindi".to_string()),
    }
}

pub(super) fn request(student_id: Option<&str>, with_secondary: bool) -> VerificationRequest {
    VerificationRequest {
        student_id: student_id.and_then(StudentId::parse),
        primary_id: b"primary-id-scan".to_vec(),
        secondary_id: with_secondary.then(|| b"secondary-id-scan".to_vec()),
        income_proof: b"income-proof-scan".to_vec(),
        candidate: CandidateInfo::default(),
    }
}

pub(super) fn roster() -> RosterDirectory {
    RosterDirectory::from_entries([("S100", "Ravi Kumar"), ("S200", "Suresh Kumar")])
}

/// Gateway answering from a fixed table; unknown classes yield the empty result.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    results: HashMap<DocumentClass, ExtractionResult>,
    calls: Mutex<Vec<DocumentClass>>,
}

impl ScriptedGateway {
    pub(super) fn with(mut self, class: DocumentClass, result: ExtractionResult) -> Self {
        self.results.insert(class, result);
        self
    }

    pub(super) fn calls(&self) -> Vec<DocumentClass> {
        self.calls.lock().expect("gateway mutex poisoned").clone()
    }
}

impl ExtractionGateway for ScriptedGateway {
    fn analyze(&self, _document: &[u8], class: DocumentClass) -> ExtractionResult {
        self.calls
            .lock()
            .expect("gateway mutex poisoned")
            .push(class);
        self.results
            .get(&class)
            .cloned()
            .unwrap_or_else(ExtractionResult::failed)
    }
}

pub(super) fn ravi_gateway() -> ScriptedGateway {
    ScriptedGateway::default()
        .with(
            DocumentClass::PrimaryId,
            id_result("Ravi Kumar", NINETEEN_DOB, 0.95),
        )
        .with(
            DocumentClass::IncomeProof,
            income_result("Ravi Kumar", "120000", 0.95),
        )
}

pub(super) struct PanickingGateway;

impl ExtractionGateway for PanickingGateway {
    fn analyze(&self, _document: &[u8], class: DocumentClass) -> ExtractionResult {
        if class == DocumentClass::IncomeProof {
            panic!("extraction worker crashed");
        }
        ExtractionResult::failed()
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<LowConfidenceAlert>>>,
}

impl LowConfidenceAlerter for MemoryAlerts {
    fn notify(&self, alert: &LowConfidenceAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert.clone());
        Ok(())
    }
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<LowConfidenceAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

pub(super) struct FailingAlerts;

impl LowConfidenceAlerter for FailingAlerts {
    fn notify(&self, _alert: &LowConfidenceAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("webhook timed out".to_string()))
    }
}

pub(super) struct PanickingAlerts;

impl LowConfidenceAlerter for PanickingAlerts {
    fn notify(&self, _alert: &LowConfidenceAlert) -> Result<(), AlertError> {
        panic!("webhook client blew up");
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    records: Arc<Mutex<Vec<(String, Value)>>>,
}

impl AuditPublisher for MemoryAudit {
    fn publish(&self, blob_name: &str, record: &AuditRecord) -> Result<String, AuditError> {
        let value = serde_json::to_value(record)?;
        self.records
            .lock()
            .expect("audit mutex poisoned")
            .push((blob_name.to_string(), value));
        Ok(format!("memory://{blob_name}"))
    }
}

impl MemoryAudit {
    pub(super) fn records(&self) -> Vec<(String, Value)> {
        self.records.lock().expect("audit mutex poisoned").clone()
    }
}

pub(super) struct FailingAudit;

impl AuditPublisher for FailingAudit {
    fn publish(&self, _blob_name: &str, _record: &AuditRecord) -> Result<String, AuditError> {
        Err(AuditError::Unavailable("container offline".to_string()))
    }
}

pub(super) struct PanickingAudit;

impl AuditPublisher for PanickingAudit {
    fn publish(&self, _blob_name: &str, _record: &AuditRecord) -> Result<String, AuditError> {
        let client = "blob client";
        panic!("{client} lost its container");
    }
}

pub(super) struct PanickingDirectory;

impl StudentDirectory for PanickingDirectory {
    fn name_for(&self, _student_id: &StudentId) -> Result<Option<String>, DirectoryError> {
        std::panic::panic_any(42_u8);
    }
}

pub(super) struct FailingDirectory;

impl StudentDirectory for FailingDirectory {
    fn name_for(&self, _student_id: &StudentId) -> Result<Option<String>, DirectoryError> {
        Err(DirectoryError::Unavailable("profile store offline".to_string()))
    }
}

pub(super) type TestService<G> = OnboardingService<G, RosterDirectory, MemoryAlerts, MemoryAudit>;

pub(super) fn build_service<G: ExtractionGateway + 'static>(
    gateway: G,
    settings: OnboardingSettings,
) -> (TestService<G>, Arc<G>, MemoryAlerts, MemoryAudit) {
    let gateway = Arc::new(gateway);
    let alerts = MemoryAlerts::default();
    let audit = MemoryAudit::default();
    let service = OnboardingService::with_clock(
        gateway.clone(),
        Arc::new(roster()),
        Arc::new(alerts.clone()),
        Arc::new(audit.clone()),
        settings,
        fixed_clock(),
    );
    (service, gateway, alerts, audit)
}

pub(super) fn demo_settings() -> OnboardingSettings {
    OnboardingSettings {
        demo_mode: true,
        ..OnboardingSettings::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}

pub(super) const BOUNDARY: &str = "onboard-ai-test-boundary";

/// Hand-rolled multipart body; `parts` are `(field, filename, content)`.
pub(super) fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
