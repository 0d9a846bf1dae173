use std::sync::Arc;

use super::common::*;
use crate::workflows::onboarding::audit::{
    FileSystemAuditPublisher, UnconfiguredAuditPublisher,
};
use crate::workflows::onboarding::demo::MOCK_CONFIDENCE;
use crate::workflows::onboarding::directory::RosterDirectory;
use crate::workflows::onboarding::domain::{
    DocumentClass, DocumentRole, ExtractionResult, StudentId,
};
use crate::workflows::onboarding::evaluation::OnboardingSettings;
use crate::workflows::onboarding::service::OnboardingService;

#[test]
fn rostered_student_with_consistent_documents_is_verified() {
    let (service, gateway, alerts, audit) =
        build_service(ravi_gateway(), OnboardingSettings::default());

    let result = service.verify(request(Some("S100"), false));

    assert!(result.verified, "unexpected reason: {}", result.reason);
    assert_eq!(result.reason, "Verified");
    assert!(result.name_match);
    assert!(!result.demo_fallback);
    assert_eq!(result.student_id, StudentId::parse("S100"));
    assert_eq!(result.documents.len(), 2);
    assert!(!result.documents.contains_key(&DocumentRole::SecondaryId));
    assert!(alerts.events().is_empty());

    let mut calls = gateway.calls();
    calls.sort_by_key(|class| class.code());
    assert_eq!(calls, vec![DocumentClass::IncomeProof, DocumentClass::PrimaryId]);

    let records = audit.records();
    assert_eq!(records.len(), 1);
    let (blob_name, record) = &records[0];
    assert!(blob_name.starts_with("onboarding/2025/06/15/student-S100-ravi-kumar-"));
    assert!(blob_name.ends_with(".json"));
    assert_eq!(result.audit_location, format!("memory://{blob_name}"));
    assert!(result.audit_error.is_empty());
    assert_eq!(record["verified"], true);
    assert_eq!(record["reason"], "Verified");
    assert_eq!(record["profileName"], "Ravi Kumar");
    assert_eq!(record["studentId"], "S100");
}

#[test]
fn roster_name_disagreeing_with_documents_needs_review() {
    let (service, _, _, audit) = build_service(ravi_gateway(), OnboardingSettings::default());

    let result = service.verify(request(Some("S200"), false));

    assert!(!result.verified);
    assert!(!result.name_match);
    assert_eq!(result.reason, "Needs-Review: name mismatch");
    assert_eq!(audit.records().len(), 1);
}

#[test]
fn declared_name_is_used_when_student_is_not_rostered() {
    let (service, _, _, _) = build_service(ravi_gateway(), OnboardingSettings::default());
    let mut request = request(Some("S999"), false);
    request.candidate = candidate(Some("ravi kumar"), Some("18-24"));

    let result = service.verify(request);

    assert!(result.verified, "unexpected reason: {}", result.reason);
}

#[test]
fn roster_name_takes_precedence_over_declared_name() {
    let (service, _, _, _) = build_service(ravi_gateway(), OnboardingSettings::default());
    let mut request = request(Some("S200"), false);
    request.candidate = candidate(Some("Ravi Kumar"), None);

    let result = service.verify(request);

    assert_eq!(result.reason, "Needs-Review: name mismatch");
}

#[test]
fn anonymous_attempt_without_declared_name_cannot_match() {
    let (service, _, _, audit) = build_service(ravi_gateway(), OnboardingSettings::default());

    let result = service.verify(request(None, false));

    assert!(!result.name_match);
    assert_eq!(result.reason, "Needs-Review: name mismatch");
    assert!(audit.records()[0]
        .0
        .starts_with("onboarding/2025/06/15/student-unknown-unknown-"));
}

#[test]
fn submitted_secondary_id_takes_part_in_matching() {
    let gateway = ravi_gateway().with(
        DocumentClass::SecondaryId,
        id_result("Suresh Kumar", NINETEEN_DOB, 0.95),
    );
    let (service, gateway, _, _) = build_service(gateway, OnboardingSettings::default());

    let result = service.verify(request(Some("S100"), true));

    assert_eq!(result.reason, "Needs-Review: name mismatch");
    assert!(result.documents.contains_key(&DocumentRole::SecondaryId));
    assert_eq!(gateway.calls().len(), 3);
}

#[test]
fn low_confidence_documents_raise_one_alert_each() {
    let gateway = ScriptedGateway::default()
        .with(
            DocumentClass::PrimaryId,
            id_result("Ravi Kumar", NINETEEN_DOB, 0.42),
        )
        .with(
            DocumentClass::SecondaryId,
            id_result("Ravi Kumar", NINETEEN_DOB, 0.95),
        )
        .with(
            DocumentClass::IncomeProof,
            income_result("Ravi Kumar", "120000", 0.61),
        );
    let (service, _, alerts, _) = build_service(gateway, OnboardingSettings::default());

    let result = service.verify(request(Some("S100"), true));

    assert_eq!(
        result.reason,
        "Needs-Review: primary id confidence below threshold"
    );
    let mut roles: Vec<_> = alerts.events().iter().map(|alert| alert.role).collect();
    roles.sort();
    assert_eq!(roles, vec![DocumentRole::PrimaryId, DocumentRole::Income]);
    assert!(alerts
        .events()
        .iter()
        .all(|alert| alert.student_id == StudentId::parse("S100")));
}

#[test]
fn alert_failures_do_not_change_the_decision() {
    let gateway = ScriptedGateway::default()
        .with(
            DocumentClass::PrimaryId,
            id_result("Ravi Kumar", NINETEEN_DOB, 0.5),
        )
        .with(
            DocumentClass::IncomeProof,
            income_result("Ravi Kumar", "120000", 0.95),
        );
    let audit = MemoryAudit::default();
    let service = OnboardingService::with_clock(
        Arc::new(gateway),
        Arc::new(roster()),
        Arc::new(FailingAlerts),
        Arc::new(audit.clone()),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert_eq!(
        result.reason,
        "Needs-Review: primary id confidence below threshold"
    );
    assert_eq!(result.alert_errors.len(), 1);
    assert!(result.alert_errors[0].starts_with("primary-id: "));
    assert_eq!(audit.records().len(), 1);
}

#[test]
fn audit_failure_is_reported_without_changing_the_verdict() {
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(roster()),
        Arc::new(MemoryAlerts::default()),
        Arc::new(FailingAudit),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert!(result.verified);
    assert!(result.audit_location.is_empty());
    assert!(result.audit_error.contains("container offline"));
}

#[test]
fn unconfigured_audit_storage_is_reported() {
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(roster()),
        Arc::new(MemoryAlerts::default()),
        Arc::new(UnconfiguredAuditPublisher),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert!(result.verified);
    assert_eq!(result.audit_error, "audit storage is not configured");
}

#[test]
fn demo_mode_substitutes_mocks_when_every_extraction_fails() {
    let (service, _, alerts, audit) = build_service(ScriptedGateway::default(), demo_settings());

    let result = service.verify(request(Some("S100"), true));

    assert!(result.verified, "unexpected reason: {}", result.reason);
    assert!(result.demo_fallback);
    assert!(result.name_match);
    assert_eq!(result.documents.len(), 3);
    let primary = &result.documents[&DocumentRole::PrimaryId];
    assert_eq!(primary.name, "Ravi Kumar");
    assert_eq!(primary.id_number, "DEMO-PRIMARY-ID-S100");
    assert_eq!(primary.confidence, MOCK_CONFIDENCE);
    assert_eq!(primary.date_of_birth.as_deref(), Some("2007-06-15"));
    assert_eq!(
        result.documents[&DocumentRole::Income]
            .declared_income
            .as_deref(),
        Some("120000")
    );
    assert!(alerts.events().is_empty());
    assert_eq!(audit.records()[0].1["demoFallback"], true);
}

#[test]
fn demo_mocks_follow_the_declared_age_bucket() {
    let (service, _, _, _) = build_service(ScriptedGateway::default(), demo_settings());
    let mut request = request(Some("S100"), false);
    request.candidate = candidate(None, Some("14-17"));

    let result = service.verify(request);

    assert!(result.verified, "unexpected reason: {}", result.reason);
    assert_eq!(
        result.documents[&DocumentRole::PrimaryId]
            .date_of_birth
            .as_deref(),
        Some("2011-06-15")
    );
}

#[test]
fn demo_mode_leaves_partial_extractions_untouched() {
    let gateway = ScriptedGateway::default().with(
        DocumentClass::PrimaryId,
        id_result("Ravi Kumar", NINETEEN_DOB, 0.95),
    );
    let (service, _, _, _) = build_service(gateway, demo_settings());

    let result = service.verify(request(Some("S100"), false));

    assert!(!result.demo_fallback);
    assert!(!result.verified);
    assert_eq!(result.reason, "Needs-Review: name mismatch");
}

#[test]
fn failed_extractions_without_demo_mode_need_review() {
    let (service, _, alerts, _) =
        build_service(ScriptedGateway::default(), OnboardingSettings::default());

    let result = service.verify(request(Some("S100"), false));

    assert!(!result.verified);
    assert!(!result.demo_fallback);
    assert_eq!(result.reason, "Needs-Review: name mismatch");
    assert_eq!(
        result.documents[&DocumentRole::PrimaryId],
        ExtractionResult::failed()
    );
    assert_eq!(alerts.events().len(), 2);
}

#[test]
fn skip_rules_verifies_whatever_was_extracted() {
    let settings = OnboardingSettings {
        skip_rules: true,
        ..OnboardingSettings::default()
    };
    let (service, _, alerts, audit) = build_service(ScriptedGateway::default(), settings);

    let result = service.verify(request(Some("S200"), false));

    assert!(result.verified);
    assert_eq!(result.reason, "Verified");
    assert!(!result.name_match);
    assert_eq!(alerts.events().len(), 2);
    assert_eq!(audit.records().len(), 1);
}

#[test]
fn empty_upload_yields_failure_result() {
    let (service, gateway, _, audit) = build_service(ravi_gateway(), OnboardingSettings::default());
    let mut request = request(Some("S100"), false);
    request.income_proof.clear();

    let result = service.verify(request);

    assert!(!result.verified);
    assert_eq!(
        result.reason,
        "Verification failed: income document is empty or unreadable"
    );
    assert!(result.documents.is_empty());
    assert_eq!(result.student_id, StudentId::parse("S100"));
    assert!(gateway.calls().is_empty());
    assert!(audit.records().is_empty());
}

#[test]
fn panicking_extraction_yields_failure_result() {
    let (service, _, _, _) = build_service(PanickingGateway, OnboardingSettings::default());

    let result = service.verify(request(Some("S100"), false));

    assert!(!result.verified);
    assert_eq!(
        result.reason,
        "Verification failed: income extraction aborted unexpectedly"
    );
}

#[test]
fn panicking_alerter_yields_failure_result() {
    let gateway = ScriptedGateway::default()
        .with(
            DocumentClass::PrimaryId,
            id_result("Ravi Kumar", NINETEEN_DOB, 0.1),
        )
        .with(
            DocumentClass::IncomeProof,
            income_result("Ravi Kumar", "120000", 0.95),
        );
    let audit = MemoryAudit::default();
    let service = OnboardingService::with_clock(
        Arc::new(gateway),
        Arc::new(roster()),
        Arc::new(PanickingAlerts),
        Arc::new(audit.clone()),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert!(!result.verified);
    assert_eq!(result.student_id, StudentId::parse("S100"));
    assert_eq!(
        result.reason,
        "Verification failed: verification aborted unexpectedly: webhook client blew up"
    );
    assert!(audit.records().is_empty());
}

#[test]
fn panicking_audit_publisher_yields_failure_result() {
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(roster()),
        Arc::new(MemoryAlerts::default()),
        Arc::new(PanickingAudit),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert!(!result.verified);
    assert_eq!(
        result.reason,
        "Verification failed: verification aborted unexpectedly: blob client lost its container"
    );
}

#[test]
fn panicking_directory_yields_failure_result() {
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(PanickingDirectory),
        Arc::new(MemoryAlerts::default()),
        Arc::new(MemoryAudit::default()),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert_eq!(
        result.reason,
        "Verification failed: verification aborted unexpectedly: unknown panic"
    );
}

#[test]
fn traversal_in_student_id_stays_inside_audit_root() {
    let root =
        std::env::temp_dir().join(format!("onboard-ai-traversal-{}", uuid::Uuid::new_v4()));
    let inner = root.join("inner");
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(roster()),
        Arc::new(MemoryAlerts::default()),
        Arc::new(FileSystemAuditPublisher::new(&inner)),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("x/../../../../../../../escape"), false));

    assert!(result.audit_error.is_empty(), "{}", result.audit_error);
    let written = std::path::PathBuf::from(&result.audit_location);
    assert!(written.starts_with(inner.join("onboarding/2025/06/15")));
    assert!(written
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("student-x-escape-")));
    assert!(written.is_file());

    std::fs::remove_dir_all(&root).expect("scratch dir removed");
}

#[test]
fn directory_outage_yields_failure_result() {
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(FailingDirectory),
        Arc::new(MemoryAlerts::default()),
        Arc::new(MemoryAudit::default()),
        OnboardingSettings::default(),
        fixed_clock(),
    );

    let result = service.verify(request(Some("S100"), false));

    assert!(!result.verified);
    assert!(result.reason.starts_with("Verification failed: "));
    assert!(result.reason.contains("profile store offline"));
}

#[test]
fn empty_roster_relies_on_declared_name() {
    let service = OnboardingService::with_clock(
        Arc::new(ravi_gateway()),
        Arc::new(RosterDirectory::empty()),
        Arc::new(MemoryAlerts::default()),
        Arc::new(MemoryAudit::default()),
        OnboardingSettings::default(),
        fixed_clock(),
    );
    let mut request = request(Some("S100"), false);
    request.candidate = candidate(Some("Ravi Kumar"), None);

    let result = service.verify(request);

    assert!(result.verified, "unexpected reason: {}", result.reason);
}

#[test]
fn identical_attempts_reach_identical_verdicts() {
    let (service, _, _, audit) = build_service(ravi_gateway(), OnboardingSettings::default());

    let first = service.verify(request(Some("S100"), false));
    let second = service.verify(request(Some("S100"), false));

    assert_eq!(first.verified, second.verified);
    assert_eq!(first.reason, second.reason);
    assert_eq!(first.documents, second.documents);

    let records = audit.records();
    assert_ne!(records[0].1["attemptId"], records[1].1["attemptId"]);
}
