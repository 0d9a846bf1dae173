use chrono::{NaiveDate, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use onboard_ai::config::{ExtractionMode, OnboardingConfig};
use onboard_ai::error::AppError;
use onboard_ai::workflows::onboarding::{
    AlertError, AnalyzeResponseGateway, AuditError, AuditPublisher, AuditRecord, Clock,
    DocumentClass, ExtractionGateway, ExtractionResult, FileSystemAuditPublisher, FixedClock,
    LowConfidenceAlert, LowConfidenceAlerter, OnboardingService, RosterDirectory, SystemClock,
    TracingAlerter, UnconfiguredAuditPublisher, UnconfiguredGateway,
};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Gateway chosen from `ONBOARDING_EXTRACTION_MODE`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ServiceGateway {
    Unconfigured(UnconfiguredGateway),
    AnalyzeResponse(AnalyzeResponseGateway),
}

impl ServiceGateway {
    pub(crate) fn from_mode(mode: ExtractionMode) -> Self {
        match mode {
            ExtractionMode::Disabled => Self::Unconfigured(UnconfiguredGateway),
            ExtractionMode::AnalyzeResponse => Self::AnalyzeResponse(AnalyzeResponseGateway),
        }
    }
}

impl ExtractionGateway for ServiceGateway {
    fn analyze(&self, document: &[u8], class: DocumentClass) -> ExtractionResult {
        match self {
            ServiceGateway::Unconfigured(gateway) => gateway.analyze(document, class),
            ServiceGateway::AnalyzeResponse(gateway) => gateway.analyze(document, class),
        }
    }
}

/// Audit storage chosen from `ONBOARDING_AUDIT_DIR`.
#[derive(Debug, Clone)]
pub(crate) enum ServiceAuditPublisher {
    FileSystem(FileSystemAuditPublisher),
    Unconfigured(UnconfiguredAuditPublisher),
}

impl ServiceAuditPublisher {
    pub(crate) fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::FileSystem(FileSystemAuditPublisher::new(dir)),
            None => Self::Unconfigured(UnconfiguredAuditPublisher),
        }
    }
}

impl AuditPublisher for ServiceAuditPublisher {
    fn publish(&self, blob_name: &str, record: &AuditRecord) -> Result<String, AuditError> {
        match self {
            ServiceAuditPublisher::FileSystem(publisher) => publisher.publish(blob_name, record),
            ServiceAuditPublisher::Unconfigured(publisher) => publisher.publish(blob_name, record),
        }
    }
}

/// Collects alerts so the demo can show what would have been dispatched.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAlerter {
    events: Arc<Mutex<Vec<LowConfidenceAlert>>>,
}

impl LowConfidenceAlerter for InMemoryAlerter {
    fn notify(&self, alert: &LowConfidenceAlert) -> Result<(), AlertError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert buffer poisoned".to_string()))?;
        guard.push(alert.clone());
        Ok(())
    }
}

impl InMemoryAlerter {
    pub(crate) fn events(&self) -> Vec<LowConfidenceAlert> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) type ApiService =
    OnboardingService<ServiceGateway, RosterDirectory, TracingAlerter, ServiceAuditPublisher>;

/// Load the roster, tolerating a missing file so a fresh deployment can still serve declared
/// candidates.
pub(crate) fn load_roster(path: Option<&Path>) -> Result<RosterDirectory, AppError> {
    let Some(path) = path else {
        return Ok(RosterDirectory::empty());
    };

    match RosterDirectory::from_path(path) {
        Ok(roster) => {
            info!(path = %path.display(), students = roster.len(), "student roster loaded");
            Ok(roster)
        }
        Err(err) if err.is_not_found() => {
            warn!(
                path = %path.display(),
                "student roster not found; continuing with an empty roster"
            );
            Ok(RosterDirectory::empty())
        }
        Err(err) => Err(AppError::from(err)),
    }
}

pub(crate) fn build_service(
    config: &OnboardingConfig,
    clock: Arc<dyn Clock>,
) -> Result<ApiService, AppError> {
    let roster = load_roster(config.roster_path.as_deref())?;
    if config.audit_dir.is_none() {
        warn!("ONBOARDING_AUDIT_DIR not set; audit records will not be persisted");
    }

    Ok(OnboardingService::with_clock(
        Arc::new(ServiceGateway::from_mode(config.extraction_mode)),
        Arc::new(roster),
        Arc::new(TracingAlerter),
        Arc::new(ServiceAuditPublisher::from_dir(config.audit_dir.as_deref())),
        config.settings.clone(),
        clock,
    ))
}

/// Pin "today" when given, otherwise follow the wall clock.
pub(crate) fn clock_for(today: Option<NaiveDate>) -> Arc<dyn Clock> {
    match today
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .and_then(|noon| Utc.from_local_datetime(&noon).single())
    {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
