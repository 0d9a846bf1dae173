use crate::infra::{clock_for, load_roster, InMemoryAlerter, ServiceAuditPublisher, ServiceGateway};
use chrono::{Local, NaiveDate};
use clap::Args;
use onboard_ai::config::{AppConfig, ExtractionMode, OnboardingConfig};
use onboard_ai::error::AppError;
use onboard_ai::telemetry;
use onboard_ai::workflows::onboarding::{
    CandidateInfo, Clock, DocumentRole, OnboardingResult, OnboardingService, OnboardingSettings,
    RosterDirectory, StudentId, TracingAlerter, VerificationRequest,
};
use std::path::PathBuf;
use std::sync::Arc;

const RAVI_PRIMARY_ID: &str =
    include_str!("../../../crates/onboard-ai/fixtures/ravi_primary_id.json");
const RAVI_SECONDARY_ID: &str =
    include_str!("../../../crates/onboard-ai/fixtures/ravi_secondary_id.json");
const RAVI_INCOME: &str = include_str!("../../../crates/onboard-ai/fixtures/ravi_income.json");
const BLURRY_PRIMARY_ID: &str =
    include_str!("../../../crates/onboard-ai/fixtures/blurry_primary_id.json");
const DEMO_ROSTER: &str = include_str!("../../../crates/onboard-ai/fixtures/roster.csv");

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// Analyze-response JSON for the primary identity document
    #[arg(long)]
    pub(crate) primary_id: PathBuf,
    /// Analyze-response JSON for the income proof
    #[arg(long)]
    pub(crate) income: PathBuf,
    /// Analyze-response JSON for the optional secondary identity document
    #[arg(long)]
    pub(crate) secondary_id: Option<PathBuf>,
    /// Student identifier used for the roster lookup
    #[arg(long)]
    pub(crate) student_id: Option<String>,
    /// Declared candidate name, used when the student is not on the roster
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Declared age bucket (14-17, 18-24, 25-30, 31+)
    #[arg(long)]
    pub(crate) age_range: Option<String>,
    /// Substitute mock extraction results when every document comes back empty
    #[arg(long)]
    pub(crate) demo: bool,
    /// Record the attempt as verified without evaluating eligibility rules
    #[arg(long)]
    pub(crate) skip_rules: bool,
    /// Evaluate ages as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Student roster CSV (overrides ONBOARDING_ROSTER_PATH)
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Directory for audit records (overrides ONBOARDING_AUDIT_DIR)
    #[arg(long)]
    pub(crate) audit_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluate ages as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Directory for audit records written during the demo
    #[arg(long)]
    pub(crate) audit_dir: Option<PathBuf>,
    /// Print every full result payload as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let VerifyArgs {
        primary_id,
        income,
        secondary_id,
        student_id,
        name,
        age_range,
        demo,
        skip_rules,
        today,
        roster,
        audit_dir,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init_cli(&config.telemetry)?;

    let mut onboarding = config.onboarding;
    onboarding.extraction_mode = ExtractionMode::AnalyzeResponse;
    onboarding.settings.demo_mode |= demo;
    onboarding.settings.skip_rules |= skip_rules;
    if roster.is_some() {
        onboarding.roster_path = roster;
    }
    if audit_dir.is_some() {
        onboarding.audit_dir = audit_dir;
    }

    let request = VerificationRequest {
        student_id: student_id.as_deref().and_then(StudentId::parse),
        primary_id: std::fs::read(&primary_id)?,
        secondary_id: secondary_id.map(std::fs::read).transpose()?,
        income_proof: std::fs::read(&income)?,
        candidate: CandidateInfo {
            name,
            age_range,
            ..CandidateInfo::default()
        },
    };

    let service = OnboardingService::with_clock(
        Arc::new(ServiceGateway::from_mode(onboarding.extraction_mode)),
        Arc::new(load_roster(onboarding.roster_path.as_deref())?),
        Arc::new(TracingAlerter),
        Arc::new(ServiceAuditPublisher::from_dir(onboarding.audit_dir.as_deref())),
        onboarding.settings,
        clock_for(today),
    );

    let result = service.verify(request);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// One canned verification attempt shown during the demo.
pub(crate) struct DemoScenario {
    pub(crate) title: &'static str,
    pub(crate) settings: OnboardingSettings,
    pub(crate) request: VerificationRequest,
}

pub(crate) fn demo_scenarios() -> Vec<DemoScenario> {
    let declared = |name: Option<&str>, age_range: &str| CandidateInfo {
        name: name.map(str::to_string),
        age_range: Some(age_range.to_string()),
        education_level: Some("12th Pass".to_string()),
        location: Some("Pune, Maharashtra".to_string()),
        interests: Some("Technology".to_string()),
        skills: Some("Communication".to_string()),
        language: Some("Hindi".to_string()),
    };
    let upload = |student_id: &str,
                  primary: &str,
                  secondary: Option<&str>,
                  candidate: CandidateInfo| VerificationRequest {
        student_id: StudentId::parse(student_id),
        primary_id: primary.as_bytes().to_vec(),
        secondary_id: secondary.map(|doc| doc.as_bytes().to_vec()),
        income_proof: RAVI_INCOME.as_bytes().to_vec(),
        candidate,
    };

    vec![
        DemoScenario {
            title: "Rostered student with consistent documents",
            settings: OnboardingSettings::default(),
            request: upload(
                "S100",
                RAVI_PRIMARY_ID,
                Some(RAVI_SECONDARY_ID),
                declared(None, "18-24"),
            ),
        },
        DemoScenario {
            title: "Documents belong to someone else on the roster",
            settings: OnboardingSettings::default(),
            request: upload("S200", RAVI_PRIMARY_ID, None, declared(None, "18-24")),
        },
        DemoScenario {
            title: "Blurry identity scan",
            settings: OnboardingSettings::default(),
            request: upload("S100", BLURRY_PRIMARY_ID, None, declared(None, "18-24")),
        },
        DemoScenario {
            title: "Declared age bucket disagrees with the identity document",
            settings: OnboardingSettings::default(),
            request: upload("S100", RAVI_PRIMARY_ID, None, declared(None, "25-30")),
        },
        DemoScenario {
            title: "Walk-in candidate, extraction unavailable, demo mode on",
            settings: OnboardingSettings {
                demo_mode: true,
                ..OnboardingSettings::default()
            },
            request: VerificationRequest {
                student_id: None,
                primary_id: b"\xFF\xD8\xFF\xE0 photo".to_vec(),
                secondary_id: None,
                income_proof: b"%PDF-1.7 scan".to_vec(),
                candidate: declared(Some("Asha Verma"), "18-24"),
            },
        },
    ]
}

pub(crate) fn run_scenario(
    scenario: DemoScenario,
    roster: &Arc<RosterDirectory>,
    audit_dir: Option<&std::path::Path>,
    clock: Arc<dyn Clock>,
) -> (OnboardingResult, InMemoryAlerter) {
    let alerts = InMemoryAlerter::default();
    let service = OnboardingService::with_clock(
        Arc::new(ServiceGateway::from_mode(ExtractionMode::AnalyzeResponse)),
        roster.clone(),
        Arc::new(alerts.clone()),
        Arc::new(ServiceAuditPublisher::from_dir(audit_dir)),
        scenario.settings,
        clock,
    );

    (service.verify(scenario.request), alerts)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        audit_dir,
        json,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let roster = Arc::new(RosterDirectory::from_reader(DEMO_ROSTER.as_bytes())?);
    let defaults = OnboardingConfig::default().settings.eligibility;

    println!("Onboarding verification demo ({today})");
    println!(
        "- Thresholds: confidence >= {:.2} | age {}-{} | income <= {}",
        defaults.confidence_threshold, defaults.min_age, defaults.max_age, defaults.income_ceiling
    );
    println!("- Roster: {} students", roster.len());

    for (index, scenario) in demo_scenarios().into_iter().enumerate() {
        let title = scenario.title;
        let (result, alerts) =
            run_scenario(scenario, &roster, audit_dir.as_deref(), clock_for(Some(today)));

        println!("\n{}. {}", index + 1, title);
        println!(
            "  Student: {} | verified: {} | name match: {}{}",
            result
                .student_id
                .as_ref()
                .map(StudentId::as_str)
                .unwrap_or("walk-in"),
            result.verified,
            result.name_match,
            if result.demo_fallback {
                " | mock extraction"
            } else {
                ""
            }
        );
        println!("  Decision: {}", result.reason);
        for (role, document) in &result.documents {
            println!(
                "    - {}: {} (confidence {:.2})",
                role_title(*role),
                if document.name.is_empty() {
                    "<no name read>"
                } else {
                    document.name.as_str()
                },
                document.confidence
            );
        }

        let events = alerts.events();
        if events.is_empty() {
            println!("  Low-confidence alerts: none dispatched");
        } else {
            println!("  Low-confidence alerts:");
            for alert in events {
                println!("    - {} at {:.2}", alert.role, alert.confidence);
            }
        }

        if result.audit_location.is_empty() {
            println!("  Audit: not persisted ({})", result.audit_error);
        } else {
            println!("  Audit: {}", result.audit_location);
        }

        if json {
            match serde_json::to_string_pretty(&result) {
                Ok(payload) => println!("  Result payload:\n{}", payload),
                Err(err) => println!("  Result payload unavailable: {}", err),
            }
        }
    }

    Ok(())
}

fn role_title(role: DocumentRole) -> &'static str {
    match role {
        DocumentRole::PrimaryId => "Primary ID",
        DocumentRole::SecondaryId => "Secondary ID",
        DocumentRole::Income => "Income proof",
    }
}
