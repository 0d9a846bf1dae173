use chrono::{Months, NaiveDate};

use super::domain::{CandidateInfo, DocumentClass, ExtractedDocuments, ExtractionResult, StudentId};

pub const MOCK_CONFIDENCE: f64 = 0.98;
pub const MOCK_DECLARED_INCOME: &str = "120000";
const MOCK_DEFAULT_AGE: u32 = 18;

/// Strategy deciding whether synthetic results may replace empty extractions.
///
/// Only [`DemoFallback::Synthesize`] can ever put mock data in front of the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoFallback {
    #[default]
    Disabled,
    Synthesize,
}

/// Inputs the mock synthesis draws on.
#[derive(Debug, Clone, Copy)]
pub struct MockContext<'a> {
    pub profile_name: &'a str,
    pub student_id: Option<&'a StudentId>,
    pub candidate: &'a CandidateInfo,
    pub today: NaiveDate,
}

impl DemoFallback {
    pub fn from_flag(demo_mode: bool) -> Self {
        if demo_mode {
            Self::Synthesize
        } else {
            Self::Disabled
        }
    }

    /// Returns the documents to decide on and whether they were synthesized.
    pub fn apply(
        self,
        extracted: ExtractedDocuments,
        context: &MockContext<'_>,
    ) -> (ExtractedDocuments, bool) {
        match self {
            DemoFallback::Synthesize if extracted.all_failed() => {
                let secondary_id = extracted
                    .secondary_id
                    .as_ref()
                    .map(|_| mock_result(DocumentClass::SecondaryId, context));
                let documents = ExtractedDocuments {
                    primary_id: mock_result(DocumentClass::PrimaryId, context),
                    secondary_id,
                    income: mock_result(DocumentClass::IncomeProof, context),
                };
                (documents, true)
            }
            _ => (extracted, false),
        }
    }
}

fn mock_result(class: DocumentClass, context: &MockContext<'_>) -> ExtractionResult {
    let subject = context
        .student_id
        .map(StudentId::as_str)
        .unwrap_or("anonymous");
    let id_number = format!("DEMO-{}-{}", class.code(), subject);

    let (date_of_birth, declared_income) = match class {
        DocumentClass::PrimaryId | DocumentClass::SecondaryId => {
            (mock_date_of_birth(context), None)
        }
        DocumentClass::IncomeProof => (None, Some(MOCK_DECLARED_INCOME.to_string())),
    };

    ExtractionResult::new(
        context.profile_name,
        date_of_birth,
        id_number,
        declared_income,
        MOCK_CONFIDENCE,
    )
}

/// Birth date putting the candidate at the lower bound of their declared bucket today.
fn mock_date_of_birth(context: &MockContext<'_>) -> Option<String> {
    let age = context
        .candidate
        .declared_age_range()
        .map(|range| range.bounds().0)
        .unwrap_or(MOCK_DEFAULT_AGE);

    context
        .today
        .checked_sub_months(Months::new(age * 12))
        .map(|dob| dob.format("%Y-%m-%d").to_string())
}
