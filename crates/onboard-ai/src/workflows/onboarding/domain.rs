use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for students enrolled in the program roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    /// Trim the raw identifier, rejecting blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-declared profile used when no stored roster entry exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInfo {
    pub name: Option<String>,
    pub age_range: Option<String>,
    pub education_level: Option<String>,
    pub location: Option<String>,
    pub interests: Option<String>,
    pub skills: Option<String>,
    pub language: Option<String>,
}

impl CandidateInfo {
    pub fn declared_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Declared bucket, ignoring labels that are not offered on the intake form.
    pub fn declared_age_range(&self) -> Option<AgeRange> {
        self.age_range.as_deref().and_then(AgeRange::parse)
    }
}

/// Age buckets offered on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "14-17")]
    FourteenToSeventeen,
    #[serde(rename = "18-24")]
    EighteenToTwentyFour,
    #[serde(rename = "25-30")]
    TwentyFiveToThirty,
    #[serde(rename = "31+")]
    ThirtyOneAndOver,
}

impl AgeRange {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "14-17" => Some(Self::FourteenToSeventeen),
            "18-24" => Some(Self::EighteenToTwentyFour),
            "25-30" => Some(Self::TwentyFiveToThirty),
            "31+" => Some(Self::ThirtyOneAndOver),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AgeRange::FourteenToSeventeen => "14-17",
            AgeRange::EighteenToTwentyFour => "18-24",
            AgeRange::TwentyFiveToThirty => "25-30",
            AgeRange::ThirtyOneAndOver => "31+",
        }
    }

    /// Inclusive bounds; the open-ended bucket has no upper bound.
    pub const fn bounds(self) -> (u32, Option<u32>) {
        match self {
            AgeRange::FourteenToSeventeen => (14, Some(17)),
            AgeRange::EighteenToTwentyFour => (18, Some(24)),
            AgeRange::TwentyFiveToThirty => (25, Some(30)),
            AgeRange::ThirtyOneAndOver => (31, None),
        }
    }

    pub fn contains(self, age: u32) -> bool {
        let (lower, upper) = self.bounds();
        age >= lower && upper.map(|upper| age <= upper).unwrap_or(true)
    }
}

/// Document classes understood by the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentClass {
    PrimaryId,
    SecondaryId,
    IncomeProof,
}

impl DocumentClass {
    /// Prebuilt extraction model used for the class.
    pub const fn model_id(self) -> &'static str {
        match self {
            DocumentClass::PrimaryId | DocumentClass::SecondaryId => "prebuilt-idDocument",
            DocumentClass::IncomeProof => "prebuilt-document",
        }
    }

    pub const fn role(self) -> DocumentRole {
        match self {
            DocumentClass::PrimaryId => DocumentRole::PrimaryId,
            DocumentClass::SecondaryId => DocumentRole::SecondaryId,
            DocumentClass::IncomeProof => DocumentRole::Income,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            DocumentClass::PrimaryId => "PRIMARY-ID",
            DocumentClass::SecondaryId => "SECONDARY-ID",
            DocumentClass::IncomeProof => "INCOME",
        }
    }
}

/// Role a document plays within one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentRole {
    #[serde(rename = "primary-id")]
    PrimaryId,
    #[serde(rename = "secondary-id")]
    SecondaryId,
    #[serde(rename = "income")]
    Income,
}

impl DocumentRole {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentRole::PrimaryId => "primary-id",
            DocumentRole::SecondaryId => "secondary-id",
            DocumentRole::Income => "income",
        }
    }

    pub const fn class(self) -> DocumentClass {
        match self {
            DocumentRole::PrimaryId => DocumentClass::PrimaryId,
            DocumentRole::SecondaryId => DocumentClass::SecondaryId,
            DocumentRole::Income => DocumentClass::IncomeProof,
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields the extraction service reported for a single document.
///
/// A blank name, blank id number and zero confidence is the sentinel for a failed extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub name: String,
    pub date_of_birth: Option<String>,
    pub id_number: String,
    pub declared_income: Option<String>,
    pub confidence: f64,
}

impl ExtractionResult {
    pub fn new(
        name: impl Into<String>,
        date_of_birth: Option<String>,
        id_number: impl Into<String>,
        declared_income: Option<String>,
        confidence: f64,
    ) -> Self {
        Self {
            name: name.into(),
            date_of_birth: date_of_birth.filter(|value| !value.trim().is_empty()),
            id_number: id_number.into(),
            declared_income: declared_income.filter(|value| !value.trim().is_empty()),
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn is_failed(&self) -> bool {
        self.name.trim().is_empty() && self.id_number.trim().is_empty() && self.confidence == 0.0
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Extraction results for one attempt, keeping "not submitted" distinct from "failed".
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocuments {
    pub primary_id: ExtractionResult,
    pub secondary_id: Option<ExtractionResult>,
    pub income: ExtractionResult,
}

impl ExtractedDocuments {
    pub fn all_failed(&self) -> bool {
        self.primary_id.is_failed()
            && self.income.is_failed()
            && self
                .secondary_id
                .as_ref()
                .map(ExtractionResult::is_failed)
                .unwrap_or(true)
    }

    /// Submitted documents paired with their role, in role order.
    pub fn submitted(&self) -> Vec<(DocumentRole, &ExtractionResult)> {
        let mut documents = vec![(DocumentRole::PrimaryId, &self.primary_id)];
        if let Some(secondary) = &self.secondary_id {
            documents.push((DocumentRole::SecondaryId, secondary));
        }
        documents.push((DocumentRole::Income, &self.income));
        documents
    }

    pub fn to_map(&self) -> BTreeMap<DocumentRole, ExtractionResult> {
        self.submitted()
            .into_iter()
            .map(|(role, result)| (role, result.clone()))
            .collect()
    }
}

/// Inbound verification request as accepted by the onboarding service.
#[derive(Debug, Clone, Default)]
pub struct VerificationRequest {
    pub student_id: Option<StudentId>,
    pub primary_id: Vec<u8>,
    pub secondary_id: Option<Vec<u8>>,
    pub income_proof: Vec<u8>,
    pub candidate: CandidateInfo,
}

/// Outcome returned to callers for every verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResult {
    pub verified: bool,
    pub student_id: Option<StudentId>,
    pub documents: BTreeMap<DocumentRole, ExtractionResult>,
    pub reason: String,
    pub name_match: bool,
    pub demo_fallback: bool,
    pub audit_location: String,
    pub audit_error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alert_errors: Vec<String>,
}

impl OnboardingResult {
    /// Structured result for an attempt that could not be carried through.
    pub fn failed(student_id: Option<StudentId>, message: impl fmt::Display) -> Self {
        Self {
            verified: false,
            student_id,
            documents: BTreeMap::new(),
            reason: format!("Verification failed: {message}"),
            name_match: false,
            demo_fallback: false,
            audit_location: String::new(),
            audit_error: String::new(),
            alert_errors: Vec::new(),
        }
    }
}
