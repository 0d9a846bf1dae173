//! Extraction gateway seam and interpretation of the extraction service's analyze response.

use serde_json::Value;
use tracing::warn;

use super::domain::{DocumentClass, ExtractionResult};

/// Uniform access to the structured-document extraction service.
///
/// Implementations never fail outward: transport, authentication, timeout and parse problems
/// all surface as [`ExtractionResult::failed`].
pub trait ExtractionGateway: Send + Sync {
    fn analyze(&self, document: &[u8], class: DocumentClass) -> ExtractionResult;
}

/// Gateway used when no extraction endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGateway;

impl ExtractionGateway for UnconfiguredGateway {
    fn analyze(&self, _document: &[u8], class: DocumentClass) -> ExtractionResult {
        warn!(
            model = class.model_id(),
            "document extraction endpoint not configured; returning empty result"
        );
        ExtractionResult::failed()
    }
}

/// Treats the uploaded bytes as an analyze response already produced by the extraction service.
///
/// Used for offline fixtures, the CLI and stakeholder demos.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeResponseGateway;

impl ExtractionGateway for AnalyzeResponseGateway {
    fn analyze(&self, document: &[u8], class: DocumentClass) -> ExtractionResult {
        match serde_json::from_slice::<Value>(document) {
            Ok(root) => interpret_analyze_response(&root, class),
            Err(error) => {
                warn!(model = class.model_id(), %error, "analyze response is not valid JSON");
                ExtractionResult::failed()
            }
        }
    }
}

/// Map the first analyzed document's fields onto an [`ExtractionResult`].
pub fn interpret_analyze_response(root: &Value, class: DocumentClass) -> ExtractionResult {
    let root = root.get("analyzeResult").unwrap_or(root);

    let Some(fields) = root
        .get("documents")
        .and_then(Value::as_array)
        .and_then(|documents| documents.first())
        .and_then(|document| document.get("fields"))
    else {
        warn!(
            model = class.model_id(),
            "analyze response contained no documents"
        );
        return ExtractionResult::failed();
    };

    let mut name = field_text(fields, "FullName", "content");
    if name.trim().is_empty() {
        let first = field_text(fields, "FirstName", "content");
        let last = field_text(fields, "LastName", "content");
        name = format!("{first} {last}").trim().to_string();
    }

    let date_of_birth = Some(field_text(fields, "DateOfBirth", "valueDate"));
    let id_number = field_text(fields, "DocumentNumber", "content");
    let declared_income = match class {
        DocumentClass::IncomeProof => Some(field_text(fields, "TotalIncome", "content")),
        DocumentClass::PrimaryId | DocumentClass::SecondaryId => None,
    };

    let mut confidence = field_confidence(fields, "DocumentNumber");
    if confidence == 0.0 {
        confidence = field_confidence(fields, "FullName");
    }

    ExtractionResult::new(name, date_of_birth, id_number, declared_income, confidence)
}

fn field_text(fields: &Value, key: &str, value_key: &str) -> String {
    match fields.get(key).and_then(|field| field.get(value_key)) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn field_confidence(fields: &Value, key: &str) -> f64 {
    fields
        .get(key)
        .and_then(|field| field.get("confidence"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}
