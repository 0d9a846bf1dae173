use std::num::IntErrorKind;

use chrono::{DateTime, Datelike, NaiveDate};

use super::super::domain::DocumentRole;
use super::config::EligibilityConfig;
use super::policy::ReviewReason;
use super::DecisionInput;

/// Walk the guards in order and return the first one that fails.
pub(crate) fn first_failing_guard(
    input: &DecisionInput<'_>,
    config: &EligibilityConfig,
    today: NaiveDate,
) -> Option<ReviewReason> {
    if !input.name_match {
        return Some(ReviewReason::NameMismatch);
    }

    if !input.primary_id.meets(config.confidence_threshold) {
        return Some(ReviewReason::LowConfidence(DocumentRole::PrimaryId));
    }

    if !input.income.meets(config.confidence_threshold) {
        return Some(ReviewReason::LowConfidence(DocumentRole::Income));
    }

    if let Some(secondary) = input.secondary_id {
        if !secondary.meets(config.confidence_threshold) {
            return Some(ReviewReason::LowConfidence(DocumentRole::SecondaryId));
        }
    }

    let age = match input
        .primary_id
        .date_of_birth
        .as_deref()
        .and_then(parse_date_of_birth)
        .and_then(|dob| age_on(dob, today))
    {
        Some(age) => age,
        None => return Some(ReviewReason::AgeUndetermined),
    };

    if age < config.min_age || age > config.max_age {
        return Some(ReviewReason::AgeOutOfBounds { age });
    }

    if let Some(declared) = input.candidate.declared_age_range() {
        if !declared.contains(age) {
            return Some(ReviewReason::AgeRangeMismatch { age, declared });
        }
    }

    let income = match input.income.declared_income.as_deref().and_then(parse_income) {
        Some(income) => income,
        None => return Some(ReviewReason::IncomeUndetermined),
    };

    if income > config.income_ceiling {
        return Some(ReviewReason::IncomeAboveCeiling { income });
    }

    None
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

pub(crate) fn parse_date_of_birth(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Whole years elapsed between `dob` and `today`; `None` for a birth date in the future.
pub(crate) fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Digits only; thousands separators and currency symbols are dropped. Amounts too large for
/// `u64` saturate so they still compare above any ceiling.
pub(crate) fn parse_income(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse::<u64>() {
        Ok(amount) => Some(amount),
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => Some(u64::MAX),
        Err(_) => None,
    }
}
