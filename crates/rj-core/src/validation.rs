//! Input validation and sanitization for journal entries.

use crate::error::ValidationErrors;
use crate::models::JournalEntryInput;
use chrono::NaiveDate;

pub const MAX_TEXT_LENGTH: usize = 10_000;
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sanitized, typed representation of a candidate entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedEntry {
    pub date: NaiveDate,
    pub rating: Option<f64>,
    pub liked: String,
    pub didnt_like: String,
    pub other_thoughts: String,
    pub tomorrow_plans: String,
}

fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn max_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Strips control characters (keeping `\t`, `\n`, `\r`), trims and caps the length.
pub fn sanitize_text(text: &str) -> String {
    strip_controls(text)
        .trim()
        .chars()
        .take(MAX_TEXT_LENGTH)
        .collect()
}

fn strip_controls(text: &str) -> String {
    text.chars().filter(|c| !is_stripped_control(*c)).collect()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Clamps to [`MIN_RATING`, `MAX_RATING`] and rounds to one decimal.
pub fn normalize_rating(rating: Option<f64>) -> Option<f64> {
    let value = rating?;
    if value.is_nan() {
        return None;
    }
    let clamped = value.clamp(MIN_RATING, MAX_RATING);
    Some((clamped * 10.0).round() / 10.0)
}

pub fn validate_entry(entry: &JournalEntryInput) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if let Some(rating) = entry.rating {
        if rating.is_nan() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
            errors.push(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            ));
        }
    }

    if entry.date.trim().is_empty() {
        errors.push("Date is required".to_string());
    } else {
        match parse_date(&entry.date) {
            None => errors.push("Invalid date selected".to_string()),
            Some(date) if date < min_date() || date > max_date() => {
                errors.push("Date must be between 1900 and 2100".to_string())
            }
            Some(_) => {}
        }
    }

    for (name, value) in entry.text_fields() {
        let len = strip_controls(value).trim().chars().count();
        if len > MAX_TEXT_LENGTH {
            errors.push(format!(
                "{} is too long (max {} characters)",
                name, MAX_TEXT_LENGTH
            ));
        }
    }

    let has_text = entry
        .text_fields()
        .iter()
        .any(|(_, value)| !sanitize_text(value).is_empty());
    if !has_text && entry.rating.is_none() {
        errors.push("Please fill in at least one field".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Validates, then produces the sanitized form that is sent to the store.
pub fn sanitize_entry(entry: &JournalEntryInput) -> Result<SanitizedEntry, ValidationErrors> {
    validate_entry(entry)?;
    let date = parse_date(&entry.date)
        .ok_or_else(|| ValidationErrors(vec!["Invalid date selected".to_string()]))?;
    Ok(SanitizedEntry {
        date,
        rating: normalize_rating(entry.rating),
        liked: sanitize_text(&entry.liked),
        didnt_like: sanitize_text(&entry.didnt_like),
        other_thoughts: sanitize_text(&entry.other_thoughts),
        tomorrow_plans: sanitize_text(&entry.tomorrow_plans),
    })
}
