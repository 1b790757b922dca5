//! Form-field validation shared by every input type.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::{self, DEFAULT_CURRENCY, MAX_AMOUNT};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("{field} must be at most {}", money::format_amount(MAX_AMOUNT))]
    TooLarge { field: &'static str },
    #[error("{field} is not a valid email address")]
    InvalidEmail { field: &'static str },
    #[error("{field} must be a three-letter currency code")]
    InvalidCurrency { field: &'static str },
    #[error("end_date must not precede start_date")]
    DateRange,
    #[error("quantity must be between {min} and {max}")]
    Quantity { min: i32, max: i32 },
    #[error("an available variant must have a price")]
    AvailableWithoutPrice,
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    /// The form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::TooLarge { field }
            | ValidationError::InvalidEmail { field }
            | ValidationError::InvalidCurrency { field }
            | ValidationError::Invalid { field, .. } => field,
            ValidationError::DateRange => "end_date",
            ValidationError::Quantity { .. } => "quantity",
            ValidationError::AvailableWithoutPrice => "price",
        }
    }
}

/// Trim a mandatory text field and enforce its length limit.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    bounded(field, trimmed, max)
}

/// Trim an optional text field; blank input becomes an empty string.
pub fn optional_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    bounded(field, value.trim(), max)
}

/// Normalize an optional URL-ish field: blank becomes `None`.
pub fn optional_url(field: &'static str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) => bounded(field, url, 500).map(Some),
    }
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

pub fn email(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required_text(field, value, 254)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidEmail { field });
    }
    Ok(value.to_ascii_lowercase())
}

/// Three ASCII letters, upper-cased. Missing input falls back to the default.
pub fn currency(field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_CURRENCY.to_string()),
        Some(code) => code,
    };
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidCurrency { field });
    }
    Ok(value.to_ascii_uppercase())
}

/// A price or measurement: rounded to cents, between zero and [`MAX_AMOUNT`].
pub fn amount(field: &'static str, value: Option<Decimal>) -> Result<Option<Decimal>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let rounded = money::round_cents(value);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        return Err(ValidationError::Negative { field });
    }
    if rounded > MAX_AMOUNT {
        return Err(ValidationError::TooLarge { field });
    }
    Ok(Some(rounded))
}
