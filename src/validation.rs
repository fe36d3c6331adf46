//! Client-side checks that run before anything is sent to the backend.
use chrono::NaiveDate;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("URL is required")]
    UrlRequired,
    #[error("URL must start with http:// or https://")]
    MissingScheme,
    #[error("Invalid URL format")]
    InvalidUrl,
    #[error("{field}: Must be a valid number")]
    NotANumber { field: &'static str },
    #[error("{field}: Cannot be negative")]
    Negative { field: &'static str },
    #[error("{field}: Must be a whole number")]
    NotWhole { field: &'static str },
    #[error("{field}: Invalid date, expected YYYY-MM-DD")]
    InvalidDate { field: &'static str },
}

/// Accepts any absolute URL. A bare host such as `example.com` gets the
/// scheme-specific message; anything else that fails to parse is malformed.
pub fn validate_url(input: &str) -> Result<Url, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::UrlRequired);
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Ok(url);
    }
    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    if !has_scheme && Url::parse(&format!("https://{}", trimmed)).is_ok() {
        return Err(ValidationError::MissingScheme);
    }
    Err(ValidationError::InvalidUrl)
}

const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Parses a count field. Blank input counts as zero, like an empty number box.
pub fn validate_non_negative(field: &'static str, input: &str) -> Result<u64, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber { field })?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field });
    }
    // "2.0" or "1e3" still name an exact count below 2^53.
    if value.fract() == 0.0 && value <= MAX_EXACT_FLOAT {
        return Ok(value as u64);
    }
    Err(ValidationError::NotWhole { field })
}

pub fn require(field: &'static str, input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(trimmed.to_string())
}

pub fn validate_date(field: &'static str, input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate { field })
}
