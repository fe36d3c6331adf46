//! Classification of remote failures into user-facing notices.
//!
//! Classification is substring matching over the rendered error chain. The
//! backend does not return structured error codes, so this is the only signal
//! available; keep the pattern lists in sync with what the transport emits.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::validation::ValidationError;

static SERVICE_UNAVAILABLE: Lazy<Regex> = Lazy::new(|| {
    build_pattern(&[
        "canister is stopped",
        "canister not running",
        "canister has been stopped",
        "destination invalid",
        "canister rejected the message",
        "canister does not exist",
        "unable to reach the canister",
        "connection refused",
        "network error",
        "failed to fetch",
        "could not be reached",
    ])
});

static AUTHORIZATION: Lazy<Regex> = Lazy::new(|| {
    build_pattern(&[
        "unauthorized",
        "permission denied",
        "access denied",
        "not authorized",
        "forbidden",
    ])
});

fn build_pattern(needles: &[&str]) -> Regex {
    let alternation = needles
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    // Escaped literals only; compilation cannot fail.
    Regex::new(&format!("(?i){}", alternation)).expect("static error pattern")
}

pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "The backend service is currently unavailable or stopped. Please try again or contact support if the issue persists.";
pub const AUTHORIZATION_MESSAGE: &str = "An unexpected authorization error occurred. Please try again or contact support if the issue persists.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    ServiceUnavailable,
    Authorization,
    Unknown,
}

pub fn is_service_unavailable(message: &str) -> bool {
    SERVICE_UNAVAILABLE.is_match(message)
}

pub fn is_authorization_error(message: &str) -> bool {
    AUTHORIZATION.is_match(message)
}

/// Full chain, so transport causes wrapped in context still match.
fn chain_text(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}

pub fn classify(err: &anyhow::Error) -> ErrorClass {
    if err.downcast_ref::<ValidationError>().is_some() {
        return ErrorClass::Validation;
    }
    classify_message(&chain_text(err))
}

pub fn classify_message(message: &str) -> ErrorClass {
    if is_service_unavailable(message) {
        ErrorClass::ServiceUnavailable
    } else if is_authorization_error(message) {
        ErrorClass::Authorization
    } else {
        ErrorClass::Unknown
    }
}

/// How a failure reaches the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transient message.
    Toast(String),
    /// Persistent banner offering a manual retry.
    RetryBanner(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Toast(m) | Notice::RetryBanner(m) => m,
        }
    }
}

pub fn user_message(err: &anyhow::Error) -> String {
    match classify(err) {
        ErrorClass::ServiceUnavailable => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        ErrorClass::Authorization => AUTHORIZATION_MESSAGE.to_string(),
        ErrorClass::Validation | ErrorClass::Unknown => {
            let text = err.to_string();
            if text.trim().is_empty() {
                "An unexpected error occurred".to_string()
            } else {
                text
            }
        }
    }
}

pub fn notice_for(err: &anyhow::Error) -> Notice {
    match classify(err) {
        ErrorClass::ServiceUnavailable => Notice::RetryBanner(SERVICE_UNAVAILABLE_MESSAGE.to_string()),
        _ => Notice::Toast(user_message(err)),
    }
}
