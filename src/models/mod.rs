// src/models/mod.rs

pub mod code_snippet;
pub mod confidence;
pub mod lecture;
pub mod quiz;
pub mod quiz_result;
pub mod thread;
pub mod user;

use url::Url;
use validator::ValidationError;

use crate::config::SYNTAX_CHOICES;

/// Validates that a string is a correctly formatted URL.
pub(crate) fn validate_url_string(url: &str) -> Result<(), ValidationError> {
    if Url::parse(url).is_err() {
        return Err(ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Validates a syntax identifier against the supported highlighters.
pub(crate) fn validate_syntax(syntax: &str) -> Result<(), ValidationError> {
    if !SYNTAX_CHOICES.contains(&syntax) {
        return Err(ValidationError::new("unknown_syntax"));
    }
    Ok(())
}
