//! Stock field validators

use std::sync::OnceLock;

use regex::Regex;

use super::Validator;

/// Rejects blank values
pub fn not_empty(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &str| value.trim().is_empty().then(|| message.clone()))
}

/// Rejects values that do not look like an email address
pub fn email(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &str| (!email_pattern().is_match(value.trim())).then(|| message.clone()))
}

/// Rejects values shorter than `min` characters
pub fn min_length(min: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &str| (value.chars().count() < min).then(|| message.clone()))
}

/// First error among `validators`, in order
pub fn all_of(validators: Vec<Validator>) -> Validator {
    Box::new(move |value: &str| validators.iter().find_map(|validate| validate(value)))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}
