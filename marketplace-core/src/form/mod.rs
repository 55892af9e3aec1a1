//! Field state plus a validation gate for input screens
//!
//! Errors are derived from the current values on every read; nothing is
//! cached, so `set_field` never computes or stores an error.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub mod validators;

pub use validators::{all_of, email, min_length, not_empty};

/// Pure check of one value: `Some(message)` when it is rejected
pub type Validator = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.field == field).map(|f| f.message.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.fields.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

#[derive(Default)]
pub struct Form {
    values: BTreeMap<String, String>,
    validators: BTreeMap<String, Validator>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with its initial value
    pub fn with_field(mut self, name: impl Into<String>, initial: impl Into<String>) -> Self {
        self.values.insert(name.into(), initial.into());
        self
    }

    /// Attach a validator to a field, declaring it empty if unknown
    pub fn with_validator(mut self, name: impl Into<String>, validator: Validator) -> Self {
        let name = name.into();
        self.values.entry(name.clone()).or_default();
        self.validators.insert(name, validator);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Current error of one field
    pub fn error(&self, name: &str) -> Option<String> {
        let validator = self.validators.get(name)?;
        validator(self.field(name).unwrap_or_default())
    }

    pub fn has_errors(&self) -> bool {
        self.validators.keys().any(|name| self.error(name).is_some())
    }

    /// All current errors, ordered by field name
    pub fn errors(&self) -> Vec<FieldError> {
        self.validators
            .keys()
            .filter_map(|name| {
                self.error(name).map(|message| FieldError { field: name.clone(), message })
            })
            .collect()
    }

    /// The field values, or every failing field
    pub fn validate(&self) -> Result<&BTreeMap<String, String>, ValidationError> {
        let fields = self.errors();
        if fields.is_empty() {
            Ok(&self.values)
        } else {
            Err(ValidationError { fields })
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("fields", &self.values.keys().collect::<Vec<_>>())
            .field("validated", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}
