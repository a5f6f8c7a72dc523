use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

/// Messages keyed by the input field they belong to. Shared by the JSON
/// error body and the re-rendered forms.
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq, Eq)]
pub(crate) struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub(crate) fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub(crate) fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Field-level view of a domain error, for the errors a user can fix.
    pub(crate) fn from_domain(err: &DomainError) -> Option<Self> {
        match err {
            DomainError::Validation { field, message } => Some(Self::single(*field, *message)),
            DomainError::AlreadyExists(resource) => Some(Self::single(
                *resource,
                format!("a user with that {resource} already exists"),
            )),
            _ => None,
        }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| default_message(&error.code));
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

fn default_message(code: &str) -> String {
    match code {
        "length" => "has an invalid length".to_string(),
        "email" => "enter a valid email address".to_string(),
        "must_match" => "the two password fields didn't match".to_string(),
        "required" => "this field is required".to_string(),
        other => format!("invalid value ({other})"),
    }
}
