use crate::constants::{ERR_TITLE_REQUIRED, ERR_TITLE_TOO_LONG, MAX_TITLE_LEN};

/// A single failed form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field errors collected while validating a submitted form
///
/// Validation failures are recoverable: the handler re-renders the form with
/// the submitted values and these messages instead of returning an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

/// Validate a required title, returning the trimmed value
pub fn validate_title(title: &str, errors: &mut ValidationErrors) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        errors.add("title", ERR_TITLE_REQUIRED);
    } else if trimmed.chars().count() > MAX_TITLE_LEN {
        errors.add("title", ERR_TITLE_TOO_LONG);
    }
    trimmed.to_string()
}
