//! Structured validation errors

use serde::Serialize;

/// Validation result
pub type ValidationResult = Result<(), ValidationErrors>;

/// Error for a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the form
    pub field: String,

    /// Error code
    pub code: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create new field error
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create "required" error
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "required", "Field is required")
    }

    /// Create "min_length" error
    pub fn min_length(field: impl Into<String>, min: usize) -> Self {
        Self::new(
            field,
            "min_length",
            format!("Must be at least {} characters", min),
        )
    }

    /// Create "url" error
    pub fn invalid_url(field: impl Into<String>) -> Self {
        Self::new(field, "url", "Must be a valid http(s) URL")
    }

    /// Create "one_of" error
    pub fn one_of(field: impl Into<String>, allowed: &[&str]) -> Self {
        Self::new(
            field,
            "one_of",
            format!("Must be one of: {}", allowed.join(", ")),
        )
    }
}

/// All field errors collected while validating one input, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field error
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Errors reported for one field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Names of the fields with errors, without duplicates
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for error in &self.errors {
            if !fields.contains(&error.field) {
                fields.push(error.field.clone());
            }
        }
        fields
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> ValidationResult {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
