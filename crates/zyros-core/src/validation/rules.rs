//! Validation rules for form fields

use super::errors::FieldError;
use url::Url;

/// A single constraint on a string field.
///
/// Every rule except [`Rule::Required`] passes on an absent or empty value,
/// so optional fields are expressed by leaving `Required` out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Value must be present and not blank
    Required,

    /// Minimum length in characters (not bytes; titles are often Persian)
    MinLength(usize),

    /// Absolute http or https URL
    Url,

    /// Value must be one of the listed options
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Check a value against this rule
    pub fn check(&self, field: &str, value: Option<&str>) -> Result<(), FieldError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        match (self, value) {
            (Rule::Required, None) => Err(FieldError::required(field)),
            (Rule::Required, Some(_)) | (_, None) => Ok(()),

            (Rule::MinLength(min), Some(v)) => {
                if v.chars().count() < *min {
                    Err(FieldError::min_length(field, *min))
                } else {
                    Ok(())
                }
            }

            (Rule::Url, Some(v)) => match Url::parse(v) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
                _ => Err(FieldError::invalid_url(field)),
            },

            (Rule::OneOf(allowed), Some(v)) => {
                if allowed.contains(&v) {
                    Ok(())
                } else {
                    Err(FieldError::one_of(field, allowed))
                }
            }
        }
    }

    /// Rule name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::MinLength(_) => "min_length",
            Rule::Url => "url",
            Rule::OneOf(_) => "one_of",
        }
    }
}

/// Ordered constraints for one named field
#[derive(Debug, Clone)]
pub struct FieldConstraints {
    pub field: &'static str,
    pub rules: Vec<Rule>,
}

impl FieldConstraints {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.rules.push(Rule::Required);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.rules.push(Rule::MinLength(min));
        self
    }

    pub fn url(mut self) -> Self {
        self.rules.push(Rule::Url);
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.rules.push(Rule::OneOf(allowed));
        self
    }

    /// First failing rule wins; one message per field
    pub fn check(&self, value: Option<&str>) -> Result<(), FieldError> {
        self.rules
            .iter()
            .try_for_each(|rule| rule.check(self.field, value))
    }
}
