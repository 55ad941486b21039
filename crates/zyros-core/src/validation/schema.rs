//! Validation schemas for the forms the client submits

use super::errors::{ValidationErrors, ValidationResult};
use super::rules::FieldConstraints;
use std::sync::OnceLock;

pub(crate) const LANGS: &[&str] = &["fa", "en"];
pub(crate) const POST_TYPES: &[&str] = &["post", "article"];

/// Read access to the named string fields of an input
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&str>;
}

/// Inputs that know which schema applies to them
pub trait Validate {
    fn validate(&self) -> ValidationResult;
}

/// Constraints for every field of one form
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldConstraints>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add constraints for a field
    pub fn field(mut self, constraints: FieldConstraints) -> Self {
        self.fields.push(constraints);
        self
    }

    /// Evaluate every field; collects one error per failing field
    pub fn validate(&self, source: &dyn FieldSource) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        for constraints in &self.fields {
            if let Err(error) = constraints.check(source.field(constraints.field)) {
                errors.push(error);
            }
        }
        errors.into_result()
    }
}

/// Login and registration: username min 3, password min 6
pub fn credentials_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new()
            .field(FieldConstraints::new("username").required().min_length(3))
            .field(FieldConstraints::new("password").required().min_length(6))
    })
}

/// Short posts
pub fn post_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        content_fields()
            .field(FieldConstraints::new("type").required().one_of(POST_TYPES))
    })
}

/// Long-form articles; the type is implied by the endpoint
pub fn article_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(content_fields)
}

fn content_fields() -> Schema {
    Schema::new()
        .field(FieldConstraints::new("title").required().min_length(3))
        .field(FieldConstraints::new("content").required().min_length(10))
        .field(FieldConstraints::new("lang").required().one_of(LANGS))
        .field(FieldConstraints::new("imageUrl").url())
}
