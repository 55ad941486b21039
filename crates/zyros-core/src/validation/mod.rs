//! Client-side validation for form input
//!
//! Constraints are plain structs evaluated against the input; the result is a
//! structured list of field errors rather than a panic or an early return.
//! Input that fails validation never reaches the transport.

mod errors;
mod forms;
mod rules;
mod schema;

pub use errors::{FieldError, ValidationErrors, ValidationResult};
pub use rules::{FieldConstraints, Rule};
pub use schema::{
    FieldSource, Schema, Validate, article_schema, credentials_schema, post_schema,
};
