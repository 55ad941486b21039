//! Error types for the Zyros client
//!
//! Every fallible operation in this crate returns [`ZyrosResult`]. Errors carry
//! the HTTP status the API answered with (when there was one), so callers can
//! decide how to present them through [`ZyrosError::user_facing`]:
//! - validation problems stay inline next to the offending field
//! - 401 responses reset the session and redirect to the login page
//! - network and server failures become transient notifications

mod constructors;
mod conversions;
mod types;
mod unified_error;
mod user_messages;

pub use types::{OptionExt, ResultExt, UnifiedError, ZyrosError, ZyrosResult};
pub use user_messages::{ErrorCategory, Presentation, UserFacing};
