//! Authentication state for the client
//!
//! Provides:
//! - Bearer token decoding (claims only; the API verifies signatures)
//! - Token storage behind an injectable trait
//! - The session store: who is logged in, derived from the stored token

mod session;
mod storage;
mod token;

pub use session::{Identity, Session, SessionState, SessionStore};
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage, TokenStorageError};
pub use token::{TokenClaims, decode_token};

#[cfg(test)]
pub(crate) use token::tests::make_token;
