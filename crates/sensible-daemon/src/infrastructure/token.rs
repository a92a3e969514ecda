//! Random API token provider.
//!
//! The API credential written into a freshly generated document comes from a
//! [`TokenProvider`].  Production code uses [`UuidTokenProvider`]; tests swap
//! in a mock so the generated document is predictable.

use uuid::Uuid;

/// Source of fresh opaque API tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenProvider: Send + Sync {
    /// Returns a new token.  Consecutive calls must not repeat.
    fn new_token(&self) -> String;
}

/// Produces random version-4 UUIDs in their canonical hyphenated form.
///
/// A v4 UUID carries 122 random bits, which is plenty for a bearer credential
/// on a local control API, and the 36-character text form is easy to copy
/// into a client.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenProvider;

impl TokenProvider for UuidTokenProvider {
    fn new_token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
