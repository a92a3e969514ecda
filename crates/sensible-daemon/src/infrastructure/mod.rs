//! Infrastructure layer: everything that touches the operating system.
//!
//! - `fs` – directory creation and file copy helpers.
//! - `token` – the random API token provider.
//! - `storage` – the settings document on disk and the bootstrap operations
//!   that reconcile it with the in-memory value.

pub mod fs;
pub mod storage;
pub mod token;
