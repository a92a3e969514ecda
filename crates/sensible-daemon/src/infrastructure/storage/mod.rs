//! Storage infrastructure: settings document persistence.
//!
//! This module provides a thin adapter between the daemon and the file
//! system.  It handles:
//!
//! - Resolving where the document, its backup, the script directory and the
//!   log directory live ([`StoreLayout`]).
//! - Creating the default document on first run and loading it afterwards
//!   ([`ConfigStore`]).
//! - Mapping every failure to a [`ConfigError`] that names the path involved.

pub mod config_store;
pub mod error;
pub mod layout;

pub use config_store::ConfigStore;
pub use error::ConfigError;
pub use layout::StoreLayout;
