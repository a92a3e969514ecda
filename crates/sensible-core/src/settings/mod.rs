//! The settings domain: schema, defaults, validation and document codec.
//!
//! Nothing in this module performs I/O.  A caller hands [`codec::decode`] the
//! text of a document and gets back a [`model::Settings`] that has already
//! passed [`model::Settings::validate`], or a [`error::SettingsError`] that
//! names what went wrong.

pub mod codec;
pub mod defaults;
pub mod error;
pub mod model;
pub mod validate;
