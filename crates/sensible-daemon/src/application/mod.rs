//! Application layer: use cases built on the storage infrastructure.
//!
//! - `bootstrap` – one-shot configuration bootstrap at daemon startup and the
//!   process-wide read-only settings handle.

pub mod bootstrap;
