//! Domain models, shared types, and error definitions.
//!
//! Foundation crate -- no async, I/O or EVM dependencies.

pub mod error;
pub mod types;

pub use error::{SibylError, SibylResult};
pub use types::{BlockHeader, SnapshotId, Transaction};
