//! Centralized error types for the Sibyl workspace.

use alloy_primitives::Bytes;
use thiserror::Error;

/// Top-level error enum. Variants map to subsystems.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SibylError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Block {0} not found")]
    BlockNotFound(u64),

    #[error("failed to read blockchain state for block {block}: {reason}")]
    StateUnavailable { block: u64, reason: String },

    #[error("Simulator has no forked state; call fork first")]
    NotForked,

    #[error("Unknown snapshot id {0}")]
    UnknownSnapshot(u64),

    /// The call reverted. Carries the raw revert data.
    #[error("Execution reverted: {0}")]
    Reverted(Bytes),

    #[error("Execution halted: {0}")]
    Halted(String),

    /// Error raised by the EVM engine before or outside execution
    /// (invalid transaction, database failure).
    #[error("EVM error: {0}")]
    Evm(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SibylResult<T> = Result<T, SibylError>;
