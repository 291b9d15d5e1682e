//! Domain types for the Sibyl call simulator.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The subset of a block header needed to fork state and build a block
/// environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub state_root: B256,
    pub timestamp: u64,
    pub gas_limit: u64,
    /// `None` before London.
    pub base_fee: Option<u64>,
    pub beneficiary: Address,
    pub difficulty: U256,
    /// Post-merge this carries `prevrandao`.
    pub mix_hash: Option<B256>,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Unsigned message call or contract creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    /// `None` creates a contract from `input`.
    pub to: Option<Address>,
    /// `Bytes` (ref-counted) so callers can reuse payloads across calls.
    pub input: Bytes,
    pub value: U256,
    pub gas: u64,
}

impl Transaction {
    pub fn call(from: Address, to: Address, input: Bytes, gas: u64) -> Self {
        Self {
            from,
            to: Some(to),
            input,
            value: U256::ZERO,
            gas,
        }
    }

    pub fn create(from: Address, init_code: Bytes, gas: u64) -> Self {
        Self {
            from,
            to: None,
            input: init_code,
            value: U256::ZERO,
            gas,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Handle to a point-in-time copy of forked state.
///
/// Ids grow monotonically within one fork and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
