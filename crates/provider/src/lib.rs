//! Blockchain handles the simulator forks from.
//!
//! A [`Blockchain`] exposes headers and read-only state per block. Two
//! backends ship here: [`InMemoryChain`] for local tests and [`RpcChain`]
//! for forking a live node.

pub mod config;
pub mod env;
pub mod memory;
pub mod rpc;

use revm::database_interface::DatabaseRef;
use sibyl_core::{BlockHeader, SibylResult};
use std::sync::Arc;

pub use config::ChainConfig;
pub use memory::{GenesisAccount, GenesisAlloc, InMemoryChain, MemoryState, Receipt};
pub use rpc::{RpcChain, RpcState};

/// Source of block headers and historical state.
pub trait Blockchain: Send + Sync {
    /// Read-only view of the state committed by one block.
    type State: DatabaseRef;

    fn config(&self) -> &ChainConfig;

    /// The current head of the chain.
    fn head(&self) -> SibylResult<BlockHeader>;

    fn block_by_number(&self, number: u64) -> SibylResult<Option<BlockHeader>>;

    /// Opens the state committed by `header`.
    fn state_at(&self, header: &BlockHeader) -> SibylResult<Self::State>;
}

impl<T: Blockchain + ?Sized> Blockchain for Arc<T> {
    type State = T::State;

    fn config(&self) -> &ChainConfig {
        (**self).config()
    }

    fn head(&self) -> SibylResult<BlockHeader> {
        (**self).head()
    }

    fn block_by_number(&self, number: u64) -> SibylResult<Option<BlockHeader>> {
        (**self).block_by_number(number)
    }

    fn state_at(&self, header: &BlockHeader) -> SibylResult<Self::State> {
        (**self).state_at(header)
    }
}
