//! Forked-state call simulator.
//!
//! A [`Simulator`] pins the state of one block from a [`Blockchain`] and
//! layers a `CacheDB` overlay on top of it. Calls commit into the overlay,
//! static calls never do, and snapshots copy the overlay so it can be
//! restored later.
//!
//! Both kinds of call behave like a bare EVM call frame: the frame gets the
//! full gas the caller asks for, no intrinsic cost is charged against it and
//! the sender's nonce is left alone.

use alloy_primitives::{Address, Bytes, U256};
use parking_lot::Mutex;
use revm::context::BlockEnv;
use revm::database::{Cache, CacheDB};
use revm::context::result::ExecResultAndState;
use revm::database_interface::{Database, DatabaseCommit, DatabaseRef};
use revm::handler::{ExecuteEvm, MainBuilder};
use revm::inspector::InspectEvm;
use sibyl_core::{SibylError, SibylResult, SnapshotId, Transaction};
use sibyl_provider::env::{block_env, evm_context, evm_error, frame_tx_env, into_output};
use sibyl_provider::{Blockchain, RpcChain};

use crate::inspector::StaticCallInspector;

/// Execution context produced by [`Simulator::fork`].
struct ForkContext<S> {
    block_number: u64,
    block_env: BlockEnv,
    db: CacheDB<S>,
    /// Ascending by id.
    snapshots: Vec<(SnapshotId, Cache)>,
    next_snapshot: u64,
}

/// Runs calls against the state of a chosen block.
///
/// All operations lock one mutex, so a simulator can be shared between
/// threads but executes one operation at a time.
///
/// ```ignore
/// let sim = Simulator::new(chain);
/// sim.fork(19_000_000)?;
/// let out = sim.static_call(caller, pool, calldata, 1_000_000)?;
/// ```
pub struct Simulator<C: Blockchain> {
    chain: C,
    context: Mutex<Option<ForkContext<C::State>>>,
}

impl<C: Blockchain> Simulator<C> {
    /// Returns a bare simulator; [`fork`](Self::fork) must run before any call.
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            context: Mutex::new(None),
        }
    }

    /// The chain this simulator forks from.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Block number of the active fork, if any.
    pub fn forked_block(&self) -> Option<u64> {
        self.context.lock().as_ref().map(|ctx| ctx.block_number)
    }
}

impl Simulator<RpcChain> {
    /// Simulator over a JSON-RPC node. Must run on a multi-threaded runtime.
    pub async fn connect(rpc_url: &str) -> SibylResult<Self> {
        Ok(Self::new(RpcChain::connect(rpc_url).await?))
    }
}

impl<C> Simulator<C>
where
    C: Blockchain,
    <C::State as DatabaseRef>::Error: core::fmt::Debug,
{
    /// Replaces the execution context with the state of `block_number`.
    ///
    /// The block environment (number, timestamp, base fee) is taken from the
    /// chain head; only the state comes from `block_number`. Snapshots of the
    /// previous context are dropped.
    pub fn fork(&self, block_number: u64) -> SibylResult<()> {
        let mut guard = self.context.lock();

        let head = self.chain.head()?;
        let block = self
            .chain
            .block_by_number(block_number)?
            .ok_or(SibylError::BlockNotFound(block_number))?;
        let state = self
            .chain
            .state_at(&block)
            .map_err(|e| SibylError::StateUnavailable {
                block: block_number,
                reason: e.to_string(),
            })?;

        *guard = Some(ForkContext {
            block_number,
            block_env: block_env(&head),
            db: CacheDB::new(state),
            snapshots: Vec::new(),
            next_snapshot: 0,
        });

        tracing::info!(
            block_number,
            head = head.number,
            state_root = %block.state_root,
            "forked"
        );
        Ok(())
    }

    /// Forks at the current head and returns its number.
    pub fn fork_latest(&self) -> SibylResult<u64> {
        let head = self.chain.head()?;
        self.fork(head.number)?;
        Ok(head.number)
    }

    /// Executes a read-only call. State changes are rejected by the EVM and
    /// nothing is kept, even on success.
    pub fn static_call(
        &self,
        sender: Address,
        to: Address,
        input: Bytes,
        gas: u64,
    ) -> SibylResult<Bytes> {
        let tx = Transaction::call(sender, to, input, gas);
        let config = self.chain.config();

        let mut guard = self.context.lock();
        let ctx = guard.as_mut().ok_or(SibylError::NotForked)?;

        let tx_env = frame_tx_env(config, &tx)?;
        let mut evm = evm_context(&mut ctx.db, config, ctx.block_env.clone())
            .build_mainnet_with_inspector(StaticCallInspector);
        let result = evm.inspect_one_tx(tx_env).map_err(evm_error)?;

        tracing::debug!(
            %sender,
            %to,
            gas_used = result.gas_used(),
            success = result.is_success(),
            "static call"
        );
        into_output(result)
    }

    /// Executes a call and commits its state changes into the fork.
    pub fn call(
        &self,
        sender: Address,
        to: Address,
        input: Bytes,
        gas: u64,
        value: U256,
    ) -> SibylResult<Bytes> {
        let tx = Transaction::call(sender, to, input, gas).with_value(value);
        let config = self.chain.config();

        let mut guard = self.context.lock();
        let ctx = guard.as_mut().ok_or(SibylError::NotForked)?;

        let tx_env = frame_tx_env(config, &tx)?;
        let nonce = ctx
            .db
            .basic(sender)
            .map_err(evm_error)?
            .map(|info| info.nonce)
            .unwrap_or_default();

        let ExecResultAndState { result, mut state } = {
            let mut evm =
                evm_context(&mut ctx.db, config, ctx.block_env.clone()).build_mainnet();
            evm.transact(tx_env).map_err(evm_error)?
        };

        // Transaction validation bumps the caller's nonce; a call frame does not.
        if let Some(account) = state.get_mut(&sender) {
            account.info.nonce = nonce;
        }
        ctx.db.commit(state);

        tracing::debug!(
            %sender,
            %to,
            %value,
            gas_used = result.gas_used(),
            success = result.is_success(),
            "call"
        );
        into_output(result)
    }

    /// Records the current forked state.
    pub fn snapshot(&self) -> SibylResult<SnapshotId> {
        let mut guard = self.context.lock();
        let ctx = guard.as_mut().ok_or(SibylError::NotForked)?;

        let id = SnapshotId(ctx.next_snapshot);
        ctx.next_snapshot += 1;
        ctx.snapshots.push((id, ctx.db.cache.clone()));

        tracing::debug!(%id, depth = ctx.snapshots.len(), "snapshot taken");
        Ok(id)
    }

    /// Restores the state recorded by `id`.
    ///
    /// A snapshot can only be rolled back to once: `id` and every snapshot
    /// taken after it are discarded.
    pub fn rollback(&self, id: SnapshotId) -> SibylResult<()> {
        let mut guard = self.context.lock();
        let ctx = guard.as_mut().ok_or(SibylError::NotForked)?;

        let Some(pos) = ctx.snapshots.iter().position(|(sid, _)| *sid == id) else {
            tracing::warn!(%id, "no snapshot to roll back to");
            return Err(SibylError::UnknownSnapshot(id.0));
        };

        let (_, cache) = ctx.snapshots.remove(pos);
        ctx.snapshots.truncate(pos);
        ctx.db.cache = cache;

        tracing::debug!(%id, depth = ctx.snapshots.len(), "rolled back");
        Ok(())
    }
}
