//! In-memory blockchain for local simulation and tests.
//!
//! Starts from a genesis allocation, mines transactions into a pending
//! `CacheDB<EmptyDB>` and seals it into numbered blocks on [`commit`].
//! Every sealed state is kept, keyed by its state root, so the simulator can
//! fork from any historical block.
//!
//! ```ignore
//! let mut chain = InMemoryChain::new(ChainConfig::dev(), alloc);
//! let receipt = chain.transact(&Transaction::create(deployer, init_code, 1_000_000))?;
//! chain.commit();
//! ```
//!
//! [`commit`]: InMemoryChain::commit

use crate::env::{block_env, evm_context, evm_error, tx_env};
use crate::{Blockchain, ChainConfig};
use alloy_primitives::{keccak256, Address, Bytes, Keccak256, B256, U256};
use revm::context::result::{ExecutionResult, Output};
use revm::database::{AccountState, CacheDB, EmptyDB};
use revm::handler::MainBuilder;
use revm::state::{AccountInfo, Bytecode};
use revm::ExecuteCommitEvm;
use serde::{Deserialize, Serialize};
use sibyl_core::{BlockHeader, SibylError, SibylResult, Transaction};
use std::collections::{BTreeMap, HashMap};

/// Default block gas limit for locally sealed blocks.
pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;

/// Seconds between consecutive local blocks.
const BLOCK_TIME: u64 = 12;

/// Committed state of one local block. Clone-able, network-free.
pub type MemoryState = CacheDB<EmptyDB>;

/// Initial state of one account, in the shape of a geth genesis `alloc` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub balance: U256,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub code: Option<Bytes>,
    #[serde(default)]
    pub storage: BTreeMap<U256, U256>,
}

impl GenesisAccount {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }
}

pub type GenesisAlloc = BTreeMap<Address, GenesisAccount>;

/// Outcome of a transaction mined into the pending block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Number of the block the transaction lands in once committed.
    pub block_number: u64,
    pub success: bool,
    pub gas_used: u64,
    /// Return data, revert data, or deployed code for creations.
    pub output: Bytes,
    pub contract_address: Option<Address>,
}

/// A single-node chain held entirely in memory.
pub struct InMemoryChain {
    config: ChainConfig,
    gas_limit: u64,
    headers: Vec<BlockHeader>,
    tip: BlockHeader,
    states: HashMap<B256, MemoryState>,
    pending: MemoryState,
}

impl InMemoryChain {
    /// Builds block 0 from `alloc`.
    pub fn new(config: ChainConfig, alloc: GenesisAlloc) -> Self {
        let mut state = CacheDB::new(EmptyDB::new());
        for (address, account) in alloc {
            let bytecode = account.code.map(Bytecode::new_raw).unwrap_or_default();
            let code_hash = bytecode.hash_slow();
            state.insert_account_info(
                address,
                AccountInfo::new(account.balance, account.nonce, code_hash, bytecode),
            );
            for (slot, value) in account.storage {
                // `EmptyDB` reads cannot fail.
                match state.insert_account_storage(address, slot, value) {
                    Ok(()) => {}
                    Err(never) => match never {},
                }
            }
        }

        let state_root = state_commitment(&state);
        let genesis = BlockHeader {
            number: 0,
            hash: seal_hash(B256::ZERO, 0, state_root),
            parent_hash: B256::ZERO,
            state_root,
            timestamp: 0,
            gas_limit: DEFAULT_GAS_LIMIT,
            base_fee: Some(0),
            beneficiary: Address::ZERO,
            difficulty: U256::ZERO,
            mix_hash: Some(B256::ZERO),
        };

        tracing::debug!(%state_root, chain_id = config.chain_id, "local genesis");

        let mut states = HashMap::new();
        states.insert(state_root, state.clone());

        Self {
            config,
            gas_limit: DEFAULT_GAS_LIMIT,
            headers: vec![genesis.clone()],
            tip: genesis,
            states,
            pending: state,
        }
    }

    /// Overrides the block gas limit (default: 30M) for the current head and
    /// every block sealed afterwards.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self.tip.gas_limit = gas_limit;
        if let Some(last) = self.headers.last_mut() {
            last.gas_limit = gas_limit;
        }
        self
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Executes `tx` against the pending block and keeps its state changes.
    ///
    /// Reverted transactions still produce a receipt with `success == false`;
    /// only transactions the EVM refuses to run return an error.
    pub fn transact(&mut self, tx: &Transaction) -> SibylResult<Receipt> {
        if tx.gas > self.gas_limit {
            return Err(SibylError::InvalidInput(format!(
                "gas {} exceeds block gas limit {}",
                tx.gas, self.gas_limit
            )));
        }

        let block_number = self.tip.number + 1;
        let mut next = self.tip.clone();
        next.number = block_number;
        next.timestamp += BLOCK_TIME;
        next.gas_limit = self.gas_limit;

        let tx_env = tx_env(&self.config, tx)?;
        let mut evm = evm_context(&mut self.pending, &self.config, block_env(&next)).build_mainnet();
        let result = evm.transact_commit(tx_env).map_err(evm_error)?;

        let contract_address = match &result {
            ExecutionResult::Success {
                output: Output::Create(_, address),
                ..
            } => *address,
            _ => None,
        };

        let receipt = Receipt {
            block_number,
            success: result.is_success(),
            gas_used: result.gas_used(),
            output: result.output().cloned().unwrap_or_default(),
            contract_address,
        };

        tracing::debug!(
            block_number,
            from = %tx.from,
            success = receipt.success,
            gas_used = receipt.gas_used,
            "local tx mined"
        );
        Ok(receipt)
    }

    /// Seals the pending state into a new block and returns its header.
    pub fn commit(&mut self) -> BlockHeader {
        let state_root = state_commitment(&self.pending);
        let number = self.tip.number + 1;
        let header = BlockHeader {
            number,
            hash: seal_hash(self.tip.hash, number, state_root),
            parent_hash: self.tip.hash,
            state_root,
            timestamp: self.tip.timestamp + BLOCK_TIME,
            gas_limit: self.gas_limit,
            base_fee: self.tip.base_fee,
            beneficiary: self.tip.beneficiary,
            difficulty: U256::ZERO,
            mix_hash: Some(keccak256(state_root)),
        };

        self.states.insert(state_root, self.pending.clone());
        self.headers.push(header.clone());
        self.tip = header.clone();

        tracing::debug!(number, hash = %header.hash, %state_root, "local block sealed");
        header
    }
}

impl Blockchain for InMemoryChain {
    type State = MemoryState;

    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn head(&self) -> SibylResult<BlockHeader> {
        Ok(self.tip.clone())
    }

    fn block_by_number(&self, number: u64) -> SibylResult<Option<BlockHeader>> {
        Ok(usize::try_from(number)
            .ok()
            .and_then(|idx| self.headers.get(idx))
            .cloned())
    }

    fn state_at(&self, header: &BlockHeader) -> SibylResult<MemoryState> {
        self.states.get(&header.state_root).cloned().ok_or_else(|| {
            SibylError::Provider(format!(
                "missing state root {} for block {}",
                header.state_root, header.number
            ))
        })
    }
}

/// Deterministic digest over every live account, its code hash and its
/// non-zero storage, in address/slot order.
fn state_commitment(state: &MemoryState) -> B256 {
    let mut accounts: Vec<_> = state
        .cache
        .accounts
        .iter()
        .filter(|(_, acc)| !matches!(acc.account_state, AccountState::NotExisting))
        .filter(|(_, acc)| !acc.info.is_empty() || acc.storage.values().any(|v| !v.is_zero()))
        .collect();
    accounts.sort_unstable_by_key(|(address, _)| **address);

    let mut hasher = Keccak256::new();
    for (address, acc) in accounts {
        hasher.update(address);
        hasher.update(acc.info.balance.to_be_bytes::<32>());
        hasher.update(acc.info.nonce.to_be_bytes());
        hasher.update(acc.info.code_hash);

        let mut slots: Vec<_> = acc.storage.iter().filter(|(_, v)| !v.is_zero()).collect();
        slots.sort_unstable_by_key(|(slot, _)| **slot);
        for (slot, value) in slots {
            hasher.update(slot.to_be_bytes::<32>());
            hasher.update(value.to_be_bytes::<32>());
        }
    }
    hasher.finalize()
}

fn seal_hash(parent_hash: B256, number: u64, state_root: B256) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(parent_hash);
    hasher.update(number.to_be_bytes());
    hasher.update(state_root);
    hasher.finalize()
}
