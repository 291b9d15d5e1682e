//! Builders for the revm block, transaction and context environments.
//!
//! Shared by the local chain (when it mines transactions) and the simulator
//! (when it executes calls against forked state), so both run with the same
//! relaxed validation rules.

use crate::ChainConfig;
use alloy_primitives::{Bytes, U256};
use revm::context::result::ExecutionResult;
use revm::context::{BlockEnv, Context, TxEnv};
use revm::context_interface::cfg::gas::calculate_initial_tx_gas;
use revm::database_interface::Database;
use revm::handler::{MainContext, MainnetContext};
use revm::primitives::TxKind;
use sibyl_core::{BlockHeader, SibylError, SibylResult, Transaction};

/// Block environment for executing on top of `header`.
pub fn block_env(header: &BlockHeader) -> BlockEnv {
    BlockEnv {
        number: U256::from(header.number),
        beneficiary: header.beneficiary,
        timestamp: U256::from(header.timestamp),
        gas_limit: header.gas_limit,
        basefee: header.base_fee.unwrap_or_default(),
        difficulty: header.difficulty,
        // Post-merge specs refuse to run without prevrandao.
        prevrandao: Some(header.mix_hash.unwrap_or_default()),
        ..Default::default()
    }
}

/// Converts a [`Transaction`] into a zero-gas-price `TxEnv` for `config`'s chain.
pub fn tx_env(config: &ChainConfig, tx: &Transaction) -> SibylResult<TxEnv> {
    TxEnv::builder()
        .caller(tx.from)
        .kind(match tx.to {
            Some(addr) => TxKind::Call(addr),
            None => TxKind::Create,
        })
        .data(tx.input.clone())
        .value(tx.value)
        .gas_limit(tx.gas)
        .gas_price(0)
        .chain_id(Some(config.chain_id))
        .build()
        .map_err(|e| SibylError::InvalidInput(format!("Failed to build TxEnv: {e:?}")))
}

/// Intrinsic gas revm charges before the first frame of `tx` runs.
pub fn intrinsic_gas(config: &ChainConfig, tx: &Transaction) -> u64 {
    calculate_initial_tx_gas(config.spec, &tx.input, tx.to.is_none(), 0, 0, 0).initial_gas
}

/// Like [`tx_env`], but tops the gas limit up by the intrinsic cost so the
/// outermost call frame receives exactly `tx.gas`.
pub fn frame_tx_env(config: &ChainConfig, tx: &Transaction) -> SibylResult<TxEnv> {
    let mut env = tx_env(config, tx)?;
    env.gas_limit = tx.gas.saturating_add(intrinsic_gas(config, tx));
    Ok(env)
}

/// Mainnet context over `db` with nonce, block gas limit, base fee,
/// EIP-3607 and EIP-7623 checks disabled and no per-transaction gas cap.
///
/// Balance checks stay on: a value transfer the sender cannot cover fails
/// the same way it would on chain.
pub fn evm_context<DB: Database>(
    db: DB,
    config: &ChainConfig,
    block: BlockEnv,
) -> MainnetContext<DB> {
    let mut ctx = Context::mainnet().with_db(db).with_block(block);
    ctx.modify_cfg(|cfg| {
        cfg.chain_id = config.chain_id;
        cfg.spec = config.spec;
        cfg.disable_nonce_check = true;
        cfg.disable_block_gas_limit = true;
        cfg.disable_base_fee = true;
        cfg.disable_eip3607 = true;
        cfg.disable_eip7623 = true;
        cfg.tx_gas_limit_cap = Some(u64::MAX);
    });
    ctx
}

/// Extracts the return data of a finished execution.
///
/// Reverts and halts become errors so callers only ever see output bytes
/// of successful calls.
pub fn into_output<H: core::fmt::Debug>(result: ExecutionResult<H>) -> SibylResult<Bytes> {
    match result {
        ExecutionResult::Success { output, .. } => Ok(output.into_data()),
        ExecutionResult::Revert { output, .. } => Err(SibylError::Reverted(output)),
        ExecutionResult::Halt { reason, .. } => Err(SibylError::Halted(format!("{reason:?}"))),
    }
}

/// Wraps an engine error verbatim.
pub fn evm_error<E: core::fmt::Debug>(e: E) -> SibylError {
    SibylError::Evm(format!("{e:?}"))
}
