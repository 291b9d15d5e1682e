//! Shared fixtures: a local chain with a deployed counter contract.
//!
//! The counter exposes `tick()` (increments slot 0) and `count()` (returns
//! slot 0 as a `uint256`).

#![allow(dead_code)]

use alloy_primitives::{address, keccak256, Address, Bytes, U256};
use sibyl_core::Transaction;
use sibyl_provider::{ChainConfig, GenesisAccount, GenesisAlloc, InMemoryChain};
use sibyl_simulator::Simulator;

pub const DEPLOYER: Address = address!("00000000000000000000000000000000000d3a10");
pub const BLOCK_GAS_LIMIT: u64 = 10_000_000;
pub const CALL_GAS: u64 = 100_000;
pub const READ_GAS: u64 = 30_000_000;

/// Jump targets inside [`counter_runtime`].
const COUNT_DEST: u8 = 0x1d;
const TICK_DEST: u8 = 0x2a;

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn tick_calldata() -> Bytes {
    Bytes::copy_from_slice(&selector("tick()"))
}

pub fn count_calldata() -> Bytes {
    Bytes::copy_from_slice(&selector("count()"))
}

pub fn counter_runtime() -> Vec<u8> {
    let mut code = vec![
        0x60, 0x00, 0x35, // CALLDATALOAD(0)
        0x60, 0xe0, 0x1c, // SHR 224 -> selector
        0x80, 0x63, // DUP1 PUSH4
    ];
    code.extend_from_slice(&selector("count()"));
    code.extend_from_slice(&[0x14, 0x60, COUNT_DEST, 0x57, 0x63]);
    code.extend_from_slice(&selector("tick()"));
    code.extend_from_slice(&[
        0x14, 0x60, TICK_DEST, 0x57, // EQ JUMPI
        0x60, 0x00, 0x80, 0xfd, // REVERT(0, 0)
        // count()
        0x5b, 0x50, // JUMPDEST POP
        0x60, 0x00, 0x54, // SLOAD(0)
        0x60, 0x00, 0x52, // MSTORE(0)
        0x60, 0x20, 0x60, 0x00, 0xf3, // RETURN(0, 32)
        // tick()
        0x5b, // JUMPDEST
        0x60, 0x00, 0x54, 0x60, 0x01, 0x01, // SLOAD(0) + 1
        0x60, 0x00, 0x55, // SSTORE(0)
        0x00, // STOP
    ]);
    debug_assert_eq!(code[COUNT_DEST as usize], 0x5b);
    debug_assert_eq!(code[TICK_DEST as usize], 0x5b);
    code
}

/// Init code that copies [`counter_runtime`] into memory and returns it.
pub fn counter_init_code() -> Bytes {
    let runtime = counter_runtime();
    let mut code = vec![
        0x60,
        runtime.len() as u8, // PUSH1 len
        0x80,                // DUP1
        0x60,
        0x0b, // PUSH1 offset of runtime
        0x60,
        0x00, // PUSH1 0
        0x39, // CODECOPY
        0x60,
        0x00, // PUSH1 0
        0xf3, // RETURN
    ];
    code.extend(runtime);
    code.into()
}

/// Local chain where block 1 deploys the counter. Returns its address.
pub fn chain_with_counter() -> (InMemoryChain, Address) {
    let mut alloc = GenesisAlloc::new();
    alloc.insert(
        DEPLOYER,
        GenesisAccount::with_balance(U256::from(10_000_000_000_000_000_000u128)),
    );

    let mut chain = InMemoryChain::new(ChainConfig::dev(), alloc).with_gas_limit(BLOCK_GAS_LIMIT);
    let receipt = chain
        .transact(&Transaction::create(DEPLOYER, counter_init_code(), 1_000_000))
        .expect("deploy counter");
    assert!(receipt.success, "counter deployment reverted");
    chain.commit();

    (chain, receipt.contract_address.expect("created address"))
}

pub fn tick(sim: &Simulator<InMemoryChain>, counter: Address) {
    sim.call(DEPLOYER, counter, tick_calldata(), CALL_GAS, U256::ZERO)
        .expect("tick");
}

pub fn read_count(sim: &Simulator<InMemoryChain>, counter: Address) -> U256 {
    let ret = sim
        .static_call(DEPLOYER, counter, count_calldata(), READ_GAS)
        .expect("count");
    assert_eq!(ret.len(), 32);
    U256::from_be_slice(&ret)
}
