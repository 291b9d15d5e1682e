//! E2E integration tests against a live RPC endpoint.
//!
//! Run: `RPC_URL=https://... cargo test -p sibyl-simulator -- --ignored`

use alloy_primitives::{address, Address, Bytes, U256};
use sibyl_provider::{Blockchain, RpcChain};
use sibyl_simulator::Simulator;

/// WETH9 on mainnet.
const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
const VITALIK: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

/// `totalSupply()`
const TOTAL_SUPPLY: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd];
/// `deposit()`
const DEPOSIT: [u8; 4] = [0xd0, 0xe3, 0x0d, 0xb0];

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn weth_deposit_on_mainnet_fork() {
    let rpc_url = std::env::var("RPC_URL").expect("Set RPC_URL to run E2E tests");
    let sim = Simulator::connect(&rpc_url).await.expect("Failed to connect");
    assert_eq!(sim.chain().config().chain_id, 1, "E2E test expects mainnet");

    let block = sim.fork_latest().expect("Fork failed");
    eprintln!("[e2e] Forked mainnet at block {block}");

    let supply = |sim: &Simulator<RpcChain>| {
        let ret = sim
            .static_call(VITALIK, WETH, Bytes::from_static(&TOTAL_SUPPLY), 1_000_000)
            .expect("totalSupply failed");
        U256::from_be_slice(&ret)
    };

    let before = supply(&sim);
    let snapshot = sim.snapshot().unwrap();

    let one_gwei = U256::from(1_000_000_000u64);
    sim.call(VITALIK, WETH, Bytes::from_static(&DEPOSIT), 200_000, one_gwei)
        .expect("deposit failed");
    assert_eq!(supply(&sim), before + one_gwei);

    sim.rollback(snapshot).unwrap();
    assert_eq!(supply(&sim), before);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn historical_fork_smoke() {
    let rpc_url = std::env::var("RPC_URL").expect("Set RPC_URL to run E2E tests");
    let sim = Simulator::connect(&rpc_url).await.expect("Failed to connect");

    sim.fork(18_000_000).expect("Fork at 18M failed");
    assert_eq!(sim.forked_block(), Some(18_000_000));

    let ret = sim
        .static_call(VITALIK, WETH, Bytes::from_static(&TOTAL_SUPPLY), 1_000_000)
        .expect("totalSupply failed");
    assert_eq!(ret.len(), 32);
    eprintln!("[e2e] WETH supply at 18M: {}", U256::from_be_slice(&ret));
}
