//! JSON-RPC backed chain using alloy-rs and revm's `AlloyDB`.

use crate::{Blockchain, ChainConfig};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_network::Ethereum;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use revm::database::{AlloyDB, WrapDatabaseAsync};
use sibyl_core::{BlockHeader, SibylError, SibylResult};
use std::future::Future;
use tokio::runtime::Handle;

/// State of one remote block, fetched lazily account by account.
pub type RpcState = WrapDatabaseAsync<AlloyDB<Ethereum, DynProvider>>;

/// Reads headers and state from an Ethereum JSON-RPC endpoint.
///
/// Blocking calls are bridged onto the tokio runtime that was current at
/// [`connect`](Self::connect) time, which must be multi-threaded.
///
/// ```ignore
/// let chain = RpcChain::connect("https://mainnet.infura.io/v3/KEY").await?;
/// ```
pub struct RpcChain {
    provider: DynProvider,
    rpc_url: String,
    config: ChainConfig,
    handle: Handle,
}

impl RpcChain {
    pub async fn connect(rpc_url: &str) -> SibylResult<Self> {
        if rpc_url.is_empty() {
            return Err(SibylError::InvalidInput("RPC URL must not be empty".into()));
        }
        url::Url::parse(rpc_url)
            .map_err(|e| SibylError::InvalidInput(format!("Invalid RPC URL {rpc_url}: {e}")))?;

        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| SibylError::Provider(format!("Failed to connect to {rpc_url}: {e}")))?;

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| SibylError::Provider(format!("Failed to read chain id: {e}")))?;

        let head = provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| SibylError::Provider(format!("Failed to fetch head block: {e}")))?
            .ok_or_else(|| SibylError::Provider("current head is nil, check node".into()))?;

        tracing::info!(rpc_url, chain_id, head = head.header.number, "connected");

        Ok(Self {
            provider: provider.erased(),
            rpc_url: rpc_url.to_string(),
            config: ChainConfig::mainnet().with_chain_id(chain_id),
            handle: Handle::current(),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        tokio::task::block_in_place(|| self.handle.block_on(fut))
    }

    fn fetch_header(&self, tag: BlockNumberOrTag) -> SibylResult<Option<BlockHeader>> {
        tracing::debug!(block = %tag, rpc_url = %self.rpc_url, "fetching header");

        let block = self
            .block_on(async { self.provider.get_block_by_number(tag).await })
            .map_err(|e| SibylError::Provider(format!("Failed to fetch block {tag}: {e}")))?;

        Ok(block.as_ref().map(header_from_rpc))
    }
}

impl Blockchain for RpcChain {
    type State = RpcState;

    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn head(&self) -> SibylResult<BlockHeader> {
        self.fetch_header(BlockNumberOrTag::Latest)?
            .ok_or_else(|| SibylError::Provider("current head is nil, check node".into()))
    }

    fn block_by_number(&self, number: u64) -> SibylResult<Option<BlockHeader>> {
        self.fetch_header(BlockNumberOrTag::Number(number))
    }

    fn state_at(&self, header: &BlockHeader) -> SibylResult<RpcState> {
        let db = AlloyDB::new(self.provider.clone(), BlockId::from(header.number));
        Ok(WrapDatabaseAsync::with_handle(db, self.handle.clone()))
    }
}

fn header_from_rpc(block: &alloy_rpc_types::Block) -> BlockHeader {
    use alloy_consensus::BlockHeader as _;

    let header = &block.header;
    BlockHeader {
        number: header.number(),
        hash: header.hash,
        parent_hash: header.parent_hash(),
        state_root: header.state_root(),
        timestamp: header.timestamp(),
        gas_limit: header.gas_limit(),
        base_fee: header.base_fee_per_gas(),
        beneficiary: header.beneficiary(),
        difficulty: header.difficulty(),
        mix_hash: header.mix_hash(),
    }
}
