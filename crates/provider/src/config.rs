//! Network parameters shared by every backend.

use revm::primitives::hardfork::SpecId;

/// Chain id and active hardfork used to configure the EVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub spec: SpecId,
}

impl ChainConfig {
    pub const MAINNET_CHAIN_ID: u64 = 1;
    pub const DEV_CHAIN_ID: u64 = 1337;

    pub fn new(chain_id: u64, spec: SpecId) -> Self {
        Self { chain_id, spec }
    }

    /// Ethereum mainnet at the latest hardfork known to revm.
    pub fn mainnet() -> Self {
        Self::new(Self::MAINNET_CHAIN_ID, SpecId::default())
    }

    /// Local development chain, matching the usual simulated-backend id.
    pub fn dev() -> Self {
        Self::new(Self::DEV_CHAIN_ID, SpecId::default())
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_spec(mut self, spec: SpecId) -> Self {
        self.spec = spec;
        self
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(ChainConfig::mainnet().chain_id, 1);
        assert_eq!(ChainConfig::dev().chain_id, 1337);
        assert_eq!(ChainConfig::default(), ChainConfig::mainnet());
    }

    #[test]
    fn with_spec_keeps_chain_id() {
        let cfg = ChainConfig::dev().with_spec(SpecId::CANCUN);
        assert_eq!(cfg.chain_id, 1337);
        assert_eq!(cfg.spec, SpecId::CANCUN);
    }
}
