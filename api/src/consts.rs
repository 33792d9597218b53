use alloy_primitives::{address, Address};

/// Monad testnet chain id.
pub const CHAIN_ID: u64 = 10143;

/// Default Monad testnet RPC endpoint.
pub const RPC_URL: &str = "https://testnet-rpc.monad.xyz";

/// Block explorer base URL for the target network.
pub const EXPLORER_URL: &str = "https://testnet.monadexplorer.com";

/// BuilderNFT contract (ERC-1155, one token class per mint).
pub const BUILDER_NFT_ADDRESS: Address = address!("b2c8e1a94f63d07a9c5e4f21d8b36a70c91d54e8");

/// ProjectStaking contract.
pub const PROJECT_STAKING_ADDRESS: Address = address!("7f3a9d25c81b4e06f29d83c1a6057b4ed2c8f19a");

/// Chat API base URLs per environment.
pub const API_BASE_URL_DEV: &str = "http://localhost:8001/api";
pub const API_BASE_URL_PROD: &str = "https://kind-gwenora-papajams-0ddff9e5.koyeb.app/api";

/// Wei per whole MON (the network's native token).
pub const WEI_PER_MON: u128 = 1_000_000_000_000_000_000;

/// Contract-side cap on the metadata token URI. Larger payloads revert
/// with "URI too long", so we refuse them before submitting.
pub const MAX_TOKEN_URI_BYTES: usize = 8_192;

/// Gas limit used by the force-mint path, which skips estimation.
pub const FORCE_MINT_GAS_LIMIT: u64 = 3_000_000;

/// Receipt polling cadence after a transaction is submitted.
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;
pub const RECEIPT_POLL_ATTEMPTS: u32 = 30;

/// Explorer link kinds accepted by [`explorer_url`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorerKind {
    Tx,
    Address,
    Token,
}

/// Build a block-explorer URL for a transaction hash, account or token.
pub fn explorer_url(kind: ExplorerKind, value: &str) -> String {
    let segment = match kind {
        ExplorerKind::Tx => "tx",
        ExplorerKind::Address => "address",
        ExplorerKind::Token => "token",
    };
    format!("{EXPLORER_URL}/{segment}/{value}")
}
