pub mod builder_nft;
pub mod chat;
pub mod config;
pub mod mint;
pub mod retry;
pub mod rpc;
pub mod staking;
pub mod wallet;
