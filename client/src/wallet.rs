use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde_json::json;

use crate::rpc::{to_hex, RpcClient, RpcFailure};

/// A prepared transaction handed to the wallet for signing and
/// submission. `gas_limit` is `None` when the wallet/provider should
/// estimate; the force-mint path pins it instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub gas_limit: Option<u64>,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet connected")]
    NotConnected,

    #[error("ACTION_REJECTED: the transaction was rejected by the wallet")]
    Rejected,

    #[error("{0}")]
    Other(String),
}

/// Account listing and transaction submission, the two things an
/// external wallet provider is responsible for. Implementations sign
/// however they like; the workflows only see this seam.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// The connected account, if any.
    fn address(&self) -> Option<Address>;

    /// Sign and submit; resolves to the transaction hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<String, WalletError>;
}

/// No-op wallet substituted when no signer capability is configured.
/// Read-only commands work; anything that submits fails with
/// [`WalletError::NotConnected`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NoWallet;

#[async_trait]
impl Wallet for NoWallet {
    fn address(&self) -> Option<Address> {
        None
    }

    async fn send_transaction(&self, _tx: TransactionRequest) -> Result<String, WalletError> {
        Err(WalletError::NotConnected)
    }
}

/// Wallet backed by a node-side signer: submits through
/// `eth_sendTransaction`, so the endpoint (a dev node or an external
/// signer proxy) holds the key. This is the request/send surface the
/// browser provider exposes, consumed over JSON-RPC instead.
#[derive(Clone, Debug)]
pub struct JsonRpcWallet {
    rpc: RpcClient,
    address: Address,
}

impl JsonRpcWallet {
    pub fn new(rpc: RpcClient, address: Address) -> Self {
        Self { rpc, address }
    }
}

#[async_trait]
impl Wallet for JsonRpcWallet {
    fn address(&self) -> Option<Address> {
        Some(self.address)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<String, WalletError> {
        let mut params = json!({
            "from": self.address.to_string(),
            "to": tx.to.to_string(),
            "value": format!("{:#x}", tx.value),
            "data": to_hex(&tx.data),
        });
        if let Some(gas) = tx.gas_limit {
            params["gas"] = json!(format!("{gas:#x}"));
        }
        let tx_hash: String = self
            .rpc
            .request("eth_sendTransaction", vec![params])
            .await
            .map_err(|e| match e {
                RpcFailure::Node { message, .. } if message.contains("rejected") => {
                    WalletError::Rejected
                }
                other => WalletError::Other(other.message()),
            })?;
        Ok(tx_hash)
    }
}

static WALLET: OnceLock<Arc<dyn Wallet>> = OnceLock::new();

/// Resolve the wallet capability once for the process lifetime: a
/// [`JsonRpcWallet`] when `WALLET_ADDRESS` names an account the RPC
/// endpoint can sign for, otherwise the [`NoWallet`] no-op.
pub fn resolve_wallet(rpc: &RpcClient) -> Arc<dyn Wallet> {
    WALLET
        .get_or_init(|| match std::env::var("WALLET_ADDRESS") {
            Ok(raw) => match Address::from_str(raw.trim()) {
                Ok(address) => Arc::new(JsonRpcWallet::new(rpc.clone(), address)),
                Err(_) => {
                    tracing::warn!("invalid WALLET_ADDRESS, falling back to no-op wallet");
                    Arc::new(NoWallet)
                }
            },
            Err(_) => Arc::new(NoWallet),
        })
        .clone()
}
