use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Vec<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum RpcFailure {
    /// The endpoint answered with HTTP 429; the caller should back off
    /// and retry.
    #[error("rate limited")]
    RateLimited,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("empty result")]
    Empty,
}

impl RpcFailure {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RpcFailure::RateLimited)
    }

    /// The raw message text, used by the error classifier.
    pub fn message(&self) -> String {
        match self {
            RpcFailure::Node { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A mined transaction receipt, reduced to the fields the mint flow
/// inspects.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub status: String,
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ReceiptLog {
    pub address: String,
    pub topics: Vec<String>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == "0x1"
    }
}

/// Thin Ethereum JSON-RPC 2.0 client over reqwest. Only the read and
/// estimation methods the mint/stake flows need; transaction signing
/// lives behind the wallet seam.
#[derive(Clone, Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<serde_json::Value>,
    ) -> Result<T, RpcFailure> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(RpcFailure::RateLimited);
        }

        let rpc_response: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcFailure::Node {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or(RpcFailure::Empty)
    }

    /// eth_call against `to` with raw calldata; returns the raw return
    /// bytes for ABI decoding.
    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcFailure> {
        let result: String = self
            .request(
                "eth_call",
                vec![
                    json!({
                        "to": to.to_string(),
                        "data": to_hex(data),
                    }),
                    json!("latest"),
                ],
            )
            .await?;
        from_hex(&result)
    }

    /// eth_estimateGas for a value-bearing contract call. Estimation
    /// failures surface as node errors carrying the revert text.
    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<u64, RpcFailure> {
        let result: String = self
            .request(
                "eth_estimateGas",
                vec![json!({
                    "from": from.to_string(),
                    "to": to.to_string(),
                    "value": format!("{value:#x}"),
                    "data": to_hex(data),
                })],
            )
            .await?;
        parse_quantity(&result)
    }

    /// eth_getCode; an empty result means no contract at the address.
    pub async fn get_code(&self, address: Address) -> Result<Vec<u8>, RpcFailure> {
        let result: String = self
            .request(
                "eth_getCode",
                vec![json!(address.to_string()), json!("latest")],
            )
            .await?;
        from_hex(&result)
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256, RpcFailure> {
        let result: String = self
            .request(
                "eth_getBalance",
                vec![json!(address.to_string()), json!("latest")],
            )
            .await?;
        parse_u256(&result)
    }

    /// eth_getTransactionReceipt; `None` while the transaction is
    /// still pending.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, RpcFailure> {
        match self
            .request("eth_getTransactionReceipt", vec![json!(tx_hash)])
            .await
        {
            Ok(receipt) => Ok(Some(receipt)),
            Err(RpcFailure::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn chain_id(&self) -> Result<u64, RpcFailure> {
        let result: String = self.request("eth_chainId", vec![]).await?;
        parse_quantity(&result)
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex(s: &str) -> Result<Vec<u8>, RpcFailure> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| RpcFailure::Transport(format!("invalid hex in response: {e}")))
}

fn parse_u256(s: &str) -> Result<U256, RpcFailure> {
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| RpcFailure::Transport(format!("invalid quantity in response: {e}")))
}

fn parse_quantity(s: &str) -> Result<u64, RpcFailure> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| RpcFailure::Transport(format!("invalid quantity in response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(to_hex(&[0xde, 0xad]), "0xdead");
        assert_eq!(from_hex("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(from_hex("0x").unwrap(), Vec::<u8>::new());
        assert!(from_hex("0xzz").is_err());
    }

    #[test]
    fn quantities_parse_from_rpc_hex() {
        assert_eq!(parse_quantity("0x279f").unwrap(), 10143);
        assert_eq!(parse_u256("0x0").unwrap(), U256::ZERO);
        assert!(parse_quantity("nope").is_err());
    }

    #[test]
    fn receipts_deserialize_and_report_status() {
        let mined: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "status": "0x1",
            "transactionHash": "0xabc",
            "logs": [{
                "address": "0xb2c8e1a94f63d07a9c5e4f21d8b36a70c91d54e8",
                "topics": ["0xddf2", "0x0", "0x1", "0x2a"],
                "data": "0x"
            }]
        }))
        .unwrap();
        assert!(mined.is_success());
        assert_eq!(mined.logs.len(), 1);
        assert_eq!(mined.logs[0].topics[3], "0x2a");

        let reverted: TransactionReceipt =
            serde_json::from_value(serde_json::json!({"status": "0x0", "logs": []})).unwrap();
        assert!(!reverted.is_success());
    }

    #[test]
    fn node_errors_keep_revert_text() {
        let failure = RpcFailure::Node {
            code: 3,
            message: "execution reverted: minting is disabled".to_string(),
        };
        assert!(failure.message().contains("minting is disabled"));
        assert!(!failure.is_rate_limited());
        assert!(RpcFailure::RateLimited.is_rate_limited());
    }
}
