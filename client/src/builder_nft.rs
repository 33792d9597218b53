use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use mammothon_api::abi::IBuilderNFT;
use mammothon_api::consts::{
    FORCE_MINT_GAS_LIMIT, RECEIPT_POLL_ATTEMPTS, RECEIPT_POLL_INTERVAL_MS,
};
use mammothon_api::error::MintError;
use mammothon_api::types::{MintRequest, MintResult, TokenInfo};

use crate::rpc::{RpcClient, RpcFailure, TransactionReceipt};
use crate::wallet::{TransactionRequest, Wallet, WalletError};

// keccak256("Transfer(address,address,uint256)"), the ERC-721 mint
// event signature. The minted token id is the fourth topic.
const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Typed wrapper over the deployed BuilderNFT contract.
#[derive(Clone, Debug)]
pub struct BuilderNft {
    rpc: RpcClient,
    address: Address,
}

impl BuilderNft {
    pub fn new(rpc: RpcClient, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether any contract code exists at the configured address.
    pub async fn exists(&self) -> Result<bool, RpcFailure> {
        Ok(!self.rpc.get_code(self.address).await?.is_empty())
    }

    pub async fn minting_enabled(&self) -> Result<bool, RpcFailure> {
        let data = IBuilderNFT::mintingEnabledCall {}.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IBuilderNFT::mintingEnabledCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(decoded.enabled)
    }

    /// Current mint price in wei.
    pub async fn mint_price(&self) -> Result<U256, RpcFailure> {
        let data = IBuilderNFT::mintPriceCall {}.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded =
            IBuilderNFT::mintPriceCall::abi_decode_returns(&ret, true).map_err(decode_failure)?;
        Ok(decoded.price)
    }

    pub async fn total_minted(&self) -> Result<U256, RpcFailure> {
        let data = IBuilderNFT::totalMintedCall {}.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded =
            IBuilderNFT::totalMintedCall::abi_decode_returns(&ret, true).map_err(decode_failure)?;
        Ok(decoded.count)
    }

    /// Whether (github username, project) already holds tokens, and how
    /// many. Uniqueness itself is enforced by the contract at mint time.
    pub async fn has_received_nft(
        &self,
        github_username: &str,
        project_id: &str,
    ) -> Result<(bool, u64), RpcFailure> {
        let data = IBuilderNFT::hasReceivedNFTCall {
            githubUsername: github_username.to_string(),
            projectId: project_id.to_string(),
        }
        .abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IBuilderNFT::hasReceivedNFTCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok((decoded.hasTokens, decoded.tokenCount.to::<u64>()))
    }

    pub async fn tokens_for_github_user(
        &self,
        github_username: &str,
    ) -> Result<Vec<U256>, RpcFailure> {
        let data = IBuilderNFT::getTokensForGithubUserCall {
            githubUsername: github_username.to_string(),
        }
        .abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IBuilderNFT::getTokensForGithubUserCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(decoded.tokenIds)
    }

    pub async fn token_details(&self, token_id: U256) -> Result<TokenInfo, RpcFailure> {
        let data = IBuilderNFT::getGithubUsernameByTokenCall { tokenId: token_id }.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let username = IBuilderNFT::getGithubUsernameByTokenCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?
            .githubUsername;

        let data = IBuilderNFT::getRepoByTokenCall { tokenId: token_id }.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let repo = IBuilderNFT::getRepoByTokenCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?
            .repoName;

        Ok(TokenInfo {
            token_id,
            github_username: username,
            repo_name: repo,
        })
    }

    /// Details for a user's tokens, skipping ids whose lookups fail.
    pub async fn user_token_details(
        &self,
        github_username: &str,
    ) -> Result<Vec<TokenInfo>, RpcFailure> {
        let ids = self.tokens_for_github_user(github_username).await?;
        let mut details = Vec::with_capacity(ids.len());
        for id in ids {
            match self.token_details(id).await {
                Ok(info) => details.push(info),
                Err(e) => {
                    tracing::warn!("failed to load details for token {id}: {e}");
                }
            }
        }
        Ok(details)
    }

    /// Every minted token, by walking token ids up to `totalMinted`.
    /// Ids whose lookups fail are skipped.
    pub async fn all_minted(&self) -> Result<Vec<TokenInfo>, RpcFailure> {
        let total = self.total_minted().await?.to::<u64>();
        let mut tokens = Vec::with_capacity(total as usize);
        for id in 1..=total {
            match self.token_details(U256::from(id)).await {
                Ok(info) => tokens.push(info),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::warn!("failed to load details for token {id}: {e}");
                }
            }
        }
        Ok(tokens)
    }

    /// Primary mint: estimate gas first (this is where spurious
    /// estimation failures surface), then hand the transaction to the
    /// wallet with the provider's own gas handling.
    pub async fn mint(
        &self,
        wallet: &dyn Wallet,
        request: &MintRequest,
        token_uri: &str,
        price: U256,
    ) -> Result<MintResult, MintError> {
        let from = wallet.address().ok_or(MintError::WalletNotConnected)?;
        let data = mint_calldata(from, request, token_uri, false);

        self.rpc
            .estimate_gas(from, self.address, price, &data)
            .await
            .map_err(mint_failure)?;

        let tx_hash = wallet
            .send_transaction(TransactionRequest {
                to: self.address,
                value: price,
                data,
                gas_limit: None,
            })
            .await
            .map_err(wallet_failure)?;

        self.finish_mint(request, tx_hash, price).await
    }

    /// Force mint: identical arguments, but a pinned gas limit so no
    /// client-side estimation happens at all.
    pub async fn force_mint(
        &self,
        wallet: &dyn Wallet,
        request: &MintRequest,
        token_uri: &str,
        price: U256,
    ) -> Result<MintResult, MintError> {
        let from = wallet.address().ok_or(MintError::WalletNotConnected)?;
        let data = mint_calldata(from, request, token_uri, true);

        let tx_hash = wallet
            .send_transaction(TransactionRequest {
                to: self.address,
                value: price,
                data,
                gas_limit: Some(FORCE_MINT_GAS_LIMIT),
            })
            .await
            .map_err(wallet_failure)?;

        self.finish_mint(request, tx_hash, price).await
    }

    /// Wait for the transaction to be mined before reporting success.
    /// The force-mint path skips estimation, so the receipt is the only
    /// place an on-chain revert becomes visible.
    async fn finish_mint(
        &self,
        request: &MintRequest,
        tx_hash: String,
        price: U256,
    ) -> Result<MintResult, MintError> {
        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if !receipt.is_success() {
            let existing = self
                .tokens_for_github_user(&request.repo.username)
                .await
                .unwrap_or_default();
            return Err(revert_error(&existing, &tx_hash));
        }
        let token_id = match token_id_from_receipt(&receipt, self.address) {
            Some(id) => id,
            // No Transfer log in the receipt; the mint is mined, so the
            // user's newest token is ours.
            None => self
                .tokens_for_github_user(&request.repo.username)
                .await
                .ok()
                .and_then(|ids| ids.into_iter().max())
                .unwrap_or(U256::ZERO),
        };
        tracing::info!(%tx_hash, %token_id, "mint confirmed");
        Ok(MintResult {
            token_id,
            tx_hash,
            mint_price: price,
        })
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, MintError> {
        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            match self.rpc.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => return Err(mint_failure(e)),
            }
            tokio::time::sleep(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS)).await;
        }
        Err(MintError::Rpc(format!(
            "transaction {tx_hash} was not mined in time"
        )))
    }
}

/// A reverted mint while the user already holds tokens means the
/// contract's uniqueness rule fired on-chain.
fn revert_error(existing_tokens: &[U256], tx_hash: &str) -> MintError {
    if existing_tokens.is_empty() {
        MintError::Rpc(format!("transaction {tx_hash} reverted"))
    } else {
        MintError::DuplicateMint
    }
}

/// The minted token id, from the contract's Transfer event in the
/// mined receipt.
fn token_id_from_receipt(receipt: &TransactionReceipt, contract: Address) -> Option<U256> {
    let contract = contract.to_string();
    receipt.logs.iter().find_map(|log| {
        if !log.address.eq_ignore_ascii_case(&contract) {
            return None;
        }
        if !log.topics.first()?.eq_ignore_ascii_case(TRANSFER_TOPIC) {
            return None;
        }
        let raw = log.topics.get(3)?;
        U256::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
    })
}

fn mint_calldata(to: Address, request: &MintRequest, token_uri: &str, force: bool) -> Vec<u8> {
    let username = request.repo.username.clone();
    let project = request.project.id().to_string();
    let repo = request.repo.repo_name.clone();
    if force {
        IBuilderNFT::forceMintCall {
            to,
            tokenURI: token_uri.to_string(),
            githubUsername: username,
            projectId: project,
            repoName: repo,
        }
        .abi_encode()
    } else {
        IBuilderNFT::mintBuilderNFTCall {
            to,
            tokenURI: token_uri.to_string(),
            githubUsername: username,
            projectId: project,
            repoName: repo,
        }
        .abi_encode()
    }
}

fn decode_failure(e: alloy_sol_types::Error) -> RpcFailure {
    RpcFailure::Transport(format!("abi decode failed: {e}"))
}

pub(crate) fn mint_failure(e: RpcFailure) -> MintError {
    if e.is_rate_limited() {
        MintError::RateLimited
    } else {
        MintError::Rpc(e.message())
    }
}

pub(crate) fn wallet_failure(e: WalletError) -> MintError {
    match e {
        WalletError::NotConnected => MintError::WalletNotConnected,
        WalletError::Rejected => MintError::WalletRejected,
        WalletError::Other(message) => MintError::Rpc(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::ReceiptLog;
    use mammothon_api::types::{Project, RepoInfo, SocialHandles};

    fn request() -> MintRequest {
        MintRequest {
            repo: RepoInfo {
                username: "alice".to_string(),
                repo_name: "my-repo".to_string(),
            },
            project: Project::Clarity,
            socials: SocialHandles::default(),
        }
    }

    #[test]
    fn primary_and_force_calldata_share_arguments() {
        let to = Address::repeat_byte(0x22);
        let primary = mint_calldata(to, &request(), "data:application/json;base64,e30=", false);
        let force = mint_calldata(to, &request(), "data:application/json;base64,e30=", true);
        // Same ABI-encoded argument tail, different selector.
        assert_ne!(primary[..4], force[..4]);
        assert_eq!(primary[4..], force[4..]);
    }

    #[test]
    fn wallet_errors_map_to_taxonomy() {
        assert_eq!(
            wallet_failure(WalletError::Rejected),
            MintError::WalletRejected
        );
        assert_eq!(
            wallet_failure(WalletError::NotConnected),
            MintError::WalletNotConnected
        );
    }

    fn transfer_log(contract: Address, token_id: &str) -> ReceiptLog {
        ReceiptLog {
            address: contract.to_string().to_lowercase(),
            topics: vec![
                TRANSFER_TOPIC.to_string(),
                "0x0".to_string(),
                "0x42".to_string(),
                token_id.to_string(),
            ],
        }
    }

    #[test]
    fn token_id_comes_from_the_contracts_transfer_event() {
        let contract = Address::repeat_byte(0x33);
        let receipt = TransactionReceipt {
            status: "0x1".to_string(),
            logs: vec![
                // Another contract's Transfer must not be picked up.
                transfer_log(Address::repeat_byte(0x44), "0x1"),
                transfer_log(contract, "0x2a"),
            ],
        };
        assert_eq!(
            token_id_from_receipt(&receipt, contract),
            Some(U256::from(42u64))
        );
    }

    #[test]
    fn receipts_without_a_transfer_log_yield_no_token_id() {
        let contract = Address::repeat_byte(0x33);
        let receipt = TransactionReceipt {
            status: "0x1".to_string(),
            logs: vec![ReceiptLog {
                address: contract.to_string(),
                topics: vec!["0xother".to_string()],
            }],
        };
        assert_eq!(token_id_from_receipt(&receipt, contract), None);
    }

    #[test]
    fn on_chain_reverts_classify_by_existing_tokens() {
        // Revert with tokens on the books: the uniqueness rule fired.
        assert_eq!(
            revert_error(&[U256::from(3u64)], "0xabc"),
            MintError::DuplicateMint
        );
        // Revert with none: surface the raw failure for the classifier.
        let err = revert_error(&[], "0xabc");
        assert_eq!(err, MintError::Rpc("transaction 0xabc reverted".to_string()));
    }

    #[test]
    fn rate_limited_rpc_failures_stay_retryable() {
        assert_eq!(mint_failure(RpcFailure::RateLimited), MintError::RateLimited);
        let revert = RpcFailure::Node {
            code: 3,
            message: "UNPREDICTABLE_GAS_LIMIT".to_string(),
        };
        assert_eq!(
            mint_failure(revert),
            MintError::Rpc("UNPREDICTABLE_GAS_LIMIT".to_string())
        );
    }
}
