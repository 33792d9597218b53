//! The mint workflow: preflight checks, metadata generation, the
//! primary mint, and the force-mint fallback for spurious gas
//! estimation failures.

use alloy_primitives::U256;
use async_trait::async_trait;

use mammothon_api::error::MintError;
use mammothon_api::metadata::NftMetadata;
use mammothon_api::types::{format_mon, MintRequest, MintResult, Project, RepoInfo, SocialHandles};

use crate::builder_nft::BuilderNft;
use crate::wallet::Wallet;

/// The contract surface the mint workflow needs. [`BuilderNft`] is the
/// real implementation; tests substitute a scripted one.
#[async_trait]
pub trait MintBackend: Send + Sync {
    async fn minting_enabled(&self) -> Result<bool, MintError>;
    async fn mint_price(&self) -> Result<U256, MintError>;
    async fn has_received_nft(&self, github_username: &str, project_id: &str)
        -> Result<(bool, u64), MintError>;
    async fn tokens_for_github_user(&self, github_username: &str) -> Result<Vec<U256>, MintError>;
    async fn mint(
        &self,
        wallet: &dyn Wallet,
        request: &MintRequest,
        token_uri: &str,
        price: U256,
    ) -> Result<MintResult, MintError>;
    async fn force_mint(
        &self,
        wallet: &dyn Wallet,
        request: &MintRequest,
        token_uri: &str,
        price: U256,
    ) -> Result<MintResult, MintError>;
}

#[async_trait]
impl MintBackend for BuilderNft {
    async fn minting_enabled(&self) -> Result<bool, MintError> {
        BuilderNft::minting_enabled(self)
            .await
            .map_err(crate::builder_nft::mint_failure)
    }

    async fn mint_price(&self) -> Result<U256, MintError> {
        BuilderNft::mint_price(self)
            .await
            .map_err(crate::builder_nft::mint_failure)
    }

    async fn has_received_nft(
        &self,
        github_username: &str,
        project_id: &str,
    ) -> Result<(bool, u64), MintError> {
        BuilderNft::has_received_nft(self, github_username, project_id)
            .await
            .map_err(crate::builder_nft::mint_failure)
    }

    async fn tokens_for_github_user(&self, github_username: &str) -> Result<Vec<U256>, MintError> {
        BuilderNft::tokens_for_github_user(self, github_username)
            .await
            .map_err(crate::builder_nft::mint_failure)
    }

    async fn mint(
        &self,
        wallet: &dyn Wallet,
        request: &MintRequest,
        token_uri: &str,
        price: U256,
    ) -> Result<MintResult, MintError> {
        BuilderNft::mint(self, wallet, request, token_uri, price).await
    }

    async fn force_mint(
        &self,
        wallet: &dyn Wallet,
        request: &MintRequest,
        token_uri: &str,
        price: U256,
    ) -> Result<MintResult, MintError> {
        BuilderNft::force_mint(self, wallet, request, token_uri, price).await
    }
}

/// Outcome of [`mint_with_fallback`]: either a fresh mint, or the
/// caller already holds tokens for this username/project pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintOutcome {
    Minted(MintResult),
    AlreadyMinted { token_ids: Vec<U256> },
}

/// Run the full mint workflow:
///
/// 1. refuse without a connected wallet or with an unparseable repo URL
/// 2. check the minting switch and read the current price
/// 3. log (but do not block on) an existing-token pre-check
/// 4. build the metadata data URI and submit the primary mint
/// 5. on a gas-estimation-shaped failure, retry once via force mint
///    with identical arguments
/// 6. classify raw errors into the user-facing taxonomy; duplicates
///    recover the caller's existing token ids
pub async fn mint_with_fallback(
    backend: &dyn MintBackend,
    wallet: &dyn Wallet,
    repo_url: &str,
    project: Project,
    socials: SocialHandles,
) -> Result<MintOutcome, MintError> {
    if wallet.address().is_none() {
        return Err(MintError::WalletNotConnected);
    }
    let repo = RepoInfo::parse(repo_url)
        .ok_or_else(|| MintError::InvalidRepoUrl(repo_url.to_string()))?;
    let request = MintRequest {
        repo,
        project,
        socials,
    };

    if !backend.minting_enabled().await? {
        return Err(MintError::MintingDisabled);
    }
    let price = backend.mint_price().await?;
    let price_mon = format_mon(price);

    // Informational only; the contract is the authority on uniqueness.
    match backend
        .has_received_nft(&request.repo.username, request.project.id())
        .await
    {
        Ok((true, count)) => {
            tracing::info!(
                username = %request.repo.username,
                project = %request.project.id(),
                count,
                "user already holds tokens for this pair, proceeding anyway"
            );
        }
        Ok((false, _)) => {}
        Err(e) => tracing::warn!("existing-token pre-check failed: {e}"),
    }

    let token_uri = NftMetadata::for_mint(&request).to_data_uri()?;

    let attempt = backend.mint(wallet, &request, &token_uri, price).await;
    let result = match attempt {
        Ok(result) => Ok(result),
        Err(MintError::Rpc(message)) if MintError::is_gas_estimation_failure(&message) => {
            tracing::warn!(%message, "gas estimation failed, retrying with forced gas limit");
            backend.force_mint(wallet, &request, &token_uri, price).await
        }
        Err(other) => Err(other),
    };

    match result {
        Ok(result) => Ok(MintOutcome::Minted(result)),
        Err(e) => {
            let classified = match e {
                MintError::Rpc(message) => MintError::classify(&message, &price_mon),
                already => already,
            };
            if classified.is_duplicate() {
                let token_ids = backend
                    .tokens_for_github_user(&request.repo.username)
                    .await
                    .unwrap_or_default();
                if !token_ids.is_empty() {
                    return Ok(MintOutcome::AlreadyMinted { token_ids });
                }
            }
            Err(classified)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use alloy_primitives::Address;
    use crate::wallet::{NoWallet, TransactionRequest, WalletError};

    struct StaticWallet;

    #[async_trait]
    impl Wallet for StaticWallet {
        fn address(&self) -> Option<Address> {
            Some(Address::repeat_byte(0x42))
        }

        async fn send_transaction(&self, _tx: TransactionRequest) -> Result<String, WalletError> {
            Ok("0xabc".to_string())
        }
    }

    /// Scripted backend: the primary mint fails with `primary_error`
    /// (if set), and every call is recorded.
    struct Scripted {
        enabled: bool,
        price: U256,
        primary_error: Option<MintError>,
        force_error: Option<MintError>,
        existing_tokens: Vec<U256>,
        calls: Mutex<Vec<String>>,
        args_seen: Mutex<Vec<(MintRequest, String, U256)>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                enabled: true,
                price: U256::from(10_000_000_000_000_000u64),
                primary_error: None,
                force_error: None,
                existing_tokens: vec![],
                calls: Mutex::new(vec![]),
                args_seen: Mutex::new(vec![]),
            }
        }

        fn record(&self, name: &str) {
            self.calls.lock().unwrap().push(name.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MintBackend for Scripted {
        async fn minting_enabled(&self) -> Result<bool, MintError> {
            self.record("minting_enabled");
            Ok(self.enabled)
        }

        async fn mint_price(&self) -> Result<U256, MintError> {
            self.record("mint_price");
            Ok(self.price)
        }

        async fn has_received_nft(
            &self,
            _github_username: &str,
            _project_id: &str,
        ) -> Result<(bool, u64), MintError> {
            self.record("has_received_nft");
            Ok((
                !self.existing_tokens.is_empty(),
                self.existing_tokens.len() as u64,
            ))
        }

        async fn tokens_for_github_user(
            &self,
            _github_username: &str,
        ) -> Result<Vec<U256>, MintError> {
            self.record("tokens_for_github_user");
            Ok(self.existing_tokens.clone())
        }

        async fn mint(
            &self,
            _wallet: &dyn Wallet,
            request: &MintRequest,
            token_uri: &str,
            price: U256,
        ) -> Result<MintResult, MintError> {
            self.record("mint");
            self.args_seen
                .lock()
                .unwrap()
                .push((request.clone(), token_uri.to_string(), price));
            match &self.primary_error {
                Some(e) => Err(e.clone()),
                None => Ok(MintResult {
                    token_id: U256::from(7u64),
                    tx_hash: "0xprimary".to_string(),
                    mint_price: price,
                }),
            }
        }

        async fn force_mint(
            &self,
            _wallet: &dyn Wallet,
            request: &MintRequest,
            token_uri: &str,
            price: U256,
        ) -> Result<MintResult, MintError> {
            self.record("force_mint");
            self.args_seen
                .lock()
                .unwrap()
                .push((request.clone(), token_uri.to_string(), price));
            match &self.force_error {
                Some(e) => Err(e.clone()),
                None => Ok(MintResult {
                    token_id: U256::from(8u64),
                    tx_hash: "0xforce".to_string(),
                    mint_price: price,
                }),
            }
        }
    }

    const REPO: &str = "https://github.com/alice/my-repo";

    #[tokio::test]
    async fn happy_path_mints_without_fallback() {
        let backend = Scripted::new();
        let outcome = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Vocafi,
            SocialHandles::default(),
        )
        .await
        .unwrap();
        match outcome {
            MintOutcome::Minted(result) => assert_eq!(result.tx_hash, "0xprimary"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!backend.calls().contains(&"force_mint".to_string()));
    }

    #[tokio::test]
    async fn gas_estimation_failure_triggers_force_mint_once_with_same_args() {
        let mut backend = Scripted::new();
        backend.primary_error = Some(MintError::Rpc("UNPREDICTABLE_GAS_LIMIT".to_string()));
        let outcome = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Clarity,
            SocialHandles::default(),
        )
        .await
        .unwrap();
        match outcome {
            MintOutcome::Minted(result) => assert_eq!(result.tx_hash, "0xforce"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let calls = backend.calls();
        assert_eq!(calls.iter().filter(|c| *c == "force_mint").count(), 1);

        let args = backend.args_seen.lock().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], args[1]);
    }

    #[tokio::test]
    async fn force_mint_is_not_retried_a_second_time() {
        let mut backend = Scripted::new();
        backend.primary_error = Some(MintError::Rpc("CALL_EXCEPTION".to_string()));
        backend.force_error = Some(MintError::Rpc("CALL_EXCEPTION".to_string()));
        let err = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Clarity,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MintError::Other(_)));
        assert_eq!(
            backend.calls().iter().filter(|c| *c == "force_mint").count(),
            1
        );
    }

    #[tokio::test]
    async fn user_actionable_errors_do_not_trigger_the_fallback() {
        let mut backend = Scripted::new();
        backend.primary_error = Some(MintError::Rpc("insufficient funds".to_string()));
        let err = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Worldie,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, MintError::InsufficientFunds);
        assert!(!backend.calls().contains(&"force_mint".to_string()));
    }

    #[tokio::test]
    async fn wallet_rejection_surfaces_directly() {
        let mut backend = Scripted::new();
        backend.primary_error = Some(MintError::WalletRejected);
        let err = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Vocafi,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, MintError::WalletRejected);
        assert!(!backend.calls().contains(&"force_mint".to_string()));
    }

    #[tokio::test]
    async fn duplicate_mint_recovers_existing_tokens() {
        let mut backend = Scripted::new();
        backend.primary_error =
            Some(MintError::Rpc("ERC721: token already minted".to_string()));
        backend.existing_tokens = vec![U256::from(3u64), U256::from(9u64)];
        let outcome = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Mammothon,
            SocialHandles::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            MintOutcome::AlreadyMinted {
                token_ids: vec![U256::from(3u64), U256::from(9u64)]
            }
        );
    }

    #[tokio::test]
    async fn duplicate_without_recoverable_tokens_stays_an_error() {
        let mut backend = Scripted::new();
        backend.primary_error =
            Some(MintError::Rpc("ERC721: token already minted".to_string()));
        let err = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Mammothon,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, MintError::DuplicateMint);
    }

    #[tokio::test]
    async fn disabled_minting_refuses_before_submission() {
        let mut backend = Scripted::new();
        backend.enabled = false;
        let err = mint_with_fallback(
            &backend,
            &StaticWallet,
            REPO,
            Project::Vocafi,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, MintError::MintingDisabled);
        assert!(!backend.calls().contains(&"mint".to_string()));
    }

    #[tokio::test]
    async fn invalid_repo_url_refuses_before_any_contract_call() {
        let backend = Scripted::new();
        let err = mint_with_fallback(
            &backend,
            &StaticWallet,
            "not a url",
            Project::Vocafi,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MintError::InvalidRepoUrl(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn disconnected_wallet_refuses_first() {
        let backend = Scripted::new();
        let err = mint_with_fallback(
            &backend,
            &NoWallet,
            REPO,
            Project::Vocafi,
            SocialHandles::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, MintError::WalletNotConnected);
        assert!(backend.calls().is_empty());
    }
}
