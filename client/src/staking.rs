use std::str::FromStr;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use mammothon_api::abi::IProjectStaking;
use mammothon_api::error::MintError;
use mammothon_api::types::{Project, ProjectInfo, StakeRecord};

use crate::builder_nft::{mint_failure, wallet_failure};
use crate::rpc::{RpcClient, RpcFailure};
use crate::wallet::{TransactionRequest, Wallet};

/// Typed wrapper over the ProjectStaking contract. Stakes are native
/// MON, carried as transaction value; unstakes are plain calls.
#[derive(Clone, Debug)]
pub struct ProjectStaking {
    rpc: RpcClient,
    address: Address,
}

impl ProjectStaking {
    pub fn new(rpc: RpcClient, address: Address) -> Self {
        Self { rpc, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn exists(&self) -> Result<bool, RpcFailure> {
        Ok(!self.rpc.get_code(self.address).await?.is_empty())
    }

    pub async fn all_project_ids(&self) -> Result<Vec<String>, RpcFailure> {
        let data = IProjectStaking::getAllProjectIdsCall {}.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IProjectStaking::getAllProjectIdsCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(decoded.ids)
    }

    pub async fn project_exists(&self, project: Project) -> Result<bool, RpcFailure> {
        let data = IProjectStaking::projectExistsCall {
            projectId: project.id().to_string(),
        }
        .abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IProjectStaking::projectExistsCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(decoded.exists)
    }

    pub async fn project(&self, project: Project) -> Result<ProjectInfo, RpcFailure> {
        let data = IProjectStaking::getProjectCall {
            projectId: project.id().to_string(),
        }
        .abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IProjectStaking::getProjectCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        // The contract echoes the id back lowercased; trust our enum if
        // the echo fails to parse.
        let id = Project::from_str(&decoded.id).unwrap_or(project);
        Ok(ProjectInfo {
            id,
            name: decoded.name,
            total_staked: decoded.totalStaked,
            stakers_count: decoded.stakersCount.to::<u64>(),
            active: decoded.active,
        })
    }

    /// Listing for every known project, skipping ones whose lookups
    /// fail so one bad project does not blank the whole table.
    pub async fn projects(&self) -> Result<Vec<ProjectInfo>, RpcFailure> {
        let mut rows = Vec::with_capacity(Project::ALL.len());
        for project in Project::ALL {
            match self.project(project).await {
                Ok(info) => rows.push(info),
                Err(e) if e.is_rate_limited() => return Err(e),
                Err(e) => {
                    tracing::warn!("failed to load project {}: {e}", project.id());
                }
            }
        }
        Ok(rows)
    }

    /// A staker's position on a project, `None` when nothing is staked.
    pub async fn stake_info(
        &self,
        project: Project,
        staker: Address,
    ) -> Result<Option<StakeRecord>, RpcFailure> {
        let data = IProjectStaking::getStakeInfoCall {
            projectId: project.id().to_string(),
            staker,
        }
        .abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IProjectStaking::getStakeInfoCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(stake_record(
            decoded.amount,
            decoded.timestamp,
            decoded.active,
        ))
    }

    pub async fn stake(
        &self,
        wallet: &dyn Wallet,
        project: Project,
        amount: U256,
    ) -> Result<String, MintError> {
        if amount.is_zero() {
            return Err(MintError::InvalidAmount("amount must be positive".into()));
        }
        let data = IProjectStaking::stakeCall {
            projectId: project.id().to_string(),
        }
        .abi_encode();
        self.submit(wallet, amount, data).await
    }

    pub async fn unstake(
        &self,
        wallet: &dyn Wallet,
        project: Project,
        amount: U256,
    ) -> Result<String, MintError> {
        if amount.is_zero() {
            return Err(MintError::InvalidAmount("amount must be positive".into()));
        }
        let data = IProjectStaking::unstakeCall {
            projectId: project.id().to_string(),
            amount,
        }
        .abi_encode();
        self.submit(wallet, U256::ZERO, data).await
    }

    pub async fn stake_on_builder(
        &self,
        wallet: &dyn Wallet,
        token_id: U256,
        amount: U256,
    ) -> Result<String, MintError> {
        if amount.is_zero() {
            return Err(MintError::InvalidAmount("amount must be positive".into()));
        }
        let data = IProjectStaking::stakeOnBuilderCall { tokenId: token_id }.abi_encode();
        self.submit(wallet, amount, data).await
    }

    pub async fn unstake_from_builder(
        &self,
        wallet: &dyn Wallet,
        token_id: U256,
        amount: U256,
    ) -> Result<String, MintError> {
        if amount.is_zero() {
            return Err(MintError::InvalidAmount("amount must be positive".into()));
        }
        let data = IProjectStaking::unstakeFromBuilderCall {
            tokenId: token_id,
            amount,
        }
        .abi_encode();
        self.submit(wallet, U256::ZERO, data).await
    }

    pub async fn builder_stake_info(
        &self,
        token_id: U256,
        staker: Address,
    ) -> Result<Option<StakeRecord>, RpcFailure> {
        let data = IProjectStaking::getBuilderStakeInfoCall {
            tokenId: token_id,
            staker,
        }
        .abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IProjectStaking::getBuilderStakeInfoCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(stake_record(
            decoded.amount,
            decoded.timestamp,
            decoded.active,
        ))
    }

    pub async fn builder_total_staked(&self, token_id: U256) -> Result<U256, RpcFailure> {
        let data = IProjectStaking::getBuilderTotalStakedCall { tokenId: token_id }.abi_encode();
        let ret = self.rpc.call(self.address, &data).await?;
        let decoded = IProjectStaking::getBuilderTotalStakedCall::abi_decode_returns(&ret, true)
            .map_err(decode_failure)?;
        Ok(decoded.totalStaked)
    }

    async fn submit(
        &self,
        wallet: &dyn Wallet,
        value: U256,
        data: Vec<u8>,
    ) -> Result<String, MintError> {
        let from = wallet.address().ok_or(MintError::WalletNotConnected)?;
        self.rpc
            .estimate_gas(from, self.address, value, &data)
            .await
            .map_err(mint_failure)?;
        let tx_hash = wallet
            .send_transaction(TransactionRequest {
                to: self.address,
                value,
                data,
                gas_limit: None,
            })
            .await
            .map_err(wallet_failure)?;
        tracing::info!(%tx_hash, "stake transaction submitted");
        Ok(tx_hash)
    }
}

fn stake_record(amount: U256, timestamp: U256, active: bool) -> Option<StakeRecord> {
    if amount.is_zero() && !active {
        return None;
    }
    Some(StakeRecord {
        amount,
        timestamp: timestamp.to::<u64>(),
        active,
    })
}

fn decode_failure(e: alloy_sol_types::Error) -> RpcFailure {
    RpcFailure::Transport(format!("abi decode failed: {e}"))
}
