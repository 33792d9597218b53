use alloy_primitives::Address;

use mammothon_api::consts::{
    API_BASE_URL_DEV, API_BASE_URL_PROD, BUILDER_NFT_ADDRESS, PROJECT_STAKING_ADDRESS, RPC_URL,
};

/// Which chat API deployment to talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Select from `MAMMOTHON_ENV` ("production" or anything else for
    /// development).
    pub fn detect() -> Self {
        match std::env::var("MAMMOTHON_ENV") {
            Ok(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn api_base_url(&self) -> &'static str {
        match self {
            Environment::Development => API_BASE_URL_DEV,
            Environment::Production => API_BASE_URL_PROD,
        }
    }
}

/// Resolved endpoints and contract addresses for one run.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub rpc_url: String,
    pub api_base_url: String,
    pub builder_nft: Address,
    pub project_staking: Address,
}

impl Config {
    /// Build from the environment, with `RPC` overriding the default
    /// endpoint the same way the operational scripts allow.
    pub fn from_env() -> Self {
        let environment = Environment::detect();
        Self {
            environment,
            rpc_url: std::env::var("RPC").unwrap_or_else(|_| RPC_URL.to_string()),
            api_base_url: environment.api_base_url().to_string(),
            builder_nft: BUILDER_NFT_ADDRESS,
            project_staking: PROJECT_STAKING_ADDRESS,
        }
    }
}
