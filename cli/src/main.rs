use std::str::FromStr;

use alloy_primitives::{Address, U256};
use mammothon_api::prelude::*;
use mammothon_client::builder_nft::BuilderNft;
use mammothon_client::chat::{conversation, Agent, ChatClient};
use mammothon_client::config::Config;
use mammothon_client::mint::{mint_with_fallback, MintOutcome};
use mammothon_client::retry::RetryPolicy;
use mammothon_client::rpc::RpcClient;
use mammothon_client::staking::ProjectStaking;
use mammothon_client::wallet::{resolve_wallet, Wallet};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    let rpc = RpcClient::new(config.rpc_url.clone());
    let wallet = resolve_wallet(&rpc);
    let nft = BuilderNft::new(rpc.clone(), config.builder_nft);
    let staking = ProjectStaking::new(rpc.clone(), config.project_staking);

    match std::env::var("COMMAND")
        .expect("Missing COMMAND env var")
        .as_str()
    {
        "mint" => {
            mint(&nft, wallet.as_ref()).await?;
        }
        "minting" => {
            log_minting(&nft).await?;
        }
        "price" => {
            log_price(&nft).await?;
        }
        "tokens" => {
            log_tokens(&nft).await?;
        }
        "projects" => {
            log_projects(&staking).await?;
        }
        "project" => {
            log_project(&staking).await?;
        }
        "stakes" => {
            log_stakes(&staking, wallet.as_ref()).await?;
        }
        "stake" => {
            stake(&staking, wallet.as_ref()).await?;
        }
        "unstake" => {
            unstake(&staking, wallet.as_ref()).await?;
        }
        "stake_builder" => {
            stake_builder(&staking, wallet.as_ref()).await?;
        }
        "unstake_builder" => {
            unstake_builder(&staking, wallet.as_ref()).await?;
        }
        "builders" => {
            log_builders(&staking, wallet.as_ref()).await?;
        }
        "diagnose" => {
            diagnose(&config, &rpc, &nft, &staking).await?;
        }
        "health" => {
            health(&config).await?;
        }
        "chat" => {
            chat(&config).await?;
        }
        _ => panic!("Invalid command"),
    };
    Ok(())
}

async fn mint(nft: &BuilderNft, wallet: &dyn Wallet) -> Result<(), anyhow::Error> {
    let repo_url = std::env::var("REPO").expect("Missing REPO env var");
    let project = Project::from_str(&std::env::var("PROJECT").expect("Missing PROJECT env var"))?;
    let socials = SocialHandles {
        twitter: std::env::var("TWITTER").ok(),
        farcaster: std::env::var("FARCASTER").ok(),
        lens: std::env::var("LENS").ok(),
    };

    match mint_with_fallback(nft, wallet, &repo_url, project, socials).await? {
        MintOutcome::Minted(result) => {
            println!();
            println!("Mint complete!");
            println!("  Token ID:     {}", result.token_id);
            println!("  Price paid:   {} MON", format_mon(result.mint_price));
            println!("  Transaction:  {}", result.tx_hash);
            println!(
                "  Explorer:     {}",
                explorer_url(ExplorerKind::Tx, &result.tx_hash)
            );
        }
        MintOutcome::AlreadyMinted { token_ids } => {
            println!();
            println!("Already minted. Existing tokens:");
            for id in token_ids {
                println!("  {}", id);
            }
        }
    }
    Ok(())
}

async fn log_minting(nft: &BuilderNft) -> Result<(), anyhow::Error> {
    println!("Contract: {}", nft.address());
    println!("  deployed:        {}", nft.exists().await?);
    println!("  mintingEnabled:  {}", nft.minting_enabled().await?);
    println!("  totalMinted:     {}", nft.total_minted().await?);
    for token in nft.all_minted().await? {
        println!(
            "  #{}  {}/{}",
            token.token_id, token.github_username, token.repo_name
        );
    }
    Ok(())
}

async fn log_price(nft: &BuilderNft) -> Result<(), anyhow::Error> {
    let price = nft.mint_price().await?;
    println!("Mint price: {} MON ({} wei)", format_mon(price), price);
    Ok(())
}

async fn log_tokens(nft: &BuilderNft) -> Result<(), anyhow::Error> {
    let username = std::env::var("GITHUB_USER").expect("Missing GITHUB_USER env var");
    let tokens = nft.user_token_details(&username).await?;
    println!("Tokens for {}: {}", username, tokens.len());
    for token in tokens {
        println!(
            "  #{}  {}/{}",
            token.token_id, token.github_username, token.repo_name
        );
    }
    Ok(())
}

async fn log_projects(staking: &ProjectStaking) -> Result<(), anyhow::Error> {
    println!("Projects");
    for info in staking.projects().await? {
        println!(
            "  {:<12} {:<16} staked: {:>12} MON  stakers: {:>4}  active: {}",
            info.id.id(),
            info.name,
            format_mon(info.total_staked),
            info.stakers_count,
            info.active
        );
    }
    Ok(())
}

async fn log_project(staking: &ProjectStaking) -> Result<(), anyhow::Error> {
    let project = Project::from_str(&std::env::var("PROJECT").expect("Missing PROJECT env var"))?;
    let info = staking.project(project).await?;
    println!("Project {}", info.id.id());
    println!("  name:          {}", info.name);
    println!("  total staked:  {} MON", format_mon(info.total_staked));
    println!("  stakers:       {}", info.stakers_count);
    println!("  active:        {}", info.active);
    Ok(())
}

async fn log_stakes(staking: &ProjectStaking, wallet: &dyn Wallet) -> Result<(), anyhow::Error> {
    let staker = staker_address(wallet)?;
    println!("Stakes for {}", staker);
    for project in Project::ALL {
        match staking.stake_info(project, staker).await? {
            Some(record) => println!(
                "  {:<12} {} MON (active: {})",
                project.id(),
                format_mon(record.amount),
                record.is_active()
            ),
            None => println!("  {:<12} -", project.id()),
        }
    }
    Ok(())
}

async fn stake(staking: &ProjectStaking, wallet: &dyn Wallet) -> Result<(), anyhow::Error> {
    let project = Project::from_str(&std::env::var("PROJECT").expect("Missing PROJECT env var"))?;
    let amount = amount_from_env()?;
    let tx_hash = staking.stake(wallet, project, amount).await?;
    println!("Staked {} MON on {}", format_mon(amount), project.id());
    println!("Transaction: {}", tx_hash);
    println!("Explorer:    {}", explorer_url(ExplorerKind::Tx, &tx_hash));
    refresh_position(staking, wallet, project).await;
    Ok(())
}

async fn unstake(staking: &ProjectStaking, wallet: &dyn Wallet) -> Result<(), anyhow::Error> {
    let project = Project::from_str(&std::env::var("PROJECT").expect("Missing PROJECT env var"))?;
    let amount = amount_from_env()?;
    let tx_hash = staking.unstake(wallet, project, amount).await?;
    println!("Unstaked {} MON from {}", format_mon(amount), project.id());
    println!("Transaction: {}", tx_hash);
    refresh_position(staking, wallet, project).await;
    Ok(())
}

/// Re-read the project and the caller's stake after a transaction so
/// the report shows the post-transaction totals. The transaction may
/// not be mined yet, so failures here are not fatal.
async fn refresh_position(staking: &ProjectStaking, wallet: &dyn Wallet, project: Project) {
    if let Ok(info) = staking.project(project).await {
        println!(
            "Project total: {} MON across {} stakers",
            format_mon(info.total_staked),
            info.stakers_count
        );
    }
    if let Ok(staker) = staker_address(wallet) {
        if let Ok(Some(record)) = staking.stake_info(project, staker).await {
            println!("Your stake:    {} MON", format_mon(record.amount));
        }
    }
}

async fn stake_builder(staking: &ProjectStaking, wallet: &dyn Wallet) -> Result<(), anyhow::Error> {
    let token_id = token_id_from_env()?;
    let amount = amount_from_env()?;
    let tx_hash = staking.stake_on_builder(wallet, token_id, amount).await?;
    println!(
        "Staked {} MON on builder token #{}",
        format_mon(amount),
        token_id
    );
    println!("Transaction: {}", tx_hash);
    Ok(())
}

async fn unstake_builder(
    staking: &ProjectStaking,
    wallet: &dyn Wallet,
) -> Result<(), anyhow::Error> {
    let token_id = token_id_from_env()?;
    let amount = amount_from_env()?;
    let tx_hash = staking
        .unstake_from_builder(wallet, token_id, amount)
        .await?;
    println!(
        "Unstaked {} MON from builder token #{}",
        format_mon(amount),
        token_id
    );
    println!("Transaction: {}", tx_hash);
    Ok(())
}

async fn log_builders(
    staking: &ProjectStaking,
    wallet: &dyn Wallet,
) -> Result<(), anyhow::Error> {
    let token_id = token_id_from_env()?;
    let total = staking.builder_total_staked(token_id).await?;
    println!("Builder token #{}", token_id);
    println!("  total staked: {} MON", format_mon(total));
    if let Ok(staker) = staker_address(wallet) {
        match staking.builder_stake_info(token_id, staker).await? {
            Some(record) => println!(
                "  your stake:   {} MON (active: {})",
                format_mon(record.amount),
                record.is_active()
            ),
            None => println!("  your stake:   -"),
        }
    }
    Ok(())
}

async fn diagnose(
    config: &Config,
    rpc: &RpcClient,
    nft: &BuilderNft,
    staking: &ProjectStaking,
) -> Result<(), anyhow::Error> {
    println!("Diagnostics");
    println!("  RPC:             {}", config.rpc_url);
    println!("  API:             {}", config.api_base_url);
    match rpc.chain_id().await {
        Ok(id) => println!(
            "  chain id:        {} (expected {})",
            id,
            mammothon_api::consts::CHAIN_ID
        ),
        Err(e) => println!("  chain id:        unreachable ({e})"),
    }
    match nft.exists().await {
        Ok(found) => println!("  BuilderNFT:      {} (code: {})", nft.address(), found),
        Err(e) => println!("  BuilderNFT:      check failed ({e})"),
    }
    match staking.exists().await {
        Ok(found) => println!("  ProjectStaking:  {} (code: {})", staking.address(), found),
        Err(e) => println!("  ProjectStaking:  check failed ({e})"),
    }
    match rpc.get_balance(staking.address()).await {
        Ok(balance) => println!("  staking balance: {} MON", format_mon(balance)),
        Err(e) => println!("  staking balance: check failed ({e})"),
    }
    match nft.minting_enabled().await {
        Ok(enabled) => println!("  mintingEnabled:  {}", enabled),
        Err(e) => println!("  mintingEnabled:  check failed ({e})"),
    }
    match nft.mint_price().await {
        Ok(price) => println!("  mintPrice:       {} MON", format_mon(price)),
        Err(e) => println!("  mintPrice:       check failed ({e})"),
    }
    match staking.projects().await {
        Ok(projects) => {
            for info in projects {
                println!(
                    "  project {:<12} staked: {} MON  active: {}",
                    info.id.id(),
                    format_mon(info.total_staked),
                    info.active
                );
            }
        }
        Err(e) => println!("  projects:        check failed ({e})"),
    }
    match ChatClient::new(config.api_base_url.clone()).health().await {
        Ok(healthy) => println!("  chat API:        healthy: {}", healthy),
        Err(e) => println!("  chat API:        check failed ({e})"),
    }
    Ok(())
}

async fn health(config: &Config) -> Result<(), anyhow::Error> {
    let healthy = ChatClient::new(config.api_base_url.clone()).health().await?;
    println!("Chat API at {}: healthy: {}", config.api_base_url, healthy);
    Ok(())
}

async fn chat(config: &Config) -> Result<(), anyhow::Error> {
    let agent = Agent::from_str(&std::env::var("AGENT").expect("Missing AGENT env var"))
        .map_err(anyhow::Error::msg)?;
    let message = std::env::var("MESSAGE").expect("Missing MESSAGE env var");
    let client = ChatClient::new(config.api_base_url.clone());
    let reply = client
        .chat_with_retry(RetryPolicy::default(), agent, &conversation(message))
        .await?;
    println!("{}: {}", agent.display_name(), reply);
    Ok(())
}

fn staker_address(wallet: &dyn Wallet) -> Result<Address, anyhow::Error> {
    match wallet.address() {
        Some(address) => Ok(address),
        None => std::env::var("STAKER")
            .ok()
            .and_then(|s| Address::from_str(s.trim()).ok())
            .ok_or_else(|| anyhow::anyhow!("set WALLET_ADDRESS or STAKER")),
    }
}

fn amount_from_env() -> Result<U256, anyhow::Error> {
    let raw = std::env::var("AMOUNT").expect("Missing AMOUNT env var");
    Ok(parse_mon(&raw)?)
}

fn token_id_from_env() -> Result<U256, anyhow::Error> {
    let raw = std::env::var("TOKEN_ID").expect("Missing TOKEN_ID env var");
    U256::from_str(&raw).map_err(|e| anyhow::anyhow!("Invalid TOKEN_ID: {e}"))
}
