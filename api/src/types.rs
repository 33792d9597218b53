use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::consts::WEI_PER_MON;
use crate::error::MintError;

/// The fixed set of hackathon projects a builder NFT can be minted
/// against. The staking contract normalizes ids to lowercase, so
/// parsing is case-insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Project {
    Vocafi,
    Clarity,
    Worldie,
    Mammothon,
}

impl Project {
    pub const ALL: [Project; 4] = [
        Project::Vocafi,
        Project::Clarity,
        Project::Worldie,
        Project::Mammothon,
    ];

    /// The on-chain project id.
    pub fn id(&self) -> &'static str {
        match self {
            Project::Vocafi => "vocafi",
            Project::Clarity => "clarity",
            Project::Worldie => "worldie",
            Project::Mammothon => "mammothon",
        }
    }

    /// Human-readable project name.
    pub fn name(&self) -> &'static str {
        match self {
            Project::Vocafi => "VocaFI",
            Project::Clarity => "Clarity",
            Project::Worldie => "Hello World Computer",
            Project::Mammothon => "Mammothon",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Project {
    type Err = MintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vocafi" => Ok(Project::Vocafi),
            "clarity" => Ok(Project::Clarity),
            "worldie" => Ok(Project::Worldie),
            "mammothon" => Ok(Project::Mammothon),
            other => Err(MintError::UnknownProject(other.to_string())),
        }
    }
}

/// Owner and repository name parsed from a GitHub repository URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub username: String,
    pub repo_name: String,
}

impl RepoInfo {
    /// Parse `.../github.com/<owner>/<repo>` out of a repository URL.
    /// A trailing `.git` on the repo segment is stripped. Returns `None`
    /// when the owner/repo segments are missing or empty.
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.split("github.com/").nth(1)?;
        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let username = segments.next()?.to_string();
        let repo = segments.next()?;
        let repo_name = repo.strip_suffix(".git").unwrap_or(repo).to_string();
        if username.is_empty() || repo_name.is_empty() {
            return None;
        }
        Some(Self {
            username,
            repo_name,
        })
    }

    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.username, self.repo_name)
    }
}

/// Optional social handles embedded in the NFT metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialHandles {
    pub twitter: Option<String>,
    pub farcaster: Option<String>,
    pub lens: Option<String>,
}

/// Everything needed to mint one builder NFT. The contract enforces
/// that (github username, project) is unique per minted token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintRequest {
    pub repo: RepoInfo,
    pub project: Project,
    pub socials: SocialHandles,
}

/// Produced only on a successful mint; immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintResult {
    pub token_id: U256,
    pub tx_hash: String,
    /// Price paid, in wei.
    pub mint_price: U256,
}

/// A staker's position against a project or a builder token.
/// `active` is false once the staked amount reaches zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StakeRecord {
    /// Staked amount in wei.
    pub amount: U256,
    /// Unix timestamp of the last stake change.
    pub timestamp: u64,
    pub active: bool,
}

impl StakeRecord {
    pub fn is_active(&self) -> bool {
        self.active && !self.amount.is_zero()
    }
}

/// One row of the project staking listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectInfo {
    pub id: Project,
    pub name: String,
    /// Total staked across all stakers, in wei.
    pub total_staked: U256,
    pub stakers_count: u64,
    pub active: bool,
}

/// Details of one minted builder NFT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub token_id: U256,
    pub github_username: String,
    pub repo_name: String,
}

/// Format a wei amount as a decimal MON string, trailing zeros trimmed.
pub fn format_mon(wei: U256) -> String {
    let unit = U256::from(WEI_PER_MON);
    let whole = wei / unit;
    let frac = wei % unit;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>18}", frac.to_string());
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}

/// Parse a decimal MON string (up to 18 fractional digits) into wei.
pub fn parse_mon(s: &str) -> Result<U256, MintError> {
    let s = s.trim();
    let invalid = || MintError::InvalidAmount(s.to_string());
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > 18 {
        return Err(invalid());
    }
    let whole: U256 = if whole.is_empty() {
        U256::ZERO
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut wei = whole
        .checked_mul(U256::from(WEI_PER_MON))
        .ok_or_else(invalid)?;
    if !frac.is_empty() {
        let padded = format!("{frac:0<18}");
        let frac_wei: U256 = padded.parse().map_err(|_| invalid())?;
        wei = wei.checked_add(frac_wei).ok_or_else(invalid)?;
    }
    Ok(wei)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_repo_url() {
        let info = RepoInfo::parse("https://github.com/alice/my-repo").unwrap();
        assert_eq!(info.username, "alice");
        assert_eq!(info.repo_name, "my-repo");
    }

    #[test]
    fn parses_git_suffix_and_extra_segments() {
        let info = RepoInfo::parse("git@github.com/alice/my-repo.git").unwrap();
        assert_eq!(info.repo_name, "my-repo");

        let info = RepoInfo::parse("https://github.com/alice/my-repo/tree/main").unwrap();
        assert_eq!(info.username, "alice");
        assert_eq!(info.repo_name, "my-repo");
    }

    #[test]
    fn rejects_incomplete_repo_urls() {
        assert_eq!(RepoInfo::parse("https://github.com/alice"), None);
        assert_eq!(RepoInfo::parse("https://github.com/"), None);
        assert_eq!(RepoInfo::parse("https://example.com/alice/repo"), None);
    }

    #[test]
    fn project_ids_are_case_insensitive() {
        assert_eq!("VocaFI".parse::<Project>().unwrap(), Project::Vocafi);
        assert_eq!("MAMMOTHON".parse::<Project>().unwrap(), Project::Mammothon);
        assert!("nonexistent".parse::<Project>().is_err());
    }

    #[test]
    fn formats_mon_amounts() {
        assert_eq!(format_mon(U256::from(WEI_PER_MON)), "1");
        assert_eq!(format_mon(U256::from(WEI_PER_MON / 2)), "0.5");
        assert_eq!(format_mon(U256::from(1_000_000_000_000_000u128)), "0.001");
        assert_eq!(format_mon(U256::ZERO), "0");
    }

    #[test]
    fn parses_mon_amounts() {
        assert_eq!(parse_mon("1").unwrap(), U256::from(WEI_PER_MON));
        assert_eq!(parse_mon("0.001").unwrap(), U256::from(1_000_000_000_000_000u128));
        assert_eq!(parse_mon(".5").unwrap(), U256::from(WEI_PER_MON / 2));
        assert!(parse_mon("").is_err());
        assert!(parse_mon("not-a-number").is_err());
        assert!(parse_mon("1.0000000000000000001").is_err());
    }

    #[test]
    fn stake_record_activity() {
        let zero = StakeRecord::default();
        assert!(!zero.is_active());

        let live = StakeRecord {
            amount: U256::from(10u64),
            timestamp: 1_700_000_000,
            active: true,
        };
        assert!(live.is_active());
    }
}
