//! Solidity ABIs for the deployed contracts, declared with alloy's
//! `sol!` macro. The contracts themselves are external and immutable;
//! only the entry points the client actually calls are declared here.

#![allow(missing_docs)]

use alloy_sol_types::sol;

sol! {
    /// BuilderNFT: one commemorative token per (github username,
    /// project) pair. `forceMint` takes the same arguments as
    /// `mintBuilderNFT` but is intended for callers that skip
    /// client-side gas estimation.
    #[derive(Debug)]
    interface IBuilderNFT {
        function mintingEnabled() external view returns (bool enabled);
        function mintPrice() external view returns (uint256 price);
        function totalMinted() external view returns (uint256 count);

        function hasReceivedNFT(string githubUsername, string projectId)
            external view returns (bool hasTokens, uint256 tokenCount);
        function getTokensForGithubUser(string githubUsername)
            external view returns (uint256[] tokenIds);
        function getGithubUsernameByToken(uint256 tokenId)
            external view returns (string githubUsername);
        function getRepoByToken(uint256 tokenId)
            external view returns (string repoName);

        function mintBuilderNFT(
            address to,
            string tokenURI,
            string githubUsername,
            string projectId,
            string repoName
        ) external payable returns (uint256 tokenId);

        function forceMint(
            address to,
            string tokenURI,
            string githubUsername,
            string projectId,
            string repoName
        ) external payable returns (uint256 tokenId);
    }

    /// ProjectStaking: native-token stakes against a project id or an
    /// individual builder token. Project ids are normalized to
    /// lowercase on-chain.
    #[derive(Debug)]
    interface IProjectStaking {
        function getAllProjectIds() external view returns (string[] ids);
        function projectExists(string projectId) external view returns (bool exists);
        function getProject(string projectId) external view returns (
            string id,
            string name,
            uint256 totalStaked,
            uint256 stakersCount,
            bool active
        );

        function stake(string projectId) external payable;
        function unstake(string projectId, uint256 amount) external;
        function getStakeInfo(string projectId, address staker)
            external view returns (uint256 amount, uint256 timestamp, bool active);

        function stakeOnBuilder(uint256 tokenId) external payable;
        function unstakeFromBuilder(uint256 tokenId, uint256 amount) external;
        function getBuilderStakeInfo(uint256 tokenId, address staker)
            external view returns (uint256 amount, uint256 timestamp, bool active);
        function getBuilderTotalStaked(uint256 tokenId)
            external view returns (uint256 totalStaked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    #[test]
    fn mint_call_encodes_selector_and_args() {
        let call = IBuilderNFT::mintBuilderNFTCall {
            to: alloy_primitives::Address::ZERO,
            tokenURI: "data:application/json;base64,e30=".to_string(),
            githubUsername: "alice".to_string(),
            projectId: "vocafi".to_string(),
            repoName: "my-repo".to_string(),
        };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], IBuilderNFT::mintBuilderNFTCall::SELECTOR);
        let decoded = IBuilderNFT::mintBuilderNFTCall::abi_decode(&encoded, true).unwrap();
        assert_eq!(decoded.githubUsername, "alice");
        assert_eq!(decoded.projectId, "vocafi");
    }

    #[test]
    fn force_mint_matches_mint_argument_shape() {
        // The fallback path must be callable with identical arguments.
        let encoded = IBuilderNFT::forceMintCall {
            to: alloy_primitives::Address::ZERO,
            tokenURI: String::new(),
            githubUsername: "alice".to_string(),
            projectId: "vocafi".to_string(),
            repoName: "my-repo".to_string(),
        }
        .abi_encode();
        assert_eq!(&encoded[..4], IBuilderNFT::forceMintCall::SELECTOR);
        assert_ne!(
            IBuilderNFT::forceMintCall::SELECTOR,
            IBuilderNFT::mintBuilderNFTCall::SELECTOR
        );
    }
}
