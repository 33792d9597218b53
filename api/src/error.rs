use thiserror::Error;

/// Error taxonomy for the mint and stake flows. Contract reverts reach
/// us as raw message strings, so [`MintError::classify`] does a
/// best-effort substring match to turn them into the user-facing
/// variants; anything unrecognized falls back to [`MintError::Other`]
/// carrying the raw text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MintError {
    #[error("Transaction was rejected in your wallet. Please try again.")]
    WalletRejected,

    #[error("Your wallet has insufficient funds to complete this transaction.")]
    InsufficientFunds,

    #[error("Payment required: {0} MON is required to mint this NFT.")]
    InsufficientPayment(String),

    #[error("NFT minting is currently disabled by the contract owner.")]
    MintingDisabled,

    #[error("The generated metadata is too large. Please try with fewer details.")]
    MetadataTooLarge,

    #[error(
        "You've already minted an NFT for this GitHub username and project \
         combination. Try a different repository or project."
    )]
    DuplicateMint,

    #[error("Please connect your wallet first.")]
    WalletNotConnected,

    #[error(
        "Invalid GitHub repository URL: {0}. Please enter a valid URL \
         (e.g. https://github.com/username/repo)"
    )]
    InvalidRepoUrl(String),

    #[error("unknown project id: {0}")]
    UnknownProject(String),

    #[error("invalid MON amount: {0}")]
    InvalidAmount(String),

    #[error("rate limited")]
    RateLimited,

    #[error("max retries exceeded")]
    MaxRetriesExceeded,

    /// A raw node/contract error that has not been classified yet.
    #[error("{0}")]
    Rpc(String),

    #[error("Failed to mint NFT: {0}")]
    Other(String),
}

/// Substrings that indicate the primary mint failed in gas estimation
/// or simulation rather than for a reason the user can act on. These
/// trigger the force-mint fallback.
const GAS_ESTIMATION_SIGNATURES: [&str; 5] = [
    "gas",
    "ERC721",
    "UNPREDICTABLE_GAS_LIMIT",
    "CALL_EXCEPTION",
    "execution reverted",
];

impl MintError {
    /// True when a raw error message matches a gas-estimation or
    /// simulation failure signature.
    pub fn is_gas_estimation_failure(message: &str) -> bool {
        GAS_ESTIMATION_SIGNATURES
            .iter()
            .any(|sig| message.contains(sig))
    }

    /// Map a raw error message to a user-facing variant. Most specific
    /// patterns are checked first; `mint_price` (a formatted MON
    /// amount) fills in the payment-required message.
    pub fn classify(message: &str, mint_price: &str) -> Self {
        if message.contains("ACTION_REJECTED")
            || message.contains("rejected")
            || message.contains("denied")
        {
            MintError::WalletRejected
        } else if message.contains("insufficient funds") {
            MintError::InsufficientFunds
        } else if message.contains("insufficient payment") {
            MintError::InsufficientPayment(mint_price.to_string())
        } else if message.contains("minting is disabled") {
            MintError::MintingDisabled
        } else if message.contains("URI too long") {
            MintError::MetadataTooLarge
        } else if message.contains("ERC721: token already minted")
            || message.contains("already has an NFT")
        {
            MintError::DuplicateMint
        } else {
            MintError::Other(message.to_string())
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, MintError::DuplicateMint)
    }
}
