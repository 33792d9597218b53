use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_TOKEN_URI_BYTES;
use crate::error::MintError;
use crate::types::MintRequest;

/// ERC-1155 style token metadata embedded directly in the token URI as
/// a base64 data URI, so no off-chain storage is needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub external_url: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    fn new(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.into(),
        }
    }
}

impl NftMetadata {
    /// Build the metadata payload for a mint request: repository info,
    /// project id and any social handles, as attribute traits.
    pub fn for_mint(request: &MintRequest) -> Self {
        let repo = &request.repo;
        let mut attributes = vec![
            Attribute::new("GitHub", repo.username.clone()),
            Attribute::new("Project", request.project.id()),
            Attribute::new("Repository", repo.repo_name.clone()),
        ];
        if let Some(twitter) = &request.socials.twitter {
            attributes.push(Attribute::new("Twitter", twitter.clone()));
        }
        if let Some(farcaster) = &request.socials.farcaster {
            attributes.push(Attribute::new("Farcaster", farcaster.clone()));
        }
        if let Some(lens) = &request.socials.lens {
            attributes.push(Attribute::new("Lens", lens.clone()));
        }
        Self {
            name: format!("{} Builder: {}", request.project.name(), repo.username),
            description: format!(
                "Commemorates {}'s work on {} for the {} project at Mammothon.",
                repo.username,
                repo.repo_name,
                request.project.name()
            ),
            external_url: repo.url(),
            attributes,
        }
    }

    /// Serialize into `data:application/json;base64,...`, refusing
    /// payloads over the contract's URI limit.
    pub fn to_data_uri(&self) -> Result<String, MintError> {
        let json = serde_json::to_string(self)
            .map_err(|e| MintError::Other(format!("metadata serialization failed: {e}")))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);
        let uri = format!("data:application/json;base64,{encoded}");
        if uri.len() > MAX_TOKEN_URI_BYTES {
            return Err(MintError::MetadataTooLarge);
        }
        Ok(uri)
    }
}
