use serde::{Deserialize, Serialize};

use crate::types::ChainId;

// ---------------------------------------------------------------------------
// Local signer endpoint
// ---------------------------------------------------------------------------

/// Signed result posted back by the signer page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkerResponse {
    pub address: String,
    pub signature: String,
    pub chain_id: ChainId,
}

impl LinkerResponse {
    /// Checks the shape of the address (`0x` + 40 hex) and signature
    /// (`0x` + hex). Does not verify the signature itself.
    pub fn is_well_formed(&self) -> bool {
        fn hex_body(s: &str) -> Option<&str> {
            s.strip_prefix("0x")
                .filter(|b| !b.is_empty() && b.chars().all(|c| c.is_ascii_hexdigit()))
        }
        let address_ok = hex_body(&self.address).is_some_and(|b| b.len() == 40);
        let signature_ok = hex_body(&self.signature).is_some();
        address_ok && signature_ok
    }
}

/// What the signer page needs to know about the pending entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfoResponse {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pointers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Catalyst
// ---------------------------------------------------------------------------

/// Entry of the catalyst list served by `/lambdas/contracts/servers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalystServer {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Entry of `/content/available-content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableContent {
    pub cid: String,
    pub available: bool,
}
