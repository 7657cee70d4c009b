//! Wire types shared by the scene deploy pipeline.
//!
//! Everything that crosses a process boundary lives here: the chain
//! identifiers reported by the signer, the authentication chain attached
//! to a deployment, and the JSON payloads exchanged with the local signer
//! endpoint and remote catalysts.

pub mod auth;
pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use auth::{AuthChain, AuthLink, AuthLinkType};
pub use messages::{AvailableContent, CatalystServer, EntityInfoResponse, LinkerResponse};
pub use types::{ChainId, Network, ParseNetworkError};
