//! Signing session states and operator-facing events.

use scenedeploy_protocol::{ChainId, LinkerResponse};

/// State of a signing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningState {
    /// Nothing requested yet.
    Idle,
    /// Waiting for the operator to sign at `url`.
    SessionOpen { url: String },
    /// Signature received. Terminal.
    Signed(LinkerResponse),
    /// Cancelled by the operator or closed by the host. Terminal.
    Aborted { reason: String },
}

impl SigningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Signed(_) | Self::Aborted { .. })
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::SessionOpen { .. })
    }
}

/// Events emitted while signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningEvent {
    /// Signer page is ready at `url`.
    Ready { url: String },
    /// The entity was signed.
    Signed {
        address: String,
        signature: String,
        chain_id: ChainId,
    },
    /// The session ended without a signature.
    Aborted { reason: String },
}
