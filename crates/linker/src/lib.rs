//! Operator signing handshake.
//!
//! The entity id must be signed by a wallet the operator controls. This
//! crate opens a local signer endpoint, points the operator's browser at
//! it and waits, without a built-in deadline, until the page posts the
//! signature back or the session is aborted.
//!
//! # Lifecycle
//!
//! 1. **Idle**: coordinator created with a cancellation token
//! 2. **Session open**: [`SigningCoordinator::start_signing`] asks a
//!    [`SignerHost`] for a session URL and emits [`SigningEvent::Ready`]
//! 3. **Signed** or **Aborted**: the first inbound signature wins; later
//!    ones are ignored

mod browser;
pub mod coordinator;
mod error;
pub mod server;
pub mod session;

pub use browser::BrowserLauncher;
pub use coordinator::{SessionRequest, SignedEntity, SignerHost, SigningCoordinator, SigningHandle};
pub use error::LinkerError;
pub use server::{LinkerConfig, LinkerServer};
pub use session::{SigningEvent, SigningState};
