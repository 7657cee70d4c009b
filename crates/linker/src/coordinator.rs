//! Signing coordinator and the handle inbound events arrive through.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use scenedeploy_protocol::{AuthChain, LinkerResponse};

use crate::browser::BrowserLauncher;
use crate::error::LinkerError;
use crate::session::{SigningEvent, SigningState};

/// What the signer page is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub entity_id: String,
    pub pointers: Vec<String>,
}

/// Something that can host a signing session and hand back its URL.
///
/// [`LinkerServer`](crate::LinkerServer) is the production host; tests use
/// in-memory hosts that keep the handle and deliver events directly.
pub trait SignerHost: Send + Sync {
    /// Opens a session for `request`. Inbound results must be delivered
    /// through `handle`.
    fn open_session(
        &self,
        request: SessionRequest,
        handle: SigningHandle,
    ) -> Pin<Box<dyn Future<Output = Result<String, LinkerError>> + Send + '_>>;
}

/// Sending side of a signing session, held by the host.
#[derive(Clone)]
pub struct SigningHandle {
    state: Arc<watch::Sender<SigningState>>,
    events_tx: mpsc::Sender<SigningEvent>,
    done: CancellationToken,
    released: CancellationToken,
}

impl SigningHandle {
    /// Delivers a signed result.
    ///
    /// Only the first result of an open session is accepted. Returns
    /// `false`, leaving the session untouched, otherwise.
    pub fn signed(&self, response: LinkerResponse) -> bool {
        let accepted = self.state.send_if_modified(|state| {
            if state.is_open() {
                *state = SigningState::Signed(response.clone());
                true
            } else {
                false
            }
        });

        if accepted {
            info!(address = %response.address, chain = ?response.chain_id, "content signed");
            let _ = self.events_tx.try_send(SigningEvent::Signed {
                address: response.address,
                signature: response.signature,
                chain_id: response.chain_id,
            });
            self.done.cancel();
        } else {
            debug!("ignoring signed event, session not open");
        }
        accepted
    }

    /// Closes the session from the host side.
    pub fn close(&self, reason: &str) -> bool {
        abort_session(&self.state, &self.events_tx, &self.done, reason)
    }

    /// Whether the session still accepts a signature.
    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    /// Resolves once the coordinator that opened the session is gone or
    /// the run was cancelled. Hosts keep serving until then.
    pub async fn released(&self) {
        self.released.cancelled().await;
    }
}

fn abort_session(
    state: &watch::Sender<SigningState>,
    events_tx: &mpsc::Sender<SigningEvent>,
    done: &CancellationToken,
    reason: &str,
) -> bool {
    let aborted = state.send_if_modified(|s| {
        if s.is_open() {
            *s = SigningState::Aborted {
                reason: reason.to_string(),
            };
            true
        } else {
            false
        }
    });
    if aborted {
        warn!(reason, "signing session aborted");
        let _ = events_tx.try_send(SigningEvent::Aborted {
            reason: reason.to_string(),
        });
        done.cancel();
    }
    aborted
}

/// A signed entity together with its authentication chain.
#[derive(Debug)]
pub struct SignedEntity {
    pub entity_id: String,
    pub response: LinkerResponse,
    pub auth_chain: AuthChain,
}

/// Drives one signing session for one entity id.
///
/// Consumed by [`finish`](Self::finish), so a coordinator can never sign
/// a second entity.
pub struct SigningCoordinator {
    state: Arc<watch::Sender<SigningState>>,
    events_tx: mpsc::Sender<SigningEvent>,
    events_rx: Option<mpsc::Receiver<SigningEvent>>,
    cancel: CancellationToken,
    done: CancellationToken,
    browser: Option<BrowserLauncher>,
    entity_id: Option<String>,
    released: CancellationToken,
    _release_on_drop: DropGuard,
}

impl SigningCoordinator {
    /// Creates an idle coordinator. Cancelling `cancel` aborts the wait.
    pub fn new(cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(SigningState::Idle);
        let (events_tx, events_rx) = mpsc::channel(16);
        let done = cancel.child_token();
        let released = cancel.child_token();
        Self {
            state: Arc::new(state),
            events_tx,
            events_rx: Some(events_rx),
            cancel,
            done,
            browser: None,
            entity_id: None,
            _release_on_drop: released.clone().drop_guard(),
            released,
        }
    }

    /// Opens the signer page in a browser once the session is ready.
    pub fn with_browser(mut self, launcher: BrowserLauncher) -> Self {
        self.browser = Some(launcher);
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SigningEvent>> {
        self.events_rx.take()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SigningState {
        self.state.borrow().clone()
    }

    /// The received signature, once signed.
    pub fn signature(&self) -> Option<LinkerResponse> {
        match &*self.state.borrow() {
            SigningState::Signed(response) => Some(response.clone()),
            _ => None,
        }
    }

    /// Opens a session for `request` on `host` and returns its URL.
    pub async fn start_signing(
        &mut self,
        request: SessionRequest,
        host: &dyn SignerHost,
    ) -> Result<String, LinkerError> {
        if !matches!(*self.state.borrow(), SigningState::Idle) {
            return Err(LinkerError::AlreadyStarted);
        }

        let entity_id = request.entity_id.clone();
        let handle = SigningHandle {
            state: self.state.clone(),
            events_tx: self.events_tx.clone(),
            done: self.done.clone(),
            released: self.released.clone(),
        };

        let url = match host.open_session(request, handle).await {
            Ok(url) => url,
            Err(e) => {
                self.state.send_replace(SigningState::Aborted {
                    reason: e.to_string(),
                });
                self.done.cancel();
                return Err(e);
            }
        };

        self.state.send_if_modified(|s| {
            if matches!(s, SigningState::Idle) {
                *s = SigningState::SessionOpen { url: url.clone() };
                true
            } else {
                false
            }
        });
        self.entity_id = Some(entity_id.clone());

        info!(entity_id = %entity_id, %url, "signing session ready");
        let _ = self
            .events_tx
            .try_send(SigningEvent::Ready { url: url.clone() });

        if let Some(browser) = &self.browser {
            browser.launch(url.clone(), self.done.clone());
        }

        Ok(url)
    }

    /// Waits, without a deadline, for the session to be signed.
    async fn wait(&self) -> Result<LinkerResponse, LinkerError> {
        if matches!(*self.state.borrow(), SigningState::Idle) {
            return Err(LinkerError::NotStarted);
        }

        let mut rx = self.state.subscribe();
        tokio::select! {
            biased;
            res = rx.wait_for(SigningState::is_terminal) => {
                if res.is_err() {
                    self.abort("session dropped");
                }
            }
            _ = self.cancel.cancelled() => {
                self.abort("cancelled by operator");
            }
        }

        match &*self.state.borrow() {
            SigningState::Signed(response) => Ok(response.clone()),
            SigningState::Aborted { reason } => Err(LinkerError::Aborted(reason.clone())),
            SigningState::Idle => Err(LinkerError::NotStarted),
            SigningState::SessionOpen { .. } => {
                Err(LinkerError::Aborted("session still open".into()))
            }
        }
    }

    fn abort(&self, reason: &str) -> bool {
        abort_session(&self.state, &self.events_tx, &self.done, reason)
    }

    /// Waits for the signature and builds the authentication chain.
    pub async fn finish(self) -> Result<SignedEntity, LinkerError> {
        let response = self.wait().await?;
        let entity_id = self.entity_id.clone().ok_or(LinkerError::NotStarted)?;
        let auth_chain = AuthChain::simple(&entity_id, &response.address, &response.signature);
        Ok(SignedEntity {
            entity_id,
            response,
            auth_chain,
        })
    }

    /// [`finish`](Self::finish) with an optional ceiling on the wait.
    ///
    /// `None` waits indefinitely. On expiry the session is aborted so the
    /// host stops accepting signatures.
    pub async fn finish_within(
        self,
        deadline: Option<Duration>,
    ) -> Result<SignedEntity, LinkerError> {
        let Some(deadline) = deadline else {
            return self.finish().await;
        };

        let state = self.state.clone();
        let events_tx = self.events_tx.clone();
        let done = self.done.clone();
        match tokio::time::timeout(deadline, self.finish()).await {
            Ok(result) => result,
            Err(_) => {
                abort_session(&state, &events_tx, &done, "signing deadline exceeded");
                Err(LinkerError::DeadlineExceeded(deadline))
            }
        }
    }
}
