//! Local signer endpoint.
//!
//! Serves the signer page and the entity info it needs, and accepts the
//! signed result. The server keeps answering, with `409` once the session
//! is settled, until the coordinator is released or the run is cancelled.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use scenedeploy_protocol::constants::DEFAULT_LINKER_PORT;
use scenedeploy_protocol::{EntityInfoResponse, LinkerResponse};

use crate::coordinator::{SessionRequest, SignerHost, SigningHandle};
use crate::error::LinkerError;

/// Where the signer endpoint listens.
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Interface to bind.
    pub bind_ip: IpAddr,
    /// TCP port (0 = OS-assigned).
    pub port: u16,
    /// Host name used in the session URL shown to the operator.
    pub public_host: String,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_LINKER_PORT,
            public_host: "localhost".into(),
        }
    }
}

/// Wallet page served at `/`. Same origin as the API.
const SIGNER_PAGE: &str = include_str!("signer.html");

#[derive(Clone)]
struct AppState {
    handle: SigningHandle,
    info: EntityInfoResponse,
}

/// HTTP host for signing sessions.
pub struct LinkerServer {
    config: LinkerConfig,
    cancel: CancellationToken,
}

impl LinkerServer {
    pub fn new(config: LinkerConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Stops any running session server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(signer_page))
        .route("/api/entity", get(entity_info))
        .route("/api/signed", post(signed))
        .route("/api/cancel", post(cancel))
        .with_state(state)
}

async fn signer_page() -> Html<&'static str> {
    Html(SIGNER_PAGE)
}

async fn entity_info(State(state): State<AppState>) -> Json<EntityInfoResponse> {
    Json(state.info)
}

async fn signed(State(state): State<AppState>, Json(body): Json<LinkerResponse>) -> StatusCode {
    if !body.is_well_formed() {
        warn!(address = %body.address, "rejecting malformed signature");
        return StatusCode::BAD_REQUEST;
    }
    if state.handle.signed(body) {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    }
}

async fn cancel(State(state): State<AppState>) -> StatusCode {
    if state.handle.close("closed by signer page") {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    }
}

impl SignerHost for LinkerServer {
    fn open_session(
        &self,
        request: SessionRequest,
        handle: SigningHandle,
    ) -> Pin<Box<dyn Future<Output = Result<String, LinkerError>> + Send + '_>> {
        Box::pin(async move {
            let addr = SocketAddr::new(self.config.bind_ip, self.config.port);
            let listener = TcpListener::bind(addr).await?;
            let local_addr = listener.local_addr()?;
            info!("signer endpoint listening on {local_addr}");

            let url = format!(
                "http://{}:{}/?entity={}",
                self.config.public_host,
                local_addr.port(),
                request.entity_id
            );

            let app = router(AppState {
                handle: handle.clone(),
                info: EntityInfoResponse {
                    entity_id: request.entity_id,
                    pointers: request.pointers,
                },
            });

            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                let shutdown = async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = handle.released() => {}
                    }
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    warn!("signer endpoint error: {e}");
                }
                info!("signer endpoint stopped");
            });

            Ok(url)
        })
    }
}
