//! Content server access.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use scenedeploy_protocol::{AuthChain, AvailableContent};

use crate::error::UploadError;

/// Everything a content server needs to accept one entity.
pub struct DeployPayload<'a> {
    pub entity_id: &'a str,
    pub entity_file: &'a [u8],
    pub auth_chain: AuthChain,
    /// Content blobs to send, keyed by hash.
    pub files: Vec<(&'a str, &'a [u8])>,
}

/// Operations the uploader needs from a content server.
pub trait ContentServer: Send + Sync {
    /// Returns the subset of `hashes` the server already stores.
    fn available_content<'a>(
        &'a self,
        content_url: &'a str,
        hashes: &'a [&'a str],
    ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, UploadError>> + Send + 'a>>;

    /// Submits one deployment. A non-success answer is
    /// [`UploadError::Rejected`].
    fn deploy_entity<'a>(
        &'a self,
        content_url: &'a str,
        payload: DeployPayload<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>>;
}

/// Hashes per `available-content` query, keeping the URL short.
pub const AVAILABLE_CONTENT_BATCH: usize = 100;

/// Content server client over HTTP.
#[derive(Clone)]
pub struct CatalystClient {
    http: reqwest::Client,
}

impl CatalystClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for CatalystClient {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

/// Builds the multipart body of `POST /entities`.
fn deploy_form(payload: DeployPayload<'_>) -> Result<Form, UploadError> {
    let mut form = Form::new().text("entityId", payload.entity_id.to_string());

    for (i, link) in payload.auth_chain.links().iter().enumerate() {
        form = form
            .text(format!("authChain[{i}][type]"), link.link_type.as_str())
            .text(format!("authChain[{i}][payload]"), link.payload.clone())
            .text(format!("authChain[{i}][signature]"), link.signature.clone());
    }

    for (hash, data) in payload.files {
        let part = Part::bytes(data.to_vec())
            .file_name(hash.to_string())
            .mime_str("application/octet-stream")?;
        form = form.part(hash.to_string(), part);
    }

    let entity = Part::bytes(payload.entity_file.to_vec())
        .file_name(payload.entity_id.to_string())
        .mime_str("application/json")?;
    Ok(form.part(payload.entity_id.to_string(), entity))
}

impl CatalystClient {
    async fn available_batch(
        &self,
        content_url: &str,
        batch: &[&str],
    ) -> Result<Vec<AvailableContent>, UploadError> {
        let query: Vec<(&str, &str)> = batch.iter().map(|h| ("cid", *h)).collect();
        let resp = self
            .http
            .get(format!("{content_url}/available-content"))
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))
    }
}

impl ContentServer for CatalystClient {
    fn available_content<'a>(
        &'a self,
        content_url: &'a str,
        hashes: &'a [&'a str],
    ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, UploadError>> + Send + 'a>> {
        Box::pin(async move {
            let mut found = HashSet::new();
            for batch in hashes.chunks(AVAILABLE_CONTENT_BATCH) {
                let entries = self.available_batch(content_url, batch).await?;
                found.extend(entries.into_iter().filter(|e| e.available).map(|e| e.cid));
            }
            Ok(found)
        })
    }

    fn deploy_entity<'a>(
        &'a self,
        content_url: &'a str,
        payload: DeployPayload<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + 'a>> {
        Box::pin(async move {
            let entity_id = payload.entity_id;
            let parts = payload.files.len();
            let form = deploy_form(payload)?;

            debug!(%entity_id, parts, "posting deployment");
            let resp = self
                .http
                .post(format!("{content_url}/entities"))
                .multipart(form)
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                return Ok(());
            }
            let body = resp.text().await.unwrap_or_default();
            Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            })
        })
    }
}
