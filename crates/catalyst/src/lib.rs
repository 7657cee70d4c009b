//! Deployment target resolution and entity upload.
//!
//! # Pipeline
//!
//! 1. **Resolve**: pick an explicit catalyst, an explicit content
//!    server, or the network default ([`resolve`])
//! 2. **Discover**: for the network default, find a healthy catalyst
//! 3. **Upload**: send the signed entity and its content under a single
//!    time budget ([`Uploader`])

pub mod client;
pub mod discovery;
mod error;
mod target;
pub mod uploader;

pub use client::{CatalystClient, ContentServer, DeployPayload};
pub use discovery::{CatalystDiscovery, HttpDiscovery};
pub use error::{ConfigError, UploadError};
pub use target::{DeploymentTarget, resolve};
pub use uploader::{UploadOptions, UploadReceipt, Uploader, parse_timeout, scene_url};
