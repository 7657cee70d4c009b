//! Scene deploy flow: build, package, sign, upload.
//!
//! This crate chains the pipeline stages into one transaction with a
//! single [`DeploymentOutcome`]. It has no terminal or process concerns;
//! the CLI supplies the collaborators (builder, signer host, uploader,
//! confirmation prompt) and renders the [`DeployEvent`] stream.
//!
//! # Pipeline
//!
//! 1. **Resolve** the deployment target
//! 2. **Build** the project (`npm run build`)
//! 3. **Package** the project files into a content-addressed entity
//! 4. **Validate** the scene descriptor
//! 5. **Sign** the entity id through the local signer page
//! 6. **Upload** the entity and its content within the upload budget

pub mod builder;
pub mod deploy;
pub mod error;
pub mod scene;
pub mod types;
pub mod version;

pub use builder::{NpmBuilder, ProjectBuilder};
pub use deploy::{Collaborators, DeployOrchestrator};
pub use error::{BuildError, DeployError, SceneError};
pub use scene::{SceneDescriptor, SceneParcels};
pub use types::{
    AutoConfirm, Confirmation, DeployConfig, DeployEvent, DeploySummary, DeploymentOutcome,
};
pub use version::{MIN_SDK_VERSION, VersionCheck, check_sdk_version};
