//! Content-addressed entity manifests.
//!
//! Turns a project's files into an [`EntityDescriptor`]: every file is
//! addressed by the SHA-256 of its bytes and the entity id is the hash of
//! the canonical manifest. The [`scanner`] module collects the file set
//! from disk, honouring the project's ignore file.

mod error;
mod hash;
pub mod ignore_file;
mod manifest;
pub mod scanner;

pub use error::{ManifestError, ScanError};
pub use hash::ContentHash;
pub use ignore_file::{DEFAULT_IGNORE_PATTERNS, IgnoreList, ensure_ignore_file};
pub use manifest::{
    ContentAddressedFile, EntityDescriptor, EntityType, FileSet, build_entity,
    build_entity_with_limit,
};
pub use scanner::collect_files;
