//! Entity manifest construction.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use scenedeploy_protocol::constants::MAX_FILE_SIZE;

use crate::error::ManifestError;
use crate::hash::ContentHash;

/// Manifest format version written into every entity.
const ENTITY_VERSION: &str = "v3";

/// Project files keyed by relative, `/`-separated path.
///
/// Backed by a `BTreeMap`, so iteration is always in path order no
/// matter how entries were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, Vec<u8>>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.values().map(|c| c.len() as u64).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }
}

impl<P: Into<String>, C: Into<Vec<u8>>> FromIterator<(P, C)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for (path, content) in iter {
            set.insert(path, content);
        }
        set
    }
}

impl From<HashMap<String, Vec<u8>>> for FileSet {
    fn from(map: HashMap<String, Vec<u8>>) -> Self {
        map.into_iter().collect()
    }
}

impl IntoIterator for FileSet {
    type Item = (String, Vec<u8>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Kind of entity being deployed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[default]
    Scene,
}

/// A file of the entity, addressed by the hash of its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAddressedFile {
    #[serde(rename = "file")]
    pub path: String,
    pub hash: ContentHash,
}

/// Canonical manifest layout; the entity id is the hash of its bytes.
#[derive(Serialize)]
struct EntityManifest<'a> {
    version: &'static str,
    #[serde(rename = "type")]
    entity_type: EntityType,
    pointers: &'a [String],
    content: &'a [ContentAddressedFile],
    metadata: &'a Value,
}

/// A fully built, content-addressed entity ready to be signed.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub id: ContentHash,
    pub entity_type: EntityType,
    pub pointers: Vec<String>,
    pub files: Vec<ContentAddressedFile>,
    pub metadata: Value,
    /// Serialized manifest; `id` is its hash.
    pub entity_file: Vec<u8>,
    contents: BTreeMap<ContentHash, Vec<u8>>,
}

impl EntityDescriptor {
    /// Distinct content blobs keyed by hash. Files with identical bytes
    /// appear once.
    pub fn contents(&self) -> &BTreeMap<ContentHash, Vec<u8>> {
        &self.contents
    }

    /// Size of the distinct blobs plus the manifest itself.
    pub fn upload_size(&self) -> u64 {
        let blobs: u64 = self.contents.values().map(|c| c.len() as u64).sum();
        blobs + self.entity_file.len() as u64
    }
}

/// Builds the entity descriptor for `files`, using [`MAX_FILE_SIZE`] as
/// the per-file limit.
///
/// `files` must not contain the reserved `entity.json` name.
pub fn build_entity(
    files: FileSet,
    pointers: &[String],
    metadata: &Value,
) -> Result<EntityDescriptor, ManifestError> {
    build_entity_with_limit(files, pointers, metadata, MAX_FILE_SIZE)
}

/// Same as [`build_entity`] with an explicit per-file size limit.
pub fn build_entity_with_limit(
    files: FileSet,
    pointers: &[String],
    metadata: &Value,
    max_file_size: u64,
) -> Result<EntityDescriptor, ManifestError> {
    let pointers = normalize_pointers(pointers);
    if pointers.is_empty() {
        return Err(ManifestError::NoPointers);
    }

    let mut content_files = Vec::with_capacity(files.len());
    let mut contents = BTreeMap::new();

    for (path, data) in files {
        let size = data.len() as u64;
        if size > max_file_size {
            return Err(ManifestError::FileTooLarge {
                path,
                size,
                limit: max_file_size,
            });
        }
        let hash = ContentHash::of(&data);
        content_files.push(ContentAddressedFile {
            path,
            hash: hash.clone(),
        });
        contents.entry(hash).or_insert(data);
    }

    let metadata = canonical_json(metadata);
    let manifest = EntityManifest {
        version: ENTITY_VERSION,
        entity_type: EntityType::Scene,
        pointers: &pointers,
        content: &content_files,
        metadata: &metadata,
    };
    let entity_file = serde_json::to_vec(&manifest)?;
    let id = ContentHash::of(&entity_file);

    debug!(
        entity_id = %id,
        files = content_files.len(),
        blobs = contents.len(),
        pointers = pointers.len(),
        "entity built"
    );

    Ok(EntityDescriptor {
        id,
        entity_type: EntityType::Scene,
        pointers,
        files: content_files,
        metadata,
        entity_file,
        contents,
    })
}

/// Trims, lower-cases, sorts and de-duplicates pointers, dropping empty
/// entries.
fn normalize_pointers(pointers: &[String]) -> Vec<String> {
    let mut out: Vec<String> = pointers
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Rebuilds `value` with object keys in sorted order at every depth, so
/// serialization does not depend on how the map was populated.
fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonical_json(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}
