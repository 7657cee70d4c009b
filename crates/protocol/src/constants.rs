use std::time::Duration;

/// Reserved file name for the serialized entity manifest.
///
/// Never part of a project's file set; the manifest itself is uploaded
/// under the entity id.
pub const ENTITY_FILE_NAME: &str = "entity.json";

/// Ignore file read from the project root.
pub const IGNORE_FILE_NAME: &str = ".dclignore";

/// Scene descriptor file read from the project root.
pub const SCENE_FILE_NAME: &str = "scene.json";

/// Maximum size of a single content file (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default upload budget, expressed the way operators write it.
pub const DEFAULT_UPLOAD_TIMEOUT: &str = "10m";

/// Default port of the local signer endpoint.
pub const DEFAULT_LINKER_PORT: u16 = 4044;

/// Delay before the signing page is opened in a browser.
pub const BROWSER_OPEN_DELAY: Duration = Duration::from_secs(5);

/// Public viewer used to build shareable scene links.
pub const DEFAULT_PLAY_URL: &str = "https://play.decentraland.org";

/// Seed catalyst for mainnet discovery.
pub const MAINNET_SEED_URL: &str = "https://peer.decentraland.org";

/// Seed catalyst for testnet discovery.
pub const TESTNET_SEED_URL: &str = "https://peer.decentraland.zone";

/// Timeout for a single catalyst health probe during discovery.
pub const CATALYST_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
