/// Shared constants used across the launchpad modules
///
/// This module centralizes the contract, storage and unit constants so the
/// uploader, payload builder and REST client agree on them.

// ============================================================================
// Contract Constants
// ============================================================================

/// Move module that hosts the collection entry functions
pub const LAUNCHPAD_MODULE_NAME: &str = "launchpad";

/// Entry function used to register a new collection
pub const CREATE_COLLECTION_FUNCTION: &str = "create_collection";

/// Maximum royalty the contract accepts, in percent
pub const MAX_ROYALTY_PERCENTAGE: u64 = 100;

// ============================================================================
// Unit Constants
// ============================================================================

/// Number of fractional digits of one APT
pub const APT_DECIMALS: u32 = 8;

/// Octas per APT (10^8)
pub const OCTAS_PER_APT: u64 = 100_000_000;

// ============================================================================
// Upload Constraints
// ============================================================================

/// File name of the collection level metadata
pub const COLLECTION_METADATA_FILE: &str = "collection.json";

/// Stem shared by the collection metadata and the cover image
pub const COLLECTION_FILE_STEM: &str = "collection";

/// Media extensions accepted for NFT images and the cover
pub const VALID_MEDIA_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gltf"];

/// Largest folder accepted for a single collection upload (2 GiB)
pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Bytes reserved per metadata file for the image URI written into it
pub const METADATA_URI_ALLOWANCE: u64 = 512;

// ============================================================================
// Confirmation Polling
// ============================================================================

/// Interval between two transaction status polls, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1_000;

/// Give up waiting for a transaction after this many seconds
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 20;
