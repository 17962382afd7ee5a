use serde::{Serialize, Deserialize};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use super::wallet::{Wallet, WalletError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    NoFiles,
    WalletNotConnected,
    /// Folder layout does not match the collection template
    InvalidFileSet(String),
    InvalidMetadata { file: String, reason: String },
    TooLarge { total: u64, limit: u64 },
    /// The storage node must be funded before it accepts the upload
    FundingRequired { required: u64, available: u64 },
    SignatureRejected,
    Provider(String),
}

impl UploadError {
    /// Whether the same upload may succeed when the user tries again
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::FundingRequired { .. } | UploadError::Provider(_) | UploadError::SignatureRejected)
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::NoFiles => write!(f, "Please upload files"),
            UploadError::WalletNotConnected => write!(f, "Please connect your wallet"),
            UploadError::InvalidFileSet(msg) => write!(f, "Invalid collection folder: {}", msg),
            UploadError::InvalidMetadata { file, reason } => write!(f, "Invalid metadata in {}: {}", file, reason),
            UploadError::TooLarge { total, limit } => {
                write!(f, "Files uploaded are too large ({} bytes, limit {} bytes)", total, limit)
            }
            UploadError::FundingRequired { required, available } => write!(
                f,
                "Storage node needs funding: {} required, {} available",
                required, available
            ),
            UploadError::SignatureRejected => write!(f, "Upload signature rejected in wallet"),
            UploadError::Provider(msg) => write!(f, "Upload failed: {}", msg),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<WalletError> for UploadError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::UserRejected => UploadError::SignatureRejected,
            WalletError::NotConnected => UploadError::WalletNotConnected,
            WalletError::Provider(msg) => UploadError::Provider(msg),
        }
    }
}

/// One user selected file
#[derive(Clone, PartialEq, Eq)]
pub struct AssetFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl AssetFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name without the folder part of a relative path
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(index) if index > 0 => &name[..index],
            _ => name,
        }
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(index) if index > 0 => Some(name[index + 1..].to_ascii_lowercase()),
            _ => None,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gltf") => "model/gltf+json",
            Some("json") => "application/json",
            _ => "application/octet-stream",
        }
    }

    /// SHA-256 of the content, hex encoded
    pub fn content_digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

impl fmt::Debug for AssetFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Decentralized storage node (Irys style)
///
/// Uploads are paid from a balance loaded per account; loading it and every
/// folder upload require the wallet to sign.
#[allow(async_fn_in_trait)]
pub trait StorageProvider {
    /// Cost of storing `bytes`, in the node's atomic unit
    async fn price(&self, bytes: u64) -> Result<u64, UploadError>;

    async fn loaded_balance<W: Wallet>(&self, wallet: &W) -> Result<u64, UploadError>;

    async fn fund<W: Wallet>(&self, wallet: &W, amount: u64) -> Result<(), UploadError>;

    /// Upload files as one folder, returning the folder URI
    async fn upload_folder<W: Wallet>(&self, wallet: &W, files: &[AssetFile]) -> Result<String, UploadError>;
}

#[derive(Serialize, Deserialize)]
struct ManifestEntry {
    id: String,
    #[serde(rename = "contentType")]
    content_type: String,
}

#[derive(Serialize, Deserialize)]
struct FolderManifest {
    manifest: String,
    version: String,
    paths: BTreeMap<String, ManifestEntry>,
}

/// In-process content addressed storage
///
/// Folder ids are the SHA-256 of the folder manifest, so uploading the same
/// content twice yields the same URI.
pub struct MemoryStorage {
    gateway: String,
    price_per_byte: u64,
    loaded: Cell<u64>,
    wallet_funds: Cell<u64>,
    offline: Cell<bool>,
    folders: RefCell<BTreeMap<String, Vec<AssetFile>>>,
    signatures: Cell<usize>,
}

impl MemoryStorage {
    pub fn new(gateway: &str) -> Self {
        Self {
            gateway: gateway.trim_end_matches('/').to_string(),
            price_per_byte: 0,
            loaded: Cell::new(0),
            wallet_funds: Cell::new(u64::MAX),
            offline: Cell::new(false),
            folders: RefCell::new(BTreeMap::new()),
            signatures: Cell::new(0),
        }
    }

    /// Charge `price_per_byte`, starting from `loaded` with `wallet_funds` available to top up
    pub fn with_pricing(mut self, price_per_byte: u64, loaded: u64, wallet_funds: u64) -> Self {
        self.price_per_byte = price_per_byte;
        self.loaded.set(loaded);
        self.wallet_funds.set(wallet_funds);
        self
    }

    /// Simulate an unreachable node
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn folder_count(&self) -> usize {
        self.folders.borrow().len()
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.get()
    }

    pub fn balance(&self) -> u64 {
        self.loaded.get()
    }

    /// Resolve `<gateway>/<folder id>/<file name>`
    pub fn fetch(&self, uri: &str) -> Option<AssetFile> {
        let path = uri.strip_prefix(&self.gateway)?.trim_start_matches('/');
        let (folder_id, name) = path.split_once('/')?;
        self.folders.borrow()
            .get(folder_id)?
            .iter()
            .find(|file| file.file_name() == name)
            .cloned()
    }

    fn ensure_online(&self) -> Result<(), UploadError> {
        if self.offline.get() {
            log::error!("Storage node at {} is unreachable", self.gateway);
            return Err(UploadError::Provider(format!("{} is unreachable", self.gateway)));
        }
        Ok(())
    }

    async fn sign<W: Wallet>(&self, wallet: &W, message: &[u8]) -> Result<(), UploadError> {
        wallet.sign_message(message).await?;
        self.signatures.set(self.signatures.get() + 1);
        Ok(())
    }

    fn manifest_id(files: &[AssetFile]) -> Result<String, UploadError> {
        let manifest = FolderManifest {
            manifest: "arweave/paths".to_string(),
            version: "0.1.0".to_string(),
            paths: files.iter()
                .map(|file| (file.file_name().to_string(), ManifestEntry {
                    id: file.content_digest(),
                    content_type: file.content_type().to_string(),
                }))
                .collect(),
        };

        let encoded = serde_json::to_vec(&manifest)
            .map_err(|e| UploadError::Provider(format!("Failed to encode manifest: {}", e)))?;
        Ok(hex::encode(Sha256::digest(&encoded)))
    }
}

impl StorageProvider for MemoryStorage {
    async fn price(&self, bytes: u64) -> Result<u64, UploadError> {
        self.ensure_online()?;
        Ok(bytes.saturating_mul(self.price_per_byte))
    }

    async fn loaded_balance<W: Wallet>(&self, wallet: &W) -> Result<u64, UploadError> {
        self.ensure_online()?;
        wallet.account().ok_or(UploadError::WalletNotConnected)?;
        Ok(self.loaded.get())
    }

    async fn fund<W: Wallet>(&self, wallet: &W, amount: u64) -> Result<(), UploadError> {
        self.ensure_online()?;
        let available = self.wallet_funds.get();
        if amount > available {
            return Err(UploadError::FundingRequired { required: amount, available });
        }

        self.sign(wallet, format!("fund:{}", amount).as_bytes()).await?;
        self.wallet_funds.set(available - amount);
        self.loaded.set(self.loaded.get().saturating_add(amount));
        log::info!("Funded storage node with {} (balance now {})", amount, self.loaded.get());
        Ok(())
    }

    async fn upload_folder<W: Wallet>(&self, wallet: &W, files: &[AssetFile]) -> Result<String, UploadError> {
        self.ensure_online()?;
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        let folder_id = Self::manifest_id(files)?;
        self.sign(wallet, folder_id.as_bytes()).await?;

        let size: u64 = files.iter().map(AssetFile::size).sum();
        let cost = size.saturating_mul(self.price_per_byte);
        let loaded = self.loaded.get();
        if cost > loaded {
            return Err(UploadError::FundingRequired { required: cost, available: loaded });
        }
        self.loaded.set(loaded - cost);

        log::debug!("Stored folder {} ({} files, {} bytes)", folder_id, files.len(), size);
        self.folders.borrow_mut().insert(folder_id.clone(), files.to_vec());
        Ok(format!("{}/{}", self.gateway, folder_id))
    }
}
