use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};

use super::constants::{
    COLLECTION_FILE_STEM, COLLECTION_METADATA_FILE, MAX_UPLOAD_BYTES, METADATA_URI_ALLOWANCE,
    VALID_MEDIA_EXTENSIONS,
};
use super::storage::{AssetFile, StorageProvider, UploadError};
use super::wallet::Wallet;

/// Files selected in the folder picker, in browser enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<AssetFile>,
}

impl FileSet {
    pub fn new(files: Vec<AssetFile>) -> Self {
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(AssetFile::size).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetFile> {
        self.files.iter()
    }
}

impl FromIterator<AssetFile> for FileSet {
    fn from_iter<I: IntoIterator<Item = AssetFile>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Collection level result of a finished upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    pub collection_name: String,
    pub collection_description: String,
    /// Number of NFT images, cover excluded
    pub max_supply: u64,
    /// URI of the uploaded `collection.json`
    pub project_uri: String,
    pub cover_image_uri: String,
}

/// A file set sorted into the collection template
#[derive(Debug)]
pub struct CollectionLayout<'a> {
    pub metadata: &'a AssetFile,
    pub cover: &'a AssetFile,
    /// (nft metadata, its image), in selection order
    pub nfts: Vec<(&'a AssetFile, &'a AssetFile)>,
}

impl CollectionLayout<'_> {
    pub fn total_size(&self) -> u64 {
        self.metadata.size()
            + self.cover.size()
            + self.nfts.iter().map(|(meta, image)| meta.size() + image.size()).sum::<u64>()
    }
}

fn is_media(file: &AssetFile) -> bool {
    file.extension()
        .map_or(false, |ext| VALID_MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

fn is_json(file: &AssetFile) -> bool {
    file.extension().as_deref() == Some("json")
}

/// Sort files into collection.json, cover, and NFT metadata/image pairs
///
/// Files that are neither media nor json (`.DS_Store` and the like) are ignored.
pub fn inspect(files: &FileSet) -> Result<CollectionLayout<'_>, UploadError> {
    if files.is_empty() {
        return Err(UploadError::NoFiles);
    }

    let collection_files: Vec<&AssetFile> = files.iter()
        .filter(|file| file.stem() == COLLECTION_FILE_STEM)
        .collect();
    if collection_files.len() != 2 {
        return Err(UploadError::InvalidFileSet(
            "Please make sure you include both collection.json and collection image file".to_string(),
        ));
    }

    let metadata = collection_files.iter()
        .copied()
        .find(|file| file.file_name() == COLLECTION_METADATA_FILE)
        .ok_or_else(|| UploadError::InvalidFileSet("Collection metadata not found".to_string()))?;
    let cover = collection_files.iter()
        .copied()
        .find(|file| is_media(file))
        .ok_or_else(|| UploadError::InvalidFileSet("Collection cover not found".to_string()))?;

    let nft_metadata: Vec<&AssetFile> = files.iter()
        .filter(|file| is_json(file) && file.stem() != COLLECTION_FILE_STEM)
        .collect();
    if nft_metadata.is_empty() {
        return Err(UploadError::InvalidFileSet("Image metadata not found".to_string()));
    }

    let images: Vec<&AssetFile> = files.iter()
        .filter(|file| is_media(file) && file.stem() != COLLECTION_FILE_STEM)
        .collect();
    if images.is_empty() {
        return Err(UploadError::InvalidFileSet("Image files not found".to_string()));
    }
    if images.len() != nft_metadata.len() {
        return Err(UploadError::InvalidFileSet(format!(
            "Mismatch between NFT metadata json files ({}) and images files ({})",
            nft_metadata.len(),
            images.len()
        )));
    }

    // counts match, so every image is used once the pairing is one to one
    let mut claimed = vec![false; images.len()];
    let mut nfts = Vec::with_capacity(nft_metadata.len());
    for meta in nft_metadata {
        let mut matching = images.iter()
            .enumerate()
            .filter(|(_, image)| image.stem() == meta.stem());
        let (index, image) = match (matching.next(), matching.next()) {
            (Some((index, image)), None) => (index, *image),
            (None, _) => {
                return Err(UploadError::InvalidFileSet(format!("No image found for {}", meta.file_name())));
            }
            (Some(_), Some(_)) => {
                return Err(UploadError::InvalidFileSet(format!("More than one image for {}", meta.file_name())));
            }
        };
        if claimed[index] {
            return Err(UploadError::InvalidFileSet(format!(
                "{} is referenced by more than one metadata file",
                image.file_name()
            )));
        }
        claimed[index] = true;
        nfts.push((meta, image));
    }

    Ok(CollectionLayout { metadata, cover, nfts })
}

fn parse_json_object(file: &AssetFile) -> Result<Map<String, Value>, UploadError> {
    let invalid = |reason: String| UploadError::InvalidMetadata {
        file: file.file_name().to_string(),
        reason,
    };

    match serde_json::from_slice::<Value>(&file.bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(invalid("expected a JSON object".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Copy of a metadata file with its `image` field pointing at `image_uri`
fn with_image_uri(file: &AssetFile, mut object: Map<String, Value>, image_uri: &str) -> Result<AssetFile, UploadError> {
    object.insert("image".to_string(), Value::String(image_uri.to_string()));
    let bytes = serde_json::to_vec(&Value::Object(object))
        .map_err(|e| UploadError::InvalidMetadata {
            file: file.file_name().to_string(),
            reason: e.to_string(),
        })?;
    Ok(AssetFile::new(file.file_name(), bytes))
}

/// Make sure the storage node holds enough balance for `bytes`
async fn ensure_funded<S, W>(storage: &S, wallet: &W, bytes: u64) -> Result<(), UploadError>
where
    S: StorageProvider,
    W: Wallet,
{
    let price = storage.price(bytes).await?;
    let balance = storage.loaded_balance(wallet).await?;
    if price > balance {
        let amount = price - balance;
        log::info!("Storage node needs funding: price={}, balance={}, funding {}", price, balance, amount);
        storage.fund(wallet, amount).await?;
    }
    Ok(())
}

/// Upload a collection folder and derive its on-chain metadata
///
/// Images and cover go up as one folder, then every metadata file is
/// rewritten to reference its uploaded image and goes up as a second folder
/// together with `collection.json`. Either the whole bundle is returned or
/// an error; no partial result is produced.
pub async fn upload_collection_data<S, W>(storage: &S, wallet: &W, files: &FileSet) -> Result<CollectionMetadata, UploadError>
where
    S: StorageProvider,
    W: Wallet,
{
    if wallet.account().is_none() {
        return Err(UploadError::WalletNotConnected);
    }

    let layout = inspect(files)?;

    // parse everything before any network call so bad json fails fast
    let collection_object = parse_json_object(layout.metadata)?;
    let collection_name = match collection_object.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => {
            return Err(UploadError::InvalidMetadata {
                file: COLLECTION_METADATA_FILE.to_string(),
                reason: "missing collection name".to_string(),
            });
        }
    };
    let collection_description = collection_object.get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let nft_objects = layout.nfts.iter()
        .map(|(meta, _)| parse_json_object(meta))
        .collect::<Result<Vec<_>, _>>()?;

    let total = layout.total_size();
    if total > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { total, limit: MAX_UPLOAD_BYTES });
    }

    let allowance = (layout.nfts.len() as u64 + 1) * METADATA_URI_ALLOWANCE;
    ensure_funded(storage, wallet, total + allowance).await?;

    log::info!("Uploading {} images and collection cover", layout.nfts.len());
    let mut image_files: Vec<AssetFile> = layout.nfts.iter()
        .map(|(_, image)| AssetFile::new(image.file_name(), image.bytes.clone()))
        .collect();
    image_files.push(AssetFile::new(layout.cover.file_name(), layout.cover.bytes.clone()));
    let image_folder = storage.upload_folder(wallet, &image_files).await?;

    let cover_image_uri = format!("{}/{}", image_folder, layout.cover.file_name());
    let mut metadata_files = Vec::with_capacity(layout.nfts.len() + 1);
    for ((meta, image), object) in layout.nfts.iter().zip(nft_objects) {
        let image_uri = format!("{}/{}", image_folder, image.file_name());
        metadata_files.push(with_image_uri(meta, object, &image_uri)?);
    }
    metadata_files.push(with_image_uri(layout.metadata, collection_object, &cover_image_uri)?);

    log::info!("Uploading {} metadata files", metadata_files.len());
    let metadata_folder = storage.upload_folder(wallet, &metadata_files).await?;

    let metadata = CollectionMetadata {
        collection_name,
        collection_description,
        max_supply: layout.nfts.len() as u64,
        project_uri: format!("{}/{}", metadata_folder, COLLECTION_METADATA_FILE),
        cover_image_uri,
    };
    log::info!("Collection '{}' uploaded, project uri {}", metadata.collection_name, metadata.project_uri);
    Ok(metadata)
}
