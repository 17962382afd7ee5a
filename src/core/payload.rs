use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use std::fmt;

use super::constants::{
    APT_DECIMALS, CREATE_COLLECTION_FUNCTION, LAUNCHPAD_MODULE_NAME, MAX_ROYALTY_PERCENTAGE, OCTAS_PER_APT,
};
use super::time_window::{DateTimeField, MintWindow, TimeWindowError};
use super::uploader::{CollectionMetadata, FileSet};
use super::wallet::AccountAddress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingUploadedMetadata,
    MissingMintStart,
    /// Limit per account absent, unparsable or zero
    MissingMintLimit,
    RoyaltyOutOfRange(u64),
    PreMintExceedsSupply { pre_mint: u64, max_supply: u64 },
    Window(TimeWindowError),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingUploadedMetadata => write!(f, "Collection files have not been uploaded"),
            ValidationError::MissingMintStart => write!(f, "Please select a mint start date"),
            ValidationError::MissingMintLimit => write!(f, "Mint limit per address must be a positive number"),
            ValidationError::RoyaltyOutOfRange(value) => {
                write!(f, "Royalty percentage must be between 0 and {}, got {}", MAX_ROYALTY_PERCENTAGE, value)
            }
            ValidationError::PreMintExceedsSupply { pre_mint, max_supply } => {
                write!(f, "Cannot pre-mint {} NFTs from a supply of {}", pre_mint, max_supply)
            }
            ValidationError::Window(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<TimeWindowError> for ValidationError {
    fn from(e: TimeWindowError) -> Self {
        ValidationError::Window(e)
    }
}

/// Parse a non-negative integer input; anything else is unset
pub fn parse_count(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Parse a decimal APT amount into octas, without going through floats
///
/// More than 8 fractional digits, signs, exponents and overflow are unset.
pub fn parse_apt_amount(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if fraction.len() > APT_DECIMALS as usize {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction_octas: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = APT_DECIMALS as usize);
        padded.parse().ok()?
    };

    whole.checked_mul(OCTAS_PER_APT)?.checked_add(fraction_octas)
}

/// Mutable form state of the create collection page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDraft {
    files: FileSet,
    pub mint_start: DateTimeField,
    pub mint_end: DateTimeField,
    mint_limit_per_account: Option<u64>,
    royalty_percentage: Option<u64>,
    /// In octas
    mint_fee_per_nft: Option<u64>,
    pre_mint_amount: Option<u64>,
}

impl Default for CollectionDraft {
    fn default() -> Self {
        Self {
            files: FileSet::default(),
            mint_start: DateTimeField::default(),
            mint_end: DateTimeField::default(),
            mint_limit_per_account: Some(1),
            royalty_percentage: None,
            mint_fee_per_nft: None,
            pre_mint_amount: None,
        }
    }
}

impl CollectionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn set_files(&mut self, files: FileSet) {
        self.files = files;
    }

    pub fn clear_files(&mut self) {
        self.files = FileSet::default();
    }

    pub fn set_mint_limit_per_account(&mut self, text: &str) {
        self.mint_limit_per_account = parse_count(text);
    }

    pub fn set_royalty_percentage(&mut self, text: &str) {
        self.royalty_percentage = parse_count(text);
    }

    /// Fee text is in APT
    pub fn set_mint_fee_per_nft(&mut self, text: &str) {
        self.mint_fee_per_nft = parse_apt_amount(text);
    }

    pub fn set_pre_mint_amount(&mut self, text: &str) {
        self.pre_mint_amount = parse_count(text);
    }

    pub fn mint_limit_per_account(&self) -> Option<u64> {
        self.mint_limit_per_account
    }

    pub fn royalty_percentage(&self) -> Option<u64> {
        self.royalty_percentage
    }

    pub fn mint_fee_per_nft(&self) -> Option<u64> {
        self.mint_fee_per_nft
    }

    pub fn pre_mint_amount(&self) -> Option<u64> {
        self.pre_mint_amount
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Allowlist stage of the launchpad contract
///
/// Built through [`AllowlistStage::new`] so its window always encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistStage {
    addresses: Vec<AccountAddress>,
    window: MintWindow,
    limit_per_account: u64,
    fee_per_nft: Option<u64>,
}

impl AllowlistStage {
    /// The window follows the public mint rules; the end is required here
    pub fn new(
        addresses: Vec<AccountAddress>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit_per_account: u64,
        fee_per_nft: Option<u64>,
    ) -> Result<Self, ValidationError> {
        let window = MintWindow::new(start, Some(end))?;
        if limit_per_account == 0 {
            return Err(ValidationError::MissingMintLimit);
        }
        Ok(Self { addresses, window, limit_per_account, fee_per_nft })
    }

    pub fn addresses(&self) -> &[AccountAddress] {
        &self.addresses
    }

    pub fn start_seconds(&self) -> u64 {
        self.window.start_seconds()
    }

    pub fn end_seconds(&self) -> Option<u64> {
        self.window.end_seconds()
    }

    pub fn limit_per_account(&self) -> u64 {
        self.limit_per_account
    }

    /// In octas
    pub fn fee_per_nft(&self) -> Option<u64> {
        self.fee_per_nft
    }
}

/// Fully resolved arguments of `launchpad::create_collection`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCollectionPayload {
    pub collection_description: String,
    pub collection_name: String,
    pub project_uri: String,
    pub max_supply: u64,
    pub royalty_percentage: Option<u64>,
    pub pre_mint_amount: Option<u64>,
    /// Not set by the create page
    pub allowlist: Option<AllowlistStage>,
    pub public_mint: MintWindow,
    pub public_mint_limit_per_account: u64,
    /// In octas
    pub public_mint_fee_per_nft: Option<u64>,
}

/// Entry function call as handed to the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFunctionPayload {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub function_arguments: Vec<Value>,
}

fn move_u64(value: u64) -> Value {
    Value::String(value.to_string())
}

fn move_option(value: Option<Value>) -> Value {
    match value {
        Some(inner) => json!({ "vec": [inner] }),
        None => json!({ "vec": [] }),
    }
}

fn move_option_u64(value: Option<u64>) -> Value {
    move_option(value.map(move_u64))
}

impl CreateCollectionPayload {
    /// Encode as Move JSON arguments in contract order
    pub fn to_entry_function(&self, module_address: &AccountAddress) -> EntryFunctionPayload {
        let allowlist = self.allowlist.as_ref();

        EntryFunctionPayload {
            function: format!("{}::{}::{}", module_address, LAUNCHPAD_MODULE_NAME, CREATE_COLLECTION_FUNCTION),
            type_arguments: Vec::new(),
            function_arguments: vec![
                Value::String(self.collection_description.clone()),
                Value::String(self.collection_name.clone()),
                Value::String(self.project_uri.clone()),
                move_u64(self.max_supply),
                move_option_u64(self.royalty_percentage),
                move_option_u64(self.pre_mint_amount),
                move_option(allowlist.map(|stage| {
                    Value::Array(stage.addresses.iter().map(|a| Value::String(a.to_hex_literal())).collect())
                })),
                move_option_u64(allowlist.map(|stage| stage.start_seconds())),
                move_option_u64(allowlist.and_then(|stage| stage.end_seconds())),
                move_option_u64(allowlist.map(|stage| stage.limit_per_account())),
                move_option_u64(allowlist.and_then(|stage| stage.fee_per_nft())),
                move_option_u64(Some(self.public_mint.start_seconds())),
                move_option_u64(self.public_mint.end_seconds()),
                move_option_u64(Some(self.public_mint_limit_per_account)),
                move_option_u64(self.public_mint_fee_per_nft),
            ],
        }
    }
}

/// Map the draft and upload result to contract arguments
///
/// Pure; dates are interpreted in `tz`.
pub fn build_payload<Tz: TimeZone>(
    draft: &CollectionDraft,
    metadata: Option<&CollectionMetadata>,
    tz: &Tz,
) -> Result<CreateCollectionPayload, ValidationError> {
    let metadata = metadata.ok_or(ValidationError::MissingUploadedMetadata)?;

    let start = draft.mint_start.resolve(tz)?.ok_or(ValidationError::MissingMintStart)?;
    let end = draft.mint_end.resolve(tz)?;
    let public_mint = MintWindow::new(start, end)?;

    let limit = draft.mint_limit_per_account
        .filter(|limit| *limit > 0)
        .ok_or(ValidationError::MissingMintLimit)?;

    if let Some(royalty) = draft.royalty_percentage {
        if royalty > MAX_ROYALTY_PERCENTAGE {
            return Err(ValidationError::RoyaltyOutOfRange(royalty));
        }
    }

    if let Some(pre_mint) = draft.pre_mint_amount {
        if pre_mint > metadata.max_supply {
            return Err(ValidationError::PreMintExceedsSupply {
                pre_mint,
                max_supply: metadata.max_supply,
            });
        }
    }

    Ok(CreateCollectionPayload {
        collection_description: metadata.collection_description.clone(),
        collection_name: metadata.collection_name.clone(),
        project_uri: metadata.project_uri.clone(),
        max_supply: metadata.max_supply,
        royalty_percentage: draft.royalty_percentage,
        pre_mint_amount: draft.pre_mint_amount,
        allowlist: None,
        public_mint,
        public_mint_limit_per_account: limit,
        public_mint_fee_per_nft: draft.mint_fee_per_nft,
    })
}
