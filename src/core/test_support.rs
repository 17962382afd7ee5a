use chrono::NaiveDate;
use std::cell::{Cell, RefCell};

use super::chain::{ChainClient, ChainError, CommittedTransaction, TransactionHash};
use super::navigation::{Navigator, Route};
use super::network_config::NetworkType;
use super::payload::{CollectionDraft, EntryFunctionPayload};
use super::settings::LaunchpadConfig;
use super::storage::AssetFile;
use super::time_window::DateTimeField;
use super::uploader::FileSet;
use super::wallet::{AccountAddress, PendingTransaction, Wallet, WalletError, WalletInfo};

pub const GATEWAY: &str = "https://gateway.test";

pub fn creator() -> AccountAddress {
    "0xc0ffee".parse().unwrap()
}

pub fn stranger() -> AccountAddress {
    "0xbad".parse().unwrap()
}

pub fn module_address() -> AccountAddress {
    "0xcafe".parse().unwrap()
}

pub fn config() -> LaunchpadConfig {
    LaunchpadConfig::new(creator(), module_address(), NetworkType::Testnet)
}

/// Template folder: collection.json, collection.png, then n metadata/image pairs
pub fn collection_folder(count: usize) -> FileSet {
    let mut files = vec![
        AssetFile::new(
            "collection.json",
            br#"{"name":"Genesis Collection","description":"The first drop"}"#.to_vec(),
        ),
        AssetFile::new("collection.png", b"cover".to_vec()),
    ];
    for i in 1..=count {
        let meta = format!(r#"{{"name":"Genesis #{}","description":"Token {}","image":"{}.png"}}"#, i, i, i);
        files.push(AssetFile::new(format!("{}.json", i), meta.into_bytes()));
        files.push(AssetFile::new(format!("{}.png", i), format!("image-{}", i).into_bytes()));
    }
    FileSet::new(files)
}

/// Draft with `count` NFTs, mint starting 2030-01-02 10:00 and the default limit
pub fn ready_draft(count: usize) -> CollectionDraft {
    let mut draft = CollectionDraft::new();
    draft.set_files(collection_folder(count));
    draft.mint_start = DateTimeField::new(NaiveDate::from_ymd_opt(2030, 1, 2), Some("10:00"));
    draft
}

pub struct MockWallet {
    account: Option<AccountAddress>,
    info: Option<WalletInfo>,
    reject_messages: Cell<bool>,
    reject_transactions: Cell<bool>,
    yield_on_sign: Cell<bool>,
    messages: Cell<usize>,
    submitted: RefCell<Vec<EntryFunctionPayload>>,
}

impl MockWallet {
    pub fn connected(account: AccountAddress) -> Self {
        Self {
            account: Some(account),
            info: Some(WalletInfo::new("Petra", "https://petra.app")),
            reject_messages: Cell::new(false),
            reject_transactions: Cell::new(false),
            yield_on_sign: Cell::new(false),
            messages: Cell::new(0),
            submitted: RefCell::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            account: None,
            info: None,
            ..Self::connected(creator())
        }
    }

    pub fn with_info(mut self, info: WalletInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn reject_messages(&self, reject: bool) {
        self.reject_messages.set(reject);
    }

    pub fn reject_transactions(&self, reject: bool) {
        self.reject_transactions.set(reject);
    }

    /// Suspend once on every signature request, like a wallet popup
    pub fn yield_on_sign(&self, enabled: bool) {
        self.yield_on_sign.set(enabled);
    }

    pub fn messages_signed(&self) -> usize {
        self.messages.get()
    }

    pub fn submitted(&self) -> Vec<EntryFunctionPayload> {
        self.submitted.borrow().clone()
    }

    async fn popup(&self) {
        if self.yield_on_sign.get() {
            tokio::task::yield_now().await;
        }
    }
}

impl Wallet for MockWallet {
    fn account(&self) -> Option<AccountAddress> {
        self.account
    }

    fn info(&self) -> Option<WalletInfo> {
        self.info.clone()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        self.popup().await;
        if self.account.is_none() {
            return Err(WalletError::NotConnected);
        }
        if self.reject_messages.get() {
            return Err(WalletError::UserRejected);
        }
        self.messages.set(self.messages.get() + 1);
        Ok(message.iter().rev().copied().collect())
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<PendingTransaction, WalletError> {
        self.popup().await;
        if self.account.is_none() {
            return Err(WalletError::NotConnected);
        }
        if self.reject_transactions.get() {
            return Err(WalletError::UserRejected);
        }
        let mut submitted = self.submitted.borrow_mut();
        submitted.push(payload.clone());
        Ok(PendingTransaction {
            hash: TransactionHash::new(format!("0x{:064x}", submitted.len())),
        })
    }
}

pub struct MockChain {
    outcome: Result<bool, ChainError>,
    waited: RefCell<Vec<TransactionHash>>,
}

impl MockChain {
    /// Commits every transaction with the given VM result
    pub fn committing(success: bool) -> Self {
        Self {
            outcome: Ok(success),
            waited: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(error: ChainError) -> Self {
        Self {
            outcome: Err(error),
            waited: RefCell::new(Vec::new()),
        }
    }

    pub fn waited(&self) -> Vec<TransactionHash> {
        self.waited.borrow().clone()
    }
}

impl ChainClient for MockChain {
    async fn wait_for_transaction(&self, hash: &TransactionHash) -> Result<CommittedTransaction, ChainError> {
        self.waited.borrow_mut().push(hash.clone());
        let success = self.outcome.clone()?;
        Ok(CommittedTransaction {
            hash: hash.clone(),
            success,
            vm_status: if success {
                "Executed successfully".to_string()
            } else {
                "Move abort in launchpad: EINVALID_MINT_FEE(0x1)".to_string()
            },
            version: Some(42),
        })
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: RefCell<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.borrow_mut().push(route);
    }
}
