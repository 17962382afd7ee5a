use chrono::{Local, TimeZone};
use std::cell::{Cell, RefCell};
use std::fmt;

use super::chain::{ChainClient, ChainError, TransactionHash};
use super::guard::{AccountGuard, PreconditionError};
use super::navigation::{Navigator, Route};
use super::payload::{build_payload, CollectionDraft, ValidationError};
use super::settings::LaunchpadConfig;
use super::storage::{StorageProvider, UploadError};
use super::uploader::upload_collection_data;
use super::wallet::{Wallet, WalletError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchpadError {
    Precondition(PreconditionError),
    Upload(UploadError),
    Validation(ValidationError),
    /// Transaction signature refused or the wallet failed
    Signature(WalletError),
    /// Submitted but not confirmed as successful; `explorer_url` allows a manual lookup
    Chain {
        hash: Option<TransactionHash>,
        explorer_url: Option<String>,
        source: ChainError,
    },
    /// The page was left while the flow was in flight
    Superseded,
}

impl fmt::Display for LaunchpadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchpadError::Precondition(e) => write!(f, "{}", e),
            LaunchpadError::Upload(e) => write!(f, "{}", e),
            LaunchpadError::Validation(e) => write!(f, "{}", e),
            LaunchpadError::Signature(e) => write!(f, "Signature failed: {}", e),
            LaunchpadError::Chain { hash: Some(hash), source, .. } => {
                write!(f, "Transaction {} failed: {}", hash, source)
            }
            LaunchpadError::Chain { hash: None, source, .. } => write!(f, "{}", source),
            LaunchpadError::Superseded => write!(f, "Collection creation was abandoned"),
        }
    }
}

impl std::error::Error for LaunchpadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchpadError::Precondition(e) => Some(e),
            LaunchpadError::Upload(e) => Some(e),
            LaunchpadError::Validation(e) => Some(e),
            LaunchpadError::Signature(e) => Some(e),
            LaunchpadError::Chain { source, .. } => Some(source),
            LaunchpadError::Superseded => None,
        }
    }
}

impl From<PreconditionError> for LaunchpadError {
    fn from(e: PreconditionError) -> Self {
        LaunchpadError::Precondition(e)
    }
}

impl From<UploadError> for LaunchpadError {
    fn from(e: UploadError) -> Self {
        LaunchpadError::Upload(e)
    }
}

impl From<ValidationError> for LaunchpadError {
    fn from(e: ValidationError) -> Self {
        LaunchpadError::Validation(e)
    }
}

impl From<WalletError> for LaunchpadError {
    fn from(e: WalletError) -> Self {
        LaunchpadError::Signature(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Uploading,
    BuildingPayload,
    AwaitingSignature,
    Submitted(TransactionHash),
    Confirming(TransactionHash),
    Succeeded(TransactionHash),
    Failed(LaunchpadError),
}

impl FlowState {
    /// True while a submission is in flight
    pub fn is_busy(&self) -> bool {
        !matches!(self, FlowState::Idle | FlowState::Succeeded(_) | FlowState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Uploading => "uploading",
            FlowState::BuildingPayload => "building payload",
            FlowState::AwaitingSignature => "awaiting signature",
            FlowState::Submitted(_) => "submitted",
            FlowState::Confirming(_) => "confirming",
            FlowState::Succeeded(_) => "succeeded",
            FlowState::Failed(_) => "failed",
        }
    }
}

/// Outcome of the chain submission as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Pending,
    Submitted(TransactionHash),
    Confirmed(bool),
    Failed(String),
}

/// Drives upload, payload, signature, submission and confirmation
///
/// One submission at a time; state lives in cells and no borrow survives an
/// await point.
pub struct CreateCollectionFlow<W, S, C, N, Tz = Local> {
    config: LaunchpadConfig,
    guard: AccountGuard,
    wallet: W,
    storage: S,
    chain: C,
    navigator: N,
    tz: Tz,
    state: RefCell<FlowState>,
    epoch: Cell<u64>,
}

/// Resets an abandoned in-flight state when the submit future is dropped
struct FlightGuard<'a> {
    state: &'a RefCell<FlowState>,
    epoch: &'a Cell<u64>,
    started: u64,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.epoch.get() != self.started {
            return;
        }
        let mut state = self.state.borrow_mut();
        if state.is_busy() {
            log::warn!("Collection flow dropped while {}, resetting", state.name());
            *state = FlowState::Idle;
        }
    }
}

impl<W, S, C, N> CreateCollectionFlow<W, S, C, N, Local> {
    /// Dates entered on the page are read in the local time zone
    pub fn new(config: LaunchpadConfig, wallet: W, storage: S, chain: C, navigator: N) -> Self {
        Self {
            guard: AccountGuard::new(&config),
            config,
            wallet,
            storage,
            chain,
            navigator,
            tz: Local,
            state: RefCell::new(FlowState::Idle),
            epoch: Cell::new(0),
        }
    }
}

impl<W, S, C, N, Tz> CreateCollectionFlow<W, S, C, N, Tz> {
    pub fn with_time_zone<T: TimeZone>(self, tz: T) -> CreateCollectionFlow<W, S, C, N, T> {
        CreateCollectionFlow {
            config: self.config,
            guard: self.guard,
            wallet: self.wallet,
            storage: self.storage,
            chain: self.chain,
            navigator: self.navigator,
            tz,
            state: self.state,
            epoch: self.epoch,
        }
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    pub fn guard(&self) -> &AccountGuard {
        &self.guard
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn state(&self) -> FlowState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    pub fn submission_result(&self) -> SubmissionResult {
        match &*self.state.borrow() {
            FlowState::Idle | FlowState::Uploading | FlowState::BuildingPayload | FlowState::AwaitingSignature => {
                SubmissionResult::Pending
            }
            FlowState::Submitted(hash) | FlowState::Confirming(hash) => SubmissionResult::Submitted(hash.clone()),
            FlowState::Succeeded(_) => SubmissionResult::Confirmed(true),
            FlowState::Failed(LaunchpadError::Chain { source: ChainError::Rejected(_), hash: Some(_), .. }) => {
                SubmissionResult::Confirmed(false)
            }
            FlowState::Failed(e) => SubmissionResult::Failed(e.to_string()),
        }
    }

    /// Leave the page: any in-flight submission stops touching state
    pub fn abandon(&self) {
        self.epoch.set(self.epoch.get() + 1);
        let mut state = self.state.borrow_mut();
        if *state != FlowState::Idle {
            log::info!("Collection flow abandoned while {}", state.name());
        }
        *state = FlowState::Idle;
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch
    }

    fn transition(&self, epoch: u64, next: FlowState) -> Result<(), LaunchpadError> {
        if !self.is_current(epoch) {
            log::info!("Collection flow superseded before {}", next.name());
            return Err(LaunchpadError::Superseded);
        }
        log::info!("Collection flow: {} -> {}", self.state.borrow().name(), next.name());
        *self.state.borrow_mut() = next;
        Ok(())
    }

    fn fail(&self, epoch: u64, error: LaunchpadError) -> LaunchpadError {
        if !self.is_current(epoch) {
            return LaunchpadError::Superseded;
        }
        log::error!("Collection creation failed: {}", error);
        *self.state.borrow_mut() = FlowState::Failed(error.clone());
        error
    }

    fn chain_error(&self, hash: &TransactionHash, source: ChainError) -> LaunchpadError {
        let explorer_url = self.config.network.config().transaction_link(hash.as_str());
        LaunchpadError::Chain {
            hash: Some(hash.clone()),
            explorer_url: Some(explorer_url),
            source,
        }
    }
}

impl<W, S, C, N, Tz> CreateCollectionFlow<W, S, C, N, Tz>
where
    W: Wallet,
    S: StorageProvider,
    C: ChainClient,
    N: Navigator,
    Tz: TimeZone,
{
    /// Run the whole creation flow for `draft`
    ///
    /// Refused without side effects while another submission is in flight
    /// or after one succeeded. Precondition failures leave the state as it
    /// was, so a `Failed` from an earlier attempt stays in place next to the
    /// returned error. Every later failure ends in `FlowState::Failed`.
    pub async fn submit(&self, draft: &CollectionDraft) -> Result<TransactionHash, LaunchpadError> {
        {
            let state = self.state.borrow();
            if state.is_busy() || matches!(*state, FlowState::Succeeded(_)) {
                log::warn!("Submit ignored, flow is {}", state.name());
                return Err(PreconditionError::AlreadyInProgress.into());
            }
        }

        self.guard.require_ready(&self.wallet)?;
        if draft.files().is_empty() {
            return Err(PreconditionError::NoFiles.into());
        }

        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        let _flight = FlightGuard {
            state: &self.state,
            epoch: &self.epoch,
            started: epoch,
        };

        self.transition(epoch, FlowState::Uploading)?;
        let uploaded = upload_collection_data(&self.storage, &self.wallet, draft.files()).await;
        let metadata = match uploaded {
            Ok(metadata) => metadata,
            Err(e) => return Err(self.fail(epoch, e.into())),
        };

        self.transition(epoch, FlowState::BuildingPayload)?;
        let payload = match build_payload(draft, Some(&metadata), &self.tz) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(epoch, e.into())),
        };
        let entry = payload.to_entry_function(&self.config.module_address);
        log::debug!("create_collection payload: {} args for {}", entry.function_arguments.len(), entry.function);

        self.transition(epoch, FlowState::AwaitingSignature)?;
        let pending = match self.wallet.sign_and_submit_transaction(&entry).await {
            Ok(pending) => pending,
            Err(e) => return Err(self.fail(epoch, e.into())),
        };
        let hash = pending.hash;

        self.transition(epoch, FlowState::Submitted(hash.clone()))?;
        log::info!("Transaction submitted: {}", hash);

        self.transition(epoch, FlowState::Confirming(hash.clone()))?;
        let committed = match self.chain.wait_for_transaction(&hash).await {
            Ok(committed) => committed,
            Err(e) => return Err(self.fail(epoch, self.chain_error(&hash, e))),
        };
        if !committed.success {
            let error = self.chain_error(&hash, ChainError::Rejected(committed.vm_status));
            return Err(self.fail(epoch, error));
        }

        self.transition(epoch, FlowState::Succeeded(hash.clone()))?;
        log::info!("Collection '{}' created in {}", metadata.collection_name, hash);
        self.navigator.navigate(Route::MyCollections);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_only_in_flight() {
        let hash = TransactionHash::new("0x1");
        assert!(!FlowState::Idle.is_busy());
        assert!(FlowState::Uploading.is_busy());
        assert!(FlowState::BuildingPayload.is_busy());
        assert!(FlowState::AwaitingSignature.is_busy());
        assert!(FlowState::Submitted(hash.clone()).is_busy());
        assert!(FlowState::Confirming(hash.clone()).is_busy());
        assert!(!FlowState::Succeeded(hash).is_busy());
        assert!(!FlowState::Failed(LaunchpadError::Superseded).is_busy());
    }

    #[test]
    fn chain_error_message_names_the_hash() {
        let error = LaunchpadError::Chain {
            hash: Some(TransactionHash::new("0xabc")),
            explorer_url: None,
            source: ChainError::Rejected("Move abort".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains("0xabc"));
        assert!(message.contains("Move abort"));
    }

    #[test]
    fn errors_convert_for_question_mark() {
        assert_eq!(
            LaunchpadError::from(WalletError::UserRejected),
            LaunchpadError::Signature(WalletError::UserRejected)
        );
        assert_eq!(
            LaunchpadError::from(PreconditionError::NoFiles),
            LaunchpadError::Precondition(PreconditionError::NoFiles)
        );
        assert!(std::error::Error::source(&LaunchpadError::from(UploadError::NoFiles)).is_some());
    }
}
