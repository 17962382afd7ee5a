use chrono::{Local, TimeZone};

use crate::core::chain::{ChainClient, TransactionHash};
use crate::core::guard::{AccountGuard, GuardStatus, RouteDecision};
use crate::core::navigation::{Navigator, Route};
use crate::core::orchestrator::{CreateCollectionFlow, LaunchpadError};
use crate::core::payload::CollectionDraft;
use crate::core::settings::LaunchpadConfig;
use crate::core::storage::StorageProvider;
use crate::core::wallet::Wallet;

/// Controller behind the create collection page
///
/// Owns the form draft and the submission flow; rendering is left to the host.
pub struct CreateCollectionPage<W, S, C, N, Tz = Local> {
    flow: CreateCollectionFlow<W, S, C, N, Tz>,
    draft: CollectionDraft,
}

impl<W, S, C, N> CreateCollectionPage<W, S, C, N, Local>
where
    N: Navigator,
{
    /// Open the page, or redirect and return `None` when the deployment hides it
    pub fn mount(config: LaunchpadConfig, wallet: W, storage: S, chain: C, navigator: N) -> Option<Self> {
        if let RouteDecision::Redirect(route) = AccountGuard::new(&config).route(Route::CreateCollection) {
            navigator.navigate(route);
            return None;
        }

        log::info!("Create collection page mounted for creator {}", config.creator_address);
        Some(Self {
            flow: CreateCollectionFlow::new(config, wallet, storage, chain, navigator),
            draft: CollectionDraft::new(),
        })
    }
}

impl<W, S, C, N, Tz> CreateCollectionPage<W, S, C, N, Tz> {
    pub fn with_time_zone<T: TimeZone>(self, tz: T) -> CreateCollectionPage<W, S, C, N, T> {
        CreateCollectionPage {
            flow: self.flow.with_time_zone(tz),
            draft: self.draft,
        }
    }

    pub fn flow(&self) -> &CreateCollectionFlow<W, S, C, N, Tz> {
        &self.flow
    }

    pub fn draft(&self) -> &CollectionDraft {
        &self.draft
    }

    /// Input handlers write through here
    pub fn draft_mut(&mut self) -> &mut CollectionDraft {
        &mut self.draft
    }

    pub fn on_navigate_away(&mut self) {
        self.flow.abandon();
        self.draft.reset();
    }
}

impl<W, S, C, N, Tz> CreateCollectionPage<W, S, C, N, Tz>
where
    W: Wallet,
    S: StorageProvider,
    C: ChainClient,
    N: Navigator,
    Tz: TimeZone,
{
    pub fn warnings(&self) -> Vec<GuardStatus> {
        self.flow.guard().warnings(self.flow.wallet())
    }

    /// Whether the create button is enabled
    ///
    /// Any guard warning keeps the form visible but disabled.
    pub fn can_submit(&self) -> bool {
        self.flow.guard().check(self.flow.wallet()).is_ready()
            && !self.draft.files().is_empty()
            && self.draft.mint_start.is_set()
            && self.draft.mint_limit_per_account().map_or(false, |limit| limit > 0)
            && !self.flow.is_busy()
    }

    /// Create button handler; the form is cleared once the collection exists
    pub async fn on_create_collection(&mut self) -> Result<TransactionHash, LaunchpadError> {
        let result = self.flow.submit(&self.draft).await;
        if result.is_ok() {
            self.draft.reset();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use crate::core::guard::PreconditionError;
    use crate::core::orchestrator::FlowState;
    use crate::core::storage::MemoryStorage;
    use crate::core::wallet::WalletInfo;
    use crate::core::test_support::{
        collection_folder, config, creator, stranger, MockChain, MockWallet, RecordingNavigator, GATEWAY,
    };

    type TestPage<'a> = CreateCollectionPage<MockWallet, MemoryStorage, MockChain, &'a RecordingNavigator, Utc>;

    fn mount(wallet: MockWallet, navigator: &RecordingNavigator) -> TestPage<'_> {
        CreateCollectionPage::mount(config(), wallet, MemoryStorage::new(GATEWAY), MockChain::committing(true), navigator)
            .unwrap()
            .with_time_zone(Utc)
    }

    fn fill(page: &mut TestPage<'_>) {
        let draft = page.draft_mut();
        draft.set_files(collection_folder(3));
        draft.mint_start.set_date(NaiveDate::from_ymd_opt(2030, 1, 2));
        draft.mint_start.set_time("10:00");
    }

    #[test]
    fn production_redirects_home() {
        let navigator = RecordingNavigator::default();
        let page = CreateCollectionPage::mount(
            config().production(true),
            MockWallet::connected(creator()),
            MemoryStorage::new(GATEWAY),
            MockChain::committing(true),
            &navigator,
        );
        assert!(page.is_none());
        assert_eq!(navigator.routes(), vec![Route::Home]);
    }

    #[test]
    fn button_needs_account_files_start_and_limit() {
        let navigator = RecordingNavigator::default();
        let mut page = mount(MockWallet::connected(creator()), &navigator);
        assert!(!page.can_submit());

        fill(&mut page);
        assert!(page.can_submit());

        page.draft_mut().set_mint_limit_per_account("");
        assert!(!page.can_submit());
        page.draft_mut().set_mint_limit_per_account("3");
        page.draft_mut().mint_start.set_date(None);
        assert!(!page.can_submit());

        let disconnected = mount(MockWallet::disconnected(), &navigator);
        assert!(!disconnected.can_submit());
    }

    #[test]
    fn button_stays_disabled_for_other_accounts_and_embedded_wallets() {
        let navigator = RecordingNavigator::default();
        let mut page = mount(MockWallet::connected(stranger()), &navigator);
        fill(&mut page);
        assert!(!page.can_submit());

        let embedded = MockWallet::connected(creator())
            .with_info(WalletInfo::new("Continue with Google", "https://aptosconnect.app"));
        let mut page = mount(embedded, &navigator);
        fill(&mut page);
        assert!(!page.can_submit());
    }

    #[test]
    fn shows_account_warning_for_other_wallets() {
        let navigator = RecordingNavigator::default();
        let page = mount(MockWallet::connected(stranger()), &navigator);
        let warnings = page.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].title(), Some("Incorrect Account"));
    }

    #[tokio::test]
    async fn successful_creation_clears_the_form() {
        let navigator = RecordingNavigator::default();
        let mut page = mount(MockWallet::connected(creator()), &navigator);
        fill(&mut page);

        page.on_create_collection().await.unwrap();

        assert!(page.draft().files().is_empty());
        assert!(!page.draft().mint_start.is_set());
        assert_eq!(navigator.routes(), vec![Route::MyCollections]);
    }

    #[tokio::test]
    async fn failed_creation_keeps_the_form() {
        let navigator = RecordingNavigator::default();
        let mut page = mount(MockWallet::connected(stranger()), &navigator);
        fill(&mut page);

        let result = page.on_create_collection().await;

        assert!(matches!(result, Err(LaunchpadError::Precondition(PreconditionError::WrongAccount { .. }))));
        assert_eq!(page.draft().files().len(), 8);
    }

    #[tokio::test]
    async fn leaving_the_page_resets_everything() {
        let navigator = RecordingNavigator::default();
        let mut page = mount(MockWallet::connected(creator()), &navigator);
        fill(&mut page);
        page.flow().wallet().reject_transactions(true);
        assert!(page.on_create_collection().await.is_err());

        page.on_navigate_away();

        assert_eq!(page.flow().state(), FlowState::Idle);
        assert!(page.draft().files().is_empty());
    }
}
