use std::fmt;

use super::navigation::Route;
use super::settings::LaunchpadConfig;
use super::wallet::{AccountAddress, Wallet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    NoWallet,
    WrongAccount { connected: AccountAddress, expected: AccountAddress },
    UnsupportedWallet(String),
    NoFiles,
    AlreadyInProgress,
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionError::NoWallet => write!(f, "Please connect your wallet"),
            PreconditionError::WrongAccount { connected, expected } => {
                write!(f, "Wrong account: connected {}, expected {}", connected, expected)
            }
            PreconditionError::UnsupportedWallet(name) => {
                write!(f, "{} is not supported for creating NFT collections", name)
            }
            PreconditionError::NoFiles => write!(f, "Please upload files"),
            PreconditionError::AlreadyInProgress => write!(f, "Uploading in progress"),
        }
    }
}

impl std::error::Error for PreconditionError {}

/// Wallet state as seen by the create page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardStatus {
    Ready(AccountAddress),
    NoWallet,
    IncorrectAccount { connected: AccountAddress, expected: AccountAddress },
    UnsupportedWallet { name: String },
}

impl GuardStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, GuardStatus::Ready(_))
    }

    /// Warning banner title, `None` when ready
    pub fn title(&self) -> Option<&'static str> {
        match self {
            GuardStatus::Ready(_) => None,
            GuardStatus::NoWallet => Some("No Wallet Connected"),
            GuardStatus::IncorrectAccount { .. } => Some("Incorrect Account"),
            GuardStatus::UnsupportedWallet { .. } => Some("Wallet Not Supported"),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            GuardStatus::Ready(_) => None,
            GuardStatus::NoWallet | GuardStatus::IncorrectAccount { .. } => Some(
                "To create your collection, ensure that you're connected with the same wallet address \
                 as the configured collection creator address."
                    .to_string(),
            ),
            GuardStatus::UnsupportedWallet { name } => Some(format!(
                "{} is not supported for creating NFT collections. Please connect with a different wallet.",
                name
            )),
        }
    }

    fn into_error(self) -> Result<AccountAddress, PreconditionError> {
        match self {
            GuardStatus::Ready(address) => Ok(address),
            GuardStatus::NoWallet => Err(PreconditionError::NoWallet),
            GuardStatus::IncorrectAccount { connected, expected } => {
                Err(PreconditionError::WrongAccount { connected, expected })
            }
            GuardStatus::UnsupportedWallet { name } => Err(PreconditionError::UnsupportedWallet(name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(Route),
}

/// Gate in front of the creation flow
#[derive(Debug, Clone)]
pub struct AccountGuard {
    creator: AccountAddress,
    is_production: bool,
}

impl AccountGuard {
    pub fn new(config: &LaunchpadConfig) -> Self {
        Self {
            creator: config.creator_address,
            is_production: config.is_production,
        }
    }

    pub fn creator(&self) -> &AccountAddress {
        &self.creator
    }

    /// Production deployments send creator pages back to the public page
    pub fn route(&self, route: Route) -> RouteDecision {
        if self.is_production && route.is_creator_only() {
            log::info!("Production mode, redirecting {} to {}", route.path(), Route::Home.path());
            RouteDecision::Redirect(Route::Home)
        } else {
            RouteDecision::Allow
        }
    }

    /// Every warning that applies to the connected wallet
    ///
    /// An embedded social-login wallet is flagged even when its account
    /// matches the creator.
    pub fn warnings<W: Wallet>(&self, wallet: &W) -> Vec<GuardStatus> {
        let mut warnings = Vec::new();

        match wallet.account() {
            None => warnings.push(GuardStatus::NoWallet),
            Some(connected) if connected != self.creator => warnings.push(GuardStatus::IncorrectAccount {
                connected,
                expected: self.creator,
            }),
            Some(_) => {}
        }

        if let Some(info) = wallet.info() {
            if info.is_embedded_social_login() {
                warnings.push(GuardStatus::UnsupportedWallet { name: info.name });
            }
        }

        warnings
    }

    /// Single status: no wallet, then unsupported wallet, then wrong account
    pub fn check<W: Wallet>(&self, wallet: &W) -> GuardStatus {
        let connected = match wallet.account() {
            Some(account) => account,
            None => return GuardStatus::NoWallet,
        };

        if let Some(info) = wallet.info() {
            if info.is_embedded_social_login() {
                log::warn!("Wallet {} is not supported for collection creation", info.name);
                return GuardStatus::UnsupportedWallet { name: info.name };
            }
        }

        if connected != self.creator {
            log::warn!("Connected account {} is not the collection creator {}", connected, self.creator);
            return GuardStatus::IncorrectAccount { connected, expected: self.creator };
        }

        GuardStatus::Ready(connected)
    }

    pub fn require_ready<W: Wallet>(&self, wallet: &W) -> Result<AccountAddress, PreconditionError> {
        self.check(wallet).into_error()
    }
}
