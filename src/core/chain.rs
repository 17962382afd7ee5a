use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The transaction did not reach finality in time; it may still commit
    Timeout(String),
    /// Could not reach the node or parse its answer
    Network(String),
    /// The node refused or dropped the transaction
    Rejected(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Timeout(msg) => write!(f, "Timed out waiting for transaction: {}", msg),
            ChainError::Network(msg) => write!(f, "Network error: {}", msg),
            ChainError::Rejected(msg) => write!(f, "Transaction rejected: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(String);

impl TransactionHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final status of a transaction once the chain committed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub hash: TransactionHash,
    pub success: bool,
    pub vm_status: String,
    pub version: Option<u64>,
}

/// Read side of the chain used by the launchpad
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Suspends until `hash` is committed, or fails with a network/timeout error
    async fn wait_for_transaction(&self, hash: &TransactionHash) -> Result<CommittedTransaction, ChainError>;
}
