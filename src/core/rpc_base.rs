use serde_json::Value;
use std::future::Future;

use super::chain::{ChainError, CommittedTransaction, TransactionHash};
use super::constants::{DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS};

#[cfg(target_arch = "wasm32")]
pub use self::web::RestConnection;

/// How long and how often to poll for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval_ms: u32,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

impl PollConfig {
    /// Number of status requests that fit in the timeout, at least one
    pub fn max_attempts(&self) -> u64 {
        let interval = u64::from(self.interval_ms.max(1));
        let timeout_ms = self.timeout_secs.saturating_mul(1000);
        (timeout_ms / interval + u64::from(timeout_ms % interval != 0)).max(1)
    }
}

/// Transaction as reported by `GET /transactions/by_hash/{hash}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Committed(CommittedTransaction),
}

/// Parse a REST transaction body into pending/committed
pub fn parse_transaction_response(value: &Value) -> Result<TransactionStatus, ChainError> {
    let kind = value.get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| ChainError::Network("Transaction response missing type field".to_string()))?;

    if kind == "pending_transaction" {
        return Ok(TransactionStatus::Pending);
    }

    let hash = value.get("hash")
        .and_then(|h| h.as_str())
        .ok_or_else(|| ChainError::Network("Transaction response missing hash".to_string()))?;

    let success = value.get("success")
        .and_then(|s| s.as_bool())
        .ok_or_else(|| ChainError::Network(format!("Committed transaction {} missing success flag", hash)))?;

    let vm_status = value.get("vm_status")
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string();

    // versions are u64 encoded as decimal strings
    let version = value.get("version")
        .and_then(|v| v.as_str())
        .and_then(|v| v.parse::<u64>().ok());

    Ok(TransactionStatus::Committed(CommittedTransaction {
        hash: TransactionHash::new(hash),
        success,
        vm_status,
        version,
    }))
}

/// Poll until the transaction is committed or the timeout elapses
///
/// `fetch` returns `Ok(None)` while the node does not know the hash yet
/// (HTTP 404), `sleep` suspends for the given milliseconds between polls.
pub async fn poll_transaction<F, Fut, Z, ZFut>(
    hash: &TransactionHash,
    config: &PollConfig,
    mut fetch: F,
    mut sleep: Z,
) -> Result<CommittedTransaction, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<Value>, ChainError>>,
    Z: FnMut(u32) -> ZFut,
    ZFut: Future<Output = ()>,
{
    let attempts = config.max_attempts();

    for attempt in 1..=attempts {
        match fetch().await? {
            Some(body) => match parse_transaction_response(&body)? {
                TransactionStatus::Committed(committed) => {
                    log::debug!("Transaction {} committed after {} poll(s), success={}",
                               hash, attempt, committed.success);
                    return Ok(committed);
                }
                TransactionStatus::Pending => {
                    log::debug!("Transaction {} still pending (poll {}/{})", hash, attempt, attempts);
                }
            },
            None => {
                log::debug!("Transaction {} not found yet (poll {}/{})", hash, attempt, attempts);
            }
        }

        if attempt < attempts {
            sleep(config.interval_ms).await;
        }
    }

    log::error!("Transaction {} not committed after {}s", hash, config.timeout_secs);
    Err(ChainError::Timeout(format!("{} not committed after {}s", hash, config.timeout_secs)))
}

#[cfg(target_arch = "wasm32")]
mod web {
    use serde_json::Value;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{poll_transaction, PollConfig};
    use crate::core::chain::{ChainClient, ChainError, CommittedTransaction, TransactionHash};
    use crate::core::network_config::NetworkType;

    /// Fullnode REST client over the browser `fetch` API
    pub struct RestConnection {
        endpoint: String,
        poll: PollConfig,
    }

    impl RestConnection {
        pub fn new(network: NetworkType) -> Self {
            let endpoint = network.config().fullnode_url;
            log::debug!("Selected fullnode endpoint: {}", endpoint);
            Self::with_endpoint(endpoint)
        }

        pub fn with_endpoint(endpoint: &str) -> Self {
            Self {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                poll: PollConfig::default(),
            }
        }

        pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
            self.poll = poll;
            self
        }

        /// GET a JSON document, `Ok(None)` on 404
        async fn get_json(&self, path: &str) -> Result<Option<Value>, ChainError> {
            let url = format!("{}{}", self.endpoint, path);

            let opts = RequestInit::new();
            opts.set_method("GET");
            opts.set_mode(RequestMode::Cors);

            let request = Request::new_with_str_and_init(&url, &opts)
                .map_err(|e| {
                    log::error!("Failed to create HTTP request: {:?}", e);
                    ChainError::Network(format!("Failed to create request: {:?}", e))
                })?;

            request.headers().set("Accept", "application/json")
                .map_err(|e| ChainError::Network(format!("Failed to set headers: {:?}", e)))?;

            let window = web_sys::window()
                .ok_or_else(|| ChainError::Network("No window object".to_string()))?;
            let resp_value = JsFuture::from(window.fetch_with_request(&request))
                .await
                .map_err(|e| {
                    log::error!("HTTP request failed: {:?}", e);
                    ChainError::Network(format!("Failed to send request: {:?}", e))
                })?;

            let resp: Response = resp_value.dyn_into()
                .map_err(|e| ChainError::Network(format!("Failed to convert response: {:?}", e)))?;

            if resp.status() == 404 {
                return Ok(None);
            }
            if !resp.ok() {
                log::error!("HTTP error: status={}, status_text={}", resp.status(), resp.status_text());
                return Err(ChainError::Network(format!("HTTP {} {}", resp.status(), resp.status_text())));
            }

            let text = JsFuture::from(resp.text().map_err(|e| {
                ChainError::Network(format!("Failed to read body: {:?}", e))
            })?)
                .await
                .map_err(|e| ChainError::Network(format!("Failed to read body: {:?}", e)))?;

            let body = text.as_string()
                .ok_or_else(|| ChainError::Network("Response body is not text".to_string()))?;

            serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| {
                    log::error!("Failed to parse response JSON: {}", e);
                    ChainError::Network(format!("Failed to parse JSON: {}", e))
                })
        }
    }

    impl ChainClient for RestConnection {
        async fn wait_for_transaction(&self, hash: &TransactionHash) -> Result<CommittedTransaction, ChainError> {
            let path = format!("/transactions/by_hash/{}", hash);
            let path = path.as_str();
            poll_transaction(
                hash,
                &self.poll,
                move || self.get_json(path),
                |ms| gloo_timers::future::TimeoutFuture::new(ms),
            ).await
        }
    }
}
