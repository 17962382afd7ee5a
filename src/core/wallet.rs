use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use super::chain::TransactionHash;
use super::payload::EntryFunctionPayload;

#[cfg(target_arch = "wasm32")]
pub use self::injected::InjectedWallet;

/// Base URL of the embedded keyless wallet (Google/Apple sign-in)
const EMBEDDED_WALLET_URL: &str = "https://aptosconnect.app";

/// Error code browser wallets use when the user dismisses a request
const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    NotConnected,
    UserRejected,
    Provider(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::NotConnected => write!(f, "Wallet not connected"),
            WalletError::UserRejected => write!(f, "Request rejected in wallet"),
            WalletError::Provider(msg) => write!(f, "Wallet error: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

/// 32 byte account address
///
/// Accepts the long form, the short form (`0x1`) and bare hex; always
/// compares and displays the normalized long form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    pub const LENGTH: usize = 32;

    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > Self::LENGTH * 2 {
            return Err(format!("Invalid account address length: '{}'", s));
        }

        // left pad to 64 digits so "0x1" and "0x00..01" are the same account
        let padded = format!("{:0>width$}", digits, width = Self::LENGTH * 2);
        let bytes = hex::decode(&padded)
            .map_err(|e| format!("Invalid account address '{}': {}", s, e))?;

        let mut address = [0u8; Self::LENGTH];
        address.copy_from_slice(&bytes);
        Ok(Self(address))
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.to_hex_literal()
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_literal())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self.to_hex_literal())
    }
}

/// Identity of the connected wallet implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub name: String,
    pub url: String,
}

impl WalletInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Embedded social-login wallets cannot sign the storage uploads
    pub fn is_embedded_social_login(&self) -> bool {
        self.url.trim_end_matches('/').starts_with(EMBEDDED_WALLET_URL)
    }
}

/// Transaction accepted by the wallet and handed to the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: TransactionHash,
}

/// Connected wallet as seen by the launchpad
///
/// `sign_message` backs the storage provider's upload signatures,
/// `sign_and_submit_transaction` the collection creation itself. Both may
/// suspend until the user approves or rejects in the wallet UI.
#[allow(async_fn_in_trait)]
pub trait Wallet {
    fn account(&self) -> Option<AccountAddress>;

    fn info(&self) -> Option<WalletInfo>;

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;

    async fn sign_and_submit_transaction(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<PendingTransaction, WalletError>;
}

/// Map a provider error code to a `WalletError`
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn error_from_code(code: Option<i64>, detail: String) -> WalletError {
    match code {
        Some(USER_REJECTED_CODE) => WalletError::UserRejected,
        _ => WalletError::Provider(detail),
    }
}

/// Signature bytes from the hex string an injected wallet returns
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn decode_signature(text: &str) -> Result<Vec<u8>, WalletError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(WalletError::Provider("Empty signature".to_string()));
    }
    hex::decode(digits).map_err(|e| WalletError::Provider(format!("Invalid signature '{}': {}", text, e)))
}

/// Entry function request in the injected wallet's transaction format
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn transaction_request(payload: &EntryFunctionPayload) -> Value {
    json!({
        "type": "entry_function_payload",
        "function": payload.function,
        "type_arguments": payload.type_arguments,
        "arguments": payload.function_arguments,
    })
}

#[cfg(target_arch = "wasm32")]
mod injected {
    use js_sys::Promise;
    use serde_json::{json, Value};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::window;

    use super::{
        decode_signature, error_from_code, transaction_request, AccountAddress, PendingTransaction, Wallet,
        WalletError, WalletInfo,
    };
    use crate::core::chain::TransactionHash;
    use crate::core::payload::EntryFunctionPayload;

    /// Browser extension wallet injected on `window` (e.g. `window.aptos`)
    pub struct InjectedWallet {
        provider_key: String,
        info: WalletInfo,
        account: Option<AccountAddress>,
    }

    fn provider(key: &str) -> Result<JsValue, WalletError> {
        let window = window().ok_or_else(|| WalletError::Provider("No window object".to_string()))?;
        let provider = js_sys::Reflect::get(&window, &JsValue::from_str(key))
            .map_err(|e| WalletError::Provider(format!("Failed to get {}: {:?}", key, e)))?;
        if provider.is_undefined() || provider.is_null() {
            return Err(WalletError::NotConnected);
        }
        Ok(provider)
    }

    fn to_wallet_error(error: JsValue) -> WalletError {
        let code = js_sys::Reflect::get(&error, &JsValue::from_str("code"))
            .ok()
            .and_then(|code| code.as_f64())
            .map(|code| code as i64);
        error_from_code(code, format!("{:?}", error))
    }

    fn string_field(value: &JsValue, key: &str) -> Result<String, WalletError> {
        js_sys::Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|field| field.as_string())
            .ok_or_else(|| WalletError::Provider(format!("Wallet response has no '{}'", key)))
    }

    fn to_js(value: &Value) -> Result<JsValue, WalletError> {
        js_sys::JSON::parse(&value.to_string())
            .map_err(|e| WalletError::Provider(format!("Failed to encode request: {:?}", e)))
    }

    async fn call(provider: &JsValue, method: &str, arg: Option<&JsValue>) -> Result<JsValue, WalletError> {
        let func = js_sys::Reflect::get(provider, &JsValue::from_str(method))
            .map_err(|e| WalletError::Provider(format!("Failed to get {} function: {:?}", method, e)))?;
        if !func.is_function() {
            return Err(WalletError::Provider(format!("{} is not a function", method)));
        }

        let func = js_sys::Function::from(func);
        let promise = match arg {
            Some(arg) => func.call1(provider, arg),
            None => func.call0(provider),
        }
        .map_err(to_wallet_error)?;

        JsFuture::from(Promise::from(promise)).await.map_err(|e| {
            log::warn!("Wallet {} failed: {:?}", method, e);
            to_wallet_error(e)
        })
    }

    impl InjectedWallet {
        /// Ask the wallet under `window[provider_key]` to connect
        pub async fn connect(provider_key: &str, info: WalletInfo) -> Result<Self, WalletError> {
            let provider = provider(provider_key)?;
            let response = call(&provider, "connect", None).await?;
            let account = string_field(&response, "address")?
                .parse::<AccountAddress>()
                .map_err(WalletError::Provider)?;

            log::info!("Connected {} account {}", info.name, account);
            Ok(Self {
                provider_key: provider_key.to_string(),
                info,
                account: Some(account),
            })
        }

        pub async fn disconnect(&mut self) -> Result<(), WalletError> {
            self.account = None;
            let provider = provider(&self.provider_key)?;
            call(&provider, "disconnect", None).await?;
            Ok(())
        }

        fn connected(&self) -> Result<JsValue, WalletError> {
            if self.account.is_none() {
                return Err(WalletError::NotConnected);
            }
            provider(&self.provider_key)
        }
    }

    impl Wallet for InjectedWallet {
        fn account(&self) -> Option<AccountAddress> {
            self.account
        }

        fn info(&self) -> Option<WalletInfo> {
            Some(self.info.clone())
        }

        async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
            let provider = self.connected()?;
            let request = to_js(&json!({
                "message": hex::encode(message),
                "nonce": js_sys::Date::now().to_string(),
            }))?;
            let response = call(&provider, "signMessage", Some(&request)).await?;
            decode_signature(&string_field(&response, "signature")?)
        }

        async fn sign_and_submit_transaction(
            &self,
            payload: &EntryFunctionPayload,
        ) -> Result<PendingTransaction, WalletError> {
            let provider = self.connected()?;
            let request = to_js(&transaction_request(payload))?;
            let response = call(&provider, "signAndSubmitTransaction", Some(&request)).await?;
            let hash = string_field(&response, "hash")?;
            log::info!("Wallet submitted transaction {}", hash);
            Ok(PendingTransaction { hash: TransactionHash::new(hash) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_forms_are_the_same_account() {
        let short: AccountAddress = "0x1".parse().unwrap();
        let long: AccountAddress =
            "0x0000000000000000000000000000000000000000000000000000000000000001".parse().unwrap();
        assert_eq!(short, long);
        assert_eq!(short.to_string(), long.to_hex_literal());
    }

    #[test]
    fn address_comparison_ignores_case_and_prefix() {
        let upper: AccountAddress = "0xABCDEF".parse().unwrap();
        let bare: AccountAddress = "abcdef".parse().unwrap();
        assert_eq!(upper, bare);
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!("".parse::<AccountAddress>().is_err());
        assert!("0x".parse::<AccountAddress>().is_err());
        assert!("0xzz".parse::<AccountAddress>().is_err());
        assert!(format!("0x{}", "1".repeat(65)).parse::<AccountAddress>().is_err());
    }

    #[test]
    fn address_round_trips_through_json() {
        let address: AccountAddress = "0x2a".parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address.to_hex_literal()));
        let back: AccountAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn detects_embedded_social_login_wallet() {
        assert!(WalletInfo::new("Continue with Google", "https://aptosconnect.app").is_embedded_social_login());
        assert!(WalletInfo::new("Continue with Apple", "https://aptosconnect.app/").is_embedded_social_login());
        assert!(!WalletInfo::new("Petra", "https://petra.app").is_embedded_social_login());
    }

    #[test]
    fn rejection_code_maps_to_user_rejected() {
        assert_eq!(error_from_code(Some(4001), "denied".to_string()), WalletError::UserRejected);
        assert_eq!(
            error_from_code(Some(-32603), "internal".to_string()),
            WalletError::Provider("internal".to_string())
        );
        assert_eq!(error_from_code(None, "boom".to_string()), WalletError::Provider("boom".to_string()));
    }

    #[test]
    fn decodes_wallet_signatures() {
        assert_eq!(decode_signature("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(decode_signature("BEEF").unwrap(), vec![0xbe, 0xef]);
        assert!(decode_signature("0x").is_err());
        assert!(decode_signature("0xzz").is_err());
    }

    #[test]
    fn transaction_request_uses_injected_wallet_format() {
        let payload = EntryFunctionPayload {
            function: "0xcafe::launchpad::create_collection".to_string(),
            type_arguments: Vec::new(),
            function_arguments: vec![json!("desc"), json!({ "vec": [] })],
        };

        let request = transaction_request(&payload);

        assert_eq!(request["type"], json!("entry_function_payload"));
        assert_eq!(request["function"], json!("0xcafe::launchpad::create_collection"));
        assert_eq!(request["type_arguments"], json!([]));
        assert_eq!(request["arguments"], json!(["desc", { "vec": [] }]));
    }
}
