use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, B256, Bytes, U64, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::data::types::{AddChainParams, ReceiptStatus};

/// EIP-1193 error code for "the wallet does not know this chain".
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// An error object returned by the wallet. Displayed verbatim.
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("wallet unreachable: {0}")]
    Transport(String),

    #[error("unexpected response to {method}: {reason}")]
    Decode { method: String, reason: String },

    #[error("wallet returned no accounts")]
    NoAccounts,
}

impl WalletError {
    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self, WalletError::Rpc { code, .. } if *code == UNRECOGNIZED_CHAIN)
    }
}

/// The single seam to the wallet: an EIP-1193 `request({ method, params })`.
#[async_trait]
pub trait Eip1193: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;
}

/// JSON-RPC 2.0 over HTTP, as exposed by desktop wallets (e.g. Frame on
/// `http://127.0.0.1:1248`).
pub struct HttpWallet {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl HttpWallet {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Eip1193 for HttpWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        log::debug!("-> {method} #{id}");
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        let parsed: RpcResponse = response.json().await.map_err(|e| WalletError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(err) = parsed.error {
            log::debug!("<- {method} #{id} error {}: {}", err.code, err.message);
            return Err(WalletError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

/// Typed wallet operations on top of an [`Eip1193`] transport.
#[derive(Clone)]
pub struct Wallet {
    inner: Arc<dyn Eip1193>,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").finish_non_exhaustive()
    }
}

impl Wallet {
    pub fn new(inner: Arc<dyn Eip1193>) -> Self {
        Self { inner }
    }

    pub fn http(url: &str) -> Self {
        Self::new(Arc::new(HttpWallet::new(url)))
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, WalletError> {
        let value = self.inner.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| WalletError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    /// `eth_requestAccounts`: prompts the user and returns the first account.
    pub async fn request_accounts(&self) -> Result<Address, WalletError> {
        let accounts: Vec<Address> = self.request_as("eth_requestAccounts", json!([])).await?;
        accounts.first().copied().ok_or(WalletError::NoAccounts)
    }

    /// `eth_accounts`: the currently exposed accounts, without prompting.
    pub async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.request_as("eth_accounts", json!([])).await
    }

    pub async fn chain_id(&self) -> Result<u64, WalletError> {
        let id: U64 = self.request_as("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    pub async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), WalletError> {
        self.inner
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id_hex }]),
            )
            .await?;
        Ok(())
    }

    pub async fn add_chain(&self, params: &AddChainParams) -> Result<(), WalletError> {
        self.inner
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    pub async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        self.request_as("eth_getBalance", json!([address, "latest"]))
            .await
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, WalletError> {
        self.request_as("eth_call", json!([tx, "latest"])).await
    }

    /// `eth_sendTransaction`: the wallet signs and broadcasts, returning the hash.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, WalletError> {
        self.request_as("eth_sendTransaction", json!([tx])).await
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<ReceiptStatus>, WalletError> {
        self.request_as("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}
