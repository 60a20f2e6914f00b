use alloy::primitives::{Address, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// A network the hub can greet on. Defined once in the registry and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub chain_id: u64,
    pub contract_address: Address,
    /// Accent color as `#rrggbb`.
    pub color: &'static str,
    pub logo: &'static str,
    pub rpc_urls: &'static [&'static str],
    pub explorer_url: &'static str,
    pub currency: &'static str,
}

impl NetworkConfig {
    /// Chain id as the wallet expects it: `0x` followed by lowercase hex.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// EIP-3085 parameters for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.name.to_string(),
            native_currency: NativeCurrency {
                name: self.currency.to_string(),
                symbol: self.currency.to_string(),
                decimals: 18,
            },
            rpc_urls: self.rpc_urls.iter().map(|u| u.to_string()).collect(),
            block_explorer_urls: vec![self.explorer_url.to_string()],
        }
    }

    pub fn explorer_tx_url(&self, hash: &B256) -> String {
        format!("{}/tx/{hash}", self.explorer_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Counters returned by `getUserStats(address)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStats {
    pub streak: U256,
    pub total: U256,
    /// Third counter reported by the contract (last greeting marker).
    pub last: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundsCheck {
    pub balance: U256,
    pub fee: U256,
    pub sufficient: bool,
}

impl FundsCheck {
    pub fn new(balance: U256, fee: U256) -> Self {
        Self {
            balance,
            fee,
            sufficient: balance >= fee,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee: U256,
    pub usd: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed(B256),
    Reverted(B256),
}

/// The subset of `eth_getTransactionReceipt` we rely on. Chains with custom
/// transaction types (Celo, OP deposits) add fields we ignore.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptStatus {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
}

impl ReceiptStatus {
    /// Pre-Byzantium receipts carry no status; treat them as successful.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|s| s == U64::from(1))
    }
}
