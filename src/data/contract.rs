use std::time::Duration;

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::data::types::{FundsCheck, TxOutcome, UserStats};
use crate::data::wallet::{Wallet, WalletError};

sol! {
    #[allow(missing_docs)]
    function sayGM() external payable;
    #[allow(missing_docs)]
    function getGmFee() external view returns (uint256 fee);
    #[allow(missing_docs)]
    function getUserStats(address user) external view returns (uint256 streak, uint256 total, uint256 last);
    #[allow(missing_docs)]
    function getFeeInUSD() external view returns (uint256 usd);
    #[allow(missing_docs)]
    function getCeloPrice() external view returns (uint256 price);
}

/// Read/write handle on one network's GM contract.
///
/// Every call goes to `address` on whatever chain the wallet is currently on.
/// Callers are responsible for checking that the active chain is the right one.
pub struct GmContract {
    wallet: Wallet,
    address: Address,
}

impl GmContract {
    pub fn new(wallet: Wallet, address: Address) -> Self {
        Self { wallet, address }
    }

    fn request(&self, calldata: Vec<u8>) -> TransactionRequest {
        TransactionRequest::default()
            .to(self.address)
            .input(TransactionInput::both(Bytes::from(calldata)))
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, WalletError> {
        let output = self.wallet.call(&self.request(call.abi_encode())).await?;
        C::abi_decode_returns(&output, true).map_err(|e| WalletError::Decode {
            method: C::SIGNATURE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fee in wei required by `sayGM()`.
    pub async fn fee(&self) -> Result<U256, WalletError> {
        Ok(self.read(getGmFeeCall {}).await?.fee)
    }

    pub async fn user_stats(&self, user: Address) -> Result<UserStats, WalletError> {
        let ret = self.read(getUserStatsCall { user }).await?;
        Ok(UserStats {
            streak: ret.streak,
            total: ret.total,
            last: ret.last,
        })
    }

    pub async fn fee_in_usd(&self) -> Result<U256, WalletError> {
        Ok(self.read(getFeeInUSDCall {}).await?.usd)
    }

    pub async fn reference_price(&self) -> Result<U256, WalletError> {
        Ok(self.read(getCeloPriceCall {}).await?.price)
    }

    /// Submit `sayGM()` from `from`, paying `value`. Returns the transaction hash
    /// as soon as the wallet has broadcast it.
    pub async fn say_gm(&self, from: Address, value: U256) -> Result<B256, WalletError> {
        let tx = self
            .request(sayGMCall {}.abi_encode())
            .from(from)
            .value(value);
        self.wallet.send_transaction(&tx).await
    }

    /// Poll for the receipt until the transaction is mined.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        poll: Duration,
    ) -> Result<TxOutcome, WalletError> {
        loop {
            if let Some(receipt) = self.wallet.transaction_receipt(hash).await? {
                if let Some(block) = receipt.block_number {
                    log::debug!("{hash} mined in block {block}");
                }
                return Ok(if receipt.succeeded() {
                    TxOutcome::Confirmed(receipt.transaction_hash)
                } else {
                    TxOutcome::Reverted(receipt.transaction_hash)
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Compare the account balance against the current fee.
    pub async fn check_funds(&self, account: Address) -> Result<FundsCheck, WalletError> {
        let balance = self.wallet.balance(account).await?;
        let fee = self.fee().await?;
        let check = FundsCheck::new(balance, fee);
        if !check.sufficient {
            log::info!(
                "insufficient funds for {account}: balance {} < fee {}",
                check.balance,
                check.fee
            );
        }
        Ok(check)
    }
}
