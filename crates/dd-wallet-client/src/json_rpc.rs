use alloy_primitives::{Address, Bytes, TxHash, U64, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    AccountSubscription, CallRequest, ProviderError, TransactionRequest, TxReceipt, WalletProvider,
};

/// Raw EIP-1193 surface: `request({ method, params })` plus the
/// `accountsChanged` event.
#[async_trait(?Send)]
pub trait RpcTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
    fn subscribe_accounts(&self) -> Result<AccountSubscription, ProviderError>;
}

/// Maps the typed wallet operations onto standard `eth_*` methods.
pub struct JsonRpcWallet<T> {
    transport: T,
}

impl<T> JsonRpcWallet<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: TxHash,
    block_number: Option<U64>,
    status: Option<U64>,
}

impl<T: RpcTransport> JsonRpcWallet<T> {
    async fn request_as<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, ProviderError> {
        debug!(method, "wallet request");
        let value = self.transport.request(method, params).await?;
        serde_json::from_value(value).map_err(|err| ProviderError::Decode {
            method: method.to_owned(),
            reason: err.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl<T: RpcTransport> WalletProvider for JsonRpcWallet<T> {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.request_as("eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.request_as("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let id: U64 = self.request_as("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn get_balance(&self, account: Address) -> Result<U256, ProviderError> {
        self.request_as("eth_getBalance", json!([account, "latest"]))
            .await
    }

    async fn call(&self, request: CallRequest) -> Result<Bytes, ProviderError> {
        self.request_as("eth_call", json!([request, "latest"])).await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, ProviderError> {
        self.request_as("eth_sendTransaction", json!([request]))
            .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ProviderError> {
        let receipt: Option<RpcReceipt> = self
            .request_as("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        Ok(receipt.map(|receipt| TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.to::<u64>()),
            // Pre-Byzantium receipts carry no status; treat inclusion as success.
            success: receipt.status.is_none_or(|status| !status.is_zero()),
        }))
    }

    fn subscribe_accounts(&self) -> Result<AccountSubscription, ProviderError> {
        self.transport.subscribe_accounts()
    }
}
