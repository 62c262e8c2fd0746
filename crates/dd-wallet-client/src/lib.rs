use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

mod json_rpc;
mod subscription;

pub use json_rpc::{JsonRpcWallet, RpcTransport};
pub use subscription::{AccountSubscription, SubscriptionHandle};

/// EIP-1193 `userRejectedRequest`.
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193 `unauthorized`.
pub const CODE_UNAUTHORIZED: i64 = 4100;
/// EIP-1193 `disconnected`.
pub const CODE_DISCONNECTED: i64 = 4900;
/// EIP-1193 `chainDisconnected`.
pub const CODE_CHAIN_DISCONNECTED: i64 = 4901;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("wallet has not authorized this account")]
    Unauthorized,
    #[error("wallet is disconnected: {0}")]
    Disconnected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<String>,
    },
    #[error("unexpected response to {method}: {reason}")]
    Decode { method: String, reason: String },
}

impl ProviderError {
    /// Classifies a JSON-RPC / EIP-1193 error object.
    pub fn from_rpc(code: i64, message: impl Into<String>, data: Option<String>) -> Self {
        let message = message.into();
        match code {
            CODE_USER_REJECTED => Self::UserRejected,
            CODE_UNAUTHORIZED => Self::Unauthorized,
            CODE_DISCONNECTED | CODE_CHAIN_DISCONNECTED => Self::Disconnected(message),
            _ => Self::Rpc {
                code,
                message,
                data,
            },
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected)
    }

    /// The wallet or node could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Disconnected(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    pub to: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// The injected wallet as seen by the session manager.
///
/// Futures are `!Send`: the browser runs everything on one thread and
/// implementations hold JS handles.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Asks the wallet to authorize accounts. May prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// Accounts already authorized, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<u64, ProviderError>;
    async fn get_balance(&self, account: Address) -> Result<U256, ProviderError>;
    async fn call(&self, request: CallRequest) -> Result<Bytes, ProviderError>;
    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, ProviderError>;
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ProviderError>;
    fn subscribe_accounts(&self) -> Result<AccountSubscription, ProviderError>;
}

#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// An account the wallet will sign for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSigner {
    account: Address,
}

impl WalletSigner {
    /// Derives a signer for `account`, which must be among the wallet's
    /// currently authorized accounts.
    pub async fn acquire<P>(provider: &P, account: Address) -> Result<Self, ProviderError>
    where
        P: WalletProvider + ?Sized,
    {
        let accounts = provider.accounts().await?;
        if !accounts.contains(&account) {
            tracing::warn!(%account, "wallet no longer exposes the authorized account");
            return Err(ProviderError::Unauthorized);
        }
        Ok(Self { account })
    }

    pub fn address(&self) -> Address {
        self.account
    }
}
