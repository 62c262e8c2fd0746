use alloy_primitives::TxHash;
use dd_contract::ContractError;
use dd_wallet_client::ProviderError;
use thiserror::Error;

use crate::validate::ValidationErrors;

/// Broad category of a failure, used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No wallet provider; nothing can be done this session.
    Environment,
    /// The wallet is on another chain.
    NetworkMismatch,
    /// The user declined, or the wallet refused, account access.
    Authorization,
    /// Malformed form input. No I/O was performed.
    Validation,
    /// Cancelled, rejected, reverted, unconfirmed or undeliverable transaction.
    Transaction,
    /// A ledger, balance or network query failed; the previous snapshot stands.
    Read,
    /// An operation was called out of order.
    Usage,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no wallet provider found; install or enable a browser wallet")]
    NoProvider,
    #[error("wallet provider cannot be used: {0}")]
    ProviderUnsupported(ProviderError),
    #[error("wrong network: expected chain {expected}, wallet is on chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("session is already initialized")]
    AlreadyInitialized,
    #[error("session is not initialized")]
    NotInitialized,
    #[error("connect a wallet first")]
    NotConnected,
    #[error("superseded by a newer connection attempt")]
    Superseded,
    #[error("wallet authorization was denied")]
    AuthorizationDenied,
    #[error("wallet error: {0}")]
    Wallet(ProviderError),
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("transaction cancelled in the wallet")]
    Cancelled,
    #[error("transaction rejected: {reason}")]
    TransactionRejected { reason: String },
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("transaction {tx_hash} is still pending")]
    StillPending { tx_hash: TxHash },
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("read failed: {0}")]
    Read(#[from] ContractError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoProvider | Self::ProviderUnsupported(_) => ErrorKind::Environment,
            Self::WrongNetwork { .. } => ErrorKind::NetworkMismatch,
            Self::AuthorizationDenied | Self::Wallet(_) => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Cancelled
            | Self::TransactionRejected { .. }
            | Self::Reverted { .. }
            | Self::StillPending { .. }
            | Self::NetworkUnreachable(_) => ErrorKind::Transaction,
            Self::Read(_) => ErrorKind::Read,
            Self::AlreadyInitialized | Self::NotInitialized | Self::NotConnected | Self::Superseded => {
                ErrorKind::Usage
            }
        }
    }

    /// Failure while asking the wallet for accounts or a signer.
    pub(crate) fn authorization(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected | ProviderError::Unauthorized => Self::AuthorizationDenied,
            other => Self::Wallet(other),
        }
    }

    /// Failure while dispatching or confirming a transaction.
    pub(crate) fn transaction(err: ContractError) -> Self {
        match err {
            ContractError::Provider(ProviderError::UserRejected) => Self::Cancelled,
            ContractError::Provider(ProviderError::Unauthorized) => Self::AuthorizationDenied,
            ContractError::Provider(err) if err.is_unreachable() => {
                Self::NetworkUnreachable(err.to_string())
            }
            ContractError::Provider(ProviderError::Rpc { message, .. }) => {
                Self::TransactionRejected { reason: message }
            }
            other => Self::TransactionRejected {
                reason: other.to_string(),
            },
        }
    }

    pub(crate) fn read(err: ProviderError) -> Self {
        Self::Read(ContractError::Provider(err))
    }
}
