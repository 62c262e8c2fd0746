use alloy_primitives::utils::format_ether;
use alloy_primitives::{Address, TxHash, U256};
use alloy_sol_types::{SolCall, sol};
use chrono::{DateTime, Utc};
use dd_api_types::DonationRecord;
use dd_wallet_client::{CallRequest, ProviderError, TransactionRequest, WalletProvider, WalletSigner};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

sol! {
    /// Call surface of the deployed donation contract.
    interface IDonation {
        function getDonationsCount() external view returns (uint256);
        function getDonation(uint256 index)
            external
            view
            returns (
                address donor,
                address recipient,
                uint256 amount,
                uint256 timestamp,
                string message
            );
        function donate(address recipient, string message) external payable;
    }
}

/// Tuple returned by `getDonation`, before projection.
pub type RawDonation = IDonation::getDonationReturn;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("failed to decode {call} result: {reason}")]
    Decode { call: &'static str, reason: String },
    #[error("donation count {0} exceeds the supported range")]
    CountOverflow(U256),
    #[error("donation #{index} has an out-of-range timestamp {timestamp}")]
    Timestamp { index: u64, timestamp: U256 },
}

/// Read-only contract handle bound to the wallet provider.
pub struct DonationReader<P> {
    provider: Rc<P>,
    address: Address,
}

impl<P> Clone for DonationReader<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Rc::clone(&self.provider),
            address: self.address,
        }
    }
}

impl<P> DonationReader<P> {
    pub fn new(provider: Rc<P>, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Write-capable handle for `signer`, the equivalent of
    /// `contract.connect(signer)`.
    pub fn connect(&self, signer: WalletSigner) -> DonationWriter<P> {
        DonationWriter {
            provider: Rc::clone(&self.provider),
            address: self.address,
            signer,
        }
    }
}

impl<P: WalletProvider> DonationReader<P> {
    async fn call<C: SolCall>(&self, call: &C) -> Result<C::Return, ContractError> {
        let data = self
            .provider
            .call(CallRequest {
                to: self.address,
                data: call.abi_encode().into(),
            })
            .await?;

        C::abi_decode_returns(&data).map_err(|err| ContractError::Decode {
            call: C::SIGNATURE,
            reason: err.to_string(),
        })
    }

    pub async fn donations_count(&self) -> Result<u64, ContractError> {
        let count = self.call(&IDonation::getDonationsCountCall {}).await?;
        u64::try_from(count).map_err(|_| ContractError::CountOverflow(count))
    }

    /// Record at zero-based `index`, in contract insertion order.
    pub async fn donation(&self, index: u64) -> Result<DonationRecord, ContractError> {
        let raw = self
            .call(&IDonation::getDonationCall {
                index: U256::from(index),
            })
            .await?;
        project(index, raw)
    }
}

/// Signer-bound contract handle used for submissions.
pub struct DonationWriter<P> {
    provider: Rc<P>,
    address: Address,
    signer: WalletSigner,
}

impl<P> DonationWriter<P> {
    pub fn signer(&self) -> Address {
        self.signer.address()
    }
}

impl<P: WalletProvider> DonationWriter<P> {
    /// Sends `donate(recipient, message)` with `value` attached and returns
    /// the pending transaction hash. Inclusion is not awaited here.
    pub async fn donate(
        &self,
        recipient: Address,
        message: &str,
        value: U256,
    ) -> Result<TxHash, ContractError> {
        let call = IDonation::donateCall {
            recipient,
            message: message.to_owned(),
        };

        debug!(%recipient, %value, "dispatching donate");
        let tx_hash = self
            .provider
            .send_transaction(TransactionRequest {
                from: self.signer.address(),
                to: self.address,
                value,
                data: call.abi_encode().into(),
            })
            .await?;

        info!(%tx_hash, "donation transaction submitted");
        Ok(tx_hash)
    }
}

/// Projects a raw contract tuple into a display record: wei to ether,
/// epoch seconds to a UTC timestamp.
pub fn project(index: u64, raw: RawDonation) -> Result<DonationRecord, ContractError> {
    let timestamp = u64::try_from(raw.timestamp)
        .ok()
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(ContractError::Timestamp {
            index,
            timestamp: raw.timestamp,
        })?;

    Ok(DonationRecord {
        donor: raw.donor,
        recipient: raw.recipient,
        amount_wei: raw.amount,
        amount: format_ether(raw.amount),
        message: raw.message,
        timestamp,
    })
}
