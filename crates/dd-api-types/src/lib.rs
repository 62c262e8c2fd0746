use alloy_primitives::utils::format_ether;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Read-only view of the wallet session handed to presentation code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub account: Option<Address>,
    pub balance_wei: U256,
    pub network_id: Option<u64>,
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.account.is_some()
    }

    pub fn balance_ether(&self) -> String {
        format_ether(self.balance_wei)
    }

    /// Balance in ether rounded half-up to `places` decimals (at most 18).
    pub fn balance_ether_fixed(&self, places: u8) -> String {
        let places = places.min(18);
        let scale = U256::from(10u64).pow(U256::from(18 - places));
        let half = scale / U256::from(2u64);
        let scaled = self.balance_wei.saturating_add(half) / scale;
        if places == 0 {
            return scaled.to_string();
        }
        let unit = U256::from(10u64).pow(U256::from(places));
        format!(
            "{}.{:0>width$}",
            scaled / unit,
            (scaled % unit).to_string(),
            width = usize::from(places)
        )
    }
}

/// `0x1234...abcd` form of an address for compact display.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// One donation as stored by the collaborator contract.
///
/// The contract is authoritative; this is a projection refreshed in full on
/// every ledger load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DonationRecord {
    pub donor: Address,
    pub recipient: Address,
    pub amount_wei: U256,
    /// `amount_wei` rendered in ether.
    pub amount: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl DonationRecord {
    pub fn is_donor(&self, account: &Address) -> bool {
        self.donor == *account
    }

    pub fn is_recipient(&self, account: &Address) -> bool {
        self.recipient == *account
    }

    pub fn involves(&self, account: &Address) -> bool {
        self.is_donor(account) || self.is_recipient(account)
    }
}

/// Raw form input for a donation. Nothing here has been validated yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DonationRequest {
    pub recipient: String,
    pub amount: String,
    #[serde(default)]
    pub message: String,
}

impl DonationRequest {
    pub fn new(
        recipient: impl Into<String>,
        amount: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            message: message.into(),
        }
    }
}
