use alloy_primitives::Address;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sepolia.
pub const DEFAULT_EXPECTED_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(180);

pub const ENV_CONTRACT_ADDRESS: &str = "DD_CONTRACT_ADDRESS";
pub const ENV_EXPECTED_CHAIN_ID: &str = "DD_EXPECTED_CHAIN_ID";
pub const ENV_CONFIRM_POLL_MS: &str = "DD_CONFIRM_POLL_MS";
pub const ENV_CONFIRM_TIMEOUT_SECS: &str = "DD_CONFIRM_TIMEOUT_SECS";

/// How long to wait for a submitted donation to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_CONFIRM_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationConfig {
    pub expected_chain_id: u64,
    pub contract_address: Address,
    pub confirmation: ConfirmationPolicy,
}

impl DonationConfig {
    /// Defaults for everything except the deployed contract address.
    pub fn new(contract_address: Address) -> Self {
        Self {
            expected_chain_id: DEFAULT_EXPECTED_CHAIN_ID,
            contract_address,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    /// Reads `DD_CONTRACT_ADDRESS` (required), `DD_EXPECTED_CHAIN_ID`,
    /// `DD_CONFIRM_POLL_MS` and `DD_CONFIRM_TIMEOUT_SECS` (`0` disables the
    /// timeout) from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same keys as [`DonationConfig::from_env`], from any source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let contract_address = value(ENV_CONTRACT_ADDRESS)
            .with_context(|| format!("{ENV_CONTRACT_ADDRESS} is not set"))?
            .parse::<Address>()
            .with_context(|| format!("{ENV_CONTRACT_ADDRESS} is not a valid address"))?;

        let mut config = Self::new(contract_address);

        if let Some(raw) = value(ENV_EXPECTED_CHAIN_ID) {
            config.expected_chain_id = raw
                .parse()
                .with_context(|| format!("{ENV_EXPECTED_CHAIN_ID} must be an integer, got {raw:?}"))?;
        }

        if let Some(raw) = value(ENV_CONFIRM_POLL_MS) {
            let millis: u64 = raw
                .parse()
                .with_context(|| format!("{ENV_CONFIRM_POLL_MS} must be an integer, got {raw:?}"))?;
            if millis == 0 {
                bail!("{ENV_CONFIRM_POLL_MS} must be greater than zero");
            }
            config.confirmation.poll_interval = Duration::from_millis(millis);
        }

        if let Some(raw) = value(ENV_CONFIRM_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().with_context(|| {
                format!("{ENV_CONFIRM_TIMEOUT_SECS} must be an integer, got {raw:?}")
            })?;
            config.confirmation.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONTRACT: &str = "0x00000000000000000000000000000000000d0d0d";

    fn load(pairs: &[(&str, &str)]) -> Result<DonationConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        DonationConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_address_is_set() {
        let config = load(&[(ENV_CONTRACT_ADDRESS, CONTRACT)]).unwrap();
        assert_eq!(config.expected_chain_id, 11_155_111);
        assert_eq!(config.contract_address, CONTRACT.parse::<Address>().unwrap());
        assert_eq!(config.confirmation.poll_interval, Duration::from_secs(4));
        assert_eq!(config.confirmation.timeout, Some(Duration::from_secs(180)));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (ENV_CONTRACT_ADDRESS, CONTRACT),
            (ENV_EXPECTED_CHAIN_ID, "31337"),
            (ENV_CONFIRM_POLL_MS, "250"),
            (ENV_CONFIRM_TIMEOUT_SECS, "0"),
        ])
        .unwrap();
        assert_eq!(config.expected_chain_id, 31_337);
        assert_eq!(config.confirmation.poll_interval, Duration::from_millis(250));
        assert_eq!(config.confirmation.timeout, None);
    }

    #[test]
    fn missing_or_bad_values_are_reported() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains(ENV_CONTRACT_ADDRESS));

        let err = load(&[(ENV_CONTRACT_ADDRESS, "0xabc")]).unwrap_err();
        assert!(err.to_string().contains("not a valid address"));

        let err = load(&[(ENV_CONTRACT_ADDRESS, CONTRACT), (ENV_EXPECTED_CHAIN_ID, "sepolia")])
            .unwrap_err();
        assert!(err.to_string().contains(ENV_EXPECTED_CHAIN_ID));

        let err = load(&[(ENV_CONTRACT_ADDRESS, CONTRACT), (ENV_CONFIRM_POLL_MS, "0")]).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[(ENV_CONTRACT_ADDRESS, CONTRACT), (ENV_EXPECTED_CHAIN_ID, "  ")]).unwrap();
        assert_eq!(config.expected_chain_id, DEFAULT_EXPECTED_CHAIN_ID);
    }
}
