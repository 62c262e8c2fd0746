//! Donation form validation. Runs before any wallet or contract call.

use alloy_primitives::utils::parse_ether;
use alloy_primitives::{Address, U256};
use dd_api_types::DonationRequest;
use std::fmt;
use thiserror::Error;

/// Decimal places of the native unit (wei per ether).
pub const NATIVE_DECIMALS: usize = 18;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("recipient address is required")]
    RecipientRequired,
    #[error("invalid address")]
    InvalidAddress,
    #[error("amount is required")]
    AmountRequired,
    #[error("amount must be a number")]
    NotANumber,
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount has more than 18 decimal places")]
    TooPrecise,
    #[error("amount is too large")]
    TooLarge,
}

/// Per-field errors of a rejected donation request.
#[derive(Debug, Clone, Default, Error, PartialEq, Eq)]
pub struct ValidationErrors {
    pub recipient: Option<FieldError>,
    pub amount: Option<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.recipient.is_none() && self.amount.is_none()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.recipient, &self.amount) {
            (Some(recipient), Some(amount)) => write!(f, "recipient: {recipient}; amount: {amount}"),
            (Some(recipient), None) => write!(f, "recipient: {recipient}"),
            (None, Some(amount)) => write!(f, "amount: {amount}"),
            (None, None) => f.write_str("no validation errors"),
        }
    }
}

/// A request that passed validation, in contract units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDonation {
    pub recipient: Address,
    pub value: U256,
    pub message: String,
}

/// Checks both fields and reports every failing one.
pub fn validate_request(request: &DonationRequest) -> Result<ValidDonation, ValidationErrors> {
    let recipient = parse_recipient(&request.recipient);
    let value = parse_amount(&request.amount);

    match (recipient, value) {
        (Ok(recipient), Ok(value)) => Ok(ValidDonation {
            recipient,
            value,
            message: request.message.clone(),
        }),
        (recipient, value) => Err(ValidationErrors {
            recipient: recipient.err(),
            amount: value.err(),
        }),
    }
}

/// 40 hex digits, optionally prefixed with `0x`. Mixed-case input must be a
/// valid EIP-55 checksum.
pub fn parse_recipient(input: &str) -> Result<Address, FieldError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldError::RecipientRequired);
    }

    let hex = input.strip_prefix("0x").unwrap_or(input);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FieldError::InvalidAddress);
    }

    let prefixed = format!("0x{hex}");
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    if has_upper && has_lower {
        return Address::parse_checksummed(&prefixed, None).map_err(|_| FieldError::InvalidAddress);
    }

    prefixed.parse().map_err(|_| FieldError::InvalidAddress)
}

/// Parses a decimal ether amount into wei. Digits with an optional single
/// decimal point; no sign, exponent or grouping.
pub fn parse_amount(input: &str) -> Result<U256, FieldError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldError::AmountRequired);
    }

    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
        return Err(FieldError::NotANumber);
    }
    if negative {
        return Err(FieldError::NotPositive);
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > NATIVE_DECIMALS {
        return Err(FieldError::TooPrecise);
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_owned()
    } else {
        format!("{whole}.{fraction}")
    };

    let wei = parse_ether(&normalized).map_err(|_| FieldError::TooLarge)?;
    if wei.is_zero() {
        return Err(FieldError::NotPositive);
    }
    Ok(wei)
}
