//! Wallet and contract session manager for the donation client.
//!
//! [`DonationSession`] owns the connection state and the donation ledger.
//! Everything that talks to the wallet goes through the
//! [`WalletProvider`](dd_wallet_client::WalletProvider) seam, so the same
//! code runs against the browser wallet and against test doubles.

pub mod config;
mod error;
pub mod guard;
mod ledger;
mod reactor;
mod session;
mod store;
mod submit;
pub mod validate;

pub use config::{ConfirmationPolicy, DonationConfig};
pub use error::{ErrorKind, SessionError};
pub use ledger::LedgerRefresh;
pub use reactor::AccountChangeReactor;
pub use session::DonationSession;
pub use submit::SubmitReceipt;
pub use validate::{FieldError, ValidDonation, ValidationErrors};
