use alloy_primitives::Address;
use dd_api_types::{DonationRecord, SessionSnapshot};
use dd_contract::DonationReader;
use dd_wallet_client::{AccountSubscription, Sleeper, WalletProvider, WalletSigner};
use std::rc::Rc;
use tracing::{info, warn};

use crate::config::DonationConfig;
use crate::error::SessionError;
use crate::guard::ensure_expected_chain;
use crate::ledger::{LedgerBook, LedgerRefresh, fetch_ledger};
use crate::reactor::AccountChangeReactor;
use crate::store::{ConnectTicket, SessionStore};

/// Wallet and contract session for one page lifetime.
///
/// Connection fields are written only by the store (through `connect`,
/// account changes and `disconnect_detected`); the ledger is written only by
/// ledger refreshes. Presentation code reads both through snapshots.
pub struct DonationSession<P, S> {
    provider: Option<Rc<P>>,
    pub(crate) sleeper: S,
    pub(crate) config: DonationConfig,
    pub(crate) store: SessionStore<P>,
    pub(crate) ledger: LedgerBook,
}

impl<P, S> DonationSession<P, S> {
    /// `provider` is `None` when no injected wallet was found.
    pub fn new(provider: Option<P>, sleeper: S, config: DonationConfig) -> Self {
        Self {
            provider: provider.map(Rc::new),
            sleeper,
            config,
            store: SessionStore::new(),
            ledger: LedgerBook::default(),
        }
    }

    pub fn config(&self) -> &DonationConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn session(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    /// Donations, newest first, as of the last applied refresh.
    pub fn ledger(&self) -> Vec<DonationRecord> {
        self.ledger.snapshot()
    }

    /// The wallet reported zero authorized accounts.
    pub fn disconnect_detected(&self) {
        self.store.disconnect();
    }

    /// Removes the wallet's account listener. The reactor stops once its
    /// subscription closes.
    pub fn teardown(&self) {
        if let Some(subscription) = self.store.take_subscription() {
            subscription.cancel();
            info!("session torn down");
        }
    }

    pub(crate) fn provider(&self) -> Result<&Rc<P>, SessionError> {
        self.provider.as_ref().ok_or(SessionError::NoProvider)
    }
}

impl<P: WalletProvider, S: Sleeper> DonationSession<P, S> {
    /// Checks the network, binds the contract read-only and subscribes to
    /// account changes. The returned reactor must be driven by the caller.
    pub async fn initialize(self: &Rc<Self>) -> Result<AccountChangeReactor<P, S>, SessionError> {
        let Some(provider) = self.provider.as_ref() else {
            warn!("no injected wallet provider");
            return Err(SessionError::NoProvider);
        };
        self.store.begin_init()?;

        let _busy = self.store.busy();
        let result = self.bind_contract(provider).await;
        self.store.finish_init(result.is_ok());

        let subscription = result?;
        Ok(AccountChangeReactor::new(Rc::clone(self), subscription))
    }

    async fn bind_contract(&self, provider: &Rc<P>) -> Result<AccountSubscription, SessionError> {
        let chain_id = ensure_expected_chain(provider.as_ref(), self.config.expected_chain_id).await?;
        self.store.record_network(chain_id);

        let subscription = provider.subscribe_accounts().map_err(|err| {
            warn!(error = %err, "wallet cannot report account changes");
            SessionError::ProviderUnsupported(err)
        })?;
        let reader = DonationReader::new(Rc::clone(provider), self.config.contract_address);
        self.store.install(reader, subscription.handle());
        Ok(subscription)
    }

    /// Asks the wallet for accounts (may prompt), then binds the primary
    /// account and refreshes balance and ledger.
    ///
    /// A failed ledger read after binding returns `Err(Read)` with the
    /// session left connected.
    pub async fn connect(&self) -> Result<Address, SessionError> {
        self.connect_account(None).await
    }

    /// Same as [`DonationSession::connect`] for an account the wallet has
    /// already announced, without prompting.
    pub(crate) async fn switch_account(&self, account: Address) -> Result<Address, SessionError> {
        self.connect_account(Some(account)).await
    }

    async fn connect_account(&self, announced: Option<Address>) -> Result<Address, SessionError> {
        let provider = self.provider()?;
        let reader = self.store.reader().ok_or(SessionError::NotInitialized)?;

        let _busy = self.store.busy();
        let ticket = self.store.begin_connect();
        let account = match self.bind_account(provider, &reader, ticket, announced).await {
            Ok(account) => account,
            Err(err) => {
                self.store.abort_connect(ticket);
                warn!(error = %err, "connect failed");
                return Err(err);
            }
        };

        self.load_ledger().await?;
        Ok(account)
    }

    async fn bind_account(
        &self,
        provider: &Rc<P>,
        reader: &DonationReader<P>,
        ticket: ConnectTicket,
        announced: Option<Address>,
    ) -> Result<Address, SessionError> {
        let account = match announced {
            Some(account) => account,
            None => {
                info!("requesting wallet authorization");
                let accounts = provider
                    .request_accounts()
                    .await
                    .map_err(SessionError::authorization)?;
                accounts
                    .first()
                    .copied()
                    .ok_or(SessionError::AuthorizationDenied)?
            }
        };

        let signer = WalletSigner::acquire(provider.as_ref(), account)
            .await
            .map_err(SessionError::authorization)?;
        let balance = provider
            .get_balance(account)
            .await
            .map_err(SessionError::read)?;

        self.store
            .complete_connect(ticket, account, balance, signer, reader)?;
        Ok(account)
    }

    /// Re-reads the full ledger. The previous snapshot stays on failure and
    /// when a later refresh has already landed.
    pub async fn load_ledger(&self) -> Result<LedgerRefresh, SessionError> {
        let reader = self.store.reader().ok_or(SessionError::NotInitialized)?;
        let tag = self.ledger.next_tag();

        let records = fetch_ledger(&reader).await.map_err(|err| {
            warn!(error = %err, "ledger refresh failed");
            SessionError::Read(err)
        })?;
        Ok(self.ledger.apply(tag, records))
    }
}
