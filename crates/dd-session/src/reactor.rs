use alloy_primitives::Address;
use dd_wallet_client::{AccountSubscription, Sleeper, SubscriptionHandle, WalletProvider};
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::session::DonationSession;

/// Sole consumer of the wallet's `accountsChanged` events.
///
/// Created once by [`DonationSession::initialize`]; it owns the only account
/// subscription of the session.
pub struct AccountChangeReactor<P, S> {
    session: Rc<DonationSession<P, S>>,
    subscription: AccountSubscription,
}

impl<P, S> AccountChangeReactor<P, S> {
    pub(crate) fn new(session: Rc<DonationSession<P, S>>, subscription: AccountSubscription) -> Self {
        Self {
            session,
            subscription,
        }
    }

    pub fn subscription_handle(&self) -> SubscriptionHandle {
        self.subscription.handle()
    }
}

impl<P: WalletProvider, S: Sleeper> AccountChangeReactor<P, S> {
    /// Applies one account list: empty disconnects, otherwise the first
    /// account becomes the active one.
    pub async fn handle(&self, accounts: Vec<Address>) -> Result<(), SessionError> {
        match accounts.first() {
            None => {
                info!("wallet reported no accounts");
                self.session.disconnect_detected();
                Ok(())
            }
            Some(&account) => {
                info!(%account, "wallet switched account");
                self.session.switch_account(account).await.map(|_| ())
            }
        }
    }

    /// Handles events until the subscription is cancelled. Failures go to
    /// `on_error`, since no user action is waiting on them.
    pub async fn run<F>(self, mut on_error: F)
    where
        F: FnMut(SessionError),
    {
        self.run_with(|outcome| {
            if let Err(err) = outcome {
                on_error(err);
            }
        })
        .await;
    }

    /// Like [`AccountChangeReactor::run`], reporting every handled event so
    /// the caller can re-render. Superseded attempts are not reported.
    pub async fn run_with<F>(mut self, mut on_event: F)
    where
        F: FnMut(Result<(), SessionError>),
    {
        while let Some(accounts) = self.subscription.next().await {
            match self.handle(accounts).await {
                Err(SessionError::Superseded) => debug!("account change superseded"),
                Err(err) => {
                    warn!(error = %err, "account re-synchronization failed");
                    on_event(Err(err));
                }
                Ok(()) => on_event(Ok(())),
            }
        }
        debug!("account subscription closed");
    }
}
