use alloy_primitives::{Address, TxHash};
use dd_api_types::DonationRequest;
use dd_wallet_client::{Sleeper, TxReceipt, WalletProvider};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::guard::ensure_expected_chain;
use crate::ledger::fetch_ledger;
use crate::session::DonationSession;
use crate::validate::validate_request;

/// A mined donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Set when the follow-up ledger and balance reads failed. Neither was
    /// updated; the donation itself went through.
    pub stale: Option<SessionError>,
}

impl<P: WalletProvider, S: Sleeper> DonationSession<P, S> {
    /// Validates, sends and confirms one donation, then refreshes ledger and
    /// balance together.
    ///
    /// Nothing in the session changes unless the transaction is mined
    /// successfully.
    pub async fn submit(&self, request: DonationRequest) -> Result<SubmitReceipt, SessionError> {
        let writer = self.store.writer().ok_or(SessionError::NotConnected)?;
        let donation = validate_request(&request).map_err(|errors| {
            debug!(%errors, "donation rejected before dispatch");
            SessionError::Validation(errors)
        })?;
        let provider = self.provider()?;

        let _busy = self.store.busy();
        ensure_expected_chain(provider.as_ref(), self.config.expected_chain_id)
            .await
            .map_err(|err| match err {
                SessionError::Read(err) => SessionError::transaction(err),
                other => other,
            })?;

        // The account may have changed or gone while the chain id was queried.
        let writer = match self.store.writer() {
            None => {
                warn!("wallet disconnected before the donation was sent");
                return Err(SessionError::NotConnected);
            }
            Some(current) if current.signer() != writer.signer() => {
                warn!(signer = %current.signer(), "account switched before the donation was sent");
                return Err(SessionError::Superseded);
            }
            Some(current) => current,
        };

        let tx_hash = writer
            .donate(donation.recipient, &donation.message, donation.value)
            .await
            .map_err(|err| {
                let err = SessionError::transaction(err);
                warn!(error = %err, "donation was not sent");
                err
            })?;

        let receipt = self.await_receipt(provider.as_ref(), tx_hash).await?;
        if !receipt.success {
            warn!(%tx_hash, "donation reverted");
            return Err(SessionError::Reverted { tx_hash });
        }
        info!(%tx_hash, block = ?receipt.block_number, "donation confirmed");

        let stale = self.refresh_after_donation(writer.signer()).await.err();
        Ok(SubmitReceipt {
            tx_hash,
            block_number: receipt.block_number,
            stale,
        })
    }

    /// Polls for the receipt until it appears or the confirmation timeout
    /// passes.
    async fn await_receipt(&self, provider: &P, tx_hash: TxHash) -> Result<TxReceipt, SessionError> {
        let policy = self.config.confirmation;
        let mut waited = Duration::ZERO;

        loop {
            match provider.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(err) => return Err(SessionError::transaction(err.into())),
            }

            if policy.timeout.is_some_and(|timeout| waited >= timeout) {
                warn!(%tx_hash, waited_secs = waited.as_secs(), "donation still pending");
                return Err(SessionError::StillPending { tx_hash });
            }
            self.sleeper.sleep(policy.poll_interval).await;
            waited += policy.poll_interval;
        }
    }

    async fn refresh_after_donation(&self, account: Address) -> Result<(), SessionError> {
        let provider = self.provider()?;
        let reader = self.store.reader().ok_or(SessionError::NotInitialized)?;
        let tag = self.ledger.next_tag();

        let outcome = async {
            let records = fetch_ledger(&reader).await?;
            let balance = provider
                .get_balance(account)
                .await
                .map_err(SessionError::read)?;
            Ok::<_, SessionError>((records, balance))
        }
        .await;

        let (records, balance) = outcome.inspect_err(|err| {
            warn!(error = %err, "refresh after donation failed");
        })?;

        // Both writes land before control returns to the caller.
        self.ledger.apply(tag, records);
        self.store.set_balance(account, balance);
        Ok(())
    }
}
