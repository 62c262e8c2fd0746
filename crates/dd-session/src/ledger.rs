use dd_api_types::DonationRecord;
use dd_contract::{ContractError, DonationReader};
use dd_wallet_client::WalletProvider;
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Outcome of a ledger refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerRefresh {
    /// The snapshot was replaced; carries the new record count.
    Applied(usize),
    /// A refresh issued later had already been applied; this response was
    /// discarded.
    Stale,
}

/// Newest-first donation snapshot plus the refresh tags that guard it.
#[derive(Default)]
pub(crate) struct LedgerBook {
    records: RefCell<Vec<DonationRecord>>,
    issued: Cell<u64>,
    applied: Cell<u64>,
}

impl LedgerBook {
    /// Tag for a refresh about to start. Strictly increasing.
    pub(crate) fn next_tag(&self) -> u64 {
        let tag = self.issued.get() + 1;
        self.issued.set(tag);
        tag
    }

    /// Replaces the snapshot if no refresh issued after `tag` has landed.
    pub(crate) fn apply(&self, tag: u64, records: Vec<DonationRecord>) -> LedgerRefresh {
        if tag <= self.applied.get() {
            debug!(tag, applied = self.applied.get(), "discarding stale ledger response");
            return LedgerRefresh::Stale;
        }
        self.applied.set(tag);
        let len = records.len();
        *self.records.borrow_mut() = records;
        LedgerRefresh::Applied(len)
    }

    pub(crate) fn snapshot(&self) -> Vec<DonationRecord> {
        self.records.borrow().clone()
    }
}

/// Reads the whole ledger, index 0 upwards, and returns it newest first.
/// Any failed read aborts the fetch.
pub(crate) async fn fetch_ledger<P: WalletProvider>(
    reader: &DonationReader<P>,
) -> Result<Vec<DonationRecord>, ContractError> {
    let count = reader.donations_count().await?;
    debug!(count, "loading donation ledger");

    // The count comes from the contract; grow as records actually arrive.
    let mut records = Vec::new();
    for index in 0..count {
        records.push(reader.donation(index).await?);
    }
    records.reverse();
    Ok(records)
}
