//! Connection fields of the session and the contract bindings derived from
//! them. Every mutation of those fields goes through here.

use alloy_primitives::{Address, U256};
use dd_api_types::{ConnectionStatus, SessionSnapshot};
use dd_contract::{DonationReader, DonationWriter};
use dd_wallet_client::{SubscriptionHandle, WalletSigner};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::info;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Idle,
    Pending,
    Ready,
}

/// Issued by [`SessionStore::begin_connect`]. A connect may only complete
/// while its epoch is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConnectTicket {
    epoch: u64,
    prior: ConnectionStatus,
}

pub(crate) struct SessionStore<P> {
    state: RefCell<SessionSnapshot>,
    reader: RefCell<Option<DonationReader<P>>>,
    writer: RefCell<Option<Rc<DonationWriter<P>>>>,
    subscription: RefCell<Option<SubscriptionHandle>>,
    init: Cell<InitState>,
    epoch: Cell<u64>,
    busy: Rc<Cell<usize>>,
}

impl<P> SessionStore<P> {
    pub(crate) fn new() -> Self {
        Self {
            state: RefCell::new(SessionSnapshot::default()),
            reader: RefCell::new(None),
            writer: RefCell::new(None),
            subscription: RefCell::new(None),
            init: Cell::new(InitState::Idle),
            epoch: Cell::new(0),
            busy: Rc::new(Cell::new(0)),
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = self.state.borrow().clone();
        snapshot.loading = self.busy.get() > 0;
        snapshot
    }

    pub(crate) fn begin_init(&self) -> Result<(), SessionError> {
        match self.init.get() {
            InitState::Idle => {
                self.init.set(InitState::Pending);
                Ok(())
            }
            InitState::Pending | InitState::Ready => Err(SessionError::AlreadyInitialized),
        }
    }

    /// A failed initialization may be retried.
    pub(crate) fn finish_init(&self, succeeded: bool) {
        self.init.set(if succeeded {
            InitState::Ready
        } else {
            InitState::Idle
        });
    }

    pub(crate) fn record_network(&self, chain_id: u64) {
        self.state.borrow_mut().network_id = Some(chain_id);
    }

    /// Installs the read-only binding and the account subscription handle.
    pub(crate) fn install(&self, reader: DonationReader<P>, subscription: SubscriptionHandle) {
        info!(contract = %reader.address(), "contract binding ready");
        *self.reader.borrow_mut() = Some(reader);
        *self.subscription.borrow_mut() = Some(subscription);
    }

    pub(crate) fn reader(&self) -> Option<DonationReader<P>> {
        self.reader.borrow().clone()
    }

    /// The signer-bound binding. Only handed out while connected.
    pub(crate) fn writer(&self) -> Option<Rc<DonationWriter<P>>> {
        if self.state.borrow().status != ConnectionStatus::Connected {
            return None;
        }
        self.writer.borrow().clone()
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch
    }

    fn bump_epoch(&self) -> u64 {
        let next = self.epoch.get().wrapping_add(1);
        self.epoch.set(next);
        next
    }

    pub(crate) fn begin_connect(&self) -> ConnectTicket {
        let epoch = self.bump_epoch();
        let mut state = self.state.borrow_mut();
        let prior = state.status;
        state.status = ConnectionStatus::Connecting;
        ConnectTicket { epoch, prior }
    }

    /// Restores the status seen before the attempt, unless something newer
    /// has taken over in the meantime.
    pub(crate) fn abort_connect(&self, ticket: ConnectTicket) {
        if self.is_current(ticket.epoch) {
            self.state.borrow_mut().status = ticket.prior;
        }
    }

    pub(crate) fn complete_connect(
        &self,
        ticket: ConnectTicket,
        account: Address,
        balance: U256,
        signer: WalletSigner,
        reader: &DonationReader<P>,
    ) -> Result<(), SessionError> {
        if !self.is_current(ticket.epoch) {
            return Err(SessionError::Superseded);
        }

        {
            let mut state = self.state.borrow_mut();
            state.status = ConnectionStatus::Connected;
            state.account = Some(account);
            state.balance_wei = balance;
        }
        *self.writer.borrow_mut() = Some(Rc::new(reader.connect(signer)));

        info!(%account, "wallet connected");
        Ok(())
    }

    /// Drops the account and the signer-bound binding.
    pub(crate) fn disconnect(&self) {
        self.bump_epoch();
        *self.writer.borrow_mut() = None;
        let mut state = self.state.borrow_mut();
        state.status = ConnectionStatus::Disconnected;
        state.account = None;
        state.balance_wei = U256::ZERO;
        info!("wallet disconnected");
    }

    /// Applies a balance read for `account` if it is still the active one.
    pub(crate) fn set_balance(&self, account: Address, balance: U256) -> bool {
        let mut state = self.state.borrow_mut();
        if state.status != ConnectionStatus::Connected || state.account != Some(account) {
            return false;
        }
        state.balance_wei = balance;
        true
    }

    pub(crate) fn busy(&self) -> BusyGuard {
        self.busy.set(self.busy.get() + 1);
        BusyGuard {
            counter: Rc::clone(&self.busy),
        }
    }

    pub(crate) fn take_subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription.borrow_mut().take()
    }
}

/// Keeps `SessionSnapshot::loading` set while alive.
pub(crate) struct BusyGuard {
    counter: Rc<Cell<usize>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.counter.set(self.counter.get().saturating_sub(1));
    }
}
