//! In-memory wallet and donation contract for the session tests.
#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, TxHash, U256, address};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use dd_contract::{IDonation, RawDonation};
use dd_session::{ConfirmationPolicy, DonationConfig, DonationSession};
use dd_wallet_client::{
    AccountSubscription, CallRequest, ProviderError, Sleeper, SubscriptionHandle,
    TransactionRequest, TxReceipt, WalletProvider,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

pub const SEPOLIA: u64 = 11_155_111;
pub const CONTRACT: Address = address!("0x00000000000000000000000000000000000d0d0d");
pub const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
pub const BOB: Address = address!("0x2222222222222222222222222222222222222222");
pub const CAROL: Address = address!("0x3333333333333333333333333333333333333333");

pub const GENESIS_TIME: u64 = 1_700_000_000;

pub type TestSession = DonationSession<ScriptedWallet, InstantSleeper>;

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000_000_000_000_000u128)
}

pub fn config() -> DonationConfig {
    DonationConfig {
        expected_chain_id: SEPOLIA,
        contract_address: CONTRACT,
        confirmation: ConfirmationPolicy {
            poll_interval: Duration::from_secs(4),
            timeout: Some(Duration::from_secs(20)),
        },
    }
}

/// What happens to the next donation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mining {
    /// Mined before the first receipt poll.
    Immediate,
    /// The receipt shows up after this many empty polls.
    AfterPolls(u32),
    /// Mined with status 0; no record is stored.
    Revert,
    /// Never mined.
    Never,
}

struct Pending {
    receipt: Option<TxReceipt>,
    empty_polls_left: u32,
}

struct State {
    chain_id: u64,
    authorized: Vec<Address>,
    requested: Option<Vec<Address>>,
    balances: HashMap<Address, U256>,
    donations: Vec<RawDonation>,
    clock: u64,
    block: u64,
    mining: Mining,
    pending: HashMap<TxHash, Pending>,
    failures: HashMap<&'static str, ProviderError>,
    failing_index: Option<u64>,
    reported_count: Option<U256>,
    latency: u32,
    calls: Vec<&'static str>,
    sent: u64,
    handles: Vec<SubscriptionHandle>,
}

/// Scriptable EIP-1193 wallet with the donation contract behind it.
///
/// Cloning shares the same chain, so a test can keep a handle after giving
/// one to the session.
#[derive(Clone)]
pub struct ScriptedWallet {
    state: Rc<RefCell<State>>,
    unsubscribed: Rc<Cell<u32>>,
}

impl ScriptedWallet {
    /// Sepolia wallet authorizing `accounts`, each holding 10 ether.
    pub fn sepolia(accounts: &[Address]) -> Self {
        let balances = [ALICE, BOB, CAROL]
            .into_iter()
            .map(|account| (account, ether(10)))
            .collect();
        Self {
            state: Rc::new(RefCell::new(State {
                chain_id: SEPOLIA,
                authorized: accounts.to_vec(),
                requested: None,
                balances,
                donations: Vec::new(),
                clock: GENESIS_TIME,
                block: 100,
                mining: Mining::Immediate,
                pending: HashMap::new(),
                failures: HashMap::new(),
                failing_index: None,
                reported_count: None,
                latency: 0,
                calls: Vec::new(),
                sent: 0,
                handles: Vec::new(),
            })),
            unsubscribed: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.state.borrow_mut().chain_id = chain_id;
    }

    /// Overrides what `eth_requestAccounts` returns; `eth_accounts` is unchanged.
    pub fn set_requested_accounts(&self, accounts: Vec<Address>) {
        self.state.borrow_mut().requested = Some(accounts);
    }

    pub fn set_mining(&self, mining: Mining) {
        self.state.borrow_mut().mining = mining;
    }

    /// Every subsequent call yields to the executor `rounds` times first.
    pub fn set_latency(&self, rounds: u32) {
        self.state.borrow_mut().latency = rounds;
    }

    pub fn fail(&self, method: &'static str, err: ProviderError) {
        self.state.borrow_mut().failures.insert(method, err);
    }

    pub fn heal(&self, method: &'static str) {
        self.state.borrow_mut().failures.remove(method);
    }

    pub fn fail_donation_read(&self, index: Option<u64>) {
        self.state.borrow_mut().failing_index = index;
    }

    /// Makes `getDonationsCount` answer `count` regardless of what is stored.
    pub fn report_count(&self, count: U256) {
        self.state.borrow_mut().reported_count = Some(count);
    }

    /// Stores a donation directly, as if another client had sent it.
    pub fn seed_donation(&self, donor: Address, recipient: Address, amount: U256, message: &str) {
        let mut state = self.state.borrow_mut();
        let timestamp = U256::from(state.clock);
        state.clock += 60;
        state.donations.push(RawDonation {
            donor,
            recipient,
            amount,
            timestamp,
            message: message.to_owned(),
        });
    }

    /// The wallet switches accounts and notifies every live listener.
    pub fn emit_accounts(&self, accounts: Vec<Address>) -> bool {
        let handles = {
            let mut state = self.state.borrow_mut();
            state.authorized = accounts.clone();
            state.handles.clone()
        };
        handles
            .iter()
            .fold(false, |delivered, handle| handle.emit(accounts.clone()) || delivered)
    }

    pub fn calls(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|called| **called == method)
            .count()
    }

    pub fn reset_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn sent(&self) -> u64 {
        self.state.borrow().sent
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.state
            .borrow()
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    pub fn donation_count(&self) -> usize {
        self.state.borrow().donations.len()
    }

    pub fn subscriptions_opened(&self) -> usize {
        self.state.borrow().handles.len()
    }

    pub fn unsubscribed(&self) -> u32 {
        self.unsubscribed.get()
    }

    async fn enter(&self, method: &'static str) -> Result<(), ProviderError> {
        let latency = {
            let mut state = self.state.borrow_mut();
            state.calls.push(method);
            state.latency
        };
        for _ in 0..latency {
            tokio::task::yield_now().await;
        }
        match self.state.borrow().failures.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn contract_call(&self, data: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let state = self.state.borrow();
        let selector = data.get(..4).unwrap_or_default();

        if selector == IDonation::getDonationsCountCall::SELECTOR.as_slice() {
            let count = state
                .reported_count
                .unwrap_or_else(|| U256::from(state.donations.len()));
            return Ok(count.abi_encode());
        }
        if selector == IDonation::getDonationCall::SELECTOR.as_slice() {
            let call = IDonation::getDonationCall::abi_decode(data).map_err(revert)?;
            let index = u64::try_from(call.index).map_err(revert)?;
            if state.failing_index == Some(index) {
                return Err(ProviderError::Transport(format!("read of donation {index} dropped")));
            }
            let raw = usize::try_from(index)
                .ok()
                .and_then(|i| state.donations.get(i))
                .ok_or_else(|| revert("index out of bounds"))?;
            return Ok((
                raw.donor,
                raw.recipient,
                raw.amount,
                raw.timestamp,
                raw.message.clone(),
            )
                .abi_encode_params());
        }
        Err(revert("unknown selector"))
    }

    fn mine(&self, request: &TransactionRequest) -> Result<TxHash, ProviderError> {
        let call = IDonation::donateCall::abi_decode(&request.data).map_err(revert)?;
        let mut state = self.state.borrow_mut();

        let funds = state.balances.get(&request.from).copied().unwrap_or_default();
        if funds < request.value {
            return Err(ProviderError::from_rpc(
                -32000,
                "insufficient funds for gas * price + value",
                None,
            ));
        }

        state.sent += 1;
        let tx_hash = TxHash::left_padding_from(&state.sent.to_be_bytes());
        state.block += 1;
        let block_number = Some(state.block);

        let (success, empty_polls_left) = match state.mining {
            Mining::Immediate => (true, 0),
            Mining::AfterPolls(polls) => (true, polls),
            Mining::Revert => (false, 0),
            Mining::Never => {
                state.pending.insert(
                    tx_hash,
                    Pending {
                        receipt: None,
                        empty_polls_left: 0,
                    },
                );
                return Ok(tx_hash);
            }
        };

        if success {
            state.balances.insert(request.from, funds - request.value);
            let recipient_funds = state.balances.get(&call.recipient).copied().unwrap_or_default();
            state
                .balances
                .insert(call.recipient, recipient_funds + request.value);
            let timestamp = U256::from(state.clock);
            state.clock += 60;
            state.donations.push(RawDonation {
                donor: request.from,
                recipient: call.recipient,
                amount: request.value,
                timestamp,
                message: call.message,
            });
        }

        state.pending.insert(
            tx_hash,
            Pending {
                receipt: Some(TxReceipt {
                    tx_hash,
                    block_number,
                    success,
                }),
                empty_polls_left,
            },
        );
        Ok(tx_hash)
    }
}

fn revert(reason: impl ToString) -> ProviderError {
    ProviderError::from_rpc(3, format!("execution reverted: {}", reason.to_string()), None)
}

#[async_trait(?Send)]
impl WalletProvider for ScriptedWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.enter("eth_requestAccounts").await?;
        let state = self.state.borrow();
        Ok(state.requested.clone().unwrap_or_else(|| state.authorized.clone()))
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.enter("eth_accounts").await?;
        Ok(self.state.borrow().authorized.clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.enter("eth_chainId").await?;
        Ok(self.state.borrow().chain_id)
    }

    async fn get_balance(&self, account: Address) -> Result<U256, ProviderError> {
        self.enter("eth_getBalance").await?;
        Ok(self.balance(account))
    }

    async fn call(&self, request: CallRequest) -> Result<Bytes, ProviderError> {
        self.enter("eth_call").await?;
        if request.to != CONTRACT {
            return Ok(Bytes::new());
        }
        self.contract_call(&request.data).map(Bytes::from)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, ProviderError> {
        self.enter("eth_sendTransaction").await?;
        self.mine(&request)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ProviderError> {
        self.enter("eth_getTransactionReceipt").await?;
        let mut state = self.state.borrow_mut();
        let Some(pending) = state.pending.get_mut(&tx_hash) else {
            return Ok(None);
        };
        if pending.empty_polls_left > 0 {
            pending.empty_polls_left -= 1;
            return Ok(None);
        }
        Ok(pending.receipt.clone())
    }

    fn subscribe_accounts(&self) -> Result<AccountSubscription, ProviderError> {
        if let Some(err) = self.state.borrow().failures.get("accountsChanged") {
            return Err(err.clone());
        }
        let unsubscribed = Rc::clone(&self.unsubscribed);
        let subscription = AccountSubscription::open(move || unsubscribed.set(unsubscribed.get() + 1));
        self.state.borrow_mut().handles.push(subscription.handle());
        Ok(subscription)
    }
}

/// Returns immediately and remembers every requested pause.
#[derive(Clone, Default)]
pub struct InstantSleeper {
    slept: Rc<RefCell<Vec<Duration>>>,
}

impl InstantSleeper {
    pub fn total(&self) -> Duration {
        self.slept.borrow().iter().sum()
    }

    pub fn naps(&self) -> usize {
        self.slept.borrow().len()
    }
}

#[async_trait(?Send)]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}

pub fn session_with(wallet: &ScriptedWallet, sleeper: &InstantSleeper) -> Rc<TestSession> {
    Rc::new(DonationSession::new(Some(wallet.clone()), sleeper.clone(), config()))
}

/// Initialized session with the reactor handed back undriven.
pub async fn initialized(
    wallet: &ScriptedWallet,
) -> (Rc<TestSession>, dd_session::AccountChangeReactor<ScriptedWallet, InstantSleeper>) {
    let session = session_with(wallet, &InstantSleeper::default());
    let reactor = session.initialize().await.unwrap();
    (session, reactor)
}
