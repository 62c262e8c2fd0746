use alloy_primitives::Address;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct Listener {
    sender: Option<UnboundedSender<Vec<Address>>>,
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

/// Producer side of an account subscription.
///
/// Wallet bindings keep a clone inside their event callback and push every
/// `accountsChanged` payload through [`SubscriptionHandle::emit`].
#[derive(Clone)]
pub struct SubscriptionHandle {
    listener: Rc<RefCell<Listener>>,
}

impl SubscriptionHandle {
    /// Returns `false` once the subscription has been cancelled.
    pub fn emit(&self, accounts: Vec<Address>) -> bool {
        let listener = self.listener.borrow();
        match &listener.sender {
            Some(sender) => sender.send(accounts).is_ok(),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.listener.borrow().sender.is_some()
    }

    /// Detaches the wallet listener and closes the event stream. Idempotent.
    pub fn cancel(&self) {
        let unsubscribe = {
            let mut listener = self.listener.borrow_mut();
            listener.sender = None;
            listener.unsubscribe.take()
        };
        if let Some(unsubscribe) = unsubscribe {
            tracing::debug!("account subscription cancelled");
            unsubscribe();
        }
    }
}

/// Consumer side of the wallet's account-change notifications.
///
/// Dropping the subscription cancels it.
pub struct AccountSubscription {
    events: UnboundedReceiver<Vec<Address>>,
    handle: SubscriptionHandle,
}

impl AccountSubscription {
    /// Opens a subscription. `unsubscribe` runs exactly once, on cancel or drop.
    pub fn open(unsubscribe: impl FnOnce() + 'static) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        Self {
            events,
            handle: SubscriptionHandle {
                listener: Rc::new(RefCell::new(Listener {
                    sender: Some(sender),
                    unsubscribe: Some(Box::new(unsubscribe)),
                })),
            },
        }
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Next account list, or `None` after cancellation.
    pub async fn next(&mut self) -> Option<Vec<Address>> {
        self.events.recv().await
    }
}

impl Drop for AccountSubscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
