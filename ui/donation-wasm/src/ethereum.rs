//! Binding to the injected EIP-1193 provider (`window.ethereum`).

use alloy_primitives::Address;
use async_trait::async_trait;
use dd_wallet_client::{AccountSubscription, JsonRpcWallet, ProviderError, RpcTransport, Sleeper};
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::cell::OnceCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use dd_session::DonationSession;

pub type BrowserWallet = JsonRpcWallet<InjectedTransport>;
pub type BrowserSession = DonationSession<BrowserWallet, GlooSleeper>;

const ACCOUNTS_CHANGED: &str = "accountsChanged";

pub struct InjectedTransport {
    ethereum: JsValue,
}

impl InjectedTransport {
    /// `None` when the page has no injected wallet.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self { ethereum })
    }

    fn function(&self, name: &str) -> Result<Function, ProviderError> {
        Reflect::get(&self.ethereum, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| ProviderError::Transport(format!("ethereum.{name} is not a function")))
    }
}

/// Maps a rejected provider call onto the EIP-1193 error classes.
fn provider_error(err: JsValue) -> ProviderError {
    let field = |name: &str| Reflect::get(&err, &JsValue::from_str(name)).ok();

    let message = field("message")
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    let data = field("data")
        .filter(|d| !d.is_undefined() && !d.is_null())
        .and_then(|d| js_sys::JSON::stringify(&d).ok())
        .and_then(|d| d.as_string());

    match field("code").and_then(|c| c.as_f64()) {
        Some(code) => ProviderError::from_rpc(code as i64, message, data),
        None => ProviderError::Transport(message),
    }
}

#[async_trait(?Send)]
impl RpcTransport for InjectedTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let params = params
            .serialize(&serializer)
            .map_err(|err| ProviderError::Transport(format!("encode {method} params: {err}")))?;

        let args = Object::new();
        Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method))
            .map_err(provider_error)?;
        Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(provider_error)?;

        let promise: Promise = self
            .function("request")?
            .call1(&self.ethereum, &args)
            .map_err(provider_error)?
            .dyn_into()
            .map_err(|_| ProviderError::Transport("ethereum.request did not return a promise".to_owned()))?;

        let result = JsFuture::from(promise).await.map_err(provider_error)?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|err| ProviderError::Decode {
            method: method.to_owned(),
            reason: err.to_string(),
        })
    }

    fn subscribe_accounts(&self) -> Result<AccountSubscription, ProviderError> {
        let on = self.function("on")?;
        let remove = self.function("removeListener")?;
        let event = JsValue::from_str(ACCOUNTS_CHANGED);

        let slot: Rc<OnceCell<dd_wallet_client::SubscriptionHandle>> = Rc::new(OnceCell::new());
        let listener = {
            let slot = Rc::clone(&slot);
            Closure::<dyn FnMut(JsValue)>::new(move |accounts: JsValue| {
                let Some(handle) = slot.get() else {
                    return;
                };
                match serde_wasm_bindgen::from_value::<Vec<Address>>(accounts) {
                    Ok(accounts) => {
                        handle.emit(accounts);
                    }
                    Err(err) => tracing::warn!(error = %err, "unreadable accountsChanged payload"),
                }
            })
        };

        on.call2(&self.ethereum, &event, listener.as_ref().unchecked_ref())
            .map_err(provider_error)?;

        let ethereum = self.ethereum.clone();
        let subscription = AccountSubscription::open(move || {
            if let Err(err) = remove.call2(&ethereum, &event, listener.as_ref().unchecked_ref()) {
                tracing::warn!(error = ?err, "failed to remove accountsChanged listener");
            }
            drop(listener);
        });
        let _ = slot.set(subscription.handle());
        Ok(subscription)
    }
}

/// Timer-backed pause between receipt polls.
#[derive(Clone, Copy, Default)]
pub struct GlooSleeper;

#[async_trait(?Send)]
impl Sleeper for GlooSleeper {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}
