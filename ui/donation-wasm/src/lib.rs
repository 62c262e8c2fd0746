//! Donation dApp WASM frontend.
//!
//! Thin browser shell around `dd-session`: binds the injected wallet, wires
//! DOM events to session operations and renders the resulting snapshots.

pub mod dom;
pub mod donation_ops;
pub mod ethereum;
pub mod events;
pub mod logging;
pub mod state;

use dd_session::DonationConfig;
use dd_session::config::{
    ENV_CONFIRM_POLL_MS, ENV_CONFIRM_TIMEOUT_SECS, ENV_CONTRACT_ADDRESS, ENV_EXPECTED_CHAIN_ID,
};
use dd_wallet_client::JsonRpcWallet;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::ethereum::{BrowserSession, GlooSleeper, InjectedTransport};

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();
    logging::init();

    init().await
}

/// The deployment is fixed when the bundle is built.
fn build_config() -> Result<DonationConfig, String> {
    DonationConfig::from_lookup(|key| {
        let value = match key {
            ENV_CONTRACT_ADDRESS => option_env!("DD_CONTRACT_ADDRESS"),
            ENV_EXPECTED_CHAIN_ID => option_env!("DD_EXPECTED_CHAIN_ID"),
            ENV_CONFIRM_POLL_MS => option_env!("DD_CONFIRM_POLL_MS"),
            ENV_CONFIRM_TIMEOUT_SECS => option_env!("DD_CONFIRM_TIMEOUT_SECS"),
            _ => None,
        };
        value.map(str::to_owned)
    })
    .map_err(|err| format!("{err:#}"))
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    events::bind_events(&els)?;

    let config = match build_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid build configuration");
            donation_ops::set_status_error(&els, &format!("Misconfigured deployment: {err}"));
            return Ok(());
        }
    };

    let provider = InjectedTransport::detect().map(JsonRpcWallet::new);
    let session: Rc<BrowserSession> = Rc::new(BrowserSession::new(provider, GlooSleeper, config));
    state::set_session(Rc::clone(&session));
    donation_ops::render(&els, &session);

    match session.initialize().await {
        Ok(reactor) => {
            let els2 = els.clone();
            let session2 = Rc::clone(&session);
            wasm_bindgen_futures::spawn_local(async move {
                reactor
                    .run_with(|outcome| {
                        if let Err(err) = outcome {
                            donation_ops::report_error(&els2, &err);
                        }
                        donation_ops::render(&els2, &session2);
                    })
                    .await;
            });
        }
        Err(err) => donation_ops::report_error(&els, &err),
    }
    donation_ops::render(&els, &session);

    Ok(())
}
