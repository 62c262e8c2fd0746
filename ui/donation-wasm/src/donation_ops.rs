//! User-triggered session operations and the rendering that follows them.

use alloy_primitives::Address;
use dd_api_types::{DonationRecord, DonationRequest, SessionSnapshot, short_address};
use dd_session::{ErrorKind, SessionError, ValidationErrors};
use wasm_bindgen::prelude::*;

use crate::dom::{self, Elements};
use crate::ethereum::BrowserSession;
use crate::state;

pub async fn on_connect(els: &Elements) {
    let Some(session) = state::session() else {
        return;
    };
    dom::remove_class(&els.loading_indicator, "hidden");

    match session.connect().await {
        Ok(account) => set_status(els, &format!("Connected as {}", short_address(&account))),
        Err(err) => report_error(els, &err),
    }
    render(els, &session);
}

pub async fn on_donate(els: &Elements) {
    let Some(session) = state::session() else {
        return;
    };
    show_field_errors(els, &ValidationErrors::default());

    let request = DonationRequest::new(
        dom::get_input_value(&els.donate_recipient),
        dom::get_input_value(&els.donate_amount),
        dom::get_textarea_value(&els.donate_message),
    );
    dom::remove_class(&els.loading_indicator, "hidden");
    set_status(els, "Confirm the donation in your wallet...");

    match session.submit(request).await {
        Ok(receipt) => {
            dom::clear_input(&els.donate_recipient);
            dom::clear_input(&els.donate_amount);
            els.donate_message.set_value("");
            let block = receipt
                .block_number
                .map(|n| format!(" in block {n}"))
                .unwrap_or_default();
            match receipt.stale {
                None => set_status(els, &format!("Donation confirmed{block}.")),
                Some(err) => set_status_error(
                    els,
                    &format!("Donation confirmed{block}, but the page could not refresh: {err}"),
                ),
            }
        }
        Err(SessionError::Validation(errors)) => {
            show_field_errors(els, &errors);
            set_status_error(els, "Please fix the highlighted fields.");
        }
        Err(err) => report_error(els, &err),
    }
    render(els, &session);
}

pub async fn on_refresh_ledger(els: &Elements) {
    let Some(session) = state::session() else {
        return;
    };
    if let Err(err) = session.load_ledger().await {
        report_error(els, &err);
    }
    render(els, &session);
}

/// User-facing wording for each failure class.
pub fn user_message(err: &SessionError) -> String {
    match err {
        SessionError::NoProvider => "Please install MetaMask to use this dApp.".to_owned(),
        SessionError::ProviderUnsupported(_) => {
            "Your wallet cannot report account changes. Please use MetaMask.".to_owned()
        }
        SessionError::Superseded => {
            "Your wallet account changed while this was in progress. Please try again.".to_owned()
        }
        SessionError::WrongNetwork { expected, actual } => {
            format!("Please switch your wallet to chain {expected} (it is on chain {actual}).")
        }
        SessionError::Cancelled => "You cancelled the donation in your wallet.".to_owned(),
        SessionError::StillPending { tx_hash } => {
            format!("Donation {tx_hash} is still pending. Check your wallet for its status.")
        }
        SessionError::NetworkUnreachable(_) => {
            "The network could not be reached. Please try again.".to_owned()
        }
        other => match other.kind() {
            ErrorKind::Authorization => "Wallet connection was not authorized.".to_owned(),
            ErrorKind::Read => format!("Could not load the latest data: {other}"),
            _ => format!("Error: {other}"),
        },
    }
}

pub fn report_error(els: &Elements, err: &SessionError) {
    set_status_error(els, &user_message(err));
}

pub fn set_status(els: &Elements, msg: &str) {
    dom::remove_class(&els.status_line, "error");
    dom::set_text(&els.status_line, msg);
}

pub fn set_status_error(els: &Elements, msg: &str) {
    dom::add_class(&els.status_line, "error");
    dom::set_text(&els.status_line, msg);
}

fn show_field_errors(els: &Elements, errors: &ValidationErrors) {
    let recipient = errors.recipient.map(|e| e.to_string()).unwrap_or_default();
    let amount = errors.amount.map(|e| e.to_string()).unwrap_or_default();
    dom::set_text(&els.recipient_error, &recipient);
    dom::set_text(&els.amount_error, &amount);
    dom::toggle_class(&els.donate_recipient, "invalid", errors.recipient.is_some());
    dom::toggle_class(&els.donate_amount, "invalid", errors.amount.is_some());
}

/// Repaints header, form state and history from the session snapshots.
pub fn render(els: &Elements, session: &BrowserSession) {
    let snapshot = session.session();
    render_session(els, &snapshot);
    if let Err(err) = render_ledger(els, &session.ledger(), snapshot.account) {
        tracing::warn!(error = ?err, "failed to render donation history");
    }
}

pub fn render_session(els: &Elements, snapshot: &SessionSnapshot) {
    let connected = snapshot.is_connected();
    dom::toggle_class(&els.connect_btn, "hidden", connected);
    dom::toggle_class(&els.account_panel, "hidden", !connected);
    dom::toggle_class(&els.loading_indicator, "hidden", !snapshot.loading);
    let _ = els
        .donate_btn
        .set_attribute("aria-disabled", if connected { "false" } else { "true" });

    let account = snapshot.account.as_ref().map(short_address).unwrap_or_default();
    dom::set_text(&els.account_label, &account);
    dom::set_text(
        &els.balance_label,
        &format!("{} ETH", snapshot.balance_ether_fixed(4)),
    );
    let network = snapshot
        .network_id
        .map(|id| format!("chain {id}"))
        .unwrap_or_default();
    dom::set_text(&els.network_label, &network);
}

pub fn render_ledger(
    els: &Elements,
    records: &[DonationRecord],
    account: Option<Address>,
) -> Result<(), JsValue> {
    dom::clear_children(&els.donations_list);
    dom::toggle_class(&els.donations_empty, "hidden", !records.is_empty());

    for record in records {
        let item = dom::create_element("li")?;
        if account.is_some_and(|a| record.involves(&a)) {
            dom::add_class(&item, "mine");
        }

        let summary = dom::create_element("div")?;
        dom::set_text(
            &summary,
            &format!(
                "{} ETH from {} to {}",
                record.amount.trim_end_matches('0').trim_end_matches('.'),
                short_address(&record.donor),
                short_address(&record.recipient),
            ),
        );
        item.append_child(&summary)?;

        if !record.message.is_empty() {
            let message = dom::create_element("p")?;
            dom::set_text(&message, &record.message);
            item.append_child(&message)?;
        }

        let when = dom::create_element("time")?;
        when.set_attribute("datetime", &record.timestamp.to_rfc3339())?;
        dom::set_text(&when, &record.timestamp.format("%Y-%m-%d %H:%M UTC").to_string());
        item.append_child(&when)?;

        els.donations_list.append_child(&item)?;
    }
    Ok(())
}
