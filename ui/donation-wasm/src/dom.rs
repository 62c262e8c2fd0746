//! DOM element bindings.
//!
//! All fields are resolved once at startup by `Elements::bind()`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

// ── Helpers ──

fn doc() -> Option<Document> {
    gloo_utils::window().document()
}

pub fn by_id(id: &str) -> Option<Element> {
    doc()?.get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

pub fn get_textarea_value(el: &HtmlTextAreaElement) -> String {
    el.value().trim().to_string()
}

pub fn clear_input(el: &HtmlInputElement) {
    el.set_value("");
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn remove_class(el: &Element, cls: &str) {
    let _ = el.class_list().remove_1(cls);
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    doc()
        .ok_or_else(|| JsValue::from_str("no document"))?
        .create_element(tag)
}

pub fn clear_children(el: &Element) {
    el.set_inner_html("");
}

// ── Elements struct ──

/// Every DOM node the donation page touches.
/// Clone-friendly (all inner types are reference-counted via JS GC).
#[derive(Clone)]
pub struct Elements {
    // Wallet header
    pub connect_btn: HtmlElement,
    pub account_panel: Element,
    pub account_label: Element,
    pub balance_label: Element,
    pub network_label: Element,

    // Status
    pub status_line: Element,
    pub loading_indicator: Element,

    // Donation form
    pub donate_recipient: HtmlInputElement,
    pub donate_amount: HtmlInputElement,
    pub donate_message: HtmlTextAreaElement,
    pub recipient_error: Element,
    pub amount_error: Element,
    pub donate_btn: HtmlElement,

    // History
    pub refresh_ledger_btn: HtmlElement,
    pub donations_list: Element,
    pub donations_empty: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_textarea {
    ($id:expr) => {
        by_id_typed::<HtmlTextAreaElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing textarea #{}", $id)))?
    };
}

macro_rules! get_html {
    ($id:expr) => {
        by_id_typed::<HtmlElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing html element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_html!("connectBtn"),
            account_panel: get_el!("accountPanel"),
            account_label: get_el!("accountLabel"),
            balance_label: get_el!("balanceLabel"),
            network_label: get_el!("networkLabel"),

            status_line: get_el!("statusLine"),
            loading_indicator: get_el!("loadingIndicator"),

            donate_recipient: get_input!("donateRecipient"),
            donate_amount: get_input!("donateAmount"),
            donate_message: get_textarea!("donateMessage"),
            recipient_error: get_el!("recipientError"),
            amount_error: get_el!("amountError"),
            donate_btn: get_html!("donateBtn"),

            refresh_ledger_btn: get_html!("refreshLedgerBtn"),
            donations_list: get_el!("donationsList"),
            donations_empty: get_el!("donationsEmpty"),
        })
    }
}
