//! Event binding.
//!
//! Async handlers are spawned with `wasm_bindgen_futures::spawn_local`.

use crate::dom::Elements;
use crate::donation_ops;
use crate::state;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Helper: attach async click handler to an HtmlElement.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements) -> Result<(), JsValue> {
    on_click_async!(els.connect_btn, els, donation_ops::on_connect);
    on_click_async!(els.donate_btn, els, donation_ops::on_donate);
    on_click_async!(els.refresh_ledger_btn, els, donation_ops::on_refresh_ledger);

    // Drop the wallet listener when the page goes away.
    let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Some(session) = state::session() {
            session.teardown();
        }
    }) as Box<dyn FnMut(_)>);
    gloo_utils::window().add_event_listener_with_callback("pagehide", cb.as_ref().unchecked_ref())?;
    cb.forget();

    Ok(())
}
