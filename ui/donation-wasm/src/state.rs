//! Page-wide state.
//!
//! `thread_local!` storage is enough: WASM runs on one thread.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ethereum::BrowserSession;

#[derive(Default)]
pub struct AppState {
    pub session: Option<Rc<BrowserSession>>,
}

thread_local! {
    static STATE: RefCell<AppState> = RefCell::new(AppState::default());
}

pub fn with<F, R>(f: F) -> R
where
    F: FnOnce(&AppState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

pub fn with_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut AppState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// The session, cloned out so no borrow outlives the call.
pub fn session() -> Option<Rc<BrowserSession>> {
    with(|s| s.session.clone())
}

pub fn set_session(session: Rc<BrowserSession>) {
    with_mut(|s| s.session = Some(session));
}
