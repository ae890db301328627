//! The current request of this execution context.
//!
//! The runtime owns the request; the handle keeps a weak reference to it so scripts, which
//! are called without a request argument, can find it. The slot is per thread: each worker
//! processes one request phase at a time and never shares its slot.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{context::RequestContext, BridgeError};

/// Shared, runtime-owned request
pub type SharedContext = Rc<RefCell<RequestContext>>;

thread_local! {
    static CURRENT: RefCell<Weak<RefCell<RequestContext>>> = RefCell::new(Weak::new());
}

/// Makes `context` the current request
pub fn push(context: &SharedContext) {
    CURRENT.with(|current| *current.borrow_mut() = Rc::downgrade(context));
}

/// Forgets the current request
pub fn clear() {
    CURRENT.with(|current| *current.borrow_mut() = Weak::new());
}

/// The current request. Fails when no phase is active or the runtime already dropped the
/// request.
pub fn current() -> Result<SharedContext, BridgeError> {
    CURRENT.with(|current| current.borrow().upgrade().ok_or(BridgeError::NoActiveRequest))
}

/// Makes `context` current until the returned guard is dropped
pub fn enter(context: &SharedContext) -> PhaseGuard {
    push(context);
    PhaseGuard { _private: () }
}

/// Clears the current request when dropped
#[derive(Debug)]
pub struct PhaseGuard {
    _private: (),
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        clear();
    }
}
