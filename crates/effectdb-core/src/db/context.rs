use crate::db::store::StoreError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

///
/// CancelToken
///
/// Shared cancellation flag. Clones observe the same flag, so a caller can
/// keep one handle and cancel a request running elsewhere.
///

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

///
/// ExecContext
///
/// Per-request execution context handed to every storage call.
/// The engine never retries or times out on its own; it only forwards this.
///

#[derive(Clone, Debug, Default)]
pub struct ExecContext {
    cancel: CancelToken,
}

impl ExecContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_cancel(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Fail with `Cancelled` once the token has fired.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        Ok(())
    }
}
