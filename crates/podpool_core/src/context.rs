//! Setup context and hook error types.
//!
//! [`SetupContext`] is handed to every setup and filter hook. It carries a
//! [`CancellationToken`] that the caller may trigger at any time; the pool
//! itself never polls it. Hooks that care call [`SetupContext::check`] and
//! return the resulting error, which makes the pool roll back.
//!
//! # Example
//!
//! ```
//! use podpool_core::context::{HookError, SetupContext};
//!
//! fn set_up(ctx: &SetupContext) -> Result<(), HookError> {
//!     ctx.check()?;
//!     Ok(())
//! }
//!
//! let ctx = SetupContext::new();
//! assert!(set_up(&ctx).is_ok());
//!
//! ctx.cancel();
//! assert!(set_up(&ctx).is_err());
//! ```

use tokio_util::sync::CancellationToken;

/// Error type returned by pod hooks.
///
/// Any `Error + Send + Sync` converts into it with `?`.
pub type HookError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// The error [`SetupContext::check`] returns once the context is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("setup context cancelled")]
pub struct Cancelled;

/// Context passed to setup and filter hooks.
///
/// Cloning is cheap; clones share the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct SetupContext {
    token: CancellationToken,
}

impl SetupContext {
    /// Creates a context that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context driven by an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Returns the underlying cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns [`Cancelled`] if the context has been cancelled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let ctx = SetupContext::new();
        let clone = ctx.clone();
        assert!(clone.check().is_ok());

        ctx.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.check(), Err(Cancelled));
    }

    #[test]
    fn child_token_follows_parent() {
        let parent = CancellationToken::new();
        let ctx = SetupContext::with_cancellation(parent.child_token());
        assert!(!ctx.is_cancelled());

        parent.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn cancelled_converts_into_hook_error() {
        fn hook(ctx: &SetupContext) -> Result<(), HookError> {
            ctx.check()?;
            Ok(())
        }

        let ctx = SetupContext::new();
        ctx.cancel();
        let err = hook(&ctx).unwrap_err();
        assert!(err.is::<Cancelled>());
    }
}
