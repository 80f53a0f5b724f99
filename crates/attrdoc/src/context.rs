//! Execution context threaded through every operation.

use crate::{AttrError, AttrResult};
use tokio_util::sync::CancellationToken;

/// Per-request execution context.
///
/// The core performs no I/O; the context exists so custom attribute type
/// hooks can observe cancellation of the request they run in.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancellation: Option<CancellationToken>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled together with `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
        }
    }

    /// Whether the request has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Return `Err(AttrError::Cancelled)` if the request has been cancelled.
    #[inline]
    pub fn check(&self) -> AttrResult<()> {
        if self.is_cancelled() {
            Err(AttrError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The cancellation token, if any.
    pub fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}
