//! Native action with a scripted stand-in.
//!
//! Headless and automated browsers sometimes reject synthetic input on an
//! element (overlays, custom widgets, focus traps). Each interaction step is
//! therefore written as a native attempt plus a DOM-level equivalent, and
//! only fails when both do.

use std::future::Future;

use tracing::debug;

use crate::result::{ProbeError, ProbeResult};

/// Which path completed an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The native action succeeded
    Native(T),
    /// The native action failed and the scripted one succeeded
    Scripted(T),
}

impl<T> Attempt<T> {
    /// Whether the scripted path was needed
    #[must_use]
    pub const fn is_scripted(&self) -> bool {
        matches!(self, Self::Scripted(_))
    }

    /// Unwrap the produced value
    pub fn into_inner(self) -> T {
        match self {
            Self::Native(v) | Self::Scripted(v) => v,
        }
    }
}

/// Await `native`; if it fails, await `scripted`.
///
/// Futures are lazy, so `scripted` does nothing unless it is needed. When
/// both fail the error carries both messages.
pub async fn with_fallback<T, N, S>(step: &str, native: N, scripted: S) -> ProbeResult<Attempt<T>>
where
    N: Future<Output = ProbeResult<T>>,
    S: Future<Output = ProbeResult<T>>,
{
    match native.await {
        Ok(value) => Ok(Attempt::Native(value)),
        Err(native_err) => {
            debug!(step, error = %native_err, "native action failed, using script");
            match scripted.await {
                Ok(value) => Ok(Attempt::Scripted(value)),
                Err(scripted_err) => Err(ProbeError::FallbackExhausted {
                    native: native_err.to_string(),
                    scripted: scripted_err.to_string(),
                }),
            }
        }
    }
}
