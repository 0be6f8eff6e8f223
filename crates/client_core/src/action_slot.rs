//! Single in-flight request slot per screen action.
//!
//! A second invocation while a request is outstanding joins the running
//! request instead of issuing another one. The request runs on its own task so
//! it completes even if every caller stops awaiting it.

use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::AccountError;

pub type ActionOutcome<T> = Result<T, AccountError>;
pub type InflightAction<T> = Shared<BoxFuture<'static, ActionOutcome<T>>>;

pub struct ActionSlot<T> {
    inflight: Option<InflightAction<T>>,
}

impl<T> Default for ActionSlot<T> {
    fn default() -> Self {
        Self { inflight: None }
    }
}

impl<T> ActionSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn is_busy(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn inflight(&self) -> Option<InflightAction<T>> {
        self.inflight.clone()
    }

    /// Spawns `action` and occupies the slot. Callers check [`Self::inflight`]
    /// first; spawning into an occupied slot joins the existing request.
    pub fn spawn<F>(&mut self, action: F) -> InflightAction<T>
    where
        F: Future<Output = ActionOutcome<T>> + Send + 'static,
    {
        if let Some(inflight) = &self.inflight {
            return inflight.clone();
        }

        let task = tokio::spawn(action);
        let inflight = async move {
            task.await
                .unwrap_or_else(|err| Err(AccountError::Interrupted(err.to_string())))
        }
        .boxed()
        .shared();
        self.inflight = Some(inflight.clone());
        inflight
    }

    /// Frees the slot. Called by the action itself while it applies its result.
    pub fn finish(&mut self) {
        self.inflight = None;
    }
}
