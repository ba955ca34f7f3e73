//! FlowRunner – loads a session, applies exactly **one** message to it, and persists the
//! updated session back to storage (or deletes it once the conversation is finished).
//!
//! ## Per-session ordering
//! Two requests carrying the same session id are never interleaved: each call takes a
//! per-id async lock before loading the session and releases it after the store has been
//! updated. Requests for different ids run fully in parallel. Lock entries only live while
//! someone holds or waits for them.
//!
//! ## Lifecycle
//! * unseen id → fresh session, first question asked
//! * answer accepted → pointer advanced, session saved
//! * answer rejected → same question asked again, store untouched
//! * last answer accepted → recommendations computed, session deleted; the id may be
//!   reused and simply starts over

use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::{
    error::Result,
    flow::{FlowController, FlowReply, StepOutcome},
    storage::{Session, SessionStorage},
};

/// High-level helper that orchestrates the _lock → load → step → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    controller: Arc<FlowController>,
    storage: Arc<dyn SessionStorage>,
    locks: SessionLocks,
}

impl FlowRunner {
    pub fn new(controller: FlowController, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            controller: Arc::new(controller),
            storage,
            locks: SessionLocks::default(),
        }
    }

    pub fn controller(&self) -> &FlowController {
        &self.controller
    }

    /// Handle one `(session_id, message)` pair and return what should be shown to the user.
    pub async fn handle(&self, session_id: &str, message: &str) -> Result<FlowReply> {
        let _lease = self.locks.acquire(session_id).await;

        let mut session = match self.storage.get(session_id).await? {
            Some(session) => session,
            None => {
                info!(session_id = %session_id, "Starting new session");
                self.controller.new_session(session_id)
            }
        };

        let outcome = self.controller.step(&mut session, message);

        match &outcome {
            StepOutcome::Prompt { repeated: true, .. } => {}
            StepOutcome::Prompt { .. } => {
                debug!(
                    session_id = %session_id,
                    question = session.current_question,
                    "Question asked"
                );
                self.storage.save(session).await?;
            }
            StepOutcome::Completed(cards) => {
                self.storage.delete(session_id).await?;
                info!(
                    session_id = %session_id,
                    matches = cards.len(),
                    "Session completed"
                );
            }
        }

        Ok(outcome.into())
    }

    /// Current state of an in-flight session, if any.
    pub async fn session(&self, session_id: &str) -> Result<Option<Session>> {
        self.storage.get(session_id).await
    }

    /// Drop sessions that have been idle for longer than `max_idle`.
    pub async fn purge_idle(&self, max_idle: Duration) -> Result<usize> {
        let purged = self.storage.purge_idle(Utc::now() - max_idle).await?;
        if purged > 0 {
            info!(purged, "Purged idle sessions");
        }
        Ok(purged)
    }
}

/// Keyed table of async mutexes, one per session id with a request in flight.
#[derive(Clone, Default)]
struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, session_id: &str) -> SessionLease {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .clone();
        // The lease exists before the wait so a cancelled waiter still cleans up its entry.
        let mut lease = SessionLease {
            id: session_id.to_string(),
            locks: self.locks.clone(),
            lock: Some(lock.clone()),
            guard: None,
        };
        lease.guard = Some(lock.lock_owned().await);
        lease
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Held for the duration of one request, including the wait for the lock. Dropping it
/// (also on cancellation) unlocks the session and removes the table entry when nobody
/// else is waiting.
struct SessionLease {
    id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    lock: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        drop(self.guard.take());
        drop(self.lock.take());
        // The guard held a clone too; the map's own reference is the only one left when idle.
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
