//! In-memory session registry.
//!
//! One live [`DialogueController`] per session id. Turn processing locks
//! the entry for the duration of a single synchronous turn, so utterances
//! for one session are serialised. Restart swaps the whole entry: an
//! in-flight turn against the old controller lands on the orphaned
//! instance and can never write into the replacement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use uuid::Uuid;

use crate::dialogue::controller::DialogueController;
use crate::dialogue::types::Reply;

type SessionEntry = Arc<Mutex<DialogueController>>;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session and return its id plus the opening replies.
    pub fn create(&self) -> (Uuid, Vec<Reply>) {
        let mut controller = DialogueController::new();
        let replies = controller.begin();
        let id = controller.state().id;
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(controller)));
        tracing::debug!(session_id = %id, "session created");
        (id, replies)
    }

    pub fn get(&self, id: Uuid) -> Option<SessionEntry> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Atomically replace the session behind `id` with a fresh controller
    /// and return the new opening replies. `None` if the id is unknown.
    pub fn restart(&self, id: Uuid) -> Option<Vec<Reply>> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(&id)?;
        let mut controller = DialogueController::new();
        let replies = controller.begin();
        *entry = Arc::new(Mutex::new(controller));
        tracing::debug!(session_id = %id, "session restarted");
        Some(replies)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a session entry, recovering from a poisoned mutex (a panic in a
/// prior turn must not brick the session).
pub fn lock_session(entry: &SessionEntry) -> MutexGuard<'_, DialogueController> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::session::Step;

    #[test]
    fn create_registers_a_live_session() {
        let registry = SessionRegistry::new();
        let (id, replies) = registry.create();
        assert_eq!(registry.len(), 1);
        assert_eq!(replies.len(), 3);
        assert!(registry.get(id).is_some());
        assert!(registry.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn restart_swaps_the_entry_so_old_handles_go_stale() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.create();

        let old_entry = registry.get(id).unwrap();
        lock_session(&old_entry)
            .handle_turn("My father collapsed and is vomiting lots of blood right now");
        assert_eq!(lock_session(&old_entry).state().step(), Step::Escalated);

        let replies = registry.restart(id).unwrap();
        assert!(!replies.is_empty());

        // The registry now serves a fresh controller; writes through the
        // old handle cannot reach it.
        let new_entry = registry.get(id).unwrap();
        assert!(!Arc::ptr_eq(&old_entry, &new_entry));
        assert_eq!(lock_session(&new_entry).state().step(), Step::Collecting);
        lock_session(&old_entry).handle_turn("still talking to the dead session");
        assert!(lock_session(&new_entry).state().flags().is_empty());
    }

    #[test]
    fn restart_of_unknown_id_is_none() {
        let registry = SessionRegistry::new();
        assert!(registry.restart(Uuid::new_v4()).is_none());
    }

    #[test]
    fn remove_drops_the_session() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.create();
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }
}
