//! In-memory persistence keyed by session token

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::state::AuditState;

/// Keyed read/write store for conversation state.
///
/// Distinct sessions are independent; the loop self-serializes within one
/// session, so the store only needs a process-wide map. Durability is out
/// of scope.
#[derive(Default, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, AuditState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh state under the given token
    pub fn create(&self, token: Uuid) {
        self.inner.lock().insert(token, AuditState::default());
    }

    /// Read a session's state, if the token is known
    pub fn load(&self, token: &Uuid) -> Option<AuditState> {
        self.inner.lock().get(token).cloned()
    }

    /// Write a session's state back
    pub fn save(&self, token: Uuid, state: AuditState) {
        self.inner.lock().insert(token, state);
    }

    /// Discard a session's state; returns it if the token was known
    pub fn remove(&self, token: &Uuid) -> Option<AuditState> {
        self.inner.lock().remove(token)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gutcheck_ai::Message;

    #[test]
    fn test_create_load_save_remove() {
        let store = SessionStore::new();
        let token = Uuid::new_v4();

        assert!(store.load(&token).is_none());
        store.create(token);
        let mut state = store.load(&token).unwrap();
        assert!(state.history.is_empty());

        state.history.push(Message::user("hi"));
        store.save(token, state);
        assert_eq!(store.load(&token).unwrap().history.len(), 1);

        let removed = store.remove(&token).unwrap();
        assert_eq!(removed.history.len(), 1);
        assert!(store.load(&token).is_none());
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.create(a);
        store.create(b);

        let mut state_a = store.load(&a).unwrap();
        state_a.history.push(Message::user("only in a"));
        store.save(a, state_a);

        assert!(store.load(&b).unwrap().history.is_empty());
        assert_eq!(store.len(), 2);
    }
}
