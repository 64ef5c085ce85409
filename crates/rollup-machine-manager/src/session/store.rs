//! The in-memory session store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{ManagerError, Result};
use crate::session::Session;

/// Maps session ids to sessions, enforcing uniqueness.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new session, refusing duplicate ids.
    pub fn insert(&self, session: Session) -> Result<Arc<Session>> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        if sessions.contains_key(session.id()) {
            return Err(ManagerError::AlreadyExists("session id is taken".to_string()));
        }
        let session = Arc::new(session);
        sessions.insert(session.id().to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Looks up a session by id.
    pub fn get(&self, id: &str) -> Result<Arc<Session>> {
        self.sessions
            .lock()
            .expect("session store poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| ManagerError::InvalidArgument("session id not found".to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .expect("session store poisoned")
            .contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions
            .lock()
            .expect("session store poisoned")
            .remove(id)
    }

    /// All known session ids, sorted for stable listings.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .sessions
            .lock()
            .expect("session store poisoned")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Every live session, used by the shutdown path to terminate their
    /// process groups.
    pub fn drain(&self) -> Vec<Arc<Session>> {
        self.sessions
            .lock()
            .expect("session store poisoned")
            .drain()
            .map(|(_, session)| session)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CycleBudgets, Deadlines};

    fn session(id: &str) -> Session {
        Session::new(
            id.to_string(),
            0,
            Deadlines::default(),
            CycleBudgets::default(),
        )
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let store = SessionStore::new();
        store.insert(session("a")).unwrap();
        let err = store.insert(session("a")).unwrap_err();
        assert!(matches!(err, ManagerError::AlreadyExists(_)));
    }

    #[test]
    fn get_unknown_id_fails() {
        let store = SessionStore::new();
        assert!(matches!(
            store.get("missing"),
            Err(ManagerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn ids_are_sorted() {
        let store = SessionStore::new();
        store.insert(session("beta")).unwrap();
        store.insert(session("alpha")).unwrap();
        assert_eq!(store.ids(), vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn remove_makes_id_available_again() {
        let store = SessionStore::new();
        store.insert(session("a")).unwrap();
        assert!(store.remove("a").is_some());
        assert!(!store.contains("a"));
        store.insert(session("a")).unwrap();
    }
}
