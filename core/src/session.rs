//! Session registry mapping opaque ids to in-flight processing state.
//!
//! The store is owned by the caller and passed by reference wherever it is
//! needed. Entries expire after a fixed TTL and are swept on every access,
//! so an abandoned upload cannot pin its workspace forever.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::locator::LangResource;
use crate::workspace::Workspace;

/// State carried between the upload and download steps of one run.
#[derive(Debug, Clone)]
pub struct Session {
    pub workspace: Workspace,
    pub original_file_name: String,
    /// Discovered resources, keyed by owner.
    pub lang_resources: HashMap<String, LangResource>,
}

struct StoredSession {
    session: Session,
    created_at: Instant,
}

pub struct SessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<String, StoredSession>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a session and returns its fresh opaque id.
    pub fn insert(&self, session: Session) -> String {
        let id = Uuid::new_v4().to_string();
        let mut guard = self.lock();
        Self::sweep(&mut guard, self.ttl);
        guard.insert(id.clone(), StoredSession {
            session,
            created_at: Instant::now(),
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        let mut guard = self.lock();
        Self::sweep(&mut guard, self.ttl);
        guard.get(id).map(|stored| stored.session.clone())
    }

    /// Takes the session back out, typically for workspace cleanup.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.lock();
        Self::sweep(&mut guard, self.ttl);
        guard.remove(id).map(|stored| stored.session)
    }

    pub fn len(&self) -> usize {
        let mut guard = self.lock();
        Self::sweep(&mut guard, self.ttl);
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredSession>> {
        self.inner.lock().expect("session store lock poisoned")
    }

    fn sweep(entries: &mut HashMap<String, StoredSession>, ttl: Duration) {
        entries.retain(|_, stored| stored.created_at.elapsed() < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn sample_session(temp: &TempDir) -> Session {
        Session {
            workspace: Workspace::create(temp.path()).unwrap(),
            original_file_name: "mod.jar".into(),
            lang_resources: HashMap::new(),
        }
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(Duration::from_secs(60));

        let id = store.insert(sample_session(&temp));
        let session = store.get(&id).expect("session should still be alive");
        assert_eq!(session.original_file_name, "mod.jar");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_takes_ownership_back() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(Duration::from_secs(60));

        let id = store.insert(sample_session(&temp));
        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_id_yields_nothing() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.get("nope").is_none());
        assert!(store.remove("nope").is_none());
    }

    #[test]
    fn expired_sessions_are_swept() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(Duration::from_millis(10));

        let id = store.insert(sample_session(&temp));
        thread::sleep(Duration::from_millis(25));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }
}
