//! Per-identity conversation state with idle expiry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::UserId;

struct Session<S> {
    state: S,
    touched_at: Instant,
}

/// Keyed by identity, last writer wins. A session exists only while a flow is
/// in progress; reads past the idle TTL drop the entry on the spot, and
/// [`SessionStore::sweep`] reclaims abandoned entries in bulk.
pub struct SessionStore<S> {
    sessions: Mutex<HashMap<i64, Session<S>>>,
    ttl: Duration,
}

impl<S: Clone> SessionStore<S> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, user: UserId) -> Option<S> {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        match sessions.get(&user.0) {
            Some(session) if session.touched_at.elapsed() <= self.ttl => {
                Some(session.state.clone())
            }
            Some(_) => {
                sessions.remove(&user.0);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, user: UserId, state: S) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.insert(
            user.0,
            Session {
                state,
                touched_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self, user: UserId) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.remove(&user.0);
    }

    /// Drops every expired session, returning how many were reclaimed.
    pub fn sweep(&self) -> usize {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let before = sessions.len();
        sessions.retain(|_, session| session.touched_at.elapsed() <= self.ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.set(UserId(1), "first");
        store.set(UserId(1), "second");
        assert_eq!(store.get(UserId(1)), Some("second"));
    }

    #[test]
    fn cleared_sessions_are_gone() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.set(UserId(1), "state");
        store.clear(UserId(1));
        assert_eq!(store.get(UserId(1)), None);
    }

    #[test]
    fn expired_sessions_vanish_on_read() {
        let store = SessionStore::new(Duration::ZERO);
        store.set(UserId(1), "state");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.get(UserId(1)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn sweep_reclaims_only_expired_entries() {
        let store = SessionStore::new(Duration::from_millis(20));
        store.set(UserId(1), "old");
        std::thread::sleep(Duration::from_millis(30));
        store.set(UserId(2), "fresh");
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.get(UserId(2)), Some("fresh"));
    }

    #[test]
    fn identities_do_not_share_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.set(UserId(1), "one");
        store.set(UserId(2), "two");
        assert_eq!(store.get(UserId(1)), Some("one"));
        assert_eq!(store.get(UserId(2)), Some("two"));
    }
}
