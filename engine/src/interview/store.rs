//! In-memory session registry
//!
//! Each session sits behind its own async mutex. Callers hold that mutex for
//! a whole turn, generation included, so turns on one session are strictly
//! serialized while different sessions proceed independently. The map lock
//! is only held for lookups and inserts.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sdk::errors::EngineError;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::session::InterviewSession;

pub type SessionHandle = Arc<Mutex<InterviewSession>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session; ids are expected to be unique
    pub fn create(&self, session: InterviewSession) -> Result<SessionHandle, EngineError> {
        let id = session.id().to_string();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&id) {
            return Err(EngineError::InvalidRequest(format!(
                "session '{}' already exists",
                id
            )));
        }

        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id.clone(), Arc::clone(&handle));
        debug!("Session {} created ({} active)", id, sessions.len());
        Ok(handle)
    }

    pub fn get(&self, id: &str) -> Result<SessionHandle, EngineError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(id.to_string()))
    }

    pub fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
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

    /// Drop completed sessions that finished more than `older_than` ago.
    ///
    /// Sessions busy with a turn are skipped. Returns how many were removed.
    pub fn purge_completed(&self, older_than: Duration) -> usize {
        self.purge_where("expired", older_than, |session, cutoff| {
            matches!(session.completed_at(), Some(done) if done <= cutoff)
        })
    }

    /// Drop sessions that never completed and saw no activity for
    /// `idle_for`. Busy sessions are skipped.
    pub fn purge_idle(&self, idle_for: Duration) -> usize {
        self.purge_where("idle", idle_for, InterviewSession::is_idle_since)
    }

    fn purge_where<F>(&self, label: &str, age: Duration, expired: F) -> usize
    where
        F: Fn(&InterviewSession, DateTime<Utc>) -> bool,
    {
        let cutoff = match chrono::Duration::from_std(age) {
            Ok(age) => Utc::now() - age,
            Err(_) => return 0,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !expired(&*session, cutoff),
            Err(_) => true,
        });

        let purged = before - sessions.len();
        if purged > 0 {
            info!("Purged {} {} session(s)", purged, label);
        }
        purged
    }
}
