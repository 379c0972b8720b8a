use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::{RepositoryError, RepositoryResult, Session};

/// Shared handle to one session. Holding the lock serializes every
/// workflow step for that session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Trait defining the interface for order session storage
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session and return its handle
    async fn create(&self, session: Session) -> RepositoryResult<SessionHandle>;

    /// Find a session by id
    async fn find(&self, session_id: &Uuid) -> RepositoryResult<Option<SessionHandle>>;

    /// Delete a session
    async fn delete(&self, session_id: &Uuid) -> RepositoryResult<()>;

    /// Count live sessions
    async fn count(&self) -> RepositoryResult<usize>;

    /// Drop sessions that have been idle for longer than `max_idle`
    async fn purge_idle(&self, max_idle: Duration) -> RepositoryResult<usize>;
}

/// In-process session store; nothing survives a restart
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    max_sessions: usize,
}

impl InMemorySessionRepository {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn create(&self, session: Session) -> RepositoryResult<SessionHandle> {
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.max_sessions {
            warn!(
                "Session capacity reached: {}/{}",
                sessions.len(),
                self.max_sessions
            );
            return Err(RepositoryError::CapacityExceeded {
                limit: self.max_sessions,
            });
        }

        let session_id = session.id;
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(session_id, handle.clone());

        debug!("Session stored, {} live sessions", sessions.len());
        Ok(handle)
    }

    async fn find(&self, session_id: &Uuid) -> RepositoryResult<Option<SessionHandle>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn delete(&self, session_id: &Uuid) -> RepositoryResult<()> {
        let mut sessions = self.sessions.write().await;

        match sessions.remove(session_id) {
            Some(_) => {
                debug!("Session deleted");
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn count(&self) -> RepositoryResult<usize> {
        let sessions = self.sessions.read().await;
        Ok(sessions.len())
    }

    #[instrument(skip(self))]
    async fn purge_idle(&self, max_idle: Duration) -> RepositoryResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        // A handle held outside the map belongs to a request in progress,
        // even one still waiting for the session lock.
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => !session.is_idle(now, max_idle),
                Err(_) => true,
            }
        });

        let purged = before - sessions.len();
        if purged > 0 {
            info!("Purged {} idle sessions, {} remaining", purged, sessions.len());
        }
        Ok(purged)
    }
}
