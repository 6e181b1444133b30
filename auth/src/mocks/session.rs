//! Mock session store.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::Session;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock session store.
///
/// Sessions are keyed by token digest. Expired rows are dropped the
/// first time a lookup touches them, mirroring the delete-on-read of
/// the PostgreSQL store.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
}

impl MockSessionStore {
    /// Number of live rows, expired ones included until a lookup or
    /// purge removes them.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DatabaseError`] when the lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(lock(&self.inner)?.len())
    }
}

fn lock(inner: &Mutex<HashMap<String, Session>>) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
    inner
        .lock()
        .map_err(|_| AuthError::DatabaseError("session lock poisoned".to_string()))
}

impl SessionStore for MockSessionStore {
    fn put_session(&self, session: &Session) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let session = session.clone();
        async move {
            lock(&inner)?.insert(session.token_hash.clone(), session);
            Ok(())
        }
    }

    fn get_session(&self, token_hash: &str) -> impl Future<Output = Result<Session>> + Send {
        let inner = Arc::clone(&self.inner);
        let token_hash = token_hash.to_string();
        async move {
            let mut inner = lock(&inner)?;
            let Some(session) = inner.get(&token_hash) else {
                return Err(AuthError::InvalidToken);
            };
            if session.is_expired(Utc::now()) {
                inner.remove(&token_hash);
                return Err(AuthError::InvalidToken);
            }
            Ok(session.clone())
        }
    }

    fn revoke_session(&self, token_hash: &str) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let token_hash = token_hash.to_string();
        async move {
            lock(&inner)?.remove(&token_hash);
            Ok(())
        }
    }

    fn purge_expired(&self) -> impl Future<Output = Result<u64>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let mut inner = lock(&inner)?;
            let now = Utc::now();
            let before = inner.len();
            inner.retain(|_, session| !session.is_expired(now));
            Ok((before - inner.len()) as u64)
        }
    }
}
