//! Session manager: one GTP transport per client session
//!
//! A session is an isolated conversation with one engine instance,
//! addressed by an opaque URL-safe ID. The [`SessionManager`] owns the
//! registry mapping IDs to transports and creates transports through an
//! injected factory, so the HTTP layer never knows which concrete
//! transport backs a session.
//!
//! # Concurrency
//!
//! The registry is a `tokio::sync::RwLock<HashMap>`: lookups take the read
//! lock and proceed in parallel, mutations take the write lock. Transport
//! teardown always happens after the registry lock is released, so a slow
//! engine shutdown never blocks unrelated sessions. Removal is atomic: a
//! client that observed `close_session == true` can never resolve the same
//! ID again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{FastGtpError, Result};
use crate::transport::GtpTransport;

/// Factory producing one fresh transport per session.
pub type TransportFactory = dyn Fn() -> Result<Arc<dyn GtpTransport>> + Send + Sync;

/// Concurrent registry of sessions.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fastgtp::session::SessionManager;
/// use fastgtp::transport::scripted::ScriptedTransport;
/// use fastgtp::transport::GtpTransport;
///
/// # #[tokio::main]
/// # async fn main() -> fastgtp::Result<()> {
/// let manager = SessionManager::new(|| {
///     let transport: Arc<dyn GtpTransport> = Arc::new(ScriptedTransport::echo());
///     Ok(transport)
/// });
///
/// let session_id = manager.open_session().await?;
/// let transport = manager.get_transport(&session_id).await?;
/// let raw = transport.send_command("name").await?;
/// assert!(manager.close_session(&session_id).await);
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    factory: Box<TransportFactory>,
    sessions: RwLock<HashMap<String, Arc<dyn GtpTransport>>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager that builds transports with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn GtpTransport>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session and return its ID.
    ///
    /// The ID is a v4 UUID (122 random bits) in its URL-safe hyphenated
    /// form. Collisions are retried; IDs of closed sessions are never
    /// reissued in practice because the space is not reused.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error when the transport cannot be
    /// constructed.
    pub async fn open_session(&self) -> Result<String> {
        let transport = (self.factory)()?;

        let mut sessions = self.sessions.write().await;
        let session_id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        sessions.insert(session_id.clone(), transport);
        drop(sessions);

        tracing::info!(session_id = %session_id, "opened GTP session");
        Ok(session_id)
    }

    /// Resolve a session ID to its transport.
    ///
    /// # Errors
    ///
    /// Returns [`FastGtpError::SessionNotFound`] for unknown (or already
    /// closed) IDs.
    pub async fn get_transport(&self, session_id: &str) -> Result<Arc<dyn GtpTransport>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| FastGtpError::SessionNotFound(session_id.to_string()))
    }

    /// Close a session and tear down its transport.
    ///
    /// The registry entry is removed atomically; the transport is closed
    /// after the lock is released and the call returns only once teardown
    /// finished. Returns `false` when the ID was absent, which makes
    /// double-close idempotent.
    pub async fn close_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(transport) => {
                transport.close().await;
                tracing::info!(session_id = %session_id, "closed GTP session");
                true
            }
            None => false,
        }
    }

    /// Close every session, in parallel, and wait for all teardowns.
    ///
    /// The manager itself stays usable; `open_session` keeps working
    /// afterwards.
    pub async fn close_all(&self) {
        let drained: Vec<(String, Arc<dyn GtpTransport>)> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().collect()
        };
        let count = drained.len();
        futures::future::join_all(drained.into_iter().map(|(_, transport)| async move {
            transport.close().await;
        }))
        .await;
        if count > 0 {
            tracing::info!(sessions = count, "closed all GTP sessions");
        }
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
