//! Transcript store
//!
//! Live sessions are kept in memory behind `TranscriptStore`. Each session's
//! transcript sits behind its own async mutex so one turn can hold it across
//! the model and speech calls while other sessions proceed. The session map
//! itself uses a `parking_lot::RwLock` that is never held across an await.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{watch, Mutex, MutexGuard};

use voice_support_config::SessionConfig;
use voice_support_core::{Message, Transcript};

use crate::AgentError;

/// Generate a session id: UTC timestamp plus a random suffix
///
/// Format: `YYYYMMDDHHMMSS-<32 hex chars>`.
pub fn generate_session_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S"),
        uuid::Uuid::new_v4().simple()
    )
}

/// Check that `id` has the shape produced by [`generate_session_id`]
pub fn is_valid_session_id(id: &str) -> bool {
    let Some((stamp, suffix)) = id.split_once('-') else {
        return false;
    };
    stamp.len() == 14
        && stamp.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == 32
        && suffix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// One live conversation
#[derive(Debug)]
pub struct Session {
    /// Session ID
    pub id: String,
    transcript: Mutex<Transcript>,
    /// Creation time
    pub created_at: Instant,
    last_activity: RwLock<Instant>,
}

impl Session {
    /// Create a session seeded with the persona message
    pub fn new(id: impl Into<String>, system_prompt: &str) -> Self {
        Self {
            id: id.into(),
            transcript: Mutex::new(Transcript::new(system_prompt)),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Lock the transcript for the duration of a turn
    pub async fn lock(&self) -> MutexGuard<'_, Transcript> {
        self.transcript.lock().await
    }

    /// Externally visible history (no system message)
    pub async fn history(&self) -> Vec<Message> {
        self.transcript.lock().await.history()
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Time since last activity
    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.idle_for() > timeout
    }
}

/// Keyed storage of live sessions
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Create a session whose transcript holds only `system_prompt`
    fn create(&self, system_prompt: &str) -> Result<Arc<Session>, AgentError>;

    /// Get a session by ID
    fn get(&self, id: &str) -> Option<Arc<Session>>;

    /// Remove a session, returning whether it existed
    fn remove(&self, id: &str) -> bool;

    /// Live session count
    fn count(&self) -> usize;

    /// Evict idle sessions, returning how many were removed
    fn cleanup_expired(&self) -> usize;

    /// Non-system history of a session
    async fn history(&self, id: &str) -> Option<Vec<Message>> {
        let session = self.get(id)?;
        Some(session.history().await)
    }
}

/// In-memory `TranscriptStore` with capacity and idle-time limits
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(max_sessions, Duration::from_secs(86_400), Duration::from_secs(300))
    }

    /// Create a new session manager with custom timeout and cleanup interval
    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::with_config(
            config.max_sessions,
            Duration::from_secs(config.idle_timeout_secs),
            Duration::from_secs(config.cleanup_interval_secs),
        )
    }

    /// Start a background task that periodically evicts idle sessions
    ///
    /// Send `true` on the returned channel to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                "Session cleanup: removed {} expired sessions ({} remaining)",
                                removed,
                                manager.count()
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = !session.is_expired(self.session_timeout);
            if !keep {
                tracing::debug!(session_id = %id, "Evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }
}

#[async_trait]
impl TranscriptStore for SessionManager {
    fn create(&self, system_prompt: &str) -> Result<Arc<Session>, AgentError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(AgentError::Capacity(self.max_sessions));
            }
        }

        let id = generate_session_id();
        if sessions.contains_key(&id) {
            return Err(AgentError::DuplicateSession(id));
        }

        let session = Arc::new(Session::new(&id, system_prompt));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, active = sessions.len(), "Created session");
        Ok(session)
    }

    fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!("Removed session: {}", id);
        }
        removed
    }

    fn count(&self) -> usize {
        self.sessions.read().len()
    }

    fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }
}
